use serde::Serialize;

use super::card::Card;
use crate::query::PageMeta;

/// Success envelope: `{"status": <code>, "data": <payload>}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { status: 200, data }
    }

    pub fn created(data: T) -> Self {
        Self { status: 201, data }
    }
}

/// One page of cards plus navigation.
#[derive(Debug, Serialize)]
pub struct CardPage {
    pub cards: Vec<Card>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct LoadSummary {
    pub inserted: usize,
    pub skipped: usize,
}
