use serde::{Deserialize, Serialize};
use validator::Validate;

/// Link arrows a link monster may carry.
pub const LINK_MARKERS: [&str; 8] = [
    "Top",
    "Bottom",
    "Left",
    "Right",
    "Top-Left",
    "Top-Right",
    "Bottom-Left",
    "Bottom-Right",
];

/// One artwork of a card. Vector order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CardImage {
    #[validate(length(min = 1))]
    pub image_url: String,
    #[validate(length(min = 1))]
    pub image_url_small: String,
}

/// A catalog card. Optional stats are `None` when they do not apply to the card
/// (a spell has no ATK), which is distinct from a stat of zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Card {
    #[validate(range(min = 1))]
    pub id: i32,
    #[validate(length(min = 1))]
    pub card_name: String,
    #[validate(length(min = 1))]
    pub card_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub archetype: String,
    #[serde(default)]
    pub atk: Option<i32>,
    #[serde(default)]
    pub def: Option<i32>,
    #[serde(default)]
    pub card_level: Option<i32>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(default)]
    pub linkval: Option<i32>,
    #[serde(default)]
    pub linkmarkers: Vec<String>,
    #[serde(default)]
    pub card_scale: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub card_images: Vec<CardImage>,
}

impl Card {
    /// Pair decoded `image_url` / `image_url_small` lists by position. A list that
    /// runs short contributes empty strings rather than dropping images.
    pub fn pair_images(urls: Vec<String>, small_urls: Vec<String>) -> Vec<CardImage> {
        let len = urls.len().max(small_urls.len());
        let mut urls = urls.into_iter();
        let mut small_urls = small_urls.into_iter();
        (0..len)
            .map(|_| CardImage {
                image_url: urls.next().unwrap_or_default(),
                image_url_small: small_urls.next().unwrap_or_default(),
            })
            .collect()
    }

    pub fn has_known_link_markers(&self) -> bool {
        self.linkmarkers
            .iter()
            .all(|marker| LINK_MARKERS.contains(&marker.as_str()))
    }
}

/// Bulk-load document: `{"data": [card, ...]}`.
#[derive(Debug, Deserialize)]
pub struct CardDump {
    pub data: Vec<Card>,
}
