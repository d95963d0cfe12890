use std::num::NonZeroU32;

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 20;

/// A page request after clamping: `page >= 1`, `1 <= page_size <= MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: NonZeroU32,
}

impl PageRequest {
    /// Clamp raw `page` / `query_size` parameters into range. Missing values fall
    /// back to the first page and the default size.
    pub fn clamped(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32;
        let size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE as i64)
            .clamp(1, MAX_PAGE_SIZE as i64) as u32;

        Self {
            page,
            page_size: NonZeroU32::new(size).unwrap_or(NonZeroU32::MIN),
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size.get() as i64
    }

    pub fn offset(&self) -> i64 {
        offset(self.page, self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::clamped(None, None)
    }
}

/// Row offset of the first item on `page` (1-based).
pub fn offset(page: u32, page_size: NonZeroU32) -> i64 {
    (page.max(1) as i64 - 1) * page_size.get() as i64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub pages: i64,
    pub total: i64,
    pub page: u32,
    pub query_size: u32,
    pub next: Option<String>,
    pub prev: Option<String>,
}

/// Page count and navigation links. `base` is a link prefix that already ends in
/// `?` or `&`, e.g. `/cards/?` or `/cards/filter/?race=Dragon&`.
pub fn paginate(total: i64, page: u32, page_size: NonZeroU32, base: &str) -> PageMeta {
    let total = total.max(0);
    let size = page_size.get() as i64;
    let pages = (total + size - 1) / size;

    let next = ((page as i64) * size < total)
        .then(|| format!("{}page={}&query_size={}", base, page + 1, size));
    let prev = (page > 1).then(|| format!("{}page={}&query_size={}", base, page - 1, size));

    PageMeta {
        pages,
        total,
        page,
        query_size: page_size.get(),
        next,
        prev,
    }
}
