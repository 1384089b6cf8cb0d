use serde::{Deserialize, Serialize};

/// A window over an ordered sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items_per_page: usize,
}

impl<T> Page<T> {
    /// Slices `items` to the requested page.
    ///
    /// `page_number` 0 is treated as 1 and an `items_per_page` of 0 as 1.
    /// Requesting a page past the end yields an empty page, never an error.
    #[must_use]
    pub fn from_items(items: Vec<T>, page_number: usize, items_per_page: usize) -> Self {
        let page_number = page_number.max(1);
        let items_per_page = items_per_page.max(1);
        let total_items = items.len();
        let total_pages = total_pages(total_items, items_per_page);

        let start = (page_number - 1).saturating_mul(items_per_page).min(total_items);
        let end = start.saturating_add(items_per_page).min(total_items);

        let items = items.into_iter().skip(start).take(end - start).collect();

        Self {
            items,
            page_number,
            total_pages,
            total_items,
            items_per_page,
        }
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transforms the items while keeping the pagination metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            total_pages: self.total_pages,
            total_items: self.total_items,
            items_per_page: self.items_per_page,
        }
    }
}

/// `ceil(total_items / items_per_page)`, never less than 1.
#[must_use]
pub const fn total_pages(total_items: usize, items_per_page: usize) -> usize {
    let per_page = if items_per_page == 0 { 1 } else { items_per_page };
    let pages = total_items.div_ceil(per_page);
    if pages == 0 { 1 } else { pages }
}
