use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Search, bucket filter and page number for a listing request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub bucket: Option<String>,
    pub page: usize,
}

impl ListingQuery {
    #[must_use]
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    #[must_use]
    pub const fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub const fn page_number(&self) -> usize {
        if self.page == 0 { 1 } else { self.page }
    }

    #[must_use]
    pub fn matcher(&self) -> NameMatcher {
        NameMatcher::new(self.search.as_deref())
    }

    /// The bucket filter, ignoring a blank value.
    #[must_use]
    pub fn bucket_filter(&self) -> Option<&str> {
        self.bucket.as_deref().map(str::trim).filter(|b| !b.is_empty())
    }
}

/// Case-insensitive substring matcher for entry names.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    pattern: Option<Regex>,
}

impl NameMatcher {
    /// An absent or empty term matches every name. The term is used as given,
    /// surrounding whitespace included.
    #[must_use]
    pub fn new(term: Option<&str>) -> Self {
        let pattern = term
            .filter(|t| !t.is_empty())
            .and_then(|t| {
                RegexBuilder::new(&regex::escape(t))
                    .case_insensitive(true)
                    .build()
                    .ok()
            });
        Self { pattern }
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.pattern.as_ref().is_none_or(|p| p.is_match(name))
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.pattern.is_some()
    }
}
