mod entry;
mod page;
mod search;
mod thumbnail;

pub use entry::{Candidate, Entry, Kind, ResolvedFile};
pub use page::{Page, total_pages};
pub use search::{ListingQuery, NameMatcher};
pub use thumbnail::{Thumbnail, ThumbnailFormat};
