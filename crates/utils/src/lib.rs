mod bytes;
pub mod datetime;
pub mod media_types;
pub mod path;

pub use bytes::format_bytes;
pub use media_types::{ExtensionTable, classify};
