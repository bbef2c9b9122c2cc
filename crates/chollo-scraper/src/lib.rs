//! Outbound HTTP clients for the two external collaborators: the page
//! metadata scraping API and the favicon resolution service. Both are
//! best-effort; callers degrade to manual entry or default icons on failure.

mod error;
pub mod extract;
pub mod favicon;
pub mod metadata;

pub use error::ScrapeError;
pub use favicon::FaviconClient;
pub use metadata::{MetadataClient, PageMetadata};
