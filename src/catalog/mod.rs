//! Catalog parsing.
//!
//! The catalog is an HTML page; the only thing relied on is that it contains
//! absolute links to `.tgz` archives below the registry prefix. Everything else
//! on the page is ignored.

mod parser;

pub use parser::{CatalogParser, extract_links};
