//! Project manifest handling.
//!
//! The manifest (`Packages/manifest.json`) belongs to the editor. This module
//! only owns the `dependencies` entries whose names match catalog packages and
//! writes everything else back untouched.

mod reference;
mod store;

pub use reference::{decode_reference, encode_reference};
pub use store::DependencyStore;
