//! Package state module
//!
//! A [`PackageEntry`] pairs the versions a catalog offers for one package with
//! what the user selected and what the manifest says is installed.

mod entry;

pub use entry::{PackageAction, PackageEntry, PackageState};
