pub mod cache;
pub mod catalog;
pub mod commands;
pub mod controller;
pub mod error;
pub mod http;
pub mod manifest;
pub mod package;
pub mod registry;
pub mod runtime;
pub mod settings;

pub use error::{Error, Result};
