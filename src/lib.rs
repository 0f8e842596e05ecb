//! CFI Locator
//!
//! Finds highlighted passages inside EPUBs and emits EPUB CFI range
//! references for them.
//!
//! # Modules
//!
//! - `locator`: normalization, flat index, span search and CFI range formatting
//! - `generator`: the external `epub-cfi-generator` process
//! - `cache`: content-hash cache of generator output
//! - `library`: in-memory LRU of loaded books
//! - `kobo`: bookmarks from a Kobo reader database
//! - `annotations`: annotation export for located bookmarks

pub mod annotations;
pub mod cache;
pub mod config;
pub mod error;
pub mod generator;
pub mod kobo;
pub mod library;
pub mod locator;

pub use error::{AppError, Result};
pub use locator::{locate, locate_all, Document, LocateError, RangeReference};
