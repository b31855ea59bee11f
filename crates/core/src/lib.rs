//! Domain logic for the folio wiki.
//!
//! Nothing in here touches the database or HTTP. The `db` and `api` crates
//! build on these modules.

pub mod diff;
pub mod error;
pub mod hashing;
pub mod image_meta;
pub mod merge;
pub mod patch;
pub mod revision;
pub mod search;
pub mod tags;
pub mod title;
pub mod types;
pub mod undo;
