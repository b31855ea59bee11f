//! Domain model structs and DTOs.
//!
//! Each submodule contains `FromRow` + `Serialize` row structs and the
//! plain input structs the repositories accept.

pub mod image;
pub mod page;
pub mod tag;
pub mod user;
