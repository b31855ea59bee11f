//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Revision reads go through the
//! generic [`RevisionChain`](crate::revision_chain::RevisionChain).

pub mod image_repo;
pub mod page_repo;
pub mod tag_repo;
pub mod user_repo;

pub use image_repo::{ImageRepo, ImageRevisionRepo};
pub use page_repo::{PageRepo, PageRevisionRepo};
pub use tag_repo::TagRepo;
pub use user_repo::UserRepo;
