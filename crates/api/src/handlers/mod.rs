pub mod auth;
pub mod image;
pub mod listing;
pub mod page;
