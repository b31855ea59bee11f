//! Credential handling: Argon2id password hashes and JWT access tokens.

pub mod jwt;
pub mod password;
