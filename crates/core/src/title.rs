//! Document name canonicalization and validation.
//!
//! Page titles and image names are stored in their "display" form (single
//! spaces) and exposed in URLs in their "url" form. When
//! `spaces_as_underscores` is off both forms are identical.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Maximum length of a page title.
pub const MAX_TITLE_LEN: usize = 256;

/// Maximum length of an image name.
pub const MAX_IMAGE_NAME_LEN: usize = 128;

/// Maximum length of a revision description.
pub const MAX_DESCRIPTION_LEN: usize = 400;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static UNDERSCORE_OR_WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_\s]+").expect("valid regex"));

static NON_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w,.-]+").expect("valid regex"));

/// Convert a stored title into its URL form (whitespace runs become `_`).
pub fn urlize_title(title: &str, spaces_as_underscores: bool) -> String {
    if spaces_as_underscores {
        WHITESPACE_RE.replace_all(title, "_").into_owned()
    } else {
        title.to_string()
    }
}

/// Convert a URL title back into its stored form (runs of `_` and
/// whitespace become a single space).
pub fn deurlize_title(title: &str, spaces_as_underscores: bool) -> String {
    if spaces_as_underscores {
        UNDERSCORE_OR_WHITESPACE_RE
            .replace_all(title, " ")
            .into_owned()
    } else {
        title.to_string()
    }
}

/// Produce an HTML-anchor-safe identifier from arbitrary text.
pub fn anchorize(text: &str) -> String {
    NON_ANCHOR_RE
        .replace_all(text, "_")
        .trim_matches('_')
        .to_string()
}

/// Validate a stored page title.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    validate_name("Title", title, MAX_TITLE_LEN)
}

/// Validate a stored image name.
pub fn validate_image_name(name: &str) -> Result<(), CoreError> {
    validate_name("Image name", name, MAX_IMAGE_NAME_LEN)
}

/// Validate a revision description.
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CoreError::Validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_name(label: &str, value: &str, max_len: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{label} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(CoreError::Validation(format!(
            "{label} must be at most {max_len} characters"
        )));
    }
    if value.contains('/') {
        return Err(CoreError::Validation(format!(
            "{label} must not contain '/'"
        )));
    }
    Ok(())
}
