//! Parsing and rendering the free-text tag field.
//!
//! Tags are separated by commas. A tag containing a comma can be written in
//! double quotes (`"rust, async", web`). Surrounding whitespace is dropped
//! and duplicates collapse.

use std::collections::BTreeSet;

use crate::error::CoreError;

/// Maximum length of a single tag.
pub const MAX_TAG_LEN: usize = 100;

const MALFORMED_TAGS_MESSAGE: &str = "Please provide a comma-separated list of tags.";

/// Parse a tag field into a set of distinct tags.
///
/// A field containing only separators or whitespace yields an empty set.
/// An unterminated quote or an over-long tag is a validation error.
pub fn parse_tags(input: &str) -> Result<BTreeSet<String>, CoreError> {
    let mut tags = BTreeSet::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in input.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                push_tag(&mut tags, &current)?;
                current.clear();
            }
            c if c.is_control() => {
                return Err(CoreError::Validation(MALFORMED_TAGS_MESSAGE.into()));
            }
            c => current.push(c),
        }
    }

    if in_quotes {
        return Err(CoreError::Validation(MALFORMED_TAGS_MESSAGE.into()));
    }
    push_tag(&mut tags, &current)?;
    Ok(tags)
}

fn push_tag(tags: &mut BTreeSet<String>, raw: &str) -> Result<(), CoreError> {
    let tag = raw.trim();
    if tag.is_empty() {
        return Ok(());
    }
    if tag.chars().count() > MAX_TAG_LEN {
        return Err(CoreError::Validation(format!(
            "Each tag must be at most {MAX_TAG_LEN} characters"
        )));
    }
    tags.insert(tag.to_string());
    Ok(())
}

/// Render tags back into an editable field, quoting tags that contain
/// commas or spaces.
pub fn edit_string_for_tags<'a, I>(tags: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut names: Vec<String> = tags
        .into_iter()
        .map(|tag| {
            if tag.contains(',') || tag.contains(' ') {
                format!("\"{tag}\"")
            } else {
                tag.to_string()
            }
        })
        .collect();
    names.sort();
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn splits_on_commas_and_trims() {
        assert_eq!(parse_tags("foo, bar ,baz").unwrap(), set(&["foo", "bar", "baz"]));
    }

    #[test]
    fn only_delimiters_is_empty_not_error() {
        assert!(parse_tags(",, ,").unwrap().is_empty());
        assert!(parse_tags("").unwrap().is_empty());
        assert!(parse_tags("   ").unwrap().is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(parse_tags("a, a,b ,a").unwrap(), set(&["a", "b"]));
    }

    #[test]
    fn spaces_inside_a_tag_are_kept() {
        assert_eq!(
            parse_tags("machine learning, rust").unwrap(),
            set(&["machine learning", "rust"])
        );
    }

    #[test]
    fn quoted_tags_may_contain_commas() {
        assert_eq!(
            parse_tags("\"rust, async\", web").unwrap(),
            set(&["rust, async", "web"])
        );
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        assert_matches!(
            parse_tags("\"rust, web"),
            Err(CoreError::Validation(msg)) if msg == MALFORMED_TAGS_MESSAGE
        );
    }

    #[test]
    fn control_characters_are_malformed() {
        assert!(parse_tags("foo\nbar").is_err());
    }

    #[test]
    fn over_long_tag_is_rejected() {
        assert!(parse_tags(&"t".repeat(MAX_TAG_LEN + 1)).is_err());
    }

    #[test]
    fn edit_string_quotes_where_needed() {
        assert_eq!(
            edit_string_for_tags(["web", "rust, async", "machine learning"]),
            "\"machine learning\", \"rust, async\", web"
        );
    }

    #[test]
    fn edit_string_parses_back_to_same_set() {
        let tags = set(&["a b", "c,d", "e"]);
        let field = edit_string_for_tags(tags.iter().map(String::as_str));
        assert_eq!(parse_tags(&field).unwrap(), tags);
    }
}
