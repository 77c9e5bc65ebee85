//! Shared type definitions for Commandeer.
//!
//! This crate holds the declarative catalog model (resources, commands,
//! parse/pagination descriptors) and the normalized output model produced by
//! the parsing engine. It deliberately contains no I/O: loading catalogs and
//! executing commands live in the registry and engine crates.

pub mod catalog;
pub mod output;

pub use catalog::{Command, Pagination, ParseKind, ParseSpec, Resource, ViewKind};
pub use output::ParsedOutput;

use heck::ToShoutySnakeCase;

/// Marker prefixing an argument token that is substituted at execution time
/// from a previously selected row's value.
pub const PLACEHOLDER_PREFIX: char = '$';

/// Derives the placeholder key for a command's logical resource name,
/// e.g. `"bucket name"` becomes `"$BUCKET_NAME"`.
pub fn placeholder_key(resource_name: &str) -> String {
    format!("{PLACEHOLDER_PREFIX}{}", resource_name.to_shouty_snake_case())
}

/// Returns true when an argument token is a placeholder: the reserved marker
/// followed by an uppercased logical key.
pub fn is_placeholder(argument: &str) -> bool {
    let mut chars = argument.chars();
    if chars.next() != Some(PLACEHOLDER_PREFIX) {
        return false;
    }
    let rest = chars.as_str();
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_key_uppercases_resource_name() {
        assert_eq!(placeholder_key("table-name"), "$TABLE_NAME");
        assert_eq!(placeholder_key("bucket"), "$BUCKET");
    }

    #[test]
    fn placeholder_detection() {
        assert!(is_placeholder("$TABLE_NAME"));
        assert!(is_placeholder("$QUEUE_URL2"));
        assert!(!is_placeholder("$"));
        assert!(!is_placeholder("--table-name"));
        assert!(!is_placeholder("$lowercase"));
    }
}
