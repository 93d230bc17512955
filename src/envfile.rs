//! Environment-variable file parsing
//!
//! The env file is the local, uncommitted half of a service's environment:
//! `KEY=VALUE` lines, `#` comments, optional surrounding quotes. Later
//! assignments override earlier ones. Malformed lines are hard errors naming
//! file and line - a silently skipped credential is worse than a failed run.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{BerthError, BerthResult};

/// Read and parse an env file from disk
pub fn parse_env_file(path: &Path) -> BerthResult<BTreeMap<String, String>> {
    if !path.exists() {
        return Err(BerthError::EnvFileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    parse_env(&content, path)
}

/// Parse env-file content; `file` is used for error context only
pub fn parse_env(content: &str, file: &Path) -> BerthResult<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();

    for (index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let error = |message: &str| BerthError::EnvFile {
            file: file.to_path_buf(),
            line: index + 1,
            message: message.to_string(),
        };

        let (key, value) = line.split_once('=').ok_or_else(|| error("missing '=' separator"))?;
        let key = key.trim();

        if !is_valid_key(key) {
            return Err(error("key must match [A-Za-z_][A-Za-z0-9_]*"));
        }

        values.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    Ok(values)
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Strip one pair of matching single or double quotes, if present
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(content: &str) -> BerthResult<BTreeMap<String, String>> {
        parse_env(content, &PathBuf::from(".env"))
    }

    #[test]
    fn test_parse_basic_pairs() {
        let values = parse("POSTGRES_USER=invoices\nPOSTGRES_PASSWORD=s3cret\n").unwrap();
        assert_eq!(values.get("POSTGRES_USER").map(String::as_str), Some("invoices"));
        assert_eq!(values.get("POSTGRES_PASSWORD").map(String::as_str), Some("s3cret"));
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let values = parse("# database credentials\n\nPOSTGRES_DB=invoices\n").unwrap();
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_parse_strips_matching_quotes() {
        let values = parse("A=\"quoted\"\nB='also quoted'\nC=\"unmatched'\n").unwrap();
        assert_eq!(values.get("A").map(String::as_str), Some("quoted"));
        assert_eq!(values.get("B").map(String::as_str), Some("also quoted"));
        assert_eq!(values.get("C").map(String::as_str), Some("\"unmatched'"));
    }

    #[test]
    fn test_parse_later_assignment_wins() {
        let values = parse("PORT=5432\nPORT=5433\n").unwrap();
        assert_eq!(values.get("PORT").map(String::as_str), Some("5433"));
    }

    #[test]
    fn test_parse_value_may_contain_equals() {
        let values = parse("DATABASE_URL=postgres://u:p@db/invoices?sslmode=disable\n").unwrap();
        assert_eq!(
            values.get("DATABASE_URL").map(String::as_str),
            Some("postgres://u:p@db/invoices?sslmode=disable")
        );
    }

    #[test]
    fn test_parse_missing_separator_is_error() {
        let err = parse("JUST_A_KEY\n").unwrap_err();
        assert!(err.to_string().contains(".env:1"));
        assert!(err.to_string().contains("missing '='"));
    }

    #[test]
    fn test_parse_invalid_key_is_error() {
        let err = parse("1BAD=value\n").unwrap_err();
        assert!(err.to_string().contains("key must match"));
    }

    #[test]
    fn test_parse_empty_value_allowed() {
        let values = parse("EMPTY=\n").unwrap();
        assert_eq!(values.get("EMPTY").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_env_file_missing() {
        let result = parse_env_file(Path::new("/nonexistent/.env"));
        assert!(matches!(result, Err(BerthError::EnvFileNotFound { .. })));
    }
}
