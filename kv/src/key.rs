//! Key validation

use thiserror::Error;

/// Maximum key length in bytes
pub const MAX_KEY_LEN: usize = 128;

/// Reasons a key is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("key is empty")]
    Empty,

    #[error("key is longer than {MAX_KEY_LEN} bytes")]
    TooLong,

    #[error("key '{0}' may not start with '.'")]
    Hidden(String),

    #[error("key '{key}' contains invalid character {ch:?}")]
    InvalidChar { key: String, ch: char },
}

/// Check that a key is safe to use as a file name
///
/// Keys are restricted to ASCII alphanumerics plus `.`, `_` and `-`, and may
/// not start with `.` (reserved for the lock and temp files).
pub fn validate_key(key: &str) -> Result<(), KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    if key.len() > MAX_KEY_LEN {
        return Err(KeyError::TooLong);
    }
    if key.starts_with('.') {
        return Err(KeyError::Hidden(key.to_string()));
    }
    if let Some(ch) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(KeyError::InvalidChar {
            key: key.to_string(),
            ch,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_versioned_keys() {
        assert!(validate_key("focusFlow_tasks_v7").is_ok());
        assert!(validate_key("focusFlow_gardenState_v7").is_ok());
        assert!(validate_key("a.b-c_d").is_ok());
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert_eq!(validate_key(""), Err(KeyError::Empty));
        assert_eq!(validate_key(".lock"), Err(KeyError::Hidden(".lock".to_string())));
        assert!(matches!(
            validate_key("../etc/passwd"),
            Err(KeyError::Hidden(_))
        ));
        assert!(matches!(
            validate_key("a/b"),
            Err(KeyError::InvalidChar { ch: '/', .. })
        ));
        assert_eq!(validate_key(&"k".repeat(MAX_KEY_LEN + 1)), Err(KeyError::TooLong));
    }

    proptest! {
        #[test]
        fn separators_never_pass(prefix in "[a-z]{1,8}", suffix in "[a-z]{1,8}", sep in prop::sample::select(vec!['/', '\\', ' ', ':'])) {
            let key = format!("{prefix}{sep}{suffix}");
            prop_assert!(validate_key(&key).is_err());
        }

        #[test]
        fn charset_keys_pass(key in "[A-Za-z0-9_-][A-Za-z0-9._-]{0,40}") {
            prop_assert!(validate_key(&key).is_ok());
        }
    }
}
