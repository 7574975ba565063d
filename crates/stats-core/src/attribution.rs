//! User attribution from log file names.

use crate::error::{Result, StatsError};

/// Derives the owning user of a log file from its name.
pub trait IdentityExtractor: Send + Sync {
    /// Extract the identity from a bare file name (no directory part).
    fn extract(&self, file_name: &str) -> Result<String>;
}

/// Identity between the next-to-last and the last delimiter.
///
/// `<prefix>_<identity>_<suffix>.log` yields `identity`; names with fewer
/// than two delimiters are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedIdentity {
    delimiter: char,
}

impl DelimitedIdentity {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }
}

impl Default for DelimitedIdentity {
    fn default() -> Self {
        Self::new('_')
    }
}

impl IdentityExtractor for DelimitedIdentity {
    fn extract(&self, file_name: &str) -> Result<String> {
        let malformed = || StatsError::MalformedFileName(file_name.to_string());

        let last = file_name.rfind(self.delimiter).ok_or_else(malformed)?;
        let head = &file_name[..last];
        let previous = head.rfind(self.delimiter).ok_or_else(malformed)?;

        Ok(head[previous + self.delimiter.len_utf8()..].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(name: &str) -> Result<String> {
        DelimitedIdentity::default().extract(name)
    }

    #[test]
    fn test_extract_standard_name() {
        assert_eq!(extract("app_alice_2024.log").unwrap(), "alice");
        assert_eq!(extract("idea_bob_idea.log").unwrap(), "bob");
    }

    #[test]
    fn test_extract_rotated_name() {
        assert_eq!(extract("idea_bob_idea.log.3").unwrap(), "bob");
    }

    #[test]
    fn test_extract_uses_last_two_delimiters() {
        assert_eq!(extract("team_a_carol_idea.log").unwrap(), "carol");
    }

    #[test]
    fn test_extract_non_ascii_identity() {
        assert_eq!(extract("log_张三_idea.log").unwrap(), "张三");
    }

    #[test]
    fn test_extract_empty_identity_is_allowed() {
        assert_eq!(extract("app__idea.log").unwrap(), "");
    }

    #[test]
    fn test_extract_single_delimiter_is_malformed() {
        let err = extract("alice_idea.log").unwrap_err();
        assert!(matches!(err, StatsError::MalformedFileName(ref n) if n == "alice_idea.log"));
    }

    #[test]
    fn test_extract_no_delimiter_is_malformed() {
        assert!(matches!(
            extract("idea.log").unwrap_err(),
            StatsError::MalformedFileName(_)
        ));
    }

    #[test]
    fn test_custom_delimiter() {
        let extractor = DelimitedIdentity::new('-');
        assert_eq!(extractor.extract("ide-dave-2025.log").unwrap(), "dave");
        assert!(extractor.extract("ide_dave_2025.log").is_err());
    }
}
