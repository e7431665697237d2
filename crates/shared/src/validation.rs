//! Input normalization and validation helpers shared by the API and stores.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Maximum number of interests accepted on a waitlist signup.
pub const MAX_INTERESTS: usize = 20;

/// Maximum length of a single interest or tag.
pub const MAX_LABEL_LENGTH: usize = 50;

lazy_static! {
    /// Source tags are short slugs like `website`, `pricing-page`, `blog_post`.
    pub static ref SOURCE_TAG_REGEX: Regex = Regex::new(r"^[a-z0-9][a-z0-9_-]{0,49}$").unwrap();
}

/// Canonical form of an email address: trimmed and lowercased.
///
/// Uniqueness of users and waitlist entries is case-insensitive, so every
/// lookup and insert goes through this.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Canonical form of a tag or interest label.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Validates a waitlist source tag.
pub fn validate_source_tag(source: &str) -> Result<(), ValidationError> {
    if SOURCE_TAG_REGEX.is_match(source) {
        Ok(())
    } else {
        let mut err = ValidationError::new("source_format");
        err.message = Some(
            "Source must be 1-50 lowercase letters, digits, '-' or '_'".into(),
        );
        Err(err)
    }
}

/// Validates the interest list of a waitlist signup.
pub fn validate_interests(interests: &[String]) -> Result<(), ValidationError> {
    if interests.len() > MAX_INTERESTS {
        let mut err = ValidationError::new("interests_count");
        err.message = Some(format!("At most {} interests are allowed", MAX_INTERESTS).into());
        return Err(err);
    }

    if interests
        .iter()
        .any(|i| i.trim().is_empty() || i.trim().chars().count() > MAX_LABEL_LENGTH)
    {
        let mut err = ValidationError::new("interest_length");
        err.message = Some(
            format!("Each interest must be 1-{} characters", MAX_LABEL_LENGTH).into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates a single admin-supplied tag.
pub fn validate_tag(tag: &str) -> Result<(), ValidationError> {
    let trimmed = tag.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_LABEL_LENGTH {
        let mut err = ValidationError::new("tag_length");
        err.message = Some(format!("Tag must be 1-{} characters", MAX_LABEL_LENGTH).into());
        Err(err)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
        assert_eq!(normalize_email("a@b.co"), "a@b.co");
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Budgeting "), "budgeting");
    }

    #[test]
    fn test_validate_source_tag_valid() {
        assert!(validate_source_tag("website").is_ok());
        assert!(validate_source_tag("pricing-page").is_ok());
        assert!(validate_source_tag("blog_post_2024").is_ok());
    }

    #[test]
    fn test_validate_source_tag_invalid() {
        assert!(validate_source_tag("").is_err());
        assert!(validate_source_tag("Website").is_err());
        assert!(validate_source_tag("-leading").is_err());
        assert!(validate_source_tag("has space").is_err());
        assert!(validate_source_tag(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_interests() {
        assert!(validate_interests(&[]).is_ok());
        assert!(validate_interests(&["budgeting".to_string(), "family plans".to_string()]).is_ok());
        assert!(validate_interests(&["  ".to_string()]).is_err());
        assert!(validate_interests(&["x".repeat(51)]).is_err());

        let too_many: Vec<String> = (0..21).map(|i| format!("interest-{}", i)).collect();
        let err = validate_interests(&too_many).unwrap_err();
        assert_eq!(err.code, "interests_count");
    }

    #[test]
    fn test_validate_tag() {
        assert!(validate_tag("vip").is_ok());
        assert!(validate_tag(" ").is_err());
        assert!(validate_tag(&"t".repeat(51)).is_err());
    }
}
