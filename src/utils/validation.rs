// Validation utilities for incoming form and JSON fields

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{models::DOCTOR_PAGE_SIZE, utils::app_error::AppError};

pub const MIN_DOCTOR_AGE: i32 = 25;
pub const MAX_DOCTOR_AGE: i32 = 100;

/// Highest page whose skip offset still fits a BSON int64
pub const MAX_PAGE: u64 = i64::MAX as u64 / DOCTOR_PAGE_SIZE;

static CONTACT_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("valid contact number regex"));

static IMAGE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://.*\.(png|jpg|jpeg|gif|bmp|webp)$").expect("valid image url regex")
});

/// Trim and validate string fields
///
/// # Returns
/// * `Ok(String)` - The trimmed string if valid
/// * `Err(String)` - Error message if validation fails
pub fn trim_and_validate_field(field: &str, required: bool) -> Result<String, String> {
    let trimmed = field.trim().to_string();
    if trimmed.is_empty() && required {
        Err("Field cannot be empty".to_string())
    } else {
        Ok(trimmed)
    }
}

/// Trim an optional string field, collapsing blank values to `None`
pub fn trim_optional_field(field: Option<&String>) -> Option<String> {
    field.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// A required, non-blank text field
pub fn required_text(value: Option<&String>, message: &str) -> Result<String, AppError> {
    value
        .and_then(|v| trim_and_validate_field(v, true).ok())
        .ok_or_else(|| AppError::validation(message))
}

/// A field that may be omitted (or sent empty) but must not be whitespace-only
pub fn optional_text(value: Option<&String>, message: &str) -> Result<Option<String>, AppError> {
    match value {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => trim_and_validate_field(v, true)
            .map(Some)
            .map_err(|_| AppError::validation(message)),
    }
}

/// Parse an age and check the inclusive [25, 100] range
pub fn parse_age(value: &str) -> Option<i32> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|age| (MIN_DOCTOR_AGE..=MAX_DOCTOR_AGE).contains(age))
}

/// Exactly ten ASCII digits
pub fn is_valid_contact_number(value: &str) -> bool {
    CONTACT_NUMBER_RE.is_match(value)
}

pub fn is_valid_image_url(value: &str) -> bool {
    IMAGE_URL_RE.is_match(value)
}

/// 1-based page number from a path segment
pub fn parse_page(value: &str) -> Result<u64, AppError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|page| (1..=MAX_PAGE).contains(page))
        .ok_or_else(|| AppError::validation("Invalid page number. Must be a positive integer."))
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` date taken as midnight UTC
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_and_validate_field() {
        assert_eq!(trim_and_validate_field("  Dr. Rao ", true).unwrap(), "Dr. Rao");
        assert!(trim_and_validate_field("   ", true).is_err());
        assert_eq!(trim_and_validate_field("   ", false).unwrap(), "");
    }

    #[test]
    fn test_trim_optional_field() {
        assert_eq!(trim_optional_field(None), None);
        assert_eq!(trim_optional_field(Some(&"  ".to_string())), None);
        assert_eq!(trim_optional_field(Some(&" x ".to_string())), Some("x".to_string()));
    }

    #[test]
    fn test_optional_text_rules() {
        assert_eq!(optional_text(None, "bad").unwrap(), None);
        assert_eq!(optional_text(Some(&String::new()), "bad").unwrap(), None);
        assert!(optional_text(Some(&"   ".to_string()), "bad").is_err());
        assert_eq!(
            optional_text(Some(&" Cardiology ".to_string()), "bad").unwrap(),
            Some("Cardiology".to_string())
        );
    }

    #[test]
    fn test_age_boundaries() {
        assert_eq!(parse_age("25"), Some(25));
        assert_eq!(parse_age("100"), Some(100));
        assert_eq!(parse_age("24"), None);
        assert_eq!(parse_age("101"), None);
        assert_eq!(parse_age("forty"), None);
        assert_eq!(parse_age("40.5"), None);
    }

    #[test]
    fn test_contact_number() {
        assert!(is_valid_contact_number("9876543210"));
        assert!(!is_valid_contact_number("987654321"));
        assert!(!is_valid_contact_number("98765432100"));
        assert!(!is_valid_contact_number("98765-4321"));
    }

    #[test]
    fn test_image_url() {
        assert!(is_valid_image_url("https://res.cloudinary.com/demo/doctors/abc.JPG"));
        assert!(is_valid_image_url("http://cdn.example.com/a/b.webp"));
        assert!(!is_valid_image_url("ftp://cdn.example.com/a.png"));
        assert!(!is_valid_image_url("https://cdn.example.com/a.svg"));
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page("2").unwrap(), 2);
        assert!(parse_page("0").is_err());
        assert!(parse_page("-1").is_err());
        assert!(parse_page("abc").is_err());
        assert_eq!(parse_page(&MAX_PAGE.to_string()).unwrap(), MAX_PAGE);
        assert!(parse_page(&(MAX_PAGE + 1).to_string()).is_err());
        assert!(parse_page(&u64::MAX.to_string()).is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let day = parse_date("2024-03-01").unwrap();
        assert_eq!(day.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        let stamp = parse_date("2024-03-01T10:30:00+05:30").unwrap();
        assert_eq!(stamp.to_rfc3339(), "2024-03-01T05:00:00+00:00");

        assert!(parse_date("01/03/2024").is_none());
        assert!(parse_date("").is_none());
    }
}
