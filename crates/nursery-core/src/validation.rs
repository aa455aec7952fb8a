//! Field validators usable from `#[validate(custom(function = "..."))]`.
//!
//! ```ignore
//! #[derive(Deserialize, Validate)]
//! struct RegisterParentDto {
//!     #[validate(custom(function = "validate_strong_password"))]
//!     password: String,
//!     #[validate(custom(function = "validate_phone_number"))]
//!     phone_number: Option<String>,
//! }
//! ```

use std::borrow::Cow;

use chrono::{Datelike, Local, NaiveDate};
use validator::ValidationError;

pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

pub const MIN_CHILD_AGE_YEARS: i32 = 1;
pub const MAX_CHILD_AGE_YEARS: i32 = 6;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// At least 8 characters with upper, lower, digit and one of
/// [`PASSWORD_SPECIAL_CHARS`].
pub fn validate_strong_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 8 {
        return Err(error(
            "password_length",
            "Password must be at least 8 characters long.",
        ));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(error(
            "password_uppercase",
            "Password must contain at least one uppercase letter.",
        ));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(error(
            "password_lowercase",
            "Password must contain at least one lowercase letter.",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(error(
            "password_digit",
            "Password must contain at least one number.",
        ));
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err(error(
            "password_special",
            "Password must contain at least one special character.",
        ));
    }
    Ok(())
}

/// Sri Lankan mobile numbers: `+94` or `0` followed by nine digits.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    let digits = phone
        .strip_prefix("+94")
        .or_else(|| phone.strip_prefix('0'));

    match digits {
        Some(rest) if rest.len() == 9 && rest.chars().all(|c| c.is_ascii_digit()) => Ok(()),
        _ => Err(error(
            "invalid_phone",
            "Enter a valid Sri Lankan phone number (e.g., +94771234567 or 0771234567).",
        )),
    }
}

pub fn validate_person_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(error("required", "This field is required."));
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace()) {
        return Err(error(
            "invalid_name",
            "Name can only contain letters and spaces.",
        ));
    }
    Ok(())
}

pub fn validate_child_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < 2 {
        return Err(error(
            "child_name_length",
            "Student name must be at least 2 characters long.",
        ));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '\'' || c == '-')
    {
        return Err(error(
            "child_name_chars",
            "Student name can only contain letters, spaces, hyphens, and apostrophes.",
        ));
    }
    Ok(())
}

/// Capitalizes the first letter of every word and lowercases the rest.
/// Letters following `-` or `'` start a new word (`mary-jane o'neil` becomes
/// `Mary-Jane O'Neil`). Runs of whitespace collapse to one space.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, word) in value.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut start = true;
        for c in word.chars() {
            if c.is_alphabetic() {
                if start {
                    out.extend(c.to_uppercase());
                } else {
                    out.extend(c.to_lowercase());
                }
                start = false;
            } else {
                out.push(c);
                start = true;
            }
        }
    }
    out
}

/// Whole years between `date_of_birth` and `today`.
pub fn age_in_years(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

pub fn check_child_birth_date(
    date_of_birth: &NaiveDate,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    if *date_of_birth > today {
        return Err(error(
            "dob_future",
            "Date of birth cannot be in the future.",
        ));
    }
    let age = age_in_years(*date_of_birth, today);
    if age > MAX_CHILD_AGE_YEARS {
        return Err(error(
            "dob_too_old",
            "Child seems too old for nursery school (maximum age: 6 years).",
        ));
    }
    if age < MIN_CHILD_AGE_YEARS {
        return Err(error("dob_too_young", "Child must be at least 1 year old."));
    }
    Ok(())
}

pub fn validate_child_birth_date(date_of_birth: &NaiveDate) -> Result<(), ValidationError> {
    check_child_birth_date(date_of_birth, Local::now().date_naive())
}

/// Rejects strings that are empty after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "This field cannot be empty."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_strong_password() {
        assert!(validate_strong_password("Sunflower#2024").is_ok());
        assert!(validate_strong_password("Ab1!").is_err());
        assert!(validate_strong_password("sunflower#2024").is_err());
        assert!(validate_strong_password("SUNFLOWER#2024").is_err());
        assert!(validate_strong_password("Sunflower#abc").is_err());
        assert!(validate_strong_password("Sunflower2024").is_err());
    }

    #[test]
    fn test_password_error_codes() {
        let err = validate_strong_password("short").unwrap_err();
        assert_eq!(err.code, "password_length");
        let err = validate_strong_password("Sunflower2024").unwrap_err();
        assert_eq!(err.code, "password_special");
    }

    #[test]
    fn test_phone_number() {
        assert!(validate_phone_number("+94771234567").is_ok());
        assert!(validate_phone_number("0771234567").is_ok());
        assert!(validate_phone_number("771234567").is_err());
        assert!(validate_phone_number("+9477123456").is_err());
        assert!(validate_phone_number("07712345678").is_err());
        assert!(validate_phone_number("077123456a").is_err());
        assert!(validate_phone_number("+4477123456789").is_err());
    }

    #[test]
    fn test_person_name() {
        assert!(validate_person_name("Nimal Perera").is_ok());
        assert!(validate_person_name("   ").is_err());
        assert!(validate_person_name("R2D2").is_err());
        assert!(validate_person_name("O'Brien").is_err());
        assert!(validate_person_name("Zoë").is_err());
    }

    #[test]
    fn test_child_name() {
        assert!(validate_child_name("Mary-Jane O'Neil").is_ok());
        assert!(validate_child_name("A").is_err());
        assert!(validate_child_name("Tom3").is_err());
        assert!(validate_child_name("José").is_err());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("kasun  perera"), "Kasun Perera");
        assert_eq!(title_case("MARY-JANE o'neil"), "Mary-Jane O'Neil");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_age_in_years_before_birthday() {
        assert_eq!(age_in_years(date(2020, 6, 15), date(2025, 6, 14)), 4);
        assert_eq!(age_in_years(date(2020, 6, 15), date(2025, 6, 15)), 5);
    }

    #[test]
    fn test_child_birth_date_range() {
        let today = date(2025, 3, 1);
        assert!(check_child_birth_date(&date(2022, 1, 1), today).is_ok());
        assert!(check_child_birth_date(&date(2024, 3, 1), today).is_ok());
        assert!(check_child_birth_date(&date(2019, 3, 1), today).is_ok());

        assert_eq!(
            check_child_birth_date(&date(2025, 3, 2), today).unwrap_err().code,
            "dob_future"
        );
        assert_eq!(
            check_child_birth_date(&date(2024, 6, 1), today).unwrap_err().code,
            "dob_too_young"
        );
        assert_eq!(
            check_child_birth_date(&date(2018, 1, 1), today).unwrap_err().code,
            "dob_too_old"
        );
    }

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("hello").is_ok());
        assert!(validate_not_blank(" \n\t").is_err());
    }
}
