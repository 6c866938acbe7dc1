use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

pub fn validate_email(email: &str) -> bool {
    let email_regex = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();

    email_regex.is_match(email) && email.len() <= 254
}

pub fn validate_phone(phone: &str) -> bool {
    let phone_regex = Regex::new(r"^\+?[1-9]\d{1,14}$|^\+?\d{1,4}[\s\-\.\(\)]*\d{1,14}$").unwrap();

    phone_regex.is_match(phone)
}

/// National identity document: digits only, 6 to 12 of them.
pub fn validate_document_number(document: &str) -> bool {
    let doc_regex = Regex::new(r"^\d{6,12}$").unwrap();

    doc_regex.is_match(document)
}

/// Minimum bar for account passwords: at least 6 characters containing at
/// least one letter and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.len() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("Password must contain at least one letter".to_string());
    }
    if !password.chars().any(|c| c.is_numeric()) {
        return Err("Password must contain at least one number".to_string());
    }
    Ok(())
}

/// Parses an appointment datetime. Accepts a space or a `T` between the
/// date and time parts, seconds optional.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    for format in FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }

    Err(format!("Invalid datetime: '{}', expected YYYY-MM-DD HH:MM:SS", value))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date: '{}', expected YYYY-MM-DD", value))
}

pub fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| format!("Invalid time: '{}', expected HH:MM", value))
}
