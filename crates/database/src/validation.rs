//! Input validation for user-supplied fields.

use std::fmt;

use chrono::NaiveDate;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Invalid username format.
    InvalidUsername(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
    /// Negative amount where only grants are allowed.
    NegativeAmount(i64),
    /// Range whose start is after its end.
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    /// A user following themselves.
    SelfFollow,
    /// A habit stacked on itself.
    SelfStack,
    /// A contract naming its creator as the partner.
    SelfPartner,
    /// Stack position below zero.
    NegativePosition(i64),
    /// Search text shorter than the minimum.
    QueryTooShort { min: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::InvalidUsername(msg) => write!(f, "Invalid username: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::NegativeAmount(amount) => {
                write!(f, "points amount cannot be negative ({})", amount)
            }
            ValidationError::InvalidDateRange { start, end } => {
                write!(f, "start date {} is after end date {}", start, end)
            }
            ValidationError::SelfFollow => write!(f, "users cannot follow themselves"),
            ValidationError::SelfStack => write!(f, "a habit cannot be stacked on itself"),
            ValidationError::SelfPartner => {
                write!(f, "the accountability partner must be another user")
            }
            ValidationError::NegativePosition(position) => {
                write!(f, "stack position cannot be negative ({})", position)
            }
            ValidationError::QueryTooShort { min } => {
                write!(f, "search query must be at least {} characters", min)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for usernames.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Maximum allowed length for habit and challenge titles.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum allowed length for descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Maximum allowed length for entry notes and comments.
pub const MAX_NOTE_LENGTH: usize = 500;

/// Maximum allowed length for a reaction emoji.
pub const MAX_EMOJI_LENGTH: usize = 10;

/// Maximum allowed length for contract terms.
pub const MAX_TERMS_LENGTH: usize = 2000;

/// Shortest accepted user search.
pub const MIN_SEARCH_LENGTH: usize = 2;

fn require(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    limit(field, value, max)
}

fn limit(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual,
        });
    }
    Ok(())
}

/// Shape check only: one `@`, a non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    require("email", email, MAX_EMAIL_LENGTH)?;

    let invalid = |why: &str| Err(ValidationError::InvalidEmail(why.to_string()));
    match email.split_once('@') {
        None => invalid("missing @"),
        Some((_, domain)) if domain.contains('@') => invalid("more than one @"),
        Some(("", _)) => invalid("nothing before @"),
        Some((_, domain)) if !domain.contains('.') => invalid("domain has no dot"),
        Some((_, domain))
            if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") =>
        {
            invalid("malformed domain")
        }
        Some(_) => Ok(()),
    }
}

/// Validate a username: letters, digits and `@.+-_`, like most web frameworks allow.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    require("username", username, MAX_USERNAME_LENGTH)?;

    if let Some(c) = username
        .trim()
        .chars()
        .find(|c| !(c.is_alphanumeric() || "@.+-_".contains(*c)))
    {
        return Err(ValidationError::InvalidUsername(format!(
            "invalid character '{}'",
            c
        )));
    }

    Ok(())
}

/// Validate a habit or challenge title.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    require("title", title, MAX_TITLE_LENGTH)
}

/// Validate an optional free-text description.
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    limit("description", description, MAX_DESCRIPTION_LENGTH)
}

/// Validate an optional entry note.
pub fn validate_note(note: &str) -> Result<(), ValidationError> {
    limit("note", note, MAX_NOTE_LENGTH)
}

/// Validate a comment body.
pub fn validate_comment(text: &str) -> Result<(), ValidationError> {
    require("comment", text, MAX_NOTE_LENGTH)
}

/// Validate a reaction emoji.
pub fn validate_emoji(emoji: &str) -> Result<(), ValidationError> {
    require("emoji", emoji, MAX_EMOJI_LENGTH)
}

/// Validate accountability contract terms.
pub fn validate_terms(terms: &str) -> Result<(), ValidationError> {
    require("terms", terms, MAX_TERMS_LENGTH)
}

/// Validate a stack position.
pub fn validate_position(position: i64) -> Result<(), ValidationError> {
    if position < 0 {
        return Err(ValidationError::NegativePosition(position));
    }
    Ok(())
}

/// Validate user search text, returning it trimmed.
pub fn validate_search(query: &str) -> Result<&str, ValidationError> {
    let query = query.trim();
    if query.chars().count() < MIN_SEARCH_LENGTH {
        return Err(ValidationError::QueryTooShort {
            min: MIN_SEARCH_LENGTH,
        });
    }
    Ok(query)
}

/// Validate a points grant.
pub fn validate_points(amount: i64) -> Result<(), ValidationError> {
    if amount < 0 {
        return Err(ValidationError::NegativeAmount(amount));
    }
    Ok(())
}

/// Validate that a date range is ordered.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::InvalidDateRange { start, end });
    }
    Ok(())
}
