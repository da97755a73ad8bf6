//! Field-level validation rules.
//!
//! Pure and deterministic: callers get the complete list of violations in
//! one pass so the UI can display all of them at once.

use crate::error::FieldViolation;

pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 5;
pub const TITLE_MAX_CHARS: usize = 200;
pub const COMMENT_MIN_CHARS: usize = 5;
pub const COMMENT_MAX_CHARS: usize = 3000;

/// Validate the author-editable fields of a review. Comment length is
/// measured after trimming surrounding whitespace. Returns an empty list
/// iff all fields are valid.
pub fn validate_review_fields(
    rating: i32,
    title: Option<&str>,
    comment: &str,
) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        violations.push(FieldViolation::new(
            "rating",
            format!("must be between {RATING_MIN} and {RATING_MAX}"),
        ));
    }

    if let Some(title) = title {
        if title.chars().count() > TITLE_MAX_CHARS {
            violations.push(FieldViolation::new(
                "title",
                format!("must be at most {TITLE_MAX_CHARS} characters"),
            ));
        }
    }

    let comment_len = comment.trim().chars().count();
    if comment_len < COMMENT_MIN_CHARS {
        violations.push(FieldViolation::new(
            "comment",
            format!("must be at least {COMMENT_MIN_CHARS} characters"),
        ));
    } else if comment_len > COMMENT_MAX_CHARS {
        violations.push(FieldViolation::new(
            "comment",
            format!("must be at most {COMMENT_MAX_CHARS} characters"),
        ));
    }

    violations
}

/// A reply message must be non-empty after trimming.
pub fn validate_reply_message(message: &str) -> Vec<FieldViolation> {
    if message.trim().is_empty() {
        vec![FieldViolation::new("message", "must not be empty")]
    } else {
        Vec::new()
    }
}
