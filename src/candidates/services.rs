use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use time::{Date, Duration, OffsetDateTime};

use super::repo_types::{age_between, CandidateDraft};
use crate::error::{AppError, AppResult};

pub const EDIT_WINDOW_DAYS: i64 = 3;
pub const MIN_AGE: i32 = 18;
pub const MAX_AGE: i32 = 100;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn is_valid_phone(phone: &str) -> bool {
    lazy_static! {
        static ref PHONE_RE: Regex = Regex::new(r"^[0-9+\-\s()]*$").unwrap();
    }
    !phone.is_empty() && PHONE_RE.is_match(phone)
}

/// Trims and strips angle brackets.
pub fn sanitize(input: &str) -> String {
    input.trim().replace(['<', '>'], "")
}

/// Sanitizes every text field and checks the registration form rules.
pub fn validate_draft(draft: CandidateDraft, today: Date) -> AppResult<CandidateDraft> {
    let draft = CandidateDraft {
        full_name: sanitize(&draft.full_name),
        email: sanitize(&draft.email),
        phone: sanitize(&draft.phone),
        date_of_birth: draft.date_of_birth,
        city: sanitize(&draft.city),
        hobbies: sanitize(&draft.hobbies),
        why_perfect: sanitize(&draft.why_perfect),
        profile_image: draft.profile_image.filter(|img| !img.trim().is_empty()),
    };

    if !is_valid_email(&draft.email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if !draft.full_name.contains(' ') {
        return Err(AppError::Validation(
            "Full name must include first and last name".into(),
        ));
    }
    if !is_valid_phone(&draft.phone) {
        return Err(AppError::Validation("Invalid phone number".into()));
    }
    let age = age_between(draft.date_of_birth, today);
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(AppError::Validation(format!(
            "Age must be between {MIN_AGE} and {MAX_AGE}"
        )));
    }
    for (field, value) in [
        ("city", &draft.city),
        ("hobbies", &draft.hobbies),
        ("whyPerfect", &draft.why_perfect),
    ] {
        if value.is_empty() {
            return Err(AppError::Validation(format!("{field} is required")));
        }
    }
    Ok(draft)
}

fn elapsed_days(submitted: OffsetDateTime, now: OffsetDateTime) -> f64 {
    (now - submitted).as_seconds_f64() / Duration::DAY.as_seconds_f64()
}

/// Edits are accepted up to and including the instant the third day elapses.
pub fn within_edit_window(submitted: OffsetDateTime, now: OffsetDateTime) -> bool {
    now - submitted <= Duration::days(EDIT_WINDOW_DAYS)
}

/// `max(0, ceil(3 - elapsedDays))`
pub fn days_remaining(submitted: OffsetDateTime, now: OffsetDateTime) -> u32 {
    let left = (EDIT_WINDOW_DAYS as f64 - elapsed_days(submitted, now)).ceil();
    if left <= 0.0 {
        0
    } else {
        left as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditWindowStatus {
    pub editable: bool,
    pub days_remaining: u32,
    pub message: String,
}

impl EditWindowStatus {
    pub fn not_found() -> Self {
        Self {
            editable: false,
            days_remaining: 0,
            message: "No registration found for this email address.".into(),
        }
    }

    pub fn for_submission(submitted: OffsetDateTime, now: OffsetDateTime) -> Self {
        if within_edit_window(submitted, now) {
            let days_remaining = days_remaining(submitted, now);
            let message = if days_remaining == 0 {
                "You can edit your submission. The editing window closes now.".to_string()
            } else {
                format!("You can edit your submission. {days_remaining} day(s) remaining.")
            };
            Self {
                editable: true,
                days_remaining,
                message,
            }
        } else {
            Self {
                editable: false,
                days_remaining: 0,
                message: "The 3-day editing window has expired. You can no longer edit your submission."
                    .into(),
            }
        }
    }
}
