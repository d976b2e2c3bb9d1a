use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Placeholder avatar stored when a submission carries no image.
pub const DEFAULT_PROFILE_IMAGE: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iMTAwIiBoZWlnaHQ9IjEwMCIgdmlld0JveD0iMCAwIDEwMCAxMDAiIGZpbGw9Im5vbmUiIHhtbG5zPSJodHRwOi8vd3d3LnczLm9yZy8yMDAwL3N2ZyI+CjxyZWN0IHdpZHRoPSIxMDAiIGhlaWdodD0iMTAwIiBmaWxsPSIjRjVGNUY1Ii8+CjxjaXJjbGUgY3g9IjUwIiBjeT0iNDAiIHI9IjE1IiBmaWxsPSIjQ0NDIi8+CjxyZWN0IHg9IjMwIiB5PSI2MCIgd2lkdGg9IjQwIiBoZWlnaHQ9IjMwIiBmaWxsPSIjQ0NDIi8+Cjwvc3ZnPgo=";

/// One registration, in its current (dateOfBirth) shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,                   // opaque, never reassigned
    pub full_name: String,
    pub email: String,                // dedup key, compared lower-cased
    pub phone: String,
    #[serde(with = "iso_date")]
    pub date_of_birth: Date,
    pub city: String,
    pub hobbies: String,
    pub why_perfect: String,
    pub profile_image: String,        // data URI
    #[serde(with = "time::serde::rfc3339")]
    pub submission_date: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_edit_date: Option<OffsetDateTime>,
}

impl Candidate {
    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }

    /// Whole years between `date_of_birth` and `today`.
    pub fn age_on(&self, today: Date) -> i32 {
        age_between(self.date_of_birth, today)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn age_between(born: Date, today: Date) -> i32 {
    let mut age = today.year() - born.year();
    let birthday_passed = (today.month() as u8, today.day()) >= (born.month() as u8, born.day());
    if !birthday_passed {
        age -= 1;
    }
    age
}

/// Form fields submitted on registration or edit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDraft {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(with = "iso_date")]
    pub date_of_birth: Date,
    pub city: String,
    pub hobbies: String,
    pub why_perfect: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// Persisted record as read back from storage, in any historical shape.
/// Shape v1 carried an integer `age`; shape v2 carries `dateOfBirth`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCandidate {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub age: Option<serde_json::Value>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub hobbies: String,
    #[serde(default)]
    pub why_perfect: String,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub submission_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_edit_date: Option<OffsetDateTime>,
}
