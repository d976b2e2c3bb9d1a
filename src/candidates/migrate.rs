//! Upgrades persisted candidate records to the current shape.
//!
//! Shape v1 stored an integer `age`; shape v2 stores `dateOfBirth`. The
//! upgrade runs once per load, and running it on a v2 record is a no-op.

use std::collections::HashSet;

use time::{macros::format_description, Date, Month, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use super::repo_types::{normalize_email, Candidate, StoredCandidate, DEFAULT_PROFILE_IMAGE};

/// Birth date used when a record carries neither a usable `dateOfBirth` nor `age`.
pub const DEFAULT_DATE_OF_BIRTH: Date = time::macros::date!(1990 - 01 - 01);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    LegacyAge,
    DateOfBirth,
    Incomplete,
}

pub fn shape_of(raw: &StoredCandidate) -> RecordShape {
    if raw.date_of_birth.as_deref().and_then(parse_birth_date).is_some() {
        RecordShape::DateOfBirth
    } else if raw.age.as_ref().and_then(legacy_age).is_some() {
        RecordShape::LegacyAge
    } else {
        RecordShape::Incomplete
    }
}

/// Accepts `YYYY-MM-DD` or a full ISO timestamp (date part is used).
pub fn parse_birth_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    let day_part = raw.get(..10).unwrap_or(raw);
    Date::parse(day_part, format_description!("[year]-[month]-[day]")).ok()
}

fn legacy_age(value: &serde_json::Value) -> Option<i32> {
    let age = match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    i32::try_from(age).ok().filter(|a| *a >= 0)
}

/// Birth date `age` years before `today`, on today's month and day.
pub fn birth_date_from_age(age: i32, today: Date) -> Date {
    let year = today.year() - age;
    Date::from_calendar_date(year, today.month(), today.day())
        // Feb 29 in a non-leap year
        .or_else(|_| Date::from_calendar_date(year, Month::February, 28))
        .unwrap_or(DEFAULT_DATE_OF_BIRTH)
}

fn opaque_id(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => {
            let id = Uuid::new_v4().to_string();
            warn!(%id, "stored candidate had no id; assigned a new one");
            id
        }
    }
}

pub fn upgrade_record(raw: StoredCandidate, today: Date) -> Candidate {
    let date_of_birth = match shape_of(&raw) {
        RecordShape::DateOfBirth => raw
            .date_of_birth
            .as_deref()
            .and_then(parse_birth_date)
            .unwrap_or(DEFAULT_DATE_OF_BIRTH),
        RecordShape::LegacyAge => raw
            .age
            .as_ref()
            .and_then(legacy_age)
            .map(|age| birth_date_from_age(age, today))
            .unwrap_or(DEFAULT_DATE_OF_BIRTH),
        RecordShape::Incomplete => DEFAULT_DATE_OF_BIRTH,
    };

    Candidate {
        id: opaque_id(raw.id),
        full_name: raw.full_name,
        email: raw.email,
        phone: raw.phone,
        date_of_birth,
        city: raw.city,
        hobbies: raw.hobbies,
        why_perfect: raw.why_perfect,
        profile_image: raw
            .profile_image
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_PROFILE_IMAGE.to_string()),
        // A record without a submission date is treated as long expired.
        submission_date: raw.submission_date.unwrap_or(OffsetDateTime::UNIX_EPOCH),
        last_edit_date: raw.last_edit_date,
    }
}

#[derive(Debug, Default)]
pub struct DecodedCollection {
    pub candidates: Vec<Candidate>,
    pub upgraded: usize,
    pub skipped: usize,
}

/// Decodes the persisted JSON array. Fails only when the blob is not a JSON
/// array at all; individual undecodable records and later duplicates of an
/// email are dropped with a warning.
pub fn decode_collection(json: &str, today: Date) -> Result<DecodedCollection, serde_json::Error> {
    let items: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut out = DecodedCollection::default();
    let mut seen = HashSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let raw: StoredCandidate = match serde_json::from_value(item) {
            Ok(r) => r,
            Err(e) => {
                warn!(index, error = %e, "skipping undecodable stored candidate");
                out.skipped += 1;
                continue;
            }
        };
        if shape_of(&raw) != RecordShape::DateOfBirth {
            out.upgraded += 1;
        }
        let candidate = upgrade_record(raw, today);
        if !seen.insert(candidate.normalized_email()) {
            warn!(index, id = %candidate.id, "dropping stored candidate with duplicate email");
            out.skipped += 1;
            continue;
        }
        out.candidates.push(candidate);
    }

    debug!(
        loaded = out.candidates.len(),
        upgraded = out.upgraded,
        skipped = out.skipped,
        "decoded candidate collection"
    );
    Ok(out)
}

/// True when `email` is already used by a record other than `except_id`.
pub(crate) fn email_taken(candidates: &[Candidate], email: &str, except_id: Option<&str>) -> bool {
    let wanted = normalize_email(email);
    candidates
        .iter()
        .any(|c| Some(c.id.as_str()) != except_id && c.normalized_email() == wanted)
}
