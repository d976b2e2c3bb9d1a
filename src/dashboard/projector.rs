use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{candidates::Candidate, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeRange {
    #[serde(rename = "18-25")]
    From18To25,
    #[serde(rename = "26-35")]
    From26To35,
    #[serde(rename = "36-45")]
    From36To45,
    #[serde(rename = "46-55")]
    From46To55,
    #[serde(rename = "55+")]
    Over55,
}

impl AgeRange {
    pub const ALL: [AgeRange; 5] = [
        AgeRange::From18To25,
        AgeRange::From26To35,
        AgeRange::From36To45,
        AgeRange::From46To55,
        AgeRange::Over55,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgeRange::From18To25 => "18-25",
            AgeRange::From26To35 => "26-35",
            AgeRange::From36To45 => "36-45",
            AgeRange::From46To55 => "46-55",
            AgeRange::Over55 => "55+",
        }
    }

    pub fn contains(self, age: i32) -> bool {
        match self {
            AgeRange::From18To25 => (18..=25).contains(&age),
            AgeRange::From26To35 => (26..=35).contains(&age),
            AgeRange::From36To45 => (36..=45).contains(&age),
            AgeRange::From46To55 => (46..=55).contains(&age),
            AgeRange::Over55 => age > 55,
        }
    }

    pub fn for_age(age: i32) -> Option<AgeRange> {
        Self::ALL.into_iter().find(|r| r.contains(age))
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeRange {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.label() == s.trim())
            .ok_or_else(|| AppError::Validation(format!("unknown age range {s:?}")))
    }
}

/// Active dashboard filters. Empty / `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_term: String,
    pub city: String,
    pub age_range: Option<AgeRange>,
}

impl FilterCriteria {
    /// Builds criteria from raw query values; blank strings mean "any".
    pub fn parse(
        search: Option<&str>,
        city: Option<&str>,
        age_range: Option<&str>,
    ) -> Result<Self, AppError> {
        let age_range = match age_range.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse()?),
            None => None,
        };
        Ok(Self {
            search_term: search.unwrap_or_default().trim().to_string(),
            city: city.unwrap_or_default().trim().to_string(),
            age_range,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty() && self.city.is_empty() && self.age_range.is_none()
    }

    pub fn matches(&self, candidate: &Candidate, today: Date) -> bool {
        self.matches_search(candidate) && self.matches_city(candidate) && self.matches_age(candidate, today)
    }

    fn matches_search(&self, candidate: &Candidate) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let needle = self.search_term.to_lowercase();
        candidate.full_name.to_lowercase().contains(&needle)
            || candidate.email.to_lowercase().contains(&needle)
    }

    fn matches_city(&self, candidate: &Candidate) -> bool {
        self.city.is_empty() || candidate.city == self.city
    }

    fn matches_age(&self, candidate: &Candidate, today: Date) -> bool {
        match self.age_range {
            Some(range) => range.contains(candidate.age_on(today)),
            None => true,
        }
    }
}

/// Filtered view over a candidate list. Either input can change on its own;
/// the view is recomputed from the latest of both on every change.
#[derive(Debug, Clone)]
pub struct Projector {
    today: Date,
    candidates: Vec<Candidate>,
    filters: FilterCriteria,
    view: Vec<Candidate>,
}

impl Projector {
    pub fn new(today: Date) -> Self {
        Self {
            today,
            candidates: Vec::new(),
            filters: FilterCriteria::default(),
            view: Vec::new(),
        }
    }

    pub fn set_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
        self.recompute();
    }

    pub fn set_filters(&mut self, filters: FilterCriteria) {
        self.filters = filters;
        self.recompute();
    }

    pub fn reset_filters(&mut self) {
        self.set_filters(FilterCriteria::default());
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn projected_view(&self) -> &[Candidate] {
        &self.view
    }

    fn recompute(&mut self) {
        self.view = project(&self.candidates, &self.filters, self.today);
    }
}

pub fn project(candidates: &[Candidate], filters: &FilterCriteria, today: Date) -> Vec<Candidate> {
    candidates
        .iter()
        .filter(|c| filters.matches(c, today))
        .cloned()
        .collect()
}

pub fn distinct_cities(candidates: &[Candidate]) -> BTreeSet<String> {
    candidates.iter().map(|c| c.city.clone()).collect()
}
