use serde::{Deserialize, Serialize};

use super::{
    cities::CityInfo,
    stats::{AgeGroupCount, CityCount, MapMarker, VisitSummary},
};
use crate::candidates::Candidate;

/// Query string of the candidates table. Blank values mean "any".
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    pub search: Option<String>,
    pub city: Option<String>,
    pub age_range: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CandidatesView {
    pub total: usize,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub age_groups: Vec<AgeGroupCount>,
    pub top_cities: Vec<CityCount>,
    pub visits: VisitSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapResponse {
    pub center: [f64; 2],
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
    /// Candidates whose city has no known coordinates.
    pub unplaced: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CitiesResponse {
    pub in_use: Vec<String>,
    pub recognized: Vec<CityInfo>,
}
