use std::collections::HashMap;

use serde::Serialize;
use time::Date;

use super::{
    cities::{coordinates_for, is_recognized},
    projector::AgeRange,
};
use crate::candidates::Candidate;

const TOP_CITIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeGroupCount {
    pub range: AgeRange,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityCount {
    pub city: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitSummary {
    pub visits: u64,
    pub registrations: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub city: String,
    pub coordinates: [f64; 2],
}

/// Count per age bin, always all five bins in order. Under-18s are not counted.
pub fn age_groups(candidates: &[Candidate], today: Date) -> Vec<AgeGroupCount> {
    let mut counts = [0usize; 5];
    for c in candidates {
        if let Some(range) = AgeRange::for_age(c.age_on(today)) {
            if let Some(i) = AgeRange::ALL.iter().position(|r| *r == range) {
                counts[i] += 1;
            }
        }
    }
    AgeRange::ALL
        .into_iter()
        .zip(counts)
        .map(|(range, count)| AgeGroupCount { range, count })
        .collect()
}

/// Busiest recognized cities, most candidates first.
pub fn top_cities(candidates: &[Candidate]) -> Vec<CityCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for c in candidates.iter().filter(|c| is_recognized(&c.city)) {
        *counts.entry(c.city.as_str()).or_default() += 1;
    }
    let mut sorted: Vec<CityCount> = counts
        .into_iter()
        .map(|(city, count)| CityCount {
            city: city.to_string(),
            count,
        })
        .collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.city.cmp(&b.city)));
    sorted.truncate(TOP_CITIES);
    sorted
}

pub fn visit_summary(visits: u64, registrations: u64) -> VisitSummary {
    let conversion_rate = if visits == 0 {
        0.0
    } else {
        ((registrations as f64 / visits as f64) * 100.0 * 100.0).round() / 100.0
    };
    VisitSummary {
        visits,
        registrations,
        conversion_rate,
    }
}

pub fn map_markers(candidates: &[Candidate], today: Date) -> Vec<MapMarker> {
    candidates
        .iter()
        .filter_map(|c| {
            coordinates_for(&c.city).map(|coordinates| MapMarker {
                id: c.id.clone(),
                name: c.full_name.clone(),
                email: c.email.clone(),
                age: c.age_on(today),
                city: c.city.clone(),
                coordinates,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::projector::tests::{candidate, roster, TODAY};
    use time::macros::date;

    #[test]
    fn age_groups_cover_every_bin() {
        let mut list = roster();
        list.push(candidate("6", "Kid Young", "kid@x.com", "Lod", date!(2010 - 01 - 01)));
        let groups = age_groups(&list, TODAY);
        let counts: Vec<(&str, usize)> = groups.iter().map(|g| (g.range.label(), g.count)).collect();
        assert_eq!(
            counts,
            vec![("18-25", 1), ("26-35", 1), ("36-45", 1), ("46-55", 1), ("55+", 1)]
        );
    }

    #[test]
    fn top_cities_ignores_unrecognized_and_caps_at_five() {
        let mut list = roster();
        for (i, city) in ["Eilat", "Lod", "Holon", "Holon", "Nazareth"].iter().enumerate() {
            let id = format!("x{i}");
            list.push(candidate(&id, "Some One", &format!("{id}@x.com"), city, TODAY));
        }
        let top = top_cities(&list);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].count, 2);
        assert!(top.iter().all(|c| c.city != "Springfield"));
        // ties broken by name
        assert_eq!(top[0].city, "Haifa");
        assert_eq!(top[1].city, "Holon");
        assert_eq!(top[2].city, "Tel Aviv");
        assert_eq!(top[3].city, "Eilat");
        assert_eq!(top[4].city, "Lod");
    }

    #[test]
    fn conversion_rate_rounds_and_handles_zero_visits() {
        assert_eq!(visit_summary(0, 3).conversion_rate, 0.0);
        assert_eq!(visit_summary(3, 1).conversion_rate, 33.33);
        assert_eq!(visit_summary(4, 4).conversion_rate, 100.0);
    }

    #[test]
    fn markers_only_for_recognized_cities() {
        let markers = map_markers(&roster(), TODAY);
        assert_eq!(markers.len(), 4);
        let noa = markers.iter().find(|m| m.id == "3").unwrap();
        assert_eq!(noa.age, 44);
        assert_eq!(noa.coordinates, coordinates_for("Haifa").unwrap());
    }
}
