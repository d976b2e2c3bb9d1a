use serde::Serialize;

/// Initial map view, roughly the centre of Israel.
pub const MAP_CENTER: [f64; 2] = [31.0461, 34.8516];
pub const MAP_ZOOM: u8 = 8;

/// The recognized cities and their `[lat, lng]`. Only candidates in one of
/// these show up on the city chart and the map.
pub const RECOGNIZED_CITIES: [(&str, [f64; 2]); 20] = [
    ("Tel Aviv", [32.0853, 34.7818]),
    ("Jerusalem", [31.7683, 35.2137]),
    ("Haifa", [32.7940, 34.9896]),
    ("Beer Sheva", [31.2518, 34.7913]),
    ("Netanya", [32.3215, 34.8532]),
    ("Ashdod", [31.8044, 34.6553]),
    ("Rishon LeZion", [31.9730, 34.7925]),
    ("Petah Tikva", [32.0840, 34.8878]),
    ("Holon", [32.0158, 34.7874]),
    ("Bnei Brak", [32.0807, 34.8338]),
    ("Rehovot", [31.8928, 34.8113]),
    ("Kfar Saba", [32.1750, 34.9070]),
    ("Herzliya", [32.1663, 34.8433]),
    ("Modiin", [31.8980, 35.0104]),
    ("Ra'anana", [32.1848, 34.8713]),
    ("Kiryat Gat", [31.6100, 34.7642]),
    ("Lod", [31.9510, 34.8881]),
    ("Nazareth", [32.6996, 35.3035]),
    ("Tiberias", [32.7959, 35.5310]),
    ("Eilat", [29.5577, 34.9519]),
];

pub fn coordinates_for(city: &str) -> Option<[f64; 2]> {
    RECOGNIZED_CITIES
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, coords)| *coords)
}

pub fn is_recognized(city: &str) -> bool {
    coordinates_for(city).is_some()
}

#[derive(Debug, Clone, Serialize)]
pub struct CityInfo {
    pub name: &'static str,
    pub coordinates: [f64; 2],
}

pub fn recognized_cities() -> Vec<CityInfo> {
    RECOGNIZED_CITIES
        .iter()
        .map(|(name, coordinates)| CityInfo {
            name,
            coordinates: *coordinates,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact() {
        assert_eq!(coordinates_for("Haifa"), Some([32.7940, 34.9896]));
        assert!(coordinates_for("haifa").is_none());
        assert!(is_recognized("Ra'anana"));
        assert!(!is_recognized("Springfield"));
    }

    #[test]
    fn twenty_distinct_cities() {
        let mut names: Vec<_> = RECOGNIZED_CITIES.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 20);
        assert_eq!(recognized_cities().len(), 20);
    }
}
