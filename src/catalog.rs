use crate::models::{SocketLevel, Venue, VenueAttributes, WifiLevel};
use std::collections::BTreeSet;

/// Canonical tag vocabulary offered by the search form
pub const ALL_TAGS: [&str; 9] = [
    "插座多",
    "不限時",
    "安靜",
    "Wi-Fi強",
    "有簡餐",
    "採光極佳",
    "寵物友善",
    "營業至深夜",
    "單品咖啡",
];

/// Fixed, preloaded collection of venues
///
/// Loaded once at process startup and never mutated afterwards. The catalog
/// is small enough to keep fully in memory, so there is no paging or
/// persistence protocol.
#[derive(Debug, Clone)]
pub struct Catalog {
    venues: Vec<Venue>,
}

impl Catalog {
    pub fn from_venues(venues: Vec<Venue>) -> Self {
        Self { venues }
    }

    /// The built-in venue catalog
    pub fn seed() -> Self {
        let venues = vec![
            // 工作型：插座多、安靜、不限時
            Venue {
                id: "A1".to_string(),
                name: "Homey Cafe".to_string(),
                location: "忠孝敦化".to_string(),
                address: Some("台北市大安區敦化南路一段 236 巷 36 號 2 樓".to_string()),
                distance: 300,
                tags: tag_set(&["插座多", "不限時", "Wi-Fi強", "有簡餐", "單品咖啡"]),
                attributes: VenueAttributes {
                    quietness: 4,
                    sockets: SocketLevel::Many,
                    wifi: WifiLevel::Strong,
                    time_limit: "Unlimited".to_string(),
                    food: vec!["簡餐".to_string()],
                    closing_time: "23:00".to_string(),
                },
            },
            Venue {
                id: "A5".to_string(),
                name: "All Day Roasting".to_string(),
                location: "民生社區".to_string(),
                address: Some("台北市松山區延壽街 329 號".to_string()),
                distance: 800,
                tags: tag_set(&["插座多", "Wi-Fi強", "採光極佳", "單品咖啡"]),
                attributes: VenueAttributes {
                    quietness: 5,
                    sockets: SocketLevel::Many,
                    wifi: WifiLevel::Strong,
                    time_limit: "Unlimited".to_string(),
                    food: vec!["單品咖啡".to_string()],
                    closing_time: "21:00".to_string(),
                },
            },
            // 網美型：採光極佳、有簡餐、限時
            Venue {
                id: "B1".to_string(),
                name: "Drunk Cafe 爛醉咖啡".to_string(),
                location: "國父紀念館".to_string(),
                address: Some("台北市大安區光復南路 116 巷 9 號".to_string()),
                distance: 1500,
                tags: tag_set(&["採光極佳", "有簡餐"]),
                attributes: VenueAttributes {
                    quietness: 2,
                    sockets: SocketLevel::None,
                    wifi: WifiLevel::Weak,
                    time_limit: "90min".to_string(),
                    food: vec!["簡餐".to_string()],
                    closing_time: "18:00".to_string(),
                },
            },
            // 深夜型：營業至深夜、不限時
            Venue {
                id: "C1".to_string(),
                name: "Sugar Man Cafe".to_string(),
                location: "古亭站".to_string(),
                address: Some("台北市大安區和平東路一段 87-1 號".to_string()),
                distance: 2500,
                tags: tag_set(&["營業至深夜", "不限時", "插座多", "有簡餐"]),
                attributes: VenueAttributes {
                    quietness: 4,
                    sockets: SocketLevel::Many,
                    wifi: WifiLevel::Strong,
                    time_limit: "Unlimited".to_string(),
                    food: vec!["簡餐".to_string()],
                    closing_time: "04:00".to_string(),
                },
            },
        ];

        Self { venues }
    }

    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    pub fn get(&self, id: &str) -> Option<&Venue> {
        self.venues.iter().find(|v| v.id == id)
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }
}

fn tag_set(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_seed_ids_unique() {
        let catalog = Catalog::seed();
        let ids: BTreeSet<_> = catalog.venues().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn test_seed_tags_within_vocabulary() {
        let catalog = Catalog::seed();
        for venue in catalog.venues() {
            for tag in &venue.tags {
                assert!(
                    ALL_TAGS.contains(&tag.as_str()),
                    "unknown tag {} on venue {}",
                    tag,
                    venue.id
                );
            }
        }
    }

    #[test]
    fn test_get_by_id() {
        let catalog = Catalog::seed();
        assert_eq!(catalog.get("A1").unwrap().name, "Homey Cafe");
        assert!(catalog.get("does-not-exist").is_none());
    }
}
