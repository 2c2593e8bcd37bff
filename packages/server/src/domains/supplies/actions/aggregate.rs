//! Supply aggregation: remaining quantities per item, grouped by the
//! reverse-geocoded region of each confirmed pin.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::common::coarsen_coords;
use crate::domains::supplies::models::SupplyRow;
use crate::kernel::BaseGeocoder;

pub const UNKNOWN_REGION: &str = "Unknown region";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemTotal {
    pub item_name: String,
    pub unit: Option<String>,
    pub total_remaining: i64,
    /// Pins in the region still asking for this item
    pub pin_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegionSupplies {
    pub region: String,
    /// Pins in the region with anything outstanding
    pub pin_count: usize,
    pub items: Vec<ItemTotal>,
}

#[derive(Default)]
struct ItemAccumulator {
    unit: Option<String>,
    total: i64,
    pins: HashSet<Uuid>,
}

#[derive(Default)]
struct RegionAccumulator {
    items: BTreeMap<String, ItemAccumulator>,
    pins: HashSet<Uuid>,
}

/// Memo key: coordinates coarsened to 2 decimals, in hundredths
fn memo_key(latitude: f64, longitude: f64) -> (i64, i64) {
    let (lat, lng) = coarsen_coords(latitude, longitude);
    ((lat * 100.0).round() as i64, (lng * 100.0).round() as i64)
}

/// Resolves region labels, calling the geocoder once per coarse cell
struct RegionResolver<'a> {
    geocoder: &'a dyn BaseGeocoder,
    memo: HashMap<(i64, i64), String>,
}

impl<'a> RegionResolver<'a> {
    fn new(geocoder: &'a dyn BaseGeocoder) -> Self {
        Self {
            geocoder,
            memo: HashMap::new(),
        }
    }

    async fn resolve(&mut self, latitude: f64, longitude: f64) -> String {
        let key = memo_key(latitude, longitude);
        if let Some(label) = self.memo.get(&key) {
            return label.clone();
        }

        let (lat, lng) = coarsen_coords(latitude, longitude);
        let label = match self.geocoder.reverse(lat, lng).await {
            Ok(Some(label)) if !label.trim().is_empty() => label,
            Ok(_) => UNKNOWN_REGION.to_string(),
            Err(e) => {
                warn!(error = %e, latitude = lat, longitude = lng, "Reverse geocoding failed");
                UNKNOWN_REGION.to_string()
            }
        };

        self.memo.insert(key, label.clone());
        label
    }
}

/// Group supply rows by region and item.
///
/// Regions come out sorted by name with items sorted by name. Rows with
/// nothing remaining are ignored, so zero totals and empty regions never
/// appear.
pub async fn aggregate_supplies(
    rows: &[SupplyRow],
    geocoder: &dyn BaseGeocoder,
) -> Vec<RegionSupplies> {
    let mut resolver = RegionResolver::new(geocoder);
    let mut regions: BTreeMap<String, RegionAccumulator> = BTreeMap::new();

    for row in rows.iter().filter(|r| r.quantity_remaining > 0) {
        let region = resolver.resolve(row.latitude, row.longitude).await;

        let acc = regions.entry(region).or_default();
        acc.pins.insert(row.pin_id);

        let item = acc.items.entry(row.item_name.clone()).or_default();
        item.total += i64::from(row.quantity_remaining);
        item.pins.insert(row.pin_id);
        if item.unit.is_none() {
            item.unit = row.unit.clone();
        }
    }

    debug!(
        rows = rows.len(),
        regions = regions.len(),
        lookups = resolver.memo.len(),
        "Supplies aggregated"
    );

    regions
        .into_iter()
        .filter(|(_, acc)| !acc.items.is_empty())
        .map(|(region, acc)| RegionSupplies {
            region,
            pin_count: acc.pins.len(),
            items: acc
                .items
                .into_iter()
                .map(|(item_name, item)| ItemTotal {
                    item_name,
                    unit: item.unit,
                    total_remaining: item.total,
                    pin_count: item.pins.len(),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockGeocoder;

    fn row(pin: Uuid, lat: f64, lng: f64, item: &str, remaining: i32) -> SupplyRow {
        SupplyRow {
            pin_id: pin,
            latitude: lat,
            longitude: lng,
            item_name: item.to_string(),
            unit: Some("units".to_string()),
            quantity_remaining: remaining,
        }
    }

    #[tokio::test]
    async fn test_groups_by_region_and_item() {
        let geocoder = MockGeocoder::new()
            .with_region(44.98, -93.27, "Minneapolis, Minnesota")
            .with_region(46.79, -92.10, "Duluth, Minnesota");

        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let rows = vec![
            row(a, 44.977, -93.265, "Water", 10),
            row(a, 44.977, -93.265, "Blankets", 4),
            row(b, 44.981, -93.271, "Water", 5),
            row(c, 46.786, -92.100, "Water", 7),
        ];

        let regions = aggregate_supplies(&rows, &geocoder).await;

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].region, "Duluth, Minnesota");
        assert_eq!(regions[0].pin_count, 1);
        assert_eq!(regions[0].items[0].total_remaining, 7);

        let minneapolis = &regions[1];
        assert_eq!(minneapolis.region, "Minneapolis, Minnesota");
        assert_eq!(minneapolis.pin_count, 2);
        let names: Vec<&str> = minneapolis.items.iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(names, vec!["Blankets", "Water"]);
        assert_eq!(minneapolis.items[1].total_remaining, 15);
        assert_eq!(minneapolis.items[1].pin_count, 2);
    }

    #[tokio::test]
    async fn test_memoizes_lookups_per_coarse_cell() {
        let geocoder = MockGeocoder::new().with_region(44.98, -93.27, "Minneapolis, Minnesota");
        let pin = Uuid::new_v4();
        let rows = vec![
            row(pin, 44.9771, -93.2651, "Water", 1),
            row(pin, 44.9779, -93.2659, "Food", 1),
            row(Uuid::new_v4(), 44.9801, -93.2702, "Water", 1),
        ];

        aggregate_supplies(&rows, &geocoder).await;
        assert_eq!(geocoder.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_falls_back() {
        let geocoder = MockGeocoder::failing();
        let rows = vec![row(Uuid::new_v4(), 10.0, 10.0, "Water", 3)];

        let regions = aggregate_supplies(&rows, &geocoder).await;
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].region, UNKNOWN_REGION);
    }

    #[tokio::test]
    async fn test_unresolved_location_falls_back() {
        let geocoder = MockGeocoder::new();
        let rows = vec![row(Uuid::new_v4(), -60.0, 150.0, "Water", 3)];

        let regions = aggregate_supplies(&rows, &geocoder).await;
        assert_eq!(regions[0].region, UNKNOWN_REGION);
    }

    #[tokio::test]
    async fn test_zero_remaining_is_omitted() {
        let geocoder = MockGeocoder::new().with_region(44.98, -93.27, "Minneapolis, Minnesota");
        let rows = vec![
            row(Uuid::new_v4(), 44.98, -93.27, "Water", 0),
            row(Uuid::new_v4(), 44.98, -93.27, "Food", 2),
        ];

        let regions = aggregate_supplies(&rows, &geocoder).await;
        assert_eq!(regions[0].items.len(), 1);
        assert_eq!(regions[0].items[0].item_name, "Food");
        assert_eq!(regions[0].pin_count, 1);

        let all_zero = vec![row(Uuid::new_v4(), 44.98, -93.27, "Water", 0)];
        assert!(aggregate_supplies(&all_zero, &geocoder).await.is_empty());
    }
}
