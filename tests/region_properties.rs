//! Property tests for rain regions and season flips

use planet_weather::controller::Region;
use planet_weather::core::types::GeoPoint;
use planet_weather::planet::SeasonZones;
use proptest::prelude::*;

fn point() -> impl Strategy<Value = GeoPoint> {
    (-90.0f64..=90.0, -179.999f64..=180.0).prop_map(|(lat, lon)| GeoPoint::new(lat, lon))
}

proptest! {
    #[test]
    fn normalization_ignores_corner_order(a in point(), b in point()) {
        prop_assert_eq!(Region::from_corners(a, b), Region::from_corners(b, a));
    }

    #[test]
    fn normalized_corners_are_ordered(a in point(), b in point()) {
        let region = Region::from_corners(a, b);
        prop_assert!(region.lower_left.latitude <= region.upper_right.latitude);
        prop_assert!(region.lower_left.longitude <= region.upper_right.longitude);
    }

    #[test]
    fn region_contains_its_corners(a in point(), b in point()) {
        let region = Region::from_corners(a, b);
        prop_assert!(region.contains(a));
        prop_assert!(region.contains(b));
        prop_assert!(region.contains(region.lower_left));
        prop_assert!(region.contains(region.upper_right));
    }

    #[test]
    fn flipping_twice_restores_assignment(zones in prop::collection::btree_set("[A-Z][a-z]{0,6}", 0..12)) {
        let original = SeasonZones::split(zones.iter().cloned());
        prop_assert!(original.summer().is_disjoint(original.winter()));
        prop_assert_eq!(original.all(), zones);

        let mut flipped = original.clone();
        flipped.flip();
        prop_assert_eq!(flipped.summer(), original.winter());
        flipped.flip();
        prop_assert_eq!(flipped, original);
    }
}
