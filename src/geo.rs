//! Distance and travel-time helpers
//!
//! Pure functions; coordinate ranges are validated by callers.

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Average city driving speed assumed for travel estimates.
pub const AVERAGE_SPEED_KMH: f64 = 30.0;

/// Great-circle distance between two points in kilometres.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Travel time in whole minutes at [`AVERAGE_SPEED_KMH`], rounded up.
pub fn estimated_travel_minutes(distance_km: f64) -> i32 {
    (distance_km / AVERAGE_SPEED_KMH * 60.0).ceil() as i32
}

pub fn is_within_service_range(
    user_lat: f64,
    user_lon: f64,
    site_lat: f64,
    site_lon: f64,
    max_minutes: i32,
) -> bool {
    let distance = distance_km(user_lat, user_lon, site_lat, site_lon);
    estimated_travel_minutes(distance) <= max_minutes
}

/// Human-readable distance, metres below one kilometre.
pub fn distance_text(distance_km: f64) -> String {
    if distance_km < 1.0 {
        format!("{:.0} m away", distance_km * 1000.0)
    } else {
        format!("{:.1} km away", distance_km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAGOS: (f64, f64) = (6.5244, 3.3792);
    const IBADAN: (f64, f64) = (7.3775, 3.9470);

    #[test]
    fn same_point_is_zero_distance() {
        for (lat, lon) in [(0.0, 0.0), LAGOS, (-33.86, 151.21), (89.9, -179.9)] {
            assert_eq!(distance_km(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let there = distance_km(LAGOS.0, LAGOS.1, IBADAN.0, IBADAN.1);
        let back = distance_km(IBADAN.0, IBADAN.1, LAGOS.0, LAGOS.1);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn lagos_to_ibadan_is_about_113_km() {
        let d = distance_km(LAGOS.0, LAGOS.1, IBADAN.0, IBADAN.1);
        assert!((d - 113.0).abs() < 3.0, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn travel_minutes_round_up() {
        assert_eq!(estimated_travel_minutes(0.0), 0);
        assert_eq!(estimated_travel_minutes(0.1), 1);
        assert_eq!(estimated_travel_minutes(15.0), 30);
        assert_eq!(estimated_travel_minutes(15.01), 31);
    }

    #[test]
    fn travel_minutes_never_decrease() {
        let mut previous = estimated_travel_minutes(0.0);
        for step in 1..2000 {
            let current = estimated_travel_minutes(step as f64 * 0.137);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn service_range_uses_travel_time() {
        // ~11.1 km north: 23 minutes at 30 km/h
        assert!(is_within_service_range(0.0, 0.0, 0.1, 0.0, 23));
        assert!(!is_within_service_range(0.0, 0.0, 0.1, 0.0, 22));
    }

    #[test]
    fn distance_text_switches_units() {
        assert_eq!(distance_text(0.85), "850 m away");
        assert_eq!(distance_text(3.44), "3.4 km away");
    }
}
