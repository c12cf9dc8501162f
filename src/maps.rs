//! Map-viewer URL builder (§6): hands an ordered stop list to an external
//! map viewer rather than emitting turn-by-turn directions itself.

/// Build a `google.com/maps/dir` deep link for `start` and `stops`, in
/// order. `return_home` makes the destination loop back to `start` (all
/// stops become waypoints); otherwise the last stop is the destination and
/// the rest are waypoints. Invalid coordinates (any component `None`) are
/// dropped before assembly. `None` if there are no valid stops.
pub fn build_directions_url(start: (f64, f64), stops: &[Option<(f64, f64)>], return_home: bool) -> Option<String> {
    let valid_stops: Vec<(f64, f64)> = stops.iter().filter_map(|s| *s).collect();
    if valid_stops.is_empty() {
        return None;
    }

    let (destination, waypoints): ((f64, f64), &[(f64, f64)]) = if return_home {
        (start, &valid_stops[..])
    } else {
        let (last, rest) = valid_stops.split_last().expect("non-empty, checked above");
        (*last, rest)
    };

    let mut url = format!(
        "https://www.google.com/maps/dir/?api=1&origin={}&destination={}&travelmode=driving",
        format_coord(start),
        format_coord(destination),
    );
    if !waypoints.is_empty() {
        let joined = waypoints.iter().map(|w| format_coord(*w)).collect::<Vec<_>>().join("|");
        url.push_str("&waypoints=");
        url.push_str(&joined);
    }
    Some(url)
}

fn format_coord((lat, lon): (f64, f64)) -> String {
    format!("{lat},{lon}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: (f64, f64) = (30.5427, -97.5467);

    #[test]
    fn empty_stops_is_none() {
        assert_eq!(build_directions_url(HOME, &[], false), None);
        assert_eq!(build_directions_url(HOME, &[None, None], false), None);
    }

    #[test]
    fn without_return_home_last_stop_is_destination() {
        let stops = [Some((30.6, -97.6)), Some((30.7, -97.7))];
        let url = build_directions_url(HOME, &stops, false).unwrap();
        assert!(url.contains("origin=30.5427,-97.5467"));
        assert!(url.contains("destination=30.7,-97.7"));
        assert!(url.contains("waypoints=30.6,-97.6"));
    }

    #[test]
    fn with_return_home_destination_loops_back_to_origin() {
        let stops = [Some((30.6, -97.6)), Some((30.7, -97.7))];
        let url = build_directions_url(HOME, &stops, true).unwrap();
        assert!(url.contains("destination=30.5427,-97.5467"));
        assert!(url.contains("waypoints=30.6,-97.6|30.7,-97.7"));
    }

    #[test]
    fn invalid_coordinates_are_filtered_before_assembly() {
        let stops = [Some((30.6, -97.6)), None, Some((30.7, -97.7))];
        let url = build_directions_url(HOME, &stops, false).unwrap();
        assert!(url.contains("waypoints=30.6,-97.6"));
        assert!(url.contains("destination=30.7,-97.7"));
    }

    #[test]
    fn single_stop_without_return_home_has_no_waypoints() {
        let stops = [Some((30.6, -97.6))];
        let url = build_directions_url(HOME, &stops, false).unwrap();
        assert!(!url.contains("waypoints="));
        assert!(url.contains("destination=30.6,-97.6"));
    }
}
