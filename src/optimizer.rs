//! Stop-order optimizer (§4.5): a pure, deterministic TSP-ish pass over
//! haversine distances. Never touches the `RoutingPort` — the optimizer
//! compares candidate tours many times per call, and a network hop per
//! comparison would make it neither cheap nor deterministic.

use crate::geo::haversine_km;

/// Distance improvement below which a 2-opt move is not worth taking.
const TWO_OPT_EPSILON_KM: f64 = 1e-3;
const TWO_OPT_MAX_ITERATIONS: usize = 1000;

/// Above this stop count, brute force gives way to nearest-neighbor + 2-opt.
const BRUTE_FORCE_MAX_STOPS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedRoute {
    /// Permutation of `[0..stops.len())`.
    pub stop_order: Vec<usize>,
    pub total_distance_km: f64,
    pub naive_distance_km: f64,
    pub savings_km: f64,
    pub method: &'static str,
}

fn tour_distance(start: (f64, f64), stops: &[(f64, f64)], order: &[usize], return_to_start: bool) -> f64 {
    let mut total = 0.0;
    let mut from = start;
    for &idx in order {
        let to = stops[idx];
        total += haversine_km(from, to);
        from = to;
    }
    if return_to_start {
        total += haversine_km(from, start);
    }
    total
}

fn naive_order(n: usize) -> Vec<usize> {
    (0..n).collect()
}

/// Exhaustive search over all `N!` permutations. Ties broken by the
/// first-seen permutation, i.e. strictly-less comparisons only.
fn brute_force(start: (f64, f64), stops: &[(f64, f64)], return_to_start: bool) -> (Vec<usize>, f64) {
    let n = stops.len();
    let mut indices = naive_order(n);
    let mut best_order = indices.clone();
    let mut best_distance = tour_distance(start, stops, &indices, return_to_start);

    permute(&mut indices, 0, &mut |perm| {
        let d = tour_distance(start, stops, perm, return_to_start);
        if d < best_distance {
            best_distance = d;
            best_order = perm.to_vec();
        }
    });

    (best_order, best_distance)
}

/// Heap's algorithm, visiting every permutation of `indices[k..]` in place.
fn permute(indices: &mut [usize], k: usize, visit: &mut impl FnMut(&[usize])) {
    let n = indices.len();
    if k == n {
        visit(indices);
        return;
    }
    for i in k..n {
        indices.swap(k, i);
        permute(indices, k + 1, visit);
        indices.swap(k, i);
    }
}

fn nearest_neighbor(start: (f64, f64), stops: &[(f64, f64)]) -> Vec<usize> {
    let n = stops.len();
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut order = Vec::with_capacity(n);
    let mut from = start;

    while !remaining.is_empty() {
        let (pos, &next) = remaining
            .iter()
            .enumerate()
            .min_by(|(_, &a), (_, &b)| {
                haversine_km(from, stops[a])
                    .partial_cmp(&haversine_km(from, stops[b]))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("remaining is non-empty");
        from = stops[next];
        order.push(next);
        remaining.remove(pos);
    }
    order
}

/// 2-opt local search: repeatedly reverse `order[i+1..=j]` whenever doing so
/// shrinks the tour by more than `TWO_OPT_EPSILON_KM`, restarting the scan
/// from the top on every accepted move. Bounded by `TWO_OPT_MAX_ITERATIONS`
/// outer passes.
fn two_opt(start: (f64, f64), stops: &[(f64, f64)], mut order: Vec<usize>, return_to_start: bool) -> Vec<usize> {
    let n = order.len();
    if n < 3 {
        return order;
    }

    let mut best_distance = tour_distance(start, stops, &order, return_to_start);
    for _ in 0..TWO_OPT_MAX_ITERATIONS {
        let mut improved = false;
        'scan: for i in 0..n - 1 {
            for j in (i + 2)..n {
                order[i + 1..=j].reverse();
                let candidate_distance = tour_distance(start, stops, &order, return_to_start);
                if best_distance - candidate_distance > TWO_OPT_EPSILON_KM {
                    best_distance = candidate_distance;
                    improved = true;
                    break 'scan;
                }
                order[i + 1..=j].reverse();
            }
        }
        if !improved {
            break;
        }
    }
    order
}

/// Optimize the visiting order of `stops` starting from `start`. If
/// `return_to_start` is set, the round trip back to `start` is included in
/// every distance figure.
pub fn optimize(start: (f64, f64), stops: &[(f64, f64)], return_to_start: bool) -> OptimizedRoute {
    let n = stops.len();
    let naive = naive_order(n);
    let naive_distance_km = tour_distance(start, stops, &naive, return_to_start);

    let (stop_order, total_distance_km, method) = match n {
        0 => (Vec::new(), 0.0, "none"),
        1 => (vec![0], naive_distance_km, "single-stop"),
        _ if n <= BRUTE_FORCE_MAX_STOPS => {
            let (order, distance) = brute_force(start, stops, return_to_start);
            (order, distance, "brute-force")
        }
        _ => {
            let initial = nearest_neighbor(start, stops);
            let order = two_opt(start, stops, initial, return_to_start);
            let distance = tour_distance(start, stops, &order, return_to_start);
            (order, distance, "nn-2opt")
        }
    };

    let savings_km = (naive_distance_km - total_distance_km).max(0.0);

    OptimizedRoute {
        stop_order,
        total_distance_km,
        naive_distance_km,
        savings_km,
        method,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: (f64, f64) = (30.5427, -97.5467);

    #[test]
    fn zero_stops_is_empty_and_free() {
        let result = optimize(HOME, &[], false);
        assert_eq!(result.stop_order, Vec::<usize>::new());
        assert_eq!(result.total_distance_km, 0.0);
        assert_eq!(result.method, "none");
    }

    #[test]
    fn one_stop_is_trivial() {
        let stops = [(30.6, -97.6)];
        let result = optimize(HOME, &stops, false);
        assert_eq!(result.stop_order, vec![0]);
        assert_eq!(result.method, "single-stop");
        assert!((result.total_distance_km - result.naive_distance_km).abs() < 1e-9);
    }

    #[test]
    fn small_instance_uses_brute_force_and_beats_naive_order() {
        // Stops deliberately out of geographic order so the identity
        // permutation is not already optimal.
        let stops = [
            (30.70, -97.50), // far north
            (30.55, -97.55), // near home
            (30.40, -97.50), // far south
        ];
        let result = optimize(HOME, &stops, false);
        assert_eq!(result.method, "brute-force");
        assert_eq!(result.stop_order.len(), 3);
        let mut sorted = result.stop_order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
        assert!(result.total_distance_km <= result.naive_distance_km + 1e-9);
        assert!((result.savings_km - (result.naive_distance_km - result.total_distance_km)).abs() < 1e-9);
    }

    #[test]
    fn brute_force_is_optimal_against_every_permutation() {
        let stops = [
            (30.70, -97.50),
            (30.55, -97.55),
            (30.40, -97.50),
            (30.60, -97.70),
        ];
        let result = optimize(HOME, &stops, true);
        assert_eq!(result.method, "brute-force");

        let mut indices = naive_order(stops.len());
        let mut worst_ok = true;
        permute(&mut indices, 0, &mut |perm| {
            let d = tour_distance(HOME, &stops, perm, true);
            if d < result.total_distance_km - 1e-9 {
                worst_ok = false;
            }
        });
        assert!(worst_ok, "brute force should be at least as good as every permutation");
    }

    #[test]
    fn seven_stops_uses_nn_2opt_and_is_a_valid_permutation() {
        let stops: Vec<(f64, f64)> = vec![
            (30.70, -97.50),
            (30.55, -97.55),
            (30.40, -97.50),
            (30.60, -97.70),
            (30.45, -97.65),
            (30.65, -97.40),
            (30.50, -97.30),
        ];
        let result = optimize(HOME, &stops, false);
        assert_eq!(result.method, "nn-2opt");
        let mut sorted = result.stop_order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..stops.len()).collect::<Vec<_>>());
        assert!(result.total_distance_km <= result.naive_distance_km + 1e-9);
    }

    #[test]
    fn savings_is_never_negative() {
        let stops = [(30.6, -97.6), (30.5, -97.5)];
        let result = optimize(HOME, &stops, false);
        assert!(result.savings_km >= 0.0);
    }

    #[test]
    fn return_to_start_changes_total_distance() {
        let stops = [(30.7, -97.3), (30.3, -97.7)];
        let without = optimize(HOME, &stops, false);
        let with = optimize(HOME, &stops, true);
        assert!(with.total_distance_km > without.total_distance_km);
    }
}
