//! Spatial and combat math
//!
//! Pure functions over positions. Candidate lists are `(id, position)` pairs
//! so the same helpers serve enemies, allies and pickups. Ties always resolve
//! to the earliest candidate, which keeps results stable for a fixed input.

use glam::Vec2;

/// Euclidean distance
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Unit vector from `from` toward `to` (zero when they coincide)
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Closest candidate to `origin`
pub fn nearest<T: Copy>(
    origin: Vec2,
    candidates: impl IntoIterator<Item = (T, Vec2)>,
) -> Option<(T, Vec2)> {
    let mut best: Option<(T, Vec2, f32)> = None;
    for (id, pos) in candidates {
        let d = origin.distance_squared(pos);
        if best.is_none_or(|(_, _, bd)| d < bd) {
            best = Some((id, pos, d));
        }
    }
    best.map(|(id, pos, _)| (id, pos))
}

/// Candidates within `radius` of `origin`, closest first
///
/// Returns `(id, position, distance)`. The sort is stable so equidistant
/// candidates keep their input order.
pub fn within_range<T: Copy>(
    origin: Vec2,
    radius: f32,
    candidates: impl IntoIterator<Item = (T, Vec2)>,
) -> Vec<(T, Vec2, f32)> {
    let mut hits: Vec<(T, Vec2, f32)> = candidates
        .into_iter()
        .filter_map(|(id, pos)| {
            let d = origin.distance(pos);
            (d <= radius).then_some((id, pos, d))
        })
        .collect();
    hits.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));
    hits
}

/// Greedy maximal-dispersion target pick
///
/// The first pick is the candidate closest to `origin`. Each further pick is
/// the remaining candidate whose minimum distance to the already chosen
/// targets is largest. Returns at most `count` ids.
pub fn select_spread_targets<T: Copy>(
    origin: Vec2,
    candidates: &[(T, Vec2)],
    count: usize,
) -> Vec<T> {
    let mut chosen: Vec<usize> = Vec::with_capacity(count.min(candidates.len()));
    if count == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let first = candidates
        .iter()
        .enumerate()
        .fold(None::<(usize, f32)>, |best, (i, (_, pos))| {
            let d = origin.distance_squared(*pos);
            match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((i, d)),
            }
        });
    let Some((first, _)) = first else {
        return Vec::new();
    };
    chosen.push(first);

    // min distance from each candidate to the chosen set
    let mut min_dist: Vec<f32> = candidates
        .iter()
        .map(|(_, pos)| pos.distance_squared(candidates[first].1))
        .collect();

    while chosen.len() < count {
        let mut best: Option<(usize, f32)> = None;
        for (i, &d) in min_dist.iter().enumerate() {
            if chosen.contains(&i) {
                continue;
            }
            if best.is_none_or(|(_, bd)| d > bd) {
                best = Some((i, d));
            }
        }
        let Some((pick, _)) = best else { break };
        chosen.push(pick);
        let picked_pos = candidates[pick].1;
        for (i, (_, pos)) in candidates.iter().enumerate() {
            min_dist[i] = min_dist[i].min(pos.distance_squared(picked_pos));
        }
    }

    chosen.into_iter().map(|i| candidates[i].0).collect()
}

/// Whether `pos` lies outside the `width` x `height` arena by more than `margin`
#[inline]
pub fn outside_bounds(pos: Vec2, width: f32, height: f32, margin: f32) -> bool {
    pos.x < -margin || pos.y < -margin || pos.x > width + margin || pos.y > height + margin
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_direction_zero_when_coincident() {
        assert_eq!(direction(Vec2::ONE, Vec2::ONE), Vec2::ZERO);
        let d = direction(Vec2::ZERO, Vec2::new(3.0, 4.0));
        assert!((d - Vec2::new(0.6, 0.8)).length() < 0.0001);
    }

    #[test]
    fn test_nearest_prefers_first_on_tie() {
        let c = [
            (1u32, Vec2::new(10.0, 0.0)),
            (2, Vec2::new(-10.0, 0.0)),
            (3, Vec2::new(50.0, 0.0)),
        ];
        assert_eq!(nearest(Vec2::ZERO, c).map(|(id, _)| id), Some(1));
        assert!(nearest::<u32>(Vec2::ZERO, []).is_none());
    }

    #[test]
    fn test_within_range_sorted_closest_first() {
        let c = [
            (1u32, Vec2::new(50.0, 0.0)),
            (2, Vec2::new(10.0, 0.0)),
            (3, Vec2::new(200.0, 0.0)),
            (4, Vec2::new(0.0, 30.0)),
        ];
        let ids: Vec<u32> = within_range(Vec2::ZERO, 60.0, c).iter().map(|h| h.0).collect();
        assert_eq!(ids, vec![2, 4, 1]);
    }

    #[test]
    fn test_spread_picks_closest_then_farthest() {
        // Cluster near origin plus two far-flung enemies on opposite sides
        let c = [
            (1u32, Vec2::new(20.0, 0.0)),
            (2, Vec2::new(22.0, 2.0)),
            (3, Vec2::new(300.0, 0.0)),
            (4, Vec2::new(-300.0, 0.0)),
            (5, Vec2::new(25.0, -1.0)),
        ];
        let picks = select_spread_targets(Vec2::ZERO, &c, 3);
        assert_eq!(picks[0], 1);
        // From (20,0): -300 is 320 away, 300 is 280 away
        assert_eq!(picks[1], 4);
        assert_eq!(picks[2], 3);
    }

    #[test]
    fn test_spread_is_not_closest_n() {
        let c = [
            (1u32, Vec2::new(10.0, 0.0)),
            (2, Vec2::new(11.0, 0.0)),
            (3, Vec2::new(12.0, 0.0)),
            (4, Vec2::new(0.0, 200.0)),
        ];
        let picks = select_spread_targets(Vec2::ZERO, &c, 2);
        assert_eq!(picks, vec![1, 4]);
    }

    #[test]
    fn test_spread_count_exceeds_candidates() {
        let c = [(1u32, Vec2::new(10.0, 0.0)), (2, Vec2::new(0.0, 10.0))];
        let picks = select_spread_targets(Vec2::ZERO, &c, 5);
        assert_eq!(picks.len(), 2);
        assert!(select_spread_targets(Vec2::ZERO, &c, 0).is_empty());
    }

    #[test]
    fn test_outside_bounds_margin() {
        assert!(!outside_bounds(Vec2::new(-40.0, 10.0), 100.0, 100.0, 50.0));
        assert!(outside_bounds(Vec2::new(-60.0, 10.0), 100.0, 100.0, 50.0));
        assert!(outside_bounds(Vec2::new(10.0, 151.0), 100.0, 100.0, 50.0));
    }

    fn positions() -> impl Strategy<Value = Vec<(u32, Vec2)>> {
        prop::collection::vec((-500.0f32..500.0, -500.0f32..500.0), 0..24).prop_map(|pts| {
            pts.into_iter()
                .enumerate()
                .map(|(i, (x, y))| (i as u32, Vec2::new(x, y)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_spread_bounded_distinct_and_deterministic(c in positions(), count in 0usize..8) {
            let picks = select_spread_targets(Vec2::ZERO, &c, count);
            prop_assert!(picks.len() <= count);
            prop_assert_eq!(picks.len(), count.min(c.len()));
            let mut dedup = picks.clone();
            dedup.sort_unstable();
            dedup.dedup();
            prop_assert_eq!(dedup.len(), picks.len());
            prop_assert_eq!(&picks, &select_spread_targets(Vec2::ZERO, &c, count));
        }

        #[test]
        fn prop_spread_first_pick_is_closest(c in positions()) {
            prop_assume!(!c.is_empty());
            let picks = select_spread_targets(Vec2::ZERO, &c, 1);
            let closest = nearest(Vec2::ZERO, c.iter().copied()).map(|(id, _)| id);
            prop_assert_eq!(picks.first().copied(), closest);
        }
    }
}
