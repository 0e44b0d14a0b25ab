// placement warping
// every random draw goes through the arena stream handed in by the caller

use bevy::prelude::*;
use rand::Rng;

/// Uniform float in `[min, max)`, bounds may come in either order.
/// Always consumes exactly one draw so the stream stays aligned.
pub fn frand_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    lo + (hi - lo) * rng.random::<f32>()
}

/// Uniform integer in `[min, max]`, collapses to `min` on an empty range.
pub fn rand_range<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..=max)
}

/// Per-axis bounded jitter along forward, right and world up.
pub fn directional_warp<R: Rng + ?Sized>(
    rng: &mut R,
    ranges: Vec3,
    forward: Vec3,
    right: Vec3,
) -> Vec3 {
    let along = frand_range(rng, -ranges.x, ranges.x);
    let across = frand_range(rng, -ranges.y, ranges.y);
    let up = frand_range(rng, -ranges.z, ranges.z);

    forward * along + right * across + Vec3::new(0.0, 0.0, up)
}

/// Bowl/dome bias: zero at the midpoint, growing toward the edges.
/// Both distances are measured against `row_mid`.
pub fn concavity_warp(
    col_mid: i32,
    row_mid: i32,
    col: i32,
    row: i32,
    strength: f32,
    direction: Vec3,
) -> Vec3 {
    let col_t = lerp(0.0, 1.0, edge_ratio((col - col_mid).abs(), row_mid));
    let row_t = lerp(0.0, 1.0, edge_ratio((row - row_mid).abs(), row_mid));

    direction * strength * (col_t * row_t).clamp(0.0, 1.0)
}

fn edge_ratio(distance: i32, mid: i32) -> f32 {
    // zero midpoint, anything off-center is already at the edge
    if mid <= 0 {
        return if distance == 0 { 0.0 } else { 1.0 };
    }
    (distance as f32 / mid as f32).clamp(0.0, 1.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn concavity_is_zero_at_midpoint() {
        for strength in [0.0, 1.0, -250.0, 1e6] {
            let w = concavity_warp(5, 5, 5, 5, strength, Vec3::Z);
            assert_eq!(w, Vec3::ZERO);
        }
        // degenerate midpoint must not produce NaN
        assert_eq!(concavity_warp(0, 0, 0, 0, 80.0, Vec3::Z), Vec3::ZERO);
    }

    #[test]
    fn concavity_grows_toward_edges() {
        let mut last = 0.0;
        for i in 0..=4 {
            let w = concavity_warp(4, 4, 4 + i, 4 + i, 100.0, Vec3::Z);
            assert!(w.z >= last);
            last = w.z;
        }
        assert!((last - 100.0).abs() < 1e-4);
    }

    #[test]
    fn concavity_follows_direction() {
        let dir = Vec3::new(0.0, -1.0, 0.0);
        let w = concavity_warp(2, 2, 0, 0, 40.0, dir);
        assert!((w - dir * 40.0).length() < 1e-4);
    }

    #[test]
    fn directional_warp_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let ranges = Vec3::new(10.0, 20.0, 5.0);
        for _ in 0..200 {
            let w = directional_warp(&mut rng, ranges, Vec3::X, Vec3::Y);
            assert!(w.x.abs() <= 10.0 && w.y.abs() <= 20.0 && w.z.abs() <= 5.0);
        }
    }

    #[test]
    fn zero_ranges_still_consume_draws() {
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        let w = directional_warp(&mut a, Vec3::ZERO, Vec3::X, Vec3::Y);
        assert_eq!(w, Vec3::ZERO);
        for _ in 0..3 {
            let _ = b.random::<f32>();
        }
        assert_eq!(a.random::<u64>(), b.random::<u64>());
    }

    #[test]
    fn rand_range_is_inclusive_and_safe() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(rand_range(&mut rng, 4, 4), 4);
        assert_eq!(rand_range(&mut rng, 4, 1), 4);
        for _ in 0..100 {
            let v = rand_range(&mut rng, 0, 3);
            assert!((0..=3).contains(&v));
        }
    }
}
