//! Benchmark profiles for the streamer propagation model.
//!
//! - [`reference_profile`]: the rod-plane gap on an `n × n` grid
//! - [`streamer_column`]: a deterministic set of already-advanced
//!   streamers for rasterizer and update benchmarks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use streamer_core::{DomainConfig, RodElectrode, StreamerId, StreamerSet, StreamerState, Vec2};
use streamer_engine::{SimulationConfig, TableSource};

/// Air-like ionization table columns: field (V/m), rate (1/s).
pub const AIR_FIELDS: [f64; 5] = [0.0, 2.0e6, 3.0e6, 5.0e6, 1.0e7];
/// Rates matching [`AIR_FIELDS`].
pub const AIR_RATES: [f64; 5] = [-1.0e8, -2.0e7, 0.0, 1.0e9, 1.0e10];

/// 30 mm rod-plane gap on an `n × n` grid, `n_steps` steps, default threshold.
pub fn reference_profile(n: usize, n_steps: u64) -> SimulationConfig<2> {
    let domain = DomainConfig {
        size: Vec2::new([30e-3, 30e-3]),
        grid: [n, n],
        coarse_grid: [n.min(16), n.min(16)],
        box_size: 8,
        electrode: RodElectrode {
            start: Vec2::new([0.0, 0.0]),
            end: Vec2::new([0.0, 5e-3]),
            radius: 0.75e-3,
        },
        boundary_potential: -4e4,
        memory_limit_gb: 0.1,
    };
    let mut config = SimulationConfig::new(
        domain,
        TableSource::Inline {
            fields: AIR_FIELDS.to_vec(),
            rates: AIR_RATES.to_vec(),
        },
    );
    config.n_steps = n_steps;
    config.output_prefix = "bench".to_string();
    config
}

/// `count` streamers spread across the gap, before and after one step
/// of `travel` metres along `+z`.
///
/// Placement is a deterministic LCG driven by `seed`.
pub fn streamer_column(count: usize, seed: u64, travel: f64) -> (StreamerSet<2>, StreamerSet<2>) {
    let mut previous = StreamerSet::with_capacity(count);
    let mut current = StreamerSet::with_capacity(count);
    let mut state = seed;
    for i in 0..count {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let r = (state >> 11) as f64 / (1u64 << 53) as f64 * 20e-3;
        let z = 6e-3 + i as f64 * 1e-4;
        let id = StreamerId(i as u32);
        let prev = StreamerState::new(Vec2::new([r, z]), Vec2::new([0.0, 1e6]), 2e-4, 1e-6);
        let mut cur = prev.clone();
        cur.position = Vec2::new([r, z + travel]);
        cur.radius = 2.5e-4;
        cur.conductivity = 2e-6;
        cur.age = 1;
        previous.insert(id, prev);
        current.insert(id, cur);
    }
    (previous, current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_profile_validates() {
        reference_profile(64, 10).validate().unwrap();
        reference_profile(16, 1).validate().unwrap();
    }

    #[test]
    fn streamer_column_is_deterministic_and_ordered() {
        let (a_prev, a_cur) = streamer_column(50, 42, 1e-4);
        let (b_prev, b_cur) = streamer_column(50, 42, 1e-4);
        assert_eq!(a_prev, b_prev);
        assert_eq!(a_cur, b_cur);
        let ids: Vec<u32> = a_cur.keys().map(|id| id.0).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(a_prev.values().all(|s| (0.0..20e-3).contains(&s.position[0])));
    }
}
