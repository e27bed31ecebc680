//! Reusable test fixtures.
//!
//! - [`linear_profile`]: a sampled `|E|` profile falling linearly.
//! - [`linear_script`]: a [`ScriptedSolver`](crate::ScriptedSolver) script
//!   producing that profile ahead of every query.
//! - [`air_table`] / [`AIR_TABLE_TEXT`]: a small air-like `k_eff` table
//!   whose zero crossing is at 3 MV/m.
//! - [`test_domain_2d`]: the 30 mm axisymmetric rod-plane gap.

use streamer_core::{DomainConfig, IonizationTable, LineQuery, LineSample, RodElectrode, Vec2};

/// Air-like effective ionization table in the on-disk text format.
pub const AIR_TABLE_TEXT: &str = "\
# E (V/m)   k_eff (1/s)
0.0         -1.0e8
2.0e6       -2.0e7
3.0e6        0.0
5.0e6        1.0e9
1.0e7        1.0e10
";

/// `n` samples over `[0, distance]` falling linearly from `start` to `end`.
pub fn linear_profile(start: f64, end: f64, distance: f64, n: usize) -> LineSample {
    let last = (n.max(2) - 1) as f64;
    let coordinates = (0..n).map(|i| distance * i as f64 / last).collect();
    let values = (0..n)
        .map(|i| start + (end - start) * i as f64 / last)
        .collect();
    LineSample::new(coordinates, values)
}

/// Script returning `max(0, peak − gradient·s)` along every query.
pub fn linear_script<const D: usize>(
    peak: f64,
    gradient: f64,
) -> impl Fn(&LineQuery<D>, usize) -> LineSample + 'static {
    move |query: &LineQuery<D>, _solves: usize| {
        let coordinates = query.coordinates();
        let values = coordinates
            .iter()
            .map(|s| (peak - gradient * s).max(0.0))
            .collect();
        LineSample::new(coordinates, values)
    }
}

/// Parsed [`AIR_TABLE_TEXT`].
pub fn air_table() -> IonizationTable {
    IonizationTable::parse(AIR_TABLE_TEXT).expect("fixture table is valid")
}

/// 30 mm × 30 mm axisymmetric domain, 256² cells, 5 mm rod on the axis.
pub fn test_domain_2d() -> DomainConfig<2> {
    DomainConfig {
        size: Vec2::new([30e-3, 30e-3]),
        grid: [256, 256],
        coarse_grid: [16, 16],
        box_size: 8,
        electrode: RodElectrode {
            start: Vec2::new([0.0, 0.0]),
            end: Vec2::new([0.0, 5e-3]),
            radius: 0.75e-3,
        },
        boundary_potential: -4e4,
        memory_limit_gb: 0.1,
    }
}
