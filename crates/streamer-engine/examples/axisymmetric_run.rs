//! Axisymmetric rod-plane streamer run on the reference solver.
//!
//! A 5 mm rod at −40 kV sits on the axis of a 30 mm gap with a grounded
//! top plane. The initial streamer is placed behind the field maximum and
//! advanced for the configured number of steps; every solution is written
//! as text under `output/`.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example axisymmetric_run

use std::error::Error;

use tracing_subscriber::EnvFilter;

use streamer_core::{DomainConfig, RodElectrode, Vec2};
use streamer_engine::{SimulationConfig, StreamerSimulation, TableSource};
use streamer_field::{AxisymmetricSolver, ExportMode};

/// Air-like effective ionization rate (1/s) versus |E| (V/m).
const FIELDS: [f64; 6] = [0.0, 1.0e6, 2.0e6, 3.0e6, 5.0e6, 1.0e7];
const RATES: [f64; 6] = [-2.0e8, -1.0e8, -2.0e7, 0.0, 1.0e9, 1.0e10];

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let domain = DomainConfig {
        size: Vec2::new([30e-3, 30e-3]),
        grid: [64, 64],
        coarse_grid: [16, 16],
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
            fields: FIELDS.to_vec(),
            rates: RATES.to_vec(),
        },
    );
    config.n_steps = 5;

    let solver = AxisymmetricSolver::builder()
        .export(ExportMode::Text)
        .build()?;
    let mut sim = StreamerSimulation::new(config, solver)?;
    let summary = sim.run()?;

    println!(
        "{} steps, t = {:.3} ns, {} streamer(s) alive, {} removed",
        summary.steps,
        summary.time * 1e9,
        summary.live,
        summary.removed
    );
    for (id, s) in sim.streamers() {
        println!(
            "streamer {id}: z = {:.3} mm, R = {:.3} mm, |v| = {:.3e} m/s, L_E = {:.3} mm",
            s.position[1] * 1e3,
            s.radius * 1e3,
            s.speed(),
            s.smoothed_length.unwrap_or(0.0) * 1e3
        );
    }
    Ok(())
}
