//! End-to-end run against the reference axisymmetric solver.

use streamer_core::{DomainConfig, FieldSolver, StreamerState};
use streamer_engine::{
    SimulationConfig, SimulationPhase, StreamerSimulation, TableSource, Termination,
    ThresholdConfig,
};
use streamer_field::{AxisymmetricSolver, ExportMode};
use streamer_model::ChannelShape;
use streamer_test_utils::{air_table, test_domain_2d};

fn domain() -> DomainConfig<2> {
    let mut d = test_domain_2d();
    d.grid = [40, 40];
    d.coarse_grid = [8, 8];
    d
}

/// Defaults throughout, so the breakdown threshold comes from the table.
fn default_config() -> SimulationConfig<2> {
    let t = air_table();
    let mut cfg = SimulationConfig::new(
        domain(),
        TableSource::Inline {
            fields: t.fields().to_vec(),
            rates: t.rates().to_vec(),
        },
    );
    cfg.output_prefix = "reference".into();
    cfg
}

fn config(channel: ChannelShape) -> SimulationConfig<2> {
    let mut cfg = default_config();
    cfg.n_steps = 3;
    cfg.threshold = ThresholdConfig::Fixed(1e5);
    cfg.channel = channel;
    cfg
}

fn run(cfg: SimulationConfig<2>) -> (StreamerState<2>, StreamerState<2>, AxisymmetricSolver) {
    let n_steps = cfg.n_steps;
    let electrode = cfg.domain.electrode;
    let solver = AxisymmetricSolver::builder()
        .export(ExportMode::Record)
        .build()
        .unwrap();
    let mut sim = StreamerSimulation::new(cfg, solver).unwrap();
    sim.initialize().unwrap();
    let initial = sim.streamers()[0].clone();
    assert!(!electrode.contains(&initial.position));

    let summary = sim.run().unwrap();
    assert_eq!(summary.steps, n_steps);
    assert_eq!(summary.live, 1);
    assert_eq!(summary.removed, 0);
    assert_eq!(sim.phase(), SimulationPhase::Terminated(Termination::Success));

    let last = sim.streamers()[0].clone();
    (initial, last, sim.into_solver())
}

#[test]
fn default_threshold_run_starts_on_axis_past_rod_tip() {
    let mut cfg = default_config();
    cfg.n_steps = 5;
    let tip = cfg.domain.electrode.end[1] + cfg.domain.electrode.radius;
    let (initial, last, solver) = run(cfg);
    assert_eq!(initial.position[0], 0.0);
    assert!(initial.position[1] > tip);
    assert!(last.position[1] > initial.position[1]);
    assert_eq!(last.age, 5);
    assert!(last.smoothed_length.unwrap() >= 1e-4);
    assert_eq!(solver.solve_count(), 6);
}

#[test]
fn head_disk_run_grows_channel_toward_plane() {
    let (initial, last, solver) = run(config(ChannelShape::HeadDisk));
    assert!(last.position[1] > initial.position[1]);
    assert!(last.radius >= initial.radius);
    assert!(last.conductivity > 0.0);
    assert_eq!(last.age, 3);

    assert_eq!(solver.solve_count(), 4);
    let tags: Vec<String> = solver.exported().iter().map(|t| t.to_string()).collect();
    assert_eq!(
        tags,
        ["reference_0000", "reference_0001", "reference_0002", "reference_0003"]
    );
    assert!(solver.conductivity().unwrap().iter().any(|&s| s > 0.0));
    assert!(solver.ionization_table().is_some());
    assert!(solver.finest_grid_spacing() > 0.0);
}

#[test]
fn radial_profile_run_paints_trailing_channel() {
    let (_, last, solver) = run(config(ChannelShape::RadialProfile { spacing: 2.5e-4 }));
    let sigma = solver.conductivity().unwrap();
    assert!(sigma.iter().all(|&s| s >= 0.0));
    assert!(sigma.iter().any(|&s| s > 0.0));
    assert!(last.position.is_finite());
}
