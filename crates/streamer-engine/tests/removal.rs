//! Integration test: per-streamer removal and run exhaustion.
//!
//! A sampling failure or a feature below its floor removes only the
//! affected streamer; the others advance exactly as they would without
//! it. When the last streamer goes, the run ends with
//! `AllStreamersExhausted` after the step's solve and export.

use streamer_core::{LineQuery, LineSample, RemovalCause, StepIndex, StreamerState, Vec2};
use streamer_engine::{
    SimulationConfig, SimulationError, SimulationPhase, StreamerSimulation, TableSource,
    Termination,
};
use streamer_test_utils::{air_table, linear_profile, test_domain_2d, ScriptedSolver};

const A_RADIUS_COORD: f64 = 10e-3;
const B_RADIUS_COORD: f64 = 20e-3;

fn config(n_steps: u64) -> SimulationConfig<2> {
    let t = air_table();
    let mut cfg = SimulationConfig::new(
        test_domain_2d(),
        TableSource::Inline {
            fields: t.fields().to_vec(),
            rates: t.rates().to_vec(),
        },
    );
    cfg.n_steps = n_steps;
    cfg
}

fn healthy(query: &LineQuery<2>) -> LineSample {
    linear_profile(1e7, 0.0, query.max_distance, query.sample_count)
}

/// Fails every query issued from A's column once `fail_from` timed
/// solves have happened.
fn solver_failing_a(fail_from: usize) -> ScriptedSolver<2> {
    ScriptedSolver::new(1e-4, move |q: &LineQuery<2>, solves: usize| {
        if (q.start[0] - A_RADIUS_COORD).abs() < 1e-9 && solves >= fail_from {
            LineSample::failed()
        } else {
            healthy(q)
        }
    })
    .with_field_maximum(2e7, Vec2::new([0.0, 8e-3]))
}

fn b_history(with_a: bool, steps: u64) -> Vec<StreamerState<2>> {
    let mut sim = StreamerSimulation::new(config(steps), solver_failing_a(2)).unwrap();
    sim.initialize().unwrap();
    if with_a {
        sim.spawn_streamer(Vec2::new([A_RADIUS_COORD, 6e-3]), Vec2::ZERO, 1e-3)
            .unwrap();
    }
    let b = sim
        .spawn_streamer(Vec2::new([B_RADIUS_COORD, 6e-3]), Vec2::ZERO, 1e-3)
        .unwrap();
    let mut history = Vec::new();
    for _ in 0..steps {
        sim.step().unwrap();
        history.push(sim.streamer(b).unwrap().clone());
    }
    history
}

#[test]
fn sampling_failure_removes_only_that_streamer() {
    let mut sim = StreamerSimulation::new(config(4), solver_failing_a(2)).unwrap();
    sim.initialize().unwrap();
    let a = sim
        .spawn_streamer(Vec2::new([A_RADIUS_COORD, 6e-3]), Vec2::ZERO, 1e-3)
        .unwrap();
    let b = sim
        .spawn_streamer(Vec2::new([B_RADIUS_COORD, 6e-3]), Vec2::ZERO, 1e-3)
        .unwrap();

    for _ in 0..2 {
        let report = sim.step().unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(report.live, 3);
    }
    let report = sim.step().unwrap();
    assert_eq!(report.removed, vec![(a, RemovalCause::SamplingFailure)]);
    assert_eq!(report.live, 2);
    assert_eq!(report.segments, 2);
    assert!(sim.streamer(a).is_none());
    assert!(sim.streamer(b).is_some());
    assert_eq!(sim.removed_count(), 1);

    // The dead streamer is not rasterized.
    let update = &sim.solver().updates()[2];
    assert!(update.segments().iter().all(|s| s.id != a));
    let ids: Vec<_> = update.segments().iter().map(|s| s.id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    sim.step().unwrap();
    assert_eq!(sim.phase(), SimulationPhase::Terminated(Termination::Success));
}

#[test]
fn survivor_matches_run_without_removed_streamer() {
    assert_eq!(b_history(true, 4), b_history(false, 4));
}

#[test]
fn feature_below_floor_on_final_step_exhausts_run() {
    let solver = ScriptedSolver::new(1e-4, |q: &LineQuery<2>, solves: usize| {
        if solves >= 2 {
            // Peak below the 3 MV/m breakdown field: raw length 0.
            linear_profile(1e6, 0.0, q.max_distance, q.sample_count)
        } else {
            healthy(q)
        }
    })
    .with_field_maximum(2e7, Vec2::new([0.0, 8e-3]));
    let mut sim = StreamerSimulation::new(config(3), solver).unwrap();

    match sim.run() {
        Err(SimulationError::AllStreamersExhausted { step }) => assert_eq!(step, StepIndex(3)),
        other => panic!("expected AllStreamersExhausted, got {other:?}"),
    }
    assert_eq!(sim.phase(), SimulationPhase::Terminated(Termination::AllDead));
    assert!(sim.streamers().is_empty());

    let solver = sim.into_solver();
    // The final step still solved and exported, with an empty update.
    assert_eq!(solver.step_solves(), 3);
    assert_eq!(solver.exports().len(), 4);
    assert!(solver.updates()[2].is_empty());
}

#[test]
fn floor_removal_mid_run_ends_run() {
    let solver = ScriptedSolver::new(1e-4, |q: &LineQuery<2>, solves: usize| {
        if solves >= 1 {
            // Crosses 3 MV/m about 82 µm ahead, below the 100 µm floor.
            linear_profile(3.05e6, 0.0, q.max_distance, q.sample_count)
        } else {
            healthy(q)
        }
    })
    .with_field_maximum(2e7, Vec2::new([0.0, 8e-3]));
    let mut sim = StreamerSimulation::new(config(5), solver).unwrap();
    sim.initialize().unwrap();
    sim.step().unwrap();
    match sim.step() {
        Err(SimulationError::AllStreamersExhausted { step }) => assert_eq!(step, StepIndex(2)),
        other => panic!("expected AllStreamersExhausted, got {other:?}"),
    }
    assert_eq!(sim.step().unwrap_err(), SimulationError::AlreadyTerminated);
}
