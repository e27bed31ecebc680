//! Step driver: owns the field solver and advances all streamers.
//!
//! [`StreamerSimulation`] is the user-facing API. Each
//! [`step()`](StreamerSimulation::step) runs one complete cycle:
//!
//! 1. snapshot the live streamers;
//! 2. per streamer, sample ahead of the tip, estimate the high-field
//!    length and advance the state (or remove the streamer);
//! 3. rasterize every alive streamer into one channel update;
//! 4. hand the update to the solver and solve for `dt`;
//! 5. export the solution and prune dead streamers.
//!
//! # Ownership model
//!
//! The driver owns the solver (`S: FieldSolver<D>`) and both streamer
//! collections. Every update in step 2 reads only the frozen snapshot and
//! the solution from the previous solve, so streamers never observe one
//! another's changes within a step. [`into_solver()`](StreamerSimulation::into_solver)
//! hands the solver back when the run is over.

use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

use streamer_core::{
    FieldSolver, IonizationTable, SolutionTag, StepIndex, StreamerId, StreamerIdAllocator,
    StreamerSet, StreamerState, Vector,
};
use streamer_model::{
    ConductivityRasterizer, FieldProfileSampler, HighFieldLengthEstimator, PropagationModel,
};

use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::metrics::{RunSummary, StepMetrics, StepReport};

// ── SimulationPhase ─────────────────────────────────────────────

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The configured number of steps completed.
    Success,
    /// Every streamer was removed.
    AllDead,
    /// Initialization or the field solver failed.
    Failed,
}

/// Lifecycle of a [`StreamerSimulation`].
///
/// `Initializing → Stepping → Terminated`. There is no way back out of
/// `Terminated`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationPhase {
    /// Constructed; `initialize()` has not succeeded yet.
    Initializing,
    /// Ready for `step()`.
    Stepping,
    /// Finished.
    Terminated(Termination),
}

// ── StreamerSimulation ──────────────────────────────────────────

/// Streamer propagation run over field solver `S`.
///
/// # Example
///
/// ```ignore
/// let mut sim = StreamerSimulation::new(config, solver)?;
/// let summary = sim.run()?;
/// println!("{} steps, {} streamers alive", summary.steps, summary.live);
/// ```
pub struct StreamerSimulation<const D: usize, S: FieldSolver<D>> {
    config: SimulationConfig<D>,
    solver: S,
    model: Box<dyn PropagationModel<D>>,
    sampler: FieldProfileSampler<D>,
    rasterizer: ConductivityRasterizer<D>,
    estimator: Option<HighFieldLengthEstimator>,
    table: Option<IonizationTable>,
    ids: StreamerIdAllocator,
    streamers: StreamerSet<D>,
    rng: ChaCha8Rng,
    phase: SimulationPhase,
    step: StepIndex,
    time: f64,
    removed: usize,
    total_us: u64,
    last_metrics: StepMetrics,
}

impl<const D: usize, S: FieldSolver<D>> StreamerSimulation<D, S> {
    /// Validate `config` and take ownership of `solver`.
    ///
    /// The solver is not touched until [`initialize()`](Self::initialize).
    pub fn new(config: SimulationConfig<D>, solver: S) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self {
            model: config.build_model()?,
            sampler: config.build_sampler(),
            rasterizer: config.build_rasterizer()?,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            solver,
            estimator: None,
            table: None,
            ids: StreamerIdAllocator::new(),
            streamers: StreamerSet::new(),
            phase: SimulationPhase::Initializing,
            step: StepIndex(0),
            time: 0.0,
            removed: 0,
            total_us: 0,
            last_metrics: StepMetrics::default(),
        })
    }

    /// Set up the solver and place the initial streamer.
    ///
    /// Initializes the domain, solves at zero time, exports step 0,
    /// loads the ionization table and forwards it to the solver, then
    /// samples along the propagation direction from the field maximum
    /// projected onto the electrode axis (stepped past the electrode by
    /// one grid spacing if needed). The initial streamer sits
    /// `offset_factor · radius0` behind that start, moved out of the
    /// electrode if it would land inside, plus an optional lateral jitter.
    ///
    /// # Errors
    ///
    /// Any failure here is fatal and moves the simulation to
    /// `Terminated(Failed)`:
    /// - [`SimulationError::MalformedCorrelationTable`] for a bad table
    /// - [`SimulationError::InitialSamplingFailed`] when no length can be
    ///   estimated at the field maximum
    /// - [`SimulationError::InitialPlacementFailed`] when the streamer
    ///   cannot be placed outside the electrode
    /// - [`SimulationError::Solver`] for solver failures
    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        match self.phase {
            SimulationPhase::Initializing => {}
            SimulationPhase::Stepping => return Err(SimulationError::AlreadyInitialized),
            SimulationPhase::Terminated(_) => return Err(SimulationError::AlreadyTerminated),
        }
        match self.place_initial_streamer() {
            Ok(()) => {
                self.phase = SimulationPhase::Stepping;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn place_initial_streamer(&mut self) -> Result<(), SimulationError> {
        self.solver.initialize(&self.config.domain)?;
        self.solver.solve(0.0)?;
        self.export()?;

        let table = self.config.table.load()?;
        self.solver.load_ionization_table(&table)?;
        let threshold = self.config.threshold.field(&table);
        let estimator = self.config.build_estimator(threshold)?;

        // The maximum usually sits on the rod surface; sample and place on
        // the axis through it instead.
        let maximum = self.solver.locate_field_maximum();
        let spacing = self.solver.finest_grid_spacing();
        let direction = self.sampler.fallback_direction();
        let on_axis = self.config.domain.electrode.project_onto_axis(&maximum.location);
        let start = self.clear_of_electrode(on_axis, direction, spacing)?;
        let query = self.sampler.ray_from(start, spacing);
        let sample = self.sampler.sample(&self.solver, &query);
        let estimate = estimator
            .estimate(&sample, spacing, None)
            .map_err(|cause| SimulationError::InitialSamplingFailed { cause })?;

        let seed = self.model.seed(estimate.smoothed);
        let behind = start - direction * (self.config.offset_factor * seed.radius);
        let position =
            self.clear_of_electrode(behind, direction, 0.0)? + self.lateral_jitter(direction);
        if self.config.domain.electrode.contains(&position) {
            return Err(SimulationError::InitialPlacementFailed {
                reason: format!("jittered position {position:?} lies inside the electrode"),
            });
        }
        let id = self.ids.allocate();
        self.streamers.insert(
            id,
            StreamerState::new(position, Vector::ZERO, seed.radius, seed.conductivity),
        );
        self.table = Some(table);
        self.estimator = Some(estimator);

        info!(
            model = self.model.name(),
            threshold,
            field_max = maximum.value,
            position = ?position,
            length = estimate.smoothed,
            radius = seed.radius,
            streamer = %id,
            "initial streamer placed"
        );
        Ok(())
    }

    /// `point`, or the first point past the electrode along `direction`
    /// plus a further `margin`.
    fn clear_of_electrode(
        &self,
        point: Vector<D>,
        direction: Vector<D>,
        margin: f64,
    ) -> Result<Vector<D>, SimulationError> {
        let electrode = &self.config.domain.electrode;
        if !electrode.contains(&point) {
            return Ok(point);
        }
        let exit = electrode.exit_point(&point, &direction).ok_or_else(|| {
            SimulationError::InitialPlacementFailed {
                reason: format!("no exit from the electrode along {direction:?} from {point:?}"),
            }
        })?;
        Ok(exit + direction * margin)
    }

    /// Random offset perpendicular to `direction`, each component drawn
    /// from `[-jitter, jitter]` before projection.
    fn lateral_jitter(&mut self, direction: Vector<D>) -> Vector<D> {
        let jitter = self.config.initial_jitter;
        if jitter == 0.0 {
            return Vector::ZERO;
        }
        let mut c = [0.0; D];
        for slot in c.iter_mut() {
            *slot = self.rng.random_range(-jitter..=jitter);
        }
        let raw = Vector::new(c);
        raw - direction * raw.dot(&direction)
    }

    /// Add a streamer whose radius and conductivity are seeded from the
    /// high-field length `length`.
    ///
    /// Allowed until the run terminates. Returns the new id, which is
    /// larger than every existing one.
    pub fn spawn_streamer(
        &mut self,
        position: Vector<D>,
        velocity: Vector<D>,
        length: f64,
    ) -> Result<StreamerId, SimulationError> {
        if let SimulationPhase::Terminated(_) = self.phase {
            return Err(SimulationError::AlreadyTerminated);
        }
        if !position.is_finite() || !velocity.is_finite() {
            return Err(SimulationError::InvalidSpawn {
                reason: "position and velocity must be finite".to_string(),
            });
        }
        if !length.is_finite() || length <= 0.0 {
            return Err(SimulationError::InvalidSpawn {
                reason: format!("seed length must be finite and > 0, got {length}"),
            });
        }
        if self.config.domain.electrode.contains(&position) {
            return Err(SimulationError::InvalidSpawn {
                reason: format!("position {position:?} lies inside the electrode"),
            });
        }
        let seed = self.model.seed(length);
        let id = self.ids.allocate();
        self.streamers.insert(
            id,
            StreamerState::new(position, velocity, seed.radius, seed.conductivity),
        );
        debug!(streamer = %id, radius = seed.radius, "streamer spawned");
        Ok(id)
    }

    /// Execute one step.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::NotInitialized`] before `initialize()`
    /// - [`SimulationError::AlreadyTerminated`] after termination
    /// - [`SimulationError::AllStreamersExhausted`] when the last streamer
    ///   is removed; the step's solve and export still happen first
    /// - [`SimulationError::Solver`] when the solver fails
    pub fn step(&mut self) -> Result<StepReport, SimulationError> {
        match self.phase {
            SimulationPhase::Initializing => return Err(SimulationError::NotInitialized),
            SimulationPhase::Terminated(_) => return Err(SimulationError::AlreadyTerminated),
            SimulationPhase::Stepping => {}
        }
        let estimator = self.estimator.ok_or(SimulationError::NotInitialized)?;
        let step_start = Instant::now();
        let step = self.step.next();
        let dt = self.config.dt;
        let spacing = self.solver.finest_grid_spacing();

        // 1-2. Frozen snapshot in, fresh collection out.
        let update_start = Instant::now();
        let previous = self.streamers.clone();
        let mut current = StreamerSet::with_capacity(previous.len());
        let mut removed = Vec::new();
        for (&id, prev) in &previous {
            let sample = self.sampler.sample_ahead(&self.solver, prev);
            match estimator.estimate(&sample, spacing, prev.smoothed_length) {
                Ok(estimate) => {
                    let direction = self.sampler.direction_of(prev);
                    let next = self.model.advance(prev, estimate.smoothed, dt, direction);
                    debug!(
                        streamer = %id,
                        raw = estimate.raw,
                        length = estimate.smoothed,
                        radius = next.radius,
                        speed = next.speed(),
                        conductivity = next.conductivity,
                        "streamer advanced"
                    );
                    current.insert(id, next);
                }
                Err(cause) => {
                    warn!(step = %step, streamer = %id, %cause, "streamer removed");
                    current.insert(id, prev.killed());
                    removed.push((id, cause));
                }
            }
        }
        let update_us = update_start.elapsed().as_micros() as u64;

        // 3. Rasterize.
        let rasterize_start = Instant::now();
        let update = self.rasterizer.rasterize(step, &previous, &current);
        let rasterize_us = rasterize_start.elapsed().as_micros() as u64;

        // 4. Solve.
        let solve_start = Instant::now();
        if let Err(e) = self.solver.update_conductivity_channel(&update) {
            return Err(self.fail(e.into()));
        }
        if let Err(e) = self.solver.solve(dt) {
            return Err(self.fail(e.into()));
        }
        let solve_us = solve_start.elapsed().as_micros() as u64;
        self.step = step;
        self.time += dt;

        // 5. Export and prune.
        let export_start = Instant::now();
        if let Err(e) = self.export() {
            return Err(self.fail(e));
        }
        let export_us = export_start.elapsed().as_micros() as u64;
        current.retain(|_, s| s.alive);
        self.streamers = current;
        self.removed += removed.len();

        let metrics = StepMetrics {
            total_us: step_start.elapsed().as_micros() as u64,
            update_us,
            rasterize_us,
            solve_us,
            export_us,
        };
        self.total_us += metrics.total_us;
        self.last_metrics = metrics.clone();
        info!(
            step = %step,
            time_ns = self.time * 1e9,
            live = self.streamers.len(),
            removed = removed.len(),
            "step complete"
        );

        if self.streamers.is_empty() {
            self.phase = SimulationPhase::Terminated(Termination::AllDead);
            error!(step = %step, "all streamers removed");
            return Err(SimulationError::AllStreamersExhausted { step });
        }
        if step.0 >= self.config.n_steps {
            self.phase = SimulationPhase::Terminated(Termination::Success);
        }
        Ok(StepReport {
            step,
            time: self.time,
            live: self.streamers.len(),
            removed,
            segments: update.len(),
            metrics,
        })
    }

    /// Initialize if needed, then step until the configured step count.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`initialize()`](Self::initialize)
    /// or [`step()`](Self::step). Calling `run()` on a terminated
    /// simulation returns [`SimulationError::AlreadyTerminated`].
    pub fn run(&mut self) -> Result<RunSummary, SimulationError> {
        match self.phase {
            SimulationPhase::Initializing => self.initialize()?,
            SimulationPhase::Stepping => {}
            SimulationPhase::Terminated(_) => return Err(SimulationError::AlreadyTerminated),
        }
        while self.phase == SimulationPhase::Stepping {
            self.step()?;
        }
        Ok(RunSummary {
            steps: self.step.0,
            time: self.time,
            live: self.streamers.len(),
            removed: self.removed,
            total_us: self.total_us,
        })
    }

    fn export(&mut self) -> Result<(), SimulationError> {
        let tag = SolutionTag {
            prefix: self.config.output_prefix.clone(),
            step: self.step,
            time: self.time,
        };
        self.solver.export_solution(&tag)?;
        Ok(())
    }

    fn fail(&mut self, err: SimulationError) -> SimulationError {
        error!(step = %self.step, error = %err, "simulation failed");
        self.phase = SimulationPhase::Terminated(Termination::Failed);
        err
    }

    // ── Accessors ───────────────────────────────────────────────

    /// Current lifecycle phase.
    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    /// Last completed step (0 before the first step).
    pub fn current_step(&self) -> StepIndex {
        self.step
    }

    /// Elapsed simulated time (s).
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Live streamers in ascending id order.
    pub fn streamers(&self) -> &StreamerSet<D> {
        &self.streamers
    }

    /// State of one live streamer.
    pub fn streamer(&self, id: StreamerId) -> Option<&StreamerState<D>> {
        self.streamers.get(&id)
    }

    /// Streamers removed so far.
    pub fn removed_count(&self) -> usize {
        self.removed
    }

    /// The configuration this simulation was built from.
    pub fn config(&self) -> &SimulationConfig<D> {
        &self.config
    }

    /// The loaded ionization table, after initialization.
    pub fn table(&self) -> Option<&IonizationTable> {
        self.table.as_ref()
    }

    /// The length estimator, after initialization.
    pub fn estimator(&self) -> Option<&HighFieldLengthEstimator> {
        self.estimator.as_ref()
    }

    /// Name of the growth rule in use.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Timing of the most recent successful step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// The owned field solver.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Give the field solver back.
    pub fn into_solver(self) -> S {
        self.solver
    }
}

impl<const D: usize, S: FieldSolver<D>> std::fmt::Debug for StreamerSimulation<D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamerSimulation")
            .field("phase", &self.phase)
            .field("step", &self.step)
            .field("time", &self.time)
            .field("live", &self.streamers.len())
            .field("model", &self.model.name())
            .field("seed", &self.config.seed)
            .finish()
    }
}
