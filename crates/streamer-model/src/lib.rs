//! Streamer growth model: everything between a solved field and the next
//! conductivity update.
//!
//! # Pipeline (per streamer, each step)
//!
//! 1. [`FieldProfileSampler`]: sample `|E|` ahead of the tip.
//! 2. [`HighFieldLengthEstimator`]: threshold crossing, bias correction,
//!    floor check, smoothing.
//! 3. [`PropagationModel`]: new radius, velocity, conductivity, position
//!    ([`FeatureDriven`] or [`ConductivityDriven`]).
//! 4. [`ConductivityRasterizer`]: all updated streamers into one
//!    [`ChannelUpdate`](streamer_core::ChannelUpdate).

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod correlation;
pub mod estimator;
pub mod profile;
pub mod propagation;
pub mod rasterizer;
pub mod sampler;

pub use correlation::{ConductivityCorrelations, Correlation, LengthCorrelations};
pub use estimator::{HighFieldLengthEstimator, HighFieldLengthEstimatorBuilder, LengthEstimate, ResolutionBias};
pub use profile::AxialProfile;
pub use propagation::{ConductivityDriven, ConductivityDrivenBuilder, FeatureDriven, PropagationModel, Seed};
pub use rasterizer::{ChannelShape, ConductivityRasterizer};
pub use sampler::FieldProfileSampler;
