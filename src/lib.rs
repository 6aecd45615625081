//! Schelling's model of segregation.
//!
//! Agents of two types live on a bounded rectangular grid and relocate to a
//! random empty cell whenever the fraction of their occupied neighbors that
//! share their type drops below a stay threshold. The [`model`] module holds
//! the simulation engine; [`render`] turns its snapshots and segregation
//! curve into terminal output, and [`manager`] ties both to a simulation
//! directory for the command line tool.

pub mod config;
pub mod grid;
pub mod history;
pub mod manager;
pub mod model;
pub mod render;

pub use grid::{CellState, Grid, GridError, GridSnapshot, Position};
pub use history::{Checkpoint, SegregationHistory};
pub use model::{ModelError, ModelParams, SchellingModel, StepOutcome};
