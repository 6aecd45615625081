//! Schelling segregation model.
//!
//! Agents of two types are randomly placed on a bounded grid. In each step
//! one randomly chosen agent looks at its occupied Moore neighbors and, if the
//! fraction of them sharing its type is below the stay threshold, moves to a
//! randomly chosen empty cell. Every source of randomness is passed in by the
//! caller, so a seeded generator makes a run fully reproducible.

use crate::grid::{CellState, Grid, GridError, GridSnapshot, Position};
use crate::history::{Checkpoint, SegregationHistory};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters fixed at model construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Width and height of the grid.
    pub grid_size: (usize, usize),
    /// Total number of agents (A and B).
    pub n_agents: usize,
    /// Share of type A agents.
    pub share_a: f64,
    /// Minimum fraction of same-type occupied neighbors needed to stay.
    pub stay_threshold: f64,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("no agent at {0}")]
    NoAgent(Position),

    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Result of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The selected agent was satisfied and stayed.
    Stayed { at: Position },
    /// The selected agent was unsatisfied and moved.
    Moved { from: Position, to: Position },
    /// The selected agent was unsatisfied but there was no empty cell.
    Blocked { at: Position },
}

#[derive(Debug, Clone)]
pub struct SchellingModel {
    params: ModelParams,
    grid: Grid,
    history: SegregationHistory,
    steps_run: usize,
}

impl SchellingModel {
    /// Create a model and place its agents uniformly at random.
    ///
    /// The number of A agents is `n_agents * share_a` rounded half away from
    /// zero; the rest are B.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidConfiguration`] if a share is outside
    /// `[0, 1]` or if `n_agents` is zero or exceeds the number of cells.
    pub fn new<R: Rng + ?Sized>(params: ModelParams, rng: &mut R) -> Result<Self, ModelError> {
        let n_cells = validate(&params)?;
        let (x_size, y_size) = params.grid_size;
        let mut grid = Grid::new(x_size, y_size);

        let (count_a, _) = composition(&params);

        // After a partial shuffle the first `n_agents` indices are a uniform
        // sample in random order.
        let mut cell_idxs: Vec<usize> = (0..n_cells).collect();
        let (chosen, _) = cell_idxs.partial_shuffle(rng, params.n_agents);
        for (i_agt, &idx) in chosen.iter().enumerate() {
            let state = if i_agt < count_a {
                CellState::AgentA
            } else {
                CellState::AgentB
            };
            let pos = grid.position_of(idx);
            grid.set_occupant(pos.x, pos.y, state)?;
        }

        if params.n_agents == grid.n_cells() {
            log::warn!("grid has no empty cells, no agent will ever move");
        }

        Ok(Self {
            params,
            grid,
            history: SegregationHistory::new(),
            steps_run: 0,
        })
    }

    /// Cumulative number of steps performed since construction.
    pub fn steps_run(&self) -> usize {
        self.steps_run
    }

    /// Number of A and B agents currently on the grid.
    pub fn counts(&self) -> (usize, usize) {
        (
            self.grid.count(CellState::AgentA),
            self.grid.count(CellState::AgentB),
        )
    }

    /// Read-only copy of the current grid.
    pub fn grid_snapshot(&self) -> GridSnapshot {
        self.grid.snapshot()
    }

    /// Checkpoints recorded so far, across every call to [`Self::run`].
    pub fn segregation_history(&self) -> &SegregationHistory {
        &self.history
    }

    /// Check whether the agent at `(x, y)` is satisfied with its neighborhood.
    ///
    /// An agent without occupied neighbors is always satisfied.
    pub fn is_satisfied(&self, x: usize, y: usize) -> Result<bool, ModelError> {
        let agent = self.grid.occupant_at(x, y)?;
        if agent.is_empty() {
            return Err(ModelError::NoAgent(Position::new(x, y)));
        }
        self.agent_satisfied(Position::new(x, y), agent)
    }

    /// Fraction of all agents that are currently satisfied.
    pub fn fraction_satisfied(&self) -> Result<f64, ModelError> {
        let occupied = self.grid.occupied_positions();
        if occupied.is_empty() {
            return Ok(1.0);
        }

        let mut n_satisfied = 0;
        for &pos in &occupied {
            let agent = self.grid.occupant_at(pos.x, pos.y)?;
            if self.agent_satisfied(pos, agent)? {
                n_satisfied += 1;
            }
        }

        Ok(n_satisfied as f64 / occupied.len() as f64)
    }

    /// Let one uniformly chosen agent decide whether to move.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<StepOutcome, ModelError> {
        let occupied = self.grid.occupied_positions();
        let &pos = occupied.choose(rng).ok_or_else(|| {
            ModelError::InvalidConfiguration("grid holds no agents".to_string())
        })?;

        let outcome = self.relocate_if_unsatisfied(pos, rng)?;
        self.steps_run += 1;

        match outcome {
            StepOutcome::Stayed { at } => {
                log::trace!("step {}: agent at {at} stays", self.steps_run)
            }
            StepOutcome::Moved { from, to } => {
                log::debug!("step {}: agent moves from {from} to {to}", self.steps_run)
            }
            StepOutcome::Blocked { at } => {
                log::debug!("step {}: agent at {at} finds no empty cell", self.steps_run)
            }
        }

        Ok(outcome)
    }

    /// Run `steps` steps from the current state, recording checkpoints.
    ///
    /// A checkpoint is recorded every `print_every` steps of this call
    /// (`0` disables them) and after the last step if `print_at_end`.
    /// The grid and history are never reset between calls.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        steps: usize,
        print_every: usize,
        print_at_end: bool,
        rng: &mut R,
    ) -> Result<(), ModelError> {
        self.run_with(steps, print_every, print_at_end, rng, |_, _| {})
    }

    /// Same as [`Self::run`], calling `on_checkpoint` after each checkpoint.
    ///
    /// This is the hook used to render the grid while the simulation runs.
    pub fn run_with<R, F>(
        &mut self,
        steps: usize,
        print_every: usize,
        print_at_end: bool,
        rng: &mut R,
        mut on_checkpoint: F,
    ) -> Result<(), ModelError>
    where
        R: Rng + ?Sized,
        F: FnMut(&Self, &Checkpoint),
    {
        for i_step in 1..=steps {
            self.step(rng)?;
            if print_every > 0 && i_step % print_every == 0 {
                self.record_checkpoint(&mut on_checkpoint)?;
            }
        }

        if print_at_end {
            self.record_checkpoint(&mut on_checkpoint)?;
        }

        Ok(())
    }

    fn record_checkpoint<F>(&mut self, on_checkpoint: &mut F) -> Result<(), ModelError>
    where
        F: FnMut(&Self, &Checkpoint),
    {
        let checkpoint = Checkpoint {
            step: self.steps_run,
            fraction_satisfied: self.fraction_satisfied()?,
        };
        log::info!(
            "step {:>8}: fraction satisfied {:.4}",
            checkpoint.step,
            checkpoint.fraction_satisfied
        );
        self.history.push(checkpoint);
        on_checkpoint(self, &checkpoint);
        Ok(())
    }

    fn relocate_if_unsatisfied<R: Rng + ?Sized>(
        &mut self,
        from: Position,
        rng: &mut R,
    ) -> Result<StepOutcome, ModelError> {
        let agent = self.grid.occupant_at(from.x, from.y)?;
        if agent.is_empty() {
            return Err(ModelError::NoAgent(from));
        }
        if self.agent_satisfied(from, agent)? {
            return Ok(StepOutcome::Stayed { at: from });
        }

        let empty = self.grid.empty_positions();
        let Some(&to) = empty.choose(rng) else {
            return Ok(StepOutcome::Blocked { at: from });
        };

        self.grid.set_occupant(from.x, from.y, CellState::Empty)?;
        self.grid.set_occupant(to.x, to.y, agent)?;

        Ok(StepOutcome::Moved { from, to })
    }

    fn agent_satisfied(&self, pos: Position, agent: CellState) -> Result<bool, ModelError> {
        let mut n_occupied = 0;
        let mut n_same = 0;
        for (_, state) in self.grid.neighbors_of(pos.x, pos.y)? {
            if state.is_empty() {
                continue;
            }
            n_occupied += 1;
            if state == agent {
                n_same += 1;
            }
        }

        if n_occupied == 0 {
            return Ok(true);
        }
        let fraction_same = n_same as f64 / n_occupied as f64;
        Ok(fraction_same >= self.params.stay_threshold)
    }
}

/// Check the parameters and return the number of cells of the grid.
fn validate(params: &ModelParams) -> Result<usize, ModelError> {
    let invalid = |msg: String| Err(ModelError::InvalidConfiguration(msg));

    if !(0.0..=1.0).contains(&params.share_a) {
        return invalid(format!(
            "share of A agents must be in [0, 1], but is {}",
            params.share_a
        ));
    }
    if !(0.0..=1.0).contains(&params.stay_threshold) {
        return invalid(format!(
            "stay threshold must be in [0, 1], but is {}",
            params.stay_threshold
        ));
    }

    let (x_size, y_size) = params.grid_size;
    let Some(n_cells) = x_size.checked_mul(y_size) else {
        return invalid(format!("grid size {x_size}x{y_size} is too large"));
    };
    if params.n_agents == 0 || params.n_agents > n_cells {
        return invalid(format!(
            "number of agents must be in [1, {n_cells}], but is {}",
            params.n_agents
        ));
    }

    Ok(n_cells)
}

/// Number of A and B agents for the given parameters.
fn composition(params: &ModelParams) -> (usize, usize) {
    let count_a = (params.n_agents as f64 * params.share_a).round() as usize;
    let count_a = count_a.min(params.n_agents);
    (count_a, params.n_agents - count_a)
}
