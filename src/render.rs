//! Terminal rendering of grid snapshots and segregation curves.
//!
//! Everything here is a pure function of a snapshot or history value; the
//! model itself knows nothing about presentation.

use crate::grid::{CellState, GridSnapshot};
use crate::history::Checkpoint;
use std::fmt::Write;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[01m";
const FG_GREEN: &str = "\x1b[32m";
const FG_BLUE: &str = "\x1b[34m";
const BG_LIGHT_GREY: &str = "\x1b[47m";

/// ANSI sequence that clears the terminal and moves the cursor home.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Render a snapshot as text, one line per grid row and three characters per cell.
///
/// With `colored`, A agents are bold green, B agents bold blue and every
/// other cell has a light grey background (checkerboard). Without it, empty
/// cells are shown as `.`.
pub fn grid_to_string(snapshot: &GridSnapshot, colored: bool) -> String {
    let mut out = String::new();
    for y in 0..snapshot.y_size {
        for x in 0..snapshot.x_size {
            let cell = snapshot.get(x, y).unwrap_or_default();
            if colored {
                if (x + y) % 2 == 0 {
                    out.push_str(BG_LIGHT_GREY);
                }
                let glyph = match cell {
                    CellState::AgentA => format!("{BOLD}{FG_GREEN} A {RESET}"),
                    CellState::AgentB => format!("{BOLD}{FG_BLUE} B {RESET}"),
                    CellState::Empty => format!("   {RESET}"),
                };
                out.push_str(&glyph);
            } else {
                out.push_str(match cell {
                    CellState::AgentA => " A ",
                    CellState::AgentB => " B ",
                    CellState::Empty => " . ",
                });
            }
        }
        out.push('\n');
    }
    out
}

/// Plot fraction satisfied against step as an ASCII chart of `width` by `height` points.
pub fn curve_to_string(checkpoints: &[Checkpoint], width: usize, height: usize) -> String {
    let (Some(first), Some(last)) = (checkpoints.first(), checkpoints.last()) else {
        return String::from("no checkpoints recorded\n");
    };
    let width = width.max(2);
    let height = height.max(2);

    let step_min = first.step;
    let step_span = last.step.saturating_sub(step_min).max(1);

    let mut canvas = vec![vec![' '; width]; height];
    for checkpoint in checkpoints {
        let col = checkpoint.step.saturating_sub(step_min) * (width - 1) / step_span;
        let frac = checkpoint.fraction_satisfied.clamp(0.0, 1.0);
        let row = (frac * (height - 1) as f64).round() as usize;
        canvas[height - 1 - row][col.min(width - 1)] = '*';
    }

    let mut out = String::new();
    for (i_row, line) in canvas.iter().enumerate() {
        let level = (height - 1 - i_row) as f64 / (height - 1) as f64;
        let line: String = line.iter().collect();
        writeln!(out, "{level:4.2} |{}", line.trim_end()).ok();
    }
    writeln!(out, "     +{}", "-".repeat(width)).ok();
    let last_label = last.step.to_string();
    let pad = (width + 1).saturating_sub(last_label.len());
    writeln!(out, "      {:<pad$}{last_label}", step_min).ok();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn small_snapshot() -> GridSnapshot {
        let mut grid = Grid::new(3, 2);
        grid.set_occupant(0, 0, CellState::AgentA).unwrap();
        grid.set_occupant(2, 1, CellState::AgentB).unwrap();
        grid.snapshot()
    }

    #[test]
    fn plain_grid_has_one_line_per_row() {
        let text = grid_to_string(&small_snapshot(), false);
        assert_eq!(text, " A  .  . \n .  .  B \n");
    }

    #[test]
    fn colored_grid_uses_distinct_glyphs() {
        let text = grid_to_string(&small_snapshot(), true);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains(&format!("{BOLD}{FG_GREEN} A {RESET}")));
        assert!(text.contains(&format!("{BOLD}{FG_BLUE} B {RESET}")));
        assert_eq!(text.matches(BG_LIGHT_GREY).count(), 3);
    }

    #[test]
    fn empty_curve_says_so() {
        assert_eq!(curve_to_string(&[], 20, 5), "no checkpoints recorded\n");
    }

    #[test]
    fn curve_places_points_by_step_and_fraction() {
        let checkpoints = [
            Checkpoint {
                step: 0,
                fraction_satisfied: 0.0,
            },
            Checkpoint {
                step: 100,
                fraction_satisfied: 1.0,
            },
        ];
        let text = curve_to_string(&checkpoints, 11, 5);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "1.00 |          *");
        assert_eq!(lines[4], "0.00 |*");
        assert_eq!(lines[5], format!("     +{}", "-".repeat(11)));
        assert!(lines[6].trim_start().starts_with('0'));
        assert!(lines[6].ends_with("100"));
    }

    #[test]
    fn unsorted_checkpoints_do_not_panic() {
        let checkpoints = [
            Checkpoint {
                step: 50,
                fraction_satisfied: 0.5,
            },
            Checkpoint {
                step: 10,
                fraction_satisfied: 1.0,
            },
            Checkpoint {
                step: 300,
                fraction_satisfied: 0.0,
            },
        ];
        let text = curve_to_string(&checkpoints, 20, 5);
        assert_eq!(text.lines().count(), 7);
        assert_eq!(text.matches('*').count(), 3);
    }

    #[test]
    fn single_checkpoint_curve_is_drawn() {
        let checkpoints = [Checkpoint {
            step: 40,
            fraction_satisfied: 0.5,
        }];
        let text = curve_to_string(&checkpoints, 10, 3);
        assert_eq!(text.matches('*').count(), 1);
        assert!(text.contains("0.50 |*"));
    }
}
