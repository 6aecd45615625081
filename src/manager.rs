use crate::config::Config;
use crate::grid::GridSnapshot;
use crate::history::SegregationHistory;
use crate::model::SchellingModel;
use crate::render::{CLEAR_SCREEN, curve_to_string, grid_to_string};
use anyhow::{Context, Result};
use glob::glob;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

const CURVE_WIDTH: usize = 60;
const CURVE_HEIGHT: usize = 12;

/// Everything a finished run leaves behind.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunResults {
    pub seed: u64,
    pub cfg: Config,
    pub steps_run: usize,
    pub final_grid: GridSnapshot,
    pub history: SegregationHistory,
}

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Run a new simulation in a fresh run directory.
    ///
    /// The seed given here takes precedence over the one in the config.
    pub fn run_simulation(&self, seed: Option<u64>, render: bool) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;
        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let seed = seed.or(self.cfg.run.seed).unwrap_or_else(rand::random);
        log::info!("using seed {seed}");
        let mut rng = ChaCha12Rng::seed_from_u64(seed);

        let mut model = SchellingModel::new(self.cfg.model.clone(), &mut rng)
            .context("failed to construct model")?;
        let (count_a, count_b) = model.counts();
        log::info!("placed {count_a} A agents and {count_b} B agents");

        let run_cfg = &self.cfg.run;
        model
            .run_with(
                run_cfg.steps,
                run_cfg.print_every,
                run_cfg.print_at_end,
                &mut rng,
                |model, checkpoint| {
                    if render {
                        print!("{CLEAR_SCREEN}");
                        print!("{}", grid_to_string(&model.grid_snapshot(), true));
                        println!(
                            "step {}: fraction satisfied {:.4}",
                            checkpoint.step, checkpoint.fraction_satisfied
                        );
                    }
                },
            )
            .context("failed to run model")?;

        let results = RunResults {
            seed,
            cfg: self.cfg.clone(),
            steps_run: model.steps_run(),
            final_grid: model.grid_snapshot(),
            history: model.segregation_history().clone(),
        };

        let results_file = self.results_file(run_idx);
        save_results(&results, &results_file)
            .with_context(|| format!("failed to save {results_file:?}"))?;
        log::info!("saved {results_file:?}");

        print_curve(&results.history);

        Ok(())
    }

    /// Print the segregation curve of a finished run.
    pub fn plot_run(&self, run_idx: usize) -> Result<()> {
        let results_file = self.results_file(run_idx);
        let results = load_results(&results_file)
            .with_context(|| format!("failed to load {results_file:?}"))?;
        log::info!("loaded {results_file:?} (seed {})", results.seed);

        print_curve(&results.history);

        Ok(())
    }

    /// Remove every run directory.
    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs().context("failed to list run dirs")? {
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let dirs = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        Ok(dirs)
    }

    fn count_run_dirs(&self) -> Result<usize> {
        Ok(self.run_dirs()?.len())
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn results_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("results.msgpack")
    }
}

fn save_results(results: &RunResults, file: &Path) -> Result<()> {
    let file = File::create(file).context("failed to create file")?;
    let mut writer = BufWriter::new(file);
    encode::write(&mut writer, results).context("failed to serialize results")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

fn load_results(file: &Path) -> Result<RunResults> {
    let file = File::open(file).context("failed to open file")?;
    let mut reader = BufReader::new(file);
    let results = decode::from_read(&mut reader).context("failed to deserialize results")?;
    Ok(results)
}

fn print_curve(history: &SegregationHistory) {
    print!(
        "{}",
        curve_to_string(history.checkpoints(), CURVE_WIDTH, CURVE_HEIGHT)
    );
    if let Some(summary) = history.summary() {
        println!(
            "checkpoints: {}, first: {:.4}, last: {:.4}, min: {:.4}, max: {:.4}, mean: {:.4} (std dev {:.4})",
            summary.n_checkpoints,
            summary.first,
            summary.last,
            summary.min,
            summary.max,
            summary.mean,
            summary.std_dev
        );
    }
}
