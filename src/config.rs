use crate::model::ModelParams;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model parameters.
    pub model: ModelParams,
    /// Run parameters.
    pub run: RunConfig,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of steps to run.
    pub steps: usize,
    /// Number of steps between checkpoints (`0` disables them).
    #[serde(default)]
    pub print_every: usize,
    /// Record a checkpoint after the last step.
    #[serde(default = "default_print_at_end")]
    pub print_at_end: bool,
    /// Seed of the random number generator (drawn at random if missing).
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_print_at_end() -> bool {
    true
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::parse(&contents)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let (x_size, y_size) = self.model.grid_size;
        check_num(x_size, 1..=10_000).context("invalid grid width")?;
        check_num(y_size, 1..=10_000).context("invalid grid height")?;
        check_num(self.model.n_agents, 1..=x_size * y_size).context("invalid number of agents")?;
        check_num(self.model.share_a, 0.0..=1.0).context("invalid share of A agents")?;
        check_num(self.model.stay_threshold, 0.0..=1.0).context("invalid stay threshold")?;

        check_num(self.run.steps, 0..=1_000_000_000).context("invalid number of steps")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[model]
grid_size = [15, 15]
n_agents = 100
share_a = 0.5
stay_threshold = 0.5

[run]
steps = 2000
print_every = 100
print_at_end = true
seed = 42
"#;

    #[test]
    fn full_config_is_parsed() {
        let config = Config::parse(CONFIG).unwrap();
        assert_eq!(config.model.grid_size, (15, 15));
        assert_eq!(config.model.n_agents, 100);
        assert_eq!(config.model.share_a, 0.5);
        assert_eq!(config.model.stay_threshold, 0.5);
        assert_eq!(config.run.steps, 2000);
        assert_eq!(config.run.print_every, 100);
        assert!(config.run.print_at_end);
        assert_eq!(config.run.seed, Some(42));
    }

    #[test]
    fn optional_run_fields_have_defaults() {
        let contents = CONFIG
            .replace("print_every = 100\n", "")
            .replace("print_at_end = true\n", "")
            .replace("seed = 42\n", "");
        let config = Config::parse(&contents).unwrap();
        assert_eq!(config.run.print_every, 0);
        assert!(config.run.print_at_end);
        assert_eq!(config.run.seed, None);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for (from, to) in [
            ("n_agents = 100", "n_agents = 226"),
            ("n_agents = 100", "n_agents = 0"),
            ("share_a = 0.5", "share_a = 1.5"),
            ("stay_threshold = 0.5", "stay_threshold = -0.5"),
            ("grid_size = [15, 15]", "grid_size = [0, 15]"),
        ] {
            let contents = CONFIG.replace(from, to);
            let err = Config::parse(&contents).unwrap_err();
            assert!(
                format!("{err:#}").contains("failed to validate config"),
                "accepted {to}"
            );
        }
    }

    #[test]
    fn malformed_config_is_rejected() {
        assert!(Config::parse("[model]\ngrid_size = 15\n").is_err());
        assert!(Config::parse(&CONFIG.replace("steps = 2000", "steps = -1")).is_err());
    }
}
