use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SchedPolicy {
    /// SCHED_FIFO: fixed priority, run to completion
    Fifo,
    /// SCHED_RR: fixed priority, round-robin among equals
    Rr,
    /// SCHED_OTHER: default time-shared policy (no privilege required)
    Normal,
}

impl SchedPolicy {
    pub fn as_raw(self) -> libc::c_int {
        match self {
            SchedPolicy::Fifo => libc::SCHED_FIFO,
            SchedPolicy::Rr => libc::SCHED_RR,
            SchedPolicy::Normal => libc::SCHED_OTHER,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub period_ns: u64,
    pub samples: usize,
    pub prime_limit: u32,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            period_ns: 1_000_000,
            samples: 5_000,
            prime_limit: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RtConfig {
    pub priority: i32,
    pub policy: SchedPolicy,
    pub cpus: Option<Vec<usize>>,
}

impl Default for RtConfig {
    fn default() -> Self {
        Self {
            priority: 80,
            policy: SchedPolicy::Fifo,
            cpus: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub task: TaskConfig,
    pub rt: RtConfig,
}

impl Config {
    /// Clamp fields to valid ranges.
    pub fn validate(&mut self) {
        self.task.period_ns = self.task.period_ns.clamp(1_000, 60_000_000_000);
        self.task.samples = self.task.samples.clamp(1, 10_000_000);
        self.task.prime_limit = self.task.prime_limit.clamp(2, 10_000_000);
        self.rt.priority = match self.rt.policy {
            SchedPolicy::Normal => 0,
            _ => self.rt.priority.clamp(1, 99),
        };
    }
}

/// Load configuration from a TOML file.
///
/// - If `explicit_path` is `Some` and the file is missing, returns an error.
/// - If `explicit_path` is `None`, tries `/etc/rtlat.toml`; if missing, returns defaults.
pub fn load_config(explicit_path: Option<&Path>) -> Result<Config, Error> {
    let path = match explicit_path {
        Some(p) => {
            if !p.exists() {
                return Err(Error::InvalidArgs(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => {
            let default = Path::new("/etc/rtlat.toml");
            if !default.exists() {
                return Ok(Config::default());
            }
            default.to_path_buf()
        }
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        Error::InvalidArgs(format!("failed to read config {}: {}", path.display(), e))
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| {
        Error::InvalidArgs(format!("failed to parse config {}: {}", path.display(), e))
    })?;

    Ok(config)
}
