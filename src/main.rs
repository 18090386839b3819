mod cli;
mod clock;
mod config;
mod error;
mod logging;
mod recorder;
mod report;
mod sched;
mod task;
mod workload;

use std::path::Path;
use std::process;

use clap::Parser;

use cli::{Cli, RtArgs, TaskArgs};
use config::Config;
use error::Error;

/// Build a Config by layering: defaults → TOML file → CLI overrides.
///
/// A failure to load an explicitly requested config file is fatal; a
/// problem with the implicit /etc/rtlat.toml only warns and falls back to
/// defaults.
fn build_config(
    config_file: Option<&Path>,
    task: &TaskArgs,
    rt: &RtArgs,
) -> Result<Config, Error> {
    let mut cfg = match config::load_config(config_file) {
        Ok(c) => c,
        Err(e) if config_file.is_some() => return Err(e),
        Err(e) => {
            log::warn!("{}", e);
            Config::default()
        }
    };

    // Apply CLI overrides (only if explicitly set)
    if let Some(v) = task.period_ns {
        cfg.task.period_ns = v;
    }
    if let Some(v) = task.samples {
        cfg.task.samples = v;
    }
    if let Some(v) = task.prime_limit {
        cfg.task.prime_limit = v;
    }
    if let Some(v) = rt.priority {
        cfg.rt.priority = v;
    }
    if let Some(v) = rt.policy {
        cfg.rt.policy = v;
    }
    if let Some(v) = &rt.cpus {
        cfg.rt.cpus = Some(v.clone());
    }

    cfg.validate();
    Ok(cfg)
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let cfg = match build_config(cli.config_file.as_deref(), &cli.task, &cli.rt) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };

    log::info!(
        "sampling {} periods of {} ns (policy {:?}, priority {}, cpus {:?})",
        cfg.task.samples,
        cfg.task.period_ns,
        cfg.rt.policy,
        cfg.rt.priority,
        cfg.rt.cpus,
    );

    let prime_limit = cfg.task.prime_limit;
    match task::run(&cfg, move || {
        workload::prime_count(prime_limit);
    }) {
        Ok(samples) => {
            if let Err(e) = report::write_report(&samples, &cli.format, cli.output_file.as_deref())
            {
                log::error!("error writing report: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_overrides() -> (TaskArgs, RtArgs) {
        (
            TaskArgs {
                period_ns: None,
                samples: None,
                prime_limit: None,
            },
            RtArgs {
                priority: None,
                policy: None,
                cpus: None,
            },
        )
    }

    #[test]
    fn test_build_config_missing_explicit_file_is_fatal() {
        let (task, rt) = no_overrides();
        let path = Path::new("/tmp/rtlat_no_such_config.toml");
        let err = build_config(Some(path), &task, &rt).unwrap_err();
        match err {
            Error::InvalidArgs(msg) => assert!(msg.contains("config file not found")),
            other => panic!("expected Error::InvalidArgs, got {:?}", other),
        }
    }

    #[test]
    fn test_build_config_cli_overrides_file() {
        let path = std::env::temp_dir().join("rtlat_test_build_config.toml");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            write!(f, "[task]\nperiod_ns = 2000000\nsamples = 100\n").unwrap();
        }
        let (mut task, rt) = no_overrides();
        task.samples = Some(7);
        let cfg = build_config(Some(path.as_path()), &task, &rt).unwrap();
        assert_eq!(cfg.task.period_ns, 2_000_000);
        assert_eq!(cfg.task.samples, 7);
        let _ = std::fs::remove_file(&path);
    }
}
