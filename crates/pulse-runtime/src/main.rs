// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The `pulse` binary.
//!
//! Resolves the configuration files named on the command line, builds the
//! imported modules from the packaged catalog and ticks them until Ctrl-C.

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::Args;
use pulse_config::{ConfigResolver, CoreSettings};
use pulse_control::{
    ModuleCatalog, ModuleRegistry, Scheduler, SchedulerConfig, SchedulerHandle, SchedulerReport,
};
use std::future::Future;
use std::io;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let scheduler = build_scheduler(&args)?;
    let handle = scheduler
        .spawn()
        .context("failed to start the scheduler")?;

    let report = supervise(handle, tokio::signal::ctrl_c()).await?;
    log_report(&report);
    Ok(())
}

/// Waits until either `shutdown` resolves or the scheduler thread ends on its
/// own, and returns the final report.
///
/// A scheduler that stops without being asked to is an error. If listening
/// for `shutdown` fails, the scheduler is still drained before the error is
/// returned.
async fn supervise<F>(handle: SchedulerHandle, shutdown: F) -> Result<SchedulerReport>
where
    F: Future<Output = io::Result<()>>,
{
    let requester = handle.shutdown_requester();
    let mut finished = tokio::task::spawn_blocking(move || handle.join());

    let signal = tokio::select! {
        joined = &mut finished => {
            let report = joined
                .context("failed to wait for the scheduler")?
                .context("the scheduler stopped abnormally")?;
            bail!(
                "the scheduler stopped after {} tick(s) without a shutdown request",
                report.ticks
            );
        }
        signal = shutdown => signal,
    };

    if signal.is_ok() {
        log::info!("Shutdown requested, draining modules.");
    }
    requester.request();
    let report = finished
        .await
        .context("failed to wait for the scheduler")?
        .context("the scheduler stopped abnormally")?;
    signal.context("failed to listen for Ctrl-C")?;
    Ok(report)
}

/// Resolves the configuration and builds the module set, without starting it.
fn build_scheduler(args: &Args) -> Result<Scheduler> {
    let resolved = ConfigResolver::new()
        .with_missing_source_policy(args.missing_source_policy())
        .with_overrides(args.overrides())
        .resolve(&args.sources())
        .context("failed to resolve configuration")?;
    let core = CoreSettings::from_resolved(&resolved).context("invalid core settings")?;

    let mut catalog = ModuleCatalog::new();
    pulse_modules::register_builtin(&mut catalog)
        .context("failed to register the packaged modules")?;

    let imports = core.import_list(&args.modules);
    let modules = ModuleRegistry::new(catalog)
        .build(&resolved, &imports)
        .context("failed to build the module set")?;

    let config = SchedulerConfig::from(&core);
    log::info!(
        "Running {} module(s) at {} tick(s) per second: {}",
        modules.len(),
        config.tick_rate,
        imports.join(", ")
    );
    Ok(Scheduler::new(config, modules))
}

fn log_report(report: &SchedulerReport) {
    log::info!(
        "Stopped after {} tick(s). Average tick {:?}, max drift {:?} ({} drift warning(s)).",
        report.ticks,
        report.average_tick,
        report.max_drift,
        report.drift_reports
    );
    for fault in &report.faults {
        log::warn!(
            "Module '{}' faulted at tick {}: {}",
            fault.module,
            fault.tick,
            fault.reason
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_control::SchedulerState;
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;

    fn write_config(dir: &Path, name: &str, text: &str) -> String {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        path.display().to_string()
    }

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("pulse").chain(argv.iter().copied())).unwrap()
    }

    const MAIN: &str = "\
module: core
config:
  import: [heartbeat]
  tickrate: 20
---
module: heartbeat
config:
  interval: 4
";

    #[test]
    fn test_build_scheduler_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let main = write_config(dir.path(), "pulse.yml", MAIN);
        let keys = write_config(
            dir.path(),
            "keys.yml",
            "module: core\nconfig:\n  tickrate: 50\n",
        );

        let scheduler = build_scheduler(&args(&["-f", &main, "-f", &keys, "journal"])).unwrap();

        assert_eq!(
            scheduler.modules().names().collect::<Vec<_>>(),
            ["heartbeat", "journal"]
        );
        assert_eq!(scheduler.config().period(), Duration::from_millis(20));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_set_overrides_files() {
        let dir = tempfile::tempdir().unwrap();
        let main = write_config(dir.path(), "pulse.yml", MAIN);

        let scheduler =
            build_scheduler(&args(&["-f", &main, "-d", "core", "tickrate", "10"])).unwrap();
        assert_eq!(scheduler.config().tick_rate, 10);

        let heartbeat = scheduler.modules().get("heartbeat").unwrap();
        assert_eq!(
            heartbeat.config().get("interval"),
            Some(&serde_yaml::Value::Number(4.into()))
        );
    }

    #[test]
    fn test_missing_file_is_fatal_unless_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let main = write_config(dir.path(), "pulse.yml", MAIN);
        let keys = dir.path().join("keys.yml").display().to_string();

        let err = build_scheduler(&args(&["-f", &main, "-f", &keys])).unwrap_err();
        assert!(format!("{err:#}").starts_with("failed to resolve configuration"));

        assert!(build_scheduler(&args(&["--skip-missing", "-f", &main, "-f", &keys])).is_ok());
    }

    #[test]
    fn test_missing_tickrate_is_reported() {
        let err = build_scheduler(&args(&[])).unwrap_err();
        assert!(format!("{err:#}").starts_with("invalid core settings"));
    }

    #[test]
    fn test_unknown_module_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let main = write_config(dir.path(), "pulse.yml", MAIN);

        let err = build_scheduler(&args(&["-f", &main, "telegramio"])).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.starts_with("failed to build the module set"));
        assert!(message.contains("telegramio"));
    }

    #[test]
    fn test_invalid_module_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let main = write_config(dir.path(), "pulse.yml", MAIN);

        let err =
            build_scheduler(&args(&["-f", &main, "-d", "heartbeat", "interval", "0"])).unwrap_err();
        assert!(format!("{err:#}").contains("module 'heartbeat' failed to construct"));
    }

    #[tokio::test]
    async fn test_supervise_drains_when_shutdown_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let main = write_config(dir.path(), "pulse.yml", MAIN);
        let handle = build_scheduler(&args(&["-f", &main]))
            .unwrap()
            .spawn()
            .unwrap();

        let shutdown = async {
            tokio::time::sleep(Duration::from_millis(60)).await;
            Ok(())
        };
        let report = supervise(handle, shutdown).await.unwrap();
        assert!(report.ticks >= 1);
        assert!(report.faults.is_empty());
    }

    #[tokio::test]
    async fn test_supervise_reports_failed_shutdown_listener() {
        let dir = tempfile::tempdir().unwrap();
        let main = write_config(dir.path(), "pulse.yml", MAIN);
        let handle = build_scheduler(&args(&["-f", &main]))
            .unwrap()
            .spawn()
            .unwrap();

        let shutdown = async { Err(io::Error::other("no signal handler")) };
        let err = supervise(handle, shutdown).await.unwrap_err();
        assert!(format!("{err:#}").starts_with("failed to listen for Ctrl-C"));
    }
}
