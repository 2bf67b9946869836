// src/lib.rs

pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod project;
pub mod resource;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use crate::cache::OutputCache;
use crate::cli::CliArgs;
use crate::config::{config_root_dir, load_and_validate};
use crate::engine::{CancelFlag, Plan, ProcessingDriver, RunReport, Severity};
use crate::fs::{FileSystem, RealFileSystem};
use crate::project::{Project, RunScope};
use crate::resource::{AlwaysReprocess, InMemoryValidity, ValidityTracker};
use crate::watch::{spawn_watcher, ChangeBatch, WatchScope};

/// Quiet period after a change before the next pass starts.
const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - output cache and processing driver
/// - Ctrl-C handling
/// - (optional) file watcher
///
/// Returns `Ok(false)` when the last pass reported errors.
pub async fn run(args: CliArgs) -> Result<bool> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let root = config_root_dir(&config_path);

    let project = Arc::new(cfg.to_project(&root));
    let scope = Arc::new(RunScope::from_names(args.units.clone()));
    let cache_file = cfg.cache_file(&root);

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let cache = OutputCache::load(fs.clone(), &cache_file, cfg.project.case_sensitivity);

    let tracker: Arc<dyn ValidityTracker> = if args.watch {
        Arc::new(InMemoryValidity::new())
    } else {
        Arc::new(AlwaysReprocess)
    };
    let driver = ProcessingDriver::new(fs, cache)
        .with_charset_resolver(Arc::new(cfg.charset_resolver()))
        .with_validity_tracker(tracker);

    if args.dry_run {
        let discovery = driver.discover(&project, &scope, &CancelFlag::new())?;
        let plan = driver.diff(discovery);
        print_dry_run(&plan);
        return Ok(!plan.messages.iter().any(|m| m.severity == Severity::Error));
    }

    // Ctrl-C → cooperative cancellation of the running pass.
    let cancel = CancelFlag::new();
    let shutdown = Arc::new(Notify::new());
    {
        let cancel = cancel.clone();
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            cancel.cancel();
            shutdown.notify_one();
        });
    }

    let (driver, report) =
        run_pass(driver, Arc::clone(&project), Arc::clone(&scope), cancel.clone()).await?;
    print_summary(&report);

    if !args.watch || report.is_cancelled() {
        return Ok(!report.has_errors());
    }

    watch_loop(driver, project, scope, &root, &cache_file, cancel, shutdown, report).await
}

/// Run one pass on the blocking pool, handing the driver back afterwards.
async fn run_pass(
    mut driver: ProcessingDriver,
    project: Arc<Project>,
    scope: Arc<RunScope>,
    cancel: CancelFlag,
) -> Result<(ProcessingDriver, RunReport)> {
    let (driver, report) = tokio::task::spawn_blocking(move || {
        let report = driver.run(&project, &scope, &cancel);
        (driver, report)
    })
    .await
    .context("processing pass panicked")?;
    Ok((driver, report?))
}

#[allow(clippy::too_many_arguments)]
async fn watch_loop(
    mut driver: ProcessingDriver,
    project: Arc<Project>,
    scope: Arc<RunScope>,
    root: &Path,
    cache_file: &Path,
    cancel: CancelFlag,
    shutdown: Arc<Notify>,
    mut last: RunReport,
) -> Result<bool> {
    let watch_scope = WatchScope::for_project(&project, cache_file);
    if watch_scope.is_empty() {
        warn!("no resource roots or filter files to watch");
    }

    let (tx, mut rx) = mpsc::channel::<ChangeBatch>(64);
    let _watcher = spawn_watcher(root, watch_scope, tx)?;
    info!("watching for changes; press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            batch = rx.recv() => {
                let Some(batch) = batch else { break };
                let mut changed = batch.paths.len();

                tokio::time::sleep(WATCH_DEBOUNCE).await;
                while let Ok(more) = rx.try_recv() {
                    changed += more.paths.len();
                }
                debug!(changed, "change batch collected");

                let (d, report) = run_pass(
                    driver,
                    Arc::clone(&project),
                    Arc::clone(&scope),
                    cancel.clone(),
                )
                .await?;
                driver = d;
                print_summary(&report);
                let cancelled = report.is_cancelled();
                last = report;
                if cancelled {
                    break;
                }
            }
        }
    }

    info!("watch stopped");
    Ok(!last.has_errors())
}

fn print_summary(report: &RunReport) {
    if report.is_cancelled() {
        println!("resflow: cancelled, output cache unchanged");
        return;
    }
    println!(
        "resflow: {} processed, {} up to date, {} deleted, {} error(s), {} warning(s)",
        report.processed.len(),
        report.skipped.len(),
        report.deleted.len(),
        report.errors().count(),
        report.warnings().count(),
    );
}

/// Dry-run output: per unit, what would be copied, filtered and deleted.
fn print_dry_run(plan: &Plan) {
    println!("resflow dry-run");
    for unit in &plan.units {
        println!(
            "unit {} ({:?}): {} candidate(s), {} obsolete",
            unit.unit,
            unit.status,
            unit.candidates.len(),
            unit.deletions.len()
        );
        for item in &unit.candidates {
            let action = if item.is_filtered() { "filter" } else { "copy" };
            println!(
                "  {action:<6} {} -> {}",
                item.source_path().display(),
                item.output_path()
            );
        }
        for path in &unit.deletions {
            println!("  delete {path}");
        }
    }
    for message in &plan.messages {
        println!("{message}");
    }

    debug!("dry-run complete (nothing written)");
}
