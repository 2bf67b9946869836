// src/engine/driver.rs

//! Discover -> Diff -> Apply -> Persist, one strictly sequential pass.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::{debug, info};

use crate::cache::{OutputCache, PathSet};
use crate::engine::cancel::CancelFlag;
use crate::engine::plan::{Discovery, Plan, UnitDiscovery, UnitPlan, UnitStatus};
use crate::engine::report::{emit, Message, RunOutcome, RunReport};
use crate::errors::{ResflowError, Result};
use crate::fs::FileSystem;
use crate::project::{BuildUnit, Project, RunScope};
use crate::resource::discovery::{collect_candidates, CandidateItem, RootSpec};
use crate::resource::filter::{Charset, CharsetResolver, DefaultCharsetResolver, PlaceholderFilter, TextFilter};
use crate::resource::patterns::PatternMatcher;
use crate::resource::properties::load_filters;
use crate::resource::validity::{AlwaysReprocess, ValidityTracker};
use crate::types::ResourceScope;

/// Owns one project's output cache and runs processing passes against it.
///
/// Runs must not overlap; `run` takes `&mut self` for that reason.
pub struct ProcessingDriver {
    fs: Arc<dyn FileSystem>,
    cache: OutputCache,
    filter: Arc<dyn TextFilter>,
    charsets: Arc<dyn CharsetResolver>,
    tracker: Arc<dyn ValidityTracker>,
}

impl std::fmt::Debug for ProcessingDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingDriver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Result of the Apply phase.
#[derive(Debug, Default)]
struct Applied {
    processed: Vec<CandidateItem>,
    skipped: Vec<String>,
    deleted: Vec<String>,
}

impl ProcessingDriver {
    /// Driver with `${key}` substitution, default charsets and no skipping.
    pub fn new(fs: Arc<dyn FileSystem>, cache: OutputCache) -> Self {
        Self {
            fs,
            cache,
            filter: Arc::new(PlaceholderFilter),
            charsets: Arc::new(DefaultCharsetResolver::default()),
            tracker: Arc::new(AlwaysReprocess),
        }
    }

    pub fn with_filter(mut self, filter: Arc<dyn TextFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_charset_resolver(mut self, charsets: Arc<dyn CharsetResolver>) -> Self {
        self.charsets = charsets;
        self
    }

    pub fn with_validity_tracker(mut self, tracker: Arc<dyn ValidityTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn cache(&self) -> &OutputCache {
        &self.cache
    }

    /// Run one full pass.
    ///
    /// Per-unit and per-item problems end up as messages in the report.
    /// Cancellation yields a `Cancelled` report and leaves the on-disk cache
    /// untouched.
    pub fn run(&mut self, project: &Project, scope: &RunScope, cancel: &CancelFlag) -> Result<RunReport> {
        info!(units = project.units.len(), "processing resources");

        let discovery = match self.discover(project, scope, cancel) {
            Err(e) if e.is_cancelled() => return Ok(cancelled()),
            other => other?,
        };

        let mut plan = self.diff(discovery);

        let (applied, apply_messages) = match self.apply(&plan, cancel) {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => return Ok(cancelled()),
            Err(e) => return Err(e),
        };

        let mut report = RunReport::new(RunOutcome::Completed);
        report.messages = std::mem::take(&mut plan.messages);
        report.messages.extend(apply_messages);
        report.processed = applied.processed;
        report.skipped = applied.skipped;
        report.deleted = applied.deleted;

        if let Err(e) = self.persist(&plan, project, &mut report.messages) {
            emit(
                &mut report.messages,
                Message::error(format!("cannot save output cache: {e}")).at(self.cache.path()),
            );
        }

        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            deleted = report.deleted.len(),
            errors = report.errors().count(),
            "resource processing finished"
        );
        Ok(report)
    }

    /// Discover phase: collect candidates for every unit in `scope`.
    ///
    /// Only fails on cancellation.
    pub fn discover(&self, project: &Project, scope: &RunScope, cancel: &CancelFlag) -> Result<Discovery> {
        let mut discovery = Discovery::default();

        if let RunScope::Units(names) = scope {
            for name in names {
                if project.unit(name).is_none() {
                    emit(
                        &mut discovery.messages,
                        Message::warning(ResflowError::UnitNotFound(name.clone()).to_string()),
                    );
                }
            }
        }

        for unit in project.units.iter().filter(|u| scope.contains(&u.name)) {
            cancel.check()?;
            let found = self.discover_unit(unit, cancel, &mut discovery.messages)?;
            discovery.units.push(found);
        }

        debug!(candidates = discovery.candidate_count(), "discovery finished");
        Ok(discovery)
    }

    fn discover_unit(
        &self,
        unit: &BuildUnit,
        cancel: &CancelFlag,
        messages: &mut Vec<Message>,
    ) -> Result<UnitDiscovery> {
        let misconfigured = |unit: &BuildUnit| UnitDiscovery {
            unit: unit.name.clone(),
            status: UnitStatus::Misconfigured,
            candidates: Vec::new(),
        };

        let missing = unit.missing_outputs();
        if !missing.is_empty() {
            for scope in missing {
                emit(
                    messages,
                    Message::error(format!(
                        "output directory is not specified for {scope} resources of unit '{}'",
                        unit.name
                    ))
                    .for_unit(&unit.name),
                );
            }
            return Ok(misconfigured(unit));
        }

        let mut properties = unit.properties.clone();
        let (from_files, failures) = load_filters(self.fs.as_ref(), &unit.filters);
        for failure in failures {
            emit(
                messages,
                Message::warning(format!("cannot read the filter: {}", failure.reason))
                    .for_unit(&unit.name)
                    .at(failure.path),
            );
        }
        properties.extend(from_files);
        let properties_hash = properties.fingerprint();
        let properties = Arc::new(properties);

        let mut candidates = Vec::new();
        for scope in [ResourceScope::Main, ResourceScope::Test] {
            let Some(destination) = unit.output_for(scope) else {
                continue;
            };
            for root in unit.resources_for(scope) {
                let matcher = match PatternMatcher::new(&root.includes, &root.excludes) {
                    Ok(m) => m,
                    Err(e) => {
                        emit(
                            messages,
                            Message::error(e.to_string()).for_unit(&unit.name).at(&root.directory),
                        );
                        return Ok(misconfigured(unit));
                    }
                };
                let spec = RootSpec {
                    unit: &unit.name,
                    root: &root.directory,
                    destination,
                    matcher: &matcher,
                    filtering: root.filtering,
                    properties: &properties,
                    properties_hash,
                };
                match collect_candidates(self.fs.as_ref(), &spec, cancel) {
                    Ok(found) => candidates.extend(found),
                    Err(e) if e.is_cancelled() => return Err(e),
                    Err(e) => {
                        emit(
                            messages,
                            Message::error(format!("cannot list resources: {e}"))
                                .for_unit(&unit.name)
                                .at(&root.directory),
                        );
                        return Ok(misconfigured(unit));
                    }
                }
            }
        }

        Ok(UnitDiscovery {
            unit: unit.name.clone(),
            status: UnitStatus::Ready,
            candidates,
        })
    }

    /// Diff phase: compare each unit's outputs against the cache.
    ///
    /// Reads the cache but does not modify it.
    pub fn diff(&self, discovery: Discovery) -> Plan {
        let sensitivity = self.cache.sensitivity();
        let mut plan = Plan {
            units: Vec::with_capacity(discovery.units.len()),
            messages: discovery.messages,
        };

        for found in discovery.units {
            if found.status == UnitStatus::Misconfigured {
                plan.units.push(UnitPlan {
                    unit: found.unit,
                    status: found.status,
                    candidates: Vec::new(),
                    current: None,
                    deletions: Vec::new(),
                });
                continue;
            }

            let current = PathSet::from_paths(
                sensitivity,
                found.candidates.iter().map(|c| c.output_path().to_string()),
            );
            let deletions = self
                .cache
                .get(&found.unit)
                .map(|previous| previous.difference(&current))
                .unwrap_or_default();

            if !deletions.is_empty() {
                debug!(unit = %found.unit, count = deletions.len(), "obsolete outputs");
            }

            plan.units.push(UnitPlan {
                unit: found.unit,
                status: found.status,
                candidates: found.candidates,
                current: Some(current),
                deletions,
            });
        }

        plan
    }

    /// Apply phase: delete obsolete outputs, then copy or filter candidates.
    fn apply(&self, plan: &Plan, cancel: &CancelFlag) -> Result<(Applied, Vec<Message>)> {
        let mut applied = Applied::default();
        let mut messages = Vec::new();

        for path in plan.deletions() {
            cancel.check()?;
            let target = Path::new(path);
            self.tracker.forget(path);
            if !self.fs.exists(target) {
                continue;
            }
            match self.fs.remove_file(target) {
                Ok(()) => {
                    debug!(path = %path, "deleted obsolete output");
                    applied.deleted.push(path.to_string());
                }
                Err(e) => emit(
                    &mut messages,
                    Message::warning(format!("cannot delete obsolete output: {e:#}")).at(target),
                ),
            }
        }

        for item in plan.candidates() {
            cancel.check()?;

            if self.tracker.is_up_to_date(item) && self.fs.exists(Path::new(item.output_path())) {
                applied.skipped.push(item.output_path().to_string());
                continue;
            }

            match self.process_item(item) {
                Ok(()) => {
                    self.tracker.record(item);
                    applied.processed.push(item.clone());
                }
                Err(e) => emit(
                    &mut messages,
                    Message::error(format!("cannot process resource file: {e:#}"))
                        .for_unit(item.unit())
                        .at(item.source_path()),
                ),
            }
        }

        Ok((applied, messages))
    }

    fn process_item(&self, item: &CandidateItem) -> anyhow::Result<()> {
        let output = Path::new(item.output_path());
        if let Some(parent) = output.parent() {
            self.fs.create_dir_all(parent)?;
        }

        if item.is_filtered() {
            let charset_name = self.charsets.charset_for(item.source_path());
            let charset = Charset::from_str(&charset_name).map_err(|e| anyhow!(e))?;
            let bytes = self.fs.read(item.source_path())?;
            let text = charset.decode(&bytes);
            let text = self.filter.filter(item.unit(), &text, item.properties());
            self.fs
                .write(output, &charset.encode(&text))
                .with_context(|| format!("writing filtered output {:?}", output))?;
        } else {
            self.fs.copy(item.source_path(), output)?;
        }

        Ok(())
    }

    /// Persist phase: record current outputs, prune unknown units, save.
    ///
    /// Units outside the run scope and misconfigured units keep their entry.
    fn persist(&mut self, plan: &Plan, project: &Project, messages: &mut Vec<Message>) -> Result<()> {
        for unit_plan in &plan.units {
            let Some(current) = &unit_plan.current else {
                continue;
            };
            let previous = self.cache.snapshot(&unit_plan.unit, current.clone());
            debug!(
                unit = %unit_plan.unit,
                previous = previous.as_ref().map(PathSet::len),
                current = current.len(),
                "recorded unit outputs"
            );
        }
        for unit in self.cache.prune_unknown_units(project.unit_names()) {
            emit(messages, Message::info(format!("forgot outputs of removed unit '{unit}'")));
        }
        self.cache.save()
    }
}

fn cancelled() -> RunReport {
    info!("resource processing cancelled; output cache left untouched");
    RunReport::new(RunOutcome::Cancelled)
}
