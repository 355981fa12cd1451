//! Module focusing on the way epochs are generated, written and reported, on one or several threads

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, SyncSender, sync_channel},
    },
    thread::{Scope, ScopedJoinHandle},
};

use tracing::{debug, info, warn};

use crate::{
    config::FixtureConfig,
    domain::Role,
    engine::generate_epoch,
    error::{Error, io_error},
    input::EpochSelection,
    output::EpochDocuments,
};

/// Validators generated for one epoch, per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochSummary {
    pub epoch: u64,
    /// Validator count per role, in [`Role::ALL`] order
    pub counts: [usize; 5],
}

impl EpochSummary {
    pub fn of(documents: &EpochDocuments) -> Self {
        Self {
            epoch: documents.epoch(),
            counts: documents.scenario.role_counts(),
        }
    }

    pub fn validators(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// `epoch 7: 4 validators (2 SAM-only, 1 passive, 1 institutional)`; absent roles are left out.
impl fmt::Display for EpochSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Role::ALL
            .iter()
            .zip(self.counts)
            .filter(|(_, count)| *count > 0)
            .map(|(role, count)| format!("{count} {}", role.label()))
            .collect();
        write!(
            f,
            "epoch {}: {} validators ({})",
            self.epoch,
            self.validators(),
            parts.join(", ")
        )
    }
}

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunReport {
    pub epochs: u64,
    pub validators: u64,
}

impl RunReport {
    fn record(&mut self, summary: &EpochSummary) {
        self.epochs += 1;
        self.validators += summary.validators() as u64;
    }

    pub fn average_validators(&self) -> f64 {
        if self.epochs == 0 {
            return 0.0;
        }
        self.validators as f64 / self.epochs as f64
    }
}

/// `Total validators across all epochs: T (avg X.X/epoch)`
impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total validators across all epochs: {} (avg {:.1}/epoch)",
            self.validators,
            self.average_validators()
        )
    }
}

/// Directory receiving the documents of `epoch`: `<root>/<epoch>/inputs`.
pub fn epoch_inputs_dir(root: &Path, epoch: u64) -> PathBuf {
    root.join(epoch.to_string()).join("inputs")
}

///
/// Writes every document of the epoch below `root`, creating directories as needed and
/// overwriting existing files. Returns the epoch's `inputs` directory.
///
pub fn write_epoch(documents: &EpochDocuments, root: &Path) -> Result<PathBuf, Error> {
    let inputs_dir = epoch_inputs_dir(root, documents.epoch());
    for document in documents.render()? {
        let path = inputs_dir.join(&document.relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        fs::write(&path, &document.contents).map_err(|e| io_error(&path, e))?;
        debug!(path = %path.display(), bytes = document.contents.len(), "wrote document");
    }
    Ok(inputs_dir)
}

fn generate_and_write(
    epoch: u64,
    root: &Path,
    config: &FixtureConfig,
) -> Result<EpochSummary, Error> {
    let documents = generate_epoch(epoch, config)?;
    let inputs_dir = write_epoch(&documents, root)?;
    info!(epoch, dir = %inputs_dir.display(), "epoch written");
    Ok(EpochSummary::of(&documents))
}

///
/// Generates and writes every epoch of the selection in order, on the calling thread.
/// `on_summary` is called after each epoch; the first error aborts the run.
///
pub fn run(
    selection: EpochSelection,
    root: &Path,
    config: &FixtureConfig,
    mut on_summary: impl FnMut(&EpochSummary),
) -> Result<RunReport, Error> {
    let mut report = RunReport::default();
    for epoch in selection.epochs() {
        let summary = generate_and_write(epoch, root, config)?;
        on_summary(&summary);
        report.record(&summary);
    }
    Ok(report)
}

type WorkerOutcome = Result<Vec<EpochSummary>, (u64, Error)>;

///
/// Same as [`run`], but the epochs are sharded between `num_workers` threads based on
/// `epoch % num_workers`. Each epoch is seeded from its own number and writes only its own files,
/// so the output is identical to a sequential run.
///
/// Summaries are reported in epoch order once all workers are done. When an epoch fails, no new
/// epochs are started, the summaries of the epochs before the earliest failure are reported and
/// that failure is returned.
///
pub fn run_parallel(
    selection: EpochSelection,
    root: &Path,
    config: &FixtureConfig,
    num_workers: usize,
    mut on_summary: impl FnMut(&EpochSummary),
) -> Result<RunReport, Error> {
    let num_workers = num_workers.max(1);
    let stop = AtomicBool::new(false);

    let outcomes = std::thread::scope(|s| {
        let (worker_senders, worker_handles) =
            spawn_worker_threads(s, root, config, &stop, num_workers);

        // --- Main thread: dispatch ---
        for epoch in selection.epochs() {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            // Sharding epochs based on their number
            let worker_idx = (epoch % num_workers as u64) as usize;

            // Send fails only if the worker is gone (it failed or panicked);
            // the join() below will surface that.
            let _ = worker_senders[worker_idx].send(epoch);
        }

        // Signal EOF: drop all senders -> workers drain and exit
        drop(worker_senders);

        worker_handles
            .into_iter()
            .map(|handle| handle.join().map_err(|_| Error::WorkerPanicked))
            .collect::<Result<Vec<WorkerOutcome>, Error>>()
    })?;

    let mut summaries = Vec::new();
    let mut failure: Option<(u64, Error)> = None;
    for outcome in outcomes {
        match outcome {
            Ok(partition) => summaries.extend(partition),
            Err((epoch, error)) => {
                if failure.as_ref().is_none_or(|(first, _)| epoch < *first) {
                    failure = Some((epoch, error));
                }
            }
        }
    }
    summaries.sort_by_key(|summary| summary.epoch);

    let mut report = RunReport::default();
    let failed_epoch = failure.as_ref().map(|(epoch, _)| *epoch);
    for summary in summaries
        .iter()
        .take_while(|summary| failed_epoch.is_none_or(|failed| summary.epoch < failed))
    {
        on_summary(summary);
        report.record(summary);
    }

    match failure {
        Some((epoch, error)) => {
            warn!(epoch, %error, "epoch failed, run aborted");
            Err(error)
        }
        None => Ok(report),
    }
}

fn spawn_worker_threads<'s, 'e>(
    s: &'s Scope<'s, 'e>,
    root: &'e Path,
    config: &'e FixtureConfig,
    stop: &'e AtomicBool,
    num_workers: usize,
) -> (Vec<SyncSender<u64>>, Vec<ScopedJoinHandle<'s, WorkerOutcome>>) {
    let mut worker_senders = Vec::with_capacity(num_workers);
    let mut worker_handles = Vec::with_capacity(num_workers);

    for worker in 0..num_workers {
        let (epoch_in, epoch_out) = sync_channel::<u64>(1);
        let handle = s.spawn(move || work(worker, epoch_out, root, config, stop));

        worker_senders.push(epoch_in);
        worker_handles.push(handle);
    }

    (worker_senders, worker_handles)
}

fn work(
    worker: usize,
    epochs: Receiver<u64>,
    root: &Path,
    config: &FixtureConfig,
    stop: &AtomicBool,
) -> WorkerOutcome {
    let mut summaries = Vec::new();
    for epoch in epochs {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        match generate_and_write(epoch, root, config) {
            Ok(summary) => summaries.push(summary),
            Err(error) => {
                debug!(worker, epoch, "worker stopping after failure");
                stop.store(true, Ordering::Relaxed);
                return Err((epoch, error));
            }
        }
    }
    Ok(summaries)
}
