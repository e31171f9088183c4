//! The log transfer engine.
//!
//! `LogTransferEngine` owns everything needed to pull logs off a remote: the
//! catalog, the download queue, the single active transfer session and the
//! outbound link. It is driven by two kinds of calls from the host:
//!
//! - inbound deliveries (`handle_inbound`, `on_entry`, `on_data`)
//! - a periodic `on_idle_tick`, which must come more often than the idle
//!   timeout for gap repair to work
//!
//! Nothing blocks and nothing runs in the background. Time is passed in
//! explicitly so the engine behaves the same under test as in the field.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Instant;
//! use flightlog::engine::{EngineConfig, LogTransferEngine};
//! use flightlog::link::RecordingLink;
//!
//! let mut engine = LogTransferEngine::new(RecordingLink::new(), EngineConfig::new("logs"), Instant::now());
//! engine.list();
//! // ... host delivers entries via engine.on_entry(...)
//! engine.download_all(Instant::now())?;
//! ```

mod command;
mod config;
mod error;
mod events;

pub use command::{DownloadTarget, LogCommand, DOWNLOAD_USAGE, USAGE};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use events::EngineEvent;

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogEntry, LogId, RecordOutcome};
use crate::link::{InboundEvent, LinkAdapter};
use crate::queue::DownloadQueue;
use crate::transfer::{DataOutcome, ProgressReport, StatusThrottle, TransferSession, FULL_RANGE};

/// First and last id covered by a list request.
const LIST_RANGE: (LogId, LogId) = (0, 0xFFFF);

/// Downloads logs from a remote over a lossy link, one at a time.
#[derive(Debug)]
pub struct LogTransferEngine<L: LinkAdapter> {
    link: L,
    config: EngineConfig,
    catalog: Catalog,
    queue: DownloadQueue,
    session: Option<TransferSession>,
    throttle: StatusThrottle,
    events: Vec<EngineEvent>,
}

impl<L: LinkAdapter> LogTransferEngine<L> {
    /// Create an idle engine.
    pub fn new(link: L, config: EngineConfig, now: Instant) -> Self {
        let throttle = StatusThrottle::new(config.status_interval, now);
        Self {
            link,
            config,
            catalog: Catalog::new(),
            queue: DownloadQueue::new(),
            session: None,
            throttle,
            events: Vec::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The outbound link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// The outbound link, mutably (hosts pull inbound traffic through it).
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Known remote logs.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Pending downloads.
    pub fn queue(&self) -> &DownloadQueue {
        &self.queue
    }

    /// The active transfer, if any.
    pub fn session(&self) -> Option<&TransferSession> {
        self.session.as_ref()
    }

    /// Check whether a download is in progress.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Check whether there is neither an active download nor queued work.
    pub fn is_idle(&self) -> bool {
        self.session.is_none() && self.queue.is_empty()
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Default destination for a log: `log<id>.bin` in the output directory.
    pub fn default_filename(&self, log_id: LogId) -> PathBuf {
        self.config.output_dir.join(format!("log{}.bin", log_id))
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Run a parsed `log` command.
    pub fn execute(&mut self, command: LogCommand, now: Instant) -> EngineResult<()> {
        match command {
            LogCommand::List => self.list(),
            LogCommand::Status => {
                let event = match self.status(now) {
                    Some(report) => EngineEvent::Progress(report),
                    None => EngineEvent::NoDownload,
                };
                self.events.push(event);
            }
            LogCommand::Erase => self.erase(),
            LogCommand::Resume => self.resume(),
            LogCommand::Cancel => {
                self.cancel();
            }
            LogCommand::Download(target) => self.download_target(target, now)?,
        }
        Ok(())
    }

    /// Ask the remote for its log list.
    pub fn list(&mut self) {
        info!("Requesting log list");
        self.link.send_list_request(LIST_RANGE.0, LIST_RANGE.1);
        self.events.push(EngineEvent::ListRequested);
    }

    /// Ask the remote to erase every log and forget the listed entries.
    pub fn erase(&mut self) {
        info!("Requesting log erase");
        self.link.send_erase();
        self.catalog.reset();
    }

    /// Send a standalone finalize to unstick the remote.
    pub fn resume(&mut self) {
        info!("Sending transfer end to remote");
        self.link.send_finalize();
    }

    /// Abandon the active download and drop all queued work.
    ///
    /// The remote is not told; the partial file stays on disk. Returns
    /// whether a download was active.
    pub fn cancel(&mut self) -> bool {
        self.queue.clear();
        match self.session.take() {
            Some(session) => {
                let (log_id, path) = session.cancel();
                info!(log_id, path = %path.display(), "Download cancelled");
                self.events.push(EngineEvent::Cancelled { log_id, path });
                true
            }
            None => false,
        }
    }

    /// Progress of the active download, or `None` when idle.
    pub fn status(&self, now: Instant) -> Option<ProgressReport> {
        self.session
            .as_ref()
            .map(|s| s.progress(self.catalog.size_of(s.log_id()), now))
    }

    /// Run a download command.
    pub fn download_target(&mut self, target: DownloadTarget, now: Instant) -> EngineResult<()> {
        match target {
            DownloadTarget::Id { id, filename } => self.download(id, filename, now),
            DownloadTarget::All => self.download_all(now),
            DownloadTarget::Latest { filename } => self.download_latest(filename, now),
            DownloadTarget::From { start_index } => self.download_from(start_index, now),
            DownloadTarget::Range { first, last } => self.download_range(first, last, now),
        }
    }

    /// Download one log, replacing any active download.
    ///
    /// Without a filename the log goes to [`default_filename`](Self::default_filename).
    pub fn download(
        &mut self,
        log_id: LogId,
        filename: Option<PathBuf>,
        now: Instant,
    ) -> EngineResult<()> {
        if let Some(old) = self.session.take() {
            let (old_id, old_path) = old.cancel();
            warn!(
                log_id = old_id,
                path = %old_path.display(),
                "Replacing active download"
            );
            self.events.push(EngineEvent::Cancelled {
                log_id: old_id,
                path: old_path,
            });
        }
        let path = filename.unwrap_or_else(|| self.default_filename(log_id));
        self.start_transfer(log_id, path, now)
    }

    /// Download every listed log, newest first.
    pub fn download_all(&mut self, now: Instant) -> EngineResult<()> {
        self.queue.enqueue_all(&self.catalog)?;
        self.download_next(now)
    }

    /// Download the newest listed log.
    pub fn download_latest(&mut self, filename: Option<PathBuf>, now: Instant) -> EngineResult<()> {
        let log_id = self.catalog.latest_id().ok_or(EngineError::EmptyCatalog)?;
        self.download(log_id, filename, now)
    }

    /// Download the listed logs after skipping the `start_index` oldest.
    pub fn download_from(&mut self, start_index: usize, now: Instant) -> EngineResult<()> {
        self.queue.enqueue_from(&self.catalog, start_index)?;
        self.download_next(now)
    }

    /// Download ids `first..=last` in ascending order.
    pub fn download_range(&mut self, first: LogId, last: LogId, now: Instant) -> EngineResult<()> {
        self.queue.enqueue_range(first, last);
        debug!(pending = ?self.queue.pending(), "Queued log range");
        self.download_next(now)
    }

    /// Start a transfer into `path`.
    ///
    /// Fails with [`EngineError::SessionAlreadyActive`] if a download is
    /// active; [`download`](Self::download) cancels it first instead.
    pub fn start_transfer(
        &mut self,
        log_id: LogId,
        path: impl Into<PathBuf>,
        now: Instant,
    ) -> EngineResult<()> {
        if let Some(active) = &self.session {
            return Err(EngineError::SessionAlreadyActive {
                log_id: active.log_id(),
            });
        }

        let session = TransferSession::start(log_id, path, now)?;
        info!(log_id, path = %session.path().display(), "Downloading log");
        self.link.send_data_request(log_id, 0, FULL_RANGE);
        self.events.push(EngineEvent::DownloadStarted {
            log_id,
            path: session.path().to_path_buf(),
        });
        self.session = Some(session);
        Ok(())
    }

    /// Start the next queued download, skipping logs already on disk.
    fn download_next(&mut self, now: Instant) -> EngineResult<()> {
        while let Some(log_id) = self.queue.advance() {
            let path = self.default_filename(log_id);
            if self.already_downloaded(log_id, &path) {
                info!(log_id, path = %path.display(), "Skipping existing log");
                self.events
                    .push(EngineEvent::SkippedExisting { log_id, path });
                continue;
            }
            return self.download(log_id, Some(path), now);
        }
        Ok(())
    }

    /// A log is complete on disk when its file has the catalog's size.
    fn already_downloaded(&self, log_id: LogId, path: &Path) -> bool {
        let Some(expected) = self.catalog.size_of(log_id) else {
            return false;
        };
        std::fs::metadata(path)
            .map(|m| m.is_file() && m.len() == expected)
            .unwrap_or(false)
    }

    // =========================================================================
    // Inbound traffic
    // =========================================================================

    /// Deliver one inbound event.
    pub fn handle_inbound(&mut self, event: InboundEvent, now: Instant) -> EngineResult<()> {
        match event {
            InboundEvent::Entry(entry) => {
                self.on_entry(entry);
                Ok(())
            }
            InboundEvent::Data {
                log_id,
                offset,
                payload,
            } => self.on_data(log_id, offset, &payload, now),
        }
    }

    /// Record a listing response.
    pub fn on_entry(&mut self, entry: CatalogEntry) {
        match self.catalog.record(entry) {
            RecordOutcome::Recorded => {
                debug!(log_id = entry.id, size = entry.size_bytes, "Log entry received");
                self.events.push(EngineEvent::EntryListed(entry));
            }
            RecordOutcome::NoLogs => {
                info!("Remote reports no logs");
                self.events.push(EngineEvent::NoLogs);
            }
        }
    }

    /// Ingest a data packet for the active download.
    ///
    /// Packets with no active download, or for another log, are ignored.
    pub fn on_data(
        &mut self,
        log_id: LogId,
        offset: u32,
        payload: &[u8],
        now: Instant,
    ) -> EngineResult<()> {
        let Some(session) = self.session.as_mut() else {
            debug!(log_id, offset, "Ignoring log data with no active download");
            return Ok(());
        };
        if session.log_id() != log_id {
            debug!(
                log_id,
                active = session.log_id(),
                offset,
                "Ignoring data for another log"
            );
            return Ok(());
        }

        if session.on_data(offset, payload, now)? == DataOutcome::Complete {
            self.complete(now)?;
        }
        self.update_status(now);
        Ok(())
    }

    /// Periodic tick: repair gaps after silence and report progress.
    pub fn on_idle_tick(&mut self, now: Instant) {
        if let Some(session) = self.session.as_mut() {
            let log_id = session.log_id();
            let requests = session.on_idle_tick(
                now,
                self.config.idle_timeout,
                self.config.max_repair_requests,
            );
            for range in requests {
                debug!(log_id, offset = range.offset, length = range.length, "Re-requesting");
                self.link
                    .send_data_request(log_id, range.offset, range.length);
            }
        }
        self.update_status(now);
    }

    /// Close out the finished download and move on to the next queued log.
    fn complete(&mut self, now: Instant) -> EngineResult<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        let summary = session.finish(now)?;
        info!(
            log_id = summary.log_id,
            size = summary.size,
            retries = summary.retry_count,
            "{}",
            summary
        );
        self.link.send_finalize();
        self.events.push(EngineEvent::Completed(summary));

        if !self.queue.is_empty() {
            self.download_next(now)?;
        }
        Ok(())
    }

    fn update_status(&mut self, now: Instant) {
        if self.session.is_none() || !self.throttle.should_emit(now) {
            return;
        }
        if let Some(report) = self.status(now) {
            self.events.push(EngineEvent::Progress(report));
        }
    }
}
