//! In-process simulated remote.
//!
//! `SimulatedVehicle` stands in for a vehicle at the far end of the link. It
//! implements [`LinkAdapter`], answers each command by queueing the
//! [`InboundEvent`]s a real remote would send back, and lets the host pump
//! them into the engine at its own pace.
//!
//! Data is served the way an autopilot does it: [`CHUNK_SIZE`] byte chunks
//! addressed by offset, a short final chunk, and an empty packet at end of
//! file when the requested range ends on a chunk boundary. Chunks can be
//! dropped at random and shuffled to exercise gap repair.
//!
//! # Example
//!
//! ```ignore
//! let mut vehicle = SimulatedVehicle::with_seed(7).with_drop_rate(0.05);
//! vehicle.add_log(1, std::fs::read("flight.bin")?, 1_700_000_000);
//! let mut engine = LogTransferEngine::new(vehicle, config, Instant::now());
//! engine.list();
//! while let Some(event) = engine.link_mut().next_event() {
//!     engine.handle_inbound(event, Instant::now())?;
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, trace};

use crate::catalog::{CatalogEntry, LogId};
use crate::config::SimulatorSettings;
use crate::link::{InboundEvent, LinkAdapter, LinkCommand, RecordingLink};
use crate::transfer::{CHUNK_SIZE, FULL_RANGE};

/// Chunks are shuffled within windows of this many when reordering.
const REORDER_WINDOW: usize = 4;

/// Errors while preparing the simulated remote.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// The remote directory could not be read.
    #[error("failed to read remote log {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    /// More files than log ids.
    #[error("too many logs in {}", path.display())]
    TooManyLogs { path: PathBuf },
}

/// One log stored on the simulated remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredLog {
    pub data: Vec<u8>,
    pub time_utc: u32,
}

impl StoredLog {
    fn size(&self) -> u32 {
        u32::try_from(self.data.len()).unwrap_or(u32::MAX)
    }
}

/// A remote that serves logs from memory.
#[derive(Debug)]
pub struct SimulatedVehicle {
    logs: BTreeMap<LogId, StoredLog>,
    inbound: VecDeque<InboundEvent>,
    commands: RecordingLink,
    drop_rate: f64,
    reorder: bool,
    forced_drops: BTreeSet<(LogId, u32)>,
    rng: StdRng,
}

impl Default for SimulatedVehicle {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl SimulatedVehicle {
    /// A lossless remote with no logs.
    pub fn new() -> Self {
        Self::default()
    }

    /// A remote whose drop and reorder decisions follow `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            logs: BTreeMap::new(),
            inbound: VecDeque::new(),
            commands: RecordingLink::new(),
            drop_rate: 0.0,
            reorder: false,
            forced_drops: BTreeSet::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Build a remote from `[simulator]` settings, loading `remote_dir` if set.
    pub fn from_settings(settings: &SimulatorSettings) -> Result<Self, SimulatorError> {
        let mut vehicle = Self::with_seed(settings.seed)
            .with_drop_rate(settings.drop_rate)
            .with_reorder(settings.reorder);
        if let Some(dir) = &settings.remote_dir {
            vehicle.load_directory(dir)?;
        }
        Ok(vehicle)
    }

    /// Set the probability of dropping each data chunk (clamped to 0..=1).
    pub fn with_drop_rate(mut self, rate: f64) -> Self {
        self.drop_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    /// Shuffle chunks within small windows of each response.
    pub fn with_reorder(mut self, reorder: bool) -> Self {
        self.reorder = reorder;
        self
    }

    // =========================================================================
    // Stored logs
    // =========================================================================

    /// Store a log, replacing any with the same id.
    pub fn add_log(&mut self, id: LogId, data: impl Into<Vec<u8>>, time_utc: u32) {
        self.logs.insert(
            id,
            StoredLog {
                data: data.into(),
                time_utc,
            },
        );
    }

    /// Serve every regular file in `dir`.
    ///
    /// Files are numbered from 1 in file name order and dated by their
    /// modification time. Returns the number of logs loaded.
    pub fn load_directory(&mut self, dir: &Path) -> Result<usize, SimulatorError> {
        let read_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| SimulatorError::Read { path, source }
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_err(dir))? {
            let path = entry.map_err(read_err(dir))?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        if files.len() >= usize::from(LogId::MAX) {
            return Err(SimulatorError::TooManyLogs {
                path: dir.to_path_buf(),
            });
        }

        for (index, path) in files.iter().enumerate() {
            let data = std::fs::read(path).map_err(read_err(path))?;
            let time_utc = std::fs::metadata(path)
                .and_then(|m| m.modified())
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX))
                .unwrap_or(0);
            let id = LogId::try_from(index + 1).unwrap_or(LogId::MAX);
            debug!(log_id = id, path = %path.display(), size = data.len(), "Serving log");
            self.add_log(id, data, time_utc);
        }
        Ok(files.len())
    }

    /// Stored logs by id.
    pub fn logs(&self) -> &BTreeMap<LogId, StoredLog> {
        &self.logs
    }

    /// Drop the chunk of `log_id` at `offset` the next time it would be sent.
    pub fn drop_once(&mut self, log_id: LogId, offset: u32) {
        self.forced_drops.insert((log_id, offset));
    }

    // =========================================================================
    // Inbound side
    // =========================================================================

    /// Next event for the host to deliver to the engine.
    pub fn next_event(&mut self) -> Option<InboundEvent> {
        self.inbound.pop_front()
    }

    /// Check whether events are waiting to be delivered.
    pub fn has_pending(&self) -> bool {
        !self.inbound.is_empty()
    }

    /// Every command received so far, oldest first.
    pub fn commands(&self) -> &[LinkCommand] {
        self.commands.sent()
    }

    fn should_drop(&mut self, log_id: LogId, offset: u32) -> bool {
        if self.forced_drops.remove(&(log_id, offset)) {
            return true;
        }
        self.drop_rate > 0.0 && self.rng.random_bool(self.drop_rate)
    }

    /// Chunks for `offset..offset+length` of a stored log.
    fn serve_range(&mut self, log_id: LogId, offset: u32, length: u32) -> Vec<InboundEvent> {
        let Some(log) = self.logs.get(&log_id) else {
            debug!(log_id, "Data request for unknown log");
            return Vec::new();
        };

        let size = log.size();
        let start = offset.min(size);
        let end = if length == FULL_RANGE {
            size
        } else {
            offset.saturating_add(length).min(size)
        };

        let mut packets = Vec::new();
        let mut chunk_start = start;
        while chunk_start < end {
            let chunk_end = chunk_start.saturating_add(CHUNK_SIZE).min(end);
            let payload = log.data[chunk_start as usize..chunk_end as usize].to_vec();
            packets.push(InboundEvent::data(log_id, chunk_start, payload));
            chunk_start = chunk_end;
        }

        if end == size && (end - start) % CHUNK_SIZE == 0 {
            packets.push(InboundEvent::data(log_id, size, Vec::new()));
        }
        packets
    }
}

impl LinkAdapter for SimulatedVehicle {
    fn send_list_request(&mut self, range_start: LogId, range_end: LogId) {
        self.commands.send_list_request(range_start, range_end);

        let total_count = LogId::try_from(self.logs.len()).unwrap_or(LogId::MAX);
        if total_count == 0 {
            self.inbound.push_back(InboundEvent::Entry(CatalogEntry {
                id: 0,
                total_count: 0,
                last_id: 0,
                size_bytes: 0,
                time_utc: 0,
            }));
            return;
        }

        if range_start > range_end {
            return;
        }
        let last_id = self.logs.keys().next_back().copied().unwrap_or(0);
        for (&id, log) in self.logs.range(range_start..=range_end) {
            self.inbound.push_back(InboundEvent::Entry(CatalogEntry {
                id,
                total_count,
                last_id,
                size_bytes: log.size(),
                time_utc: log.time_utc,
            }));
        }
    }

    fn send_data_request(&mut self, log_id: LogId, offset: u32, length: u32) {
        self.commands.send_data_request(log_id, offset, length);

        let mut packets = self.serve_range(log_id, offset, length);
        if self.reorder {
            for window in packets.chunks_mut(REORDER_WINDOW) {
                window.shuffle(&mut self.rng);
            }
        }

        for packet in packets {
            if let InboundEvent::Data { log_id, offset, .. } = &packet {
                if self.should_drop(*log_id, *offset) {
                    trace!(log_id, offset, "Dropping chunk");
                    continue;
                }
            }
            self.inbound.push_back(packet);
        }
    }

    fn send_finalize(&mut self) {
        self.commands.send_finalize();
    }

    fn send_erase(&mut self) {
        self.commands.send_erase();
        debug!(count = self.logs.len(), "Erasing all logs");
        self.logs.clear();
    }
}
