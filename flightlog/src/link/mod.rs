//! Boundary to the command/telemetry link.
//!
//! The engine never touches the transport directly. It sends commands
//! through a [`LinkAdapter`] and the host delivers whatever arrives as
//! [`InboundEvent`]s. Framing, addressing and retransmission below the
//! chunk-request level belong to the link layer.

mod recording;

pub use recording::{LinkCommand, RecordingLink};

use crate::catalog::{CatalogEntry, LogId};

/// Outbound side of the link.
pub trait LinkAdapter {
    /// Ask the remote to list logs with ids in `range_start..=range_end`.
    fn send_list_request(&mut self, range_start: LogId, range_end: LogId);

    /// Ask for `length` bytes of a log starting at `offset`.
    ///
    /// A length of [`FULL_RANGE`](crate::transfer::FULL_RANGE) means "to end
    /// of file".
    fn send_data_request(&mut self, log_id: LogId, offset: u32, length: u32);

    /// Tell the remote the current transfer is over.
    ///
    /// Also used on its own to get a remote unstuck from a stalled listing.
    fn send_finalize(&mut self);

    /// Erase every log on the remote.
    fn send_erase(&mut self);
}

/// Something the remote sent that the engine cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// One listing response.
    Entry(CatalogEntry),
    /// A chunk of log data; an empty payload marks end of file.
    Data {
        log_id: LogId,
        offset: u32,
        payload: Vec<u8>,
    },
}

impl InboundEvent {
    /// Build a data event.
    pub fn data(log_id: LogId, offset: u32, payload: impl Into<Vec<u8>>) -> Self {
        InboundEvent::Data {
            log_id,
            offset,
            payload: payload.into(),
        }
    }
}
