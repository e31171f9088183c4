//! A link that only records what was sent.

use super::LinkAdapter;
use crate::catalog::LogId;

/// A command sent over the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCommand {
    ListRequest { start: LogId, end: LogId },
    DataRequest { log_id: LogId, offset: u32, length: u32 },
    Finalize,
    Erase,
}

/// Link adapter that keeps every sent command for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingLink {
    sent: Vec<LinkCommand>,
}

impl RecordingLink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command sent so far, oldest first.
    pub fn sent(&self) -> &[LinkCommand] {
        &self.sent
    }

    /// Take the recorded commands, leaving the recorder empty.
    pub fn take(&mut self) -> Vec<LinkCommand> {
        std::mem::take(&mut self.sent)
    }

    /// Only the data requests, as `(log_id, offset, length)`.
    pub fn data_requests(&self) -> Vec<(LogId, u32, u32)> {
        self.sent
            .iter()
            .filter_map(|c| match *c {
                LinkCommand::DataRequest {
                    log_id,
                    offset,
                    length,
                } => Some((log_id, offset, length)),
                _ => None,
            })
            .collect()
    }
}

impl LinkAdapter for RecordingLink {
    fn send_list_request(&mut self, range_start: LogId, range_end: LogId) {
        self.sent.push(LinkCommand::ListRequest {
            start: range_start,
            end: range_end,
        });
    }

    fn send_data_request(&mut self, log_id: LogId, offset: u32, length: u32) {
        self.sent.push(LinkCommand::DataRequest {
            log_id,
            offset,
            length,
        });
    }

    fn send_finalize(&mut self) {
        self.sent.push(LinkCommand::Finalize);
    }

    fn send_erase(&mut self) {
        self.sent.push(LinkCommand::Erase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let mut link = RecordingLink::new();
        link.send_list_request(0, 0xFFFF);
        link.send_data_request(2, 0, 0xFFFF_FFFF);
        link.send_finalize();
        link.send_erase();

        assert_eq!(
            link.sent(),
            &[
                LinkCommand::ListRequest {
                    start: 0,
                    end: 0xFFFF
                },
                LinkCommand::DataRequest {
                    log_id: 2,
                    offset: 0,
                    length: 0xFFFF_FFFF
                },
                LinkCommand::Finalize,
                LinkCommand::Erase,
            ]
        );
        assert_eq!(link.data_requests(), vec![(2, 0, 0xFFFF_FFFF)]);
    }

    #[test]
    fn test_take_empties() {
        let mut link = RecordingLink::new();
        link.send_erase();
        assert_eq!(link.take(), vec![LinkCommand::Erase]);
        assert!(link.sent().is_empty());
    }
}
