//! Flightlog - bulk log retrieval from a remote vehicle over a lossy link.
//!
//! The remote keeps numbered binary logs. Flightlog lists them, downloads
//! them one at a time in fixed-size chunks, detects gaps left by dropped or
//! reordered packets and re-requests exactly the missing byte ranges until
//! each file is complete on disk.
//!
//! # Modules
//!
//! - [`catalog`]: what the remote reported it has
//! - [`queue`]: which logs are still to be downloaded
//! - [`transfer`]: one in-flight download and its gap repair
//! - [`engine`]: the state machine tying them together
//! - [`link`]: the boundary to the transport
//! - [`sim`]: an in-process remote for testing and demos
//! - [`config`] and [`logging`]: host-side setup

pub mod catalog;
pub mod config;
pub mod engine;
pub mod link;
pub mod logging;
pub mod queue;
pub mod sim;
pub mod transfer;
