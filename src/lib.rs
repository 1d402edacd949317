//! queuebot - speaker queue and moderation bot for a single community server.
//!
//! Members join a FIFO speaker queue; a timer hands the speaking role and
//! voice to the next member in line. Moderators get a small set of
//! administrative commands.

pub mod bot;
pub mod config;
pub mod error;
pub mod gate;
pub mod platform;
pub mod queue;
pub mod router;
pub mod session;
pub mod telemetry;
pub mod timer;
