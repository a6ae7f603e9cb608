//! Session handling: line reader, inactivity timer, per-peer log, and the
//! loop that ties them together.

pub mod handler;
pub mod log;
pub mod reader;
pub mod timer;

pub use handler::{Session, SessionState};
pub use log::SessionLog;
pub use reader::LineReader;
pub use timer::INACTIVITY_PERIOD;
