//! parley-core: Shared protocol library for the parley line server.
//!
//! Provides the newline codec with its length cap, command classification
//! and response rendering, and the error type shared with the server.

pub mod codec;
pub mod command;
pub mod error;

// Re-export commonly used items at crate root.
pub use codec::{LineDecoder, MAX_MESSAGE_SIZE};
pub use command::{dispatch, Command, Reply, INACTIVITY_NOTICE};
pub use error::{ParleyError, ParleyResult};
