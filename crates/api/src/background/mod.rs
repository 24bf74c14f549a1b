//! Background tasks.
//!
//! Each submodule provides an async function intended to be spawned via
//! `tokio::spawn` and detached: failures are observed only via logs,
//! never joined by the response path.

pub mod usage;
