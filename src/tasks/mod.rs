//! Background Tasks Module
//!
//! Tasks that run for the lifetime of the process, all stopped through the
//! shared [`Shutdown`](crate::shutdown::Shutdown) token.
//!
//! # Tasks
//! - Eviction: sweeps expired keys at the configured interval
//! - Signal listener: triggers shutdown on SIGINT/SIGTERM

mod eviction;
mod signal;

pub use eviction::spawn_eviction_task;
pub use signal::spawn_signal_listener;
