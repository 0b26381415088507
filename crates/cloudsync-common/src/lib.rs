//! cloudsync common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Ambient concerns shared by every cloudsync workspace member.
//!
//! - **Logging**: structured `tracing` setup for console, rolling files, or both
//!
//! # Example
//!
//! ```no_run
//! use cloudsync_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::info!("cloudsync starting");
//!     Ok(())
//! }
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig};
