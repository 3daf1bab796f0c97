// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # federator-bin
//!
//! Host process for the federator field-bus reader.
//!
//! - CLI argument parsing with clap
//! - Per-device polling runtime
//! - Graceful shutdown handling
//! - Logging initialization
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   main.rs                    │
//! └──────────────────────┬───────────────────────┘
//!                        │
//!                 ┌──────▼──────┐
//!                 │   cli.rs    │
//!                 └──────┬──────┘
//!             ┌──────────┼──────────┐
//!             ▼          ▼          ▼
//!       ┌──────────┐ ┌─────────┐ ┌─────────┐
//!       │ commands │ │ runtime │ │ logging │
//!       └──────────┘ └────┬────┘ └─────────┘
//!                         │
//!          ┌──────────────┼──────────────┐
//!          ▼              ▼              ▼
//!    ┌──────────┐  ┌────────────┐  ┌──────────┐
//!    │ shutdown │  │ device task│  │ device.. │
//!    └──────────┘  │ (1/device) │  └──────────┘
//!                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start polling (default command)
//! federator
//!
//! # Start with a custom config
//! federator -c /etc/federator/plant.yaml
//!
//! # Validate configuration
//! federator validate
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{build_registry, HostRuntime};
pub use shutdown::ShutdownCoordinator;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
