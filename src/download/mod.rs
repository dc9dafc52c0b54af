//! Download module for post files.
//!
//! This module provides:
//! - File enumeration and naming
//! - Single-file transfers with size probes and verification
//! - The per-post orchestrator and its worker pool
//! - Post-link and failed-link retry modes
//! - Per-post results and run totals

pub mod files;
pub mod links;
pub mod orchestrator;
pub mod state;
pub mod transfer;

pub use files::{plan_files, PlannedFile};
pub use links::LinkReport;
pub use orchestrator::Downloader;
pub use state::{DownloadResult, FailedFile, LedgerAction, PostStage, RunTotals};
pub use transfer::{verify_length, Transfer};
