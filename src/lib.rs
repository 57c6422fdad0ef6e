pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::{cli::LocalStorage, CliConfig, Settings};
pub use crate::core::apportionment::{allocate, allocate_with, Apportioner, NegativeVotes};
pub use crate::core::record::LoadReport;
pub use crate::core::session_store::SessionStore;
pub use crate::domain::model::{AllocationResult, CellState, Party, Quotient, Session};
pub use crate::utils::error::{DhondtError, RecordIssue, Result};
