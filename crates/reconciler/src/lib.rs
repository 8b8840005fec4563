//! Reconciliation of FactHound forum records with their on-chain escrow contracts.
//!
//! This crate provides:
//! - A read-only chain client for FactHound contracts (alloy)
//! - A SQLite record store for users, posts, questions and answers (sqlx)
//! - The reconciliation engine: confirm question, answer and selection
//! - The off-chain answer selection gate
//! - Decoding of confirmation requests from the web layer
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  web layer (not in this crate)       │
//! │  POST /confirm      POST /selection  │
//! └────────┬──────────────────┬──────────┘
//!          │ ConfirmRequest   │ (question, answer, caller)
//!     ┌────▼────────┐    ┌────▼────────┐
//!     │  request    │    │  selection  │
//!     │  (hex → B256)    │  (gate)     │
//!     └────┬────────┘    └────┬────────┘
//!          │                  │
//!     ┌────▼──────────────┐   │
//!     │ ReconciliationEngine  │
//!     └──┬─────────────┬──┘   │
//!        │             │      │
//!  ┌─────▼──────┐ ┌────▼──────▼──┐
//!  │ ChainClient│ │ RecordStore  │
//!  │ (RPC)      │ │ (SQLite)     │
//!  └────────────┘ └──────────────┘
//! ```
//!
//! Every operation returns an [`outcome::Outcome`]: `{"message": "Success", "thread": id}`
//! on success or `{"message": reason}` on failure.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod config;
pub mod engine;
pub mod outcome;
pub mod request;
pub mod selection;
pub mod storage;

pub use engine::ReconciliationEngine;
pub use outcome::{Confirmation, Outcome, ReconcileError};
pub use request::{dispatch, ConfirmRequest};
pub use selection::select_answer;

// Re-export common types
pub use facthound_core::{types::*, *};
