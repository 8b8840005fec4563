//! # FactHound Core
//!
//! Pure building blocks for reconciling FactHound questions and answers with their
//! on-chain escrow contracts.
//!
//! ## Features
//!
//! - **Hashing**: `keccak256(abi.encodePacked(address, string))` question/answer hashes
//! - **Status mapping**: on-chain status codes to off-chain lifecycle states
//! - **Address validation**: `0x`-prefixed, EIP-55 checksummed addresses
//! - **Domain types**: `QuestionStatus`, `AnswerStatus`

#![warn(missing_docs)]

pub mod address;
pub mod constants;
pub mod error;
pub mod hashing;
pub mod status;
pub mod types;

// Re-export commonly used items
pub use address::{is_zero_address, parse_address, parse_checksummed_address};
pub use error::{CoreError, Result};
pub use hashing::{expected_hash, keccak256, parse_hash};
pub use status::{answer_status_from_selection, question_status_from_code};
pub use types::*;

// Re-export Alloy primitives for convenience
pub use alloy_primitives::{Address, B256, U256};
