//! Read-only access to FactHound escrow contracts.
//!
//! This module provides:
//! - The [`ChainClient`] trait the reconciliation engine reads chain state through
//! - An alloy-backed HTTP implementation ([`RpcChainClient`])
//! - ABI artifact loading and verification
//! - A scripted in-memory client for tests ([`MockChainClient`])
//!
//! No call made through this module mutates chain or local state, and nothing here
//! retries: a failed call surfaces immediately to the caller.

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use thiserror::Error;

pub mod abi;
pub mod mock;
pub mod rpc;

pub use abi::ContractAbi;
pub use mock::MockChainClient;
pub use rpc::RpcChainClient;

/// A contract that has been checked to exist at its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractHandle {
    /// Deployed contract address
    pub address: Address,
}

/// The question struct returned by `getQuestion(bytes32)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnchainQuestion {
    /// Address that funded the question
    pub asker: Address,

    /// Escrowed bounty in wei
    pub bounty: U256,

    /// Raw status code (see `facthound_core::status`)
    pub status: u8,

    /// Hash of the selected answer, zero when none is selected
    pub selected_answer: B256,
}

/// Errors from chain access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Contract could not be reached or is not deployed at the address.
    #[error("Failed to load contract at {address}: {reason}")]
    ContractLoad {
        /// Contract address
        address: Address,
        /// Underlying cause
        reason: String,
    },

    /// A view call failed at the RPC or ABI level.
    #[error("Contract call {method} failed: {reason}")]
    ContractCall {
        /// Contract function name
        method: &'static str,
        /// Underlying cause
        reason: String,
    },

    /// A view call did not return within the configured timeout.
    #[error("Contract call {method} timed out after {secs}s")]
    Timeout {
        /// Contract function name
        method: &'static str,
        /// Configured timeout in seconds
        secs: u64,
    },
}

/// Read-only view of FactHound contract state.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Resolve a contract instance, failing if nothing is deployed at `address`.
    async fn load_contract(&self, address: Address) -> Result<ContractHandle, ChainError>;

    /// `owner()`
    async fn owner(&self, contract: &ContractHandle) -> Result<Address, ChainError>;

    /// `getQuestion(questionHash)`
    async fn get_question(
        &self,
        contract: &ContractHandle,
        question_hash: B256,
    ) -> Result<OnchainQuestion, ChainError>;

    /// `getAnswererAddress(questionHash, answerHash)`; the zero address means unknown.
    async fn get_answerer_address(
        &self,
        contract: &ContractHandle,
        question_hash: B256,
        answer_hash: B256,
    ) -> Result<Address, ChainError>;
}
