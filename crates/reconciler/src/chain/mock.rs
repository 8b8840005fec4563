//! Scripted chain client for testing without a node.

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{ChainClient, ChainError, ContractHandle, OnchainQuestion};

/// State of one fake deployed contract.
#[derive(Debug, Clone, Default)]
struct MockContract {
    owner: Address,
    questions: HashMap<B256, OnchainQuestion>,
    answerers: HashMap<(B256, B256), Address>,
    failing: Vec<&'static str>,
    stalled: Vec<&'static str>,
}

/// In-memory [`ChainClient`] whose contract state is set up by the test.
///
/// Unknown question hashes read back as an all-zero struct and unknown answers as the
/// zero address, which is what the Solidity mappings return.
#[derive(Debug, Default)]
pub struct MockChainClient {
    contracts: Mutex<HashMap<Address, MockContract>>,
    calls: Mutex<Vec<&'static str>>,
}

impl MockChainClient {
    /// Create a client with no deployed contracts.
    pub fn new() -> Self {
        Self::default()
    }

    fn contracts(&self) -> MutexGuard<'_, HashMap<Address, MockContract>> {
        self.contracts.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, method: &'static str) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(method);
    }

    /// Deploy a contract at `address` owned by `owner`.
    pub fn deploy(&self, address: Address, owner: Address) {
        self.contracts().insert(
            address,
            MockContract {
                owner,
                ..MockContract::default()
            },
        );
    }

    /// Change the owner of a deployed contract.
    pub fn set_owner(&self, address: Address, owner: Address) {
        if let Some(contract) = self.contracts().get_mut(&address) {
            contract.owner = owner;
        }
    }

    /// Set the struct returned by `getQuestion(question_hash)`.
    pub fn set_question(&self, address: Address, question_hash: B256, question: OnchainQuestion) {
        if let Some(contract) = self.contracts().get_mut(&address) {
            contract.questions.insert(question_hash, question);
        }
    }

    /// Point `selectedAnswer` of an existing question at `answer_hash`.
    pub fn select_answer(&self, address: Address, question_hash: B256, answer_hash: B256) {
        if let Some(contract) = self.contracts().get_mut(&address) {
            contract
                .questions
                .entry(question_hash)
                .or_insert_with(empty_question)
                .selected_answer = answer_hash;
        }
    }

    /// Record `answerer` as the author of `answer_hash` under `question_hash`.
    pub fn set_answerer(
        &self,
        address: Address,
        question_hash: B256,
        answer_hash: B256,
        answerer: Address,
    ) {
        if let Some(contract) = self.contracts().get_mut(&address) {
            contract
                .answerers
                .insert((question_hash, answer_hash), answerer);
        }
    }

    /// Make every call to `method` on this contract fail.
    pub fn fail_call(&self, address: Address, method: &'static str) {
        if let Some(contract) = self.contracts().get_mut(&address) {
            contract.failing.push(method);
        }
    }

    /// Make every call to `method` on this contract time out.
    pub fn stall_call(&self, address: Address, method: &'static str) {
        if let Some(contract) = self.contracts().get_mut(&address) {
            contract.stalled.push(method);
        }
    }

    /// Methods called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn with_contract<T>(
        &self,
        contract: &ContractHandle,
        method: &'static str,
        read: impl FnOnce(&MockContract) -> T,
    ) -> Result<T, ChainError> {
        self.record(method);
        let contracts = self.contracts();
        let state = contracts
            .get(&contract.address)
            .ok_or_else(|| ChainError::ContractCall {
                method,
                reason: "contract disappeared".to_string(),
            })?;

        if state.stalled.contains(&method) {
            return Err(ChainError::Timeout { method, secs: 15 });
        }

        if state.failing.contains(&method) {
            return Err(ChainError::ContractCall {
                method,
                reason: "execution reverted".to_string(),
            });
        }

        Ok(read(state))
    }
}

fn empty_question() -> OnchainQuestion {
    OnchainQuestion {
        asker: Address::ZERO,
        bounty: Default::default(),
        status: 0,
        selected_answer: B256::ZERO,
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn load_contract(&self, address: Address) -> Result<ContractHandle, ChainError> {
        self.record("load_contract");
        if self.contracts().contains_key(&address) {
            Ok(ContractHandle { address })
        } else {
            Err(ChainError::ContractLoad {
                address,
                reason: "no contract deployed".to_string(),
            })
        }
    }

    async fn owner(&self, contract: &ContractHandle) -> Result<Address, ChainError> {
        self.with_contract(contract, "owner", |c| c.owner)
    }

    async fn get_question(
        &self,
        contract: &ContractHandle,
        question_hash: B256,
    ) -> Result<OnchainQuestion, ChainError> {
        self.with_contract(contract, "getQuestion", |c| {
            c.questions
                .get(&question_hash)
                .cloned()
                .unwrap_or_else(empty_question)
        })
    }

    async fn get_answerer_address(
        &self,
        contract: &ContractHandle,
        question_hash: B256,
        answer_hash: B256,
    ) -> Result<Address, ChainError> {
        self.with_contract(contract, "getAnswererAddress", |c| {
            c.answerers
                .get(&(question_hash, answer_hash))
                .copied()
                .unwrap_or(Address::ZERO)
        })
    }
}
