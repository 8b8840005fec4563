//! Reconciliation of local question and answer records against contract state.
//!
//! Each operation is a linear pipeline that exits on the first failure. Chain reads and
//! hash checks all happen before the single persistence write, so a failed operation
//! leaves the record store untouched. The one exception is a selection mismatch in
//! [`ReconciliationEngine::confirm_selection`], which records the pending state instead
//! of the confirmed one.

use alloy::primitives::{Address, B256};
use facthound_core::{
    answer_status_from_selection, expected_hash, is_zero_address, question_status_from_code,
};
use tracing::{debug, error, info, warn};

use crate::chain::{ChainClient, ChainError, ContractHandle};
use crate::config::EngineConfig;
use crate::outcome::{Confirmation, ReconcileError};
use crate::storage::{AnswerConfirmation, QuestionConfirmation, RecordStore};

/// Result of a reconciliation step.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Confirms questions, answers and selections against their escrow contracts.
///
/// The engine borrows its collaborators and holds no state of its own, so one can be
/// built per request around a shared store, chain client and configuration.
pub struct ReconciliationEngine<'a, S: ?Sized, C: ?Sized> {
    store: &'a S,
    chain: &'a C,
    settings: &'a EngineConfig,
}

impl<'a, S, C> ReconciliationEngine<'a, S, C>
where
    S: RecordStore + ?Sized,
    C: ChainClient + ?Sized,
{
    /// Create an engine over the given store, chain client and settings.
    pub fn new(store: &'a S, chain: &'a C, settings: &'a EngineConfig) -> Self {
        Self {
            store,
            chain,
            settings,
        }
    }

    /// Confirm that a question exists on-chain and adopt the contract's view of it.
    ///
    /// The contract must record the question under the wallet its hash was computed
    /// from. On success the question's bounty and status are overwritten from the
    /// contract and `confirmed_onchain` becomes `true`.
    pub async fn confirm_question(&self, question_hash: B256) -> ReconcileResult<Confirmation> {
        info!(
            operation = "confirm_question",
            question_hash = %question_hash,
            "Confirming question"
        );

        let result = self.reconcile_question(question_hash).await;
        log_result("confirm_question", &result);
        result
    }

    /// Confirm that an answer is recorded on-chain under its question.
    ///
    /// The contract must attribute the answer to the wallet its hash was computed from.
    /// On success the answer's selection status is overwritten from the contract and
    /// `confirmed_onchain` becomes `true`.
    pub async fn confirm_answer(
        &self,
        question_hash: B256,
        answer_hash: B256,
    ) -> ReconcileResult<Confirmation> {
        info!(
            operation = "confirm_answer",
            question_hash = %question_hash,
            answer_hash = %answer_hash,
            "Confirming answer"
        );

        let result = self.reconcile_answer(question_hash, answer_hash).await;
        log_result("confirm_answer", &result);
        result
    }

    /// Confirm that the contract selected this answer.
    ///
    /// On a mismatch the answer is demoted to unselected with its selection marked
    /// pending, and the call fails naming the contract address.
    pub async fn confirm_selection(
        &self,
        question_hash: B256,
        answer_hash: B256,
    ) -> ReconcileResult<Confirmation> {
        info!(
            operation = "confirm_selection",
            question_hash = %question_hash,
            answer_hash = %answer_hash,
            "Confirming selection"
        );

        let result = self.reconcile_selection(question_hash, answer_hash).await;
        log_result("confirm_selection", &result);
        result
    }

    async fn reconcile_question(&self, question_hash: B256) -> ReconcileResult<Confirmation> {
        let question = self
            .store
            .question_by_hash(&question_hash)
            .await
            .map_err(storage_failure)?
            .ok_or(ReconcileError::QuestionNotFound)?;

        let contract = self.load_contract(question.contract_address).await?;
        self.check_owner(&contract).await?;

        // A username account cannot have signed the hash
        let signer = question.asker.wallet;
        let expected = signer.map(|wallet| expected_hash(&wallet, &question.post_text));

        let onchain = self
            .chain
            .get_question(&contract, question_hash)
            .await
            .map_err(call_failure)?;

        if expected.is_none() || question.question_hash != expected {
            return Err(ReconcileError::QuestionHashMismatch);
        }

        // A zero asker means the contract holds no question under this hash
        if is_zero_address(&onchain.asker) || signer != Some(onchain.asker) {
            warn!(
                question_id = question.id,
                onchain_asker = %onchain.asker,
                "Contract does not record the hashed asker"
            );
            return Err(ReconcileError::QuestionHashMismatch);
        }

        let asker = self
            .store
            .get_or_create_user_by_wallet(onchain.asker)
            .await
            .map_err(storage_failure)?;

        let status = question_status_from_code(onchain.status);
        self.store
            .save_question_confirmation(
                question.id,
                &QuestionConfirmation {
                    asker_id: asker.id,
                    bounty: onchain.bounty,
                    status,
                },
            )
            .await
            .map_err(storage_failure)?;

        debug!(
            question_id = question.id,
            status = %status,
            "Question reconciled"
        );

        Ok(Confirmation::Confirmed {
            thread: question.thread_id,
        })
    }

    async fn reconcile_answer(
        &self,
        question_hash: B256,
        answer_hash: B256,
    ) -> ReconcileResult<Confirmation> {
        let answer = self
            .store
            .answer_by_hash(&answer_hash)
            .await
            .map_err(storage_failure)?
            .ok_or(ReconcileError::AnswerNotFound)?;

        let question = self
            .store
            .question_by_id(answer.question_id)
            .await
            .map_err(storage_failure)?
            .ok_or(ReconcileError::AnswerNotFound)?;

        let contract = self.load_contract(question.contract_address).await?;
        self.check_owner(&contract).await?;

        let signer = answer.answerer.wallet;
        let expected = signer.map(|wallet| expected_hash(&wallet, &answer.post_text));

        if expected != Some(answer_hash) {
            return Err(ReconcileError::AnswerHashMismatch);
        }

        // The stored question hash is authoritative; the claimed one covers
        // questions whose hash was never recorded locally
        let question_hash = question.question_hash.unwrap_or(question_hash);

        let onchain = self
            .chain
            .get_question(&contract, question_hash)
            .await
            .map_err(call_failure)?;

        let answerer = self
            .chain
            .get_answerer_address(&contract, question_hash, answer_hash)
            .await
            .map_err(call_failure)?;

        if is_zero_address(&answerer) {
            return Err(ReconcileError::InvalidAnswerHash);
        }

        if signer != Some(answerer) {
            warn!(
                answer_id = answer.id,
                onchain_answerer = %answerer,
                "Contract does not record the hashed answerer"
            );
            return Err(ReconcileError::AnswerHashMismatch);
        }

        let answerer = self
            .store
            .get_or_create_user_by_wallet(answerer)
            .await
            .map_err(storage_failure)?;

        let status = answer_status_from_selection(&answer_hash, &onchain.selected_answer);
        self.store
            .save_answer_confirmation(
                answer.id,
                &AnswerConfirmation {
                    answerer_id: answerer.id,
                    status,
                },
            )
            .await
            .map_err(storage_failure)?;

        debug!(
            answer_id = answer.id,
            status = %status,
            "Answer reconciled"
        );

        Ok(Confirmation::Confirmed {
            thread: question.thread_id,
        })
    }

    async fn reconcile_selection(
        &self,
        question_hash: B256,
        answer_hash: B256,
    ) -> ReconcileResult<Confirmation> {
        let answer = self
            .store
            .answer_by_hash(&answer_hash)
            .await
            .map_err(storage_failure)?
            .ok_or(ReconcileError::AnswerNotFound)?;

        let question = self
            .store
            .question_by_id(answer.question_id)
            .await
            .map_err(storage_failure)?
            .ok_or(ReconcileError::AnswerNotFound)?;

        let contract = self.load_contract(question.contract_address).await?;
        if self.settings.enforce_owner_on_selection {
            self.check_owner(&contract).await?;
        } else {
            self.read_owner(&contract).await?;
        }

        let question_hash = question.question_hash.unwrap_or(question_hash);
        let onchain = self
            .chain
            .get_question(&contract, question_hash)
            .await
            .map_err(call_failure)?;

        let matched = answer.answer_hash == Some(onchain.selected_answer);
        self.store
            .save_selection_check(answer.id, matched)
            .await
            .map_err(storage_failure)?;

        if !matched {
            return Err(ReconcileError::SelectionMismatch {
                contract: contract.address.to_checksum(None),
            });
        }

        Ok(Confirmation::Confirmed {
            thread: question.thread_id,
        })
    }

    async fn load_contract(&self, address: Option<Address>) -> ReconcileResult<ContractHandle> {
        let Some(address) = address else {
            warn!("Question has no contract address");
            return Err(ReconcileError::ContractLoad);
        };

        self.chain.load_contract(address).await.map_err(|e| {
            warn!(contract = %address, error = %e, "Contract load failed");
            ReconcileError::ContractLoad
        })
    }

    /// Read `owner()`; a contract that cannot report its owner is not usable.
    async fn read_owner(&self, contract: &ContractHandle) -> ReconcileResult<Address> {
        self.chain.owner(contract).await.map_err(|e| {
            warn!(contract = %contract.address, error = %e, "Owner read failed");
            ReconcileError::ContractLoad
        })
    }

    async fn check_owner(&self, contract: &ContractHandle) -> ReconcileResult<()> {
        let owner = self.read_owner(contract).await?;

        if !self.settings.is_allowed_owner(&owner) {
            warn!(contract = %contract.address, owner = %owner, "Contract owner not allowed");
            return Err(ReconcileError::InvalidOwner);
        }

        Ok(())
    }
}

pub(crate) fn storage_failure(e: anyhow::Error) -> ReconcileError {
    error!(error = ?e, "Record store failure");
    ReconcileError::Storage
}

fn call_failure(e: ChainError) -> ReconcileError {
    warn!(error = %e, "Contract call failed");
    ReconcileError::ContractCall
}

fn log_result(operation: &'static str, result: &ReconcileResult<Confirmation>) {
    match result {
        Ok(confirmation) => info!(operation, ?confirmation, "Reconciliation succeeded"),
        Err(e) => warn!(operation, kind = e.kind(), error = %e, "Reconciliation failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainClient;
    use crate::storage::Storage;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_unknown_hashes_are_not_found() {
        let temp_db = NamedTempFile::new().unwrap();
        let storage = Storage::new_with_path(temp_db.path()).await.unwrap();
        storage.run_migrations().await.unwrap();

        let chain = MockChainClient::new();
        let settings = EngineConfig::new(vec![Address::repeat_byte(0x01)]);
        let engine = ReconciliationEngine::new(&storage, &chain, &settings);

        let hash = B256::repeat_byte(0x99);
        assert_eq!(
            engine.confirm_question(hash).await,
            Err(ReconcileError::QuestionNotFound)
        );
        assert_eq!(
            engine.confirm_answer(hash, hash).await,
            Err(ReconcileError::AnswerNotFound)
        );
        assert_eq!(
            engine.confirm_selection(hash, hash).await,
            Err(ReconcileError::AnswerNotFound)
        );
        assert!(chain.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_contract_address_fails_to_load() {
        let chain = MockChainClient::new();
        let settings = EngineConfig::new(vec![]);
        let temp_db = NamedTempFile::new().unwrap();
        let storage = Storage::new_with_path(temp_db.path()).await.unwrap();
        let engine = ReconciliationEngine::new(&storage, &chain, &settings);

        assert_eq!(
            engine.load_contract(None).await,
            Err(ReconcileError::ContractLoad)
        );
        assert_eq!(
            engine.load_contract(Some(Address::repeat_byte(0xaa))).await,
            Err(ReconcileError::ContractLoad)
        );
    }
}
