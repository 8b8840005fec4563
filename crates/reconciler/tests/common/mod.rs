#![allow(dead_code)]

use facthound_core::{expected_hash, Address, AnswerStatus, QuestionStatus, B256, U256};
use facthound_reconciler::chain::{MockChainClient, OnchainQuestion};
use facthound_reconciler::config::EngineConfig;
use facthound_reconciler::storage::{NewAnswer, NewQuestion, Storage, UserRecord};
use facthound_reconciler::ReconciliationEngine;
use tempfile::NamedTempFile;

pub const ASKER: Address = Address::repeat_byte(0x11);
pub const CONTRACT: Address = Address::repeat_byte(0xaa);
pub const OTHER_OWNER: Address = Address::repeat_byte(0x99);

/// A temporary database, a scripted chain and an engine configuration.
pub struct World {
    pub storage: Storage,
    pub chain: MockChainClient,
    pub settings: EngineConfig,
    _db: NamedTempFile,
}

#[derive(Debug, Clone, Copy)]
pub struct SeededQuestion {
    pub id: i64,
    pub thread: i64,
    pub hash: B256,
    pub asker: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct SeededAnswer {
    pub id: i64,
    pub hash: B256,
    pub answerer: i64,
}

impl World {
    pub async fn new(allowed_owners: Vec<Address>) -> Self {
        let db = NamedTempFile::new().expect("temp db");
        let storage = Storage::new_with_path(db.path())
            .await
            .expect("open storage");
        storage.run_migrations().await.expect("migrations");

        Self {
            storage,
            chain: MockChainClient::new(),
            settings: EngineConfig::new(allowed_owners),
            _db: db,
        }
    }

    pub fn engine(&self) -> ReconciliationEngine<'_, Storage, MockChainClient> {
        ReconciliationEngine::new(&self.storage, &self.chain, &self.settings)
    }

    pub async fn user(&self, wallet: Address) -> UserRecord {
        self.storage
            .upsert_user_wallet(wallet)
            .await
            .expect("upsert user")
    }

    /// Seed a question whose stored hash is `keccak(asker ++ hashed_text)` over a post
    /// containing `post_text`.
    pub async fn question_with_text(
        &self,
        asker: Address,
        hashed_text: &str,
        post_text: &str,
        contract: Option<Address>,
    ) -> SeededQuestion {
        let asker = self.user(asker).await;
        let thread = self.storage.create_thread("topic").await.expect("thread");
        let post = self
            .storage
            .create_post(thread, asker.id, post_text)
            .await
            .expect("post");
        let hash = expected_hash(&asker.wallet.expect("wallet"), hashed_text);

        let id = self
            .storage
            .insert_question(&NewQuestion {
                post_id: post,
                asker_id: asker.id,
                question_hash: contract.map(|_| hash),
                contract_address: contract,
                bounty: None,
                status: QuestionStatus::Open,
                confirmed_onchain: contract.map(|_| false),
            })
            .await
            .expect("question");

        SeededQuestion {
            id,
            thread,
            hash,
            asker: asker.id,
        }
    }

    /// Seed a contract-backed question with a correct hash.
    pub async fn question(&self, text: &str) -> SeededQuestion {
        self.question_with_text(ASKER, text, text, Some(CONTRACT)).await
    }

    /// Seed an answer whose stored hash binds `answerer` and `text`.
    pub async fn answer(
        &self,
        question: &SeededQuestion,
        answerer: Address,
        text: &str,
    ) -> SeededAnswer {
        let user = self.user(answerer).await;
        let post = self
            .storage
            .create_post(question.thread, user.id, text)
            .await
            .expect("post");
        let hash = expected_hash(&answerer, text);

        let id = self
            .storage
            .insert_answer(&NewAnswer {
                question_id: question.id,
                post_id: post,
                answerer_id: user.id,
                answer_hash: Some(hash),
                status: AnswerStatus::Unselected,
                confirmed_onchain: Some(false),
            })
            .await
            .expect("answer");

        SeededAnswer {
            id,
            hash,
            answerer: user.id,
        }
    }

    /// Deploy the contract owned by `owner` with `question` recorded at `status`.
    pub fn deploy(&self, owner: Address, question: &SeededQuestion, status: u8) {
        self.chain.deploy(CONTRACT, owner);
        self.chain.set_question(
            CONTRACT,
            question.hash,
            OnchainQuestion {
                asker: ASKER,
                bounty: U256::from(500u64),
                status,
                selected_answer: B256::ZERO,
            },
        );
    }
}
