//! Database types for the record store.

use alloy::primitives::{Address, B256, U256};
use facthound_core::{AnswerStatus, QuestionStatus};

/// A forum account, identified by wallet or by username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Row id
    pub id: i64,

    /// Ethereum wallet (unique), absent for username accounts
    pub wallet: Option<Address>,

    /// Traditional username (unique), absent for wallet accounts
    pub username: Option<String>,
}

/// A question together with the post text and asker it is hashed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    /// Row id
    pub id: i64,

    /// Owning post
    pub post_id: i64,

    /// Thread of the owning post (returned to callers on success)
    pub thread_id: i64,

    /// Text of the owning post
    pub post_text: String,

    /// Asker account
    pub asker: UserRecord,

    /// `keccak256(asker ++ text)`, set once the question is on-chain
    pub question_hash: Option<B256>,

    /// Escrow contract backing this question
    pub contract_address: Option<Address>,

    /// Escrowed bounty in wei
    pub bounty: Option<U256>,

    /// Lifecycle status
    pub status: QuestionStatus,

    /// `None`: off-chain only, `Some(false)`: pending, `Some(true)`: confirmed
    pub confirmed_onchain: Option<bool>,
}

/// An answer together with the post text and answerer it is hashed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Row id
    pub id: i64,

    /// Question this answer responds to
    pub question_id: i64,

    /// Owning post
    pub post_id: i64,

    /// Thread of the owning post
    pub thread_id: i64,

    /// Text of the owning post
    pub post_text: String,

    /// Answerer account
    pub answerer: UserRecord,

    /// `keccak256(answerer ++ text)` (unique)
    pub answer_hash: Option<B256>,

    /// Lifecycle status
    pub status: AnswerStatus,

    /// Tri-state confirmation of the answer itself
    pub confirmed_onchain: Option<bool>,

    /// Tri-state confirmation of this answer's selection
    pub selection_confirmed_onchain: Option<bool>,
}

/// Insert payload for a question row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    /// Owning post
    pub post_id: i64,
    /// Asker account
    pub asker_id: i64,
    /// Claimed question hash
    pub question_hash: Option<B256>,
    /// Escrow contract
    pub contract_address: Option<Address>,
    /// Bounty in wei
    pub bounty: Option<U256>,
    /// Initial status
    pub status: QuestionStatus,
    /// Initial confirmation state
    pub confirmed_onchain: Option<bool>,
}

/// Insert payload for an answer row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    /// Answered question
    pub question_id: i64,
    /// Owning post
    pub post_id: i64,
    /// Answerer account
    pub answerer_id: i64,
    /// Claimed answer hash
    pub answer_hash: Option<B256>,
    /// Initial status
    pub status: AnswerStatus,
    /// Initial confirmation state
    pub confirmed_onchain: Option<bool>,
}

/// Columns written when a question is confirmed against its contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionConfirmation {
    /// Asker resolved from the contract
    pub asker_id: i64,
    /// Escrowed bounty in wei
    pub bounty: U256,
    /// Status mapped from the contract's status code
    pub status: QuestionStatus,
}

/// Columns written when an answer is confirmed against its contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerConfirmation {
    /// Answerer resolved from the contract
    pub answerer_id: i64,
    /// Selected or unselected, per the contract's `selectedAnswer`
    pub status: AnswerStatus,
}
