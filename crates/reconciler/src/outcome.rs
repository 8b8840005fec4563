//! Operation results and their wire shape.
//!
//! Every engine and selection operation ends in either a [`Confirmation`] or a
//! [`ReconcileError`]. [`Outcome`] folds both into the `(success, payload)` pair the web
//! layer serializes; mapping `success` to 200/400 is left to the transport.

use serde::Serialize;
use thiserror::Error;

/// Message carried by every successful confirmation.
pub const SUCCESS_MESSAGE: &str = "Success";

/// Message carried by a successful selection.
pub const SELECTED_MESSAGE: &str = "answer selected";

/// Reconciliation and selection failures.
///
/// The `Display` text of each variant is the stable message returned to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// No local question carries the requested hash.
    #[error("Question not found.")]
    QuestionNotFound,

    /// No local answer carries the requested hash.
    #[error("Answer not found.")]
    AnswerNotFound,

    /// The contract could not be resolved or its owner could not be read.
    #[error("Failed to load contract.")]
    ContractLoad,

    /// The contract owner is not in the allow-list.
    #[error("Invalid owner.")]
    InvalidOwner,

    /// Stored question hash does not bind the asker and post text.
    #[error("Unexpected questionHash.")]
    QuestionHashMismatch,

    /// Stored answer hash does not bind the answerer and post text.
    #[error("Unexpected answerHash")]
    AnswerHashMismatch,

    /// The contract has no answerer recorded for this answer hash.
    #[error("Invalid answerHash")]
    InvalidAnswerHash,

    /// The contract selected a different answer.
    #[error("This answer must be selected in the contract at address {contract}.")]
    SelectionMismatch {
        /// Checksummed contract address
        contract: String,
    },

    /// A view call failed or timed out.
    #[error("Failed to read contract state.")]
    ContractCall,

    /// The answer belongs to another question.
    #[error("This answer does not answer this question.")]
    AnswerQuestionMismatch,

    /// Caller is not the asker of an off-chain question.
    #[error("Only the question's asker can do this.")]
    NotAuthorized,

    /// Selection referenced a question id that does not exist.
    #[error("No question with that id exists.")]
    UnknownQuestion,

    /// Selection referenced an answer id that does not exist.
    #[error("No answer with that id exists.")]
    UnknownAnswer,

    /// The record store failed to read or write.
    #[error("Failed to persist record.")]
    Storage,

    /// `questionHash` is not 32 bytes of hex.
    #[error("Invalid questionHash.")]
    MalformedQuestionHash,

    /// `answerHash` is not 32 bytes of hex.
    #[error("Invalid answerHash.")]
    MalformedAnswerHash,

    /// `questionHash` was not supplied.
    #[error("questionHash is required.")]
    MissingQuestionHash,

    /// `answerHash` was not supplied.
    #[error("answerHash is required.")]
    MissingAnswerHash,

    /// `confirmType` is not one of question, answer or selection.
    #[error("Unknown confirmType.")]
    UnknownConfirmType,
}

impl ReconcileError {
    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QuestionNotFound | Self::AnswerNotFound => "not_found",
            Self::ContractLoad => "contract_load",
            Self::InvalidOwner => "invalid_owner",
            Self::QuestionHashMismatch | Self::AnswerHashMismatch => "hash_mismatch",
            Self::InvalidAnswerHash => "invalid_answer_hash",
            Self::SelectionMismatch { .. } => "selection_mismatch",
            Self::ContractCall => "contract_call",
            Self::AnswerQuestionMismatch => "answer_question_mismatch",
            Self::NotAuthorized => "not_authorized",
            Self::UnknownQuestion | Self::UnknownAnswer => "unknown_id",
            Self::Storage => "storage",
            Self::MalformedQuestionHash
            | Self::MalformedAnswerHash
            | Self::MissingQuestionHash
            | Self::MissingAnswerHash
            | Self::UnknownConfirmType => "bad_request",
        }
    }
}

/// A successful operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// A question, answer or selection now agrees with the chain.
    Confirmed {
        /// Thread containing the reconciled post
        thread: i64,
    },

    /// An answer was selected off-chain.
    Selected {
        /// Question id
        question: i64,
        /// Chosen answer id
        answer: i64,
    },
}

/// JSON payload of an [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// `{"message": "Success", "thread": id}`
    Confirmed {
        /// Always [`SUCCESS_MESSAGE`]
        message: String,
        /// Thread id
        thread: i64,
    },

    /// `{"message": "answer selected", "question": id, "answer": id}`
    Selected {
        /// Always [`SELECTED_MESSAGE`]
        message: String,
        /// Question id
        question: i64,
        /// Answer id
        answer: i64,
    },

    /// `{"message": reason}`
    Failed {
        /// Stable failure message
        message: String,
    },
}

/// The `(success, payload)` pair handed back to the web layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Whether the operation succeeded
    pub success: bool,

    /// Response body
    pub payload: Payload,
}

impl Outcome {
    /// The response body as JSON text.
    pub fn to_json(&self) -> String {
        // Payload has only string and integer fields, so serialization cannot fail
        serde_json::to_string(&self.payload).unwrap_or_default()
    }

    /// The payload's message.
    pub fn message(&self) -> &str {
        match &self.payload {
            Payload::Confirmed { message, .. }
            | Payload::Selected { message, .. }
            | Payload::Failed { message } => message,
        }
    }
}

impl From<Confirmation> for Outcome {
    fn from(confirmation: Confirmation) -> Self {
        let payload = match confirmation {
            Confirmation::Confirmed { thread } => Payload::Confirmed {
                message: SUCCESS_MESSAGE.to_string(),
                thread,
            },
            Confirmation::Selected { question, answer } => Payload::Selected {
                message: SELECTED_MESSAGE.to_string(),
                question,
                answer,
            },
        };

        Self {
            success: true,
            payload,
        }
    }
}

impl From<ReconcileError> for Outcome {
    fn from(error: ReconcileError) -> Self {
        Self {
            success: false,
            payload: Payload::Failed {
                message: error.to_string(),
            },
        }
    }
}

impl From<Result<Confirmation, ReconcileError>> for Outcome {
    fn from(result: Result<Confirmation, ReconcileError>) -> Self {
        match result {
            Ok(confirmation) => confirmation.into(),
            Err(error) => error.into(),
        }
    }
}
