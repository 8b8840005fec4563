//! Confirmation requests as they arrive from the web layer.
//!
//! Hashes arrive as hex strings. They are decoded here, once, so that the engine only
//! ever sees 32-byte values.

use alloy::primitives::B256;
use facthound_core::parse_hash;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::chain::ChainClient;
use crate::engine::ReconciliationEngine;
use crate::outcome::{Outcome, ReconcileError};
use crate::storage::RecordStore;

/// What a confirmation request asks the engine to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmType {
    /// `confirm_question`
    Question,
    /// `confirm_answer`
    Answer,
    /// `confirm_selection`
    Selection,
}

impl FromStr for ConfirmType {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "question" => Ok(ConfirmType::Question),
            "answer" => Ok(ConfirmType::Answer),
            "selection" => Ok(ConfirmType::Selection),
            _ => Err(ReconcileError::UnknownConfirmType),
        }
    }
}

impl fmt::Display for ConfirmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfirmType::Question => "question",
            ConfirmType::Answer => "answer",
            ConfirmType::Selection => "selection",
        };
        write!(f, "{}", s)
    }
}

/// Body of a confirmation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    /// Hex question hash
    #[serde(default)]
    pub question_hash: Option<String>,

    /// Hex answer hash
    #[serde(default)]
    pub answer_hash: Option<String>,

    /// `question`, `answer` or `selection`
    #[serde(default)]
    pub confirm_type: Option<String>,
}

/// A decoded confirmation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmCommand {
    /// Confirm a question.
    Question {
        /// Question hash
        question_hash: B256,
    },
    /// Confirm an answer.
    Answer {
        /// Question hash
        question_hash: B256,
        /// Answer hash
        answer_hash: B256,
    },
    /// Confirm a selection.
    Selection {
        /// Question hash
        question_hash: B256,
        /// Answer hash
        answer_hash: B256,
    },
}

impl ConfirmRequest {
    /// Parse a request from its JSON body.
    pub fn from_json(body: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Decode hex hashes and check that the confirm type has what it needs.
    pub fn decode(&self) -> Result<ConfirmCommand, ReconcileError> {
        let confirm_type: ConfirmType = self
            .confirm_type
            .as_deref()
            .ok_or(ReconcileError::UnknownConfirmType)?
            .parse()?;

        let question_hash = decode_hash(
            self.question_hash.as_deref(),
            ReconcileError::MissingQuestionHash,
            ReconcileError::MalformedQuestionHash,
        )?;

        let answer_hash = || {
            decode_hash(
                self.answer_hash.as_deref(),
                ReconcileError::MissingAnswerHash,
                ReconcileError::MalformedAnswerHash,
            )
        };

        Ok(match confirm_type {
            ConfirmType::Question => ConfirmCommand::Question { question_hash },
            ConfirmType::Answer => ConfirmCommand::Answer {
                question_hash,
                answer_hash: answer_hash()?,
            },
            ConfirmType::Selection => ConfirmCommand::Selection {
                question_hash,
                answer_hash: answer_hash()?,
            },
        })
    }
}

fn decode_hash(
    input: Option<&str>,
    missing: ReconcileError,
    malformed: ReconcileError,
) -> Result<B256, ReconcileError> {
    match input.map(str::trim) {
        None | Some("") => Err(missing),
        Some(hex) => parse_hash(hex).map_err(|_| malformed),
    }
}

/// Decode `request` and run it through `engine`.
pub async fn dispatch<S, C>(engine: &ReconciliationEngine<'_, S, C>, request: &ConfirmRequest) -> Outcome
where
    S: RecordStore + ?Sized,
    C: ChainClient + ?Sized,
{
    let command = match request.decode() {
        Ok(command) => command,
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "Rejected confirmation request");
            return e.into();
        }
    };

    let result = match command {
        ConfirmCommand::Question { question_hash } => engine.confirm_question(question_hash).await,
        ConfirmCommand::Answer {
            question_hash,
            answer_hash,
        } => engine.confirm_answer(question_hash, answer_hash).await,
        ConfirmCommand::Selection {
            question_hash,
            answer_hash,
        } => engine.confirm_selection(question_hash, answer_hash).await,
    };

    result.into()
}
