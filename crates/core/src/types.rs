//! Core types for FactHound reconciliation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Off-chain lifecycle of a question.
///
/// `Open → AnswerSelected → Resolved`, or `Open → Canceled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    /// Accepting answers.
    Open,
    /// An answer has been picked by the asker or oracle.
    AnswerSelected,
    /// Bounty settled.
    Resolved,
    /// Withdrawn by the asker.
    Canceled,
}

impl QuestionStatus {
    /// Convert to database code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            QuestionStatus::Open => "OP",
            QuestionStatus::AnswerSelected => "AS",
            QuestionStatus::Resolved => "RS",
            QuestionStatus::Canceled => "CA",
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuestionStatus::Open => "Open",
            QuestionStatus::AnswerSelected => "Answer Selected",
            QuestionStatus::Resolved => "Resolved",
            QuestionStatus::Canceled => "Canceled",
        };
        f.write_str(label)
    }
}

impl FromStr for QuestionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OP" => Ok(QuestionStatus::Open),
            "AS" => Ok(QuestionStatus::AnswerSelected),
            "RS" => Ok(QuestionStatus::Resolved),
            "CA" => Ok(QuestionStatus::Canceled),
            other => Err(CoreError::InvalidQuestionStatus(other.to_string())),
        }
    }
}

/// Off-chain lifecycle of an answer.
///
/// `Unselected ⇄ Selected → Certified → PaidOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    /// Not the accepted answer.
    Unselected,
    /// The accepted answer for its question.
    Selected,
    /// Certified by the oracle.
    Certified,
    /// Bounty paid to the answerer.
    PaidOut,
}

impl AnswerStatus {
    /// Convert to database code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AnswerStatus::Unselected => "UN",
            AnswerStatus::Selected => "SE",
            AnswerStatus::Certified => "CE",
            AnswerStatus::PaidOut => "PO",
        }
    }
}

impl fmt::Display for AnswerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnswerStatus::Unselected => "Unselected",
            AnswerStatus::Selected => "Selected",
            AnswerStatus::Certified => "Certified",
            AnswerStatus::PaidOut => "Paid Out",
        };
        f.write_str(label)
    }
}

impl FromStr for AnswerStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UN" => Ok(AnswerStatus::Unselected),
            "SE" => Ok(AnswerStatus::Selected),
            "CE" => Ok(AnswerStatus::Certified),
            "PO" => Ok(AnswerStatus::PaidOut),
            other => Err(CoreError::InvalidAnswerStatus(other.to_string())),
        }
    }
}
