//! Status mapping from on-chain encodings to off-chain lifecycle states.

use alloy_primitives::B256;

use crate::constants::{
    ONCHAIN_STATUS_ANSWER_SELECTED, ONCHAIN_STATUS_CANCELED, ONCHAIN_STATUS_RESOLVED,
};
use crate::types::{AnswerStatus, QuestionStatus};

/// Map the `status` field of `getQuestion` to a [`QuestionStatus`].
///
/// Precedence is canceled, resolved, answer-selected, then open. Every code not listed
/// (including `0` and the unused `2`) maps to `Open`.
///
/// # Example
///
/// ```
/// use facthound_core::status::question_status_from_code;
/// use facthound_core::QuestionStatus;
///
/// assert_eq!(question_status_from_code(3), QuestionStatus::Resolved);
/// assert_eq!(question_status_from_code(2), QuestionStatus::Open);
/// ```
pub fn question_status_from_code(code: u8) -> QuestionStatus {
    match code {
        ONCHAIN_STATUS_CANCELED => QuestionStatus::Canceled,
        ONCHAIN_STATUS_RESOLVED => QuestionStatus::Resolved,
        ONCHAIN_STATUS_ANSWER_SELECTED => QuestionStatus::AnswerSelected,
        _ => QuestionStatus::Open,
    }
}

/// Decide an answer's status from the contract's `selectedAnswer` slot.
pub fn answer_status_from_selection(answer_hash: &B256, selected_answer: &B256) -> AnswerStatus {
    if answer_hash == selected_answer {
        AnswerStatus::Selected
    } else {
        AnswerStatus::Unselected
    }
}
