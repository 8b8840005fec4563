//! Off-chain answer selection.
//!
//! An asker picks the accepted answer to their question. For contract-backed questions
//! the selection is accepted provisionally and left for
//! [`confirm_selection`](crate::engine::ReconciliationEngine::confirm_selection) to check
//! against the contract's `selectedAnswer`.

use facthound_core::{AnswerStatus, QuestionStatus};
use tracing::{info, warn};

use crate::engine::storage_failure;
use crate::outcome::{Confirmation, ReconcileError};
use crate::storage::{RecordStore, UserRecord};

/// Select `answer_id` as the accepted answer of `question_id` on behalf of `caller`.
///
/// Every other answer to the question is demoted to unselected in the same store
/// transaction, so at most one answer per question is ever selected.
pub async fn select_answer<S>(
    store: &S,
    question_id: i64,
    answer_id: i64,
    caller: &UserRecord,
) -> Result<Confirmation, ReconcileError>
where
    S: RecordStore + ?Sized,
{
    info!(
        operation = "selection",
        wallet = ?caller.wallet,
        username = ?caller.username,
        question = question_id,
        answer = answer_id,
        "Selecting answer"
    );

    let result = apply(store, question_id, answer_id, caller).await;
    match &result {
        Ok(_) => info!(question = question_id, answer = answer_id, "Answer selected"),
        Err(e) => warn!(
            question = question_id,
            answer = answer_id,
            kind = e.kind(),
            error = %e,
            "Selection rejected"
        ),
    }
    result
}

async fn apply<S>(
    store: &S,
    question_id: i64,
    answer_id: i64,
    caller: &UserRecord,
) -> Result<Confirmation, ReconcileError>
where
    S: RecordStore + ?Sized,
{
    let mut question = store
        .question_by_id(question_id)
        .await
        .map_err(storage_failure)?
        .ok_or(ReconcileError::UnknownQuestion)?;

    let mut answer = store
        .answer_by_id(answer_id)
        .await
        .map_err(storage_failure)?
        .ok_or(ReconcileError::UnknownAnswer)?;

    if answer.question_id != question.id {
        return Err(ReconcileError::AnswerQuestionMismatch);
    }

    if question.contract_address.is_some() && answer.answer_hash.is_some() {
        // Pending until the contract confirms it
        answer.selection_confirmed_onchain = Some(false);
    } else if question.asker.id != caller.id {
        return Err(ReconcileError::NotAuthorized);
    }

    answer.status = AnswerStatus::Selected;
    question.status = QuestionStatus::AnswerSelected;

    store
        .apply_selection(&question, &answer)
        .await
        .map_err(storage_failure)?;

    Ok(Confirmation::Selected {
        question: question.id,
        answer: answer.id,
    })
}
