mod common;

use common::{World, ASKER, CONTRACT, OTHER_OWNER};
use facthound_core::{expected_hash, Address, AnswerStatus, QuestionStatus, B256, U256};
use facthound_reconciler::chain::OnchainQuestion;
use facthound_reconciler::{dispatch, ConfirmRequest, Outcome, ReconcileError};

const ANSWERER: Address = Address::repeat_byte(0x22);

#[tokio::test]
async fn invalid_owner_leaves_question_untouched() {
    let world = World::new(vec![OTHER_OWNER]).await;
    let question = world.question("T").await;
    world.deploy(ASKER, &question, 3);

    let before = world.storage.get_question(question.id).await.unwrap();
    let outcome: Outcome = world.engine().confirm_question(question.hash).await.into();

    assert!(!outcome.success);
    assert_eq!(outcome.to_json(), r#"{"message":"Invalid owner."}"#);
    assert_eq!(world.storage.get_question(question.id).await.unwrap(), before);
    assert!(!world.chain.calls().contains(&"getQuestion"));
}

#[tokio::test]
async fn resolved_question_is_confirmed() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("T").await;
    world.deploy(ASKER, &question, 3);

    let outcome: Outcome = world.engine().confirm_question(question.hash).await.into();

    assert!(outcome.success);
    assert_eq!(
        outcome.to_json(),
        format!(r#"{{"message":"Success","thread":{}}}"#, question.thread)
    );

    let stored = world
        .storage
        .get_question(question.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, QuestionStatus::Resolved);
    assert_eq!(stored.confirmed_onchain, Some(true));
    assert_eq!(stored.bounty, Some(U256::from(500u64)));
    assert_eq!(stored.asker.wallet, Some(ASKER));
}

#[tokio::test]
async fn confirm_question_is_idempotent() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("I am wondering what to do about this topic.").await;
    world.deploy(ASKER, &question, 1);

    let engine = world.engine();
    engine.confirm_question(question.hash).await.unwrap();
    let first = world.storage.get_question(question.id).await.unwrap();
    engine.confirm_question(question.hash).await.unwrap();
    let second = world.storage.get_question(question.id).await.unwrap();

    assert_eq!(first, second);
    let second = second.unwrap();
    assert_eq!(second.status, QuestionStatus::AnswerSelected);
    assert_eq!(second.confirmed_onchain, Some(true));
    assert_eq!(world.storage.stats().await.unwrap().user_count, 1);
}

#[tokio::test]
async fn onchain_asker_must_match_hashed_wallet() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("T").await;
    world.deploy(ASKER, &question, 0);

    let funder = Address::repeat_byte(0x44);
    world.chain.set_question(
        CONTRACT,
        question.hash,
        OnchainQuestion {
            asker: funder,
            bounty: U256::from(1u64),
            status: 3,
            selected_answer: B256::ZERO,
        },
    );

    let before = world.storage.get_question(question.id).await.unwrap();
    assert_eq!(
        world.engine().confirm_question(question.hash).await,
        Err(ReconcileError::QuestionHashMismatch)
    );
    assert_eq!(world.storage.get_question(question.id).await.unwrap(), before);
    assert!(world
        .storage
        .get_user_by_wallet(&funder)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn question_absent_from_contract_is_never_confirmed() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("T").await;
    // Deployed, but getQuestion reads back the all-zero struct
    world.chain.deploy(CONTRACT, ASKER);

    let before = world.storage.get_question(question.id).await.unwrap();
    let engine = world.engine();
    for _ in 0..2 {
        assert_eq!(
            engine.confirm_question(question.hash).await,
            Err(ReconcileError::QuestionHashMismatch)
        );
    }

    let stored = world.storage.get_question(question.id).await.unwrap();
    assert_eq!(stored, before);
    let stored = stored.unwrap();
    assert_eq!(stored.asker.wallet, Some(ASKER));
    assert_eq!(stored.confirmed_onchain, Some(false));
}

#[tokio::test]
async fn status_codes_follow_precedence_table() {
    for (code, expected) in [
        (0u8, QuestionStatus::Open),
        (1, QuestionStatus::AnswerSelected),
        (2, QuestionStatus::Open),
        (3, QuestionStatus::Resolved),
        (4, QuestionStatus::Canceled),
        (5, QuestionStatus::Open),
    ] {
        let world = World::new(vec![ASKER]).await;
        let question = world.question("T").await;
        world.deploy(ASKER, &question, code);

        world.engine().confirm_question(question.hash).await.unwrap();
        let stored = world
            .storage
            .get_question(question.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, expected, "code {code}");
    }
}

#[tokio::test]
async fn tampered_question_text_is_a_hash_mismatch() {
    let world = World::new(vec![ASKER]).await;
    let question = world
        .question_with_text(ASKER, "T", "T, edited later", Some(CONTRACT))
        .await;
    world.deploy(ASKER, &question, 3);

    let before = world.storage.get_question(question.id).await.unwrap();
    let result = world.engine().confirm_question(question.hash).await;

    assert_eq!(result, Err(ReconcileError::QuestionHashMismatch));
    assert_eq!(
        Outcome::from(result).message(),
        "Unexpected questionHash."
    );
    // The contract read succeeded before the comparison failed
    assert!(world.chain.calls().contains(&"getQuestion"));
    assert_eq!(world.storage.get_question(question.id).await.unwrap(), before);
}

#[tokio::test]
async fn unreachable_contract_fails_to_load() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("T").await;

    let result = world.engine().confirm_question(question.hash).await;
    assert_eq!(result, Err(ReconcileError::ContractLoad));
    assert_eq!(
        Outcome::from(result).to_json(),
        r#"{"message":"Failed to load contract."}"#
    );
}

#[tokio::test]
async fn failing_owner_call_fails_to_load() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("T").await;
    world.deploy(ASKER, &question, 0);
    world.chain.fail_call(CONTRACT, "owner");

    assert_eq!(
        world.engine().confirm_question(question.hash).await,
        Err(ReconcileError::ContractLoad)
    );
}

#[tokio::test]
async fn failing_view_call_is_a_contract_call_error() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("T").await;
    world.deploy(ASKER, &question, 0);
    world.chain.fail_call(CONTRACT, "getQuestion");

    let before = world.storage.get_question(question.id).await.unwrap();
    assert_eq!(
        world.engine().confirm_question(question.hash).await,
        Err(ReconcileError::ContractCall)
    );
    assert_eq!(world.storage.get_question(question.id).await.unwrap(), before);
}

#[tokio::test]
async fn timed_out_view_call_is_a_contract_call_error() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("T").await;
    let answer = world.answer(&question, ANSWERER, "A").await;
    world.deploy(ASKER, &question, 0);
    world
        .chain
        .set_answerer(CONTRACT, question.hash, answer.hash, ANSWERER);
    world.chain.stall_call(CONTRACT, "getAnswererAddress");

    let before = world.storage.get_answer(answer.id).await.unwrap();
    let result = world
        .engine()
        .confirm_answer(question.hash, answer.hash)
        .await;
    assert_eq!(result, Err(ReconcileError::ContractCall));
    assert_eq!(
        Outcome::from(result).to_json(),
        r#"{"message":"Failed to read contract state."}"#
    );
    assert_eq!(world.storage.get_answer(answer.id).await.unwrap(), before);

    world.chain.stall_call(CONTRACT, "getQuestion");
    assert_eq!(
        world.engine().confirm_question(question.hash).await,
        Err(ReconcileError::ContractCall)
    );
}

#[tokio::test]
async fn unknown_answer_hash_on_chain_is_invalid() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("T").await;
    let answer = world.answer(&question, ANSWERER, "A").await;
    world.deploy(ASKER, &question, 0);

    let before = world.storage.get_answer(answer.id).await.unwrap();
    let result = world
        .engine()
        .confirm_answer(question.hash, answer.hash)
        .await;

    assert_eq!(result, Err(ReconcileError::InvalidAnswerHash));
    assert_eq!(Outcome::from(result).message(), "Invalid answerHash");
    assert_eq!(world.storage.get_answer(answer.id).await.unwrap(), before);
}

#[tokio::test]
async fn confirmed_answer_takes_selection_from_chain() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("T").await;
    let chosen = world.answer(&question, ANSWERER, "A").await;
    let other = world.answer(&question, Address::repeat_byte(0x33), "B").await;
    world.deploy(ASKER, &question, 1);
    world.chain.select_answer(CONTRACT, question.hash, chosen.hash);
    world
        .chain
        .set_answerer(CONTRACT, question.hash, chosen.hash, ANSWERER);
    world.chain.set_answerer(
        CONTRACT,
        question.hash,
        other.hash,
        Address::repeat_byte(0x33),
    );

    let engine = world.engine();
    let outcome: Outcome = engine.confirm_answer(question.hash, chosen.hash).await.into();
    assert!(outcome.success);
    engine
        .confirm_answer(question.hash, other.hash)
        .await
        .unwrap();

    let chosen = world.storage.get_answer(chosen.id).await.unwrap().unwrap();
    assert_eq!(chosen.status, AnswerStatus::Selected);
    assert_eq!(chosen.confirmed_onchain, Some(true));
    assert_eq!(chosen.answerer.wallet, Some(ANSWERER));

    let other = world.storage.get_answer(other.id).await.unwrap().unwrap();
    assert_eq!(other.status, AnswerStatus::Unselected);
    assert_eq!(other.confirmed_onchain, Some(true));
}

#[tokio::test]
async fn tampered_answer_text_is_a_hash_mismatch() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("T").await;
    let answer = world.answer(&question, ANSWERER, "A").await;
    world.deploy(ASKER, &question, 0);
    world
        .chain
        .set_answerer(CONTRACT, question.hash, answer.hash, ANSWERER);

    sqlx::query("UPDATE posts SET text = 'A, edited' WHERE id = (SELECT post_id FROM answers WHERE id = ?)")
        .bind(answer.id)
        .execute(world.storage.pool())
        .await
        .unwrap();

    let result = world
        .engine()
        .confirm_answer(question.hash, answer.hash)
        .await;
    assert_eq!(result, Err(ReconcileError::AnswerHashMismatch));
    assert!(!world.chain.calls().contains(&"getAnswererAddress"));
}

#[tokio::test]
async fn onchain_answerer_must_match_hashed_wallet() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("T").await;
    let answer = world.answer(&question, ANSWERER, "A").await;
    world.deploy(ASKER, &question, 0);

    let impostor = Address::repeat_byte(0x55);
    world
        .chain
        .set_answerer(CONTRACT, question.hash, answer.hash, impostor);

    let before = world.storage.get_answer(answer.id).await.unwrap();
    assert_eq!(
        world
            .engine()
            .confirm_answer(question.hash, answer.hash)
            .await,
        Err(ReconcileError::AnswerHashMismatch)
    );
    assert_eq!(world.storage.get_answer(answer.id).await.unwrap(), before);
    assert!(world
        .storage
        .get_user_by_wallet(&impostor)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn answer_confirmation_checks_owner() {
    let world = World::new(vec![OTHER_OWNER]).await;
    let question = world.question("T").await;
    let answer = world.answer(&question, ANSWERER, "A").await;
    world.deploy(ASKER, &question, 0);

    assert_eq!(
        world
            .engine()
            .confirm_answer(question.hash, answer.hash)
            .await,
        Err(ReconcileError::InvalidOwner)
    );
}

#[tokio::test]
async fn selection_mismatch_marks_answer_pending() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("T").await;
    let answer = world.answer(&question, ANSWERER, "A").await;
    world.deploy(ASKER, &question, 1);
    world
        .chain
        .select_answer(CONTRACT, question.hash, B256::repeat_byte(0x77));

    let result = world
        .engine()
        .confirm_selection(question.hash, answer.hash)
        .await;

    let checksummed = CONTRACT.to_checksum(None);
    assert_eq!(
        result,
        Err(ReconcileError::SelectionMismatch {
            contract: checksummed.clone()
        })
    );
    let outcome = Outcome::from(result);
    assert!(!outcome.success);
    assert!(outcome.message().contains(&checksummed));

    let stored = world.storage.get_answer(answer.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AnswerStatus::Unselected);
    assert_eq!(stored.selection_confirmed_onchain, Some(false));
}

#[tokio::test]
async fn matching_selection_is_confirmed_without_owner_check() {
    // Owner is not allowed, but selection confirmation does not re-check it by default
    let world = World::new(vec![OTHER_OWNER]).await;
    let question = world.question("T").await;
    let answer = world.answer(&question, ANSWERER, "A").await;
    world.deploy(ASKER, &question, 1);
    world
        .chain
        .select_answer(CONTRACT, question.hash, answer.hash);

    let outcome: Outcome = world
        .engine()
        .confirm_selection(question.hash, answer.hash)
        .await
        .into();
    assert!(outcome.success);

    let stored = world.storage.get_answer(answer.id).await.unwrap().unwrap();
    assert_eq!(stored.selection_confirmed_onchain, Some(true));
    assert!(world.chain.calls().contains(&"owner"));
}

#[tokio::test]
async fn selection_owner_check_can_be_enforced() {
    let mut world = World::new(vec![OTHER_OWNER]).await;
    world.settings.enforce_owner_on_selection = true;
    let question = world.question("T").await;
    let answer = world.answer(&question, ANSWERER, "A").await;
    world.deploy(ASKER, &question, 1);
    world
        .chain
        .select_answer(CONTRACT, question.hash, answer.hash);

    let before = world.storage.get_answer(answer.id).await.unwrap();
    assert_eq!(
        world
            .engine()
            .confirm_selection(question.hash, answer.hash)
            .await,
        Err(ReconcileError::InvalidOwner)
    );
    assert_eq!(world.storage.get_answer(answer.id).await.unwrap(), before);
}

#[tokio::test]
async fn confirm_requests_are_dispatched_by_type() {
    let world = World::new(vec![ASKER]).await;
    let question = world.question("T").await;
    let answer = world.answer(&question, ANSWERER, "A").await;
    world.deploy(ASKER, &question, 0);
    world
        .chain
        .set_answerer(CONTRACT, question.hash, answer.hash, ANSWERER);

    let engine = world.engine();

    let body = format!(
        r#"{{"questionHash": "{}", "confirmType": "question"}}"#,
        question.hash
    );
    let outcome = dispatch(&engine, &ConfirmRequest::from_json(&body).unwrap()).await;
    assert!(outcome.success, "{}", outcome.to_json());

    let body = format!(
        r#"{{"questionHash": "{}", "answerHash": "{}", "confirmType": "answer"}}"#,
        question.hash, answer.hash
    );
    let outcome = dispatch(&engine, &ConfirmRequest::from_json(&body).unwrap()).await;
    assert!(outcome.success, "{}", outcome.to_json());

    let outcome = dispatch(
        &engine,
        &ConfirmRequest::from_json(r#"{"questionHash": "0x12", "confirmType": "question"}"#)
            .unwrap(),
    )
    .await;
    assert_eq!(outcome.to_json(), r#"{"message":"Invalid questionHash."}"#);

    let outcome = dispatch(&engine, &ConfirmRequest::default()).await;
    assert_eq!(outcome.to_json(), r#"{"message":"Unknown confirmType."}"#);
}

#[test]
fn expected_hash_separates_texts() {
    let a = expected_hash(&ASKER, "T");
    assert_eq!(a, expected_hash(&ASKER, "T"));
    assert_ne!(a, expected_hash(&ASKER, "T2"));
    assert_ne!(a, expected_hash(&ANSWERER, "T"));
}
