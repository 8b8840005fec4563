//! Question storage operations.

use super::{bytes_to_b256, NewQuestion, QuestionConfirmation, QuestionRecord, Storage};
use alloy::primitives::{Address, B256, U256};
use anyhow::{Context, Result};
use facthound_core::QuestionStatus;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const SELECT_QUESTION: &str = r#"
    SELECT q.id, q.post_id, p.thread_id, p.text AS post_text,
           q.question_hash, q.contract_address, q.bounty, q.status, q.confirmed_onchain,
           u.id AS u_id, u.wallet AS u_wallet, u.username AS u_username
    FROM questions q
    JOIN posts p ON p.id = q.post_id
    JOIN users u ON u.id = q.asker_id
"#;

impl Storage {
    /// Insert a question for an existing post.
    pub async fn insert_question(&self, question: &NewQuestion) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO questions (
                post_id, asker_id, question_hash, contract_address,
                bounty, status, confirmed_onchain
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(question.post_id)
        .bind(question.asker_id)
        .bind(question.question_hash.as_ref().map(|h| h.as_slice()))
        .bind(question.contract_address.map(|a| a.to_checksum(None)))
        .bind(question.bounty.map(|b| b.to_string()))
        .bind(question.status.as_str())
        .bind(question.confirmed_onchain)
        .execute(&self.pool)
        .await
        .context("Failed to insert question")?;

        Ok(result.last_insert_rowid())
    }

    /// Get a question by row id.
    pub async fn get_question(&self, id: i64) -> Result<Option<QuestionRecord>> {
        let row = sqlx::query(&format!("{SELECT_QUESTION} WHERE q.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::row_to_question_record(&row)).transpose()
    }

    /// Get a question by its on-chain hash.
    ///
    /// Hashes bind the asker and the post text, so a duplicate only arises from a
    /// re-posted question; the oldest row wins.
    pub async fn get_question_by_hash(&self, question_hash: &B256) -> Result<Option<QuestionRecord>> {
        let row = sqlx::query(&format!(
            "{SELECT_QUESTION} WHERE q.question_hash = ? ORDER BY q.id LIMIT 1"
        ))
        .bind(question_hash.as_slice())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Self::row_to_question_record(&row)).transpose()
    }

    /// Record a confirmed question.
    ///
    /// Only the columns the contract is authoritative for are written, so concurrent
    /// writers touching other columns of the row are not overwritten.
    pub async fn write_question_confirmation(
        &self,
        question_id: i64,
        confirmation: &QuestionConfirmation,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE questions
            SET asker_id = ?, bounty = ?, status = ?, confirmed_onchain = 1
            WHERE id = ?
            "#,
        )
        .bind(confirmation.asker_id)
        .bind(confirmation.bounty.to_string())
        .bind(confirmation.status.as_str())
        .bind(question_id)
        .execute(&self.pool)
        .await
        .context("Failed to record question confirmation")?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Question {} does not exist", question_id);
        }

        Ok(())
    }

    fn row_to_question_record(row: &SqliteRow) -> Result<QuestionRecord> {
        let question_hash: Option<Vec<u8>> = row.try_get("question_hash")?;
        let contract_address: Option<String> = row.try_get("contract_address")?;
        let bounty: Option<String> = row.try_get("bounty")?;
        let status: String = row.try_get("status")?;

        Ok(QuestionRecord {
            id: row.try_get("id")?,
            post_id: row.try_get("post_id")?,
            thread_id: row.try_get("thread_id")?,
            post_text: row.try_get("post_text")?,
            asker: Self::row_to_user_record(row, "u_")?,
            question_hash: question_hash.as_deref().map(bytes_to_b256).transpose()?,
            contract_address: contract_address
                .map(|a| a.parse::<Address>())
                .transpose()
                .context("Stored contract address is malformed")?,
            bounty: bounty
                .map(|b| b.parse::<U256>())
                .transpose()
                .context("Stored bounty is malformed")?,
            status: status.parse::<QuestionStatus>()?,
            confirmed_onchain: row.try_get("confirmed_onchain")?,
        })
    }
}
