//! Answer storage operations.

use super::{bytes_to_b256, AnswerConfirmation, AnswerRecord, NewAnswer, QuestionRecord, Storage};
use alloy::primitives::B256;
use anyhow::{Context, Result};
use facthound_core::AnswerStatus;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const SELECT_ANSWER: &str = r#"
    SELECT a.id, a.question_id, a.post_id, p.thread_id, p.text AS post_text,
           a.answer_hash, a.status, a.confirmed_onchain, a.selection_confirmed_onchain,
           u.id AS u_id, u.wallet AS u_wallet, u.username AS u_username
    FROM answers a
    JOIN posts p ON p.id = a.post_id
    JOIN users u ON u.id = a.answerer_id
"#;

impl Storage {
    /// Insert an answer for an existing post.
    pub async fn insert_answer(&self, answer: &NewAnswer) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO answers (
                question_id, post_id, answerer_id, answer_hash,
                status, confirmed_onchain
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(answer.question_id)
        .bind(answer.post_id)
        .bind(answer.answerer_id)
        .bind(answer.answer_hash.as_ref().map(|h| h.as_slice()))
        .bind(answer.status.as_str())
        .bind(answer.confirmed_onchain)
        .execute(&self.pool)
        .await
        .context("Failed to insert answer")?;

        Ok(result.last_insert_rowid())
    }

    /// Get an answer by row id.
    pub async fn get_answer(&self, id: i64) -> Result<Option<AnswerRecord>> {
        let row = sqlx::query(&format!("{SELECT_ANSWER} WHERE a.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::row_to_answer_record(&row)).transpose()
    }

    /// Get an answer by its on-chain hash.
    pub async fn get_answer_by_hash(&self, answer_hash: &B256) -> Result<Option<AnswerRecord>> {
        let row = sqlx::query(&format!("{SELECT_ANSWER} WHERE a.answer_hash = ?"))
            .bind(answer_hash.as_slice())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::row_to_answer_record(&row)).transpose()
    }

    /// Get every answer to a question, oldest first.
    pub async fn get_answers_for_question(&self, question_id: i64) -> Result<Vec<AnswerRecord>> {
        let rows = sqlx::query(&format!(
            "{SELECT_ANSWER} WHERE a.question_id = ? ORDER BY a.id"
        ))
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_answer_record).collect()
    }

    /// Record a confirmed answer.
    ///
    /// The selection flag is left alone; it belongs to selection confirmation.
    pub async fn write_answer_confirmation(
        &self,
        answer_id: i64,
        confirmation: &AnswerConfirmation,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE answers
            SET answerer_id = ?, status = ?, confirmed_onchain = 1
            WHERE id = ?
            "#,
        )
        .bind(confirmation.answerer_id)
        .bind(confirmation.status.as_str())
        .bind(answer_id)
        .execute(&self.pool)
        .await
        .context("Failed to record answer confirmation")?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Answer {} does not exist", answer_id);
        }

        Ok(())
    }

    /// Record the outcome of checking an answer's selection against its contract.
    ///
    /// A match confirms the selection. A mismatch demotes the answer and leaves its
    /// selection pending.
    pub async fn write_selection_check(&self, answer_id: i64, matched: bool) -> Result<()> {
        let query = if matched {
            sqlx::query("UPDATE answers SET selection_confirmed_onchain = 1 WHERE id = ?")
        } else {
            sqlx::query(
                "UPDATE answers SET status = ?, selection_confirmed_onchain = 0 WHERE id = ?",
            )
            .bind(AnswerStatus::Unselected.as_str())
        };

        let result = query
            .bind(answer_id)
            .execute(&self.pool)
            .await
            .context("Failed to record selection check")?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Answer {} does not exist", answer_id);
        }

        Ok(())
    }

    /// Make `answer` the only selected answer of `question`.
    ///
    /// Sibling demotion, the chosen answer and the question status are written in one
    /// transaction so concurrent selections on the same question cannot both survive.
    pub async fn write_selection(
        &self,
        question: &QuestionRecord,
        answer: &AnswerRecord,
    ) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin selection transaction")?;

        sqlx::query("UPDATE answers SET status = ? WHERE question_id = ? AND id != ?")
            .bind(AnswerStatus::Unselected.as_str())
            .bind(question.id)
            .bind(answer.id)
            .execute(&mut *tx)
            .await
            .context("Failed to demote sibling answers")?;

        sqlx::query(
            r#"
            UPDATE answers
            SET status = ?, selection_confirmed_onchain = ?
            WHERE id = ? AND question_id = ?
            "#,
        )
        .bind(answer.status.as_str())
        .bind(answer.selection_confirmed_onchain)
        .bind(answer.id)
        .bind(question.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update selected answer")?;

        sqlx::query("UPDATE questions SET status = ? WHERE id = ?")
            .bind(question.status.as_str())
            .bind(question.id)
            .execute(&mut *tx)
            .await
            .context("Failed to update question status")?;

        tx.commit()
            .await
            .context("Failed to commit selection transaction")?;

        Ok(())
    }

    fn row_to_answer_record(row: &SqliteRow) -> Result<AnswerRecord> {
        let answer_hash: Option<Vec<u8>> = row.try_get("answer_hash")?;
        let status: String = row.try_get("status")?;

        Ok(AnswerRecord {
            id: row.try_get("id")?,
            question_id: row.try_get("question_id")?,
            post_id: row.try_get("post_id")?,
            thread_id: row.try_get("thread_id")?,
            post_text: row.try_get("post_text")?,
            answerer: Self::row_to_user_record(row, "u_")?,
            answer_hash: answer_hash.as_deref().map(bytes_to_b256).transpose()?,
            status: status.parse::<AnswerStatus>()?,
            confirmed_onchain: row.try_get("confirmed_onchain")?,
            selection_confirmed_onchain: row.try_get("selection_confirmed_onchain")?,
        })
    }
}
