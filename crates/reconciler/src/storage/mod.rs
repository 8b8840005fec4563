//! Storage layer for the FactHound reconciler.
//!
//! This module provides database operations for:
//! - Users (lazily created per wallet observed on-chain)
//! - Threads and posts (seeded by the posting flow)
//! - Questions and answers (mutated by reconciliation and selection)
//!
//! The engine only sees the [`RecordStore`] trait; [`Storage`] is its SQLite implementation.
//! Each write touches only the columns its operation owns, so reconciliations that
//! interleave on the same row do not overwrite one another.

use alloy::primitives::{Address, B256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub mod answer;
pub mod question;
pub mod types;
pub mod user;

pub use types::*;

/// Persistence operations the reconciliation engine and selection gate depend on.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up a question by its on-chain hash.
    async fn question_by_hash(&self, question_hash: &B256) -> Result<Option<QuestionRecord>>;

    /// Look up a question by row id.
    async fn question_by_id(&self, id: i64) -> Result<Option<QuestionRecord>>;

    /// Look up an answer by its on-chain hash.
    async fn answer_by_hash(&self, answer_hash: &B256) -> Result<Option<AnswerRecord>>;

    /// Look up an answer by row id.
    async fn answer_by_id(&self, id: i64) -> Result<Option<AnswerRecord>>;

    /// Return the user owning `wallet`, creating it on first sight.
    async fn get_or_create_user_by_wallet(&self, wallet: Address) -> Result<UserRecord>;

    /// Mark a question confirmed with the contract's asker, bounty and status.
    async fn save_question_confirmation(
        &self,
        question_id: i64,
        confirmation: &QuestionConfirmation,
    ) -> Result<()>;

    /// Mark an answer confirmed with the contract's answerer and selection status.
    async fn save_answer_confirmation(
        &self,
        answer_id: i64,
        confirmation: &AnswerConfirmation,
    ) -> Result<()>;

    /// Confirm an answer's selection, or demote it to a pending one when `matched` is false.
    async fn save_selection_check(&self, answer_id: i64, matched: bool) -> Result<()>;

    /// Atomically demote every sibling of `answer` and write `answer` and `question`.
    async fn apply_selection(&self, question: &QuestionRecord, answer: &AnswerRecord)
        -> Result<()>;
}

/// Database storage for the reconciler.
///
/// Provides async access to SQLite database with connection pooling.
#[derive(Debug, Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Create a new storage instance with the given database URL.
    ///
    /// This will create the database file if it doesn't exist.
    ///
    /// # Example
    /// ```no_run
    /// # use facthound_reconciler::storage::Storage;
    /// # async fn example() -> anyhow::Result<()> {
    /// let storage = Storage::new("sqlite://facthound.db", None, None).await?;
    /// storage.run_migrations().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(
        database_url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self> {
        info!("Connecting to database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.unwrap_or(5))
            .min_connections(min_connections.unwrap_or(1))
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// Create a new storage instance with a specific file path.
    pub async fn new_with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let database_url = format!("sqlite://{}", path.as_ref().display());
        Self::new(&database_url, None, None).await
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;

        info!("Migrations completed successfully");

        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        info!("Closing database connection");
        self.pool.close().await;
    }

    /// Get database statistics.
    pub async fn stats(&self) -> Result<DatabaseStats> {
        let row: (i64, i64, i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM questions),
                (SELECT COUNT(*) FROM answers),
                (SELECT COUNT(*) FROM questions WHERE confirmed_onchain = 0),
                (SELECT COUNT(*) FROM answers WHERE confirmed_onchain = 0),
                (SELECT COUNT(*) FROM answers WHERE selection_confirmed_onchain = 0)
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to collect database stats")?;

        Ok(DatabaseStats {
            user_count: row.0 as u64,
            question_count: row.1 as u64,
            answer_count: row.2 as u64,
            pending_questions: row.3 as u64,
            pending_answers: row.4 as u64,
            pending_selections: row.5 as u64,
        })
    }

    /// Check database health.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database health check failed")?;

        Ok(())
    }

    /// Create a thread, returning its id.
    pub async fn create_thread(&self, topic: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO threads (topic, created_at) VALUES (?, ?)")
            .bind(topic)
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .context("Failed to insert thread")?;

        Ok(result.last_insert_rowid())
    }

    /// Create a post in a thread, returning its id.
    pub async fn create_post(&self, thread_id: i64, poster_id: i64, text: &str) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO posts (thread_id, poster_id, text, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(thread_id)
        .bind(poster_id)
        .bind(text)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .context("Failed to insert post")?;

        Ok(result.last_insert_rowid())
    }
}

#[async_trait]
impl RecordStore for Storage {
    async fn question_by_hash(&self, question_hash: &B256) -> Result<Option<QuestionRecord>> {
        self.get_question_by_hash(question_hash).await
    }

    async fn question_by_id(&self, id: i64) -> Result<Option<QuestionRecord>> {
        self.get_question(id).await
    }

    async fn answer_by_hash(&self, answer_hash: &B256) -> Result<Option<AnswerRecord>> {
        self.get_answer_by_hash(answer_hash).await
    }

    async fn answer_by_id(&self, id: i64) -> Result<Option<AnswerRecord>> {
        self.get_answer(id).await
    }

    async fn get_or_create_user_by_wallet(&self, wallet: Address) -> Result<UserRecord> {
        self.upsert_user_wallet(wallet).await
    }

    async fn save_question_confirmation(
        &self,
        question_id: i64,
        confirmation: &QuestionConfirmation,
    ) -> Result<()> {
        self.write_question_confirmation(question_id, confirmation)
            .await
    }

    async fn save_answer_confirmation(
        &self,
        answer_id: i64,
        confirmation: &AnswerConfirmation,
    ) -> Result<()> {
        self.write_answer_confirmation(answer_id, confirmation).await
    }

    async fn save_selection_check(&self, answer_id: i64, matched: bool) -> Result<()> {
        self.write_selection_check(answer_id, matched).await
    }

    async fn apply_selection(
        &self,
        question: &QuestionRecord,
        answer: &AnswerRecord,
    ) -> Result<()> {
        self.write_selection(question, answer).await
    }
}

/// Database statistics.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DatabaseStats {
    /// Total number of users
    pub user_count: u64,

    /// Total number of questions
    pub question_count: u64,

    /// Total number of answers
    pub answer_count: u64,

    /// Questions claiming chain backing that are not yet confirmed
    pub pending_questions: u64,

    /// Answers claiming chain backing that are not yet confirmed
    pub pending_answers: u64,

    /// Provisional selections awaiting on-chain confirmation
    pub pending_selections: u64,
}

pub(crate) fn bytes_to_address(bytes: &[u8]) -> Result<Address> {
    if bytes.len() != 20 {
        anyhow::bail!("Stored address has {} bytes, expected 20", bytes.len());
    }
    Ok(Address::from_slice(bytes))
}

pub(crate) fn bytes_to_b256(bytes: &[u8]) -> Result<B256> {
    if bytes.len() != 32 {
        anyhow::bail!("Stored hash has {} bytes, expected 32", bytes.len());
    }
    Ok(B256::from_slice(bytes))
}
