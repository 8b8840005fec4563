//! User storage operations.

use super::{bytes_to_address, Storage, UserRecord};
use alloy::primitives::Address;
use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Storage {
    /// Create a user with a wallet, a username, or both.
    pub async fn create_user(
        &self,
        wallet: Option<Address>,
        username: Option<&str>,
    ) -> Result<UserRecord> {
        if wallet.is_none() && username.is_none() {
            anyhow::bail!("A user needs a wallet or a username");
        }

        let result = sqlx::query(
            r#"
            INSERT INTO users (wallet, username, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(wallet.as_ref().map(|w| w.as_slice()))
        .bind(username)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .context("Failed to insert user")?;

        Ok(UserRecord {
            id: result.last_insert_rowid(),
            wallet,
            username: username.map(str::to_string),
        })
    }

    /// Get a user by row id.
    pub async fn get_user(&self, id: i64) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT id, wallet, username FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::row_to_user_record(&row, "")).transpose()
    }

    /// Get a user by wallet address.
    pub async fn get_user_by_wallet(&self, wallet: &Address) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT id, wallet, username FROM users WHERE wallet = ?")
            .bind(wallet.as_slice())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::row_to_user_record(&row, "")).transpose()
    }

    /// Return the user owning `wallet`, inserting a wallet-only user if there is none.
    ///
    /// The insert ignores conflicts so that two concurrent confirmations for the same
    /// wallet end up sharing one row.
    pub async fn upsert_user_wallet(&self, wallet: Address) -> Result<UserRecord> {
        sqlx::query(
            r#"
            INSERT INTO users (wallet, username, created_at)
            VALUES (?, NULL, ?)
            ON CONFLICT(wallet) DO NOTHING
            "#,
        )
        .bind(wallet.as_slice())
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .context("Failed to upsert user")?;

        self.get_user_by_wallet(&wallet)
            .await?
            .with_context(|| format!("User for wallet {} vanished after upsert", wallet))
    }

    /// Convert a row to a user record, reading columns named `{prefix}id`, `{prefix}wallet`
    /// and `{prefix}username`.
    pub(crate) fn row_to_user_record(row: &SqliteRow, prefix: &str) -> Result<UserRecord> {
        let wallet: Option<Vec<u8>> = row.try_get(format!("{prefix}wallet").as_str())?;

        Ok(UserRecord {
            id: row.try_get(format!("{prefix}id").as_str())?,
            wallet: wallet.as_deref().map(bytes_to_address).transpose()?,
            username: row.try_get(format!("{prefix}username").as_str())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    async fn storage() -> (Storage, NamedTempFile) {
        let temp_db = NamedTempFile::new().unwrap();
        let storage = Storage::new_with_path(temp_db.path()).await.unwrap();
        storage.run_migrations().await.unwrap();
        (storage, temp_db)
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let (storage, _db) = storage().await;
        let wallet = Address::repeat_byte(0x11);

        let user = storage.create_user(Some(wallet), None).await.unwrap();
        let fetched = storage.get_user_by_wallet(&wallet).await.unwrap().unwrap();
        assert_eq!(fetched, user);
        assert_eq!(storage.get_user(user.id).await.unwrap().unwrap(), user);

        let named = storage.create_user(None, Some("alice")).await.unwrap();
        assert_eq!(named.wallet, None);
        assert_eq!(named.username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_create_user_requires_identity() {
        let (storage, _db) = storage().await;
        assert!(storage.create_user(None, None).await.is_err());
    }

    #[tokio::test]
    async fn test_upsert_user_wallet_is_idempotent() {
        let (storage, _db) = storage().await;
        let wallet = Address::repeat_byte(0x22);

        let first = storage.upsert_user_wallet(wallet).await.unwrap();
        let second = storage.upsert_user_wallet(wallet).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.wallet, Some(wallet));
        assert_eq!(storage.stats().await.unwrap().user_count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_wallet_rejected() {
        let (storage, _db) = storage().await;
        let wallet = Address::repeat_byte(0x33);

        storage.create_user(Some(wallet), None).await.unwrap();
        assert!(storage.create_user(Some(wallet), None).await.is_err());
    }
}
