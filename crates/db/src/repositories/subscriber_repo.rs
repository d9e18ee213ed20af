//! Repository for the `subscribers` table.

use sqlx::PgPool;
use weather_core::auth_token::SubscriberTokens;
use weather_core::types::DbId;

use crate::models::subscriber::{CreateSubscriber, SubscriberRow};

/// Column list for `subscribers` queries.
const COLUMNS: &str =
    "id, email, router_id, confirmed, confirm_auth, unsubs_auth, pref_auth, sub_date";

/// Provides CRUD operations for subscribers.
pub struct SubscriberRepo;

impl SubscriberRepo {
    /// Create a subscriber with freshly generated authorization tokens.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSubscriber,
    ) -> Result<SubscriberRow, sqlx::Error> {
        let tokens = SubscriberTokens::generate();
        let query = format!(
            "INSERT INTO subscribers \
                (email, router_id, confirmed, confirm_auth, unsubs_auth, pref_auth) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SubscriberRow>(&query)
            .bind(&input.email)
            .bind(input.router_id)
            .bind(input.confirmed)
            .bind(&tokens.confirm_auth)
            .bind(&tokens.unsubs_auth)
            .bind(&tokens.pref_auth)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SubscriberRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subscribers WHERE id = $1");
        sqlx::query_as::<_, SubscriberRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List subscribers who followed their confirmation link.
    pub async fn list_confirmed(pool: &PgPool) -> Result<Vec<SubscriberRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subscribers WHERE confirmed ORDER BY id");
        sqlx::query_as::<_, SubscriberRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Confirm the subscriber holding `confirm_auth`.
    ///
    /// Returns `true` if an unconfirmed subscriber was found and updated.
    pub async fn confirm(pool: &PgPool, confirm_auth: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE subscribers SET confirmed = true \
             WHERE confirm_auth = $1 AND confirmed = false",
        )
        .bind(confirm_auth)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the subscriber holding `unsubs_auth` along with their
    /// subscriptions.
    pub async fn unsubscribe(pool: &PgPool, unsubs_auth: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subscribers WHERE unsubs_auth = $1")
            .bind(unsubs_auth)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
