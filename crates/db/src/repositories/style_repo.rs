//! Repository for the `styles` table.

use sqlx::PgPool;
use stylist_core::types::DbId;

use crate::models::style::{plan_sync, Style, StyleSyncSummary};

/// Column list for `styles` queries.
const COLUMNS: &str = "id, name, active, created_at";

/// Provides lookups and catalogue sync for transformation styles.
pub struct StyleRepo;

impl StyleRepo {
    /// Find a style by its unique name, active or not.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Style>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM styles WHERE name = $1");
        sqlx::query_as::<_, Style>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// List all styles ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Style>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM styles ORDER BY name");
        sqlx::query_as::<_, Style>(&query).fetch_all(pool).await
    }

    /// Align the catalogue with `available` inside one transaction.
    pub async fn sync(pool: &PgPool, available: &[String]) -> Result<StyleSyncSummary, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM styles FOR UPDATE");
        let current = sqlx::query_as::<_, Style>(&query)
            .fetch_all(&mut *tx)
            .await?;
        let plan = plan_sync(&current, available);

        if !plan.insert.is_empty() {
            sqlx::query(
                "INSERT INTO styles (name) SELECT * FROM UNNEST($1::TEXT[]) \
                 ON CONFLICT (name) DO NOTHING",
            )
            .bind(&plan.insert)
            .execute(&mut *tx)
            .await?;
        }
        Self::set_active(&mut tx, &plan.activate, true).await?;
        Self::set_active(&mut tx, &plan.deactivate, false).await?;

        tx.commit().await?;
        Ok(StyleSyncSummary::from(&plan))
    }

    async fn set_active(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        ids: &[DbId],
        active: bool,
    ) -> Result<(), sqlx::Error> {
        if ids.is_empty() {
            return Ok(());
        }
        sqlx::query("UPDATE styles SET active = $2 WHERE id = ANY($1)")
            .bind(ids)
            .bind(active)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
