//! Postgres `ReviewRepo` (feature `db-postgres`).
//!
//! Maps the relational model back to domain types by hand; replies live in
//! a JSONB column because they are only ever addressed through their
//! parent review. Ordering and pagination must match the in-memory
//! adapter: `created_at DESC, id ASC`, 1-indexed offset pages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use domains::query::total_pages;
use domains::visibility::next_status;
use domains::{
    DomainError, NewReview, PageRequest, Reply, Result, Review, ReviewFilter, ReviewPage,
    ReviewPatch, ReviewRepo, ReviewStatus, VisibilityAction,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS reviews (
        id              UUID PRIMARY KEY,
        author_id       UUID NOT NULL,
        author_name     TEXT NOT NULL,
        target_type     TEXT NOT NULL,
        target_key      TEXT NOT NULL,
        target_name     TEXT NOT NULL,
        rating          INT NOT NULL,
        title           TEXT,
        comment         TEXT NOT NULL,
        status          TEXT NOT NULL,
        sequence_number BIGINT GENERATED ALWAYS AS IDENTITY,
        created_at      TIMESTAMPTZ NOT NULL,
        updated_at      TIMESTAMPTZ NOT NULL,
        replies         JSONB NOT NULL DEFAULT '[]'::jsonb
    )",
    "CREATE INDEX IF NOT EXISTS reviews_target_key_idx ON reviews (target_key)",
    "CREATE INDEX IF NOT EXISTS reviews_author_id_idx ON reviews (author_id)",
];

pub struct PostgresReviewRepo {
    pool: PgPool,
}

impl PostgresReviewRepo {
    /// Connect and make sure the schema exists.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(DomainError::storage)?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        tracing::info!("postgres review store ready");
        Ok(repo)
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(DomainError::storage)?;
        }
        Ok(())
    }
}

fn row_to_review(row: &PgRow) -> Result<Review> {
    let status: String = row.try_get("status").map_err(DomainError::storage)?;
    let target_type: String = row.try_get("target_type").map_err(DomainError::storage)?;
    let replies: serde_json::Value = row.try_get("replies").map_err(DomainError::storage)?;
    let sequence_number: i64 = row
        .try_get("sequence_number")
        .map_err(DomainError::storage)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(DomainError::storage)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(DomainError::storage)?;

    Ok(Review {
        id: row.try_get("id").map_err(DomainError::storage)?,
        author_id: row.try_get("author_id").map_err(DomainError::storage)?,
        author_name: row.try_get("author_name").map_err(DomainError::storage)?,
        target_type: target_type.parse().map_err(DomainError::Storage)?,
        target_key: row.try_get("target_key").map_err(DomainError::storage)?,
        target_name: row.try_get("target_name").map_err(DomainError::storage)?,
        rating: row.try_get("rating").map_err(DomainError::storage)?,
        title: row.try_get("title").map_err(DomainError::storage)?,
        comment: row.try_get("comment").map_err(DomainError::storage)?,
        status: status.parse().map_err(DomainError::Storage)?,
        sequence_number: sequence_number as u64,
        created_at,
        updated_at,
        replies: serde_json::from_value(replies).map_err(DomainError::storage)?,
    })
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ReviewFilter) {
    if let Some(owner_id) = filter.owner_id {
        builder.push(" AND author_id = ").push_bind(owner_id);
    }
    if let Some(target_key) = &filter.target_key {
        builder.push(" AND target_key = ").push_bind(target_key.clone());
    }
    if let Some(target_type) = filter.target_type {
        builder
            .push(" AND target_type = ")
            .push_bind(target_type.to_string());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.to_string());
    }
    if let Some(needle) = &filter.search {
        let pattern = format!("%{needle}%");
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR comment ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR author_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR id::text ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl ReviewRepo for PostgresReviewRepo {
    async fn create(&self, new: NewReview) -> Result<Review> {
        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO reviews \
               (id, author_id, author_name, target_type, target_key, target_name, \
                rating, title, comment, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(new.author_id)
        .bind(new.author_name)
        .bind(new.target_type.to_string())
        .bind(new.target_key)
        .bind(new.target_name)
        .bind(new.rating)
        .bind(new.title)
        .bind(new.comment)
        .bind(ReviewStatus::Public.to_string())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(DomainError::storage)?;
        row_to_review(&row)
    }

    async fn get(&self, id: Uuid) -> Result<Review> {
        let row = sqlx::query("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DomainError::storage)?
            .ok_or(DomainError::NotFound(id))?;
        row_to_review(&row)
    }

    async fn update_fields(&self, id: Uuid, patch: ReviewPatch) -> Result<Review> {
        let row = sqlx::query(
            "UPDATE reviews SET \
               rating  = COALESCE($2, rating), \
               title   = CASE WHEN $3::text IS NULL THEN title \
                              WHEN $3 = '' THEN NULL \
                              ELSE $3 END, \
               comment = COALESCE($4, comment), \
               updated_at = $5 \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(id)
        .bind(patch.rating)
        .bind(patch.title)
        .bind(patch.comment)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?
        .ok_or(DomainError::NotFound(id))?;
        row_to_review(&row)
    }

    async fn apply_transition(&self, id: Uuid, action: VisibilityAction) -> Result<Review> {
        // Check-and-set: the UPDATE only lands if the status is still the
        // one the edge was computed from. A miss is re-read to distinguish
        // a vanished row from a lost race.
        let current = self.get(id).await?;
        let next = next_status(current.status, action).ok_or(DomainError::InvalidTransition {
            from: current.status,
            action,
        })?;

        let row = sqlx::query(
            "UPDATE reviews SET status = $2, updated_at = $3 \
             WHERE id = $1 AND status = $4 \
             RETURNING *",
        )
        .bind(id)
        .bind(next.to_string())
        .bind(Utc::now())
        .bind(current.status.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        match row {
            Some(row) => row_to_review(&row),
            None => {
                let fresh = self.get(id).await?;
                Err(DomainError::InvalidTransition {
                    from: fresh.status,
                    action,
                })
            }
        }
    }

    async fn append_reply(&self, id: Uuid, reply: Reply) -> Result<Review> {
        let appended = serde_json::to_value([reply]).map_err(DomainError::storage)?;
        let row = sqlx::query(
            "UPDATE reviews SET replies = replies || $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(appended)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?
        .ok_or(DomainError::NotFound(id))?;
        row_to_review(&row)
    }

    async fn list(&self, filter: ReviewFilter, page: PageRequest) -> Result<ReviewPage> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM reviews WHERE TRUE");
        push_filters(&mut count_builder, &filter);
        let total_count: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DomainError::storage)?;

        let mut builder = QueryBuilder::new("SELECT * FROM reviews WHERE TRUE");
        push_filters(&mut builder, &filter);
        builder
            .push(" ORDER BY created_at DESC, id ASC LIMIT ")
            .push_bind(page.page_size() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(DomainError::storage)?;

        Ok(ReviewPage {
            items: rows.iter().map(row_to_review).collect::<Result<_>>()?,
            page: page.page(),
            total_pages: total_pages(total_count as u64, page.page_size()),
            total_count: total_count as u64,
        })
    }

    async fn average_rating(&self, target_key: &str) -> Result<f64> {
        sqlx::query_scalar(
            "SELECT COALESCE(AVG(rating::float8), 0::float8) FROM reviews \
             WHERE target_key = $1 AND status = 'public'",
        )
        .bind(target_key)
        .fetch_one(&self.pool)
        .await
        .map_err(DomainError::storage)
    }
}
