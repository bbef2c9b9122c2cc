//! Atomic vote and report reconciliation.
//!
//! Each operation runs as a single Postgres transaction: the interaction row
//! is upserted first, which takes a row lock on the (user, deal) pair and
//! linearizes concurrent calls from the same user, then the paired counter
//! deltas land on `deals` before commit. Partial application — a counter
//! moved without the interaction record, or the reverse — cannot happen.

use chollo_core::{interaction_id, VoteDirection};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `user_interactions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InteractionRow {
    pub id: String,
    pub user_id: String,
    pub deal_id: Uuid,
    pub vote: Option<String>,
    pub reported_unavailable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InteractionRow {
    /// The stored vote as a typed direction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Corrupt`] if the column holds anything but
    /// `up`/`down`/NULL (the schema CHECK should make that impossible).
    pub fn vote_direction(&self) -> Result<Option<VoteDirection>, DbError> {
        parse_vote(self.vote.as_deref())
    }
}

fn parse_vote(raw: Option<&str>) -> Result<Option<VoteDirection>, DbError> {
    raw.map(|v| v.parse::<VoteDirection>())
        .transpose()
        .map_err(|e| DbError::Corrupt(e.to_string()))
}

/// Result of a vote transaction: the user's resulting vote and the deal's
/// new counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub vote: Option<VoteDirection>,
    pub upvotes: i32,
    pub downvotes: i32,
}

/// Result of a report/unreport transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOutcome {
    pub reported: bool,
    pub unavailable_reports: i32,
}

/// Casts, swaps or retracts a vote for `(user_id, deal_id)`.
///
/// Same target as the current vote retracts it; the opposite target swaps
/// both counters; no prior vote increments the target counter. Committed as
/// one transaction with the interaction row written alongside the counters.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the deal does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn cast_vote(
    pool: &PgPool,
    user_id: &str,
    deal_id: Uuid,
    target: VoteDirection,
) -> Result<VoteOutcome, DbError> {
    let mut tx = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, i32>("SELECT 1 FROM deals WHERE id = $1")
        .bind(deal_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(DbError::NotFound);
    }

    let id = interaction_id(user_id, deal_id);

    // The upsert takes the row lock; RETURNING vote yields the prior state
    // because the conflict arm never touches the vote column.
    let prior_raw: Option<String> = sqlx::query_scalar(
        "INSERT INTO user_interactions (id, user_id, deal_id) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (id) DO UPDATE SET updated_at = NOW() \
         RETURNING vote",
    )
    .bind(&id)
    .bind(user_id)
    .bind(deal_id)
    .fetch_one(&mut *tx)
    .await?;
    let prior = parse_vote(prior_raw.as_deref())?;

    let (new_vote, up_delta, down_delta) = vote_transition(prior, target);

    // GREATEST guards rows whose counters were zeroed out from under an
    // existing vote (legacy backfills); a paired decrement never goes below 0
    // on consistent data.
    let (upvotes, downvotes): (i32, i32) = sqlx::query_as(
        "UPDATE deals \
         SET upvotes = GREATEST(upvotes + $2, 0), \
             downvotes = GREATEST(downvotes + $3, 0) \
         WHERE id = $1 \
         RETURNING upvotes, downvotes",
    )
    .bind(deal_id)
    .bind(up_delta)
    .bind(down_delta)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE user_interactions SET vote = $2, updated_at = NOW() WHERE id = $1")
        .bind(&id)
        .bind(new_vote.map(VoteDirection::as_str))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(VoteOutcome {
        vote: new_vote,
        upvotes,
        downvotes,
    })
}

/// The per-pair vote state machine: `(prior, target) -> (new, Δup, Δdown)`.
fn vote_transition(
    prior: Option<VoteDirection>,
    target: VoteDirection,
) -> (Option<VoteDirection>, i32, i32) {
    match (prior, target) {
        (Some(VoteDirection::Up), VoteDirection::Up) => (None, -1, 0),
        (Some(VoteDirection::Down), VoteDirection::Down) => (None, 0, -1),
        (Some(VoteDirection::Down), VoteDirection::Up) => (Some(VoteDirection::Up), 1, -1),
        (Some(VoteDirection::Up), VoteDirection::Down) => (Some(VoteDirection::Down), -1, 1),
        (None, VoteDirection::Up) => (Some(VoteDirection::Up), 1, 0),
        (None, VoteDirection::Down) => (Some(VoteDirection::Down), 0, 1),
    }
}

/// Sets or clears the unavailable report for `(user_id, deal_id)`.
///
/// A no-op when the flag already matches `reported`; otherwise the flag flips
/// and `unavailable_reports` moves by one, atomically.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the deal does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn set_report(
    pool: &PgPool,
    user_id: &str,
    deal_id: Uuid,
    reported: bool,
) -> Result<ReportOutcome, DbError> {
    let mut tx = pool.begin().await?;

    let current_reports = sqlx::query_scalar::<_, i32>(
        "SELECT unavailable_reports FROM deals WHERE id = $1",
    )
    .bind(deal_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(current_reports) = current_reports else {
        return Err(DbError::NotFound);
    };

    let id = interaction_id(user_id, deal_id);

    let prior_reported: bool = sqlx::query_scalar(
        "INSERT INTO user_interactions (id, user_id, deal_id) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (id) DO UPDATE SET updated_at = NOW() \
         RETURNING reported_unavailable",
    )
    .bind(&id)
    .bind(user_id)
    .bind(deal_id)
    .fetch_one(&mut *tx)
    .await?;

    if prior_reported == reported {
        tx.commit().await?;
        return Ok(ReportOutcome {
            reported,
            unavailable_reports: current_reports,
        });
    }

    let delta: i32 = if reported { 1 } else { -1 };
    let unavailable_reports: i32 = sqlx::query_scalar(
        "UPDATE deals \
         SET unavailable_reports = GREATEST(unavailable_reports + $2, 0) \
         WHERE id = $1 \
         RETURNING unavailable_reports",
    )
    .bind(deal_id)
    .bind(delta)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE user_interactions SET reported_unavailable = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(&id)
    .bind(reported)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(ReportOutcome {
        reported,
        unavailable_reports,
    })
}

/// Returns the interaction record for a pair, or `None` if the user has
/// never touched the deal.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_interaction(
    pool: &PgPool,
    user_id: &str,
    deal_id: Uuid,
) -> Result<Option<InteractionRow>, DbError> {
    let row = sqlx::query_as::<_, InteractionRow>(
        "SELECT id, user_id, deal_id, vote, reported_unavailable, created_at, updated_at \
         FROM user_interactions \
         WHERE id = $1",
    )
    .bind(interaction_id(user_id, deal_id))
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

#[cfg(test)]
#[path = "interactions_test.rs"]
mod tests;
