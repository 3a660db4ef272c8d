//! Multi-row writes that must land together or not at all.

use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{EliminationRecord, MatchRecord, QualifiedManager, StandingRecord};
use crate::repository::matches::MatchRepository;
use crate::repository::standings::StandingsRepository;
use crate::repository::tournament::TournamentRepository;

/// Upserts a whole gameweek of standings and match results in one transaction.
pub async fn commit_period(
    pool: &PgPool,
    league_key: &str,
    gameweek: i32,
    standings: &[StandingRecord],
    matches: &[MatchRecord],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    for record in standings {
        StandingsRepository::upsert(record, &mut tx).await?;
    }
    for record in matches {
        MatchRepository::upsert(record, &mut tx).await?;
    }

    tx.commit().await?;

    info!(
        league = league_key,
        gameweek,
        standings = standings.len(),
        matches = matches.len(),
        "Committed gameweek"
    );

    Ok(())
}

/// Serializes tournament writers for one league until the transaction ends.
async fn lock_league(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    league_key: &str,
) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(league_key)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Seeds the qualified registry. Returns `false` without writing if the league already has one.
pub async fn seed_qualified(
    pool: &PgPool,
    league_key: &str,
    managers: &[QualifiedManager],
) -> Result<bool> {
    let mut tx = pool.begin().await?;
    lock_league(&mut tx, league_key).await?;

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM tournament_qualified WHERE league_key = $1)",
    )
    .bind(league_key)
    .fetch_one(&mut *tx)
    .await?;

    if exists {
        debug!(league = league_key, "Qualified registry already seeded");
        tx.rollback().await?;
        return Ok(false);
    }

    for manager in managers {
        if let Err(e) = TournamentRepository::insert_qualified(manager, &mut tx).await {
            if e.is_unique_violation() {
                debug!(league = league_key, "Qualified registry seeded concurrently");
                tx.rollback().await?;
                return Ok(false);
            }
            return Err(e);
        }
    }

    tx.commit().await?;
    info!(league = league_key, count = managers.len(), "Seeded qualified registry");

    Ok(true)
}

/// Writes elimination results and flags the registry. Returns `false` if the gameweek was
/// already finalized.
pub async fn finalize_elimination(
    pool: &PgPool,
    league_key: &str,
    gameweek: i32,
    eliminated: &[EliminationRecord],
) -> Result<bool> {
    let mut tx = pool.begin().await?;
    lock_league(&mut tx, league_key).await?;

    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM tournament_eliminations
            WHERE league_key = $1 AND gameweek = $2
        )
        "#,
    )
    .bind(league_key)
    .bind(gameweek)
    .fetch_one(&mut *tx)
    .await?;

    if exists {
        debug!(league = league_key, gameweek, "Elimination already finalized");
        tx.rollback().await?;
        return Ok(false);
    }

    for record in eliminated {
        if let Err(e) = TournamentRepository::insert_elimination(record, &mut tx).await {
            if e.is_unique_violation() {
                debug!(league = league_key, gameweek, "Elimination finalized concurrently");
                tx.rollback().await?;
                return Ok(false);
            }
            return Err(e);
        }
        TournamentRepository::mark_eliminated(
            league_key,
            record.entry_id,
            gameweek,
            record.gameweek_rank,
            &mut tx,
        )
        .await?;
    }

    tx.commit().await?;
    info!(
        league = league_key,
        gameweek,
        eliminated = eliminated.len(),
        "Finalized elimination"
    );

    Ok(true)
}
