use sqlx::PgPool;

use crate::error::{Result, StorageError};
use crate::models::{EliminationRecord, QualifiedManager};

pub struct TournamentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TournamentRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every manager ever qualified for the league, eliminated ones included.
    pub async fn list_qualified(&self, league_key: &str) -> Result<Vec<QualifiedManager>> {
        let managers = sqlx::query_as::<_, QualifiedManager>(
            r#"
            SELECT league_key, entry_id, manager_name, team_name,
                   qualification_rank, qualification_total, is_defending_champion,
                   eliminated_gw, final_rank
            FROM tournament_qualified
            WHERE league_key = $1
            ORDER BY qualification_rank
            "#,
        )
        .bind(league_key)
        .fetch_all(self.pool)
        .await?;

        Ok(managers)
    }

    pub async fn has_qualified(&self, league_key: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM tournament_qualified WHERE league_key = $1)",
        )
        .bind(league_key)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn elimination_exists(&self, league_key: &str, gameweek: i32) -> Result<bool> {
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
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn eliminations_for(
        &self,
        league_key: &str,
        gameweek: i32,
    ) -> Result<Vec<EliminationRecord>> {
        let rows = sqlx::query_as::<_, EliminationRecord>(
            r#"
            SELECT league_key, gameweek, entry_id, manager_name, team_name,
                   gameweek_points, gameweek_rank
            FROM tournament_eliminations
            WHERE league_key = $1 AND gameweek = $2
            ORDER BY gameweek_rank
            "#,
        )
        .bind(league_key)
        .bind(gameweek)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn insert_qualified(
        manager: &QualifiedManager,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tournament_qualified
                (league_key, entry_id, manager_name, team_name,
                 qualification_rank, qualification_total, is_defending_champion)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&manager.league_key)
        .bind(manager.entry_id)
        .bind(&manager.manager_name)
        .bind(&manager.team_name)
        .bind(manager.qualification_rank)
        .bind(manager.qualification_total)
        .bind(manager.is_defending_champion)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn insert_elimination(
        record: &EliminationRecord,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tournament_eliminations
                (league_key, gameweek, entry_id, manager_name, team_name,
                 gameweek_points, gameweek_rank)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&record.league_key)
        .bind(record.gameweek)
        .bind(record.entry_id)
        .bind(&record.manager_name)
        .bind(&record.team_name)
        .bind(record.gameweek_points)
        .bind(record.gameweek_rank)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Sets the elimination fields of an active qualifier; fails for anyone else.
    pub async fn mark_eliminated(
        league_key: &str,
        entry_id: i64,
        gameweek: i32,
        final_rank: i32,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE tournament_qualified
            SET eliminated_gw = $1,
                final_rank = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE league_key = $3 AND entry_id = $4 AND eliminated_gw IS NULL
            "#,
        )
        .bind(gameweek)
        .bind(final_rank)
        .bind(league_key)
        .bind(entry_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotActiveQualifier {
                league_key: league_key.to_string(),
                entry_id,
            });
        }

        Ok(())
    }
}
