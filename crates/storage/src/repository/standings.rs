use sqlx::PgPool;

use crate::error::Result;
use crate::models::StandingRecord;

const STANDING_COLUMNS: &str = r#"
    league_key, gameweek, participant_id, participant_name, rank,
    league_points, gameweek_points, total_points, opponent, result
"#;

pub struct StandingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StandingsRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All rows of a league table for one gameweek, best first.
    pub async fn for_gameweek(&self, league_key: &str, gameweek: i32) -> Result<Vec<StandingRecord>> {
        let sql = format!(
            "SELECT {STANDING_COLUMNS} FROM league_standings
             WHERE league_key = $1 AND gameweek = $2
             ORDER BY rank, participant_id"
        );

        let rows = sqlx::query_as::<_, StandingRecord>(&sql)
            .bind(league_key)
            .bind(gameweek)
            .fetch_all(self.pool)
            .await?;

        Ok(rows)
    }

    /// One participant's rows over an inclusive gameweek range, oldest first.
    pub async fn participant_history(
        &self,
        league_key: &str,
        participant_id: i64,
        from_gameweek: i32,
        to_gameweek: i32,
    ) -> Result<Vec<StandingRecord>> {
        let sql = format!(
            "SELECT {STANDING_COLUMNS} FROM league_standings
             WHERE league_key = $1 AND participant_id = $2
               AND gameweek BETWEEN $3 AND $4
             ORDER BY gameweek"
        );

        let rows = sqlx::query_as::<_, StandingRecord>(&sql)
            .bind(league_key)
            .bind(participant_id)
            .bind(from_gameweek)
            .bind(to_gameweek)
            .fetch_all(self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn upsert(
        record: &StandingRecord,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO league_standings
                (league_key, gameweek, participant_id, participant_name, rank,
                 league_points, gameweek_points, total_points, opponent, result)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (league_key, gameweek, participant_id)
            DO UPDATE SET
                participant_name = EXCLUDED.participant_name,
                rank = EXCLUDED.rank,
                league_points = EXCLUDED.league_points,
                gameweek_points = EXCLUDED.gameweek_points,
                total_points = EXCLUDED.total_points,
                opponent = EXCLUDED.opponent,
                result = EXCLUDED.result,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&record.league_key)
        .bind(record.gameweek)
        .bind(record.participant_id)
        .bind(&record.participant_name)
        .bind(record.rank)
        .bind(record.league_points)
        .bind(record.gameweek_points)
        .bind(record.total_points)
        .bind(&record.opponent)
        .bind(&record.result)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
