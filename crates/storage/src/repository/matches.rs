use sqlx::PgPool;

use crate::error::Result;
use crate::models::MatchRecord;

pub struct MatchRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MatchRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn for_gameweek(&self, league_key: &str, gameweek: i32) -> Result<Vec<MatchRecord>> {
        let rows = sqlx::query_as::<_, MatchRecord>(
            r#"
            SELECT league_key, gameweek,
                   participant_1_id, participant_1_name, participant_1_points,
                   participant_2_id, participant_2_name, participant_2_points,
                   winner
            FROM league_matches
            WHERE league_key = $1 AND gameweek = $2
            ORDER BY participant_1_id, participant_2_id
            "#,
        )
        .bind(league_key)
        .bind(gameweek)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn upsert(
        record: &MatchRecord,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO league_matches
                (league_key, gameweek,
                 participant_1_id, participant_1_name, participant_1_points,
                 participant_2_id, participant_2_name, participant_2_points,
                 winner)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (league_key, gameweek, participant_1_id, participant_2_id)
            DO UPDATE SET
                participant_1_name = EXCLUDED.participant_1_name,
                participant_1_points = EXCLUDED.participant_1_points,
                participant_2_name = EXCLUDED.participant_2_name,
                participant_2_points = EXCLUDED.participant_2_points,
                winner = EXCLUDED.winner
            "#,
        )
        .bind(&record.league_key)
        .bind(record.gameweek)
        .bind(record.participant_1_id)
        .bind(&record.participant_1_name)
        .bind(record.participant_1_points)
        .bind(record.participant_2_id)
        .bind(&record.participant_2_name)
        .bind(record.participant_2_points)
        .bind(record.winner)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
