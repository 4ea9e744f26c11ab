use crate::domain::recommendation::{BreakoutRecommendation, NewRecommendation};
use crate::storage::WriteOutcome;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

type RecommendationRow = (
    Uuid,
    String,
    NaiveDate,
    String,
    f64,
    f64,
    Vec<String>,
    DateTime<Utc>,
);

const SELECT_COLUMNS: &str = "SELECT id, ticker, recommendation_date, value_proposition, confidence_score, \
     price_at_recommendation, key_catalysts, created_at FROM breakout_recommendations";

pub async fn find_recommendation(
    pool: &sqlx::PgPool,
    ticker: &str,
    date: NaiveDate,
) -> anyhow::Result<Option<BreakoutRecommendation>> {
    let row = sqlx::query_as::<_, RecommendationRow>(&format!(
        "{SELECT_COLUMNS} WHERE ticker = $1 AND recommendation_date = $2 LIMIT 1"
    ))
    .persistent(false)
    .bind(ticker)
    .bind(date)
    .fetch_optional(pool)
    .await
    .context("select breakout_recommendations failed")?;

    Ok(row.map(from_row))
}

/// The unique (ticker, recommendation_date) constraint makes concurrent runs safe: the loser's
/// insert affects zero rows.
pub async fn insert_recommendation(
    pool: &sqlx::PgPool,
    rec: &NewRecommendation,
) -> anyhow::Result<WriteOutcome> {
    let id = Uuid::new_v4();
    let res = sqlx::query(
        "INSERT INTO breakout_recommendations \
         (id, ticker, recommendation_date, value_proposition, confidence_score, price_at_recommendation, key_catalysts) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (ticker, recommendation_date) DO NOTHING",
    )
    .persistent(false)
    .bind(id)
    .bind(&rec.ticker)
    .bind(rec.recommendation_date)
    .bind(&rec.value_proposition)
    .bind(rec.confidence_score)
    .bind(rec.price_at_recommendation)
    .bind(&rec.key_catalysts)
    .execute(pool)
    .await
    .with_context(|| format!("insert breakout_recommendations failed for {}", rec.ticker))?;

    Ok(if res.rows_affected() == 0 {
        WriteOutcome::Skipped
    } else {
        WriteOutcome::Written(id)
    })
}

fn from_row(row: RecommendationRow) -> BreakoutRecommendation {
    let (
        id,
        ticker,
        recommendation_date,
        value_proposition,
        confidence_score,
        price_at_recommendation,
        key_catalysts,
        created_at,
    ) = row;
    BreakoutRecommendation {
        id,
        ticker,
        recommendation_date,
        value_proposition,
        confidence_score,
        price_at_recommendation,
        key_catalysts,
        created_at,
    }
}
