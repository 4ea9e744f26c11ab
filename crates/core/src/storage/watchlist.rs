use anyhow::Context;

pub async fn list_tickers(pool: &sqlx::PgPool) -> anyhow::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT DISTINCT ticker FROM watchlist ORDER BY ticker")
        .persistent(false)
        .fetch_all(pool)
        .await
        .context("select watchlist failed")?;
    Ok(rows.into_iter().map(|(t,)| t).collect())
}
