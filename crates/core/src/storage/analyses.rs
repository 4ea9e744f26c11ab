use crate::domain::analysis::{NewStockAnalysis, NewsRecord, SocialPostRecord, StockAnalysis};
use crate::storage::WriteOutcome;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

type AnalysisRow = (
    Uuid,
    String,
    NaiveDate,
    f64,
    f64,
    f64,
    i32,
    bool,
    String,
    DateTime<Utc>,
);

const SELECT_COLUMNS: &str = "SELECT id, ticker, analysis_date, sentiment_score, news_sentiment, \
     reddit_sentiment, mention_count, is_breakout, summary, created_at FROM stock_analyses";

pub async fn find_analysis(
    pool: &sqlx::PgPool,
    ticker: &str,
    date: NaiveDate,
) -> anyhow::Result<Option<StockAnalysis>> {
    let row = sqlx::query_as::<_, AnalysisRow>(&format!(
        "{SELECT_COLUMNS} WHERE ticker = $1 AND analysis_date = $2 LIMIT 1"
    ))
    .persistent(false)
    .bind(ticker)
    .bind(date)
    .fetch_optional(pool)
    .await
    .context("select stock_analyses failed")?;

    Ok(row.map(from_row))
}

pub async fn latest_analysis(
    pool: &sqlx::PgPool,
    ticker: &str,
) -> anyhow::Result<Option<StockAnalysis>> {
    let row = sqlx::query_as::<_, AnalysisRow>(&format!(
        "{SELECT_COLUMNS} WHERE ticker = $1 ORDER BY analysis_date DESC LIMIT 1"
    ))
    .persistent(false)
    .bind(ticker)
    .fetch_optional(pool)
    .await
    .context("select latest stock_analyses failed")?;

    Ok(row.map(from_row))
}

/// Writes the analysis and its child rows in one transaction. A conflicting (ticker, date) row
/// short-circuits before any child row is written.
pub async fn insert_analysis(
    pool: &sqlx::PgPool,
    analysis: &NewStockAnalysis,
) -> anyhow::Result<WriteOutcome> {
    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let id = Uuid::new_v4();
    let res = sqlx::query(
        "INSERT INTO stock_analyses \
         (id, ticker, analysis_date, sentiment_score, news_sentiment, reddit_sentiment, mention_count, is_breakout, summary) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (ticker, analysis_date) DO NOTHING",
    )
    .persistent(false)
    .bind(id)
    .bind(&analysis.ticker)
    .bind(analysis.analysis_date)
    .bind(analysis.sentiment_score)
    .bind(analysis.news_sentiment)
    .bind(analysis.reddit_sentiment)
    .bind(analysis.mention_count)
    .bind(analysis.is_breakout)
    .bind(&analysis.summary)
    .execute(&mut *tx)
    .await
    .with_context(|| format!("insert stock_analyses failed for {}", analysis.ticker))?;

    if res.rows_affected() == 0 {
        tx.rollback().await.context("rollback transaction failed")?;
        return Ok(WriteOutcome::Skipped);
    }

    for news in &analysis.news {
        insert_news(&mut tx, id, news).await?;
    }
    for post in &analysis.posts {
        insert_post(&mut tx, id, post).await?;
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(WriteOutcome::Written(id))
}

async fn insert_news(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    analysis_id: Uuid,
    news: &NewsRecord,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO stock_news (analysis_id, title, url, source, published_at, sentiment_score) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .persistent(false)
    .bind(analysis_id)
    .bind(&news.title)
    .bind(&news.url)
    .bind(&news.source)
    .bind(news.published_at)
    .bind(news.sentiment_score)
    .execute(&mut **tx)
    .await
    .context("insert stock_news failed")?;
    Ok(())
}

async fn insert_post(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    analysis_id: Uuid,
    post: &SocialPostRecord,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO stock_reddit_posts (analysis_id, title, url, subreddit, posted_at, sentiment_score, upvote_ratio) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .persistent(false)
    .bind(analysis_id)
    .bind(&post.title)
    .bind(&post.url)
    .bind(&post.channel)
    .bind(post.posted_at)
    .bind(post.sentiment_score)
    .bind(post.upvote_ratio)
    .execute(&mut **tx)
    .await
    .context("insert stock_reddit_posts failed")?;
    Ok(())
}

fn from_row(row: AnalysisRow) -> StockAnalysis {
    let (
        id,
        ticker,
        analysis_date,
        sentiment_score,
        news_sentiment,
        reddit_sentiment,
        mention_count,
        is_breakout,
        summary,
        created_at,
    ) = row;
    StockAnalysis {
        id,
        ticker,
        analysis_date,
        sentiment_score,
        news_sentiment,
        reddit_sentiment,
        mention_count,
        is_breakout,
        summary,
        created_at,
    }
}
