use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use sqlx::pool::PoolConnection;
use sqlx::Postgres;

// Advisory locks are scoped to the Postgres session. This is used as a best-effort guard against
// concurrent runs of the same daily job.
const LOCK_NAMESPACE: i64 = 0x4649_4E54_0000; // "FINT" namespace.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyJob {
    Breakouts,
    Analysis,
}

impl DailyJob {
    fn discriminant(&self) -> i64 {
        match self {
            Self::Breakouts => 1 << 24,
            Self::Analysis => 2 << 24,
        }
    }
}

fn lock_key(job: DailyJob, as_of_date: NaiveDate) -> i64 {
    LOCK_NAMESPACE ^ job.discriminant() ^ i64::from(as_of_date.num_days_from_ce())
}

/// A held advisory lock. The lock lives on one pooled connection, so it is taken and released
/// on the same Postgres session.
pub struct JobLock {
    conn: PoolConnection<Postgres>,
    key: i64,
}

impl JobLock {
    /// `None` when another session holds the lock for this job and date.
    pub async fn try_acquire(
        pool: &sqlx::PgPool,
        job: DailyJob,
        as_of_date: NaiveDate,
    ) -> anyhow::Result<Option<Self>> {
        let key = lock_key(job, as_of_date);
        let mut conn = pool
            .acquire()
            .await
            .context("failed to check out a connection for the advisory lock")?;
        let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
            .persistent(false)
            .bind(key)
            .fetch_one(&mut *conn)
            .await
            .with_context(|| format!("failed to acquire advisory lock (key={key})"))?;
        Ok(acquired.0.then_some(Self { conn, key }))
    }

    pub async fn release(mut self) -> anyhow::Result<()> {
        let key = self.key;
        let released: (bool,) = sqlx::query_as("SELECT pg_advisory_unlock($1)")
            .persistent(false)
            .bind(key)
            .fetch_one(&mut *self.conn)
            .await
            .with_context(|| format!("failed to release advisory lock (key={key})"))?;
        anyhow::ensure!(released.0, "advisory lock (key={key}) was not held by this session");
        Ok(())
    }
}
