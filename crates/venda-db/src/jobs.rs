//! Job queue repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use venda_core::{Error, Job, JobPayload, JobRepository, JobStatus, QueueStats, Result};

/// PostgreSQL implementation of [`JobRepository`].
///
/// Coordination between producers and workers happens entirely through the
/// `jobs` table; there is no broker and no listen/notify channel. Workers
/// poll, and the claim query below keeps concurrent pollers disjoint.
pub struct PgJobRepository {
    pool: Pool<Postgres>,
}

impl PgJobRepository {
    /// Create a new PgJobRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Convert JobStatus to string for the database.
    fn job_status_to_str(status: JobStatus) -> &'static str {
        match status {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Convert a string from the database to JobStatus.
    fn str_to_job_status(s: &str) -> JobStatus {
        match s {
            "pending" => JobStatus::Pending,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending, // fallback
        }
    }

    /// Parse a job row into a Job struct.
    fn parse_job_row(row: sqlx::postgres::PgRow) -> Job {
        Job {
            id: row.get("id"),
            topic: row.get("topic"),
            payload: row.get("payload"),
            status: Self::str_to_job_status(row.get("status")),
            error_message: row.get("error_message"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn enqueue(&self, payload: &JobPayload) -> Result<Uuid> {
        let job_id = Uuid::now_v7();
        let now = Utc::now();
        let topic = payload.topic().as_str();
        let body = payload.to_value()?;

        sqlx::query(
            "INSERT INTO jobs (id, topic, payload, status, created_at, updated_at)
             VALUES ($1, $2, $3, 'pending'::job_status, $4, $4)",
        )
        .bind(job_id)
        .bind(topic)
        .bind(&body)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(job_id)
    }

    async fn fetch_pending(&self, limit: i64) -> Result<Vec<Job>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let now = Utc::now();

        // FOR UPDATE SKIP LOCKED keeps concurrent pollers from selecting the
        // same rows; flipping them to processing in the same statement makes
        // each claim durable once the implicit transaction commits, instead
        // of only for the lifetime of the row lock. The outer SELECT restores
        // oldest-first order, which UPDATE ... RETURNING does not guarantee.
        let rows = sqlx::query(
            "WITH claimed AS (
                 SELECT id FROM jobs
                 WHERE status = 'pending'::job_status
                 ORDER BY created_at ASC
                 LIMIT $2
                 FOR UPDATE SKIP LOCKED
             ),
             updated AS (
                 UPDATE jobs
                 SET status = 'processing'::job_status, updated_at = $1
                 FROM claimed
                 WHERE jobs.id = claimed.id
                 RETURNING jobs.id, jobs.topic, jobs.payload, jobs.status,
                           jobs.error_message, jobs.created_at, jobs.updated_at
             )
             SELECT id, topic, payload, status::text AS status,
                    error_message, created_at, updated_at
             FROM updated
             ORDER BY created_at ASC",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_job_row).collect())
    }

    async fn update_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now();

        // COALESCE keeps the stored message when no new one is supplied, so
        // completing a job never erases failure history and repeating a
        // terminal write only advances updated_at.
        let result = sqlx::query(
            "UPDATE jobs
             SET status = $2::job_status, updated_at = $3,
                 error_message = COALESCE($4, error_message)
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(Self::job_status_to_str(status))
        .bind(now)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("job {job_id}")));
        }
        Ok(())
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query(
            "SELECT id, topic, payload, status::text AS status,
                    error_message, created_at, updated_at
             FROM jobs WHERE id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_job_row))
    }

    async fn pending_count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE status = 'pending'::job_status")
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(count)
    }

    async fn queue_stats(&self) -> Result<QueueStats> {
        let row = sqlx::query(
            "SELECT
                 COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                 COUNT(*) FILTER (WHERE status = 'processing') AS processing,
                 COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                 COUNT(*) FILTER (WHERE status = 'failed') AS failed,
                 COUNT(*) AS total
             FROM jobs",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(QueueStats {
            pending: row.get("pending"),
            processing: row.get("processing"),
            completed: row.get("completed"),
            failed: row.get("failed"),
            total: row.get("total"),
        })
    }
}
