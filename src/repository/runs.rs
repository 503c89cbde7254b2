//! Audit run repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::models::{AuditRun, RunStatus, RunType};
use crate::schema::audit_runs;

use super::models::{AuditRunRecord, NewAuditRun};
use super::pool::{DbError, SqlitePool};

#[derive(Clone)]
pub struct AuditRunRepository {
    pool: SqlitePool,
}

impl AuditRunRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a new run in the `running` state and return its id.
    pub async fn start(
        &self,
        run_type: RunType,
        total_pages: i32,
        triggered_by: Option<&str>,
    ) -> Result<String, DbError> {
        let id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now().to_rfc3339();
        let new_run = NewAuditRun {
            id: &id,
            run_type: run_type.as_str(),
            status: RunStatus::Running.as_str(),
            total_pages,
            errors: "[]",
            triggered_by,
            started_at: &started_at,
        };

        let mut conn = self.pool.get().await?;
        diesel::insert_into(audit_runs::table)
            .values(&new_run)
            .execute(&mut conn)
            .await?;
        Ok(id)
    }

    /// Update counters on a running job.
    pub async fn update_progress(
        &self,
        id: &str,
        processed: i32,
        fixed: i32,
        skipped: i32,
    ) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        diesel::update(audit_runs::table.find(id))
            .set((
                audit_runs::processed_pages.eq(processed),
                audit_runs::fixed_pages.eq(fixed),
                audit_runs::skipped_pages.eq(skipped),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Close a run with its final state and counters.
    pub async fn finish(&self, run: &AuditRun) -> Result<(), DbError> {
        let errors =
            serde_json::to_string(&run.errors).unwrap_or_else(|_| "[]".to_string());
        let summary = run
            .summary
            .as_ref()
            .and_then(|s| serde_json::to_string(s).ok());
        let completed_at = Utc::now().to_rfc3339();

        let mut conn = self.pool.get().await?;
        diesel::update(audit_runs::table.find(&run.id))
            .set((
                audit_runs::status.eq(run.status.as_str()),
                audit_runs::total_pages.eq(run.total_pages),
                audit_runs::processed_pages.eq(run.processed_pages),
                audit_runs::fixed_pages.eq(run.fixed_pages),
                audit_runs::skipped_pages.eq(run.skipped_pages),
                audit_runs::error_count.eq(run.error_count),
                audit_runs::errors.eq(&errors),
                audit_runs::summary.eq(&summary),
                audit_runs::completed_at.eq(&completed_at),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Get a run by id.
    pub async fn get(&self, id: &str) -> Result<Option<AuditRun>, DbError> {
        let mut conn = self.pool.get().await?;
        let record: Option<AuditRunRecord> = audit_runs::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()?;
        Ok(record.map(AuditRun::from))
    }

    /// Most recently started runs.
    pub async fn recent(&self, limit: i64) -> Result<Vec<AuditRun>, DbError> {
        let mut conn = self.pool.get().await?;
        let records: Vec<AuditRunRecord> = audit_runs::table
            .order(audit_runs::started_at.desc())
            .limit(limit)
            .load(&mut conn)
            .await?;
        Ok(records.into_iter().map(AuditRun::from).collect())
    }

    /// The latest run still in the `running` state, if any.
    pub async fn current(&self) -> Result<Option<AuditRun>, DbError> {
        let mut conn = self.pool.get().await?;
        let record: Option<AuditRunRecord> = audit_runs::table
            .filter(audit_runs::status.eq(RunStatus::Running.as_str()))
            .order(audit_runs::started_at.desc())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(record.map(AuditRun::from))
    }
}
