use log::{error, info, warn};

use crate::config::TransactionMode;
use crate::error::LoadError;
use crate::session::SqlSession;
use crate::store::BatchFileStore;
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub applied: usize,
    pub skipped: usize,
    pub last_applied: Option<u64>,
}

/// Runs the table DDL and the stored batches over one session.
pub struct LoadExecutor<'c, S> {
    session: &'c mut S,
    mode: TransactionMode,
}

impl<'c, S: SqlSession> LoadExecutor<'c, S> {
    pub fn new(session: &'c mut S, mode: TransactionMode) -> Self {
        Self { session, mode }
    }

    pub async fn create_table(&mut self, ddl: &str) -> Result<()> {
        info!("Creating table...");
        self.session.begin().await?;
        match self.session.execute(ddl).await {
            Ok(_) => {
                self.session.commit().await?;
                info!("Created table");
                Ok(())
            }
            Err(e) => {
                self.rollback_after_failure().await;
                error!("Error creating table: {}", e);
                Err(LoadError::TableCreation {
                    source: Box::new(e),
                })
            }
        }
    }

    /// Executes every stored batch in sequence order, skipping those at or
    /// below `resume_after`. Stops at the first failing batch.
    pub async fn insert_all(
        &mut self,
        store: &BatchFileStore,
        resume_after: Option<u64>,
    ) -> Result<InsertSummary> {
        let units = store.list_in_order()?;
        let total = units.len();
        let mut summary = InsertSummary {
            last_applied: resume_after,
            ..Default::default()
        };

        if self.mode == TransactionMode::AllOrNothing {
            self.session.begin().await?;
        }
        for (i, unit) in units.iter().enumerate() {
            if resume_after.is_some_and(|done| unit.sequence <= done) {
                summary.skipped += 1;
                continue;
            }
            let sql = store.read(unit)?;
            if let Err(e) = self.apply(&sql).await {
                self.rollback_after_failure().await;
                error!("Error inserting batch {}: {}", unit.sequence, e);
                let last_applied = match self.mode {
                    TransactionMode::PerBatch => summary.last_applied,
                    TransactionMode::AllOrNothing => resume_after,
                };
                return Err(LoadError::BatchInsertion {
                    sequence: unit.sequence,
                    last_applied,
                    source: Box::new(e),
                });
            }
            summary.applied += 1;
            summary.last_applied = Some(unit.sequence);
            info!("Inserted batch {}/{}", i + 1, total);
        }
        if self.mode == TransactionMode::AllOrNothing {
            self.session.commit().await?;
        }

        info!(
            "Inserted data: {} batches applied, {} skipped",
            summary.applied, summary.skipped
        );
        Ok(summary)
    }

    /// A failed rollback is logged, never returned in place of the statement error.
    async fn rollback_after_failure(&mut self) {
        if let Err(e) = self.session.rollback().await {
            warn!("Rollback failed: {}", e);
        }
    }

    async fn apply(&mut self, sql: &str) -> Result<()> {
        match self.mode {
            TransactionMode::PerBatch => {
                self.session.begin().await?;
                self.session.execute(sql).await?;
                self.session.commit().await
            }
            TransactionMode::AllOrNothing => self.session.execute(sql).await.map(drop),
        }
    }
}
