//! The migration pipeline: credential → extract → rewrite → apply.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::apply::{ApplyOrchestrator, ApplyOutcome, ApplyStrategy};
use crate::credential::CredentialProvider;
use crate::error::{Result, SyncError};
use crate::extract::SpecExtractor;
use crate::gateway::ConfigGateway;
use crate::model::{Category, MigrationRequest, SpecObject};
use crate::rewrite::rewrite_specs;

/// Ceiling on a whole migration.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    #[serde(rename = "type")]
    pub category: Category,
    pub count: usize,
}

/// What one migration moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    #[serde(rename = "projectId")]
    pub project_id: String,
    pub from: String,
    pub to: String,
    pub extracted: Vec<CategoryCount>,
    #[serde(flatten)]
    pub outcome: ApplyOutcome,
}

fn count_by_category(specs: &[SpecObject]) -> Vec<CategoryCount> {
    Category::ALL
        .iter()
        .map(|&category| CategoryCount {
            category,
            count: specs.iter().filter(|s| s.category == category).count(),
        })
        .collect()
}

/// Runs migrations. Holds only read-only shared state; cheap to clone.
#[derive(Clone)]
pub struct DatabaseSync {
    credentials: CredentialProvider,
    gateway: Arc<dyn ConfigGateway>,
    strategy: ApplyStrategy,
    timeout: Duration,
}

impl DatabaseSync {
    pub fn new(credentials: CredentialProvider, gateway: Arc<dyn ConfigGateway>) -> Self {
        Self {
            credentials,
            gateway,
            strategy: ApplyStrategy::default(),
            timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }

    pub fn with_strategy(mut self, strategy: ApplyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn strategy(&self) -> ApplyStrategy {
        self.strategy
    }

    /// Run one migration under the configured deadline.
    pub async fn sync_database(&self, req: &MigrationRequest) -> Result<SyncReport> {
        match tokio::time::timeout(self.timeout, self.run(req)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(timeout = ?self.timeout, "database sync deadline exceeded");
                Err(SyncError::Transport(format!(
                    "database sync exceeded deadline of {:?}",
                    self.timeout
                )))
            }
        }
    }

    async fn run(&self, req: &MigrationRequest) -> Result<SyncReport> {
        let token = self.credentials.issue_service_token()?;

        let mut specs = SpecExtractor::new(self.gateway.as_ref(), &token)
            .extract_all(&req.project_id, &req.source_alias)
            .await?;
        let extracted = count_by_category(&specs);

        rewrite_specs(&mut specs, &req.target)?;

        let outcome = ApplyOrchestrator::new(self.gateway.as_ref(), &token, self.strategy)
            .apply(&specs)
            .await?;

        tracing::info!(
            project = %req.project_id,
            from = %req.source_alias,
            to = %req.target.db_alias,
            applied = outcome.applied,
            queued = outcome.queued,
            "database sync complete"
        );

        Ok(SyncReport {
            project_id: req.project_id.clone(),
            from: req.source_alias.clone(),
            to: req.target.db_alias.clone(),
            extracted,
            outcome,
        })
    }
}
