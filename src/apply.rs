//! Submission of rewritten spec objects to the gateway.
//!
//! Two strategies, chosen once by configuration:
//! - `Batch` (default): one POST of every spec to the batch endpoint; the
//!   gateway applies them together or reports one error.
//! - `PerObject`: one POST per spec in extraction order, stopping at the first
//!   failure. Specs already applied stay applied.
//!
//! Every path is resolved before anything is sent.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Result, SyncError};
use crate::gateway::{ConfigGateway, SubmitStatus};
use crate::model::SpecObject;
use crate::path::resolve_path;

pub const BATCH_APPLY_PATH: &str = "/v1/config/batch-apply";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApplyStrategy {
    #[default]
    Batch,
    PerObject,
}

impl FromStr for ApplyStrategy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "batch" => Ok(Self::Batch),
            "per-object" | "per_object" => Ok(Self::PerObject),
            other => Err(SyncError::Config(format!(
                "unknown apply strategy ({other}), expected batch or per-object"
            ))),
        }
    }
}

impl fmt::Display for ApplyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batch => f.write_str("batch"),
            Self::PerObject => f.write_str("per-object"),
        }
    }
}

/// Tally of what the gateway accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    pub applied: usize,
    pub queued: usize,
}

impl ApplyOutcome {
    fn record(&mut self, status: SubmitStatus, count: usize) {
        match status {
            SubmitStatus::Applied => self.applied += count,
            SubmitStatus::Queued => self.queued += count,
        }
    }
}

pub struct ApplyOrchestrator<'a> {
    gateway: &'a dyn ConfigGateway,
    credential: &'a str,
    strategy: ApplyStrategy,
}

impl<'a> ApplyOrchestrator<'a> {
    pub fn new(gateway: &'a dyn ConfigGateway, credential: &'a str, strategy: ApplyStrategy) -> Self {
        Self {
            gateway,
            credential,
            strategy,
        }
    }

    pub async fn apply(&self, specs: &[SpecObject]) -> Result<ApplyOutcome> {
        let paths = specs
            .iter()
            .map(|spec| resolve_path(&spec.api_template, &spec.metadata))
            .collect::<Result<Vec<_>>>()?;

        if specs.is_empty() {
            tracing::info!("nothing to apply");
            return Ok(ApplyOutcome::default());
        }

        match self.strategy {
            ApplyStrategy::PerObject => self.apply_each(specs, &paths).await,
            ApplyStrategy::Batch => self.apply_batch(specs).await,
        }
    }

    async fn apply_each(&self, specs: &[SpecObject], paths: &[String]) -> Result<ApplyOutcome> {
        let mut outcome = ApplyOutcome::default();
        for (spec, path) in specs.iter().zip(paths) {
            let status = self
                .gateway
                .submit(path, self.credential, &spec.payload)
                .await
                .map_err(|e| {
                    tracing::error!(spec = %spec.describe(), error = %e, "error while applying spec");
                    e
                })?;
            match status {
                SubmitStatus::Applied => tracing::info!(spec = %spec.describe(), "successfully applied"),
                SubmitStatus::Queued => tracing::info!(spec = %spec.describe(), "successfully queued"),
            }
            outcome.record(status, 1);
        }
        Ok(outcome)
    }

    async fn apply_batch(&self, specs: &[SpecObject]) -> Result<ApplyOutcome> {
        let body = batch_body(specs)?;
        let status = self
            .gateway
            .submit(BATCH_APPLY_PATH, self.credential, &body)
            .await
            .map_err(|e| {
                tracing::error!(count = specs.len(), error = %e, "batch apply rejected");
                e
            })?;
        tracing::info!(count = specs.len(), ?status, "batch apply accepted");

        let mut outcome = ApplyOutcome::default();
        outcome.record(status, specs.len());
        Ok(outcome)
    }
}

pub fn batch_body(specs: &[SpecObject]) -> Result<Value> {
    let specs = serde_json::to_value(specs)
        .map_err(|e| SyncError::InvalidSpec(format!("cannot encode specs: {e}")))?;
    Ok(json!({ "specs": specs }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Mutex;

    /// Records submissions and answers from a script.
    struct ScriptedGateway {
        answers: Mutex<VecDeque<Result<SubmitStatus>>>,
        submitted: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedGateway {
        fn new(answers: Vec<Result<SubmitStatus>>) -> Self {
            Self {
                answers: Mutex::new(answers.into()),
                submitted: Mutex::new(Vec::new()),
            }
        }

        fn submitted_paths(&self) -> Vec<String> {
            self.submitted
                .lock()
                .unwrap()
                .iter()
                .map(|(p, _)| p.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ConfigGateway for ScriptedGateway {
        async fn list(&self, _: &str, _: &[(&str, &str)], _: &str) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }

        async fn submit(&self, path: &str, _: &str, body: &Value) -> Result<SubmitStatus> {
            self.submitted
                .lock()
                .unwrap()
                .push((path.to_string(), body.clone()));
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(SubmitStatus::Applied))
        }
    }

    fn rule(col: &str) -> SpecObject {
        let meta = BTreeMap::from([
            ("project".to_string(), "p1".to_string()),
            ("dbAlias".to_string(), "mongo2".to_string()),
            ("col".to_string(), col.to_string()),
        ]);
        SpecObject::new(Category::DbRule, meta, json!({"rules": {"col": col}}))
    }

    #[test]
    fn strategy_parses() {
        assert_eq!("batch".parse::<ApplyStrategy>().unwrap(), ApplyStrategy::Batch);
        assert_eq!(
            "per-object".parse::<ApplyStrategy>().unwrap(),
            ApplyStrategy::PerObject
        );
        assert!("parallel".parse::<ApplyStrategy>().is_err());
        assert_eq!(ApplyStrategy::default(), ApplyStrategy::Batch);
    }

    #[tokio::test]
    async fn per_object_submits_in_order_and_counts() {
        let gw = ScriptedGateway::new(vec![
            Ok(SubmitStatus::Applied),
            Ok(SubmitStatus::Queued),
            Ok(SubmitStatus::Applied),
        ]);
        let specs = vec![rule("a"), rule("b"), rule("c")];
        let outcome = ApplyOrchestrator::new(&gw, "t", ApplyStrategy::PerObject)
            .apply(&specs)
            .await
            .unwrap();

        assert_eq!(outcome, ApplyOutcome { applied: 2, queued: 1 });
        assert_eq!(
            gw.submitted_paths(),
            vec![
                "/v1/config/projects/p1/database/mongo2/collections/a/rules",
                "/v1/config/projects/p1/database/mongo2/collections/b/rules",
                "/v1/config/projects/p1/database/mongo2/collections/c/rules",
            ]
        );
        assert_eq!(gw.submitted.lock().unwrap()[1].1, json!({"rules": {"col": "b"}}));
    }

    #[tokio::test]
    async fn per_object_stops_at_first_failure() {
        let gw = ScriptedGateway::new(vec![Err(SyncError::gateway(400, "bad rule"))]);
        let specs = vec![rule("a"), rule("b"), rule("c")];
        let err = ApplyOrchestrator::new(&gw, "t", ApplyStrategy::PerObject)
            .apply(&specs)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "bad rule");
        assert_eq!(gw.submitted_paths().len(), 1);
    }

    #[tokio::test]
    async fn unresolvable_path_submits_nothing() {
        let gw = ScriptedGateway::new(vec![]);
        let mut broken = rule("c");
        broken.metadata.remove("col");
        let specs = vec![rule("a"), broken];

        for strategy in [ApplyStrategy::PerObject, ApplyStrategy::Batch] {
            let err = ApplyOrchestrator::new(&gw, "t", strategy)
                .apply(&specs)
                .await
                .unwrap_err();
            assert!(matches!(err, SyncError::MissingKey(ref k) if k == "col"));
        }
        assert!(gw.submitted_paths().is_empty());
    }

    #[tokio::test]
    async fn batch_posts_all_specs_once() {
        let gw = ScriptedGateway::new(vec![Ok(SubmitStatus::Queued)]);
        let specs = vec![rule("a"), rule("b")];
        let outcome = ApplyOrchestrator::new(&gw, "t", ApplyStrategy::Batch)
            .apply(&specs)
            .await
            .unwrap();

        assert_eq!(outcome, ApplyOutcome { applied: 0, queued: 2 });
        let submitted = gw.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].0, BATCH_APPLY_PATH);
        let wire = submitted[0].1["specs"].as_array().unwrap();
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0]["meta"]["col"], json!("a"));
        assert_eq!(wire[1]["meta"]["col"], json!("b"));
        assert_eq!(wire[0]["type"], json!("db-rule"));
    }

    #[tokio::test]
    async fn empty_spec_list_is_a_no_op() {
        let gw = ScriptedGateway::new(vec![]);
        let outcome = ApplyOrchestrator::new(&gw, "t", ApplyStrategy::Batch)
            .apply(&[])
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::default());
        assert!(gw.submitted_paths().is_empty());
    }
}
