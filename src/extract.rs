//! Extraction of spec objects for one database alias, category by category.
//!
//! Each category has a typed record carrying its identity fields; whatever else
//! the gateway returns lands in `extra` and becomes the payload untouched.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, SyncError};
use crate::gateway::ConfigGateway;
use crate::model::{Category, SpecObject};

/// Collections owned by the platform itself. Never migrated.
pub const SYSTEM_COLLECTIONS: [&str; 2] = ["event_logs", "invocation_logs"];

/// Placeholder collection the gateway reports for schemaless databases.
pub const DEFAULT_COLLECTION: &str = "default";

#[derive(Debug, Deserialize)]
struct ConfigRecord {
    #[serde(rename = "dbAlias")]
    db_alias: String,
    // Discard slot: keeps the stored `id` out of `extra`.
    #[serde(rename = "id", default)]
    _id: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SchemaRecord {
    col: String,
    #[serde(rename = "dbAlias")]
    db_alias: String,
    #[serde(default)]
    schema: Value,
}

#[derive(Debug, Deserialize)]
struct RuleRecord {
    col: String,
    #[serde(rename = "dbAlias")]
    db_alias: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct PreparedQueryRecord {
    #[serde(rename = "dbAlias")]
    db_alias: String,
    id: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn parse_record<T: DeserializeOwned>(category: Category, raw: Value) -> Result<T> {
    serde_json::from_value(raw)
        .map_err(|e| SyncError::InvalidSpec(format!("malformed {category} artifact: {e}")))
}

fn is_excluded(category: Category, col: &str) -> bool {
    SYSTEM_COLLECTIONS.contains(&col)
        || (category == Category::DbSchema && col == DEFAULT_COLLECTION)
}

/// Identity values end up as path segments, so none may be empty.
fn require_identity(category: Category, metadata: &BTreeMap<String, String>) -> Result<()> {
    match metadata.iter().find(|(_, v)| v.is_empty()) {
        Some((field, _)) => Err(SyncError::InvalidSpec(format!(
            "{category} artifact has an empty {field}"
        ))),
        None => Ok(()),
    }
}

fn meta<const N: usize>(pairs: [(&str, &str); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Turn raw gateway artifacts of one category into spec objects.
pub fn specs_from_records(
    category: Category,
    project: &str,
    records: Vec<Value>,
) -> Result<Vec<SpecObject>> {
    let mut specs = Vec::with_capacity(records.len());

    for raw in records {
        let spec = match category {
            Category::DbConfig => {
                let rec: ConfigRecord = parse_record(category, raw)?;
                let id = format!("{}-config", rec.db_alias);
                SpecObject::new(
                    category,
                    meta([
                        ("project", project),
                        ("dbAlias", rec.db_alias.as_str()),
                        ("id", id.as_str()),
                    ]),
                    Value::Object(rec.extra),
                )
            }
            Category::DbSchema => {
                let rec: SchemaRecord = parse_record(category, raw)?;
                if is_excluded(category, &rec.col) {
                    tracing::debug!(col = %rec.col, "skipping reserved schema collection");
                    continue;
                }
                let mut payload = Map::new();
                payload.insert("schema".into(), rec.schema);
                SpecObject::new(
                    category,
                    meta([
                        ("project", project),
                        ("col", rec.col.as_str()),
                        ("dbAlias", rec.db_alias.as_str()),
                    ]),
                    Value::Object(payload),
                )
            }
            Category::DbRule => {
                let rec: RuleRecord = parse_record(category, raw)?;
                if is_excluded(category, &rec.col) {
                    tracing::debug!(col = %rec.col, "skipping reserved rule collection");
                    continue;
                }
                SpecObject::new(
                    category,
                    meta([
                        ("project", project),
                        ("col", rec.col.as_str()),
                        ("dbAlias", rec.db_alias.as_str()),
                    ]),
                    Value::Object(rec.extra),
                )
            }
            Category::DbPreparedQuery => {
                let rec: PreparedQueryRecord = parse_record(category, raw)?;
                SpecObject::new(
                    category,
                    meta([
                        ("project", project),
                        ("db", rec.db_alias.as_str()),
                        ("dbAlias", rec.db_alias.as_str()),
                        ("id", rec.id.as_str()),
                    ]),
                    Value::Object(rec.extra),
                )
            }
        };
        require_identity(category, &spec.metadata)?;
        specs.push(spec);
    }

    Ok(specs)
}

/// Reads every category for one alias through a gateway.
pub struct SpecExtractor<'a> {
    gateway: &'a dyn ConfigGateway,
    credential: &'a str,
}

impl<'a> SpecExtractor<'a> {
    pub fn new(gateway: &'a dyn ConfigGateway, credential: &'a str) -> Self {
        Self {
            gateway,
            credential,
        }
    }

    pub async fn extract(
        &self,
        category: Category,
        project: &str,
        db_alias: &str,
    ) -> Result<Vec<SpecObject>> {
        let path = category.list_path(project);
        let records = self
            .gateway
            .list(&path, &[("dbAlias", db_alias)], self.credential)
            .await?;
        let specs = specs_from_records(category, project, records)?;
        tracing::info!(
            category = %category,
            db_alias,
            count = specs.len(),
            "fetched database specs"
        );
        Ok(specs)
    }

    /// All categories in apply order. The first failing query aborts.
    pub async fn extract_all(&self, project: &str, db_alias: &str) -> Result<Vec<SpecObject>> {
        let mut specs = Vec::new();
        for category in Category::ALL {
            specs.extend(self.extract(category, project, db_alias).await?);
        }
        Ok(specs)
    }
}
