//! Wire and in-flight types shared by the extraction, rewrite and apply stages.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SyncError};

/// Artifact categories, in the order they are extracted and applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "db-config")]
    DbConfig,
    #[serde(rename = "db-schema")]
    DbSchema,
    #[serde(rename = "db-rule")]
    DbRule,
    #[serde(rename = "db-prepared-query")]
    DbPreparedQuery,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::DbConfig,
        Category::DbSchema,
        Category::DbRule,
        Category::DbPreparedQuery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DbConfig => "db-config",
            Self::DbSchema => "db-schema",
            Self::DbRule => "db-rule",
            Self::DbPreparedQuery => "db-prepared-query",
        }
    }

    /// Gateway endpoint listing the artifacts of this category.
    pub fn list_path(&self, project: &str) -> String {
        match self {
            Self::DbConfig => format!("/v1/config/projects/{project}/database/config"),
            Self::DbSchema => {
                format!("/v1/config/projects/{project}/database/collections/schema/mutate")
            }
            Self::DbRule => format!("/v1/config/projects/{project}/database/collections/rules"),
            Self::DbPreparedQuery => {
                format!("/v1/config/projects/{project}/database/prepared-queries")
            }
        }
    }

    /// Apply path template, filled from the spec object's metadata.
    pub fn api_template(&self) -> &'static str {
        match self {
            Self::DbConfig => "/v1/config/projects/{project}/database/{dbAlias}/config/{id}",
            Self::DbSchema => {
                "/v1/config/projects/{project}/database/{dbAlias}/collections/{col}/schema/mutate"
            }
            Self::DbRule => {
                "/v1/config/projects/{project}/database/{dbAlias}/collections/{col}/rules"
            }
            Self::DbPreparedQuery => {
                "/v1/config/projects/{project}/database/{db}/prepared-queries/{id}"
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A config artifact in transit: where it goes, what it is, and its body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecObject {
    #[serde(rename = "api")]
    pub api_template: String,
    #[serde(rename = "type")]
    pub category: Category,
    #[serde(rename = "meta")]
    pub metadata: BTreeMap<String, String>,
    #[serde(rename = "spec", default)]
    pub payload: Value,
}

impl SpecObject {
    pub fn new(category: Category, metadata: BTreeMap<String, String>, payload: Value) -> Self {
        Self {
            api_template: category.api_template().to_string(),
            category,
            metadata,
            payload,
        }
    }

    /// Short human-readable identity used in logs.
    pub fn describe(&self) -> String {
        let ident: Vec<String> = self
            .metadata
            .iter()
            .filter(|(k, _)| k.as_str() != "project")
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        format!("{} [{}]", self.category, ident.join(", "))
    }
}

/// Inbound body of `POST /db/sync`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DbSyncRequest {
    #[serde(rename = "projectId", default)]
    pub project_id: String,
    /// dbAlias of the existing database.
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: Value,
}

/// A validated migration request.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationRequest {
    pub project_id: String,
    pub source_alias: String,
    pub target: TargetDescriptor,
}

impl TryFrom<DbSyncRequest> for MigrationRequest {
    type Error = SyncError;

    fn try_from(req: DbSyncRequest) -> Result<Self> {
        if req.project_id.is_empty() {
            return Err(SyncError::Validation(
                "project id not found in request body".into(),
            ));
        }
        if req.from.is_empty() {
            return Err(SyncError::Validation(
                "source db alias (from) not found in request body".into(),
            ));
        }
        let target = TargetDescriptor::from_value(req.to)?;
        Ok(Self {
            project_id: req.project_id,
            source_alias: req.from,
            target,
        })
    }
}

/// Free-form target fields. `dbAlias` is required and becomes the new identity;
/// the remaining fields override the extracted connection config.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDescriptor {
    pub db_alias: String,
    pub overrides: Map<String, Value>,
}

impl TargetDescriptor {
    pub const ALIAS_KEY: &'static str = "dbAlias";

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(SyncError::Validation(
                "target (to) must be a JSON object".into(),
            ));
        };
        let db_alias = match fields.remove(Self::ALIAS_KEY) {
            Some(Value::String(alias)) if !alias.is_empty() => alias,
            _ => {
                return Err(SyncError::Validation(
                    "target (to) must carry a non-empty string dbAlias".into(),
                ))
            }
        };
        // The config id is derived from the alias, never taken from the caller.
        fields.remove("id");
        Ok(Self {
            db_alias,
            overrides: fields,
        })
    }

    pub fn config_id(&self) -> String {
        format!("{}-config", self.db_alias)
    }
}

/// Response envelope used by the gateway and by this service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<Value>>,
}
