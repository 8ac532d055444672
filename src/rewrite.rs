//! Re-targeting of extracted spec objects to a new database alias.

use serde_json::Value;

use crate::error::{Result, SyncError};
use crate::model::{Category, SpecObject, TargetDescriptor};

/// Point every spec at `target`. Pure; mutates in place.
///
/// Connection configs also take the target's override fields and a new
/// `{alias}-config` id. Prepared queries carry the alias under `db` as well.
pub fn rewrite_specs(specs: &mut [SpecObject], target: &TargetDescriptor) -> Result<()> {
    for spec in specs.iter_mut() {
        rewrite_spec(spec, target)?;
    }
    Ok(())
}

pub fn rewrite_spec(spec: &mut SpecObject, target: &TargetDescriptor) -> Result<()> {
    spec.metadata.insert("dbAlias".into(), target.db_alias.clone());

    match spec.category {
        Category::DbConfig => {
            let payload = match &mut spec.payload {
                Value::Object(payload) => payload,
                other => {
                    return Err(SyncError::InvalidSpec(format!(
                        "db-config payload must be an object, got {}",
                        kind(other)
                    )))
                }
            };
            for (key, value) in &target.overrides {
                payload.insert(key.clone(), value.clone());
            }
            spec.metadata.insert("id".into(), target.config_id());
        }
        Category::DbPreparedQuery => {
            spec.metadata.insert("db".into(), target.db_alias.clone());
        }
        Category::DbSchema | Category::DbRule => {}
    }
    Ok(())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
