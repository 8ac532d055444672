//! Expansion of `{placeholder}` path templates from spec metadata.

use std::collections::BTreeMap;

use crate::error::{Result, SyncError};

/// Fill every `{key}` in `template` from `meta`.
///
/// Fails on the first placeholder without a metadata entry; nothing is
/// returned in that case. Substituted values are never rescanned.
pub fn resolve_path(template: &str, meta: &BTreeMap<String, String>) -> Result<String> {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let close = rest[open..]
            .find('}')
            .map(|offset| open + offset)
            .ok_or_else(|| {
                SyncError::InvalidSpec(format!("unterminated placeholder in path ({template})"))
            })?;

        let key = &rest[open + 1..close];
        let value = meta
            .get(key)
            .ok_or_else(|| SyncError::MissingKey(key.to_string()))?;

        resolved.push_str(&rest[..open]);
        resolved.push_str(value);
        rest = &rest[close + 1..];
    }

    resolved.push_str(rest);
    Ok(resolved)
}
