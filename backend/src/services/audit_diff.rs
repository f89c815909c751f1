//! Field-by-field comparison of two audit snapshots.

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::audit_log::Snapshot;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FieldDiff {
    pub key: String,
    /// `None` when the key is absent from the old snapshot.
    #[schema(value_type = Option<Object>)]
    pub old: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub new: Option<Value>,
    pub changed: bool,
}

/// Union of keys: old's keys in their stored order, then keys only present in
/// `new`. An absent key and an explicit `null` are different values.
pub fn diff_snapshots(old: Option<&Snapshot>, new: Option<&Snapshot>) -> Vec<FieldDiff> {
    let empty = Snapshot::new();
    let old = old.unwrap_or(&empty);
    let new = new.unwrap_or(&empty);

    let mut entries: Vec<FieldDiff> = old
        .iter()
        .map(|(key, old_value)| {
            let new_value = new.get(key);
            FieldDiff {
                key: key.clone(),
                old: Some(old_value.clone()),
                new: new_value.cloned(),
                changed: new_value != Some(old_value),
            }
        })
        .collect();

    entries.extend(
        new.iter()
            .filter(|(key, _)| !old.contains_key(*key))
            .map(|(key, new_value)| FieldDiff {
                key: key.clone(),
                old: None,
                new: Some(new_value.clone()),
                changed: true,
            }),
    );

    entries
}
