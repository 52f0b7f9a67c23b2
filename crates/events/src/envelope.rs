use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A raw change notification as delivered by the platform's event queue.
///
/// Notes:
/// - `id` is the primary key of the changed row, when the emitter knows it.
/// - `foreign_keys` maps fully-qualified column names
///   (e.g. `spy_shipment_method.fk_shipment_type`) to ids.
/// - `name` is the platform event name (e.g. `Entity.spy_shipment_type.update`).
///
/// This is the only stringly-typed shape in the pipeline; it is turned into a
/// [`crate::ChangeEvent`] at ingestion and not passed further.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEntity {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    foreign_keys: BTreeMap<String, i64>,
    #[serde(default)]
    name: Option<String>,
}

impl EventEntity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_foreign_key(mut self, column: impl Into<String>, id: i64) -> Self {
        self.foreign_keys.insert(column.into(), id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn foreign_key(&self, column: &str) -> Option<i64> {
        self.foreign_keys.get(column).copied()
    }

    pub fn foreign_keys(&self) -> &BTreeMap<String, i64> {
        &self.foreign_keys
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
