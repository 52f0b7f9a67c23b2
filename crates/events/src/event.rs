//! Typed change events.
//!
//! Raw [`EventEntity`] notifications are classified by trigger and converted
//! into [`ChangeEvent`] exactly once, at the boundary where they are ingested.

use serde::{Deserialize, Serialize};

use shipment_storage_core::{ShipmentCarrierId, ShipmentTypeId};

use crate::envelope::EventEntity;

/// Foreign key column carried by shipment type store relation events.
pub const COL_FK_SHIPMENT_TYPE_STORE_SHIPMENT_TYPE: &str = "spy_shipment_type_store.fk_shipment_type";

/// Foreign key column carried by shipment method events.
pub const COL_FK_SHIPMENT_METHOD_SHIPMENT_TYPE: &str = "spy_shipment_method.fk_shipment_type";

/// The entity whose change triggered an event batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTrigger {
    ShipmentType,
    ShipmentTypeStoreRelation,
    ShipmentMethod,
    ShipmentCarrier,
}

impl EventTrigger {
    /// Classify a platform event name.
    ///
    /// Recognised names:
    /// - `Entity.spy_shipment_type.{create,update}` and `ShipmentType.shipment_type.publish`
    /// - `Entity.spy_shipment_type_store.{create,update,delete}`
    /// - `Entity.spy_shipment_method.{create,update,delete}`
    /// - `Entity.spy_shipment_carrier.{create,update}`
    pub fn from_event_name(name: &str) -> Option<Self> {
        if name == "ShipmentType.shipment_type.publish" {
            return Some(Self::ShipmentType);
        }

        let (table, action) = name.strip_prefix("Entity.")?.rsplit_once('.')?;
        let trigger = match table {
            "spy_shipment_type" => Self::ShipmentType,
            "spy_shipment_type_store" => Self::ShipmentTypeStoreRelation,
            "spy_shipment_method" => Self::ShipmentMethod,
            "spy_shipment_carrier" => Self::ShipmentCarrier,
            _ => return None,
        };

        match (trigger, action) {
            (_, "create" | "update") => Some(trigger),
            (Self::ShipmentTypeStoreRelation | Self::ShipmentMethod, "delete") => Some(trigger),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShipmentType => "shipment_type",
            Self::ShipmentTypeStoreRelation => "shipment_type_store",
            Self::ShipmentMethod => "shipment_method",
            Self::ShipmentCarrier => "shipment_carrier",
        }
    }
}

impl core::fmt::Display for EventTrigger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change notification with a strongly typed payload per trigger.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "trigger", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A shipment type row changed (or was explicitly published).
    ShipmentType { shipment_type_id: ShipmentTypeId },
    /// A shipment type to store relation changed.
    ShipmentTypeStoreRelation { shipment_type_id: ShipmentTypeId },
    /// A shipment method referencing a shipment type changed.
    ShipmentMethod { shipment_type_id: ShipmentTypeId },
    /// A shipment carrier changed; affected types are resolved transitively.
    ShipmentCarrier { shipment_carrier_id: ShipmentCarrierId },
}

impl ChangeEvent {
    /// Convert a raw event delivered for `trigger`.
    ///
    /// Returns `None` when the event does not carry the id (or foreign key
    /// column) the trigger needs; such events are ignored.
    pub fn ingest(trigger: EventTrigger, entity: &EventEntity) -> Option<Self> {
        match trigger {
            EventTrigger::ShipmentType => entity.id().map(|id| Self::ShipmentType {
                shipment_type_id: ShipmentTypeId::new(id),
            }),
            EventTrigger::ShipmentTypeStoreRelation => entity
                .foreign_key(COL_FK_SHIPMENT_TYPE_STORE_SHIPMENT_TYPE)
                .map(|id| Self::ShipmentTypeStoreRelation {
                    shipment_type_id: ShipmentTypeId::new(id),
                }),
            EventTrigger::ShipmentMethod => entity
                .foreign_key(COL_FK_SHIPMENT_METHOD_SHIPMENT_TYPE)
                .map(|id| Self::ShipmentMethod {
                    shipment_type_id: ShipmentTypeId::new(id),
                }),
            EventTrigger::ShipmentCarrier => entity.id().map(|id| Self::ShipmentCarrier {
                shipment_carrier_id: ShipmentCarrierId::new(id),
            }),
        }
    }

    /// Convert a batch delivered for one trigger, dropping unusable events.
    pub fn ingest_batch(trigger: EventTrigger, entities: &[EventEntity]) -> Vec<Self> {
        let events: Vec<_> = entities
            .iter()
            .filter_map(|e| Self::ingest(trigger, e))
            .collect();

        let ignored = entities.len() - events.len();
        if ignored > 0 {
            tracing::debug!(%trigger, ignored, "ignored events without a usable id");
        }
        events
    }

    /// Convert a mixed batch, classifying each event by its own name.
    pub fn ingest_named(entities: &[EventEntity]) -> Vec<Self> {
        entities
            .iter()
            .filter_map(|e| {
                let trigger = e.name().and_then(EventTrigger::from_event_name);
                if trigger.is_none() {
                    tracing::debug!(name = ?e.name(), "ignored event with unknown name");
                }
                Self::ingest(trigger?, e)
            })
            .collect()
    }

    pub fn trigger(&self) -> EventTrigger {
        match self {
            Self::ShipmentType { .. } => EventTrigger::ShipmentType,
            Self::ShipmentTypeStoreRelation { .. } => EventTrigger::ShipmentTypeStoreRelation,
            Self::ShipmentMethod { .. } => EventTrigger::ShipmentMethod,
            Self::ShipmentCarrier { .. } => EventTrigger::ShipmentCarrier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_platform_event_names() {
        assert_eq!(
            EventTrigger::from_event_name("Entity.spy_shipment_type.update"),
            Some(EventTrigger::ShipmentType)
        );
        assert_eq!(
            EventTrigger::from_event_name("ShipmentType.shipment_type.publish"),
            Some(EventTrigger::ShipmentType)
        );
        assert_eq!(
            EventTrigger::from_event_name("Entity.spy_shipment_type_store.delete"),
            Some(EventTrigger::ShipmentTypeStoreRelation)
        );
        assert_eq!(
            EventTrigger::from_event_name("Entity.spy_shipment_method.create"),
            Some(EventTrigger::ShipmentMethod)
        );
        assert_eq!(
            EventTrigger::from_event_name("Entity.spy_shipment_carrier.update"),
            Some(EventTrigger::ShipmentCarrier)
        );
        assert_eq!(EventTrigger::from_event_name("Entity.spy_shipment_type.delete"), None);
        assert_eq!(EventTrigger::from_event_name("Entity.spy_product.update"), None);
        assert_eq!(EventTrigger::from_event_name("garbage"), None);
    }

    #[test]
    fn ingest_uses_trigger_specific_columns() {
        let by_id = EventEntity::new().with_id(5);
        let by_store_fk = EventEntity::new().with_foreign_key(COL_FK_SHIPMENT_TYPE_STORE_SHIPMENT_TYPE, 6);
        let by_method_fk = EventEntity::new().with_foreign_key(COL_FK_SHIPMENT_METHOD_SHIPMENT_TYPE, 7);

        assert_eq!(
            ChangeEvent::ingest(EventTrigger::ShipmentType, &by_id),
            Some(ChangeEvent::ShipmentType { shipment_type_id: ShipmentTypeId::new(5) })
        );
        assert_eq!(
            ChangeEvent::ingest(EventTrigger::ShipmentTypeStoreRelation, &by_store_fk),
            Some(ChangeEvent::ShipmentTypeStoreRelation { shipment_type_id: ShipmentTypeId::new(6) })
        );
        assert_eq!(
            ChangeEvent::ingest(EventTrigger::ShipmentMethod, &by_method_fk),
            Some(ChangeEvent::ShipmentMethod { shipment_type_id: ShipmentTypeId::new(7) })
        );
        assert_eq!(
            ChangeEvent::ingest(EventTrigger::ShipmentCarrier, &by_id),
            Some(ChangeEvent::ShipmentCarrier { shipment_carrier_id: ShipmentCarrierId::new(5) })
        );

        // Wrong column for the trigger.
        assert_eq!(ChangeEvent::ingest(EventTrigger::ShipmentMethod, &by_store_fk), None);
        assert_eq!(ChangeEvent::ingest(EventTrigger::ShipmentTypeStoreRelation, &by_id), None);
    }

    #[test]
    fn ingest_batch_drops_unusable_events() {
        let batch = vec![
            EventEntity::new().with_id(1),
            EventEntity::new(),
            EventEntity::new().with_id(1),
        ];
        let events = ChangeEvent::ingest_batch(EventTrigger::ShipmentType, &batch);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn ingest_named_classifies_each_event() {
        let batch = vec![
            EventEntity::new().with_id(1).with_name("Entity.spy_shipment_type.update"),
            EventEntity::new().with_id(2).with_name("Entity.spy_shipment_carrier.update"),
            EventEntity::new().with_id(3).with_name("Entity.spy_unknown.update"),
            EventEntity::new().with_id(4),
        ];
        let events = ChangeEvent::ingest_named(&batch);
        assert_eq!(
            events,
            vec![
                ChangeEvent::ShipmentType { shipment_type_id: ShipmentTypeId::new(1) },
                ChangeEvent::ShipmentCarrier { shipment_carrier_id: ShipmentCarrierId::new(2) },
            ]
        );
    }

    #[test]
    fn raw_events_deserialize_from_queue_json() {
        let raw: EventEntity = serde_json::from_str(
            r#"{"foreignKeys": {"spy_shipment_method.fk_shipment_type": 9}, "name": "Entity.spy_shipment_method.update"}"#,
        )
        .unwrap();
        assert_eq!(raw.id(), None);
        assert_eq!(
            ChangeEvent::ingest_named(&[raw]),
            vec![ChangeEvent::ShipmentMethod { shipment_type_id: ShipmentTypeId::new(9) }]
        );
    }
}
