//! Shipment type storage projection.
//!
//! The pipeline for one batch of change events:
//! - **Resolve** the affected shipment type ids ([`resolver`])
//! - **Build** the per-store records and the stale pairs ([`builder`], [`expander`])
//! - **Write** both to storage and signal the sync queue ([`writer`])
//!
//! All stages are idempotent: they recompute the full current state and
//! overwrite, so at-least-once delivery is safe.

pub mod builder;
pub mod expander;
pub mod export;
pub mod resolver;
pub mod writer;

pub use builder::{ProjectionPlan, ShipmentTypeStorageBuilder, StaleProjection};
pub use expander::ShipmentTypeStorageExpander;
pub use export::{ShipmentTypeStorageExporter, SynchronizationEntry, SynchronizationFilter};
pub use resolver::{ShipmentTypeIdResolver, ShipmentTypeResolution};
pub use writer::{
    DEFAULT_WRITE_CHUNK_SIZE, FailedCarrier, FailedShipmentType, ShipmentTypeStorageWriter,
    WriteError, WriteReport,
};
