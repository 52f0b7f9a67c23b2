//! Infrastructure layer: entity reading, projection pipeline, adapters, config.

pub mod config;
pub mod entity_reader;
pub mod facade;
pub mod projections;
pub mod sync;


pub use config::{ConfigError, ShipmentTypeStorageConfig};
pub use entity_reader::{EntityReadError, EntityReader, InMemoryEntityReader, PostgresEntityReader};
pub use facade::{DynShipmentTypeStorageFacade, ShipmentTypeStorageFacade, bootstrap};
pub use projections::{
    FailedCarrier, FailedShipmentType, ShipmentTypeStorageExpander, SynchronizationEntry,
    SynchronizationFilter, WriteError, WriteReport,
};
