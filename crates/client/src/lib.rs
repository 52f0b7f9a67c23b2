//! `shipment-storage-client`: read access to shipment type projections.

pub mod criteria;
pub mod reader;

pub use criteria::{Lookup, ShipmentTypeStorageConditions, ShipmentTypeStorageCriteria};
pub use reader::{ReadError, ShipmentTypeStorageCollection, ShipmentTypeStorageReader};
