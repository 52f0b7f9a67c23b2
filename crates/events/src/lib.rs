//! Change events consumed by the projection and synchronization messages it emits.

pub mod envelope;
pub mod event;
pub mod in_memory_queue;
pub mod sync_queue;

pub use envelope::EventEntity;
pub use event::{
    COL_FK_SHIPMENT_METHOD_SHIPMENT_TYPE, COL_FK_SHIPMENT_TYPE_STORE_SHIPMENT_TYPE, ChangeEvent,
    EventTrigger,
};
pub use in_memory_queue::InMemorySyncQueue;
pub use sync_queue::{SyncIntent, SyncMessage, SyncQueue, SyncQueueError};
