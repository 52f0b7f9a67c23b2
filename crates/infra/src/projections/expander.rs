use shipment_storage_core::ShipmentTypeStorageProjection;

/// Enrichment hook over a batch of freshly built projections.
///
/// Hooks run in registration order, each receiving the output of the previous
/// one. They see the whole batch so lookups can be batched too. Extra fields
/// belong in `record.extensions`; they end up in the stored payload.
pub trait ShipmentTypeStorageExpander: Send + Sync {
    fn expand(
        &self,
        projections: Vec<ShipmentTypeStorageProjection>,
    ) -> Vec<ShipmentTypeStorageProjection>;
}

impl<F> ShipmentTypeStorageExpander for F
where
    F: Fn(Vec<ShipmentTypeStorageProjection>) -> Vec<ShipmentTypeStorageProjection> + Send + Sync,
{
    fn expand(
        &self,
        projections: Vec<ShipmentTypeStorageProjection>,
    ) -> Vec<ShipmentTypeStorageProjection> {
        self(projections)
    }
}

pub(crate) fn apply_expanders(
    expanders: &[Box<dyn ShipmentTypeStorageExpander>],
    projections: Vec<ShipmentTypeStorageProjection>,
) -> Vec<ShipmentTypeStorageProjection> {
    expanders
        .iter()
        .fold(projections, |batch, expander| expander.expand(batch))
}
