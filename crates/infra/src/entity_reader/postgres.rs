//! Postgres-backed entity reader.
//!
//! Reads the normalized platform tables:
//!
//! | Table | Used for |
//! |-------|----------|
//! | `spy_shipment_type` | identity, name, active flag |
//! | `spy_shipment_type_store` + `spy_store` | store relations of a type |
//! | `spy_shipment_method` | carrier and shipment type references, active flag |
//! | `spy_shipment_method_store` + `spy_store` | store availability of a method |
//! | `spy_shipment_carrier` | carrier active flag |
//!
//! The projection core is synchronous, so the reader owns a small
//! current-thread runtime and blocks on each query. It must not be called
//! from inside another tokio runtime.

use std::collections::BTreeMap;
use std::future::Future;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use shipment_storage_core::{
    ShipmentCarrierId, ShipmentMethod, ShipmentMethodId, ShipmentType, ShipmentTypeId, StoreName,
};

use super::{EntityReadError, EntityReader};

const MAX_CONNECTIONS: u32 = 5;

pub struct PostgresEntityReader {
    pool: PgPool,
    runtime: tokio::runtime::Runtime,
}

impl core::fmt::Debug for PostgresEntityReader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostgresEntityReader").finish_non_exhaustive()
    }
}

fn query_error(e: sqlx::Error) -> EntityReadError {
    EntityReadError::Query(e.to_string())
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, EntityReadError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get::<T, _>(name)
        .map_err(|e| EntityReadError::InvalidData(format!("{name}: {e}")))
}

fn store_name(raw: String) -> Result<StoreName, EntityReadError> {
    StoreName::new(raw).map_err(|e| EntityReadError::InvalidData(e.to_string()))
}

fn raw_ids<T: Copy + Into<i64>>(ids: &[T]) -> Vec<i64> {
    ids.iter().map(|id| (*id).into()).collect()
}

impl PostgresEntityReader {
    pub fn connect(database_url: &str) -> Result<Self, EntityReadError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| EntityReadError::Connection(e.to_string()))?;

        let pool = runtime
            .block_on(
                PgPoolOptions::new()
                    .max_connections(MAX_CONNECTIONS)
                    .connect(database_url),
            )
            .map_err(|e| EntityReadError::Connection(e.to_string()))?;

        Ok(Self { pool, runtime })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn fetch_all(&self, sql: &'static str, ids: Vec<i64>) -> Result<Vec<PgRow>, EntityReadError> {
        self.block_on(sqlx::query(sql).bind(ids).fetch_all(&self.pool))
            .map_err(query_error)
    }

    fn fetch_ids(&self, sql: &'static str, ids: Vec<i64>) -> Result<Vec<i64>, EntityReadError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.fetch_all(sql, ids)?
            .iter()
            .map(|row| column::<i64>(row, "id"))
            .collect()
    }
}

impl EntityReader for PostgresEntityReader {
    #[instrument(skip(self, carrier_ids), fields(carriers = carrier_ids.len()))]
    fn find_shipment_method_ids_by_carrier_ids(
        &self,
        carrier_ids: &[ShipmentCarrierId],
    ) -> Result<Vec<ShipmentMethodId>, EntityReadError> {
        let ids = self.fetch_ids(
            r#"
            SELECT id_shipment_method::bigint AS id
            FROM spy_shipment_method
            WHERE fk_shipment_carrier = ANY($1::bigint[])
            "#,
            raw_ids(carrier_ids),
        )?;
        Ok(ids.into_iter().map(ShipmentMethodId::new).collect())
    }

    #[instrument(skip(self, method_ids), fields(methods = method_ids.len()))]
    fn find_shipment_type_ids_by_shipment_method_ids(
        &self,
        method_ids: &[ShipmentMethodId],
    ) -> Result<Vec<ShipmentTypeId>, EntityReadError> {
        let ids = self.fetch_ids(
            r#"
            SELECT DISTINCT fk_shipment_type::bigint AS id
            FROM spy_shipment_method
            WHERE id_shipment_method = ANY($1::bigint[])
              AND fk_shipment_type IS NOT NULL
            "#,
            raw_ids(method_ids),
        )?;
        Ok(ids.into_iter().map(ShipmentTypeId::new).collect())
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    fn fetch_shipment_types_by_ids(
        &self,
        ids: &[ShipmentTypeId],
    ) -> Result<Vec<ShipmentType>, EntityReadError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = self.fetch_all(
            r#"
            SELECT
                st.id_shipment_type::bigint AS id,
                st.key,
                st.uuid,
                st.name,
                st.is_active,
                s.name AS store_name
            FROM spy_shipment_type st
            LEFT JOIN spy_shipment_type_store sts ON sts.fk_shipment_type = st.id_shipment_type
            LEFT JOIN spy_store s ON s.id_store = sts.fk_store
            WHERE st.id_shipment_type = ANY($1::bigint[])
            ORDER BY st.id_shipment_type
            "#,
            raw_ids(ids),
        )?;

        let mut types: BTreeMap<ShipmentTypeId, ShipmentType> = BTreeMap::new();
        for row in &rows {
            let id = ShipmentTypeId::new(column::<i64>(row, "id")?);
            if !types.contains_key(&id) {
                types.insert(
                    id,
                    ShipmentType {
                        id,
                        key: column(row, "key")?,
                        uuid: column::<Option<String>>(row, "uuid")?.unwrap_or_default(),
                        name: column(row, "name")?,
                        is_active: column(row, "is_active")?,
                        store_names: Default::default(),
                    },
                );
            }
            if let Some(name) = column::<Option<String>>(row, "store_name")? {
                let store = store_name(name)?;
                if let Some(st) = types.get_mut(&id) {
                    st.store_names.insert(store);
                }
            }
        }

        Ok(types.into_values().collect())
    }

    #[instrument(skip(self, shipment_type_ids), fields(ids = shipment_type_ids.len()))]
    fn find_shipment_methods_by_shipment_type_ids(
        &self,
        shipment_type_ids: &[ShipmentTypeId],
    ) -> Result<Vec<ShipmentMethod>, EntityReadError> {
        if shipment_type_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = self.fetch_all(
            r#"
            SELECT
                m.id_shipment_method::bigint AS id,
                m.fk_shipment_carrier::bigint AS carrier_id,
                m.fk_shipment_type::bigint AS shipment_type_id,
                m.is_active,
                c.is_active AS is_carrier_active,
                s.name AS store_name
            FROM spy_shipment_method m
            JOIN spy_shipment_carrier c ON c.id_shipment_carrier = m.fk_shipment_carrier
            LEFT JOIN spy_shipment_method_store ms ON ms.fk_shipment_method = m.id_shipment_method
            LEFT JOIN spy_store s ON s.id_store = ms.fk_store
            WHERE m.fk_shipment_type = ANY($1::bigint[])
            ORDER BY m.id_shipment_method
            "#,
            raw_ids(shipment_type_ids),
        )?;

        let mut methods: BTreeMap<ShipmentMethodId, ShipmentMethod> = BTreeMap::new();
        for row in &rows {
            let id = ShipmentMethodId::new(column::<i64>(row, "id")?);
            if !methods.contains_key(&id) {
                methods.insert(
                    id,
                    ShipmentMethod {
                        id,
                        carrier_id: ShipmentCarrierId::new(column::<i64>(row, "carrier_id")?),
                        is_active: column(row, "is_active")?,
                        is_carrier_active: column(row, "is_carrier_active")?,
                        shipment_type_id: column::<Option<i64>>(row, "shipment_type_id")?
                            .map(ShipmentTypeId::new),
                        store_names: Default::default(),
                    },
                );
            }
            if let Some(name) = column::<Option<String>>(row, "store_name")? {
                let store = store_name(name)?;
                if let Some(m) = methods.get_mut(&id) {
                    m.store_names.insert(store);
                }
            }
        }

        Ok(methods.into_values().collect())
    }

    fn find_store_names(&self) -> Result<Vec<StoreName>, EntityReadError> {
        let rows = self
            .block_on(sqlx::query("SELECT name FROM spy_store ORDER BY name").fetch_all(&self.pool))
            .map_err(query_error)?;

        rows.iter()
            .map(|row| store_name(column(row, "name")?))
            .collect()
    }

    fn find_all_shipment_type_ids(&self) -> Result<Vec<ShipmentTypeId>, EntityReadError> {
        let rows = self
            .block_on(
                sqlx::query(
                    "SELECT id_shipment_type::bigint AS id FROM spy_shipment_type ORDER BY id_shipment_type",
                )
                .fetch_all(&self.pool),
            )
            .map_err(query_error)?;

        rows.iter()
            .map(|row| column::<i64>(row, "id").map(ShipmentTypeId::new))
            .collect()
    }
}
