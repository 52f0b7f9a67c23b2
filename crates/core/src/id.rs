//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Identifier of a shipment type (primary identity of a projection).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentTypeId(i64);

/// Identifier of a shipment method.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentMethodId(i64);

/// Identifier of a shipment carrier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentCarrierId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = i64::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }
    };
}

impl_int_newtype!(ShipmentTypeId, "ShipmentTypeId");
impl_int_newtype!(ShipmentMethodId, "ShipmentMethodId");
impl_int_newtype!(ShipmentCarrierId, "ShipmentCarrierId");

/// Name of a store (sales channel / region scope).
///
/// Store names are part of every storage key, so they are validated once here:
/// they must be non-empty and must not contain the key delimiter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreName(String);

impl StoreName {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::missing("store_name"));
        }
        if name.contains(crate::key::KEY_DELIMITER) {
            return Err(DomainError::validation(format!(
                "store name `{name}` must not contain `{}`",
                crate::key::KEY_DELIMITER
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for StoreName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StoreName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for StoreName {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StoreName> for String {
    fn from(value: StoreName) -> Self {
        value.0
    }
}

impl FromStr for StoreName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_ids() {
        let id: ShipmentTypeId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert!("forty-two".parse::<ShipmentMethodId>().is_err());
    }

    #[test]
    fn store_name_rejects_empty_and_delimiter() {
        assert_eq!(StoreName::new(""), Err(DomainError::MissingField("store_name")));
        assert_eq!(StoreName::new("   "), Err(DomainError::MissingField("store_name")));
        assert!(matches!(StoreName::new("DE:AT"), Err(DomainError::Validation(_))));
        assert_eq!(StoreName::new("DE").unwrap().as_str(), "DE");
    }

    #[test]
    fn store_name_deserialization_is_validated() {
        let ok: StoreName = serde_json::from_str("\"AT\"").unwrap();
        assert_eq!(ok.as_str(), "AT");
        assert!(serde_json::from_str::<StoreName>("\"\"").is_err());
    }
}
