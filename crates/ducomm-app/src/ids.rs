// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

/// Row ids backed by SQLite `INTEGER PRIMARY KEY` columns.
macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(DispatchCenterId);
entity_id!(AgencyId);
entity_id!(StationId);
entity_id!(UnitId);

#[cfg(test)]
mod tests {
    use super::{AgencyId, DispatchCenterId};

    #[test]
    fn ids_serialize_as_bare_integers() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&AgencyId::new(7))?, "7");
        let center: DispatchCenterId = serde_json::from_str("3")?;
        assert_eq!(center.get(), 3);
        assert_eq!(AgencyId::from(12).to_string(), "12");
        Ok(())
    }
}
