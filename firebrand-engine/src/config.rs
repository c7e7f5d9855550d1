//! Factory configuration.

use crate::EngineResult;
use firebrand_storage::ConsistencyLevel;
use serde::{Deserialize, Serialize};

/// Factory settings. The consistency levels are passed to the column store
/// on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Keyspace the column families live in. Informational: a store is
    /// bound to its keyspace when it is constructed, so the factory only
    /// logs and reports it.
    pub keyspace: String,
    pub read_consistency: ConsistencyLevel,
    pub write_consistency: ConsistencyLevel,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            keyspace: "firebrand".to_string(),
            read_consistency: ConsistencyLevel::One,
            write_consistency: ConsistencyLevel::One,
        }
    }
}

impl FactoryConfig {
    /// Parses a JSON configuration document. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_keyspace(mut self, keyspace: &str) -> Self {
        self.keyspace = keyspace.to_string();
        self
    }

    #[must_use]
    pub fn with_consistency(mut self, read: ConsistencyLevel, write: ConsistencyLevel) -> Self {
        self.read_consistency = read;
        self.write_consistency = write;
        self
    }
}
