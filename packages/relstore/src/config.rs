//! Store configuration.
//!
//! Configs are usually built in code, but can also be parsed from the same kind of
//! JSON object a host application passes around for registration requests.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Whether `select` on the direct store empties the selected table.
    pub consume_on_select: bool,
    /// Accept resolvers written in the deprecated raw-pair form.
    pub legacy_pairs: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            consume_on_select: true,
            legacy_pairs: false,
        }
    }
}

impl StoreConfig {
    pub fn from_value(config: Value) -> Result<Self> {
        Ok(serde_json::from_value(config)?)
    }

    pub fn consume_on_select(mut self, consume: bool) -> Self {
        self.consume_on_select = consume;
        self
    }

    pub fn legacy_pairs(mut self, enabled: bool) -> Self {
        self.legacy_pairs = enabled;
        self
    }
}
