use std::fmt;

use serde::{Deserialize, Serialize};

/// Tracking identifier binding related manifest rows to one order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderKey(pub String);

/// Physical package identifier; several manifest rows can share one package.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageKey(pub String);

/// Buyer identity pair used for compliance grouping. Built from the
/// resolved name and address, not from the order number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuyerKey(String);

impl OrderKey {
    pub fn new(raw: impl Into<String>) -> Self {
        OrderKey(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PackageKey {
    pub fn new(raw: impl Into<String>) -> Self {
        PackageKey(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl BuyerKey {
    pub fn new(name: &str, address: &str) -> Self {
        BuyerKey(format!("{name}{address}"))
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
