//! Document locators
//!
//! A locator names one immutable document on the content store: the
//! identifier of the transaction that inscribed it plus the output index
//! within that transaction. Outputs of the same transaction are siblings
//! and may reference one another.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::registry::error::RegistryError;

/// Maximum accepted transaction identifier length
const MAX_TXID_LEN: usize = 128;

/// Content store locator (`txid:vout`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    txid: String,
    vout: u32,
}

impl Locator {
    /// Create a locator, validating the transaction identifier
    pub fn new(txid: impl Into<String>, vout: u32) -> Result<Self, RegistryError> {
        let txid = txid.into();
        if txid.is_empty() {
            return Err(RegistryError::InvalidLocator(
                "transaction id cannot be empty".to_string(),
            ));
        }
        if txid.len() > MAX_TXID_LEN {
            return Err(RegistryError::InvalidLocator(format!(
                "transaction id too long: {} chars (max {})",
                txid.len(),
                MAX_TXID_LEN
            )));
        }
        if !txid.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(RegistryError::InvalidLocator(format!(
                "transaction id contains non-alphanumeric characters: {txid}"
            )));
        }
        Ok(Self { txid, vout })
    }

    /// Parse a `txid:vout` token
    pub fn parse(s: &str) -> Result<Self, RegistryError> {
        let (txid, vout_str) = s.rsplit_once(':').ok_or_else(|| {
            RegistryError::InvalidLocator(format!("expected txid:vout, got {s}"))
        })?;
        let vout: u32 = vout_str.parse().map_err(|_| {
            RegistryError::InvalidLocator(format!("invalid output index: {vout_str}"))
        })?;
        Self::new(txid, vout)
    }

    /// Transaction identifier
    pub fn txid(&self) -> &str {
        &self.txid
    }

    /// Output index
    pub fn vout(&self) -> u32 {
        self.vout
    }

    /// Locator of the sibling at another output index of the same transaction
    pub fn sibling(&self, vout: u32) -> Locator {
        Locator {
            txid: self.txid.clone(),
            vout,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

impl FromStr for Locator {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locator::parse(s)
    }
}

impl Serialize for Locator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Locator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Locator::parse(&s).map_err(DeError::custom)
    }
}
