//! Deterministic account identifiers.
//!
//! Every account referenced by a fixture is derived from a `(role tag, epoch, index)` triple:
//! the SHA-256 digest of `"{tag}-{epoch}-{index}"` encoded as base-58 (Bitcoin alphabet, leading
//! zero bytes kept as leading `1`s). The result is always a syntactically valid 32-byte key and is
//! identical across runs and processes.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Base-58 encoded 32-byte account address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Pubkey(String);

impl Pubkey {
    /// Derives the key for an arbitrary role tag.
    pub fn derive(tag: &str, epoch: u64, index: u64) -> Self {
        let digest = Sha256::digest(format!("{tag}-{epoch}-{index}").as_bytes());
        Self(bs58::encode(digest).into_string())
    }

    /// Wraps a well-known address. Only used for constants that are covered by tests.
    pub(crate) fn from_static(address: &'static str) -> Self {
        Self(address.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Pubkey {
    type Error = String;

    fn try_from(address: String) -> Result<Self, Self::Error> {
        let bytes = bs58::decode(&address)
            .into_vec()
            .map_err(|e| format!("invalid base-58 address {address}: {e}"))?;
        if bytes.len() != 32 {
            return Err(format!(
                "address {address} decodes to {} bytes, expected 32",
                bytes.len()
            ));
        }
        Ok(Self(address))
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Pubkey::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Role tags used by the scenario sampler. The tag strings are part of the fixture format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    Vote,
    Identity,
    Stake,
    NonWhitelistedAuthority,
    InstitutionalWithdraw,
    MarinadeWithdraw,
}

impl KeyRole {
    pub fn tag(self) -> &'static str {
        match self {
            KeyRole::Vote => "vote",
            KeyRole::Identity => "identity",
            KeyRole::Stake => "stake",
            KeyRole::NonWhitelistedAuthority => "nonwl-auth",
            KeyRole::InstitutionalWithdraw => "inst-withdraw",
            KeyRole::MarinadeWithdraw => "marinade-withdraw",
        }
    }

    pub fn key(self, epoch: u64, index: u64) -> Pubkey {
        Pubkey::derive(self.tag(), epoch, index)
    }
}
