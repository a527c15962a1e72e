use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TOKEN_DECIMALS: u32 = 9;
pub const TOKEN_BASE_UNIT: u64 = 1_000_000_000; // 10^9

/// The two currencies tasks can be denominated in.
///
/// A deployment may enable only one of them; availability is a platform
/// config concern, not a ledger concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    /// Stable-value token
    Stable,
    /// Native platform token
    Native,
}

impl Currency {
    pub fn all() -> [Currency; 2] {
        [Currency::Stable, Currency::Native]
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Stable => "sUSD",
            Currency::Native => "GIG",
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Currency::Stable => 0,
            Currency::Native => 1,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Fixed-point token amount in base units (9 decimals), currency-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenAmount(u64);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    pub fn from_tokens(tokens: f64) -> Self {
        Self((tokens * TOKEN_BASE_UNIT as f64) as u64)
    }

    pub fn from_base_units(units: u64) -> Self {
        Self(units)
    }

    pub fn to_tokens(&self) -> f64 {
        self.0 as f64 / TOKEN_BASE_UNIT as f64
    }

    pub fn to_base_units(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(&self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.9}", self.to_tokens())
    }
}

/// A marketplace account: 20 raw bytes, displayed as 0x-prefixed hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId([u8; 20]);

impl AccountId {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let decoded = hex::decode(stripped)?;
        let bytes: [u8; 20] = decoded
            .try_into()
            .map_err(|_| anyhow::anyhow!("Account id must be exactly 20 bytes"))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Well-known account holding collected platform fees.
    pub fn platform() -> Self {
        Self([0xFE; 20])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
