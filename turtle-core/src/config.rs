use crate::error::{CoreError, Result};
use crate::types::{Account, Amount};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// 0.1 LINK per randomness request
pub const DEFAULT_ORACLE_FEE: Amount = Amount::from_wei(100_000_000_000_000_000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseConfig {
    /// Stands in for the contract address when deriving request ids
    pub house_id: Uuid,
    pub owner: Account,
    /// Hex encoded oracle key hash
    pub key_hash: String,
    /// Charged from the oracle credit on every wager; zero disables the check
    pub oracle_fee: Amount,
}

impl HouseConfig {
    pub fn new(owner: Account) -> Self {
        let house_id = Uuid::new_v4();
        let key_hash = hex::encode(Sha256::digest(house_id.as_bytes()));

        Self {
            house_id,
            owner,
            key_hash,
            oracle_fee: DEFAULT_ORACLE_FEE,
        }
    }

    pub fn with_oracle_fee(mut self, oracle_fee: Amount) -> Self {
        self.oracle_fee = oracle_fee;
        self
    }

    pub fn key_hash_bytes(&self) -> Result<[u8; 32]> {
        let bytes = hex::decode(&self.key_hash)
            .map_err(|e| CoreError::config(format!("Key hash is not hex: {}", e)))?;
        bytes
            .try_into()
            .map_err(|_| CoreError::config("Key hash must be 32 bytes"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.house_id.is_nil() {
            return Err(CoreError::config("House id cannot be nil"));
        }

        self.key_hash_bytes()?;

        Ok(())
    }
}
