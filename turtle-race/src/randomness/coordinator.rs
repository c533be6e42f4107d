use crate::randomness::RandomnessSource;
use crate::{RaceError, Result};
use rand::Rng;
use sha2::{Digest, Sha256};
use turtle_core::{Account, HouseConfig, RequestId};

/// Local stand-in for a VRF coordinator.
///
/// Request ids are `sha256(key_hash || input_seed)` with the input seed mixing
/// the key hash, requester, house id and request nonce, so they are unique
/// per house and nonce and can be recomputed. The coordinator keeps no
/// record of what it issued; the house's pending bets are the only list of
/// open requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct VrfCoordinator;

impl VrfCoordinator {
    pub fn new() -> Self {
        Self
    }

    pub fn derive_request_id(
        key_hash: &[u8; 32],
        house_id: &[u8],
        requester: &Account,
        nonce: u64,
    ) -> RequestId {
        let mut hasher = Sha256::new();
        hasher.update(key_hash);
        hasher.update(requester.as_str().as_bytes());
        hasher.update(house_id);
        hasher.update(nonce.to_be_bytes());
        let input_seed = hasher.finalize();

        let mut hasher = Sha256::new();
        hasher.update(key_hash);
        hasher.update(input_seed);
        RequestId::from_bytes(hasher.finalize().into())
    }

    /// Fresh random value for a fulfillment
    pub fn random_value() -> u128 {
        rand::thread_rng().gen()
    }
}

impl RandomnessSource for VrfCoordinator {
    fn request_randomness(
        &self,
        config: &HouseConfig,
        requester: &Account,
        nonce: u64,
    ) -> Result<RequestId> {
        let key_hash = config
            .key_hash_bytes()
            .map_err(|e| RaceError::RandomnessRequest(e.to_string()))?;
        let request_id =
            Self::derive_request_id(&key_hash, config.house_id.as_bytes(), requester, nonce);

        tracing::debug!("Issued randomness request {} (nonce {})", request_id, nonce);
        Ok(request_id)
    }
}
