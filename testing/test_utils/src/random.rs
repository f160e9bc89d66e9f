use alloy_primitives::{B256, FixedBytes};
use rand::Rng;
use tessera_core::{PubKey, constants::PUBKEY_LENGTH, containers::BLSSignature};

pub fn random_pubkey() -> PubKey {
    let mut bytes = [0u8; PUBKEY_LENGTH];
    rand::rng().fill(&mut bytes[..]);
    PubKey::new(bytes)
}

pub fn random_signature() -> BLSSignature {
    let mut bytes = [0u8; 96];
    rand::rng().fill(&mut bytes[..]);
    FixedBytes::from(bytes)
}

pub fn random_root() -> B256 {
    B256::from(rand::rng().random::<[u8; 32]>())
}

pub fn random_pubkeys(count: usize) -> Vec<PubKey> {
    (0..count).map(|_| random_pubkey()).collect()
}
