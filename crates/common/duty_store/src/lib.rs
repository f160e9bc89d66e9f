pub mod aggsigdb;
pub mod attestation_data;
pub mod promise;

pub use aggsigdb::MemAggSigDb;
pub use attestation_data::AttestationDataStore;
pub use promise::AwaitMap;
