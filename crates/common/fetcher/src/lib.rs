pub mod config;
pub mod duties;
pub mod errors;
pub mod fetcher;
pub mod traits;

pub use config::FetcherConfig;
pub use errors::{AwaitError, FetchError};
pub use fetcher::Fetcher;
pub use traits::{AggSigDb, AwaitAttData, ConsensusProvider, FeeRecipientFn};
