use alloy_primitives::B256;

#[derive(Debug, Clone, Default)]
pub struct FetcherConfig {
    /// Graffiti requested for every block proposal.
    pub graffiti: B256,
}
