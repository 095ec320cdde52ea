//! Execution context handed to the keeper by the host chain.

/// Block-level information available while a transaction executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Chain ID of the chain executing the transaction.
    pub chain_id: String,
    pub block_height: u64,
    /// Block time in unix milliseconds.
    pub block_time: i64,
}

impl Context {
    pub fn new(chain_id: impl Into<String>, block_height: u64, block_time: i64) -> Self {
        Self {
            chain_id: chain_id.into(),
            block_height,
            block_time,
        }
    }
}
