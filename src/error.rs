use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced by the wallet, contract and lifecycle layers.
///
/// None of these are fatal: the controller logs them and turns them into a
/// transient notice.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no wallet provider configured")]
    NoProvider,
    #[error("wallet authorization denied: {0}")]
    AuthorizationDenied(String),
    #[error("contract call failed: {0}")]
    ContractCall(String),
    #[error("transaction failed: {0}")]
    TransactionFailure(String),
    #[error("a wave is already being mined")]
    SubmissionInFlight,
    #[error("invalid wave record: {0}")]
    InvalidWave(String),
}

impl Error {
    pub fn contract_call(err: impl std::fmt::Display) -> Self {
        Error::ContractCall(err.to_string())
    }

    pub fn transaction_failure(err: impl std::fmt::Display) -> Self {
        Error::TransactionFailure(err.to_string())
    }
}
