use std::path::PathBuf;

use solana_client::client_error::ClientError;
use solana_sdk::program_error::ProgramError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::SignerError;
use solana_sdk::transaction::TransactionError;
use squads_core::SquadsError;
use vault_core::VaultCoreError;

use crate::orchestrator::Step;

pub type Result<T, E = SetupError> = std::result::Result<T, E>;

/// Every failure aborts the run. Steps confirmed before it stay on-ledger.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to load wallet from {}: {reason}", path.display())]
    Wallet { path: PathBuf, reason: String },

    #[error(transparent)]
    VaultCore(#[from] VaultCoreError),

    #[error(transparent)]
    Squads(#[from] SquadsError),

    #[error("rpc request failed: {0}")]
    Rpc(Box<ClientError>),

    #[error("transaction {signature} failed: {error}")]
    TransactionFailed {
        signature: Signature,
        error: TransactionError,
    },

    #[error("transaction {signature} was not confirmed before block height {last_valid_block_height}")]
    BlockhashExpired {
        signature: Signature,
        last_valid_block_height: u64,
    },

    #[error("failed to sign transaction: {0}")]
    Signing(#[from] SignerError),

    #[error("token instruction could not be built: {0}")]
    TokenProgram(#[from] ProgramError),

    #[error("account {0} does not exist")]
    AccountNotFound(Pubkey),

    #[error("multisig {multisig} cannot drive this setup: {reason}")]
    MultisigMismatch { multisig: Pubkey, reason: String },

    #[error("step {step} is out of order, next is {}", describe_next(.expected))]
    OutOfOrder { step: Step, expected: Option<Step> },

    #[error("{0} is not known yet")]
    Unresolved(&'static str),
}

fn describe_next(expected: &Option<Step>) -> String {
    match expected {
        Some(step) => step.to_string(),
        None => "nothing, the plan is complete".to_string(),
    }
}

impl From<ClientError> for SetupError {
    fn from(error: ClientError) -> Self {
        SetupError::Rpc(Box::new(error))
    }
}
