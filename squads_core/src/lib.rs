// squads_core — client-side encoding for the Squads v4 multisig program.
//
// Proposals are stored on-chain and gate a wrapped "vault transaction":
// create the transaction, create its proposal, collect approvals, execute.
// Nothing here talks to the network; every function is a pure encoder,
// decoder or PDA derivation.

pub mod instructions;
pub mod message;
pub mod request;
pub mod state;

use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;

pub use instructions::{Member, Permissions};
pub use message::{CompiledInstruction, VaultTransactionMessage};
pub use request::{GovernanceContext, WrappedTransactionRequest};
pub use state::{Multisig, ProgramConfig};

/// Canonical Squads v4 program id (mainnet-beta and devnet).
pub const SQUADS_PROGRAM_ID: Pubkey = solana_sdk::pubkey!("SQDS4ep65T869zMMBKyuUq6aD6EgTu8psMjkvj52pCf");

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SquadsError {
    #[error("no program address found for seeds under {owner}")]
    NoProgramAddress { owner: Pubkey },

    #[error("failed to encode instruction data: {0}")]
    Encode(#[from] std::io::Error),

    #[error("vault transaction message too large: {0}")]
    MessageTooLarge(String),

    #[error("account data is not a {account} account")]
    AccountDiscriminator { account: &'static str },

    #[error("failed to decode {account} account: {reason}")]
    Decode { account: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// Anchor discriminators
// ---------------------------------------------------------------------------

/// Anchor's 8-byte discriminator: `sha256("{namespace}:{name}")[..8]`.
///
/// Instructions use the `global` namespace with the snake_case handler name,
/// accounts use the `account` namespace with the type name.
pub fn anchor_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&digest[..8]);
    disc
}

// ---------------------------------------------------------------------------
// PDA derivation helpers
// ---------------------------------------------------------------------------

pub mod seeds {
    pub const SEED_PREFIX: &[u8] = b"multisig";
    pub const SEED_PROGRAM_CONFIG: &[u8] = b"program_config";
    pub const SEED_MULTISIG: &[u8] = b"multisig";
    pub const SEED_VAULT: &[u8] = b"vault";
    pub const SEED_TRANSACTION: &[u8] = b"transaction";
    pub const SEED_PROPOSAL: &[u8] = b"proposal";
    pub const SEED_EPHEMERAL_SIGNER: &[u8] = b"ephemeral_signer";
}

fn find_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<Pubkey, SquadsError> {
    Pubkey::try_find_program_address(seeds, program_id)
        .map(|(address, _)| address)
        .ok_or(SquadsError::NoProgramAddress { owner: *program_id })
}

/// Program-wide config holding the multisig creation fee and treasury.
pub fn get_program_config_pda(program_id: &Pubkey) -> Result<Pubkey, SquadsError> {
    find_address(&[seeds::SEED_PREFIX, seeds::SEED_PROGRAM_CONFIG], program_id)
}

pub fn get_multisig_pda(create_key: &Pubkey, program_id: &Pubkey) -> Result<Pubkey, SquadsError> {
    find_address(
        &[seeds::SEED_PREFIX, seeds::SEED_MULTISIG, create_key.as_ref()],
        program_id,
    )
}

/// Vault authority: the address that signs for wrapped transactions.
pub fn get_vault_pda(multisig: &Pubkey, vault_index: u8, program_id: &Pubkey) -> Result<Pubkey, SquadsError> {
    find_address(
        &[seeds::SEED_PREFIX, multisig.as_ref(), seeds::SEED_VAULT, &[vault_index]],
        program_id,
    )
}

pub fn get_transaction_pda(
    multisig: &Pubkey,
    transaction_index: u64,
    program_id: &Pubkey,
) -> Result<Pubkey, SquadsError> {
    find_address(
        &[
            seeds::SEED_PREFIX,
            multisig.as_ref(),
            seeds::SEED_TRANSACTION,
            &transaction_index.to_le_bytes(),
        ],
        program_id,
    )
}

pub fn get_proposal_pda(
    multisig: &Pubkey,
    transaction_index: u64,
    program_id: &Pubkey,
) -> Result<Pubkey, SquadsError> {
    find_address(
        &[
            seeds::SEED_PREFIX,
            multisig.as_ref(),
            seeds::SEED_TRANSACTION,
            &transaction_index.to_le_bytes(),
            seeds::SEED_PROPOSAL,
        ],
        program_id,
    )
}

/// One-time signer for slot `signer_index` of the given vault transaction.
/// The program signs for slots `0..ephemeral_signers` during execution.
pub fn get_ephemeral_signer_pda(
    transaction: &Pubkey,
    signer_index: u8,
    program_id: &Pubkey,
) -> Result<Pubkey, SquadsError> {
    find_address(
        &[
            seeds::SEED_PREFIX,
            transaction.as_ref(),
            seeds::SEED_EPHEMERAL_SIGNER,
            &[signer_index],
        ],
        program_id,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
