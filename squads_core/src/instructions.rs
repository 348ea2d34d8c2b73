// Instruction builders for the Squads v4 program.
//
// Data is the Anchor discriminator followed by the borsh-encoded args struct.
// Pubkeys inside args are carried as raw `[u8; 32]`.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

use crate::message::VaultTransactionMessage;
use crate::{SquadsError, anchor_discriminator};

// ---------------------------------------------------------------------------
// Shared types
// ---------------------------------------------------------------------------

/// Member permission bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Permissions {
    pub mask: u8,
}

impl Permissions {
    pub const INITIATE: u8 = 1 << 0;
    pub const VOTE: u8 = 1 << 1;
    pub const EXECUTE: u8 = 1 << 2;

    pub fn all() -> Self {
        Self {
            mask: Self::INITIATE | Self::VOTE | Self::EXECUTE,
        }
    }

    pub fn has(&self, permission: u8) -> bool {
        self.mask & permission == permission
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Member {
    pub key: [u8; 32],
    pub permissions: Permissions,
}

impl Member {
    pub fn new(key: &Pubkey, permissions: Permissions) -> Self {
        Self {
            key: key.to_bytes(),
            permissions,
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.key)
    }
}

// ---------------------------------------------------------------------------
// Args
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MultisigCreateArgsV2 {
    /// `None` makes the multisig autonomous: config changes need proposals.
    pub config_authority: Option<[u8; 32]>,
    pub threshold: u16,
    pub members: Vec<Member>,
    /// Seconds between approval and earliest execution.
    pub time_lock: u32,
    pub rent_collector: Option<[u8; 32]>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct VaultTransactionCreateArgs {
    pub vault_index: u8,
    pub ephemeral_signers: u8,
    /// Serialized [`VaultTransactionMessage`].
    pub transaction_message: Vec<u8>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ProposalCreateArgs {
    pub transaction_index: u64,
    /// Draft proposals are not open for voting until activated.
    pub draft: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ProposalVoteArgs {
    pub memo: Option<String>,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct MultisigCreateAccounts {
    pub program_config: Pubkey,
    pub treasury: Pubkey,
    pub multisig: Pubkey,
    pub create_key: Pubkey,
    pub creator: Pubkey,
}

#[derive(Debug, Clone, Copy)]
pub struct VaultTransactionCreateAccounts {
    pub multisig: Pubkey,
    pub transaction: Pubkey,
    pub creator: Pubkey,
    pub rent_payer: Pubkey,
}

#[derive(Debug, Clone, Copy)]
pub struct ProposalCreateAccounts {
    pub multisig: Pubkey,
    pub proposal: Pubkey,
    pub creator: Pubkey,
    pub rent_payer: Pubkey,
}

#[derive(Debug, Clone, Copy)]
pub struct ProposalVoteAccounts {
    pub multisig: Pubkey,
    pub proposal: Pubkey,
    pub member: Pubkey,
}

#[derive(Debug, Clone, Copy)]
pub struct VaultTransactionExecuteAccounts {
    pub multisig: Pubkey,
    pub proposal: Pubkey,
    pub transaction: Pubkey,
    pub member: Pubkey,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn instruction_data<T: BorshSerialize>(name: &str, args: &T) -> Result<Vec<u8>, SquadsError> {
    let mut data = anchor_discriminator("global", name).to_vec();
    args.serialize(&mut data)?;
    Ok(data)
}

/// **Accounts:** program_config, treasury (w), multisig (w), create_key (s),
/// creator (s, w), system_program.
pub fn multisig_create_v2(
    program_id: &Pubkey,
    accounts: &MultisigCreateAccounts,
    args: &MultisigCreateArgsV2,
) -> Result<Instruction, SquadsError> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(accounts.program_config, false),
            AccountMeta::new(accounts.treasury, false),
            AccountMeta::new(accounts.multisig, false),
            AccountMeta::new_readonly(accounts.create_key, true),
            AccountMeta::new(accounts.creator, true),
            AccountMeta::new_readonly(solana_system_interface::program::ID, false),
        ],
        data: instruction_data("multisig_create_v2", args)?,
    })
}

/// **Accounts:** multisig (w), transaction (w), creator (s),
/// rent_payer (s, w), system_program.
pub fn vault_transaction_create(
    program_id: &Pubkey,
    accounts: &VaultTransactionCreateAccounts,
    args: &VaultTransactionCreateArgs,
) -> Result<Instruction, SquadsError> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(accounts.multisig, false),
            AccountMeta::new(accounts.transaction, false),
            AccountMeta::new_readonly(accounts.creator, true),
            AccountMeta::new(accounts.rent_payer, true),
            AccountMeta::new_readonly(solana_system_interface::program::ID, false),
        ],
        data: instruction_data("vault_transaction_create", args)?,
    })
}

/// **Accounts:** multisig, proposal (w), creator (s), rent_payer (s, w),
/// system_program.
pub fn proposal_create(
    program_id: &Pubkey,
    accounts: &ProposalCreateAccounts,
    args: &ProposalCreateArgs,
) -> Result<Instruction, SquadsError> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(accounts.multisig, false),
            AccountMeta::new(accounts.proposal, false),
            AccountMeta::new_readonly(accounts.creator, true),
            AccountMeta::new(accounts.rent_payer, true),
            AccountMeta::new_readonly(solana_system_interface::program::ID, false),
        ],
        data: instruction_data("proposal_create", args)?,
    })
}

/// **Accounts:** multisig, member (s, w), proposal (w).
pub fn proposal_approve(
    program_id: &Pubkey,
    accounts: &ProposalVoteAccounts,
    args: &ProposalVoteArgs,
) -> Result<Instruction, SquadsError> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(accounts.multisig, false),
            AccountMeta::new(accounts.member, true),
            AccountMeta::new(accounts.proposal, false),
        ],
        data: instruction_data("proposal_approve", args)?,
    })
}

/// **Accounts:** multisig, proposal (w), transaction, member (s), then every
/// account key of `message` with its writability, none of them signing.
pub fn vault_transaction_execute(
    program_id: &Pubkey,
    accounts: &VaultTransactionExecuteAccounts,
    message: &VaultTransactionMessage,
) -> Instruction {
    let mut metas = vec![
        AccountMeta::new_readonly(accounts.multisig, false),
        AccountMeta::new(accounts.proposal, false),
        AccountMeta::new_readonly(accounts.transaction, false),
        AccountMeta::new_readonly(accounts.member, true),
    ];
    metas.extend(message.execute_account_metas());

    Instruction {
        program_id: *program_id,
        accounts: metas,
        data: anchor_discriminator("global", "vault_transaction_execute").to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
