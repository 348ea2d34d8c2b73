// Transaction assembly: vault-program calls wrapped for governance, plus the
// plain transactions that create the multisig and the vault's token mint.

use std::fmt;

use serde::{Serialize, Serializer};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_system_interface::instruction as system_instruction;
use spl_token::solana_program::program_pack::Pack;
use squads_core::instructions::{MultisigCreateAccounts, MultisigCreateArgsV2, multisig_create_v2};
use squads_core::{
    GovernanceContext, Member, Permissions, WrappedTransactionRequest, get_ephemeral_signer_pda,
    get_multisig_pda, get_program_config_pda, get_proposal_pda, get_transaction_pda, get_vault_pda,
};
use vault_core::{
    VaultConfigArgs, build_config_init_instruction, build_vault_init_instruction,
    compute_config_pda, compute_vault_pda,
};

use crate::config::ProgramIds;
use crate::error::Result;

/// Ephemeral signer slot standing in for the vault's base key.
pub const BASE_SIGNER_SLOT: u8 = 0;
/// Ephemeral signer slot standing in for the new VRT mint.
pub const VRT_MINT_SIGNER_SLOT: u8 = 1;

pub(crate) fn serialize_display<T, S>(value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: fmt::Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

// ---------------------------------------------------------------------------
// Wrapped vault transactions
// ---------------------------------------------------------------------------

/// The two governed vault-program calls. Their transaction indices are fixed:
/// the multisig must not have created any transaction before this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    VaultConfig,
    VaultInit,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 2] = [TransactionKind::VaultConfig, TransactionKind::VaultInit];

    pub fn transaction_index(self) -> u64 {
        match self {
            TransactionKind::VaultConfig => 1,
            TransactionKind::VaultInit => 2,
        }
    }

    pub fn ephemeral_signers(self) -> u8 {
        match self {
            TransactionKind::VaultConfig => 0,
            TransactionKind::VaultInit => 2,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::VaultConfig => write!(f, "vault-config"),
            TransactionKind::VaultInit => write!(f, "vault-init"),
        }
    }
}

/// Accounts touched by `InitializeVault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitVaultAddresses {
    pub config: Pubkey,
    pub vault: Pubkey,
    pub base: Pubkey,
    pub vrt_mint: Pubkey,
    pub mint: Pubkey,
    pub admin: Pubkey,
}

/// `InitializeConfig` with the vault authority as admin, wrapped at index 1.
/// Returns the request and the config address.
pub fn vault_config_request(
    ctx: &GovernanceContext,
    programs: &ProgramIds,
) -> Result<(WrappedTransactionRequest, Pubkey)> {
    let kind = TransactionKind::VaultConfig;
    let config = compute_config_pda(&programs.vault)?;
    let admin = ctx.vault_authority()?;
    let instruction = build_config_init_instruction(&programs.vault, &programs.restaking, &admin, &config);
    let request = ctx.wrap(kind.transaction_index(), kind.ephemeral_signers(), vec![instruction]);
    Ok((request, config))
}

/// `InitializeVault` wrapped at index 2. The base and VRT mint are ephemeral
/// signers of that transaction, so the vault address depends on the multisig.
pub fn vault_init_request(
    ctx: &GovernanceContext,
    programs: &ProgramIds,
    mint: &Pubkey,
    args: &VaultConfigArgs,
) -> Result<(WrappedTransactionRequest, InitVaultAddresses)> {
    let kind = TransactionKind::VaultInit;
    let index = kind.transaction_index();
    let addresses = InitVaultAddresses {
        config: compute_config_pda(&programs.vault)?,
        vault: compute_vault_pda(&programs.vault, &ctx.ephemeral_signer(index, BASE_SIGNER_SLOT)?)?,
        base: ctx.ephemeral_signer(index, BASE_SIGNER_SLOT)?,
        vrt_mint: ctx.ephemeral_signer(index, VRT_MINT_SIGNER_SLOT)?,
        mint: *mint,
        admin: ctx.vault_authority()?,
    };
    let instruction = build_vault_init_instruction(
        &programs.vault,
        &addresses.config,
        &addresses.vault,
        &addresses.vrt_mint,
        &addresses.mint,
        &addresses.admin,
        &addresses.base,
        &args.pack(),
    );
    let request = ctx.wrap(index, kind.ephemeral_signers(), vec![instruction]);
    Ok((request, addresses))
}

// ---------------------------------------------------------------------------
// Plain transactions
// ---------------------------------------------------------------------------

/// `multisig_create_v2` for an autonomous multisig where every member holds
/// all permissions. `create_key` must sign. Returns the instruction and the
/// new multisig address.
pub fn multisig_create_instruction(
    squads_program_id: &Pubkey,
    creator: &Pubkey,
    create_key: &Pubkey,
    members: &[Pubkey],
    threshold: u16,
    treasury: &Pubkey,
) -> Result<(Instruction, Pubkey)> {
    let multisig = get_multisig_pda(create_key, squads_program_id)?;
    let instruction = multisig_create_v2(
        squads_program_id,
        &MultisigCreateAccounts {
            program_config: get_program_config_pda(squads_program_id)?,
            treasury: *treasury,
            multisig,
            create_key: *create_key,
            creator: *creator,
        },
        &MultisigCreateArgsV2 {
            config_authority: None,
            threshold,
            members: members
                .iter()
                .map(|key| Member::new(key, Permissions::all()))
                .collect(),
            time_lock: 0,
            rent_collector: None,
            memo: None,
        },
    )?;
    Ok((instruction, multisig))
}

/// Allocate and initialize a token mint controlled by `authority`. The mint
/// keypair must sign.
pub fn create_mint_instructions(
    payer: &Pubkey,
    mint: &Pubkey,
    authority: &Pubkey,
    decimals: u8,
    lamports: u64,
) -> Result<Vec<Instruction>> {
    Ok(vec![
        system_instruction::create_account(
            payer,
            mint,
            lamports,
            spl_token::state::Mint::LEN as u64,
            &spl_token::ID,
        ),
        spl_token::instruction::initialize_mint2(&spl_token::ID, mint, authority, Some(authority), decimals)?,
    ])
}

// ---------------------------------------------------------------------------
// Offline address book
// ---------------------------------------------------------------------------

/// Addresses that depend on a multisig.
#[derive(Debug, Clone, Serialize)]
pub struct GovernedAddresses {
    #[serde(serialize_with = "serialize_display")]
    pub multisig: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub vault_authority: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub config_transaction: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub config_proposal: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub init_transaction: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub init_proposal: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub base: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub vrt_mint: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub vault: Pubkey,
}

/// Everything derivable without a network connection.
#[derive(Debug, Clone, Serialize)]
pub struct AddressBook {
    #[serde(serialize_with = "serialize_display")]
    pub vault_config: Pubkey,
    pub vault_args: VaultConfigArgs,
    pub init_vault_payload: String,
    pub governed: Option<GovernedAddresses>,
}

impl AddressBook {
    pub fn derive(
        squads_program_id: &Pubkey,
        vault_program_id: &Pubkey,
        multisig: Option<&Pubkey>,
        vault_index: u8,
        args: &VaultConfigArgs,
    ) -> Result<Self> {
        let governed = match multisig {
            Some(multisig) => {
                let config_index = TransactionKind::VaultConfig.transaction_index();
                let init_index = TransactionKind::VaultInit.transaction_index();
                let init_transaction = get_transaction_pda(multisig, init_index, squads_program_id)?;
                let base = get_ephemeral_signer_pda(&init_transaction, BASE_SIGNER_SLOT, squads_program_id)?;
                Some(GovernedAddresses {
                    multisig: *multisig,
                    vault_authority: get_vault_pda(multisig, vault_index, squads_program_id)?,
                    config_transaction: get_transaction_pda(multisig, config_index, squads_program_id)?,
                    config_proposal: get_proposal_pda(multisig, config_index, squads_program_id)?,
                    init_transaction,
                    init_proposal: get_proposal_pda(multisig, init_index, squads_program_id)?,
                    base,
                    vrt_mint: get_ephemeral_signer_pda(&init_transaction, VRT_MINT_SIGNER_SLOT, squads_program_id)?,
                    vault: compute_vault_pda(vault_program_id, &base)?,
                })
            }
            None => None,
        };

        Ok(AddressBook {
            vault_config: compute_config_pda(vault_program_id)?,
            vault_args: *args,
            init_vault_payload: hex::encode(args.pack()),
            governed,
        })
    }
}

impl fmt::Display for AddressBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📍 Derived addresses")?;
        writeln!(f, "   Vault config:        {}", self.vault_config)?;
        writeln!(
            f,
            "   Fees (bps):          deposit {} / withdrawal {} / reward {}",
            self.vault_args.deposit_fee_bps, self.vault_args.withdrawal_fee_bps, self.vault_args.reward_fee_bps
        )?;
        writeln!(f, "   Decimals:            {}", self.vault_args.decimals)?;
        writeln!(f, "   InitializeVault:     {}", self.init_vault_payload)?;
        match &self.governed {
            Some(g) => {
                writeln!(f, "   Multisig:            {}", g.multisig)?;
                writeln!(f, "   Vault authority:     {}", g.vault_authority)?;
                writeln!(f, "   Config tx #1:        {}", g.config_transaction)?;
                writeln!(f, "   Config proposal #1:  {}", g.config_proposal)?;
                writeln!(f, "   Init tx #2:          {}", g.init_transaction)?;
                writeln!(f, "   Init proposal #2:    {}", g.init_proposal)?;
                writeln!(f, "   Vault base:          {}", g.base)?;
                writeln!(f, "   VRT mint:            {}", g.vrt_mint)?;
                write!(f, "   Vault:               {}", g.vault)
            }
            None => write!(f, "   (pass --multisig-address for governed addresses)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use squads_core::{SQUADS_PROGRAM_ID, anchor_discriminator};

    fn programs() -> ProgramIds {
        ProgramIds {
            squads: SQUADS_PROGRAM_ID,
            vault: Pubkey::new_unique(),
            restaking: Pubkey::new_unique(),
        }
    }

    fn context() -> GovernanceContext {
        let wallet = Pubkey::new_unique();
        GovernanceContext {
            program_id: SQUADS_PROGRAM_ID,
            multisig: Pubkey::new_unique(),
            creator: wallet,
            fee_payer: wallet,
            rent_payer: wallet,
            vault_index: 0,
        }
    }

    fn args() -> VaultConfigArgs {
        VaultConfigArgs {
            deposit_fee_bps: 200,
            withdrawal_fee_bps: 200,
            reward_fee_bps: 200,
            decimals: 9,
        }
    }

    #[test]
    fn test_kind_indices_and_signer_slots() {
        assert_eq!(TransactionKind::VaultConfig.transaction_index(), 1);
        assert_eq!(TransactionKind::VaultInit.transaction_index(), 2);
        assert_eq!(TransactionKind::VaultConfig.ephemeral_signers(), 0);
        assert_eq!(TransactionKind::VaultInit.ephemeral_signers(), 2);
    }

    #[test]
    fn test_config_request_uses_vault_authority_as_admin() {
        let ctx = context();
        let programs = programs();
        let (request, config) = vault_config_request(&ctx, &programs).unwrap();

        assert_eq!(request.transaction_index, 1);
        assert_eq!(request.ephemeral_signers, 0);
        assert_eq!(config, compute_config_pda(&programs.vault).unwrap());

        let ix = &request.instructions[0];
        assert_eq!(ix.data, vec![0]);
        assert_eq!(ix.accounts[0].pubkey, config);
        assert_eq!(ix.accounts[1].pubkey, ctx.vault_authority().unwrap());
        assert_eq!(ix.accounts[2].pubkey, programs.restaking);
    }

    #[test]
    fn test_init_request_uses_ephemeral_signers_of_index_two() {
        let ctx = context();
        let programs = programs();
        let mint = Pubkey::new_unique();
        let (request, addresses) = vault_init_request(&ctx, &programs, &mint, &args()).unwrap();

        assert_eq!(request.transaction_index, 2);
        assert_eq!(request.ephemeral_signers, 2);
        assert_eq!(addresses.base, ctx.ephemeral_signer(2, 0).unwrap());
        assert_eq!(addresses.vrt_mint, ctx.ephemeral_signer(2, 1).unwrap());
        assert_eq!(addresses.vault, compute_vault_pda(&programs.vault, &addresses.base).unwrap());

        let ix = &request.instructions[0];
        let keys: Vec<Pubkey> = ix.accounts.iter().map(|meta| meta.pubkey).collect();
        assert_eq!(
            &keys[..6],
            &[
                addresses.config,
                addresses.vault,
                addresses.vrt_mint,
                mint,
                addresses.admin,
                addresses.base
            ]
        );
        assert_eq!(ix.data, args().pack().to_vec());
    }

    #[test]
    fn test_init_request_compiles_with_three_signers() {
        let ctx = context();
        let (request, _) = vault_init_request(&ctx, &programs(), &Pubkey::new_unique(), &args()).unwrap();
        let message = request.compile_message().unwrap();

        // vault authority, vrt mint, base
        assert_eq!(message.num_signers, 3);
        assert_eq!(message.account_keys[0], ctx.vault_authority().unwrap());
    }

    #[test]
    fn test_multisig_create_grants_all_permissions() {
        let creator = Pubkey::new_unique();
        let create_key = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        let treasury = Pubkey::new_unique();
        let (ix, multisig) =
            multisig_create_instruction(&SQUADS_PROGRAM_ID, &creator, &create_key, &[creator, other], 1, &treasury)
                .unwrap();

        assert_eq!(multisig, get_multisig_pda(&create_key, &SQUADS_PROGRAM_ID).unwrap());
        assert_eq!(&ix.data[..8], &anchor_discriminator("global", "multisig_create_v2"));
        // None config authority, threshold 1, two members
        assert_eq!(ix.data[8], 0);
        assert_eq!(&ix.data[9..11], &1u16.to_le_bytes());
        assert_eq!(&ix.data[11..15], &2u32.to_le_bytes());
        assert_eq!(&ix.data[15..47], creator.as_ref());
        assert_eq!(ix.data[47], Permissions::all().mask);
        assert_eq!(ix.accounts[1].pubkey, treasury);
        assert_eq!(ix.accounts[2].pubkey, multisig);
        assert!(ix.accounts[3].is_signer);
    }

    #[test]
    fn test_create_mint_instructions() {
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let ixs = create_mint_instructions(&payer, &mint, &authority, 6, 1_461_600).unwrap();

        assert_eq!(ixs.len(), 2);
        assert_eq!(ixs[0].program_id, solana_system_interface::program::ID);
        assert_eq!(ixs[0].accounts[1].pubkey, mint);
        assert!(ixs[0].accounts[1].is_signer);
        assert_eq!(ixs[1].program_id, spl_token::ID);
        assert_eq!(ixs[1].accounts[0].pubkey, mint);
    }

    #[test]
    fn test_address_book_without_multisig() {
        let vault_program = Pubkey::new_unique();
        let book = AddressBook::derive(&SQUADS_PROGRAM_ID, &vault_program, None, 0, &args()).unwrap();
        assert_eq!(book.vault_config, compute_config_pda(&vault_program).unwrap());
        assert_eq!(book.init_vault_payload, "01c800c800c8000900");
        assert!(book.governed.is_none());

        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["vault_config"], book.vault_config.to_string());
        assert_eq!(json["vault_args"]["deposit_fee_bps"], 200);
        assert_eq!(json["vault_args"]["decimals"], 9);
        assert!(json["governed"].is_null());
    }

    #[test]
    fn test_address_book_matches_requests() {
        let ctx = context();
        let programs = programs();
        let (_, addresses) = vault_init_request(&ctx, &programs, &Pubkey::new_unique(), &args()).unwrap();
        let book =
            AddressBook::derive(&SQUADS_PROGRAM_ID, &programs.vault, Some(&ctx.multisig), 0, &args()).unwrap();
        let governed = book.governed.unwrap();

        assert_eq!(governed.vault_authority, ctx.vault_authority().unwrap());
        assert_eq!(governed.base, addresses.base);
        assert_eq!(governed.vrt_mint, addresses.vrt_mint);
        assert_eq!(governed.vault, addresses.vault);
        assert_eq!(governed.init_transaction, ctx.transaction_address(2).unwrap());
    }
}
