// Command-line surface and the run configuration built from it.
//
// `SetupConfig` is constructed once in `main` and handed to every component;
// nothing reads program ids or fees from globals.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use squads_core::SQUADS_PROGRAM_ID;
use vault_core::VaultConfigArgs;

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
pub const DEFAULT_FEE_BPS: u16 = 200;
pub const DEFAULT_DECIMALS: u8 = 9;
/// The wallet is the only approver, so a created multisig needs one vote.
pub const DEFAULT_THRESHOLD: u16 = 1;

/// Squads-governed staking vault bootstrap
///
/// Creates (or reuses) a Squads v4 multisig, wraps the vault program's
/// config and vault initialization calls in two vault transactions, then
/// proposes, approves and executes both:
///   create → propose → approve → execute
#[derive(Parser)]
#[command(name = "vault-squad", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full setup against a cluster
    Run(RunArgs),

    /// Print derived addresses and payloads without touching the network
    Addresses(AddressArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ProgramArgs {
    /// Vault program id (base58)
    #[arg(long, env = "VAULT_PROGRAM_ID")]
    pub vault_program_id: Pubkey,

    /// Squads v4 program id (base58)
    #[arg(long, env = "SQUADS_PROGRAM_ID", default_value_t = SQUADS_PROGRAM_ID)]
    pub squads_program_id: Pubkey,
}

#[derive(Args, Debug, Clone)]
pub struct FeeArgs {
    /// Deposit fee in basis points
    #[arg(long, default_value_t = DEFAULT_FEE_BPS)]
    pub deposit_fee_bps: u16,

    /// Withdrawal fee in basis points
    #[arg(long, default_value_t = DEFAULT_FEE_BPS)]
    pub withdrawal_fee_bps: u16,

    /// Reward fee in basis points
    #[arg(long, default_value_t = DEFAULT_FEE_BPS)]
    pub reward_fee_bps: u16,

    /// Decimals of the vault receipt token and of a newly created mint
    #[arg(long, default_value_t = DEFAULT_DECIMALS)]
    pub decimals: u8,
}

impl From<&FeeArgs> for VaultConfigArgs {
    fn from(fees: &FeeArgs) -> Self {
        VaultConfigArgs {
            deposit_fee_bps: fees.deposit_fee_bps,
            withdrawal_fee_bps: fees.withdrawal_fee_bps,
            reward_fee_bps: fees.reward_fee_bps,
            decimals: fees.decimals,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub programs: ProgramArgs,

    /// Restaking program id (base58)
    #[arg(long, env = "RESTAKING_PROGRAM_ID")]
    pub restaking_program_id: Pubkey,

    /// Existing multisig to use instead of creating one
    #[arg(long, env = "MULTISIG_ADDRESS")]
    pub multisig_address: Option<Pubkey>,

    /// Existing token mint for the vault instead of creating one
    #[arg(long, env = "VAULT_MINT")]
    pub mint: Option<Pubkey>,

    /// JSON RPC endpoint
    #[arg(long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Keypair file (JSON array of secret key bytes) that pays and approves
    #[arg(long, env = "WALLET_PATH")]
    pub wallet_path: PathBuf,

    /// Additional multisig members (repeat for several)
    #[arg(long)]
    pub member: Vec<Pubkey>,

    #[command(flatten)]
    pub fees: FeeArgs,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AddressArgs {
    #[command(flatten)]
    pub programs: ProgramArgs,

    /// Multisig whose vault transaction addresses should be derived
    #[arg(long, env = "MULTISIG_ADDRESS")]
    pub multisig_address: Option<Pubkey>,

    #[command(flatten)]
    pub fees: FeeArgs,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramIds {
    pub squads: Pubkey,
    pub vault: Pubkey,
    pub restaking: Pubkey,
}

#[derive(Debug, Clone)]
pub struct SetupConfig {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub wallet_path: PathBuf,
    pub programs: ProgramIds,
    /// Reused instead of created when set.
    pub multisig: Option<Pubkey>,
    /// Reused instead of created when set.
    pub mint: Option<Pubkey>,
    pub vault_args: VaultConfigArgs,
    pub extra_members: Vec<Pubkey>,
    pub threshold: u16,
    /// Squads vault whose authority administers the staking vault.
    pub vault_index: u8,
}

impl SetupConfig {
    /// Members of a newly created multisig: the wallet first, then the extra
    /// members without duplicates.
    pub fn members(&self, wallet: &Pubkey) -> Vec<Pubkey> {
        let mut members = vec![*wallet];
        for member in &self.extra_members {
            if !members.contains(member) {
                members.push(*member);
            }
        }
        members
    }
}

impl From<RunArgs> for SetupConfig {
    fn from(args: RunArgs) -> Self {
        SetupConfig {
            rpc_url: args.rpc_url,
            commitment: CommitmentConfig::confirmed(),
            wallet_path: args.wallet_path,
            programs: ProgramIds {
                squads: args.programs.squads_program_id,
                vault: args.programs.vault_program_id,
                restaking: args.restaking_program_id,
            },
            multisig: args.multisig_address,
            mint: args.mint,
            vault_args: VaultConfigArgs::from(&args.fees),
            extra_members: args.member,
            threshold: DEFAULT_THRESHOLD,
            vault_index: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
