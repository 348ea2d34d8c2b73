//! Environment helpers for the live-cluster tests.
//!
//! | Variable               | Default                         |
//! |------------------------|---------------------------------|
//! | `RPC_URL`              | `http://127.0.0.1:8899`         |
//! | `WALLET_PATH`          | `~/.config/solana/id.json`      |
//! | `VAULT_PROGRAM_ID`     | required                        |
//! | `RESTAKING_PROGRAM_ID` | required                        |
//! | `SQUADS_PROGRAM_ID`    | canonical Squads v4 program id  |

use std::path::PathBuf;
use std::str::FromStr;

use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use squads_core::SQUADS_PROGRAM_ID;
use vault_core::VaultConfigArgs;
use vault_squad_cli::config::{ProgramIds, SetupConfig};

pub const DEFAULT_LOCAL_RPC_URL: &str = "http://127.0.0.1:8899";

pub fn rpc_url() -> String {
    std::env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_LOCAL_RPC_URL.to_string())
}

pub fn wallet_path() -> PathBuf {
    match std::env::var("WALLET_PATH") {
        Ok(path) => PathBuf::from(path),
        Err(_) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/solana/id.json")
        }
    }
}

/// Read a base58 program id from `var`. Panics with a hint when unset.
pub fn program_id(var: &str) -> Pubkey {
    let value = std::env::var(var).unwrap_or_else(|_| panic!("{var} must be set for e2e tests"));
    Pubkey::from_str(&value).unwrap_or_else(|e| panic!("{var} is not a valid pubkey: {e}"))
}

pub fn squads_program_id() -> Pubkey {
    std::env::var("SQUADS_PROGRAM_ID")
        .ok()
        .and_then(|value| Pubkey::from_str(&value).ok())
        .unwrap_or(SQUADS_PROGRAM_ID)
}

/// Configuration for a fresh run: new multisig, new mint, default fees.
pub fn setup_config() -> SetupConfig {
    SetupConfig {
        rpc_url: rpc_url(),
        commitment: CommitmentConfig::confirmed(),
        wallet_path: wallet_path(),
        programs: ProgramIds {
            squads: squads_program_id(),
            vault: program_id("VAULT_PROGRAM_ID"),
            restaking: program_id("RESTAKING_PROGRAM_ID"),
        },
        multisig: None,
        mint: None,
        vault_args: VaultConfigArgs {
            deposit_fee_bps: 200,
            withdrawal_fee_bps: 200,
            reward_fee_bps: 200,
            decimals: 9,
        },
        extra_members: vec![],
        threshold: 1,
        vault_index: 0,
    }
}
