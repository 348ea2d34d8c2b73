// vault_squad_cli — bootstraps a staking vault whose admin is a Squads v4
// vault authority.
//
// Library half of the `vault-squad` binary: configuration, wallet loading,
// the ledger seam, transaction assembly and the step orchestrator.

pub mod config;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod transactions;
pub mod wallet;

pub use config::SetupConfig;
pub use error::{Result, SetupError};
pub use ledger::{Ledger, LivenessToken, RpcLedger};
pub use orchestrator::{Orchestrator, RunReport, Step};
