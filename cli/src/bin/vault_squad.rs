use std::io::stdout;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use solana_sdk::signer::Signer;
use vault_squad_cli::config::{Cli, Commands, SetupConfig};
use vault_squad_cli::transactions::AddressBook;
use vault_squad_cli::wallet::load_wallet;
use vault_squad_cli::{Orchestrator, RpcLedger};
use vault_core::VaultConfigArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let json = args.json;
            let config = SetupConfig::from(args);
            let wallet = load_wallet(&config.wallet_path)?;
            let ledger = RpcLedger::new(config.rpc_url.clone(), config.commitment);

            log::info!("🔑 Wallet {} on {}", wallet.pubkey(), ledger.url());
            log::info!("   Vault program:     {}", config.programs.vault);
            log::info!("   Restaking program: {}", config.programs.restaking);
            log::info!("   Squads program:    {}", config.programs.squads);

            let report = Orchestrator::new(&ledger, &config, &wallet)
                .run()
                .await
                .context("vault setup aborted")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
        }

        Commands::Addresses(args) => {
            let book = AddressBook::derive(
                &args.programs.squads_program_id,
                &args.programs.vault_program_id,
                args.multisig_address.as_ref(),
                0,
                &VaultConfigArgs::from(&args.fees),
            )?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&book)?);
            } else {
                println!("{book}");
            }
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "vault-squad", &mut stdout());
        }
    }

    Ok(())
}
