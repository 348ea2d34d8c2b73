// orchestrator — drives the setup plan one confirmed step at a time.
//
//   create multisig → create mint
//     → create tx #1, #2 → propose #1, #2 → approve #1, #2 → execute #1, #2
//
// A step only starts once the step before it in `PLAN` is confirmed. Each
// submitted transaction carries a freshly fetched blockhash. The first
// failure aborts the run; confirmed steps are not rolled back.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;
use spl_token::solana_program::program_pack::Pack;
use squads_core::{GovernanceContext, Multisig, ProgramConfig, WrappedTransactionRequest, get_program_config_pda};

use crate::config::SetupConfig;
use crate::error::{Result, SetupError};
use crate::ledger::Ledger;
use crate::transactions::{
    InitVaultAddresses, TransactionKind, create_mint_instructions, multisig_create_instruction,
    serialize_display, vault_config_request, vault_init_request,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Create a multisig, or verify the supplied one.
    CreateMultisig,
    /// Create the vault's token mint unless one was supplied.
    CreateMint,
    CreateTransaction(TransactionKind),
    CreateProposal(TransactionKind),
    ApproveProposal(TransactionKind),
    Execute(TransactionKind),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::CreateMultisig => write!(f, "create-multisig"),
            Step::CreateMint => write!(f, "create-mint"),
            Step::CreateTransaction(kind) => write!(f, "create-transaction({kind})"),
            Step::CreateProposal(kind) => write!(f, "create-proposal({kind})"),
            Step::ApproveProposal(kind) => write!(f, "approve-proposal({kind})"),
            Step::Execute(kind) => write!(f, "execute({kind})"),
        }
    }
}

pub const PLAN: [Step; 10] = [
    Step::CreateMultisig,
    Step::CreateMint,
    Step::CreateTransaction(TransactionKind::VaultConfig),
    Step::CreateTransaction(TransactionKind::VaultInit),
    Step::CreateProposal(TransactionKind::VaultConfig),
    Step::CreateProposal(TransactionKind::VaultInit),
    Step::ApproveProposal(TransactionKind::VaultConfig),
    Step::ApproveProposal(TransactionKind::VaultInit),
    Step::Execute(TransactionKind::VaultConfig),
    Step::Execute(TransactionKind::VaultInit),
];

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    #[serde(serialize_with = "serialize_display")]
    pub step: Step,
    /// `None` when the step reused existing state instead of submitting.
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(serialize_with = "serialize_display")]
    pub multisig: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub vault_authority: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub mint: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub config: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub vault: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub base: Pubkey,
    #[serde(serialize_with = "serialize_display")]
    pub vrt_mint: Pubkey,
    pub steps: Vec<StepRecord>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "✅ Vault setup complete")?;
        writeln!(f, "   Multisig:         {}", self.multisig)?;
        writeln!(f, "   Vault authority:  {}", self.vault_authority)?;
        writeln!(f, "   Mint:             {}", self.mint)?;
        writeln!(f, "   Vault config:     {}", self.config)?;
        writeln!(f, "   Vault:            {}", self.vault)?;
        writeln!(f, "   Vault base:       {}", self.base)?;
        writeln!(f, "   VRT mint:         {}", self.vrt_mint)?;
        write!(f, "   Steps:")?;
        for record in &self.steps {
            let signature = record.signature.as_deref().unwrap_or("(reused)");
            write!(f, "\n     {:<36} {}", record.step.to_string(), signature)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<'a, L: Ledger> {
    ledger: &'a L,
    config: &'a SetupConfig,
    wallet: &'a Keypair,
    /// Index into `PLAN` of the next step allowed to run.
    next: usize,
    multisig: Option<Pubkey>,
    mint: Option<Pubkey>,
    requests: HashMap<TransactionKind, WrappedTransactionRequest>,
    init_addresses: Option<InitVaultAddresses>,
    records: Vec<StepRecord>,
}

impl<'a, L: Ledger> Orchestrator<'a, L> {
    pub fn new(ledger: &'a L, config: &'a SetupConfig, wallet: &'a Keypair) -> Self {
        Self {
            ledger,
            config,
            wallet,
            next: 0,
            multisig: None,
            mint: None,
            requests: HashMap::new(),
            init_addresses: None,
            records: Vec::with_capacity(PLAN.len()),
        }
    }

    /// Run every remaining step of `PLAN` and report what was created.
    pub async fn run(mut self) -> Result<RunReport> {
        while let Some(step) = PLAN.get(self.next).copied() {
            self.run_step(step).await?;
        }
        self.report()
    }

    /// Run one step. Fails with `OutOfOrder` unless `step` is the next one in
    /// `PLAN`.
    pub async fn run_step(&mut self, step: Step) -> Result<()> {
        let expected = PLAN.get(self.next).copied();
        if expected != Some(step) {
            return Err(SetupError::OutOfOrder { step, expected });
        }

        log::info!("▶ {step}");
        let signature = match step {
            Step::CreateMultisig => self.create_multisig().await?,
            Step::CreateMint => self.create_mint().await?,
            Step::CreateTransaction(kind) => {
                let request = self.build_request(kind)?;
                let instruction = request.create_instruction()?;
                let payer = request.context.fee_payer;
                self.requests.insert(kind, request);
                Some(self.submit_and_confirm(step, &payer, vec![instruction], &[]).await?)
            }
            Step::CreateProposal(kind) => {
                let request = self.request(kind)?;
                let instruction = request.proposal_create_instruction()?;
                Some(self.submit_and_confirm(step, &request.context.fee_payer, vec![instruction], &[]).await?)
            }
            Step::ApproveProposal(kind) => {
                let request = self.request(kind)?;
                let instruction = request.proposal_approve_instruction(&self.wallet.pubkey())?;
                Some(self.submit_and_confirm(step, &request.context.fee_payer, vec![instruction], &[]).await?)
            }
            Step::Execute(kind) => {
                let request = self.request(kind)?;
                let instruction = request.execute_instruction(&self.wallet.pubkey())?;
                Some(self.submit_and_confirm(step, &request.context.fee_payer, vec![instruction], &[]).await?)
            }
        };

        self.records.push(StepRecord {
            step,
            signature: signature.map(|s| s.to_string()),
        });
        self.next += 1;
        Ok(())
    }

    /// Steps confirmed so far.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn report(&self) -> Result<RunReport> {
        let ctx = self.context()?;
        let init = self.init_addresses.ok_or(SetupError::Unresolved("vault init addresses"))?;
        Ok(RunReport {
            multisig: ctx.multisig,
            vault_authority: ctx.vault_authority()?,
            mint: init.mint,
            config: init.config,
            vault: init.vault,
            base: init.base,
            vrt_mint: init.vrt_mint,
            steps: self.records.clone(),
        })
    }

    // -- steps ---------------------------------------------------------------

    async fn create_multisig(&mut self) -> Result<Option<Signature>> {
        if let Some(multisig) = self.config.multisig {
            self.verify_multisig(&multisig).await?;
            log::info!("   Using multisig {multisig}");
            self.multisig = Some(multisig);
            return Ok(None);
        }

        let squads = self.config.programs.squads;
        let program_config_address = get_program_config_pda(&squads)?;
        let program_config =
            ProgramConfig::try_from_account_data(&self.ledger.account_data(&program_config_address).await?)?;

        let create_key = Keypair::new();
        let members = self.config.members(&self.wallet.pubkey());
        let (instruction, multisig) = multisig_create_instruction(
            &squads,
            &self.wallet.pubkey(),
            &create_key.pubkey(),
            &members,
            self.config.threshold,
            &program_config.treasury(),
        )?;
        log::info!(
            "   Multisig {multisig} ({}-of-{})",
            self.config.threshold,
            members.len()
        );

        let signature = self
            .submit_and_confirm(Step::CreateMultisig, &self.wallet.pubkey(), vec![instruction], &[&create_key])
            .await?;
        self.multisig = Some(multisig);
        Ok(Some(signature))
    }

    /// A supplied multisig must let the wallet drive both transactions alone,
    /// execute right after approval and not have used indices 1 and 2 yet.
    async fn verify_multisig(&self, address: &Pubkey) -> Result<()> {
        let mismatch = |reason: String| SetupError::MultisigMismatch {
            multisig: *address,
            reason,
        };

        let multisig = Multisig::try_from_account_data(&self.ledger.account_data(address).await?)?;
        let wallet = self.wallet.pubkey();
        if !multisig.can_drive_alone(&wallet) {
            return Err(mismatch(format!(
                "{wallet} is not a member with initiate, vote and execute permissions"
            )));
        }
        if multisig.threshold != 1 {
            return Err(mismatch(format!("threshold is {}, expected 1", multisig.threshold)));
        }
        if multisig.time_lock != 0 {
            return Err(mismatch(format!("time lock is {}s, expected 0", multisig.time_lock)));
        }
        if multisig.transaction_index != 0 {
            return Err(mismatch(format!(
                "transaction index is {}, expected 0",
                multisig.transaction_index
            )));
        }
        Ok(())
    }

    async fn create_mint(&mut self) -> Result<Option<Signature>> {
        if let Some(mint) = self.config.mint {
            log::info!("   Using mint {mint}");
            self.mint = Some(mint);
            return Ok(None);
        }

        let authority = self.context()?.vault_authority()?;
        let mint = Keypair::new();
        let lamports = self
            .ledger
            .rent_exempt_minimum(spl_token::state::Mint::LEN)
            .await?;
        let instructions = create_mint_instructions(
            &self.wallet.pubkey(),
            &mint.pubkey(),
            &authority,
            self.config.vault_args.decimals,
            lamports,
        )?;
        log::info!("   Mint {} (authority {authority})", mint.pubkey());

        let signature = self
            .submit_and_confirm(Step::CreateMint, &self.wallet.pubkey(), instructions, &[&mint])
            .await?;
        self.mint = Some(mint.pubkey());
        Ok(Some(signature))
    }

    // -- helpers -------------------------------------------------------------

    fn context(&self) -> Result<GovernanceContext> {
        let wallet = self.wallet.pubkey();
        Ok(GovernanceContext {
            program_id: self.config.programs.squads,
            multisig: self.multisig.ok_or(SetupError::Unresolved("multisig"))?,
            creator: wallet,
            fee_payer: wallet,
            rent_payer: wallet,
            vault_index: self.config.vault_index,
        })
    }

    fn build_request(&mut self, kind: TransactionKind) -> Result<WrappedTransactionRequest> {
        let ctx = self.context()?;
        let request = match kind {
            TransactionKind::VaultConfig => {
                let (request, config) = vault_config_request(&ctx, &self.config.programs)?;
                log::info!("   Vault config {config}");
                request
            }
            TransactionKind::VaultInit => {
                let mint = self.mint.ok_or(SetupError::Unresolved("mint"))?;
                let (request, addresses) =
                    vault_init_request(&ctx, &self.config.programs, &mint, &self.config.vault_args)?;
                log::info!("   Vault {} (base {})", addresses.vault, addresses.base);
                log::info!("   VRT mint {}", addresses.vrt_mint);
                self.init_addresses = Some(addresses);
                request
            }
        };
        log::info!(
            "   Transaction #{} at {}",
            request.transaction_index,
            request.transaction_address()?
        );
        Ok(request)
    }

    fn request(&self, kind: TransactionKind) -> Result<&WrappedTransactionRequest> {
        self.requests
            .get(&kind)
            .ok_or(SetupError::Unresolved("wrapped transaction"))
    }

    async fn submit_and_confirm(
        &self,
        step: Step,
        payer: &Pubkey,
        instructions: Vec<Instruction>,
        extra_signers: &[&Keypair],
    ) -> Result<Signature> {
        let token = self.ledger.latest_liveness_token().await?;
        let message = Message::new_with_blockhash(&instructions, Some(payer), &token.blockhash);

        let mut signers: Vec<&Keypair> = vec![self.wallet];
        signers.extend_from_slice(extra_signers);
        let mut transaction = Transaction::new_unsigned(message);
        transaction.try_sign(&signers, token.blockhash)?;

        let signature = self.ledger.submit(&transaction).await?;
        log::info!("📤 {step} submitted");
        log::info!("   signature: {signature}");
        self.ledger.confirm(&signature, &token).await?;
        log::info!("✅ {step} confirmed");
        Ok(signature)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
