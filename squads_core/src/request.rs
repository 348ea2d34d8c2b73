// Governance-wrapped transaction requests.
//
// A request ties inner instructions to one transaction index of one multisig.
// The create, proposal, approval and execution instructions are all produced
// from the same request, so they cannot disagree on the index.

use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;

use crate::instructions::{
    self, ProposalCreateAccounts, ProposalCreateArgs, ProposalVoteAccounts, ProposalVoteArgs,
    VaultTransactionCreateAccounts, VaultTransactionCreateArgs, VaultTransactionExecuteAccounts,
};
use crate::message::VaultTransactionMessage;
use crate::{SquadsError, get_ephemeral_signer_pda, get_proposal_pda, get_transaction_pda, get_vault_pda};

/// Who creates and pays for wrapped transactions of one multisig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernanceContext {
    pub program_id: Pubkey,
    pub multisig: Pubkey,
    pub creator: Pubkey,
    /// Pays the fees of every transaction that carries this context's instructions.
    pub fee_payer: Pubkey,
    pub rent_payer: Pubkey,
    pub vault_index: u8,
}

impl GovernanceContext {
    pub fn vault_authority(&self) -> Result<Pubkey, SquadsError> {
        get_vault_pda(&self.multisig, self.vault_index, &self.program_id)
    }

    pub fn transaction_address(&self, transaction_index: u64) -> Result<Pubkey, SquadsError> {
        get_transaction_pda(&self.multisig, transaction_index, &self.program_id)
    }

    /// Ephemeral signer `slot` of the transaction at `transaction_index`.
    pub fn ephemeral_signer(&self, transaction_index: u64, slot: u8) -> Result<Pubkey, SquadsError> {
        let transaction = self.transaction_address(transaction_index)?;
        get_ephemeral_signer_pda(&transaction, slot, &self.program_id)
    }

    pub fn wrap(
        &self,
        transaction_index: u64,
        ephemeral_signers: u8,
        instructions: Vec<Instruction>,
    ) -> WrappedTransactionRequest {
        WrappedTransactionRequest {
            context: *self,
            transaction_index,
            ephemeral_signers,
            instructions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedTransactionRequest {
    pub context: GovernanceContext,
    pub transaction_index: u64,
    /// One-time signer slots the inner instructions need.
    pub ephemeral_signers: u8,
    pub instructions: Vec<Instruction>,
}

impl WrappedTransactionRequest {
    pub fn transaction_address(&self) -> Result<Pubkey, SquadsError> {
        self.context.transaction_address(self.transaction_index)
    }

    pub fn proposal_address(&self) -> Result<Pubkey, SquadsError> {
        get_proposal_pda(&self.context.multisig, self.transaction_index, &self.context.program_id)
    }

    pub fn compile_message(&self) -> Result<VaultTransactionMessage, SquadsError> {
        VaultTransactionMessage::try_compile(&self.context.vault_authority()?, &self.instructions)
    }

    pub fn create_instruction(&self) -> Result<Instruction, SquadsError> {
        let message = self.compile_message()?;
        instructions::vault_transaction_create(
            &self.context.program_id,
            &VaultTransactionCreateAccounts {
                multisig: self.context.multisig,
                transaction: self.transaction_address()?,
                creator: self.context.creator,
                rent_payer: self.context.rent_payer,
            },
            &VaultTransactionCreateArgs {
                vault_index: self.context.vault_index,
                ephemeral_signers: self.ephemeral_signers,
                transaction_message: borsh::to_vec(&message)?,
                memo: None,
            },
        )
    }

    pub fn proposal_create_instruction(&self) -> Result<Instruction, SquadsError> {
        instructions::proposal_create(
            &self.context.program_id,
            &ProposalCreateAccounts {
                multisig: self.context.multisig,
                proposal: self.proposal_address()?,
                creator: self.context.creator,
                rent_payer: self.context.rent_payer,
            },
            &ProposalCreateArgs {
                transaction_index: self.transaction_index,
                draft: false,
            },
        )
    }

    pub fn proposal_approve_instruction(&self, member: &Pubkey) -> Result<Instruction, SquadsError> {
        instructions::proposal_approve(
            &self.context.program_id,
            &ProposalVoteAccounts {
                multisig: self.context.multisig,
                proposal: self.proposal_address()?,
                member: *member,
            },
            &ProposalVoteArgs::default(),
        )
    }

    pub fn execute_instruction(&self, member: &Pubkey) -> Result<Instruction, SquadsError> {
        let message = self.compile_message()?;
        Ok(instructions::vault_transaction_execute(
            &self.context.program_id,
            &VaultTransactionExecuteAccounts {
                multisig: self.context.multisig,
                proposal: self.proposal_address()?,
                transaction: self.transaction_address()?,
                member: *member,
            },
            &message,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SQUADS_PROGRAM_ID, anchor_discriminator};
    use solana_sdk::instruction::AccountMeta;

    fn context() -> GovernanceContext {
        let creator = Pubkey::new_unique();
        GovernanceContext {
            program_id: SQUADS_PROGRAM_ID,
            multisig: Pubkey::new_unique(),
            creator,
            fee_payer: creator,
            rent_payer: creator,
            vault_index: 0,
        }
    }

    fn inner(ctx: &GovernanceContext) -> Instruction {
        Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![
                AccountMeta::new(Pubkey::new_unique(), false),
                AccountMeta::new_readonly(ctx.vault_authority().unwrap(), true),
            ],
            data: vec![0],
        }
    }

    #[test]
    fn test_create_instruction_carries_index_and_slots() {
        let ctx = context();
        let request = ctx.wrap(2, 2, vec![inner(&ctx)]);
        let ix = request.create_instruction().unwrap();

        assert_eq!(&ix.data[..8], &anchor_discriminator("global", "vault_transaction_create"));
        // vault_index, ephemeral_signers
        assert_eq!(&ix.data[8..10], &[0, 2]);
        assert_eq!(ix.accounts[1].pubkey, get_transaction_pda(&ctx.multisig, 2, &SQUADS_PROGRAM_ID).unwrap());
    }

    #[test]
    fn test_proposal_instructions_share_proposal_address() {
        let ctx = context();
        let request = ctx.wrap(1, 0, vec![inner(&ctx)]);
        let proposal = request.proposal_address().unwrap();

        let create = request.proposal_create_instruction().unwrap();
        let approve = request.proposal_approve_instruction(&ctx.creator).unwrap();
        let execute = request.execute_instruction(&ctx.creator).unwrap();

        assert_eq!(create.accounts[1].pubkey, proposal);
        assert_eq!(approve.accounts[2].pubkey, proposal);
        assert_eq!(execute.accounts[1].pubkey, proposal);
        assert_eq!(&create.data[8..16], &1u64.to_le_bytes());
    }

    #[test]
    fn test_execute_appends_message_accounts() {
        let ctx = context();
        let request = ctx.wrap(1, 0, vec![inner(&ctx)]);
        let message = request.compile_message().unwrap();
        let execute = request.execute_instruction(&ctx.creator).unwrap();

        assert_eq!(execute.accounts.len(), 4 + message.account_keys.len());
        assert_eq!(execute.accounts[4].pubkey, ctx.vault_authority().unwrap());
        assert!(execute.accounts[4..].iter().all(|meta| !meta.is_signer));
    }

    #[test]
    fn test_ephemeral_signer_derives_from_transaction() {
        let ctx = context();
        let transaction = ctx.transaction_address(2).unwrap();
        assert_eq!(
            ctx.ephemeral_signer(2, 0).unwrap(),
            get_ephemeral_signer_pda(&transaction, 0, &SQUADS_PROGRAM_ID).unwrap()
        );
        assert_ne!(ctx.ephemeral_signer(2, 0).unwrap(), ctx.ephemeral_signer(1, 0).unwrap());
    }
}
