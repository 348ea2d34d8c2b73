// Compact transaction message stored inside a Squads vault transaction.
//
// Layout (all little-endian):
//   num_signers u8, num_writable_signers u8, num_writable_non_signers u8,
//   account_keys       u8-len array of 32-byte keys,
//   instructions       u8-len array of
//                        program_id_index u8,
//                        account_indexes  u8-len array of u8,
//                        data             u16-len array of u8,
//   address_table_lookups u8-len array (always empty here).
//
// Keys are ordered writable signers, readonly signers, writable non-signers,
// readonly non-signers, with the vault authority first.

use std::io::{self, Write};

use borsh::BorshSerialize;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;

use crate::SquadsError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indexes: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultTransactionMessage {
    pub num_signers: u8,
    pub num_writable_signers: u8,
    pub num_writable_non_signers: u8,
    pub account_keys: Vec<Pubkey>,
    pub instructions: Vec<CompiledInstruction>,
}

impl VaultTransactionMessage {
    /// Compile `instructions` with `vault` as the paying signer.
    pub fn try_compile(vault: &Pubkey, instructions: &[Instruction]) -> Result<Self, SquadsError> {
        let message = Message::new(instructions, Some(vault));
        let header = message.header;

        let num_keys = message.account_keys.len();
        if num_keys > u8::MAX as usize {
            return Err(SquadsError::MessageTooLarge(format!(
                "{num_keys} account keys, at most {} allowed",
                u8::MAX
            )));
        }
        let num_signers = header.num_required_signatures;
        let num_writable_signers = num_signers - header.num_readonly_signed_accounts;
        let num_writable_non_signers = num_keys as u8
            - num_signers
            - header.num_readonly_unsigned_accounts;

        let compiled = message
            .instructions
            .iter()
            .map(|ix| {
                if ix.data.len() > u16::MAX as usize {
                    return Err(SquadsError::MessageTooLarge(format!(
                        "instruction data of {} bytes",
                        ix.data.len()
                    )));
                }
                Ok(CompiledInstruction {
                    program_id_index: ix.program_id_index,
                    account_indexes: ix.accounts.clone(),
                    data: ix.data.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            num_signers,
            num_writable_signers,
            num_writable_non_signers,
            account_keys: message.account_keys,
            instructions: compiled,
        })
    }

    /// Writability as the program derives it from the header counts.
    pub fn is_static_writable_index(&self, index: usize) -> bool {
        let num_signers = self.num_signers as usize;
        if index < self.num_writable_signers as usize {
            return true;
        }
        index >= num_signers && index < num_signers + self.num_writable_non_signers as usize
    }

    /// Remaining accounts for `vault_transaction_execute`. The program signs
    /// for the vault and ephemeral signers itself, so none are signers here.
    pub fn execute_account_metas(&self) -> Vec<AccountMeta> {
        self.account_keys
            .iter()
            .enumerate()
            .map(|(index, key)| {
                if self.is_static_writable_index(index) {
                    AccountMeta::new(*key, false)
                } else {
                    AccountMeta::new_readonly(*key, false)
                }
            })
            .collect()
    }
}

fn write_u8_len<W: Write>(writer: &mut W, len: usize) -> io::Result<()> {
    let len = u8::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("length {len} exceeds u8")))?;
    writer.write_all(&[len])
}

impl BorshSerialize for VaultTransactionMessage {
    fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&[
            self.num_signers,
            self.num_writable_signers,
            self.num_writable_non_signers,
        ])?;

        write_u8_len(writer, self.account_keys.len())?;
        for key in &self.account_keys {
            writer.write_all(key.as_ref())?;
        }

        write_u8_len(writer, self.instructions.len())?;
        for ix in &self.instructions {
            writer.write_all(&[ix.program_id_index])?;
            write_u8_len(writer, ix.account_indexes.len())?;
            writer.write_all(&ix.account_indexes)?;
            let data_len = u16::try_from(ix.data.len()).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "instruction data exceeds u16")
            })?;
            writer.write_all(&data_len.to_le_bytes())?;
            writer.write_all(&ix.data)?;
        }

        // address_table_lookups
        write_u8_len(writer, 0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_instruction(vault: &Pubkey, signer: &Pubkey, writable: &Pubkey, program: &Pubkey) -> Instruction {
        Instruction {
            program_id: *program,
            accounts: vec![
                AccountMeta::new(*writable, false),
                AccountMeta::new_readonly(*signer, true),
                AccountMeta::new(*vault, true),
            ],
            data: vec![9, 8, 7],
        }
    }

    #[test]
    fn test_compile_orders_vault_first() {
        let vault = Pubkey::new_unique();
        let signer = Pubkey::new_unique();
        let writable = Pubkey::new_unique();
        let program = Pubkey::new_unique();

        let message = VaultTransactionMessage::try_compile(
            &vault,
            &[sample_instruction(&vault, &signer, &writable, &program)],
        )
        .unwrap();

        assert_eq!(message.account_keys[0], vault);
        assert_eq!(message.num_signers, 2);
        assert_eq!(message.num_writable_signers, 1);
        assert_eq!(message.num_writable_non_signers, 1);
        assert_eq!(message.account_keys, vec![vault, signer, writable, program]);
        assert_eq!(message.instructions.len(), 1);
        assert_eq!(message.instructions[0].program_id_index, 3);
        assert_eq!(message.instructions[0].account_indexes, vec![2, 1, 0]);
    }

    #[test]
    fn test_writable_indexes_follow_header() {
        let vault = Pubkey::new_unique();
        let signer = Pubkey::new_unique();
        let writable = Pubkey::new_unique();
        let program = Pubkey::new_unique();
        let message = VaultTransactionMessage::try_compile(
            &vault,
            &[sample_instruction(&vault, &signer, &writable, &program)],
        )
        .unwrap();

        assert!(message.is_static_writable_index(0));
        assert!(!message.is_static_writable_index(1));
        assert!(message.is_static_writable_index(2));
        assert!(!message.is_static_writable_index(3));

        let metas = message.execute_account_metas();
        assert!(metas.iter().all(|meta| !meta.is_signer));
        assert_eq!(
            metas.iter().map(|meta| meta.is_writable).collect::<Vec<_>>(),
            vec![true, false, true, false]
        );
    }

    #[test]
    fn test_serialized_layout() {
        let vault = Pubkey::new_unique();
        let signer = Pubkey::new_unique();
        let writable = Pubkey::new_unique();
        let program = Pubkey::new_unique();
        let message = VaultTransactionMessage::try_compile(
            &vault,
            &[sample_instruction(&vault, &signer, &writable, &program)],
        )
        .unwrap();

        let bytes = borsh::to_vec(&message).unwrap();
        assert_eq!(&bytes[..4], &[2, 1, 1, 4]);
        let after_keys = 4 + 4 * 32;
        assert_eq!(&bytes[4..36], vault.as_ref());
        assert_eq!(
            &bytes[after_keys..],
            &[1, 3, 3, 2, 1, 0, 3, 0, 9, 8, 7, 0]
        );
    }
}
