// vault_core — instruction encoding and PDA derivation for the staking vault program.
//
//! The vault program parses instruction data by fixed offset and accounts by
//! fixed position, so the payloads and account lists built here are its wire
//! contract. Used by the orchestration CLI and by the end-to-end tests.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::Serialize;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultCoreError {
    /// The derivation primitive exhausted every bump seed.
    #[error("no program address found for seeds under {owner}")]
    NoProgramAddress { owner: Pubkey },

    #[error("invalid vault instruction data: {0}")]
    InvalidInstruction(String),
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// Discriminator of [`VaultInstruction::InitializeConfig`].
pub const INITIALIZE_CONFIG: u8 = 0;
/// Discriminator of [`VaultInstruction::InitializeVault`].
pub const INITIALIZE_VAULT: u8 = 1;
/// `InitializeVault` payload length. The last byte is zero padding.
pub const INIT_VAULT_DATA_LEN: usize = 9;

/// Vault program instructions emitted by this workspace.
///
/// The borsh layout of this enum (variant index as `u8`, then fields in
/// little-endian) is the layout the vault program reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum VaultInstruction {
    /// Create the program-wide config account.
    ///
    /// **Accounts:**
    /// 0. `config`: writable, PDA `["config"]`
    /// 1. `admin`: signer
    /// 2. `restaking_program`
    /// 3. `system_program`
    InitializeConfig,

    /// Create a vault together with its receipt token (VRT) mint.
    ///
    /// **Accounts:**
    /// 0. `config`: writable
    /// 1. `vault`: writable, PDA `["vault", base]`
    /// 2. `vrt_mint`: writable, signer
    /// 3. `mint`: the supported token
    /// 4. `admin`: writable, signer
    /// 5. `base`: signer
    /// 6. `system_program`
    /// 7. `token_program`
    InitializeVault {
        deposit_fee_bps: u16,
        withdrawal_fee_bps: u16,
        reward_fee_bps: u16,
        decimals: u8,
    },
}

impl VaultInstruction {
    /// Decode instruction data. Bytes past the last field are ignored, which
    /// covers the pad byte of `InitializeVault`.
    pub fn unpack(data: &[u8]) -> Result<Self, VaultCoreError> {
        let mut cursor = data;
        Self::deserialize(&mut cursor)
            .map_err(|e| VaultCoreError::InvalidInstruction(e.to_string()))
    }
}

/// Fee and precision settings for a new vault.
///
/// Fees are basis points and are not range-checked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VaultConfigArgs {
    pub deposit_fee_bps: u16,
    pub withdrawal_fee_bps: u16,
    pub reward_fee_bps: u16,
    pub decimals: u8,
}

impl VaultConfigArgs {
    pub fn pack(&self) -> [u8; INIT_VAULT_DATA_LEN] {
        encode_init_vault_args(
            self.deposit_fee_bps,
            self.withdrawal_fee_bps,
            self.reward_fee_bps,
            self.decimals,
        )
    }
}

impl From<VaultConfigArgs> for VaultInstruction {
    fn from(args: VaultConfigArgs) -> Self {
        VaultInstruction::InitializeVault {
            deposit_fee_bps: args.deposit_fee_bps,
            withdrawal_fee_bps: args.withdrawal_fee_bps,
            reward_fee_bps: args.reward_fee_bps,
            decimals: args.decimals,
        }
    }
}

/// Encode the `InitializeVault` payload.
///
/// | Offset | Size | Field              |
/// |--------|------|--------------------|
/// | 0      | 1    | discriminator (1)  |
/// | 1      | 2    | deposit_fee_bps    |
/// | 3      | 2    | withdrawal_fee_bps |
/// | 5      | 2    | reward_fee_bps     |
/// | 7      | 1    | decimals           |
/// | 8      | 1    | zero               |
pub fn encode_init_vault_args(
    deposit_fee_bps: u16,
    withdrawal_fee_bps: u16,
    reward_fee_bps: u16,
    decimals: u8,
) -> [u8; INIT_VAULT_DATA_LEN] {
    let mut data = [0u8; INIT_VAULT_DATA_LEN];
    data[0] = INITIALIZE_VAULT;
    data[1..3].copy_from_slice(&deposit_fee_bps.to_le_bytes());
    data[3..5].copy_from_slice(&withdrawal_fee_bps.to_le_bytes());
    data[5..7].copy_from_slice(&reward_fee_bps.to_le_bytes());
    data[7] = decimals;
    data
}

/// Build `InitializeConfig`. Account order must not change.
pub fn build_config_init_instruction(
    vault_program_id: &Pubkey,
    restaking_program_id: &Pubkey,
    admin: &Pubkey,
    config: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: *vault_program_id,
        accounts: vec![
            AccountMeta::new(*config, false),
            AccountMeta::new_readonly(*admin, true),
            AccountMeta::new_readonly(*restaking_program_id, false),
            AccountMeta::new_readonly(solana_system_interface::program::ID, false),
        ],
        data: vec![INITIALIZE_CONFIG],
    }
}

/// Build `InitializeVault` around a payload from [`encode_init_vault_args`].
/// Account order must not change.
#[allow(clippy::too_many_arguments)]
pub fn build_vault_init_instruction(
    vault_program_id: &Pubkey,
    config: &Pubkey,
    vault: &Pubkey,
    vrt_mint: &Pubkey,
    mint: &Pubkey,
    admin: &Pubkey,
    base: &Pubkey,
    data: &[u8],
) -> Instruction {
    Instruction {
        program_id: *vault_program_id,
        accounts: vec![
            AccountMeta::new(*config, false),
            AccountMeta::new(*vault, false),
            AccountMeta::new(*vrt_mint, true),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new(*admin, true),
            AccountMeta::new_readonly(*base, true),
            AccountMeta::new_readonly(solana_system_interface::program::ID, false),
            AccountMeta::new_readonly(spl_token::ID, false),
        ],
        data: data.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// PDA derivation helpers
// ---------------------------------------------------------------------------

pub const CONFIG_SEED: &[u8] = b"config";
pub const VAULT_SEED: &[u8] = b"vault";

/// Find the program address for `seeds` under `owner`.
pub fn derive_program_address(
    seeds: &[&[u8]],
    owner: &Pubkey,
) -> Result<(Pubkey, u8), VaultCoreError> {
    Pubkey::try_find_program_address(seeds, owner)
        .ok_or(VaultCoreError::NoProgramAddress { owner: *owner })
}

/// Compute the vault program's config PDA.
pub fn compute_config_pda(vault_program_id: &Pubkey) -> Result<Pubkey, VaultCoreError> {
    derive_program_address(&[CONFIG_SEED], vault_program_id).map(|(address, _)| address)
}

/// Compute the vault PDA owned by `base`.
pub fn compute_vault_pda(vault_program_id: &Pubkey, base: &Pubkey) -> Result<Pubkey, VaultCoreError> {
    derive_program_address(&[VAULT_SEED, base.as_ref()], vault_program_id)
        .map(|(address, _)| address)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(ix: &Instruction) -> Vec<(Pubkey, bool, bool)> {
        ix.accounts
            .iter()
            .map(|meta| (meta.pubkey, meta.is_signer, meta.is_writable))
            .collect()
    }

    #[test]
    fn test_init_vault_args_layout() {
        let data = encode_init_vault_args(200, 200, 200, 9);
        assert_eq!(data.len(), INIT_VAULT_DATA_LEN);
        assert_eq!(data, [0x01, 0xC8, 0x00, 0xC8, 0x00, 0xC8, 0x00, 0x09, 0x00]);
    }

    #[test]
    fn test_init_vault_args_little_endian_fields() {
        let data = encode_init_vault_args(0x0102, 0xA0B0, u16::MAX, u8::MAX);
        assert_eq!(data[0], INITIALIZE_VAULT);
        assert_eq!(&data[1..3], &[0x02, 0x01]);
        assert_eq!(&data[3..5], &[0xB0, 0xA0]);
        assert_eq!(&data[5..7], &[0xFF, 0xFF]);
        assert_eq!(data[7], 0xFF);
        assert_eq!(data[8], 0);
    }

    #[test]
    fn test_init_vault_args_is_pure() {
        let args = VaultConfigArgs {
            deposit_fee_bps: 10,
            withdrawal_fee_bps: 25,
            reward_fee_bps: 1_000,
            decimals: 6,
        };
        assert_eq!(args.pack(), args.pack());
        assert_eq!(args.pack(), encode_init_vault_args(10, 25, 1_000, 6));
    }

    #[test]
    fn test_init_vault_args_agree_with_borsh_enum() {
        let args = VaultConfigArgs {
            deposit_fee_bps: 300,
            withdrawal_fee_bps: 150,
            reward_fee_bps: 75,
            decimals: 9,
        };
        let borsh_bytes = borsh::to_vec(&VaultInstruction::from(args)).unwrap();
        let packed = args.pack();
        assert_eq!(borsh_bytes.as_slice(), &packed[..INIT_VAULT_DATA_LEN - 1]);
        assert_eq!(VaultInstruction::unpack(&packed).unwrap(), VaultInstruction::from(args));
    }

    #[test]
    fn test_unpack_initialize_config() {
        assert_eq!(
            VaultInstruction::unpack(&[INITIALIZE_CONFIG]).unwrap(),
            VaultInstruction::InitializeConfig
        );
    }

    #[test]
    fn test_unpack_rejects_unknown_variant() {
        assert!(matches!(
            VaultInstruction::unpack(&[7]),
            Err(VaultCoreError::InvalidInstruction(_))
        ));
        assert!(VaultInstruction::unpack(&[INITIALIZE_VAULT, 0x01]).is_err());
    }

    #[test]
    fn test_config_pda_is_deterministic() {
        let program = Pubkey::new_unique();
        assert_eq!(compute_config_pda(&program).unwrap(), compute_config_pda(&program).unwrap());
        assert_ne!(
            compute_config_pda(&program).unwrap(),
            compute_config_pda(&Pubkey::new_unique()).unwrap()
        );
    }

    #[test]
    fn test_vault_pda_differs_by_base() {
        let program = Pubkey::new_unique();
        let base1 = Pubkey::new_unique();
        let base2 = Pubkey::new_unique();
        let v1 = compute_vault_pda(&program, &base1).unwrap();
        assert_eq!(v1, compute_vault_pda(&program, &base1).unwrap());
        assert_ne!(v1, compute_vault_pda(&program, &base2).unwrap());
    }

    #[test]
    fn test_vault_pda_matches_seed_layout() {
        let program = Pubkey::new_unique();
        let base = Pubkey::new_unique();
        let (expected, _) = Pubkey::find_program_address(&[b"vault", base.as_ref()], &program);
        assert_eq!(compute_vault_pda(&program, &base).unwrap(), expected);
    }

    #[test]
    fn test_config_init_instruction_accounts() {
        let p1 = Pubkey::new_unique();
        let p2 = Pubkey::new_unique();
        let admin = Pubkey::new_unique();
        let config = Pubkey::new_unique();

        let ix = build_config_init_instruction(&p1, &p2, &admin, &config);
        assert_eq!(ix.program_id, p1);
        assert_eq!(ix.data, vec![0]);
        assert_eq!(
            flags(&ix),
            vec![
                (config, false, true),
                (admin, true, false),
                (p2, false, false),
                (solana_system_interface::program::ID, false, false),
            ]
        );
    }

    #[test]
    fn test_vault_init_instruction_accounts() {
        let program = Pubkey::new_unique();
        let config = Pubkey::new_unique();
        let vault = Pubkey::new_unique();
        let vrt_mint = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let admin = Pubkey::new_unique();
        let base = Pubkey::new_unique();
        let data = encode_init_vault_args(200, 100, 50, 9);

        let ix = build_vault_init_instruction(
            &program, &config, &vault, &vrt_mint, &mint, &admin, &base, &data,
        );
        assert_eq!(ix.program_id, program);
        assert_eq!(ix.data, data.to_vec());
        assert_eq!(
            flags(&ix),
            vec![
                (config, false, true),
                (vault, false, true),
                (vrt_mint, true, true),
                (mint, false, false),
                (admin, true, true),
                (base, true, false),
                (solana_system_interface::program::ID, false, false),
                (spl_token::ID, false, false),
            ]
        );
    }
}
