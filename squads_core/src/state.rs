// Read-only views of Squads v4 accounts.
//
// Account data is an 8-byte Anchor discriminator followed by the borsh fields.
// Trailing bytes (reserved space, realloc slack) are ignored.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use crate::instructions::{Member, Permissions};
use crate::{SquadsError, anchor_discriminator};

fn decode_account<T: BorshDeserialize>(account: &'static str, data: &[u8]) -> Result<T, SquadsError> {
    if data.len() < 8 || data[..8] != anchor_discriminator("account", account) {
        return Err(SquadsError::AccountDiscriminator { account });
    }
    let mut cursor = &data[8..];
    T::deserialize(&mut cursor).map_err(|e| SquadsError::Decode {
        account,
        reason: e.to_string(),
    })
}

/// Global program settings, singleton PDA `["multisig", "program_config"]`.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ProgramConfig {
    pub authority: [u8; 32],
    /// Lamports charged on multisig creation, paid to `treasury`.
    pub multisig_creation_fee: u64,
    pub treasury: [u8; 32],
}

impl ProgramConfig {
    pub fn try_from_account_data(data: &[u8]) -> Result<Self, SquadsError> {
        decode_account("ProgramConfig", data)
    }

    pub fn treasury(&self) -> Pubkey {
        Pubkey::new_from_array(self.treasury)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Multisig {
    pub create_key: [u8; 32],
    pub config_authority: [u8; 32],
    pub threshold: u16,
    pub time_lock: u32,
    /// Index of the last vault or config transaction created.
    pub transaction_index: u64,
    pub stale_transaction_index: u64,
    pub rent_collector: Option<[u8; 32]>,
    pub bump: u8,
    pub members: Vec<Member>,
}

impl Multisig {
    pub fn try_from_account_data(data: &[u8]) -> Result<Self, SquadsError> {
        decode_account("Multisig", data)
    }

    pub fn member(&self, key: &Pubkey) -> Option<&Member> {
        self.members.iter().find(|m| m.key == key.to_bytes())
    }

    /// True when `key` may initiate, vote on and execute transactions.
    pub fn can_drive_alone(&self, key: &Pubkey) -> bool {
        self.member(key).is_some_and(|m| {
            m.permissions
                .has(Permissions::INITIATE | Permissions::VOTE | Permissions::EXECUTE)
        })
    }
}

/// Encode account data the way the program stores it. Used to build fixtures.
pub fn encode_account<T: BorshSerialize>(account: &str, value: &T) -> Result<Vec<u8>, SquadsError> {
    let mut data = anchor_discriminator("account", account).to_vec();
    value.serialize(&mut data)?;
    Ok(data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_multisig(member: &Pubkey) -> Multisig {
        Multisig {
            create_key: Pubkey::new_unique().to_bytes(),
            config_authority: [0u8; 32],
            threshold: 1,
            time_lock: 0,
            transaction_index: 0,
            stale_transaction_index: 0,
            rent_collector: None,
            bump: 255,
            members: vec![Member::new(member, Permissions::all())],
        }
    }

    #[test]
    fn test_program_config_treasury_offset() {
        let treasury = Pubkey::new_unique();
        let mut data = anchor_discriminator("account", "ProgramConfig").to_vec();
        data.extend_from_slice(&[1u8; 32]);
        data.extend_from_slice(&5_000u64.to_le_bytes());
        data.extend_from_slice(treasury.as_ref());
        data.extend_from_slice(&[0u8; 64]);

        let config = ProgramConfig::try_from_account_data(&data).unwrap();
        assert_eq!(config.treasury(), treasury);
        assert_eq!(config.multisig_creation_fee, 5_000);
    }

    #[test]
    fn test_multisig_decode_with_slack() {
        let member = Pubkey::new_unique();
        let multisig = sample_multisig(&member);
        let mut data = encode_account("Multisig", &multisig).unwrap();
        data.extend_from_slice(&[0u8; 40]);

        let decoded = Multisig::try_from_account_data(&data).unwrap();
        assert_eq!(decoded, multisig);
        assert!(decoded.can_drive_alone(&member));
        assert!(!decoded.can_drive_alone(&Pubkey::new_unique()));
    }

    #[test]
    fn test_wrong_discriminator_rejected() {
        let member = Pubkey::new_unique();
        let data = encode_account("ProgramConfig", &sample_multisig(&member)).unwrap();
        assert!(matches!(
            Multisig::try_from_account_data(&data),
            Err(SquadsError::AccountDiscriminator { account: "Multisig" })
        ));
        assert!(Multisig::try_from_account_data(&[]).is_err());
    }

    #[test]
    fn test_member_without_execute_cannot_drive() {
        let member = Pubkey::new_unique();
        let mut multisig = sample_multisig(&member);
        multisig.members[0].permissions = Permissions {
            mask: Permissions::INITIATE | Permissions::VOTE,
        };
        assert!(multisig.member(&member).is_some());
        assert!(!multisig.can_drive_alone(&member));
    }
}
