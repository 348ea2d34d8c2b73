// The ledger seam: everything the orchestrator needs from a cluster.
//
// `RpcLedger` talks JSON RPC; tests substitute an in-memory ledger.

use std::time::Duration;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::error::{Result, SetupError};

pub const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A recent blockhash and the last block height at which it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessToken {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

#[allow(async_fn_in_trait)]
pub trait Ledger {
    async fn latest_liveness_token(&self) -> Result<LivenessToken>;

    async fn submit(&self, transaction: &Transaction) -> Result<Signature>;

    /// Resolve once `signature` reaches the configured commitment. Fails if it
    /// lands with an error or if `token` expires first.
    async fn confirm(&self, signature: &Signature, token: &LivenessToken) -> Result<()>;

    /// Raw data of an existing account. Missing accounts are an error.
    async fn account_data(&self, address: &Pubkey) -> Result<Vec<u8>>;

    async fn rent_exempt_minimum(&self, data_len: usize) -> Result<u64>;
}

pub struct RpcLedger {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcLedger {
    pub fn new(rpc_url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url.into(), commitment),
            commitment,
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

impl Ledger for RpcLedger {
    async fn latest_liveness_token(&self) -> Result<LivenessToken> {
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await?;
        Ok(LivenessToken {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn submit(&self, transaction: &Transaction) -> Result<Signature> {
        Ok(self.client.send_transaction(transaction).await?)
    }

    async fn confirm(&self, signature: &Signature, token: &LivenessToken) -> Result<()> {
        loop {
            let status = self
                .client
                .get_signature_status_with_commitment(signature, self.commitment)
                .await?;
            match status {
                Some(Ok(())) => return Ok(()),
                Some(Err(error)) => {
                    return Err(SetupError::TransactionFailed {
                        signature: *signature,
                        error,
                    });
                }
                None => {}
            }

            let height = self
                .client
                .get_block_height_with_commitment(self.commitment)
                .await?;
            if height > token.last_valid_block_height {
                return Err(SetupError::BlockhashExpired {
                    signature: *signature,
                    last_valid_block_height: token.last_valid_block_height,
                });
            }
            log::debug!("{signature} pending at block height {height}");
            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Vec<u8>> {
        self.client
            .get_account_with_commitment(address, self.commitment)
            .await?
            .value
            .map(|account| account.data)
            .ok_or(SetupError::AccountNotFound(*address))
    }

    async fn rent_exempt_minimum(&self, data_len: usize) -> Result<u64> {
        Ok(self
            .client
            .get_minimum_balance_for_rent_exemption(data_len)
            .await?)
    }
}
