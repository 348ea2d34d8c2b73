use std::path::Path;

use solana_sdk::signature::{Keypair, read_keypair_file};

use crate::error::{Result, SetupError};

/// Load the signing wallet from a JSON array of secret key bytes.
pub fn load_wallet(path: &Path) -> Result<Keypair> {
    read_keypair_file(path).map_err(|e| SetupError::Wallet {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
