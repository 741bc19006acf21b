use std::fs;
use std::path::PathBuf;

use alloy_primitives::{Address, Bytes};
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::{debug, info, warn};

use common::{LazyMint, Voucher};

/// CLI that replays voucher redemptions against an in-memory lazy-mint
/// collection.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON array of `{voucher, signature, caller}` requests.
    #[clap(long, value_name = "FILE")]
    file_path: PathBuf,

    /// Chain id of the signing domain.
    #[clap(long, env = "CHAIN_ID", default_value_t = 31337)]
    chain_id: u64,

    /// Address the collection is deployed at.
    #[clap(short = 'a', long, env = "CONTRACT_ADDRESS")]
    contract_address: Address,

    /// Address authorised to sign vouchers.
    #[clap(long, env = "MINTER_ADDRESS")]
    minter: Address,
}

#[derive(Debug, Deserialize)]
struct RedemptionRequest {
    voucher: Voucher,
    signature: Bytes,
    caller: Address,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment variables from {:?}", path),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => bail!("failed to load .env file: {}", e),
    }

    let args = Args::parse();

    let json = fs::read_to_string(&args.file_path)
        .with_context(|| format!("failed to read {}", args.file_path.display()))?;
    let requests: Vec<RedemptionRequest> =
        serde_json::from_str(&json).context("failed to parse redemption requests")?;

    let mut contract = LazyMint::deploy(args.chain_id, args.contract_address, args.minter);
    info!("Domain separator: {}", contract.domain_separator());

    let mut redeemed = 0usize;
    for (i, request) in requests.iter().enumerate() {
        debug!("Request #{i}: {:?}", request);
        match contract.redeem(request.caller, &request.voucher, &request.signature) {
            Ok(token_id) => {
                redeemed += 1;
                info!("Request #{i}: token {token_id} minted to {:#x}", request.caller);
            }
            Err(e) => warn!("Request #{i}: reverted with {:?} ({e})", e.revert()),
        }
    }

    info!(
        "Redeemed {redeemed} of {} vouchers, total supply {}",
        requests.len(),
        contract.ledger().total_supply()
    );

    Ok(())
}
