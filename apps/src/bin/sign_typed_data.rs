use std::fs;
use std::path::PathBuf;

use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use common::TypedDataRequest;

/// CLI to sign an `eth_signTypedData_v4` JSON document and print the digest,
/// signature and signer.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the typed-data JSON (`{domain, types, primaryType, message}`).
    #[clap(long, value_name = "FILE")]
    file_path: PathBuf,

    /// Optional private key to use for signing; if omitted, a random key is generated.
    #[clap(long, env = "USER_PRIVATE_KEY")]
    private_key: Option<PrivateKeySigner>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment variables from {:?}", path),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => anyhow::bail!("failed to load .env file: {}", e),
    }

    let args = Args::parse();

    let json = fs::read_to_string(&args.file_path)
        .with_context(|| format!("failed to read {}", args.file_path.display()))?;
    let request = TypedDataRequest::from_json(&json).context("failed to parse typed data")?;

    let signer = args.private_key.unwrap_or_else(PrivateKeySigner::random);
    let signed = request.sign(&signer)?;

    println!("File: {}", args.file_path.display());
    println!("Primary type: {}", request.primary_type);
    println!("Domain separator: {}", request.domain_separator());
    println!("Struct hash: {}", request.struct_hash()?);
    println!("Digest: {}", signed.digest);
    println!("Signature: {}", alloy_primitives::hex::encode_prefixed(signed.signature_bytes()));
    println!("Signer: {:#x}", signed.signer);

    Ok(())
}
