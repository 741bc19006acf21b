//! Hardhat's default accounts and first deployment address.

use alloy_primitives::{address, Address};
use alloy_signer_local::PrivateKeySigner;

/// First deployment address of the first Hardhat account.
pub(crate) const CONTRACT_ADDRESS: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

/// Hardhat's default chain id.
pub(crate) const CHAIN_ID: u64 = 31337;

/// `0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266`, the deployer.
pub(crate) fn owner() -> PrivateKeySigner {
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
        .parse()
        .unwrap()
}

/// `0x70997970C51812dc3A010C7d01b50e0d17dc79C8`
pub(crate) fn other_account() -> PrivateKeySigner {
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
        .parse()
        .unwrap()
}

#[test]
fn accounts_match_hardhat() {
    assert_eq!(owner().address(), address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
    assert_eq!(
        other_account().address(),
        address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")
    );
}
