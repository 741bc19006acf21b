//! Lazy minting: a token is created only when a voucher signed by the minter
//! is redeemed.

use alloy_primitives::{Address, B256, U256};
use tracing::{info, warn};

use crate::{
    domain::{DomainSeparator, Eip712Domain},
    error::{Error, Result},
    ledger::{InMemoryLedger, TokenLedger},
    signing::recover,
    voucher::Voucher,
};

/// Name of the voucher signing domain.
pub const SIGNING_DOMAIN: &str = "LazyMint";

/// Version of the voucher signing domain.
pub const SIGNATURE_VERSION: &str = "1";

/// A lazily minted token collection.
///
/// The domain and minter are fixed at deployment. Each token id can be
/// redeemed once, by anyone holding a voucher signed by the minter.
#[derive(Debug, Clone)]
pub struct LazyMint<L = InMemoryLedger> {
    domain: DomainSeparator,
    minter: Address,
    ledger: L,
}

impl LazyMint {
    /// Deploys a collection at `contract_address` on `chain_id`, authorising
    /// `minter` to sign vouchers.
    pub fn deploy(chain_id: u64, contract_address: Address, minter: Address) -> Self {
        Self::with_ledger(chain_id, contract_address, minter, InMemoryLedger::new())
    }
}

impl<L: TokenLedger> LazyMint<L> {
    /// Like [`LazyMint::deploy`], backed by `ledger`.
    pub fn with_ledger(chain_id: u64, contract_address: Address, minter: Address, ledger: L) -> Self {
        let domain =
            Eip712Domain::new(SIGNING_DOMAIN, SIGNATURE_VERSION, U256::from(chain_id), contract_address);
        info!(%contract_address, chain_id, %minter, "deployed lazy mint collection");
        Self {
            domain: domain.into(),
            minter,
            ledger,
        }
    }

    pub fn domain(&self) -> &Eip712Domain {
        self.domain.domain()
    }

    pub fn domain_separator(&self) -> B256 {
        self.domain.separator()
    }

    pub fn minter(&self) -> Address {
        self.minter
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Digest a minter signs for `voucher`.
    pub fn hash(&self, voucher: &Voucher) -> Result<B256> {
        Ok(self.domain.hash_typed_data(&voucher.struct_hash()?))
    }

    /// Recovers the address that signed `voucher`.
    pub fn get_signer(&self, voucher: &Voucher, signature: &[u8]) -> Result<Address> {
        recover(&self.hash(voucher)?, signature)
    }

    /// Mints `voucher.token_id` to `caller` if the voucher carries the
    /// minter's signature and the id is still free. Returns the minted id.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidReceiver`] - If `caller` is the zero address.
    /// * [`Error::InvalidSignature`] - If `signature` is malformed.
    /// * [`Error::InvalidSigner`] - If someone other than the minter signed.
    /// * [`Error::AlreadyMinted`] - If the voucher was already redeemed.
    ///
    /// A failed redemption leaves the ledger untouched.
    pub fn redeem(&mut self, caller: Address, voucher: &Voucher, signature: &[u8]) -> Result<U256> {
        if caller.is_zero() {
            return Err(Error::InvalidReceiver(caller));
        }
        let signer = self.get_signer(voucher, signature)?;
        if signer != self.minter {
            warn!(token_id = %voucher.token_id, %signer, minter = %self.minter, "voucher not signed by minter");
            return Err(Error::InvalidSigner {
                signer,
                expected: self.minter,
            });
        }
        if let Err(err) = self.ledger.mint(caller, voucher.token_id, voucher.uri.clone()) {
            warn!(token_id = %voucher.token_id, %caller, "redemption rejected: {err}");
            return Err(err);
        }
        info!(token_id = %voucher.token_id, %caller, uri = %voucher.uri, "redeemed voucher");
        Ok(voucher.token_id)
    }
}
