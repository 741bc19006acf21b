//! Token existence and ownership storage backing voucher redemption.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};

use crate::error::{Error, Result};

/// Storage of minted tokens.
///
/// [`TokenLedger::mint`] is the only state transition: it consumes the token
/// id and credits its owner in one step, or changes nothing.
pub trait TokenLedger {
    /// Whether `token_id` has been minted.
    fn exists(&self, token_id: U256) -> bool;

    /// Owner of `token_id`, if minted.
    fn owner_of(&self, token_id: U256) -> Option<Address>;

    /// Metadata URI of `token_id`, if minted.
    fn token_uri(&self, token_id: U256) -> Option<&str>;

    /// Number of tokens held by `owner`.
    fn balance_of(&self, owner: Address) -> U256;

    /// Mints `token_id` to `to` and binds `uri` to it.
    ///
    /// # Errors
    ///
    /// * [`Error::AlreadyMinted`] - If `token_id` already exists.
    /// * [`Error::InvalidReceiver`] - If `to` is [`Address::ZERO`].
    fn mint(&mut self, to: Address, token_id: U256, uri: String) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    owner: Address,
    uri: String,
}

/// A [`TokenLedger`] kept in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    tokens: HashMap<U256, Token>,
    balances: HashMap<Address, U256>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of minted tokens.
    pub fn total_supply(&self) -> usize {
        self.tokens.len()
    }
}

impl TokenLedger for InMemoryLedger {
    fn exists(&self, token_id: U256) -> bool {
        self.tokens.contains_key(&token_id)
    }

    fn owner_of(&self, token_id: U256) -> Option<Address> {
        self.tokens.get(&token_id).map(|token| token.owner)
    }

    fn token_uri(&self, token_id: U256) -> Option<&str> {
        self.tokens.get(&token_id).map(|token| token.uri.as_str())
    }

    fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).copied().unwrap_or_default()
    }

    fn mint(&mut self, to: Address, token_id: U256, uri: String) -> Result<()> {
        if to.is_zero() {
            return Err(Error::InvalidReceiver(to));
        }
        if self.exists(token_id) {
            return Err(Error::AlreadyMinted(token_id));
        }
        self.tokens.insert(token_id, Token { owner: to, uri });
        *self.balances.entry(to).or_default() += U256::from(1);
        Ok(())
    }
}
