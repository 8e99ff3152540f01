//! Pull-payment splitter over a fixed payee registry.
//!
//! Receipts are recorded as purchases come in; each payee withdraws their
//! proportional share on demand. Released amounts are tracked per payee so a
//! payee can never draw more than `total_received * shares / total_shares`.

use near_sdk::json_types::U128;
use near_sdk::store::LookupMap;
use near_sdk::{AccountId, IntoStorageKey, near, require};
use primitive_types::U256;

#[near(serializers = [borsh])]
pub struct PaymentSplitter {
    payees: Vec<AccountId>,
    shares: LookupMap<AccountId, u128>,
    released: LookupMap<AccountId, u128>,
    total_shares: u128,
    total_received: u128,
    total_released: u128,
}

impl PaymentSplitter {
    pub fn new<S, R>(
        shares_prefix: S,
        released_prefix: R,
        payees: Vec<AccountId>,
        shares: Vec<U128>,
    ) -> Self
    where
        S: IntoStorageKey,
        R: IntoStorageKey,
    {
        require!(!payees.is_empty(), "No payees");
        require!(
            payees.len() == shares.len(),
            "Payees and shares length mismatch"
        );

        let mut splitter = Self {
            payees: Vec::new(),
            shares: LookupMap::new(shares_prefix),
            released: LookupMap::new(released_prefix),
            total_shares: 0,
            total_received: 0,
            total_released: 0,
        };
        for (payee, share) in payees.into_iter().zip(shares) {
            splitter.add_payee(payee, share.0);
        }
        splitter
    }

    fn add_payee(&mut self, payee: AccountId, share: u128) {
        require!(share > 0, "Shares must be positive");
        require!(!self.shares.contains_key(&payee), "Payee already has shares");
        self.shares.insert(payee.clone(), share);
        self.payees.push(payee);
        self.total_shares += share;
    }

    pub fn record_received(&mut self, amount: u128) {
        self.total_received += amount;
    }

    /// Amount currently due: the payee's entitlement over all historical
    /// receipts minus what has already been released to them.
    pub fn releasable(&self, payee: &AccountId) -> u128 {
        let share = self.shares_of(payee);
        if share == 0 {
            return 0;
        }
        let entitled = (U256::from(self.total_received) * U256::from(share)
            / U256::from(self.total_shares))
        .as_u128();
        entitled.saturating_sub(self.released_of(payee))
    }

    pub fn record_release(&mut self, payee: &AccountId, amount: u128) {
        let released = self.released_of(payee) + amount;
        self.released.insert(payee.clone(), released);
        self.total_released += amount;
    }

    /// Undoes a recorded release whose transfer did not go through.
    pub fn rollback_release(&mut self, payee: &AccountId, amount: u128) {
        let released = self.released_of(payee).saturating_sub(amount);
        self.released.insert(payee.clone(), released);
        self.total_released = self.total_released.saturating_sub(amount);
    }

    pub fn shares_of(&self, payee: &AccountId) -> u128 {
        self.shares.get(payee).copied().unwrap_or(0)
    }

    pub fn released_of(&self, payee: &AccountId) -> u128 {
        self.released.get(payee).copied().unwrap_or(0)
    }

    pub fn payees(&self) -> Vec<AccountId> {
        self.payees.clone()
    }

    pub fn total_shares(&self) -> u128 {
        self.total_shares
    }

    pub fn total_received(&self) -> u128 {
        self.total_received
    }

    pub fn total_released(&self) -> u128 {
        self.total_released
    }
}
