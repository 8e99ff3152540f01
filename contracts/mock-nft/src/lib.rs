//! Minimal NEP-181 Mock NFT for Testing
//!
//! Implements only what the token contract consumes from a collection:
//! - nft_supply_for_owner (owned-count lookup during claims)
//! - nft_total_supply (view)
//!
//! Plus test helpers to shape per-owner holdings without real token IDs.

use near_sdk::json_types::U128;
use near_sdk::store::LookupMap;
use near_sdk::{AccountId, PanicOnDefault, env, near};

#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct MockNft {
    owned: LookupMap<AccountId, u64>,
    total_supply: u64,
}

#[near]
impl MockNft {
    #[init]
    pub fn new() -> Self {
        Self {
            owned: LookupMap::new(b"o".to_vec()),
            total_supply: 0,
        }
    }

    /// Mints `count` tokens to the caller.
    pub fn mint(&mut self, count: u64) {
        let owner_id = env::predecessor_account_id();
        let owned = self.owned.get(&owner_id).copied().unwrap_or(0);
        self.owned.insert(owner_id, owned + count);
        self.total_supply += count;
    }

    // =========================================================================
    // NEP-181 Enumeration
    // =========================================================================

    pub fn nft_supply_for_owner(&self, account_id: AccountId) -> U128 {
        U128(self.owned.get(&account_id).copied().unwrap_or(0) as u128)
    }

    pub fn nft_total_supply(&self) -> U128 {
        U128(self.total_supply as u128)
    }

    // =========================================================================
    // Test Helpers (not in real NFT)
    // =========================================================================

    /// Overwrites an account's holdings directly.
    pub fn set_supply(&mut self, account_id: AccountId, count: u64) {
        let previous = self.owned.get(&account_id).copied().unwrap_or(0);
        self.owned.insert(account_id, count);
        self.total_supply = self.total_supply - previous + count;
    }
}
