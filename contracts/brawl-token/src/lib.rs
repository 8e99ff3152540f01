//! Brawl fungible token. NEP-141/145/148 compliant, 18 decimals.
//!
//! Supply enters through three paths: time-gated claims keyed on ownership of
//! the V1 and V2 NFT collections, native-currency purchases, and owner mints.
//! Purchase proceeds accumulate in a pull-payment splitter and are released
//! per payee on demand.

use near_contract_standards::fungible_token::FungibleToken;
use near_contract_standards::fungible_token::metadata::{
    FT_METADATA_SPEC, FungibleTokenMetadata, FungibleTokenMetadataProvider,
};
use near_sdk::{
    AccountId, BorshStorageKey, Gas, NearToken, PanicOnDefault, Promise, PromiseError,
    PromiseOrValue, env, ext_contract, json_types::U128, near, require, store::LookupMap,
};
use primitive_types::U256;

use crate::events::TokenEvent;
use crate::splitter::PaymentSplitter;

mod events;
mod splitter;

const VERSION: &str = "1.0.0";
const DECIMALS: u8 = 18;

/// One whole token in base units.
const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

const NS_PER_SEC: u64 = 1_000_000_000;

const GAS_FOR_NFT_QUERY: Gas = Gas::from_tgas(10);
const GAS_FOR_CLAIM_CALLBACK: Gas = Gas::from_tgas(20);
const GAS_FOR_RELEASE_CALLBACK: Gas = Gas::from_tgas(10);

// Accrual per owned NFT per claim interval, in base units.
const DEFAULT_V1_CLAIM_AMOUNT: u128 = 10 * ONE_TOKEN;
const DEFAULT_V2_CLAIM_AMOUNT: u128 = 5 * ONE_TOKEN;
const DEFAULT_TIME_BETWEEN_CLAIMS: u64 = 24 * 60 * 60;
/// yoctoNEAR per whole token.
const DEFAULT_TOKEN_PRICE: u128 = 10_000_000_000_000_000_000_000_000;
const DEFAULT_MIN_BUY: u128 = ONE_TOKEN;

#[derive(BorshStorageKey)]
#[near]
enum StorageKey {
    FungibleToken,
    LastClaim,
    Shares,
    Released,
}

/// NEP-181 enumeration surface consumed from each NFT collection.
#[ext_contract(ext_nft)]
pub trait NftEnumeration {
    fn nft_supply_for_owner(&self, account_id: AccountId) -> U128;
}

#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct Contract {
    token: FungibleToken,
    metadata: FungibleTokenMetadata,
    owner_id: AccountId,
    v1_contract: AccountId,
    v2_contract: AccountId,
    v1_claim_amount: u128,
    v2_claim_amount: u128,
    /// Minimum seconds between successive claims per account.
    time_between_claims: u64,
    claim_paused: bool,
    buy_paused: bool,
    /// yoctoNEAR per whole token.
    token_price: u128,
    /// Minimum purchase, in base units.
    min_buy: u128,
    /// Timestamp (ns) of each account's last successful claim.
    last_claim: LookupMap<AccountId, u64>,
    splitter: PaymentSplitter,
}

#[near]
impl Contract {
    /// Starts with zero supply; claiming and buying are paused until the
    /// owner enables them.
    #[init]
    pub fn new(
        owner_id: AccountId,
        v1_contract: AccountId,
        v2_contract: AccountId,
        payees: Vec<AccountId>,
        shares: Vec<U128>,
    ) -> Self {
        let metadata = FungibleTokenMetadata {
            spec: FT_METADATA_SPEC.to_string(),
            name: "Brawl Token".to_string(),
            symbol: "BRAWL".to_string(),
            icon: None,
            reference: None,
            reference_hash: None,
            decimals: DECIMALS,
        };

        Self {
            token: FungibleToken::new(StorageKey::FungibleToken),
            metadata,
            owner_id,
            v1_contract,
            v2_contract,
            v1_claim_amount: DEFAULT_V1_CLAIM_AMOUNT,
            v2_claim_amount: DEFAULT_V2_CLAIM_AMOUNT,
            time_between_claims: DEFAULT_TIME_BETWEEN_CLAIMS,
            claim_paused: true,
            buy_paused: true,
            token_price: DEFAULT_TOKEN_PRICE,
            min_buy: DEFAULT_MIN_BUY,
            last_claim: LookupMap::new(StorageKey::LastClaim),
            splitter: PaymentSplitter::new(
                StorageKey::Shares,
                StorageKey::Released,
                payees,
                shares,
            ),
        }
    }

    // --- Claim ---

    /// Converts time-accrued entitlement into token balance. Queries the
    /// caller's holdings in both collections, then mints in `on_claim`.
    ///
    /// The claim window is consumed up front and restored by the callback if
    /// the lookup fails or nothing accrues, so a claim in flight cannot be
    /// replayed.
    pub fn claim(&mut self) -> Promise {
        require!(!self.claim_paused, "Claim is Paused");

        let account_id = env::predecessor_account_id();
        let previous_claim = self.last_claim.get(&account_id).copied().unwrap_or(0);
        require!(
            self.is_claim_ready(previous_claim),
            "Tokens Already Claimed"
        );

        let claimed_at = env::block_timestamp();
        self.last_claim.insert(account_id.clone(), claimed_at);

        self.query_owned_counts(&account_id).then(
            Self::ext(env::current_account_id())
                .with_static_gas(GAS_FOR_CLAIM_CALLBACK)
                .on_claim(account_id, previous_claim, claimed_at),
        )
    }

    /// `claimed_at` is the entry timestamp recorded into `last_claim`;
    /// accrual is computed against it so the blocks spent on the holdings
    /// round trip are neither minted for nor lost.
    #[private]
    pub fn on_claim(
        &mut self,
        account_id: AccountId,
        previous_claim: u64,
        claimed_at: u64,
        #[callback_result] v1_count: Result<U128, PromiseError>,
        #[callback_result] v2_count: Result<U128, PromiseError>,
    ) -> U128 {
        let (v1_count, v2_count) = match (v1_count, v2_count) {
            (Ok(v1), Ok(v2)) => (v1.0, v2.0),
            _ => {
                self.restore_last_claim(&account_id, previous_claim);
                env::log_str("Claim aborted: NFT holdings lookup failed");
                return U128(0);
            }
        };

        let accrued = self.accrued_amount(previous_claim, claimed_at, v1_count, v2_count);
        if accrued == 0 {
            self.restore_last_claim(&account_id, previous_claim);
            return U128(0);
        }

        self.internal_mint(&account_id, accrued, Some("Claim"));
        TokenEvent::TokensClaimed {
            account_id,
            amount: U128(accrued),
        }
        .emit();

        U128(accrued)
    }

    /// Amount `claim` would mint for the caller right now. Does not mint.
    pub fn claim_amount(&self) -> Promise {
        let account_id = env::predecessor_account_id();
        self.query_owned_counts(&account_id).then(
            Self::ext(env::current_account_id())
                .with_static_gas(GAS_FOR_CLAIM_CALLBACK)
                .on_claim_amount(account_id),
        )
    }

    #[private]
    pub fn on_claim_amount(
        &self,
        account_id: AccountId,
        #[callback_result] v1_count: Result<U128, PromiseError>,
        #[callback_result] v2_count: Result<U128, PromiseError>,
    ) -> U128 {
        let v1_count = v1_count.map(|c| c.0).unwrap_or(0);
        let v2_count = v2_count.map(|c| c.0).unwrap_or(0);
        let previous_claim = self.last_claim.get(&account_id).copied().unwrap_or(0);
        U128(self.accrued_amount(previous_claim, env::block_timestamp(), v1_count, v2_count))
    }

    /// Seconds until `account_id` may claim again. 0 when ready.
    pub fn time_to_claim(&self, account_id: AccountId) -> u64 {
        let previous_claim = self.last_claim.get(&account_id).copied().unwrap_or(0);
        if previous_claim == 0 || self.time_between_claims == 0 {
            return 0;
        }
        self.time_between_claims
            .saturating_sub(self.elapsed_secs(previous_claim))
    }

    // --- Buy ---

    /// Mints `amount` base units to the caller against the attached deposit.
    /// The full deposit is credited to the payment splitter.
    #[payable]
    pub fn buy(&mut self, amount: U128) {
        require!(!self.buy_paused, "Buy is Paused");
        let amount = amount.0;
        require!(amount >= self.min_buy, "Must Buy 1 Token");

        let cost = (U256::from(amount) * U256::from(self.token_price) / U256::from(ONE_TOKEN))
            .as_u128();
        let deposit = env::attached_deposit().as_yoctonear();
        require!(deposit >= cost, "Insufficient Payment");

        let buyer = env::predecessor_account_id();
        self.internal_mint(&buyer, amount, Some("Purchase"));
        self.splitter.record_received(deposit);

        TokenEvent::TokensPurchased {
            account_id: buyer,
            amount: U128(amount),
            deposit: U128(deposit),
        }
        .emit();
    }

    /// Mints `amount` whole tokens to `receiver_id`. Owner only.
    pub fn owner_mint(&mut self, receiver_id: AccountId, amount: U128) {
        self.assert_owner();
        let minted = (U256::from(amount.0) * U256::from(ONE_TOKEN)).as_u128();
        require!(minted > 0, "Amount must be positive");

        self.internal_mint(&receiver_id, minted, Some("Owner mint"));
        TokenEvent::OwnerMinted {
            receiver_id,
            amount: U128(minted),
        }
        .emit();
    }

    // --- Pull payments ---

    /// Releases the payment currently due to `payee`. Callable by anyone;
    /// funds only ever move to the registered payee.
    ///
    /// The amount is recorded up front so a release in flight cannot be
    /// drawn a second time; the callback rolls it back if the transfer
    /// failed.
    pub fn release(&mut self, payee: AccountId) -> Promise {
        require!(self.splitter.shares_of(&payee) > 0, "Account has no shares");
        let pending = self.splitter.releasable(&payee);
        require!(pending > 0, "Account is not due payment");

        self.splitter.record_release(&payee, pending);

        Promise::new(payee.clone())
            .transfer(NearToken::from_yoctonear(pending))
            .then(
                Self::ext(env::current_account_id())
                    .with_static_gas(GAS_FOR_RELEASE_CALLBACK)
                    .on_release(payee, U128(pending)),
            )
    }

    #[private]
    pub fn on_release(
        &mut self,
        payee: AccountId,
        amount: U128,
        #[callback_result] result: Result<(), PromiseError>,
    ) {
        if result.is_ok() {
            TokenEvent::PaymentReleased { payee, amount }.emit();
        } else {
            self.splitter.rollback_release(&payee, amount.0);
            env::log_str("Release aborted: transfer failed");
        }
    }

    // --- Owner configuration ---

    pub fn set_claim_pause(&mut self, paused: bool) {
        self.assert_owner();
        self.claim_paused = paused;
        TokenEvent::ClaimPauseUpdated { paused }.emit();
    }

    pub fn set_buy_pause(&mut self, paused: bool) {
        self.assert_owner();
        self.buy_paused = paused;
        TokenEvent::BuyPauseUpdated { paused }.emit();
    }

    pub fn set_time_between_claims(&mut self, seconds: u64) {
        self.assert_owner();
        self.time_between_claims = seconds;
        TokenEvent::ClaimIntervalUpdated { seconds }.emit();
    }

    pub fn set_v1_claim_amount(&mut self, amount: U128) {
        self.assert_owner();
        self.v1_claim_amount = amount.0;
        TokenEvent::ClaimAmountUpdated {
            collection: "v1".to_string(),
            amount,
        }
        .emit();
    }

    pub fn set_v2_claim_amount(&mut self, amount: U128) {
        self.assert_owner();
        self.v2_claim_amount = amount.0;
        TokenEvent::ClaimAmountUpdated {
            collection: "v2".to_string(),
            amount,
        }
        .emit();
    }

    pub fn set_v1_contract(&mut self, contract_id: AccountId) {
        self.assert_owner();
        self.v1_contract = contract_id.clone();
        TokenEvent::CollectionUpdated {
            collection: "v1".to_string(),
            contract_id,
        }
        .emit();
    }

    pub fn set_v2_contract(&mut self, contract_id: AccountId) {
        self.assert_owner();
        self.v2_contract = contract_id.clone();
        TokenEvent::CollectionUpdated {
            collection: "v2".to_string(),
            contract_id,
        }
        .emit();
    }

    pub fn set_token_price(&mut self, price: U128) {
        self.assert_owner();
        require!(price.0 > 0, "Price must be positive");
        self.token_price = price.0;
        TokenEvent::TokenPriceUpdated { price }.emit();
    }

    pub fn set_min_buy(&mut self, amount: U128) {
        self.assert_owner();
        self.min_buy = amount.0;
        TokenEvent::MinBuyUpdated { amount }.emit();
    }

    /// Transfers ownership. Owner only.
    pub fn set_owner(&mut self, new_owner: AccountId) {
        self.assert_owner();
        let old_owner = self.owner_id.clone();
        self.owner_id = new_owner.clone();
        TokenEvent::OwnerChanged {
            old_owner,
            new_owner,
        }
        .emit();
    }

    /// Deploys new contract code. Owner only.
    pub fn update_contract(&self) -> Promise {
        self.assert_owner();
        let code = env::input()
            .unwrap_or_else(|| env::panic_str("No input"))
            .to_vec();
        TokenEvent::ContractUpgraded {
            owner: self.owner_id.clone(),
            timestamp: env::block_timestamp_ms(),
        }
        .emit();
        Promise::new(env::current_account_id())
            .deploy_contract(code)
            .as_return()
    }

    // --- Views ---

    pub fn get_owner(&self) -> AccountId {
        self.owner_id.clone()
    }

    pub fn claim_pause(&self) -> bool {
        self.claim_paused
    }

    pub fn buy_pause(&self) -> bool {
        self.buy_paused
    }

    pub fn time_between_claims(&self) -> u64 {
        self.time_between_claims
    }

    pub fn v1_claim_amount(&self) -> U128 {
        U128(self.v1_claim_amount)
    }

    pub fn v2_claim_amount(&self) -> U128 {
        U128(self.v2_claim_amount)
    }

    pub fn v1_contract(&self) -> AccountId {
        self.v1_contract.clone()
    }

    pub fn v2_contract(&self) -> AccountId {
        self.v2_contract.clone()
    }

    pub fn token_price(&self) -> U128 {
        U128(self.token_price)
    }

    pub fn min_buy(&self) -> U128 {
        U128(self.min_buy)
    }

    pub fn version(&self) -> String {
        VERSION.to_string()
    }

    pub fn get_payees(&self) -> Vec<AccountId> {
        self.splitter.payees()
    }

    pub fn payee_shares(&self, payee: AccountId) -> U128 {
        U128(self.splitter.shares_of(&payee))
    }

    pub fn total_shares(&self) -> U128 {
        U128(self.splitter.total_shares())
    }

    pub fn releasable(&self, payee: AccountId) -> U128 {
        U128(self.splitter.releasable(&payee))
    }

    pub fn released_of(&self, payee: AccountId) -> U128 {
        U128(self.splitter.released_of(&payee))
    }

    pub fn total_received(&self) -> U128 {
        U128(self.splitter.total_received())
    }

    pub fn total_released(&self) -> U128 {
        U128(self.splitter.total_released())
    }

    pub fn get_stats(&self) -> ContractStats {
        ContractStats {
            owner_id: self.owner_id.clone(),
            v1_contract: self.v1_contract.clone(),
            v2_contract: self.v2_contract.clone(),
            v1_claim_amount: U128(self.v1_claim_amount),
            v2_claim_amount: U128(self.v2_claim_amount),
            time_between_claims: self.time_between_claims,
            claim_paused: self.claim_paused,
            buy_paused: self.buy_paused,
            token_price: U128(self.token_price),
            min_buy: U128(self.min_buy),
            total_shares: U128(self.splitter.total_shares()),
            total_received: U128(self.splitter.total_received()),
            total_released: U128(self.splitter.total_released()),
        }
    }

    // --- Internal ---

    fn assert_owner(&self) {
        require!(
            env::predecessor_account_id() == self.owner_id,
            "Only owner can call this method"
        );
    }

    fn is_claim_ready(&self, previous_claim: u64) -> bool {
        previous_claim == 0
            || self.time_between_claims == 0
            || self.elapsed_secs(previous_claim) >= self.time_between_claims
    }

    fn elapsed_secs(&self, since_ns: u64) -> u64 {
        env::block_timestamp().saturating_sub(since_ns) / NS_PER_SEC
    }

    /// Claimable amount at `as_of_ns` given the account's previous claim
    /// timestamp and owned counts. First claims (and a zero interval) use
    /// multiplier 1; later claims scale with whole intervals elapsed.
    fn accrued_amount(
        &self,
        previous_claim: u64,
        as_of_ns: u64,
        v1_count: u128,
        v2_count: u128,
    ) -> u128 {
        let base = (U256::from(v1_count) * U256::from(self.v1_claim_amount)
            + U256::from(v2_count) * U256::from(self.v2_claim_amount))
        .as_u128();

        let multiplier = if previous_claim == 0 || self.time_between_claims == 0 {
            1
        } else {
            let elapsed = as_of_ns.saturating_sub(previous_claim) / NS_PER_SEC;
            (elapsed / self.time_between_claims) as u128
        };

        (U256::from(base) * U256::from(multiplier)).as_u128()
    }

    fn restore_last_claim(&mut self, account_id: &AccountId, previous_claim: u64) {
        if previous_claim == 0 {
            self.last_claim.remove(account_id);
        } else {
            self.last_claim.insert(account_id.clone(), previous_claim);
        }
    }

    fn query_owned_counts(&self, account_id: &AccountId) -> Promise {
        ext_nft::ext(self.v1_contract.clone())
            .with_static_gas(GAS_FOR_NFT_QUERY)
            .nft_supply_for_owner(account_id.clone())
            .and(
                ext_nft::ext(self.v2_contract.clone())
                    .with_static_gas(GAS_FOR_NFT_QUERY)
                    .nft_supply_for_owner(account_id.clone()),
            )
    }

    fn internal_mint(&mut self, account_id: &AccountId, amount: u128, memo: Option<&str>) {
        if !self.token.accounts.contains_key(account_id) {
            self.token.internal_register_account(account_id);
        }
        self.token.internal_deposit(account_id, amount);

        near_contract_standards::fungible_token::events::FtMint {
            owner_id: account_id,
            amount: U128(amount),
            memo,
        }
        .emit();
    }
}

#[near(serializers = [json])]
pub struct ContractStats {
    pub owner_id: AccountId,
    pub v1_contract: AccountId,
    pub v2_contract: AccountId,
    pub v1_claim_amount: U128,
    pub v2_claim_amount: U128,
    pub time_between_claims: u64,
    pub claim_paused: bool,
    pub buy_paused: bool,
    pub token_price: U128,
    pub min_buy: U128,
    pub total_shares: U128,
    pub total_received: U128,
    pub total_released: U128,
}

// --- NEP-141: Fungible Token Core ---
#[near]
impl near_contract_standards::fungible_token::core::FungibleTokenCore for Contract {
    #[payable]
    fn ft_transfer(&mut self, receiver_id: AccountId, amount: U128, memo: Option<String>) {
        self.token.ft_transfer(receiver_id, amount, memo)
    }

    #[payable]
    fn ft_transfer_call(
        &mut self,
        receiver_id: AccountId,
        amount: U128,
        memo: Option<String>,
        msg: String,
    ) -> PromiseOrValue<U128> {
        self.token.ft_transfer_call(receiver_id, amount, memo, msg)
    }

    fn ft_total_supply(&self) -> U128 {
        self.token.ft_total_supply()
    }

    fn ft_balance_of(&self, account_id: AccountId) -> U128 {
        self.token.ft_balance_of(account_id)
    }
}

#[near]
impl near_contract_standards::fungible_token::resolver::FungibleTokenResolver for Contract {
    #[private]
    fn ft_resolve_transfer(
        &mut self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: U128,
    ) -> U128 {
        let (used_amount, burned_amount) =
            self.token
                .internal_ft_resolve_transfer(&sender_id, receiver_id, amount);
        if burned_amount > 0 {
            env::log_str(&format!("Account @{} burned {}", sender_id, burned_amount));
        }
        used_amount.into()
    }
}

// --- NEP-145: Storage Management ---
#[near]
impl near_contract_standards::storage_management::StorageManagement for Contract {
    #[payable]
    fn storage_deposit(
        &mut self,
        account_id: Option<AccountId>,
        registration_only: Option<bool>,
    ) -> near_contract_standards::storage_management::StorageBalance {
        self.token.storage_deposit(account_id, registration_only)
    }

    #[payable]
    fn storage_withdraw(
        &mut self,
        amount: Option<NearToken>,
    ) -> near_contract_standards::storage_management::StorageBalance {
        self.token.storage_withdraw(amount)
    }

    #[payable]
    fn storage_unregister(&mut self, force: Option<bool>) -> bool {
        if let Some((account_id, balance)) = self.token.internal_storage_unregister(force) {
            env::log_str(&format!("Closed @{} with {}", account_id, balance));
            true
        } else {
            false
        }
    }

    fn storage_balance_bounds(
        &self,
    ) -> near_contract_standards::storage_management::StorageBalanceBounds {
        self.token.storage_balance_bounds()
    }

    fn storage_balance_of(
        &self,
        account_id: AccountId,
    ) -> Option<near_contract_standards::storage_management::StorageBalance> {
        self.token.storage_balance_of(account_id)
    }
}

// --- NEP-148: Fungible Token Metadata ---
#[near]
impl FungibleTokenMetadataProvider for Contract {
    fn ft_metadata(&self) -> FungibleTokenMetadata {
        self.metadata.clone()
    }
}
