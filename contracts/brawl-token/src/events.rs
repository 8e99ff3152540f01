use near_sdk::json_types::U128;
use near_sdk::{AccountId, near};

#[near(event_json(standard = "brawl"))]
pub enum TokenEvent {
    #[event_version("1.0.0")]
    TokensClaimed { account_id: AccountId, amount: U128 },
    #[event_version("1.0.0")]
    TokensPurchased {
        account_id: AccountId,
        amount: U128,
        deposit: U128,
    },
    #[event_version("1.0.0")]
    OwnerMinted {
        receiver_id: AccountId,
        amount: U128,
    },
    #[event_version("1.0.0")]
    PaymentReleased { payee: AccountId, amount: U128 },
    #[event_version("1.0.0")]
    ClaimPauseUpdated { paused: bool },
    #[event_version("1.0.0")]
    BuyPauseUpdated { paused: bool },
    #[event_version("1.0.0")]
    ClaimIntervalUpdated { seconds: u64 },
    #[event_version("1.0.0")]
    ClaimAmountUpdated { collection: String, amount: U128 },
    #[event_version("1.0.0")]
    CollectionUpdated {
        collection: String,
        contract_id: AccountId,
    },
    #[event_version("1.0.0")]
    TokenPriceUpdated { price: U128 },
    #[event_version("1.0.0")]
    MinBuyUpdated { amount: U128 },
    #[event_version("1.0.0")]
    OwnerChanged {
        old_owner: AccountId,
        new_owner: AccountId,
    },
    #[event_version("1.0.0")]
    ContractUpgraded { owner: AccountId, timestamp: u64 },
}
