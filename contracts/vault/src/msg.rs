use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

#[cw_serde]
pub struct InstantiateMsg {
    /// Ceiling on the cumulative USD value of accepted deposits, in the
    /// canonical 6-decimal USD unit. Must be nonzero.
    pub deposit_cap_usd: Uint128,
    /// Denom of the chain's native token that the vault accepts.
    pub native_denom: String,
    /// Address of the price feed contract used to value the native token.
    pub native_price_feed: String,
    /// Maximum amount of native tokens per single withdrawal.
    pub native_withdraw_limit: Uint128,
    /// List of addresses allowed to execute permissioned actions. The
    /// instantiating address is whitelisted regardless of this list.
    pub whitelist: Vec<String>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Deposit the native tokens attached to the message.
    DepositNative {},
    /// Deposit `amount` of the given CW20 token. The vault pulls the tokens
    /// from the sender, who must have granted it a sufficient allowance.
    DepositToken { token: String, amount: Uint128 },
    /// Withdraw `amount` of native tokens from the sender's balance.
    WithdrawNative { amount: Uint128 },
    /// Withdraw `amount` of the given CW20 token from the sender's balance.
    WithdrawToken { token: String, amount: Uint128 },
    /// Register or update a CW20 token in the asset registry (whitelisted
    /// only). Passing `decimals: 0` makes the vault ask the token contract
    /// for its declared precision, falling back to 18 if that query fails.
    ConfigureAsset {
        token: String,
        supported: bool,
        decimals: u8,
        withdraw_limit: Uint128,
        price_feed: Option<String>,
    },
    AddToWhitelist {
        address: String,
    },
    RemoveFromWhitelist {
        address: String,
    },
}
