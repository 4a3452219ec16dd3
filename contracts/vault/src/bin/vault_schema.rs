use cosmwasm_schema::write_api;
use vault::msg::{ExecuteMsg, InstantiateMsg};
use vault::query::QueryMsg;

fn main() {
    write_api! {
        instantiate: InstantiateMsg,
        execute: ExecuteMsg,
        query: QueryMsg,
    };
}
