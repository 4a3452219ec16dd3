use cosmwasm_std::Uint128;
use proptest::prelude::*;

use crate::valuation::amount_to_usd;

#[test]
fn amount_to_usd_table_test() {
    struct TestCase {
        description: &'static str,
        amount: u128,
        asset_decimals: u8,
        price: u128,
        price_decimals: u8,
        expected_usd: u128,
    }

    let test_cases = vec![
        TestCase {
            description: "1 token with 18 decimals at 2000.00 USD on an 8-decimal feed",
            amount: 1_000000000000000000,
            asset_decimals: 18,
            price: 2000_00000000,
            price_decimals: 8,
            expected_usd: 2000_000000,
        },
        TestCase {
            description: "half a token with 18 decimals at 2000.00 USD",
            amount: 500000000000000000,
            asset_decimals: 18,
            price: 2000_00000000,
            price_decimals: 8,
            expected_usd: 1000_000000,
        },
        TestCase {
            description: "1 token with 6 decimals at 0.50 USD",
            amount: 1_000000,
            asset_decimals: 6,
            price: 50000000,
            price_decimals: 8,
            expected_usd: 500000,
        },
        TestCase {
            description: "sub-USD dust truncates to zero",
            amount: 1,
            asset_decimals: 18,
            price: 2000_00000000,
            price_decimals: 8,
            expected_usd: 0,
        },
        TestCase {
            description: "price-decimal division truncates before the upscale to 6 decimals",
            amount: 3,
            asset_decimals: 0,
            price: 1_500000,
            price_decimals: 6,
            expected_usd: 4_000000,
        },
        TestCase {
            description: "feed with 0 decimals needs no price adjustment",
            amount: 1_000000,
            asset_decimals: 6,
            price: 2,
            price_decimals: 0,
            expected_usd: 2_000000,
        },
        TestCase {
            description: "asset with more precision than the feed",
            amount: 2_500000000000000000,
            asset_decimals: 18,
            price: 1_000000,
            price_decimals: 6,
            expected_usd: 2_500000,
        },
        TestCase {
            description: "zero amount short-circuits",
            amount: 0,
            asset_decimals: 18,
            price: 2000_00000000,
            price_decimals: 8,
            expected_usd: 0,
        },
    ];

    for test_case in test_cases {
        let usd_value = amount_to_usd(
            Uint128::new(test_case.amount),
            test_case.asset_decimals,
            Uint128::new(test_case.price),
            test_case.price_decimals,
        )
        .unwrap();

        assert_eq!(
            usd_value,
            Uint128::new(test_case.expected_usd),
            "unexpected USD value: {}",
            test_case.description
        );
    }
}

#[test]
fn amount_to_usd_narrowing_overflow_test() {
    // The full-precision product fits into 256 bits, but the final USD value
    // no longer fits into 128, which must be reported rather than truncated
    let res = amount_to_usd(Uint128::MAX, 6, Uint128::MAX, 0);
    assert!(res.is_err());
}

#[test]
fn amount_to_usd_unreasonable_feed_decimals_test() {
    // 10^78 does not fit into 256 bits; a feed reporting such a precision
    // must produce an error instead of a panic
    let res = amount_to_usd(Uint128::new(1000), 6, Uint128::new(1000), 100);
    assert!(res.is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn amount_to_usd_deterministic_proptest(
        amount in 0u128..=u64::MAX as u128,
        asset_decimals in 0u8..=24,
        price in 1u128..=u32::MAX as u128,
        price_decimals in 0u8..=18,
    ) {
        let first = amount_to_usd(
            Uint128::new(amount),
            asset_decimals,
            Uint128::new(price),
            price_decimals,
        ).unwrap();
        let second = amount_to_usd(
            Uint128::new(amount),
            asset_decimals,
            Uint128::new(price),
            price_decimals,
        ).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn amount_to_usd_monotonic_proptest(
        amount1 in 0u128..=u64::MAX as u128,
        amount2 in 0u128..=u64::MAX as u128,
        asset_decimals in 0u8..=24,
        price in 1u128..=u32::MAX as u128,
        price_decimals in 0u8..=18,
    ) {
        let (smaller, larger) = if amount1 <= amount2 {
            (amount1, amount2)
        } else {
            (amount2, amount1)
        };

        let smaller_usd = amount_to_usd(
            Uint128::new(smaller),
            asset_decimals,
            Uint128::new(price),
            price_decimals,
        ).unwrap();
        let larger_usd = amount_to_usd(
            Uint128::new(larger),
            asset_decimals,
            Uint128::new(price),
            price_decimals,
        ).unwrap();

        prop_assert!(smaller_usd <= larger_usd);
    }
}
