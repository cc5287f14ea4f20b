//! Property: resting orders are always consumed best price first, then FIFO

use orderbook::OrderBook;
use proptest::prelude::*;
use types::{AssetPair, LimitOrder, OrderId, OrderStatus, Price, Side};

fn order(id: u64, side: Side, price: u128) -> LimitOrder {
    let pair = AssetPair::canonical("base", "quote").unwrap();
    let (token_in, token_out) = match side {
        Side::Ask => ("base", "quote"),
        Side::Bid => ("quote", "base"),
    };
    LimitOrder {
        id: OrderId::new(id),
        owner: "maker".to_string(),
        pair,
        side,
        token_in: token_in.to_string(),
        token_out: token_out.to_string(),
        amount_in: 1_000_000,
        remaining_in: 1_000_000,
        limit_price: Price::from_raw(price),
        status: OrderStatus::Active,
        created_at_ns: 0,
        updated_at_ns: 0,
        deadline_ns: None,
        sequence: 0,
    }
}

proptest! {
    #[test]
    fn queue_is_price_then_sequence_ordered(
        entries in proptest::collection::vec((any::<bool>(), 1u128..20), 1..60),
        cancel_mask in proptest::collection::vec(any::<bool>(), 60),
    ) {
        let mut book = OrderBook::new(AssetPair::canonical("base", "quote").unwrap());
        for (i, (is_bid, price)) in entries.iter().enumerate() {
            let side = if *is_bid { Side::Bid } else { Side::Ask };
            book.insert(order(i as u64 + 1, side, price * 1_000_000));
        }
        for (i, cancel) in cancel_mask.iter().take(entries.len()).enumerate() {
            if *cancel {
                book.cancel(OrderId::new(i as u64 + 1), "maker", 1).unwrap();
            }
        }

        let bids = book.queue(Side::Bid, 1);
        for w in bids.windows(2) {
            prop_assert!(
                w[0].limit_price > w[1].limit_price
                    || (w[0].limit_price == w[1].limit_price && w[0].sequence < w[1].sequence)
            );
        }
        let asks = book.queue(Side::Ask, 1);
        for w in asks.windows(2) {
            prop_assert!(
                w[0].limit_price < w[1].limit_price
                    || (w[0].limit_price == w[1].limit_price && w[0].sequence < w[1].sequence)
            );
        }
        prop_assert!(bids.iter().chain(asks.iter()).all(|o| o.status == OrderStatus::Active));

        if let (Some(best_bid), Some(first)) = (book.best_bid(1).unwrap(), bids.first()) {
            prop_assert_eq!(best_bid.price, first.limit_price);
        }
    }
}
