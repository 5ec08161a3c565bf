//! Holding state machine.
//!
//! | buy | sell | holding        |
//! |-----|------|----------------|
//! | 1   | 1    | previous value |
//! | 0   | 0    | previous value |
//! | 1   | 0    | 1              |
//! | 0   | 1    | 0              |
//!
//! The first bar holds iff its buy signal is set.

/// One transition of the state machine.
pub fn next_holding(previous: bool, buy: bool, sell: bool) -> bool {
    match (buy, sell) {
        (true, false) => true,
        (false, true) => false,
        _ => previous,
    }
}

/// Derive the per-bar holding column from the buy and sell signals.
pub fn holding_signal(buy: &[bool], sell: &[bool]) -> Vec<bool> {
    let mut out = Vec::with_capacity(buy.len());
    for (i, (&b, &s)) in buy.iter().zip(sell).enumerate() {
        let state = if i == 0 {
            b
        } else {
            next_holding(out[i - 1], b, s)
        };
        out.push(state);
    }
    out
}
