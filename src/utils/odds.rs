use rust_decimal::prelude::*;

/// Price for both sides of spread and total markets
pub const STANDARD_VIG_ODDS: i32 = -110;

/// Points of spread that move win probability by one logistic unit
pub const LOGISTIC_SCALE: f64 = 15.0;

const MIN_WIN_PROB: f64 = 0.02;
const MAX_WIN_PROB: f64 = 0.98;

/// Convert probability to American odds
pub fn probability_to_american_odds(prob: f64) -> i32 {
    if prob >= 0.5 {
        // Favorite (negative odds)
        -((prob / (1.0 - prob)) * 100.0).round() as i32
    } else {
        // Underdog (positive odds)
        (((1.0 - prob) / prob) * 100.0).round() as i32
    }
}

/// Win probability for the side laying `spread` points (positive = favored)
pub fn spread_to_win_probability(spread: f64) -> f64 {
    let prob = 1.0 / (1.0 + (-spread / LOGISTIC_SCALE).exp());
    prob.clamp(MIN_WIN_PROB, MAX_WIN_PROB)
}

/// Profit on a winning stake at the given American odds, rounded to cents
pub fn profit_for_stake(stake: Decimal, odds: i32) -> Decimal {
    let profit = if odds > 0 {
        stake * Decimal::from(odds) / Decimal::ONE_HUNDRED
    } else if odds < 0 {
        stake * Decimal::ONE_HUNDRED / Decimal::from(odds.abs())
    } else {
        Decimal::ZERO
    };
    profit.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Total returned on a win: the stake back plus profit
pub fn potential_payout(stake: Decimal, odds: i32) -> Decimal {
    stake + profit_for_stake(stake, odds)
}

/// Round to the nearest half point
pub fn round_to_half(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}
