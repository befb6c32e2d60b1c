use crate::error::WagerError;
use crate::models::{BetRequest, BettingLine};
use crate::utils::lines::find_offered_line;
use rust_decimal::Decimal;

/// Sum of stakes across a batch
pub fn batch_total(bets: &[BetRequest]) -> Decimal {
    bets.iter().map(|bet| bet.stake).sum()
}

/// Check a proposed batch before anything is committed
///
/// All-or-nothing: the whole batch is refused if any bet is malformed, if
/// betting is locked, or if the combined stake exceeds `balance`.
pub fn validate(balance: Decimal, bets: &[BetRequest], locked: bool) -> Result<(), WagerError> {
    if locked {
        return Err(WagerError::BettingClosed);
    }
    if bets.is_empty() {
        return Err(WagerError::EmptyBatch);
    }

    for (index, bet) in bets.iter().enumerate() {
        if bet.matchup_id.trim().is_empty() {
            return Err(WagerError::MissingField {
                index,
                field: "matchup_id",
            });
        }
        // Payouts are settled in cents
        if bet.stake <= Decimal::ZERO || bet.stake.normalize().scale() > 2 {
            return Err(WagerError::InvalidStake {
                index,
                stake: bet.stake,
            });
        }
        if !bet.selection.fits(bet.bet_type) {
            return Err(WagerError::InvalidSelection {
                index,
                bet_type: bet.bet_type,
                selection: bet.selection,
            });
        }
    }

    let required = batch_total(bets);
    if required > balance {
        return Err(WagerError::InsufficientBalance {
            required,
            available: balance,
        });
    }

    Ok(())
}

/// Pair each request with the line currently offered for it
pub fn match_offered_lines<'a>(
    bets: &[BetRequest],
    lines: &'a [BettingLine],
) -> Result<Vec<&'a BettingLine>, WagerError> {
    bets.iter()
        .enumerate()
        .map(|(index, bet)| {
            find_offered_line(lines, bet).ok_or_else(|| WagerError::UnknownLine {
                index,
                matchup_id: bet.matchup_id.clone(),
                bet_type: bet.bet_type,
                selection: bet.selection,
            })
        })
        .collect()
}
