//! Final-period balance true-up

use super::table::AmortizationTable;
use super::round_to_cent;

/// Drift at or above this amount in the final period is corrected
pub const RECONCILE_TOLERANCE: f64 = 0.01;

/// Fold any residual left in the final period into its principal.
///
/// Interest, principal and prepayment are rounded independently, so the last
/// row can be a few cents out of balance. When
/// `beg_bal - principal - prepay` differs from `end_bal` by a cent or more,
/// the final principal absorbs the leftover and the ending balance is forced
/// to zero. Returns the adjustment applied (0.0 when already balanced).
/// Running it twice changes nothing the second time.
pub fn reconcile_final_period(table: &mut AmortizationTable) -> f64 {
    let Some(last) = table.len().checked_sub(1) else {
        return 0.0;
    };

    let leftover = table.beg_bal[last] - table.principal[last] - table.prepay_amount_arr[last];
    let end_bal = table.end_bal[last];

    if (leftover - end_bal).abs() < RECONCILE_TOLERANCE {
        return 0.0;
    }

    // Retire the whole leftover so the row balances to a zero ending balance
    let adjustment = round_to_cent(leftover);
    table.principal[last] = round_to_cent(table.principal[last] + adjustment);
    table.sched_bal[last] = round_to_cent(table.beg_bal[last] - table.principal[last]);
    table.end_bal[last] = 0.0;

    log::debug!(
        "Reconciled final period {}: principal adjusted by {:.2}",
        table.period[last],
        adjustment
    );
    adjustment
}
