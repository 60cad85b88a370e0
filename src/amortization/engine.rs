//! Level-payment amortization with prepayment

use super::reconcile::reconcile_final_period;
use super::table::{AmortizationTable, LoanCashflow};
use super::round_to_cent;
use crate::delinquency::{apply_transitions, TransitionMatrix};
use crate::loan::LoanDescriptor;
use crate::prepayment::PrepaymentSchedule;

/// Standard level monthly payment
///
/// `P = B * r * (1+r)^n / ((1+r)^n - 1)`, or `B / n` at a zero rate.
pub fn level_payment(balance: f64, monthly_rate: f64, num_payments: u32) -> f64 {
    if num_payments == 0 {
        return 0.0;
    }
    let n = f64::from(num_payments);
    if monthly_rate == 0.0 {
        return balance / n;
    }
    let factor = (1.0 + monthly_rate).powf(n);
    balance * (monthly_rate * factor) / (factor - 1.0)
}

/// Build the amortization table for a loan under a prepayment schedule.
///
/// The level payment is computed once from the original balance and term.
/// Every amount is rounded to the cent as it is produced. The final period
/// retires whatever balance is left.
pub fn amortize(loan: &LoanDescriptor, schedule: &PrepaymentSchedule) -> AmortizationTable {
    let num_periods = loan.term() as usize;
    let mut table = AmortizationTable::with_capacity(num_periods);

    let monthly_rate = loan.wac / 12.0 / 100.0;
    let payment = level_payment(loan.face, monthly_rate, loan.term());

    let mut balance = loan.face;

    for j in 0..num_periods {
        let is_final = j + 1 == num_periods;

        table.period.push(j as u32 + 1);
        table.beg_bal.push(round_to_cent(balance));

        let interest = round_to_cent(balance * monthly_rate);
        table.interest.push(interest);

        // Prepayments shrink the balance faster than the level payment assumes,
        // so scheduled principal is capped at what is still owed
        let principal = if is_final {
            round_to_cent(balance)
        } else {
            round_to_cent(payment - interest).min(round_to_cent(balance))
        };
        table.principal.push(principal);

        let sched_bal = round_to_cent(balance - principal);
        table.sched_bal.push(sched_bal);

        let prepay = round_to_cent(schedule.get(j) * sched_bal);
        table.prepay_amount_arr.push(prepay);

        balance = sched_bal - prepay;
        if balance < 0.0 {
            balance = 0.0;
        }
        table.end_bal.push(round_to_cent(balance));
    }

    table
}

/// Runs the per-loan pipeline: prepayment conversion, amortization,
/// final-period reconciliation and, when the loan asks for it, delinquency
/// bucketing.
#[derive(Debug, Clone, Default)]
pub struct AmortizationEngine {
    /// Roll rates used for any transition row a loan does not supply
    base_matrix: TransitionMatrix,
}

impl AmortizationEngine {
    pub fn new(base_matrix: TransitionMatrix) -> Self {
        Self { base_matrix }
    }

    /// Compute the full cashflow for one (already validated) loan
    pub fn project_loan(&self, loan: &LoanDescriptor) -> LoanCashflow {
        let schedule = PrepaymentSchedule::for_loan(loan);
        let mut table = amortize(loan, &schedule);
        reconcile_final_period(&mut table);

        if loan.static_dq {
            let matrix = self.base_matrix.with_loan_overrides(loan);
            table.delinq_arrays = apply_transitions(&table.beg_bal, &matrix);
        }

        LoanCashflow::new(loan.id.clone(), table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn check_invariants(loan: &LoanDescriptor, table: &AmortizationTable) {
        let n = loan.wam as usize;
        assert_eq!(table.len(), n);
        assert_eq!(table.beg_bal[0], round_to_cent(loan.face));

        for i in 0..n {
            assert_eq!(table.period[i], i as u32 + 1);
            assert_abs_diff_eq!(
                table.sched_bal[i],
                table.beg_bal[i] - table.principal[i],
                epsilon = 0.011
            );
            let expected_end = round_to_cent((table.sched_bal[i] - table.prepay_amount_arr[i]).max(0.0));
            assert_abs_diff_eq!(table.end_bal[i], expected_end, epsilon = 1e-6);
            if i + 1 < n {
                assert_abs_diff_eq!(table.beg_bal[i + 1], table.end_bal[i], epsilon = 1e-6);
            }
        }
        assert!(table.terminal_balance().abs() < 0.01);
    }

    #[test]
    fn test_level_payment() {
        // $250k, 4.5%, 30 years
        let p = level_payment(250_000.0, 0.045 / 12.0, 360);
        assert_abs_diff_eq!(p, 1266.71, epsilon = 0.01);

        assert_eq!(level_payment(1200.0, 0.0, 12), 100.0);
        assert_eq!(level_payment(1200.0, 0.01, 0), 0.0);
    }

    #[test]
    fn test_reference_loan() {
        let loan = LoanDescriptor::new("LOAN001", 360, 4.5, 250_000.0).with_cpr(0.06);
        let table = amortize(&loan, &PrepaymentSchedule::for_loan(&loan));

        assert_abs_diff_eq!(table.interest[0], 937.50, epsilon = 1e-9);
        assert_abs_diff_eq!(table.principal[0], 329.21, epsilon = 1e-9);
        assert_abs_diff_eq!(table.sched_bal[0], 249_670.79, epsilon = 1e-6);
        // SMM ~0.005143 on the scheduled balance
        assert_abs_diff_eq!(table.prepay_amount_arr[0], 1284.06, epsilon = 0.02);
        check_invariants(&loan, &table);
    }

    #[test]
    fn test_no_prepayment_fully_amortizes() {
        let loan = LoanDescriptor::new("A", 360, 6.75, 425_000.0);
        let table = amortize(&loan, &PrepaymentSchedule::for_loan(&loan));

        assert!(table.prepay_amount_arr.iter().all(|&p| p == 0.0));
        check_invariants(&loan, &table);
        // Without prepayment the final payment is close to the level payment
        let p = level_payment(425_000.0, 0.0675 / 12.0, 360);
        let last = table.len() - 1;
        assert_abs_diff_eq!(table.principal[last] + table.interest[last], p, epsilon = 1.0);
    }

    #[test]
    fn test_zero_rate() {
        let loan = LoanDescriptor::new("ZERO", 120, 0.0, 100_000.0);
        let table = amortize(&loan, &PrepaymentSchedule::zero(120));

        assert!(table.interest.iter().all(|&i| i == 0.0));
        for i in 0..119 {
            assert_abs_diff_eq!(table.principal[i], 100_000.0 / 120.0, epsilon = 0.01);
        }
        // Final period picks up the accumulated rounding
        let paid_before: f64 = table.principal[..119].iter().sum();
        assert_abs_diff_eq!(table.principal[119], 100_000.0 - paid_before, epsilon = 1e-6);
        check_invariants(&loan, &table);
    }

    #[test]
    fn test_single_period() {
        let loan = LoanDescriptor::new("ONE", 1, 5.0, 12_345.67).with_cpr(0.2);
        let table = amortize(&loan, &PrepaymentSchedule::for_loan(&loan));

        assert_eq!(table.principal[0], 12_345.67);
        assert_eq!(table.end_bal[0], 0.0);
        assert_eq!(table.prepay_amount_arr[0], 0.0);
        assert_abs_diff_eq!(table.interest[0], 51.44, epsilon = 1e-9);
    }

    #[test]
    fn test_high_prepayment_retires_early() {
        let loan = LoanDescriptor::new("FAST", 360, 7.0, 300_000.0).with_cpr(0.60);
        let table = amortize(&loan, &PrepaymentSchedule::for_loan(&loan));

        check_invariants(&loan, &table);
        assert!(table.principal.iter().all(|&p| p >= 0.0));
        assert!(table.sched_bal.iter().all(|&b| b >= 0.0));
        // Balance is gone well before the stated maturity
        let paid_off = table.end_bal.iter().position(|&b| b == 0.0).unwrap();
        assert!(paid_off < 359);
        assert!(table.interest[paid_off + 1..].iter().all(|&i| i == 0.0));
        assert!(table.principal[paid_off + 1..].iter().all(|&p| p == 0.0));

        // Level-payment principal wherever it fits in the balance, capped otherwise
        let p = level_payment(300_000.0, 0.07 / 12.0, 360);
        for i in 0..table.len() - 1 {
            let level = round_to_cent(p - table.interest[i]);
            assert_eq!(table.principal[i], level.min(table.beg_bal[i]), "period {}", i + 1);
            assert!(table.principal[i] <= table.beg_bal[i]);
        }
    }

    #[test]
    fn test_terminal_balance_grid() {
        for &wam in &[1u32, 2, 12, 59, 180, 360, 480] {
            for &wac in &[0.0, 0.125, 4.5, 12.0, 30.0] {
                for &cpr in &[0.0, 0.06, 0.35, 0.99] {
                    let loan = LoanDescriptor::new("G", wam, wac, 187_654.32).with_cpr(cpr);
                    let table = AmortizationEngine::default().project_loan(&loan).cashflow;
                    check_invariants(&loan, &table);
                }
            }
        }
    }

    #[test]
    fn test_engine_delinquency_toggle() {
        let engine = AmortizationEngine::default();

        let loan = LoanDescriptor::new("DQ", 24, 5.0, 50_000.0).with_cpr(0.05);
        assert!(engine.project_loan(&loan).cashflow.delinq_arrays.is_empty());

        let loan = loan.with_static_dq(true);
        let result = engine.project_loan(&loan);
        let arrays = &result.cashflow.delinq_arrays;
        assert_eq!(arrays.len(), 24);
        for i in 0..24 {
            let total: f64 = arrays.period(i).unwrap().iter().sum();
            assert_abs_diff_eq!(total, result.cashflow.beg_bal[i], epsilon = 1e-6);
        }
        assert_abs_diff_eq!(arrays.dq30_arr[0], 1000.0, epsilon = 1e-9);
    }
}
