//! Loan descriptor as received from callers

use serde::{Deserialize, Serialize};

use crate::delinquency::{DelinquencyState, NUM_STATES};

/// Maximum length of a loan identifier
pub const MAX_ID_LEN: usize = 50;

/// Static terms of a single loan.
///
/// Constructed once per request and read-only for the rest of the pipeline.
/// Field names match the wire format accepted by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanDescriptor {
    /// Opaque identifier used for result correlation (never for ordering)
    pub id: String,

    /// Weighted average maturity: remaining term in months (1 to 480).
    ///
    /// Signed on the wire so out-of-range terms reach the validator.
    pub wam: i64,

    /// Weighted average coupon in percentage points per annum (e.g., 6.75)
    pub wac: f64,

    /// Current principal balance
    pub face: f64,

    /// Annual conditional prepayment rate as a decimal fraction
    #[serde(default)]
    pub prepay_cpr: f64,

    /// Period-varying SMM vector, used only when `prepay_cpr` is zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smm_arr: Option<Vec<f64>>,

    /// Apply the delinquency roll-rate model to this loan
    #[serde(default)]
    pub static_dq: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performing_transition: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq30_transition: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq60_transition: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq90_transition: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq120_transition: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq150_transition: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq180_transition: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_transition: Option<Vec<f64>>,
}

impl LoanDescriptor {
    /// Plain level-pay loan with no prepayment and no delinquency modeling
    pub fn new(id: impl Into<String>, wam: u32, wac: f64, face: f64) -> Self {
        Self {
            id: id.into(),
            wam: i64::from(wam),
            wac,
            face,
            prepay_cpr: 0.0,
            smm_arr: None,
            static_dq: false,
            performing_transition: None,
            dq30_transition: None,
            dq60_transition: None,
            dq90_transition: None,
            dq120_transition: None,
            dq150_transition: None,
            dq180_transition: None,
            default_transition: None,
        }
    }

    /// Term as a period count; 0 when `wam` does not fit (validation rejects it)
    pub fn term(&self) -> u32 {
        u32::try_from(self.wam).unwrap_or(0)
    }

    pub fn with_cpr(mut self, prepay_cpr: f64) -> Self {
        self.prepay_cpr = prepay_cpr;
        self
    }

    pub fn with_static_dq(mut self, static_dq: bool) -> Self {
        self.static_dq = static_dq;
        self
    }

    /// Caller-supplied transition row for a source state, if any
    pub fn transition(&self, state: DelinquencyState) -> Option<&[f64]> {
        let row = match state {
            DelinquencyState::Performing => &self.performing_transition,
            DelinquencyState::Dq30 => &self.dq30_transition,
            DelinquencyState::Dq60 => &self.dq60_transition,
            DelinquencyState::Dq90 => &self.dq90_transition,
            DelinquencyState::Dq120 => &self.dq120_transition,
            DelinquencyState::Dq150 => &self.dq150_transition,
            DelinquencyState::Dq180 => &self.dq180_transition,
            DelinquencyState::Default => &self.default_transition,
        };
        row.as_deref()
    }

    /// Set the transition row for a source state
    pub fn set_transition(&mut self, state: DelinquencyState, row: [f64; NUM_STATES]) {
        let slot = match state {
            DelinquencyState::Performing => &mut self.performing_transition,
            DelinquencyState::Dq30 => &mut self.dq30_transition,
            DelinquencyState::Dq60 => &mut self.dq60_transition,
            DelinquencyState::Dq90 => &mut self.dq90_transition,
            DelinquencyState::Dq120 => &mut self.dq120_transition,
            DelinquencyState::Dq150 => &mut self.dq150_transition,
            DelinquencyState::Dq180 => &mut self.dq180_transition,
            DelinquencyState::Default => &mut self.default_transition,
        };
        *slot = Some(row.to_vec());
    }
}
