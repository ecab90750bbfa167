use tracing::debug;

use super::error::{CoreResult, invalid_input};
use super::types::{SipInputs, SipMode, SipPoint, SipProjection};

pub const MAX_YEARS: u32 = 40;
pub const MAX_ANNUAL_RETURN_PERCENT: f64 = 100.0;
pub const DEFAULT_MONTHLY_CONTRIBUTION: f64 = 1_000.0;
pub const DEFAULT_YEARS: u32 = 10;
pub const DEFAULT_ANNUAL_RETURN_PERCENT: f64 = 12.0;
pub const LUMP_DECAY_ANNUAL_RETURN_PERCENT: f64 = 15.0;

pub fn default_rate_for(mode: SipMode) -> f64 {
    match mode {
        SipMode::AnnuityDue => DEFAULT_ANNUAL_RETURN_PERCENT,
        SipMode::LumpDecay => LUMP_DECAY_ANNUAL_RETURN_PERCENT,
    }
}

impl SipInputs {
    pub fn months(&self) -> u32 {
        self.years * 12
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_return_percent / 12.0 / 100.0
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !self.monthly_contribution.is_finite() || self.monthly_contribution <= 0.0 {
            return Err(invalid_input("monthly contribution must be > 0"));
        }
        if self.years == 0 || self.years > MAX_YEARS {
            return Err(invalid_input(format!(
                "years must be between 1 and {MAX_YEARS}"
            )));
        }
        if !self.annual_return_percent.is_finite()
            || !(0.0..=MAX_ANNUAL_RETURN_PERCENT).contains(&self.annual_return_percent)
        {
            return Err(invalid_input(format!(
                "annual return must be between 0 and {MAX_ANNUAL_RETURN_PERCENT} percent"
            )));
        }
        Ok(())
    }
}

pub fn project(inputs: &SipInputs, mode: SipMode) -> CoreResult<SipProjection> {
    inputs.validate()?;

    let series = match mode {
        SipMode::AnnuityDue => annuity_due_series(inputs),
        SipMode::LumpDecay => lump_decay_series(inputs),
    };

    let invested_total = inputs.monthly_contribution * inputs.months() as f64;
    let final_value = series.last().map(|p| p.wealth).unwrap_or(0.0);
    if !final_value.is_finite() || !invested_total.is_finite() {
        return Err(invalid_input(
            "projection overflows; lower the monthly contribution",
        ));
    }
    debug!(
        ?mode,
        months = inputs.months(),
        rate = inputs.annual_return_percent,
        final_value,
        "sip projection"
    );

    Ok(SipProjection {
        mode,
        invested_total,
        final_value,
        gain: final_value - invested_total,
        series,
    })
}

// wealth(m) = c * ((1+r)^m - 1) * (1+r) / r
// (1+r)^m - 1 goes through ln_1p/exp_m1 so tiny rates keep their growth.
fn annuity_due_series(inputs: &SipInputs) -> Vec<SipPoint> {
    let c = inputs.monthly_contribution;
    let r = inputs.monthly_rate();
    let log_growth = r.ln_1p();
    (1..=inputs.months())
        .map(|m| {
            let wealth = if r == 0.0 {
                c * m as f64
            } else {
                c * ((m as f64 * log_growth).exp_m1() * (1.0 + r) / r)
            };
            SipPoint {
                month: m,
                invested: c * m as f64,
                wealth,
            }
        })
        .collect()
}

// Contribution i grows for (months - i) periods; the running sum is the series.
fn lump_decay_series(inputs: &SipInputs) -> Vec<SipPoint> {
    let c = inputs.monthly_contribution;
    let r = inputs.monthly_rate();
    let months = inputs.months();
    let mut wealth = 0.0;
    let mut series = Vec::with_capacity(months as usize);
    for i in 0..months {
        wealth += c * (1.0 + r).powi((months - i) as i32);
        series.push(SipPoint {
            month: i + 1,
            invested: c * (i + 1) as f64,
            wealth,
        });
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CoreError;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }

    fn sample_inputs() -> SipInputs {
        SipInputs {
            monthly_contribution: 1_000.0,
            annual_return_percent: 12.0,
            years: 10,
        }
    }

    #[test]
    fn annuity_due_matches_closed_form() {
        let projection = project(&sample_inputs(), SipMode::AnnuityDue).expect("valid inputs");
        let r: f64 = 0.01;
        let expected = 1_000.0 * ((1.0 + r).powi(120) - 1.0) * (1.0 + r) / r;

        assert_eq!(projection.series.len(), 120);
        assert_approx(projection.invested_total, 120_000.0);
        assert_approx(projection.final_value, expected);
        assert_approx(projection.gain, expected - 120_000.0);
        assert_approx(projection.final_value, 232_339.076_351_9);
    }

    #[test]
    fn annuity_due_first_month_earns_one_period() {
        let projection = project(&sample_inputs(), SipMode::AnnuityDue).expect("valid inputs");
        let first = projection.series[0];
        assert_eq!(first.month, 1);
        assert_approx(first.invested, 1_000.0);
        assert_approx(first.wealth, 1_010.0);
    }

    #[test]
    fn lump_decay_front_loads_growth() {
        let inputs = SipInputs {
            monthly_contribution: 100.0,
            annual_return_percent: 12.0,
            years: 1,
        };
        let lump = project(&inputs, SipMode::LumpDecay).expect("valid inputs");
        let annuity = project(&inputs, SipMode::AnnuityDue).expect("valid inputs");

        assert_approx(lump.series[0].wealth, 100.0 * 1.01_f64.powi(12));
        assert_approx(lump.series[0].invested, 100.0);
        assert!(lump.series[0].wealth > annuity.series[0].wealth);
        assert_approx(lump.final_value, annuity.final_value);
        assert_eq!(lump.mode, SipMode::LumpDecay);
    }

    #[test]
    fn zero_rate_has_no_gain_in_either_mode() {
        let inputs = SipInputs {
            monthly_contribution: 500.0,
            annual_return_percent: 0.0,
            years: 3,
        };
        for mode in [SipMode::AnnuityDue, SipMode::LumpDecay] {
            let projection = project(&inputs, mode).expect("valid inputs");
            for point in &projection.series {
                assert_approx(point.wealth, point.invested);
            }
            assert_approx(projection.gain, 0.0);
        }
    }

    #[test]
    fn rejects_non_positive_contribution_and_duration() {
        let mut inputs = sample_inputs();
        inputs.monthly_contribution = 0.0;
        assert!(matches!(
            project(&inputs, SipMode::AnnuityDue),
            Err(CoreError::InvalidInput(_))
        ));

        let mut inputs = sample_inputs();
        inputs.monthly_contribution = -10.0;
        assert!(matches!(
            project(&inputs, SipMode::LumpDecay),
            Err(CoreError::InvalidInput(_))
        ));

        let mut inputs = sample_inputs();
        inputs.years = 0;
        let err = project(&inputs, SipMode::AnnuityDue).expect_err("zero years must fail");
        assert!(err.to_string().contains("years"));
    }

    #[test]
    fn rejects_rate_outside_bounds() {
        for rate in [-1.0, 100.5, f64::NAN, f64::INFINITY] {
            let mut inputs = sample_inputs();
            inputs.annual_return_percent = rate;
            assert!(matches!(
                inputs.validate(),
                Err(CoreError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn rejects_duration_past_cap() {
        let mut inputs = sample_inputs();
        inputs.years = MAX_YEARS;
        assert_eq!(
            project(&inputs, SipMode::AnnuityDue)
                .expect("cap is inclusive")
                .series
                .len(),
            480
        );
        inputs.years = MAX_YEARS + 1;
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn tiny_positive_rates_approach_the_zero_rate_limit() {
        let months = 120.0;
        for (rate, strictly_above) in [(1e-17, false), (1e-12, true), (1e-10, true)] {
            let inputs = SipInputs {
                monthly_contribution: 1_000.0,
                annual_return_percent: rate,
                years: 10,
            };
            let projection = project(&inputs, SipMode::AnnuityDue).expect("valid inputs");
            let r = inputs.monthly_rate();
            // first-order term of c * sum_{j=1..m} (1+r)^j
            let expected_gain = 1_000.0 * r * months * (months + 1.0) / 2.0;

            assert!(projection.final_value >= projection.invested_total);
            if strictly_above {
                assert!(projection.final_value > projection.invested_total, "rate {rate}");
            }
            assert!(
                (projection.gain - expected_gain).abs() <= 1e-10,
                "rate {rate}: expected gain {expected_gain}, got {}",
                projection.gain
            );

            let lump = project(&inputs, SipMode::LumpDecay).expect("valid inputs");
            assert_approx(projection.final_value, lump.final_value);
        }
    }

    #[test]
    fn rejects_projection_that_overflows() {
        let inputs = SipInputs {
            monthly_contribution: 1e306,
            annual_return_percent: MAX_ANNUAL_RETURN_PERCENT,
            years: MAX_YEARS,
        };
        for mode in [SipMode::AnnuityDue, SipMode::LumpDecay] {
            let err = project(&inputs, mode).expect_err("overflow must be rejected");
            assert!(matches!(err, CoreError::InvalidInput(_)));
            assert!(err.to_string().contains("overflows"));
        }
    }

    #[test]
    fn default_rates_follow_mode() {
        assert_approx(default_rate_for(SipMode::AnnuityDue), 12.0);
        assert_approx(default_rate_for(SipMode::LumpDecay), 15.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_positive_rate_yields_positive_gain(
            contribution in 1u32..100_000,
            rate_bp in 1u32..10_000,
            years in 1u32..=MAX_YEARS
        ) {
            let inputs = SipInputs {
                monthly_contribution: contribution as f64,
                annual_return_percent: rate_bp as f64 / 100.0,
                years,
            };
            let projection = project(&inputs, SipMode::AnnuityDue).expect("valid inputs");
            let last = projection.series.last().expect("non-empty series");
            prop_assert!(last.wealth > last.invested);
            prop_assert!(projection.gain > 0.0);
        }

        #[test]
        fn prop_series_shape_holds_in_both_modes(
            contribution in 1u32..50_000,
            rate_bp in 0u32..2_000,
            years in 1u32..=MAX_YEARS,
            lump in proptest::bool::ANY
        ) {
            let inputs = SipInputs {
                monthly_contribution: contribution as f64,
                annual_return_percent: rate_bp as f64 / 100.0,
                years,
            };
            let mode = if lump { SipMode::LumpDecay } else { SipMode::AnnuityDue };
            let projection = project(&inputs, mode).expect("valid inputs");

            prop_assert_eq!(projection.series.len() as u32, inputs.months());
            let mut prev_invested = 0.0;
            let mut prev_wealth = 0.0;
            for (idx, point) in projection.series.iter().enumerate() {
                prop_assert_eq!(point.month, idx as u32 + 1);
                prop_assert_eq!(point.invested, inputs.monthly_contribution * point.month as f64);
                prop_assert!(point.invested >= prev_invested);
                prop_assert!(point.wealth >= prev_wealth);
                prev_invested = point.invested;
                prev_wealth = point.wealth;
            }
        }

        #[test]
        fn prop_projection_is_deterministic(
            contribution in 1u32..50_000,
            rate_bp in 0u32..2_000,
            years in 1u32..=MAX_YEARS
        ) {
            let inputs = SipInputs {
                monthly_contribution: contribution as f64,
                annual_return_percent: rate_bp as f64 / 100.0,
                years,
            };
            for mode in [SipMode::AnnuityDue, SipMode::LumpDecay] {
                let a = project(&inputs, mode).expect("valid inputs");
                let b = project(&inputs, mode).expect("valid inputs");
                prop_assert_eq!(a.series.len(), b.series.len());
                for (left, right) in a.series.iter().zip(b.series.iter()) {
                    prop_assert_eq!(left.wealth.to_bits(), right.wealth.to_bits());
                    prop_assert_eq!(left.invested.to_bits(), right.invested.to_bits());
                }
            }
        }
    }
}
