use anyhow::ensure;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which pricing branch of the sell-down policy a calendar date falls in.
/// Every date maps to exactly one branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingBranch {
    /// Before the sell-down starts: full sale price.
    PreDiscount,
    /// From sell_down_start up to (excluding) season_end: phase-1 discount.
    Phase1,
    /// At or after season_end: residual value against purchase cost.
    Residual,
}

/// Discount/liquidation policy for one run, shared read-only across the
/// scenario builder and the recommendation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountPolicy {
    pub sell_down_start: NaiveDate,
    pub phase1_discount_pct: f64,
    pub season_end: NaiveDate,
    pub residual_value_pct: f64,
}

impl DiscountPolicy {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.sell_down_start <= self.season_end,
            "sell_down_start {} must not be after season_end {}",
            self.sell_down_start,
            self.season_end
        );
        ensure!(
            (0.0..=100.0).contains(&self.phase1_discount_pct),
            "phase1_discount_pct must be in [0, 100] (got {})",
            self.phase1_discount_pct
        );
        ensure!(
            (0.0..=100.0).contains(&self.residual_value_pct),
            "residual_value_pct must be in [0, 100] (got {})",
            self.residual_value_pct
        );
        Ok(())
    }

    pub fn branch_for(&self, date: NaiveDate) -> PricingBranch {
        if date < self.sell_down_start {
            PricingBranch::PreDiscount
        } else if date < self.season_end {
            PricingBranch::Phase1
        } else {
            PricingBranch::Residual
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> DiscountPolicy {
        DiscountPolicy {
            sell_down_start: NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(),
            phase1_discount_pct: 30.0,
            season_end: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
            residual_value_pct: 20.0,
        }
    }

    #[test]
    fn every_date_falls_in_exactly_one_branch() {
        let p = policy();
        let mut date = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
        while date <= end {
            let branch = p.branch_for(date);
            let expected = if date < p.sell_down_start {
                PricingBranch::PreDiscount
            } else if date < p.season_end {
                PricingBranch::Phase1
            } else {
                PricingBranch::Residual
            };
            assert_eq!(branch, expected, "date {date}");
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn boundary_dates() {
        let p = policy();
        assert_eq!(
            p.branch_for(NaiveDate::from_ymd_opt(2025, 8, 14).unwrap()),
            PricingBranch::PreDiscount
        );
        assert_eq!(
            p.branch_for(NaiveDate::from_ymd_opt(2025, 8, 15).unwrap()),
            PricingBranch::Phase1
        );
        assert_eq!(
            p.branch_for(NaiveDate::from_ymd_opt(2025, 8, 31).unwrap()),
            PricingBranch::Residual
        );
    }

    #[test]
    fn rejects_inverted_date_range() {
        let mut p = policy();
        p.season_end = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_percentages() {
        let mut p = policy();
        p.phase1_discount_pct = 130.0;
        assert!(p.validate().is_err());

        let mut p = policy();
        p.residual_value_pct = -1.0;
        assert!(p.validate().is_err());
    }
}
