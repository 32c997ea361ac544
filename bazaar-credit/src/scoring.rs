use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Points per year in business, capped at `YEARS_CAP`.
const YEARS_POINTS_PER_YEAR: f64 = 5.0;
const YEARS_CAP: f64 = 30.0;
const YEARS_WEIGHT: f64 = 0.3;

/// One point per `REVENUE_UNIT` of annual revenue, capped at `REVENUE_CAP`.
const REVENUE_UNIT: i64 = 100_000;
const REVENUE_CAP: f64 = 40.0;
const REVENUE_WEIGHT: f64 = 0.4;

const STABILITY_POINTS_PER_YEAR: f64 = 6.0;
const STABILITY_CAP: f64 = 30.0;
const STABILITY_WEIGHT: f64 = 0.3;

const MAX_SCORE: f64 = 100.0;
const LOW_RISK_MIN: i32 = 70;
const MEDIUM_RISK_MIN: i32 = 40;

/// Recommended limit as a fraction of annual revenue (10%).
fn credit_limit_ratio() -> Decimal {
    Decimal::new(1, 1)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Tier for a persisted (rounded) credit score.
    pub fn from_score(score: i32) -> Self {
        if score >= LOW_RISK_MIN {
            RiskLevel::Low
        } else if score >= MEDIUM_RISK_MIN {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level: {}", other)),
        }
    }
}

/// Inputs to the scorer, taken from the retailer's business profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusinessAttributes {
    pub years_in_business: i32,
    pub annual_revenue: Decimal,
}

/// One line of the score breakdown.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreditFactor {
    pub name: String,
    /// Reported for explainability only; the total is the plain sum of the
    /// factor scores.
    pub weight: f64,
    pub score: f64,
    pub description: String,
}

/// Output of a single scoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    /// Capped at 100, before rounding.
    pub raw_score: f64,
    pub credit_score: i32,
    pub risk_level: RiskLevel,
    pub recommended_credit_limit: Decimal,
    pub factors: Vec<CreditFactor>,
}

/// Score a retailer. Pure and deterministic.
///
/// Negative inputs contribute nothing: every factor and the limit are
/// clamped at zero.
pub fn score(attrs: &BusinessAttributes) -> ScoreCard {
    let years = f64::from(attrs.years_in_business.max(0));
    let revenue = attrs.annual_revenue.max(Decimal::ZERO);

    let years_factor = (years * YEARS_POINTS_PER_YEAR).min(YEARS_CAP);
    let revenue_factor = (revenue / Decimal::from(REVENUE_UNIT))
        .to_f64()
        .unwrap_or(REVENUE_CAP)
        .min(REVENUE_CAP);
    let stability_factor = (years * STABILITY_POINTS_PER_YEAR).min(STABILITY_CAP);

    let raw_score = (years_factor + revenue_factor + stability_factor).min(MAX_SCORE);
    let credit_score = raw_score.round() as i32;

    let factors = vec![
        CreditFactor {
            name: "Years in Business".to_string(),
            weight: YEARS_WEIGHT,
            score: years_factor,
            description: format!("{} years in business", attrs.years_in_business.max(0)),
        },
        CreditFactor {
            name: "Annual Revenue".to_string(),
            weight: REVENUE_WEIGHT,
            score: revenue_factor,
            description: format!("₹{} annual revenue", group_thousands(revenue)),
        },
        CreditFactor {
            name: "Business Stability".to_string(),
            weight: STABILITY_WEIGHT,
            score: stability_factor,
            description: "Business stability based on years of operation".to_string(),
        },
    ];

    ScoreCard {
        raw_score,
        credit_score,
        risk_level: RiskLevel::from_score(credit_score),
        recommended_credit_limit: revenue * credit_limit_ratio(),
        factors,
    }
}

/// `1234567.5` -> `1,234,567.5`
fn group_thousands(amount: Decimal) -> String {
    let text = amount.normalize().to_string();
    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(years_in_business: i32, annual_revenue: i64) -> BusinessAttributes {
        BusinessAttributes {
            years_in_business,
            annual_revenue: Decimal::from(annual_revenue),
        }
    }

    #[test]
    fn test_zero_inputs_score_zero() {
        let card = score(&attrs(0, 0));
        assert_eq!(card.credit_score, 0);
        assert_eq!(card.risk_level, RiskLevel::High);
        assert_eq!(card.recommended_credit_limit, Decimal::ZERO);
        assert!(card.factors.iter().all(|f| f.score == 0.0));
    }

    #[test]
    fn test_established_retailer_reaches_low_risk() {
        let card = score(&attrs(20, 1_000_000));

        let scores: Vec<f64> = card.factors.iter().map(|f| f.score).collect();
        assert_eq!(scores, vec![30.0, 10.0, 30.0]);
        assert_eq!(card.raw_score, 70.0);
        assert_eq!(card.credit_score, 70);
        assert_eq!(card.risk_level, RiskLevel::Low);
        assert_eq!(card.recommended_credit_limit, Decimal::from(100_000));
    }

    #[test]
    fn test_weights_are_reported_but_not_applied() {
        let card = score(&attrs(3, 2_500_000));
        let weights: Vec<f64> = card.factors.iter().map(|f| f.weight).collect();
        assert_eq!(weights, vec![0.3, 0.4, 0.3]);

        // 15 + 25 + 18, unweighted
        assert_eq!(card.credit_score, 58);
        assert_eq!(card.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_score_is_capped_at_one_hundred() {
        let card = score(&attrs(40, 90_000_000));
        assert_eq!(card.factors[1].score, 40.0);
        assert_eq!(card.credit_score, 100);
        assert_eq!(card.recommended_credit_limit, Decimal::from(9_000_000));
    }

    #[test]
    fn test_tier_follows_rounded_score() {
        // 20 + 25.5 + 24 = 69.5, persisted as 70
        let card = score(&attrs(4, 2_550_000));
        assert_eq!(card.raw_score, 69.5);
        assert_eq!(card.credit_score, 70);
        assert_eq!(card.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(69), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(39), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0), RiskLevel::High);
    }

    #[test]
    fn test_negative_inputs_are_clamped() {
        let card = score(&attrs(-5, -300_000));
        assert_eq!(card.credit_score, 0);
        assert_eq!(card.recommended_credit_limit, Decimal::ZERO);
    }

    #[test]
    fn test_deterministic() {
        let a = score(&attrs(7, 3_333_333));
        let b = score(&attrs(7, 3_333_333));
        assert_eq!(a, b);
    }

    #[test]
    fn test_descriptions() {
        let card = score(&attrs(12, 1_234_567));
        assert_eq!(card.factors[0].description, "12 years in business");
        assert_eq!(card.factors[1].description, "₹1,234,567 annual revenue");
        assert_eq!(group_thousands(Decimal::new(10005, 1)), "1,000.5");
        assert_eq!(group_thousands(Decimal::from(999)), "999");
    }
}
