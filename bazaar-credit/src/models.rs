use bazaar_core::{CoreError, CoreResult, Entity};
use bazaar_shared::Masked;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::{BusinessAttributes, RiskLevel, ScoreCard};

/// A retailer's business profile. `credit_score` and `risk_level` mirror the
/// most recent assessment and are only written by recording one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Retailer {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub business_name: String,
    pub owner_name: String,
    pub email: Option<Masked<String>>,
    pub phone: Option<Masked<String>>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub annual_revenue: Decimal,
    pub years_in_business: i32,
    pub credit_score: Option<i32>,
    pub risk_level: Option<RiskLevel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Retailer {
    const NAME: &'static str = "Retailer";
    type Draft = NewRetailer;
}

impl Retailer {
    pub fn from_draft(draft: NewRetailer) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: draft.user_id,
            business_name: draft.business_name,
            owner_name: draft.owner_name,
            email: draft.email,
            phone: draft.phone,
            address: draft.address,
            city: draft.city,
            state: draft.state,
            pincode: draft.pincode,
            annual_revenue: draft.annual_revenue,
            years_in_business: draft.years_in_business,
            credit_score: None,
            risk_level: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn business_attributes(&self) -> BusinessAttributes {
        BusinessAttributes {
            years_in_business: self.years_in_business,
            annual_revenue: self.annual_revenue,
        }
    }

    pub fn apply(&mut self, changes: &RetailerUpdate) {
        if let Some(v) = &changes.business_name {
            self.business_name = v.clone();
        }
        if let Some(v) = &changes.owner_name {
            self.owner_name = v.clone();
        }
        if let Some(v) = &changes.email {
            self.email = Some(v.clone());
        }
        if let Some(v) = &changes.phone {
            self.phone = Some(v.clone());
        }
        if let Some(v) = &changes.address {
            self.address = Some(v.clone());
        }
        if let Some(v) = &changes.city {
            self.city = Some(v.clone());
        }
        if let Some(v) = &changes.state {
            self.state = Some(v.clone());
        }
        if let Some(v) = &changes.pincode {
            self.pincode = Some(v.clone());
        }
        if let Some(v) = changes.annual_revenue {
            self.annual_revenue = v;
        }
        if let Some(v) = changes.years_in_business {
            self.years_in_business = v;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRetailer {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub business_name: String,
    pub owner_name: String,
    #[serde(default)]
    pub email: Option<Masked<String>>,
    #[serde(default)]
    pub phone: Option<Masked<String>>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub annual_revenue: Decimal,
    #[serde(default)]
    pub years_in_business: i32,
}

impl NewRetailer {
    pub fn validate(&self) -> CoreResult<()> {
        if self.business_name.trim().is_empty() {
            return Err(CoreError::invalid_input("businessName is required"));
        }
        if self.owner_name.trim().is_empty() {
            return Err(CoreError::invalid_input("ownerName is required"));
        }
        validate_business_attributes(Some(self.annual_revenue), Some(self.years_in_business))
    }
}

/// Profile update. Cached credit fields are not part of it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RetailerUpdate {
    pub business_name: Option<String>,
    pub owner_name: Option<String>,
    pub email: Option<Masked<String>>,
    pub phone: Option<Masked<String>>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub annual_revenue: Option<Decimal>,
    pub years_in_business: Option<i32>,
}

impl RetailerUpdate {
    pub fn validate(&self) -> CoreResult<()> {
        if self.business_name.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(CoreError::invalid_input("businessName must not be empty"));
        }
        if self.owner_name.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(CoreError::invalid_input("ownerName must not be empty"));
        }
        validate_business_attributes(self.annual_revenue, self.years_in_business)
    }
}

fn validate_business_attributes(revenue: Option<Decimal>, years: Option<i32>) -> CoreResult<()> {
    if revenue.is_some_and(|r| r.is_sign_negative() && !r.is_zero()) {
        return Err(CoreError::invalid_input("annualRevenue must not be negative"));
    }
    if years.is_some_and(|y| y < 0) {
        return Err(CoreError::invalid_input("yearsInBusiness must not be negative"));
    }
    Ok(())
}

/// Snapshot of one scoring run. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreditAssessment {
    pub id: Uuid,
    pub retailer_id: Uuid,
    pub credit_score: i32,
    pub risk_level: RiskLevel,
    pub recommended_credit_limit: Decimal,
    pub assessment_date: DateTime<Utc>,
}

/// What gets recorded; the store assigns identity and the assessment date.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentDraft {
    pub retailer_id: Uuid,
    pub credit_score: i32,
    pub risk_level: RiskLevel,
    pub recommended_credit_limit: Decimal,
}

impl AssessmentDraft {
    pub fn from_score_card(retailer_id: Uuid, card: &ScoreCard) -> Self {
        Self {
            retailer_id,
            credit_score: card.credit_score,
            risk_level: card.risk_level,
            recommended_credit_limit: card.recommended_credit_limit,
        }
    }

    pub fn into_assessment(self, assessment_date: DateTime<Utc>) -> CreditAssessment {
        CreditAssessment {
            id: Uuid::new_v4(),
            retailer_id: self.retailer_id,
            credit_score: self.credit_score,
            risk_level: self.risk_level,
            recommended_credit_limit: self.recommended_credit_limit,
            assessment_date,
        }
    }
}

/// Cached credit projection of a retailer, read without rescoring.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditInfo {
    pub id: Uuid,
    pub business_name: String,
    pub credit_score: Option<i32>,
    pub risk_level: Option<RiskLevel>,
    pub years_in_business: i32,
    pub annual_revenue: Decimal,
}

impl From<&Retailer> for CreditInfo {
    fn from(retailer: &Retailer) -> Self {
        Self {
            id: retailer.id,
            business_name: retailer.business_name.clone(),
            credit_score: retailer.credit_score,
            risk_level: retailer.risk_level,
            years_in_business: retailer.years_in_business,
            annual_revenue: retailer.annual_revenue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_retailer() -> NewRetailer {
        NewRetailer {
            user_id: None,
            business_name: "Sharma General Store".to_string(),
            owner_name: "Meena Sharma".to_string(),
            email: None,
            phone: None,
            address: None,
            city: Some("Jaipur".to_string()),
            state: Some("Rajasthan".to_string()),
            pincode: None,
            annual_revenue: Decimal::from(1_500_000),
            years_in_business: 6,
        }
    }

    #[test]
    fn test_negative_attributes_are_rejected() {
        let mut draft = new_retailer();
        draft.years_in_business = -1;
        assert!(matches!(draft.validate(), Err(CoreError::InvalidInput(_))));

        let mut draft = new_retailer();
        draft.annual_revenue = Decimal::from(-10);
        assert!(draft.validate().is_err());

        assert!(new_retailer().validate().is_ok());
    }

    #[test]
    fn test_update_cannot_touch_cached_score() {
        let result: Result<RetailerUpdate, _> =
            serde_json::from_value(serde_json::json!({ "creditScore": 99 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_new_retailer_has_no_cached_score() {
        let retailer = Retailer::from_draft(new_retailer());
        assert_eq!(retailer.credit_score, None);
        assert_eq!(retailer.risk_level, None);
        assert_eq!(retailer.business_attributes().years_in_business, 6);
    }
}
