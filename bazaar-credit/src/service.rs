use bazaar_core::{fetch_existing, CoreError, CoreResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::{AssessmentDraft, CreditAssessment, CreditInfo, NewRetailer, Retailer, RetailerUpdate};
use crate::repository::{AssessmentHistory, RetailerRepository};
use crate::scoring::{self, CreditFactor};

/// A stored assessment plus the transient factor breakdown that produced it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentReport {
    #[serde(flatten)]
    pub assessment: CreditAssessment,
    pub factors: Vec<CreditFactor>,
}

/// Retailer profiles and their credit assessments.
#[derive(Clone)]
pub struct CreditService {
    retailers: Arc<dyn RetailerRepository>,
    history: Arc<dyn AssessmentHistory>,
}

impl CreditService {
    pub fn new(retailers: Arc<dyn RetailerRepository>, history: Arc<dyn AssessmentHistory>) -> Self {
        Self { retailers, history }
    }

    pub async fn register(&self, draft: NewRetailer) -> CoreResult<Retailer> {
        draft.validate()?;
        let retailer = self.retailers.insert(draft).await?;
        info!(retailer_id = %retailer.id, "retailer registered");
        Ok(retailer)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Retailer> {
        fetch_existing(self.retailers.as_ref(), id).await
    }

    pub async fn update(&self, id: Uuid, changes: &RetailerUpdate) -> CoreResult<Retailer> {
        changes.validate()?;
        self.retailers
            .update_profile(id, changes)
            .await?
            .ok_or_else(|| CoreError::not_found("Retailer", id))
    }

    /// Score the retailer's current business attributes, append the result
    /// to the history and refresh the cached score and tier.
    pub async fn assess(&self, retailer_id: Uuid) -> CoreResult<AssessmentReport> {
        let retailer = self.get(retailer_id).await?;
        let card = scoring::score(&retailer.business_attributes());

        let assessment = self
            .history
            .record(AssessmentDraft::from_score_card(retailer_id, &card))
            .await?;

        info!(
            retailer_id = %retailer_id,
            score = assessment.credit_score,
            risk_level = %assessment.risk_level,
            limit = %assessment.recommended_credit_limit,
            "credit assessment recorded"
        );
        Ok(AssessmentReport {
            assessment,
            factors: card.factors,
        })
    }

    pub async fn credit_info(&self, retailer_id: Uuid) -> CoreResult<CreditInfo> {
        let retailer = self.get(retailer_id).await?;
        Ok(CreditInfo::from(&retailer))
    }

    pub async fn latest(&self, retailer_id: Uuid) -> CoreResult<CreditAssessment> {
        self.get(retailer_id).await?;
        self.history.latest(retailer_id).await?.ok_or_else(|| {
            CoreError::NotFound(format!("No credit assessment found for retailer {}", retailer_id))
        })
    }

    /// Most recent first.
    pub async fn history(&self, retailer_id: Uuid) -> CoreResult<Vec<CreditAssessment>> {
        self.get(retailer_id).await?;
        Ok(self.history.history(retailer_id).await?)
    }
}
