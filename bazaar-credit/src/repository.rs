use async_trait::async_trait;
use bazaar_core::{Repository, StoreResult};
use uuid::Uuid;

use crate::models::{AssessmentDraft, CreditAssessment, Retailer, RetailerUpdate};

#[async_trait]
pub trait RetailerRepository: Repository<Retailer> {
    async fn update_profile(
        &self,
        id: Uuid,
        changes: &RetailerUpdate,
    ) -> StoreResult<Option<Retailer>>;
}

/// Append-only assessment history.
#[async_trait]
pub trait AssessmentHistory: Send + Sync {
    /// Append an assessment and overwrite the retailer's cached score and
    /// tier in the same atomic step. Fails with `StoreError::NotFound` if
    /// the retailer is gone.
    async fn record(&self, draft: AssessmentDraft) -> StoreResult<CreditAssessment>;

    async fn latest(&self, retailer_id: Uuid) -> StoreResult<Option<CreditAssessment>>;

    /// Most recent first.
    async fn history(&self, retailer_id: Uuid) -> StoreResult<Vec<CreditAssessment>>;
}
