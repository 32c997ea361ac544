use async_trait::async_trait;
use bazaar_core::{Repository, StoreError, StoreResult};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{AssessmentDraft, CreditAssessment, NewRetailer, Retailer, RetailerUpdate};
use crate::repository::{AssessmentHistory, RetailerRepository};

#[derive(Default)]
struct Tables {
    retailers: HashMap<Uuid, Retailer>,
    /// Per retailer, oldest first.
    assessments: HashMap<Uuid, Vec<CreditAssessment>>,
}

/// In-process retailer and assessment store.
#[derive(Default)]
pub struct InMemoryCreditStore {
    tables: RwLock<Tables>,
}

impl InMemoryCreditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<Retailer> for InMemoryCreditStore {
    async fn insert(&self, draft: NewRetailer) -> StoreResult<Retailer> {
        let retailer = Retailer::from_draft(draft);
        self.tables.write().await.retailers.insert(retailer.id, retailer.clone());
        Ok(retailer)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Retailer>> {
        Ok(self.tables.read().await.retailers.get(&id).cloned())
    }
}

#[async_trait]
impl RetailerRepository for InMemoryCreditStore {
    async fn update_profile(
        &self,
        id: Uuid,
        changes: &RetailerUpdate,
    ) -> StoreResult<Option<Retailer>> {
        let mut tables = self.tables.write().await;
        Ok(tables.retailers.get_mut(&id).map(|retailer| {
            retailer.apply(changes);
            retailer.clone()
        }))
    }
}

#[async_trait]
impl AssessmentHistory for InMemoryCreditStore {
    async fn record(&self, draft: AssessmentDraft) -> StoreResult<CreditAssessment> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let retailer_id = draft.retailer_id;

        let retailer = tables.retailers.get_mut(&retailer_id).ok_or(StoreError::NotFound {
            entity: "Retailer",
            id: retailer_id,
        })?;

        let log = tables.assessments.entry(retailer_id).or_default();
        let now = Utc::now();
        let assessment_date = match log.last() {
            Some(previous) if previous.assessment_date > now => previous.assessment_date,
            _ => now,
        };
        let assessment = draft.into_assessment(assessment_date);

        retailer.credit_score = Some(assessment.credit_score);
        retailer.risk_level = Some(assessment.risk_level);
        retailer.updated_at = now;
        log.push(assessment.clone());

        Ok(assessment)
    }

    async fn latest(&self, retailer_id: Uuid) -> StoreResult<Option<CreditAssessment>> {
        Ok(self
            .tables
            .read()
            .await
            .assessments
            .get(&retailer_id)
            .and_then(|log| log.last().cloned()))
    }

    async fn history(&self, retailer_id: Uuid) -> StoreResult<Vec<CreditAssessment>> {
        Ok(self
            .tables
            .read()
            .await
            .assessments
            .get(&retailer_id)
            .map(|log| log.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}
