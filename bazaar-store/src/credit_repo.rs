use async_trait::async_trait;
use bazaar_core::{Repository, StoreError, StoreResult};
use bazaar_credit::{
    AssessmentDraft, AssessmentHistory, CreditAssessment, NewRetailer, Retailer, RetailerRepository,
    RetailerUpdate, RiskLevel,
};
use bazaar_shared::Masked;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::backend;

const RETAILER_COLUMNS: &str = "id, user_id, business_name, owner_name, email, phone, address, city, state, pincode, annual_revenue, years_in_business, credit_score, risk_level, created_at, updated_at";
const ASSESSMENT_COLUMNS: &str =
    "id, retailer_id, credit_score, risk_level, recommended_credit_limit, assessment_date";

/// Retailer profiles and the assessment history share one pool so that
/// recording an assessment can update the cached score in the same
/// transaction.
pub struct StoreCreditRepository {
    pool: PgPool,
}

impl StoreCreditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RetailerRow {
    id: Uuid,
    user_id: Option<Uuid>,
    business_name: String,
    owner_name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    pincode: Option<String>,
    annual_revenue: Decimal,
    years_in_business: i32,
    credit_score: Option<i32>,
    risk_level: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RetailerRow> for Retailer {
    type Error = StoreError;

    fn try_from(row: RetailerRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            business_name: row.business_name,
            owner_name: row.owner_name,
            email: row.email.map(Masked),
            phone: row.phone.map(Masked),
            address: row.address,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            annual_revenue: row.annual_revenue,
            years_in_business: row.years_in_business,
            credit_score: row.credit_score,
            risk_level: row.risk_level.as_deref().map(parse_risk_level).transpose()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AssessmentRow {
    id: Uuid,
    retailer_id: Uuid,
    credit_score: i32,
    risk_level: String,
    recommended_credit_limit: Decimal,
    assessment_date: DateTime<Utc>,
}

impl TryFrom<AssessmentRow> for CreditAssessment {
    type Error = StoreError;

    fn try_from(row: AssessmentRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            retailer_id: row.retailer_id,
            credit_score: row.credit_score,
            risk_level: parse_risk_level(&row.risk_level)?,
            recommended_credit_limit: row.recommended_credit_limit,
            assessment_date: row.assessment_date,
        })
    }
}

fn parse_risk_level(raw: &str) -> StoreResult<RiskLevel> {
    raw.parse().map_err(StoreError::InvalidData)
}

fn reveal(value: &Option<Masked<String>>) -> Option<&str> {
    value.as_ref().map(|m| m.inner().as_str())
}

#[async_trait]
impl Repository<Retailer> for StoreCreditRepository {
    async fn insert(&self, draft: NewRetailer) -> StoreResult<Retailer> {
        let retailer = Retailer::from_draft(draft);

        sqlx::query(
            r#"
            INSERT INTO retailers (id, user_id, business_name, owner_name, email, phone, address, city, state, pincode, annual_revenue, years_in_business, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(retailer.id)
        .bind(retailer.user_id)
        .bind(&retailer.business_name)
        .bind(&retailer.owner_name)
        .bind(reveal(&retailer.email))
        .bind(reveal(&retailer.phone))
        .bind(&retailer.address)
        .bind(&retailer.city)
        .bind(&retailer.state)
        .bind(&retailer.pincode)
        .bind(retailer.annual_revenue)
        .bind(retailer.years_in_business)
        .bind(retailer.created_at)
        .bind(retailer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(retailer)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Retailer>> {
        let row = sqlx::query_as::<_, RetailerRow>(&format!(
            "SELECT {} FROM retailers WHERE id = $1",
            RETAILER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(Retailer::try_from).transpose()
    }
}

#[async_trait]
impl RetailerRepository for StoreCreditRepository {
    async fn update_profile(
        &self,
        id: Uuid,
        changes: &RetailerUpdate,
    ) -> StoreResult<Option<Retailer>> {
        let row = sqlx::query_as::<_, RetailerRow>(&format!(
            r#"
            UPDATE retailers SET
                business_name = COALESCE($2, business_name),
                owner_name = COALESCE($3, owner_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                city = COALESCE($7, city),
                state = COALESCE($8, state),
                pincode = COALESCE($9, pincode),
                annual_revenue = COALESCE($10, annual_revenue),
                years_in_business = COALESCE($11, years_in_business),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            RETAILER_COLUMNS
        ))
        .bind(id)
        .bind(&changes.business_name)
        .bind(&changes.owner_name)
        .bind(reveal(&changes.email))
        .bind(reveal(&changes.phone))
        .bind(&changes.address)
        .bind(&changes.city)
        .bind(&changes.state)
        .bind(&changes.pincode)
        .bind(changes.annual_revenue)
        .bind(changes.years_in_business)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(Retailer::try_from).transpose()
    }
}

#[async_trait]
impl AssessmentHistory for StoreCreditRepository {
    /// The retailer row is updated first so its lock orders concurrent
    /// assessments of the same retailer; the cache and the newest history
    /// row therefore always agree.
    async fn record(&self, draft: AssessmentDraft) -> StoreResult<CreditAssessment> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let updated = sqlx::query(
            "UPDATE retailers SET credit_score = $2, risk_level = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(draft.retailer_id)
        .bind(draft.credit_score)
        .bind(draft.risk_level.as_str())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "Retailer",
                id: draft.retailer_id,
            });
        }

        let row = sqlx::query_as::<_, AssessmentRow>(&format!(
            r#"
            INSERT INTO credit_assessments (id, retailer_id, credit_score, risk_level, recommended_credit_limit, assessment_date)
            VALUES ($1, $2, $3, $4, $5, clock_timestamp())
            RETURNING {}
            "#,
            ASSESSMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(draft.retailer_id)
        .bind(draft.credit_score)
        .bind(draft.risk_level.as_str())
        .bind(draft.recommended_credit_limit)
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        row.try_into()
    }

    async fn latest(&self, retailer_id: Uuid) -> StoreResult<Option<CreditAssessment>> {
        let row = sqlx::query_as::<_, AssessmentRow>(&format!(
            r#"
            SELECT {} FROM credit_assessments
            WHERE retailer_id = $1
            ORDER BY assessment_date DESC, seq DESC
            LIMIT 1
            "#,
            ASSESSMENT_COLUMNS
        ))
        .bind(retailer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(CreditAssessment::try_from).transpose()
    }

    async fn history(&self, retailer_id: Uuid) -> StoreResult<Vec<CreditAssessment>> {
        let rows = sqlx::query_as::<_, AssessmentRow>(&format!(
            r#"
            SELECT {} FROM credit_assessments
            WHERE retailer_id = $1
            ORDER BY assessment_date DESC, seq DESC
            "#,
            ASSESSMENT_COLUMNS
        ))
        .bind(retailer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(CreditAssessment::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_risk_level_must_be_known() {
        assert_eq!(parse_risk_level("medium").unwrap(), RiskLevel::Medium);
        assert!(matches!(parse_risk_level("extreme"), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_retailer_row_masks_contact_fields() {
        let now = Utc::now();
        let row = RetailerRow {
            id: Uuid::new_v4(),
            user_id: None,
            business_name: "Gupta Traders".to_string(),
            owner_name: "R. Gupta".to_string(),
            email: Some("gupta@example.com".to_string()),
            phone: None,
            address: None,
            city: None,
            state: None,
            pincode: None,
            annual_revenue: Decimal::from(800_000),
            years_in_business: 2,
            credit_score: Some(30),
            risk_level: Some("high".to_string()),
            created_at: now,
            updated_at: now,
        };

        let retailer = Retailer::try_from(row).unwrap();
        assert_eq!(retailer.risk_level, Some(RiskLevel::High));
        assert_eq!(format!("{:?}", retailer.email), "Some(********)");
        assert_eq!(reveal(&retailer.email), Some("gupta@example.com"));
    }
}
