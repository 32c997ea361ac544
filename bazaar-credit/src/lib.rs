pub mod scoring;
pub mod models;
pub mod repository;
pub mod service;
pub mod memory;

pub use scoring::{BusinessAttributes, CreditFactor, RiskLevel, ScoreCard};
pub use models::{AssessmentDraft, CreditAssessment, CreditInfo, NewRetailer, Retailer, RetailerUpdate};
pub use repository::{AssessmentHistory, RetailerRepository};
pub use service::{AssessmentReport, CreditService};
pub use memory::InMemoryCreditStore;
