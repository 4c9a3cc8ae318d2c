//! limbcare/crates/lc-core/src/lib.rs
//!
//! The central domain logic and interface definitions for the clinic console:
//! entities, workflow state machines, the validation gate, the filter engine,
//! funding aggregation and the service that drives them through the ports.

pub mod error;
pub mod filter;
pub mod funding;
pub mod models;
pub mod service;
pub mod status;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use service::{ClinicService, DonationReport, Listing, SponsorshipView};
pub use status::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn test_case_registration_v7() {
        let now = Utc::now();
        let case = Case::register(
            NewCase {
                full_name: "Ahmed Hassan".to_string(),
                age: 42,
                gender: Gender::Male,
                phone: "0100".to_string(),
                email: None,
                address: "Cairo".to_string(),
                amputation_type: "Transtibial".to_string(),
                amputation_level: "Below knee".to_string(),
                amputation_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                current_condition: "Healed".to_string(),
                previous_prosthetics: false,
                additional_notes: None,
                priority: CasePriority::Medium,
            },
            now,
        );
        assert_eq!(case.id.get_version_num(), 7);
        assert_eq!(case.status, CaseStatus::New);
        assert!(case.assigned_to_id.is_none());
        assert_eq!(case.created_at, case.updated_at);

        let json = serde_json::to_value(&case).unwrap();
        assert_eq!(json["status"], "NEW");
        assert_eq!(json["amputationDate"], "2024-01-01");
    }
}
