//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! Implementations report failures through `anyhow`; the service turns them
//! into transport errors.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Appointment, Case, CaseImage, CaseNote, IssuedToken, JobApplication, PartnershipInquiry,
    SponsorshipCase, SponsorshipDonation, StaffSession, SuccessStory,
};
use crate::status::PaymentStatus;

/// Persistence contract for patient cases and their owned notes and images.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Cases in server order, with notes and images attached.
    async fn list_cases(&self) -> anyhow::Result<Vec<Case>>;
    async fn get_case(&self, id: Uuid) -> anyhow::Result<Option<Case>>;
    async fn create_case(&self, case: Case) -> anyhow::Result<()>;
    /// Writes the scalar fields; notes and images are only ever appended.
    async fn update_case(&self, case: Case) -> anyhow::Result<()>;
    /// Hard delete, cascading to notes and images. Returns false if nothing was deleted.
    async fn delete_case(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn add_image(&self, image: CaseImage) -> anyhow::Result<()>;
    async fn add_note(&self, note: CaseNote) -> anyhow::Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn list_appointments(&self) -> anyhow::Result<Vec<Appointment>>;
    async fn get_appointment(&self, id: Uuid) -> anyhow::Result<Option<Appointment>>;
    async fn create_appointment(&self, appointment: Appointment) -> anyhow::Result<()>;
    async fn update_appointment(&self, appointment: Appointment) -> anyhow::Result<()>;
    async fn delete_appointment(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Persistence contract for fundraising campaigns and their donations.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SponsorshipStore: Send + Sync {
    async fn list_sponsorships(&self) -> anyhow::Result<Vec<SponsorshipCase>>;
    async fn get_sponsorship(&self, id: Uuid) -> anyhow::Result<Option<SponsorshipCase>>;
    async fn create_sponsorship(&self, case: SponsorshipCase) -> anyhow::Result<()>;
    async fn update_sponsorship(&self, case: SponsorshipCase) -> anyhow::Result<()>;

    /// Donations of one campaign, oldest first.
    async fn list_donations(&self, sponsorship_id: Uuid) -> anyhow::Result<Vec<SponsorshipDonation>>;
    async fn create_donation(&self, donation: SponsorshipDonation) -> anyhow::Result<()>;
    /// Changes the payment status and refreshes the campaign's cached raised
    /// amount in the same write. Returns the updated donation, if it exists.
    async fn update_donation_status(
        &self,
        donation_id: Uuid,
        status: PaymentStatus,
    ) -> anyhow::Result<Option<SponsorshipDonation>>;
}

/// Write-mostly storage for the remaining public intake forms.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IntakeStore: Send + Sync {
    async fn create_success_story(&self, story: SuccessStory) -> anyhow::Result<()>;
    async fn list_success_stories(&self) -> anyhow::Result<Vec<SuccessStory>>;
    async fn create_job_application(&self, application: JobApplication) -> anyhow::Result<()>;
    async fn create_partnership_inquiry(&self, inquiry: PartnershipInquiry) -> anyhow::Result<()>;
}

/// Media storage contract for case images, campaign images and resumes.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes and returns a media id.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> anyhow::Result<String>;
    /// Returns the public URL of a stored media id.
    async fn get_url(&self, media_id: &str) -> String;
}

/// Staff identity contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait StaffAuth: Send + Sync {
    /// Verifies credentials and issues a bearer token; `None` on bad credentials.
    async fn login(&self, email: &str, password: &str) -> anyhow::Result<Option<IssuedToken>>;
    /// Resolves a bearer token to a live session.
    async fn authenticate(&self, token: &str) -> Option<StaffSession>;
    async fn logout(&self, token: &str);
}
