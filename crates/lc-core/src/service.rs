//! # Clinic Service
//!
//! Orchestrates the command flow between the actors and the ports:
//! validate, transition, persist. Read-side operations fetch collections and
//! run the funding aggregator and filter engine over them.
//!
//! Staff-only operations take a [`StaffSession`]; holding one is the
//! authorization guard.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::filter::{self, AppointmentCriteria, CaseCriteria, SponsorshipCriteria};
use crate::funding::{self, DonationStats, FundingSummary};
use crate::models::{
    Appointment, Case, CaseImage, CaseNote, ImageType, JobApplication, PartnershipInquiry,
    SponsorshipCase, SponsorshipDonation, StaffSession, SuccessStory, Upload,
};
use crate::status::{
    self, AppointmentStatus, CasePriority, CaseStatus, PaymentStatus, SponsorshipStatus,
};
use crate::traits::{AppointmentStore, CaseStore, IntakeStore, MediaStore, SponsorshipStore};
use crate::validation::{
    self, AppointmentForm, CaseForm, DonationForm, JobApplicationForm, NoteForm,
    PartnershipForm, SponsorshipForm, StoryForm,
};

/// Notice shown when a list could not be fetched.
pub const LIST_UNAVAILABLE: &str = "The list could not be loaded right now. Please try again.";

/// Result of a list read. Failures degrade to an empty list with a notice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub notice: Option<String>,
}

impl<T> Listing<T> {
    pub fn of(items: Vec<T>) -> Self {
        Listing { items, notice: None }
    }

    fn degraded(what: &str, err: anyhow::Error) -> Self {
        log::warn!("listing {what} failed, showing empty list: {err:#}");
        Listing {
            items: Vec::new(),
            notice: Some(LIST_UNAVAILABLE.to_string()),
        }
    }
}

/// A campaign together with its recomputed funding figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorshipView {
    #[serde(flatten)]
    pub case: SponsorshipCase,
    pub funding: FundingSummary,
}

/// Staff-facing donation ledger of one campaign.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationReport {
    pub donations: Vec<SponsorshipDonation>,
    pub stats: DonationStats,
    pub funding: FundingSummary,
}

/// Entry point for every clinic operation.
#[derive(Clone)]
pub struct ClinicService {
    cases: Arc<dyn CaseStore>,
    appointments: Arc<dyn AppointmentStore>,
    sponsorships: Arc<dyn SponsorshipStore>,
    intake: Arc<dyn IntakeStore>,
    media: Arc<dyn MediaStore>,
}

impl ClinicService {
    pub fn new(
        cases: Arc<dyn CaseStore>,
        appointments: Arc<dyn AppointmentStore>,
        sponsorships: Arc<dyn SponsorshipStore>,
        intake: Arc<dyn IntakeStore>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self { cases, appointments, sponsorships, intake, media }
    }

    /// Wires a single store that implements every persistence port.
    pub fn with_store<S>(store: Arc<S>, media: Arc<dyn MediaStore>) -> Self
    where
        S: CaseStore + AppointmentStore + SponsorshipStore + IntakeStore + 'static,
    {
        Self::new(store.clone(), store.clone(), store.clone(), store, media)
    }

    async fn store_upload(&self, upload: Upload) -> Result<String> {
        let media_id = self
            .media
            .save_upload(upload.data, &upload.content_type)
            .await
            .map_err(|err| {
                log::error!("media upload failed: {err:#}");
                AppError::from(err)
            })?;
        Ok(self.media.get_url(&media_id).await)
    }

    // ── Cases ───────────────────────────────────────────────────────────────

    /// Public intake of a new case. Status starts at NEW.
    pub async fn submit_case(&self, form: &CaseForm) -> Result<Case> {
        let new = validation::validate_case(form)?;
        let case = Case::register(new, Utc::now());
        self.cases.create_case(case.clone()).await?;
        log::info!("case {} registered ({})", case.id, case.priority);
        Ok(case)
    }

    /// Staff-entered case; same rules as public intake.
    pub async fn create_case(&self, staff: &StaffSession, form: &CaseForm) -> Result<Case> {
        let case = self.submit_case(form).await?;
        log::info!("case {} entered by staff {}", case.id, staff.staff_id);
        Ok(case)
    }

    pub async fn list_cases(&self, _staff: &StaffSession, criteria: &CaseCriteria) -> Listing<Case> {
        match self.cases.list_cases().await {
            Ok(cases) => Listing::of(filter::filter(&cases, criteria)),
            Err(err) => Listing::degraded("cases", err),
        }
    }

    pub async fn get_case(&self, _staff: &StaffSession, id: Uuid) -> Result<Case> {
        self.cases
            .get_case(id)
            .await?
            .ok_or_else(|| AppError::not_found("Case", id))
    }

    pub async fn set_case_status(&self, staff: &StaffSession, id: Uuid, next: CaseStatus) -> Result<Case> {
        let mut case = self.get_case(staff, id).await?;
        let change = status::transition(case.status, next, staff);
        case.status = change.to;
        case.updated_at = change.changed_at;
        self.cases.update_case(case.clone()).await?;
        log::info!("case {id} status {} -> {} by {}", change.from, change.to, change.changed_by);
        Ok(case)
    }

    pub async fn set_case_priority(&self, staff: &StaffSession, id: Uuid, next: CasePriority) -> Result<Case> {
        let mut case = self.get_case(staff, id).await?;
        let change = status::transition(case.priority, next, staff);
        case.priority = change.to;
        case.updated_at = change.changed_at;
        self.cases.update_case(case.clone()).await?;
        log::info!("case {id} priority {} -> {} by {}", change.from, change.to, change.changed_by);
        Ok(case)
    }

    /// Assigns the case to a staff member, or clears the assignment.
    pub async fn assign_case(&self, staff: &StaffSession, id: Uuid, assignee: Option<Uuid>) -> Result<Case> {
        let mut case = self.get_case(staff, id).await?;
        case.assigned_to_id = assignee;
        case.updated_at = Utc::now();
        self.cases.update_case(case.clone()).await?;
        log::info!("case {id} assigned to {assignee:?} by {}", staff.staff_id);
        Ok(case)
    }

    pub async fn add_case_note(&self, staff: &StaffSession, id: Uuid, form: &NoteForm) -> Result<CaseNote> {
        let (content, note_type) = validation::validate_note(form)?;
        self.get_case(staff, id).await?;
        let note = CaseNote {
            id: Uuid::now_v7(),
            case_id: id,
            note_type,
            content,
            author_id: staff.staff_id,
            author_name: staff.name.clone(),
            created_at: Utc::now(),
        };
        self.cases.add_note(note.clone()).await?;
        log::info!("case {id} note {} appended by {}", note.id, staff.staff_id);
        Ok(note)
    }

    pub async fn add_case_image(
        &self,
        staff: &StaffSession,
        id: Uuid,
        image_type: ImageType,
        upload: Option<Upload>,
    ) -> Result<CaseImage> {
        validation::validate_upload("image", upload.as_ref(), image_type != ImageType::MedicalReport)?;
        self.get_case(staff, id).await?;
        let Some(upload) = upload else {
            return Err(validation::ValidationErrors::single("image file is required").into());
        };
        let url = self.store_upload(upload).await?;
        let image = CaseImage {
            id: Uuid::now_v7(),
            case_id: id,
            image_type,
            url,
            created_at: Utc::now(),
        };
        self.cases.add_image(image.clone()).await?;
        log::info!("case {id} image {} ({}) appended by {}", image.id, image_type.as_str(), staff.staff_id);
        Ok(image)
    }

    /// Irreversible; notes and images go with the case.
    pub async fn delete_case(&self, staff: &StaffSession, id: Uuid) -> Result<()> {
        if !self.cases.delete_case(id).await? {
            return Err(AppError::not_found("Case", id));
        }
        log::info!("case {id} deleted by {}", staff.staff_id);
        Ok(())
    }

    // ── Appointments ────────────────────────────────────────────────────────

    /// Public booking; only the fixed appointment types are offered.
    pub async fn book_appointment(&self, form: &AppointmentForm) -> Result<Appointment> {
        let new = validation::validate_appointment(form, false)?;
        self.persist_appointment(Appointment::book(new, Utc::now())).await
    }

    /// Staff booking; free-text appointment types are allowed.
    pub async fn create_appointment(&self, staff: &StaffSession, form: &AppointmentForm) -> Result<Appointment> {
        let new = validation::validate_appointment(form, true)?;
        let appointment = self.persist_appointment(Appointment::book(new, Utc::now())).await?;
        log::info!("appointment {} entered by staff {}", appointment.id, staff.staff_id);
        Ok(appointment)
    }

    async fn persist_appointment(&self, appointment: Appointment) -> Result<Appointment> {
        if let Some(case_id) = appointment.case_id {
            if self.cases.get_case(case_id).await?.is_none() {
                return Err(AppError::not_found("Case", case_id));
            }
        }
        self.appointments.create_appointment(appointment.clone()).await?;
        log::info!("appointment {} booked for {}", appointment.id, appointment.scheduled_at());
        Ok(appointment)
    }

    /// Appointments matching `criteria`, newest first.
    pub async fn list_appointments(&self, _staff: &StaffSession, criteria: &AppointmentCriteria) -> Listing<Appointment> {
        match self.appointments.list_appointments().await {
            Ok(items) => Listing::of(filter::filter(&items, criteria)),
            Err(err) => Listing::degraded("appointments", err),
        }
    }

    pub async fn set_appointment_status(
        &self,
        staff: &StaffSession,
        id: Uuid,
        next: AppointmentStatus,
    ) -> Result<Appointment> {
        let mut appointment = self
            .appointments
            .get_appointment(id)
            .await?
            .ok_or_else(|| AppError::not_found("Appointment", id))?;
        let change = status::transition(appointment.status, next, staff);
        appointment.status = change.to;
        self.appointments.update_appointment(appointment.clone()).await?;
        log::info!("appointment {id} status {} -> {} by {}", change.from, change.to, change.changed_by);
        Ok(appointment)
    }

    /// Cancellation removes the record; open to the public and to staff.
    pub async fn cancel_appointment(&self, id: Uuid) -> Result<()> {
        if !self.appointments.delete_appointment(id).await? {
            return Err(AppError::not_found("Appointment", id));
        }
        log::info!("appointment {id} cancelled");
        Ok(())
    }

    // ── Sponsorships ────────────────────────────────────────────────────────

    /// Opens a campaign. The case image is validated before anything is stored.
    pub async fn create_sponsorship(
        &self,
        staff: &StaffSession,
        form: &SponsorshipForm,
        case_image: Option<Upload>,
    ) -> Result<SponsorshipCase> {
        let new = validation::validate_sponsorship(form, case_image.as_ref())?;
        let Some(upload) = case_image else {
            return Err(validation::ValidationErrors::single("case image file is required").into());
        };
        let image_url = self.store_upload(upload).await?;
        let case = SponsorshipCase::open(new, image_url, Utc::now());
        self.sponsorships.create_sponsorship(case.clone()).await?;
        log::info!("sponsorship {} opened by {} (target {})", case.id, staff.staff_id, case.target_amount);
        Ok(case)
    }

    pub async fn list_sponsorships(&self, _staff: &StaffSession, criteria: &SponsorshipCriteria) -> Listing<SponsorshipCase> {
        match self.sponsorships.list_sponsorships().await {
            Ok(items) => Listing::of(filter::filter(&items, criteria)),
            Err(err) => Listing::degraded("sponsorships", err),
        }
    }

    async fn load_sponsorship(&self, id: Uuid) -> Result<SponsorshipCase> {
        self.sponsorships
            .get_sponsorship(id)
            .await?
            .ok_or_else(|| AppError::not_found("SponsorshipCase", id))
    }

    async fn view(&self, case: SponsorshipCase) -> Result<SponsorshipView> {
        let donations = self.sponsorships.list_donations(case.id).await?;
        let funding = FundingSummary::for_case(&case, &donations);
        Ok(SponsorshipView { case, funding })
    }

    pub async fn get_sponsorship(&self, _staff: &StaffSession, id: Uuid) -> Result<SponsorshipView> {
        let case = self.load_sponsorship(id).await?;
        self.view(case).await
    }

    pub async fn set_sponsorship_status(
        &self,
        staff: &StaffSession,
        id: Uuid,
        next: SponsorshipStatus,
    ) -> Result<SponsorshipCase> {
        let mut case = self.load_sponsorship(id).await?;
        let change = status::transition(case.status, next, staff);
        case.status = change.to;
        self.sponsorships.update_sponsorship(case.clone()).await?;
        log::info!("sponsorship {id} status {} -> {} by {}", change.from, change.to, change.changed_by);
        Ok(case)
    }

    pub async fn donation_report(&self, staff: &StaffSession, id: Uuid) -> Result<DonationReport> {
        let case = self.load_sponsorship(id).await?;
        let donations = self.sponsorships.list_donations(id).await?;
        let funding = FundingSummary::for_case(&case, &donations);
        log::debug!("donation report for {id} requested by {}", staff.staff_id);
        Ok(DonationReport {
            stats: funding.donations,
            funding,
            donations,
        })
    }

    /// Changes a donation's payment status and refreshes the campaign's cached
    /// raised amount from its completed donations.
    pub async fn set_donation_status(
        &self,
        staff: &StaffSession,
        donation_id: Uuid,
        next: PaymentStatus,
    ) -> Result<SponsorshipView> {
        let donation = self
            .sponsorships
            .update_donation_status(donation_id, next)
            .await?
            .ok_or_else(|| AppError::not_found("SponsorshipDonation", donation_id))?;
        log::info!("donation {donation_id} payment status -> {next} by {}", staff.staff_id);

        let mut case = self.load_sponsorship(donation.sponsorship_id).await?;
        let donations = self.sponsorships.list_donations(case.id).await?;
        let funding = FundingSummary::for_case(&case, &donations);
        if case.raised_amount != funding.raised_amount {
            case.raised_amount = funding.raised_amount;
            self.sponsorships.update_sponsorship(case.clone()).await?;
            log::info!("sponsorship {} raised amount now {}", case.id, case.raised_amount);
        }
        Ok(SponsorshipView { case, funding })
    }

    /// Ongoing campaigns only, in server order.
    pub async fn public_sponsorships(&self) -> Listing<SponsorshipView> {
        match self.sponsorships.list_sponsorships().await {
            Ok(cases) => Listing::of(
                funding::public_listing(cases)
                    .into_iter()
                    .map(|case| SponsorshipView {
                        funding: FundingSummary::from_cached(&case),
                        case,
                    })
                    .collect(),
            ),
            Err(err) => Listing::degraded("public sponsorships", err),
        }
    }

    /// A campaign that is not ongoing is reported as not found, sending the
    /// public viewer back to the listing.
    pub async fn public_sponsorship(&self, id: Uuid) -> Result<SponsorshipView> {
        let case = self.load_sponsorship(id).await?;
        if !funding::is_publicly_visible(&case) {
            return Err(AppError::not_found("SponsorshipCase", id));
        }
        self.view(case).await
    }

    /// Public pledge; always starts PENDING.
    pub async fn donate(&self, sponsorship_id: Uuid, form: &DonationForm) -> Result<SponsorshipDonation> {
        let new = validation::validate_donation(form)?;
        let case = self.load_sponsorship(sponsorship_id).await?;
        if !funding::is_publicly_visible(&case) {
            return Err(AppError::not_found("SponsorshipCase", sponsorship_id));
        }
        let donation = SponsorshipDonation::pledge(case.id, new, Utc::now());
        self.sponsorships.create_donation(donation.clone()).await?;
        log::info!("donation {} pledged to sponsorship {}", donation.id, case.id);
        Ok(donation)
    }

    // ── Stories and other intake ────────────────────────────────────────────

    pub async fn create_story(&self, staff: &StaffSession, form: &StoryForm) -> Result<SuccessStory> {
        let new = validation::validate_story(form)?;
        let mut milestones = new.milestones;
        filter::order_milestones(&mut milestones);
        let story = SuccessStory {
            id: Uuid::now_v7(),
            title: new.title,
            patient_name: new.patient_name,
            content: new.content,
            kind: new.kind,
            is_published: new.is_published,
            milestones,
            created_at: Utc::now(),
        };
        self.intake.create_success_story(story.clone()).await?;
        log::info!("story {} created by {}", story.id, staff.staff_id);
        Ok(story)
    }

    /// Published stories with milestones in ascending order.
    pub async fn published_stories(&self) -> Listing<SuccessStory> {
        match self.intake.list_success_stories().await {
            Ok(stories) => Listing::of(
                stories
                    .into_iter()
                    .filter(|story| story.is_published)
                    .map(|mut story| {
                        filter::order_milestones(&mut story.milestones);
                        story
                    })
                    .collect(),
            ),
            Err(err) => Listing::degraded("stories", err),
        }
    }

    pub async fn submit_job_application(
        &self,
        form: &JobApplicationForm,
        resume: Option<Upload>,
    ) -> Result<JobApplication> {
        let new = validation::validate_job_application(form, resume.as_ref())?;
        let Some(resume) = resume else {
            return Err(validation::ValidationErrors::single("resume file is required").into());
        };
        let resume = self.store_upload(resume).await?;
        let application = JobApplication {
            id: Uuid::now_v7(),
            full_name: new.full_name,
            email: new.email,
            phone: new.phone,
            position: new.position,
            years_of_experience: new.years_of_experience,
            cover_letter: new.cover_letter,
            resume,
            created_at: Utc::now(),
        };
        self.intake.create_job_application(application.clone()).await?;
        log::info!("job application {} received for {}", application.id, application.position);
        Ok(application)
    }

    pub async fn submit_partnership(&self, form: &PartnershipForm) -> Result<PartnershipInquiry> {
        let new = validation::validate_partnership(form)?;
        let inquiry = PartnershipInquiry {
            id: Uuid::now_v7(),
            organization_name: new.organization_name,
            contact_name: new.contact_name,
            email: new.email,
            phone: new.phone,
            partnership_type: new.partnership_type,
            message: new.message,
            created_at: Utc::now(),
        };
        self.intake.create_partnership_inquiry(inquiry.clone()).await?;
        log::info!("partnership inquiry {} received", inquiry.id);
        Ok(inquiry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentMethod, StaffSession};
    use crate::traits::{
        MockAppointmentStore, MockCaseStore, MockIntakeStore, MockMediaStore, MockSponsorshipStore,
    };
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn staff() -> StaffSession {
        StaffSession {
            staff_id: Uuid::now_v7(),
            email: "coordinator@clinic.test".into(),
            name: "Coordinator".into(),
            expires_at: Utc::now() + chrono::Duration::hours(8),
        }
    }

    struct Mocks {
        cases: MockCaseStore,
        appointments: MockAppointmentStore,
        sponsorships: MockSponsorshipStore,
        intake: MockIntakeStore,
        media: MockMediaStore,
    }

    impl Mocks {
        fn new() -> Self {
            Mocks {
                cases: MockCaseStore::new(),
                appointments: MockAppointmentStore::new(),
                sponsorships: MockSponsorshipStore::new(),
                intake: MockIntakeStore::new(),
                media: MockMediaStore::new(),
            }
        }

        fn service(self) -> ClinicService {
            ClinicService::new(
                Arc::new(self.cases),
                Arc::new(self.appointments),
                Arc::new(self.sponsorships),
                Arc::new(self.intake),
                Arc::new(self.media),
            )
        }
    }

    fn campaign(target: f64, status: SponsorshipStatus) -> SponsorshipCase {
        SponsorshipCase {
            id: Uuid::now_v7(),
            patient_name: "Sara".into(),
            age: 9,
            case_description: "Upper limb prosthesis".into(),
            case_image: "/static/uploads/aa/bb/aabb.png".into(),
            video_url: None,
            estimated_cost: target,
            target_amount: target,
            raised_amount: 0.0,
            status,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            is_featured: false,
            created_at: Utc::now(),
        }
    }

    fn case_form() -> CaseForm {
        CaseForm {
            full_name: "Ahmed Hassan".into(),
            age: "42".into(),
            gender: "MALE".into(),
            phone: "0100".into(),
            address: "Cairo".into(),
            amputation_type: "Transtibial".into(),
            amputation_level: "Below knee".into(),
            amputation_date: "2024-01-01".into(),
            current_condition: "Healed".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn invalid_case_never_reaches_the_store() {
        let mut mocks = Mocks::new();
        mocks.cases.expect_create_case().never();
        let mut form = case_form();
        form.amputation_date.clear();

        let err = mocks.service().submit_case(&form).await.unwrap_err();
        assert_eq!(err.headline(), "amputation date is required");
    }

    #[tokio::test]
    async fn submitted_case_starts_new_with_medium_priority() {
        let mut mocks = Mocks::new();
        mocks
            .cases
            .expect_create_case()
            .withf(|case| case.status == CaseStatus::New && case.priority == CasePriority::Medium)
            .times(1)
            .returning(|_| Ok(()));

        let case = mocks.service().submit_case(&case_form()).await.unwrap();
        assert_eq!(case.full_name, "Ahmed Hassan");
    }

    #[tokio::test]
    async fn case_status_change_touches_only_status() {
        let stored = Case::register(validation::validate_case(&case_form()).unwrap(), Utc::now());
        let id = stored.id;
        let mut mocks = Mocks::new();
        let fetched = stored.clone();
        mocks.cases.expect_get_case().returning(move |_| Ok(Some(fetched.clone())));
        let written = Arc::new(Mutex::new(None));
        let sink = written.clone();
        mocks.cases.expect_update_case().returning(move |case| {
            *sink.lock().unwrap() = Some(case);
            Ok(())
        });

        let updated = mocks
            .service()
            .set_case_status(&staff(), id, CaseStatus::Completed)
            .await
            .unwrap();
        assert_eq!(updated.status, CaseStatus::Completed);

        let written = written.lock().unwrap().clone().unwrap();
        assert_eq!(written.status, CaseStatus::Completed);
        assert_eq!(written.priority, stored.priority);
        assert_eq!(written.additional_notes, stored.additional_notes);
        assert_eq!(written.full_name, stored.full_name);
    }

    #[tokio::test]
    async fn assignment_is_set_then_cleared() {
        let stored = Case::register(validation::validate_case(&case_form()).unwrap(), Utc::now());
        let id = stored.id;
        let assignee = Uuid::now_v7();
        let current = Arc::new(Mutex::new(stored.clone()));
        let mut mocks = Mocks::new();
        let reader = current.clone();
        mocks
            .cases
            .expect_get_case()
            .returning(move |_| Ok(Some(reader.lock().unwrap().clone())));
        let writer = current.clone();
        mocks.cases.expect_update_case().times(2).returning(move |case| {
            *writer.lock().unwrap() = case;
            Ok(())
        });
        let service = mocks.service();

        let assigned = service.assign_case(&staff(), id, Some(assignee)).await.unwrap();
        assert_eq!(assigned.assigned_to_id, Some(assignee));
        let written = current.lock().unwrap().clone();
        assert_eq!(written.assigned_to_id, Some(assignee));
        assert_eq!(written.status, stored.status);
        assert_eq!(written.priority, stored.priority);
        assert_eq!(written.full_name, stored.full_name);
        assert_eq!(written.notes, stored.notes);

        let cleared = service.assign_case(&staff(), id, None).await.unwrap();
        assert_eq!(cleared.assigned_to_id, None);
        let written = current.lock().unwrap().clone();
        assert_eq!(written.assigned_to_id, None);
        assert_eq!(written.status, stored.status);
        assert_eq!(written.created_at, stored.created_at);
    }

    #[tokio::test]
    async fn missing_case_is_not_found() {
        let mut mocks = Mocks::new();
        mocks.cases.expect_get_case().returning(|_| Ok(None));
        let err = mocks
            .service()
            .set_case_priority(&staff(), Uuid::now_v7(), CasePriority::High)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(entity, _) if entity == "Case"));
    }

    #[tokio::test]
    async fn store_failure_on_write_surfaces_as_transport_error() {
        let mut mocks = Mocks::new();
        mocks
            .cases
            .expect_create_case()
            .returning(|_| Err(anyhow::anyhow!("503 Service Unavailable")));
        let err = mocks.service().submit_case(&case_form()).await.unwrap_err();
        assert!(matches!(err, AppError::Transport(message) if message.contains("503")));
    }

    #[tokio::test]
    async fn list_failure_degrades_to_empty_list_with_notice() {
        let mut mocks = Mocks::new();
        mocks
            .cases
            .expect_list_cases()
            .returning(|| Err(anyhow::anyhow!("timeout")));
        let listing = mocks.service().list_cases(&staff(), &CaseCriteria::default()).await;
        assert!(listing.items.is_empty());
        assert_eq!(listing.notice.as_deref(), Some(LIST_UNAVAILABLE));
    }

    #[tokio::test]
    async fn public_listing_hides_closed_campaigns() {
        let open = campaign(1000.0, SponsorshipStatus::Ongoing);
        let done = campaign(1000.0, SponsorshipStatus::Completed);
        let cancelled = campaign(1000.0, SponsorshipStatus::Cancelled);
        let all = vec![open.clone(), done, cancelled];
        let mut mocks = Mocks::new();
        mocks.sponsorships.expect_list_sponsorships().returning(move || Ok(all.clone()));

        let listing = mocks.service().public_sponsorships().await;
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].case.id, open.id);
    }

    #[tokio::test]
    async fn staff_listing_sees_every_status_and_filters_featured() {
        let open = campaign(1000.0, SponsorshipStatus::Ongoing);
        let mut featured_done = campaign(500.0, SponsorshipStatus::Completed);
        featured_done.is_featured = true;
        let cancelled = campaign(800.0, SponsorshipStatus::Cancelled);
        let all = vec![open, featured_done.clone(), cancelled];
        let mut mocks = Mocks::new();
        mocks.sponsorships.expect_list_sponsorships().returning(move || Ok(all.clone()));
        let service = mocks.service();

        let everything = service.list_sponsorships(&staff(), &SponsorshipCriteria::default()).await;
        assert_eq!(everything.items.len(), 3);
        assert_eq!(everything.notice, None);

        let featured = service
            .list_sponsorships(&staff(), &SponsorshipCriteria { featured_only: true, ..Default::default() })
            .await;
        assert_eq!(featured.items.len(), 1);
        assert_eq!(featured.items[0].id, featured_done.id);
    }

    #[tokio::test]
    async fn closed_campaign_detail_is_not_found_for_public() {
        let done = campaign(1000.0, SponsorshipStatus::Completed);
        let id = done.id;
        let mut mocks = Mocks::new();
        mocks.sponsorships.expect_get_sponsorship().returning(move |_| Ok(Some(done.clone())));
        mocks.sponsorships.expect_list_donations().never();

        let err = mocks.service().public_sponsorship(id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn completing_a_donation_recomputes_raised_amount() {
        let case = campaign(1000.0, SponsorshipStatus::Ongoing);
        let case_id = case.id;
        let donation = SponsorshipDonation::pledge(
            case_id,
            validation::validate_donation(&DonationForm {
                amount: "300".into(),
                payment_method: "CASH".into(),
                is_anonymous: true,
                ..Default::default()
            })
            .unwrap(),
            Utc::now(),
        );
        let donation_id = donation.id;
        let mut completed = donation.clone();
        completed.payment_status = PaymentStatus::Completed;

        let mut mocks = Mocks::new();
        let updated = completed.clone();
        mocks
            .sponsorships
            .expect_update_donation_status()
            .withf(move |id, status| *id == donation_id && *status == PaymentStatus::Completed)
            .returning(move |_, _| Ok(Some(updated.clone())));
        mocks.sponsorships.expect_get_sponsorship().returning(move |_| Ok(Some(case.clone())));
        mocks
            .sponsorships
            .expect_list_donations()
            .returning(move |_| Ok(vec![completed.clone()]));
        mocks
            .sponsorships
            .expect_update_sponsorship()
            .withf(|case| case.raised_amount == 300.0)
            .times(1)
            .returning(|_| Ok(()));

        let view = mocks
            .service()
            .set_donation_status(&staff(), donation_id, PaymentStatus::Completed)
            .await
            .unwrap();
        assert_eq!(view.case.id, case_id);
        assert_eq!(view.funding.raised_amount, 300.0);
        assert_eq!(view.funding.progress_percent, 30.0);
        assert_eq!(view.funding.remaining, 700.0);
    }

    #[tokio::test]
    async fn donation_to_closed_campaign_is_refused() {
        let cancelled = campaign(500.0, SponsorshipStatus::Cancelled);
        let id = cancelled.id;
        let mut mocks = Mocks::new();
        mocks.sponsorships.expect_get_sponsorship().returning(move |_| Ok(Some(cancelled.clone())));
        mocks.sponsorships.expect_create_donation().never();

        let form = DonationForm {
            donor_name: "Hala".into(),
            donor_email: "hala@example.com".into(),
            donor_phone: "0123".into(),
            amount: "50".into(),
            payment_method: PaymentMethod::CreditCard.as_str().into(),
            ..Default::default()
        };
        assert!(mocks.service().donate(id, &form).await.is_err());
    }

    #[tokio::test]
    async fn sponsorship_image_is_uploaded_after_validation() {
        let mut mocks = Mocks::new();
        mocks
            .media
            .expect_save_upload()
            .times(1)
            .returning(|_, _| Ok("deadbeef.png".to_string()));
        mocks
            .media
            .expect_get_url()
            .returning(|id| format!("/static/uploads/{id}"));
        mocks
            .sponsorships
            .expect_create_sponsorship()
            .withf(|case| case.case_image == "/static/uploads/deadbeef.png" && case.raised_amount == 0.0)
            .returning(|_| Ok(()));

        let form = SponsorshipForm {
            patient_name: "Sara".into(),
            age: "9".into(),
            case_description: "Upper limb".into(),
            estimated_cost: "1200".into(),
            target_amount: "1000".into(),
            start_date: "2024-03-01".into(),
            end_date: "2024-09-01".into(),
            ..Default::default()
        };
        let upload = Upload {
            file_name: Some("sara.png".into()),
            content_type: "image/png".into(),
            data: vec![1, 2, 3],
        };
        let case = mocks
            .service()
            .create_sponsorship(&staff(), &form, Some(upload))
            .await
            .unwrap();
        assert_eq!(case.status, SponsorshipStatus::Ongoing);
    }

    #[tokio::test]
    async fn appointment_linked_to_unknown_case_is_refused() {
        let mut mocks = Mocks::new();
        mocks.cases.expect_get_case().returning(|_| Ok(None));
        mocks.appointments.expect_create_appointment().never();
        let form = AppointmentForm {
            patient_name: "Karim".into(),
            phone: "0100".into(),
            appointment_type: "CONSULTATION".into(),
            appointment_date: "2024-01-10".into(),
            appointment_time: "09:00".into(),
            case_id: Uuid::now_v7().to_string(),
            ..Default::default()
        };
        let err = mocks.service().book_appointment(&form).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn published_stories_have_ordered_milestones() {
        use crate::models::{StoryKind, StoryMilestone};
        let story = SuccessStory {
            id: Uuid::now_v7(),
            title: "Back on the pitch".into(),
            patient_name: "Ziad".into(),
            content: "...".into(),
            kind: StoryKind::Inspirational,
            is_published: true,
            milestones: vec![
                StoryMilestone { title: "Fitting".into(), description: None, order_index: 2 },
                StoryMilestone { title: "Intake".into(), description: None, order_index: 1 },
            ],
            created_at: Utc::now(),
        };
        let mut draft = story.clone();
        draft.id = Uuid::now_v7();
        draft.is_published = false;
        let mut mocks = Mocks::new();
        mocks
            .intake
            .expect_list_success_stories()
            .returning(move || Ok(vec![story.clone(), draft.clone()]));

        let listing = mocks.service().published_stories().await;
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].milestones[0].title, "Intake");
    }
}
