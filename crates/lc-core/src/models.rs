//! # Domain Models
//!
//! These structs represent the core entities of the clinic console.
//! We use UUID v7 for time-ordered, globally unique identification.
//! `New*` payloads are produced by the validation gate and turned into
//! entities by the service layer.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::{
    AppointmentStatus, CasePriority, CaseStatus, PaymentStatus, SponsorshipStatus,
};

/// Stored in place of the donor name for anonymous donations.
pub const ANONYMOUS_DONOR_NAME: &str = "متبرع مجهول";
pub const ANONYMOUS_DONOR_EMAIL: &str = "anonymous@donor.local";
pub const ANONYMOUS_DONOR_PHONE: &str = "0000000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageType {
    AmputationSite,
    Xray,
    MedicalReport,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteType {
    General,
    Medical,
    Admin,
    Followup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    Cash,
}

macro_rules! wire_tags {
    ($name:ident { $($variant:ident => $tag:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $tag),+
                }
            }

            pub fn parse(tag: &str) -> Option<Self> {
                match tag.trim() {
                    $($tag => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

wire_tags!(Gender { Male => "MALE", Female => "FEMALE" });
wire_tags!(ImageType {
    AmputationSite => "AMPUTATION_SITE",
    Xray => "XRAY",
    MedicalReport => "MEDICAL_REPORT",
    Other => "OTHER",
});
wire_tags!(NoteType {
    General => "GENERAL",
    Medical => "MEDICAL",
    Admin => "ADMIN",
    Followup => "FOLLOWUP",
});
wire_tags!(PaymentMethod {
    CreditCard => "CREDIT_CARD",
    BankTransfer => "BANK_TRANSFER",
    Cash => "CASH",
});

/// Kind of visit. Public booking offers the fixed options; staff edits may
/// store free text, which lands in `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppointmentType {
    Consultation,
    FollowUp,
    Other,
    Custom(String),
}

impl AppointmentType {
    pub fn as_str(&self) -> &str {
        match self {
            AppointmentType::Consultation => "CONSULTATION",
            AppointmentType::FollowUp => "FOLLOW_UP",
            AppointmentType::Other => "OTHER",
            AppointmentType::Custom(text) => text,
        }
    }
}

impl From<String> for AppointmentType {
    fn from(s: String) -> Self {
        match s.trim() {
            "CONSULTATION" => AppointmentType::Consultation,
            "FOLLOW_UP" => AppointmentType::FollowUp,
            "OTHER" => AppointmentType::Other,
            other => AppointmentType::Custom(other.to_string()),
        }
    }
}

impl From<AppointmentType> for String {
    fn from(t: AppointmentType) -> Self {
        match t {
            AppointmentType::Custom(text) => text,
            fixed => fixed.as_str().to_string(),
        }
    }
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A patient's registered medical case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: Uuid,
    pub full_name: String,
    pub age: u16,
    pub gender: Gender,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub amputation_type: String,
    pub amputation_level: String,
    pub amputation_date: NaiveDate,
    pub current_condition: String,
    pub previous_prosthetics: bool,
    pub additional_notes: Option<String>,
    pub status: CaseStatus,
    pub priority: CasePriority,
    pub assigned_to_id: Option<Uuid>,
    /// Append-only, owned by the case.
    pub images: Vec<CaseImage>,
    /// Append-only, owned by the case.
    pub notes: Vec<CaseNote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseImage {
    pub id: Uuid,
    pub case_id: Uuid,
    pub image_type: ImageType,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseNote {
    pub id: Uuid,
    pub case_id: Uuid,
    pub note_type: NoteType,
    pub content: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

/// Validated case intake.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCase {
    pub full_name: String,
    pub age: u16,
    pub gender: Gender,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub amputation_type: String,
    pub amputation_level: String,
    pub amputation_date: NaiveDate,
    pub current_condition: String,
    pub previous_prosthetics: bool,
    pub additional_notes: Option<String>,
    pub priority: CasePriority,
}

impl Case {
    /// Registers a new case in its initial workflow state.
    pub fn register(new: NewCase, now: DateTime<Utc>) -> Self {
        Case {
            id: Uuid::now_v7(),
            full_name: new.full_name,
            age: new.age,
            gender: new.gender,
            phone: new.phone,
            email: new.email,
            address: new.address,
            amputation_type: new.amputation_type,
            amputation_level: new.amputation_level,
            amputation_date: new.amputation_date,
            current_condition: new.current_condition,
            previous_prosthetics: new.previous_prosthetics,
            additional_notes: new.additional_notes,
            status: CaseStatus::New,
            priority: new.priority,
            assigned_to_id: None,
            images: Vec::new(),
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A scheduled patient visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub appointment_type: AppointmentType,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub case_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// The chronological sort key.
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.appointment_date.and_time(self.appointment_time)
    }

    pub fn book(new: NewAppointment, now: DateTime<Utc>) -> Self {
        Appointment {
            id: Uuid::now_v7(),
            patient_name: new.patient_name,
            phone: new.phone,
            email: new.email,
            appointment_type: new.appointment_type,
            appointment_date: new.appointment_date,
            appointment_time: new.appointment_time,
            status: AppointmentStatus::Pending,
            notes: new.notes,
            case_id: new.case_id,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub patient_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub appointment_type: AppointmentType,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub notes: Option<String>,
    pub case_id: Option<Uuid>,
}

/// A public fundraising campaign for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorshipCase {
    pub id: Uuid,
    pub patient_name: String,
    pub age: u16,
    pub case_description: String,
    /// URL of the stored campaign image.
    pub case_image: String,
    pub video_url: Option<String>,
    pub estimated_cost: f64,
    pub target_amount: f64,
    /// Cached sum of completed donations; recomputed on every payment status change.
    pub raised_amount: f64,
    pub status: SponsorshipStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSponsorship {
    pub patient_name: String,
    pub age: u16,
    pub case_description: String,
    pub video_url: Option<String>,
    pub estimated_cost: f64,
    pub target_amount: f64,
    pub status: SponsorshipStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_featured: bool,
}

impl SponsorshipCase {
    pub fn open(new: NewSponsorship, case_image: String, now: DateTime<Utc>) -> Self {
        SponsorshipCase {
            id: Uuid::now_v7(),
            patient_name: new.patient_name,
            age: new.age,
            case_description: new.case_description,
            case_image,
            video_url: new.video_url,
            estimated_cost: new.estimated_cost,
            target_amount: new.target_amount,
            raised_amount: 0.0,
            status: new.status,
            start_date: new.start_date,
            end_date: new.end_date,
            is_featured: new.is_featured,
            created_at: now,
        }
    }
}

/// One pledge against a sponsorship case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorshipDonation {
    pub id: Uuid,
    pub sponsorship_id: Uuid,
    pub donor_name: String,
    pub donor_email: String,
    pub donor_phone: String,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub is_anonymous: bool,
    pub message: Option<String>,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Validated donation. Anonymous donations already carry the sentinel identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDonation {
    pub donor_name: String,
    pub donor_email: String,
    pub donor_phone: String,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub is_anonymous: bool,
    pub message: Option<String>,
}

impl SponsorshipDonation {
    pub fn pledge(sponsorship_id: Uuid, new: NewDonation, now: DateTime<Utc>) -> Self {
        SponsorshipDonation {
            id: Uuid::now_v7(),
            sponsorship_id,
            donor_name: new.donor_name,
            donor_email: new.donor_email,
            donor_phone: new.donor_phone,
            amount: new.amount,
            payment_method: new.payment_method,
            is_anonymous: new.is_anonymous,
            message: new.message,
            payment_status: PaymentStatus::Pending,
            created_at: now,
        }
    }
}

/// Discriminates success stories; only medical stories name a case type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "storyType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoryKind {
    Medical {
        #[serde(rename = "caseType")]
        case_type: String,
    },
    Inspirational,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMilestone {
    pub title: String,
    pub description: Option<String>,
    pub order_index: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessStory {
    pub id: Uuid,
    pub title: String,
    pub patient_name: String,
    pub content: String,
    #[serde(flatten)]
    pub kind: StoryKind,
    pub is_published: bool,
    /// Owned by the story, presented ascending by `order_index`.
    pub milestones: Vec<StoryMilestone>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStory {
    pub title: String,
    pub patient_name: String,
    pub content: String,
    pub kind: StoryKind,
    pub is_published: bool,
    pub milestones: Vec<StoryMilestone>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub years_of_experience: u8,
    pub cover_letter: Option<String>,
    /// URL of the stored resume.
    pub resume: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJobApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub years_of_experience: u8,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnershipInquiry {
    pub id: Uuid,
    pub organization_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub partnership_type: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPartnershipInquiry {
    pub organization_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub partnership_type: String,
    pub message: String,
}

/// Raw file attached to a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A staff login the auth plugin can verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffAccount {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Proof that a bearer token was authenticated. Staff-only operations take one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSession {
    pub staff_id: Uuid,
    pub email: String,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

/// A freshly issued bearer token and the session it unlocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub session: StaffSession,
}
