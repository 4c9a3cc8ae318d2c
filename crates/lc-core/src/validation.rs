//! # Validation Gate
//!
//! Raw form submissions go in, typed payloads come out. Every check is pure and
//! synchronous; a rejected form carries every reason found, most relevant first.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AppointmentType, Gender, NewAppointment, NewCase, NewDonation, NewJobApplication,
    NewPartnershipInquiry, NewSponsorship, NewStory, NoteType, PaymentMethod, StoryKind,
    StoryMilestone, Upload, ANONYMOUS_DONOR_EMAIL, ANONYMOUS_DONOR_NAME, ANONYMOUS_DONOR_PHONE,
};
use crate::status::{CasePriority, SponsorshipStatus, StatusMachine};

pub const MAX_CASE_AGE: u16 = 150;
pub const MAX_SPONSORSHIP_AGE: u16 = 120;
pub const MAX_YEARS_OF_EXPERIENCE: u8 = 60;
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];
pub const DOCUMENT_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Human-readable reasons a submission was refused.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn single(reason: impl Into<String>) -> Self {
        ValidationErrors(vec![reason.into()])
    }

    /// The reason surfaced to the actor.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn reasons(&self) -> &[String] {
        &self.0
    }
}

/// Accepts JSON strings, numbers and booleans as text; anything else is blank.
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Whole numbers, also when sent as text; anything else is zero.
fn index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(|n| i32::try_from(n).ok()).unwrap_or_default(),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

/// A missing or null list is empty.
fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts booleans and the usual checkbox spellings.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::String(s)) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "on" | "1" | "yes")
        }
        Some(serde_json::Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    })
}

/// Collects reasons while parsing fields; parsers return `None` on failure.
#[derive(Default)]
struct Checker {
    reasons: Vec<String>,
}

impl Checker {
    fn reject(&mut self, reason: String) {
        self.reasons.push(reason);
    }

    fn required(&mut self, label: &str, value: &str) -> Option<String> {
        let value = value.trim();
        if value.is_empty() {
            self.reject(format!("{label} is required"));
            None
        } else {
            Some(value.to_string())
        }
    }

    fn optional(value: &str) -> Option<String> {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    fn email(&mut self, label: &str, value: Option<String>) -> Option<String> {
        match value {
            Some(email) if !email.contains('@') => {
                self.reject(format!("{label} must be a valid email address"));
                None
            }
            other => other,
        }
    }

    fn bounded_int<T>(&mut self, label: &str, value: &str, min: T, max: T) -> Option<T>
    where
        T: std::str::FromStr + PartialOrd + fmt::Display + Copy,
    {
        let raw = self.required(label, value)?;
        match raw.parse::<T>() {
            Ok(n) if n >= min && n <= max => Some(n),
            _ => {
                self.reject(format!("{label} must be a whole number between {min} and {max}"));
                None
            }
        }
    }

    fn age(&mut self, value: &str, max: u16) -> Option<u16> {
        self.bounded_int("age", value, 1, max)
    }

    fn positive_amount(&mut self, label: &str, value: &str) -> Option<f64> {
        let raw = self.required(label, value)?;
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() && n > 0.0 => Some(n),
            _ => {
                self.reject(format!("{label} must be greater than zero"));
                None
            }
        }
    }

    fn date(&mut self, label: &str, value: &str) -> Option<NaiveDate> {
        let raw = self.required(label, value)?;
        match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.reject(format!("{label} must be a date in YYYY-MM-DD format"));
                None
            }
        }
    }

    fn time(&mut self, label: &str, value: &str) -> Option<NaiveTime> {
        let raw = self.required(label, value)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|_| self.reject(format!("{label} must be a time in HH:MM format")))
            .ok()
    }

    fn tag<T>(&mut self, label: &str, value: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let raw = self.required(label, value)?;
        let parsed = parse(raw.as_str());
        if parsed.is_none() {
            self.reject(format!("{label} '{raw}' is not a recognised option"));
        }
        parsed
    }

    fn status<S: StatusMachine>(&mut self, value: &str) -> Option<S> {
        match value.parse::<S>() {
            Ok(status) => Some(status),
            Err(err) => {
                self.reject(err.to_string());
                None
            }
        }
    }

    fn uuid(&mut self, label: &str, value: &str) -> Option<Uuid> {
        let raw = Self::optional(value)?;
        match Uuid::parse_str(&raw) {
            Ok(id) => Some(id),
            Err(_) => {
                self.reject(format!("{label} is not a valid identifier"));
                None
            }
        }
    }

    fn attachment(&mut self, label: &str, upload: Option<&Upload>, allowed: &[&[&str]]) {
        let Some(upload) = upload else {
            self.reject(format!("{label} file is required"));
            return;
        };
        if upload.data.is_empty() {
            self.reject(format!("{label} file is empty"));
        } else if upload.data.len() > MAX_UPLOAD_BYTES {
            self.reject(format!("{label} file exceeds {} MB", MAX_UPLOAD_BYTES / (1024 * 1024)));
        }
        let content_type = upload.content_type.to_ascii_lowercase();
        if !allowed.iter().any(|set| set.contains(&content_type.as_str())) {
            self.reject(format!("{label} file type '{}' is not accepted", upload.content_type));
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.reasons.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.reasons))
        }
    }
}

/// Parses a status wire tag coming from a staff status selector.
pub fn parse_status<S: StatusMachine>(tag: &str) -> Result<S, ValidationErrors> {
    tag.parse::<S>()
        .map_err(|err| ValidationErrors::single(err.to_string()))
}

/// Checks an image or document attached after creation (case images, ...).
pub fn validate_upload(label: &str, upload: Option<&Upload>, images_only: bool) -> Result<(), ValidationErrors> {
    let mut check = Checker::default();
    if images_only {
        check.attachment(label, upload, &[IMAGE_CONTENT_TYPES]);
    } else {
        check.attachment(label, upload, &[IMAGE_CONTENT_TYPES, DOCUMENT_CONTENT_TYPES]);
    }
    check.finish()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseForm {
    #[serde(deserialize_with = "text")]
    pub full_name: String,
    #[serde(deserialize_with = "text")]
    pub age: String,
    #[serde(deserialize_with = "text")]
    pub gender: String,
    #[serde(deserialize_with = "text")]
    pub phone: String,
    #[serde(deserialize_with = "text")]
    pub email: String,
    #[serde(deserialize_with = "text")]
    pub address: String,
    #[serde(deserialize_with = "text")]
    pub amputation_type: String,
    #[serde(deserialize_with = "text")]
    pub amputation_level: String,
    #[serde(deserialize_with = "text")]
    pub amputation_date: String,
    #[serde(deserialize_with = "text")]
    pub current_condition: String,
    #[serde(deserialize_with = "flag")]
    pub previous_prosthetics: bool,
    #[serde(deserialize_with = "text")]
    pub additional_notes: String,
    /// Blank means MEDIUM.
    #[serde(deserialize_with = "text")]
    pub priority: String,
}

pub fn validate_case(form: &CaseForm) -> Result<NewCase, ValidationErrors> {
    let mut check = Checker::default();
    let full_name = check.required("full name", &form.full_name);
    let age = check.age(&form.age, MAX_CASE_AGE);
    let gender = check.tag("gender", &form.gender, Gender::parse);
    let phone = check.required("phone", &form.phone);
    let email = check.email("email", Checker::optional(&form.email));
    let address = check.required("address", &form.address);
    let amputation_type = check.required("amputation type", &form.amputation_type);
    let amputation_level = check.required("amputation level", &form.amputation_level);
    let amputation_date = check.date("amputation date", &form.amputation_date);
    let current_condition = check.required("current condition", &form.current_condition);
    let priority = match Checker::optional(&form.priority) {
        Some(tag) => check.status::<CasePriority>(&tag),
        None => Some(CasePriority::initial()),
    };
    check.finish()?;

    Ok(NewCase {
        full_name: full_name.unwrap_or_default(),
        age: age.unwrap_or_default(),
        gender: gender.unwrap_or(Gender::Male),
        phone: phone.unwrap_or_default(),
        email,
        address: address.unwrap_or_default(),
        amputation_type: amputation_type.unwrap_or_default(),
        amputation_level: amputation_level.unwrap_or_default(),
        amputation_date: amputation_date.unwrap_or_default(),
        current_condition: current_condition.unwrap_or_default(),
        previous_prosthetics: form.previous_prosthetics,
        additional_notes: Checker::optional(&form.additional_notes),
        priority: priority.unwrap_or_default(),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentForm {
    #[serde(deserialize_with = "text")]
    pub patient_name: String,
    #[serde(deserialize_with = "text")]
    pub phone: String,
    #[serde(deserialize_with = "text")]
    pub email: String,
    #[serde(deserialize_with = "text")]
    pub appointment_type: String,
    #[serde(deserialize_with = "text")]
    pub appointment_date: String,
    #[serde(deserialize_with = "text")]
    pub appointment_time: String,
    #[serde(deserialize_with = "text")]
    pub notes: String,
    #[serde(deserialize_with = "text")]
    pub case_id: String,
}

/// Public bookings must pick one of the fixed appointment types; staff may
/// enter free text.
pub fn validate_appointment(form: &AppointmentForm, allow_free_type: bool) -> Result<NewAppointment, ValidationErrors> {
    let mut check = Checker::default();
    let patient_name = check.required("patient name", &form.patient_name);
    let phone = check.required("phone", &form.phone);
    let email = check.email("email", Checker::optional(&form.email));
    let appointment_type = check.tag("appointment type", &form.appointment_type, |raw| {
        match AppointmentType::from(raw.to_string()) {
            AppointmentType::Custom(_) if !allow_free_type => None,
            parsed => Some(parsed),
        }
    });
    let appointment_date = check.date("appointment date", &form.appointment_date);
    let appointment_time = check.time("appointment time", &form.appointment_time);
    let case_id = check.uuid("case id", &form.case_id);
    check.finish()?;

    Ok(NewAppointment {
        patient_name: patient_name.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
        email,
        appointment_type: appointment_type.unwrap_or(AppointmentType::Consultation),
        appointment_date: appointment_date.unwrap_or_default(),
        appointment_time: appointment_time.unwrap_or_default(),
        notes: Checker::optional(&form.notes),
        case_id,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SponsorshipForm {
    #[serde(deserialize_with = "text")]
    pub patient_name: String,
    #[serde(deserialize_with = "text")]
    pub age: String,
    #[serde(deserialize_with = "text")]
    pub case_description: String,
    #[serde(deserialize_with = "text")]
    pub video_url: String,
    #[serde(deserialize_with = "text")]
    pub estimated_cost: String,
    #[serde(deserialize_with = "text")]
    pub target_amount: String,
    #[serde(deserialize_with = "text")]
    pub start_date: String,
    #[serde(deserialize_with = "text")]
    pub end_date: String,
    /// Blank means ONGOING.
    #[serde(deserialize_with = "text")]
    pub status: String,
    #[serde(deserialize_with = "flag")]
    pub is_featured: bool,
}

pub fn validate_sponsorship(form: &SponsorshipForm, case_image: Option<&Upload>) -> Result<NewSponsorship, ValidationErrors> {
    let mut check = Checker::default();
    let patient_name = check.required("patient name", &form.patient_name);
    let age = check.age(&form.age, MAX_SPONSORSHIP_AGE);
    let case_description = check.required("case description", &form.case_description);
    let estimated_cost = check.positive_amount("estimated cost", &form.estimated_cost);
    let target_amount = check.positive_amount("target amount", &form.target_amount);
    let start_date = check.date("start date", &form.start_date);
    let end_date = check.date("end date", &form.end_date);
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end <= start {
            check.reject("end date must be after start date".to_string());
        }
    }
    let status = match Checker::optional(&form.status) {
        Some(tag) => check.status::<SponsorshipStatus>(&tag),
        None => Some(SponsorshipStatus::initial()),
    };
    check.attachment("case image", case_image, &[IMAGE_CONTENT_TYPES]);
    check.finish()?;

    Ok(NewSponsorship {
        patient_name: patient_name.unwrap_or_default(),
        age: age.unwrap_or_default(),
        case_description: case_description.unwrap_or_default(),
        video_url: Checker::optional(&form.video_url),
        estimated_cost: estimated_cost.unwrap_or_default(),
        target_amount: target_amount.unwrap_or_default(),
        status: status.unwrap_or_default(),
        start_date: start_date.unwrap_or_default(),
        end_date: end_date.unwrap_or_default(),
        is_featured: form.is_featured,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DonationForm {
    #[serde(deserialize_with = "text")]
    pub donor_name: String,
    #[serde(deserialize_with = "text")]
    pub donor_email: String,
    #[serde(deserialize_with = "text")]
    pub donor_phone: String,
    #[serde(deserialize_with = "text")]
    pub amount: String,
    #[serde(deserialize_with = "text")]
    pub payment_method: String,
    #[serde(deserialize_with = "flag")]
    pub is_anonymous: bool,
    #[serde(deserialize_with = "text")]
    pub message: String,
}

/// Anonymous donations waive the donor identity fields and are stored with the
/// sentinel identity instead of whatever was typed.
pub fn validate_donation(form: &DonationForm) -> Result<NewDonation, ValidationErrors> {
    let mut check = Checker::default();
    let (donor_name, donor_email, donor_phone) = if form.is_anonymous {
        (
            Some(ANONYMOUS_DONOR_NAME.to_string()),
            Some(ANONYMOUS_DONOR_EMAIL.to_string()),
            Some(ANONYMOUS_DONOR_PHONE.to_string()),
        )
    } else {
        let name = check.required("donor name", &form.donor_name);
        let email = check.required("donor email", &form.donor_email);
        let email = check.email("donor email", email);
        let phone = check.required("donor phone", &form.donor_phone);
        (name, email, phone)
    };
    let amount = check.positive_amount("amount", &form.amount);
    let payment_method = check.tag("payment method", &form.payment_method, PaymentMethod::parse);
    check.finish()?;

    Ok(NewDonation {
        donor_name: donor_name.unwrap_or_default(),
        donor_email: donor_email.unwrap_or_default(),
        donor_phone: donor_phone.unwrap_or_default(),
        amount: amount.unwrap_or_default(),
        payment_method: payment_method.unwrap_or(PaymentMethod::Cash),
        is_anonymous: form.is_anonymous,
        message: Checker::optional(&form.message),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteForm {
    #[serde(deserialize_with = "text")]
    pub content: String,
    /// Blank means GENERAL.
    #[serde(deserialize_with = "text")]
    pub note_type: String,
}

pub fn validate_note(form: &NoteForm) -> Result<(String, NoteType), ValidationErrors> {
    let mut check = Checker::default();
    let content = check.required("note", &form.content);
    let note_type = match Checker::optional(&form.note_type) {
        Some(tag) => check.tag("note type", &tag, NoteType::parse),
        None => Some(NoteType::General),
    };
    check.finish()?;
    Ok((content.unwrap_or_default(), note_type.unwrap_or(NoteType::General)))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MilestoneForm {
    #[serde(deserialize_with = "text")]
    pub title: String,
    #[serde(deserialize_with = "text")]
    pub description: String,
    #[serde(deserialize_with = "index")]
    pub order_index: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryForm {
    #[serde(deserialize_with = "text")]
    pub title: String,
    #[serde(deserialize_with = "text")]
    pub patient_name: String,
    #[serde(deserialize_with = "text")]
    pub content: String,
    /// MEDICAL or INSPIRATIONAL.
    #[serde(deserialize_with = "text")]
    pub story_type: String,
    /// Only read for medical stories.
    #[serde(deserialize_with = "text")]
    pub case_type: String,
    #[serde(deserialize_with = "flag")]
    pub is_published: bool,
    #[serde(deserialize_with = "list")]
    pub milestones: Vec<MilestoneForm>,
}

pub fn validate_story(form: &StoryForm) -> Result<NewStory, ValidationErrors> {
    let mut check = Checker::default();
    let title = check.required("title", &form.title);
    let patient_name = check.required("patient name", &form.patient_name);
    let content = check.required("content", &form.content);
    let kind = match check.required("story type", &form.story_type).map(|tag| tag.to_ascii_uppercase()) {
        Some(tag) if tag == "MEDICAL" => check
            .required("case type", &form.case_type)
            .map(|case_type| StoryKind::Medical { case_type }),
        Some(tag) if tag == "INSPIRATIONAL" => Some(StoryKind::Inspirational),
        Some(tag) => {
            check.reject(format!("story type '{tag}' is not a recognised option"));
            None
        }
        None => None,
    };
    let mut milestones = Vec::with_capacity(form.milestones.len());
    for (position, milestone) in form.milestones.iter().enumerate() {
        let label = format!("milestone {} title", position + 1);
        if let Some(title) = check.required(&label, &milestone.title) {
            milestones.push(StoryMilestone {
                title,
                description: Checker::optional(&milestone.description),
                order_index: milestone.order_index,
            });
        }
    }
    check.finish()?;

    Ok(NewStory {
        title: title.unwrap_or_default(),
        patient_name: patient_name.unwrap_or_default(),
        content: content.unwrap_or_default(),
        kind: kind.unwrap_or(StoryKind::Inspirational),
        is_published: form.is_published,
        milestones,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobApplicationForm {
    #[serde(deserialize_with = "text")]
    pub full_name: String,
    #[serde(deserialize_with = "text")]
    pub email: String,
    #[serde(deserialize_with = "text")]
    pub phone: String,
    #[serde(deserialize_with = "text")]
    pub position: String,
    #[serde(deserialize_with = "text")]
    pub years_of_experience: String,
    #[serde(deserialize_with = "text")]
    pub cover_letter: String,
}

pub fn validate_job_application(form: &JobApplicationForm, resume: Option<&Upload>) -> Result<NewJobApplication, ValidationErrors> {
    let mut check = Checker::default();
    let full_name = check.required("full name", &form.full_name);
    let email = check.required("email", &form.email);
    let email = check.email("email", email);
    let phone = check.required("phone", &form.phone);
    let position = check.required("position", &form.position);
    let years = check.bounded_int("years of experience", &form.years_of_experience, 0, MAX_YEARS_OF_EXPERIENCE);
    check.attachment("resume", resume, &[DOCUMENT_CONTENT_TYPES]);
    check.finish()?;

    Ok(NewJobApplication {
        full_name: full_name.unwrap_or_default(),
        email: email.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
        position: position.unwrap_or_default(),
        years_of_experience: years.unwrap_or_default(),
        cover_letter: Checker::optional(&form.cover_letter),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartnershipForm {
    #[serde(deserialize_with = "text")]
    pub organization_name: String,
    #[serde(deserialize_with = "text")]
    pub contact_name: String,
    #[serde(deserialize_with = "text")]
    pub email: String,
    #[serde(deserialize_with = "text")]
    pub phone: String,
    #[serde(deserialize_with = "text")]
    pub partnership_type: String,
    #[serde(deserialize_with = "text")]
    pub message: String,
}

pub fn validate_partnership(form: &PartnershipForm) -> Result<NewPartnershipInquiry, ValidationErrors> {
    let mut check = Checker::default();
    let organization_name = check.required("organization name", &form.organization_name);
    let contact_name = check.required("contact name", &form.contact_name);
    let email = check.required("email", &form.email);
    let email = check.email("email", email);
    let phone = check.required("phone", &form.phone);
    let partnership_type = check.required("partnership type", &form.partnership_type);
    let message = check.required("message", &form.message);
    check.finish()?;

    Ok(NewPartnershipInquiry {
        organization_name: organization_name.unwrap_or_default(),
        contact_name: contact_name.unwrap_or_default(),
        email: email.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
        partnership_type: partnership_type.unwrap_or_default(),
        message: message.unwrap_or_default(),
    })
}
