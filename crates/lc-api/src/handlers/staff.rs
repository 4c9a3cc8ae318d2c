//! Staff console routes. Every handler takes the [`Staff`] guard.

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use lc_core::filter::{AppointmentCriteria, CaseCriteria, SponsorshipCriteria};
use lc_core::models::ImageType;
use lc_core::status::{AppointmentStatus, CasePriority, CaseStatus, PaymentStatus, SponsorshipStatus};
use lc_core::validation::{self, AppointmentForm, CaseForm, NoteForm, SponsorshipForm, StoryForm};
use serde::Deserialize;

use super::{parse_id, AppState, StatusChange};
use crate::error::ApiError;
use crate::extract::{MultipartForm, Staff};

#[derive(Debug, Deserialize)]
pub struct PriorityChange {
    #[serde(default)]
    pub priority: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentChange {
    /// Blank or absent clears the assignment.
    #[serde(default)]
    pub assigned_to_id: Option<String>,
}

// ── Cases ───────────────────────────────────────────────────────────────────

pub async fn list_cases(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    criteria: web::Query<CaseCriteria>,
) -> HttpResponse {
    HttpResponse::Ok().json(data.service.list_cases(&staff, &criteria).await)
}

pub async fn create_case(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    form: web::Json<CaseForm>,
) -> Result<HttpResponse, ApiError> {
    let case = data.service.create_case(&staff, &form).await?;
    Ok(HttpResponse::Created().json(case))
}

pub async fn get_case(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "case id")?;
    Ok(HttpResponse::Ok().json(data.service.get_case(&staff, id).await?))
}

pub async fn delete_case(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "case id")?;
    data.service.delete_case(&staff, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn set_case_status(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    path: web::Path<String>,
    body: web::Json<StatusChange>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "case id")?;
    let next = validation::parse_status::<CaseStatus>(&body.status)?;
    Ok(HttpResponse::Ok().json(data.service.set_case_status(&staff, id, next).await?))
}

pub async fn set_case_priority(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    path: web::Path<String>,
    body: web::Json<PriorityChange>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "case id")?;
    let next = validation::parse_status::<CasePriority>(&body.priority)?;
    Ok(HttpResponse::Ok().json(data.service.set_case_priority(&staff, id, next).await?))
}

pub async fn assign_case(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    path: web::Path<String>,
    body: web::Json<AssignmentChange>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "case id")?;
    let assignee = match body.assigned_to_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_id(raw, "assignee id")?),
    };
    Ok(HttpResponse::Ok().json(data.service.assign_case(&staff, id, assignee).await?))
}

pub async fn add_case_note(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    path: web::Path<String>,
    form: web::Json<NoteForm>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "case id")?;
    let note = data.service.add_case_note(&staff, id, &form).await?;
    Ok(HttpResponse::Created().json(note))
}

/// Multipart: an `image` file and an optional `imageType` (default OTHER).
pub async fn add_case_image(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    path: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "case id")?;
    let mut upload = MultipartForm::collect(payload).await?;
    let image_type = match upload.text("imageType").trim() {
        "" => ImageType::Other,
        tag => ImageType::parse(tag)
            .ok_or_else(|| ApiError::invalid(format!("image type '{tag}' is not a recognised option")))?,
    };
    let file = upload.take_file("image");
    let image = data.service.add_case_image(&staff, id, image_type, file).await?;
    Ok(HttpResponse::Created().json(image))
}

// ── Appointments ────────────────────────────────────────────────────────────

pub async fn list_appointments(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    criteria: web::Query<AppointmentCriteria>,
) -> HttpResponse {
    HttpResponse::Ok().json(data.service.list_appointments(&staff, &criteria).await)
}

pub async fn create_appointment(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    form: web::Json<AppointmentForm>,
) -> Result<HttpResponse, ApiError> {
    let appointment = data.service.create_appointment(&staff, &form).await?;
    Ok(HttpResponse::Created().json(appointment))
}

pub async fn set_appointment_status(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    path: web::Path<String>,
    body: web::Json<StatusChange>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "appointment id")?;
    let next = validation::parse_status::<AppointmentStatus>(&body.status)?;
    Ok(HttpResponse::Ok().json(data.service.set_appointment_status(&staff, id, next).await?))
}

pub async fn delete_appointment(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "appointment id")?;
    data.service.cancel_appointment(id).await?;
    log::info!("appointment {id} removed by staff {}", staff.staff_id);
    Ok(HttpResponse::NoContent().finish())
}

// ── Sponsorships ────────────────────────────────────────────────────────────

pub async fn list_sponsorships(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    criteria: web::Query<SponsorshipCriteria>,
) -> HttpResponse {
    HttpResponse::Ok().json(data.service.list_sponsorships(&staff, &criteria).await)
}

/// Multipart: the campaign fields plus a `caseImage` file.
pub async fn create_sponsorship(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut upload = MultipartForm::collect(payload).await?;
    let form: SponsorshipForm = upload.parse()?;
    let image = upload.take_file("caseImage");
    let case = data.service.create_sponsorship(&staff, &form, image).await?;
    Ok(HttpResponse::Created().json(case))
}

pub async fn get_sponsorship(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "sponsorship id")?;
    Ok(HttpResponse::Ok().json(data.service.get_sponsorship(&staff, id).await?))
}

pub async fn set_sponsorship_status(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    path: web::Path<String>,
    body: web::Json<StatusChange>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "sponsorship id")?;
    let next = validation::parse_status::<SponsorshipStatus>(&body.status)?;
    Ok(HttpResponse::Ok().json(data.service.set_sponsorship_status(&staff, id, next).await?))
}

/// Donation ledger with counts and the recomputed funding figures.
pub async fn sponsorship_donations(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "sponsorship id")?;
    Ok(HttpResponse::Ok().json(data.service.donation_report(&staff, id).await?))
}

pub async fn set_donation_status(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    path: web::Path<String>,
    body: web::Json<StatusChange>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "donation id")?;
    let next = validation::parse_status::<PaymentStatus>(&body.status)?;
    Ok(HttpResponse::Ok().json(data.service.set_donation_status(&staff, id, next).await?))
}

// ── Stories ─────────────────────────────────────────────────────────────────

pub async fn create_story(
    data: web::Data<AppState>,
    Staff(staff): Staff,
    form: web::Json<StoryForm>,
) -> Result<HttpResponse, ApiError> {
    let story = data.service.create_story(&staff, &form).await?;
    Ok(HttpResponse::Created().json(story))
}
