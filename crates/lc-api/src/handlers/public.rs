//! Routes open to patients, donors and visitors.

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use lc_core::error::AppError;
use lc_core::validation::{AppointmentForm, CaseForm, DonationForm, JobApplicationForm, PartnershipForm};

use super::{parse_id, AppState};
use crate::error::ApiError;
use crate::extract::MultipartForm;

/// Where public viewers land when a campaign cannot be shown.
pub const SPONSORSHIP_LISTING: &str = "/api/public/sponsorships";

pub async fn submit_case(
    data: web::Data<AppState>,
    form: web::Json<CaseForm>,
) -> Result<HttpResponse, ApiError> {
    let case = data.service.submit_case(&form).await?;
    Ok(HttpResponse::Created().json(case))
}

pub async fn book_appointment(
    data: web::Data<AppState>,
    form: web::Json<AppointmentForm>,
) -> Result<HttpResponse, ApiError> {
    let appointment = data.service.book_appointment(&form).await?;
    Ok(HttpResponse::Created().json(appointment))
}

pub async fn cancel_appointment(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "appointment id")?;
    data.service.cancel_appointment(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Ongoing campaigns only.
pub async fn list_sponsorships(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.service.public_sponsorships().await)
}

/// A campaign that is missing or no longer ongoing redirects to the listing.
pub async fn view_sponsorship(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let Ok(id) = parse_id(&path, "sponsorship id") else {
        return Ok(back_to_listing());
    };
    match data.service.public_sponsorship(id).await {
        Ok(view) => Ok(HttpResponse::Ok().json(view)),
        Err(AppError::NotFound(..)) => Ok(back_to_listing()),
        Err(err) => Err(err.into()),
    }
}

fn back_to_listing() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, SPONSORSHIP_LISTING))
        .finish()
}

pub async fn donate(
    data: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Json<DonationForm>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "sponsorship id")?;
    let donation = data.service.donate(id, &form).await?;
    Ok(HttpResponse::Created().json(donation))
}

pub async fn list_stories(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.service.published_stories().await)
}

/// Multipart: the application fields plus a `resume` file.
pub async fn apply_for_job(
    data: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut upload = MultipartForm::collect(payload).await?;
    let form: JobApplicationForm = upload.parse()?;
    let resume = upload.take_file("resume");
    let application = data.service.submit_job_application(&form, resume).await?;
    Ok(HttpResponse::Created().json(application))
}

pub async fn propose_partnership(
    data: web::Data<AppState>,
    form: web::Json<PartnershipForm>,
) -> Result<HttpResponse, ApiError> {
    let inquiry = data.service.submit_partnership(&form).await?;
    Ok(HttpResponse::Created().json(inquiry))
}
