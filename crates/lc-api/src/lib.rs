//! # lc-api
//!
//! The web routing and orchestration layer for the clinic console.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;

use actix_web::web;

pub use error::ApiError;
pub use handlers::AppState;

use handlers::{auth, public, staff};

/// Configures the JSON API under `/api`.
///
/// # Developer Note
/// Malformed JSON bodies and query strings are reported like any other
/// validation failure (422), not with actix's plain-text 400.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::invalid(format!("malformed request body: {err}")).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::invalid(format!("malformed query: {err}")).into()
    }))
    .service(
        web::scope("/api")
            .service(
                web::scope("/public")
                    .route("/cases", web::post().to(public::submit_case))
                    .route("/appointments", web::post().to(public::book_appointment))
                    .route("/appointments/{id}", web::delete().to(public::cancel_appointment))
                    .route("/sponsorships", web::get().to(public::list_sponsorships))
                    .route("/sponsorships/{id}", web::get().to(public::view_sponsorship))
                    .route("/sponsorships/{id}/donations", web::post().to(public::donate))
                    .route("/stories", web::get().to(public::list_stories))
                    .route("/jobs", web::post().to(public::apply_for_job))
                    .route("/partnerships", web::post().to(public::propose_partnership)),
            )
            .service(
                web::scope("/auth")
                    .route("/login", web::post().to(auth::login))
                    .route("/logout", web::post().to(auth::logout)),
            )
            .service(
                web::scope("/staff")
                    .wrap(actix_web::middleware::from_fn(middleware::require_staff))
                    .route("/cases", web::get().to(staff::list_cases))
                    .route("/cases", web::post().to(staff::create_case))
                    .route("/cases/{id}", web::get().to(staff::get_case))
                    .route("/cases/{id}", web::delete().to(staff::delete_case))
                    .route("/cases/{id}/status", web::patch().to(staff::set_case_status))
                    .route("/cases/{id}/priority", web::patch().to(staff::set_case_priority))
                    .route("/cases/{id}/assignment", web::patch().to(staff::assign_case))
                    .route("/cases/{id}/notes", web::post().to(staff::add_case_note))
                    .route("/cases/{id}/images", web::post().to(staff::add_case_image))
                    .route("/appointments", web::get().to(staff::list_appointments))
                    .route("/appointments", web::post().to(staff::create_appointment))
                    .route("/appointments/{id}", web::delete().to(staff::delete_appointment))
                    .route("/appointments/{id}/status", web::patch().to(staff::set_appointment_status))
                    .route("/sponsorships", web::get().to(staff::list_sponsorships))
                    .route("/sponsorships", web::post().to(staff::create_sponsorship))
                    .route("/sponsorships/{id}", web::get().to(staff::get_sponsorship))
                    .route("/sponsorships/{id}/status", web::patch().to(staff::set_sponsorship_status))
                    .route("/sponsorships/{id}/donations", web::get().to(staff::sponsorship_donations))
                    .route("/donations/{id}/status", web::patch().to(staff::set_donation_status))
                    .route("/stories", web::post().to(staff::create_story)),
            ),
    );
}
