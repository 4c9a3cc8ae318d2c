//! # lc-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `lc-core` domain models. One store serves every persistence port.

mod schema;

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use lc_core::models::{
    Appointment, AppointmentType, Case, CaseImage, CaseNote, Gender, ImageType, JobApplication,
    NoteType, PartnershipInquiry, PaymentMethod, SponsorshipCase, SponsorshipDonation, StoryKind,
    StoryMilestone, SuccessStory,
};
use lc_core::status::{AppointmentStatus, CasePriority, CaseStatus, PaymentStatus, SponsorshipStatus, StatusMachine};
use lc_core::traits::{AppointmentStore, CaseStore, IntakeStore, SponsorshipStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

pub use schema::SCHEMA;

pub struct SqliteClinicStore {
    pool: SqlitePool,
}

impl SqliteClinicStore {
    /// Connects and creates any missing tables.
    ///
    /// In-memory databases live as long as their connection, so they get a
    /// single connection that is never recycled.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let in_memory = url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url {url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool = SqlitePoolOptions::new();
        pool = if in_memory {
            pool.max_connections(1).idle_timeout(None).max_lifetime(None)
        } else {
            pool.max_connections(5)
        };
        let pool = pool.connect_with(options).await?;

        for statement in schema::statements() {
            sqlx::query(statement).execute(&pool).await?;
        }
        log::info!("sqlite store ready ({})", if in_memory { "in-memory" } else { url });
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Uuid::from_slice(blob).map_err(|err| anyhow!("corrupt id column: {err}"))
}

fn get_uuid(row: &SqliteRow, column: &str) -> anyhow::Result<Uuid> {
    blob_to_uuid(&row.try_get::<Vec<u8>, _>(column)?)
}

fn get_opt_uuid(row: &SqliteRow, column: &str) -> anyhow::Result<Option<Uuid>> {
    row.try_get::<Option<Vec<u8>>, _>(column)?
        .map(|blob| blob_to_uuid(&blob))
        .transpose()
}

fn get_status<S: StatusMachine>(row: &SqliteRow, column: &str) -> anyhow::Result<S> {
    Ok(row.try_get::<String, _>(column)?.parse::<S>()?)
}

fn get_tag<T>(row: &SqliteRow, column: &str, parse: fn(&str) -> Option<T>) -> anyhow::Result<T> {
    let raw: String = row.try_get(column)?;
    parse(&raw).ok_or_else(|| anyhow!("unexpected {column} value '{raw}'"))
}

fn get_small<T: TryFrom<i64>>(row: &SqliteRow, column: &str) -> anyhow::Result<T> {
    let raw: i64 = row.try_get(column)?;
    T::try_from(raw).map_err(|_| anyhow!("{column} out of range: {raw}"))
}

fn case_from_row(row: &SqliteRow) -> anyhow::Result<Case> {
    Ok(Case {
        id: get_uuid(row, "id")?,
        full_name: row.try_get("full_name")?,
        age: get_small(row, "age")?,
        gender: get_tag(row, "gender", Gender::parse)?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        address: row.try_get("address")?,
        amputation_type: row.try_get("amputation_type")?,
        amputation_level: row.try_get("amputation_level")?,
        amputation_date: row.try_get("amputation_date")?,
        current_condition: row.try_get("current_condition")?,
        previous_prosthetics: row.try_get("previous_prosthetics")?,
        additional_notes: row.try_get("additional_notes")?,
        status: get_status::<CaseStatus>(row, "status")?,
        priority: get_status::<CasePriority>(row, "priority")?,
        assigned_to_id: get_opt_uuid(row, "assigned_to_id")?,
        images: Vec::new(),
        notes: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn image_from_row(row: &SqliteRow) -> anyhow::Result<CaseImage> {
    Ok(CaseImage {
        id: get_uuid(row, "id")?,
        case_id: get_uuid(row, "case_id")?,
        image_type: get_tag(row, "image_type", ImageType::parse)?,
        url: row.try_get("url")?,
        created_at: row.try_get("created_at")?,
    })
}

fn note_from_row(row: &SqliteRow) -> anyhow::Result<CaseNote> {
    Ok(CaseNote {
        id: get_uuid(row, "id")?,
        case_id: get_uuid(row, "case_id")?,
        note_type: get_tag(row, "note_type", NoteType::parse)?,
        content: row.try_get("content")?,
        author_id: get_uuid(row, "author_id")?,
        author_name: row.try_get("author_name")?,
        created_at: row.try_get("created_at")?,
    })
}

fn appointment_from_row(row: &SqliteRow) -> anyhow::Result<Appointment> {
    Ok(Appointment {
        id: get_uuid(row, "id")?,
        patient_name: row.try_get("patient_name")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        appointment_type: AppointmentType::from(row.try_get::<String, _>("appointment_type")?),
        appointment_date: row.try_get("appointment_date")?,
        appointment_time: row.try_get("appointment_time")?,
        status: get_status::<AppointmentStatus>(row, "status")?,
        notes: row.try_get("notes")?,
        case_id: get_opt_uuid(row, "case_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn sponsorship_from_row(row: &SqliteRow) -> anyhow::Result<SponsorshipCase> {
    Ok(SponsorshipCase {
        id: get_uuid(row, "id")?,
        patient_name: row.try_get("patient_name")?,
        age: get_small(row, "age")?,
        case_description: row.try_get("case_description")?,
        case_image: row.try_get("case_image")?,
        video_url: row.try_get("video_url")?,
        estimated_cost: row.try_get("estimated_cost")?,
        target_amount: row.try_get("target_amount")?,
        raised_amount: row.try_get("raised_amount")?,
        status: get_status::<SponsorshipStatus>(row, "status")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        is_featured: row.try_get("is_featured")?,
        created_at: row.try_get("created_at")?,
    })
}

fn donation_from_row(row: &SqliteRow) -> anyhow::Result<SponsorshipDonation> {
    Ok(SponsorshipDonation {
        id: get_uuid(row, "id")?,
        sponsorship_id: get_uuid(row, "sponsorship_id")?,
        donor_name: row.try_get("donor_name")?,
        donor_email: row.try_get("donor_email")?,
        donor_phone: row.try_get("donor_phone")?,
        amount: row.try_get("amount")?,
        payment_method: get_tag(row, "payment_method", PaymentMethod::parse)?,
        is_anonymous: row.try_get("is_anonymous")?,
        message: row.try_get("message")?,
        payment_status: get_status::<PaymentStatus>(row, "payment_status")?,
        created_at: row.try_get("created_at")?,
    })
}

fn story_from_row(row: &SqliteRow) -> anyhow::Result<SuccessStory> {
    let story_type: String = row.try_get("story_type")?;
    let kind = match story_type.as_str() {
        "MEDICAL" => StoryKind::Medical {
            case_type: row.try_get::<Option<String>, _>("case_type")?.unwrap_or_default(),
        },
        "INSPIRATIONAL" => StoryKind::Inspirational,
        other => return Err(anyhow!("unexpected story_type value '{other}'")),
    };
    Ok(SuccessStory {
        id: get_uuid(row, "id")?,
        title: row.try_get("title")?,
        patient_name: row.try_get("patient_name")?,
        content: row.try_get("content")?,
        kind,
        is_published: row.try_get("is_published")?,
        milestones: Vec::new(),
        created_at: row.try_get("created_at")?,
    })
}

impl SqliteClinicStore {
    /// Attaches images and notes to already loaded cases.
    async fn hydrate_cases(&self, mut cases: Vec<Case>) -> anyhow::Result<Vec<Case>> {
        if cases.is_empty() {
            return Ok(cases);
        }
        let mut images: HashMap<Uuid, Vec<CaseImage>> = HashMap::new();
        for row in sqlx::query("SELECT * FROM case_images ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?
        {
            let image = image_from_row(&row)?;
            images.entry(image.case_id).or_default().push(image);
        }
        let mut notes: HashMap<Uuid, Vec<CaseNote>> = HashMap::new();
        for row in sqlx::query("SELECT * FROM case_notes ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?
        {
            let note = note_from_row(&row)?;
            notes.entry(note.case_id).or_default().push(note);
        }
        for case in &mut cases {
            case.images = images.remove(&case.id).unwrap_or_default();
            case.notes = notes.remove(&case.id).unwrap_or_default();
        }
        Ok(cases)
    }

    async fn milestones_of(&self, story_id: Uuid) -> anyhow::Result<Vec<StoryMilestone>> {
        sqlx::query("SELECT * FROM story_milestones WHERE story_id = ? ORDER BY order_index ASC")
            .bind(uuid_to_blob(story_id))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| {
                Ok(StoryMilestone {
                    title: row.try_get("title")?,
                    description: row.try_get("description")?,
                    order_index: row.try_get("order_index")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CaseStore for SqliteClinicStore {
    /// Newest cases first.
    async fn list_cases(&self) -> anyhow::Result<Vec<Case>> {
        let cases = sqlx::query("SELECT * FROM cases ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(case_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;
        self.hydrate_cases(cases).await
    }

    async fn get_case(&self, id: Uuid) -> anyhow::Result<Option<Case>> {
        let row = sqlx::query("SELECT * FROM cases WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut case = case_from_row(&row)?;
        case.images = sqlx::query("SELECT * FROM case_images WHERE case_id = ? ORDER BY created_at ASC, id ASC")
            .bind(uuid_to_blob(id))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(image_from_row)
            .collect::<anyhow::Result<_>>()?;
        case.notes = sqlx::query("SELECT * FROM case_notes WHERE case_id = ? ORDER BY created_at ASC, id ASC")
            .bind(uuid_to_blob(id))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(note_from_row)
            .collect::<anyhow::Result<_>>()?;
        Ok(Some(case))
    }

    async fn create_case(&self, case: Case) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO cases (id, full_name, age, gender, phone, email, address, amputation_type, \
             amputation_level, amputation_date, current_condition, previous_prosthetics, additional_notes, \
             status, priority, assigned_to_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(case.id))
        .bind(case.full_name)
        .bind(i64::from(case.age))
        .bind(case.gender.as_str())
        .bind(case.phone)
        .bind(case.email)
        .bind(case.address)
        .bind(case.amputation_type)
        .bind(case.amputation_level)
        .bind(case.amputation_date)
        .bind(case.current_condition)
        .bind(case.previous_prosthetics)
        .bind(case.additional_notes)
        .bind(case.status.as_str())
        .bind(case.priority.as_str())
        .bind(case.assigned_to_id.map(uuid_to_blob))
        .bind(case.created_at)
        .bind(case.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_case(&self, case: Case) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE cases SET full_name = ?, age = ?, gender = ?, phone = ?, email = ?, address = ?, \
             amputation_type = ?, amputation_level = ?, amputation_date = ?, current_condition = ?, \
             previous_prosthetics = ?, additional_notes = ?, status = ?, priority = ?, assigned_to_id = ?, \
             updated_at = ? WHERE id = ?",
        )
        .bind(case.full_name)
        .bind(i64::from(case.age))
        .bind(case.gender.as_str())
        .bind(case.phone)
        .bind(case.email)
        .bind(case.address)
        .bind(case.amputation_type)
        .bind(case.amputation_level)
        .bind(case.amputation_date)
        .bind(case.current_condition)
        .bind(case.previous_prosthetics)
        .bind(case.additional_notes)
        .bind(case.status.as_str())
        .bind(case.priority.as_str())
        .bind(case.assigned_to_id.map(uuid_to_blob))
        .bind(case.updated_at)
        .bind(uuid_to_blob(case.id))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(anyhow!("case {} vanished during update", case.id));
        }
        Ok(())
    }

    /// Removes the case with its notes and images in one transaction.
    async fn delete_case(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM case_images WHERE case_id = ?")
            .bind(uuid_to_blob(id))
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM case_notes WHERE case_id = ?")
            .bind(uuid_to_blob(id))
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE appointments SET case_id = NULL WHERE case_id = ?")
            .bind(uuid_to_blob(id))
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM cases WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn add_image(&self, image: CaseImage) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO case_images (id, case_id, image_type, url, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(uuid_to_blob(image.id))
            .bind(uuid_to_blob(image.case_id))
            .bind(image.image_type.as_str())
            .bind(image.url)
            .bind(image.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_note(&self, note: CaseNote) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO case_notes (id, case_id, note_type, content, author_id, author_name, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(note.id))
        .bind(uuid_to_blob(note.case_id))
        .bind(note.note_type.as_str())
        .bind(note.content)
        .bind(uuid_to_blob(note.author_id))
        .bind(note.author_name)
        .bind(note.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AppointmentStore for SqliteClinicStore {
    async fn list_appointments(&self) -> anyhow::Result<Vec<Appointment>> {
        sqlx::query("SELECT * FROM appointments ORDER BY appointment_date DESC, appointment_time DESC")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(appointment_from_row)
            .collect()
    }

    async fn get_appointment(&self, id: Uuid) -> anyhow::Result<Option<Appointment>> {
        sqlx::query("SELECT * FROM appointments WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(appointment_from_row)
            .transpose()
    }

    async fn create_appointment(&self, appointment: Appointment) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO appointments (id, patient_name, phone, email, appointment_type, appointment_date, \
             appointment_time, status, notes, case_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(appointment.id))
        .bind(appointment.patient_name)
        .bind(appointment.phone)
        .bind(appointment.email)
        .bind(String::from(appointment.appointment_type))
        .bind(appointment.appointment_date)
        .bind(appointment.appointment_time)
        .bind(appointment.status.as_str())
        .bind(appointment.notes)
        .bind(appointment.case_id.map(uuid_to_blob))
        .bind(appointment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_appointment(&self, appointment: Appointment) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE appointments SET patient_name = ?, phone = ?, email = ?, appointment_type = ?, \
             appointment_date = ?, appointment_time = ?, status = ?, notes = ?, case_id = ? WHERE id = ?",
        )
        .bind(appointment.patient_name)
        .bind(appointment.phone)
        .bind(appointment.email)
        .bind(String::from(appointment.appointment_type))
        .bind(appointment.appointment_date)
        .bind(appointment.appointment_time)
        .bind(appointment.status.as_str())
        .bind(appointment.notes)
        .bind(appointment.case_id.map(uuid_to_blob))
        .bind(uuid_to_blob(appointment.id))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(anyhow!("appointment {} vanished during update", appointment.id));
        }
        Ok(())
    }

    async fn delete_appointment(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SponsorshipStore for SqliteClinicStore {
    async fn list_sponsorships(&self) -> anyhow::Result<Vec<SponsorshipCase>> {
        sqlx::query("SELECT * FROM sponsorships ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(sponsorship_from_row)
            .collect()
    }

    async fn get_sponsorship(&self, id: Uuid) -> anyhow::Result<Option<SponsorshipCase>> {
        sqlx::query("SELECT * FROM sponsorships WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(sponsorship_from_row)
            .transpose()
    }

    async fn create_sponsorship(&self, case: SponsorshipCase) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO sponsorships (id, patient_name, age, case_description, case_image, video_url, \
             estimated_cost, target_amount, raised_amount, status, start_date, end_date, is_featured, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(case.id))
        .bind(case.patient_name)
        .bind(i64::from(case.age))
        .bind(case.case_description)
        .bind(case.case_image)
        .bind(case.video_url)
        .bind(case.estimated_cost)
        .bind(case.target_amount)
        .bind(case.raised_amount)
        .bind(case.status.as_str())
        .bind(case.start_date)
        .bind(case.end_date)
        .bind(case.is_featured)
        .bind(case.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_sponsorship(&self, case: SponsorshipCase) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE sponsorships SET patient_name = ?, age = ?, case_description = ?, case_image = ?, \
             video_url = ?, estimated_cost = ?, target_amount = ?, raised_amount = ?, status = ?, \
             start_date = ?, end_date = ?, is_featured = ? WHERE id = ?",
        )
        .bind(case.patient_name)
        .bind(i64::from(case.age))
        .bind(case.case_description)
        .bind(case.case_image)
        .bind(case.video_url)
        .bind(case.estimated_cost)
        .bind(case.target_amount)
        .bind(case.raised_amount)
        .bind(case.status.as_str())
        .bind(case.start_date)
        .bind(case.end_date)
        .bind(case.is_featured)
        .bind(uuid_to_blob(case.id))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(anyhow!("sponsorship {} vanished during update", case.id));
        }
        Ok(())
    }

    async fn list_donations(&self, sponsorship_id: Uuid) -> anyhow::Result<Vec<SponsorshipDonation>> {
        sqlx::query("SELECT * FROM donations WHERE sponsorship_id = ? ORDER BY created_at ASC, id ASC")
            .bind(uuid_to_blob(sponsorship_id))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(donation_from_row)
            .collect()
    }

    async fn create_donation(&self, donation: SponsorshipDonation) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO donations (id, sponsorship_id, donor_name, donor_email, donor_phone, amount, \
             payment_method, is_anonymous, message, payment_status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(donation.id))
        .bind(uuid_to_blob(donation.sponsorship_id))
        .bind(donation.donor_name)
        .bind(donation.donor_email)
        .bind(donation.donor_phone)
        .bind(donation.amount)
        .bind(donation.payment_method.as_str())
        .bind(donation.is_anonymous)
        .bind(donation.message)
        .bind(donation.payment_status.as_str())
        .bind(donation.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_donation_status(
        &self,
        donation_id: Uuid,
        status: PaymentStatus,
    ) -> anyhow::Result<Option<SponsorshipDonation>> {
        let mut tx = self.pool.begin().await?;

        // 1. Change the payment status
        let result = sqlx::query("UPDATE donations SET payment_status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(uuid_to_blob(donation_id))
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        let donation = sqlx::query("SELECT * FROM donations WHERE id = ?")
            .bind(uuid_to_blob(donation_id))
            .fetch_one(&mut *tx)
            .await?;
        let donation = donation_from_row(&donation)?;

        // 2. Refresh the cached raised amount from completed donations
        sqlx::query(
            "UPDATE sponsorships SET raised_amount = (\
               SELECT COALESCE(SUM(amount), 0) FROM donations \
               WHERE sponsorship_id = ? AND payment_status = ?) \
             WHERE id = ?",
        )
        .bind(uuid_to_blob(donation.sponsorship_id))
        .bind(PaymentStatus::Completed.as_str())
        .bind(uuid_to_blob(donation.sponsorship_id))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(donation))
    }
}

#[async_trait]
impl IntakeStore for SqliteClinicStore {
    /// Story and milestones are written atomically.
    async fn create_success_story(&self, story: SuccessStory) -> anyhow::Result<()> {
        let (story_type, case_type) = match &story.kind {
            StoryKind::Medical { case_type } => ("MEDICAL", Some(case_type.clone())),
            StoryKind::Inspirational => ("INSPIRATIONAL", None),
        };
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO stories (id, title, patient_name, content, story_type, case_type, is_published, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(story.id))
        .bind(story.title)
        .bind(story.patient_name)
        .bind(story.content)
        .bind(story_type)
        .bind(case_type)
        .bind(story.is_published)
        .bind(story.created_at)
        .execute(&mut *tx)
        .await?;

        for milestone in story.milestones {
            sqlx::query("INSERT INTO story_milestones (story_id, title, description, order_index) VALUES (?, ?, ?, ?)")
                .bind(uuid_to_blob(story.id))
                .bind(milestone.title)
                .bind(milestone.description)
                .bind(milestone.order_index)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_success_stories(&self) -> anyhow::Result<Vec<SuccessStory>> {
        let rows = sqlx::query("SELECT * FROM stories ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        let mut stories = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut story = story_from_row(row)?;
            story.milestones = self.milestones_of(story.id).await?;
            stories.push(story);
        }
        Ok(stories)
    }

    async fn create_job_application(&self, application: JobApplication) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO job_applications (id, full_name, email, phone, position, years_of_experience, \
             cover_letter, resume, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(application.id))
        .bind(application.full_name)
        .bind(application.email)
        .bind(application.phone)
        .bind(application.position)
        .bind(i64::from(application.years_of_experience))
        .bind(application.cover_letter)
        .bind(application.resume)
        .bind(application.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_partnership_inquiry(&self, inquiry: PartnershipInquiry) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO partnership_inquiries (id, organization_name, contact_name, email, phone, \
             partnership_type, message, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(inquiry.id))
        .bind(inquiry.organization_name)
        .bind(inquiry.contact_name)
        .bind(inquiry.email)
        .bind(inquiry.phone)
        .bind(inquiry.partnership_type)
        .bind(inquiry.message)
        .bind(inquiry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use lc_core::models::StaffSession;

    async fn store() -> SqliteClinicStore {
        SqliteClinicStore::new("sqlite::memory:").await.expect("in-memory store")
    }

    fn case() -> Case {
        let now = Utc::now();
        Case {
            id: Uuid::now_v7(),
            full_name: "Ahmed Hassan".into(),
            age: 42,
            gender: Gender::Male,
            phone: "0100".into(),
            email: Some("ahmed@example.com".into()),
            address: "Cairo".into(),
            amputation_type: "Transtibial".into(),
            amputation_level: "Below knee".into(),
            amputation_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            current_condition: "Healed".into(),
            previous_prosthetics: true,
            additional_notes: None,
            status: CaseStatus::New,
            priority: CasePriority::High,
            assigned_to_id: None,
            images: Vec::new(),
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn campaign() -> SponsorshipCase {
        SponsorshipCase {
            id: Uuid::now_v7(),
            patient_name: "Sara".into(),
            age: 9,
            case_description: "Upper limb".into(),
            case_image: "/static/uploads/ab/cd/abcd.png".into(),
            video_url: None,
            estimated_cost: 1200.0,
            target_amount: 1000.0,
            raised_amount: 0.0,
            status: SponsorshipStatus::Ongoing,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            is_featured: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_case_round_trip_with_notes_and_images() {
        let repo = store().await;
        let case = case();
        repo.create_case(case.clone()).await.unwrap();

        let author = StaffSession {
            staff_id: Uuid::now_v7(),
            email: "staff@clinic.test".into(),
            name: "Dr. Mona".into(),
            expires_at: Utc::now(),
        };
        repo.add_note(CaseNote {
            id: Uuid::now_v7(),
            case_id: case.id,
            note_type: NoteType::Medical,
            content: "Swelling reduced".into(),
            author_id: author.staff_id,
            author_name: author.name.clone(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
        repo.add_image(CaseImage {
            id: Uuid::now_v7(),
            case_id: case.id,
            image_type: ImageType::Xray,
            url: "/static/uploads/x.png".into(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

        let stored = repo.get_case(case.id).await.unwrap().expect("case stored");
        assert_eq!(stored.full_name, case.full_name);
        assert_eq!(stored.priority, CasePriority::High);
        assert_eq!(stored.amputation_date, case.amputation_date);
        assert_eq!(stored.notes.len(), 1);
        assert_eq!(stored.notes[0].author_name, "Dr. Mona");
        assert_eq!(stored.images[0].image_type, ImageType::Xray);

        let listed = repo.list_cases().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].notes.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_case_cascades() {
        let repo = store().await;
        let case = case();
        repo.create_case(case.clone()).await.unwrap();
        repo.add_image(CaseImage {
            id: Uuid::now_v7(),
            case_id: case.id,
            image_type: ImageType::Other,
            url: "/u/1".into(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

        assert!(repo.delete_case(case.id).await.unwrap());
        assert!(repo.get_case(case.id).await.unwrap().is_none());
        assert!(!repo.delete_case(case.id).await.unwrap());

        let (orphans,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM case_images")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_update_case_status_persists() {
        let repo = store().await;
        let mut case = case();
        repo.create_case(case.clone()).await.unwrap();
        case.status = CaseStatus::UnderReview;
        case.assigned_to_id = Some(Uuid::now_v7());
        repo.update_case(case.clone()).await.unwrap();

        let stored = repo.get_case(case.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CaseStatus::UnderReview);
        assert_eq!(stored.assigned_to_id, case.assigned_to_id);
    }

    #[tokio::test]
    async fn test_appointment_custom_type_and_time_survive() {
        let repo = store().await;
        let appointment = Appointment {
            id: Uuid::now_v7(),
            patient_name: "Karim".into(),
            phone: "0101".into(),
            email: None,
            appointment_type: AppointmentType::Custom("Socket adjustment".into()),
            appointment_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            appointment_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            status: AppointmentStatus::Pending,
            notes: None,
            case_id: None,
            created_at: Utc::now(),
        };
        repo.create_appointment(appointment.clone()).await.unwrap();
        let stored = repo.get_appointment(appointment.id).await.unwrap().unwrap();
        assert_eq!(stored.appointment_type, appointment.appointment_type);
        assert_eq!(stored.scheduled_at(), appointment.scheduled_at());
        assert_eq!(stored.status, AppointmentStatus::Pending);

        assert!(repo.delete_appointment(appointment.id).await.unwrap());
        assert!(repo.list_appointments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_donation_status_update() {
        let repo = store().await;
        let campaign = campaign();
        repo.create_sponsorship(campaign.clone()).await.unwrap();

        let donation = SponsorshipDonation {
            id: Uuid::now_v7(),
            sponsorship_id: campaign.id,
            donor_name: "Hala".into(),
            donor_email: "hala@example.com".into(),
            donor_phone: "0123".into(),
            amount: 300.0,
            payment_method: PaymentMethod::BankTransfer,
            is_anonymous: false,
            message: Some("Get well".into()),
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        };
        repo.create_donation(donation.clone()).await.unwrap();

        let updated = repo
            .update_donation_status(donation.id, PaymentStatus::Completed)
            .await
            .unwrap()
            .expect("donation exists");
        assert_eq!(updated.payment_status, PaymentStatus::Completed);
        assert_eq!(updated.amount, 300.0);
        assert!(repo
            .update_donation_status(Uuid::now_v7(), PaymentStatus::Failed)
            .await
            .unwrap()
            .is_none());

        let donations = repo.list_donations(campaign.id).await.unwrap();
        assert_eq!(donations.len(), 1);
        let refreshed = repo.get_sponsorship(campaign.id).await.unwrap().unwrap();
        assert_eq!(refreshed.raised_amount, 300.0);

        repo.update_donation_status(donation.id, PaymentStatus::Failed).await.unwrap();
        let refreshed = repo.get_sponsorship(campaign.id).await.unwrap().unwrap();
        assert_eq!(refreshed.raised_amount, 0.0);
    }

    #[tokio::test]
    async fn test_story_milestones_come_back_ordered() {
        let repo = store().await;
        let story = SuccessStory {
            id: Uuid::now_v7(),
            title: "Walking again".into(),
            patient_name: "Hany".into(),
            content: "...".into(),
            kind: StoryKind::Medical { case_type: "Transfemoral".into() },
            is_published: true,
            milestones: vec![
                StoryMilestone { title: "Fitting".into(), description: None, order_index: 2 },
                StoryMilestone { title: "Intake".into(), description: Some("First visit".into()), order_index: 1 },
            ],
            created_at: Utc::now(),
        };
        repo.create_success_story(story.clone()).await.unwrap();

        let stories = repo.list_success_stories().await.unwrap();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].kind, story.kind);
        let titles: Vec<_> = stories[0].milestones.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["Intake", "Fitting"]);
    }
}
