//! Table layout. Ids are 16-byte UUID blobs; enums are stored as their wire tags.

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cases (
    id                   BLOB PRIMARY KEY,
    full_name            TEXT NOT NULL,
    age                  INTEGER NOT NULL,
    gender               TEXT NOT NULL,
    phone                TEXT NOT NULL,
    email                TEXT,
    address              TEXT NOT NULL,
    amputation_type      TEXT NOT NULL,
    amputation_level     TEXT NOT NULL,
    amputation_date      TEXT NOT NULL,
    current_condition    TEXT NOT NULL,
    previous_prosthetics BOOLEAN NOT NULL DEFAULT 0,
    additional_notes     TEXT,
    status               TEXT NOT NULL,
    priority             TEXT NOT NULL,
    assigned_to_id       BLOB,
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS case_images (
    id         BLOB PRIMARY KEY,
    case_id    BLOB NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
    image_type TEXT NOT NULL,
    url        TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS case_notes (
    id          BLOB PRIMARY KEY,
    case_id     BLOB NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
    note_type   TEXT NOT NULL,
    content     TEXT NOT NULL,
    author_id   BLOB NOT NULL,
    author_name TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS appointments (
    id               BLOB PRIMARY KEY,
    patient_name     TEXT NOT NULL,
    phone            TEXT NOT NULL,
    email            TEXT,
    appointment_type TEXT NOT NULL,
    appointment_date TEXT NOT NULL,
    appointment_time TEXT NOT NULL,
    status           TEXT NOT NULL,
    notes            TEXT,
    case_id          BLOB REFERENCES cases(id) ON DELETE SET NULL,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sponsorships (
    id               BLOB PRIMARY KEY,
    patient_name     TEXT NOT NULL,
    age              INTEGER NOT NULL,
    case_description TEXT NOT NULL,
    case_image       TEXT NOT NULL,
    video_url        TEXT,
    estimated_cost   REAL NOT NULL,
    target_amount    REAL NOT NULL,
    raised_amount    REAL NOT NULL DEFAULT 0,
    status           TEXT NOT NULL,
    start_date       TEXT NOT NULL,
    end_date         TEXT NOT NULL,
    is_featured      BOOLEAN NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS donations (
    id             BLOB PRIMARY KEY,
    sponsorship_id BLOB NOT NULL REFERENCES sponsorships(id) ON DELETE CASCADE,
    donor_name     TEXT NOT NULL,
    donor_email    TEXT NOT NULL,
    donor_phone    TEXT NOT NULL,
    amount         REAL NOT NULL,
    payment_method TEXT NOT NULL,
    is_anonymous   BOOLEAN NOT NULL DEFAULT 0,
    message        TEXT,
    payment_status TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_donations_sponsorship ON donations(sponsorship_id);

CREATE TABLE IF NOT EXISTS stories (
    id           BLOB PRIMARY KEY,
    title        TEXT NOT NULL,
    patient_name TEXT NOT NULL,
    content      TEXT NOT NULL,
    story_type   TEXT NOT NULL,
    case_type    TEXT,
    is_published BOOLEAN NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS story_milestones (
    story_id    BLOB NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    description TEXT,
    order_index INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS job_applications (
    id                  BLOB PRIMARY KEY,
    full_name           TEXT NOT NULL,
    email               TEXT NOT NULL,
    phone               TEXT NOT NULL,
    position            TEXT NOT NULL,
    years_of_experience INTEGER NOT NULL,
    cover_letter        TEXT,
    resume              TEXT NOT NULL,
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS partnership_inquiries (
    id                BLOB PRIMARY KEY,
    organization_name TEXT NOT NULL,
    contact_name      TEXT NOT NULL,
    email             TEXT NOT NULL,
    phone             TEXT NOT NULL,
    partnership_type  TEXT NOT NULL,
    message           TEXT NOT NULL,
    created_at        TEXT NOT NULL
);
"#;

/// Individual statements of [`SCHEMA`], in order.
pub fn statements() -> impl Iterator<Item = &'static str> {
    SCHEMA.split(';').map(str::trim).filter(|stmt| !stmt.is_empty())
}
