use sqlx::{postgres::PgPoolOptions, PgPool};

/// Bootstrap DDL for the single `leads` table.
///
/// All attributes other than identity and creation timestamp are nullable;
/// required-at-creation fields are enforced by the intake pipeline, not the
/// schema, so that staff edits keep the original system's semantics.
const LEADS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS leads (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    patient_name TEXT,
    phone_number TEXT,
    dob TEXT,
    pain_reason TEXT,
    insurance TEXT,
    location TEXT,
    scheduling_prefs TEXT,
    status TEXT,
    notes TEXT
)
"#;

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::query(LEADS_SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }
}
