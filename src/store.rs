use crate::errors::AppError;
use crate::models::{Lead, LeadPatch, NewLead};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Persistence boundary for leads.
///
/// Accepts the strongly-typed creation record and tri-state patch directly;
/// the presence/null distinction is carried through to SQL instead of being
/// flattened into a loosely-typed map.
pub struct LeadStore {
    pool: PgPool,
}

impl LeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a normalized lead and return the generated identifier.
    /// The single creation path in the system.
    pub async fn insert(&self, lead: &NewLead) -> Result<Uuid, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO leads (
                patient_name, phone_number, dob, pain_reason, insurance,
                location, scheduling_prefs, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&lead.patient_name)
        .bind(&lead.phone_number)
        .bind(&lead.dob)
        .bind(&lead.pain_reason)
        .bind(&lead.insurance)
        .bind(&lead.location)
        .bind(&lead.scheduling_prefs)
        .bind(lead.status.as_str())
        .bind(&lead.notes)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Lead created: {}", id);
        Ok(id)
    }

    /// Apply a tri-state patch as a single atomic update and return the full
    /// reconciled row.
    ///
    /// Only keys present in the patch produce SET clauses; a present-null key
    /// clears the column. An empty patch is a read, so `{}` leaves every
    /// field unchanged while still returning the authoritative row.
    pub async fn update(&self, id: Uuid, patch: &LeadPatch) -> Result<Lead, AppError> {
        if patch.is_empty() {
            return self.fetch(id).await;
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE leads SET ");
        {
            let mut assignments = qb.separated(", ");
            if let Some(value) = &patch.patient_name {
                assignments.push("patient_name = ");
                assignments.push_bind_unseparated(value.clone());
            }
            if let Some(value) = &patch.phone_number {
                assignments.push("phone_number = ");
                assignments.push_bind_unseparated(value.clone());
            }
            if let Some(value) = &patch.dob {
                assignments.push("dob = ");
                assignments.push_bind_unseparated(value.clone());
            }
            if let Some(value) = &patch.pain_reason {
                assignments.push("pain_reason = ");
                assignments.push_bind_unseparated(value.clone());
            }
            if let Some(value) = &patch.insurance {
                assignments.push("insurance = ");
                assignments.push_bind_unseparated(value.clone());
            }
            if let Some(value) = &patch.location {
                assignments.push("location = ");
                assignments.push_bind_unseparated(value.clone());
            }
            if let Some(value) = &patch.scheduling_prefs {
                assignments.push("scheduling_prefs = ");
                assignments.push_bind_unseparated(value.clone());
            }
            if let Some(value) = patch.status {
                assignments.push("status = ");
                assignments.push_bind_unseparated(value.map(|s| s.as_str().to_string()));
            }
            if let Some(value) = &patch.notes {
                assignments.push("notes = ");
                assignments.push_bind_unseparated(value.clone());
            }
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" RETURNING *");

        let lead = qb
            .build_query_as::<Lead>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead with id {} not found", id)))?;

        tracing::info!("Lead updated: {}", id);
        Ok(lead)
    }

    pub async fn fetch(&self, id: Uuid) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead with id {} not found", id)))
    }

    /// All leads, most recently created first.
    pub async fn list(&self) -> Result<Vec<Lead>, AppError> {
        let leads = sqlx::query_as::<_, Lead>("SELECT * FROM leads ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(leads)
    }
}
