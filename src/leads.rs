// Lead intake
// Validates quote-request submissions and persists them to the hosted
// store with status "new".

use crate::config::AppConfig;
use crate::supabase::{StoreError, SupabaseRest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Status assigned to every freshly captured lead.
pub const LEAD_STATUS_NEW: &str = "new";

/// An incoming lead submission, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub dumpster_size: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A persisted lead row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    /// Stable identity, generated client-side
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub dumpster_size: Option<String>,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn from_submission(submission: NewLead) -> Self {
        Lead {
            id: uuid::Uuid::new_v4().to_string(),
            name: submission.name,
            email: submission.email,
            phone: submission.phone,
            city: submission.city,
            state: submission.state,
            dumpster_size: submission.dumpster_size,
            message: submission.message,
            status: LEAD_STATUS_NEW.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a submission, collecting every failure rather than stopping
/// at the first one.
pub fn validate_lead(lead: &NewLead) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if lead.name.trim().is_empty() {
        errors.push(ValidationError {
            field: "name".to_string(),
            message: "Required field is empty".to_string(),
        });
    }

    if lead.email.trim().is_empty() {
        errors.push(ValidationError {
            field: "email".to_string(),
            message: "Required field is empty".to_string(),
        });
    } else if !is_plausible_email(&lead.email) {
        errors.push(ValidationError {
            field: "email".to_string(),
            message: format!("Not a valid email address: {}", lead.email),
        });
    }

    if lead.phone.trim().is_empty() {
        errors.push(ValidationError {
            field: "phone".to_string(),
            message: "Required field is empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Shape check only: non-empty local part, and a domain with a dot.
/// Deliverability is the mail provider's problem.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Write access to the hosted `leads` table.
#[derive(Clone)]
pub struct LeadStore {
    rest: SupabaseRest,
}

impl LeadStore {
    pub fn new(config: &AppConfig) -> Result<Self, StoreError> {
        Ok(LeadStore {
            rest: SupabaseRest::new(config)?,
        })
    }

    /// Persist a validated submission and return the created identifier.
    pub async fn insert(&self, submission: NewLead) -> Result<String, StoreError> {
        let lead = Lead::from_submission(submission);
        let lead_id = lead.id.clone();

        let request = self
            .rest
            .post("leads")
            .header("Prefer", "return=representation")
            .json(&lead);

        let created: Vec<Lead> = self.rest.send_rows(request).await?;
        info!(lead_id = %lead_id, "lead captured");

        // The store echoes the inserted row; trust its identifier if present
        Ok(created.into_iter().next().map(|l| l.id).unwrap_or(lead_id))
    }
}
