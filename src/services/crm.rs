//! Contact directory integration (Planning Center People).

use crate::config::CrmConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrmError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn find_person_by_email(&self, email: &str) -> Result<Option<String>, CrmError>;
    async fn create_person(&self, first_name: &str, last_name: &str) -> Result<String, CrmError>;
    async fn add_email(&self, person_id: &str, email: &str) -> Result<(), CrmError>;
    async fn add_phone(&self, person_id: &str, phone: &str) -> Result<(), CrmError>;
}

/// Result of pushing a contact into the directory, reported in notification emails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrmStatus {
    Created(String),
    Existing(String),
    Failed(String),
    Skipped,
}

impl CrmStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl std::fmt::Display for CrmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created(id) => write!(f, "Created new person (id {})", id),
            Self::Existing(id) => write!(f, "Matched existing person (id {})", id),
            Self::Failed(reason) => write!(f, "FAILED: {} (add this person manually)", reason),
            Self::Skipped => write!(f, "Not configured"),
        }
    }
}

/// Finds the person by email or creates them with their email and phone.
/// Errors are logged and folded into [`CrmStatus::Failed`]; they never abort the caller.
pub async fn upsert_contact(directory: &dyn ContactDirectory, contact: &ContactDetails) -> CrmStatus {
    match try_upsert(directory, contact).await {
        Ok(status) => status,
        Err(e) => {
            tracing::error!(email = %contact.email, "CRM upsert failed: {}", e);
            CrmStatus::Failed(e.to_string())
        }
    }
}

async fn try_upsert(
    directory: &dyn ContactDirectory,
    contact: &ContactDetails,
) -> Result<CrmStatus, CrmError> {
    if let Some(id) = directory.find_person_by_email(&contact.email).await? {
        tracing::info!(person_id = %id, "CRM person already exists");
        return Ok(CrmStatus::Existing(id));
    }

    let id = directory
        .create_person(&contact.first_name, &contact.last_name)
        .await?;
    directory.add_email(&id, &contact.email).await?;
    if let Some(phone) = contact.phone.as_deref() {
        directory.add_phone(&id, phone).await?;
    }
    tracing::info!(person_id = %id, "CRM person created");
    Ok(CrmStatus::Created(id))
}

/// Planning Center People v2 over JSON:API with application-token basic auth.
pub struct PlanningCenterDirectory {
    http: reqwest::Client,
    api_url: String,
    app_id: String,
    secret: String,
}

#[derive(Deserialize)]
struct Resource {
    id: String,
}

#[derive(Deserialize)]
struct One {
    data: Resource,
}

#[derive(Deserialize)]
struct Many {
    data: Vec<Resource>,
}

impl PlanningCenterDirectory {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    /// Returns `None` when no credentials are configured.
    pub fn from_config(config: &CrmConfig) -> anyhow::Result<Option<Self>> {
        let Some((app_id, secret)) = config.credentials() else {
            return Ok(None);
        };
        let http = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("steeple/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Some(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            app_id,
            secret,
        }))
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, CrmError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        Err(CrmError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response, CrmError> {
        let res = self
            .http
            .post(format!("{}{}", self.api_url, path))
            .basic_auth(&self.app_id, Some(&self.secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| CrmError::Transport(e.to_string()))?;
        Self::check(res).await
    }
}

#[async_trait]
impl ContactDirectory for PlanningCenterDirectory {
    async fn find_person_by_email(&self, email: &str) -> Result<Option<String>, CrmError> {
        let res = self
            .http
            .get(format!("{}/people", self.api_url))
            .basic_auth(&self.app_id, Some(&self.secret))
            .query(&[("where[search_name_or_email]", email), ("per_page", "1")])
            .send()
            .await
            .map_err(|e| CrmError::Transport(e.to_string()))?;
        let res = Self::check(res).await?;
        let people: Many = res.json().await.map_err(|e| CrmError::Decode(e.to_string()))?;
        Ok(people.data.into_iter().next().map(|p| p.id))
    }

    async fn create_person(&self, first_name: &str, last_name: &str) -> Result<String, CrmError> {
        let body = json!({
            "data": {
                "type": "Person",
                "attributes": { "first_name": first_name, "last_name": last_name }
            }
        });
        let res = self.post("/people", body).await?;
        let person: One = res.json().await.map_err(|e| CrmError::Decode(e.to_string()))?;
        Ok(person.data.id)
    }

    async fn add_email(&self, person_id: &str, email: &str) -> Result<(), CrmError> {
        let body = json!({
            "data": {
                "type": "Email",
                "attributes": { "address": email, "location": "Home", "primary": true }
            }
        });
        self.post(&format!("/people/{}/emails", person_id), body).await?;
        Ok(())
    }

    async fn add_phone(&self, person_id: &str, phone: &str) -> Result<(), CrmError> {
        let body = json!({
            "data": {
                "type": "PhoneNumber",
                "attributes": { "number": phone, "location": "Mobile", "primary": true }
            }
        });
        self.post(&format!("/people/{}/phone_numbers", person_id), body).await?;
        Ok(())
    }
}
