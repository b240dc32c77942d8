//! Lead-capture form pipeline: screen, validate, record in the CRM, notify staff.

use crate::config::SpamConfig;
use crate::models::{FormKind, FormResponse, FormSubmission};
use crate::services::crm::{upsert_contact, ContactDetails, ContactDirectory, CrmStatus};
use crate::services::email::{Mailer, Notification};
use crate::services::spam::{self, SpamVerdict};
use crate::services::validation::{parse_date, validate_email, ValidationError};
use std::sync::Arc;
use tera::Context;

pub const SEND_FAILED_MESSAGE: &str =
    "We couldn't send your message right now. Please try again in a few minutes.";

const MAX_MESSAGE_LENGTH: usize = 5000;

pub struct FormPipeline {
    directory: Option<Arc<dyn ContactDirectory>>,
    mailer: Arc<Mailer>,
    spam: SpamConfig,
    site_title: String,
}

impl FormPipeline {
    pub fn new(
        directory: Option<Arc<dyn ContactDirectory>>,
        mailer: Arc<Mailer>,
        spam: SpamConfig,
        site_title: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            mailer,
            spam,
            site_title: site_title.into(),
        }
    }

    pub async fn submit(&self, kind: FormKind, submission: FormSubmission) -> FormResponse {
        self.submit_at(kind, submission, chrono::Utc::now().timestamp_millis())
            .await
    }

    /// Runs the pipeline as of `now_ms` (milliseconds since the Unix epoch).
    pub async fn submit_at(
        &self,
        kind: FormKind,
        submission: FormSubmission,
        now_ms: i64,
    ) -> FormResponse {
        match spam::check_submission(&self.spam, &submission, now_ms) {
            SpamVerdict::Pass => {}
            SpamVerdict::Silent(reason) => {
                tracing::warn!(form = %kind, "Dropping suspected bot submission: {}", reason);
                return FormResponse::ok();
            }
            SpamVerdict::Reject(message) => {
                tracing::info!(form = %kind, "Rejected submission: {}", message);
                return FormResponse::rejected(message);
            }
        }

        if let Err(e) = validate_submission(kind, &submission) {
            return FormResponse::rejected(e.0);
        }

        let contact = ContactDetails {
            first_name: submission.first_name.trim().to_string(),
            last_name: submission.last_name.trim().to_string(),
            email: submission.email.trim().to_string(),
            phone: submission.phone().and_then(spam::normalize_phone),
        };

        let crm_status = match &self.directory {
            Some(directory) => upsert_contact(directory.as_ref(), &contact).await,
            None => CrmStatus::Skipped,
        };

        let notification = self.notification(kind, &submission, &contact, &crm_status);
        match self.mailer.send(&notification).await {
            Ok(_) => FormResponse::ok(),
            Err(e) => {
                tracing::error!(form = %kind, "Failed to send form notification: {}", e);
                FormResponse::rejected(SEND_FAILED_MESSAGE)
            }
        }
    }

    fn notification(
        &self,
        kind: FormKind,
        submission: &FormSubmission,
        contact: &ContactDetails,
        crm_status: &CrmStatus,
    ) -> Notification {
        let mut ctx = Context::new();
        ctx.insert("kind_label", kind.label());
        ctx.insert("first_name", &contact.first_name);
        ctx.insert("last_name", &contact.last_name);
        ctx.insert("email", &contact.email);
        ctx.insert("phone", &contact.phone.as_deref().map(format_phone));
        ctx.insert("message", &submission.message());
        ctx.insert("extras", &submission.extra_fields());
        ctx.insert("crm_status", &crm_status.to_string());
        ctx.insert("crm_failed", &crm_status.is_failed());
        ctx.insert(
            "submitted_at",
            &chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
        );
        ctx.insert("site_title", &self.site_title);

        Notification {
            message_type: kind.as_str(),
            subject: format!(
                "{}: {} {}",
                kind.label(),
                contact.first_name,
                contact.last_name
            ),
            template: "form_submission",
            context: ctx,
            reply_to: Some(contact.email.clone()),
        }
    }
}

fn validate_submission(kind: FormKind, submission: &FormSubmission) -> Result<(), ValidationError> {
    validate_email(&submission.email)?;
    if let Some(message) = submission.message() {
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ValidationError::new(format!(
                "Message must be {} characters or less.",
                MAX_MESSAGE_LENGTH
            )));
        }
    }
    match kind {
        FormKind::Contact => {
            if submission.message().is_none() {
                return Err(ValidationError::new("Please include a message."));
            }
        }
        FormKind::PlanAVisit => {
            let date = submission
                .visit_date
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .ok_or_else(|| ValidationError::new("Please choose the date of your visit."))?;
            parse_date(date)?;
        }
        FormKind::GetInvolved => {}
    }
    Ok(())
}

/// `5551234567` → `(555) 123-4567`.
pub fn format_phone(digits: &str) -> String {
    if digits.len() != 10 {
        return digits.to_string();
    }
    format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
}
