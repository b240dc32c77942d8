use crate::services::crm::{ContactDirectory, PlanningCenterDirectory};
use crate::services::email::{EmailTransport, Mailer, ResendTransport};
use crate::services::forms::FormPipeline;
use crate::web::security::RateLimiter;
use crate::{Config, Database};
use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tera::{Tera, Value};

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub templates: Tera,
    pub forms: FormPipeline,
    pub upload_dir: PathBuf,
    pub login_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wires the production collaborators: Resend for email, Planning Center when
    /// credentials are present.
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let transport: Arc<dyn EmailTransport> = Arc::new(ResendTransport::new(&config.email)?);
        if config.email.resolved_api_key().is_none() {
            tracing::warn!("No email API key configured; form notifications will fail");
        }

        let directory: Option<Arc<dyn ContactDirectory>> =
            match PlanningCenterDirectory::from_config(&config.crm)? {
                Some(d) => Some(Arc::new(d)),
                None => {
                    tracing::warn!("No CRM credentials configured; contacts will not be recorded");
                    None
                }
            };

        Self::with_collaborators(config, db, directory, transport)
    }

    pub fn with_collaborators(
        config: Config,
        db: Database,
        directory: Option<Arc<dyn ContactDirectory>>,
        transport: Arc<dyn EmailTransport>,
    ) -> Result<Self> {
        let mailer = Arc::new(Mailer::new(config.email.clone(), transport)?);
        let forms = FormPipeline::new(
            directory,
            mailer,
            config.spam.clone(),
            config.site.title.clone(),
        );

        let upload_dir = PathBuf::from(&config.uploads.dir);

        Ok(Self {
            templates: build_templates()?,
            forms,
            upload_dir,
            config,
            db,
            login_limiter: Arc::new(RateLimiter::default()),
        })
    }
}

fn build_templates() -> Result<Tera> {
    let mut templates = Tera::default();

    templates.register_filter("format_date", format_date_filter);
    templates.add_raw_templates(vec![
        ("base.html", include_str!("../../templates/base.html")),
        ("public/form_fields.html", include_str!("../../templates/public/form_fields.html")),
        ("public/home.html", include_str!("../../templates/public/home.html")),
        ("public/about.html", include_str!("../../templates/public/about.html")),
        ("public/visit.html", include_str!("../../templates/public/visit.html")),
        ("public/events.html", include_str!("../../templates/public/events.html")),
        ("public/watch.html", include_str!("../../templates/public/watch.html")),
        ("public/sermon.html", include_str!("../../templates/public/sermon.html")),
        ("public/series.html", include_str!("../../templates/public/series.html")),
        ("public/give.html", include_str!("../../templates/public/give.html")),
        ("public/contact.html", include_str!("../../templates/public/contact.html")),
        ("public/get_involved.html", include_str!("../../templates/public/get_involved.html")),
        ("public/404.html", include_str!("../../templates/public/404.html")),
        ("admin/base.html", include_str!("../../templates/admin/base.html")),
        ("admin/login.html", include_str!("../../templates/admin/login.html")),
        ("admin/dashboard.html", include_str!("../../templates/admin/dashboard.html")),
        ("admin/sermons.html", include_str!("../../templates/admin/sermons.html")),
        ("admin/sermon_form.html", include_str!("../../templates/admin/sermon_form.html")),
        ("admin/series.html", include_str!("../../templates/admin/series.html")),
        ("admin/series_form.html", include_str!("../../templates/admin/series_form.html")),
        ("admin/uploads.html", include_str!("../../templates/admin/uploads.html")),
    ])?;

    Ok(templates)
}

/// Formats `YYYY-MM-DD` (or RFC 3339 / SQLite timestamps) with a chrono format string.
fn format_date_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let date_str = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("format_date requires a string"))?;

    let format = args
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("%B %-d, %Y");

    if let Ok(d) = chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return Ok(Value::String(d.format(format).to_string()));
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date_str) {
        return Ok(Value::String(dt.format(format).to_string()));
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S") {
        return Ok(Value::String(dt.format(format).to_string()));
    }

    Ok(Value::String(date_str.to_string()))
}
