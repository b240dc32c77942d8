use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sermons: SermonsConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub crm: CrmConfig,
    #[serde(default)]
    pub spam: SpamConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub giving_url: Option<String>,
    #[serde(default)]
    pub livestream_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SermonsConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl Default for SermonsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadsConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_lifetime")]
    pub session_lifetime: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_lifetime: default_session_lifetime(),
        }
    }
}

impl AuthConfig {
    /// Session lifetime in days. Accepts `"7d"`, `"48h"` (rounded up) or a bare number of days.
    pub fn session_days(&self) -> Result<i64> {
        let raw = self.session_lifetime.trim();
        let days = if let Some(d) = raw.strip_suffix('d') {
            d.trim().parse::<i64>()?
        } else if let Some(h) = raw.strip_suffix('h') {
            let hours = h.trim().parse::<i64>()?;
            (hours + 23) / 24
        } else {
            raw.parse::<i64>()?
        };
        if days <= 0 {
            anyhow::bail!("auth.session_lifetime must be positive");
        }
        Ok(days)
    }
}

/// Transactional email settings. The API key falls back to `RESEND_API_KEY`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_email_api_url")]
    pub api_url: String,
    #[serde(default = "default_email_from")]
    pub from: String,
    #[serde(default)]
    pub notify_to: Option<String>,
    #[serde(default)]
    pub notify_to_1: Option<String>,
    #[serde(default)]
    pub notify_to_2: Option<String>,
    #[serde(default)]
    pub notify_to_3: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_email_api_url(),
            from: default_email_from(),
            notify_to: None,
            notify_to_1: None,
            notify_to_2: None,
            notify_to_3: None,
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

impl EmailConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("RESEND_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Planning Center People credentials. Fall back to `PCO_APP_ID` / `PCO_SECRET`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrmConfig {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_crm_api_url")]
    pub api_url: String,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            secret: None,
            api_url: default_crm_api_url(),
        }
    }
}

impl CrmConfig {
    pub fn credentials(&self) -> Option<(String, String)> {
        let app_id = self
            .app_id
            .clone()
            .or_else(|| std::env::var("PCO_APP_ID").ok())
            .filter(|v| !v.trim().is_empty())?;
        let secret = self
            .secret
            .clone()
            .or_else(|| std::env::var("PCO_SECRET").ok())
            .filter(|v| !v.trim().is_empty())?;
        Some((app_id, secret))
    }
}

/// Tunables for the form spam heuristic.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpamConfig {
    #[serde(default = "default_min_submit_ms")]
    pub min_submit_ms: i64,
    #[serde(default = "default_name_min_len")]
    pub name_min_len: usize,
    #[serde(default = "default_name_max_len")]
    pub name_max_len: usize,
    #[serde(default = "default_min_vowel_ratio")]
    pub min_vowel_ratio: f64,
    #[serde(default = "default_vowel_ratio_min_letters")]
    pub vowel_ratio_min_letters: usize,
    #[serde(default = "default_max_consonant_run")]
    pub max_consonant_run: usize,
    #[serde(default = "default_max_case_transition_ratio")]
    pub max_case_transition_ratio: f64,
    #[serde(default = "default_max_upper_run")]
    pub max_upper_run: usize,
    #[serde(default = "default_max_upper_ratio")]
    pub max_upper_ratio: f64,
    #[serde(default = "default_mixed_case_min_count")]
    pub mixed_case_min_count: usize,
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            min_submit_ms: default_min_submit_ms(),
            name_min_len: default_name_min_len(),
            name_max_len: default_name_max_len(),
            min_vowel_ratio: default_min_vowel_ratio(),
            vowel_ratio_min_letters: default_vowel_ratio_min_letters(),
            max_consonant_run: default_max_consonant_run(),
            max_case_transition_ratio: default_max_case_transition_ratio(),
            max_upper_run: default_max_upper_run(),
            max_upper_ratio: default_max_upper_ratio(),
            mixed_case_min_count: default_mixed_case_min_count(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_pool_size() -> u32 {
    10
}

fn default_page_size() -> usize {
    crate::services::sermons::DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> usize {
    50
}

fn default_upload_dir() -> String {
    "./data/uploads".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_session_lifetime() -> String {
    "7d".to_string()
}

fn default_email_api_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_email_from() -> String {
    "Website <noreply@example.org>".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_crm_api_url() -> String {
    "https://api.planningcenteronline.com/people/v2".to_string()
}

fn default_min_submit_ms() -> i64 {
    3000
}

fn default_name_min_len() -> usize {
    2
}

fn default_name_max_len() -> usize {
    50
}

fn default_min_vowel_ratio() -> f64 {
    0.15
}

fn default_vowel_ratio_min_letters() -> usize {
    4
}

fn default_max_consonant_run() -> usize {
    4
}

fn default_max_case_transition_ratio() -> f64 {
    0.4
}

fn default_max_upper_run() -> usize {
    2
}

fn default_max_upper_ratio() -> f64 {
    0.3
}

fn default_mixed_case_min_count() -> usize {
    3
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Could not read config file '{}': {}. Run 'steeple init' to create one.",
                path.display(),
                e
            )
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sermons.page_size == 0 {
            anyhow::bail!("sermons.page_size must be greater than 0");
        }
        if self.sermons.max_page_size < self.sermons.page_size {
            anyhow::bail!("sermons.max_page_size must be at least sermons.page_size");
        }
        if self.database.pool_size == 0 {
            anyhow::bail!("database.pool_size must be greater than 0");
        }
        if self.email.max_retries > 10 {
            anyhow::bail!("email.max_retries must be 10 or less");
        }
        if !(0.0..=1.0).contains(&self.spam.min_vowel_ratio)
            || !(0.0..=1.0).contains(&self.spam.max_case_transition_ratio)
            || !(0.0..=1.0).contains(&self.spam.max_upper_ratio)
        {
            anyhow::bail!("spam ratios must be between 0 and 1");
        }
        if self.spam.name_min_len > self.spam.name_max_len {
            anyhow::bail!("spam.name_min_len must not exceed spam.name_max_len");
        }
        self.auth.session_days()?;
        Ok(())
    }
}
