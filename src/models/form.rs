use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormKind {
    Contact,
    PlanAVisit,
    GetInvolved,
}

impl FormKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::PlanAVisit => "plan-a-visit",
            Self::GetInvolved => "get-involved",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Contact => "Contact form",
            Self::PlanAVisit => "Plan a visit",
            Self::GetInvolved => "Get involved",
        }
    }
}

impl FromStr for FormKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contact" => Ok(Self::Contact),
            "plan-a-visit" | "visit" => Ok(Self::PlanAVisit),
            "get-involved" => Ok(Self::GetInvolved),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for FormKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lead-capture form as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormSubmission {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub visit_date: Option<String>,
    #[serde(default)]
    pub party_size: Option<String>,
    #[serde(default)]
    pub interests: Option<String>,
    /// Hidden field; humans never fill it in.
    #[serde(default)]
    pub website: Option<String>,
    /// Milliseconds since the Unix epoch when the form was rendered.
    #[serde(default)]
    pub form_rendered_at: Option<String>,
}

impl FormSubmission {
    pub fn phone(&self) -> Option<&str> {
        non_blank(&self.phone)
    }

    pub fn message(&self) -> Option<&str> {
        non_blank(&self.message)
    }

    pub fn honeypot(&self) -> Option<&str> {
        self.website.as_deref().filter(|v| !v.is_empty())
    }

    pub fn rendered_at_ms(&self) -> Option<i64> {
        non_blank(&self.form_rendered_at).and_then(|v| v.parse().ok())
    }

    /// Kind-specific fields worth showing in the notification, in display order.
    pub fn extra_fields(&self) -> Vec<(&'static str, String)> {
        let mut extras = Vec::new();
        if let Some(v) = non_blank(&self.visit_date) {
            extras.push(("Visit date", v.to_string()));
        }
        if let Some(v) = non_blank(&self.party_size) {
            extras.push(("Party size", v.to_string()));
        }
        if let Some(v) = non_blank(&self.interests) {
            extras.push(("Interests", v.to_string()));
        }
        extras
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FormResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}
