use anyhow::{bail, Result};
use std::path::PathBuf;

pub async fn run(path: PathBuf, name: Option<String>) -> Result<()> {
    let site_name = name.unwrap_or_else(|| "Our Church".to_string());
    let config_path = path.join("steeple.toml");
    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }

    std::fs::create_dir_all(path.join("data/uploads"))?;

    let config = format!(
        r#"[site]
title = "{}"
description = "Sundays at 10am"
url = "http://localhost:3000"
language = "en"

[server]
host = "127.0.0.1"
port = 3000

[database]
path = "./data/steeple.db"

[sermons]
page_size = 12

[uploads]
dir = "./data/uploads"

[auth]
session_lifetime = "7d"

[email]
# api_key may also come from RESEND_API_KEY
from = "Website <noreply@example.org>"
notify_to = "office@example.org"

[crm]
# app_id and secret may also come from PCO_APP_ID and PCO_SECRET
"#,
        site_name.replace('"', "\\\"")
    );

    std::fs::write(&config_path, config)?;

    tracing::info!("Created new site at {:?}", path);
    tracing::info!("Run 'steeple migrate' to set up the database");
    tracing::info!("Run 'steeple create-user' to add an admin, then 'steeple serve'");

    Ok(())
}
