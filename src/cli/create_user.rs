use crate::services::{auth, validation::user_message};
use crate::{Config, Database};
use anyhow::{bail, Result};
use std::path::Path;

pub async fn run(config_path: &Path, email: &str, name: &str, password: Option<String>) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path)?;
    db.migrate()?;

    let generated = password.is_none();
    let password = password.unwrap_or_else(auth::generate_password);

    let id = match auth::create_user(&db, email, name, &password) {
        Ok(id) => id,
        Err(e) => match user_message(&e) {
            Some(message) => bail!("{}", message),
            None => return Err(e),
        },
    };

    tracing::info!(user_id = id, "Created admin user");
    println!("Created user {} <{}>", name, email.trim().to_lowercase());
    if generated {
        println!("Password: {}", password);
        println!("Store it somewhere safe; it will not be shown again.");
    }

    Ok(())
}
