use crate::models::Upload;
use crate::services::validation::ValidationError;
use crate::Database;
use anyhow::Result;
use rusqlite::OptionalExtension;
use std::path::Path;
use uuid::Uuid;

const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

const UPLOAD_COLUMNS: &str =
    "id, filename, original_name, mime_type, size_bytes, uploaded_by, created_at";

/// Stores an image for series artwork. The type is sniffed from the bytes, not trusted
/// from the client.
pub fn save_image(
    db: &Database,
    upload_dir: &Path,
    max_bytes: usize,
    original_name: &str,
    data: &[u8],
    uploaded_by: Option<i64>,
) -> Result<Upload> {
    if data.is_empty() {
        return Err(ValidationError::new("The uploaded file is empty.").into());
    }
    if data.len() > max_bytes {
        return Err(ValidationError::new(format!(
            "File too large: {} bytes (max {} bytes).",
            data.len(),
            max_bytes
        ))
        .into());
    }

    let kind = infer::get(data)
        .filter(|k| ALLOWED_MIME_TYPES.contains(&k.mime_type()))
        .ok_or_else(|| ValidationError::new("Only JPEG, PNG, GIF and WebP images are allowed."))?;

    let filename = format!("{}.{}", Uuid::new_v4(), kind.extension());
    std::fs::create_dir_all(upload_dir)?;
    let path = upload_dir.join(&filename);
    std::fs::write(&path, data)?;

    let record = || -> Result<Upload> {
        let conn = db.get()?;
        conn.execute(
            "INSERT INTO uploads (filename, original_name, mime_type, size_bytes, uploaded_by) VALUES (?, ?, ?, ?, ?)",
            (&filename, original_name, kind.mime_type(), data.len() as i64, uploaded_by),
        )?;
        let id = conn.last_insert_rowid();
        let upload = conn.query_row(
            &format!("SELECT {} FROM uploads WHERE id = ?", UPLOAD_COLUMNS),
            [id],
            row_to_upload,
        )?;
        Ok(upload)
    };

    match record() {
        Ok(upload) => {
            tracing::info!(upload_id = upload.id, filename = %filename, "Image uploaded");
            Ok(upload)
        }
        Err(e) => {
            if let Err(rm) = std::fs::remove_file(&path) {
                tracing::warn!("Failed to remove orphaned upload {}: {}", path.display(), rm);
            }
            Err(e)
        }
    }
}

pub fn list_uploads(db: &Database, limit: usize, offset: usize) -> Result<Vec<Upload>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM uploads ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        UPLOAD_COLUMNS
    ))?;
    let uploads = stmt
        .query_map((limit as i64, offset as i64), row_to_upload)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(uploads)
}

pub fn get_upload_by_filename(db: &Database, filename: &str) -> Result<Option<Upload>> {
    let conn = db.get()?;
    let upload = conn
        .query_row(
            &format!("SELECT {} FROM uploads WHERE filename = ?", UPLOAD_COLUMNS),
            [filename],
            row_to_upload,
        )
        .optional()?;
    Ok(upload)
}

pub fn delete_upload(db: &Database, upload_dir: &Path, id: i64) -> Result<()> {
    let conn = db.get()?;
    let filename: Option<String> = conn
        .query_row("SELECT filename FROM uploads WHERE id = ?", [id], |row| row.get(0))
        .optional()?;
    let Some(filename) = filename else {
        return Ok(());
    };

    let file_path = upload_dir.join(&filename);
    if file_path.exists() {
        std::fs::remove_file(file_path)?;
    }
    conn.execute("DELETE FROM uploads WHERE id = ?", [id])?;
    Ok(())
}

fn row_to_upload(row: &rusqlite::Row) -> rusqlite::Result<Upload> {
    Ok(Upload {
        id: row.get(0)?,
        filename: row.get(1)?,
        original_name: row.get(2)?,
        mime_type: row.get(3)?,
        size_bytes: row.get(4)?,
        uploaded_by: row.get(5)?,
        created_at: row.get(6)?,
    })
}
