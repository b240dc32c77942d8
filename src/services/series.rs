//! Sermon series: named groups of sermons with artwork.

use crate::models::{CreateSeries, Series, SeriesWithCount, UpdateSeries};
use crate::services::slug::{resolve_slug, validate_slug};
use crate::services::validation::{require_non_empty, validate_image_url, ValidationError};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

const SERIES_COLUMNS: &str = "id, title, slug, thumbnail_url, background_url, created_at";

fn clean_optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

fn check_images(thumbnail: Option<&str>, background: Option<&str>) -> Result<()> {
    if let Some(url) = thumbnail {
        validate_image_url(url, "Thumbnail URL")?;
    }
    if let Some(url) = background {
        validate_image_url(url, "Background URL")?;
    }
    Ok(())
}

fn slug_taken(conn: &Connection, slug: &str, except_id: Option<i64>) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM series WHERE slug = ?1 AND id != ?2",
        (slug, except_id.unwrap_or(-1)),
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn create_series(db: &Database, input: CreateSeries) -> Result<i64> {
    require_non_empty(&input.title, "Title")?;
    let title = input.title.trim();
    let slug = resolve_slug(input.slug.as_deref(), title);
    if !validate_slug(&slug) {
        return Err(ValidationError::new(
            "Slug must be 1-200 characters: lowercase letters, numbers and hyphens.",
        )
        .into());
    }

    let thumbnail = clean_optional(input.thumbnail_url.as_deref());
    let background = clean_optional(input.background_url.as_deref());
    check_images(thumbnail.as_deref(), background.as_deref())?;

    let conn = db.get()?;
    if slug_taken(&conn, &slug, None)? {
        return Err(ValidationError::new(format!(
            "A series with the slug '{}' already exists.",
            slug
        ))
        .into());
    }

    conn.execute(
        "INSERT INTO series (title, slug, thumbnail_url, background_url) VALUES (?, ?, ?, ?)",
        (title, &slug, &thumbnail, &background),
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(series_id = id, slug = %slug, "Series created");
    Ok(id)
}

pub fn update_series(db: &Database, id: i64, input: UpdateSeries) -> Result<()> {
    let current =
        get_series(db, id)?.ok_or_else(|| ValidationError::new("Series not found."))?;

    let title = match input.title.as_deref() {
        Some(t) => {
            require_non_empty(t, "Title")?;
            t.trim().to_string()
        }
        None => current.title,
    };
    let slug = clean_optional(input.slug.as_deref()).unwrap_or(current.slug);
    if !validate_slug(&slug) {
        return Err(ValidationError::new(
            "Slug must be 1-200 characters: lowercase letters, numbers and hyphens.",
        )
        .into());
    }
    let thumbnail = match input.thumbnail_url {
        Some(v) => clean_optional(v.as_deref()),
        None => current.thumbnail_url,
    };
    let background = match input.background_url {
        Some(v) => clean_optional(v.as_deref()),
        None => current.background_url,
    };
    check_images(thumbnail.as_deref(), background.as_deref())?;

    let conn = db.get()?;
    if slug_taken(&conn, &slug, Some(id))? {
        return Err(ValidationError::new(format!(
            "A series with the slug '{}' already exists.",
            slug
        ))
        .into());
    }
    conn.execute(
        "UPDATE series SET title = ?, slug = ?, thumbnail_url = ?, background_url = ? WHERE id = ?",
        (&title, &slug, &thumbnail, &background, id),
    )?;
    Ok(())
}

/// Deletes a series, detaching (not deleting) its sermons.
pub fn delete_series(db: &Database, id: i64) -> Result<()> {
    let mut conn = db.get()?;
    let tx = conn.transaction()?;
    let detached = tx.execute("UPDATE sermons SET series_id = NULL WHERE series_id = ?", [id])?;
    let deleted = tx.execute("DELETE FROM series WHERE id = ?", [id])?;
    tx.commit()?;
    if deleted > 0 {
        tracing::info!(series_id = id, detached, "Series deleted");
    }
    Ok(())
}

pub fn get_series(db: &Database, id: i64) -> Result<Option<Series>> {
    let conn = db.get()?;
    let series = conn
        .query_row(
            &format!("SELECT {} FROM series WHERE id = ?", SERIES_COLUMNS),
            [id],
            row_to_series,
        )
        .optional()?;
    Ok(series)
}

pub fn get_series_by_slug(db: &Database, slug: &str) -> Result<Option<Series>> {
    let conn = db.get()?;
    let series = conn
        .query_row(
            &format!("SELECT {} FROM series WHERE slug = ?", SERIES_COLUMNS),
            [slug],
            row_to_series,
        )
        .optional()?;
    Ok(series)
}

pub fn series_exists(conn: &Connection, id: i64) -> Result<bool> {
    let count: i64 =
        conn.query_row("SELECT COUNT(*) FROM series WHERE id = ?", [id], |row| row.get(0))?;
    Ok(count > 0)
}

/// All series, newest first, with how many sermons each holds.
pub fn list_series(db: &Database) -> Result<Vec<SeriesWithCount>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(
        r#"
        SELECT se.id, se.title, se.slug, se.thumbnail_url, se.background_url, se.created_at,
               COUNT(sm.id)
        FROM series se
        LEFT JOIN sermons sm ON sm.series_id = se.id
        GROUP BY se.id
        ORDER BY se.created_at DESC, se.id DESC
        "#,
    )?;
    let list = stmt
        .query_map([], |row| {
            Ok(SeriesWithCount {
                series: row_to_series(row)?,
                sermon_count: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(list)
}

pub fn latest_series(db: &Database) -> Result<Option<Series>> {
    let conn = db.get()?;
    let series = conn
        .query_row(
            &format!(
                "SELECT {} FROM series ORDER BY created_at DESC, id DESC LIMIT 1",
                SERIES_COLUMNS
            ),
            [],
            row_to_series,
        )
        .optional()?;
    Ok(series)
}

pub(crate) fn row_to_series(row: &rusqlite::Row) -> rusqlite::Result<Series> {
    Ok(Series {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        thumbnail_url: row.get(3)?,
        background_url: row.get(4)?,
        created_at: row.get(5)?,
    })
}
