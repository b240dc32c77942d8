//! Sermon storage and the filtered, cursor-paginated listing behind the watch page.

use crate::models::{
    CreateSermon, SeriesRef, Sermon, SermonCursor, SermonFilterOptions, SermonFilters,
    SermonPage, SermonWithSeries, UpdateSermon,
};
use crate::services::series::series_exists;
use crate::services::slug::{resolve_slug, validate_slug};
use crate::services::validation::{
    parse_date, require_non_empty, validate_http_url, ValidationError,
};
use crate::Database;
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};

pub const DEFAULT_PAGE_SIZE: usize = 12;

const SELECT_WITH_SERIES: &str = r#"
    SELECT s.id, s.title, s.slug, s.date, s.video_url, s.series_id, s.book, s.pastor,
           s.created_at, se.id, se.title, se.slug, se.thumbnail_url
    FROM sermons s
    LEFT JOIN series se ON se.id = s.series_id
"#;

/// Escapes LIKE wildcards so user text matches literally (used with `ESCAPE '\'`).
fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn build_filter_clause(
    filters: &SermonFilters,
    cursor: Option<&SermonCursor>,
) -> (String, Vec<Value>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        clauses.push(
            "(LOWER(s.title) LIKE LOWER(?) ESCAPE '\\' \
             OR LOWER(s.pastor) LIKE LOWER(?) ESCAPE '\\' \
             OR LOWER(s.book) LIKE LOWER(?) ESCAPE '\\')",
        );
        let pattern = like_pattern(search);
        params.push(Value::Text(pattern.clone()));
        params.push(Value::Text(pattern.clone()));
        params.push(Value::Text(pattern));
    }
    if let Some(series_id) = filters.series_id {
        clauses.push("s.series_id = ?");
        params.push(Value::Integer(series_id));
    }
    if let Some(book) = filters.book.as_deref().filter(|b| !b.is_empty()) {
        clauses.push("s.book = ?");
        params.push(Value::Text(book.to_string()));
    }
    if let Some(pastor) = filters.pastor.as_deref().filter(|p| !p.is_empty()) {
        clauses.push("s.pastor = ?");
        params.push(Value::Text(pastor.to_string()));
    }
    if let Some(year) = filters.year {
        clauses.push("CAST(strftime('%Y', s.date) AS INTEGER) = ?");
        params.push(Value::Integer(year as i64));
    }
    if let Some(cursor) = cursor {
        clauses.push("(s.date < ? OR (s.date = ? AND s.id < ?))");
        params.push(Value::Text(cursor.date.clone()));
        params.push(Value::Text(cursor.date.clone()));
        params.push(Value::Integer(cursor.id));
    }

    let sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (sql, params)
}

/// Returns up to `limit` sermons matching `filters`, newest first, strictly after `cursor`.
///
/// One extra row is fetched to learn whether another page exists; `next_cursor` is
/// `None` exactly when it does not.
pub fn list_sermons(
    db: &Database,
    filters: &SermonFilters,
    cursor: Option<&SermonCursor>,
    limit: usize,
) -> Result<SermonPage> {
    let limit = limit.max(1);
    let (where_clause, mut params) = build_filter_clause(filters, cursor);
    params.push(Value::Integer(limit as i64 + 1));

    let sql = format!(
        "{} {} ORDER BY s.date DESC, s.id DESC LIMIT ?",
        SELECT_WITH_SERIES, where_clause
    );

    let conn = db.get()?;
    let mut stmt = conn.prepare(&sql)?;
    let mut sermons = stmt
        .query_map(rusqlite::params_from_iter(params), row_to_sermon_with_series)?
        .collect::<Result<Vec<_>, _>>()?;

    let next_cursor = if sermons.len() > limit {
        sermons.truncate(limit);
        sermons.last().map(|last| SermonCursor {
            date: last.sermon.date.clone(),
            id: last.sermon.id,
        })
    } else {
        None
    };

    Ok(SermonPage {
        sermons,
        next_cursor,
    })
}

pub fn filter_options(db: &Database) -> Result<SermonFilterOptions> {
    let conn = db.get()?;

    let distinct_text = |column: &str| -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {col} FROM sermons WHERE {col} IS NOT NULL AND {col} != '' ORDER BY {col}",
            col = column
        );
        let mut stmt = conn.prepare(&sql)?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values)
    };
    let books = distinct_text("book")?;
    let pastors = distinct_text("pastor")?;

    let mut stmt = conn.prepare(
        "SELECT y FROM (SELECT DISTINCT CAST(strftime('%Y', date) AS INTEGER) AS y FROM sermons) WHERE y IS NOT NULL ORDER BY y DESC",
    )?;
    let years = stmt
        .query_map([], |row| row.get::<_, i32>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt =
        conn.prepare("SELECT id, title, slug, thumbnail_url FROM series ORDER BY title")?;
    let series = stmt
        .query_map([], |row| {
            Ok(SeriesRef {
                id: row.get(0)?,
                title: row.get(1)?,
                slug: row.get(2)?,
                thumbnail_url: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SermonFilterOptions {
        books,
        pastors,
        years,
        series,
    })
}

pub fn get_sermon(db: &Database, id: i64) -> Result<Option<SermonWithSeries>> {
    let conn = db.get()?;
    let sermon = conn
        .query_row(
            &format!("{} WHERE s.id = ?", SELECT_WITH_SERIES),
            [id],
            row_to_sermon_with_series,
        )
        .optional()?;
    Ok(sermon)
}

/// Sermon slugs are not unique; the newest sermon with the slug wins.
pub fn get_sermon_by_slug(db: &Database, slug: &str) -> Result<Option<SermonWithSeries>> {
    let conn = db.get()?;
    let sermon = conn
        .query_row(
            &format!(
                "{} WHERE s.slug = ? ORDER BY s.date DESC, s.id DESC LIMIT 1",
                SELECT_WITH_SERIES
            ),
            [slug],
            row_to_sermon_with_series,
        )
        .optional()?;
    Ok(sermon)
}

pub fn latest_sermon(db: &Database) -> Result<Option<SermonWithSeries>> {
    let page = list_sermons(db, &SermonFilters::default(), None, 1)?;
    Ok(page.sermons.into_iter().next())
}

/// Sermons of one series, oldest first, for the series page.
pub fn list_sermons_in_series(db: &Database, series_id: i64) -> Result<Vec<Sermon>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, title, slug, date, video_url, series_id, book, pastor, created_at FROM sermons WHERE series_id = ? ORDER BY date ASC, id ASC",
    )?;
    let sermons = stmt
        .query_map([series_id], row_to_sermon)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sermons)
}

struct ValidSermon {
    title: String,
    slug: String,
    date: String,
    video_url: String,
    series_id: Option<i64>,
    book: Option<String>,
    pastor: Option<String>,
}

fn clean_tag(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

fn validate_sermon(conn: &Connection, input: ValidSermon) -> Result<ValidSermon> {
    require_non_empty(&input.title, "Title")?;
    if !validate_slug(&input.slug) {
        return Err(ValidationError::new(
            "Slug must be 1-200 characters: lowercase letters, numbers and hyphens.",
        )
        .into());
    }
    let date = parse_date(&input.date)?;
    require_non_empty(&input.video_url, "Video URL")?;
    validate_http_url(&input.video_url, "Video URL")?;
    if let Some(series_id) = input.series_id {
        if !series_exists(conn, series_id)? {
            return Err(ValidationError::new("Selected series does not exist.").into());
        }
    }
    Ok(ValidSermon {
        title: input.title.trim().to_string(),
        date: date.format("%Y-%m-%d").to_string(),
        video_url: input.video_url.trim().to_string(),
        ..input
    })
}

pub fn create_sermon(db: &Database, input: CreateSermon) -> Result<i64> {
    let conn = db.get()?;
    let sermon = validate_sermon(
        &conn,
        ValidSermon {
            slug: resolve_slug(input.slug.as_deref(), input.title.trim()),
            title: input.title,
            date: input.date,
            video_url: input.video_url,
            series_id: input.series_id,
            book: clean_tag(input.book.as_deref()),
            pastor: clean_tag(input.pastor.as_deref()),
        },
    )?;

    conn.execute(
        "INSERT INTO sermons (title, slug, date, video_url, series_id, book, pastor) VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            &sermon.title,
            &sermon.slug,
            &sermon.date,
            &sermon.video_url,
            sermon.series_id,
            &sermon.book,
            &sermon.pastor,
        ),
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(sermon_id = id, slug = %sermon.slug, "Sermon created");
    Ok(id)
}

pub fn update_sermon(db: &Database, id: i64, input: UpdateSermon) -> Result<()> {
    let current = get_sermon(db, id)?
        .ok_or_else(|| ValidationError::new("Sermon not found."))?
        .sermon;

    let conn = db.get()?;
    let sermon = validate_sermon(
        &conn,
        ValidSermon {
            title: input.title.unwrap_or(current.title),
            slug: clean_tag(input.slug.as_deref()).unwrap_or(current.slug),
            date: input.date.unwrap_or(current.date),
            video_url: input.video_url.unwrap_or(current.video_url),
            series_id: input.series_id.unwrap_or(current.series_id),
            book: match input.book {
                Some(b) => clean_tag(b.as_deref()),
                None => current.book,
            },
            pastor: match input.pastor {
                Some(p) => clean_tag(p.as_deref()),
                None => current.pastor,
            },
        },
    )?;

    conn.execute(
        "UPDATE sermons SET title = ?, slug = ?, date = ?, video_url = ?, series_id = ?, book = ?, pastor = ? WHERE id = ?",
        (
            &sermon.title,
            &sermon.slug,
            &sermon.date,
            &sermon.video_url,
            sermon.series_id,
            &sermon.book,
            &sermon.pastor,
            id,
        ),
    )?;
    Ok(())
}

pub fn delete_sermon(db: &Database, id: i64) -> Result<()> {
    let conn = db.get()?;
    conn.execute("DELETE FROM sermons WHERE id = ?", [id])?;
    Ok(())
}

pub fn count_sermons(db: &Database) -> Result<i64> {
    let conn = db.get()?;
    let count = conn.query_row("SELECT COUNT(*) FROM sermons", [], |row| row.get(0))?;
    Ok(count)
}

fn row_to_sermon(row: &rusqlite::Row) -> rusqlite::Result<Sermon> {
    Ok(Sermon {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        date: row.get(3)?,
        video_url: row.get(4)?,
        series_id: row.get(5)?,
        book: row.get(6)?,
        pastor: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn row_to_sermon_with_series(row: &rusqlite::Row) -> rusqlite::Result<SermonWithSeries> {
    let sermon = row_to_sermon(row)?;
    let series = match row.get::<_, Option<i64>>(9)? {
        Some(id) => Some(SeriesRef {
            id,
            title: row.get(10)?,
            slug: row.get(11)?,
            thumbnail_url: row.get(12)?,
        }),
        None => None,
    };
    Ok(SermonWithSeries { sermon, series })
}
