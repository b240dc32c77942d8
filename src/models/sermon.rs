use super::SeriesRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Sermon {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub date: String,
    pub video_url: String,
    pub series_id: Option<i64>,
    pub book: Option<String>,
    pub pastor: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SermonWithSeries {
    #[serde(flatten)]
    pub sermon: Sermon,
    pub series: Option<SeriesRef>,
}

/// Position in the `(date DESC, id DESC)` ordering of sermons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SermonCursor {
    pub date: String,
    pub id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SermonFilters {
    pub search: Option<String>,
    pub series_id: Option<i64>,
    pub book: Option<String>,
    pub pastor: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SermonPage {
    pub sermons: Vec<SermonWithSeries>,
    pub next_cursor: Option<SermonCursor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SermonFilterOptions {
    pub books: Vec<String>,
    pub pastors: Vec<String>,
    pub years: Vec<i32>,
    pub series: Vec<SeriesRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSermon {
    pub title: String,
    pub slug: Option<String>,
    pub date: String,
    pub video_url: String,
    pub series_id: Option<i64>,
    pub book: Option<String>,
    pub pastor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSermon {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub date: Option<String>,
    pub video_url: Option<String>,
    pub series_id: Option<Option<i64>>,
    pub book: Option<Option<String>>,
    pub pastor: Option<Option<String>>,
}
