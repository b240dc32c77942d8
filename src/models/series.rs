use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Series {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub thumbnail_url: Option<String>,
    pub background_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesWithCount {
    #[serde(flatten)]
    pub series: Series,
    pub sermon_count: i64,
}

/// The slice of a series embedded in sermon listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSeries {
    pub title: String,
    pub slug: Option<String>,
    pub thumbnail_url: Option<String>,
    pub background_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSeries {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub thumbnail_url: Option<Option<String>>,
    pub background_url: Option<Option<String>>,
}
