use slug::slugify;

/// Lowercases the title and collapses every run of non-alphanumerics into one hyphen.
pub fn generate_slug(title: &str) -> String {
    slugify(title)
}

pub fn validate_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > 200 {
        return false;
    }
    slug.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Uses the supplied slug when it is non-blank, otherwise derives one from `title`.
pub fn resolve_slug(explicit: Option<&str>, title: &str) -> String {
    explicit
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| generate_slug(title))
}
