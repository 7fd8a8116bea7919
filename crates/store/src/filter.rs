use crate::{Record, RecordCategory, RecordFormat};

/// Default page number when none is requested.
pub const DEFAULT_PAGE: u32 = 1;

/// Default page size when none is requested.
pub const DEFAULT_LIMIT: u32 = 10;

/// Builder for catalog listing queries.
///
/// `q` is a free-text filter matched case-insensitively as a substring of
/// artist, album, category, and format; `artist`/`album` are substring
/// filters on their own field; `format`/`category` match exactly. Results
/// are paginated with `page` (1-based) and `limit`.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Free-text filter across artist, album, category, and format.
    pub q: Option<String>,

    /// Substring filter on the artist name.
    pub artist: Option<String>,

    /// Substring filter on the album title.
    pub album: Option<String>,

    /// Exact format match.
    pub format: Option<RecordFormat>,

    /// Exact category match.
    pub category: Option<RecordCategory>,

    /// 1-based page number.
    pub page: Option<u32>,

    /// Maximum number of records per page.
    pub limit: Option<u32>,
}

impl RecordFilter {
    /// Creates a new empty filter (first page, default limit).
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by free text across artist, album, category, and format.
    pub fn q(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    /// Filters by artist substring.
    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Filters by album substring.
    pub fn album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Filters by exact format.
    pub fn format(mut self, format: RecordFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Filters by exact category.
    pub fn category(mut self, category: RecordCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Selects a 1-based page.
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Limits the number of records per page.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Effective page size.
    pub fn page_size(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Number of records to skip before the requested page starts.
    ///
    /// Saturates rather than overflowing, since page and limit arrive
    /// unchecked from query strings.
    pub fn skip(&self) -> u32 {
        let page = self.page.unwrap_or(DEFAULT_PAGE).max(1);
        (page - 1).saturating_mul(self.page_size())
    }

    /// Whether a record passes every filter criterion (pagination aside).
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(ref q) = self.q {
            let needle = q.to_lowercase();
            let hit = record.artist.to_lowercase().contains(&needle)
                || record.album.to_lowercase().contains(&needle)
                || record.category.as_str().to_lowercase().contains(&needle)
                || record.format.as_str().to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        if let Some(ref artist) = self.artist
            && !record
                .artist
                .to_lowercase()
                .contains(&artist.to_lowercase())
        {
            return false;
        }
        if let Some(ref album) = self.album
            && !record.album.to_lowercase().contains(&album.to_lowercase())
        {
            return false;
        }
        if let Some(format) = self.format
            && record.format != format
        {
            return false;
        }
        if let Some(category) = self.category
            && record.category != category
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use common::{Money, RecordId};

    fn sample_record(artist: &str, album: &str) -> Record {
        Record {
            id: RecordId::new(),
            artist: artist.to_string(),
            album: album.to_string(),
            price: Money::from_cents(2599),
            qty: 10,
            format: RecordFormat::Vinyl,
            category: RecordCategory::Jazz,
            created: Utc::now(),
            last_modified: Utc::now(),
            mbid: None,
            track_list: None,
        }
    }

    #[test]
    fn filter_builder_chain() {
        let filter = RecordFilter::new()
            .q("davis")
            .format(RecordFormat::Vinyl)
            .page(3)
            .limit(20);

        assert_eq!(filter.q.as_deref(), Some("davis"));
        assert_eq!(filter.format, Some(RecordFormat::Vinyl));
        assert_eq!(filter.page_size(), 20);
        assert_eq!(filter.skip(), 40);
    }

    #[test]
    fn defaults_are_first_page_of_ten() {
        let filter = RecordFilter::new();
        assert_eq!(filter.page_size(), 10);
        assert_eq!(filter.skip(), 0);
    }

    #[test]
    fn skip_saturates_instead_of_overflowing() {
        assert_eq!(
            RecordFilter::new().page(u32::MAX).limit(u32::MAX).skip(),
            u32::MAX
        );
        assert_eq!(RecordFilter::new().page(u32::MAX).skip(), u32::MAX);
    }

    #[test]
    fn free_text_matches_any_field_case_insensitively() {
        let record = sample_record("Miles Davis", "Kind of Blue");

        assert!(RecordFilter::new().q("DAVIS").matches(&record));
        assert!(RecordFilter::new().q("kind of").matches(&record));
        assert!(RecordFilter::new().q("jazz").matches(&record));
        assert!(RecordFilter::new().q("vinyl").matches(&record));
        assert!(!RecordFilter::new().q("polka").matches(&record));
    }

    #[test]
    fn field_filters_combine() {
        let record = sample_record("Miles Davis", "Kind of Blue");

        let hit = RecordFilter::new()
            .artist("miles")
            .category(RecordCategory::Jazz);
        assert!(hit.matches(&record));

        let miss = RecordFilter::new()
            .artist("miles")
            .category(RecordCategory::Rock);
        assert!(!miss.matches(&record));
    }

    #[test]
    fn exact_format_filter_rejects_other_formats() {
        let record = sample_record("Miles Davis", "Kind of Blue");

        assert!(RecordFilter::new().format(RecordFormat::Vinyl).matches(&record));
        assert!(!RecordFilter::new().format(RecordFormat::Cd).matches(&record));
    }
}
