use std::fmt;

/// One search hit, as emitted by the pagination walker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Keyword whose listing produced this hit
    pub keyword: String,
    pub title: String,

    /// Absolute http(s) URL, unique across the run
    pub link: String,
    pub description: String,
}

/// Whether a record holds a genuine extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStatus {
    Extracted,
    Fallback,
}

impl ExtractionStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Extracted => "extracted",
            Self::Fallback => "fallback",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "extracted" => Some(Self::Extracted),
            "fallback" => Some(Self::Fallback),
            _ => None,
        }
    }
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Normalized article record, one per consumed `SearchResult`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: String,
    pub url: String,
    pub description: String,

    /// Body text with image references replaced by `[IMAGE-i]`
    pub content: String,
    pub date: String,
    pub main_image: String,

    /// Absolute image URLs; `[IMAGE-i]` refers to `images[i - 1]`
    pub images: Vec<String>,
    pub author: String,
    pub site: String,
    pub keyword: String,
    pub status: ExtractionStatus,
}

impl ExtractedContent {
    /// Builds a fallback record carrying `message` as its content
    ///
    /// Title, URL, description and keyword come from the search result;
    /// every other field is empty.
    pub fn fallback(result: &SearchResult, message: impl Into<String>) -> Self {
        Self {
            title: result.title.clone(),
            url: result.link.clone(),
            description: result.description.clone(),
            content: message.into(),
            date: String::new(),
            main_image: String::new(),
            images: Vec::new(),
            author: String::new(),
            site: String::new(),
            keyword: result.keyword.clone(),
            status: ExtractionStatus::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.status == ExtractionStatus::Fallback
    }
}

/// Fields an article parser found on a page; absent fields are `None`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub date: Option<String>,
    pub author: Option<String>,
    pub site_name: Option<String>,
    pub main_image: Option<String>,
}

impl ArticleFields {
    /// True if the body holds any non-whitespace text
    pub fn has_body(&self) -> bool {
        self.body.as_deref().is_some_and(|b| !b.trim().is_empty())
    }
}
