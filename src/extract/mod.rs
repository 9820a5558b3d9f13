//! Content extraction: article parsing, image normalization and the
//! extractor that turns every search result into exactly one record

mod article;
mod extractor;
mod images;
mod types;

pub use article::{ArticleParser, HtmlArticleParser};
pub use extractor::{
    ContentExtractor, Extractor, CONTENT_UNAVAILABLE, EXTRACTION_CANCELLED, EXTRACTION_FAILED,
};
pub use images::normalize_image_refs;
pub use types::{ArticleFields, ExtractedContent, ExtractionStatus, SearchResult};
