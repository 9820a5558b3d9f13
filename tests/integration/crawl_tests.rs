//! Integration tests for the crawler
//!
//! These tests use wiremock to serve search listings and article pages and
//! run the walker, the extractor and the full coordinator against them.

use std::collections::HashSet;
use std::sync::Arc;
use trawl::config::{load_config, load_keywords, Config};
use trawl::crawler::{Coordinator, PaginationWalker, SelectorListingParser};
use trawl::extract::{
    ContentExtractor, Extractor, HtmlArticleParser, SearchResult, CONTENT_UNAVAILABLE,
    EXTRACTION_FAILED,
};
use trawl::fetch::{FetchChain, ReqwestTransport, Transport};
use trawl::output::{load_statistics, save_run, RunStatistics};
use trawl::state::{StopReason, VisitedUrls};
use trawl::storage::{ResultSink, RunStatus, SqliteSink};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock search server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.search.base_url = base_url.to_string();
    config.search.results_per_keyword = 3;
    config.search.max_pages = 5;
    config.fetch.request_timeout_secs = 5;
    config.fetch.article_timeout_secs = 5;
    config.fetch.retry_times = 0;
    config.fetch.retry_delay_ms = 10;
    // Very short for testing
    config.politeness.start_delay_ms = 10;
    config.politeness.min_delay_ms = 0;
    config.politeness.max_delay_ms = 100;
    config.browser.enabled = false;
    config
}

/// Renders a basic-HTML listing page
fn listing_page(entries: &[(&str, &str, &str)], next: Option<&str>) -> String {
    let mut html = String::from("<html><body>");
    for (link, title, description) in entries {
        html.push_str(&format!(
            r#"<div class="ezO2md"><a href="{}"><span class="CVA68e">{}</span></a><span class="FrIlee"><span>{}</span></span></div>"#,
            link, title, description
        ));
    }
    if let Some(next) = next {
        html.push_str(&format!(r#"<a class="frGj1b" href="{}">Next</a>"#, next));
    }
    html.push_str("</body></html>");
    html
}

fn article_page(title: &str, paragraph: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title>
        <meta property="og:site_name" content="Mock News">
        <meta name="author" content="Jane Roe">
        </head><body>
        <nav><p>Home | About</p></nav>
        <article>
            <h1>{title}</h1>
            <p>{paragraph}</p>
            <img src="/img/photo.jpg" alt="Photo">
            <p>Closing words.</p>
        </article>
        </body></html>"#
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts a listing for `keyword`; page 2 is matched on its `start` parameter
async fn mount_listing(server: &MockServer, keyword: &str, start: Option<&str>, body: String) {
    let mut mock = Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", keyword));
    if let Some(start) = start {
        mock = mock.and(query_param("start", start));
    }
    mock.respond_with(
        ResponseTemplate::new(200)
            .set_body_string(body)
            .insert_header("content-type", "text/html"),
    )
    .mount(server)
    .await;
}

fn transport() -> Arc<dyn Transport> {
    Arc::new(ReqwestTransport::with_default_client().expect("Failed to build HTTP client"))
}

fn walker(config: &Config, whitelist: Vec<String>) -> PaginationWalker {
    let parser = Arc::new(SelectorListingParser::google_basic(
        &config.search.base_url,
        &config.search.language,
        &config.search.region,
    )
    .expect("Failed to build listing parser"));
    PaginationWalker::new(config, transport(), parser, VisitedUrls::new(), whitelist)
}

fn extractor(config: &Config) -> ContentExtractor {
    let chain = FetchChain::new(transport(), None, &config.fetch, &config.browser);
    ContentExtractor::new(chain, Arc::new(HtmlArticleParser::new()))
}

#[tokio::test]
async fn test_walker_filters_and_paginates() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Page 2 first: the page-1 mock would match its URL too
    mount_listing(
        &server,
        "rust",
        Some("10"),
        listing_page(
            &[
                ("https://news.example.com/a1", "Duplicate", "seen on page one"),
                ("/url?q=https://news.example.com/a2&sa=U", "Second", "wrapped"),
                ("https://news.example.com/a3", "Third", "third"),
                ("https://news.example.com/a4", "Fourth", "over quota"),
            ],
            None,
        ),
    )
    .await;
    mount_listing(
        &server,
        "rust",
        None,
        listing_page(
            &[
                ("https://news.example.com/a1", "First", "the  first   one"),
                ("https://blocked.example.org/x", "Blocked", "whitelisted"),
                (&format!("{}/search?q=related", base), "Related", "internal"),
                ("mailto:someone@example.com", "Mail", "not http"),
            ],
            Some("/search?q=rust&start=10"),
        ),
    )
    .await;

    let config = create_test_config(&base);
    let walker = walker(&config, vec!["example.org".to_string()]);

    let report = walker.walk_keyword("rust", None).await;

    assert_eq!(report.stop_reason, StopReason::QuotaReached);
    assert_eq!(report.pages_fetched, 2);
    let links: Vec<_> = report.results.iter().map(|r| r.link.as_str()).collect();
    assert_eq!(
        links,
        vec![
            "https://news.example.com/a1",
            "https://news.example.com/a2",
            "https://news.example.com/a3",
        ]
    );
    assert_eq!(report.results[0].title, "First");
    assert_eq!(report.results[0].description, "the first one");
    assert!(report.results.iter().all(|r| r.keyword == "rust"));
}

#[tokio::test]
async fn test_walker_stops_at_page_ceiling() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "ceiling",
        None,
        listing_page(
            &[("https://news.example.com/c1", "Only", "one per page")],
            Some("/search?q=ceiling&start=10"),
        ),
    )
    .await;

    let mut config = create_test_config(&server.uri());
    config.search.max_pages = 1;
    let walker = walker(&config, Vec::new());

    let report = walker.walk_keyword("ceiling", None).await;

    assert_eq!(report.stop_reason, StopReason::PageCeiling);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.pages_fetched, 1);
}

#[tokio::test]
async fn test_walker_stops_on_empty_listing() {
    let server = MockServer::start().await;
    mount_listing(&server, "nothing", None, listing_page(&[], None)).await;

    let config = create_test_config(&server.uri());
    let report = walker(&config, Vec::new()).walk_keyword("nothing", None).await;

    assert_eq!(report.stop_reason, StopReason::NoMoreResults);
    assert!(report.results.is_empty());
}

#[tokio::test]
async fn test_walker_gives_up_on_failing_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri());
    let report = walker(&config, Vec::new()).walk_keyword("down", None).await;

    assert_eq!(report.stop_reason, StopReason::PageFailed);
    assert_eq!(report.pages_fetched, 0);
}

#[tokio::test]
async fn test_walker_escalates_challenge_without_browser() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "blocked",
        None,
        r#"<html><body><form action="/sorry/index"><input id="captcha"></form></body></html>"#
            .to_string(),
    )
    .await;

    let config = create_test_config(&server.uri());
    let report = walker(&config, Vec::new()).walk_keyword("blocked", None).await;

    assert_eq!(report.stop_reason, StopReason::PageFailed);
    assert!(report.results.is_empty());
}

#[tokio::test]
async fn test_extractor_builds_article_record() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_html(
        &server,
        "/articles/1",
        article_page("Mock Headline", "Body text of the story."),
    )
    .await;

    let config = create_test_config(&base);
    let result = SearchResult {
        keyword: "rust".to_string(),
        title: "Listing title".to_string(),
        link: format!("{}/articles/1", base),
        description: "Listing description".to_string(),
    };

    let record = extractor(&config).extract(&result).await;

    assert!(!record.is_fallback());
    assert_eq!(record.title, "Mock Headline");
    assert_eq!(record.url, result.link);
    assert_eq!(record.keyword, "rust");
    assert_eq!(record.description, "Listing description");
    assert_eq!(record.author, "Jane Roe");
    assert_eq!(record.site, "Mock News");
    assert!(record.content.contains("Body text of the story."));
    assert!(record.content.contains("[IMAGE-1]"));
    assert!(!record.content.contains("Home | About"));
    assert_eq!(record.images, vec![format!("{}/img/photo.jpg", base)]);
}

#[tokio::test]
async fn test_extractor_fallback_when_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri());
    let result = SearchResult {
        keyword: "rust".to_string(),
        title: "Gone".to_string(),
        link: format!("{}/gone", server.uri()),
        description: "Was here".to_string(),
    };

    let record = extractor(&config).extract(&result).await;

    assert!(record.is_fallback());
    assert_eq!(record.content, CONTENT_UNAVAILABLE);
    assert_eq!(record.title, "Gone");
    assert_eq!(record.url, result.link);
    assert_eq!(record.description, "Was here");
    assert!(record.images.is_empty());
    assert!(record.date.is_empty());
}

#[tokio::test]
async fn test_extractor_fallback_when_page_has_no_body() {
    let server = MockServer::start().await;
    mount_html(&server, "/empty", "<html><body></body></html>".to_string()).await;

    let config = create_test_config(&server.uri());
    let result = SearchResult {
        keyword: "rust".to_string(),
        title: "Empty".to_string(),
        link: format!("{}/empty", server.uri()),
        description: String::new(),
    };

    let record = extractor(&config).extract(&result).await;

    assert!(record.is_fallback());
    assert_eq!(record.content, EXTRACTION_FAILED);
}

#[tokio::test]
async fn test_full_run_end_to_end() {
    let server = MockServer::start().await;
    let base = server.uri();

    let shared = format!("{}/articles/shared", base);
    let rust_only = format!("{}/articles/rust", base);
    let tokio_only = format!("{}/articles/tokio", base);
    let missing = format!("{}/articles/missing", base);

    mount_listing(
        &server,
        "rust",
        None,
        listing_page(
            &[
                (&shared, "Shared story", "both keywords"),
                (&rust_only, "Rust story", "rust"),
            ],
            None,
        ),
    )
    .await;
    mount_listing(
        &server,
        "tokio",
        None,
        listing_page(
            &[
                (&shared, "Shared story", "both keywords"),
                (&tokio_only, "Tokio story", "tokio"),
                (&missing, "Missing story", "404"),
            ],
            None,
        ),
    )
    .await;
    mount_html(&server, "/articles/shared", article_page("Shared", "Shared body.")).await;
    mount_html(&server, "/articles/rust", article_page("Rust", "Rust body.")).await;
    mount_html(&server, "/articles/tokio", article_page("Tokio", "Tokio body.")).await;
    Mock::given(method("GET"))
        .and(path("/articles/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let keywords_path = dir.path().join("keywords.txt");
    std::fs::write(&keywords_path, "# test keywords\nrust\n\n  tokio  \n")
        .expect("Failed to write keywords");
    let config_path = dir.path().join("trawl.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[search]
base-url = "{base}"
results-per-keyword = 10
concurrency = 2

[fetch]
retry-times = 0
request-timeout-secs = 5
article-timeout-secs = 5

[politeness]
start-delay-ms = 10
min-delay-ms = 0
max-delay-ms = 100

[browser]
enabled = false
"#
        ),
    )
    .expect("Failed to write config");

    let config = load_config(&config_path).expect("Failed to load config");
    let keywords = load_keywords(&keywords_path);
    assert_eq!(keywords, vec!["rust".to_string(), "tokio".to_string()]);

    let coordinator = Coordinator::from_config(&config, Vec::new()).expect("Failed to build");
    let output = coordinator.run(&keywords).await.expect("Run failed");
    coordinator.shutdown().await;

    assert!(!output.cancelled);
    assert_eq!(output.reports.len(), 2);
    assert_eq!(output.reports[0].keyword, "rust");
    assert_eq!(output.reports[1].keyword, "tokio");
    assert!(output
        .reports
        .iter()
        .all(|r| r.stop_reason == StopReason::NoNextPage));

    // The shared link belongs to whichever keyword saw it first
    let links: Vec<_> = output.results().map(|r| r.link.clone()).collect();
    let unique: HashSet<_> = links.iter().cloned().collect();
    assert_eq!(links.len(), 4);
    assert_eq!(unique.len(), 4);
    assert!(unique.contains(&shared));

    // Exactly one record per result
    assert_eq!(output.extracted.len(), 4);
    let fallbacks: Vec<_> = output.extracted.iter().filter(|r| r.is_fallback()).collect();
    assert_eq!(fallbacks.len(), 1);
    assert_eq!(fallbacks[0].url, missing);

    let mut sink = SqliteSink::new(&dir.path().join("trawl.db")).expect("Failed to open sink");
    let run_id = save_run(&mut sink, "test-hash", &output).expect("Failed to save run");
    assert_eq!(sink.get_run(run_id).unwrap().status, RunStatus::Completed);

    let stored = load_statistics(&sink, run_id).expect("Failed to load statistics");
    let in_memory = RunStatistics::from_run_output(&output);
    assert_eq!(stored.total_results, 4);
    assert_eq!(stored.total_extracted, 4);
    assert_eq!(stored.fallbacks, 1);
    assert_eq!(stored.keywords, in_memory.keywords);
}

#[tokio::test]
async fn test_run_without_extraction() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "rust",
        None,
        listing_page(&[("https://news.example.com/only", "Only", "")], None),
    )
    .await;

    let mut config = create_test_config(&server.uri());
    config.output.extract_content = false;

    let coordinator = Coordinator::from_config(&config, Vec::new()).expect("Failed to build");
    let output = coordinator
        .run(&["rust".to_string()])
        .await
        .expect("Run failed");

    assert_eq!(output.total_results(), 1);
    assert!(output.extracted.is_empty());
}

#[tokio::test]
async fn test_run_rejects_empty_keyword_list() {
    let config = create_test_config("https://search.example.com");
    let coordinator = Coordinator::from_config(&config, Vec::new()).expect("Failed to build");
    assert!(coordinator.run(&[]).await.is_err());
}
