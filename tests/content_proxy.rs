//! End-to-end behavior of `ContentProxy::update_entry` and tag assignment
//! with stub fetchers, taggers and repositories.

use contentproxy::{
    ContentFetcher, ContentProxy, Entry, FetchError, FetchResult, InMemoryFetcher,
    InMemoryTagRepository, ProxyError, ProxyOptions, Result, RuleBasedTagger, Tag, TagRepository,
    Tagger, TaggingRule, User,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

const FETCHING_ERROR_MESSAGE: &str = "this app can't retrieve contents for this article. Please <a href=\"http://example.org/errors_during_fetching.html#how-can-i-help-to-fix-that\">troubleshoot this issue</a>.";

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Fetcher returning the same payload for every URL.
struct StubFetcher {
    payload: FetchResult,
    calls: AtomicUsize,
}

impl StubFetcher {
    fn new(payload: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            payload: serde_json::from_value(payload).unwrap(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ContentFetcher for StubFetcher {
    fn fetch_content(&self, _url: &str) -> std::result::Result<FetchResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }
}

/// Tagger that records calls and optionally fails.
#[derive(Default)]
struct RecordingTagger {
    calls: AtomicUsize,
    fail: bool,
}

impl Tagger for RecordingTagger {
    fn tag(&self, _entry: &Entry) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProxyError::Tagger("tagger exploded".into()));
        }
        Ok(Vec::new())
    }
}

/// Repository that must never be queried.
struct UntouchableRepository;

impl TagRepository for UntouchableRepository {
    fn find_one_by_label(&self, label: &str) -> Result<Option<Tag>> {
        panic!("repository queried for {label}");
    }

    fn save(&self, tag: Tag) -> Result<Tag> {
        panic!("repository asked to save {}", tag.label);
    }
}

fn options() -> ProxyOptions {
    ProxyOptions::builder()
        .fetching_error_message(FETCHING_ERROR_MESSAGE)
        .build()
}

fn build_proxy(fetcher: Arc<dyn ContentFetcher>, tagger: Arc<RecordingTagger>) -> ContentProxy {
    ContentProxy::new(
        fetcher,
        tagger,
        Arc::new(InMemoryTagRepository::new()),
        options(),
    )
}

fn new_entry() -> Entry {
    Entry::new(User::new(1, "admin"))
}

fn empty_payload() -> serde_json::Value {
    json!({
        "html": false,
        "title": "",
        "url": "",
        "content_type": "",
        "language": "",
    })
}

fn full_payload(og_image: serde_json::Value) -> serde_json::Value {
    json!({
        "html": "this is my content".repeat(325),
        "title": "this is my title",
        "url": "http://1.1.1.1",
        "content_type": "text/html",
        "language": "fr",
        "status": "200",
        "open_graph": {
            "og_title": "my OG title",
            "og_description": "OG desc",
            "og_image": og_image,
        },
    })
}

#[test]
fn with_bad_url() {
    init_tracing();
    let tagger = Arc::new(RecordingTagger::default());
    let proxy = build_proxy(StubFetcher::new(empty_payload()), tagger.clone());

    let mut entry = new_entry();
    proxy.update_entry(&mut entry, "http://user@:80", None);

    assert_eq!(tagger.calls.load(Ordering::SeqCst), 1);
    assert_eq!(entry.url, "http://user@:80");
    assert!(entry.title.is_empty());
    assert_eq!(entry.content, FETCHING_ERROR_MESSAGE);
    assert!(entry.preview_picture.is_none());
    assert!(entry.mimetype.is_none());
    assert!(entry.language.is_none());
    assert_eq!(entry.reading_time, 0.0);
    assert_eq!(entry.domain_name, None);
}

#[test]
fn with_empty_content() {
    let tagger = Arc::new(RecordingTagger::default());
    let proxy = build_proxy(StubFetcher::new(empty_payload()), tagger.clone());

    let mut entry = new_entry();
    proxy.update_entry(&mut entry, "http://0.0.0.0", None);

    assert_eq!(tagger.calls.load(Ordering::SeqCst), 1);
    assert_eq!(entry.url, "http://0.0.0.0");
    assert!(entry.title.is_empty());
    assert_eq!(entry.content, FETCHING_ERROR_MESSAGE);
    assert!(entry.preview_picture.is_none());
    assert!(entry.mimetype.is_none());
    assert!(entry.language.is_none());
    assert_eq!(entry.reading_time, 0.0);
    assert_eq!(entry.domain_name.as_deref(), Some("0.0.0.0"));
}

#[test]
fn with_empty_content_but_open_graph() {
    let payload = json!({
        "html": false,
        "title": "",
        "url": "",
        "content_type": "",
        "language": "",
        "status": "",
        "open_graph": {
            "og_title": "my title",
            "og_description": "desc",
        },
    });
    let tagger = Arc::new(RecordingTagger::default());
    let proxy = build_proxy(StubFetcher::new(payload), tagger.clone());

    let mut entry = new_entry();
    proxy.update_entry(&mut entry, "http://domain.io", None);

    assert_eq!(tagger.calls.load(Ordering::SeqCst), 1);
    assert_eq!(entry.url, "http://domain.io");
    assert_eq!(entry.title, "my title");
    assert_eq!(
        entry.content,
        format!("{FETCHING_ERROR_MESSAGE}<p><i>But we found a short description: </i></p>desc")
    );
    assert!(entry.preview_picture.is_none());
    assert!(entry.language.is_none());
    assert!(entry.http_status.is_none());
    assert!(entry.mimetype.is_none());
    assert_eq!(entry.reading_time, 0.0);
    assert_eq!(entry.domain_name.as_deref(), Some("domain.io"));
}

#[test]
fn with_content() {
    let tagger = Arc::new(RecordingTagger::default());
    let proxy = build_proxy(
        StubFetcher::new(full_payload(json!("http://3.3.3.3/cover.jpg"))),
        tagger.clone(),
    );

    let mut entry = new_entry();
    proxy.update_entry(&mut entry, "http://0.0.0.0", None);

    assert_eq!(tagger.calls.load(Ordering::SeqCst), 1);
    assert_eq!(entry.url, "http://1.1.1.1");
    assert_eq!(entry.title, "this is my title");
    assert!(entry.content.contains("this is my content"));
    assert_eq!(entry.preview_picture.as_deref(), Some("http://3.3.3.3/cover.jpg"));
    assert_eq!(entry.mimetype.as_deref(), Some("text/html"));
    assert_eq!(entry.language.as_deref(), Some("fr"));
    assert_eq!(entry.http_status.as_deref(), Some("200"));
    assert_eq!(entry.reading_time, 4.0);
    assert_eq!(entry.domain_name.as_deref(), Some("1.1.1.1"));
}

#[test]
fn with_content_and_no_og_image() {
    let tagger = Arc::new(RecordingTagger::default());
    let proxy = build_proxy(StubFetcher::new(full_payload(json!(false))), tagger.clone());

    let mut entry = new_entry();
    proxy.update_entry(&mut entry, "http://0.0.0.0", None);

    assert_eq!(entry.url, "http://1.1.1.1");
    assert_eq!(entry.title, "this is my title");
    assert!(entry.content.contains("this is my content"));
    assert_eq!(entry.preview_picture, None);
    assert_eq!(entry.mimetype.as_deref(), Some("text/html"));
    assert_eq!(entry.language.as_deref(), Some("fr"));
    assert_eq!(entry.http_status.as_deref(), Some("200"));
    assert_eq!(entry.reading_time, 4.0);
    assert_eq!(entry.domain_name.as_deref(), Some("1.1.1.1"));
}

#[test]
fn with_forced_content() {
    let fetcher = StubFetcher::new(empty_payload());
    let tagger = Arc::new(RecordingTagger::default());
    let proxy = build_proxy(fetcher.clone(), tagger.clone());

    let forced: FetchResult = serde_json::from_value(json!({
        "html": "this is my content".repeat(325),
        "title": "this is my title",
        "url": "http://1.1.1.1",
        "content_type": "text/html",
        "language": "fr",
    }))
    .unwrap();

    let mut entry = new_entry();
    proxy.update_entry(&mut entry, "http://0.0.0.0", Some(forced));

    assert_eq!(fetcher.calls(), 0);
    assert_eq!(tagger.calls.load(Ordering::SeqCst), 1);
    assert_eq!(entry.url, "http://1.1.1.1");
    assert_eq!(entry.title, "this is my title");
    assert!(entry.content.contains("this is my content"));
    assert_eq!(entry.mimetype.as_deref(), Some("text/html"));
    assert_eq!(entry.language.as_deref(), Some("fr"));
    assert_eq!(entry.reading_time, 4.0);
    assert_eq!(entry.domain_name.as_deref(), Some("1.1.1.1"));
}

#[test]
fn tagger_error_does_not_abort_update() {
    init_tracing();
    let tagger = Arc::new(RecordingTagger {
        fail: true,
        ..Default::default()
    });
    let proxy = build_proxy(StubFetcher::new(empty_payload()), tagger.clone());

    let forced: FetchResult = serde_json::from_value(json!({
        "html": "this is my content".repeat(325),
        "title": "this is my title",
        "url": "http://1.1.1.1",
        "content_type": "text/html",
        "language": "fr",
    }))
    .unwrap();

    let mut entry = new_entry();
    let updated = proxy.update_entry(&mut entry, "http://0.0.0.0", Some(forced));

    assert_eq!(tagger.calls.load(Ordering::SeqCst), 1);
    assert!(updated.tags.is_empty());
    assert_eq!(updated.title, "this is my title");
}

#[test]
fn assign_tags_with_array_and_extra_spaces() {
    let proxy = build_proxy(
        StubFetcher::new(empty_payload()),
        Arc::new(RecordingTagger::default()),
    );
    let mut entry = new_entry();

    proxy
        .assign_tags_to_entry(&mut entry, vec!["   tag1", "tag2   "], &[])
        .unwrap();

    assert_eq!(entry.tags.len(), 2);
    assert_eq!(entry.tags[0].label, "tag1");
    assert_eq!(entry.tags[1].label, "tag2");
}

#[test]
fn assign_tags_with_string() {
    let proxy = build_proxy(
        StubFetcher::new(empty_payload()),
        Arc::new(RecordingTagger::default()),
    );
    let mut entry = new_entry();

    proxy.assign_tags_to_entry(&mut entry, "tag1, tag2", &[]).unwrap();

    assert_eq!(entry.tag_labels(), vec!["tag1", "tag2"]);
}

#[test]
fn assign_tags_with_empty_input() {
    let proxy = build_proxy(
        StubFetcher::new(empty_payload()),
        Arc::new(RecordingTagger::default()),
    );
    let mut entry = new_entry();

    proxy
        .assign_tags_to_entry(&mut entry, Vec::<String>::new(), &[])
        .unwrap();
    proxy.assign_tags_to_entry(&mut entry, "", &[]).unwrap();

    assert!(entry.tags.is_empty());
}

#[test]
fn assign_tags_already_assigned() {
    let proxy = build_proxy(
        StubFetcher::new(empty_payload()),
        Arc::new(RecordingTagger::default()),
    );
    let mut entry = new_entry();
    entry.add_tag(Tag::new("tag1"));

    proxy.assign_tags_to_entry(&mut entry, "tag1, tag2", &[]).unwrap();

    assert_eq!(entry.tag_labels(), vec!["tag1", "tag2"]);
}

#[test]
fn assign_tags_uses_preloaded_tags_without_lookup() {
    let proxy = ContentProxy::new(
        StubFetcher::new(empty_payload()),
        Arc::new(RecordingTagger::default()),
        Arc::new(UntouchableRepository),
        options(),
    );
    let mut entry = new_entry();

    proxy
        .assign_tags_to_entry(&mut entry, "tag1", &[Tag::new("tag1")])
        .unwrap();

    assert_eq!(entry.tag_labels(), vec!["tag1"]);
}

#[test]
fn crazy_html_is_sanitized() {
    let cases = [
        (
            "script and comment",
            "<strong>Script inside:</strong> <!--[if gte IE 4]><script>alert('lol');</script><![endif]--><br />",
            "lol",
        ),
        (
            "script",
            "<strong>Script inside:</strong><script>alert('lol');</script>",
            "script",
        ),
    ];

    for (name, html, forbidden) in cases {
        let tagger = Arc::new(RecordingTagger::default());
        let proxy = build_proxy(StubFetcher::new(empty_payload()), tagger.clone());
        let forced: FetchResult = serde_json::from_value(json!({
            "html": html,
            "title": "this is my title",
            "url": "http://1.1.1.1",
            "content_type": "text/html",
            "language": "fr",
            "status": "200",
            "open_graph": {
                "og_title": "my OG title",
                "og_description": "OG desc",
                "og_image": "http://3.3.3.3/cover.jpg",
            },
        }))
        .unwrap();

        let mut entry = new_entry();
        proxy.update_entry(&mut entry, "http://1.1.1.1", Some(forced));

        assert_eq!(tagger.calls.load(Ordering::SeqCst), 1, "{name}");
        assert_eq!(entry.url, "http://1.1.1.1", "{name}");
        assert_eq!(entry.title, "this is my title", "{name}");
        assert!(!entry.content.contains(forbidden), "{name}: {}", entry.content);
        assert_eq!(
            entry.preview_picture.as_deref(),
            Some("http://3.3.3.3/cover.jpg"),
            "{name}"
        );
        assert_eq!(entry.mimetype.as_deref(), Some("text/html"), "{name}");
        assert_eq!(entry.language.as_deref(), Some("fr"), "{name}");
        assert_eq!(entry.http_status.as_deref(), Some("200"), "{name}");
        assert_eq!(entry.domain_name.as_deref(), Some("1.1.1.1"), "{name}");
    }
}

#[test]
fn rule_based_tagging_through_in_memory_fetcher() {
    init_tracing();
    let fetcher = InMemoryFetcher::new();
    fetcher
        .insert_page(
            "http://short.link/x",
            "https://github.com/rust-lang/rust",
            r#"<html lang="en"><head>
                <title>rust-lang/rust</title>
                <meta property="og:image" content="https://github.com/og.png">
            </head><body><article><p>Empowering everyone to build reliable software.</p></article></body></html>"#,
            Some("text/html; charset=utf-8"),
            200,
        )
        .unwrap();

    let rules = vec![
        TaggingRule::new(r#"domainName = "github.com""#, ["code", "github"]),
        TaggingRule::new("readingTime >= 5", ["long read"]),
        TaggingRule::new(r#"title matches "RUST" and language = "en""#, ["rust"]),
    ];
    let repo = Arc::new(InMemoryTagRepository::with_labels(["code"]).unwrap());
    let proxy = ContentProxy::new(
        Arc::new(fetcher),
        Arc::new(RuleBasedTagger::new(&rules).unwrap()),
        repo.clone(),
        options(),
    );

    let mut entry = new_entry();
    proxy.update_entry(&mut entry, "http://short.link/x", None);

    assert_eq!(entry.url, "https://github.com/rust-lang/rust");
    assert_eq!(entry.title, "rust-lang/rust");
    assert_eq!(entry.language.as_deref(), Some("en"));
    assert_eq!(entry.http_status.as_deref(), Some("200"));
    assert_eq!(entry.preview_picture.as_deref(), Some("https://github.com/og.png"));
    assert_eq!(entry.content, "<p>Empowering everyone to build reliable software.</p>");
    assert_eq!(entry.tag_labels(), vec!["code", "github", "rust"]);
    assert_eq!(entry.tags[0].id, Some(1));
    assert_eq!(entry.tags[1].id, None);
    assert_eq!(repo.len(), 1);

    // A second pass adds nothing new.
    proxy.update_entry(&mut entry, "http://short.link/x", None);
    assert_eq!(entry.tags.len(), 3);
}

#[test]
fn unknown_url_in_memory_falls_back() {
    let proxy = ContentProxy::new(
        Arc::new(InMemoryFetcher::new()),
        Arc::new(RecordingTagger::default()),
        Arc::new(InMemoryTagRepository::new()),
        options(),
    );
    let mut entry = new_entry();
    proxy.update_entry(&mut entry, "http://missing.test/page", None);

    assert_eq!(entry.content, FETCHING_ERROR_MESSAGE);
    assert_eq!(entry.url, "http://missing.test/page");
    assert_eq!(entry.domain_name.as_deref(), Some("missing.test"));
}

/// Tagger suggesting a fixed list of labels.
struct FixedTagger(&'static [&'static str]);

impl Tagger for FixedTagger {
    fn tag(&self, _entry: &Entry) -> Result<Vec<String>> {
        Ok(self.0.iter().map(|s| s.to_string()).collect())
    }
}

/// Repository that loses its connection when asked about one label.
struct FlakyRepository {
    broken_label: &'static str,
}

impl TagRepository for FlakyRepository {
    fn find_one_by_label(&self, label: &str) -> Result<Option<Tag>> {
        if label == self.broken_label {
            return Err(ProxyError::TagRepository(format!("lost connection on {label}")));
        }
        Ok(None)
    }

    fn save(&self, tag: Tag) -> Result<Tag> {
        Ok(tag)
    }
}

#[test]
fn repository_error_during_auto_tagging_keeps_partial_tags() {
    init_tracing();
    let fetcher = StubFetcher::new(full_payload(json!(false)));
    let proxy = ContentProxy::new(
        fetcher.clone(),
        Arc::new(FixedTagger(&["first", "second", "third"])),
        Arc::new(FlakyRepository {
            broken_label: "second",
        }),
        options(),
    );

    let mut entry = new_entry();
    let updated = proxy.update_entry(&mut entry, "http://0.0.0.0", None);

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(updated.tag_labels(), vec!["first"]);
    assert_eq!(updated.title, "this is my title");
    assert!(updated.content.contains("this is my content"));
    assert_eq!(updated.reading_time, 4.0);
}

#[test]
fn open_graph_description_is_stored_as_text() {
    let fetcher = StubFetcher::new(empty_payload());
    let proxy = build_proxy(fetcher.clone(), Arc::new(RecordingTagger::default()));
    let forced: FetchResult = serde_json::from_value(json!({
        "html": false,
        "open_graph": {
            "og_description": "<script>alert('lol')</script>",
        },
    }))
    .unwrap();

    let mut entry = new_entry();
    proxy.update_entry(&mut entry, "http://domain.io", Some(forced));

    assert_eq!(fetcher.calls(), 0);
    assert!(!entry.content.contains("<script"));
    assert_eq!(
        entry.content,
        format!(
            "{FETCHING_ERROR_MESSAGE}<p><i>But we found a short description: </i></p>&lt;script&gt;alert('lol')&lt;/script&gt;"
        )
    );
}

#[test]
fn partial_forced_content_is_not_refetched() {
    let fetcher = StubFetcher::new(full_payload(json!(false)));
    let proxy = build_proxy(fetcher.clone(), Arc::new(RecordingTagger::default()));
    let forced: FetchResult = serde_json::from_value(json!({
        "title": "imported title",
        "url": "http://imported.test/a",
    }))
    .unwrap();

    let mut entry = new_entry();
    proxy.update_entry(&mut entry, "http://0.0.0.0", Some(forced));

    assert_eq!(fetcher.calls(), 0);
    assert_eq!(entry.title, "imported title");
    assert_eq!(entry.url, "http://imported.test/a");
    assert_eq!(entry.content, FETCHING_ERROR_MESSAGE);
    assert_eq!(entry.domain_name.as_deref(), Some("imported.test"));
}
