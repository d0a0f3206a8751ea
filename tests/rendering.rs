use std::sync::Arc;
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use ratatui::{Terminal, backend::TestBackend};
use tui_headlines::api::FeedApi;
use tui_headlines::config::AppConfig;
use tui_headlines::internal::board::{Filter, HeadlineBoard};
use tui_headlines::internal::cache::CacheStore;
use tui_headlines::internal::fetcher::{FeedFetcher, FetchOrigin, FetchOutcome};
use tui_headlines::internal::models::{FeedResult, FeedSource, HeadlineItem};
use tui_headlines::internal::store::{KeyValueStore, MemoryStore};
use tui_headlines::internal::ui::app::{Action, App};
use tui_headlines::internal::ui::view::format_row;

fn now() -> Timestamp {
    "2025-03-01T12:00:00Z".parse().unwrap()
}

fn item(title: &str, minutes_ago: i64) -> HeadlineItem {
    HeadlineItem {
        title: title.to_string(),
        link: format!("https://example.com/{}", title),
        pub_date: now() - SignedDuration::from_mins(minutes_ago),
    }
}

fn results() -> Vec<FeedResult> {
    vec![
        FeedResult {
            feed: FeedSource::new("ABC", "https://www.abc.es/rss/2.0/portada/"),
            items: vec![item("Primera", 5), item("Segunda", 125)],
        },
        FeedResult {
            feed: FeedSource::new("El Mundo", "https://e00-elmundo.uecdn.es/rss/portada.xml"),
            items: vec![item("Tercera", 26 * 60)],
        },
    ]
}

fn offline_app() -> App {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let fetcher = FeedFetcher::new(
        FeedApi::with_endpoint("http://localhost:1/api.json"),
        vec![],
        CacheStore::new(kv.clone(), Duration::from_secs(600)),
    );
    App::with_services(AppConfig::default(), fetcher, kv, true)
}

fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
    terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|c| c.symbol())
        .collect()
}

#[test]
fn test_rows_render_with_source_tag_and_relative_time() {
    let mut board = HeadlineBoard::new();
    board.render(&results(), now());

    let text = board
        .visible_rows()
        .map(format_row)
        .collect::<Vec<_>>()
        .join("\n");

    insta::assert_snapshot!(text, @r"
    [ABC] Primera · 5m ago
    [ABC] Segunda · 2h ago
    [El Mundo] Tercera · 1d ago
    ");
}

#[test]
fn test_filtered_rows_render_only_matching_source() {
    let mut board = HeadlineBoard::new();
    board.render(&results(), now());
    board.apply_filter(Filter::Source("El Mundo".to_string()));

    let text = board
        .visible_rows()
        .map(format_row)
        .collect::<Vec<_>>()
        .join("\n");

    insta::assert_snapshot!(text, @"[El Mundo] Tercera · 1d ago");
}

#[test]
fn test_draw_empty_app() {
    let mut app = offline_app();
    let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
    terminal.draw(|f| app.ui(f)).unwrap();

    let text = buffer_text(&terminal);
    assert!(text.contains("Headlines"));
    assert!(text.contains("0 All"));
    assert!(text.contains("No headlines"));
    assert!(text.contains("Light Mode"), "dark mode offers a switch to light");
}

#[test]
fn test_draw_loaded_app_shows_filters_and_rows() {
    let mut app = offline_app();
    app.handle_action(Action::HeadlinesLoaded(FetchOutcome {
        results: results(),
        origin: FetchOrigin::Cache,
        failed: vec![],
    }));

    let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
    terminal.draw(|f| app.ui(f)).unwrap();

    let text = buffer_text(&terminal);
    assert!(text.contains("1 ABC"));
    assert!(text.contains("2 El Mundo"));
    assert!(text.contains("[ABC] Primera"));
    assert!(text.contains("3/3 headlines"));
}

#[test]
fn test_draw_narrow_terminal_does_not_panic() {
    let mut app = offline_app();
    app.handle_action(Action::HeadlinesLoaded(FetchOutcome {
        results: results(),
        origin: FetchOrigin::Network,
        failed: vec![],
    }));

    let mut terminal = Terminal::new(TestBackend::new(12, 5)).unwrap();
    terminal.draw(|f| app.ui(f)).unwrap();
}
