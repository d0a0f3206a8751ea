use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jiff::Timestamp;
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

use crate::api::FeedApi;
use crate::config::{AppConfig, default_feeds};
use crate::internal::board::HeadlineBoard;
use crate::internal::cache::CacheStore;
use crate::internal::fetcher::{FeedFetcher, FetchOrigin, FetchOutcome};
use crate::internal::scheduler::{RefreshHandle, RefreshScheduler};
use crate::internal::store::{FileStore, KeyValueStore, MemoryStore};
use crate::internal::theme::{SystemThemeWatcher, ThemeController, detect_system_dark};
use crate::internal::ui::keybindings::{KeyBindingMap, create_default_keybindings};
use crate::utils::theme_loader::{ThemePair, TuiTheme};

use ratatui::Frame;
use ratatui::widgets::ListState;

/// Actions/messages sent through the app action channel.
#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    NavigateUp,
    NavigateDown,
    NavigateFirst,
    NavigateLast,
    OpenLink,
    NextFilter,
    PrevFilter,
    SelectFilter(usize),
    Refresh { use_cache: bool },
    HeadlinesLoaded(FetchOutcome),
    ToggleDarkMode,
    SystemThemeChanged(bool),
}

/// Short-lived message shown in the status bar.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub created: Instant,
}

impl StatusMessage {
    const TIMEOUT: Duration = Duration::from_secs(4);

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created: Instant::now(),
        }
    }

    pub fn should_dismiss(&self) -> bool {
        self.created.elapsed() > Self::TIMEOUT
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub config: AppConfig,
    pub board: HeadlineBoard,
    pub list_state: ListState,
    pub fetcher: Arc<FeedFetcher>,
    pub loading: bool,
    pub last_refresh: Option<(Timestamp, FetchOrigin)>,
    pub theme_controller: ThemeController,
    pub palettes: ThemePair,
    pub status: Option<StatusMessage>,
    pub spinner_state: usize,
    pub keybindings: KeyBindingMap,
    pub action_tx: UnboundedSender<Action>,
    pub action_rx: UnboundedReceiver<Action>,
}

impl App {
    /// Build the app from configuration: persistent store, cache, API client
    /// and theme state.
    #[tracing::instrument(skip(config))]
    pub fn new(config: AppConfig) -> Self {
        let store: Arc<dyn KeyValueStore> =
            match FileStore::load_or_create(config.storage_dir.as_deref().map(Path::new)) {
                Ok(store) => {
                    tracing::info!(storage_file = %store.path().display(), "Using file storage");
                    Arc::new(store)
                }
                Err(e) => {
                    tracing::error!("Failed to open storage, falling back to memory: {:#}", e);
                    Arc::new(MemoryStore::new())
                }
            };

        let cache = CacheStore::with_metrics(
            store.clone(),
            config.cache_ttl(),
            config.logging.enable_performance_metrics,
        );
        let fetcher = FeedFetcher::new(FeedApi::new(&config.network), default_feeds(), cache)
            .with_retries(config.network.max_retries, config.network.retry_delay());

        Self::with_services(config, fetcher, store, detect_system_dark())
    }

    /// Assemble the app around explicit services.
    pub fn with_services(
        config: AppConfig,
        fetcher: FeedFetcher,
        store: Arc<dyn KeyValueStore>,
        system_dark: bool,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let palettes = ThemePair::load(
            config.theme_file.as_deref(),
            config.logging.enable_performance_metrics,
        );

        tracing::info!(
            sources = fetcher.feeds().len(),
            endpoint = %config.network.endpoint,
            "App initialized"
        );

        Self {
            running: true,
            board: HeadlineBoard::new(),
            list_state: ListState::default(),
            fetcher: Arc::new(fetcher),
            loading: false,
            last_refresh: None,
            theme_controller: ThemeController::init(store, system_dark),
            palettes,
            status: None,
            spinner_state: 0,
            keybindings: create_default_keybindings(),
            action_tx,
            action_rx,
            config,
        }
    }

    pub fn theme(&self) -> &TuiTheme {
        self.palettes.get(self.theme_controller.is_dark())
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(StatusMessage::new(message));
    }

    /// Start the background timers. Dropping the returned handles stops them.
    pub fn start_background_tasks(&self) -> (RefreshHandle, Option<SystemThemeWatcher>) {
        let refresh = RefreshScheduler::spawn(
            self.config.refresh_interval(),
            self.action_tx.clone(),
            || Action::Refresh { use_cache: false },
        );

        let watcher = match self.config.ui.system_theme_poll_secs {
            0 => None,
            secs => Some(SystemThemeWatcher::spawn(
                Duration::from_secs(secs),
                detect_system_dark(),
                detect_system_dark,
                self.action_tx.clone(),
                Action::SystemThemeChanged,
            )),
        };

        (refresh, watcher)
    }

    pub async fn run(&mut self, mut tui: crate::tui::Tui) -> Result<()> {
        // Initial load goes through the cache
        let _ = self.action_tx.send(Action::Refresh { use_cache: true });

        let (refresh, watcher) = self.start_background_tasks();

        let mut event_interval = tokio::time::interval(Duration::from_millis(16));
        let mut spinner_updated = Instant::now();
        let mut times_updated = Instant::now();

        loop {
            if spinner_updated.elapsed() >= Duration::from_millis(100) {
                self.spinner_state = self.spinner_state.wrapping_add(1);
                spinner_updated = Instant::now();
            }

            // Relative times drift while the list sits on screen
            if times_updated.elapsed() >= Duration::from_secs(60) {
                self.board.refresh_times(Timestamp::now());
                times_updated = Instant::now();
            }

            if let Some(status) = &self.status
                && status.should_dismiss()
            {
                self.status = None;
            }

            tui.draw(|f| self.ui(f))?;

            tokio::select! {
                _ = event_interval.tick() => {
                    if event::poll(Duration::from_millis(0))?
                        && let Event::Key(key) = event::read()?
                        && key.kind == KeyEventKind::Press
                    {
                        self.handle_key_event(key);
                    }
                }
                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action);
                }
            }

            if !self.running {
                break;
            }
        }

        refresh.shutdown().await;
        if let Some(watcher) = watcher {
            watcher.stop();
        }
        Ok(())
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if let Some(action) = self.keybindings.get_action(&key) {
            let _ = self.action_tx.send(action);
        }
    }

    #[tracing::instrument(skip(self, action))]
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::NavigateUp => self.select_prev(),
            Action::NavigateDown => self.select_next(),
            Action::NavigateFirst => self.select_first(),
            Action::NavigateLast => self.select_last(),
            Action::OpenLink => self.open_selected(),
            Action::NextFilter => {
                self.board.cycle_filter(1);
                self.reset_selection();
            }
            Action::PrevFilter => {
                self.board.cycle_filter(-1);
                self.reset_selection();
            }
            Action::SelectFilter(index) => {
                if self.board.select_filter_index(index) {
                    self.reset_selection();
                }
            }
            Action::Refresh { use_cache } => self.start_refresh(use_cache),
            Action::HeadlinesLoaded(outcome) => self.finish_refresh(outcome),
            Action::ToggleDarkMode => self.theme_controller.toggle(),
            Action::SystemThemeChanged(dark) => {
                self.theme_controller.on_system_change(dark);
            }
        }
    }

    /// Spawn one fetch cycle unless one is already running.
    fn start_refresh(&mut self, use_cache: bool) {
        if self.loading {
            tracing::info!(use_cache, "Refresh requested while a fetch is in flight, skipping");
            return;
        }
        self.loading = true;

        let fetcher = self.fetcher.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let outcome = fetcher.fetch_all(use_cache).await;
            let _ = tx.send(Action::HeadlinesLoaded(outcome));
        });
    }

    fn finish_refresh(&mut self, outcome: FetchOutcome) {
        self.loading = false;
        let now = Timestamp::now();
        self.board.render(&outcome.results, now);
        self.last_refresh = Some((now, outcome.origin));

        let selected = self.list_state.selected().unwrap_or(0);
        match self.board.visible_count() {
            0 => self.list_state.select(None),
            n => self.list_state.select(Some(selected.min(n - 1))),
        }

        let message = match outcome.origin {
            FetchOrigin::Cache => format!("Loaded {} sources from cache", outcome.results.len()),
            FetchOrigin::Network => format!("Refreshed {} sources", outcome.results.len()),
        };
        self.set_status(message);
    }

    fn open_selected(&mut self) {
        let Some(link) = self.selected_link() else {
            return;
        };
        match open::that(&link) {
            Ok(()) => tracing::info!(link = %link, "Opened headline in browser"),
            Err(e) => {
                tracing::error!(link = %link, "Failed to open browser: {}", e);
                self.set_status("Could not open browser");
            }
        }
    }

    pub fn selected_link(&self) -> Option<String> {
        let index = self.list_state.selected()?;
        self.board
            .visible_rows()
            .nth(index)
            .map(|row| row.link.clone())
    }

    fn reset_selection(&mut self) {
        match self.board.visible_count() {
            0 => self.list_state.select(None),
            _ => self.list_state.select(Some(0)),
        }
    }

    fn select_next(&mut self) {
        let len = self.board.visible_count();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn select_prev(&mut self) {
        if self.board.visible_count() == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn select_first(&mut self) {
        if self.board.visible_count() > 0 {
            self.list_state.select(Some(0));
        }
    }

    fn select_last(&mut self) {
        let len = self.board.visible_count();
        if len > 0 {
            self.list_state.select(Some(len - 1));
        }
    }

    pub fn get_spinner_char(&self) -> &'static str {
        const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        SPINNER[self.spinner_state % SPINNER.len()]
    }

    pub fn ui(&mut self, f: &mut Frame) {
        crate::internal::ui::view::draw(self, f);
    }
}
