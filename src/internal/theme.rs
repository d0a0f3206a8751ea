use std::sync::Arc;
use std::time::Duration;

use strum_macros::{AsRefStr, EnumString};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use super::store::KeyValueStore;

pub const DARK_MODE_KEY: &str = "darkMode";

/// Environment override for the detected terminal appearance.
pub const COLOR_SCHEME_ENV: &str = "TUI_HEADLINES_COLOR_SCHEME";

pub const LIGHT_MODE_LABEL: &str = "☼ Light Mode";
pub const DARK_MODE_LABEL: &str = "◐ Dark Mode";

/// An explicit dark-mode choice as persisted under [`DARK_MODE_KEY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ThemePreference {
    Enabled,
    Disabled,
}

impl ThemePreference {
    pub fn from_dark(dark: bool) -> Self {
        match dark {
            true => Self::Enabled,
            false => Self::Disabled,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Self::Enabled
    }
}

/// Dark-mode state: a persisted explicit preference wins over the system
/// appearance, permanently.
pub struct ThemeController {
    store: Arc<dyn KeyValueStore>,
    dark: bool,
    // Set once the user has chosen, whether or not the store accepted it.
    explicit: bool,
}

impl ThemeController {
    /// Resolve the initial mode from the stored preference, falling back to
    /// `system_dark` when nothing (or something unrecognized) is stored.
    pub fn init(store: Arc<dyn KeyValueStore>, system_dark: bool) -> Self {
        let (dark, explicit) = match Self::stored_preference(store.as_ref()) {
            Some(pref) => {
                tracing::info!(preference = pref.as_ref(), "Using saved dark mode preference");
                (pref.is_dark(), true)
            }
            None => {
                tracing::info!(system_dark, "No saved dark mode preference, following system");
                (system_dark, false)
            }
        };
        Self {
            store,
            dark,
            explicit,
        }
    }

    fn stored_preference(store: &dyn KeyValueStore) -> Option<ThemePreference> {
        let raw = store.get(DARK_MODE_KEY)?;
        match raw.parse::<ThemePreference>() {
            Ok(pref) => Some(pref),
            Err(_) => {
                tracing::warn!(value = %raw, "Ignoring unrecognized dark mode preference");
                None
            }
        }
    }

    pub fn is_dark(&self) -> bool {
        self.dark
    }

    pub fn has_explicit_preference(&self) -> bool {
        self.explicit
    }

    /// Label for the toggle control: it names the mode a toggle switches to.
    pub fn toggle_label(&self) -> &'static str {
        match self.dark {
            true => LIGHT_MODE_LABEL,
            false => DARK_MODE_LABEL,
        }
    }

    /// Flip the mode and persist it as an explicit preference.
    pub fn toggle(&mut self) {
        self.dark = !self.dark;
        self.explicit = true;
        let pref = ThemePreference::from_dark(self.dark);
        if let Err(e) = self.store.set(DARK_MODE_KEY, pref.as_ref()) {
            tracing::error!("Failed to save dark mode preference: {:#}", e);
        }
        tracing::info!(preference = pref.as_ref(), "Dark mode toggled");
    }

    /// Apply a system appearance change unless the user has chosen explicitly.
    /// Returns whether the active mode changed.
    pub fn on_system_change(&mut self, system_dark: bool) -> bool {
        if self.has_explicit_preference() {
            tracing::debug!(system_dark, "Ignoring system appearance change, user preference saved");
            return false;
        }
        let changed = self.dark != system_dark;
        self.dark = system_dark;
        changed
    }
}

/// Detect whether the terminal background is dark.
///
/// [`COLOR_SCHEME_ENV`] (`dark`/`light`) wins; otherwise `COLORFGBG`
/// ("fg;bg", background index 0-6 is dark). Without either, assume dark.
pub fn detect_system_dark() -> bool {
    system_dark_from(
        std::env::var(COLOR_SCHEME_ENV).ok().as_deref(),
        std::env::var("COLORFGBG").ok().as_deref(),
    )
}

pub fn system_dark_from(scheme: Option<&str>, colorfgbg: Option<&str>) -> bool {
    if let Some(scheme) = scheme {
        match scheme.trim().to_ascii_lowercase().as_str() {
            "dark" => return true,
            "light" => return false,
            _ => {}
        }
    }

    if let Some(colorfgbg) = colorfgbg {
        return match colorfgbg.split(';').next_back().map(str::parse::<u8>) {
            Some(Ok(0..=6)) => true,
            Some(Ok(_)) => false,
            _ => true,
        };
    }

    true
}

/// Handle for a background appearance watcher.
pub struct SystemThemeWatcher {
    token: CancellationToken,
}

impl SystemThemeWatcher {
    /// Poll `probe` every `period` and send the new value through `tx`
    /// whenever it differs from the last one observed (starting at `initial`).
    pub fn spawn<F, M>(
        period: Duration,
        initial: bool,
        probe: F,
        tx: UnboundedSender<M>,
        to_message: fn(bool) -> M,
    ) -> Self
    where
        F: Fn() -> bool + Send + 'static,
        M: Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();

        tokio::spawn(async move {
            let mut last = initial;
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = interval.tick() => {
                        let now_dark = probe();
                        if now_dark != last {
                            last = now_dark;
                            tracing::info!(system_dark = now_dark, "System appearance changed");
                            if tx.send(to_message(now_dark)).is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self { token }
    }

    pub fn stop(&self) {
        self.token.cancel();
    }
}

impl Drop for SystemThemeWatcher {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::store::MemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn store() -> (Arc<dyn KeyValueStore>, MemoryStore) {
        let mem = MemoryStore::new();
        (Arc::new(mem.clone()), mem)
    }

    #[test]
    fn follows_system_without_preference() {
        let (kv, _) = store();
        assert!(ThemeController::init(kv.clone(), true).is_dark());
        assert!(!ThemeController::init(kv, false).is_dark());
    }

    #[test]
    fn saved_preference_beats_system() {
        let (kv, mem) = store();
        mem.set(DARK_MODE_KEY, "disabled").unwrap();
        let theme = ThemeController::init(kv, true);
        assert!(!theme.is_dark());
        assert_eq!(theme.toggle_label(), DARK_MODE_LABEL);
    }

    #[test]
    fn unrecognized_preference_is_ignored() {
        let (kv, mem) = store();
        mem.set(DARK_MODE_KEY, "sometimes").unwrap();
        let theme = ThemeController::init(kv, true);
        assert!(theme.is_dark());
        assert!(!theme.has_explicit_preference());
    }

    #[test]
    fn toggle_flips_label_and_persists() {
        let (kv, mem) = store();
        let mut theme = ThemeController::init(kv, false);
        assert_eq!(theme.toggle_label(), DARK_MODE_LABEL);

        theme.toggle();
        assert!(theme.is_dark());
        assert_eq!(theme.toggle_label(), LIGHT_MODE_LABEL);
        assert_eq!(mem.get(DARK_MODE_KEY).as_deref(), Some("enabled"));

        theme.toggle();
        assert_eq!(mem.get(DARK_MODE_KEY).as_deref(), Some("disabled"));
    }

    #[test]
    fn system_changes_apply_until_user_chooses() {
        let (kv, _) = store();
        let mut theme = ThemeController::init(kv, false);

        assert!(theme.on_system_change(true));
        assert!(theme.is_dark());

        theme.toggle();
        assert!(!theme.is_dark());
        assert!(!theme.on_system_change(true));
        assert!(!theme.is_dark());
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("read-only")
        }
    }

    #[test]
    fn toggle_sticks_when_the_store_rejects_the_write() {
        let mut theme = ThemeController::init(Arc::new(ReadOnlyStore), false);

        theme.toggle();
        assert!(theme.is_dark());
        assert!(theme.has_explicit_preference());

        assert!(!theme.on_system_change(false));
        assert!(theme.is_dark());
    }

    #[test]
    fn colorfgbg_background_index_decides() {
        assert!(system_dark_from(None, Some("15;0")));
        assert!(!system_dark_from(None, Some("0;15")));
        assert!(system_dark_from(None, Some("garbage")));
        assert!(system_dark_from(None, None));
    }

    #[test]
    fn scheme_override_wins() {
        assert!(!system_dark_from(Some("light"), Some("15;0")));
        assert!(system_dark_from(Some("DARK"), Some("0;15")));
        assert!(!system_dark_from(Some("auto"), Some("0;15")));
    }

    #[tokio::test]
    async fn watcher_reports_changes_only() {
        let flag = Arc::new(AtomicBool::new(false));
        let probe_flag = flag.clone();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<bool>();

        let watcher = SystemThemeWatcher::spawn(
            Duration::from_millis(10),
            false,
            move || probe_flag.load(Ordering::SeqCst),
            tx,
            |dark| dark,
        );

        flag.store(true, Ordering::SeqCst);
        let got = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert_eq!(got.unwrap(), Some(true));

        watcher.stop();
    }
}
