//! Headline board: the rendered state of the headline list.
//!
//! `render` projects a fetch cycle's results into display rows and filter
//! buttons (a full clear-and-rebuild), and `apply_filter` toggles row
//! visibility. Nothing here touches the terminal; `ui::view` draws whatever
//! the board holds.

use std::collections::HashSet;

use jiff::Timestamp;

use super::models::FeedResult;
use crate::utils::datetime::relative_time_at;

/// Label of the permanent first filter button.
pub const ALL_LABEL: &str = "All";

/// The active source filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Source(String),
}

impl Filter {
    pub fn admits(&self, source: &str) -> bool {
        match self {
            Filter::All => true,
            Filter::Source(name) => name == source,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Filter::All => ALL_LABEL,
            Filter::Source(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterButton {
    pub filter: Filter,
    pub active: bool,
}

/// One display row: source tag, title, link target and relative time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlineRow {
    pub source: String,
    pub title: String,
    pub link: String,
    pub published: Timestamp,
    pub relative_time: String,
    pub hidden: bool,
}

/// Flatten results into rows in source order, then item order.
pub fn build_rows(results: &[FeedResult], now: Timestamp) -> Vec<HeadlineRow> {
    results
        .iter()
        .flat_map(|result| {
            result.items.iter().map(move |item| HeadlineRow {
                source: result.feed.name.clone(),
                title: item.title.clone(),
                link: item.link.clone(),
                published: item.pub_date,
                relative_time: relative_time_at(item.pub_date, now),
                hidden: false,
            })
        })
        .collect()
}

/// Distinct source names in first-seen order.
pub fn source_names(results: &[FeedResult]) -> Vec<String> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|result| seen.insert(result.feed.name.as_str()))
        .map(|result| result.feed.name.clone())
        .collect()
}

#[derive(Debug, Clone)]
pub struct HeadlineBoard {
    buttons: Vec<FilterButton>,
    rows: Vec<HeadlineRow>,
    filter: Filter,
}

impl Default for HeadlineBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlineBoard {
    pub fn new() -> Self {
        Self {
            buttons: vec![FilterButton {
                filter: Filter::All,
                active: true,
            }],
            rows: Vec::new(),
            filter: Filter::All,
        }
    }

    pub fn buttons(&self) -> &[FilterButton] {
        &self.buttons
    }

    pub fn rows(&self) -> &[HeadlineRow] {
        &self.rows
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &HeadlineRow> {
        self.rows.iter().filter(|row| !row.hidden)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_rows().count()
    }

    /// Replace all rows and source buttons with `results`.
    ///
    /// The previous filter is re-applied when its source is still present;
    /// otherwise the board falls back to `All`.
    pub fn render(&mut self, results: &[FeedResult], now: Timestamp) {
        self.buttons.truncate(1);
        self.buttons.extend(source_names(results).into_iter().map(|name| FilterButton {
            filter: Filter::Source(name),
            active: false,
        }));
        self.rows = build_rows(results, now);

        let previous = std::mem::take(&mut self.filter);
        if !self.apply_filter(previous.clone()) {
            tracing::info!(filter = previous.label(), "Filtered source missing after render, showing all");
            self.apply_filter(Filter::All);
        }
    }

    /// Recompute relative times without rebuilding rows.
    pub fn refresh_times(&mut self, now: Timestamp) {
        for row in &mut self.rows {
            row.relative_time = relative_time_at(row.published, now);
        }
    }

    /// Show only rows admitted by `filter` and mark its button active.
    ///
    /// Returns `false`, leaving the board untouched, when no button exists
    /// for the requested source.
    pub fn apply_filter(&mut self, filter: Filter) -> bool {
        if !self.buttons.iter().any(|b| b.filter == filter) {
            return false;
        }

        for button in &mut self.buttons {
            button.active = button.filter == filter;
        }
        for row in &mut self.rows {
            row.hidden = !filter.admits(&row.source);
        }
        self.filter = filter;
        true
    }

    /// Select the filter button `offset` steps away from the active one,
    /// wrapping around.
    pub fn cycle_filter(&mut self, offset: isize) {
        let len = self.buttons.len() as isize;
        let current = self
            .buttons
            .iter()
            .position(|b| b.active)
            .unwrap_or(0) as isize;
        let next = (current + offset).rem_euclid(len) as usize;
        let filter = self.buttons[next].filter.clone();
        self.apply_filter(filter);
    }

    /// Select the filter button at `index` (0 is `All`). Out of range is a no-op.
    pub fn select_filter_index(&mut self, index: usize) -> bool {
        match self.buttons.get(index) {
            Some(button) => {
                let filter = button.filter.clone();
                self.apply_filter(filter)
            }
            None => false,
        }
    }
}
