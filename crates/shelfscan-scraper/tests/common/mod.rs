//! Scripted in-memory page for driving the extraction pipeline in tests.
//!
//! Row counts are a function of how many "load more" actions (button
//! triggers, pagination-link clicks, scrolls) the page has received, so
//! convergence scenarios can be scripted without a browser.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use shelfscan_scraper::pagination::PAGINATION_LINKS;
use shelfscan_scraper::{PageSurface, RegionHandle, SurfaceError};

/// How the visible row count evolves with each action.
#[derive(Debug, Clone)]
pub enum RowScript {
    /// Count after `n` actions is `counts[min(n, len - 1)]`.
    Fixed(Vec<usize>),
    /// Count after `n` actions is `start + n * step`; never stabilizes.
    Growing { start: usize, step: usize },
}

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub head: Vec<String>,
    /// Header cells rendered as `th` in the first row (no `thead`).
    pub first_row_th: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Whether rows sit inside a `tbody`.
    pub has_body: bool,
    pub scrollable: bool,
    /// Row lookups (`tbody tr` and `tr`) fail.
    pub unreadable: bool,
    /// Indices into `rows` whose `td` lookup fails.
    pub broken_rows: Vec<usize>,
}

impl FakeTable {
    pub fn with_head(head: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            head: strings(head),
            rows: rows.iter().map(|r| strings(r)).collect(),
            has_body: true,
            ..Self::default()
        }
    }

    fn text(&self) -> String {
        let mut lines = vec![self.head.join("\t"), self.first_row_th.join("\t")];
        lines.extend(self.rows.iter().map(|r| r.join("\t")));
        lines.retain(|l| !l.is_empty());
        lines.join("\n")
    }
}

#[derive(Debug)]
pub struct Shared {
    actions: usize,
    rows: Option<RowScript>,
    buttons: Vec<String>,
    triggered: Vec<String>,
    next_link: bool,
    link_clicks: usize,
    page_scrollable: bool,
    page_scrolls: usize,
    region_scrolls: usize,
    quiescence_waits: usize,
}

impl Shared {
    fn count(&self, fallback: usize) -> usize {
        match &self.rows {
            None => fallback,
            Some(RowScript::Fixed(counts)) => counts
                .get(self.actions.min(counts.len().saturating_sub(1)))
                .copied()
                .unwrap_or(0),
            Some(RowScript::Growing { start, step }) => start + self.actions * step,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakePage {
    shared: Arc<Mutex<Shared>>,
    body: String,
    tables: Vec<FakeTable>,
    blocks: Vec<(&'static str, String)>,
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                actions: 0,
                rows: None,
                buttons: Vec::new(),
                triggered: Vec::new(),
                next_link: false,
                link_clicks: 0,
                page_scrollable: true,
                page_scrolls: 0,
                region_scrolls: 0,
                quiescence_waits: 0,
            })),
            body: String::new(),
            tables: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn body(mut self, text: &str) -> Self {
        text.clone_into(&mut self.body);
        self
    }

    pub fn table(mut self, table: FakeTable) -> Self {
        self.tables.push(table);
        self
    }

    pub fn block(mut self, container: &'static str, text: &str) -> Self {
        self.blocks.push((container, text.to_owned()));
        self
    }

    pub fn rows(self, script: RowScript) -> Self {
        self.lock().rows = Some(script);
        self
    }

    pub fn button(self, label: &str) -> Self {
        self.lock().buttons.push(label.to_owned());
        self
    }

    pub fn next_link(self) -> Self {
        self.lock().next_link = true;
        self
    }

    pub fn unscrollable(self) -> Self {
        self.lock().page_scrollable = false;
        self
    }

    /// A table region sharing this page's scripted row counts.
    pub fn region_for(&self, table: FakeTable) -> FakeRegion {
        FakeRegion::Table {
            table,
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn triggered(&self) -> Vec<String> {
        self.lock().triggered.clone()
    }

    pub fn link_clicks(&self) -> usize {
        self.lock().link_clicks
    }

    pub fn page_scrolls(&self) -> usize {
        self.lock().page_scrolls
    }

    pub fn region_scrolls(&self) -> usize {
        self.lock().region_scrolls
    }

    pub fn quiescence_waits(&self) -> usize {
        self.lock().quiescence_waits
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().expect("fake page lock poisoned")
    }
}

#[derive(Debug, Clone)]
pub enum FakeRegion {
    Table {
        table: FakeTable,
        shared: Arc<Mutex<Shared>>,
    },
    Row {
        td: Vec<String>,
        th: Vec<String>,
        broken: bool,
    },
    Block(String),
    Link(Arc<Mutex<Shared>>),
}

#[async_trait]
impl RegionHandle for FakeRegion {
    async fn visible_text(&self) -> Result<String, SurfaceError> {
        Ok(match self {
            Self::Table { table, .. } => table.text(),
            Self::Row { td, th, .. } => th.iter().chain(td).cloned().collect::<Vec<_>>().join("\t"),
            Self::Block(text) => text.clone(),
            Self::Link(_) => "Next".to_owned(),
        })
    }

    async fn count(&self, _child_pattern: &str) -> Result<usize, SurfaceError> {
        match self {
            Self::Table { table, shared } => {
                Ok(shared.lock().expect("lock").count(table.rows.len()))
            }
            _ => Ok(0),
        }
    }

    async fn scroll_into_max_extent(&self) -> Result<(), SurfaceError> {
        match self {
            Self::Table { table, shared } if table.scrollable => {
                let mut shared = shared.lock().expect("lock");
                shared.actions += 1;
                shared.region_scrolls += 1;
                Ok(())
            }
            _ => Err(SurfaceError::Script {
                reason: "region is not scrollable".to_owned(),
            }),
        }
    }

    async fn child_texts(&self, child_pattern: &str) -> Result<Vec<String>, SurfaceError> {
        match (self, child_pattern) {
            (Self::Table { table, .. }, "thead tr th") => Ok(table.head.clone()),
            (Self::Row { th, .. }, "th") => Ok(th.clone()),
            (Self::Row { broken: true, .. }, "td") => Err(SurfaceError::Backend(
                "row detached from document".to_owned(),
            )),
            (Self::Row { td, .. }, "td") => Ok(td.clone()),
            _ => Ok(Vec::new()),
        }
    }

    async fn children(&self, child_pattern: &str) -> Result<Vec<Self>, SurfaceError> {
        let Self::Table { table, .. } = self else {
            return Ok(Vec::new());
        };
        if table.unreadable && matches!(child_pattern, "tbody tr" | "tr") {
            return Err(SurfaceError::Backend("table rows not queryable".to_owned()));
        }
        let data = table.rows.iter().enumerate().map(|(index, cells)| Self::Row {
            td: cells.clone(),
            th: Vec::new(),
            broken: table.broken_rows.contains(&index),
        });
        Ok(match child_pattern {
            "tbody tr" if table.has_body => data.collect(),
            "tbody tr" => Vec::new(),
            "tr" => {
                let header = Self::Row {
                    td: Vec::new(),
                    th: table.first_row_th.clone(),
                    broken: false,
                };
                std::iter::once(header).chain(data).collect()
            }
            _ => Vec::new(),
        })
    }

    async fn click(&self, _timeout: Duration) -> Result<(), SurfaceError> {
        match self {
            Self::Link(shared) => {
                let mut shared = shared.lock().expect("lock");
                shared.actions += 1;
                shared.link_clicks += 1;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PageSurface for FakePage {
    type Region = FakeRegion;

    async fn find_regions(
        &self,
        pattern: &str,
        text_filter: Option<&Regex>,
    ) -> Result<Vec<FakeRegion>, SurfaceError> {
        let regions: Vec<FakeRegion> = match pattern {
            "table" => self
                .tables
                .iter()
                .map(|table| FakeRegion::Table {
                    table: table.clone(),
                    shared: Arc::clone(&self.shared),
                })
                .collect(),
            p if p == PAGINATION_LINKS => {
                if self.lock().next_link {
                    vec![FakeRegion::Link(Arc::clone(&self.shared))]
                } else {
                    Vec::new()
                }
            }
            container => self
                .blocks
                .iter()
                .filter(|(c, _)| *c == container)
                .map(|(_, text)| FakeRegion::Block(text.clone()))
                .collect(),
        };

        let mut kept = Vec::with_capacity(regions.len());
        for region in regions {
            let text = region.visible_text().await?;
            if text_filter.is_none_or(|re| re.is_match(&text)) {
                kept.push(region);
            }
        }
        Ok(kept)
    }

    async fn trigger_by_text(&self, pattern: &str, _timeout: Duration) -> bool {
        let Ok(re) = Regex::new(&format!("(?i){pattern}")) else {
            return false;
        };
        let mut shared = self.lock();
        let Some(label) = shared.buttons.iter().find(|b| re.is_match(b)).cloned() else {
            return false;
        };
        shared.actions += 1;
        shared.triggered.push(label);
        true
    }

    async fn wait_for_quiescence(&self, _timeout: Duration) -> Result<(), SurfaceError> {
        self.lock().quiescence_waits += 1;
        Ok(())
    }

    async fn visible_text(&self) -> Result<String, SurfaceError> {
        Ok(self.body.clone())
    }

    async fn count(&self, _pattern: &str) -> Result<usize, SurfaceError> {
        Ok(self.lock().count(0))
    }

    async fn scroll_to_bottom(&self) -> Result<(), SurfaceError> {
        let mut shared = self.lock();
        if !shared.page_scrollable {
            return Err(SurfaceError::Script {
                reason: "window scroll rejected".to_owned(),
            });
        }
        shared.actions += 1;
        shared.page_scrolls += 1;
        Ok(())
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_owned()).collect()
}
