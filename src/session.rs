//! Viewer session: the embedder-facing API.
//!
//! A [`ViewerSession`] owns the highlight index, the selection synchronizer and the
//! overlay toggles for one viewer. Each document load is identified by a
//! [`LoadTicket`]; results delivered for anything but the most recent ticket are
//! discarded, so highlights of two loads never mix.

use crate::block::Block;
use crate::config::{HighlighterConfig, ViewerConfig};
use crate::error::{Error, Result};
use crate::highlight::{
    visible, DerivedBlock, Highlight, HighlightBuilder, HighlightIndex, RenderNudge, VisibilityMode, VisibleHighlights,
};
use crate::source::DocumentSource;
use crate::surface::{Clock, HandlerId, PageLayout, ScrollHandler, SystemClock};
use crate::sync::{SelectionState, SyncEvent, SyncState, Synchronizer};
use crate::tree::DocumentTree;
use std::collections::VecDeque;
use std::fmt;

/// Events kept for [`ViewerSession::drain_events`] before the oldest are dropped.
pub const MAX_QUEUED_EVENTS: usize = 256;

/// Message shown when a document loads but none of its blocks has geometry.
pub const EMPTY_DOCUMENT_MESSAGE: &str = "No highlights available for this document.";

/// Load state of the current document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    /// No document requested yet
    #[default]
    Idle,
    /// Waiting for blocks and tree
    Loading,
    /// A required input could not be loaded
    Failed(String),
    /// Loaded, but no block could be placed on a page
    Empty,
    /// Loaded with at least one highlight
    Ready,
}

impl LoadStatus {
    /// Text to show the user in place of the overlay, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            LoadStatus::Failed(reason) => Some(reason.as_str()),
            LoadStatus::Empty => Some(EMPTY_DOCUMENT_MESSAGE),
            _ => None,
        }
    }
}

/// Identifies one document load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    document_id: String,
    generation: u64,
}

impl LoadTicket {
    /// Document being loaded.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }
}

/// Result of delivering load results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Results were applied
    Committed {
        /// Number of highlights now in the index
        highlights: usize,
    },
    /// Results belonged to a superseded load and were dropped
    Discarded,
}

type SelectionListener = Box<dyn FnMut(Option<&str>)>;
type BlocksListener = Box<dyn FnMut(&[DerivedBlock])>;

/// Highlight state and selection sync for one viewer.
pub struct ViewerSession {
    config: HighlighterConfig,
    builder: HighlightBuilder,
    clock: Box<dyn Clock>,
    active: Option<LoadTicket>,
    issued: u64,
    finished: u64,
    status: LoadStatus,
    index: HighlightIndex,
    sync: Synchronizer,
    nudge: RenderNudge,
    show_all: bool,
    show_blocks_panel: bool,
    layout: Option<Box<dyn PageLayout>>,
    selection_listener: Option<SelectionListener>,
    blocks_listener: Option<BlocksListener>,
    outbox: VecDeque<SyncEvent>,
}

impl fmt::Debug for ViewerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerSession")
            .field("active", &self.active)
            .field("status", &self.status)
            .field("highlights", &self.index.len())
            .field("sync", &self.sync)
            .field("show_all", &self.show_all)
            .finish()
    }
}

impl ViewerSession {
    /// Create a session using the system clock.
    pub fn new(config: HighlighterConfig) -> Self {
        Self::with_clock(config, SystemClock::default())
    }

    /// Create a session with a specific clock.
    pub fn with_clock(config: HighlighterConfig, clock: impl Clock + 'static) -> Self {
        Self {
            builder: HighlightBuilder::from_config(&config),
            sync: Synchronizer::new(&config),
            show_all: config.show_all_default,
            clock: Box::new(clock),
            active: None,
            issued: 0,
            finished: 0,
            status: LoadStatus::Idle,
            index: HighlightIndex::empty(),
            nudge: RenderNudge::new(),
            show_blocks_panel: true,
            layout: None,
            selection_listener: None,
            blocks_listener: None,
            outbox: VecDeque::new(),
            config,
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &HighlighterConfig {
        &self.config
    }

    /// Settings for the rendering surface.
    pub fn viewer_config(&self) -> &ViewerConfig {
        &self.config.viewer
    }

    /// Start loading a document. All highlight and selection state of the previous
    /// document is dropped immediately.
    pub fn begin_load(&mut self, document_id: &str) -> LoadTicket {
        self.issued += 1;
        let ticket = LoadTicket {
            document_id: document_id.to_string(),
            generation: self.issued,
        };
        log::info!("Loading document '{}' (load {})", document_id, ticket.generation);

        self.active = Some(ticket.clone());
        self.status = LoadStatus::Loading;
        self.index = HighlightIndex::empty();
        self.sync.clear();
        self.nudge.reset();
        self.show_all = self.config.show_all_default;
        self.notify_blocks();
        self.dispatch();
        ticket
    }

    /// Deliver the inputs of a load started with [`begin_load`](Self::begin_load).
    ///
    /// Results of a superseded load are discarded, as are repeated deliveries for a
    /// ticket that already finished. If either input failed, the session enters
    /// [`LoadStatus::Failed`] and the error is returned; no highlight is built from
    /// partial inputs.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        blocks: Result<Vec<Block>>,
        tree: Result<DocumentTree>,
    ) -> Result<LoadOutcome> {
        if ticket.generation == 0 || ticket.generation > self.issued {
            return Err(Error::UnknownLoad(ticket.document_id));
        }
        if self.active.as_ref() != Some(&ticket) {
            log::warn!(
                "Discarding results of superseded load {} for '{}'",
                ticket.generation,
                ticket.document_id
            );
            return Ok(LoadOutcome::Discarded);
        }
        if self.finished == ticket.generation {
            log::debug!(
                "Load {} for '{}' already finished; ignoring repeated results",
                ticket.generation,
                ticket.document_id
            );
            return Ok(LoadOutcome::Discarded);
        }
        self.finished = ticket.generation;

        let (mut blocks, tree) = match (blocks, tree) {
            (Ok(blocks), Ok(tree)) => (blocks, tree),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("Load of '{}' failed: {}", ticket.document_id, e);
                self.status = LoadStatus::Failed(e.to_string());
                self.notify_blocks();
                return Err(e);
            },
        };

        blocks.sort_by_key(|b| b.index);
        if blocks.len() > self.config.max_blocks {
            log::warn!(
                "Document '{}' has {} blocks; using the first {}",
                ticket.document_id,
                blocks.len(),
                self.config.max_blocks
            );
            blocks.truncate(self.config.max_blocks);
        }

        let pages = tree.page_sizes();
        self.index = HighlightIndex::new(self.builder.build(&blocks, &tree, &pages));
        let count = self.index.len();
        log::info!(
            "Document '{}': {} highlights from {} blocks on {} pages",
            ticket.document_id,
            count,
            blocks.len(),
            pages.len()
        );

        let now = self.clock.now();
        self.sync.on_index_changed(&self.index, self.layout.as_deref(), now);
        if let Some(first) = self.index.first().map(|h| h.id.clone()) {
            self.status = LoadStatus::Ready;
            self.sync
                .request(Some(first.as_str()), &self.index, self.layout.as_deref(), now)?;
            self.nudge.schedule(now, self.config.render_nudge_delay());
        } else {
            self.status = LoadStatus::Empty;
        }

        self.notify_blocks();
        self.dispatch();
        Ok(LoadOutcome::Committed { highlights: count })
    }

    /// Fetch both inputs from `source` and apply them.
    pub fn load(&mut self, source: &dyn DocumentSource, document_id: &str) -> Result<LoadOutcome> {
        let ticket = self.begin_load(document_id);
        let blocks = source.fetch_blocks(document_id);
        let tree = source.fetch_document_tree(document_id);
        self.finish_load(ticket, blocks, tree)
    }

    /// Current load status.
    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Document of the most recent load.
    pub fn active_document(&self) -> Option<&str> {
        self.active.as_ref().map(|t| t.document_id.as_str())
    }

    /// All highlights of the current document.
    pub fn highlight_index(&self) -> &HighlightIndex {
        &self.index
    }

    /// Owned copy of the current highlights in display order.
    pub fn highlights(&self) -> Vec<Highlight> {
        self.index.to_vec()
    }

    /// Highlights to draw in `mode`.
    pub fn visible_highlights(&self, mode: VisibilityMode) -> VisibleHighlights<'_> {
        VisibleHighlights {
            generation: self.nudge.generation(),
            highlights: visible(&self.index, mode, self.sync.selected_id()),
        }
    }

    /// Highlights to draw under the current "show all" toggle.
    pub fn current_visible_highlights(&self) -> VisibleHighlights<'_> {
        self.visible_highlights(self.visibility_mode())
    }

    /// Mode selected by the "show all" toggle.
    pub fn visibility_mode(&self) -> VisibilityMode {
        VisibilityMode::from_show_all(self.show_all)
    }

    /// "Show all" toggle value.
    pub fn show_all(&self) -> bool {
        self.show_all
    }

    /// Set the "show all" toggle. Reset to the configured default on every load.
    pub fn set_show_all(&mut self, show_all: bool) {
        self.show_all = show_all;
    }

    /// Whether the block list panel is shown.
    pub fn show_blocks_panel(&self) -> bool {
        self.show_blocks_panel
    }

    /// Show or hide the block list panel.
    pub fn set_show_blocks_panel(&mut self, show: bool) {
        self.show_blocks_panel = show;
    }

    /// Select a highlight, or clear the selection with `None`.
    pub fn select(&mut self, id: Option<&str>) -> Result<()> {
        let now = self.clock.now();
        let result = self.sync.request(id, &self.index, self.layout.as_deref(), now);
        self.dispatch();
        result
    }

    /// A click on a highlight box or its list row.
    pub fn click(&mut self, id: &str) -> Result<()> {
        self.select(Some(id))
    }

    /// Current selection.
    pub fn selection(&self) -> &SelectionState {
        self.sync.selection()
    }

    /// Selected highlight id.
    pub fn selected_id(&self) -> Option<&str> {
        self.sync.selected_id()
    }

    /// Synchronizer state.
    pub fn sync_state(&self) -> &SyncState {
        self.sync.state()
    }

    /// Set the single selection-change listener.
    pub fn on_selection_change(&mut self, listener: impl FnMut(Option<&str>) + 'static) {
        self.selection_listener = Some(Box::new(listener));
    }

    /// Set the single derived-blocks listener. It is called right away with the
    /// current rows and again after every load.
    pub fn on_blocks_derived(&mut self, listener: impl FnMut(&[DerivedBlock]) + 'static) {
        self.blocks_listener = Some(Box::new(listener));
        self.notify_blocks();
    }

    /// Register the surface's direct scroll capability.
    pub fn register_scroll_handler(&mut self, handler: impl ScrollHandler + 'static) -> HandlerId {
        let now = self.clock.now();
        let id = self
            .sync
            .register_scroll_handler(Box::new(handler), &self.index, self.layout.as_deref(), now);
        self.dispatch();
        id
    }

    /// Forget the scroll handler (surface unmounted).
    pub fn unregister_scroll_handler(&mut self) {
        self.sync.unregister_scroll_handler();
    }

    /// Give the session read access to the surface's rendered pages. A pending
    /// scroll is retried against the new layout.
    pub fn attach_layout(&mut self, layout: impl PageLayout + 'static) {
        self.layout = Some(Box::new(layout));
        let now = self.clock.now();
        self.sync.on_layout_changed(&self.index, self.layout.as_deref(), now);
        self.dispatch();
    }

    /// Drop the surface layout.
    pub fn detach_layout(&mut self) {
        self.layout = None;
    }

    /// The surface painted a frame. Returns whether the overlay should be redrawn
    /// because of a render nudge.
    pub fn on_paint(&mut self) -> bool {
        let nudged = self.nudge.on_paint();
        self.sync.on_paint(&self.index, self.layout.as_deref());
        self.dispatch();
        nudged
    }

    /// Run timed work that is due. Returns whether the overlay should be redrawn.
    pub fn poll(&mut self) -> bool {
        let now = self.clock.now();
        let nudged = self.nudge.poll(now);
        self.sync.poll(&self.index, self.layout.as_deref(), now);
        self.dispatch();
        nudged
    }

    /// Take the selection and scroll events produced so far.
    ///
    /// Embedders that only use the listeners may never call this; the queue keeps
    /// the newest [`MAX_QUEUED_EVENTS`] events.
    pub fn drain_events(&mut self) -> Vec<SyncEvent> {
        self.outbox.drain(..).collect()
    }

    fn notify_blocks(&mut self) {
        if let Some(listener) = self.blocks_listener.as_mut() {
            listener(&self.index.derived_blocks());
        }
    }

    fn dispatch(&mut self) {
        for event in self.sync.drain_events() {
            if let SyncEvent::SelectionChanged(id) = &event {
                if let Some(listener) = self.selection_listener.as_mut() {
                    listener(id.as_deref());
                }
            }
            if self.outbox.len() == MAX_QUEUED_EVENTS {
                if let Some(dropped) = self.outbox.pop_front() {
                    log::debug!("Event queue full; dropping {:?}", dropped);
                }
            }
            self.outbox.push_back(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ManualClock;
    use serde_json::json;

    fn tree() -> DocumentTree {
        DocumentTree::from_value(json!({
            "pages": {"1": {"size": {"width": 600, "height": 800}}},
            "texts": [
                {"prov": [{"page_no": 1, "bbox": {"l": 50, "t": 700, "r": 550, "b": 650}}]},
                {"prov": [{"page_no": 1, "bbox": {"l": 50, "t": 600, "r": 550, "b": 550}}]}
            ]
        }))
    }

    fn blocks() -> Vec<Block> {
        vec![
            Block::tree_pointer("a", 0, "heading", "#/texts/0", "Title"),
            Block::tree_pointer("b", 1, "paragraph", "#/texts/1", "Body"),
        ]
    }

    fn session() -> ViewerSession {
        ViewerSession::with_clock(HighlighterConfig::default(), ManualClock::new())
    }

    #[test]
    fn test_load_selects_first_highlight() {
        let mut s = session();
        let ticket = s.begin_load("doc");
        assert_eq!(s.status(), &LoadStatus::Loading);
        let outcome = s.finish_load(ticket, Ok(blocks()), Ok(tree())).unwrap();
        assert_eq!(outcome, LoadOutcome::Committed { highlights: 2 });
        assert_eq!(s.status(), &LoadStatus::Ready);
        assert_eq!(s.selected_id(), Some("a:p1"));
        assert_eq!(s.active_document(), Some("doc"));
    }

    #[test]
    fn test_stale_load_discarded() {
        let mut s = session();
        let old = s.begin_load("old");
        let new = s.begin_load("new");
        assert_eq!(s.finish_load(old, Ok(blocks()), Ok(tree())).unwrap(), LoadOutcome::Discarded);
        assert!(s.highlight_index().is_empty());
        assert_eq!(s.status(), &LoadStatus::Loading);
        s.finish_load(new, Ok(blocks()), Ok(tree())).unwrap();
        assert_eq!(s.highlight_index().len(), 2);
    }

    #[test]
    fn test_forged_ticket_rejected() {
        let mut s = session();
        let forged = LoadTicket {
            document_id: "x".to_string(),
            generation: 7,
        };
        assert!(matches!(
            s.finish_load(forged, Ok(vec![]), Ok(tree())),
            Err(Error::UnknownLoad(_))
        ));
    }

    #[test]
    fn test_failed_input_blocks_view() {
        let mut s = session();
        let ticket = s.begin_load("doc");
        let err = s
            .finish_load(
                ticket,
                Ok(blocks()),
                Err(Error::TreeFetch {
                    document_id: "doc".to_string(),
                    reason: "HTTP 500".to_string(),
                }),
            )
            .unwrap_err();
        assert!(err.is_load_error());
        assert!(matches!(s.status(), LoadStatus::Failed(msg) if msg.contains("HTTP 500")));
        assert!(s.highlight_index().is_empty());
    }

    #[test]
    fn test_repeated_delivery_is_discarded() {
        let mut s = session();
        let ticket = s.begin_load("doc");
        s.finish_load(ticket.clone(), Ok(blocks()), Ok(tree())).unwrap();
        s.select(Some("b:p1")).unwrap();

        let again = s.finish_load(ticket.clone(), Ok(blocks()), Ok(tree())).unwrap();
        assert_eq!(again, LoadOutcome::Discarded);
        assert_eq!(s.selected_id(), Some("b:p1"));
        assert_eq!(s.active_document(), Some("doc"));

        let failed = s.finish_load(
            ticket,
            Err(Error::BlockFetch {
                document_id: "doc".to_string(),
                reason: "gone".to_string(),
            }),
            Ok(tree()),
        );
        assert_eq!(failed.unwrap(), LoadOutcome::Discarded);
        assert_eq!(s.status(), &LoadStatus::Ready);
    }

    #[test]
    fn test_failed_ticket_cannot_commit_later() {
        let mut s = session();
        let ticket = s.begin_load("doc");
        let tree_error = Error::TreeFetch {
            document_id: "doc".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(s.finish_load(ticket.clone(), Ok(blocks()), Err(tree_error)).is_err());
        assert_eq!(
            s.finish_load(ticket, Ok(blocks()), Ok(tree())).unwrap(),
            LoadOutcome::Discarded
        );
        assert!(s.highlights().is_empty());
        assert!(matches!(s.status(), LoadStatus::Failed(_)));
    }

    #[test]
    fn test_highlights_in_display_order() {
        let mut s = session();
        assert!(s.highlights().is_empty());
        s.load_for_test();
        let ids: Vec<String> = s.highlights().into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["a:p1".to_string(), "b:p1".to_string()]);
    }

    #[test]
    fn test_event_queue_keeps_newest() {
        let mut s = session();
        s.load_for_test();
        for i in 0..MAX_QUEUED_EVENTS + 50 {
            let id = if i % 2 == 0 { "b:p1" } else { "a:p1" };
            s.select(Some(id)).unwrap();
        }

        let events = s.drain_events();
        assert_eq!(events.len(), MAX_QUEUED_EVENTS);
        assert_eq!(events.last(), Some(&SyncEvent::SelectionChanged(Some("a:p1".to_string()))));
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_empty_document() {
        let mut s = session();
        let ticket = s.begin_load("doc");
        let unplaceable = vec![Block::tree_pointer("z", 0, "text", "#/texts/99", "")];
        s.finish_load(ticket, Ok(unplaceable), Ok(tree())).unwrap();
        assert_eq!(s.status(), &LoadStatus::Empty);
        assert_eq!(s.status().message(), Some(EMPTY_DOCUMENT_MESSAGE));
        assert_eq!(s.selected_id(), None);
    }

    #[test]
    fn test_show_all_resets_per_load() {
        let mut s = session();
        s.load_for_test();
        s.set_show_all(false);
        assert_eq!(s.current_visible_highlights().highlights.len(), 1);
        s.load_for_test();
        assert!(s.show_all());
        assert_eq!(s.current_visible_highlights().highlights.len(), 2);
    }

    #[test]
    fn test_block_cap() {
        let config = HighlighterConfig::default().with_max_blocks(1);
        let mut s = ViewerSession::with_clock(config, ManualClock::new());
        let ticket = s.begin_load("doc");
        s.finish_load(ticket, Ok(blocks()), Ok(tree())).unwrap();
        assert_eq!(s.highlight_index().len(), 1);
    }

    impl ViewerSession {
        fn load_for_test(&mut self) {
            let ticket = self.begin_load("doc");
            self.finish_load(ticket, Ok(blocks()), Ok(tree())).unwrap();
        }
    }
}
