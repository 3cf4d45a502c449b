//! Selection and scroll synchronization.
//!
//! The [`Synchronizer`] keeps "which highlight is selected" and "where the viewer is
//! scrolled" consistent. Selection changes schedule a bounded set of scroll attempts;
//! attempts use the surface's registered scroll handler when there is one and the
//! [`FallbackEstimator`] otherwise. Results are reported as [`SyncEvent`]s that the
//! embedder drains.
//!
//! Scrolling is best effort: a request that cannot be carried out stays pending and
//! is retried on the next index change, handler registration or layout change.

use crate::config::HighlighterConfig;
use crate::error::{Error, Result};
use crate::highlight::HighlightIndex;
use crate::surface::{HandlerId, PageLayout, ScrollHandler};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

pub mod fallback;
pub mod retry;

pub use fallback::{FallbackEstimator, ScrollEstimate};
pub use retry::{AttemptTrigger, RetryQueue, Wake};

/// Synchronizer state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Nothing selected
    #[default]
    Idle,
    /// A scroll to this highlight has been requested and not yet carried out
    ScrollRequested(String),
    /// The selected highlight has been scrolled to
    Settled,
}

/// Current selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    /// Selected highlight
    pub selected_highlight_id: Option<String>,
    /// Highlight still waiting to be scrolled to
    pub pending_scroll_highlight_id: Option<String>,
}

/// How a scroll was carried out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollTarget {
    /// The registered handler scrolled to the highlight's element
    Direct,
    /// The embedder should scroll its container to this offset
    Offset(ScrollEstimate),
}

/// Notifications for the embedder.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The selected highlight changed
    SelectionChanged(Option<String>),
    /// A scroll was performed or must be applied
    ScrollRequested {
        /// Highlight scrolled to
        highlight_id: String,
        /// How
        target: ScrollTarget,
    },
}

struct RegisteredHandler {
    id: HandlerId,
    handler: Box<dyn ScrollHandler>,
}

/// Selection/scroll state machine.
pub struct Synchronizer {
    state: SyncState,
    selection: SelectionState,
    retries: RetryQueue,
    retry_delay: Duration,
    estimator: FallbackEstimator,
    handler: Option<RegisteredHandler>,
    next_handler_id: u64,
    events: VecDeque<SyncEvent>,
}

impl fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synchronizer")
            .field("state", &self.state)
            .field("selection", &self.selection)
            .field("retries", &self.retries)
            .field("handler", &self.handler.as_ref().map(|h| h.id))
            .field("events", &self.events.len())
            .finish()
    }
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new(&HighlighterConfig::default())
    }
}

impl Synchronizer {
    /// Create a synchronizer.
    pub fn new(config: &HighlighterConfig) -> Self {
        Self {
            state: SyncState::Idle,
            selection: SelectionState::default(),
            retries: RetryQueue::new(),
            retry_delay: config.retry_delay(),
            estimator: FallbackEstimator::from_config(config),
            handler: None,
            next_handler_id: 0,
            events: VecDeque::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Current selection.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Selected highlight id.
    pub fn selected_id(&self) -> Option<&str> {
        self.selection.selected_highlight_id.as_deref()
    }

    /// Highlight id still waiting for a scroll.
    pub fn pending_id(&self) -> Option<&str> {
        self.selection.pending_scroll_highlight_id.as_deref()
    }

    /// Scheduled attempts not yet run.
    pub fn remaining_attempts(&self) -> usize {
        self.retries.remaining()
    }

    /// Currently registered handler.
    pub fn handler_id(&self) -> Option<HandlerId> {
        self.handler.as_ref().map(|h| h.id)
    }

    /// Select a highlight (or clear the selection with `None`) and scroll to it.
    ///
    /// An id that is not in `index` is rejected and the selection is left unchanged.
    pub fn request(
        &mut self,
        id: Option<&str>,
        index: &HighlightIndex,
        layout: Option<&dyn PageLayout>,
        now: Duration,
    ) -> Result<()> {
        let Some(id) = id else {
            self.clear();
            return Ok(());
        };
        if !index.contains(id) {
            return Err(Error::UnknownHighlight(id.to_string()));
        }

        if self.selected_id() != Some(id) {
            self.events.push_back(SyncEvent::SelectionChanged(Some(id.to_string())));
        }
        self.selection.selected_highlight_id = Some(id.to_string());
        self.selection.pending_scroll_highlight_id = Some(id.to_string());
        self.state = SyncState::ScrollRequested(id.to_string());
        self.retries.schedule(id, now, self.retry_delay);
        self.pump(Wake::Now, index, layout);
        Ok(())
    }

    /// A click on a highlight box or its list row.
    pub fn click(
        &mut self,
        id: &str,
        index: &HighlightIndex,
        layout: Option<&dyn PageLayout>,
        now: Duration,
    ) -> Result<()> {
        self.request(Some(id), index, layout, now)
    }

    /// Clear the selection and any pending scroll.
    pub fn clear(&mut self) {
        if self.selection.selected_highlight_id.is_some() {
            self.events.push_back(SyncEvent::SelectionChanged(None));
        }
        self.selection = SelectionState::default();
        self.retries.clear();
        self.state = SyncState::Idle;
    }

    /// React to a rebuilt highlight index: drop a selection that no longer exists and
    /// retry a pending scroll whose target is present.
    pub fn on_index_changed(&mut self, index: &HighlightIndex, layout: Option<&dyn PageLayout>, now: Duration) {
        if let Some(selected) = self.selected_id() {
            if !index.contains(selected) {
                log::debug!("Selected highlight '{}' no longer exists", selected);
                self.clear();
                return;
            }
        }
        self.retry_pending(index, layout, now);
    }

    /// Register the surface's direct scroll capability, replacing any earlier one.
    /// A new handler restarts the attempts for a pending scroll.
    pub fn register_scroll_handler(
        &mut self,
        handler: Box<dyn ScrollHandler>,
        index: &HighlightIndex,
        layout: Option<&dyn PageLayout>,
        now: Duration,
    ) -> HandlerId {
        self.next_handler_id += 1;
        let id = HandlerId(self.next_handler_id);
        self.handler = Some(RegisteredHandler { id, handler });
        log::debug!("Registered scroll handler {:?}", id);
        self.retry_pending(index, layout, now);
        id
    }

    /// React to the surface's page layout appearing or changing. A pending scroll
    /// gets a fresh set of attempts against the new layout.
    pub fn on_layout_changed(&mut self, index: &HighlightIndex, layout: Option<&dyn PageLayout>, now: Duration) {
        self.retry_pending(index, layout, now);
    }

    /// Remove the scroll handler (surface unmounted).
    pub fn unregister_scroll_handler(&mut self) {
        self.handler = None;
    }

    /// Run attempts due at the next paint.
    pub fn on_paint(&mut self, index: &HighlightIndex, layout: Option<&dyn PageLayout>) {
        self.pump(Wake::Paint, index, layout);
    }

    /// Run timed attempts that are due at `now`.
    pub fn poll(&mut self, index: &HighlightIndex, layout: Option<&dyn PageLayout>, now: Duration) {
        self.pump(Wake::Tick(now), index, layout);
    }

    /// Take the events produced so far.
    pub fn drain_events(&mut self) -> Vec<SyncEvent> {
        self.events.drain(..).collect()
    }

    fn retry_pending(&mut self, index: &HighlightIndex, layout: Option<&dyn PageLayout>, now: Duration) {
        let Some(pending) = self.selection.pending_scroll_highlight_id.clone() else {
            return;
        };
        if !index.contains(&pending) {
            return;
        }
        self.state = SyncState::ScrollRequested(pending.clone());
        self.retries.schedule(&pending, now, self.retry_delay);
        self.pump(Wake::Now, index, layout);
    }

    fn pump(&mut self, wake: Wake, index: &HighlightIndex, layout: Option<&dyn PageLayout>) {
        if let Some(target) = self.retries.take_due(wake) {
            self.attempt(&target, index, layout);
        }
    }

    fn attempt(&mut self, target: &str, index: &HighlightIndex, layout: Option<&dyn PageLayout>) {
        if self.pending_id() != Some(target) {
            return;
        }
        let Some(highlight) = index.get(target) else {
            return;
        };

        if let Some(registered) = self.handler.as_mut() {
            if registered.handler.scroll_to(highlight) {
                self.events.push_back(SyncEvent::ScrollRequested {
                    highlight_id: target.to_string(),
                    target: ScrollTarget::Direct,
                });
                self.settle();
            } else {
                log::debug!(
                    "Scroll handler {:?} could not reach '{}' ({} attempts left)",
                    registered.id,
                    target,
                    self.retries.remaining()
                );
            }
            return;
        }

        let Some(layout) = layout else {
            log::debug!("No surface mounted; scroll to '{}' stays pending", target);
            return;
        };
        let estimate = self.estimator.estimate(highlight, layout);
        self.events.push_back(SyncEvent::ScrollRequested {
            highlight_id: target.to_string(),
            target: ScrollTarget::Offset(estimate),
        });
        if estimate.is_located() {
            self.settle();
        }
    }

    fn settle(&mut self) {
        self.selection.pending_scroll_highlight_id = None;
        self.retries.clear();
        self.state = SyncState::Settled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::index::tests::highlight;
    use crate::highlight::Highlight;
    use crate::surface::{PageBox, RenderedPages};
    use std::cell::RefCell;
    use std::rc::Rc;

    const T0: Duration = Duration::ZERO;

    fn index() -> HighlightIndex {
        HighlightIndex::new(vec![highlight("a", 0, 1), highlight("b", 1, 2)])
    }

    #[test]
    fn test_request_without_surface_stays_pending() {
        let idx = index();
        let mut sync = Synchronizer::default();
        sync.request(Some("b:p2"), &idx, None, T0).unwrap();

        assert_eq!(sync.selected_id(), Some("b:p2"));
        assert_eq!(sync.pending_id(), Some("b:p2"));
        assert_eq!(sync.state(), &SyncState::ScrollRequested("b:p2".to_string()));
        assert_eq!(
            sync.drain_events(),
            vec![SyncEvent::SelectionChanged(Some("b:p2".to_string()))]
        );
    }

    #[test]
    fn test_unknown_id_rejected() {
        let idx = index();
        let mut sync = Synchronizer::default();
        sync.request(Some("a:p1"), &idx, None, T0).unwrap();
        let err = sync.request(Some("zzz"), &idx, None, T0).unwrap_err();
        assert!(matches!(err, Error::UnknownHighlight(_)));
        assert_eq!(sync.selected_id(), Some("a:p1"));
    }

    #[test]
    fn test_null_request_clears() {
        let idx = index();
        let mut sync = Synchronizer::default();
        sync.request(Some("a:p1"), &idx, None, T0).unwrap();
        sync.request(None, &idx, None, T0).unwrap();
        assert_eq!(sync.selection(), &SelectionState::default());
        assert_eq!(sync.state(), &SyncState::Idle);
        assert_eq!(sync.remaining_attempts(), 0);
    }

    #[test]
    fn test_direct_handler_settles() {
        let idx = index();
        let mut sync = Synchronizer::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        sync.register_scroll_handler(
            Box::new(move |h: &Highlight| {
                sink.borrow_mut().push(h.id.clone());
                true
            }),
            &idx,
            None,
            T0,
        );

        sync.click("a:p1", &idx, None, T0).unwrap();
        assert_eq!(sync.state(), &SyncState::Settled);
        assert_eq!(sync.pending_id(), None);
        assert_eq!(sync.selected_id(), Some("a:p1"));
        assert_eq!(*seen.borrow(), vec!["a:p1".to_string()]);
        assert_eq!(sync.remaining_attempts(), 0);
    }

    #[test]
    fn test_direct_handler_retries_are_bounded() {
        let idx = index();
        let mut sync = Synchronizer::default();
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        sync.register_scroll_handler(
            Box::new(move |_: &Highlight| {
                *counter.borrow_mut() += 1;
                false
            }),
            &idx,
            None,
            T0,
        );

        sync.request(Some("a:p1"), &idx, None, T0).unwrap();
        sync.on_paint(&idx, None);
        sync.poll(&idx, None, Duration::from_millis(139));
        sync.poll(&idx, None, Duration::from_millis(140));
        sync.poll(&idx, None, Duration::from_secs(10));
        sync.on_paint(&idx, None);

        assert_eq!(*calls.borrow(), 3);
        assert_eq!(sync.pending_id(), Some("a:p1"));
        assert_eq!(sync.remaining_attempts(), 0);
    }

    #[test]
    fn test_fallback_located_settles() {
        let idx = index();
        let mut sync = Synchronizer::default();
        let layout = RenderedPages::uniform(2, 800.0, 10.0);
        sync.request(Some("b:p2"), &idx, Some(&layout), T0).unwrap();

        assert_eq!(sync.state(), &SyncState::Settled);
        let events = sync.drain_events();
        assert!(matches!(
            events.last(),
            Some(SyncEvent::ScrollRequested {
                target: ScrollTarget::Offset(ScrollEstimate::Located(_)),
                ..
            })
        ));
    }

    #[test]
    fn test_fallback_estimate_keeps_pending() {
        let idx = index();
        let mut sync = Synchronizer::default();
        let layout = RenderedPages::new(vec![PageBox::new(1, 0.0, 800.0)]);
        sync.request(Some("b:p2"), &idx, Some(&layout), T0).unwrap();

        assert_eq!(sync.pending_id(), Some("b:p2"));
        let events = sync.drain_events();
        assert_eq!(
            events.last(),
            Some(&SyncEvent::ScrollRequested {
                highlight_id: "b:p2".to_string(),
                target: ScrollTarget::Offset(ScrollEstimate::Approximate(812.0)),
            })
        );

        let full = RenderedPages::uniform(2, 800.0, 12.0);
        sync.on_paint(&idx, Some(&full));
        assert_eq!(sync.state(), &SyncState::Settled);
    }

    #[test]
    fn test_new_handler_retries_pending() {
        let idx = index();
        let mut sync = Synchronizer::default();
        sync.request(Some("a:p1"), &idx, None, T0).unwrap();
        sync.on_paint(&idx, None);
        sync.poll(&idx, None, Duration::from_secs(1));
        assert_eq!(sync.remaining_attempts(), 0);

        let first = sync.register_scroll_handler(Box::new(|_: &Highlight| false), &idx, None, T0);
        let second = sync.register_scroll_handler(Box::new(|_: &Highlight| true), &idx, None, T0);
        assert_ne!(first, second);
        assert_eq!(sync.handler_id(), Some(second));
        assert_eq!(sync.state(), &SyncState::Settled);
    }

    #[test]
    fn test_index_change_drops_stale_selection() {
        let mut sync = Synchronizer::default();
        sync.request(Some("a:p1"), &index(), None, T0).unwrap();
        sync.drain_events();

        let rebuilt = HighlightIndex::new(vec![highlight("b", 1, 2)]);
        sync.on_index_changed(&rebuilt, None, T0);
        assert_eq!(sync.selected_id(), None);
        assert_eq!(sync.pending_id(), None);
        assert_eq!(sync.drain_events(), vec![SyncEvent::SelectionChanged(None)]);
    }

    #[test]
    fn test_index_change_retries_pending() {
        let idx = index();
        let mut sync = Synchronizer::default();
        sync.request(Some("a:p1"), &idx, None, T0).unwrap();
        let layout = RenderedPages::uniform(2, 800.0, 10.0);
        sync.on_index_changed(&idx, Some(&layout), Duration::from_secs(2));
        assert_eq!(sync.state(), &SyncState::Settled);
    }

    #[test]
    fn test_layout_change_retries_exhausted_scroll() {
        let idx = index();
        let mut sync = Synchronizer::default();
        sync.request(Some("b:p2"), &idx, None, T0).unwrap();
        sync.on_paint(&idx, None);
        sync.poll(&idx, None, Duration::from_millis(200));
        assert_eq!(sync.remaining_attempts(), 0);
        sync.drain_events();

        let layout = RenderedPages::uniform(2, 800.0, 10.0);
        sync.on_paint(&idx, Some(&layout));
        assert_eq!(sync.pending_id(), Some("b:p2"));

        sync.on_layout_changed(&idx, Some(&layout), Duration::from_millis(300));
        assert_eq!(sync.state(), &SyncState::Settled);
        assert_eq!(sync.pending_id(), None);
        assert!(matches!(
            sync.drain_events().last(),
            Some(SyncEvent::ScrollRequested {
                target: ScrollTarget::Offset(ScrollEstimate::Located(_)),
                ..
            })
        ));
    }
}
