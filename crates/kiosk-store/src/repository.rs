use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, trace};

use kiosk_core::ProductEvent;

/// Ordered store of received product events.
///
/// Events are kept newest-first. `current` is the event the display shows;
/// after [`add_event`](Self::add_event) it is the very same `Arc` as the head
/// of the sequence, so identity can be checked with [`Arc::ptr_eq`].
///
/// Every effective mutation bumps a revision number published on a
/// [`watch`] channel.
///
/// The sequence is never pruned: duplicate detection needs every tag seen
/// since startup. Memory and [`find_by_epc`](Self::find_by_epc) lookups grow
/// linearly with the number of distinct tags seen.
///
/// # Thread Safety
///
/// Mutation takes `&mut self`. The kiosk keeps the repository inside a
/// single actor task, so no locking is involved.
#[derive(Debug)]
pub struct ProductRepository {
    products: VecDeque<Arc<ProductEvent>>,
    current: Option<Arc<ProductEvent>>,
    revision: watch::Sender<u64>,
}

impl ProductRepository {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            products: VecDeque::new(),
            current: None,
            revision,
        }
    }

    /// Prepend `event` and make it current.
    ///
    /// No deduplication happens here; callers decide whether an event is new.
    pub fn add_event(&mut self, event: ProductEvent) -> Arc<ProductEvent> {
        let event = Arc::new(event);
        debug!(
            product_id = %event.product.id,
            epc = %event.product.epc,
            total = self.products.len() + 1,
            "product event added"
        );
        self.products.push_front(Arc::clone(&event));
        self.current = Some(Arc::clone(&event));
        self.notify();
        event
    }

    /// Assign `operator` to every event whose product id is `product_id`.
    ///
    /// Matching entries are replaced by new entries with the operator set and
    /// status forced to `success`. If the current event matches it is
    /// replaced too, sharing the new list entry when it was one. Returns the
    /// number of list entries replaced; no match is not an error.
    pub fn update_operator(&mut self, product_id: &str, operator: &str) -> usize {
        let replaced = self.replace_operator(operator, |event| event.product.id == product_id);
        if replaced == 0 {
            trace!(%product_id, "operator update matched nothing");
        } else {
            debug!(%product_id, %operator, replaced, "operator updated");
        }
        replaced
    }

    /// Assign `operator` to the event carrying tag identifier `epc`.
    ///
    /// Same replacement rules as [`update_operator`](Self::update_operator),
    /// but keyed on the tag, so events of other tags sharing a product id are
    /// left alone. An empty `epc` matches nothing.
    pub fn update_operator_by_epc(&mut self, epc: &str, operator: &str) -> usize {
        if epc.is_empty() {
            return 0;
        }
        let replaced = self.replace_operator(operator, |event| event.product.epc == epc);
        if replaced == 0 {
            trace!(%epc, "operator update matched nothing");
        } else {
            debug!(%epc, %operator, replaced, "operator updated");
        }
        replaced
    }

    fn replace_operator(
        &mut self,
        operator: &str,
        matches: impl Fn(&ProductEvent) -> bool,
    ) -> usize {
        let mut replaced = 0;
        let mut new_current = None;

        for entry in self.products.iter_mut() {
            if !matches(&**entry) {
                continue;
            }
            let updated = Arc::new(entry.with_operator(operator));
            if self
                .current
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, entry))
            {
                new_current = Some(Arc::clone(&updated));
            }
            *entry = updated;
            replaced += 1;
        }

        if new_current.is_none() {
            new_current = self
                .current
                .as_ref()
                .filter(|current| matches(&***current))
                .map(|current| Arc::new(current.with_operator(operator)));
        }

        let current_changed = new_current.is_some();
        if let Some(current) = new_current {
            self.current = Some(current);
        }

        if replaced > 0 || current_changed {
            self.notify();
        }
        replaced
    }

    /// Replace the current event reference.
    pub fn set_current(&mut self, event: Option<Arc<ProductEvent>>) {
        self.current = event;
        self.notify();
    }

    /// Event currently selected for display.
    pub fn current(&self) -> Option<&Arc<ProductEvent>> {
        self.current.as_ref()
    }

    /// All events, newest first.
    pub fn products(&self) -> impl ExactSizeIterator<Item = &Arc<ProductEvent>> {
        self.products.iter()
    }

    /// Event at `index` (0 is the newest).
    pub fn get(&self, index: usize) -> Option<&Arc<ProductEvent>> {
        self.products.get(index)
    }

    /// Newest event whose product carries tag identifier `epc`.
    pub fn find_by_epc(&self, epc: &str) -> Option<&Arc<ProductEvent>> {
        self.products.iter().find(|event| event.product.epc == epc)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Revision number, bumped on every effective mutation.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Follow repository changes.
    ///
    /// The kiosk actor holds one receiver and only inspects `current` when
    /// the revision moved.
    ///
    /// The receiver yields the latest revision; intermediate revisions may be
    /// skipped if the observer falls behind.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

impl Default for ProductRepository {
    fn default() -> Self {
        Self::new()
    }
}
