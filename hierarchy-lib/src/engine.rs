//! The tree engine
//!
//! [`TreeEngine`] owns the visible tree, the selection and the bookkeeping
//! of outstanding requests. It performs no I/O: every operation that needs
//! the backend queues a [`ServiceCall`] (collected with
//! [`TreeEngine::take_calls`]) and the results are handed back through
//! [`TreeEngine::deliver`]. [`TreeDriver`](crate::driver::TreeDriver) does
//! this against a [`RemoteTreeService`](crate::service::RemoteTreeService);
//! tests do it by hand to replay any interleaving of replies.
//!
//! # Example
//!
//! ```
//! use hierarchy_lib::config::TreeConfig;
//! use hierarchy_lib::engine::{ServiceCall, ServiceReply, TreeEngine};
//! use hierarchy_lib::model::{ListResponse, Record};
//!
//! let mut engine = TreeEngine::new(TreeConfig::new("file").with_root_node("root").with_leaves(false));
//!
//! let calls = engine.take_calls();
//! let ServiceCall::List { id, .. } = &calls[0] else { unreachable!() };
//!
//! let page = ListResponse::new(vec![Record::new().set("key", "a").set("parententry", "root")]);
//! engine.deliver(ServiceReply::List { id: *id, result: Ok(page) });
//!
//! assert_eq!(engine.roots()[0].key, "a");
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::breadcrumb::BreadcrumbBuilder;
use crate::breadcrumb::PathSegment;
use crate::config::ModuleRegistry;
use crate::config::TreeConfig;
use crate::config::TreeVariant;
use crate::dropzone;
use crate::dropzone::DragPayload;
use crate::dropzone::DropZone;
use crate::dropzone::DropZoneClassifier;
use crate::dropzone::Point;
use crate::dropzone::Rect;
use crate::error::ServiceError;
use crate::i18n::NoTranslation;
use crate::i18n::Translate;
use crate::model::ListResponse;
use crate::model::Record;
use crate::model::SkelType;
use crate::node;
use crate::node::Description;
use crate::node::TreeNode;
use crate::service::ListParams;
use crate::service::MoveRequest;
use crate::service::Params;
use crate::tracker::PendingRequest;
use crate::tracker::RequestId;
use crate::tracker::RequestTracker;

const ACCESS_DENIED: &str = "Access denied!";
const GENERIC_FAILURE: &str = "Error {code} occurred!";

const TREE_ACTIONS: [&str; 10] = [
    "selectrootnode",
    "add",
    "add.node",
    "add.leaf",
    "edit",
    "clone",
    "delete",
    "|",
    "listview",
    "reload",
];
const SELECTOR_ACTIONS: [&str; 3] = ["select", "close", "|"];

/// Sender half of an event subscription.
pub type EventSender = mpsc::UnboundedSender<TreeEvent>;

/// Receiver half of an event subscription.
pub type EventReceiver = mpsc::UnboundedReceiver<TreeEvent>;

/// Receives the selected records when a selector is confirmed.
pub type SelectorCallback = Box<dyn FnOnce(Vec<Record>) + Send>;

/// A request the engine wants performed.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    /// `list/<kind>`; reply with [`ServiceReply::List`].
    List {
        id: RequestId,
        kind: SkelType,
        params: ListParams,
    },
    /// `listRootNodes`; reply with [`ServiceReply::RootNodes`].
    ListRootNodes { generation: u64, context: Params },
    /// `view/node/<key>`; reply with [`ServiceReply::View`].
    View { generation: u64, key: String },
    /// `move`; reply with [`ServiceReply::Moved`].
    Move(MoveRequest),
}

/// The outcome of a [`ServiceCall`].
#[derive(Debug)]
pub enum ServiceReply {
    List {
        id: RequestId,
        result: Result<ListResponse, ServiceError>,
    },
    RootNodes {
        generation: u64,
        result: Result<Vec<Record>, ServiceError>,
    },
    View {
        generation: u64,
        result: Result<Record, ServiceError>,
    },
    Moved {
        key: String,
        result: Result<(), ServiceError>,
    },
}

/// What replaces the tree after a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPlaceholder {
    /// The backend refused access (401/403).
    AccessDenied { message: String },
    /// Any other failure; `code` is the HTTP status when there was one.
    Generic { code: Option<u16>, message: String },
}

impl ErrorPlaceholder {
    /// The translated message.
    pub fn message(&self) -> &str {
        match self {
            Self::AccessDenied { message } | Self::Generic { message, .. } => message,
        }
    }

    /// The failure code, if known.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::AccessDenied { .. } => None,
            Self::Generic { code, .. } => *code,
        }
    }
}

/// Change notifications for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEvent {
    /// The root changed; the tree is being rebuilt.
    RootChanged(String),
    /// The viewed subtree changed.
    NodeChanged(String),
    /// Children were merged under `parent`.
    ChildrenChanged { parent: String },
    /// Selection keys, in selection order.
    SelectionChanged(Vec<String>),
    /// The selection was activated outside selector mode.
    SelectionActivated(Vec<Record>),
    /// The selector returned its selection and closed.
    SelectorClosed,
    /// The breadcrumb was completed; labels root first.
    PathChanged(Vec<String>),
    /// A fetch failed and the tree was replaced by a placeholder.
    Failed(ErrorPlaceholder),
    /// A move was accepted by the backend.
    Moved { key: String },
    /// A move was rejected by the backend.
    MoveFailed { key: String, message: String },
}

/// Orchestrates loading, merging, expansion, selection and drag-and-drop.
pub struct TreeEngine {
    config: TreeConfig,
    registry: Option<Arc<dyn ModuleRegistry>>,
    translator: Arc<dyn Translate>,

    root_node: Option<String>,
    node: Option<String>,
    roots: Vec<TreeNode>,
    failure: Option<ErrorPlaceholder>,

    tracker: RequestTracker,
    expanded_keys: HashSet<String>,
    root_lookup: u64,

    selection: Vec<String>,
    modifier: bool,
    multi_select: bool,
    allowed: Option<SkelType>,
    selector: Option<SelectorCallback>,

    dropzone: DropZoneClassifier,
    breadcrumb: Option<BreadcrumbBuilder>,

    outbox: Vec<ServiceCall>,
    subscribers: Vec<EventSender>,
}

impl TreeEngine {
    /// Creates an engine and queues the initial load.
    ///
    /// With a configured root the root's children are requested right away;
    /// otherwise `listRootNodes` is asked for a default root first.
    pub fn new(config: TreeConfig) -> Self {
        let breadcrumb = match config.variant {
            TreeVariant::Browser => Some(BreadcrumbBuilder::new(config.root_node.clone().unwrap_or_default())),
            TreeVariant::Tree => None,
        };

        let mut engine = Self {
            root_node: config.root_node.clone(),
            node: config.node.clone().or_else(|| config.root_node.clone()),
            roots: Vec::new(),
            failure: None,
            tracker: RequestTracker::new(),
            expanded_keys: HashSet::new(),
            root_lookup: 0,
            selection: Vec::new(),
            modifier: false,
            multi_select: config.multi_select,
            allowed: None,
            selector: None,
            dropzone: DropZoneClassifier::new(config.drag.clone()),
            breadcrumb,
            outbox: Vec::new(),
            subscribers: Vec::new(),
            registry: None,
            translator: Arc::new(NoTranslation),
            config,
        };

        if engine.root_node.is_some() {
            engine.reload_data();
        } else {
            engine.request_root_nodes();
        }
        engine
    }

    /// Attaches the module registry consulted for change notifications
    /// and display formats.
    pub fn with_registry(mut self, registry: Arc<dyn ModuleRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the translator for user-facing messages.
    pub fn with_translator(mut self, translator: Arc<dyn Translate>) -> Self {
        self.translator = translator;
        self
    }

    /// Registers a new event subscriber.
    ///
    /// Closed receivers are dropped on the next emitted event.
    pub fn subscribe(&mut self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    // =========================================================================
    // I/O boundary
    // =========================================================================

    /// Drains the queued service calls.
    pub fn take_calls(&mut self) -> Vec<ServiceCall> {
        std::mem::take(&mut self.outbox)
    }

    /// Returns `true` if calls are waiting to be taken.
    pub fn has_calls(&self) -> bool {
        !self.outbox.is_empty()
    }

    /// Hands the outcome of a service call to the engine.
    pub fn deliver(&mut self, reply: ServiceReply) {
        match reply {
            ServiceReply::List { id, result } => {
                let Some(request) = self.tracker.resolve(id) else {
                    log::debug!("[TreeEngine::deliver] dropping stale reply {}", id);
                    return;
                };
                match result {
                    Ok(page) => self.apply_page(request, page),
                    Err(e) => self.fail(e),
                }
            }
            ServiceReply::RootNodes { generation, result } => {
                if generation != self.root_lookup || self.root_node.is_some() {
                    log::debug!("[TreeEngine::deliver] dropping stale root node list");
                    return;
                }
                match result {
                    Ok(records) => self.apply_root_nodes(records),
                    Err(e) => self.fail(e),
                }
            }
            ServiceReply::View { generation, result } => self.apply_path_record(generation, result),
            ServiceReply::Moved { key, result } => match result {
                Ok(()) => {
                    log::debug!("[TreeEngine::deliver] move of {} confirmed", key);
                    self.emit(TreeEvent::Moved { key });
                }
                Err(e) => {
                    log::error!("[TreeEngine::deliver] move of {} failed: {}", key, e);
                    self.emit(TreeEvent::MoveFailed {
                        key,
                        message: e.to_string(),
                    });
                }
            },
        }
    }

    // =========================================================================
    // Root and loading
    // =========================================================================

    /// Replaces the root (and optionally the viewed node) and rebuilds the
    /// tree from scratch.
    pub fn set_root_node(&mut self, root: impl Into<String>, node: Option<String>) {
        let root = root.into();
        log::debug!("[TreeEngine::set_root_node] root={} node={:?}", root, node);

        self.root_node = Some(root.clone());
        self.node = Some(node.clone().unwrap_or_else(|| root.clone()));
        self.root_lookup += 1;
        if let Some(breadcrumb) = self.breadcrumb.as_mut() {
            breadcrumb.set_root(root.as_str());
        }

        // Nothing of the old tree survives a root change.
        self.roots.clear();

        self.emit(TreeEvent::RootChanged(root));
        if let Some(node) = node {
            self.emit(TreeEvent::NodeChanged(node));
        }
        self.reload_data();
    }

    /// Re-fetches the viewed subtree.
    ///
    /// Entries that are expanded now re-expand once their record arrives
    /// again. Every outstanding list request is invalidated.
    pub fn reload_data(&mut self) {
        self.expanded_keys = node::expanded_keys(&self.roots);
        self.tracker.invalidate_all();
        self.roots.clear();
        self.failure = None;
        self.dropzone.reset();
        self.drop_selection();

        let Some(target) = self.node.clone().or_else(|| self.root_node.clone()) else {
            self.request_root_nodes();
            return;
        };
        log::debug!(
            "[TreeEngine::reload_data] loading {} ({} expanded)",
            target,
            self.expanded_keys.len()
        );
        self.load_children(&target, None, None);
        self.rebuild_path();
    }

    /// Requests the children of `parent`: always nodes, and leaves when
    /// enabled.
    ///
    /// `overrides` are merged on top of the base parameters; the ambient
    /// context is merged last.
    pub fn load_children(&mut self, parent: &str, cursor: Option<&str>, overrides: Option<&Params>) {
        self.dispatch_list(parent, SkelType::Node, cursor, overrides);
        if self.config.load_leaves {
            self.dispatch_list(parent, SkelType::Leaf, cursor, overrides);
        }
    }

    /// Flips the expansion of a node.
    ///
    /// The first expansion requests the children; later toggles only change
    /// visibility. Returns the new state, or `None` for leaves and unknown
    /// keys.
    pub fn toggle_expand(&mut self, key: &str) -> Option<bool> {
        let entry = node::find_mut(&mut self.roots, key)?;
        if !entry.can_expand() {
            return None;
        }
        entry.expanded = !entry.expanded;
        let expanded = entry.expanded;
        let needs_load = expanded && !entry.children_loaded;
        if needs_load {
            entry.children_loaded = true;
        }

        if needs_load {
            self.load_children(key, None, None);
        }
        Some(expanded)
    }

    /// Handles a change notification for `module`.
    ///
    /// Reloads when the module is this tree's own, or a list module that
    /// supplies this tree's root nodes. Returns `true` if a reload happened.
    pub fn on_external_change(&mut self, module: &str) -> bool {
        if module != self.config.module {
            let supplies_roots = self
                .registry
                .as_ref()
                .and_then(|r| r.module_info(module))
                .is_some_and(|info| {
                    info.handler == "list" && info.root_node_of.as_deref() == Some(self.config.module.as_str())
                });
            if !supplies_roots {
                return false;
            }
        }
        log::debug!("[TreeEngine::on_external_change] {} changed, reloading", module);
        self.reload_data();
        true
    }

    fn request_root_nodes(&mut self) {
        self.root_lookup += 1;
        log::debug!("[TreeEngine::request_root_nodes] generation {}", self.root_lookup);
        self.outbox.push(ServiceCall::ListRootNodes {
            generation: self.root_lookup,
            context: self.config.context.clone(),
        });
    }

    fn apply_root_nodes(&mut self, records: Vec<Record>) {
        match records.first().and_then(Record::key) {
            Some(key) => {
                let key = key.to_string();
                self.set_root_node(key, self.config.node.clone());
            }
            None => log::debug!("[TreeEngine::apply_root_nodes] no root nodes available"),
        }
    }

    fn dispatch_list(&mut self, parent: &str, kind: SkelType, cursor: Option<&str>, overrides: Option<&Params>) {
        let id = self
            .tracker
            .dispatch(parent, kind, cursor.map(str::to_string));

        let mut params = ListParams::new(parent, self.config.order_by.as_str(), self.config.page_size).with_cursor(cursor);
        if let Some(overrides) = overrides {
            params = params.merge(overrides);
        }
        params = params.merge(&self.config.context);

        self.outbox.push(ServiceCall::List { id, kind, params });
    }

    fn apply_page(&mut self, request: PendingRequest, page: ListResponse) {
        let parent = request.parent.as_str();
        let in_root = self.root_node.as_deref() == Some(parent);

        let parent_found = !in_root && node::find(&self.roots, parent).is_some();
        if parent_found && node::find(&self.roots, parent).is_some_and(|n| !n.can_expand()) {
            log::debug!("[TreeEngine::apply_page] discarding children of leaf {}", parent);
            return;
        }

        let has_more = page.has_more();
        let cursor = page.cursor().map(str::to_string);

        let mut seen = HashSet::new();
        let mut fresh = Vec::with_capacity(page.skellist.len());
        let mut reopen = Vec::new();
        for record in page.skellist {
            let mut entry = match TreeNode::from_record(request.kind, record) {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("[TreeEngine::apply_page] skipping record: {}", e);
                    continue;
                }
            };
            if entry.key == parent || !seen.insert(entry.key.clone()) || node::find(&self.roots, &entry.key).is_some() {
                log::debug!("[TreeEngine::apply_page] skipping duplicate {}", entry.key);
                continue;
            }
            if entry.can_expand() && self.expanded_keys.contains(&entry.key) {
                entry.expanded = true;
                entry.children_loaded = true;
                reopen.push(entry.key.clone());
            }
            fresh.push(entry);
        }

        log::debug!(
            "[TreeEngine::apply_page] {} {} entr(y/ies) under {}{}",
            fresh.len(),
            request.kind,
            parent,
            if has_more { " (more pending)" } else { "" }
        );

        if parent_found {
            if let Some(target) = node::find_mut(&mut self.roots, parent) {
                target.add_children(fresh);
                target.has_no_children = target.children.is_empty();
            }
        } else {
            self.roots.extend(fresh);
            node::sort_siblings(&mut self.roots);
        }
        self.emit(TreeEvent::ChildrenChanged {
            parent: parent.to_string(),
        });

        for key in reopen {
            self.load_children(&key, None, None);
        }
        if has_more {
            self.dispatch_list(parent, request.kind, cursor.as_deref(), None);
        }
    }

    fn fail(&mut self, error: ServiceError) {
        let placeholder = if error.is_access_denied() {
            ErrorPlaceholder::AccessDenied {
                message: self.translator.translate(ACCESS_DENIED, &[]),
            }
        } else {
            let code = error.status_code();
            let shown = code.map(|c| c.to_string()).unwrap_or_else(|| "0".to_string());
            ErrorPlaceholder::Generic {
                code,
                message: self.translator.translate(GENERIC_FAILURE, &[("code", shown.as_str())]),
            }
        };
        log::error!("[TreeEngine::fail] {}: {}", self.config.module, error);

        self.tracker.invalidate_all();
        self.roots.clear();
        self.drop_selection();
        self.failure = Some(placeholder.clone());
        self.emit(TreeEvent::Failed(placeholder));
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Records whether the multi-select modifier is held.
    pub fn set_modifier(&mut self, pressed: bool) {
        self.modifier = pressed;
    }

    /// Selects `key`.
    ///
    /// With multi-select and the modifier held, membership of `key` is
    /// toggled; otherwise it replaces the selection. Returns `false` if the
    /// entry is unknown or its kind is not selectable.
    pub fn extend_selection(&mut self, key: &str) -> bool {
        let Some(kind) = node::find(&self.roots, key).map(|n| n.kind) else {
            log::warn!("[TreeEngine::extend_selection] unknown entry {}", key);
            return false;
        };
        if self.allowed.is_some_and(|allowed| allowed != kind) {
            log::warn!("[TreeEngine::extend_selection] {} {} not allowed for selection", kind, key);
            return false;
        }

        if self.modifier && self.multi_select {
            if let Some(pos) = self.selection.iter().position(|k| k == key) {
                self.selection.remove(pos);
                self.mark_selected(key, false);
            } else {
                self.selection.push(key.to_string());
                self.mark_selected(key, true);
            }
        } else {
            self.drop_selection();
            self.selection.push(key.to_string());
            self.mark_selected(key, true);
        }

        self.emit(TreeEvent::SelectionChanged(self.selection.clone()));
        true
    }

    /// Empties the selection.
    pub fn clear_selection(&mut self) {
        if self.drop_selection() {
            self.emit(TreeEvent::SelectionChanged(Vec::new()));
        }
    }

    /// Activates the selection.
    ///
    /// In the browser variant activating a node navigates into it. In
    /// selector mode the selected records go to the selector callback;
    /// otherwise [`TreeEvent::SelectionActivated`] is emitted.
    pub fn activate_selection(&mut self, key: &str) {
        if self.config.variant == TreeVariant::Browser
            && node::find(&self.roots, key).is_some_and(|n| n.kind == SkelType::Node)
        {
            self.navigate_into(key);
            return;
        }
        if self.selection.is_empty() {
            return;
        }
        if self.selector.is_some() {
            self.selector_return();
        } else {
            let records = self.selected_records();
            self.emit(TreeEvent::SelectionActivated(records));
        }
    }

    /// Turns the engine into a selector.
    ///
    /// `allowed` restricts the selectable kind; `None` allows both.
    pub fn set_selector(&mut self, callback: SelectorCallback, multi: bool, allowed: Option<SkelType>) {
        self.selector = Some(callback);
        self.multi_select = multi;
        self.allowed = allowed;
    }

    /// Hands the selection to the selector callback and closes the selector.
    pub fn selector_return(&mut self) {
        let records = self.selected_records();
        if let Some(callback) = self.selector.take() {
            callback(records);
        }
        self.emit(TreeEvent::SelectorClosed);
    }

    /// Returns `true` in selector mode.
    pub fn is_selector(&self) -> bool {
        self.selector.is_some()
    }

    /// The selected keys, in selection order.
    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// The records of the selected entries.
    pub fn selected_records(&self) -> Vec<Record> {
        self.selection
            .iter()
            .filter_map(|k| node::find(&self.roots, k))
            .map(|n| n.record.clone())
            .collect()
    }

    fn mark_selected(&mut self, key: &str, selected: bool) {
        if let Some(entry) = node::find_mut(&mut self.roots, key) {
            entry.selected = selected;
        }
    }

    /// Clears the selection without emitting; returns `true` if it was
    /// not empty.
    fn drop_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        for key in std::mem::take(&mut self.selection) {
            self.mark_selected(&key, false);
        }
        true
    }

    fn navigate_into(&mut self, key: &str) {
        log::debug!("[TreeEngine::navigate_into] {}", key);
        self.tracker.invalidate_all();
        self.roots.clear();
        self.expanded_keys.clear();
        self.failure = None;
        self.drop_selection();

        self.node = Some(key.to_string());
        self.emit(TreeEvent::NodeChanged(key.to_string()));
        self.load_children(key, None, None);
        self.rebuild_path();
    }

    // =========================================================================
    // Breadcrumb
    // =========================================================================

    fn rebuild_path(&mut self) {
        let Some(node) = self.node.clone() else {
            return;
        };
        if let Some(breadcrumb) = self.breadcrumb.as_mut() {
            let step = breadcrumb.rebuild(node);
            self.outbox.push(ServiceCall::View {
                generation: step.generation,
                key: step.key,
            });
        }
    }

    fn apply_path_record(&mut self, generation: u64, result: Result<Record, ServiceError>) {
        let Some(breadcrumb) = self.breadcrumb.as_mut() else {
            return;
        };
        if let Some(step) = breadcrumb.accept(generation, result) {
            self.outbox.push(ServiceCall::View {
                generation: step.generation,
                key: step.key,
            });
        } else if breadcrumb.is_complete() && breadcrumb.generation() == generation {
            let labels = breadcrumb.labels().into_iter().map(str::to_string).collect();
            self.emit(TreeEvent::PathChanged(labels));
        }
    }

    /// The breadcrumb, root first; empty outside the browser variant.
    pub fn path(&self) -> &[PathSegment] {
        self.breadcrumb.as_ref().map(|b| b.path()).unwrap_or(&[])
    }

    // =========================================================================
    // Drag and drop
    // =========================================================================

    /// Starts dragging an entry; returns the payload to put on the drag.
    pub fn start_drag(&mut self, key: &str) -> Option<String> {
        let entry = node::find_mut(&mut self.roots, key)?;
        entry.dragging = true;
        let kind = entry.kind;
        Some(self.dropzone.start_drag(key, kind))
    }

    /// Ends the drag in progress.
    pub fn end_drag(&mut self) {
        if let Some(key) = self.dropzone.dragged().map(|d| d.key.clone()) {
            if let Some(entry) = node::find_mut(&mut self.roots, &key) {
                entry.dragging = false;
            }
        }
        self.dropzone.end_drag();
    }

    /// Classifies the pointer over `key`'s row.
    pub fn drag_over(&mut self, key: &str, row: Rect, pointer: Point) -> Option<DropZone> {
        self.dropzone.drag_over(key, row, pointer)
    }

    /// Handles the pointer leaving a row; returns the clear deadline.
    pub fn drag_leave(&mut self, still_inside: bool, now: Instant) -> Option<Instant> {
        self.dropzone.drag_leave(still_inside, now)
    }

    /// Applies a due drag-leave clear.
    pub fn poll_drag(&mut self, now: Instant) -> bool {
        self.dropzone.poll_clear(now)
    }

    /// Deadline of the pending drag-leave clear.
    pub fn next_drag_deadline(&self) -> Option<Instant> {
        self.dropzone.next_deadline()
    }

    /// The hovered target and its zone.
    pub fn drop_zone(&self) -> Option<(&str, DropZone)> {
        self.dropzone.current()
    }

    /// Drops `payload` onto `target`, using the zone recorded while
    /// hovering.
    ///
    /// Returns `true` if a move was queued. Malformed payloads, self-drops
    /// and unpositionable targets are ignored.
    pub fn drop_on(&mut self, target: &str, payload: &str) -> bool {
        let payload: DragPayload = match payload.parse() {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("[TreeEngine::drop_on] ignoring drop: {}", e);
                return false;
            }
        };
        let Some(zone) = self.dropzone.zone_for(target) else {
            log::debug!("[TreeEngine::drop_on] no drop zone recorded for {}", target);
            return false;
        };
        let request = node::siblings_of(&self.roots, target)
            .and_then(|(siblings, position)| dropzone::plan_move(&payload, zone, siblings, position));

        self.dropzone.reset();
        match request {
            Some(request) => {
                self.outbox.push(ServiceCall::Move(request));
                true
            }
            None => {
                log::debug!("[TreeEngine::drop_on] {:?} drop on {} is a no-op", zone, target);
                false
            }
        }
    }

    /// Drops `payload` on the tree background: the entry moves directly
    /// under the root.
    pub fn drop_on_root(&mut self, payload: &str) -> bool {
        let payload: DragPayload = match payload.parse() {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("[TreeEngine::drop_on_root] ignoring drop: {}", e);
                return false;
            }
        };
        let Some(root) = self.root_node.clone() else {
            return false;
        };
        if payload.key == root {
            return false;
        }
        self.move_entry(&payload.key, payload.kind, &root, None);
        true
    }

    /// Queues a move. The tree is not changed locally; it catches up on the
    /// next change notification.
    pub fn move_entry(&mut self, key: &str, kind: SkelType, new_parent: &str, sort_index: Option<f64>) {
        let mut request = MoveRequest::new(kind, key, new_parent);
        if let Some(index) = sort_index {
            request = request.with_sort_index(index);
        }
        log::debug!("[TreeEngine::move_entry] {} {} -> {}", kind, key, new_parent);
        self.outbox.push(ServiceCall::Move(request));
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn module(&self) -> &str {
        &self.config.module
    }

    pub fn root_node(&self) -> Option<&str> {
        self.root_node.as_deref()
    }

    /// The viewed subtree.
    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    /// Top-level entries of the viewed subtree.
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn find(&self, key: &str) -> Option<&TreeNode> {
        node::find(&self.roots, key)
    }

    /// The placeholder shown after a failed fetch.
    pub fn failure(&self) -> Option<&ErrorPlaceholder> {
        self.failure.as_ref()
    }

    /// Returns `true` while list requests are outstanding.
    pub fn is_loading(&self) -> bool {
        !self.tracker.is_empty()
    }

    /// Number of outstanding list requests.
    pub fn pending_requests(&self) -> usize {
        self.tracker.len()
    }

    /// The action-bar identifiers.
    pub fn actions(&self) -> Vec<&'static str> {
        let mut actions = Vec::with_capacity(SELECTOR_ACTIONS.len() + TREE_ACTIONS.len());
        if self.is_selector() {
            actions.extend(SELECTOR_ACTIONS);
        }
        actions.extend(TREE_ACTIONS);
        actions
    }

    /// Renders an entry using the module's display format.
    pub fn describe(&self, key: &str) -> Option<Description> {
        let format = self
            .registry
            .as_ref()
            .and_then(|r| r.module_info(&self.config.module))
            .and_then(|info| info.format);
        self.find(key).map(|n| n.describe(format.as_deref()))
    }

    /// Entries shown on screen with their depth: children of collapsed
    /// nodes are skipped.
    pub fn visible(&self) -> Vec<(usize, &TreeNode)> {
        fn collect<'a>(nodes: &'a [TreeNode], depth: usize, out: &mut Vec<(usize, &'a TreeNode)>) {
            for node in nodes {
                out.push((depth, node));
                if node.expanded {
                    collect(&node.children, depth + 1, out);
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.roots, 0, &mut out);
        out
    }

    fn emit(&mut self, event: TreeEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
