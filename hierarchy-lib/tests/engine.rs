//! Scenario tests for the tree engine.
//!
//! Replies are handed to the engine by hand, so every interleaving of
//! responses can be replayed deterministically.

use std::sync::Arc;
use std::sync::Mutex;

use hierarchy_lib::config::ModuleInfo;
use hierarchy_lib::config::StaticRegistry;
use hierarchy_lib::config::TreeConfig;
use hierarchy_lib::config::TreeVariant;
use hierarchy_lib::dropzone::DropZone;
use hierarchy_lib::dropzone::Point;
use hierarchy_lib::dropzone::Rect;
use hierarchy_lib::engine::ServiceCall;
use hierarchy_lib::engine::ServiceReply;
use hierarchy_lib::engine::TreeEngine;
use hierarchy_lib::engine::TreeEvent;
use hierarchy_lib::error::ServiceError;
use hierarchy_lib::model::ListResponse;
use hierarchy_lib::model::Record;
use hierarchy_lib::model::SkelType;
use hierarchy_lib::node::TreeNode;
use hierarchy_lib::service::MoveRequest;
use hierarchy_lib::tracker::RequestId;

struct ListCall {
    id: RequestId,
    kind: SkelType,
    parent: String,
    cursor: Option<String>,
}

fn entry(key: &str, parent: &str, index: f64) -> Record {
    Record::new()
        .set("key", key)
        .set("parententry", parent)
        .set("sortindex", index)
}

fn tree(root: &str) -> TreeEngine {
    TreeEngine::new(TreeConfig::new("file").with_root_node(root).with_leaves(false))
}

fn list_calls(engine: &mut TreeEngine) -> Vec<ListCall> {
    engine
        .take_calls()
        .into_iter()
        .filter_map(|call| match call {
            ServiceCall::List { id, kind, params } => Some(ListCall {
                id,
                kind,
                parent: params.parent_entry().unwrap_or_default().to_string(),
                cursor: params.cursor().map(str::to_string),
            }),
            _ => None,
        })
        .collect()
}

fn move_calls(engine: &mut TreeEngine) -> Vec<MoveRequest> {
    engine
        .take_calls()
        .into_iter()
        .filter_map(|call| match call {
            ServiceCall::Move(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn answer(engine: &mut TreeEngine, id: RequestId, records: Vec<Record>, cursor: Option<&str>) {
    let mut page = ListResponse::new(records);
    if let Some(cursor) = cursor {
        page = page.with_cursor(cursor);
    }
    engine.deliver(ServiceReply::List { id, result: Ok(page) });
}

fn keys(nodes: &[TreeNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.key.as_str()).collect()
}

/// A tree under `r` with its first page delivered.
fn loaded(children: Vec<Record>) -> TreeEngine {
    let mut engine = tree("r");
    let calls = list_calls(&mut engine);
    answer(&mut engine, calls[0].id, children, None);
    engine
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<TreeEvent>) -> Vec<TreeEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// =============================================================================
// Loading and merging
// =============================================================================

#[test]
fn test_children_stay_sorted_after_every_merge() {
    let mut engine = TreeEngine::new(TreeConfig::new("file").with_root_node("r"));
    let calls = list_calls(&mut engine);
    assert_eq!(calls.len(), 2);

    // leaves arrive first
    let leaf_call = calls.iter().find(|c| c.kind == SkelType::Leaf).unwrap();
    answer(
        &mut engine,
        leaf_call.id,
        vec![entry("l2", "r", 2.5), entry("l1", "r", 0.5)],
        None,
    );
    assert_eq!(keys(engine.roots()), vec!["l1", "l2"]);

    let node_call = calls.iter().find(|c| c.kind == SkelType::Node).unwrap();
    answer(
        &mut engine,
        node_call.id,
        vec![entry("n3", "r", 3.0), entry("n1", "r", 1.0), entry("n0", "r", 0.0)],
        None,
    );
    assert_eq!(keys(engine.roots()), vec!["n0", "l1", "n1", "l2", "n3"]);
    assert_eq!(engine.find("l1").unwrap().kind, SkelType::Leaf);
    assert!(!engine.is_loading());
}

#[test]
fn test_numeric_string_sort_index() {
    let mut engine = loaded(vec![
        Record::new().set("key", "b").set("parententry", "r").set("sortindex", "10"),
        Record::new().set("key", "a").set("parententry", "r").set("sortindex", "9.5"),
        Record::new().set("key", "z").set("parententry", "r"),
    ]);
    assert_eq!(keys(engine.roots()), vec!["z", "a", "b"]);
    assert!(list_calls(&mut engine).is_empty());
}

#[test]
fn test_reply_after_reload_is_ignored() {
    let mut engine = tree("r");
    let stale = list_calls(&mut engine);

    engine.reload_data();
    answer(&mut engine, stale[0].id, vec![entry("n1", "r", 1.0)], Some("c1"));

    assert!(engine.roots().is_empty());
    // no pagination follow-up for a stale reply
    let fresh = list_calls(&mut engine);
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].parent, "r");
    assert_eq!(fresh[0].cursor, None);
}

#[test]
fn test_reply_after_root_change_is_ignored() {
    let mut engine = tree("r");
    let stale = list_calls(&mut engine);

    engine.set_root_node("other", None);
    answer(&mut engine, stale[0].id, vec![entry("n1", "r", 1.0)], None);
    assert!(engine.roots().is_empty());

    let fresh = list_calls(&mut engine);
    assert_eq!(fresh[0].parent, "other");
    answer(&mut engine, fresh[0].id, vec![entry("o1", "other", 1.0)], None);
    assert_eq!(keys(engine.roots()), vec!["o1"]);
}

#[test]
fn test_stale_failure_is_ignored() {
    let mut engine = tree("r");
    let stale = list_calls(&mut engine);
    engine.reload_data();

    engine.deliver(ServiceReply::List {
        id: stale[0].id,
        result: Err(ServiceError::http(500, "late")),
    });
    assert!(engine.failure().is_none());
}

#[test]
fn test_pagination_issues_three_fetches_in_sequence() {
    let mut engine = tree("r");
    let mut fetches = 0;

    let first = list_calls(&mut engine);
    fetches += first.len();
    answer(
        &mut engine,
        first[0].id,
        vec![entry("a", "r", 5.0), entry("b", "r", 1.0)],
        Some("c1"),
    );

    let second = list_calls(&mut engine);
    fetches += second.len();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].cursor.as_deref(), Some("c1"));
    assert_eq!(second[0].kind, SkelType::Node);
    answer(
        &mut engine,
        second[0].id,
        vec![entry("c", "r", 3.0), entry("d", "r", 0.5)],
        Some("c2"),
    );

    let third = list_calls(&mut engine);
    fetches += third.len();
    assert_eq!(third[0].cursor.as_deref(), Some("c2"));
    answer(&mut engine, third[0].id, vec![entry("e", "r", 2.0)], None);

    assert!(list_calls(&mut engine).is_empty());
    assert_eq!(fetches, 3);
    assert_eq!(keys(engine.roots()), vec!["d", "b", "e", "c", "a"]);
}

#[test]
fn test_empty_page_stops_pagination() {
    let mut engine = tree("r");
    let first = list_calls(&mut engine);
    answer(&mut engine, first[0].id, Vec::new(), Some("c1"));
    assert!(list_calls(&mut engine).is_empty());
}

#[test]
fn test_duplicate_keys_are_skipped() {
    let mut engine = tree("r");
    let first = list_calls(&mut engine);
    answer(
        &mut engine,
        first[0].id,
        vec![entry("a", "r", 1.0), entry("a", "r", 2.0)],
        Some("c1"),
    );
    let second = list_calls(&mut engine);
    answer(&mut engine, second[0].id, vec![entry("a", "r", 3.0)], None);

    assert_eq!(keys(engine.roots()), vec!["a"]);
    assert_eq!(engine.roots()[0].sort_order, 1.0);
}

#[test]
fn test_children_of_a_leaf_are_discarded() {
    let mut engine = TreeEngine::new(TreeConfig::new("file").with_root_node("r"));
    let calls = list_calls(&mut engine);
    let leaf_call = calls.iter().find(|c| c.kind == SkelType::Leaf).unwrap();
    answer(&mut engine, leaf_call.id, vec![entry("l1", "r", 1.0)], None);

    engine.load_children("l1", None, None);
    for call in list_calls(&mut engine) {
        answer(&mut engine, call.id, vec![entry("x", "l1", 1.0)], None);
    }

    assert!(engine.find("x").is_none());
    assert!(engine.find("l1").unwrap().children.is_empty());
}

#[test]
fn test_unknown_parent_falls_back_to_root_container() {
    let mut engine = loaded(Vec::new());
    engine.load_children("ghost", None, None);
    let calls = list_calls(&mut engine);
    answer(&mut engine, calls[0].id, vec![entry("g1", "ghost", 1.0)], None);

    assert_eq!(keys(engine.roots()), vec!["g1"]);
}

#[test]
fn test_records_without_key_are_skipped() {
    let engine = loaded(vec![Record::new().set("name", "nameless"), entry("a", "r", 1.0)]);
    assert_eq!(keys(engine.roots()), vec!["a"]);
}

#[test]
fn test_has_no_children_marker() {
    let mut engine = loaded(vec![entry("n1", "r", 1.0)]);
    engine.toggle_expand("n1");
    let calls = list_calls(&mut engine);
    answer(&mut engine, calls[0].id, Vec::new(), None);

    assert!(engine.find("n1").unwrap().has_no_children);
}

// =============================================================================
// Expansion
// =============================================================================

#[test]
fn test_toggle_twice_loads_once() {
    let mut engine = loaded(vec![entry("n1", "r", 1.0)]);

    assert_eq!(engine.toggle_expand("n1"), Some(true));
    let calls = list_calls(&mut engine);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].parent, "n1");
    assert!(engine.find("n1").unwrap().children_loaded);

    // second toggle while the load is still in flight
    assert_eq!(engine.toggle_expand("n1"), Some(false));
    assert!(list_calls(&mut engine).is_empty());
    assert!(!engine.find("n1").unwrap().expanded);

    answer(&mut engine, calls[0].id, vec![entry("c1", "n1", 1.0)], None);
    assert_eq!(engine.toggle_expand("n1"), Some(true));
    assert!(list_calls(&mut engine).is_empty());
    assert_eq!(keys(&engine.find("n1").unwrap().children), vec!["c1"]);
}

#[test]
fn test_collapse_keeps_children() {
    let mut engine = loaded(vec![entry("n1", "r", 1.0)]);
    engine.toggle_expand("n1");
    let calls = list_calls(&mut engine);
    answer(&mut engine, calls[0].id, vec![entry("c1", "n1", 1.0)], None);

    assert_eq!(engine.visible().len(), 2);
    engine.toggle_expand("n1");
    assert_eq!(engine.visible().len(), 1);
    assert_eq!(engine.find("n1").unwrap().children.len(), 1);
}

#[test]
fn test_leaves_do_not_expand() {
    let mut engine = TreeEngine::new(TreeConfig::new("file").with_root_node("r"));
    let calls = list_calls(&mut engine);
    let leaf_call = calls.iter().find(|c| c.kind == SkelType::Leaf).unwrap();
    answer(&mut engine, leaf_call.id, vec![entry("l1", "r", 1.0)], None);

    assert_eq!(engine.toggle_expand("l1"), None);
    assert!(list_calls(&mut engine).is_empty());
}

#[test]
fn test_reload_restores_expansion() {
    let mut engine = loaded(vec![entry("n1", "r", 1.0), entry("n2", "r", 2.0)]);
    engine.toggle_expand("n1");
    let calls = list_calls(&mut engine);
    answer(&mut engine, calls[0].id, vec![entry("c1", "n1", 1.0)], None);

    engine.reload_data();
    assert!(engine.roots().is_empty());
    let calls = list_calls(&mut engine);
    assert_eq!(calls.len(), 1);
    answer(&mut engine, calls[0].id, vec![entry("n1", "r", 1.0), entry("n2", "r", 2.0)], None);

    let n1 = engine.find("n1").unwrap();
    assert!(n1.expanded);
    assert!(n1.children_loaded);
    assert!(!engine.find("n2").unwrap().expanded);

    let calls = list_calls(&mut engine);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].parent, "n1");
    answer(&mut engine, calls[0].id, vec![entry("c1", "n1", 1.0)], None);
    assert_eq!(keys(&engine.find("n1").unwrap().children), vec!["c1"]);
}

#[test]
fn test_set_root_node_forgets_expansion() {
    let mut engine = loaded(vec![entry("n1", "r", 1.0)]);
    engine.toggle_expand("n1");
    list_calls(&mut engine);

    engine.set_root_node("r", None);
    let calls = list_calls(&mut engine);
    answer(&mut engine, calls[0].id, vec![entry("n1", "r", 1.0)], None);

    assert!(!engine.find("n1").unwrap().expanded);
    assert!(list_calls(&mut engine).is_empty());
}

// =============================================================================
// Root discovery and failures
// =============================================================================

#[test]
fn test_default_root_from_root_node_list() {
    let mut engine = TreeEngine::new(TreeConfig::new("file").with_leaves(false));
    let mut events = engine.subscribe();

    let calls = engine.take_calls();
    let generation = match &calls[..] {
        [ServiceCall::ListRootNodes { generation, .. }] => *generation,
        other => panic!("unexpected calls {:?}", other),
    };
    engine.deliver(ServiceReply::RootNodes {
        generation,
        result: Ok(vec![
            Record::new().set("key", "first"),
            Record::new().set("key", "second"),
        ]),
    });

    assert_eq!(engine.root_node(), Some("first"));
    assert_eq!(drain(&mut events), vec![TreeEvent::RootChanged("first".into())]);
    let calls = list_calls(&mut engine);
    assert_eq!(calls[0].parent, "first");
}

#[test]
fn test_empty_root_node_list_leaves_tree_empty() {
    let mut engine = TreeEngine::new(TreeConfig::new("file"));
    let calls = engine.take_calls();
    let ServiceCall::ListRootNodes { generation, .. } = calls[0] else {
        panic!("expected listRootNodes");
    };
    engine.deliver(ServiceReply::RootNodes {
        generation,
        result: Ok(Vec::new()),
    });

    assert_eq!(engine.root_node(), None);
    assert!(engine.take_calls().is_empty());
}

#[test]
fn test_failure_blanks_tree_until_reload() {
    let mut engine = TreeEngine::new(TreeConfig::new("file").with_root_node("r"));
    let mut events = engine.subscribe();
    let calls = list_calls(&mut engine);
    answer(&mut engine, calls[0].id, vec![entry("n1", "r", 1.0)], None);

    engine.deliver(ServiceReply::List {
        id: calls[1].id,
        result: Err(ServiceError::http(401, "login required")),
    });

    assert!(engine.roots().is_empty());
    assert!(matches!(
        drain(&mut events).last(),
        Some(TreeEvent::Failed(placeholder)) if placeholder.message() == "Access denied!"
    ));

    engine.reload_data();
    assert!(engine.failure().is_none());
}

#[test]
fn test_network_failure_is_generic() {
    let mut engine = tree("r");
    let calls = list_calls(&mut engine);
    engine.deliver(ServiceReply::List {
        id: calls[0].id,
        result: Err(ServiceError::Timeout(std::time::Duration::from_secs(30))),
    });

    let failure = engine.failure().unwrap();
    assert_eq!(failure.code(), None);
    assert_eq!(failure.message(), "Error 0 occurred!");
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_modifier_toggles_membership() {
    let mut engine = loaded(vec![entry("a", "r", 1.0), entry("b", "r", 2.0)]);

    engine.set_modifier(true);
    assert!(engine.extend_selection("a"));
    assert!(engine.extend_selection("b"));
    assert!(engine.extend_selection("a"));
    assert_eq!(engine.selection(), &["b".to_string()]);
    assert!(!engine.find("a").unwrap().selected);
    assert!(engine.find("b").unwrap().selected);
}

#[test]
fn test_without_modifier_selection_is_replaced() {
    let mut engine = loaded(vec![entry("a", "r", 1.0), entry("b", "r", 2.0)]);
    let mut events = engine.subscribe();

    engine.extend_selection("a");
    engine.extend_selection("b");
    assert_eq!(engine.selection(), &["b".to_string()]);
    assert!(!engine.find("a").unwrap().selected);
    assert_eq!(
        drain(&mut events),
        vec![
            TreeEvent::SelectionChanged(vec!["a".into()]),
            TreeEvent::SelectionChanged(vec!["b".into()]),
        ]
    );
}

#[test]
fn test_modifier_ignored_without_multi_select() {
    let mut engine = TreeEngine::new(
        TreeConfig::new("file")
            .with_root_node("r")
            .with_leaves(false)
            .with_multi_select(false),
    );
    let calls = list_calls(&mut engine);
    answer(&mut engine, calls[0].id, vec![entry("a", "r", 1.0), entry("b", "r", 2.0)], None);

    engine.set_modifier(true);
    engine.extend_selection("a");
    engine.extend_selection("b");
    assert_eq!(engine.selection(), &["b".to_string()]);
}

#[test]
fn test_clear_selection() {
    let mut engine = loaded(vec![entry("a", "r", 1.0)]);
    engine.extend_selection("a");
    engine.clear_selection();

    assert!(engine.selection().is_empty());
    assert!(!engine.find("a").unwrap().selected);
}

#[test]
fn test_selector_rejects_disallowed_kind() {
    let mut engine = TreeEngine::new(TreeConfig::new("file").with_root_node("r"));
    let calls = list_calls(&mut engine);
    for call in &calls {
        let record = match call.kind {
            SkelType::Node => entry("n1", "r", 1.0),
            SkelType::Leaf => entry("l1", "r", 2.0),
        };
        answer(&mut engine, call.id, vec![record], None);
    }

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    engine.set_selector(
        Box::new(move |records: Vec<Record>| sink.lock().unwrap().extend(records)),
        false,
        Some(SkelType::Leaf),
    );
    let mut events = engine.subscribe();

    assert!(!engine.extend_selection("n1"));
    assert!(engine.selection().is_empty());
    assert!(engine.extend_selection("l1"));

    engine.activate_selection("l1");
    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].key(), Some("l1"));
    assert_eq!(drain(&mut events).last(), Some(&TreeEvent::SelectorClosed));
    assert!(!engine.is_selector());
}

#[test]
fn test_activation_outside_selector_mode() {
    let mut engine = loaded(vec![entry("a", "r", 1.0)]);
    let mut events = engine.subscribe();

    engine.activate_selection("a");
    assert!(drain(&mut events).is_empty());

    engine.extend_selection("a");
    engine.activate_selection("a");
    let events = drain(&mut events);
    assert!(matches!(
        events.last(),
        Some(TreeEvent::SelectionActivated(records)) if records.len() == 1
    ));
}

// =============================================================================
// Drag and drop
// =============================================================================

fn row() -> Rect {
    Rect::new(0.0, 0.0, 200.0, 40.0)
}

#[test]
fn test_after_drop_uses_midpoint() {
    let mut engine = loaded(vec![entry("n1", "r", 1.0), entry("n2", "r", 3.0)]);

    assert_eq!(
        engine.drag_over("n1", row(), Point::new(10.0, 38.0)),
        Some(DropZone::After)
    );
    assert!(engine.drop_on("n1", "x/leaf"));

    let moves = move_calls(&mut engine);
    assert_eq!(
        moves,
        vec![MoveRequest::new(SkelType::Leaf, "x", "r").with_sort_index(2.0)]
    );
    // no optimistic update
    assert_eq!(keys(engine.roots()), vec!["n1", "n2"]);
}

#[test]
fn test_before_first_sibling_uses_zero() {
    let mut engine = loaded(vec![entry("n1", "r", 1.0), entry("n2", "r", 3.0)]);
    engine.drag_over("n1", row(), Point::new(10.0, 2.0));
    assert!(engine.drop_on("n1", "x/node"));

    let moves = move_calls(&mut engine);
    assert_eq!(moves[0].sort_index, Some(0.5));
}

#[test]
fn test_into_drop_reparents_without_index() {
    let mut engine = loaded(vec![entry("n1", "r", 1.0)]);
    engine.drag_over("n1", row(), Point::new(10.0, 20.0));
    assert!(engine.drop_on("n1", "x/leaf"));

    let moves = move_calls(&mut engine);
    assert_eq!(moves, vec![MoveRequest::new(SkelType::Leaf, "x", "n1")]);
}

#[test]
fn test_self_drop_is_rejected() {
    let mut engine = loaded(vec![entry("n1", "r", 1.0), entry("n2", "r", 2.0)]);

    let payload = engine.start_drag("n1").unwrap();
    assert_eq!(payload, "n1/node");
    assert!(engine.find("n1").unwrap().dragging);

    assert_eq!(engine.drag_over("n1", row(), Point::new(10.0, 20.0)), None);
    assert!(!engine.drop_on("n1", &payload));
    assert!(move_calls(&mut engine).is_empty());

    engine.end_drag();
    assert!(!engine.find("n1").unwrap().dragging);
}

#[test]
fn test_parentless_target_rejects_sibling_drop() {
    let mut engine = loaded(vec![Record::new().set("key", "orphan").set("sortindex", 1.0)]);
    engine.drag_over("orphan", row(), Point::new(10.0, 39.0));

    assert!(!engine.drop_on("orphan", "x/leaf"));
    assert!(move_calls(&mut engine).is_empty());
}

#[test]
fn test_malformed_payload_is_ignored() {
    let mut engine = loaded(vec![entry("n1", "r", 1.0)]);
    engine.drag_over("n1", row(), Point::new(10.0, 20.0));

    assert!(!engine.drop_on("n1", "no-separator"));
    assert!(!engine.drop_on("n1", "k/folder"));
    assert!(!engine.drop_on_root("garbage"));
    assert!(move_calls(&mut engine).is_empty());
}

#[test]
fn test_drop_on_root() {
    let mut engine = loaded(Vec::new());
    assert!(engine.drop_on_root("l9/leaf"));

    let moves = move_calls(&mut engine);
    assert_eq!(moves, vec![MoveRequest::new(SkelType::Leaf, "l9", "r")]);
}

#[test]
fn test_move_failure_is_reported() {
    let mut engine = loaded(Vec::new());
    let mut events = engine.subscribe();

    engine.deliver(ServiceReply::Moved {
        key: "x".into(),
        result: Err(ServiceError::http(403, "denied")),
    });
    assert!(matches!(
        drain(&mut events).as_slice(),
        [TreeEvent::MoveFailed { key, .. }] if key == "x"
    ));
    assert!(engine.failure().is_none());
}

// =============================================================================
// Change notifications
// =============================================================================

#[test]
fn test_external_change_relevance() {
    let registry = StaticRegistry::new()
        .with("file", ModuleInfo::new("tree.simple.file"))
        .with("repo", ModuleInfo::new("list").root_node_of("file"))
        .with("other", ModuleInfo::new("list").root_node_of("pages"));
    let mut engine = tree("r").with_registry(Arc::new(registry));
    engine.take_calls();

    assert!(!engine.on_external_change("other"));
    assert!(!engine.on_external_change("unknown"));
    assert!(engine.take_calls().is_empty());

    assert!(engine.on_external_change("repo"));
    assert_eq!(list_calls(&mut engine).len(), 1);
    assert!(engine.on_external_change("file"));
    assert_eq!(list_calls(&mut engine).len(), 1);
}

#[test]
fn test_describe_uses_module_format() {
    let registry = StaticRegistry::new().with("file", ModuleInfo::new("tree").format("$(name) [$(key)]"));
    let mut engine = tree("r").with_registry(Arc::new(registry));
    let calls = list_calls(&mut engine);
    answer(
        &mut engine,
        calls[0].id,
        vec![entry("n1", "r", 1.0).set("name", "Docs")],
        None,
    );

    assert_eq!(engine.describe("n1").unwrap().headline, "Docs [n1]");
}

// =============================================================================
// Browser variant
// =============================================================================

fn browser(root: &str, node: &str) -> TreeEngine {
    TreeEngine::new(
        TreeConfig::new("file")
            .with_root_node(root)
            .with_node(node)
            .with_leaves(false)
            .with_variant(TreeVariant::Browser),
    )
}

fn view_call(calls: &[ServiceCall]) -> Option<(u64, String)> {
    calls.iter().find_map(|c| match c {
        ServiceCall::View { generation, key } => Some((*generation, key.clone())),
        _ => None,
    })
}

#[test]
fn test_breadcrumb_chain_has_three_segments() {
    let mut engine = browser("r", "p");
    let mut events = engine.subscribe();

    let (generation, key) = view_call(&engine.take_calls()).unwrap();
    assert_eq!(key, "p");
    engine.deliver(ServiceReply::View {
        generation,
        result: Ok(entry("p", "g", 1.0).set("name", "Parent")),
    });

    let (generation, key) = view_call(&engine.take_calls()).unwrap();
    assert_eq!(key, "g");
    engine.deliver(ServiceReply::View {
        generation,
        result: Ok(entry("g", "r", 1.0).set("name", "Grand")),
    });

    let (generation, key) = view_call(&engine.take_calls()).unwrap();
    assert_eq!(key, "r");
    engine.deliver(ServiceReply::View {
        generation,
        result: Ok(entry("r", "r", 0.0)),
    });

    assert!(engine.take_calls().is_empty());
    let path = engine.path();
    assert_eq!(path.len(), 3);
    assert!(path[0].is_root);
    assert_eq!(path[0].name, "root");
    assert_eq!(path[2].key, "p");
    assert_eq!(
        drain(&mut events),
        vec![TreeEvent::PathChanged(vec![
            "root".into(),
            "Grand".into(),
            "Parent".into()
        ])]
    );
}

#[test]
fn test_stale_breadcrumb_chain_is_dropped() {
    let mut engine = browser("r", "p");
    let (old_generation, _) = view_call(&engine.take_calls()).unwrap();

    engine.reload_data();
    let (generation, _) = view_call(&engine.take_calls()).unwrap();
    assert!(generation > old_generation);

    engine.deliver(ServiceReply::View {
        generation: old_generation,
        result: Ok(entry("p", "g", 1.0)),
    });
    assert!(view_call(&engine.take_calls()).is_none());
    assert!(engine.path().is_empty());
}

#[test]
fn test_browser_activation_navigates_into_node() {
    let mut engine = browser("r", "r");
    let calls = list_calls(&mut engine);
    answer(&mut engine, calls[0].id, vec![entry("n1", "r", 1.0)], None);
    let mut events = engine.subscribe();

    engine.activate_selection("n1");

    assert_eq!(engine.node(), Some("n1"));
    assert!(engine.roots().is_empty());
    assert_eq!(drain(&mut events), vec![TreeEvent::NodeChanged("n1".into())]);

    let calls = engine.take_calls();
    assert_eq!(view_call(&calls).map(|(_, k)| k).as_deref(), Some("n1"));
    let lists: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            ServiceCall::List { id, params, .. } => Some((*id, params.parent_entry().map(str::to_string))),
            _ => None,
        })
        .collect();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].1.as_deref(), Some("n1"));

    // children of the viewed node land in the top-level container
    answer(&mut engine, lists[0].0, vec![entry("c1", "n1", 1.0)], None);
    assert_eq!(keys(engine.roots()), vec!["c1"]);
}

#[test]
fn test_plain_tree_has_no_breadcrumb() {
    let mut engine = tree("r");
    assert!(view_call(&engine.take_calls()).is_none());
    assert!(engine.path().is_empty());
}
