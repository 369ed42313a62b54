//! In-memory implementation of the tree service

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;

use super::ListParams;
use super::MoveRequest;
use super::Params;
use super::RemoteTreeService;
use crate::error::ServiceError;
use crate::model::ListResponse;
use crate::model::Record;
use crate::model::SkelType;
use crate::model::Value;
use crate::model::PARENT_FIELD;
use crate::model::SORT_INDEX_FIELD;

/// Fixture file layout: records per skeleton type.
#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    /// Node records.
    #[serde(default)]
    pub node: Vec<Record>,
    /// Leaf records.
    #[serde(default)]
    pub leaf: Vec<Record>,
}

/// A backend held entirely in memory.
///
/// Lists are ordered by sort index and paginated with numeric offset
/// cursors. Every call is recorded so tests can assert on traffic.
///
/// # Example
///
/// ```
/// use hierarchy_lib::model::{Record, SkelType};
/// use hierarchy_lib::service::MemoryTreeService;
///
/// let service = MemoryTreeService::new()
///     .with_record(SkelType::Node, Record::new().set("key", "root"))
///     .with_record(
///         SkelType::Node,
///         Record::new().set("key", "a").set("parententry", "root"),
///     );
///
/// assert_eq!(service.children_of("root", SkelType::Node).len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct MemoryTreeService {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    records: Vec<(SkelType, Record)>,
    calls: Vec<String>,
    failures: HashMap<String, u16>,
}

impl MemoryTreeService {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a store from a JSON fixture (`{"node": [...], "leaf": [...]}`).
    pub fn from_json(json: &str) -> Result<Self, ServiceError> {
        let fixture: Fixture =
            serde_json::from_str(json).map_err(|e| ServiceError::parse_with_body(e.to_string(), json))?;
        let mut service = Self::new();
        for record in fixture.node {
            service = service.with_record(SkelType::Node, record);
        }
        for record in fixture.leaf {
            service = service.with_record(SkelType::Leaf, record);
        }
        Ok(service)
    }

    /// Adds a record (builder pattern).
    pub fn with_record(self, skel_type: SkelType, record: Record) -> Self {
        self.insert(skel_type, record);
        self
    }

    /// Adds a record.
    pub fn insert(&self, skel_type: SkelType, record: Record) {
        if let Ok(mut inner) = self.inner.write() {
            inner.records.push((skel_type, record));
        }
    }

    /// Makes every call whose action starts with `action` fail with `status`.
    pub fn fail_action(&self, action: &str, status: u16) {
        if let Ok(mut inner) = self.inner.write() {
            inner.failures.insert(action.to_string(), status);
        }
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.failures.clear();
        }
    }

    /// Returns the recorded calls, e.g. `list/node parententry=root cursor=-`.
    pub fn calls(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|g| g.calls.clone())
            .unwrap_or_default()
    }

    /// Returns the children of `parent`, ordered by sort index.
    pub fn children_of(&self, parent: &str, skel_type: SkelType) -> Vec<Record> {
        let Ok(inner) = self.inner.read() else {
            return Vec::new();
        };
        let mut children: Vec<Record> = inner
            .records
            .iter()
            .filter(|(t, r)| *t == skel_type && r.parent_entry() == Some(parent) && r.key() != Some(parent))
            .map(|(_, r)| r.clone())
            .collect();
        children.sort_by(|a, b| a.sort_index().total_cmp(&b.sort_index()));
        children
    }

    fn record_call(&self, call: String) -> Result<(), ServiceError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ServiceError::http(500, "store poisoned"))?;
        let failure = inner
            .failures
            .iter()
            .find(|(action, _)| call.starts_with(action.as_str()))
            .map(|(_, status)| *status);
        inner.calls.push(call);
        match failure {
            Some(status) => Err(ServiceError::http(status, "injected failure")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteTreeService for MemoryTreeService {
    async fn list(
        &self,
        _module: &str,
        skel_type: SkelType,
        params: &ListParams,
    ) -> Result<ListResponse, ServiceError> {
        let parent = params.parent_entry().unwrap_or_default().to_string();
        self.record_call(format!(
            "list/{} parententry={} cursor={}",
            skel_type,
            parent,
            params.cursor().unwrap_or("-")
        ))?;

        let offset: usize = match params.cursor() {
            Some(cursor) => cursor
                .parse()
                .map_err(|_| ServiceError::http(400, format!("bad cursor {cursor:?}")))?,
            None => 0,
        };
        let amount = params.amount().unwrap_or(99).max(1) as usize;

        let children = self.children_of(&parent, skel_type);
        let page: Vec<Record> = children.iter().skip(offset).take(amount).cloned().collect();
        let next = offset + page.len();

        let mut response = ListResponse::new(page);
        if next < children.len() {
            response = response.with_cursor(next.to_string());
        }
        Ok(response)
    }

    async fn list_root_nodes(&self, _module: &str, _params: &Params) -> Result<Vec<Record>, ServiceError> {
        self.record_call("listRootNodes".to_string())?;
        let inner = self
            .inner
            .read()
            .map_err(|_| ServiceError::http(500, "store poisoned"))?;
        Ok(inner
            .records
            .iter()
            .filter(|(t, r)| {
                *t == SkelType::Node && (r.parent_entry().is_none() || r.parent_entry() == r.key())
            })
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn view(&self, _module: &str, skel_type: SkelType, key: &str) -> Result<Record, ServiceError> {
        self.record_call(format!("view/{}/{}", skel_type, key))?;
        let inner = self
            .inner
            .read()
            .map_err(|_| ServiceError::http(500, "store poisoned"))?;
        inner
            .records
            .iter()
            .find(|(t, r)| *t == skel_type && r.key() == Some(key))
            .map(|(_, r)| r.clone())
            .ok_or_else(|| ServiceError::http(404, format!("no {skel_type} {key}")))
    }

    async fn move_entry(&self, _module: &str, request: &MoveRequest) -> Result<(), ServiceError> {
        self.record_call(format!("move {} -> {}", request.key, request.parent_node))?;
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ServiceError::http(500, "store poisoned"))?;
        let entry = inner
            .records
            .iter_mut()
            .find(|(t, r)| *t == request.skel_type && r.key() == Some(request.key.as_str()))
            .ok_or_else(|| ServiceError::http(404, format!("no {} {}", request.skel_type, request.key)))?;
        entry
            .1
            .insert(PARENT_FIELD, Value::String(request.parent_node.clone()));
        if let Some(index) = request.sort_index {
            entry.1.insert(SORT_INDEX_FIELD, Value::Float(index));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(key: &str, parent: &str, index: f64) -> Record {
        Record::new()
            .set("key", key)
            .set("parententry", parent)
            .set("sortindex", index)
    }

    #[tokio::test]
    async fn test_list_paginates_in_order() {
        let service = MemoryTreeService::new()
            .with_record(SkelType::Node, node("c", "root", 3.0))
            .with_record(SkelType::Node, node("a", "root", 1.0))
            .with_record(SkelType::Node, node("b", "root", 2.0));

        let first = service
            .list("m", SkelType::Node, &ListParams::new("root", "sortindex", 2))
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.skellist[0].key(), Some("a"));
        assert_eq!(first.cursor(), Some("2"));

        let second = service
            .list(
                "m",
                SkelType::Node,
                &ListParams::new("root", "sortindex", 2).with_cursor(first.cursor()),
            )
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second.cursor(), None);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let service = MemoryTreeService::new();
        service.fail_action("list/leaf", 403);

        let err = service
            .list("m", SkelType::Leaf, &ListParams::new("root", "sortindex", 99))
            .await
            .unwrap_err();
        assert!(err.is_access_denied());
        assert_eq!(service.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_move_updates_record() {
        let service = MemoryTreeService::new()
            .with_record(SkelType::Node, node("a", "root", 1.0))
            .with_record(SkelType::Node, node("b", "root", 2.0));

        service
            .move_entry("m", &MoveRequest::new(SkelType::Node, "b", "a").with_sort_index(0.5))
            .await
            .unwrap();

        let children = service.children_of("a", SkelType::Node);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].sort_index(), 0.5);
    }
}
