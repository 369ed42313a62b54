//! Ancestor path reconstruction

use crate::error::ServiceError;
use crate::model::Record;

/// Label of the synthetic segment that terminates every path.
pub const ROOT_LABEL: &str = "root";

/// One entry of the breadcrumb.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub key: String,
    pub name: String,
    /// The fetched record; empty for the synthetic root segment.
    pub record: Record,
    pub is_root: bool,
}

impl PathSegment {
    fn from_record(record: Record) -> Self {
        let key = record.key().unwrap_or_default().to_string();
        let name = record
            .get("name")
            .map(|v| v.to_display())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| key.clone());
        Self {
            key,
            name,
            record,
            is_root: false,
        }
    }

    fn root(key: &str) -> Self {
        Self {
            key: key.to_string(),
            name: ROOT_LABEL.to_string(),
            record: Record::new().set("key", key).set("name", ROOT_LABEL),
            is_root: true,
        }
    }
}

/// The next record the builder needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewStep {
    pub generation: u64,
    pub key: String,
}

/// Rebuilds the path from the root to the viewed node, one `view` at a time.
///
/// Every rebuild bumps the generation; records delivered for an older
/// generation are dropped so a slow chain cannot extend a newer path.
///
/// # Example
///
/// ```
/// use hierarchy_lib::breadcrumb::BreadcrumbBuilder;
/// use hierarchy_lib::model::Record;
///
/// let mut path = BreadcrumbBuilder::new("r");
/// let step = path.rebuild("a");
///
/// let record = Record::new().set("key", "a").set("parententry", "r");
/// let next = path.accept(step.generation, Ok(record)).unwrap();
/// assert_eq!(next.key, "r");
///
/// let root = Record::new().set("key", "r").set("parententry", "r");
/// assert!(path.accept(next.generation, Ok(root)).is_none());
/// assert_eq!(path.labels(), vec!["root", "a"]);
/// ```
#[derive(Debug, Default)]
pub struct BreadcrumbBuilder {
    root: String,
    generation: u64,
    path: Vec<PathSegment>,
    target: Option<String>,
    complete: bool,
}

impl BreadcrumbBuilder {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Changes the root used for the synthetic segment.
    pub fn set_root(&mut self, root: impl Into<String>) {
        self.root = root.into();
    }

    /// Discards the path and starts a new chain at `node`.
    pub fn rebuild(&mut self, node: impl Into<String>) -> ViewStep {
        self.generation += 1;
        self.path.clear();
        self.complete = false;
        let key = node.into();
        self.target = Some(key.clone());
        log::debug!("[BreadcrumbBuilder::rebuild] generation {} from {}", self.generation, key);
        ViewStep {
            generation: self.generation,
            key,
        }
    }

    /// Feeds the record fetched for `generation`.
    ///
    /// Returns the next step while ancestors remain.
    pub fn accept(&mut self, generation: u64, result: Result<Record, ServiceError>) -> Option<ViewStep> {
        if generation != self.generation || self.target.is_none() {
            log::debug!(
                "[BreadcrumbBuilder::accept] dropping stale record of generation {}",
                generation
            );
            return None;
        }

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("[BreadcrumbBuilder::accept] path lookup failed: {}", e);
                self.target = None;
                return None;
            }
        };

        let parent = record
            .parent_entry()
            .filter(|p| Some(*p) != record.key())
            .filter(|p| !self.path.iter().any(|s| s.key == *p))
            .map(str::to_string);

        match parent {
            Some(parent) => {
                self.path.insert(0, PathSegment::from_record(record));
                self.target = Some(parent.clone());
                Some(ViewStep {
                    generation: self.generation,
                    key: parent,
                })
            }
            None => {
                self.path.insert(0, PathSegment::root(&self.root));
                self.target = None;
                self.complete = true;
                None
            }
        }
    }

    /// The segments, root first.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Segment labels, root first.
    pub fn labels(&self) -> Vec<&str> {
        self.path.iter().map(|s| s.name.as_str()).collect()
    }

    /// `true` once the synthetic root segment was reached.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
