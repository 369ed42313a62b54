//! In-memory tree entries

use std::collections::HashSet;

use crate::error::FieldError;
use crate::model::KEY_FIELD;
use crate::model::Record;
use crate::model::SkelType;
use crate::sort_key;

/// Default headline format.
pub const DEFAULT_FORMAT: &str = "$(name)";

const SIZE_STEP: f64 = 1000.0;
const SIZE_UNITS: [&str; 5] = ["bytes", "KB", "MB", "GB", "TB"];

/// A fetched node or leaf.
///
/// Children are owned exclusively by their parent and kept sorted by
/// `sort_order`. Leaves never hold children.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// Unique key within the tree.
    pub key: String,
    /// Node or leaf.
    pub kind: SkelType,
    /// The record as returned by the backend.
    pub record: Record,
    /// Ordering key derived from `sortindex`.
    pub sort_order: f64,
    /// Owned children, sorted ascending by `sort_order`.
    pub children: Vec<TreeNode>,
    /// Whether the children are shown.
    pub expanded: bool,
    /// Set once a load was issued for this node's children.
    pub children_loaded: bool,
    /// Set when a completed load produced no children.
    pub has_no_children: bool,
    /// Member of the selection.
    pub selected: bool,
    /// Currently being dragged.
    pub dragging: bool,
}

/// Rendered text of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    /// Main line.
    pub headline: String,
    /// Secondary line (file size), if any.
    pub subline: Option<String>,
}

impl TreeNode {
    /// Creates an entry from a fetched record.
    ///
    /// Fails if the record carries no string `key`.
    pub fn from_record(kind: SkelType, record: Record) -> Result<Self, FieldError> {
        let key = record
            .get_string(KEY_FIELD)?
            .ok_or_else(|| FieldError::missing(KEY_FIELD))?
            .to_string();

        Ok(Self {
            key,
            kind,
            sort_order: sort_key::sort_key(&record),
            record,
            children: Vec::new(),
            expanded: false,
            children_loaded: false,
            has_no_children: false,
            selected: false,
            dragging: false,
        })
    }

    /// Returns `true` for nodes.
    pub fn can_expand(&self) -> bool {
        self.kind.behavior().can_expand
    }

    /// Icon identifier for the renderer.
    pub fn icon(&self) -> &'static str {
        self.kind.behavior().icon
    }

    /// The parent key stored in the record.
    pub fn parent_entry(&self) -> Option<&str> {
        self.record.parent_entry()
    }

    /// Appends children and restores the ordering.
    ///
    /// Returns the number of children added; leaves accept none.
    pub fn add_children(&mut self, children: Vec<TreeNode>) -> usize {
        if !self.can_expand() {
            return 0;
        }
        let added = children.len();
        self.children.extend(children);
        sort_siblings(&mut self.children);
        added
    }

    /// Renders headline and size subline.
    ///
    /// `$(field)` markers in `format` are replaced by the record's field
    /// values; unknown fields render empty.
    ///
    /// ```
    /// use hierarchy_lib::model::{Record, SkelType};
    /// use hierarchy_lib::node::TreeNode;
    ///
    /// let record = Record::new().set("key", "l1").set("name", "photo.jpg").set("size", 1500);
    /// let leaf = TreeNode::from_record(SkelType::Leaf, record).unwrap();
    /// let text = leaf.describe(None);
    ///
    /// assert_eq!(text.headline, "photo.jpg");
    /// assert_eq!(text.subline.as_deref(), Some("1.5 KB"));
    /// ```
    pub fn describe(&self, format: Option<&str>) -> Description {
        let headline = render_format(format.unwrap_or(DEFAULT_FORMAT), &self.record);
        let subline = self
            .record
            .get("size")
            .and_then(|v| v.as_f64())
            .filter(|size| *size > 0.0)
            .map(format_size);

        Description { headline, subline }
    }

    /// Walks this node and its descendants depth-first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Sorts siblings ascending by `sort_order`, keeping arrival order on ties.
pub fn sort_siblings(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| sort_key::compare(a.sort_order, b.sort_order));
}

/// Finds an entry by key, depth-first.
pub fn find<'a>(nodes: &'a [TreeNode], key: &str) -> Option<&'a TreeNode> {
    for node in nodes {
        if node.key == key {
            return Some(node);
        }
        if let Some(found) = find(&node.children, key) {
            return Some(found);
        }
    }
    None
}

/// Finds an entry by key, depth-first, for mutation.
pub fn find_mut<'a>(nodes: &'a mut [TreeNode], key: &str) -> Option<&'a mut TreeNode> {
    for node in nodes {
        if node.key == key {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, key) {
            return Some(found);
        }
    }
    None
}

/// Returns the sibling list that holds `key`, and its position in it.
pub fn siblings_of<'a>(nodes: &'a [TreeNode], key: &str) -> Option<(&'a [TreeNode], usize)> {
    if let Some(pos) = nodes.iter().position(|n| n.key == key) {
        return Some((nodes, pos));
    }
    nodes.iter().find_map(|n| siblings_of(&n.children, key))
}

/// Collects the keys of all expanded entries.
pub fn expanded_keys(nodes: &[TreeNode]) -> HashSet<String> {
    let mut keys = HashSet::new();
    for node in nodes {
        node.walk(&mut |n| {
            if n.expanded {
                keys.insert(n.key.clone());
            }
        });
    }
    keys
}

/// Applies `f` to every entry, depth-first.
pub fn for_each_mut(nodes: &mut [TreeNode], f: &mut impl FnMut(&mut TreeNode)) {
    for node in nodes {
        f(node);
        for_each_mut(&mut node.children, f);
    }
}

/// Formats a byte count with 1000-based units and one decimal.
///
/// ```
/// use hierarchy_lib::node::format_size;
///
/// assert_eq!(format_size(512.0), "512.0 bytes");
/// assert_eq!(format_size(2_500_000.0), "2.5 MB");
/// ```
pub fn format_size(bytes: f64) -> String {
    let mut value = bytes;
    for (i, unit) in SIZE_UNITS.iter().enumerate() {
        if value < SIZE_STEP || i == SIZE_UNITS.len() - 1 {
            return format!("{:.1} {}", value, unit);
        }
        value /= SIZE_STEP;
    }
    format!("{:.1} {}", value, SIZE_UNITS[SIZE_UNITS.len() - 1])
}

fn render_format(format: &str, record: &Record) -> String {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;

    while let Some(start) = rest.find("$(") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find(')') {
            Some(end) => {
                let field = after[..end].trim();
                if let Some(value) = record.get(field) {
                    out.push_str(&value.to_display());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
