//! Page types for paginated list results.

use serde::Deserialize;
use serde::Serialize;

use super::Record;

/// One page of a `list/<node|leaf>` answer.
///
/// Besides the records, a page carries the opaque continuation cursor and
/// the bone structure describing the record fields.
///
/// # Example
///
/// ```
/// use hierarchy_lib::model::ListResponse;
///
/// let json = r#"{"skellist": [{"key": "a"}], "cursor": "c2", "structure": []}"#;
/// let page: ListResponse = serde_json::from_str(json).unwrap();
///
/// assert_eq!(page.len(), 1);
/// assert_eq!(page.cursor(), Some("c2"));
/// assert!(page.has_more());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    /// The records in this page.
    #[serde(default)]
    pub skellist: Vec<Record>,
    /// Continuation token for the next page.
    #[serde(default)]
    pub cursor: Option<String>,
    /// Bone structure as sent by the backend, kept verbatim.
    #[serde(default)]
    pub structure: serde_json::Value,
}

impl ListResponse {
    /// Creates a page with records and no continuation.
    pub fn new(skellist: Vec<Record>) -> Self {
        Self {
            skellist,
            cursor: None,
            structure: serde_json::Value::Null,
        }
    }

    /// Sets the continuation cursor.
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Returns the continuation cursor; an empty string counts as none.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }

    /// Returns `true` if this page has no records.
    pub fn is_empty(&self) -> bool {
        self.skellist.is_empty()
    }

    /// Returns the number of records in this page.
    pub fn len(&self) -> usize {
        self.skellist.len()
    }

    /// Returns `true` if another page should be requested.
    ///
    /// Pagination stops on an empty cursor or an empty batch.
    pub fn has_more(&self) -> bool {
        !self.is_empty() && self.cursor().is_some()
    }
}

/// Answer of a `view/<kind>/<key>` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewResponse {
    /// The requested record.
    pub values: Record,
}
