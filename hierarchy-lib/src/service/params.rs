//! Request parameter types.

use std::collections::BTreeMap;

use crate::model::Value;
use crate::model::SkelType;
use crate::model::PARENT_FIELD;

/// An opaque parameter mapping (context, overrides, ...).
pub type Params = BTreeMap<String, Value>;

const ORDER_BY: &str = "orderby";
const AMOUNT: &str = "amount";
const CURSOR: &str = "cursor";

/// Parameters of a `list/<node|leaf>` request.
///
/// Built in merge order: base fields, cursor, caller overrides, then the
/// ambient context. Later layers win on key collisions.
///
/// # Example
///
/// ```
/// use hierarchy_lib::service::{ListParams, Params};
///
/// let mut context = Params::new();
/// context.insert("language".into(), "de".into());
///
/// let params = ListParams::new("root", "sortindex", 99)
///     .with_cursor(Some("c1"))
///     .merge(&context);
///
/// assert_eq!(params.parent_entry(), Some("root"));
/// assert_eq!(params.cursor(), Some("c1"));
/// assert_eq!(params.amount(), Some(99));
/// assert!(params.to_query().contains(&("language".to_string(), "de".to_string())));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    params: Params,
}

impl ListParams {
    /// Creates the base parameters.
    pub fn new(parent_entry: impl Into<String>, order_by: impl Into<String>, amount: u32) -> Self {
        let mut params = Params::new();
        params.insert(PARENT_FIELD.to_string(), Value::String(parent_entry.into()));
        params.insert(ORDER_BY.to_string(), Value::String(order_by.into()));
        params.insert(AMOUNT.to_string(), Value::from(amount));
        Self { params }
    }

    /// Adds the continuation cursor, if any.
    pub fn with_cursor(mut self, cursor: Option<&str>) -> Self {
        if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
            self.params
                .insert(CURSOR.to_string(), Value::String(cursor.to_string()));
        }
        self
    }

    /// Merges another mapping on top.
    pub fn merge(mut self, extra: &Params) -> Self {
        for (k, v) in extra {
            self.params.insert(k.clone(), v.clone());
        }
        self
    }

    /// Returns the parent key.
    pub fn parent_entry(&self) -> Option<&str> {
        self.params.get(PARENT_FIELD).and_then(Value::as_str)
    }

    /// Returns the continuation cursor.
    pub fn cursor(&self) -> Option<&str> {
        self.params.get(CURSOR).and_then(Value::as_str)
    }

    /// Returns the ordering field.
    pub fn order_by(&self) -> Option<&str> {
        self.params.get(ORDER_BY).and_then(Value::as_str)
    }

    /// Returns the page size.
    pub fn amount(&self) -> Option<u32> {
        self.params
            .get(AMOUNT)
            .and_then(Value::as_f64)
            .map(|n| n as u32)
    }

    /// Returns a single parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Returns the full mapping.
    pub fn as_params(&self) -> &Params {
        &self.params
    }

    /// Renders the mapping as query pairs; nulls are skipped.
    pub fn to_query(&self) -> Vec<(String, String)> {
        params_to_query(&self.params)
    }
}

/// Renders a mapping as query pairs; nulls are skipped.
pub fn params_to_query(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.to_display()))
        .collect()
}

/// A `move` request: reparent and optionally reposition an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRequest {
    /// Kind of the moved entry.
    pub skel_type: SkelType,
    /// Key of the moved entry.
    pub key: String,
    /// New parent key.
    pub parent_node: String,
    /// New sort index; `None` lets the backend pick.
    pub sort_index: Option<f64>,
}

impl MoveRequest {
    /// Creates a reparenting move without explicit position.
    pub fn new(skel_type: SkelType, key: impl Into<String>, parent_node: impl Into<String>) -> Self {
        Self {
            skel_type,
            key: key.into(),
            parent_node: parent_node.into(),
            sort_index: None,
        }
    }

    /// Pins the sort index.
    pub fn with_sort_index(mut self, sort_index: f64) -> Self {
        self.sort_index = Some(sort_index);
        self
    }

    /// Renders the request as form fields.
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("skelType", self.skel_type.as_str().to_string()),
            ("key", self.key.clone()),
            ("parentNode", self.parent_node.clone()),
        ];
        if let Some(index) = self.sort_index {
            form.push(("sortindex", index.to_string()));
        }
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_order() {
        let mut overrides = Params::new();
        overrides.insert("amount".into(), Value::from(10));
        let mut context = Params::new();
        context.insert("amount".into(), Value::from(5));

        let params = ListParams::new("p", "sortindex", 99)
            .merge(&overrides)
            .merge(&context);
        assert_eq!(params.amount(), Some(5));
    }

    #[test]
    fn test_empty_cursor_is_omitted() {
        let params = ListParams::new("p", "sortindex", 99).with_cursor(Some(""));
        assert_eq!(params.cursor(), None);
    }

    #[test]
    fn test_move_form() {
        let form = MoveRequest::new(SkelType::Leaf, "l1", "n2")
            .with_sort_index(2.5)
            .to_form();
        assert_eq!(
            form,
            vec![
                ("skelType", "leaf".to_string()),
                ("key", "l1".to_string()),
                ("parentNode", "n2".to_string()),
                ("sortindex", "2.5".to_string()),
            ]
        );

        let form = MoveRequest::new(SkelType::Node, "n1", "root").to_form();
        assert_eq!(form.len(), 3);
    }
}
