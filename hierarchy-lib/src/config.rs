//! Tree configuration and module registry

use std::collections::HashMap;
use std::time::Duration;

use crate::service::Params;

/// Default number of records requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 99;

/// Default field used for sibling ordering.
pub const DEFAULT_ORDER_BY: &str = "sortindex";

/// Which flavour of tree the engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeVariant {
    /// Plain expandable tree.
    #[default]
    Tree,
    /// Folder browser: breadcrumb path, activating a node navigates into it.
    Browser,
}

/// Drag-and-drop tuning.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use hierarchy_lib::config::DragConfig;
///
/// let drag = DragConfig::default()
///     .with_strip_ratio(0.2)
///     .with_leave_delay(Duration::from_millis(500));
/// assert_eq!(drag.strip_ratio, 0.2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DragConfig {
    /// Height of the before/after strips as a fraction of the row height.
    ///
    /// Default: 0.25
    pub strip_ratio: f64,

    /// Delay before a drag-leave clears the classification.
    ///
    /// Default: 2 seconds
    pub leave_delay: Duration,

    /// Delay of the follow-up check when the pointer came back in between.
    ///
    /// Default: 5 seconds
    pub rearm_delay: Duration,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            strip_ratio: 0.25,
            leave_delay: Duration::from_secs(2),
            rearm_delay: Duration::from_secs(5),
        }
    }
}

impl DragConfig {
    /// Sets the strip ratio, clamped to `0.0..=0.5`.
    pub fn with_strip_ratio(mut self, ratio: f64) -> Self {
        self.strip_ratio = ratio.clamp(0.0, 0.5);
        self
    }

    /// Sets the drag-leave delay.
    pub fn with_leave_delay(mut self, delay: Duration) -> Self {
        self.leave_delay = delay;
        self
    }

    /// Sets the re-arm delay.
    pub fn with_rearm_delay(mut self, delay: Duration) -> Self {
        self.rearm_delay = delay;
        self
    }
}

/// Configuration of a [`TreeEngine`](crate::engine::TreeEngine).
///
/// # Example
///
/// ```
/// use hierarchy_lib::config::{TreeConfig, TreeVariant};
///
/// let config = TreeConfig::new("file")
///     .with_root_node("root-1")
///     .with_variant(TreeVariant::Browser)
///     .with_context_field("language", "de");
///
/// assert_eq!(config.page_size, 99);
/// assert_eq!(config.root_node.as_deref(), Some("root-1"));
/// ```
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Backend module name.
    pub module: String,
    /// Root node key; `None` asks the backend via `listRootNodes`.
    pub root_node: Option<String>,
    /// Initially viewed subtree; defaults to the root.
    pub node: Option<String>,
    /// Opaque parameters merged into every list request.
    pub context: Params,
    /// Records per page.
    pub page_size: u32,
    /// Ordering field.
    pub order_by: String,
    /// Whether leaves are fetched alongside nodes.
    pub load_leaves: bool,
    /// Tree or browser.
    pub variant: TreeVariant,
    /// Multi-selection outside selector mode.
    pub multi_select: bool,
    /// Drag-and-drop tuning.
    pub drag: DragConfig,
}

impl TreeConfig {
    /// Creates a config for the given module with default values.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            root_node: None,
            node: None,
            context: Params::new(),
            page_size: DEFAULT_PAGE_SIZE,
            order_by: DEFAULT_ORDER_BY.to_string(),
            load_leaves: true,
            variant: TreeVariant::default(),
            multi_select: true,
            drag: DragConfig::default(),
        }
    }

    /// Sets the root node.
    pub fn with_root_node(mut self, root: impl Into<String>) -> Self {
        self.root_node = Some(root.into());
        self
    }

    /// Sets the initially viewed node.
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Replaces the context mapping.
    pub fn with_context(mut self, context: Params) -> Self {
        self.context = context;
        self
    }

    /// Adds one context field.
    pub fn with_context_field(
        mut self,
        field: impl Into<String>,
        value: impl Into<crate::model::Value>,
    ) -> Self {
        self.context.insert(field.into(), value.into());
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, amount: u32) -> Self {
        self.page_size = amount;
        self
    }

    /// Enables or disables the leaf fetch.
    pub fn with_leaves(mut self, enabled: bool) -> Self {
        self.load_leaves = enabled;
        self
    }

    /// Sets the variant.
    pub fn with_variant(mut self, variant: TreeVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Enables or disables multi-selection.
    pub fn with_multi_select(mut self, enabled: bool) -> Self {
        self.multi_select = enabled;
        self
    }

    /// Sets the drag tuning.
    pub fn with_drag(mut self, drag: DragConfig) -> Self {
        self.drag = drag;
        self
    }
}

// =============================================================================
// Module registry
// =============================================================================

/// What the host knows about a backend module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Handler name, e.g. `tree`, `tree.browser`, `list`.
    pub handler: String,
    /// Module whose root nodes this module supplies.
    pub root_node_of: Option<String>,
    /// Display format for entries, e.g. `$(name)`.
    pub format: Option<String>,
}

impl ModuleInfo {
    /// Creates info for a handler.
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            ..Default::default()
        }
    }

    /// Marks this module as the root-node source of another module.
    pub fn root_node_of(mut self, module: impl Into<String>) -> Self {
        self.root_node_of = Some(module.into());
        self
    }

    /// Sets the display format.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Returns `true` if a tree handles this module.
    pub fn is_tree(&self) -> bool {
        self.handler == "tree" || self.handler.starts_with("tree.")
    }

    /// Returns `true` if the browser variant handles this module.
    pub fn is_tree_browser(&self) -> bool {
        self.handler == "tree.browser" || self.handler.starts_with("tree.browser.")
    }
}

/// Lookup of module configuration, supplied by the host.
pub trait ModuleRegistry: Send + Sync {
    /// Returns the info for a module, if known.
    fn module_info(&self, module: &str) -> Option<ModuleInfo>;

    /// Returns all known modules.
    fn modules(&self) -> Vec<(String, ModuleInfo)>;
}

/// A `HashMap`-backed registry.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    modules: HashMap<String, ModuleInfo>,
}

impl StaticRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module (builder pattern).
    pub fn with(mut self, module: impl Into<String>, info: ModuleInfo) -> Self {
        self.modules.insert(module.into(), info);
        self
    }
}

impl ModuleRegistry for StaticRegistry {
    fn module_info(&self, module: &str) -> Option<ModuleInfo> {
        self.modules.get(module).cloned()
    }

    fn modules(&self) -> Vec<(String, ModuleInfo)> {
        self.modules
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Picks the variant matching a module's handler, if a tree handles it.
pub fn variant_for(info: &ModuleInfo) -> Option<TreeVariant> {
    if info.is_tree_browser() {
        Some(TreeVariant::Browser)
    } else if info.is_tree() {
        Some(TreeVariant::Tree)
    } else {
        None
    }
}
