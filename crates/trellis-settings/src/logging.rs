//! Logging and debugging facilities for the settings registry.
//!
//! This module provides:
//! - `tracing` target names for filtering registry logs by subsystem
//! - Debug visualization for settings trees
//!
//! # Tracing Integration
//!
//! The registry instruments mutations with the `tracing` crate. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! # Debug Visualization
//!
//! Use [`SettingsTreeDebug`] to get a human-readable view of a registry's
//! tree:
//!
//! ```ignore
//! use trellis_settings::SettingsTreeDebug;
//!
//! let debug = SettingsTreeDebug::new(registry.tree());
//! println!("{}", debug);
//! ```

use std::fmt::{self, Write as FmtWrite};

use crate::error::Result;
use crate::tree::{NodeId, NodeKind, SettingsTree};

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Whole-crate target.
    pub const SETTINGS: &str = "trellis_settings";
    /// Tree structure target (node and entry registration).
    pub const TREE: &str = "trellis_settings::tree";
    /// Registry target (value reads and writes, migrations).
    pub const REGISTRY: &str = "trellis_settings::registry";
}

/// Style options for settings tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    Unicode,
    /// Compact single-line representation.
    Compact,
}

impl Default for TreeStyle {
    fn default() -> Self {
        Self::Unicode
    }
}

/// Configuration for settings tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show entry kinds.
    pub show_kinds: bool,
    /// Whether to show entry defaults.
    pub show_defaults: bool,
    /// Whether to show entry descriptions.
    pub show_descriptions: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_kinds: true,
            show_defaults: false,
            show_descriptions: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_defaults: true,
            show_descriptions: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_kinds: false,
            show_defaults: false,
            show_descriptions: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing a settings tree.
///
/// Nodes appear with their local keys, named lists with their item
/// placeholder, and entries with their declared kind and optionally their
/// default and description.
#[derive(Clone)]
pub struct SettingsTreeDebug<'a> {
    tree: &'a SettingsTree,
    options: TreeFormatOptions,
}

impl<'a> SettingsTreeDebug<'a> {
    /// Create a new debug visualizer with default options.
    pub fn new(tree: &'a SettingsTree) -> Self {
        Self {
            tree,
            options: TreeFormatOptions::default(),
        }
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(tree: &'a SettingsTree, options: TreeFormatOptions) -> Self {
        Self { tree, options }
    }

    /// Format the entire tree starting from the root.
    pub fn format_all(&self) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "Settings Tree:").expect("write to String");
        self.format_subtree_into(self.tree.root(), 0, true, &mut output)?;
        Ok(output)
    }

    /// Format a subtree starting from a specific node.
    pub fn format_subtree(&self, root: NodeId) -> Result<String> {
        let mut output = String::new();
        self.format_subtree_into(root, 0, true, &mut output)?;
        Ok(output)
    }

    fn format_subtree_into(
        &self,
        id: NodeId,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) -> Result<()> {
        if let Some(max) = self.options.max_depth {
            if depth > max {
                return Ok(());
            }
        }

        let kind = self.tree.node_kind(id)?;
        let key = self.tree.node_key(id)?;

        let prefix = self.build_prefix(depth, is_last);
        output.push_str(&prefix);
        match kind {
            NodeKind::Root => output.push_str("(root)"),
            NodeKind::Standard => output.push_str(key),
            NodeKind::NamedList => {
                write!(output, "{key}/items/*").expect("write to String");
            }
        }
        output.push('\n');

        let settings = self.tree.children_settings(id)?.to_vec();
        let children = self.tree.children_nodes(id)?.to_vec();
        let total = settings.len() + children.len();

        for (i, entry) in settings.iter().enumerate() {
            let entry_prefix = self.build_prefix(depth + 1, i + 1 == total);
            output.push_str(&entry_prefix);
            output.push_str(self.tree.entry_key(*entry)?);
            if self.options.show_kinds {
                write!(output, ": {}", self.tree.entry_kind(*entry)?).expect("write to String");
            }
            if self.options.show_defaults {
                write!(output, " = {}", self.tree.entry_default(*entry)?)
                    .expect("write to String");
            }
            if self.options.show_descriptions {
                let description = self.tree.entry_description(*entry)?;
                if !description.is_empty() {
                    write!(output, "  ({description})").expect("write to String");
                }
            }
            output.push('\n');
        }

        for (i, child) in children.iter().enumerate() {
            let child_is_last = settings.len() + i + 1 == total;
            self.format_subtree_into(*child, depth + 1, child_is_last, output)?;
        }

        Ok(())
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, space) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "   "),
            TreeStyle::Unicode => (
                "\u{2502}",
                "\u{251c}\u{2500}\u{2500}",
                "\u{2514}\u{2500}\u{2500}",
            ),
            TreeStyle::Compact => ("", "- ", "- "),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            for _ in 0..self.options.indent_size {
                prefix.push(' ');
            }
        }

        if is_last {
            prefix.push_str(if self.options.style == TreeStyle::Unicode {
                "\u{2514}\u{2500}\u{2500} "
            } else {
                space
            });
        } else {
            prefix.push_str(corner);
            prefix.push(' ');
        }

        prefix
    }
}

impl fmt::Display for SettingsTreeDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format_all() {
            Ok(output) => write!(f, "{}", output),
            Err(e) => write!(f, "Error formatting settings tree: {}", e),
        }
    }
}
