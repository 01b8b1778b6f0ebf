//! Indented text view of a committed sequence.

use std::fmt::Write as _;

use tabledrag::Node;

/// Renders one row per line, indented by depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRenderer {
    indent: String,
    show_weight: bool,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            indent: "  ".to_owned(),
            show_weight: true,
        }
    }
}

impl TextRenderer {
    #[must_use]
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    #[must_use]
    pub fn with_weights(mut self, show: bool) -> Self {
        self.show_weight = show;
        self
    }

    #[must_use]
    pub fn render<'a>(&self, nodes: impl IntoIterator<Item = &'a Node>) -> String {
        let mut out = String::new();
        for node in nodes {
            for _ in 0..node.depth() {
                out.push_str(&self.indent);
            }
            out.push_str(node.id().as_str());
            if let Some(kind) = node.kind() {
                let _ = write!(out, " [{kind}]");
            }
            if self.show_weight {
                let _ = write!(out, " (w={})", node.weight());
            }
            out.push('\n');
        }
        out
    }
}
