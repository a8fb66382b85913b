//! Relative element paths
//!
//! Supported grammar: an optional leading `.`, then steps separated by `/`
//! (child) or `//` (descendant). A step is a tag name or `*`.

use crate::error::{MarkupError, MarkupResult};
use crate::tree::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    /// `None` matches any element
    name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Path {
    steps: Vec<Step>,
}

impl Path {
    pub(crate) fn parse(path: &str) -> MarkupResult<Self> {
        let invalid = |reason: &str| MarkupError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty path"));
        }

        let rest = trimmed.strip_prefix('.').unwrap_or(trimmed);
        let (mut axis, rest) = if let Some(rest) = rest.strip_prefix("//") {
            (Axis::Descendant, rest)
        } else if let Some(rest) = rest.strip_prefix('/') {
            (Axis::Child, rest)
        } else if trimmed.starts_with('.') {
            return Err(invalid("expected '/' after '.'"));
        } else {
            (Axis::Child, rest)
        };

        let mut steps = Vec::new();
        for segment in rest.split('/') {
            if segment.is_empty() {
                if axis == Axis::Descendant {
                    return Err(invalid("empty step"));
                }
                axis = Axis::Descendant;
                continue;
            }
            let name = if segment == "*" {
                None
            } else if segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
            {
                Some(segment.to_ascii_lowercase())
            } else {
                return Err(invalid(&format!("unsupported step '{}'", segment)));
            };
            steps.push(Step { axis, name });
            axis = Axis::Child;
        }

        if steps.is_empty() || axis == Axis::Descendant {
            return Err(invalid("path must end with a step"));
        }
        Ok(Self { steps })
    }

    /// Matching element ids, unique and in document order
    pub(crate) fn evaluate(&self, doc: &Document, start: NodeId) -> Vec<NodeId> {
        let mut current = vec![start];
        for step in &self.steps {
            let mut next = Vec::new();
            for &id in &current {
                match step.axis {
                    Axis::Child => collect_children(doc, id, step, &mut next),
                    Axis::Descendant => collect_descendants(doc, id, step, &mut next),
                }
            }
            next.sort_unstable();
            next.dedup();
            current = next;
            if current.is_empty() {
                break;
            }
        }
        current
    }
}

fn matches(doc: &Document, id: NodeId, step: &Step) -> bool {
    match (doc.element_name(id), &step.name) {
        (Some(_), None) => true,
        (Some(name), Some(wanted)) => name == wanted,
        (None, _) => false,
    }
}

fn collect_children(doc: &Document, id: NodeId, step: &Step, out: &mut Vec<NodeId>) {
    if let Some(node) = doc.node(id) {
        out.extend(node.children.iter().copied().filter(|&c| matches(doc, c, step)));
    }
}

fn collect_descendants(doc: &Document, id: NodeId, step: &Step, out: &mut Vec<NodeId>) {
    let Some(node) = doc.node(id) else {
        return;
    };
    let mut stack: Vec<NodeId> = node.children.iter().rev().copied().collect();
    while let Some(child) = stack.pop() {
        if matches(doc, child, step) {
            out.push(child);
        }
        if let Some(n) = doc.node(child) {
            stack.extend(n.children.iter().rev());
        }
    }
}
