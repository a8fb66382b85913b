//! Arena-backed document tree

use crate::error::MarkupResult;
use crate::query::Path;

/// Index of a node in its document; ids follow document order
pub type NodeId = usize;

/// What a node holds
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The synthetic root, always id 0
    Document,
    /// An element with a lowercased name and lowercased attribute keys
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// Decoded character data
    Text(String),
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A parsed HTML document
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Parse markup from a string
    pub fn parse(input: &str) -> MarkupResult<Self> {
        crate::builder::build(input.trim_start_matches('\u{feff}'))
    }

    /// Parse markup from bytes, which must be UTF-8
    pub fn parse_bytes(input: &[u8]) -> MarkupResult<Self> {
        let text = std::str::from_utf8(input)?;
        Self::parse(text)
    }

    pub(crate) fn with_root() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub(crate) fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Name of the element at `id`, if it is one
    pub(crate) fn element_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The root handle, from which paths are usually evaluated
    pub fn root(&self) -> Element<'_> {
        Element { doc: self, id: 0 }
    }

    /// Raw node access
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Number of nodes including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the document holds nothing but its root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

/// Borrowed handle to an element (or the document root)
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> Element<'a> {
    pub(crate) fn new(doc: &'a Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Lowercased tag name; empty for the document root
    pub fn name(&self) -> &'a str {
        self.doc.element_name(self.id).unwrap_or_default()
    }

    /// Attribute value by case-insensitive name
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.attrs()
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All attributes in source order
    pub fn attrs(&self) -> &'a [(String, String)] {
        match &self.doc.nodes[self.id].kind {
            NodeKind::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    /// Concatenated text of every descendant text node
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            let node = &self.doc.nodes[id];
            if let NodeKind::Text(text) = &node.kind {
                out.push_str(text);
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Child elements in document order
    pub fn children(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let doc = self.doc;
        doc.nodes[self.id]
            .children
            .iter()
            .copied()
            .filter(move |&id| doc.element_name(id).is_some())
            .map(move |id| Element::new(doc, id))
    }

    pub fn parent(&self) -> Option<Element<'a>> {
        self.doc.nodes[self.id]
            .parent
            .map(|id| Element::new(self.doc, id))
    }

    /// Evaluate a relative path such as `./thead/tr` or `.//img`
    ///
    /// Results are unique and in document order.
    pub fn select(&self, path: &str) -> MarkupResult<Vec<Element<'a>>> {
        let path = Path::parse(path)?;
        Ok(path
            .evaluate(self.doc, self.id)
            .into_iter()
            .map(|id| Element::new(self.doc, id))
            .collect())
    }
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Element<'_> {}
