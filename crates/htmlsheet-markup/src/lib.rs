//! # htmlsheet-markup
//!
//! A forgiving HTML tree for table extraction.
//!
//! Tokenizing is delegated to quick-xml with end-name checks disabled; this
//! crate adds the HTML bits on top: void elements, implied closing of table
//! cells, rows and sections, character references, and `script`/`style`
//! skipping. Elements are addressed through small relative paths:
//!
//! ```
//! use htmlsheet_markup::Document;
//!
//! let doc = Document::parse("<table><tr><td>1<td>2</table>").unwrap();
//! let table = doc.root().select(".//table").unwrap()[0];
//! let cells = table.select("./tr/td").unwrap();
//! assert_eq!(cells.len(), 2);
//! assert_eq!(cells[1].text(), "2");
//! ```

mod builder;
pub mod entities;
pub mod error;
mod query;
mod tree;

pub use error::{MarkupError, MarkupResult};
pub use tree::{Document, Element, Node, NodeId, NodeKind};
