//! Event-driven tree construction with HTML recovery rules

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::entities;
use crate::error::{MarkupError, MarkupResult};
use crate::tree::{Document, NodeId, NodeKind};

/// Elements that never have content
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is raw text and is not kept
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

const SECTIONS: &[&str] = &["thead", "tbody", "tfoot"];

pub(crate) fn build(input: &str) -> MarkupResult<Document> {
    let mut builder = TreeBuilder::new();
    feed(&mut builder, input)?;

    if builder.stack.len() > 1 {
        log::debug!("{} element(s) left open at end of input", builder.stack.len() - 1);
    }

    Ok(builder.doc)
}

fn feed(builder: &mut TreeBuilder, input: &str) -> MarkupResult<()> {
    let mut reader = Reader::from_str(input);
    reader
        .trim_text(false)
        .check_end_names(false)
        .check_comments(false)
        .expand_empty_elements(false);

    loop {
        let before = reader.buffer_position();
        let event = match reader.read_event() {
            Ok(event) => event,
            // A bare `<` with no closing `>` left
            Err(quick_xml::Error::UnexpectedEof(_)) => {
                builder.text(&entities::decode(&input[before..]));
                break;
            }
            Err(e) => {
                return Err(MarkupError::Syntax {
                    position: reader.buffer_position(),
                    message: e.to_string(),
                })
            }
        };

        match event {
            Event::Start(e) | Event::Empty(e) if !starts_tag(&e) => {
                // `5 < 10`: the `<` is text and the rest is read again
                builder.text("<");
                let rest = format!("{}>", std::str::from_utf8(&e)?);
                feed(builder, &rest)?;
            }
            Event::Start(e) => {
                let name = builder.open(&e, false);
                if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                    builder.close(&name);
                    if let Err(err) = reader.read_to_end(e.name()) {
                        log::warn!("unterminated <{}> swallowed the rest of the input: {}", name, err);
                        break;
                    }
                }
            }
            Event::Empty(e) => {
                builder.open(&e, true);
            }
            Event::End(e) => {
                builder.close(&lowercase_name(e.name().as_ref()));
            }
            Event::Text(t) => {
                let raw = std::str::from_utf8(&t)?;
                builder.text(&entities::decode(raw));
            }
            Event::CData(c) => {
                let raw = std::str::from_utf8(&c)?;
                builder.text(raw);
            }
            Event::Eof => break,
            // Comments, declarations, doctypes and processing instructions
            _ => {}
        }
    }
    Ok(())
}

/// Tag names start with an ASCII letter
fn starts_tag(start: &BytesStart<'_>) -> bool {
    start
        .name()
        .as_ref()
        .first()
        .is_some_and(|b| b.is_ascii_alphabetic())
}

fn lowercase_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

struct TreeBuilder {
    doc: Document,
    /// Open elements, root at the bottom
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            doc: Document::with_root(),
            stack: vec![0],
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(0)
    }

    fn open(&mut self, start: &BytesStart<'_>, self_closing: bool) -> String {
        let name = lowercase_name(start.name().as_ref());
        self.close_implied(&name);

        let mut attrs = Vec::new();
        for attr in start.html_attributes() {
            match attr {
                Ok(attr) => {
                    let key = lowercase_name(attr.key.as_ref());
                    let raw = String::from_utf8_lossy(&attr.value);
                    attrs.push((key, entities::decode(&raw).into_owned()));
                }
                Err(err) => log::debug!("skipping malformed attribute on <{}>: {}", name, err),
            }
        }

        let id = self.doc.append(
            self.current(),
            NodeKind::Element {
                name: name.clone(),
                attrs,
            },
        );
        if !self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
            self.stack.push(id);
        }
        name
    }

    /// Pop elements that the start of `name` ends implicitly
    fn close_implied(&mut self, name: &str) {
        let (targets, boundaries): (&[&str], &[&str]) = match name {
            "td" | "th" => (&["td", "th"], &["tr", "table", "thead", "tbody", "tfoot"]),
            "tr" => (&["tr"], &["table"]),
            "thead" | "tbody" | "tfoot" => (SECTIONS, &["table"]),
            _ => return,
        };

        for pos in (1..self.stack.len()).rev() {
            let Some(open) = self.doc.element_name(self.stack[pos]) else {
                continue;
            };
            if targets.contains(&open) {
                self.stack.truncate(pos);
                return;
            }
            if boundaries.contains(&open) {
                return;
            }
        }
    }

    fn close(&mut self, name: &str) {
        let found = (1..self.stack.len())
            .rev()
            .find(|&pos| self.doc.element_name(self.stack[pos]) == Some(name));
        match found {
            Some(pos) => self.stack.truncate(pos),
            None => log::debug!("ignoring stray </{}>", name),
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.doc.append(self.current(), NodeKind::Text(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(doc: &Document, path: &str) -> Vec<String> {
        doc.root()
            .select(path)
            .unwrap()
            .iter()
            .map(|e| e.text())
            .collect()
    }

    #[test]
    fn test_implied_cell_and_row_closes() {
        let doc = Document::parse("<table><tr><td>a<td>b<tr><th>c<td>d</table>").unwrap();
        let table = doc.root().select(".//table").unwrap()[0];
        let rows = table.select("./tr").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].select("./td").unwrap().len(), 2);
        assert_eq!(rows[1].select("./th").unwrap().len(), 1);
        assert_eq!(rows[1].select("./td").unwrap().len(), 1);
    }

    #[test]
    fn test_implied_section_closes() {
        let doc =
            Document::parse("<table><thead><tr><th>h<tbody><tr><td>1<tfoot><tr><td>f</table>")
                .unwrap();
        assert_eq!(names(&doc, ".//table/thead/tr"), vec!["h"]);
        assert_eq!(names(&doc, ".//table/tbody/tr"), vec!["1"]);
        assert_eq!(names(&doc, ".//table/tfoot/tr"), vec!["f"]);
    }

    #[test]
    fn test_nested_table_does_not_close_outer_cell() {
        let doc = Document::parse(
            "<table><tr><td>outer<table><tr><td>inner</td></tr></table>tail</td><td>next</td></tr></table>",
        )
        .unwrap();
        let outer = doc.root().select("./table").unwrap()[0];
        let cells = outer.select("./tr/td").unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].text(), "outerinnertail");
        assert_eq!(cells[1].text(), "next");
    }

    #[test]
    fn test_void_elements_and_self_closing() {
        let doc = Document::parse(r#"<td>a<br>b<img src="x.png"><span/>c</td>"#).unwrap();
        let td = doc.root().children().next().unwrap();
        let kids: Vec<&str> = td.children().map(|e| e.name()).collect();
        assert_eq!(kids, vec!["br", "img", "span"]);
        assert_eq!(td.text(), "abc");
        assert_eq!(td.select("./img").unwrap()[0].attr("src"), Some("x.png"));
    }

    #[test]
    fn test_script_and_style_are_dropped() {
        let doc = Document::parse(
            "<div><style>td { color: red }</style><script>var x = 1;</script>kept</div>",
        )
        .unwrap();
        let div = doc.root().children().next().unwrap();
        assert_eq!(div.text(), "kept");
    }

    #[test]
    fn test_entities_and_unquoted_attributes() {
        let doc = Document::parse("<td class=num title='a &amp; b' hidden>1&nbsp;000 &lt; 2</td>")
            .unwrap();
        let td = doc.root().children().next().unwrap();
        assert_eq!(td.attr("class"), Some("num"));
        assert_eq!(td.attr("title"), Some("a & b"));
        assert_eq!(td.attr("hidden"), Some(""));
        assert_eq!(td.text(), "1\u{a0}000 < 2");
    }

    #[test]
    fn test_bare_less_than_is_text() {
        let doc = Document::parse("<table><tr><td>5 < 10</td><td>1<2</td></tr></table>").unwrap();
        assert_eq!(names(&doc, ".//td"), vec!["5 < 10", "1<2"]);

        let doc = Document::parse("<td>x <= y > z</td>").unwrap();
        assert_eq!(names(&doc, ".//td"), vec!["x <= y > z"]);
    }

    #[test]
    fn test_unclosed_less_than_at_end() {
        let doc = Document::parse("<p>1 < 2").unwrap();
        assert_eq!(doc.root().text(), "1 < 2");
    }

    #[test]
    fn test_stray_end_tags_ignored() {
        let doc = Document::parse("<div></span>text</p></div>after").unwrap();
        let div = doc.root().children().next().unwrap();
        assert_eq!(div.text(), "text");
        assert_eq!(doc.root().text(), "textafter");
    }

    #[test]
    fn test_doctype_and_comments() {
        let doc = Document::parse("<!DOCTYPE html><!-- note --><html><body>x</body></html>")
            .unwrap();
        assert_eq!(names(&doc, ".//body"), vec!["x"]);
    }
}
