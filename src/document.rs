// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The Document Assembler and the `Document` type it produces: the
//! top-level loop that alternates between top-level blocks and
//! sections, with the single special case that a level-0 heading
//! appearing as the very first thing in the document is promoted to
//! the document header rather than kept as a nested section.

use crate::attributes::AttributeMap;
use crate::block::{Node, NodeRef};
use crate::cursor::LineCursor;
use crate::dispatcher::{self, Next, Pending};
use crate::error::ParseError;
use crate::preprocessor::{self, FsIncludeResolver, IncludeResolver};
use crate::reference::ReferenceMap;
use crate::section;
use std::path::Path;

/// A parsed document. Once returned from any of the `parse*`
/// constructors it is a read-only tree: nothing further mutates it.
/// Internally it is `Rc`/`Weak`-linked and so is not `Send`; a
/// cross-thread-shareable variant would need an `Arc`-based tree
/// instead, which this crate does not provide.
pub struct Document {
    source: String,
    header: Option<NodeRef>,
    elements: Vec<NodeRef>,
    references: ReferenceMap,
    defines: AttributeMap,
    title: Option<String>,
}

/// §6's derivation: the first defined of the header's own `.Title`
/// line, the header's heading name, the first top-level element's
/// `.Title`, or (if that element is itself a section) its name. Only a
/// section has a `name`; a plain block only ever contributes its
/// `title`.
fn derive_title(header: &Option<NodeRef>, elements: &[NodeRef]) -> Option<String> {
    if let Some(h) = header {
        if let Node::Section(s) = &*h.borrow() {
            if let Some(t) = &s.title {
                return Some(t.clone());
            }
            return Some(s.name.clone());
        }
    }
    let first = elements.first()?;
    match &*first.borrow() {
        Node::Section(s) => s.title.clone().or_else(|| Some(s.name.clone())),
        Node::Block(b) => b.title.clone(),
    }
}

impl Document {
    /// Parses `text` with no include support; an `include::[]` line is
    /// left as inert text if present.
    pub fn parse(text: &str) -> Document {
        Self::build(text, &mut crate::reference::ReferenceMap::new())
    }

    /// Parses `text`, expanding `include::path[]` directives via
    /// `resolver`, resolved relative to `base_dir`.
    pub fn parse_with_resolver(
        text: &str,
        base_dir: &Path,
        resolver: &dyn IncludeResolver,
    ) -> Result<Document, ParseError> {
        let expanded = preprocessor::expand_includes(text, base_dir, resolver)?;
        let mut refs = ReferenceMap::new();
        Ok(Self::build(&expanded, &mut refs))
    }

    /// Reads and parses the file at `path`, resolving any includes
    /// relative to its parent directory via the filesystem.
    pub fn parse_file(path: &Path) -> Result<Document, ParseError> {
        let text = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse_with_resolver(&text, base_dir, &FsIncludeResolver)
    }

    fn build(text: &str, refs: &mut ReferenceMap) -> Document {
        let (processed, defines) = preprocessor::process(text);
        preprocessor::collect_bibliography(&processed, refs);

        let mut cursor = LineCursor::from_text(&processed);
        let mut header: Option<NodeRef> = None;
        let mut elements: Vec<NodeRef> = Vec::new();
        let mut pending = Pending::default();

        loop {
            match dispatcher::next_block(&mut cursor, refs, &mut pending) {
                Next::Block(node) => elements.push(node),
                Next::Heading => {
                    let h = section::detect_heading(&cursor)
                        .expect("dispatcher reported a heading it can't locate");
                    let anchor = pending.anchor.take();
                    if h.level == 0 && header.is_none() && elements.is_empty() {
                        let (node, leftover) = section::build_section(&mut cursor, refs, h, anchor);
                        pending.anchor = leftover;
                        if let Node::Section(s) = &*node.borrow() {
                            elements.extend(s.blocks.iter().cloned());
                        }
                        header = Some(node);
                    } else {
                        let (node, leftover) = section::build_section(&mut cursor, refs, h, anchor);
                        pending.anchor = leftover;
                        elements.push(node);
                    }
                }
                Next::Eof => break,
            }
        }

        let title = derive_title(&header, &elements);

        Document {
            source: text.to_string(),
            header,
            elements,
            references: std::mem::take(refs),
            defines,
            title,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn header(&self) -> Option<&NodeRef> {
        self.header.as_ref()
    }

    pub fn elements(&self) -> &[NodeRef] {
        &self.elements
    }

    pub fn references(&self) -> &ReferenceMap {
        &self.references
    }

    pub fn defines(&self) -> &AttributeMap {
        &self.defines
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Buffer, Context};

    #[test]
    fn level_zero_heading_is_promoted_to_document_header() {
        let doc = Document::parse("= Doc Title\n\npara one\n\n== Section\nbody\n");
        assert_eq!(doc.title(), Some("Doc Title"));
        assert_eq!(doc.elements().len(), 2);
    }

    #[test]
    fn document_without_header_has_no_title() {
        let doc = Document::parse("just a paragraph\n");
        assert_eq!(doc.title(), None);
        assert_eq!(doc.elements().len(), 1);
    }

    #[test]
    fn title_falls_back_to_first_elements_section_name_without_a_header() {
        // No level-0 heading here, so there's no promoted header; the
        // first top-level element is itself a (non-header) section.
        let doc = Document::parse("== Findings\nbody\n");
        assert_eq!(doc.title(), Some("Findings"));
    }

    #[test]
    fn paragraph_text_is_retained_verbatim() {
        let doc = Document::parse("one line\nanother line\n");
        let node = &doc.elements()[0];
        if let Node::Block(b) = &*node.borrow() {
            assert_eq!(b.context, Context::Paragraph);
            if let Buffer::Lines(lines) = &b.buffer {
                assert_eq!(lines, &vec!["one line".to_string(), "another line".to_string()]);
            } else {
                panic!("expected Lines buffer");
            }
        } else {
            panic!("expected a Block");
        }
    }
}
