// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The Block Dispatcher: classifies the line(s) currently at the front
//! of the cursor and constructs exactly one `Node`, consuming whatever
//! lines that construction needs. Pending anchor/title/caption/source
//! lines accumulate across calls (a line like `[caption="x"]` doesn't
//! belong to anything until the next substantive line arrives) in the
//! `Pending` struct the caller owns and threads through.

use crate::block::{Block, Buffer, Context, Node, NodeRef};
use crate::cursor::{is_blank, strip_eol, LineCursor};
use crate::list;
use crate::patterns;
use crate::reference::{record_anchor, ReferenceMap};
use crate::section;

/// Lines that precede a block or heading without belonging to any
/// block by themselves.
#[derive(Default)]
pub struct Pending {
    pub anchor: Option<String>,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub source_type: Option<String>,
}

impl Pending {
    fn apply_to(&mut self, node: &NodeRef) {
        if let Some(anchor) = self.anchor.take() {
            node.borrow_mut().set_anchor_if_absent(anchor);
        }
        if let Some(title) = self.title.take() {
            node.borrow_mut().set_title_if_absent(title);
        }
        if let Some(caption) = self.caption.take() {
            node.borrow_mut().set_caption_if_absent(caption);
        }
        if let Some(source_type) = self.source_type.take() {
            if let Node::Block(b) = &mut *node.borrow_mut() {
                if b.source_type.is_none() {
                    b.source_type = Some(source_type);
                }
            }
        }
    }

    fn stray_warning(&self) {
        if self.title.is_some() || self.caption.is_some() || self.source_type.is_some() {
            log::warn!("discarding title/caption/source attribute stranded before a heading");
        }
    }
}

/// What a single dispatch call produced.
pub enum Next {
    Block(NodeRef),
    /// The cursor now sits at a heading line; the caller (Section
    /// Builder) owns heading recognition and recursion.
    Heading,
    Eof,
}

/// Reads one fenced block whose closing fence is an exact repeat of the
/// opening line, collecting the raw lines in between verbatim.
fn read_fenced(cursor: &mut LineCursor, fence: &regex::Regex) -> Vec<String> {
    let mut lines = Vec::new();
    loop {
        match cursor.pop() {
            None => {
                log::warn!("unterminated fenced block reached end of input");
                break;
            }
            Some(line) => {
                if fence.is_match(strip_eol(&line)) {
                    break;
                }
                lines.push(strip_eol(&line).to_string());
            }
        }
    }
    lines
}

/// Consumes one plain paragraph: contiguous non-blank lines, stopping
/// at a blank line, EOF, or a line that starts a new block/heading (in
/// which case that line is pushed back for the caller).
fn read_paragraph(cursor: &mut LineCursor) -> Vec<String> {
    let mut lines = Vec::new();
    loop {
        if cursor.is_empty() || is_blank(cursor.peek(0)) {
            break;
        }
        if starts_new_block_or_heading(cursor) {
            break;
        }
        lines.push(strip_eol(&cursor.pop().unwrap()).to_string());
    }
    lines
}

/// True if the line currently at the front of the cursor opens some
/// other construct, and so should not be folded into an in-progress
/// paragraph. Per rule 18, only a `listing` or `oblock` fence mid-
/// paragraph interrupts accumulation — nothing else stops it early.
fn starts_new_block_or_heading(cursor: &LineCursor) -> bool {
    let line = strip_eol(cursor.peek(0));
    if line.is_empty() {
        return false;
    }
    patterns::OBLOCK.is_match(line) || patterns::LISTING.is_match(line)
}

/// Produces the next node, or signals why none was produced.
///
/// Implements the 18 ordered rules from the dispatch contract: anchor,
/// title, caption, source-type and comment lines accumulate into
/// `pending` and loop; a heading stops dispatch outright; everything
/// else constructs exactly one block (fenced, list, or paragraph) and
/// attaches whatever was pending onto it.
pub fn next_block(
    cursor: &mut LineCursor,
    refs: &mut ReferenceMap,
    pending: &mut Pending,
) -> Next {
    loop {
        cursor.skip_blank();
        if cursor.is_empty() {
            return Next::Eof;
        }

        if section::detect_heading(cursor).is_some() {
            pending.stray_warning();
            return Next::Heading;
        }

        let raw = cursor.peek(0).to_string();
        let line = strip_eol(&raw);

        // Rule: bare anchor. Attaches to whatever comes next, block or
        // heading.
        if let Some(caps) = patterns::ANCHOR.captures(line) {
            let id = caps[1].to_string();
            cursor.pop();
            record_anchor(refs, &id);
            if pending.anchor.is_some() {
                log::debug!("anchor {id} overrides a still-pending earlier anchor");
            }
            pending.anchor = Some(id);
            continue;
        }

        // Rule: block title (`.Title`).
        if let Some(caps) = patterns::TITLE.captures(line) {
            pending.title = Some(caps[1].to_string());
            cursor.pop();
            continue;
        }

        // Rule: caption attribute line.
        if let Some(caps) = patterns::CAPTION.captures(line) {
            pending.caption = Some(caps[1].to_string());
            cursor.pop();
            continue;
        }

        // Rule: `[source,lang]` attribute line, applies to the listing
        // block that must immediately follow.
        if let Some(caps) = patterns::LISTING_SOURCE.captures(line) {
            pending.source_type = caps.get(1).map(|m| m.as_str().to_string());
            cursor.pop();
            continue;
        }

        // Rule: line comment, silently dropped.
        if patterns::COMMENT.is_match(line) {
            cursor.pop();
            continue;
        }

        // Note: bibliography entries are not their own dispatch rule —
        // a line like `- [[[id]]] text` falls through to whichever rule
        // the ordered cascade below actually assigns it (here, ulist,
        // since the pattern leads with `-`). The reference-table side
        // effect for bibliography entries happens once, up front, in
        // the preprocessor's `collect_bibliography` pass.

        // Rules: delimited blocks, fence-matched on an exact repeat of
        // the opening line.
        if patterns::OBLOCK.is_match(line) {
            cursor.pop();
            let inner = read_fenced(cursor, &patterns::OBLOCK);
            let node = parse_inner_as_children(&inner, Context::OBlock, refs);
            pending.apply_to(&node);
            return Next::Block(node);
        }
        if patterns::LISTING.is_match(line) {
            cursor.pop();
            let inner = read_fenced(cursor, &patterns::LISTING);
            let mut block = Block::new(Context::Listing, Buffer::Lines(inner));
            block.source_type = pending.source_type.take();
            let node = block.into_node();
            pending.apply_to(&node);
            return Next::Block(node);
        }
        if patterns::LIT_BLK.is_match(line) {
            cursor.pop();
            let inner = read_fenced(cursor, &patterns::LIT_BLK);
            let node = Block::new(Context::Literal, Buffer::Lines(inner)).into_node();
            pending.apply_to(&node);
            return Next::Block(node);
        }
        if patterns::SIDEBAR_BLK.is_match(line) {
            cursor.pop();
            let inner = read_fenced(cursor, &patterns::SIDEBAR_BLK);
            let node = parse_inner_as_children(&inner, Context::Sidebar, refs);
            pending.apply_to(&node);
            return Next::Block(node);
        }
        if patterns::QUOTE.is_match(line) {
            cursor.pop();
            let inner = read_fenced(cursor, &patterns::QUOTE);
            let node = parse_inner_as_children(&inner, Context::Quote, refs);
            pending.apply_to(&node);
            return Next::Block(node);
        }
        if patterns::EXAMPLE.is_match(line) {
            cursor.pop();
            let inner = read_fenced(cursor, &patterns::EXAMPLE);
            let node = parse_inner_as_children(&inner, Context::Example, refs);
            pending.apply_to(&node);
            return Next::Block(node);
        }

        // Rule: `[verse]`/`[NOTE]` attribute lines, each followed by
        // either a delimited block or a single paragraph.
        if patterns::VERSE.is_match(line) {
            cursor.pop();
            let node = read_attributed_paragraph_or_block(cursor, Context::Verse, refs);
            pending.apply_to(&node);
            return Next::Block(node);
        }
        if patterns::NOTE.is_match(line) {
            cursor.pop();
            let node = read_attributed_paragraph_or_block(cursor, Context::Note, refs);
            pending.apply_to(&node);
            return Next::Block(node);
        }

        // Rules: lists. Each list pattern starts a segment run that
        // `list::build` consumes in full.
        if patterns::ULIST.is_match(line) {
            let node = list::build_ulist(cursor, refs);
            pending.apply_to(&node);
            return Next::Block(node);
        }
        if patterns::OLIST.is_match(line) {
            let node = list::build_olist(cursor, refs);
            pending.apply_to(&node);
            return Next::Block(node);
        }
        if patterns::COLIST.is_match(line) {
            let node = list::build_colist(cursor, refs);
            pending.apply_to(&node);
            return Next::Block(node);
        }
        if patterns::DLIST.is_match(line) {
            let node = list::build_dlist(cursor, refs);
            pending.apply_to(&node);
            return Next::Block(node);
        }

        // Rule: literal paragraph (indented text outside any fence).
        if patterns::LIT_PAR.is_match(line) {
            let mut lines = Vec::new();
            loop {
                let head = cursor.peek(0);
                if cursor.is_empty() {
                    break;
                }
                if is_blank(head) {
                    cursor.pop();
                    // A single blank line inside an indented run doesn't
                    // end it; two in a row does.
                    if is_blank(cursor.peek(0)) || cursor.is_empty() {
                        break;
                    }
                    lines.push(String::new());
                    continue;
                }
                if !patterns::LIT_PAR.is_match(strip_eol(head)) {
                    break;
                }
                let caps = patterns::LIT_PAR.captures(strip_eol(head)).unwrap();
                lines.push(caps[1].to_string());
                cursor.pop();
            }
            let node = Block::new(Context::Literal, Buffer::Lines(lines)).into_node();
            pending.apply_to(&node);
            return Next::Block(node);
        }

        // Fallback rule: a plain paragraph, accumulated until a blank
        // line, EOF, or the start of some other construct. Per rule 18's
        // post-processing: a leading `NOTE: ` prefix reclassifies it as
        // a note (with the prefix stripped); otherwise a still-pending
        // source-type attribute (captured by the `listing_source` rule
        // above, with no intervening fence) reclassifies it as a
        // listing rather than leaving it a paragraph.
        let mut lines = read_paragraph(cursor);
        let context = if let Some(first) = lines.first_mut() {
            if let Some(rest) = first.strip_prefix("NOTE: ") {
                let rest = rest.to_string();
                *first = rest;
                Context::Note
            } else if pending.source_type.is_some() {
                Context::Listing
            } else {
                Context::Paragraph
            }
        } else if pending.source_type.is_some() {
            Context::Listing
        } else {
            Context::Paragraph
        };
        let mut block = Block::new(context, Buffer::Lines(lines));
        if context == Context::Listing {
            block.source_type = pending.source_type.take();
        }
        let node = block.into_node();
        pending.apply_to(&node);
        return Next::Block(node);
    }
}

/// `[verse]`/`[NOTE]`: the attribute applies either to the delimited
/// block that immediately follows, or (if none follows) to a single
/// plain paragraph.
fn read_attributed_paragraph_or_block(
    cursor: &mut LineCursor,
    context: Context,
    refs: &mut ReferenceMap,
) -> NodeRef {
    cursor.skip_blank();
    let line = strip_eol(cursor.peek(0)).to_string();
    if patterns::OBLOCK.is_match(&line)
        || patterns::QUOTE.is_match(&line)
        || patterns::EXAMPLE.is_match(&line)
    {
        let fence = if patterns::OBLOCK.is_match(&line) {
            &*patterns::OBLOCK
        } else if patterns::QUOTE.is_match(&line) {
            &*patterns::QUOTE
        } else {
            &*patterns::EXAMPLE
        };
        cursor.pop();
        let inner = read_fenced(cursor, fence);
        parse_inner_as_children(&inner, context, refs)
    } else {
        let lines = read_paragraph(cursor);
        Block::new(context, Buffer::Lines(lines)).into_node()
    }
}

/// Recursively parses `lines` as a nested document fragment and wraps
/// the result as the children of a block of the given `context`. Any
/// anchors discovered inside (e.g. `[[id]]` on its own line within a
/// quote or sidebar) are recorded into the same reference table the
/// enclosing parse uses, not a throwaway one — invariant 2 holds
/// regardless of how deeply an anchor is nested.
fn parse_inner_as_children(lines: &[String], context: Context, refs: &mut ReferenceMap) -> NodeRef {
    let mut inner_cursor = LineCursor::new(
        lines
            .iter()
            .map(|l| format!("{l}\n"))
            .collect::<Vec<_>>(),
    );
    let mut children = Vec::new();
    let mut pending = Pending::default();
    loop {
        match next_block(&mut inner_cursor, refs, &mut pending) {
            Next::Block(node) => children.push(node),
            Next::Heading => {
                // A heading inside a delimited block has no structural
                // meaning here; fold it back in as a literal paragraph
                // line so content isn't silently dropped.
                if let Some(l) = inner_cursor.pop() {
                    children.push(Block::new(Context::Paragraph, Buffer::Lines(vec![strip_eol(&l).to_string()])).into_node());
                }
            }
            Next::Eof => break,
        }
    }
    let block = Block::new(context, Buffer::Children(children));
    let node = block.into_node();
    for child in match &*node.borrow() {
        Node::Block(b) => match &b.buffer {
            Buffer::Children(c) => c.clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    } {
        child.borrow_mut().set_parent(Some(std::rc::Rc::downgrade(&node)));
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unterminated_fence_logs_a_warning_and_still_returns_what_it_read() {
        // `env_logger::try_init()` wires a subscriber so this path's
        // `log::warn!` actually has somewhere to go under `RUST_LOG`;
        // `try_init` (not `init`) because other tests in this binary
        // may have already installed one.
        let _ = env_logger::try_init();
        let mut cursor = LineCursor::from_text("----\nfn main() {}\n");
        let mut refs = ReferenceMap::new();
        let mut pending = Pending::default();
        match next_block(&mut cursor, &mut refs, &mut pending) {
            Next::Block(node) => {
                if let Node::Block(b) = &*node.borrow() {
                    assert_eq!(b.context, Context::Listing);
                    if let Buffer::Lines(lines) = &b.buffer {
                        assert_eq!(lines, &vec!["fn main() {}".to_string()]);
                    } else {
                        panic!("expected a Lines buffer");
                    }
                } else {
                    panic!("expected a Block");
                }
            }
            _ => panic!("expected a Block"),
        }
    }
}
