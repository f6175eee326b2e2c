// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The List Segmenter: turns a run of list-marker lines into a
//! `Block` with a `Buffer::Items` payload, recursing through the
//! Block Dispatcher to discover any nested list a deeper item segment
//! turns out to contain.

use crate::block::{Block, Buffer, Context, ListItem, Node, NodeRef};
use crate::cursor::{is_blank, strip_eol, LineCursor};
use crate::dispatcher::{self, Pending};
use crate::patterns;
use crate::reference::ReferenceMap;

/// Bullet depth for a ulist marker: number of `*` (1-5), or 1 for a
/// bare `-`.
fn ulist_depth(bullet: &str) -> usize {
    if bullet == "-" {
        1
    } else {
        bullet.len()
    }
}

fn olist_depth(bullet: &str) -> usize {
    if bullet.chars().all(|c| c == '.') {
        bullet.len()
    } else {
        1
    }
}

/// Looks past the blank line currently at the front of `cursor` (and
/// any further blank lines after it) without consuming anything, and
/// reports whether the run ends in another marker of this same list
/// kind. This is the lookahead behind rule 1: a blank run is absorbed
/// into the current item's segment only when what follows is more of
/// this list, never when it's an unrelated trailing paragraph or EOF.
/// (`list_types`/`alt_ending` from the segmenting contract collapse to
/// a single `marker_pattern` here since each call only ever segments
/// one list kind at a time.)
fn blank_run_ends_in_compatible_item(cursor: &LineCursor, marker_pattern: &regex::Regex) -> bool {
    let mut k = 0;
    while k < cursor.len() {
        let line = cursor.peek(k);
        if !is_blank(line) {
            return marker_pattern.is_match(strip_eol(line));
        }
        k += 1;
    }
    false
}

/// Collects every line belonging to one item's segment: the marker
/// line itself plus every following line that is not itself a new
/// marker at `list_level` or shallower (the "alt_ending" / "stop on
/// shallower sibling" rule from the segmenting contract).
///
/// Per §4.5: a blank line ends the segment unless the lines after it
/// resume with another item of this list kind, in which case the
/// blank run is absorbed and segmenting continues. While a nested
/// open block (`--`) or listing (`----`) fence is open, every stop
/// condition — blank-line and marker alike — is suppressed so the
/// fenced interior passes through verbatim, including its own blank
/// lines and bullet-like lines.
fn list_item_segment(
    cursor: &mut LineCursor,
    list_level: usize,
    depth_of: fn(&str) -> usize,
    marker_pattern: &regex::Regex,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut in_oblock = false;
    let mut in_listing = false;
    loop {
        if cursor.is_empty() {
            break;
        }
        let head = cursor.peek(0);
        let stripped = strip_eol(head).to_string();

        if !in_oblock && !in_listing {
            if is_blank(head) {
                if blank_run_ends_in_compatible_item(cursor, marker_pattern) {
                    lines.push(String::new());
                    cursor.pop();
                    continue;
                }
                break;
            }
            if let Some(caps) = marker_pattern.captures(&stripped) {
                let depth = depth_of(&caps[1]);
                if depth <= list_level {
                    break;
                }
            }
        }

        if patterns::OBLOCK.is_match(&stripped) {
            in_oblock = !in_oblock;
        } else if patterns::LISTING.is_match(&stripped) {
            in_listing = !in_listing;
        }
        lines.push(strip_eol(&cursor.pop().unwrap()).to_string());
    }
    lines
}

/// Parses one item segment's lines as nested document content,
/// returning the resulting children (almost always a single
/// paragraph, possibly followed by a nested list).
fn parse_segment(lines: &[String], refs: &mut ReferenceMap) -> Vec<NodeRef> {
    let mut inner = LineCursor::new(lines.iter().map(|l| format!("{l}\n")).collect::<Vec<_>>());
    let mut pending = Pending::default();
    let mut children = Vec::new();
    loop {
        match dispatcher::next_block(&mut inner, refs, &mut pending) {
            dispatcher::Next::Block(node) => children.push(node),
            dispatcher::Next::Heading => {
                if let Some(l) = inner.pop() {
                    children.push(
                        Block::new(Context::Paragraph, Buffer::Lines(vec![strip_eol(&l).to_string()]))
                            .into_node(),
                    );
                }
            }
            dispatcher::Next::Eof => break,
        }
    }
    children
}

/// A segment's first line carries the item's own inline content; any
/// further lines/children are stored as the item's nested `blocks`.
/// Per invariant 6, a lone paragraph child folds back into `content`
/// rather than staying a structural child.
fn finalize_item(level: usize, first_line: String, rest: Vec<String>, refs: &mut ReferenceMap) -> ListItem {
    let mut item = ListItem::new();
    item.level = level;
    item.content = Some(first_line.trim().to_string());
    if !rest.is_empty() {
        let children = parse_segment(&rest, refs);
        if children.len() == 1 {
            if let Node::Block(b) = &*children[0].borrow() {
                if matches!(b.context, Context::Paragraph | Context::Literal) {
                    if let Buffer::Lines(lines) = &b.buffer {
                        let joined = lines
                            .iter()
                            .map(|l| l.trim())
                            .collect::<Vec<_>>()
                            .join("\n");
                        let head = item.content.take().unwrap();
                        item.content = Some(if head.is_empty() {
                            joined
                        } else {
                            format!("{head}\n{joined}")
                        });
                        return item;
                    }
                }
            }
        }
        item.blocks = children;
    }
    item
}

pub fn build_ulist(cursor: &mut LineCursor, refs: &mut ReferenceMap) -> NodeRef {
    build_generic(cursor, refs, &patterns::ULIST, ulist_depth, Context::UList)
}

pub fn build_olist(cursor: &mut LineCursor, refs: &mut ReferenceMap) -> NodeRef {
    build_generic(cursor, refs, &patterns::OLIST, olist_depth, Context::OList)
}

pub fn build_colist(cursor: &mut LineCursor, refs: &mut ReferenceMap) -> NodeRef {
    build_generic(cursor, refs, &patterns::COLIST, |_| 1, Context::CList)
}

fn build_generic(
    cursor: &mut LineCursor,
    refs: &mut ReferenceMap,
    marker: &regex::Regex,
    depth_of: fn(&str) -> usize,
    context: Context,
) -> NodeRef {
    let mut items = Vec::new();
    loop {
        cursor.skip_blank();
        let head = cursor.peek(0);
        if cursor.is_empty() || !marker.is_match(strip_eol(head)) {
            break;
        }
        let caps = marker.captures(strip_eol(head)).unwrap();
        let level = depth_of(&caps[1]);
        if let Some(first) = items.first().map(|i: &ListItem| i.level) {
            if level < first {
                break;
            }
        }
        let rest_of_first_line = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
        cursor.pop();
        let segment = list_item_segment(cursor, level, depth_of, marker);
        items.push(finalize_item(level, rest_of_first_line, segment, refs));
    }
    Block::new(context, Buffer::Items(items)).into_node()
}

pub fn build_dlist(cursor: &mut LineCursor, refs: &mut ReferenceMap) -> NodeRef {
    let mut items = Vec::new();
    loop {
        cursor.skip_blank();
        let head = cursor.peek(0);
        if cursor.is_empty() {
            break;
        }
        let stripped = strip_eol(head).to_string();
        let caps = match patterns::DLIST.captures(&stripped) {
            Some(c) => c,
            None => break,
        };
        let term = caps[1].to_string();
        let inline = caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default();
        cursor.pop();

        let mut lines = Vec::new();
        if !inline.is_empty() {
            lines.push(inline);
        }
        loop {
            if cursor.is_empty() {
                break;
            }
            let next = cursor.peek(0);
            if is_blank(next) {
                let saved = cursor.pop().unwrap();
                if cursor.is_empty() || is_blank(cursor.peek(0)) || patterns::DLIST.is_match(strip_eol(cursor.peek(0))) {
                    cursor.unshift(saved);
                    break;
                }
                lines.push(String::new());
                continue;
            }
            if patterns::DLIST.is_match(strip_eol(next)) {
                break;
            }
            lines.push(strip_eol(&cursor.pop().unwrap()).to_string());
        }

        let mut item = ListItem::new();
        item.term = Some(term);
        if !lines.is_empty() {
            let children = parse_segment(&lines, refs);
            if children.len() == 1 {
                if let Node::Block(b) = &*children[0].borrow() {
                    if b.context == Context::Paragraph {
                        if let Buffer::Lines(l) = &b.buffer {
                            let joined = l.iter().map(|s| s.trim()).collect::<Vec<_>>().join("\n");
                            item.content = Some(joined);
                        }
                    }
                }
            }
            if item.content.is_none() {
                item.blocks = children;
            }
        }
        items.push(item);
    }
    Block::new(Context::DList, Buffer::Items(items)).into_node()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ulist_depth_counts_stars_or_treats_dash_as_one() {
        assert_eq!(ulist_depth("-"), 1);
        assert_eq!(ulist_depth("*"), 1);
        assert_eq!(ulist_depth("***"), 3);
    }

    #[test]
    fn olist_depth_counts_dots_or_treats_numeric_as_one() {
        assert_eq!(olist_depth("."), 1);
        assert_eq!(olist_depth("..."), 3);
        assert_eq!(olist_depth("1."), 1);
    }

    #[test]
    fn flat_ulist_produces_one_item_per_bullet() {
        let mut cursor = LineCursor::from_text("* a\n* b\n* c\n");
        let mut refs = ReferenceMap::new();
        let node = build_ulist(&mut cursor, &mut refs);
        if let Node::Block(b) = &*node.borrow() {
            match &b.buffer {
                Buffer::Items(items) => assert_eq!(items.len(), 3),
                _ => panic!("expected Items buffer"),
            }
        } else {
            panic!("expected Block");
        }
    }

    #[test]
    fn continuation_line_folds_into_content_newline_joined_and_trimmed() {
        let mut cursor = LineCursor::from_text("* a\ncontinued  \n* b\n");
        let mut refs = ReferenceMap::new();
        let node = build_ulist(&mut cursor, &mut refs);
        if let Node::Block(b) = &*node.borrow() {
            match &b.buffer {
                Buffer::Items(items) => {
                    assert_eq!(items[0].content.as_deref(), Some("a\ncontinued"));
                }
                _ => panic!("expected Items buffer"),
            }
        } else {
            panic!("expected Block");
        }
    }

    #[test]
    fn single_blank_not_followed_by_a_list_item_ends_the_segment() {
        let mut cursor = LineCursor::from_text("* a\n\nSome unrelated trailing paragraph\n");
        let mut refs = ReferenceMap::new();
        let node = build_ulist(&mut cursor, &mut refs);
        if let Node::Block(b) = &*node.borrow() {
            match &b.buffer {
                Buffer::Items(items) => {
                    assert_eq!(items.len(), 1);
                    assert_eq!(items[0].content.as_deref(), Some("a"));
                }
                _ => panic!("expected Items buffer"),
            }
        } else {
            panic!("expected Block");
        }
        assert!(!cursor.is_empty());
        assert_eq!(strip_eol(cursor.peek(0)), "Some unrelated trailing paragraph");
    }

    #[test]
    fn single_blank_followed_by_another_item_is_absorbed() {
        let mut cursor = LineCursor::from_text("* a\n\n* b\n");
        let mut refs = ReferenceMap::new();
        let node = build_ulist(&mut cursor, &mut refs);
        if let Node::Block(b) = &*node.borrow() {
            match &b.buffer {
                Buffer::Items(items) => assert_eq!(items.len(), 2),
                _ => panic!("expected Items buffer"),
            }
        } else {
            panic!("expected Block");
        }
    }

    #[test]
    fn fence_embedded_in_list_item_suppresses_stop_conditions() {
        let mut cursor = LineCursor::from_text("* a\n----\nline1\n\n* not a new item\n----\n* b\n");
        let mut refs = ReferenceMap::new();
        let node = build_ulist(&mut cursor, &mut refs);
        if let Node::Block(b) = &*node.borrow() {
            match &b.buffer {
                Buffer::Items(items) => {
                    assert_eq!(items.len(), 2);
                    assert_eq!(items[0].content.as_deref(), Some("a"));
                }
                _ => panic!("expected Items buffer"),
            }
        } else {
            panic!("expected Block");
        }
    }

    #[test]
    fn nested_ulist_attaches_as_child_of_first_item() {
        let mut cursor = LineCursor::from_text("* a\n** a1\n** a2\n* b\n");
        let mut refs = ReferenceMap::new();
        let node = build_ulist(&mut cursor, &mut refs);
        if let Node::Block(b) = &*node.borrow() {
            match &b.buffer {
                Buffer::Items(items) => {
                    assert_eq!(items.len(), 2);
                    assert_eq!(items[0].blocks.len(), 1);
                }
                _ => panic!("expected Items buffer"),
            }
        } else {
            panic!("expected Block");
        }
    }
}
