// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The Pattern Registry: a named, read-only table of line-classification
//! patterns. Every pattern here is anchored and tested against a single
//! line (its trailing newline already stripped by the caller — see
//! [`crate::cursor::strip_eol`]).
//!
//! Patterns are compiled once per process (`lazy_static`) and shared
//! read-only across every parse, same as `REGEX_HEADLINE_SHORT` and
//! friends in the teacher crate this parser grew out of.

use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    pub static ref EMPTY_LINE: Regex = Regex::new(r"^[ \t]*$").unwrap();

    pub static ref ANCHOR: Regex = Regex::new(r"^\[\[([^\[\]]+)\]\]\s*$").unwrap();

    /// An anchor embedded anywhere in a line, e.g. inside a two-line
    /// heading's title text (see `section::detect_heading`). Unlike
    /// `ANCHOR` this is not anchored to the whole line.
    pub static ref EMBEDDED_ANCHOR: Regex = Regex::new(r"\[\[([^\[\]]+)\]\]").unwrap();

    pub static ref TITLE: Regex = Regex::new(r"^\.([^.\s].*)$").unwrap();

    pub static ref LEVEL_TITLE: Regex = Regex::new(r"^(=+)\s+(\S.*)$").unwrap();

    /// A candidate two-line heading name: any non-blank line. Whether it
    /// actually forms a heading also depends on the following underline
    /// (see [`crate::section::detect`]).
    pub static ref NAME: Regex = Regex::new(r"^(\S.*)$").unwrap();

    /// A run of one of `= - ~ ^ +`, the whole line, possibly trailing
    /// whitespace.
    pub static ref UNDERLINE: Regex = Regex::new(r"^([=\-~^+])\1*\s*$").unwrap();

    pub static ref OBLOCK: Regex = Regex::new(r"^--$").unwrap();

    pub static ref LISTING: Regex = Regex::new(r"^-{4,}$").unwrap();

    pub static ref LIT_BLK: Regex = Regex::new(r"^\.{4,}$").unwrap();

    pub static ref SIDEBAR_BLK: Regex = Regex::new(r"^\*{4,}$").unwrap();

    pub static ref QUOTE: Regex = Regex::new(r"^_{4,}$").unwrap();

    pub static ref VERSE: Regex = Regex::new(r"^\[verse\]\s*$").unwrap();

    pub static ref NOTE: Regex = Regex::new(r"^\[NOTE\]\s*$").unwrap();

    pub static ref EXAMPLE: Regex = Regex::new(r"^={4,}$").unwrap();

    pub static ref LISTING_SOURCE: Regex =
        Regex::new(r"^\[source(?:\s*,\s*([^\]]+))?\]\s*$").unwrap();

    /// Bullet is a single hyphen or 1-5 asterisks (star count is nesting
    /// depth).
    pub static ref ULIST: Regex = Regex::new(r"^(\*{1,5}|-)\s+(.*)$").unwrap();

    /// Bullet is 1-5 dots (dot count is nesting depth) or an explicit
    /// `N.`/`N)` counter.
    pub static ref OLIST: Regex = Regex::new(r"^(\.{1,5}|\d+[.)])\s+(.*)$").unwrap();

    pub static ref COLIST: Regex = Regex::new(r"^<(\d+|\.)>\s+(.*)$").unwrap();

    /// Term, captured punctuation (`::`/`:::`/`::::`), and any inline
    /// definition text on the same line.
    pub static ref DLIST: Regex = Regex::new(r"^(\S.*?)(:{2,4})(?:\s+(.*))?$").unwrap();

    pub static ref LIT_PAR: Regex = Regex::new(r"^[ \t]+(\S.*)$").unwrap();

    pub static ref COMMENT: Regex = Regex::new(r"^//.*$").unwrap();

    pub static ref CAPTION: Regex = Regex::new(r#"^\[caption="([^"]*)"\]\s*$"#).unwrap();

    pub static ref BIBLIO: Regex = Regex::new(r"^-\s*\[\[\[([^\]]+)\]\]\]\s*(.*)$").unwrap();

    /// Matches against the (trimmed) *value* portion of an attribute
    /// definition; a trailing ` +` signals continuation.
    pub static ref ATTR_CONTINUE: Regex = Regex::new(r"^(.*?)\s\+$").unwrap();

    pub static ref INCLUDE: Regex = Regex::new(r"^include::([^\[]+)\[\]\s*$").unwrap();

    pub static ref ATTR_DEF: Regex = Regex::new(r"^:([^:]+):\s*(.*)$").unwrap();

    pub static ref IFDEF: Regex = Regex::new(r"^ifdef::([^\[]+)\[\]\s*$").unwrap();

    pub static ref IFNDEF: Regex = Regex::new(r"^ifndef::([^\[]+)\[\]\s*$").unwrap();

    pub static ref ENDIF: Regex = Regex::new(r"^endif::([^\[]+)\[\]\s*$").unwrap();

    pub static ref ATTR_SUBST: Regex = Regex::new(r"\{([A-Za-z0-9_-]+)\?([^}]*)\}").unwrap();

    /// A named, read-only index over the patterns above, for callers that
    /// want to look a pattern up by its spec name rather than by import.
    pub static ref REGISTRY: HashMap<&'static str, &'static Regex> = {
        let mut m: HashMap<&'static str, &'static Regex> = HashMap::new();
        m.insert("anchor", &*ANCHOR);
        m.insert("title", &*TITLE);
        m.insert("level_title", &*LEVEL_TITLE);
        m.insert("name", &*NAME);
        m.insert("line", &*UNDERLINE);
        m.insert("oblock", &*OBLOCK);
        m.insert("listing", &*LISTING);
        m.insert("lit_blk", &*LIT_BLK);
        m.insert("sidebar_blk", &*SIDEBAR_BLK);
        m.insert("quote", &*QUOTE);
        m.insert("verse", &*VERSE);
        m.insert("note", &*NOTE);
        m.insert("example", &*EXAMPLE);
        m.insert("listing_source", &*LISTING_SOURCE);
        m.insert("ulist", &*ULIST);
        m.insert("olist", &*OLIST);
        m.insert("colist", &*COLIST);
        m.insert("dlist", &*DLIST);
        m.insert("lit_par", &*LIT_PAR);
        m.insert("comment", &*COMMENT);
        m.insert("caption", &*CAPTION);
        m.insert("biblio", &*BIBLIO);
        m.insert("attr_continue", &*ATTR_CONTINUE);
        m
    };
}

/// `=`/`-`/`~`/`^`/`+` underline char to section level, per §4.6.
pub fn underline_level(c: char) -> Option<u8> {
    match c {
        '=' => Some(0),
        '-' => Some(1),
        '~' => Some(2),
        '^' => Some(3),
        '+' => Some(4),
        _ => None,
    }
}
