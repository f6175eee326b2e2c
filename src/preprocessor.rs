// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The Preprocessor: three passes over the raw line sequence before any
//! structural parsing begins.
//!
//! 1. Include expansion (recursive, needs IO, runs first and in full).
//! 2. A single combined sequential pass handling conditionals,
//!    attribute definitions (with ` +` continuation) and substitution,
//!    and comment stripping together, line by line, so that an
//!    attribute defined on line N is visible to a substitution on line
//!    N+1 within the same pass.
//! 3. A bibliography pass, recording `- [[[id]]] text` entries into the
//!    reference table (left in place; bibliography entries are also
//!    ordinary blocks to the Block Dispatcher).

use crate::attributes::{self, AttributeMap};
use crate::cursor::{self, is_blank, strip_eol};
use crate::error::ParseError;
use crate::patterns;
use crate::reference::{record_biblio, ReferenceMap};
use std::path::{Path, PathBuf};

/// Resolves an `include::path[]` directive to its file contents. The
/// default, [`FsIncludeResolver`], reads from the filesystem relative
/// to the including file's directory; callers embedding this parser in
/// a sandboxed or virtual-filesystem context can supply their own.
pub trait IncludeResolver {
    fn resolve(&self, path: &Path) -> Result<String, std::io::Error>;
}

pub struct FsIncludeResolver;

impl IncludeResolver for FsIncludeResolver {
    fn resolve(&self, path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(path)
    }
}

const MAX_INCLUDE_DEPTH: usize = 64;

/// Expands every `include::path[]` line, recursively, relative to
/// `base_dir`. Recursion is bounded so a self-including file fails
/// loudly instead of exhausting memory.
pub fn expand_includes(
    text: &str,
    base_dir: &Path,
    resolver: &dyn IncludeResolver,
) -> Result<String, ParseError> {
    expand_includes_depth(text, base_dir, resolver, 0)
}

fn expand_includes_depth(
    text: &str,
    base_dir: &Path,
    resolver: &dyn IncludeResolver,
    depth: usize,
) -> Result<String, ParseError> {
    if depth >= MAX_INCLUDE_DEPTH {
        log::warn!("include depth limit reached at {depth}, stopping expansion");
        return Ok(text.to_string());
    }
    let mut out = String::new();
    for line in cursor::split_lines(text) {
        let stripped = strip_eol(&line);
        if let Some(caps) = patterns::INCLUDE.captures(stripped) {
            let rel = caps[1].trim().to_string();
            let path: PathBuf = base_dir.join(&rel);
            let contents = resolver.resolve(&path).map_err(|source| ParseError::Io {
                path: path.clone(),
                source,
            })?;
            let child_base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| base_dir.to_path_buf());
            let expanded = expand_includes_depth(&contents, &child_base, resolver, depth + 1)?;
            out.push_str(&expanded);
            if !expanded.ends_with('\n') {
                out.push('\n');
            }
        } else {
            out.push_str(&line);
        }
    }
    Ok(out)
}

/// The combined conditional/attribute/substitution/comment pass,
/// returning the rewritten text alongside the attribute map it built
/// along the way (the caller keeps the map around for anything that
/// still needs attribute lookups after parsing, e.g. rendering).
pub fn process(text: &str) -> (String, AttributeMap) {
    let lines = cursor::split_lines(text);
    let mut attrs = AttributeMap::new();
    let mut out_lines: Vec<String> = Vec::new();
    // None: not suppressing. Some(active): inside one ifdef/ifndef
    // region, `active` records whether its body should be kept.
    // Nesting of conditionals on different attribute names is not
    // supported, matching a single-level `skip` flag.
    let mut suppressing: Option<bool> = None;

    let mut i = 0;
    while i < lines.len() {
        let raw = &lines[i];
        let line = strip_eol(raw);

        if let Some(caps) = patterns::IFDEF.captures(line) {
            let name = attributes::sanitize_name(&caps[1]);
            suppressing = Some(attrs.contains_key(&name));
            i += 1;
            continue;
        }
        if let Some(caps) = patterns::IFNDEF.captures(line) {
            let name = attributes::sanitize_name(&caps[1]);
            suppressing = Some(!attrs.contains_key(&name));
            i += 1;
            continue;
        }
        if patterns::ENDIF.is_match(line) {
            suppressing = None;
            i += 1;
            continue;
        }
        if suppressing == Some(false) {
            i += 1;
            continue;
        }

        if let Some(caps) = patterns::ATTR_DEF.captures(line) {
            let name = attributes::sanitize_name(&caps[1]);
            let mut value = caps[2].to_string();
            while let Some(cont) = patterns::ATTR_CONTINUE.captures(&value.clone()) {
                value = cont[1].to_string();
                i += 1;
                if i >= lines.len() {
                    break;
                }
                let next = strip_eol(&lines[i]);
                value.push(' ');
                value.push_str(next);
            }
            attrs.insert(name, value);
            i += 1;
            continue;
        }

        if patterns::COMMENT.is_match(line) {
            i += 1;
            continue;
        }

        if is_blank(line) {
            out_lines.push(raw.clone());
            i += 1;
            continue;
        }

        let substituted = attributes::substitute(line, &attrs);
        let terminator = if raw.ends_with('\n') { "\n" } else { "" };
        out_lines.push(format!("{substituted}{terminator}"));
        i += 1;
    }

    (out_lines.concat(), attrs)
}

/// Final pass: scans the fully preprocessed text for bibliography
/// entries and records them, without removing the lines (they remain
/// ordinary paragraph-like blocks to the dispatcher).
pub fn collect_bibliography(text: &str, refs: &mut ReferenceMap) {
    for line in cursor::split_lines(text) {
        let stripped = strip_eol(&line);
        if let Some(caps) = patterns::BIBLIO.captures(stripped) {
            let id = caps[1].to_string();
            let display = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            record_biblio(refs, &id, display);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_definition_then_substitution_same_pass() {
        let (out, attrs) = process(":name: world\nhello {name?value}\n");
        assert_eq!(attrs.get("name").map(String::as_str), Some("world"));
        assert_eq!(out, "hello value\n");
    }

    #[test]
    fn continuation_joins_following_line() {
        let (_, attrs) = process(":long: first +\nsecond\n");
        assert_eq!(attrs.get("long").map(String::as_str), Some("first second"));
    }

    #[test]
    fn ifndef_keeps_body_when_attribute_absent() {
        let (out, _) = process("ifndef::missing[]\nkept\nendif::missing[]\n");
        assert_eq!(out, "kept\n");
    }

    #[test]
    fn ifdef_drops_body_when_attribute_absent() {
        let (out, _) = process("ifdef::missing[]\ndropped\nendif::missing[]\n");
        assert_eq!(out, "");
    }

    #[test]
    fn comments_are_stripped() {
        let (out, _) = process("kept\n// a comment\nalso kept\n");
        assert_eq!(out, "kept\nalso kept\n");
    }

    #[test]
    fn bibliography_entries_are_recorded() {
        let mut refs = ReferenceMap::new();
        collect_bibliography("- [[[ref1]]] Some Text\n", &mut refs);
        assert_eq!(refs.get("ref1").map(String::as_str), Some("[ref1]"));
    }
}
