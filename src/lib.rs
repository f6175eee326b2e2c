// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A line-oriented parser for a lightweight AsciiDoc-like markup
//! language: sections, delimited and paragraph-style blocks, the four
//! list kinds, attribute definitions/substitution, conditionals,
//! includes and a bibliography table.
//!
//! The entry point is [`Document`]; everything else is exposed mainly
//! so callers can inspect or reuse individual stages (the pattern
//! registry, the line cursor, the preprocessor).

#[macro_use]
extern crate lazy_static;

pub mod attributes;
pub mod block;
pub mod cursor;
pub mod dispatcher;
pub mod document;
pub mod error;
pub mod list;
pub mod patterns;
pub mod preprocessor;
pub mod reference;
pub mod section;

pub use block::{Block, Buffer, Context, ListItem, Node, NodeRef, Section};
pub use document::Document;
pub use error::ParseError;
pub use preprocessor::{FsIncludeResolver, IncludeResolver};
