// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The tree shapes: `Node` (the closed sum of Section and Block),
//! `Section`, `Block`, `Buffer` and `ListItem`, plus their ownership
//! discipline — `Rc` for strong child ownership, `Weak` for the
//! back-reference to the parent, matching the `Handle`/`WeakHandle`
//! convention this parser's teacher uses for its own parse tree.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type NodeRef = Rc<RefCell<Node>>;
pub type WeakNodeRef = Weak<RefCell<Node>>;

/// The closed set of things a Block Dispatcher call, or a Section
/// Builder call, can hand back to its caller.
pub enum Node {
    Section(Section),
    Block(Block),
}

impl Node {
    pub fn set_parent(&mut self, parent: Option<WeakNodeRef>) {
        match self {
            Node::Section(s) => s.parent = parent,
            Node::Block(b) => b.parent = parent,
        }
    }

    pub fn anchor(&self) -> Option<&str> {
        match self {
            Node::Section(s) => s.anchor.as_deref(),
            Node::Block(b) => b.anchor.as_deref(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Node::Section(s) => s.title.as_deref(),
            Node::Block(b) => b.title.as_deref(),
        }
    }

    pub fn set_title_if_absent(&mut self, title: String) {
        match self {
            Node::Section(s) => {
                if s.title.is_none() {
                    s.title = Some(title);
                }
            }
            Node::Block(b) => {
                if b.title.is_none() {
                    b.title = Some(title);
                }
            }
        }
    }

    pub fn set_caption_if_absent(&mut self, caption: String) {
        if let Node::Block(b) = self {
            if b.caption.is_none() {
                b.caption = Some(caption);
            }
        }
    }

    pub fn set_anchor_if_absent(&mut self, anchor: String) {
        match self {
            Node::Section(s) => {
                if s.anchor.is_none() {
                    s.anchor = Some(anchor);
                }
            }
            Node::Block(b) => {
                if b.anchor.is_none() {
                    b.anchor = Some(anchor);
                }
            }
        }
    }
}

/// The closed set of block contexts from §3. The tag is immutable once a
/// `Block` is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Paragraph,
    Literal,
    Listing,
    Example,
    Quote,
    Verse,
    Note,
    Sidebar,
    OBlock,
    UList,
    OList,
    CList,
    DList,
}

/// A section's own content is either raw lines (while being assembled)
/// or, once recursively parsed, a sequence of Nodes. Blocks additionally
/// use the `Items` shape for every list kind.
pub enum Buffer {
    Lines(Vec<String>),
    Children(Vec<NodeRef>),
    Items(Vec<ListItem>),
}

pub struct Section {
    pub name: String,
    pub level: u8,
    pub anchor: Option<String>,
    pub blocks: Vec<NodeRef>,
    pub parent: Option<WeakNodeRef>,
    /// A `.Title` line pending before BD discovered this was actually a
    /// heading (see §4.4's final paragraph) rather than a generic block.
    pub title: Option<String>,
}

pub struct Block {
    pub context: Context,
    pub parent: Option<WeakNodeRef>,
    pub buffer: Buffer,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub anchor: Option<String>,
    pub source_type: Option<String>,
}

impl Block {
    pub fn new(context: Context, buffer: Buffer) -> Block {
        Block {
            context,
            parent: None,
            buffer,
            title: None,
            caption: None,
            anchor: None,
            source_type: None,
        }
    }

    pub fn into_node(self) -> NodeRef {
        Rc::new(RefCell::new(Node::Block(self)))
    }
}

impl Section {
    pub fn into_node(self) -> NodeRef {
        Rc::new(RefCell::new(Node::Section(self)))
    }
}

/// One item of any list kind. `level` is meaningful for `ulist` only
/// (the nesting depth read off the bullet); `term` is populated for
/// `dlist` items only, since a definition-list item carries both a term
/// and a (possibly empty) definition body, a shape a bare `content`
/// field can't represent on its own.
pub struct ListItem {
    pub level: usize,
    pub content: Option<String>,
    pub term: Option<String>,
    pub blocks: Vec<NodeRef>,
    pub anchor: Option<String>,
}

impl ListItem {
    pub fn new() -> ListItem {
        ListItem {
            level: 1,
            content: None,
            term: None,
            blocks: Vec::new(),
            anchor: None,
        }
    }
}

impl Default for ListItem {
    fn default() -> Self {
        ListItem::new()
    }
}

/// Sets `child`'s parent to `parent`, appending it to `parent`'s own
/// child list. `parent` must currently hold a `Section` or a
/// `Block { buffer: Buffer::Children(..) }`.
pub fn attach_child(parent: &NodeRef, child: NodeRef) {
    child.borrow_mut().set_parent(Some(Rc::downgrade(parent)));
    let mut p = parent.borrow_mut();
    match &mut *p {
        Node::Section(s) => s.blocks.push(child),
        Node::Block(b) => match &mut b.buffer {
            Buffer::Children(children) => children.push(child),
            _ => panic!("attach_child called on a block without a Children buffer"),
        },
    }
}
