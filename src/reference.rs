// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The Reference Table: id -> display-form, populated during
//! preprocessing (bibliography entries) and during parsing (anchors,
//! section ids).

use std::collections::HashMap;

pub type ReferenceMap = HashMap<String, String>;

/// Records a bare `[[id]]` anchor. Last writer wins, per §3.
pub fn record_anchor(refs: &mut ReferenceMap, id: &str) {
    refs.insert(id.to_string(), format!("[{id}]"));
}

/// Records a bibliography entry. Per §4.3 step 6 the reference value is
/// always the bracketed-id placeholder, the same convention as an
/// anchor — the entry's own citation text is not stored here.
pub fn record_biblio(refs: &mut ReferenceMap, id: &str, _display: &str) {
    refs.insert(id.to_string(), format!("[{id}]"));
}
