//! Rendering a resolved assignment back to cartfile text (spec §6
//! `ResolvedCartfile`).
//!
//! One line per dependency, ascending by [`Dependency::description`]:
//!
//! ```text
//! github "owner/repo" "v1.2.0"
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::dependency::Dependency;
use crate::pinned_version::PinnedVersion;

/// Formats a resolved assignment as cartfile text, one line per dependency
/// in ascending [`Dependency::description`] order, each terminated with a
/// newline.
#[must_use]
pub fn render_resolved_cartfile(assignment: &BTreeMap<Dependency, PinnedVersion>) -> String {
    // `Dependency`'s `Ord` is defined over `description()`, so `BTreeMap`
    // iteration order already matches the order this needs to render in.
    let mut out = String::new();
    for (dependency, pinned) in assignment {
        let _ = writeln!(out, "{} \"{}\"", dependency.description(), pinned.commitish());
    }
    out
}
