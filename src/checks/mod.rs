//! Built-in check catalog
//!
//! Category declaration order here is the numbering used by `--category N`.

pub mod build;
pub mod infrastructure;
pub mod monero;
pub mod network;
pub mod patterns;
pub mod quality;
pub mod security;

use crate::audit::Category;
use crate::scanner::LineMatch;

/// Every built-in category, in declaration order
pub fn default_catalog() -> Vec<Category> {
    vec![
        infrastructure::category(),
        security::category(),
        monero::category(),
        network::category(),
        quality::category(),
        build::category(),
    ]
}

/// Drop matches that sit on a line comment
pub(crate) fn code_only(matches: Vec<LineMatch>) -> Vec<LineMatch> {
    matches
        .into_iter()
        .filter(|m| !(m.text.starts_with("//") || m.text.starts_with('#')))
        .collect()
}

/// Group matches by file, keeping first-seen file order
pub(crate) fn group_by_file(matches: Vec<LineMatch>) -> Vec<Vec<LineMatch>> {
    let mut groups: Vec<Vec<LineMatch>> = Vec::new();

    for m in matches {
        match groups.iter_mut().find(|g| g[0].path == m.path) {
            Some(group) => group.push(m),
            None => groups.push(vec![m]),
        }
    }

    groups
}
