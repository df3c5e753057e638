use std::collections::BTreeSet;

const REMEDY_NAMES: &str = include_str!("remedy_names.txt");

/// Well-known remedy names, alphabetical.
pub fn predefined_remedy_names() -> impl Iterator<Item = &'static str> {
    REMEDY_NAMES.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Remedy names containing `query`, drawn from the user's own names and the
/// predefined list.
///
/// Matching ignores case. The exact query is left out since it is already
/// typed. Results are alphabetical and deduplicated ignoring case, with the
/// user's spelling preferred.
pub fn suggest(query: &str, user_names: &[String], limit: usize) -> Vec<String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut seen = BTreeSet::new();
    let mut matches: Vec<String> = user_names
        .iter()
        .map(String::as_str)
        .chain(predefined_remedy_names().map(|name| -> &str { name }))
        .filter(|name| {
            let lower = name.to_lowercase();
            lower.contains(&query) && lower != query && seen.insert(lower)
        })
        .map(str::to_string)
        .collect();

    matches.sort_by_key(|name| name.to_lowercase());
    matches.truncate(limit);
    matches
}
