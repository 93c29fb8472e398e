//! Note tag normalisation

/// Normalise a tag typed by the user: trim, uppercase, and collapse each
/// run of whitespace into `_` (`"chest pain"` becomes `"CHEST_PAIN"`).
pub fn normalize_tag(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Add a raw tag to `selected` after normalising it.
///
/// Returns `false` when the tag is blank or already selected.
pub fn add_tag(selected: &mut Vec<String>, raw: &str) -> bool {
    let tag = normalize_tag(raw);
    if tag.is_empty() || selected.contains(&tag) {
        return false;
    }
    selected.push(tag);
    true
}
