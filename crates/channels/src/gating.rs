/// Check if a peer ID is allowed by a whitelist.
///
/// An empty list means no restriction (open policy). Entries are matched
/// exactly after trimming surrounding whitespace.
#[must_use]
pub fn is_allowed(peer_id: &str, whitelist: &[String]) -> bool {
    if whitelist.is_empty() {
        return true;
    }
    whitelist.iter().any(|entry| entry.trim() == peer_id)
}

/// Split a comma-separated ID list into its entries.
///
/// Blank entries are dropped, so `"1,,2, "` yields `["1", "2"]`.
#[must_use]
pub fn split_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
