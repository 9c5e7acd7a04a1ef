use std::collections::BTreeMap;

/// Display label for the sentinel region used by photos that sit directly
/// under an area folder.
pub const ALL_REGION: &str = "All";

/// Resolves a raw storage folder slug to a display name.
///
/// Resolution order:
/// 1. A folder literally named `all` (any case) is always the `All` sentinel,
///    regardless of the override table.
/// 2. An exact, case-insensitive hit in the override table is returned
///    verbatim.
/// 3. Fallback transform: runs of `_`/`-` become single spaces, each token is
///    title-cased, tokens are rejoined with single spaces.
///
/// Always returns a string; empty input yields an empty string.
pub fn resolve_display_name(raw_slug: &str, overrides: Option<&BTreeMap<String, String>>) -> String {
    if raw_slug.eq_ignore_ascii_case("all") {
        return ALL_REGION.to_string();
    }

    if let Some(table) = overrides {
        let lowered = raw_slug.to_lowercase();
        for (slug, name) in table {
            if slug.to_lowercase() == lowered {
                return name.clone();
            }
        }
    }

    title_case_slug(raw_slug)
}

/// The fallback transform on its own, for callers with no override table.
pub fn title_case_slug(raw_slug: &str) -> String {
    raw_slug
        .split(['_', '-', ' '])
        .filter(|token| !token.is_empty())
        .map(title_case_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_token(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
