/// Returns true if `reference` is `s` optionally followed by `suffix`.
///
/// `reference` must start with `s`. An empty remainder matches unless
/// `no_suffix_allowed` is set; any other remainder must equal `suffix`
/// exactly. Texture/sampler pairs (`g_Tex` / `g_Tex_sampler`) are matched
/// this way.
///
/// # Example
///
/// ```ignore
/// assert!(streq_suff("g_Tex_sampler", "g_Tex", Some("_sampler"), false));
/// assert!(streq_suff("g_Tex", "g_Tex", Some("_sampler"), false));
/// assert!(!streq_suff("g_Tex", "g_Tex", Some("_sampler"), true));
/// ```
pub fn streq_suff(reference: &str, s: &str, suffix: Option<&str>, no_suffix_allowed: bool) -> bool {
    let Some(remainder) = reference.strip_prefix(s) else {
        return false;
    };
    if remainder.is_empty() {
        return !no_suffix_allowed;
    }
    match suffix {
        Some(suffix) => remainder == suffix,
        None => false,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "name_match_tests.rs"]
mod tests;
