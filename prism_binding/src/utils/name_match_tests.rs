use super::*;

#[test]
fn test_exact_name_matches_unless_suffix_required() {
    assert!(streq_suff("g_Tex", "g_Tex", Some("_sampler"), false));
    assert!(!streq_suff("g_Tex", "g_Tex", Some("_sampler"), true));
    assert!(streq_suff("g_Tex", "g_Tex", None, false));
}

#[test]
fn test_suffix_must_match_exactly() {
    assert!(streq_suff("g_Tex_sampler", "g_Tex", Some("_sampler"), false));
    assert!(streq_suff("g_Tex_sampler", "g_Tex", Some("_sampler"), true));
    assert!(!streq_suff("g_Tex_samplerX", "g_Tex", Some("_sampler"), false));
    assert!(!streq_suff("g_Tex_sampler", "g_Tex", None, false));
}

#[test]
fn test_prefix_must_match() {
    assert!(!streq_suff("g_Other_sampler", "g_Tex", Some("_sampler"), false));
    assert!(!streq_suff("g_Te", "g_Tex", Some("_sampler"), false));
}
