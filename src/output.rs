use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// `LEXSCOPE_QUIET=1` suppresses progress bars and banners
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("LEXSCOPE_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
