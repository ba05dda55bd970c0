pub struct Icons;

impl Icons {
    pub const SCOPE: &str = "🔲";
    pub const FUNCTION: &str = "ƒ";
    pub const ARROW: &str = "⇒";
    pub const GLOBE: &str = "🌐";
    pub const IMPORT: &str = "⬇️";
    pub const EXPORT: &str = "⬆️";
    pub const FILE: &str = "📄";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const MAG: &str = "🔎";
}

/// Icon for a scope boundary kind
pub fn scope_icon(kind: crate::ScopeKind) -> &'static str {
    match kind {
        crate::ScopeKind::Program => Icons::SCOPE,
        crate::ScopeKind::Function => Icons::FUNCTION,
        crate::ScopeKind::Arrow => Icons::ARROW,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScopeKind;

    #[test]
    fn test_scope_icons_are_distinct() {
        let icons = [
            scope_icon(ScopeKind::Program),
            scope_icon(ScopeKind::Function),
            scope_icon(ScopeKind::Arrow),
        ];
        assert_eq!(icons, [Icons::SCOPE, Icons::FUNCTION, Icons::ARROW]);
        assert!(icons.iter().all(|icon| !icon.is_empty()));
    }
}
