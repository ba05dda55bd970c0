use ::ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Directory and file patterns never worth analysing
const DEFAULT_EXCLUDES: &[&str] = &[
    "node_modules/", "bower_components/", "jspm_packages/", ".git/", ".hg/",
    "dist/", "build/", "out/", "coverage/", ".next/", ".nuxt/", ".cache/",
    ".vscode/", ".idea/",
    // Generated bundles
    "*.min.js", "*.bundle.js", "*.map",
];

pub struct IgnoreFilter {
    inner: Gitignore,
}

impl IgnoreFilter {
    pub fn new(root: &Path, extra_excludes: Option<&[String]>) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        builder.add(root.join(".gitignore"));
        builder.add(root.join(".ignore"));

        for pattern in DEFAULT_EXCLUDES {
            builder.add_line(None, pattern).ok();
        }

        if let Some(excludes) = extra_excludes {
            for pattern in excludes {
                if let Err(e) = builder.add_line(None, pattern) {
                    tracing::warn!("Skipping exclude pattern {:?}: {}", pattern, e);
                }
            }
        }

        Self {
            inner: builder.build().unwrap_or_else(|_| Gitignore::empty()),
        }
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.inner.matched(path, is_dir).is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_and_extra_excludes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let filter = IgnoreFilter::new(root, Some(&["fixtures/".to_string()]));

        assert!(filter.is_ignored(&root.join("node_modules"), true));
        assert!(filter.is_ignored(&root.join("vendor.min.js"), false));
        assert!(filter.is_ignored(&root.join("fixtures"), true));
        assert!(!filter.is_ignored(&root.join("src/index.js"), false));
    }

    #[test]
    fn test_reads_gitignore() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "generated/\n").unwrap();
        let filter = IgnoreFilter::new(dir.path(), None);
        assert!(filter.is_ignored(&dir.path().join("generated"), true));
    }
}
