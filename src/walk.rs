//! Batch analysis: collect source files under a set of paths and report
//! their unknown global references, one worker thread per core.

use crate::analysis::Analysis;
use crate::config::LexscopeConfig;
use crate::globals::KnownGlobals;
use crate::ignore::IgnoreFilter;
use crate::ui::ProgressMessage;
use crossbeam::channel::{self, Sender};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One free reference to a name that is not a host global
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalRef {
    pub name: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub globals: Vec<GlobalRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Source files below `paths`, sorted. Explicit file arguments are always kept.
pub fn collect_files(paths: &[PathBuf], config: &LexscopeConfig) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }

        let filter = IgnoreFilter::new(path, Some(&config.walk.exclude));
        let walker = ::ignore::WalkBuilder::new(path)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                !filter.is_ignored(entry.path(), is_dir)
            })
            .build();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
                    if is_file && config.walk.accepts(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => tracing::warn!("Walk error under {}: {}", path.display(), e),
            }
        }
    }
    files.sort();
    files.dedup();
    tracing::debug!("Collected {} source files", files.len());
    files
}

/// Analyse one file and list its unknown global references
pub fn analyse_file(path: &Path, config: &LexscopeConfig, known: &KnownGlobals) -> FileReport {
    let result = std::fs::read_to_string(path)
        .map_err(crate::Error::from)
        .and_then(|source| Analysis::parse_with(source, &config.analysis.parse_options()));

    match result {
        Ok(analysis) => {
            let lines = analysis.line_index();
            let globals = analysis
                .unknown_global_refs(known)
                .into_iter()
                .map(|id| {
                    let offset = analysis.tree().span(id).start;
                    GlobalRef {
                        name: analysis.text(id).to_string(),
                        offset,
                        line: lines.line_of(offset),
                        column: lines.column_of(offset),
                    }
                })
                .collect();
            FileReport {
                path: path.to_path_buf(),
                globals,
                error: None,
            }
        }
        Err(e) => FileReport {
            path: path.to_path_buf(),
            globals: Vec::new(),
            error: Some(e.to_string()),
        },
    }
}

/// Analyse `files` on `workers` threads. Each worker owns the trees it
/// builds; reports come back in the order of `files`.
pub fn analyse_files(
    files: &[PathBuf],
    config: &LexscopeConfig,
    known: &KnownGlobals,
    workers: usize,
    progress: Option<Sender<ProgressMessage>>,
) -> Vec<FileReport> {
    let workers = workers.clamp(1, files.len().max(1));

    let (job_tx, job_rx) = channel::unbounded::<usize>();
    let (report_tx, report_rx) = channel::unbounded::<(usize, FileReport)>();
    for index in 0..files.len() {
        let _ = job_tx.send(index);
    }
    drop(job_tx);

    let scoped = crossbeam::scope(|s| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let report_tx = report_tx.clone();
            let progress = progress.clone();
            s.spawn(move |_| {
                for index in job_rx {
                    let path = &files[index];
                    let report = analyse_file(path, config, known);
                    if let Some(progress) = &progress {
                        let file = path.display().to_string();
                        let msg = match &report.error {
                            Some(error) => ProgressMessage::Failed {
                                file,
                                error: error.clone(),
                            },
                            None => ProgressMessage::Analysed { file },
                        };
                        let _ = progress.send(msg);
                    }
                    let _ = report_tx.send((index, report));
                }
            });
        }
    });
    drop(report_tx);
    if scoped.is_err() {
        tracing::warn!("An analysis worker panicked");
    }

    let reports = in_file_order(files, report_rx.into_iter().collect(), progress.as_ref());
    if let Some(progress) = &progress {
        let _ = progress.send(ProgressMessage::Finished);
    }
    reports
}

/// One report per file in the order of `files`. A file whose worker died
/// before reporting gets an error report instead of being dropped.
fn in_file_order(
    files: &[PathBuf],
    received: Vec<(usize, FileReport)>,
    progress: Option<&Sender<ProgressMessage>>,
) -> Vec<FileReport> {
    let mut slots: Vec<Option<FileReport>> = vec![None; files.len()];
    for (index, report) in received {
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(report);
        }
    }

    slots
        .into_iter()
        .zip(files)
        .map(|(slot, path)| {
            slot.unwrap_or_else(|| {
                let error = "analysis worker panicked".to_string();
                tracing::warn!("No report for {}: {}", path.display(), error);
                if let Some(progress) = progress {
                    let _ = progress.send(ProgressMessage::Failed {
                        file: path.display().to_string(),
                        error: error.clone(),
                    });
                }
                FileReport {
                    path: path.clone(),
                    globals: Vec::new(),
                    error: Some(error),
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_collect_files_respects_extensions_and_excludes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.js", "a;");
        write(dir.path(), "src/b.mjs", "b;");
        write(dir.path(), "src/notes.md", "# notes");
        write(dir.path(), "node_modules/dep/index.js", "dep;");
        write(dir.path(), "fixtures/skip.js", "skip;");

        let mut config = LexscopeConfig::default();
        config.walk.exclude = vec!["fixtures/".to_string()];
        let files = collect_files(&[dir.path().to_path_buf()], &config);

        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["src/a.js", "src/b.mjs"]);
    }

    #[test]
    fn test_analyse_file_reports_positions() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.js", "var x = 1;\nconsole.log(x, y);\n");
        let config = LexscopeConfig::default();
        let report = analyse_file(&path, &config, &config.analysis.known_globals());

        assert!(report.error.is_none());
        assert_eq!(
            report.globals,
            vec![GlobalRef {
                name: "y".to_string(),
                offset: 26,
                line: 2,
                column: 16,
            }]
        );
    }

    #[test]
    fn test_analyse_files_in_parallel_keeps_order() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            write(dir.path(), "a.js", "alpha();"),
            write(dir.path(), "b.js", "function ("),
            write(dir.path(), "c.js", "var gamma; gamma(delta);"),
        ];
        let config = LexscopeConfig::default();
        let known = config.analysis.known_globals();
        let (tx, rx) = channel::unbounded();
        let reports = analyse_files(&files, &config, &known, 3, Some(tx));

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].globals[0].name, "alpha");
        assert!(reports[1].error.is_some());
        assert_eq!(reports[2].globals.len(), 1);
        assert_eq!(reports[2].globals[0].name, "delta");

        let messages: Vec<_> = rx.try_iter().collect();
        assert_eq!(messages.len(), 4);
        assert!(matches!(messages.last(), Some(ProgressMessage::Finished)));
    }

    #[test]
    fn test_unreported_files_get_error_reports() {
        let files = vec![PathBuf::from("a.js"), PathBuf::from("b.js"), PathBuf::from("c.js")];
        let report = |path: &str, name: &str| FileReport {
            path: PathBuf::from(path),
            globals: vec![GlobalRef {
                name: name.to_string(),
                offset: 0,
                line: 1,
                column: 1,
            }],
            error: None,
        };
        let received = vec![(2, report("c.js", "gamma")), (0, report("a.js", "alpha"))];
        let (tx, rx) = channel::unbounded();

        let reports = in_file_order(&files, received, Some(&tx));
        let paths: Vec<_> = reports.iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, files);
        assert_eq!(reports[0].globals[0].name, "alpha");
        assert_eq!(reports[2].globals[0].name, "gamma");
        assert!(reports[1].globals.is_empty());
        assert!(reports[1].error.as_deref().unwrap().contains("panicked"));

        let messages: Vec<_> = rx.try_iter().collect();
        assert_eq!(messages.len(), 1);
        assert!(matches!(&messages[0], ProgressMessage::Failed { file, .. } if file == "b.js"));
    }

    #[test]
    fn test_empty_known_globals_reports_host_globals() {
        let dir = TempDir::new().unwrap();
        let files = vec![write(dir.path(), "a.js", "console.log(x);")];
        let config = LexscopeConfig::default();

        let reports = analyse_files(&files, &config, &KnownGlobals::empty(), 2, None);
        let names: Vec<_> = reports[0].globals.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["console", "x"]);
    }
}
