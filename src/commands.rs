use crate::{emit_success, OutputMode, Position};
use anyhow::Context as _;
use lexscope::config::{write_config, LexscopeConfig};
use lexscope::query::{self, ExportKind};
use lexscope::syntax::LineIndex;
use lexscope::ui::{self, render, scope_icon, theme, Icons, ProgressManager, TableBuilder};
use lexscope::walk::{analyse_files, collect_files};
use lexscope::{Analysis, KnownGlobals, NodeId, PathSegment, ScopeId, ScopeKind};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tabled::Tabled;

pub struct Context {
    pub mode: OutputMode,
    pub config: LexscopeConfig,
}

impl Context {
    fn analyse(&self, file: &Path) -> anyhow::Result<Analysis> {
        let source = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        Analysis::parse_with(source, &self.config.analysis.parse_options())
            .with_context(|| format!("failed to analyse {}", file.display()))
    }
}

/// A node located in its file, as printed and serialized by every command
#[derive(Debug, Serialize)]
struct Located {
    #[serde(rename = "type")]
    type_name: String,
    start: usize,
    end: usize,
    line: usize,
    column: usize,
    text: String,
}

fn locate(analysis: &Analysis, lines: &LineIndex, id: NodeId) -> Located {
    let span = analysis.tree().span(id);
    Located {
        type_name: analysis.tree().type_name(id).to_string(),
        start: span.start,
        end: span.end,
        line: lines.line_of(span.start),
        column: lines.column_of(span.start),
        text: analysis.text(id).to_string(),
    }
}

fn location(file: &Path, located: &Located) -> String {
    ui::location(&file.display().to_string(), located.line, located.column)
}

fn format_path(path: &[PathSegment]) -> String {
    let steps: Vec<String> = path
        .iter()
        .map(|segment| match segment {
            PathSegment::Name(name) => name.clone(),
            PathSegment::Index(index) => index.to_string(),
        })
        .collect();
    if steps.is_empty() {
        "<root>".to_string()
    } else {
        steps.join(".")
    }
}

/// First line of `text`, shortened for table cells
fn snippet(text: &str) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > 60 {
        format!("{}…", line.chars().take(59).collect::<String>())
    } else {
        line.to_string()
    }
}

fn resolve_index(position: &Position, analysis: &Analysis) -> anyhow::Result<usize> {
    let len = analysis.source().len();
    match (position.offset, position.line, position.column) {
        (Some(offset), _, _) => {
            anyhow::ensure!(
                offset <= len,
                "offset {} is past the end of the file ({} bytes)",
                offset,
                len
            );
            Ok(offset)
        }
        (None, Some(line), Some(column)) => analysis
            .line_index()
            .offset_at(line, column)
            .with_context(|| format!("line {} is past the end of the file", line)),
        _ => anyhow::bail!("a position is required: pass --offset or --line and --column"),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScopeReport {
    id: ScopeId,
    kind: ScopeKind,
    parent: Option<ScopeId>,
    start: usize,
    end: usize,
    declared_names: Vec<String>,
    refs: Vec<String>,
    this_refs: usize,
    sub_scopes: Vec<ScopeId>,
}

#[derive(Tabled)]
struct ScopeRow {
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Lines")]
    lines: String,
    #[tabled(rename = "Declares")]
    declares: String,
    #[tabled(rename = "Refs")]
    refs: usize,
    #[tabled(rename = "this")]
    this_refs: usize,
}

pub fn run_scopes(ctx: &Context, file: &Path) -> anyhow::Result<()> {
    let analysis = ctx.analyse(file)?;
    let resolver = analysis.resolver();
    let tree = analysis.tree();
    let scopes = analysis.scopes();

    let reports: Vec<ScopeReport> = scopes
        .descendants(ScopeId::root())
        .into_iter()
        .map(|id| {
            let scope = scopes.get(id);
            let span = tree.span(scope.node);
            ScopeReport {
                id,
                kind: scope.kind,
                parent: scope.parent,
                start: span.start,
                end: span.end,
                declared_names: resolver.declared_names(id).to_vec(),
                refs: scope
                    .refs
                    .iter()
                    .filter_map(|r| tree.identifier_name(*r).map(str::to_string))
                    .collect(),
                this_refs: scope.this_refs.len(),
                sub_scopes: scope.sub_scopes.clone(),
            }
        })
        .collect();

    if !ctx.mode.is_human() {
        return emit_success(ctx.mode, "scopes", serde_json::to_value(&reports)?);
    }

    let lines = analysis.line_index();
    let rows: Vec<ScopeRow> = reports
        .iter()
        .map(|report| {
            let depth = scopes.chain(report.id).len() - 1;
            let (first, last) = lines.lines_of(lexscope::Span::new(report.start, report.end));
            ScopeRow {
                scope: format!(
                    "{}{} #{}",
                    "  ".repeat(depth),
                    scope_icon(report.kind),
                    report.id.0
                ),
                lines: format!("{}-{}", first, last),
                declares: report.declared_names.join(", "),
                refs: report.refs.len(),
                this_refs: report.this_refs,
            }
        })
        .collect();

    ui::header(&format!("Scopes of {}", file.display()));
    println!("{}", render(&rows));

    let summary =
        query::top_level_decls_and_refs(&resolver, &ctx.config.analysis.top_level_options());
    let mut table = TableBuilder::new();
    table.add_row("Scopes", scopes.len());
    table.add_row("Top-level names", summary.declared_names.len());
    table.add_row("Undeclared names", summary.undeclared_names.join(", "));
    println!("{}", table.build());
    Ok(())
}

pub fn run_globals(
    ctx: &Context,
    paths: &[PathBuf],
    all: bool,
    jobs: Option<usize>,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let files = collect_files(paths, &ctx.config);
    if files.is_empty() {
        if ctx.mode.is_human() {
            ui::warn("No source files found");
            return Ok(());
        }
        return emit_success(ctx.mode, "globals", serde_json::json!([]));
    }

    let known = if all {
        KnownGlobals::empty()
    } else {
        ctx.config.analysis.known_globals()
    };
    let workers = jobs.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });

    if !ctx.mode.is_human() {
        let reports = analyse_files(&files, &ctx.config, &known, workers, None);
        return emit_success(ctx.mode, "globals", serde_json::to_value(&reports)?);
    }

    let (mut progress, tx) = ProgressManager::new(files.len());
    let reports = analyse_files(&files, &ctx.config, &known, workers, Some(tx));
    progress.finish();

    let mut total = 0;
    for report in &reports {
        if let Some(error) = &report.error {
            ui::warn(&format!("{}: {}", report.path.display(), error));
            continue;
        }
        for global in &report.globals {
            total += 1;
            println!(
                "{}  {}",
                ui::location(&report.path.display().to_string(), global.line, global.column),
                global.name.style(theme().reference.clone())
            );
        }
    }
    progress.finish_with_summary(started.elapsed(), reports.len(), total);
    Ok(())
}

#[derive(Tabled)]
struct ImportRow {
    #[tabled(rename = "Local")]
    local: String,
    #[tabled(rename = "Imported")]
    imported: String,
    #[tabled(rename = "From")]
    from_module: String,
}

pub fn run_imports(ctx: &Context, file: &Path) -> anyhow::Result<()> {
    let analysis = ctx.analyse(file)?;
    let imports = analysis.imports();

    if !ctx.mode.is_human() {
        return emit_success(ctx.mode, "imports", serde_json::to_value(&imports)?);
    }

    ui::header(&format!("{} Imports of {}", Icons::IMPORT, file.display()));
    if imports.is_empty() {
        println!("{}", ui::muted("no imports"));
        return Ok(());
    }
    let rows: Vec<ImportRow> = imports
        .into_iter()
        .map(|binding| ImportRow {
            local: binding.local,
            imported: binding.imported,
            from_module: binding.from_module,
        })
        .collect();
    println!("{}", render(&rows));
    Ok(())
}

#[derive(Tabled)]
struct ExportRow {
    #[tabled(rename = "Exported")]
    exported: String,
    #[tabled(rename = "Local")]
    local: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "From")]
    from_module: String,
}

fn export_kind_label(kind: Option<ExportKind>) -> &'static str {
    match kind {
        Some(ExportKind::Id) => "id",
        Some(ExportKind::Var) => "var",
        Some(ExportKind::Function) => "function",
        Some(ExportKind::Class) => "class",
        Some(ExportKind::Expr) => "expr",
        None => "",
    }
}

pub fn run_exports(ctx: &Context, file: &Path, include_re_exports: bool) -> anyhow::Result<()> {
    let analysis = ctx.analyse(file)?;
    let exports = analysis.exports(include_re_exports);

    if !ctx.mode.is_human() {
        return emit_success(ctx.mode, "exports", serde_json::to_value(&exports)?);
    }

    ui::header(&format!("{} Exports of {}", Icons::EXPORT, file.display()));
    if exports.is_empty() {
        println!("{}", ui::muted("no exports"));
        return Ok(());
    }
    let rows: Vec<ExportRow> = exports
        .into_iter()
        .map(|binding| ExportRow {
            kind: export_kind_label(binding.kind).to_string(),
            exported: binding.exported,
            local: binding.local.or(binding.imported).unwrap_or_default(),
            from_module: binding.from_module.unwrap_or_default(),
        })
        .collect();
    println!("{}", render(&rows));
    Ok(())
}

pub fn run_decl(ctx: &Context, file: &Path, name: &str, position: &Position) -> anyhow::Result<()> {
    let analysis = ctx.analyse(file)?;
    let index = resolve_index(position, &analysis)?;
    let lines = analysis.line_index();
    let decl = analysis.declaration_closest_to_index(name, index);
    let statement = decl.and_then(|id| query::statement_of(analysis.tree(), id));

    if !ctx.mode.is_human() {
        let data = serde_json::json!({
            "name": name,
            "index": index,
            "declaration": decl.map(|id| locate(&analysis, &lines, id)),
            "statement": statement.map(|id| locate(&analysis, &lines, id)),
        });
        return emit_success(ctx.mode, "decl", data);
    }

    match decl {
        Some(id) => {
            let located = locate(&analysis, &lines, id);
            ui::occurrence(&location(file, &located), true, &located.text);
            if let Some(statement) = statement {
                println!("  {}", ui::dim(&snippet(analysis.text(statement))));
            }
        }
        None => println!(
            "{} {} is not declared in any enclosing scope",
            Icons::GLOBE,
            name.style(theme().reference.clone())
        ),
    }
    Ok(())
}

/// Scope whose bindings decide what `name` means at `index`
fn binding_scope(analysis: &Analysis, name: &str, index: usize) -> ScopeId {
    let tree = analysis.tree();
    let scopes = analysis.scopes();
    let scope = query::scope_at_index(tree, scopes, index);
    if name == "this" {
        // arrows have no `this` of their own
        return scopes
            .chain(scope)
            .into_iter()
            .find(|id| scopes.get(*id).kind != ScopeKind::Arrow)
            .unwrap_or_else(ScopeId::root);
    }
    analysis
        .resolver()
        .resolve(scope, name)
        .unwrap_or_else(ScopeId::root)
}

pub fn run_refs(ctx: &Context, file: &Path, name: &str, position: &Position) -> anyhow::Result<()> {
    let analysis = ctx.analyse(file)?;
    let index = resolve_index(position, &analysis)?;
    let lines = analysis.line_index();
    let scope = binding_scope(&analysis, name, index);
    let found = analysis.resolver().find_references_and_decls_in_scope(scope, name);

    if !ctx.mode.is_human() {
        let locate_all = |ids: &[NodeId]| -> Vec<Located> {
            ids.iter().map(|id| locate(&analysis, &lines, *id)).collect()
        };
        let data = serde_json::json!({
            "name": name,
            "scope": scope,
            "decls": locate_all(&found.decls),
            "refs": locate_all(&found.refs),
        });
        return emit_success(ctx.mode, "refs", data);
    }

    ui::header(&format!("{} in scope #{}", name, scope.0));
    let mut occurrences: Vec<(bool, Located)> = found
        .decls
        .iter()
        .map(|id| (true, locate(&analysis, &lines, *id)))
        .chain(found.refs.iter().map(|id| (false, locate(&analysis, &lines, *id))))
        .collect();
    occurrences.sort_by_key(|(_, located)| located.start);
    if occurrences.is_empty() {
        println!("{}", ui::muted("no occurrences"));
    }
    for (is_decl, located) in &occurrences {
        let line = lines
            .line_span(located.line)
            .and_then(|span| analysis.source().get(span.start..span.end))
            .unwrap_or("");
        ui::occurrence(&location(file, located), *is_decl, &snippet(line.trim()));
    }
    Ok(())
}

pub fn run_statement(ctx: &Context, file: &Path, position: &Position) -> anyhow::Result<()> {
    let analysis = ctx.analyse(file)?;
    let index = resolve_index(position, &analysis)?;
    let lines = analysis.line_index();
    let tree = analysis.tree();
    let target = query::node_at_index(tree, index);
    let statement = query::statement_of(tree, target);

    if !ctx.mode.is_human() {
        let data = serde_json::json!({
            "target": locate(&analysis, &lines, target),
            "statement": statement.map(|id| locate(&analysis, &lines, id)),
            "path": statement.map(|id| tree.path_to(id)),
        });
        return emit_success(ctx.mode, "statement", data);
    }

    let Some(statement) = statement else {
        println!("{}", ui::muted("no statement encloses this position"));
        return Ok(());
    };
    let located = locate(&analysis, &lines, statement);
    ui::header(&format!("{} at {}", located.type_name, location(file, &located)));
    ui::info("Path", &format_path(&tree.path_to(statement)));
    ui::info("Target", tree.type_name(target));
    println!("{}", located.text);
    Ok(())
}

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Lines")]
    lines: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub fn run_lines(ctx: &Context, file: &Path, wanted: &[usize]) -> anyhow::Result<()> {
    let analysis = ctx.analyse(file)?;
    let lines = analysis.line_index();
    let tree = analysis.tree();
    let nodes = query::find_nodes_including_lines(tree, analysis.source(), wanted);

    if !ctx.mode.is_human() {
        let located: Vec<Located> = nodes.iter().map(|id| locate(&analysis, &lines, *id)).collect();
        return emit_success(ctx.mode, "lines", serde_json::to_value(&located)?);
    }

    let rows: Vec<NodeRow> = nodes
        .iter()
        .map(|id| {
            let depth = tree.ancestors(*id).count();
            let (first, last) = lines.lines_of(tree.span(*id));
            NodeRow {
                node: format!("{}{}", "  ".repeat(depth), tree.type_name(*id)),
                lines: format!("{}-{}", first, last),
                path: format_path(&tree.path_to(*id)),
                source: snippet(analysis.text(*id)),
            }
        })
        .collect();
    println!("{}", render(&rows));
    Ok(())
}

pub fn run_init(
    ctx: &Context,
    path: &Path,
    config: &LexscopeConfig,
    force: bool,
) -> anyhow::Result<()> {
    write_config(path, config, force)?;
    if ctx.mode.is_human() {
        ui::success(&format!("Wrote {}", path.display()));
        Ok(())
    } else {
        emit_success(ctx.mode, "init", serde_json::json!({ "path": path }))
    }
}
