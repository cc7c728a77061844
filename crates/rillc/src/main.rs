//! The Rill type checker CLI.
//!
//! Provides the `rillc` command with the following subcommands:
//!
//! - `rillc check <file>` - Infer types and print method instances and the
//!   program's result type
//! - `rillc ast <file>` - Print the parsed AST as JSON
//!
//! Options for `check`:
//! - `--ast` - Also print every annotated node with its type
//! - `--json` - Output the result (or diagnostics) as JSON
//! - `--no-color` - Disable colorized diagnostics
//! - `--config` - Path to a rill.toml (default: rill.toml next to the file)
//! - `--max-depth` - Override the method inference depth limit
//!
//! Logging goes to stderr and is controlled by `RILL_LOG` (default `warn`).

mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use rill_common::span::LineIndex;
use rill_parser::ast::{Expr, ExprKind, NodeId, Program};
use rill_typeck::diagnostics::{render_diagnostic, DiagnosticOptions};
use rill_typeck::Module;
use tracing_subscriber::EnvFilter;

use crate::config::ProjectConfig;

#[derive(Parser)]
#[command(name = "rillc", version, about = "The Rill type checker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer types for a Rill source file
    Check {
        /// Path to the source file
        file: PathBuf,

        /// Print every annotated node with its inferred type
        #[arg(long)]
        ast: bool,

        /// Output the result and diagnostics as JSON
        #[arg(long)]
        json: bool,

        /// Disable colorized output
        #[arg(long = "no-color")]
        no_color: bool,

        /// Path to a rill.toml (defaults to one beside the source file)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Maximum number of method bodies under inference at once
        #[arg(long = "max-depth")]
        max_depth: Option<usize>,
    },
    /// Print the parsed AST of a Rill source file as JSON
    Ast {
        /// Path to the source file
        file: PathBuf,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            file,
            ast,
            json,
            no_color,
            config,
            max_depth,
        } => {
            let diag_opts = DiagnosticOptions {
                color: !no_color && !json,
                json,
            };
            if let Err(e) = check(&file, ast, config.as_deref(), max_depth, &diag_opts) {
                if json {
                    let msg = serde_json::json!({
                        "code": "C0001",
                        "severity": "error",
                        "message": e,
                        "file": file.display().to_string(),
                        "spans": [],
                        "fix": null
                    });
                    eprintln!("{}", msg);
                } else {
                    eprintln!("error: {}", e);
                }
                process::exit(1);
            }
        }
        Commands::Ast { file } => {
            if let Err(e) = print_ast(&file) {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn read_source(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read '{}': {}", path.display(), e))
}

/// Parse the file, reporting parse errors. `None` means errors were reported.
fn parse_file(
    source: &str,
    path: &Path,
    diag_opts: &DiagnosticOptions,
) -> Option<Program> {
    let parse = rill_parser::parse(source);
    if report_parse_errors(source, path, &parse, diag_opts) {
        return None;
    }
    Some(parse.into_program())
}

/// The check pipeline: read -> parse -> infer -> print.
fn check(
    path: &Path,
    show_ast: bool,
    config_path: Option<&Path>,
    max_depth: Option<usize>,
    diag_opts: &DiagnosticOptions,
) -> Result<(), String> {
    let source = read_source(path)?;
    let mut config = ProjectConfig::load(config_path, path)?.typeck;
    if let Some(depth) = max_depth {
        config = config.with_max_depth(depth);
    }
    tracing::debug!(file = %path.display(), max_depth = config.max_depth, "checking");

    let program = parse_file(&source, path, diag_opts)
        .ok_or_else(|| format!("could not parse '{}'", path.display()))?;

    let module = match rill_typeck::infer_with_config(&program, &config) {
        Ok(module) => module,
        Err(err) => {
            let rendered =
                render_diagnostic(&err, &source, &path.display().to_string(), diag_opts);
            if diag_opts.json {
                eprintln!("{}", rendered);
            } else {
                eprint!("{}", rendered);
            }
            return Err(format!("could not type-check '{}'", path.display()));
        }
    };

    if diag_opts.json {
        let json = serde_json::to_string_pretty(&module)
            .map_err(|e| format!("failed to serialize result: {}", e))?;
        println!("{}", json);
        return Ok(());
    }

    print!("{}", summary(&module));
    if show_ast {
        print!("{}", annotations(&program, &module, &source));
    }
    Ok(())
}

fn print_ast(path: &Path) -> Result<(), String> {
    let source = read_source(path)?;
    let program = parse_file(&source, path, &DiagnosticOptions::default())
        .ok_or_else(|| format!("could not parse '{}'", path.display()))?;
    let json = serde_json::to_string_pretty(&program)
        .map_err(|e| format!("failed to serialize AST: {}", e))?;
    println!("{}", json);
    Ok(())
}

// ── Output ─────────────────────────────────────────────────────────────

/// One line per inferred method instance, then the result type.
fn summary(module: &Module) -> String {
    let mut out = String::new();
    for method in module.methods() {
        if method.instances().is_empty() && method.block_instances().is_empty() {
            out.push_str(&format!("{}: never called\n", method.name));
            continue;
        }
        for inst in method.instances() {
            out.push_str(&format!("{}{} -> {}\n", method.name, inst.signature, inst.returns));
        }
        for inst in method.block_instances() {
            out.push_str(&format!(
                "{}{} with block -> {}\n",
                method.name, inst.signature, inst.returns
            ));
        }
    }
    out.push_str(&format!("result: {}\n", module.result_type()));
    out
}

/// `line:col  snippet : Type` for every annotated node, in source order.
fn annotations(program: &Program, module: &Module, source: &str) -> String {
    let mut nodes = Vec::new();
    for stmt in &program.stmts {
        collect_nodes(stmt, &mut nodes);
    }
    nodes.sort_by_key(|(span, id)| (span.start, std::cmp::Reverse(span.end), *id));

    let index = LineIndex::new(source);
    let mut out = String::new();
    for (span, id) in nodes {
        let Some(ty) = module.type_of(id) else {
            continue;
        };
        let (line, col) = index.line_col(span.start);
        let text = source.get(span.to_range()).unwrap_or("");
        let first_line = text.lines().next().unwrap_or("");
        let snippet: String = if first_line.chars().count() > 40 || first_line.len() < text.len() {
            let mut s: String = first_line.chars().take(40).collect();
            s.push_str("...");
            s
        } else {
            first_line.to_string()
        };
        out.push_str(&format!("{}:{}\t{} : {}\n", line, col, snippet, ty));
    }
    out
}

fn collect_nodes(expr: &Expr, out: &mut Vec<(rill_common::span::Span, NodeId)>) {
    out.push((expr.span, expr.id));
    match &expr.kind {
        ExprKind::Assign(a) => {
            out.push((a.target.span, a.target.id));
            collect_nodes(&a.value, out);
        }
        ExprKind::Call(c) => {
            for arg in &c.args {
                collect_nodes(arg, out);
            }
            if let Some(block) = &c.block {
                out.push((block.span, block.id));
                for p in &block.params {
                    out.push((p.span, p.id));
                }
                for s in &block.body {
                    collect_nodes(s, out);
                }
            }
        }
        ExprKind::Yield(y) => {
            for arg in &y.args {
                collect_nodes(arg, out);
            }
        }
        ExprKind::If(i) => {
            collect_nodes(&i.cond, out);
            for s in i.then_body.iter().chain(i.else_body.iter().flatten()) {
                collect_nodes(s, out);
            }
        }
        ExprKind::While(w) => {
            collect_nodes(&w.cond, out);
            for s in &w.body {
                collect_nodes(s, out);
            }
        }
        ExprKind::Def(d) => {
            for p in &d.params {
                out.push((p.span, p.id));
            }
            for s in &d.body {
                collect_nodes(s, out);
            }
        }
        ExprKind::Literal(_) | ExprKind::Var(_) => {}
    }
}

// ── Diagnostics ────────────────────────────────────────────────────────

/// Report parse errors to stderr. Returns true if there were any.
fn report_parse_errors(
    source: &str,
    path: &Path,
    parse: &rill_parser::Parse,
    diag_opts: &DiagnosticOptions,
) -> bool {
    let file_name = path.display().to_string();
    for error in parse.errors() {
        let start = (error.span.start as usize).min(source.len());
        let end = (error.span.end as usize).max(start + 1).min(source.len().max(start));
        if diag_opts.json {
            let mut spans = vec![serde_json::json!({
                "start": start,
                "end": end,
                "label": error.message,
            })];
            if let Some((message, span)) = &error.related {
                spans.push(serde_json::json!({
                    "start": span.start,
                    "end": span.end,
                    "label": message,
                }));
            }
            let json_diag = serde_json::json!({
                "code": "P0001",
                "severity": "error",
                "message": format!("parse error: {}", error.message),
                "file": file_name,
                "spans": spans,
                "fix": null
            });
            eprintln!("{}", json_diag);
        } else {
            use ariadne::{Color, Config, Label, Report, ReportKind, Source};
            let config = Config::default().with_color(diag_opts.color);
            let mut builder = Report::build(ReportKind::Error, start..end)
                .with_code("P0001")
                .with_message("parse error")
                .with_config(config)
                .with_label(
                    Label::new(start..end)
                        .with_message(&error.message)
                        .with_color(Color::Red),
                );
            if let Some((message, span)) = &error.related {
                builder = builder.with_label(
                    Label::new(span.to_range())
                        .with_message(message)
                        .with_color(Color::Blue),
                );
            }
            let _ = builder.finish().eprint(Source::from(source));
        }
    }
    !parse.ok()
}
