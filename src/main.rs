use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use cpp_quickfix::config::{load_or_default, QuickFixConfig};
use cpp_quickfix::{
    is_source_extension, registry, write_verified, CompletionItem, EditResult, EditVerification,
    Editor, EditorState, Position, QuickFixCollector,
};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "cpp-quickfix")]
#[command(about = "Cursor-driven quick fixes for C and C++ sources", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./quickfix.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the quick fixes offered at a position
    List {
        file: PathBuf,

        /// Line of the cursor (1-based)
        #[arg(short, long)]
        line: usize,

        /// Column of the cursor (1-based, in bytes)
        #[arg(short = 'C', long)]
        column: usize,

        /// Print the offered fixes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply one of the quick fixes offered at a position
    Apply {
        file: PathBuf,

        /// Line of the cursor (1-based)
        #[arg(short, long)]
        line: usize,

        /// Column of the cursor (1-based, in bytes)
        #[arg(short = 'C', long)]
        column: usize,

        /// Index (as printed by `list`) or rule id of the fix to apply
        #[arg(short, long, default_value = "0")]
        fix: String,

        /// Show what would change without writing the file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Report every quick fix available in a file or directory tree
    Scan {
        path: PathBuf,

        /// Print the findings as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the registered rules
    Rules,
}

fn main() -> Result<()> {
    cpp_quickfix::init_tracing();
    let cli = Cli::parse();

    let cwd = env::current_dir().context("cannot determine current directory")?;
    let config = load_or_default(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::List {
            file,
            line,
            column,
            json,
        } => cmd_list(&config, &file, line, column, json),

        Commands::Apply {
            file,
            line,
            column,
            fix,
            dry_run,
            diff,
        } => cmd_apply(&config, &file, line, column, &fix, dry_run, diff),

        Commands::Scan { path, json } => cmd_scan(&config, &path, json),

        Commands::Rules => cmd_rules(&config),
    }
}

/// Open `file` with the cursor at a 1-based line and column.
fn open_at(file: &Path, line: usize, column: usize) -> Result<EditorState> {
    if line == 0 || column == 0 {
        anyhow::bail!("line and column are 1-based");
    }
    let mut editor =
        EditorState::open(file).with_context(|| format!("failed to parse {}", file.display()))?;
    if editor.document().is_some_and(|doc| doc.has_errors()) {
        eprintln!(
            "{}",
            format!("Warning: {} has syntax errors", file.display()).yellow()
        );
    }
    editor.set_cursor_position(Position::new(line - 1, column - 1));
    Ok(editor)
}

fn cmd_list(
    config: &QuickFixConfig,
    file: &Path,
    line: usize,
    column: usize,
    json: bool,
) -> Result<()> {
    let editor = open_at(file, line, column)?;
    let mut collector = QuickFixCollector::from_config(config);
    collector.start_completion(&editor);
    let fixes = collector.completions();

    if json {
        println!("{}", serde_json::to_string_pretty(&fixes)?);
        return Ok(());
    }

    if fixes.is_empty() {
        println!("{}", "No quick fixes available here".yellow());
        return Ok(());
    }
    for fix in &fixes {
        println!(
            "{} {} {}",
            format!("[{}]", fix.index).bold(),
            fix.description,
            format!("({})", fix.id).dimmed()
        );
    }
    Ok(())
}

fn select_fix(fixes: &[CompletionItem], selector: &str) -> Result<usize> {
    if let Ok(index) = selector.parse::<usize>() {
        if index < fixes.len() {
            return Ok(index);
        }
        anyhow::bail!("fix {} does not exist ({} offered)", index, fixes.len());
    }
    fixes
        .iter()
        .find(|fix| fix.id == selector)
        .map(|fix| fix.index)
        .with_context(|| format!("fix '{selector}' is not offered at this position"))
}

fn cmd_apply(
    config: &QuickFixConfig,
    file: &Path,
    line: usize,
    column: usize,
    selector: &str,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    let mut editor = open_at(file, line, column)?;
    let original = editor.buffer().text().to_string();

    let mut collector = QuickFixCollector::from_config(config);
    if collector.start_completion(&editor).is_none() {
        anyhow::bail!("no quick fixes available at {}:{}:{}", file.display(), line, column);
    }
    let index = select_fix(&collector.completions(), selector)?;
    let applied = collector.complete(index, &mut editor)?;
    let modified = editor.buffer().text();

    if show_diff {
        display_diff(file, &original, modified);
    }

    if dry_run {
        println!(
            "{} {}: Would apply to {}",
            "✓".green(),
            applied.description,
            file.display()
        );
        return Ok(());
    }

    let expected = EditVerification::from_text(&original);
    match write_verified(file, &expected, modified)? {
        EditResult::Applied { file, .. } => println!(
            "{} {}: Applied to {}",
            "✓".green(),
            applied.description,
            file.display()
        ),
        EditResult::AlreadyApplied { file } => println!(
            "{} {}: Already applied to {}",
            "⊙".yellow(),
            applied.description,
            file.display()
        ),
    }
    Ok(())
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (fixed)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
    if !modified.ends_with('\n') {
        println!();
    }
}

#[derive(Debug, Serialize)]
struct Finding {
    file: PathBuf,
    line: usize,
    column: usize,
    id: &'static str,
    description: &'static str,
}

/// Try the cursor on the start of every token and collect what is offered.
fn scan_file(config: &QuickFixConfig, file: &Path) -> Result<Vec<Finding>> {
    let mut editor =
        EditorState::open(file).with_context(|| format!("failed to parse {}", file.display()))?;
    let Some(doc) = editor.document().cloned() else {
        return Ok(Vec::new());
    };

    let mut collector = QuickFixCollector::from_config(config);
    let mut seen = BTreeSet::new();
    let mut findings = Vec::new();
    for token in doc.tokens() {
        editor.set_cursor(token.start);
        if collector.start_completion(&editor).is_none() {
            continue;
        }
        let position = doc.token_position(token.start);
        for fix in collector.completions() {
            if seen.insert((position.line, fix.id)) {
                findings.push(Finding {
                    file: file.to_path_buf(),
                    line: position.line + 1,
                    column: position.column + 1,
                    id: fix.id,
                    description: fix.description,
                });
            }
        }
        collector.cleanup();
    }
    Ok(findings)
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(is_source_extension)
}

fn cmd_scan(config: &QuickFixConfig, path: &Path, json: bool) -> Result<()> {
    let mut files = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry?;
        if entry.file_type().is_file() && is_source_file(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();

    let mut findings = Vec::new();
    for file in &files {
        match scan_file(config, file) {
            Ok(found) => findings.extend(found),
            Err(e) => eprintln!("{} {}: {:#}", "✗".red(), file.display(), e),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
        return Ok(());
    }

    for finding in &findings {
        println!(
            "{}:{}:{}: {} {}",
            finding.file.display(),
            finding.line,
            finding.column,
            finding.description,
            format!("({})", finding.id).dimmed()
        );
    }
    println!();
    println!("{}", "Summary:".bold());
    println!("  {} files scanned", files.len());
    println!(
        "  {} quick fixes available",
        format!("{}", findings.len()).green()
    );
    Ok(())
}

fn cmd_rules(config: &QuickFixConfig) -> Result<()> {
    for rule in registry() {
        let disabled = config.rules.disabled.iter().any(|id| id == rule.id);
        let status = if disabled {
            "disabled".red()
        } else {
            "enabled".green()
        };
        println!("{:<32} {:<36} {}", rule.id, rule.description, status);
    }
    Ok(())
}
