use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use console::style;
use globset::{Glob, GlobSet, GlobSetBuilder};
use rwg_core::{
    suggest, AnnotatedText, Analyzer, Config, Edit, JsonLinesStore, MemoryStore, ScanMode,
    Segment, Session, SuggestionBook,
};
use serde::Serialize;
use tracing::{debug, info, Level};
use walkdir::WalkDir;

/// Repeated Word Guard CLI entry point.
#[derive(Debug, Parser)]
#[command(name = "rwg", about = "Find, highlight and rewrite repeated words in manuscripts.")]
struct Args {
    /// Path to config file (YAML). Defaults to rwg.yml if present.
    #[arg(long, default_value = "rwg.yml", global = true)]
    config: PathBuf,

    /// Set config overrides (repeatable as key=value). Example: --set threshold=5
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    sets: Vec<String>,

    /// Suggestion store (JSON lines). Overrides `suggestions.path` from the config.
    #[arg(long, value_name = "PATH", global = true)]
    store: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Count repeated headwords and print the highlighted text.
    Scan(ScanArgs),
    /// Replace one occurrence, its sentence, or every instance of a word.
    Replace(ReplaceArgs),
    /// Print the sentence around one occurrence.
    Sentence(SentenceArgs),
    /// Show stored replacement suggestions for a word.
    Suggest(SuggestArgs),
    /// Append replacement suggestions (comma separated) for a word.
    Propose(ProposeArgs),
}

#[derive(Debug, ClapArgs)]
struct ScanArgs {
    /// Files or directories to scan.
    #[arg(value_name = "PATH", default_value = ".", num_args = 0..)]
    paths: Vec<PathBuf>,

    /// Emit JSON output for automation.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Exit non-zero when any repeated headword is found.
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,

    /// Print only the frequency table, not the highlighted text.
    #[arg(long, action = ArgAction::SetTrue)]
    quiet: bool,

    /// Highlight only this word (ordinals stay those of the full scan).
    #[arg(long, value_name = "WORD")]
    only: Option<String>,
}

#[derive(Debug, ClapArgs)]
struct OccurrenceArgs {
    /// Document to edit.
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Literal word whose occurrence is addressed.
    #[arg(long)]
    word: String,

    /// Zero-based occurrence index, as printed by `rwg scan`.
    #[arg(long, default_value_t = 0)]
    index: usize,
}

#[derive(Debug, ClapArgs)]
struct ReplaceArgs {
    #[command(flatten)]
    target: OccurrenceArgs,

    /// Replacement text.
    #[arg(long = "with", value_name = "TEXT")]
    replacement: String,

    /// Replace the whole sentence containing the occurrence.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "all")]
    sentence: bool,

    /// Replace every instance of the word.
    #[arg(long, action = ArgAction::SetTrue)]
    all: bool,

    /// Write the result back to FILE instead of printing it.
    #[arg(long, action = ArgAction::SetTrue)]
    write: bool,
}

#[derive(Debug, ClapArgs)]
struct SentenceArgs {
    #[command(flatten)]
    target: OccurrenceArgs,

    /// Emit JSON output.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, ClapArgs)]
struct SuggestArgs {
    /// Surface word as it appears in the text.
    word: String,

    /// Emit JSON output.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, ClapArgs)]
struct ProposeArgs {
    /// Surface word; stored under its headword when it normalizes.
    word: String,

    /// Replacements, comma separated.
    replacements: String,
}

#[derive(Debug, Serialize)]
struct RankedWord {
    word: String,
    count: usize,
    suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FileResult {
    path: String,
    total_tokens: usize,
    repeated: Vec<RankedWord>,
    annotated: AnnotatedText,
}

#[derive(Debug, Serialize)]
struct OutputReport {
    files: Vec<FileResult>,
    total_tokens: usize,
    total_repeated: usize,
}

#[derive(Debug, Serialize)]
struct SuggestOutput<'a> {
    word: &'a str,
    key: Option<&'a str>,
    suggestions: &'a [String],
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let (mut cfg, config_root) = load_config(&args.config)?;
    apply_overrides(&mut cfg, &args.sets)?;
    if let Some(store) = &args.store {
        cfg.suggestions.path = Some(store.clone());
    }
    let store_path = cfg
        .suggestions
        .path
        .as_ref()
        .map(|p| resolve_store_path(p, &config_root));
    let analyzer = Analyzer::new(cfg)?;

    match args.command {
        Command::Scan(cmd) => run_scan(&analyzer, store_path.as_deref(), cmd),
        Command::Replace(cmd) => run_replace(&analyzer, store_path.as_deref(), cmd),
        Command::Sentence(cmd) => run_sentence(&analyzer, store_path.as_deref(), cmd),
        Command::Suggest(cmd) => run_suggest(&analyzer, store_path.as_deref(), cmd),
        Command::Propose(cmd) => run_propose(&analyzer, store_path.as_deref(), cmd),
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_book(store_path: Option<&Path>) -> SuggestionBook {
    match store_path {
        Some(path) => SuggestionBook::load(&JsonLinesStore::new(path)),
        None => SuggestionBook::load(&MemoryStore::default()),
    }
}

fn run_scan(
    analyzer: &Analyzer,
    store_path: Option<&Path>,
    args: ScanArgs,
) -> anyhow::Result<()> {
    let book = load_book(store_path);
    let ignore = build_ignore_set(&analyzer.config().files.ignore_globs)?;
    let mut files = collect_files(&args.paths, &ignore)?;
    files.sort();
    info!(files = files.len(), "scanning documents");

    let mut file_results = Vec::new();
    let mut total_tokens = 0usize;
    let mut total_repeated = 0usize;

    for path in files {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let view = Session::new(content)
            .with_filter(args.only.clone())
            .view(analyzer, &book);

        let repeated: Vec<RankedWord> = view
            .report
            .ranked()
            .into_iter()
            .map(|(word, count)| {
                let suggestions = book
                    .resolve(analyzer.normalizer(), &word)
                    .suggestions
                    .to_vec();
                RankedWord {
                    word,
                    count,
                    suggestions,
                }
            })
            .collect();
        total_tokens += view.report.total_tokens;
        total_repeated += repeated.len();

        let result = FileResult {
            path: path.to_string_lossy().to_string(),
            total_tokens: view.report.total_tokens,
            repeated,
            annotated: view.annotated,
        };
        if !args.json {
            print_human_report(&result, args.quiet);
        }
        file_results.push(result);
    }

    let output = OutputReport {
        files: file_results,
        total_tokens,
        total_repeated,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "\n{} files, {} tokens, {} repeated headwords",
            output.files.len(),
            total_tokens,
            total_repeated
        );
    }

    if args.strict && total_repeated > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn run_replace(
    analyzer: &Analyzer,
    store_path: Option<&Path>,
    args: ReplaceArgs,
) -> anyhow::Result<()> {
    let path = &args.target.file;
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let word = args.target.word.clone();
    let edit = if args.all {
        Edit::All {
            word,
            replacement: args.replacement,
        }
    } else if args.sentence {
        Edit::Sentence {
            word,
            ordinal: args.target.index,
            sentence: args.replacement,
        }
    } else {
        Edit::Occurrence {
            word,
            ordinal: args.target.index,
            replacement: args.replacement,
        }
    };

    let book = load_book(store_path);
    let session = Session::new(content.clone()).apply(analyzer, &book, &edit);
    if session.text() == content {
        eprintln!(
            "{} occurrence {} of `{}` not found; text unchanged",
            style("warning:").yellow().bold(),
            args.target.index,
            args.target.word
        );
    }

    if args.write {
        fs::write(path, session.text())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), "wrote edited document");
    } else {
        print!("{}", session.text());
    }
    Ok(())
}

fn run_sentence(
    analyzer: &Analyzer,
    store_path: Option<&Path>,
    args: SentenceArgs,
) -> anyhow::Result<()> {
    let path = &args.target.file;
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let book = load_book(store_path);
    let sentence = Session::new(content)
        .select(args.target.word.clone(), args.target.index)
        .selected_sentence(analyzer, &book)
        .ok_or_else(|| {
            anyhow!(
                "`{}` has no occurrence {} in {}",
                args.target.word,
                args.target.index,
                path.display()
            )
        })?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&sentence)?);
    } else {
        println!(
            "{} {}",
            style(format!("[{}..{}]", sentence.start, sentence.end)).dim(),
            sentence.text
        );
    }
    Ok(())
}

fn run_suggest(
    analyzer: &Analyzer,
    store_path: Option<&Path>,
    args: SuggestArgs,
) -> anyhow::Result<()> {
    let book = load_book(store_path);
    let resolution = book.resolve(analyzer.normalizer(), &args.word);
    if args.json {
        let output = SuggestOutput {
            word: &args.word,
            key: resolution.key,
            suggestions: resolution.suggestions,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }
    match resolution.key {
        Some(key) => {
            println!("{} (key {})", style(&args.word).bold(), style(key).cyan());
            for suggestion in resolution.suggestions {
                println!("  → {suggestion}");
            }
        }
        None => println!("No suggestions registered for `{}`.", args.word),
    }
    Ok(())
}

fn run_propose(
    analyzer: &Analyzer,
    store_path: Option<&Path>,
    args: ProposeArgs,
) -> anyhow::Result<()> {
    let path = store_path.ok_or_else(|| {
        anyhow!("no suggestion store configured; pass --store or set suggestions.path")
    })?;
    let mut store = JsonLinesStore::new(path);
    let key = suggest::propose(&mut store, analyzer.normalizer(), &args.word, &args.replacements)
        .with_context(|| format!("Failed to save suggestions for `{}`", args.word))?;
    println!(
        "Saved `{}` under {} in {}",
        args.replacements.trim(),
        style(&key).cyan(),
        store.path().display()
    );
    Ok(())
}

fn resolve_store_path(path: &Path, config_root: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_root.join(path)
    }
}

/// Extensions picked up when walking a directory. Files named explicitly are always read.
const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "rst"];

fn build_ignore_set(patterns: &[String]) -> anyhow::Result<GlobSet> {
    patterns
        .iter()
        .try_fold(
            GlobSetBuilder::new(),
            |mut builder, pattern| -> anyhow::Result<GlobSetBuilder> {
                let glob = Glob::new(pattern)
                    .with_context(|| format!("invalid ignore glob `{pattern}`"))?;
                builder.add(glob);
                Ok(builder)
            },
        )?
        .build()
        .context("Failed to compile ignore globs")
}

fn collect_files(paths: &[PathBuf], ignore: &GlobSet) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        let documents = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| !ignore.is_match(entry.path()));
        for entry in documents {
            let entry = entry?;
            if entry.file_type().is_file() && is_document(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Config plus the directory relative store paths resolve against.
fn load_config(path: &Path) -> anyhow::Result<(Config, PathBuf)> {
    let cwd = env::current_dir()?;
    if !path.exists() {
        return Ok((Config::default(), cwd));
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let cfg: Config = serde_yaml::from_str(&text)
        .with_context(|| format!("Invalid config in {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    let root = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or(cwd, Path::to_path_buf);
    Ok((cfg, root))
}

fn apply_overrides(cfg: &mut Config, sets: &[String]) -> anyhow::Result<()> {
    for kv in sets {
        let mut parts = kv.splitn(2, '=');
        let key = parts.next().unwrap_or("").trim();
        let val = parts.next().unwrap_or("").trim();
        if key.is_empty() {
            continue;
        }
        match key {
            "threshold" => {
                cfg.threshold = val
                    .parse::<usize>()
                    .with_context(|| format!("invalid threshold `{val}`"))?;
            }
            "scan" => {
                cfg.scan = match val.to_ascii_lowercase().as_str() {
                    "substring" => ScanMode::Substring,
                    "token-boundary" => ScanMode::TokenBoundary,
                    other => {
                        return Err(anyhow!(
                            "invalid scan mode `{other}` (expected substring or token-boundary)"
                        ))
                    }
                };
            }
            "sentence.terminators" => {
                cfg.sentence.terminators = val.replace("\\n", "\n");
            }
            "suggestions.path" => {
                cfg.suggestions.path = if val.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(val))
                };
            }
            "stopwords" => {
                cfg.stopwords = split_list(val);
            }
            "suffixes" => {
                cfg.suffixes = split_list(val);
            }
            _ => return Err(anyhow!("unknown config key `{key}`")),
        }
    }
    Ok(())
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn print_human_report(result: &FileResult, quiet: bool) {
    println!(
        "{} ({} tokens, {} repeated)",
        style(&result.path).bold(),
        result.total_tokens,
        result.repeated.len()
    );
    if result.repeated.is_empty() {
        println!("  {}", style("no repeated words").green());
        return;
    }
    for row in &result.repeated {
        print!("  {:>4}  {}", style(row.count).yellow(), row.word);
        if !row.suggestions.is_empty() {
            print!("  → {}", style(row.suggestions.join(", ")).cyan());
        }
        println!();
    }
    if quiet {
        return;
    }
    println!();
    for segment in &result.annotated.segments {
        match segment {
            Segment::Plain { text, .. } => print!("{text}"),
            Segment::Occurrence(occ) => print!(
                "{}{}",
                style(&occ.word).black().on_yellow(),
                style(format!("#{}", occ.ordinal)).dim()
            ),
        }
    }
    println!();
}
