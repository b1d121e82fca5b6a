use anyhow::{Context, Result};
use clap::Parser;
use global_search::config::Config;
use global_search::corpus::{CorpusAccessor, FsCorpus, PathFilter};
use global_search::search::{DisplayItem, MatchMode, ScanOptions, Scope, SearchSession, SearchState};
use global_search::telemetry;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Global Search - substring search over open documents and workspace files
#[derive(Parser, Debug)]
#[command(name = "global_search")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Additional workspace roots (can be repeated, appended to config roots)
    #[arg(short, long = "root", value_name = "PATH")]
    roots: Vec<String>,

    /// Files to open before searching (can be repeated)
    #[arg(short, long = "open", value_name = "FILE")]
    open: Vec<PathBuf>,

    /// Initial scope: open or all
    #[arg(short, long, value_name = "SCOPE")]
    scope: Option<Scope>,

    /// Initial match mode: names, contents or both
    #[arg(short, long, value_name = "MODE")]
    mode: Option<MatchMode>,

    /// Run a single search, print the results and exit
    #[arg(short, long, value_name = "TEXT")]
    query: Option<String>,

    /// Print one-shot results as JSON
    #[arg(long)]
    json: bool,

    /// Extra exclusion globs, separated by semicolons
    #[arg(long, value_name = "PATTERNS")]
    exclude: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Generate a template configuration file and exit
    #[arg(long, value_name = "FILE")]
    init: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --init flag: generate template config and exit
    if let Some(init_path) = args.init {
        let path = if init_path.as_os_str().is_empty() {
            PathBuf::from("global_search.toml")
        } else {
            init_path
        };

        if path.exists() {
            anyhow::bail!(
                "Config file already exists: {}\nRemove it first or choose a different path.",
                path.display()
            );
        }

        Config::write_template(&path)?;
        println!("Generated config file: {}", path.display());
        println!("\nEdit the file to add your workspace roots, then start with:");
        println!("  global_search --config {}", path.display());
        return Ok(());
    }

    let (config, source) = load_config(&args)?;
    let logging = telemetry::init_logging(&config.logging, args.verbose)?;
    if let Some(log_file) = logging.log_file() {
        eprintln!("Logging to {}", log_file.display());
    }

    match source {
        Some(path) => info!(path = %path.display(), "Loaded configuration"),
        None => info!("No config file found, using defaults"),
    }
    info!(
        roots = config.workspace.roots.len(),
        exclude_patterns = ?config.workspace.exclude_patterns,
        max_results = config.search.max_results,
        "Configuration loaded"
    );

    let corpus = Arc::new(FsCorpus::from_config(&config));
    for path in &args.open {
        if let Err(e) = corpus.open_document(path) {
            warn!(error = %e, "Could not open document");
        }
    }

    let options = ScanOptions::from_config(&config)?;
    let state = SearchState::new(
        args.scope.unwrap_or_default(),
        args.mode.unwrap_or_default(),
    );
    let (mut session, mut rx) = SearchSession::new(
        tokio::runtime::Handle::current(),
        Arc::clone(&corpus),
        options,
        state,
    );

    if let Some(query) = args.query {
        session.set_query(query);
        session.wait_idle(&mut rx).await;
        if args.json {
            println!("{}", serde_json::to_string_pretty(session.items())?);
        } else {
            print_items(session.items());
        }
        return Ok(());
    }

    run_shell(&mut session, &mut rx, &config).await
}

fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    let (base_config, source) = if let Some(ref config_path) = args.config {
        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found: {}\nUse --init {} to generate a template.",
                config_path.display(),
                config_path.display()
            );
        }
        (Config::from_file(config_path)?, Some(config_path.clone()))
    } else {
        match Config::from_default_locations()? {
            Some((config, path)) => (config, Some(path)),
            None => (Config::default(), None),
        }
    };

    // Relative roots are resolved against the working directory so their
    // names come from a real directory rather than ".".
    let roots = args
        .roots
        .iter()
        .map(|root| match std::fs::canonicalize(root) {
            Ok(path) => path.to_string_lossy().into_owned(),
            Err(_) => root.clone(),
        })
        .collect();

    let mut config = base_config.with_overrides(roots, args.verbose);
    if let Some(ref patterns) = args.exclude {
        config
            .workspace
            .exclude_patterns
            .extend(PathFilter::parse_patterns(patterns));
    }
    Ok((config, source))
}

/// A line typed into the interactive shell.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Query(String),
    ToggleScope,
    CycleMode,
    Open(PathBuf),
    Docs,
    Select(usize),
    Stats,
    Help,
    Quit,
}

impl ShellCommand {
    /// Anything not starting with `:` is a query, taken verbatim. A leading
    /// `::` searches for text that itself starts with `:`.
    fn parse(line: &str) -> Result<Self, String> {
        let Some(command) = line.strip_prefix(':') else {
            return Ok(ShellCommand::Query(line.to_string()));
        };
        if command.starts_with(':') {
            return Ok(ShellCommand::Query(command.to_string()));
        }

        let command = command.trim();
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "scope" => Ok(ShellCommand::ToggleScope),
            "mode" => Ok(ShellCommand::CycleMode),
            "open" if !arg.is_empty() => Ok(ShellCommand::Open(PathBuf::from(arg))),
            "open" => Err("usage: :open PATH".to_string()),
            "docs" => Ok(ShellCommand::Docs),
            "select" => arg
                .parse()
                .map(ShellCommand::Select)
                .map_err(|_| "usage: :select N".to_string()),
            "stats" => Ok(ShellCommand::Stats),
            "help" | "h" | "?" => Ok(ShellCommand::Help),
            "quit" | "q" | "exit" => Ok(ShellCommand::Quit),
            other => Err(format!("unknown command ':{}' (try :help)", other)),
        }
    }
}

const HELP: &str = "\
Type text to search. Commands:
  :scope        toggle between open editors and all files
  :mode         cycle names -> contents -> both
  :open PATH    open a document
  :docs         list open documents
  :select N     open result N
  :stats        print session diagnostics as JSON
  :help         show this help
  :quit         exit
  ::text        search for text starting with ':'";

async fn run_shell(
    session: &mut SearchSession<FsCorpus>,
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<global_search::search::ScanCompleted>,
    config: &Config,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", session.placeholder());

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                match ShellCommand::parse(&line) {
                    Ok(ShellCommand::Quit) => break,
                    Ok(command) => handle_command(session, command, config)?,
                    Err(message) => eprintln!("{}", message),
                }
            }
            Some(completed) = rx.recv() => {
                if session.apply(completed) {
                    print_items(session.items());
                }
            }
        }
    }

    info!("Search session ended");
    Ok(())
}

fn handle_command(
    session: &mut SearchSession<FsCorpus>,
    command: ShellCommand,
    config: &Config,
) -> Result<()> {
    match command {
        ShellCommand::Query(query) => {
            if session.set_query(query).is_none() {
                println!("(no results)");
            }
        }
        ShellCommand::ToggleScope => {
            session.toggle_scope();
            println!("{}", session.placeholder());
        }
        ShellCommand::CycleMode => {
            session.cycle_mode();
            println!("{}", session.placeholder());
        }
        ShellCommand::Open(path) => match session.corpus().open_document(&path) {
            Ok(doc) => {
                println!("Opened {}", doc.relative_path);
                if session.state().scope == Scope::Open {
                    session.refresh();
                }
            }
            Err(e) => eprintln!("{:#}", e),
        },
        ShellCommand::Docs => {
            let documents = session.corpus().open_documents();
            if documents.is_empty() {
                println!("(no open documents)");
            }
            for doc in documents {
                println!("  {}", doc.relative_path);
            }
        }
        ShellCommand::Select(index) => match session.activate(index) {
            Ok(activation) => match session.corpus().open_document(&activation.path) {
                Ok(doc) => match activation.cursor {
                    Some(cursor) => println!("Opened {}:{}", doc.relative_path, cursor.line + 1),
                    None => println!("Opened {}", doc.relative_path),
                },
                Err(e) => eprintln!("{:#}", e),
            },
            Err(e) => debug!(error = %e, "Selection ignored"),
        },
        ShellCommand::Stats => {
            let report = session.diagnostics().report().with_config(config);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Quit => {}
    }
    Ok(())
}

fn print_items(items: &[DisplayItem]) {
    if items.is_empty() {
        println!("(no results)");
        return;
    }
    for (index, item) in items.iter().enumerate() {
        match item {
            DisplayItem::Separator { label, count } => println!("== {} ({}) ==", label, count),
            DisplayItem::Entry(entry) => println!(
                "{:>4}  {}  {}  [{}]",
                index, entry.label, entry.description, entry.detail
            ),
        }
    }
}
