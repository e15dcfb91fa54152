mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use calcdoc::MemoryDocument;
use engine::{Calculator, Settings, SettingsError, Warning};

const SUBCOMMANDS: &[&str] = &["eval", "blocks", "operators", "test", "help"];

/// Settings file picked up next to the input when `--config` is not given.
const SETTINGS_FILE: &str = "calcdoc.toml";

#[derive(Parser)]
#[command(name = "calcdoc", version, about = "RPN calculator blocks for Markdown notes")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Settings file (defaults to calcdoc.toml beside the input, if any)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate every calc block of a document
    Eval(EvalArgs),

    /// List the calc blocks of a document
    Blocks(BlocksArgs),

    /// List the operator tokens and when each fires
    Operators,

    /// Run .test.md scenario files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct EvalArgs {
    /// Document to evaluate
    file: String,

    /// Rewrite the file in place instead of printing the result
    #[arg(short, long)]
    write: bool,

    /// Exit 1 if evaluating would change the file
    #[arg(long, conflicts_with = "write")]
    check: bool,
}

#[derive(clap::Args)]
struct BlocksArgs {
    /// Document to scan
    file: String,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or a directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("CALCDOC_LOG").unwrap_or_else(|_| EnvFilter::new("error")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args: Vec<String> = std::env::args().collect();
    insert_default_subcommand(&mut args);

    let cli = Cli::parse_from(&args);
    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    match cli.command {
        Command::Eval(eval_args) => do_eval(eval_args, cli.config.as_deref(), color_choice),
        Command::Blocks(blocks_args) => do_blocks(blocks_args, cli.config.as_deref()),
        Command::Operators => do_operators(cli.config.as_deref()),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, color_choice, &test_args.category);
            process::exit(exit_code);
        }
    }
}

/// `calcdoc notes.md` is shorthand for `calcdoc eval notes.md`.
fn insert_default_subcommand(args: &mut Vec<String>) {
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg == "--config" {
            i += 2;
            continue;
        }
        if arg.starts_with('-') {
            i += 1;
            continue;
        }
        if !SUBCOMMANDS.contains(&arg) {
            args.insert(i, "eval".to_string());
        }
        return;
    }
}

fn do_eval(args: EvalArgs, config: Option<&Path>, color_choice: ColorChoice) {
    let source = read_source(&args.file);
    let calculator = build_calculator(config, Path::new(&args.file));

    let (settled, warnings) = match engine::settle(&source, calculator) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: cannot evaluate '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    emit_warnings(&args.file, &source, &warnings, color_choice);

    if args.check {
        if settled != source {
            eprintln!("{}: calc blocks are not settled", args.file);
            process::exit(1);
        }
        return;
    }

    if args.write {
        if settled == source {
            debug!(file = %args.file, "already settled");
            return;
        }
        if let Err(e) = std::fs::write(&args.file, &settled) {
            eprintln!("error: cannot write '{}': {}", args.file, e);
            process::exit(1);
        }
        return;
    }

    print!("{}", settled);
}

fn do_blocks(args: BlocksArgs, config: Option<&Path>) {
    let source = read_source(&args.file);
    let mut calculator = build_calculator(config, Path::new(&args.file));
    let document = MemoryDocument::new(args.file.clone(), source);

    for block in calculator.blocks(&document) {
        // Report the fence lines, 1-based.
        let open = block.start_line;
        let close = block.fence_line() + 1;
        let stack: Vec<String> = block.stack.iter().map(|n| n.to_string()).collect();
        if stack.is_empty() {
            println!("{}-{}: (empty)", open, close);
        } else {
            println!("{}-{}: {}", open, close, stack.join(" "));
        }
    }
}

fn do_operators(config: Option<&Path>) {
    let calculator = build_calculator(config, Path::new("."));
    let registry = calculator.registry();
    for token in registry.tokens() {
        if let Some(operation) = registry.find_operation(token) {
            println!("{:<6} {}", token, operation.timing);
        }
    }
}

fn read_source(file: &str) -> String {
    match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", file, e);
            process::exit(1);
        }
    }
}

fn build_calculator(config: Option<&Path>, input: &Path) -> Calculator {
    let result = load_settings(config, input).and_then(|s| Calculator::from_settings(&s));
    match result {
        Ok(calculator) => calculator,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn load_settings(config: Option<&Path>, input: &Path) -> Result<Settings, SettingsError> {
    if let Some(path) = config {
        return Settings::load(path);
    }
    let beside = input
        .parent()
        .map(|dir| dir.join(SETTINGS_FILE))
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));
    if beside.is_file() {
        debug!(path = %beside.display(), "using settings file");
        return Settings::load(&beside);
    }
    Ok(Settings::default())
}

fn emit_warnings(name: &str, source: &str, warnings: &[Warning], color_choice: ColorChoice) {
    if warnings.is_empty() {
        return;
    }
    let mut files = SimpleFiles::new();
    let file_id = files.add(name.to_string(), source.to_string());

    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for warning in warnings {
        let diagnostic = warning.to_diagnostic(file_id);
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
    }
}
