//! ezfs command-line browser.
//!
//! ```bash
//! ezfs --tree
//! ezfs --cd=a --dir
//! ezfs --find='a/*.txt'
//! EZFS_LOG=debug ezfs --regex='^d'
//! ```
//!
//! With no `--url`, a small seeded demo tree at `mem://demo/` is browsed.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use ezfs::{Ez, FsError, Item, MemoryFs, MemoryProvider, Registry};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_URL: &str = "mem://demo/";

#[derive(Debug, Parser)]
#[command(name = "ezfs", version, about = "Browse a virtual filesystem tree")]
struct Cli {
    /// Location to open.
    #[arg(long, default_value = DEMO_URL)]
    url: String,

    /// Change the working directory before any other action.
    #[arg(long = "cd", visible_alias = "chdir", value_name = "PATH")]
    cd: Option<String>,

    /// List a directory (the working directory by default).
    #[arg(
        long = "dir",
        visible_alias = "ls",
        value_name = "PATH",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "."
    )]
    dir: Option<String>,

    /// List everything below a directory, breadth-first.
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "."
    )]
    flat: Option<String>,

    /// Print the working directory as an indented tree.
    #[arg(long)]
    tree: bool,

    /// Find items matching a glob pattern.
    #[arg(long, value_name = "PATTERN")]
    find: Option<String>,

    /// Find files whose name matches a regular expression.
    #[arg(long, value_name = "PATTERN")]
    regex: Option<String>,
}

impl Cli {
    fn has_action(&self) -> bool {
        self.cd.is_some()
            || self.dir.is_some()
            || self.flat.is_some()
            || self.tree
            || self.find.is_some()
            || self.regex.is_some()
    }
}

fn demo_registry() -> Result<Registry, FsError> {
    let demo = MemoryFs::named("demo");
    demo.insert_file("/a/b.txt", "bee\n")?;
    demo.insert_file("/a/c/d.txt", "dee\n")?;
    demo.insert_file("/readme.md", "# demo\n")?;
    demo.insert_dir("/empty")?;

    let mut registry = Registry::new();
    registry.register_filesystem(Arc::new(
        MemoryProvider::new().with_volume("demo", Arc::new(demo)),
    ));
    Ok(registry)
}

fn print_items(items: &[Item], relative_to: &str) {
    println!("{} item(s):", items.len());
    for item in items {
        let path = item.url().as_str();
        let shown = path.strip_prefix(relative_to).unwrap_or(path);
        let suffix = if item.is_dir() && !shown.ends_with('/') {
            "/"
        } else {
            ""
        };
        println!("    {shown}{suffix}");
    }
}

fn run(cli: &Cli) -> Result<(), FsError> {
    let mut ez = Ez::new(Arc::new(demo_registry()?), &cli.url)?;

    if let Some(path) = &cli.cd {
        ez.cd(path)?;
        println!("cwd: {}", ez.filesystem().url());
    }
    let base = ez.filesystem().url().to_string();

    if let Some(path) = &cli.dir {
        print_items(&ez.list(Some(path))?, &base);
    }
    if let Some(path) = &cli.flat {
        print_items(&ez.get_all(Some(path))?, &base);
    }
    if cli.tree {
        print!("{}", ez.tree()?);
    }
    if let Some(pattern) = &cli.find {
        print_items(&ez.find(pattern)?, &base);
    }
    if let Some(pattern) = &cli.regex {
        print_items(&ez.regex_find(pattern)?, &base);
    }
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("EZFS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if !cli.has_action() {
        let _ = Cli::command().print_help();
        return ExitCode::from(255);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ezfs: {e}");
            ExitCode::FAILURE
        }
    }
}
