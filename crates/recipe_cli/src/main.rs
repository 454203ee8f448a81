//! Command-line consumer of `recipe_core`.
//!
//! # Responsibility
//! - Map subcommands onto core use-cases and print their outcome.
//! - Own no invariants; every rule is enforced by the core.

use clap::{Parser, Subcommand};
use log::info;
use recipe_core::{init_logging, CoreConfig, RecipeCategory, RecipeCore, SeedSource, SessionState};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "recipe_cli", version, about = "Personal recipe catalog")]
struct Cli {
    /// Absolute directory holding the database, session and logs.
    #[arg(long, env = "RECIPE_CORE_DATA_DIR")]
    data_dir: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, env = "RECIPE_CORE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import bundled (or file-based) categories and sample recipes.
    Seed {
        #[arg(long)]
        categories: Option<PathBuf>,
        #[arg(long)]
        samples: Option<PathBuf>,
    },
    Register {
        username: String,
        password: String,
    },
    Login {
        username: String,
        password: String,
    },
    Logout,
    Whoami,
    Categories,
    /// List recipes of the logged-in user, newest first.
    List {
        #[arg(long)]
        category: Option<String>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Seed { .. } => "seed",
            Self::Register { .. } => "register",
            Self::Login { .. } => "login",
            Self::Logout => "logout",
            Self::Whoami => "whoami",
            Self::Categories => "categories",
            Self::List { .. } => "list",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = CoreConfig::new(cli.data_dir)?;
    if let Some(level) = cli.log_level.as_deref() {
        config = config.with_log_level(level)?;
    }
    config.prepare_data_dir()?;
    init_logging(config.log_level(), &config.log_dir())?;

    let core = RecipeCore::open(&config)?;
    info!(
        "event=cli_command module=cli status=start command={}",
        cli.command.name()
    );
    match cli.command {
        Command::Seed {
            categories,
            samples,
        } => {
            let categories = categories.map_or(SeedSource::Bundled, SeedSource::File);
            let samples = samples.map_or(SeedSource::Bundled, SeedSource::File);
            let report = core.importer().import_all(&categories, &samples)?;
            println!(
                "imported {} categories and {} sample recipes",
                report.categories.len(),
                report.recipes.len()
            );
        }
        Command::Register { username, password } => {
            let account = core.auth().register(&username, &password)?;
            println!("registered {} ({})", account.username, account.id);
        }
        Command::Login { username, password } => {
            let account = core.auth().login(&username, &password)?;
            println!("logged in as {}", account.username);
        }
        Command::Logout => {
            core.auth().logout()?;
            println!("logged out");
        }
        Command::Whoami => match core.auth().state()? {
            SessionState::LoggedIn(user_id) => println!("{user_id}"),
            SessionState::LoggedOut => println!("not logged in"),
        },
        Command::Categories => {
            for category in core.store().all::<RecipeCategory>()? {
                println!("{}\t{}", category.id, category.name);
            }
        }
        Command::List { category } => {
            for recipe in core.recipes().fetch_recipes(category.as_deref())? {
                println!(
                    "{}\t{}\t{}\t{}",
                    recipe.created_at.to_rfc3339(),
                    recipe.category_id,
                    recipe.title,
                    recipe.id
                );
            }
        }
    }
    Ok(())
}
