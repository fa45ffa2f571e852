use std::io::stdout;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wl_cli::commands::{entry, export, issue, project, report, summary, timer};
use wl_cli::{Cli, Commands, Config, IssueAction, ProjectAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(wl_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = wl_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Start {
            project,
            issue,
            note,
            billable,
        }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            timer::start(&mut db, &config, project, issue, note.clone(), *billable)?;
        }
        Some(Commands::Stop { project, issue }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            timer::stop(&mut db, &config, project, issue)?;
        }
        Some(Commands::Active {
            project,
            issue,
            json,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let scope = project.as_deref().zip(issue.as_deref());
            timer::active(&mut stdout(), &db, &config, scope, *json)?;
        }
        Some(Commands::Watch {
            project,
            issue,
            interval,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let scope = project.as_deref().zip(issue.as_deref());
            timer::watch(&db, &config, scope, *interval)?;
        }
        Some(Commands::Add {
            project,
            issue,
            duration,
            started_at,
            ended_at,
            note,
            billable,
        }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let args = entry::AddArgs {
                duration,
                started_at: started_at.as_deref(),
                ended_at: ended_at.as_deref(),
                note: note.clone(),
                billable: *billable,
            };
            entry::add(&mut db, &config, project, issue, args)?;
        }
        Some(Commands::Entries {
            project,
            issue,
            user,
            json,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            entry::list(&mut stdout(), &db, &config, project, issue, user.as_deref(), *json)?;
        }
        Some(Commands::Update {
            entry,
            duration,
            started_at,
            ended_at,
            note,
            billable,
        }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let args = entry::UpdateArgs {
                duration: duration.as_deref(),
                started_at: started_at.as_deref(),
                ended_at: ended_at.as_deref(),
                note: note.clone(),
                billable: *billable,
            };
            entry::update(&mut db, &config, entry, args)?;
        }
        Some(Commands::Delete { entry }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            entry::delete(&mut db, &config, entry)?;
        }
        Some(Commands::Summary {
            project,
            issue,
            json,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            summary::run(&mut stdout(), &db, &config, project, issue, *json)?;
        }
        Some(Commands::Report {
            group_by,
            from,
            to,
            project,
            user,
            json,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let filters = report::FilterArgs {
                from: from.as_deref(),
                to: to.as_deref(),
                project: project.as_deref(),
                user: user.as_deref(),
            };
            report::run(&mut stdout(), &db, &config, group_by, &filters, *json)?;
        }
        Some(Commands::Export {
            from,
            to,
            project,
            user,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let filters = report::FilterArgs {
                from: from.as_deref(),
                to: to.as_deref(),
                project: project.as_deref(),
                user: user.as_deref(),
            };
            export::run(&db, &config, &filters)?;
        }
        Some(Commands::Project { action }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                ProjectAction::Enable { project } => project::set(&mut db, project, true)?,
                ProjectAction::Disable { project } => project::set(&mut db, project, false)?,
            }
        }
        Some(Commands::Issue { action }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                IssueAction::LinkModule { issue, module } => {
                    issue::link_module(&mut db, issue, module.as_deref())?;
                }
                IssueAction::SetEstimate { issue, minutes } => {
                    issue::set_estimate(&mut db, issue, *minutes)?;
                }
            }
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
