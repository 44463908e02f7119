mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, OutputFormat};
use dotenv::dotenv;
use progress::CliReporter;
use scanward_core::storage::{Database, FileStore};
use scanward_core::{AppConfig, FileStatus, Outcome, OwnerRef, TrackedFile, Tracker};
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => scanward_core::config::load_configuration_from(path),
        None => scanward_core::config::load_configuration(),
    };
    let mut config = match config {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };
    if let Some(database) = args.database {
        config.database_path = database;
    }

    let Some(command) = args.command else {
        let _ = Cli::command().print_long_help();
        return;
    };

    if let Err(err) = run(command, config) {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run(command: Commands, config: AppConfig) -> anyhow::Result<()> {
    let db = Database::open(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path))?;
    let tracker = Tracker::new(db, config);

    match command {
        Commands::Track { path, owner, url } => {
            let file = tracker.track(owner.as_ref(), &path, url.as_deref())?;
            print_file(&file);
        }
        Commands::TrackDir {
            dir,
            owner,
            url_prefix,
        } => {
            let reporter = CliReporter::new();
            let count =
                tracker.track_dir(owner.as_ref(), &dir, url_prefix.as_deref(), &reporter)?;
            info!("{} files registered under {}", count, dir.display());
        }
        Commands::Check { id, format } => {
            let outcome = tracker
                .check(id)
                .with_context(|| format!("checking tracked file {}", id))?;
            print_outcome(&outcome, format)?;
        }
        Commands::Status { id, json } => {
            let job = tracker.job_status(id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&job)?);
            } else {
                println!(
                    "{} {} {}{}",
                    format!("#{}", job.file_id).bold(),
                    colored_status(job.status),
                    job.path,
                    if job.viruses_found.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", job.viruses_found)
                    }
                );
            }
        }
        Commands::Render {
            path,
            url,
            owner,
            format,
        } => {
            let field = scanward_core::AttachedFile::new(path, url);
            let outcome = tracker.render(&owner, &field)?;
            print_outcome(&outcome, format)?;
        }
        Commands::List {
            status,
            owner,
            csv,
            json,
        } => {
            let files = match &owner {
                Some(owner) => filter_status(tracker.store().list_for_owner(owner)?, status),
                None => tracker.store().list(status)?,
            };
            if csv {
                write_csv(&files)?;
            } else if json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                for file in &files {
                    print_file(file);
                }
                let counts = tracker.store().count_by_status()?;
                let summary: Vec<String> = counts
                    .iter()
                    .map(|(status, count)| format!("{} {}", count, status))
                    .collect();
                info!("{} tracked files: {}", files.len(), summary.join(", "));
            }
        }
        Commands::TruncateDb => {
            match prompt_confirm(
                "Are you SURE you want to delete ALL tracking records?",
                Some(false),
            ) {
                Ok(true) => {
                    tracker.store().truncate_all()?;
                    println!("All tracking records deleted");
                }
                _ => process::exit(0),
            }
        }
        Commands::PrintConfig => {
            println!("{}", serde_json::to_string_pretty(tracker.config())?);
        }
    }

    Ok(())
}

fn filter_status(files: Vec<TrackedFile>, status: Option<FileStatus>) -> Vec<TrackedFile> {
    match status {
        Some(status) => files.into_iter().filter(|f| f.status == status).collect(),
        None => files,
    }
}

fn colored_status(status: FileStatus) -> ColoredString {
    let label = format!("[{}]", status);
    match status {
        FileStatus::VirusFound => label.red().bold(),
        FileStatus::VirusNotFound => label.green(),
        FileStatus::Standing => label.yellow(),
        FileStatus::NotExists => label.dimmed(),
        FileStatus::ScanFailed => label.magenta(),
    }
}

fn owner_label(owner: Option<&OwnerRef>) -> String {
    owner.map(|o| o.to_string()).unwrap_or_default()
}

fn print_file(file: &TrackedFile) {
    println!(
        "{} {} {} {}",
        format!("#{}", file.id).bold(),
        colored_status(file.status),
        file.path,
        owner_label(file.owner.as_ref()).cyan(),
    );
    if !file.viruses_found.is_empty() {
        println!("    {}", file.viruses_found.red());
    }
}

fn print_outcome(outcome: &Outcome, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{}", outcome),
        OutputFormat::Html => println!("{}", outcome.to_html()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
    }
    Ok(())
}

fn write_csv(files: &[TrackedFile]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([
        "id",
        "path",
        "status",
        "status_code",
        "owner",
        "viruses_found",
        "url",
        "scanned_at",
    ])?;
    for file in files {
        writer.write_record([
            file.id.to_string(),
            file.path.clone(),
            file.status.to_string(),
            file.status.code().to_string(),
            owner_label(file.owner.as_ref()),
            file.viruses_found.clone(),
            file.url.clone().unwrap_or_default(),
            file.scanned_at.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
