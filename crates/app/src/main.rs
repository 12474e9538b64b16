use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use quiz_core::model::{Catalog, Difficulty, Username};
use quiz_core::time::format_seconds;
use services::{AppServices, Clock, HistoryService, QuestionSourceConfig};
use storage::repository::Storage;
use tracing::debug;

mod cli;
mod db;
mod logging;
mod play;

use cli::{Cli, Command, HistoryArgs};

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Command::Catalog = cli.command {
        print_catalog();
        return Ok(());
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    let db_url = db::normalize_sqlite_url(&cli.db_url);
    db::prepare_sqlite_file(&db_url)?;
    debug!(%db_url, "opening database");

    match cli.command {
        Command::Play(args) => {
            let settings = args.settings()?;
            let app = AppServices::new_sqlite(
                &db_url,
                Clock::system(),
                QuestionSourceConfig::new(args.api_url.clone()),
                settings,
            )
            .await
            .context("could not initialise services")?;
            play::run(&app, &args).await
        }
        Command::History(args) => {
            let storage = Storage::sqlite(&db_url)
                .await
                .context("could not open the database")?;
            let history = HistoryService::new(Arc::clone(&storage.history));
            print_history(&history, &args).await
        }
        Command::Catalog => Ok(()),
    }
}

fn print_catalog() {
    for subject in Catalog.subjects() {
        println!("{}", subject.name);
        for topic in subject.topics {
            println!("  - {topic}");
        }
    }
    let difficulties: Vec<&str> = Difficulty::ALL.iter().map(|d| d.as_str()).collect();
    println!("\nDifficulties: {}", difficulties.join(", "));
}

async fn print_history(history: &HistoryService, args: &HistoryArgs) -> anyhow::Result<()> {
    let username = Username::new(&args.user)?;

    let items = history.list_history(&username, args.limit).await?;
    if items.is_empty() {
        println!("{username} has not finished any quizzes yet.");
        return Ok(());
    }

    println!("Recent quizzes for {username}:");
    for item in &items {
        println!(
            "  {}  {} / {} ({})  {}/{}  {:.0}%  {}",
            item.completed_at.format("%Y-%m-%d %H:%M"),
            item.subject,
            item.topic,
            item.difficulty,
            item.score,
            item.total_questions,
            item.accuracy_percent,
            format_seconds(item.seconds_used),
        );
    }

    println!("\nBy subject:");
    for stats in history.subject_stats(&username).await? {
        println!(
            "  {:<20} attempts {:>3}  best {:>3}",
            stats.subject, stats.attempts, stats.best_score
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    if let Err(err) = run(cli).await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}
