//! `songclash` command line front end.

mod cli;
mod commands;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use core_library::{AlbumFilter, NewSong};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, parse_log_level, LogFormat, LoggingConfig};
use core_service::SongClashService;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = parse_log_level(&cli.log_level)?;
    let format: LogFormat = cli.log_format.parse()?;
    init_logging(LoggingConfig::default().with_level(level).with_format(format))?;

    let config = CoreConfig::builder()
        .session_path(&cli.session)
        .build()
        .context("Invalid configuration")?;
    let service = SongClashService::open(config)
        .await
        .with_context(|| format!("Failed to open session {}", cli.session.display()))?;
    debug!(songs = service.len().await, "Session ready");

    if let Some(label) = &cli.filter {
        service.set_filter(AlbumFilter::from_label(label)).await;
    }

    let session = cli.session.as_path();
    match cli.command {
        Command::Import {
            artist,
            reject,
            keep_all,
        } => {
            let reject = if keep_all { Some(Vec::new()) } else { reject };
            commands::import(&service, session, &artist, reject).await
        }
        Command::Rank => commands::rank(&service, session).await,
        Command::Leaderboard { limit } => {
            commands::leaderboard(&service, limit).await;
            Ok(())
        }
        Command::Albums { labels } => {
            commands::albums(&service, labels).await;
            Ok(())
        }
        Command::Export { output } => commands::export(&service, &output).await,
        Command::Add {
            title,
            artist,
            album,
            year,
        } => {
            let song = NewSong::new(title).artist(artist).album(album).year(year);
            commands::add(&service, session, song).await
        }
        Command::Delete { titles } => commands::delete(&service, session, &titles).await,
        Command::DeleteAlbum { album } => commands::delete_album(&service, session, &album).await,
        Command::Merge { titles, into } => commands::merge(&service, session, &titles, &into).await,
        Command::MergeFile { path } => commands::merge_file(&service, session, &path).await,
        Command::Preview { title } => commands::preview(&service, session, &title).await,
        Command::Video { title } => commands::video(&service, &title).await,
    }
}
