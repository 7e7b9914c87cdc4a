//! Subcommand handlers.

use crate::render;
use anyhow::{bail, Context, Result};
use core_library::NewSong;
use core_runtime::events::{
    CatalogEvent, CoreEvent, EventSeverity, EventStream, Receiver, RecvError,
};
use core_service::{CoreError, PreviewLookup, SongClashService};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// Save to `session` when something changed.
pub async fn save_if_dirty(service: &SongClashService, session: &Path) -> Result<()> {
    if service.has_unsaved_changes().await {
        let path = service
            .save(Some(session))
            .await
            .with_context(|| format!("Failed to save session to {}", session.display()))?;
        info!(path = %path.display(), "Session saved");
    }
    Ok(())
}

pub async fn import(
    service: &SongClashService,
    session: &Path,
    artist: &str,
    reject: Option<Vec<String>>,
) -> Result<()> {
    let progress = tokio::spawn(print_progress(service.subscribe()));

    let job = service.fetch_artist(artist, reject)?;
    let join = job.join();
    tokio::pin!(join);

    let result = tokio::select! {
        result = &mut join => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Cancelling import...");
            service.cancel_all();
            join.await
        }
    };
    progress.abort();

    match result {
        Ok(added) => {
            println!("Added {} new songs for {}.", added, artist.trim());
            save_if_dirty(service, session).await
        }
        Err(CoreError::JobCancelled(_)) => {
            println!("Import cancelled; nothing was added.");
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("Catalog import failed")),
    }
}

async fn print_progress(events: Receiver<CoreEvent>) {
    let mut stream =
        EventStream::new(events).filter(|event| matches!(event, CoreEvent::Catalog(_)));
    loop {
        match stream.recv().await {
            Ok(event) => {
                if let Some(line) = progress_line(&event) {
                    eprintln!("{}", line);
                }
            }
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "Progress output fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Terminal line for a catalog event. Quiet events return `None`.
fn progress_line(event: &CoreEvent) -> Option<String> {
    match event {
        CoreEvent::Catalog(CatalogEvent::FetchProgress {
            message,
            percent: Some(percent),
            ..
        }) => Some(format!("[{:>3}%] {}", percent, message)),
        CoreEvent::Catalog(CatalogEvent::FetchProgress { message, .. }) => {
            Some(format!("       {}", message))
        }
        CoreEvent::Catalog(CatalogEvent::FetchFailed { message, .. }) => {
            Some(format!("{}: {}", event.description(), message))
        }
        _ if event.severity() >= EventSeverity::Warning => Some(event.description().to_string()),
        _ => None,
    }
}

/// Interactive voting loop on stdin.
pub async fn rank(service: &SongClashService, session: &Path) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut current = service.next_matchup().await;
    let mut votes = 0usize;

    while let Some((a, b)) = current.clone() {
        println!();
        println!("  1) {}", render::contender(&a, service.song(&a).await.as_ref()));
        println!("  2) {}", render::contender(&b, service.song(&b).await.as_ref()));
        print!("Winner [1/2], s to skip, q to quit: ");
        std::io::stdout().flush().context("Failed to write prompt")?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        match line.trim() {
            "1" | "2" => {
                let (winner, loser) = if line.trim() == "1" { (&a, &b) } else { (&b, &a) };
                let change = service.vote(winner, loser).await?;
                println!(
                    "{} {:.0} -> {:.0}, {} {:.0} -> {:.0}",
                    winner,
                    change.winner_before,
                    change.winner_after,
                    loser,
                    change.loser_before,
                    change.loser_after
                );
                votes += 1;
                current = service.next_matchup().await;
            }
            "s" | "S" => current = service.skip().await,
            "q" | "Q" => break,
            other => {
                debug!(input = other, "Unrecognized input");
                println!("Enter 1, 2, s or q.");
            }
        }
    }

    if current.is_none() {
        println!("Need at least two songs in view to make a matchup.");
    }
    println!("{} votes recorded.", votes);
    save_if_dirty(service, session).await
}

pub async fn leaderboard(service: &SongClashService, limit: Option<usize>) {
    let mut rows = service.leaderboard().await;
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    print!("{}", render::song_table(&rows));
}

pub async fn albums(service: &SongClashService, labels: bool) {
    if labels {
        for album in service.albums().await {
            println!("{}", album);
        }
    } else {
        print!("{}", render::album_table(&service.album_leaderboard().await));
    }
}

pub async fn export(service: &SongClashService, output: &Path) -> Result<()> {
    let rows = service
        .export_csv(output)
        .await
        .with_context(|| format!("Failed to export to {}", output.display()))?;
    println!("Wrote {} rows to {}.", rows, output.display());
    Ok(())
}

pub async fn add(service: &SongClashService, session: &Path, song: NewSong) -> Result<()> {
    let title = service.add_song(song).await?;
    println!("Added '{}'.", title);
    save_if_dirty(service, session).await
}

pub async fn delete(service: &SongClashService, session: &Path, titles: &[String]) -> Result<()> {
    let removed = service.delete_songs(titles).await;
    if removed == 0 {
        bail!("None of the given titles are in the session");
    }
    println!("Deleted {} songs.", removed);
    save_if_dirty(service, session).await
}

pub async fn delete_album(service: &SongClashService, session: &Path, album: &str) -> Result<()> {
    let removed = service.delete_album(album).await?;
    println!("Deleted {} songs from {}.", removed, album);
    save_if_dirty(service, session).await
}

pub async fn merge(
    service: &SongClashService,
    session: &Path,
    titles: &[String],
    into: &str,
) -> Result<()> {
    let outcome = service.merge_songs(titles, into).await?;
    println!(
        "Merged {} songs into '{}' (score {:.0}, {} matches).",
        outcome.merged, outcome.title, outcome.score, outcome.matches
    );
    save_if_dirty(service, session).await
}

pub async fn merge_file(service: &SongClashService, session: &Path, path: &Path) -> Result<()> {
    let added = service
        .merge_file(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    println!("Added {} new songs from {}.", added, path.display());
    save_if_dirty(service, session).await
}

pub async fn preview(service: &SongClashService, session: &Path, title: &str) -> Result<()> {
    let url = match service.preview(title).await? {
        PreviewLookup::Found(url) => Some(url),
        PreviewLookup::NotFound => None,
        PreviewLookup::Pending(job) => job.join().await?.url().map(str::to_string),
    };

    match url {
        Some(url) => println!("{}", url),
        None => println!("No preview available for '{}'.", title),
    }
    save_if_dirty(service, session).await
}

pub async fn video(service: &SongClashService, title: &str) -> Result<()> {
    let join = service.video(title).await?.join();
    tokio::pin!(join);

    let result = tokio::select! {
        result = &mut join => result,
        _ = tokio::signal::ctrl_c() => {
            service.cancel_all();
            join.await
        }
    };

    match result {
        Ok(Some(url)) => println!("{}", url),
        Ok(None) => println!("No video found for '{}'.", title),
        Err(CoreError::JobCancelled(_)) => println!("Video search cancelled."),
        Err(e) => return Err(anyhow::Error::new(e).context("Video search failed")),
    }
    Ok(())
}
