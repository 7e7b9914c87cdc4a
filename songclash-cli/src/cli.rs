//! Command line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "songclash", version)]
#[command(about = "Rank an artist's songs by voting on head-to-head matchups.")]
pub struct Cli {
    /// Session file holding the ranked catalog
    #[arg(long, global = true, env = "SONGCLASH_SESSION", default_value = "songclash.json")]
    pub session: PathBuf,

    /// Restrict matchups and the song leaderboard to one album label
    #[arg(long, global = true)]
    pub filter: Option<String>,

    /// trace, debug, info, warn or error
    #[arg(long, global = true, env = "SONGCLASH_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// pretty, json or compact
    #[arg(long, global = true, default_value = "compact")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import an artist's studio catalog from MusicBrainz and save it
    Import {
        artist: String,

        /// Release types to skip, comma separated (defaults to the built-in list)
        #[arg(long, value_delimiter = ',', conflicts_with = "keep_all")]
        reject: Option<Vec<String>>,

        /// Keep every release type
        #[arg(long)]
        keep_all: bool,
    },

    /// Vote interactively: 1 or 2 picks a winner, s skips, q saves and quits
    Rank,

    /// Print the song leaderboard
    Leaderboard {
        /// Show only the first N songs
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the album leaderboard
    Albums {
        /// List the album labels usable with --filter instead
        #[arg(long)]
        labels: bool,
    },

    /// Write the song leaderboard to a CSV file
    Export { output: PathBuf },

    /// Add a song by hand at the starting rating
    Add {
        title: String,
        #[arg(long, default_value = "")]
        artist: String,
        #[arg(long, default_value = "")]
        album: String,
        #[arg(long, default_value = "")]
        year: String,
    },

    /// Delete songs by title
    Delete {
        #[arg(required = true)]
        titles: Vec<String>,
    },

    /// Delete every song of an album
    DeleteAlbum { album: String },

    /// Merge songs into one, averaging scores and summing matches
    Merge {
        #[arg(num_args = 2.., required = true)]
        titles: Vec<String>,

        /// Title of the merged song
        #[arg(long)]
        into: String,
    },

    /// Add the songs of another session file that are not present yet
    MergeFile { path: PathBuf },

    /// Look up a 30 second preview URL for a song
    Preview { title: String },

    /// Search YouTube for a video of a song and print its link
    Video { title: String },
}
