use clap::{Args, Parser, Subcommand};

const PATHS_HELP: &str =
    "paths to videos/audio and/or directories containing a media queue and/or videos";

#[derive(Debug, Parser)]
#[command(
    name = "babies",
    version,
    about = "Watch the next show in a queue and record your viewing history"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch the next show at each path
    #[command(visible_alias = "w")]
    Watch(WatchArgs),
    /// Watch with loudness normalisation
    #[command(visible_alias = "n")]
    Night(WatchArgs),
    /// Watch without recording anything
    #[command(visible_alias = "d")]
    Dryrun(WatchArgs),
    /// Listen to tracks
    #[command(visible_alias = "l")]
    Listen {
        /// Tracks to listen to
        #[arg(required = true)]
        tracks: Vec<String>,
    },
    /// Enqueue shows
    #[command(visible_alias = "e")]
    Enqueue(EnqueueArgs),
    /// Dequeue shows
    #[command(visible_alias = "de")]
    Dequeue {
        /// Directory holding the queue
        queue_path: String,
        #[arg(required = true, help = PATHS_HELP)]
        paths: Vec<String>,
    },
    /// Display the next show at each path
    #[command(visible_alias = "p")]
    Print(PrintArgs),
    /// Create a series from the videos in a directory
    #[command(visible_alias = "c")]
    Create {
        #[arg(help = PATHS_HELP)]
        paths: Vec<String>,
        /// Overwrite an existing series
        #[arg(short, long)]
        force: bool,
    },
    /// Find entries in the global record
    #[command(visible_alias = "f")]
    Find {
        /// Regular expressions, all must match
        #[arg(required = true)]
        search_terms: Vec<String>,
        /// Only show media references
        #[arg(short, long)]
        quiet: bool,
    },
    /// Record having watched the next show without playing it
    #[command(visible_alias = "r")]
    Record {
        /// Path to a video or a directory containing a series
        path: String,
        /// Comment to record with the video
        comment: String,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct WatchArgs {
    #[arg(help = PATHS_HELP)]
    pub paths: Vec<String>,
    /// Don't write to series or global records
    #[arg(short, long)]
    pub dont_record: bool,
    /// Normalise audio
    #[arg(short, long)]
    pub night_mode: bool,
    /// Subtitle file
    #[arg(short, long)]
    pub sub_file: Option<String>,
    /// Comment to record with the video(s)
    #[arg(short, long)]
    pub comment: Option<String>,
    /// Title to record with the video(s)
    #[arg(short, long)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct EnqueueArgs {
    /// Directory to store the queue in
    pub queue_path: String,
    #[arg(required = true, help = PATHS_HELP)]
    pub paths: Vec<String>,
    /// Comment to record with the video(s)
    #[arg(short, long)]
    pub comment: Option<String>,
    /// Title to record with the video(s)
    #[arg(short, long)]
    pub title: Option<String>,
    /// Prune watched videos before queuing
    #[arg(short, long)]
    pub prune: bool,
}

#[derive(Debug, Clone, Args)]
pub struct PrintArgs {
    #[arg(help = PATHS_HELP)]
    pub paths: Vec<String>,
    /// Skip paths with nothing to play
    #[arg(short, long)]
    pub ignore_errors: bool,
    /// Also show the queue entry
    #[arg(short, long)]
    pub verbose: bool,
    /// Consider every file, not just videos
    #[arg(short, long)]
    pub no_extension_filter: bool,
    /// Show the file modification time
    #[arg(short, long)]
    pub mtime: bool,
}

/// A bare media path as the first argument means `watch`.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().collect::<Vec<_>>();
    if args.get(1).is_some_and(|first| first.contains('.')) {
        args.insert(1, "w".to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let args = normalize_args(args.iter().map(|arg| arg.to_string()));
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn bare_media_path_implies_watch() {
        match parse(&["babies", "ep1.mkv"]).command {
            Some(Command::Watch(args)) => assert_eq!(args.paths, vec!["ep1.mkv".to_string()]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn short_aliases_map_to_subcommands() {
        assert!(matches!(
            parse(&["babies", "de", "queue", "a.mkv"]).command,
            Some(Command::Dequeue { .. })
        ));
        assert!(matches!(
            parse(&["babies", "n", "show"]).command,
            Some(Command::Night(_))
        ));
        assert!(matches!(parse(&["babies"]).command, None));
    }

    #[test]
    fn enqueue_accepts_prune_comment_and_title() {
        match parse(&["babies", "e", "-p", "-c", "rewatch", "-t", "Pilot", "q", "a.mkv"]).command {
            Some(Command::Enqueue(args)) => {
                assert!(args.prune);
                assert_eq!(args.comment.as_deref(), Some("rewatch"));
                assert_eq!(args.title.as_deref(), Some("Pilot"));
                assert_eq!(args.queue_path, "q");
                assert_eq!(args.paths, vec!["a.mkv".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn find_requires_a_term() {
        let args = normalize_args(["babies", "find"].iter().map(|arg| arg.to_string()));
        assert!(Cli::try_parse_from(args).is_err());
    }
}
