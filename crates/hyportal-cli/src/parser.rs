//! Root parser and global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Run and manage Hytale dedicated servers.
#[derive(Parser)]
#[command(name = "hyportal")]
#[command(about = "Run and manage Hytale dedicated servers")]
#[command(version)]
pub struct Cli {
    /// Override the data directory (settings, versions, downloader)
    #[arg(long = "data-dir", env = "HYPORTAL_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{DownloaderCommand, VersionsCommand};
    use clap::CommandFactory;
    use hyportal_core::Channel;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["hyportal", "--verbose", "--data-dir", "/tmp/hp", "java"]);
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/hp")));
        assert!(matches!(cli.command, Some(Commands::Java { json: false })));
    }

    #[test]
    fn test_serve_args() {
        let cli = Cli::parse_from([
            "hyportal",
            "serve",
            "--id",
            "alpha",
            "--path",
            "/srv/alpha",
            "--port",
            "5520",
            "--no-aot-cache",
        ]);
        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.id, "alpha");
        assert_eq!(args.port, 5520);
        assert_eq!(args.memory, 4);
        assert!(args.no_aot_cache);
        assert!(!args.disable_sentry);
    }

    #[test]
    fn test_nested_subcommands() {
        let cli = Cli::parse_from(["hyportal", "downloader", "install"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Downloader {
                command: DownloaderCommand::Install
            })
        ));

        let cli = Cli::parse_from([
            "hyportal", "versions", "download", "1.0", "--channel", "pre-release",
        ]);
        let Some(Commands::Versions {
            command: VersionsCommand::Download { id, channel },
        }) = cli.command
        else {
            panic!("expected versions download");
        };
        assert_eq!(id, "1.0");
        assert_eq!(channel, Channel::PreRelease);
    }
}
