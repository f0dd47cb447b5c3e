//! Subcommand definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use hyportal_core::Channel;

#[derive(Subcommand)]
pub enum Commands {
    /// Show which Java runtime would launch servers
    Java {
        /// Print the runtime descriptor as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a server in the foreground (Ctrl+C stops it)
    Serve(ServeArgs),

    /// Manage the Hytale downloader
    Downloader {
        #[command(subcommand)]
        command: DownloaderCommand,
    },

    /// Query, download and list server versions
    Versions {
        #[command(subcommand)]
        command: VersionsCommand,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Server identifier
    #[arg(long)]
    pub id: String,
    /// Server directory containing HytaleServer.jar
    #[arg(long)]
    pub path: PathBuf,
    /// Port to bind
    #[arg(long)]
    pub port: u16,
    /// Heap size in GiB
    #[arg(long, default_value_t = 4)]
    pub memory: u32,
    /// Installed version whose Assets.zip should be used
    #[arg(long)]
    pub version_id: Option<String>,
    /// Pass --disable-sentry to the server
    #[arg(long)]
    pub disable_sentry: bool,
    /// Launch without the AOT cache
    #[arg(long)]
    pub no_aot_cache: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum DownloaderCommand {
    /// Show whether the downloader is installed and authenticated
    Status,
    /// Download and unpack the downloader
    Install,
    /// Authorize the downloader with a Hytale account
    Auth,
}

#[derive(Subcommand, Debug, Clone)]
pub enum VersionsCommand {
    /// Ask the downloader for the latest versions
    Check {
        /// Also query the pre-release channel
        #[arg(long)]
        pre_release: bool,
    },
    /// Download and install a version
    Download {
        /// Version identifier as printed by `versions check`
        id: String,
        /// Release channel
        #[arg(long, default_value = "stable")]
        channel: Channel,
    },
    /// List installed versions
    List,
}
