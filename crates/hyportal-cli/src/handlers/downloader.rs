//! `hyportal downloader ...`

use crate::bootstrap::CliContext;
use crate::commands::DownloaderCommand;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, command: DownloaderCommand) -> Result<(), CliError> {
    match command {
        DownloaderCommand::Status => {
            let status = ctx.installer.check().await;
            println!("Downloader:  {}", if status.ready { "installed" } else { "not installed" });
            println!("Credentials: {}", if status.credentials { "yes" } else { "no" });
            println!("Archive:     {}", status.path.display());
        }
        DownloaderCommand::Install => {
            let dir = ctx.installer.download().await;
            ctx.emitter.finish_progress();
            println!("✓ Downloader installed in {}", dir?.display());
        }
        DownloaderCommand::Auth => {
            if ctx.versions.authenticate().await? {
                println!("✓ Downloader is authenticated");
            } else {
                println!("Downloader finished without storing credentials");
            }
        }
    }
    Ok(())
}
