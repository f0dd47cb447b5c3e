//! `hyportal versions ...`

use hyportal_core::InstalledVersion;

use crate::bootstrap::CliContext;
use crate::commands::VersionsCommand;
use crate::error::CliError;
use crate::presentation::format_size;

pub async fn execute(ctx: &CliContext, command: VersionsCommand) -> Result<(), CliError> {
    match command {
        VersionsCommand::Check { pre_release } => {
            let versions = ctx.versions.check_versions(pre_release).await?;
            if versions.is_empty() {
                println!("The downloader did not report any versions.");
            }
            for version in versions {
                println!("{:<12} {}", version.channel.as_str(), version.id);
            }
        }
        VersionsCommand::Download { id, channel } => {
            let installed = ctx.versions.download_version(&id, channel).await;
            ctx.emitter.finish_progress();
            let installed = installed?;
            println!("✓ Installed {id} ({channel})");
            print!("{}", render_installed(&installed));
        }
        VersionsCommand::List => {
            let installed = ctx.versions.list_installed().await?;
            if installed.is_empty() {
                println!("No versions installed in {}", ctx.paths.versions_dir().display());
            } else {
                print!("{}", render_installed(&installed));
            }
        }
    }
    Ok(())
}

fn render_installed(installed: &[InstalledVersion]) -> String {
    let mut sorted: Vec<&InstalledVersion> = installed.iter().collect();
    sorted.sort_by(|a, b| b.installed_at.cmp(&a.installed_at));
    sorted
        .into_iter()
        .map(|v| format!("{:<24} {:<12} {:>10}\n", v.id, v.channel.as_str(), format_size(v.size_bytes)))
        .collect()
}
