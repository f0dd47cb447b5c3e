//! `hyportal serve`: run one server in the foreground.
//!
//! Output is streamed to the terminal, stdin lines are forwarded to the
//! server, and Ctrl+C stops every server this process started.

use hyportal_core::{ServerRuntimeSettings, StartServerRequest};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::bootstrap::CliContext;
use crate::commands::ServeArgs;
use crate::error::CliError;

/// Flags switch features off on top of the server's saved settings.
pub fn request_from(args: ServeArgs, saved: &ServerRuntimeSettings) -> StartServerRequest {
    let mut request = StartServerRequest::new(args.id, args.path, args.port, args.memory)
        .with_disable_sentry(args.disable_sentry || saved.disable_sentry);
    if args.no_aot_cache || !saved.use_aot_cache {
        request = request.with_aot_cache(false);
    }
    if let Some(version_id) = args.version_id {
        request = request.with_version_id(version_id);
    }
    request
}

pub async fn execute(ctx: &CliContext, args: ServeArgs) -> Result<(), CliError> {
    let saved = ctx.settings.runtime_settings(&args.id).await;
    let request = request_from(args, &saved);
    let id = request.id.clone();
    println!("Starting server '{id}' on port {}... (Press Ctrl+C to stop)", request.port);
    ctx.supervisor.start(request).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            () = ctx.emitter.server_stopped() => break,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
                }
                eprintln!("Stopping...");
                ctx.supervisor.stop_all().await;
                break;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if !ctx.supervisor.write_input(&id, &format!("{line}\n")) {
                        tracing::debug!(id = %id, "Input dropped, server not accepting input");
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::debug!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> ServeArgs {
        ServeArgs {
            id: "alpha".into(),
            path: PathBuf::from("/srv/alpha"),
            port: 5520,
            memory: 6,
            version_id: None,
            disable_sentry: false,
            no_aot_cache: false,
        }
    }

    #[test]
    fn defaults_keep_aot_cache() {
        let request = request_from(args(), &ServerRuntimeSettings::default());
        assert!(request.aot_cache_enabled());
        assert_eq!(request.use_aot_cache, None);
        assert_eq!(request.memory_gb, 6);
    }

    #[test]
    fn flags_map_onto_request() {
        let request = request_from(
            ServeArgs {
                version_id: Some("1.0".into()),
                disable_sentry: true,
                no_aot_cache: true,
                ..args()
            },
            &ServerRuntimeSettings::default(),
        );
        assert!(!request.aot_cache_enabled());
        assert!(request.disable_sentry);
        assert_eq!(request.version_id.as_deref(), Some("1.0"));
    }

    #[test]
    fn saved_settings_apply() {
        let saved = ServerRuntimeSettings {
            use_aot_cache: false,
            disable_sentry: true,
            ..ServerRuntimeSettings::default()
        };
        let request = request_from(args(), &saved);
        assert!(!request.aot_cache_enabled());
        assert!(request.disable_sentry);
    }
}
