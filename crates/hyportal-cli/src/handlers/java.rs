//! `hyportal java`: report the Java runtime servers would use.

use hyportal_core::JavaRuntimeDescriptor;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, json: bool) -> Result<(), CliError> {
    let runtime = ctx.java.resolve(true).await;
    if json {
        let rendered = serde_json::to_string_pretty(&runtime)
            .map_err(|e| CliError::Io(e.to_string()))?;
        println!("{rendered}");
    } else {
        print!("{}", describe(&runtime));
    }
    Ok(())
}

fn describe(runtime: &JavaRuntimeDescriptor) -> String {
    let mut out = String::new();
    if runtime.ready {
        out.push_str("Java runtime: ready\n");
    } else {
        out.push_str("Java runtime: not ready\n");
    }
    if let Some(path) = &runtime.path {
        out.push_str(&format!("  Path:    {}\n", path.display()));
    }
    if let Some(version) = &runtime.version {
        out.push_str(&format!("  Version: {version}\n"));
    }
    out.push_str(&format!("  Source:  {:?}\n", runtime.source));
    out.push_str(&format!("  Minimum: {}\n", runtime.minimum));
    if let Some(message) = &runtime.message {
        out.push_str(&format!("  {message}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_missing_runtime() {
        let text = describe(&JavaRuntimeDescriptor::missing(25));
        assert!(text.starts_with("Java runtime: not ready"));
        assert!(text.contains("Minimum: 25"));
        assert!(!text.contains("Path:"));
    }
}
