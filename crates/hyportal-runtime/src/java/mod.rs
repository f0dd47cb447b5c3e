//! Java runtime discovery and validation.
//!
//! Candidates are probed in a fixed order (explicit override, `JAVA_HOME`,
//! `PATH` lookup, bare `java`) and the first one that runs and reports a
//! major version at or above the minimum wins. The bundled runtime is the
//! fallback and is accepted without being executed.

mod probe;
mod version;

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use hyportal_core::{AppPaths, JavaRuntimeDescriptor, JavaRuntimeError, JavaSource};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub use probe::{ProbeOutcome, probe_java, read_bundled_version};
pub use version::{java_major, parse_java_version};

/// Oldest Java major version the server runs on.
pub const MIN_JAVA_MAJOR: u32 = 25;

/// Where to look for Java.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaResolverConfig {
    /// Probed first (`HYPORTAL_JAVA_PATH`).
    pub override_path: Option<PathBuf>,
    /// `JAVA_HOME` or `JDK_HOME`.
    pub java_home: Option<PathBuf>,
    /// The runtime shipped with the application.
    pub bundled_executable: Option<PathBuf>,
    pub minimum: u32,
    /// Look up `java` on `PATH` and try the bare command name.
    pub search_path: bool,
}

impl JavaResolverConfig {
    /// Read the override and home variables, and point at the bundled JRE.
    pub fn from_env(paths: &AppPaths) -> Self {
        let non_empty = |key: &str| env::var_os(key).filter(|v| !v.is_empty());
        Self {
            override_path: non_empty("HYPORTAL_JAVA_PATH").map(PathBuf::from),
            java_home: non_empty("JAVA_HOME")
                .or_else(|| non_empty("JDK_HOME"))
                .map(PathBuf::from),
            bundled_executable: paths.bundled_java(),
            minimum: MIN_JAVA_MAJOR,
            search_path: true,
        }
    }

    /// A config with no sources at all; fill in the fields you need.
    pub const fn empty(minimum: u32) -> Self {
        Self {
            override_path: None,
            java_home: None,
            bundled_executable: None,
            minimum,
            search_path: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    path: PathBuf,
    source: JavaSource,
}

fn java_executable_name() -> &'static str {
    if cfg!(windows) { "java.exe" } else { "java" }
}

/// Locates a Java executable and caches the answer until a forced refresh.
pub struct JavaRuntimeResolver {
    config: JavaResolverConfig,
    cached: Mutex<Option<JavaRuntimeDescriptor>>,
}

impl JavaRuntimeResolver {
    pub fn new(config: JavaResolverConfig) -> Self {
        Self {
            config,
            cached: Mutex::new(None),
        }
    }

    pub const fn config(&self) -> &JavaResolverConfig {
        &self.config
    }

    /// Resolve the runtime, reusing the cached answer unless `force` is set.
    pub async fn resolve(&self, force: bool) -> JavaRuntimeDescriptor {
        let mut cached = self.cached.lock().await;
        if !force {
            if let Some(descriptor) = cached.as_ref() {
                return descriptor.clone();
            }
        }
        let descriptor = self.discover().await;
        if descriptor.ready {
            info!(
                path = ?descriptor.path,
                source = ?descriptor.source,
                version = ?descriptor.version,
                "Resolved Java runtime"
            );
        } else {
            warn!(reason = ?descriptor.reason, minimum = descriptor.minimum, "No usable Java runtime");
        }
        *cached = Some(descriptor.clone());
        descriptor
    }

    /// Resolve (cached) and fail with a typed error when not ready.
    pub async fn ensure(&self) -> Result<JavaRuntimeDescriptor, JavaRuntimeError> {
        let descriptor = self.resolve(false).await;
        if descriptor.ready && descriptor.path.is_some() {
            return Ok(descriptor);
        }
        Err(match descriptor.reason {
            Some(hyportal_core::RuntimeUnreadyReason::Outdated) => JavaRuntimeError::Outdated {
                minimum: descriptor.minimum,
                found: descriptor.version_major,
            },
            _ => JavaRuntimeError::Missing,
        })
    }

    async fn candidates(&self) -> Vec<Candidate> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut push = |path: PathBuf, source: JavaSource| {
            let key = path.to_string_lossy().to_lowercase();
            if seen.insert(key) {
                out.push(Candidate { path, source });
            }
        };

        if let Some(path) = &self.config.override_path {
            push(path.clone(), JavaSource::Env);
        }
        if let Some(home) = &self.config.java_home {
            push(
                home.join("bin").join(java_executable_name()),
                JavaSource::JavaHome,
            );
        }
        if self.config.search_path {
            let located = tokio::task::spawn_blocking(|| which::which("java").ok())
                .await
                .ok()
                .flatten();
            if let Some(path) = located {
                push(path, JavaSource::Path);
            }
            push(PathBuf::from("java"), JavaSource::Path);
        }
        out
    }

    fn java_home_for(&self, candidate: &Candidate) -> Option<PathBuf> {
        if candidate.path.is_absolute() {
            return candidate
                .path
                .parent()
                .and_then(Path::parent)
                .map(Path::to_path_buf);
        }
        if candidate.source == JavaSource::JavaHome {
            return self.config.java_home.clone();
        }
        None
    }

    async fn discover(&self) -> JavaRuntimeDescriptor {
        let minimum = self.config.minimum;
        let mut outdated: Option<JavaRuntimeDescriptor> = None;
        let mut failed: Option<JavaRuntimeDescriptor> = None;

        for candidate in self.candidates().await {
            let Some(outcome) = probe_java(&candidate.path).await else {
                continue;
            };
            if outcome.satisfies(minimum) {
                return JavaRuntimeDescriptor::ready(
                    candidate.path.clone(),
                    self.java_home_for(&candidate),
                    candidate.source,
                    outcome.version,
                    outcome.major,
                    minimum,
                );
            }
            if outcome.is_outdated(minimum) {
                debug!(path = %candidate.path.display(), major = ?outcome.major, "Java candidate too old");
                outdated = Some(JavaRuntimeDescriptor::outdated(
                    candidate.source,
                    outcome.version,
                    outcome.major,
                    minimum,
                ));
            } else if !outcome.exited_ok && failed.is_none() {
                debug!(path = %candidate.path.display(), "Java candidate exited with an error");
                failed = Some(JavaRuntimeDescriptor::failed(
                    candidate.source,
                    outcome.version,
                    minimum,
                ));
            }
        }

        if let Some(bundled) = self.config.bundled_executable.as_deref() {
            if tokio::fs::try_exists(bundled).await.unwrap_or(false) {
                let version = read_bundled_version(bundled).await;
                let major = version.as_deref().and_then(java_major);
                if major.is_some_and(|m| m < minimum) {
                    warn!(path = %bundled.display(), major = ?major, "Bundled Java runtime is outdated");
                    return outdated.unwrap_or_else(|| {
                        JavaRuntimeDescriptor::outdated(JavaSource::Bundled, version, major, minimum)
                    });
                }
                let home = bundled.parent().and_then(Path::parent).map(Path::to_path_buf);
                return JavaRuntimeDescriptor::ready(
                    bundled.to_path_buf(),
                    home,
                    JavaSource::Bundled,
                    version,
                    major,
                    minimum,
                );
            }
        }

        outdated
            .or(failed)
            .unwrap_or_else(|| JavaRuntimeDescriptor::missing(minimum))
    }
}
