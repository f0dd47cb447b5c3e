//! Version string parsing for `java -version` output.

use std::sync::LazyLock;

use regex::Regex;

static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)version\s+"?([0-9]+(?:[._-][0-9]+)*)"#).expect("valid version regex")
});

/// Extract the version string from `java -version` output.
///
/// Both stdout and stderr should be passed; most JVMs print to stderr.
pub fn parse_java_version(output: &str) -> Option<String> {
    VERSION_LINE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Major version number, honouring legacy `1.x` numbering.
///
/// `"1.8.0_292"` is Java 8, `"25.0.1"` is Java 25.
pub fn java_major(version: &str) -> Option<u32> {
    let mut segments = version
        .split(['.', '_', '-'])
        .filter(|segment| !segment.is_empty());
    let first: u32 = segments.next()?.parse().ok()?;
    if first == 1 {
        if let Some(legacy) = segments.next() {
            return legacy.parse().ok();
        }
    }
    Some(first)
}
