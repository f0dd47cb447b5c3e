//! Downloader progress lines: `percent% (loaded/total)`.

use std::sync::LazyLock;

use hyportal_core::DownloadProgress;
use regex::Regex;

static PROGRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+(?:\.[0-9]+)?)%\s*\(([^)]+)\)").expect("valid progress regex")
});

static SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)\s*([A-Za-z]+)").expect("valid size regex"));

/// Latest progress marker in a chunk of output, sizes in bytes.
pub fn parse_progress(text: &str) -> Option<DownloadProgress> {
    let caps = PROGRESS.captures_iter(text).last()?;
    let percent: f64 = caps.get(1)?.as_str().parse().ok()?;
    let sizes = caps.get(2)?.as_str();
    let mut parts = sizes.split('/').map(str::trim);
    let loaded = parts.next().and_then(parse_size);
    let total = parts.next().and_then(parse_size);
    Some(DownloadProgress {
        percent,
        loaded,
        total,
    })
}

/// `"1.5 GB"` → bytes. Unknown units count as bytes.
fn parse_size(text: &str) -> Option<u64> {
    let caps = SIZE.captures(text)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let multiplier = match caps.get(2)?.as_str().to_ascii_lowercase().as_str() {
        "kb" => 1024.0,
        "mb" => 1024.0 * 1024.0,
        "gb" => 1024.0 * 1024.0 * 1024.0,
        _ => 1.0,
    };
    let bytes = (value * multiplier).round();
    if bytes.is_finite() && bytes >= 0.0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(bytes as u64)
    } else {
        None
    }
}
