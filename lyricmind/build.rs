//! Build script for lyricmind
//!
//! Embeds a build identifier (`<git hash> <profile> <timestamp>`) so the
//! health endpoint and `--version` output can tell deployments apart.

use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok().map(|s| s.trim().to_string())
}

fn main() {
    let git_hash = git_short_hash().unwrap_or_else(|| "unknown".to_string());
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    println!("cargo:rustc-env=LYRICMIND_BUILD_ID={} {} {}", git_hash, profile, built_at);
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
