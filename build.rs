// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::process::Command;

fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");

    // Supplement built.rs with git information from a custom git callout.
    // The git2 feature of the built crate causes stack smashing in cross-compilation.
    append_git_info(get_git_version(), is_git_dirty());
}

fn get_git_version() -> Option<String> {
    if let Ok(output) = Command::new("git")
        .args(["describe", "--match", "v[0-9]*", "--tags", "HEAD"])
        .output()
        && output.status.success()
        && let Ok(version) = String::from_utf8(output.stdout)
    {
        return Some(version.trim().trim_start_matches('v').to_string());
    }

    // Fallback: commit hash only
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        && output.status.success()
        && let Ok(commit) = String::from_utf8(output.stdout)
    {
        return Some(commit.trim().to_string());
    }

    None
}

fn is_git_dirty() -> bool {
    if let Ok(output) = Command::new("git")
        .args(["diff-index", "--name-only", "HEAD", "--"])
        .output()
        && output.status.success()
    {
        return !output.stdout.is_empty();
    }
    false
}

fn append_git_info(git_version: Option<String>, git_dirty: bool) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("built.rs");
    let mut f = OpenOptions::new()
        .append(true)
        .open(&dest_path)
        .expect("built.rs must exist");

    writeln!(f, "// Git information generated at build time").unwrap();
    match git_version {
        Some(v) => writeln!(
            f,
            "pub const GIT_VERSION: Option<&'static str> = Some(\"{v}\");"
        )
        .unwrap(),
        None => writeln!(f, "pub const GIT_VERSION: Option<&'static str> = None;").unwrap(),
    }
    match git_dirty {
        true => writeln!(f, "pub const GIT_DIRTY: Option<bool> = Some(true);").unwrap(),
        false => writeln!(f, "pub const GIT_DIRTY: Option<bool> = None;").unwrap(),
    }
}
