//! Platform sanity checks
//!
//! Index platforms use GOOS/GOARCH spellings. Values from `uname` or Rust
//! target triples are accepted but almost always a mistake.

use crate::manifest::Platform;

/// Architectures seen in published images
const KNOWN_ARCHITECTURES: &[&str] = &[
    "amd64", "arm64", "arm", "386", "ppc64le", "s390x", "riscv64", "mips64le", "loong64",
];

const KNOWN_OS: &[&str] = &["linux", "windows", "darwin", "freebsd"];

/// Describe what looks wrong with `platform`, if anything
pub fn platform_warning(platform: &Platform) -> Option<String> {
    if let Some(suggested) = suggest_architecture(&platform.architecture) {
        return Some(format!(
            "architecture {} is usually written {} in image indexes",
            platform.architecture, suggested
        ));
    }

    if !KNOWN_ARCHITECTURES.contains(&platform.architecture.as_str()) {
        return Some(format!("unrecognized architecture {}", platform.architecture));
    }

    if !KNOWN_OS.contains(&platform.os.as_str()) {
        return Some(format!("unrecognized os {}", platform.os));
    }

    None
}

fn suggest_architecture(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" | "x86-64" | "x64" => Some("amd64"),
        "aarch64" | "armv8" => Some("arm64"),
        "i386" | "i686" | "x86" => Some("386"),
        "armv7" | "armv7l" | "armhf" => Some("arm"),
        "powerpc64le" => Some("ppc64le"),
        _ => None,
    }
}
