//! Executable discovery after a CMake build
//!
//! Multi-target builds make "the" executable ambiguous, so the search is an ordered
//! list of tiers and the first hit of the first productive tier wins:
//!
//! 1. [`SearchTier::ConventionalPath`]: `Debug/`, `Release/` and the build directory
//!    itself, each probed for `<target>.exe` and `<target>` (plus `<target>.out`
//!    directly under the build directory). Skipped without a target name.
//! 2. [`SearchTier::ExeSuffix`]: recursive scan for `*.exe`.
//! 3. [`SearchTier::Extensionless`]: recursive scan for a file whose name contains no
//!    `.`, does not end in a library/object suffix, and (on Unix) is executable.
//!
//! Recursive scans walk in file-name order so repeated searches agree.

use ignore::WalkBuilder;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

const NON_EXECUTABLE_SUFFIXES: &[&str] = &[".obj", ".lib", ".dll", ".so", ".dylib", ".a", ".o"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTier {
    ConventionalPath,
    ExeSuffix,
    Extensionless,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredExecutable {
    pub path: PathBuf,
    pub tier: SearchTier,
}

pub fn find_executable(build_dir: &Path, target: Option<&str>) -> Option<DiscoveredExecutable> {
    if !build_dir.is_dir() {
        debug!("Build directory {} does not exist", build_dir.display());
        return None;
    }

    if let Some(target) = target {
        if let Some(path) = conventional_candidates(build_dir, target)
            .into_iter()
            .find(|p| p.is_file())
        {
            return Some(DiscoveredExecutable {
                path,
                tier: SearchTier::ConventionalPath,
            });
        }
    }

    let files = walk_files(build_dir);

    if let Some(path) = files.iter().find(|p| has_exe_suffix(p)) {
        return Some(DiscoveredExecutable {
            path: path.clone(),
            tier: SearchTier::ExeSuffix,
        });
    }

    files
        .into_iter()
        .find(|p| is_extensionless_candidate(p))
        .map(|path| DiscoveredExecutable {
            path,
            tier: SearchTier::Extensionless,
        })
}

pub fn conventional_candidates(build_dir: &Path, target: &str) -> Vec<PathBuf> {
    let exe = format!("{}.exe", target);
    vec![
        build_dir.join("Debug").join(&exe),
        build_dir.join("Debug").join(target),
        build_dir.join("Release").join(&exe),
        build_dir.join("Release").join(target),
        build_dir.join(&exe),
        build_dir.join(target),
        build_dir.join(format!("{}.out", target)),
    ]
}

fn walk_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().map_or(false, |ft| ft.is_file()) {
            files.push(entry.into_path());
        }
    }

    files
}

fn has_exe_suffix(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("exe"))
}

fn is_extensionless_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    !name.contains('.')
        && !NON_EXECUTABLE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
        && is_executable(path)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

/// Executable target name declared in `CMakeLists.txt`.
///
/// The first `add_executable(...)` wins; `${PROJECT_NAME}` resolves through
/// `project(...)`, which is also the fallback when no executable is declared.
pub fn cmake_target_name(cmake_lists: &str) -> Option<String> {
    let executable = Regex::new(r"(?i)add_executable\s*\(\s*([^\s\)]+)").ok()?;
    let project = Regex::new(r"(?i)project\s*\(\s*([^\s\)]+)").ok()?;

    let project_name = project
        .captures(cmake_lists)
        .map(|c| c[1].trim_matches('"').to_string());

    match executable.captures(cmake_lists) {
        Some(c) => {
            let name = c[1].trim_matches('"');
            if name == "${PROJECT_NAME}" {
                project_name
            } else if name.contains("${") {
                None
            } else {
                Some(name.to_string())
            }
        }
        None => project_name,
    }
}
