// src/exec/locate.rs

//! Finding the test-runner executable on `PATH`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Resolve `program` against the current process's `PATH`.
pub fn locate_executable(program: &str) -> Option<PathBuf> {
    locate_in(program, std::env::var_os("PATH").as_deref())
}

/// Resolve `program` against an explicit search path.
///
/// A program that already contains a path separator is checked as-is and
/// never searched for.
pub fn locate_in(program: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let program = program.trim();
    if program.is_empty() {
        return None;
    }

    let as_path = Path::new(program);
    if as_path.components().count() > 1 {
        return is_executable(as_path).then(|| as_path.to_path_buf());
    }

    let search_path = search_path?;
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidates(&dir, program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    // `npx` is shipped as `npx.cmd` on Windows.
    let exts = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
    let mut out = vec![dir.join(program)];
    out.extend(
        exts.split(';')
            .filter(|e| !e.is_empty())
            .map(|e| dir.join(format!("{program}{}", e.to_lowercase()))),
    );
    out
}

#[cfg(not(windows))]
fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    vec![dir.join(program)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
