//! Interactive spreadsheet picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `sales analyze` and choose a file" UX
//!
//! The picker searches for supported spreadsheets under the current working
//! directory. The dashboard uses the same discovery for its file list.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::io::workbook::{SUPPORTED_EXTENSIONS, SourceFormat};

/// Default directory recursion depth for finding spreadsheets.
const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Prompt the user to select a spreadsheet from the current directory tree.
///
/// Behavior:
/// - list discovered spreadsheets
/// - accept either a number (from the list) or an explicit path
/// - `q` cancels
pub fn prompt_for_input_path() -> Result<PathBuf, AppError> {
    let files = discover_input_files();
    if files.is_empty() {
        return Err(AppError::io(format!(
            "No spreadsheets ({}) found. Provide one with `sales analyze -f <file>`.",
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    println!("Found {} spreadsheet(s):", files.len());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, pretty_path(path));
    }

    loop {
        print!("Select a file by number (1-{}) or type a path (q to quit): ", files.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::io(format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = io::stdin()
            .read_line(&mut input)
            .map_err(|e| AppError::io(format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::io(
                "No input received. Provide a path with `sales analyze -f <file>`.",
            ));
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Err(AppError::io("Canceled."));
        }

        if let Ok(choice) = input.parse::<usize>() {
            if (1..=files.len()).contains(&choice) {
                return validate_input_path(&files[choice - 1]);
            }
            println!("Invalid choice: {choice}. Enter a number between 1 and {}.", files.len());
            continue;
        }

        match validate_input_path(Path::new(input)) {
            Ok(path) => return Ok(path),
            Err(err) => {
                println!("{err}");
                continue;
            }
        }
    }
}

/// Validate the provided path points to a readable spreadsheet type.
pub fn validate_input_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::io(format!("File not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::io(format!(
            "Expected a file, got a directory: {}",
            path.display()
        )));
    }
    SourceFormat::from_path(path)?;
    Ok(path.to_path_buf())
}

/// Discover spreadsheets under the current directory (deterministic order).
pub fn discover_input_files() -> Vec<PathBuf> {
    find_input_files(Path::new("."), DEFAULT_SEARCH_DEPTH)
}

pub fn find_input_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_input_files_inner(root, 0, max_depth, &mut out);
    out.sort_by(|a, b| pretty_path(a).cmp(&pretty_path(b)));
    out
}

fn find_input_files_inner(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };

        if file_type.is_dir() {
            if should_skip_dir(&path) {
                continue;
            }
            find_input_files_inner(&path, depth + 1, max_depth, out);
            continue;
        }

        if file_type.is_file() && is_candidate(&path) {
            out.push(path);
        }
    }
}

fn is_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
        return false;
    };
    // Office lock files (`~$ventas.xlsx`) share the extension but not the content.
    if name.starts_with("~$") {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        == Some(true)
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

pub fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_spreadsheets_and_skips_noise() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("2024")).unwrap();
        fs::create_dir_all(root.join("target")).unwrap();
        for name in ["b.xlsx", "A.CSV", "notes.txt", "~$b.xlsx", "2024/q1.ods", "target/skip.csv"] {
            fs::write(root.join(name), b"x").unwrap();
        }

        let found: Vec<String> = find_input_files(root, DEFAULT_SEARCH_DEPTH)
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(found, vec!["2024/q1.ods", "A.CSV", "b.xlsx"]);
    }

    #[test]
    fn validation_rejects_missing_dirs_and_unknown_types() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        fs::write(&txt, b"x").unwrap();
        let csv = dir.path().join("ventas.csv");
        fs::write(&csv, b"x").unwrap();

        assert!(validate_input_path(&dir.path().join("missing.xlsx")).is_err());
        assert!(validate_input_path(dir.path()).is_err());
        assert_eq!(validate_input_path(&txt).unwrap_err().exit_code(), 2);
        assert_eq!(validate_input_path(&csv).unwrap(), csv);
    }
}
