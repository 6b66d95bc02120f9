//! Input file discovery.
//!
//! Expands `directory` + a file-name pattern into the batch's file list.
//! Patterns match file names only and understand `*` (any run, including
//! empty) and `?` (one character). Every other character is literal: there
//! are no `[...]` classes, `{a,b}` alternatives or escapes. Matching works on
//! Unicode scalar values, so `?` consumes one `char` even when it is several
//! bytes long. Names that are not valid UTF-8 are skipped.
//!
//! Results are sorted by path so repeated runs see the same order regardless
//! of the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::AppError;

/// List regular files in `directory` whose names match `pattern`.
///
/// No match is an empty list. A missing or unreadable directory, or a pattern
/// that spans directories, fails the run.
pub fn enumerate_files(directory: &Path, pattern: &str) -> Result<Vec<PathBuf>, AppError> {
    if pattern.is_empty() {
        return Err(AppError::new(2, "File pattern must not be empty."));
    }
    if pattern.contains('/') || pattern.contains(std::path::MAIN_SEPARATOR) {
        return Err(AppError::new(
            2,
            format!("File pattern '{pattern}' must match file names, not paths."),
        ));
    }
    if !directory.is_dir() {
        return Err(AppError::new(
            2,
            format!("Input directory '{}' does not exist or is not a directory.", directory.display()),
        ));
    }

    let entries = fs::read_dir(directory).map_err(|e| {
        AppError::new(2, format!("Failed to read directory '{}': {e}", directory.display()))
    })?;

    let pattern: Vec<char> = pattern.chars().collect();
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            AppError::new(2, format!("Failed to read directory '{}': {e}", directory.display()))
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if matches_pattern(&pattern, &name.chars().collect::<Vec<_>>()) {
            files.push(path);
        }
    }

    files.sort();
    debug!("matched {} file(s) in {}", files.len(), directory.display());
    Ok(files)
}

/// Wildcard match with single-star backtracking.
fn matches_pattern(pattern: &[char], name: &[char]) -> bool {
    let (mut p, mut n) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, n));
                p += 1;
            }
            Some(&c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match star {
                Some((sp, sn)) => {
                    p = sp + 1;
                    n = sn + 1;
                    star = Some((sp, sn + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(pattern: &str, name: &str) -> bool {
        matches_pattern(
            &pattern.chars().collect::<Vec<_>>(),
            &name.chars().collect::<Vec<_>>(),
        )
    }

    #[test]
    fn star_matches_runs() {
        assert!(m("*_CL_T*.csv", "S1_CL_T3.csv"));
        assert!(m("*_CL_T*.csv", "_CL_T.csv"));
        assert!(!m("*_CL_T*.csv", "S1_CL_T3.txt"));
        assert!(!m("*_CL_T*.csv", "S1_PL_T3.csv"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        assert!(m("run?.csv", "run1.csv"));
        assert!(!m("run?.csv", "run12.csv"));
    }

    #[test]
    fn multibyte_names_match_per_char() {
        assert!(m("ü?_CL.csv", "üä_CL.csv"));
        assert!(m("*_CL_T?.csv", "Lösung_CL_T1.csv"));
        assert!(!m("ü?_CL.csv", "üäö_CL.csv"));
        assert!(m("温度*.csv", "温度_1.csv"));
    }

    #[test]
    fn brackets_are_literal() {
        assert!(m("[ab].csv", "[ab].csv"));
        assert!(!m("[ab].csv", "a.csv"));
    }

    #[test]
    fn literal_pattern() {
        assert!(m("a.csv", "a.csv"));
        assert!(!m("a.csv", "ba.csv"));
    }

    #[test]
    fn rejects_path_patterns() {
        let err = enumerate_files(Path::new("."), "sub/*.csv").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn multibyte_files_are_enumerated() {
        let dir = tempdir::TempDir::new("clfit-enum").unwrap();
        for name in ["µ1_CL_T1.csv", "µ1_CL_T2.csv", "µ1_PL_T1.csv"] {
            fs::write(dir.path().join(name), "0,1\n").unwrap();
        }
        let files = enumerate_files(dir.path(), "µ?_CL_T*.csv").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["µ1_CL_T1.csv", "µ1_CL_T2.csv"]);
    }

    #[test]
    fn missing_directory_fails() {
        let err = enumerate_files(Path::new("/definitely/not/here"), "*.csv").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
