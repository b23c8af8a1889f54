//! File-level plumbing for declaration loading.
//!
//! Provides format detection (RON/JSON/TOML plus legacy comma-separated
//! text), file discovery, and deserialization helpers used by the project
//! loader.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use strata_core::error::{RuleDeclarationError, TableError};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading declarations.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required declaration file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// Layout rows whose kind is not `column`, `object_definition` or
    /// `object_field`. Every offending kind is listed.
    #[error("invalid layout kinds in {file}: {}", .kinds.join(", "))]
    InvalidLayoutKind { file: PathBuf, kinds: Vec<String> },

    /// A rule declaration could not be turned into a rule.
    #[error("rule {index} in {file}: {source}")]
    Rule {
        file: PathBuf,
        index: usize,
        source: RuleDeclarationError,
    },

    /// Building a table from its declarations failed.
    #[error(transparent)]
    Table(#[from] TableError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported declaration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
    /// Legacy comma-separated text, one declaration per line.
    Csv,
}

impl Format {
    pub const EXTENSIONS: [&'static str; 4] = ["ron", "toml", "json", "csv"];
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        Some("csv") => Ok(Format::Csv),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a declaration file with the given base name.
///
/// Looks for `{base_name}.ron`, `.toml`, `.json` and `.csv`. Returns
/// `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if several
/// formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in Format::EXTENSIONS {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a list of declarations from a file.
///
/// RON and JSON files hold the list directly. TOML files hold it as the
/// array at `toml_key` of the top-level table. Legacy text is handed to
/// `parse_text` line by line.
pub fn read_list<T, F>(path: &Path, toml_key: &str, parse_text: F) -> Result<Vec<T>, DataLoadError>
where
    T: DeserializeOwned,
    F: FnOnce(&str) -> Vec<T>,
{
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let mut table: toml::Table =
                toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .remove(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
        Format::Csv => Ok(parse_text(&content)),
    }
}

/// Split one legacy text line into trimmed cells.
pub fn split_cells(line: &str) -> Vec<String> {
    line.split(',').map(|cell| cell.trim().to_string()).collect()
}

/// Non-blank lines of a legacy text file, optionally skipping the header.
pub fn text_lines(content: &str, skip_header: bool) -> impl Iterator<Item = &str> {
    content
        .lines()
        .skip(usize::from(skip_header))
        .filter(|line| !line.trim().is_empty())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    fn named_from_text(content: &str) -> Vec<Named> {
        text_lines(content, true)
            .map(|line| Named {
                name: split_cells(line)[0].clone(),
            })
            .collect()
    }

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "strata_data_loader_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_known_formats() {
        assert_eq!(detect_format(Path::new("a.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), Format::Json);
        assert_eq!(detect_format(Path::new("a.csv")).unwrap(), Format::Csv);
    }

    #[test]
    fn detect_format_unsupported() {
        for name in ["tables.yaml", "tables"] {
            assert!(matches!(
                detect_format(Path::new(name)),
                Err(DataLoadError::UnsupportedFormat { .. })
            ));
        }
    }

    // -----------------------------------------------------------------------
    // find_data_file / require_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn find_data_file_found() {
        let dir = make_test_dir("find");
        fs::write(dir.join("tables.json"), "[]").unwrap();

        let result = find_data_file(&dir, "tables").unwrap();
        assert_eq!(result, Some(dir.join("tables.json")));
        assert_eq!(find_data_file(&dir, "rules").unwrap(), None);

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("conflict");
        fs::write(dir.join("tables.ron"), "[]").unwrap();
        fs::write(dir.join("tables.csv"), "").unwrap();

        assert!(matches!(
            find_data_file(&dir, "tables"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require_missing");

        match require_data_file(&dir, "tables") {
            Err(DataLoadError::MissingRequired { file, .. }) => assert_eq!(file, "tables"),
            other => panic!("expected MissingRequired, got: {other:?}"),
        }

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // read_list
    // -----------------------------------------------------------------------

    #[test]
    fn read_list_each_format() {
        let dir = make_test_dir("read_list");
        let files = [
            ("a.ron", r#"[(name: "Player"), (name: "Guild")]"#),
            ("b.json", r#"[{"name": "Player"}, {"name": "Guild"}]"#),
            (
                "c.toml",
                "[[tables]]\nname = \"Player\"\n\n[[tables]]\nname = \"Guild\"\n",
            ),
            ("d.csv", "name\nPlayer\n\nGuild\n"),
        ];
        for (file, content) in files {
            let path = dir.join(file);
            fs::write(&path, content).unwrap();
            let list: Vec<Named> = read_list(&path, "tables", named_from_text).unwrap();
            let names: Vec<&str> = list.iter().map(|n| n.name.as_str()).collect();
            assert_eq!(names, vec!["Player", "Guild"], "{file}");
        }

        cleanup(&dir);
    }

    #[test]
    fn read_list_toml_missing_key() {
        let dir = make_test_dir("toml_missing");
        let path = dir.join("tables.toml");
        fs::write(&path, r#"foo = "bar""#).unwrap();

        let result: Result<Vec<Named>, _> = read_list(&path, "tables", named_from_text);
        match result {
            Err(DataLoadError::Parse { detail, .. }) => assert!(detail.contains("tables")),
            other => panic!("expected Parse, got: {other:?}"),
        }

        cleanup(&dir);
    }

    #[test]
    fn read_list_parse_error() {
        let dir = make_test_dir("parse_err");
        let path = dir.join("tables.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();

        let result: Result<Vec<Named>, _> = read_list(&path, "tables", named_from_text);
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Legacy text helpers
    // -----------------------------------------------------------------------

    #[test]
    fn split_cells_trims() {
        assert_eq!(split_cells(" a , b,, c "), vec!["a", "b", "", "c"]);
    }

    #[test]
    fn text_lines_skip_header_and_blanks() {
        let lines: Vec<&str> = text_lines("header\n\nx\n  \ny\n", true).collect();
        assert_eq!(lines, vec!["x", "y"]);
        let lines: Vec<&str> = text_lines("x\ny", false).collect();
        assert_eq!(lines, vec!["x", "y"]);
    }

    // -----------------------------------------------------------------------
    // Error display messages
    // -----------------------------------------------------------------------

    #[test]
    fn error_display_messages() {
        let e = DataLoadError::MissingRequired {
            file: "tables".into(),
            dir: PathBuf::from("/data"),
        };
        assert!(e.to_string().contains("tables"));
        assert!(e.to_string().contains("/data"));

        let e = DataLoadError::InvalidLayoutKind {
            file: PathBuf::from("Player_layout.ron"),
            kinds: vec!["colum".into(), "field".into()],
        };
        let msg = e.to_string();
        assert!(msg.contains("Player_layout.ron"));
        assert!(msg.contains("colum, field"));

        let e = DataLoadError::Rule {
            file: PathBuf::from("rules.json"),
            index: 2,
            source: RuleDeclarationError::UnknownKind("sorted".into()),
        };
        assert!(e.to_string().contains("rule 2 in rules.json"));
        assert!(e.to_string().contains("sorted"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let data_err: DataLoadError = io_err.into();
        assert!(matches!(data_err, DataLoadError::Io(_)));
        assert!(data_err.to_string().contains("file not found"));
    }
}
