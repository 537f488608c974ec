use std::io::Write;

use super::pattern_loader::{LoadError, load_pattern, strip_final_newline};
use super::run_common::PatternSource;

#[test]
fn inline_text_is_taken_verbatim() {
    let loaded = load_pattern(&PatternSource::Text("a\n".to_string())).unwrap();
    assert_eq!(loaded.text, "a\n");
    assert!(loaded.path.is_none());
}

#[test]
fn file_drops_only_the_final_newline() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "a # one\nb\n\n").unwrap();

    let loaded = load_pattern(&PatternSource::File(file.path().to_path_buf())).unwrap();
    assert_eq!(loaded.text, "a # one\nb\n");
    assert_eq!(
        loaded.path,
        Some(file.path().to_string_lossy().into_owned())
    );
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.re");

    let err = load_pattern(&PatternSource::File(path.clone())).unwrap_err();
    assert!(matches!(&err, LoadError::File { path: p, .. } if *p == path));
    assert!(err.to_string().starts_with(&format!("failed to read '{}'", path.display())));
}

#[test]
fn crlf_endings() {
    assert_eq!(strip_final_newline("ab\r\n".to_string()), "ab");
    assert_eq!(strip_final_newline("ab".to_string()), "ab");
    assert_eq!(strip_final_newline(String::new()), "");
}
