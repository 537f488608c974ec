use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use super::run_common::PatternSource;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),
    #[error("failed to read '{}': {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A loaded pattern plus the name diagnostics should refer to it by.
#[derive(Debug)]
pub struct LoadedPattern {
    pub text: String,
    pub path: Option<String>,
}

pub fn load_pattern(source: &PatternSource) -> Result<LoadedPattern, LoadError> {
    match source {
        PatternSource::Text(text) => Ok(LoadedPattern {
            text: text.clone(),
            path: None,
        }),
        PatternSource::File(path) if path.as_os_str() == "-" => load_stdin(),
        PatternSource::File(path) => load_file(path),
    }
}

fn load_stdin() -> Result<LoadedPattern, LoadError> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(LoadError::Stdin)?;
    Ok(LoadedPattern {
        text: strip_final_newline(buf),
        path: Some("<stdin>".to_string()),
    })
}

fn load_file(path: &Path) -> Result<LoadedPattern, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::File {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(LoadedPattern {
        text: strip_final_newline(content),
        path: Some(path.to_string_lossy().into_owned()),
    })
}

/// Editors end files with a newline that is not part of the pattern.
/// Only the last one is dropped; inner newlines matter under `x`.
pub fn strip_final_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}
