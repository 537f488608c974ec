//! Compile options and optimizer tuning.

use std::fmt;
use std::sync::Arc;

use regula_bytecode::Charset;
use regula_core::{StandardUnicode, UnicodeData};
use rowan::TextRange;

/// Nesting ceiling for groups and set expressions. The parser recurses per
/// level, so this stays low enough for a 2 MiB thread stack in debug builds.
pub const DEFAULT_MAX_DEPTH: u32 = 100;

/// Registers embedded code blocks and hands back an opaque token.
///
/// Code inside `(?{ })` and `(??{ })` is never interpreted by the compiler.
pub trait CallbackHook: Send + Sync {
    fn register(&self, span: TextRange, body: &str, postponed: bool) -> u32;
}

/// Thresholds used by the optimizer and the class engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tuning {
    /// Largest edit distance at which a well-delimited POSIX name is still
    /// recognized.
    pub posix_max_distance: usize,
    /// Same, when the delimiters are malformed.
    pub posix_max_distance_malformed: usize,
    /// On equal length, keep the floating substring over the fixed one.
    pub prefer_floating_on_tie: bool,
    /// Start class analysis gives up past this many alternatives.
    pub start_class_max_branches: usize,
    /// Longest literal node, in bytes.
    pub literal_max_bytes: usize,
    /// Largest set considered for a bitmask class node.
    pub bitmask_max_points: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            posix_max_distance: 2,
            posix_max_distance_malformed: 1,
            prefer_floating_on_tie: true,
            start_class_max_branches: 64,
            literal_max_bytes: 255,
            bitmask_max_points: 8,
        }
    }
}

#[derive(Clone)]
pub struct CompileOptions {
    pub fold: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub extended: bool,
    /// `xx`: blanks inside bracket classes are ignored too.
    pub extended_more: bool,
    /// Plain `( )` groups do not capture.
    pub no_capture: bool,
    pub charset: Charset,
    /// Report the strict-only warnings.
    pub strict: bool,
    pub warnings_fatal: bool,
    pub max_depth: u32,
    pub tuning: Tuning,
    pub unicode: Arc<dyn UnicodeData>,
    pub callbacks: Option<Arc<dyn CallbackHook>>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            fold: false,
            multiline: false,
            dot_all: false,
            extended: false,
            extended_more: false,
            no_capture: false,
            charset: Charset::Depends,
            strict: false,
            warnings_fatal: false,
            max_depth: DEFAULT_MAX_DEPTH,
            tuning: Tuning::default(),
            unicode: Arc::new(StandardUnicode::new()),
            callbacks: None,
        }
    }
}

impl fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileOptions")
            .field("fold", &self.fold)
            .field("multiline", &self.multiline)
            .field("dot_all", &self.dot_all)
            .field("extended", &self.extended)
            .field("extended_more", &self.extended_more)
            .field("no_capture", &self.no_capture)
            .field("charset", &self.charset)
            .field("strict", &self.strict)
            .field("warnings_fatal", &self.warnings_fatal)
            .field("max_depth", &self.max_depth)
            .field("tuning", &self.tuning)
            .field("callbacks", &self.callbacks.is_some())
            .finish_non_exhaustive()
    }
}

/// Unknown letter in a flag string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown flag `{0}`")]
pub struct UnknownFlag(pub char);

impl CompileOptions {
    /// Applies a flag string such as `"imsx"`, `"xx"` or `"aa"`.
    pub fn apply_flags(&mut self, flags: &str) -> Result<(), UnknownFlag> {
        let mut chars = flags.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                'i' => self.fold = true,
                'm' => self.multiline = true,
                's' => self.dot_all = true,
                'n' => self.no_capture = true,
                'x' => {
                    if chars.next_if_eq(&'x').is_some() {
                        self.extended_more = true;
                    }
                    self.extended = true;
                }
                'a' => {
                    self.charset = if chars.next_if_eq(&'a').is_some() {
                        Charset::AsciiStrict
                    } else {
                        Charset::Ascii
                    };
                }
                'u' => self.charset = Charset::Unicode,
                'l' => self.charset = Charset::Locale,
                'd' => self.charset = Charset::Depends,
                other => return Err(UnknownFlag(other)),
            }
        }
        Ok(())
    }
}
