//! ANSI color codes for program dumps and compile traces.
//!
//! - Blue: opcode names
//! - Green: literal text and class members
//! - Yellow: restarts, abandoned optimizations
//! - Dim: offsets, next targets, operand labels

/// ANSI palette for CLI output. Standard 16-color codes only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Colors {
    pub blue: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub dim: &'static str,
    pub reset: &'static str,
}

impl Default for Colors {
    fn default() -> Self {
        Self::OFF
    }
}

impl Colors {
    pub const ON: Self = Self {
        blue: "\x1b[34m",
        green: "\x1b[32m",
        yellow: "\x1b[33m",
        dim: "\x1b[2m",
        reset: "\x1b[0m",
    };

    pub const OFF: Self = Self {
        blue: "",
        green: "",
        yellow: "",
        dim: "",
        reset: "",
    };

    pub fn new(enabled: bool) -> Self {
        if enabled { Self::ON } else { Self::OFF }
    }

    pub fn is_enabled(&self) -> bool {
        !self.reset.is_empty()
    }

    /// Wraps `text` in `color` .. reset.
    pub fn paint(&self, color: &'static str, text: impl std::fmt::Display) -> String {
        format!("{color}{text}{}", self.reset)
    }
}
