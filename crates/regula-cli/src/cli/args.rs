//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` so every subcommand spells the
//! pattern input and compile flags the same way.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Pattern text (positional).
pub fn pattern_arg() -> Arg {
    Arg::new("pattern")
        .value_name("PATTERN")
        .required_unless_present("file")
        .conflicts_with("file")
        .help("Pattern text")
}

/// Pattern from a file (-f/--file, "-" for stdin).
pub fn file_arg() -> Arg {
    Arg::new("file")
        .short('f')
        .long("file")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Read the pattern from a file (use \"-\" for stdin)")
}

/// Case-insensitive matching (-i).
pub fn fold_arg() -> Arg {
    Arg::new("fold")
        .short('i')
        .action(ArgAction::SetTrue)
        .help("Case-insensitive matching")
}

/// `^` and `$` match at line boundaries (-m).
pub fn multiline_arg() -> Arg {
    Arg::new("multiline")
        .short('m')
        .action(ArgAction::SetTrue)
        .help("`^` and `$` match at embedded newlines")
}

/// `.` matches newline (-s).
pub fn dot_all_arg() -> Arg {
    Arg::new("dot_all")
        .short('s')
        .action(ArgAction::SetTrue)
        .help("`.` also matches newline")
}

/// Extended syntax (-x, -xx).
pub fn extended_arg() -> Arg {
    Arg::new("extended")
        .short('x')
        .action(ArgAction::Count)
        .help("Ignore whitespace and comments (-xx also inside classes)")
}

/// Plain parentheses don't capture (-n).
pub fn no_capture_arg() -> Arg {
    Arg::new("no_capture")
        .short('n')
        .action(ArgAction::SetTrue)
        .help("Plain parentheses don't capture")
}

/// Character-set rules (--charset).
pub fn charset_arg() -> Arg {
    Arg::new("charset")
        .long("charset")
        .value_name("RULES")
        .value_parser(["d", "u", "a", "aa", "l"])
        .help("Character-set rules: d (depends), u, a, aa or l")
}

/// Extra diagnostics (--strict).
pub fn strict_arg() -> Arg {
    Arg::new("strict")
        .long("strict")
        .action(ArgAction::SetTrue)
        .help("Report extra diagnostics; false ranges become errors")
}

/// Treat warnings as errors (--warnings-fatal).
pub fn warnings_fatal_arg() -> Arg {
    Arg::new("warnings_fatal")
        .long("warnings-fatal")
        .action(ArgAction::SetTrue)
        .help("Treat warnings as errors")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}

/// Print compiler events (--trace).
pub fn trace_arg() -> Arg {
    Arg::new("trace")
        .long("trace")
        .action(ArgAction::SetTrue)
        .help("Print compiler passes, restarts and emitted nodes")
}

/// JSON summary instead of the dump (--json).
pub fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print a JSON summary instead of the node dump")
}
