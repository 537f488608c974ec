//! Command builders for the CLI.
//!
//! Every command takes the same pattern input and compile flags; only the
//! output switches differ.

use clap::Command;

use super::args::*;

/// Add the pattern input and compile flag args shared by every command.
fn with_pattern_args(cmd: Command) -> Command {
    cmd.arg(pattern_arg())
        .arg(file_arg())
        .arg(fold_arg())
        .arg(multiline_arg())
        .arg(dot_all_arg())
        .arg(extended_arg())
        .arg(no_capture_arg())
        .arg(charset_arg())
        .arg(strict_arg())
        .arg(warnings_fatal_arg())
        .arg(color_arg())
}

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("regula")
        .about("Compile regular expressions and inspect the resulting programs")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(check_command())
        .subcommand(dump_command())
        .subcommand(render_command())
}

/// Validate a pattern.
pub fn check_command() -> Command {
    let cmd = Command::new("check")
        .about("Validate a pattern and print its diagnostics")
        .override_usage(
            "\
  regula check <PATTERN> [FLAGS]
  regula check -f <FILE> [FLAGS]",
        )
        .after_help(
            r#"EXAMPLES:
  regula check 'a{3,1}'               # warnings are printed, exit 0
  regula check '(a' --color never     # errors exit 1
  regula check -x -f pattern.txt      # read the pattern from a file
  regula check '[\w-z]' --strict      # strict mode promotes false ranges"#,
        );

    with_pattern_args(cmd)
}

/// Show the compiled program.
pub fn dump_command() -> Command {
    let cmd = Command::new("dump")
        .about("Show the compiled node program")
        .override_usage(
            "\
  regula dump <PATTERN> [FLAGS]
  regula dump -f <FILE> [FLAGS]",
        )
        .after_help(
            r#"EXAMPLES:
  regula dump 'ab+c'                  # node listing
  regula dump -i '(?<word>\w+)'       # folded literals and group names
  regula dump '\1(a)' --trace         # show passes and restarts
  regula dump 'a|b' --json            # machine-readable summary"#,
        );

    with_pattern_args(cmd).arg(trace_arg()).arg(json_arg())
}

/// Show the canonical rendering.
pub fn render_command() -> Command {
    let cmd = Command::new("render")
        .about("Print the canonical rendering of a pattern")
        .override_usage(
            "\
  regula render <PATTERN> [FLAGS]
  regula render -f <FILE> [FLAGS]",
        )
        .after_help(
            r#"EXAMPLES:
  regula render 'abc'                 # (?^:abc)
  regula render -i -x 'a b'           # (?^ix:a b)"#,
        );

    with_pattern_args(cmd)
}
