//! Dispatch logic: extract params from ArgMatches and convert to command args.
//!
//! `*Params` structs mirror the command `*Args` but are populated from clap.
//! Pattern input and compile flags are shared, so they are pulled out once
//! by `pattern_source()` and `pattern_flags()`.

use std::path::PathBuf;

use clap::ArgMatches;

use super::ColorChoice;
use crate::commands::check::CheckArgs;
use crate::commands::dump::DumpArgs;
use crate::commands::render::RenderArgs;
use crate::commands::run_common::{PatternFlags, PatternSource};

pub struct CheckParams {
    pub source: PatternSource,
    pub flags: PatternFlags,
    pub color: ColorChoice,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            source: pattern_source(m),
            flags: pattern_flags(m),
            color: parse_color(m),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            source: p.source,
            flags: p.flags,
            color: p.color.should_colorize(),
        }
    }
}

pub struct DumpParams {
    pub source: PatternSource,
    pub flags: PatternFlags,
    pub trace: bool,
    pub json: bool,
    pub color: ColorChoice,
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            source: pattern_source(m),
            flags: pattern_flags(m),
            trace: m.get_flag("trace"),
            json: m.get_flag("json"),
            color: parse_color(m),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            source: p.source,
            flags: p.flags,
            trace: p.trace,
            json: p.json,
            // JSON output is never colored.
            color: !p.json && p.color.should_colorize(),
        }
    }
}

pub struct RenderParams {
    pub source: PatternSource,
    pub flags: PatternFlags,
    pub color: ColorChoice,
}

impl RenderParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            source: pattern_source(m),
            flags: pattern_flags(m),
            color: parse_color(m),
        }
    }
}

impl From<RenderParams> for RenderArgs {
    fn from(p: RenderParams) -> Self {
        Self {
            source: p.source,
            flags: p.flags,
            color: p.color.should_colorize(),
        }
    }
}

fn pattern_source(m: &ArgMatches) -> PatternSource {
    match m.get_one::<PathBuf>("file") {
        Some(path) => PatternSource::File(path.clone()),
        None => PatternSource::Text(m.get_one::<String>("pattern").cloned().unwrap_or_default()),
    }
}

fn pattern_flags(m: &ArgMatches) -> PatternFlags {
    PatternFlags {
        fold: m.get_flag("fold"),
        multiline: m.get_flag("multiline"),
        dot_all: m.get_flag("dot_all"),
        extended: m.get_count("extended"),
        no_capture: m.get_flag("no_capture"),
        charset: m.get_one::<String>("charset").cloned(),
        strict: m.get_flag("strict"),
        warnings_fatal: m.get_flag("warnings_fatal"),
    }
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}
