use regula_bytecode::{ProgramSummary, dump};
use regula_compiler::{NoopTracer, Pattern, PrintTracer};
use regula_core::Colors;
use serde::Serialize;

use super::run_common::{
    PatternFlags, PatternSource, compile_or_exit, load_or_exit, print_diagnostics,
};

pub struct DumpArgs {
    pub source: PatternSource,
    pub flags: PatternFlags,
    pub trace: bool,
    pub json: bool,
    pub color: bool,
}

/// JSON form of `dump --json`.
#[derive(Debug, Serialize)]
pub struct DumpReport {
    pub pattern: String,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
    pub program: ProgramSummary,
}

impl DumpReport {
    pub fn new(pattern: &Pattern, trace: Vec<String>) -> Self {
        Self {
            pattern: pattern.source().to_string(),
            warnings: pattern
                .diagnostics()
                .iter()
                .map(|d| d.to_string())
                .collect(),
            trace,
            program: pattern.program().summary(),
        }
    }
}

pub fn run(args: DumpArgs) {
    let loaded = load_or_exit(&args.source);
    let colors = Colors::new(args.color);

    let (pattern, trace) = if args.trace {
        let mut tracer = PrintTracer::new(colors);
        let pattern = compile_or_exit(&loaded, &args.flags, args.color, &mut tracer);
        (pattern, tracer.lines().to_vec())
    } else {
        let pattern = compile_or_exit(&loaded, &args.flags, args.color, &mut NoopTracer);
        (pattern, Vec::new())
    };

    if args.json {
        let report = DumpReport::new(&pattern, trace);
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: failed to serialize summary: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    print_diagnostics(pattern.diagnostics(), &loaded, args.color);
    for line in &trace {
        println!("{}", line);
    }
    if !trace.is_empty() {
        println!();
    }
    print!("{}", dump(pattern.program(), colors));
}
