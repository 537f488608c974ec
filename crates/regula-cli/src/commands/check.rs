use regula_compiler::NoopTracer;

use super::run_common::{
    PatternFlags, PatternSource, compile_or_exit, load_or_exit, print_diagnostics,
};

pub struct CheckArgs {
    pub source: PatternSource,
    pub flags: PatternFlags,
    pub color: bool,
}

pub fn run(args: CheckArgs) {
    let loaded = load_or_exit(&args.source);

    // Errors exit inside `compile_or_exit`; only warnings reach this point.
    let pattern = compile_or_exit(&loaded, &args.flags, args.color, &mut NoopTracer);
    print_diagnostics(pattern.diagnostics(), &loaded, args.color);
}
