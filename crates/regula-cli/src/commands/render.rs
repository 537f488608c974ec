use regula_compiler::NoopTracer;

use super::run_common::{
    PatternFlags, PatternSource, compile_or_exit, load_or_exit, print_diagnostics,
};

pub struct RenderArgs {
    pub source: PatternSource,
    pub flags: PatternFlags,
    pub color: bool,
}

pub fn run(args: RenderArgs) {
    let loaded = load_or_exit(&args.source);
    let pattern = compile_or_exit(&loaded, &args.flags, args.color, &mut NoopTracer);
    print_diagnostics(pattern.diagnostics(), &loaded, args.color);
    println!("{}", pattern.rendering());
}
