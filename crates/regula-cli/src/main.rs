mod cli;
mod commands;

use cli::{CheckParams, DumpParams, RenderParams, build_cli};

fn main() {
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("check", m)) => {
            let params = CheckParams::from_matches(m);
            commands::check::run(params.into());
        }
        Some(("dump", m)) => {
            let params = DumpParams::from_matches(m);
            commands::dump::run(params.into());
        }
        Some(("render", m)) => {
            let params = RenderParams::from_matches(m);
            commands::render::run(params.into());
        }
        _ => unreachable!("clap should have caught this"),
    }
}
