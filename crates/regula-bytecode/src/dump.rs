//! Human-readable program dump.
//!
//! One node per line: offset, opcode name, operands, next target. Sections
//! are separated by a blank line.

use std::fmt::Write as _;

use regula_core::{CodepointSet, Colors, PosixClass};

use crate::node::Node;
use crate::opcode::{BoundKind, NO_AUX, Opcode, Operands, UNBOUNDED, flag, split_charset_flags};
use crate::program::{Anchor, Program, RequiredSubstring, StartClass, SubstrCheck};

pub fn dump(program: &Program, colors: Colors) -> String {
    let mut out = String::new();
    dump_header(&mut out, program, &colors);
    out.push('\n');
    dump_nodes(&mut out, program, &colors);
    let captures = program.captures();
    if captures.physical > 0 || !captures.names.is_empty() {
        out.push('\n');
        dump_captures(&mut out, program, &colors);
    }
    out.push('\n');
    dump_study(&mut out, program, &colors);
    out
}

fn width_for(len: usize) -> usize {
    len.max(1).to_string().len()
}

fn dump_header(out: &mut String, program: &Program, c: &Colors) {
    let enc = program.encoding();
    writeln!(out, "{}[program]{}", c.blue, c.reset).unwrap();
    writeln!(
        out,
        "encoding: {}, {} links",
        if enc.utf8 { "utf8" } else { "latin1" },
        if enc.wide_links { "wide" } else { "narrow" }
    )
    .unwrap();
    writeln!(out, "slots: {}", program.len()).unwrap();
    writeln!(out, "rendering: {}{}{}", c.green, program.rendering(), c.reset).unwrap();
}

fn dump_nodes(out: &mut String, program: &Program, c: &Colors) {
    let w = width_for(program.len());
    writeln!(out, "{}[nodes]{}", c.blue, c.reset).unwrap();
    for node in program.nodes() {
        let operands = format_operands(program, &node, c);
        write!(
            out,
            "{:0w$} {}{}{}{}",
            node.offset(),
            c.blue,
            node.opcode().name(),
            c.reset,
            operands
        )
        .unwrap();
        if let Some(next) = node.next() {
            write!(out, " {}-> {next:0w$}{}", c.dim, c.reset).unwrap();
        }
        out.push('\n');
    }
}

fn format_operands(program: &Program, node: &Node<'_>, c: &Colors) -> String {
    let op = node.opcode();
    let lazy = if is_loop(op) && node.has_flag(flag::LAZY) {
        " lazy"
    } else {
        ""
    };
    match op.operands() {
        Operands::Str => format!(" {}{:?}{}", c.green, node.literal_text(), c.reset),
        Operands::Class => format!(" {}", format_class(program, node, c)),
        Operands::Arg1 => match format_arg1(program, node) {
            arg if arg.is_empty() => arg,
            arg => format!(" {arg}"),
        },
        Operands::Arg2 => format!(" {}{lazy}", format_arg2(node)),
        Operands::None => match op {
            Opcode::Posix | Opcode::NPosix => {
                let (class, charset) = split_charset_flags(node.flags());
                let name = PosixClass::from_u8(class).map_or("?", PosixClass::name);
                let charset = charset.map_or("?", |cs| cs.modifier());
                format!(" [:{name}:]/{charset}")
            }
            Opcode::Bound | Opcode::NBound => {
                let (kind, charset) = split_charset_flags(node.flags());
                let kind = BoundKind::from_u8(kind).map_or("", BoundKind::name);
                let charset = charset.map_or("?", |cs| cs.modifier());
                if kind.is_empty() {
                    format!(" /{charset}")
                } else {
                    format!(" {{{kind}}}/{charset}")
                }
            }
            _ => lazy.to_string(),
        },
    }
}

fn is_loop(op: Opcode) -> bool {
    matches!(op, Opcode::Star | Opcode::Plus | Opcode::Curly | Opcode::CurlyX)
}

fn format_arg1(program: &Program, node: &Node<'_>) -> String {
    let arg = node.arg1();
    let name_of = |idx: u32| {
        program
            .names()
            .get_index(idx as usize)
            .map_or("?", |(n, _)| n.as_str())
            .to_string()
    };
    match node.opcode() {
        Opcode::Open | Opcode::Close => format!("#{arg}"),
        Opcode::Ref | Opcode::RefFold => format!("\\{arg}"),
        Opcode::RefName | Opcode::RefNameFold => format!("\\k<{}>", name_of(arg)),
        Opcode::GroupP => format!("({arg})"),
        Opcode::GroupPName => format!("(<{}>)", name_of(arg)),
        Opcode::InSubP if node.has_flag(flag::NAMED) => format!("(R&{})", name_of(arg)),
        Opcode::InSubP if arg == 0 => "(R)".to_string(),
        Opcode::InSubP => format!("(R{arg})"),
        Opcode::Eval => {
            let kind = if node.has_flag(flag::POSTPONED) { "??{}" } else { "?{}" };
            format!("{kind} token {arg}")
        }
        _ if arg == NO_AUX => String::new(),
        _ => format!(":{}", program.verb_arg(arg).unwrap_or("?")),
    }
}

fn format_arg2(node: &Node<'_>) -> String {
    let (a, b) = (node.arg1(), node.arg2());
    let max = |v: u32| {
        if v == UNBOUNDED {
            String::new()
        } else {
            v.to_string()
        }
    };
    match node.opcode() {
        Opcode::Curly | Opcode::CurlyX => format!("{{{a},{}}}", max(b)),
        Opcode::AnyOfR => format!("{}", CodepointSet::range(a, b)),
        Opcode::AnyOfM | Opcode::NAnyOfM => format!("{a:#x}/{b:#x}"),
        Opcode::IfMatch | Opcode::Unless => {
            let dir = if node.has_flag(flag::BEHIND) { "behind" } else { "ahead" };
            format!("{dir} len {a}..{}", max(b))
        }
        Opcode::GoSub => format!("#{a} @{b}"),
        _ => format!("{a} {b}"),
    }
}

fn format_class(program: &Program, node: &Node<'_>, c: &Colors) -> String {
    let mut set = CodepointSet::new();
    for byte in 0..=255u8 {
        if node.bitmap_contains(byte) {
            set.add(u32::from(byte));
        }
    }
    let mut extras = Vec::new();
    if let Some(data) = node.class_aux().and_then(|i| program.class_data(i)) {
        set.extend(&data.above);
        if !data.utf8_only.is_empty() {
            extras.push(format!("utf8:{}", data.utf8_only));
        }
        for (class, negated) in &data.locale_classes {
            let neg = if *negated { "^" } else { "" };
            extras.push(format!("locale:[:{neg}{class}:]"));
        }
        if let Some(d) = &data.deferred {
            let neg = if d.negated { "^" } else { "" };
            extras.push(format!("deferred:{neg}{}", d.name));
        }
    }
    if node.has_flag(flag::CLASS_ALL_ABOVE) {
        extras.push("all-above".to_string());
    }
    if node.has_flag(flag::CLASS_INVERTED) {
        extras.push("inverted".to_string());
    }
    let mut s = format!("{}{set}{}", c.green, c.reset);
    for e in extras {
        write!(s, " {}{e}{}", c.dim, c.reset).unwrap();
    }
    s
}

fn dump_captures(out: &mut String, program: &Program, c: &Colors) {
    let captures = program.captures();
    writeln!(out, "{}[captures]{}", c.blue, c.reset).unwrap();
    writeln!(
        out,
        "physical: {}, logical: {}",
        captures.physical, captures.logical
    )
    .unwrap();
    for p in 1..=captures.physical {
        let logical = captures.logical_of(p).unwrap_or(0);
        writeln!(out, "#{p} {}=> {logical}{}", c.dim, c.reset).unwrap();
    }
    for (name, logicals) in &captures.names {
        let list: Vec<String> = logicals.iter().map(u32::to_string).collect();
        writeln!(out, "<{name}> {}=> {}{}", c.dim, list.join(","), c.reset).unwrap();
    }
}

fn format_substr(s: &Option<RequiredSubstring>, c: &Colors) -> String {
    match s {
        None => "-".to_string(),
        Some(s) => {
            let window = match s.max_offset {
                Some(max) if max == s.min_offset => format!("@{max}"),
                Some(max) => format!("@{}..{max}", s.min_offset),
                None => format!("@{}..", s.min_offset),
            };
            let end = if s.before_end { " $" } else { "" };
            format!("{}{:?}{} {window}{end}", c.green, s.text, c.reset)
        }
    }
}

fn dump_study(out: &mut String, program: &Program, c: &Colors) {
    let study = program.study();
    writeln!(out, "{}[study]{}", c.blue, c.reset).unwrap();
    writeln!(out, "minlen: {}", study.min_len).unwrap();
    match study.max_len {
        Some(max) => writeln!(out, "maxlen: {max}").unwrap(),
        None => writeln!(out, "maxlen: unbounded").unwrap(),
    }
    let anchor = match study.anchor.kind {
        Anchor::None => "none",
        Anchor::Sbol => "sbol",
        Anchor::Mbol => "mbol",
        Anchor::Gpos => "gpos",
    };
    let implicit = if study.anchor.implicit { " (implicit)" } else { "" };
    writeln!(out, "anchor: {anchor}{implicit}").unwrap();
    writeln!(out, "fixed: {}", format_substr(&study.fixed, c)).unwrap();
    writeln!(out, "floating: {}", format_substr(&study.floating, c)).unwrap();
    let check = match study.check {
        None => "-",
        Some(SubstrCheck::Fixed) => "fixed",
        Some(SubstrCheck::Floating) => "floating",
    };
    writeln!(out, "check: {check}").unwrap();
    let start = match &study.start_class {
        None => "-".to_string(),
        Some(StartClass::Node(offset)) => {
            format!("{} @{offset}", program.node(*offset).opcode().name())
        }
        Some(StartClass::Set(set)) => format!("{}{set}{}", c.green, c.reset),
    };
    writeln!(out, "start-class: {start}").unwrap();
    let flags = program.flags().names();
    if flags.is_empty() {
        write!(out, "flags: -").unwrap();
    } else {
        write!(out, "flags: {}", flags.join(" ")).unwrap();
    }
    out.push('\n');
}
