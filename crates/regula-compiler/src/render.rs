//! Canonical re-rendering of a pattern.
//!
//! The original text is wrapped in a `(?^...:...)` group spelling out every
//! mode that was in effect, so the rendering compiles to the same program
//! under default options.

use regula_bytecode::Charset;

use crate::options::CompileOptions;

/// Wraps `pattern` with the modes of `opts`.
///
/// `utf8` is the encoding the program ended up in: a `d` pattern that was
/// upgraded follows Unicode rules, so it renders as `u`.
pub fn render(pattern: &str, opts: &CompileOptions, utf8: bool) -> String {
    let mut out = String::with_capacity(pattern.len() + 12);
    out.push_str("(?^");
    out.push_str(charset_letters(opts.charset, utf8));
    if opts.multiline {
        out.push('m');
    }
    if opts.dot_all {
        out.push('s');
    }
    if opts.fold {
        out.push('i');
    }
    if opts.extended_more {
        out.push_str("xx");
    } else if opts.extended {
        out.push('x');
    }
    if opts.no_capture {
        out.push('n');
    }
    out.push(':');
    out.push_str(pattern);
    // A trailing `#` comment would swallow the closing paren.
    if (opts.extended || opts.extended_more) && pattern.contains('#') {
        out.push('\n');
    }
    out.push(')');
    out
}

fn charset_letters(charset: Charset, utf8: bool) -> &'static str {
    match charset {
        Charset::Depends if utf8 => "u",
        Charset::Depends => "",
        other => other.modifier(),
    }
}

#[cfg(test)]
mod tests {
    use regula_bytecode::Charset;

    use super::render;
    use crate::options::CompileOptions;

    fn with_flags(flags: &str) -> CompileOptions {
        let mut opts = CompileOptions::default();
        opts.apply_flags(flags).expect("valid flags");
        opts
    }

    #[test]
    fn plain() {
        insta::assert_snapshot!(render("abc", &CompileOptions::default(), false), @"(?^:abc)");
    }

    #[test]
    fn modes_in_fixed_order() {
        insta::assert_snapshot!(render("a.b", &with_flags("xsmin"), false), @"(?^msixn:a.b)");
        insta::assert_snapshot!(render("a", &with_flags("xxi"), false), @"(?^ixx:a)");
    }

    #[test]
    fn charset_letters() {
        insta::assert_snapshot!(render("a", &with_flags("aai"), false), @"(?^aai:a)");
        insta::assert_snapshot!(render("a", &with_flags("l"), false), @"(?^l:a)");
        insta::assert_snapshot!(render("\u{100}", &CompileOptions::default(), true), @"(?^u:\u{100})");
        let opts = CompileOptions {
            charset: Charset::Unicode,
            ..CompileOptions::default()
        };
        assert_eq!(render("a", &opts, false), "(?^u:a)");
    }

    #[test]
    fn comment_does_not_swallow_close() {
        assert_eq!(render("a # note", &with_flags("x"), false), "(?^x:a # note\n)");
        assert_eq!(render("a # note", &CompileOptions::default(), false), "(?^:a # note)");
    }
}
