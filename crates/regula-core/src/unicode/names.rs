//! Character names for `\N{...}`.
//!
//! Explicit entries cover ASCII punctuation, controls and commonly used
//! symbols; Latin letters, digits and CJK unified ideographs are named
//! algorithmically. Named sequences resolve to several code points.

static NAMES: &[(&str, u32)] = &[
    ("NULL", 0x00),
    ("CHARACTER TABULATION", 0x09),
    ("LINE FEED", 0x0A),
    ("LF", 0x0A),
    ("LINE TABULATION", 0x0B),
    ("FORM FEED", 0x0C),
    ("CARRIAGE RETURN", 0x0D),
    ("CR", 0x0D),
    ("ESCAPE", 0x1B),
    ("SPACE", 0x20),
    ("EXCLAMATION MARK", 0x21),
    ("QUOTATION MARK", 0x22),
    ("NUMBER SIGN", 0x23),
    ("DOLLAR SIGN", 0x24),
    ("PERCENT SIGN", 0x25),
    ("AMPERSAND", 0x26),
    ("APOSTROPHE", 0x27),
    ("LEFT PARENTHESIS", 0x28),
    ("RIGHT PARENTHESIS", 0x29),
    ("ASTERISK", 0x2A),
    ("PLUS SIGN", 0x2B),
    ("COMMA", 0x2C),
    ("HYPHEN-MINUS", 0x2D),
    ("FULL STOP", 0x2E),
    ("SOLIDUS", 0x2F),
    ("COLON", 0x3A),
    ("SEMICOLON", 0x3B),
    ("LESS-THAN SIGN", 0x3C),
    ("EQUALS SIGN", 0x3D),
    ("GREATER-THAN SIGN", 0x3E),
    ("QUESTION MARK", 0x3F),
    ("COMMERCIAL AT", 0x40),
    ("LEFT SQUARE BRACKET", 0x5B),
    ("REVERSE SOLIDUS", 0x5C),
    ("RIGHT SQUARE BRACKET", 0x5D),
    ("CIRCUMFLEX ACCENT", 0x5E),
    ("LOW LINE", 0x5F),
    ("GRAVE ACCENT", 0x60),
    ("LEFT CURLY BRACKET", 0x7B),
    ("VERTICAL LINE", 0x7C),
    ("RIGHT CURLY BRACKET", 0x7D),
    ("TILDE", 0x7E),
    ("DELETE", 0x7F),
    ("NEXT LINE", 0x85),
    ("NO-BREAK SPACE", 0xA0),
    ("SECTION SIGN", 0xA7),
    ("COPYRIGHT SIGN", 0xA9),
    ("SOFT HYPHEN", 0xAD),
    ("MICRO SIGN", 0xB5),
    ("LATIN CAPITAL LETTER A WITH GRAVE", 0xC0),
    ("LATIN CAPITAL LETTER E WITH ACUTE", 0xC9),
    ("LATIN SMALL LETTER SHARP S", 0xDF),
    ("LATIN SMALL LETTER A WITH GRAVE", 0xE0),
    ("LATIN SMALL LETTER E WITH ACUTE", 0xE9),
    ("LATIN SMALL LETTER Y WITH DIAERESIS", 0xFF),
    ("LATIN CAPITAL LETTER A WITH MACRON", 0x100),
    ("LATIN SMALL LETTER A WITH MACRON", 0x101),
    ("LATIN CAPITAL LETTER I WITH DOT ABOVE", 0x130),
    ("LATIN SMALL LETTER DOTLESS I", 0x131),
    ("LATIN SMALL LETTER LONG S", 0x17F),
    ("COMBINING GRAVE ACCENT", 0x300),
    ("COMBINING ACUTE ACCENT", 0x301),
    ("GREEK CAPITAL LETTER SIGMA", 0x3A3),
    ("GREEK SMALL LETTER ALPHA", 0x3B1),
    ("GREEK SMALL LETTER BETA", 0x3B2),
    ("GREEK SMALL LETTER MU", 0x3BC),
    ("GREEK SMALL LETTER FINAL SIGMA", 0x3C2),
    ("GREEK SMALL LETTER SIGMA", 0x3C3),
    ("LATIN CAPITAL LETTER SHARP S", 0x1E9E),
    ("ZERO WIDTH SPACE", 0x200B),
    ("ZERO WIDTH JOINER", 0x200D),
    ("EN DASH", 0x2013),
    ("EM DASH", 0x2014),
    ("LEFT SINGLE QUOTATION MARK", 0x2018),
    ("RIGHT SINGLE QUOTATION MARK", 0x2019),
    ("BULLET", 0x2022),
    ("HORIZONTAL ELLIPSIS", 0x2026),
    ("LINE SEPARATOR", 0x2028),
    ("PARAGRAPH SEPARATOR", 0x2029),
    ("EURO SIGN", 0x20AC),
    ("COMBINING ENCLOSING KEYCAP", 0x20E3),
    ("KELVIN SIGN", 0x212A),
    ("ANGSTROM SIGN", 0x212B),
    ("RIGHTWARDS ARROW", 0x2192),
    ("SNOWMAN", 0x2603),
    ("BLACK STAR", 0x2605),
    ("LATIN SMALL LIGATURE FF", 0xFB00),
    ("LATIN SMALL LIGATURE FI", 0xFB01),
    ("VARIATION SELECTOR-16", 0xFE0F),
    ("ZERO WIDTH NO-BREAK SPACE", 0xFEFF),
    ("BYTE ORDER MARK", 0xFEFF),
    ("REPLACEMENT CHARACTER", 0xFFFD),
    ("GRINNING FACE", 0x1F600),
];

static SEQUENCES: &[(&str, &[u32])] = &[
    ("LATIN CAPITAL LETTER A WITH MACRON AND GRAVE", &[0x100, 0x300]),
    ("LATIN SMALL LETTER A WITH MACRON AND GRAVE", &[0x101, 0x300]),
    ("KEYCAP DIGIT ONE", &[0x31, 0xFE0F, 0x20E3]),
    ("KEYCAP NUMBER SIGN", &[0x23, 0xFE0F, 0x20E3]),
];

static DIGITS: [&str; 10] = [
    "ZERO", "ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT", "NINE",
];

const CJK_PREFIX: &str = "CJK UNIFIED IDEOGRAPH-";
const CJK_RANGES: [(u32, u32); 2] = [(0x3400, 0x4DBF), (0x4E00, 0x9FFF)];

/// Uppercases and collapses runs of blanks.
fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}

pub(crate) fn lookup(name: &str) -> Option<Vec<u32>> {
    let name = normalize(name);

    if let Some(&(_, cp)) = NAMES.iter().find(|(n, _)| *n == name) {
        return Some(vec![cp]);
    }
    if let Some(&(_, seq)) = SEQUENCES.iter().find(|(n, _)| *n == name) {
        return Some(seq.to_vec());
    }
    algorithmic(&name).map(|cp| vec![cp])
}

fn algorithmic(name: &str) -> Option<u32> {
    if let Some(letter) = name.strip_prefix("LATIN CAPITAL LETTER ") {
        return single_ascii_upper(letter);
    }
    if let Some(letter) = name.strip_prefix("LATIN SMALL LETTER ") {
        return single_ascii_upper(letter).map(|cp| cp + 0x20);
    }
    if let Some(digit) = name.strip_prefix("DIGIT ") {
        return DIGITS
            .iter()
            .position(|d| *d == digit)
            .map(|i| 0x30 + i as u32);
    }
    if let Some(hex) = name.strip_prefix(CJK_PREFIX) {
        let cp = u32::from_str_radix(hex, 16).ok()?;
        return CJK_RANGES
            .iter()
            .any(|&(lo, hi)| (lo..=hi).contains(&cp))
            .then_some(cp);
    }
    None
}

fn single_ascii_upper(s: &str) -> Option<u32> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Some(c as u32),
        _ => None,
    }
}

pub(crate) fn all_names() -> Vec<(String, u32)> {
    let mut out: Vec<(String, u32)> = NAMES.iter().map(|&(n, cp)| (n.to_string(), cp)).collect();
    for c in 'A'..='Z' {
        out.push((format!("LATIN CAPITAL LETTER {c}"), c as u32));
        out.push((format!("LATIN SMALL LETTER {c}"), c as u32 + 0x20));
    }
    for (i, d) in DIGITS.iter().enumerate() {
        out.push((format!("DIGIT {d}"), 0x30 + i as u32));
    }
    for &(lo, hi) in &CJK_RANGES {
        out.extend((lo..=hi).map(|cp| (format!("{CJK_PREFIX}{cp:04X}"), cp)));
    }
    out
}
