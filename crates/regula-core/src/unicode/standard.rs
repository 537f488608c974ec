//! Default data service backed by the tables bundled with `regex-syntax`.

use std::sync::OnceLock;

use regex_syntax::ParserBuilder;
use regex_syntax::hir::{Class, ClassUnicode, ClassUnicodeRange, HirKind};

use super::{PosixClass, PropertyLookup, UnicodeData};
use crate::CodepointSet;

const HYPHEN_DEPRECATION: &str = "supplanted by Line_Break property values";

static HYPHENS: &[(u32, u32)] = &[
    (0x2D, 0x2D),
    (0xAD, 0xAD),
    (0x58A, 0x58A),
    (0x1806, 0x1806),
    (0x2010, 0x2011),
    (0x2E17, 0x2E17),
    (0x30FB, 0x30FB),
    (0xFE63, 0xFE63),
    (0xFF0D, 0xFF0D),
    (0xFF65, 0xFF65),
];

static VERTICAL_SPACE: &[(u32, u32)] = &[(0x0A, 0x0D), (0x85, 0x85), (0x2028, 0x2029)];

/// Block names (loose form) for `\p{InGreek}` and `\p{Block=...}`.
static BLOCKS: &[(&str, u32, u32)] = &[
    ("basiclatin", 0x0000, 0x007F),
    ("latin1supplement", 0x0080, 0x00FF),
    ("latin1", 0x0080, 0x00FF),
    ("latinextendeda", 0x0100, 0x017F),
    ("latinextendedb", 0x0180, 0x024F),
    ("ipaextensions", 0x0250, 0x02AF),
    ("combiningdiacriticalmarks", 0x0300, 0x036F),
    ("greekandcoptic", 0x0370, 0x03FF),
    ("greek", 0x0370, 0x03FF),
    ("cyrillic", 0x0400, 0x04FF),
    ("armenian", 0x0530, 0x058F),
    ("hebrew", 0x0590, 0x05FF),
    ("arabic", 0x0600, 0x06FF),
    ("devanagari", 0x0900, 0x097F),
    ("thai", 0x0E00, 0x0E7F),
    ("hangul jamo", 0x1100, 0x11FF),
    ("generalpunctuation", 0x2000, 0x206F),
    ("currencysymbols", 0x20A0, 0x20CF),
    ("letterlikesymbols", 0x2100, 0x214F),
    ("arrows", 0x2190, 0x21FF),
    ("mathematicaloperators", 0x2200, 0x22FF),
    ("boxdrawing", 0x2500, 0x257F),
    ("miscellaneoussymbols", 0x2600, 0x26FF),
    ("hiragana", 0x3040, 0x309F),
    ("katakana", 0x30A0, 0x30FF),
    ("cjkunifiedideographs", 0x4E00, 0x9FFF),
    ("hangulsyllables", 0xAC00, 0xD7AF),
    ("privateusearea", 0xE000, 0xF8FF),
    ("privateuse", 0xE000, 0xF8FF),
    ("alphabeticpresentationforms", 0xFB00, 0xFB4F),
    ("halfwidthandfullwidthforms", 0xFF00, 0xFFEF),
    ("specials", 0xFFF0, 0xFFFF),
    ("emoticons", 0x1F600, 0x1F64F),
];

static GENERAL_CATEGORIES: &[&str] = &[
    "Lu", "Ll", "Lt", "Lm", "Lo", "Mn", "Mc", "Me", "Nd", "Nl", "No", "Pc", "Pd", "Ps", "Pe", "Pi",
    "Pf", "Po", "Sm", "Sc", "Sk", "So", "Zs", "Zl", "Zp", "Cc", "Cf", "Cs", "Co", "Cn",
];

static SCRIPTS: &[&str] = &[
    "Arabic", "Armenian", "Bengali", "Bopomofo", "Braille", "Cherokee", "Common", "Coptic",
    "Cyrillic", "Devanagari", "Ethiopic", "Georgian", "Glagolitic", "Gothic", "Greek", "Gujarati",
    "Gurmukhi", "Han", "Hangul", "Hebrew", "Hiragana", "Inherited", "Kannada", "Katakana",
    "Khmer", "Lao", "Latin", "Malayalam", "Mongolian", "Myanmar", "Ogham", "Oriya", "Runic",
    "Sinhala", "Syriac", "Tamil", "Telugu", "Thaana", "Thai", "Tibetan", "Yi",
];

static AGES: &[&str] = &[
    "1.1", "2.0", "2.1", "3.0", "3.1", "3.2", "4.0", "4.1", "5.0", "5.1", "5.2", "6.0", "6.1",
    "6.2", "6.3", "7.0", "8.0", "9.0", "10.0", "11.0", "12.0", "12.1", "13.0", "14.0", "15.0",
];

#[derive(Debug, Default)]
pub struct StandardUnicode {
    posix: [OnceLock<CodepointSet>; 14],
}

impl StandardUnicode {
    pub fn new() -> Self {
        Self::default()
    }

    fn unicode_posix(&self, class: PosixClass) -> &CodepointSet {
        self.posix[class as usize].get_or_init(|| {
            let pattern = match class {
                PosixClass::Word => r"\w",
                PosixClass::Digit => r"\p{Nd}",
                PosixClass::Alpha => r"\p{Alphabetic}",
                PosixClass::Lower => r"\p{Lowercase}",
                PosixClass::Upper => r"\p{Uppercase}",
                PosixClass::Punct => r"[\p{P}[\p{S}&&\p{ASCII}]]",
                PosixClass::Print => r"[[^\p{White_Space}\p{Cc}\p{Cs}\p{Cn}]\p{Zs}]",
                PosixClass::Alnum => r"[\p{Alphabetic}\p{Nd}]",
                PosixClass::Graph => r"[^\p{White_Space}\p{Cc}\p{Cs}\p{Cn}]",
                PosixClass::Cased => r"\p{Cased}",
                PosixClass::Space => r"\p{White_Space}",
                PosixClass::Blank => r"[\p{Zs}\t]",
                PosixClass::Cntrl => r"\p{Cc}",
                PosixClass::XDigit => {
                    r"[0-9A-Fa-f\x{FF10}-\x{FF19}\x{FF21}-\x{FF26}\x{FF41}-\x{FF46}]"
                }
            };
            class_from_regex(pattern).unwrap_or_else(|| class.ascii_set())
        })
    }

    /// Names only this family of regex dialects knows about.
    fn extension(&self, raw: &str, loose: &str) -> Option<PropertyLookup> {
        let found = |set: CodepointSet| PropertyLookup::Found {
            set,
            deprecated: None,
        };

        if matches!(raw.trim(), "L&" | "L_" | "LC") {
            return class_from_regex(r"\p{Cased_Letter}").map(found);
        }

        let set = match loose {
            "all" => CodepointSet::full(),
            "word" | "xposixword" | "perlword" | "posixword" => {
                let ascii = loose != "word" && loose != "xposixword";
                self.posix_class(PosixClass::Word, ascii)
            }
            "space" | "spaceperl" | "xperlspace" | "xposixspace" => {
                self.posix_class(PosixClass::Space, false)
            }
            "perlspace" | "posixspace" => self.posix_class(PosixClass::Space, true),
            "blank" | "horizspace" | "xposixblank" => self.posix_class(PosixClass::Blank, false),
            "vertspace" => CodepointSet::from_ranges(VERTICAL_SPACE.iter().copied()),
            "title" | "titlecase" => return class_from_regex(r"\p{Lt}").map(found),
            "hyphen" => {
                return Some(PropertyLookup::Found {
                    set: CodepointSet::from_ranges(HYPHENS.iter().copied()),
                    deprecated: Some(HYPHEN_DEPRECATION),
                });
            }
            _ => {
                let (ascii, rest) = if let Some(rest) = loose.strip_prefix("xposix") {
                    (false, rest)
                } else if let Some(rest) = loose.strip_prefix("posix") {
                    (true, rest)
                } else {
                    (false, loose)
                };
                let class = PosixClass::from_name(rest)?;
                if class == PosixClass::Cased {
                    return None;
                }
                self.posix_class(class, ascii)
            }
        };
        Some(found(set))
    }
}

impl UnicodeData for StandardUnicode {
    fn property(&self, name: &str, value: Option<&str>) -> PropertyLookup {
        if !is_safe(name) || value.is_some_and(|v| !is_safe(v)) {
            return PropertyLookup::Unknown;
        }
        let loose_name = loose(name);

        if let Some(value) = value {
            if matches!(loose_name.as_str(), "block" | "blk") {
                return block(&loose(value)).map_or(PropertyLookup::Unknown, found);
            }
            return class_from_regex(&format!(r"\p{{{name}={value}}}"))
                .map_or(PropertyLookup::Unknown, found);
        }

        if let Some(hit) = self.extension(name, &loose_name) {
            return hit;
        }
        if let Some(set) = class_from_regex(&format!(r"\p{{{name}}}")) {
            return found(set);
        }
        if let Some(rest) = loose_name.strip_prefix("is") {
            if let Some(hit) = self.extension(name, rest) {
                return hit;
            }
            if let Some(set) = class_from_regex(&format!(r"\p{{{rest}}}")) {
                return found(set);
            }
        }
        if let Some(rest) = loose_name.strip_prefix("in")
            && let Some(set) = block(rest)
        {
            return found(set);
        }
        if is_user_defined(name) {
            return PropertyLookup::Deferred;
        }
        PropertyLookup::Unknown
    }

    fn property_values(&self, name: &str) -> Option<Vec<&'static str>> {
        let values: &[&'static str] = match loose(name).as_str() {
            "gc" | "generalcategory" | "category" => GENERAL_CATEGORIES,
            "sc" | "script" | "scx" | "scriptextensions" => SCRIPTS,
            "age" => AGES,
            _ => return None,
        };
        Some(values.to_vec())
    }

    fn posix_class(&self, class: PosixClass, ascii_only: bool) -> CodepointSet {
        if ascii_only {
            class.ascii_set()
        } else {
            self.unicode_posix(class).clone()
        }
    }

    fn simple_folds(&self, cp: u32) -> CodepointSet {
        let Some(c) = char::from_u32(cp) else {
            return CodepointSet::single(cp);
        };
        let mut class = ClassUnicode::new([ClassUnicodeRange::new(c, c)]);
        if class.try_case_fold_simple().is_err() {
            return CodepointSet::single(cp);
        }
        unicode_ranges(&class)
    }

    fn fold_closure(&self, set: &CodepointSet) -> CodepointSet {
        let mut class = ClassUnicode::new(set.ranges().iter().flat_map(|&(lo, hi)| {
            [(lo, hi.min(0xD7FF)), (lo.max(0xE000), hi)]
                .into_iter()
                .filter(|(a, b)| a <= b)
                .filter_map(|(a, b)| {
                    Some(ClassUnicodeRange::new(char::from_u32(a)?, char::from_u32(b)?))
                })
        }));
        if class.try_case_fold_simple().is_err() {
            return set.clone();
        }
        unicode_ranges(&class).union(set)
    }
}

fn found(set: CodepointSet) -> PropertyLookup {
    PropertyLookup::Found {
        set,
        deprecated: None,
    }
}

/// Loose form: lowercase, without blanks, `_` and `-`.
fn loose(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '_' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Characters that cannot break out of the `\p{...}` we hand to regex-syntax.
fn is_safe(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-' | '.' | '&' | ':'))
}

/// `IsFoo`, `InFoo` and package-qualified names may be defined later by the
/// host.
fn is_user_defined(name: &str) -> bool {
    if name.contains("::") {
        return true;
    }
    let bytes = name.as_bytes();
    bytes.len() > 2
        && (name.starts_with("Is") || name.starts_with("In"))
        && bytes[2].is_ascii_uppercase()
}

fn block(loose_name: &str) -> Option<CodepointSet> {
    BLOCKS
        .iter()
        .find(|(n, _, _)| n.replace(' ', "") == loose_name)
        .map(|&(_, lo, hi)| CodepointSet::range(lo, hi))
}

fn class_from_regex(pattern: &str) -> Option<CodepointSet> {
    let hir = ParserBuilder::new()
        .unicode(true)
        .utf8(true)
        .build()
        .parse(pattern)
        .ok()?;
    match hir.kind() {
        HirKind::Class(Class::Unicode(class)) => Some(unicode_ranges(class)),
        HirKind::Class(Class::Bytes(class)) => Some(CodepointSet::from_ranges(
            class
                .ranges()
                .iter()
                .map(|r| (u32::from(r.start()), u32::from(r.end()))),
        )),
        HirKind::Literal(lit) => {
            let text = std::str::from_utf8(&lit.0).ok()?;
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(CodepointSet::single(c as u32)),
                _ => None,
            }
        }
        _ => None,
    }
}

fn unicode_ranges(class: &ClassUnicode) -> CodepointSet {
    CodepointSet::from_ranges(
        class
            .ranges()
            .iter()
            .map(|r| (r.start() as u32, r.end() as u32)),
    )
}
