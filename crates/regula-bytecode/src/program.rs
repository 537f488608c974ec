//! The compiled program and its derived metadata.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regula_core::{CodepointSet, PosixClass, PropertyResolver};
use serde::Serialize;
use thiserror::Error;

use crate::flags::ProgramFlags;
use crate::node::{Encoding, Node, Nodes};
use crate::opcode::{Opcode, Operands};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode {byte} at offset {offset}")]
    InvalidOpcode { offset: usize, byte: u8 },

    #[error("node at offset {offset} runs past the end of the program")]
    Truncated { offset: usize },

    #[error("node at offset {offset} links outside the program (target {target})")]
    DanglingNext { offset: usize, target: usize },
}

/// Leading anchor classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    #[default]
    None,
    /// Start of string (`\A`, or `^` without multiline).
    Sbol,
    /// Start of any line.
    Mbol,
    /// The `\G` position.
    Gpos,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Anchoring {
    pub kind: Anchor,
    /// Derived from a leading `.*` rather than spelled out.
    pub implicit: bool,
}

/// A literal present in every match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequiredSubstring {
    pub text: String,
    pub min_offset: usize,
    /// `None` when the offset window is unbounded.
    pub max_offset: Option<usize>,
    /// The substring is immediately followed by an end-of-string anchor.
    pub before_end: bool,
}

impl RequiredSubstring {
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_fixed(&self) -> bool {
        self.max_offset == Some(self.min_offset)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstrCheck {
    Fixed,
    Floating,
}

/// Predicate on the first matched character.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartClass {
    /// Every match begins with this node.
    Node(usize),
    /// Synthesized across branches.
    Set(CodepointSet),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StudyInfo {
    pub min_len: usize,
    /// `None` when unbounded.
    pub max_len: Option<usize>,
    pub anchor: Anchoring,
    pub fixed: Option<RequiredSubstring>,
    pub floating: Option<RequiredSubstring>,
    /// Which substring the matcher checks first.
    pub check: Option<SubstrCheck>,
    pub start_class: Option<StartClass>,
}

/// Capture-group identity tables.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Captures {
    /// Physical groups, excluding the implicit group 0.
    pub physical: u32,
    pub logical: u32,
    /// Indexed by physical number; entry 0 is group 0.
    pub physical_to_logical: Vec<u32>,
    /// First physical group of each logical number.
    pub logical_to_physical: Vec<u32>,
    /// Next physical group sharing the same logical number, 0 when none.
    pub next_physical: Vec<u32>,
    pub names: IndexMap<String, Vec<u32>>,
}

impl Captures {
    /// Physical groups a logical number resolves to, in source order.
    pub fn physicals_of(&self, logical: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut p = self
            .logical_to_physical
            .get(logical as usize)
            .copied()
            .unwrap_or(0);
        while p != 0 {
            out.push(p);
            p = self.next_physical.get(p as usize).copied().unwrap_or(0);
        }
        out
    }

    pub fn logical_of(&self, physical: u32) -> Option<u32> {
        self.physical_to_logical.get(physical as usize).copied()
    }

    pub fn name_index(&self, name: &str) -> Option<usize> {
        self.names.get_index_of(name)
    }
}

/// A user-defined property resolved on first use.
#[derive(Debug, Serialize)]
pub struct DeferredProperty {
    pub name: String,
    pub negated: bool,
    #[serde(skip)]
    resolved: OnceLock<Option<CodepointSet>>,
}

impl Clone for DeferredProperty {
    fn clone(&self) -> Self {
        let resolved = OnceLock::new();
        if let Some(v) = self.resolved.get() {
            let _ = resolved.set(v.clone());
        }
        Self {
            name: self.name.clone(),
            negated: self.negated,
            resolved,
        }
    }
}

impl PartialEq for DeferredProperty {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.negated == other.negated
    }
}

impl Eq for DeferredProperty {}

impl DeferredProperty {
    pub fn new(name: impl Into<String>, negated: bool) -> Self {
        Self {
            name: name.into(),
            negated,
            resolved: OnceLock::new(),
        }
    }

    /// Resolves at most once; racing callers all observe the first result.
    pub fn resolve(&self, resolver: &dyn PropertyResolver) -> Option<&CodepointSet> {
        self.resolved
            .get_or_init(|| {
                let set = resolver.resolve(&self.name)?;
                Some(if self.negated { set.complement() } else { set })
            })
            .as_ref()
    }

    pub fn get(&self) -> Option<&CodepointSet> {
        self.resolved.get().and_then(Option::as_ref)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

/// Side-table entry of a class node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClassData {
    /// Members at or above 256.
    pub above: CodepointSet,
    /// Members that match only when the target is UTF-8.
    pub utf8_only: CodepointSet,
    /// POSIX classes tested against the run-time locale (`true` = negated).
    pub locale_classes: Vec<(PosixClass, bool)>,
    pub deferred: Option<DeferredProperty>,
}

/// Number of passes and the restarts that caused them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CompileStats {
    pub passes: u8,
    pub restarts: Vec<RestartKind>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartKind {
    /// A code point above 0xFF forced UTF-8 literals.
    Upgrade,
    /// A forward or ambiguous group reference needed the total group count.
    CountGroups,
    /// A next distance overflowed the narrow header.
    WideLinks,
}

/// Everything the compiler hands over to build a [`Program`].
#[derive(Debug, Default)]
pub struct ProgramParts {
    pub code: Vec<u32>,
    pub encoding: Encoding,
    pub study: StudyInfo,
    pub flags: ProgramFlags,
    pub captures: Captures,
    pub classes: Vec<ClassData>,
    pub verb_args: Vec<String>,
    pub rendering: String,
    pub stats: CompileStats,
}

/// A compiled, immutable program.
#[derive(Debug)]
pub struct Program {
    parts: ProgramParts,
}

impl Program {
    pub fn from_parts(parts: ProgramParts) -> Result<Self, DecodeError> {
        validate(&parts.code, parts.encoding)?;
        Ok(Self { parts })
    }

    pub fn code(&self) -> &[u32] {
        &self.parts.code
    }

    pub fn encoding(&self) -> Encoding {
        self.parts.encoding
    }

    pub fn node(&self, offset: usize) -> Node<'_> {
        Node::new(&self.parts.code, offset, self.parts.encoding)
    }

    pub fn nodes(&self) -> Nodes<'_> {
        Nodes::new(&self.parts.code, self.parts.encoding)
    }

    /// Total size in slots.
    pub fn len(&self) -> usize {
        self.parts.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.code.is_empty()
    }

    pub fn study(&self) -> &StudyInfo {
        &self.parts.study
    }

    pub fn min_len(&self) -> usize {
        self.parts.study.min_len
    }

    pub fn max_len(&self) -> Option<usize> {
        self.parts.study.max_len
    }

    pub fn flags(&self) -> ProgramFlags {
        self.parts.flags
    }

    pub fn captures(&self) -> &Captures {
        &self.parts.captures
    }

    pub fn physical_groups(&self) -> u32 {
        self.parts.captures.physical
    }

    pub fn logical_groups(&self) -> u32 {
        self.parts.captures.logical
    }

    pub fn names(&self) -> &IndexMap<String, Vec<u32>> {
        &self.parts.captures.names
    }

    pub fn class_data(&self, index: u32) -> Option<&ClassData> {
        self.parts.classes.get(index as usize)
    }

    pub fn classes(&self) -> &[ClassData] {
        &self.parts.classes
    }

    pub fn verb_arg(&self, index: u32) -> Option<&str> {
        self.parts.verb_args.get(index as usize).map(String::as_str)
    }

    pub fn rendering(&self) -> &str {
        &self.parts.rendering
    }

    pub fn stats(&self) -> &CompileStats {
        &self.parts.stats
    }

    /// Resolves every deferred property reference. Returns how many are
    /// now resolved; safe to call repeatedly and from several threads.
    pub fn resolve_deferred(&self, resolver: &dyn PropertyResolver) -> usize {
        self.parts
            .classes
            .iter()
            .filter_map(|c| c.deferred.as_ref())
            .filter(|d| d.resolve(resolver).is_some())
            .count()
    }

    pub fn checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for word in &self.parts.code {
            hasher.update(&word.to_le_bytes());
        }
        hasher.finalize()
    }

    pub fn summary(&self) -> ProgramSummary {
        let study = &self.parts.study;
        ProgramSummary {
            rendering: self.parts.rendering.clone(),
            slots: self.parts.code.len(),
            checksum: self.checksum(),
            utf8: self.parts.encoding.utf8,
            wide_links: self.parts.encoding.wide_links,
            min_len: study.min_len,
            max_len: study.max_len,
            anchor: study.anchor,
            fixed: study.fixed.clone(),
            floating: study.floating.clone(),
            check: study.check,
            start_class: study.start_class.as_ref().map(|sc| match sc {
                StartClass::Node(offset) => {
                    format!("{} @{offset}", self.node(*offset).opcode().name())
                }
                StartClass::Set(set) => set.to_string(),
            }),
            flags: self.parts.flags.names(),
            physical_groups: self.parts.captures.physical,
            logical_groups: self.parts.captures.logical,
            names: self.parts.captures.names.clone(),
            passes: self.parts.stats.passes,
            restarts: self.parts.stats.restarts.clone(),
        }
    }
}

/// Serializable overview of a program.
#[derive(Clone, Debug, Serialize)]
pub struct ProgramSummary {
    pub rendering: String,
    pub slots: usize,
    pub checksum: u32,
    pub utf8: bool,
    pub wide_links: bool,
    pub min_len: usize,
    pub max_len: Option<usize>,
    pub anchor: Anchoring,
    pub fixed: Option<RequiredSubstring>,
    pub floating: Option<RequiredSubstring>,
    pub check: Option<SubstrCheck>,
    pub start_class: Option<String>,
    pub flags: Vec<String>,
    pub physical_groups: u32,
    pub logical_groups: u32,
    pub names: IndexMap<String, Vec<u32>>,
    pub passes: u8,
    pub restarts: Vec<RestartKind>,
}

/// Checks that `code` is a well-formed sequence of nodes.
pub fn validate(code: &[u32], encoding: Encoding) -> Result<(), DecodeError> {
    let mut offset = 0;
    while offset < code.len() {
        let byte = code[offset] as u8;
        let op = Opcode::from_u8(byte).ok_or(DecodeError::InvalidOpcode { offset, byte })?;
        let header = encoding.header_words();
        if offset + header > code.len() {
            return Err(DecodeError::Truncated { offset });
        }
        let str_len = if op.operands() == Operands::Str {
            *code
                .get(offset + header)
                .ok_or(DecodeError::Truncated { offset })? as usize
        } else {
            0
        };
        let size = encoding.node_words(op, str_len);
        if offset + size > code.len() {
            return Err(DecodeError::Truncated { offset });
        }
        let next = encoding.read_next(code, offset);
        if next != 0 && offset + next >= code.len() {
            return Err(DecodeError::DanglingNext {
                offset,
                target: offset + next,
            });
        }
        offset += size;
    }
    Ok(())
}
