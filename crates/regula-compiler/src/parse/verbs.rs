//! `(*VERB)`, `(*VERB:arg)`, `(*:arg)` and the alphabetic assertions
//! such as `(*pla:...)`.

use logos::Logos;
use regula_bytecode::{NO_AUX, Opcode, ProgramFlags};

use super::group::Lookaround;
use super::{PResult, Parser, Piece};
use crate::diagnostics::DiagnosticKind;
use crate::trace::CompileTracer;

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
enum VerbName {
    #[token("ACCEPT")]
    Accept,
    #[token("COMMIT")]
    Commit,
    #[token("PRUNE")]
    Prune,
    #[token("SKIP")]
    Skip,
    #[token("THEN")]
    Then,
    #[token("MARK")]
    Mark,
    #[token("FAIL")]
    #[token("F")]
    Fail,

    #[token("pla")]
    #[token("positive_lookahead")]
    PositiveLookahead,
    #[token("nla")]
    #[token("negative_lookahead")]
    NegativeLookahead,
    #[token("plb")]
    #[token("positive_lookbehind")]
    PositiveLookbehind,
    #[token("nlb")]
    #[token("negative_lookbehind")]
    NegativeLookbehind,
    #[token("atomic")]
    Atomic,
    #[token("sr")]
    #[token("script_run")]
    ScriptRun,
    #[token("asr")]
    #[token("atomic_script_run")]
    AtomicScriptRun,
}

impl VerbName {
    /// The whole of `name`, or nothing.
    fn lookup(name: &str) -> Option<Self> {
        let mut lex = VerbName::lexer(name);
        match lex.next() {
            Some(Ok(verb)) if lex.span().end == name.len() => Some(verb),
            _ => None,
        }
    }

    /// Takes a subpattern after `:` rather than an argument.
    fn is_assertion(self) -> bool {
        !matches!(
            self,
            Self::Accept | Self::Commit | Self::Prune | Self::Skip | Self::Then | Self::Mark | Self::Fail
        )
    }
}

impl<T: CompileTracer> Parser<'_, T> {
    /// The cursor is after `(*`.
    pub(crate) fn parse_verb(&mut self, start: usize, depth: u32) -> PResult<Piece> {
        let name = self
            .src
            .eat_while(|c| c.is_ascii_alphanumeric() || c == '_')
            .to_string();
        let verb = VerbName::lookup(&name);
        let has_colon = self.src.eat(':');

        if let Some(verb) = verb.filter(|v| v.is_assertion()) {
            if !has_colon {
                let end = self.src.pos();
                return Err(self.error_msg(
                    DiagnosticKind::VerbArgumentRequired,
                    start,
                    end,
                    format!("`(*{name}` needs a subpattern after `:`"),
                ));
            }
            return match verb {
                VerbName::PositiveLookahead => self.lookaround(start, depth, Lookaround::Ahead),
                VerbName::NegativeLookahead => self.lookaround(start, depth, Lookaround::NotAhead),
                VerbName::PositiveLookbehind => self.lookaround(start, depth, Lookaround::Behind),
                VerbName::NegativeLookbehind => {
                    self.lookaround(start, depth, Lookaround::NotBehind)
                }
                VerbName::Atomic => self.atomic(start, depth),
                VerbName::ScriptRun => self.script_run(start, depth, false),
                _ => self.script_run(start, depth, true),
            };
        }

        let arg = if has_colon {
            match self.src.eat_until(')') {
                Some(arg) => Some(arg.to_string()),
                None => return Err(self.unterminated_verb(start)),
            }
        } else if self.src.eat(')') {
            None
        } else if self.src.is_eof() {
            return Err(self.unterminated_verb(start));
        } else {
            let end = self
                .src
                .rest()
                .find(')')
                .map_or(self.src.text().len(), |i| self.src.pos() + i + 1);
            return Err(self.error_msg(DiagnosticKind::UnknownVerb, start, end, name));
        };
        let end = self.src.pos();
        let arg = arg.filter(|a| !a.is_empty());

        let verb = match verb {
            Some(verb) => verb,
            None if name.is_empty() && has_colon => VerbName::Mark,
            None => return Err(self.error_msg(DiagnosticKind::UnknownVerb, start, end, name)),
        };
        self.seen |= ProgramFlags::VERBS;
        let aux = match &arg {
            Some(arg) => self.verb_arg(arg),
            None => NO_AUX,
        };

        let at = match verb {
            VerbName::Mark => {
                if arg.is_none() {
                    return Err(self.error_msg(
                        DiagnosticKind::VerbArgumentRequired,
                        start,
                        end,
                        "`(*MARK)` needs a name",
                    ));
                }
                self.push_arg1(Opcode::Mark, 0, aux)?
            }
            VerbName::Accept => self.push_arg1(Opcode::Accept, 0, aux)?,
            VerbName::Prune => self.push_arg1(Opcode::Prune, 0, aux)?,
            VerbName::Skip => self.push_arg1(Opcode::Skip, 0, aux)?,
            VerbName::Then => {
                self.seen |= ProgramFlags::CUTGROUP;
                self.push_arg1(Opcode::Then, 0, aux)?
            }
            VerbName::Commit => self.marked(arg.is_some(), aux, Opcode::Commit)?,
            _ => self.marked(arg.is_some(), aux, Opcode::OpFail)?,
        };
        Ok(Piece::zero_width(at))
    }

    /// `op`, preceded by a `Mark` carrying the argument when there is one.
    fn marked(&mut self, has_arg: bool, aux: u32, op: Opcode) -> PResult<usize> {
        if !has_arg {
            return self.push(op, 0);
        }
        let mark = self.push_arg1(Opcode::Mark, 0, aux)?;
        let at = self.push(op, 0)?;
        self.link(mark, at)?;
        Ok(mark)
    }

    fn unterminated_verb(&mut self, start: usize) -> super::Abort {
        let end = self.src.text().len();
        self.error_msg(
            DiagnosticKind::UnterminatedConstruct,
            start,
            end,
            "verb is missing its closing `)`",
        )
    }

    /// `(*sr:...)` and `(*asr:...)`.
    fn script_run(&mut self, start: usize, depth: u32, atomic: bool) -> PResult<Piece> {
        let open = self.push(Opcode::ScriptRunOpen, 0)?;
        let alt = self.group_body(start, depth, false)?;
        let close = self.push(Opcode::ScriptRunClose, 0)?;
        self.link(open, alt.piece.start)?;
        self.close_alternation(&alt, close)?;
        if atomic {
            self.wrap_atomic(open)?;
        }
        Ok(Piece::new(
            open,
            alt.piece.min,
            alt.piece.max,
            alt.piece.flags & super::PieceFlags::POSTPONED,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::VerbName;

    #[test]
    fn lookup_needs_whole_name() {
        assert_eq!(VerbName::lookup("F"), Some(VerbName::Fail));
        assert_eq!(VerbName::lookup("FAIL"), Some(VerbName::Fail));
        assert_eq!(VerbName::lookup("FAILS"), None);
        assert_eq!(VerbName::lookup("atomic_script_run"), Some(VerbName::AtomicScriptRun));
        assert_eq!(VerbName::lookup("atomic"), Some(VerbName::Atomic));
        assert_eq!(VerbName::lookup("commit"), None);
        assert_eq!(VerbName::lookup(""), None);
    }
}
