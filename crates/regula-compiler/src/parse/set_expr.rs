//! Extended bracketed character classes: `(?[ ... ])`.
//!
//! Operands are bracket classes, class escapes and nested `(?[ ])`;
//! operators are `!` (complement, prefix), `&` (intersection) and, one
//! level looser, `+` or `|` (union), `-` (difference) and `^` (symmetric
//! difference). Parentheses group. Unicode rules apply to every operand
//! whatever the charset outside, and blanks are insignificant throughout.

use regula_bytecode::Charset;
use regula_core::CodepointSet;

use super::{PResult, Parser, Piece};
use crate::class::{ClassBuilder, ClassItem};
use crate::diagnostics::DiagnosticKind;
use crate::trace::CompileTracer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SetOp {
    Union,
    Intersect,
    Subtract,
    SymmetricDiff,
    Not,
    /// An open parenthesis.
    Fence,
}

impl SetOp {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '+' | '|' => Self::Union,
            '&' => Self::Intersect,
            '-' => Self::Subtract,
            '^' => Self::SymmetricDiff,
            _ => return None,
        })
    }

    fn precedence(self) -> u8 {
        match self {
            Self::Not => 3,
            Self::Intersect => 2,
            Self::Union | Self::Subtract | Self::SymmetricDiff => 1,
            Self::Fence => 0,
        }
    }

    /// Pops and applies the operator to the top of `operands`.
    fn apply(self, operands: &mut Vec<CodepointSet>) -> Option<()> {
        let result = match self {
            Self::Not => operands.pop()?.complement(),
            Self::Fence => return None,
            _ => {
                let rhs = operands.pop()?;
                let lhs = operands.pop()?;
                match self {
                    Self::Union => lhs.union(&rhs),
                    Self::Intersect => lhs.intersection(&rhs),
                    Self::Subtract => lhs.difference(&rhs),
                    _ => lhs.symmetric_difference(&rhs),
                }
            }
        };
        operands.push(result);
        Some(())
    }
}

impl<T: CompileTracer> Parser<'_, T> {
    /// The cursor is on the `[` of `(?[`.
    pub(crate) fn parse_set_expression(&mut self, start: usize, depth: u32) -> PResult<Piece> {
        let saved = self.mode;
        self.mode.charset = Charset::Unicode;
        self.mode.extended = true;
        self.mode.extended_more = true;
        let result = self.set_expression(start, depth);
        self.mode = saved;

        let mut set = result?;
        if self.mode.fold {
            set = self.opts.unicode.fold_closure(&set);
        }
        self.finish_class(ClassBuilder::from_set(start, set), depth)
    }

    /// Evaluates up to and including the closing `])`.
    fn set_expression(&mut self, start: usize, depth: u32) -> PResult<CodepointSet> {
        self.src.bump();
        let mut operands: Vec<CodepointSet> = Vec::new();
        let mut ops: Vec<SetOp> = Vec::new();
        let mut want_operand = true;

        loop {
            self.skip_ignorable()?;
            let pos = self.src.pos();
            let Some(c) = self.src.peek() else {
                let end = self.src.text().len();
                return Err(self.error_msg(
                    DiagnosticKind::UnterminatedConstruct,
                    start,
                    end,
                    "set expression is missing its closing `])`",
                ));
            };

            if want_operand {
                match c {
                    '!' => {
                        self.src.bump();
                        ops.push(SetOp::Not);
                    }
                    '(' if self.src.starts_with("(?[") => {
                        self.src.set_pos(pos + 2);
                        let inner = self.enter(depth)?;
                        let set = self.set_expression(pos, inner)?;
                        operands.push(set);
                        want_operand = false;
                    }
                    '(' => {
                        self.src.bump();
                        ops.push(SetOp::Fence);
                    }
                    '[' => {
                        let b = self.parse_bracket_builder()?;
                        let end = self.src.pos();
                        operands.push(self.raw_set(b, end)?);
                        want_operand = false;
                    }
                    '\\' => {
                        let mut b = ClassBuilder::new(pos);
                        if let ClassItem::Char(cp) = self.class_escape(&mut b)? {
                            b.add_char(cp);
                        }
                        let end = self.src.pos();
                        operands.push(self.raw_set(b, end)?);
                        want_operand = false;
                    }
                    _ => return Err(self.set_error(pos, "operand expected")),
                }
                continue;
            }

            match c {
                ']' => {
                    self.src.bump();
                    if !self.src.eat(')') {
                        return Err(self.set_error(pos, "`]` must be followed by `)`"));
                    }
                    break;
                }
                ')' => {
                    self.src.bump();
                    loop {
                        match ops.pop() {
                            Some(SetOp::Fence) => break,
                            Some(op) => {
                                if op.apply(&mut operands).is_none() {
                                    return Err(self.set_error(pos, "operand expected"));
                                }
                            }
                            None => return Err(self.set_error(pos, "unexpected `)`")),
                        }
                    }
                }
                _ => {
                    let Some(op) = SetOp::from_char(c) else {
                        return Err(self.set_error(pos, "unknown operator"));
                    };
                    self.src.bump();
                    while let Some(&top) = ops.last() {
                        if top == SetOp::Fence || top.precedence() < op.precedence() {
                            break;
                        }
                        ops.pop();
                        if top.apply(&mut operands).is_none() {
                            return Err(self.set_error(pos, "operand expected"));
                        }
                    }
                    ops.push(op);
                    want_operand = true;
                }
            }
        }

        let end = self.src.pos();
        while let Some(op) = ops.pop() {
            if op == SetOp::Fence {
                return Err(self.set_error(end - 2, "unbalanced `(`"));
            }
            if op.apply(&mut operands).is_none() {
                return Err(self.set_error(end - 2, "operand expected"));
            }
        }
        match (operands.pop(), operands.is_empty()) {
            (Some(set), true) => Ok(set),
            _ => Err(self.set_error(start, "operand expected")),
        }
    }

    fn set_error(&mut self, pos: usize, msg: &str) -> super::Abort {
        let end = self.src.pos().max(pos + 1).min(self.src.text().len());
        self.error_msg(DiagnosticKind::InvalidSetExpression, pos, end, msg)
    }
}
