//! Cursor over pattern text.
//!
//! Positions are byte offsets. The text is shared so the class engine can
//! swap in synthesized pattern text and swap the original back afterwards.

use std::rc::Rc;

use rowan::{TextRange, TextSize};

#[derive(Clone, Debug)]
pub(crate) struct Source {
    text: Rc<str>,
    pos: usize,
}

impl Source {
    pub fn new(text: impl Into<Rc<str>>) -> Self {
        Self {
            text: text.into(),
            pos: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(self.text.is_char_boundary(pos));
        self.pos = pos;
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Character `n` positions ahead (0 = `peek`).
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Consumes characters while `pred` holds and returns them.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.text[start..self.pos]
    }

    /// Text up to (not including) the first `c`, consuming it and the `c`.
    /// Leaves the cursor alone when `c` never appears.
    pub fn eat_until(&mut self, c: char) -> Option<&str> {
        let start = self.pos;
        let len = self.rest().find(c)?;
        self.pos += len + c.len_utf8();
        Some(&self.text[start..start + len])
    }

    pub fn slice(&self, start: usize, end: usize) -> &str {
        &self.text[start..end]
    }

    pub fn range(&self, start: usize, end: usize) -> TextRange {
        TextRange::new(to_size(start), to_size(end))
    }
}

fn to_size(pos: usize) -> TextSize {
    TextSize::from(u32::try_from(pos).unwrap_or(u32::MAX))
}
