//! Token cursor and line tokenization
//!
//! Arguments never see the raw command line. The line is split into tokens once per invocation
//! and every argument reads those tokens through a shared [`TokenCursor`]. The cursor is the unit
//! of backtracking: combinators take a [`CursorSnapshot`] before trying a child and restore it
//! when the attempt must be undone.

use crate::ARGUMENTS_SEPARATOR;

/// Splits a complete command line into tokens
///
/// Tokens are separated by any amount of whitespace, empty tokens are dropped. This is the
/// tokenization used when a command is executed.
///
/// ```
/// use cmdargs::tokens::tokenize_line;
///
/// assert_eq!(tokenize_line("  tp 3   4 "), vec!["tp", "3", "4"]);
/// assert!(tokenize_line("").is_empty());
/// ```
pub fn tokenize_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Splits a partially typed command line into tokens for tab completion
///
/// Unlike [`tokenize_line`], this keeps empty tokens: the last token is the one being completed
/// and it is empty if the line ends with a separator.
///
/// ```
/// use cmdargs::tokens::tokenize_partial_line;
///
/// assert_eq!(tokenize_partial_line("tp 3 "), vec!["tp", "3", ""]);
/// assert_eq!(tokenize_partial_line(""), vec![""]);
/// ```
pub fn tokenize_partial_line(line: &str) -> Vec<String> {
    line.split(ARGUMENTS_SEPARATOR).map(str::to_string).collect()
}

/// Saved position of a [`TokenCursor`]
///
/// Snapshots are cheap to copy. A snapshot taken from one cursor can be restored onto any cursor
/// over a token list of the same length, which is how adjusted copies of a cursor report their
/// progress back (see [`TokenCursor::with_token_replaced`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CursorSnapshot(usize);

impl CursorSnapshot {
    /// Returns the index of the next unread token at the time the snapshot was taken.
    pub fn position(self) -> usize {
        self.0
    }
}

/// Immutable list of tokens together with a read position
///
/// The tokens never change once the cursor is created; only the position moves. The position can
/// be moved forward with [`next`](TokenCursor::next) and reset with
/// [`restore`](TokenCursor::restore), there is no other way to mutate it.
///
/// ```
/// use cmdargs::tokens::TokenCursor;
///
/// let mut cursor = TokenCursor::new(["tp", "3", "4"]);
/// let snapshot = cursor.snapshot();
/// assert_eq!(cursor.next(), Some("tp"));
/// assert_eq!(cursor.peek(), Some("3"));
/// assert_eq!(cursor.remaining_count(), 2);
///
/// cursor.restore(snapshot);
/// assert_eq!(cursor.peek(), Some("tp"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCursor {
    tokens: Vec<String>,
    position: usize,
}

impl TokenCursor {
    /// Creates a new cursor positioned before the first token.
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        TokenCursor {
            tokens: tokens.into_iter().map(Into::into).collect(),
            position: 0,
        }
    }

    /// Returns `true` if there is at least one unread token.
    pub fn has_next(&self) -> bool {
        self.position < self.tokens.len()
    }

    /// Returns the next unread token without consuming it.
    pub fn peek(&self) -> Option<&str> {
        self.tokens.get(self.position).map(String::as_str)
    }

    /// Returns the next unread token if it is also the last token of the input.
    ///
    /// This is the token completion suggestions are produced for.
    pub fn final_token(&self) -> Option<&str> {
        if self.remaining_count() == 1 {
            self.peek()
        } else {
            None
        }
    }

    /// Consumes and returns the next token, or returns `None` without moving if the cursor is
    /// exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&str> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token.as_str())
    }

    /// Returns the number of unread tokens.
    pub fn remaining_count(&self) -> usize {
        self.tokens.len() - self.position
    }

    /// Returns the unread tokens.
    pub fn remaining(&self) -> &[String] {
        &self.tokens[self.position..]
    }

    /// Returns all tokens, including the ones that were already consumed.
    pub fn all_tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Returns the index of the next unread token.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Captures the current position.
    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot(self.position)
    }

    /// Resets the position to a previously captured snapshot.
    ///
    /// Snapshots pointing past the end of this cursor's token list are clamped to its end.
    pub fn restore(&mut self, snapshot: CursorSnapshot) {
        self.position = snapshot.0.min(self.tokens.len());
    }

    /// Returns the tokens consumed since `snapshot` was taken.
    ///
    /// Returns an empty slice if the cursor is at or before the snapshot's position.
    pub fn consumed_since(&self, snapshot: CursorSnapshot) -> &[String] {
        let start = snapshot.0.min(self.position);
        &self.tokens[start..self.position]
    }

    /// Returns a copy of this cursor, at the same position, in which the next unread token is
    /// replaced by `token`.
    ///
    /// Returns `None` if the cursor is exhausted.
    pub fn with_token_replaced(&self, token: impl Into<String>) -> Option<TokenCursor> {
        if !self.has_next() {
            return None;
        }
        let mut tokens = self.tokens.clone();
        tokens[self.position] = token.into();
        Some(TokenCursor {
            tokens,
            position: self.position,
        })
    }
}
