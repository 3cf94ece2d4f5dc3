use super::{starts_with_ignore_case, ArgumentName};
use crate::error::ArgumentError;
use crate::{
    Argument, ArgumentInfo, ArgumentValue, CommandContext, CommandInput, ContextView, ParseResult,
    TokenCursor, ARGUMENTS_SEPARATOR,
};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

/// Fixed keyword
///
/// Matches a single token equal to the literal, ignoring ASCII case. A literal is part of the
/// command's syntax rather than data: its value (the literal itself) is returned but never stored
/// in the context. Its format is the literal without brackets.
///
/// ```
/// use cmdargs::arguments::Literal;
/// use cmdargs::{Argument, ArgumentInfo, CommandContext, CommandInput, TokenCursor};
///
/// let literal = Literal::new("tp");
/// let mut context = CommandContext::new();
/// let mut cursor = TokenCursor::new(["TP"]);
/// let value = literal.parse(&CommandInput::new(()), &mut context, &mut cursor).unwrap();
/// assert_eq!(value, Some("tp".to_string()));
/// assert!(context.is_empty());
/// assert_eq!(literal.format(), "tp");
/// ```
#[derive(Debug, Clone)]
pub struct Literal {
    name: ArgumentName,
    literal: String,
}

impl Literal {
    pub fn new(literal: impl Into<String>) -> Self {
        let literal = literal.into();
        Literal {
            name: ArgumentName::new(literal.clone()),
            literal,
        }
    }

    /// Uses a name different from the literal itself.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = ArgumentName::new(name);
        self
    }
}

impl ArgumentInfo for Literal {
    fn name(&self) -> &str {
        self.name.name()
    }

    fn reduced_format(&self) -> String {
        self.literal.clone()
    }

    fn format(&self) -> String {
        self.reduced_format()
    }
}

impl ArgumentValue for Literal {
    type Value = String;
}

impl<S> Argument<S> for Literal {
    fn parse(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
    ) -> ParseResult<String> {
        self.parse_value(input, context.view(), cursor)
    }

    fn parse_value(
        &self,
        _input: &CommandInput<S>,
        _context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<String> {
        let token = cursor
            .next()
            .ok_or_else(|| ArgumentError::missing(&self.literal))?;
        if token.eq_ignore_ascii_case(&self.literal) {
            Ok(Some(self.literal.clone()))
        } else {
            Err(ArgumentError::invalid(&self.literal, token, None).into())
        }
    }

    fn complete(
        &self,
        _input: &CommandInput<S>,
        _context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        match cursor.final_token() {
            Some(token) if starts_with_ignore_case(&self.literal, token) => {
                vec![self.literal.clone()]
            }
            _ => Vec::new(),
        }
    }
}

/// Integer of type `T`
///
/// Out of range values are reported as invalid input with a "too large" or "too small" reason.
pub struct Integer<T> {
    name: ArgumentName,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Integer<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Integer {
            name: ArgumentName::new(name),
            _phantom: PhantomData,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.name.set_display_name(display_name);
        self
    }
}

impl<T> fmt::Debug for Integer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Integer")
            .field("name", &self.name.name())
            .finish()
    }
}

impl<T> Clone for Integer<T> {
    fn clone(&self) -> Self {
        Integer {
            name: self.name.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T> ArgumentInfo for Integer<T> {
    fn name(&self) -> &str {
        self.name.name()
    }

    fn display_name(&self) -> &str {
        self.name.display_name()
    }
}

impl<T> ArgumentValue for Integer<T>
where
    T: Clone + 'static,
{
    type Value = T;
}

impl<S, T> Argument<S> for Integer<T>
where
    T: FromStr<Err = ParseIntError> + Clone + 'static,
{
    fn parse_value(
        &self,
        _input: &CommandInput<S>,
        _context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<T> {
        let token = cursor
            .next()
            .ok_or_else(|| ArgumentError::missing(self.display_name()))?;
        match token.parse() {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                let reason = match error.kind() {
                    IntErrorKind::PosOverflow => Some("too large"),
                    IntErrorKind::NegOverflow => Some("too small"),
                    _ => None,
                };
                Err(ArgumentError::invalid(
                    self.display_name(),
                    token,
                    reason.map(Cow::Borrowed),
                )
                .into())
            }
        }
    }

    fn complete(
        &self,
        _input: &CommandInput<S>,
        _context: ContextView<'_>,
        _cursor: &mut TokenCursor,
    ) -> Vec<String> {
        Vec::new()
    }
}

/// Free-form text
///
/// By default a single token is consumed. With [`join_remaining`](Text::join_remaining) every
/// remaining token is consumed and the tokens are joined with [`ARGUMENTS_SEPARATOR`].
#[derive(Debug, Clone)]
pub struct Text {
    name: ArgumentName,
    join_remaining: bool,
}

impl Text {
    pub fn new(name: impl Into<String>) -> Self {
        Text {
            name: ArgumentName::new(name),
            join_remaining: false,
        }
    }

    pub fn join_remaining(mut self) -> Self {
        self.join_remaining = true;
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.name.set_display_name(display_name);
        self
    }
}

impl ArgumentInfo for Text {
    fn name(&self) -> &str {
        self.name.name()
    }

    fn display_name(&self) -> &str {
        self.name.display_name()
    }
}

impl ArgumentValue for Text {
    type Value = String;
}

impl<S> Argument<S> for Text {
    fn parse_value(
        &self,
        _input: &CommandInput<S>,
        _context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<String> {
        if !cursor.has_next() {
            return Err(ArgumentError::missing(self.display_name()).into());
        }
        if self.join_remaining {
            let text = cursor.remaining().join(ARGUMENTS_SEPARATOR);
            while cursor.next().is_some() {}
            Ok(Some(text))
        } else {
            Ok(cursor.next().map(str::to_string))
        }
    }

    fn complete(
        &self,
        _input: &CommandInput<S>,
        _context: ContextView<'_>,
        _cursor: &mut TokenCursor,
    ) -> Vec<String> {
        Vec::new()
    }
}

const TRUE_WORDS: [&str; 4] = ["true", "yes", "on", "y"];
const FALSE_WORDS: [&str; 4] = ["false", "no", "off", "n"];

/// Boolean flag value
///
/// Accepts `true`, `yes`, `on`, `y` and `false`, `no`, `off`, `n` ignoring ASCII case. Completion
/// offers `true` and `false`.
#[derive(Debug, Clone)]
pub struct Boolean {
    name: ArgumentName,
}

impl Boolean {
    pub fn new(name: impl Into<String>) -> Self {
        Boolean {
            name: ArgumentName::new(name),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.name.set_display_name(display_name);
        self
    }
}

impl ArgumentInfo for Boolean {
    fn name(&self) -> &str {
        self.name.name()
    }

    fn display_name(&self) -> &str {
        self.name.display_name()
    }
}

impl ArgumentValue for Boolean {
    type Value = bool;
}

impl<S> Argument<S> for Boolean {
    fn parse_value(
        &self,
        _input: &CommandInput<S>,
        _context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<bool> {
        let token = cursor
            .next()
            .ok_or_else(|| ArgumentError::missing(self.display_name()))?;
        if TRUE_WORDS.iter().any(|word| token.eq_ignore_ascii_case(word)) {
            Ok(Some(true))
        } else if FALSE_WORDS.iter().any(|word| token.eq_ignore_ascii_case(word)) {
            Ok(Some(false))
        } else {
            Err(ArgumentError::invalid(self.display_name(), token, None).into())
        }
    }

    fn complete(
        &self,
        _input: &CommandInput<S>,
        _context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        let token = match cursor.final_token() {
            Some(token) => token,
            None => return Vec::new(),
        };
        ["true", "false"]
            .iter()
            .filter(|word| starts_with_ignore_case(word, token))
            .map(|word| word.to_string())
            .collect()
    }
}
