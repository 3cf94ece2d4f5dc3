//! `cmdargs` parses interactive command input with small composable argument parsers
//!
//! A command is described as a list of arguments. Each argument consumes tokens from a shared
//! [`TokenCursor`] and records the value it parsed in a [`CommandContext`] under its name.
//! Arguments compose: [`Sequence`](arguments::Sequence) runs children one after another,
//! [`FirstOf`](arguments::FirstOf) tries alternatives, [`Optional`](arguments::Optional),
//! [`Transform`](arguments::Transform) and [`Named`](arguments::Named) wrap a single child, and the
//! [`ObjectId`](arguments::ObjectId) / [`ObjectById`](arguments::ObjectById) pair resolves textual
//! identifiers to application objects through injected lookups.
//!
//! # Example
//!
//! ```
//! use cmdargs::arguments::{Integer, Literal};
//! use cmdargs::{ArgumentExt, Command, CommandInput};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let command: Command<()> = Command::new(vec![
//!     Literal::new("tp").erased(),
//!     Integer::<i32>::new("x").erased(),
//!     Integer::<i32>::new("y").erased(),
//! ])?;
//! let input = CommandInput::new(());
//!
//! let context = command.parse_line(&input, "tp 3 4")?;
//! assert_eq!(context.get::<i32>("x"), Some(&3));
//! assert_eq!(context.get::<i32>("y"), Some(&4));
//!
//! assert_eq!(command.usage(), "tp <x> <y>");
//! assert_eq!(command.complete_line(&input, "t"), vec!["tp".to_string()]);
//! # Ok(())
//! # }
//! ```
//!
//! # Fallbacks
//!
//! Some arguments can produce a value even when the user did not type one: they fall back to a
//! default, to a property of the invoker or to an object the invoker is looking at. Whether such
//! an argument applies often depends on the arguments that follow it. For instance, with arguments
//! `[shop?] <amount>` the input `5` must be read as the amount, with the shop falling back to the
//! one the invoker targets.
//!
//! Fallback-capable arguments therefore do not fail eagerly. When their primary strategy cannot
//! produce a value they return [`ParseFailure::Deferred`]. The [`Command`] holding them rewinds the
//! cursor, lets the following arguments run, and then calls
//! [`Argument::parse_fallback`] to let the deferred argument decide with full knowledge of what
//! happened. See [`arguments::FallbackArgument`] for the resolution policy.
//!
//! # Completion
//!
//! Every argument can suggest completions for the last token of the input with
//! [`Argument::complete`]. Composite arguments replay the parse of their children to find out which
//! child the last token belongs to. Suggestion lists are capped by
//! [`CommandInput::max_suggestions`].

pub mod arguments;
pub mod command;
pub mod context;
pub mod error;
pub mod input;
#[doc(hidden)]
pub mod testing;
pub mod tokens;

use arguments::{
    DefaultValue, FallbackArgument, InvokerValue, Named, Optional, TargetedValue, Transform,
};
pub use command::Command;
pub use context::{CommandContext, ContextView};
use error::{ArgumentError, DefinitionError, FallbackSignal, ParseFailure};
pub use input::CommandInput;
pub use tokens::TokenCursor;

/// Default maximum number of completion suggestions
pub const MAX_SUGGESTIONS: usize = 20;

/// Separator used to join tokens, for example in multi-token ids and usage strings
pub const ARGUMENTS_SEPARATOR: &str = " ";

/// The result of [`Argument::parse`] and [`Argument::parse_value`]
///
/// * `Ok(Some(value))`: the argument parsed a value;
/// * `Ok(None)`: the argument is absent. This is only returned by optional arguments and
///   alternatives and means "not applicable", not an error;
/// * `Err(ParseFailure::Error(_))`: the input is invalid;
/// * `Err(ParseFailure::Deferred(_))`: a fallback-capable argument postponed its decision.
pub type ParseResult<T> = Result<Option<T>, ParseFailure>;

/// The result of [`Argument::parse_fallback`]
///
/// The resolution pass cannot defer again, so its failure is always a concrete [`ArgumentError`].
pub type ResolveResult<T> = Result<Option<T>, ArgumentError>;

/// Renders the default format of an argument from its reduced format
///
/// Empty reduced formats stay empty, optional arguments are enclosed in square brackets and
/// required ones in angle brackets.
///
/// ```
/// use cmdargs::default_format;
///
/// assert_eq!(default_format("page", true), "[page]");
/// assert_eq!(default_format("page", false), "<page>");
/// assert_eq!(default_format("", false), "");
/// ```
pub fn default_format(reduced: &str, optional: bool) -> String {
    if reduced.is_empty() {
        String::new()
    } else if optional {
        format!("[{}]", reduced)
    } else {
        format!("<{}>", reduced)
    }
}

/// Joins argument formats with a delimiter, skipping empty ones
///
/// ```
/// use cmdargs::join_formats;
///
/// assert_eq!(join_formats(["<a>", "", "[b]"], " "), "<a> [b]");
/// assert_eq!(join_formats(["<a>", ""], " "), "<a>");
/// assert_eq!(join_formats(Vec::<String>::new(), "|"), "");
/// ```
pub fn join_formats<I, T>(formats: I, delimiter: &str) -> String
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut result = String::new();
    for format in formats {
        let format = format.as_ref();
        if format.is_empty() {
            continue;
        }
        if !result.is_empty() {
            result.push_str(delimiter);
        }
        result.push_str(format);
    }
    result
}

/// Identity and format of an argument
///
/// This part of the argument contract does not depend on the invoker or on the value type, which
/// keeps it usable through every kind of trait object.
pub trait ArgumentInfo {
    /// The name under which the argument stores its value in the [`CommandContext`].
    fn name(&self) -> &str;

    /// The name shown to the user in formats and error messages.
    fn display_name(&self) -> &str {
        self.name()
    }

    /// Whether the command can be executed without the user specifying this argument.
    fn is_optional(&self) -> bool {
        false
    }

    /// Whether the argument may return [`ParseFailure::Deferred`] and must be resolved with
    /// [`Argument::parse_fallback`].
    fn is_fallback(&self) -> bool {
        false
    }

    /// The format of the argument without the optionality brackets. Hidden arguments return an
    /// empty string.
    fn reduced_format(&self) -> String {
        self.display_name().to_string()
    }

    /// The format of the argument as shown in usage strings.
    fn format(&self) -> String {
        default_format(&self.reduced_format(), self.is_optional())
    }
}

/// Declares the type of the values an argument produces
pub trait ArgumentValue: ArgumentInfo {
    type Value: Clone + 'static;
}

/// Argument parser
///
/// `S` is the type of the command's invoker, passed through untouched inside [`CommandInput`].
/// Most arguments do not look at the invoker and implement `Argument<S>` for every `S`.
///
/// # Contract
///
/// * Parsing must be deterministic for a fixed input and fixed application state.
/// * On failure the cursor may be left at any position. The caller restores it, with the
///   exception of [`Optional`] which restores it internally.
/// * Only fallback-capable arguments (see [`ArgumentInfo::is_fallback`]) may return
///   [`ParseFailure::Deferred`].
/// * Completion never fails. It may move the cursor and callers are expected to restore it.
pub trait Argument<S>: ArgumentValue {
    /// Parses the value and stores it in the context under [`name`](ArgumentInfo::name).
    ///
    /// The default implementation delegates to [`parse_value`](Argument::parse_value) and stores
    /// the value if there is one.
    fn parse(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
    ) -> ParseResult<Self::Value> {
        let value = self.parse_value(input, context.view(), cursor)?;
        if let Some(value) = &value {
            context.put(self.name(), value.clone());
        }
        Ok(value)
    }

    /// Parses the value without storing it.
    fn parse_value(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<Self::Value>;

    /// Resolves a deferral previously returned by [`parse`](Argument::parse).
    ///
    /// The cursor is positioned where the argument deferred. `parsing_failed` tells whether
    /// parsing the arguments that follow this one failed or left unparsed tokens. Successful values
    /// are stored in the context.
    ///
    /// The default implementation surfaces the root cause of the signal.
    fn parse_fallback(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
        signal: FallbackSignal,
        parsing_failed: bool,
    ) -> ResolveResult<Self::Value> {
        let _ = (input, context, cursor, parsing_failed);
        Err(signal.into_root_cause())
    }

    /// Returns suggestions for the last token of the input.
    ///
    /// Leaf arguments only suggest when the cursor's next token is the last one (see
    /// [`TokenCursor::final_token`]).
    fn complete(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Vec<String>;
}

impl<A: ArgumentInfo + ?Sized> ArgumentInfo for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn display_name(&self) -> &str {
        (**self).display_name()
    }

    fn is_optional(&self) -> bool {
        (**self).is_optional()
    }

    fn is_fallback(&self) -> bool {
        (**self).is_fallback()
    }

    fn reduced_format(&self) -> String {
        (**self).reduced_format()
    }

    fn format(&self) -> String {
        (**self).format()
    }
}

impl<A: ArgumentValue + ?Sized> ArgumentValue for Box<A> {
    type Value = A::Value;
}

impl<S, A: Argument<S> + ?Sized> Argument<S> for Box<A> {
    fn parse(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
    ) -> ParseResult<Self::Value> {
        (**self).parse(input, context, cursor)
    }

    fn parse_value(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<Self::Value> {
        (**self).parse_value(input, context, cursor)
    }

    fn parse_fallback(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
        signal: FallbackSignal,
        parsing_failed: bool,
    ) -> ResolveResult<Self::Value> {
        (**self).parse_fallback(input, context, cursor, signal, parsing_failed)
    }

    fn complete(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        (**self).complete(input, context, cursor)
    }
}

/// Argument with its value type erased
///
/// Implemented for every [`Argument`]. Arguments of different value types are held together as
/// `Box<dyn ErasedArgument<S>>`, for example by [`Command`] and
/// [`Sequence`](arguments::Sequence). The values they parse are only observable through the
/// context.
pub trait ErasedArgument<S>: ArgumentInfo {
    /// Same as [`Argument::parse`], discarding the returned value.
    fn parse_into(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
    ) -> Result<(), ParseFailure>;

    /// Same as [`Argument::parse_fallback`], discarding the returned value.
    fn parse_fallback_into(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
        signal: FallbackSignal,
        parsing_failed: bool,
    ) -> Result<(), ArgumentError>;

    /// Same as [`Argument::complete`].
    fn suggest(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Vec<String>;
}

impl<S, A: Argument<S> + ?Sized> ErasedArgument<S> for A {
    fn parse_into(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
    ) -> Result<(), ParseFailure> {
        self.parse(input, context, cursor).map(|_| ())
    }

    fn parse_fallback_into(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
        signal: FallbackSignal,
        parsing_failed: bool,
    ) -> Result<(), ArgumentError> {
        self.parse_fallback(input, context, cursor, signal, parsing_failed)
            .map(|_| ())
    }

    fn suggest(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        self.complete(input, context, cursor)
    }
}

/// Builder methods shared by all arguments
///
/// ```
/// use cmdargs::arguments::Integer;
/// use cmdargs::{ArgumentExt, ArgumentInfo};
///
/// let page = Integer::<u32>::new("page").or_default(1);
/// assert!(page.is_optional());
/// assert_eq!(page.format(), "[page]");
///
/// let limit = Integer::<u32>::new("limit").named();
/// assert_eq!(limit.format(), "<limit=...>");
/// ```
pub trait ArgumentExt: ArgumentValue + Sized {
    /// Makes the argument optional, see [`Optional`].
    fn optional(self) -> Optional<Self> {
        Optional::new(self)
    }

    /// Requires the argument's token to be prefixed with `<display name>=`, see [`Named`].
    fn named(self) -> Named<Self> {
        Named::new(self)
    }

    /// Maps the parsed value, see [`Transform`].
    fn map<T, F>(self, mapping: F) -> Transform<Self, F, T>
    where
        F: Fn(Self::Value) -> Result<T, ArgumentError>,
        T: Clone + 'static,
    {
        Transform::new(self, mapping)
    }

    /// Falls back to a fixed value when the argument cannot be parsed.
    fn or_default(self, value: Self::Value) -> DefaultValue<Self> {
        FallbackArgument::with_default(self, value)
    }

    /// Falls back to the value parsed by another argument.
    ///
    /// Fails if `fallback` is itself fallback-capable.
    fn or_fallback<F>(self, fallback: F) -> Result<FallbackArgument<Self, F>, DefinitionError>
    where
        F: ArgumentValue<Value = Self::Value>,
    {
        FallbackArgument::new(self, fallback)
    }

    /// Falls back to a value derived from the invoker.
    ///
    /// `projection` returns `None` when the invoker is not a `kind`, which is reported as
    /// [`ArgumentError::RequiresInvoker`].
    fn or_invoker<S, G>(self, kind: &'static str, projection: G) -> InvokerValue<Self, G>
    where
        G: Fn(&S) -> Option<Self::Value>,
    {
        FallbackArgument::with_invoker(self, kind, projection)
    }

    /// Falls back to an object targeted by the invoker.
    fn or_targeted<S, G>(self, lookup: G) -> TargetedValue<Self, G>
    where
        G: Fn(&CommandInput<S>, ContextView<'_>) -> Result<Self::Value, ArgumentError>,
    {
        FallbackArgument::with_targeted(self, lookup)
    }

    /// Boxes the argument, preserving its value type.
    fn boxed<S>(self) -> Box<dyn Argument<S, Value = Self::Value>>
    where
        Self: Argument<S> + 'static,
    {
        Box::new(self)
    }

    /// Boxes the argument, erasing its value type.
    fn erased<S>(self) -> Box<dyn ErasedArgument<S>>
    where
        Self: Argument<S> + 'static,
    {
        Box::new(self)
    }
}

impl<A: ArgumentValue> ArgumentExt for A {}
