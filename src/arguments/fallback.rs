use super::{extend_capped, ArgumentName};
use crate::error::{ArgumentError, DefinitionError, FallbackSignal, ParseFailure};
use crate::{
    Argument, ArgumentInfo, ArgumentValue, CommandContext, CommandInput, ContextView, ParseResult,
    ResolveResult, TokenCursor,
};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use tracing::trace;

/// Falls back to a fixed value.
pub type DefaultValue<A> = FallbackArgument<A, FixedValue<<A as ArgumentValue>::Value>>;

/// Falls back to a value derived from the invoker.
pub type InvokerValue<A, G> = FallbackArgument<A, InvokerSource<G, <A as ArgumentValue>::Value>>;

/// Falls back to an object targeted by the invoker.
pub type TargetedValue<A, G> =
    FallbackArgument<A, TargetedSource<G, <A as ArgumentValue>::Value>>;

/// Argument with a fallback value producer
///
/// `FallbackArgument` first tries the original argument. If the original argument fails, the
/// decision is deferred: [`parse`](Argument::parse) returns [`ParseFailure::Deferred`] and the
/// holder of the argument continues with the following arguments. Once those have been parsed, the
/// holder calls [`parse_fallback`](Argument::parse_fallback), which applies this policy:
///
/// 1. If the original argument is fallback-capable itself and the deferral originated from it,
///    the original's own resolution is tried first and used if it succeeds.
/// 2. The fallback producer is parsed. Its outcome is used unless it fails with
///    [`MissingInput`](crate::error::ErrorKind::MissingInput) or
///    [`RequiresInvoker`](crate::error::ErrorKind::RequiresInvoker).
/// 3. In that case, if parsing the following arguments failed, nothing has changed since the
///    original argument failed, so its original error is reported.
/// 4. Otherwise the following arguments consumed the input they needed and the original argument
///    is parsed once more. If it still cannot produce a value, the root cause of the new failure is
///    reported.
///
/// The producer is not allowed to be fallback-capable, which keeps the resolution bounded.
///
/// ```
/// use cmdargs::arguments::{Integer, Literal};
/// use cmdargs::{ArgumentExt, Command, CommandInput};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let command: Command<()> = Command::new(vec![
///     Integer::<u32>::new("count").or_default(1).erased(),
///     Literal::new("items").erased(),
/// ])?;
/// let input = CommandInput::new(());
///
/// let context = command.parse_line(&input, "items")?;
/// assert_eq!(context.get::<u32>("count"), Some(&1));
///
/// let context = command.parse_line(&input, "3 items")?;
/// assert_eq!(context.get::<u32>("count"), Some(&3));
///
/// let error = command.parse_line(&input, "x items").unwrap_err();
/// assert_eq!(error.input(), Some("x"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FallbackArgument<A, F> {
    argument: A,
    fallback: F,
}

impl<A, F> FallbackArgument<A, F> {
    /// Creates a new argument falling back to `fallback`.
    ///
    /// Fails if `fallback` is fallback-capable.
    pub fn new(argument: A, fallback: F) -> Result<Self, DefinitionError>
    where
        A: ArgumentValue,
        F: ArgumentValue<Value = A::Value>,
    {
        if fallback.is_fallback() {
            return Err(DefinitionError::FallbackProducerIsFallback {
                argument: argument.name().to_string(),
                fallback: fallback.name().to_string(),
            });
        }
        Ok(FallbackArgument { argument, fallback })
    }

    /// Returns the original argument.
    pub fn original(&self) -> &A {
        &self.argument
    }

    /// Returns the fallback producer.
    pub fn fallback(&self) -> &F {
        &self.fallback
    }
}

impl<A: ArgumentValue> FallbackArgument<A, FixedValue<A::Value>> {
    pub fn with_default(argument: A, value: A::Value) -> Self {
        let fallback = FixedValue::new(&argument, value);
        FallbackArgument { argument, fallback }
    }
}

impl<A: ArgumentValue, G> FallbackArgument<A, InvokerSource<G, A::Value>> {
    pub fn with_invoker(argument: A, kind: impl Into<Cow<'static, str>>, projection: G) -> Self {
        let fallback = InvokerSource::new(&argument, kind, projection);
        FallbackArgument { argument, fallback }
    }
}

impl<A: ArgumentValue, G> FallbackArgument<A, TargetedSource<G, A::Value>> {
    pub fn with_targeted(argument: A, lookup: G) -> Self {
        let fallback = TargetedSource::new(&argument, lookup);
        FallbackArgument { argument, fallback }
    }
}

impl<A: fmt::Debug, F> fmt::Debug for FallbackArgument<A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackArgument")
            .field("argument", &self.argument)
            .finish_non_exhaustive()
    }
}

impl<A: ArgumentInfo, F: ArgumentInfo> ArgumentInfo for FallbackArgument<A, F> {
    fn name(&self) -> &str {
        self.argument.name()
    }

    fn display_name(&self) -> &str {
        self.argument.display_name()
    }

    fn is_optional(&self) -> bool {
        self.argument.is_optional() || self.fallback.is_optional()
    }

    fn is_fallback(&self) -> bool {
        true
    }

    fn reduced_format(&self) -> String {
        self.argument.reduced_format()
    }
}

impl<A: ArgumentValue, F: ArgumentInfo> ArgumentValue for FallbackArgument<A, F> {
    type Value = A::Value;
}

impl<A: ArgumentInfo, F> FallbackArgument<A, F> {
    fn defer<T>(&self, result: ParseResult<T>) -> ParseResult<T> {
        result.map_err(|failure| {
            let signal = match failure {
                ParseFailure::Error(error) => FallbackSignal::new(self.argument.name(), error),
                ParseFailure::Deferred(signal) => {
                    FallbackSignal::wrap(self.argument.name(), signal)
                }
            };
            ParseFailure::Deferred(signal)
        })
    }
}

impl<S, A, F> Argument<S> for FallbackArgument<A, F>
where
    A: Argument<S>,
    F: Argument<S, Value = A::Value>,
{
    fn parse(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
    ) -> ParseResult<A::Value> {
        self.defer(self.argument.parse(input, context, cursor))
    }

    fn parse_value(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<A::Value> {
        self.defer(self.argument.parse_value(input, context, cursor))
    }

    fn parse_fallback(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
        signal: FallbackSignal,
        parsing_failed: bool,
    ) -> ResolveResult<A::Value> {
        let start = cursor.snapshot();

        let signal = match signal.into_nested() {
            Ok(nested) if self.argument.is_fallback() => {
                let chained = self.argument.parse_fallback(
                    input,
                    context,
                    cursor,
                    nested.clone(),
                    parsing_failed,
                );
                match chained {
                    Ok(value) => return Ok(value),
                    Err(error) => {
                        trace!(argument = %self.name(), %error, "chained fallback failed");
                        cursor.restore(start);
                        nested
                    }
                }
            }
            Ok(nested) => nested,
            Err(signal) => signal,
        };

        let error = match self.fallback.parse_value(input, context.view(), cursor) {
            Ok(value) => {
                if let Some(value) = &value {
                    context.put(self.name(), value.clone());
                }
                return Ok(value);
            }
            Err(failure) => failure.into_root_cause(),
        };
        if !error.is_circumstantial() {
            return Err(error);
        }
        if parsing_failed {
            return Err(signal.into_root_cause());
        }

        trace!(argument = %self.name(), %error, "fallback unavailable, parsing original again");
        cursor.restore(start);
        match self.argument.parse(input, context, cursor) {
            Ok(value) => Ok(value),
            Err(failure) => Err(failure.into_root_cause()),
        }
    }

    fn complete(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        let limit = input.max_suggestions();
        let start = cursor.snapshot();
        let mut suggestions = self.argument.complete(input, context, cursor);
        if suggestions.len() >= limit {
            suggestions.truncate(limit);
            return suggestions;
        }
        cursor.restore(start);
        let fallback = self.fallback.complete(input, context, cursor);
        extend_capped(&mut suggestions, fallback, limit);
        suggestions
    }
}

/// Fallback producer yielding a fixed value
///
/// Consumes no input. It is hidden (its format is empty) and optional.
#[derive(Debug, Clone)]
pub struct FixedValue<T> {
    name: ArgumentName,
    value: T,
}

impl<T> FixedValue<T> {
    /// Creates a producer of `value` for `argument`.
    pub fn new(argument: &impl ArgumentInfo, value: T) -> Self {
        let mut name = ArgumentName::new(argument.name());
        name.set_display_name(argument.display_name());
        FixedValue { name, value }
    }
}

impl<T> ArgumentInfo for FixedValue<T> {
    fn name(&self) -> &str {
        self.name.name()
    }

    fn display_name(&self) -> &str {
        self.name.display_name()
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn reduced_format(&self) -> String {
        String::new()
    }
}

impl<T: Clone + 'static> ArgumentValue for FixedValue<T> {
    type Value = T;
}

impl<S, T: Clone + 'static> Argument<S> for FixedValue<T> {
    fn parse_value(
        &self,
        _input: &CommandInput<S>,
        _context: ContextView<'_>,
        _cursor: &mut TokenCursor,
    ) -> ParseResult<T> {
        Ok(Some(self.value.clone()))
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

/// Fallback producer deriving the value from the invoker
///
/// The projection returns `None` if the invoker is not of the required kind, which is reported as
/// [`ArgumentError::RequiresInvoker`]. Consumes no input. It is hidden and optional.
#[derive(Clone)]
pub struct InvokerSource<G, T> {
    name: ArgumentName,
    kind: Cow<'static, str>,
    projection: G,
    _phantom: PhantomData<fn() -> T>,
}

impl<G, T> InvokerSource<G, T> {
    pub fn new(
        argument: &impl ArgumentInfo,
        kind: impl Into<Cow<'static, str>>,
        projection: G,
    ) -> Self {
        let mut name = ArgumentName::new(argument.name());
        name.set_display_name(argument.display_name());
        InvokerSource {
            name,
            kind: kind.into(),
            projection,
            _phantom: PhantomData,
        }
    }
}

impl<G, T> fmt::Debug for InvokerSource<G, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvokerSource")
            .field("name", &self.name.name())
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<G, T> ArgumentInfo for InvokerSource<G, T> {
    fn name(&self) -> &str {
        self.name.name()
    }

    fn display_name(&self) -> &str {
        self.name.display_name()
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn reduced_format(&self) -> String {
        String::new()
    }
}

impl<G, T: Clone + 'static> ArgumentValue for InvokerSource<G, T> {
    type Value = T;
}

impl<S, G, T> Argument<S> for InvokerSource<G, T>
where
    G: Fn(&S) -> Option<T>,
    T: Clone + 'static,
{
    fn parse_value(
        &self,
        input: &CommandInput<S>,
        _context: ContextView<'_>,
        _cursor: &mut TokenCursor,
    ) -> ParseResult<T> {
        match (self.projection)(input.invoker()) {
            Some(value) => Ok(Some(value)),
            None => Err(
                ArgumentError::requires_invoker(self.display_name(), self.kind.clone()).into(),
            ),
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

/// Fallback producer yielding an object the invoker targets
///
/// The lookup is supplied by the application, for example returning the object the invoker is
/// looking at. It should fail with [`ArgumentError::MissingInput`] or
/// [`ArgumentError::RequiresInvoker`] when there is no target, so that the original argument's
/// diagnosis is preferred. Consumes no input. It is hidden and optional.
#[derive(Clone)]
pub struct TargetedSource<G, T> {
    name: ArgumentName,
    lookup: G,
    _phantom: PhantomData<fn() -> T>,
}

impl<G, T> TargetedSource<G, T> {
    pub fn new(argument: &impl ArgumentInfo, lookup: G) -> Self {
        let mut name = ArgumentName::new(argument.name());
        name.set_display_name(argument.display_name());
        TargetedSource {
            name,
            lookup,
            _phantom: PhantomData,
        }
    }
}

impl<G, T> fmt::Debug for TargetedSource<G, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetedSource")
            .field("name", &self.name.name())
            .finish_non_exhaustive()
    }
}

impl<G, T> ArgumentInfo for TargetedSource<G, T> {
    fn name(&self) -> &str {
        self.name.name()
    }

    fn display_name(&self) -> &str {
        self.name.display_name()
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn reduced_format(&self) -> String {
        String::new()
    }
}

impl<G, T: Clone + 'static> ArgumentValue for TargetedSource<G, T> {
    type Value = T;
}

impl<S, G, T> Argument<S> for TargetedSource<G, T>
where
    G: Fn(&CommandInput<S>, ContextView<'_>) -> Result<T, ArgumentError>,
    T: Clone + 'static,
{
    fn parse_value(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        _cursor: &mut TokenCursor,
    ) -> ParseResult<T> {
        Ok(Some((self.lookup)(input, context)?))
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
