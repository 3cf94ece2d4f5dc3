use crate::error::{ArgumentError, FallbackSignal, ParseFailure};
use crate::{
    Argument, ArgumentInfo, ArgumentValue, CommandContext, CommandInput, ContextView, ParseResult,
    ResolveResult, TokenCursor,
};
use std::fmt;
use std::marker::PhantomData;

/// Maps the value of the inner argument
///
/// The mapping may reject a value with an [`ArgumentError`], but it cannot defer. The mapped
/// value is stored under the inner argument's name, replacing the raw value.
///
/// ```
/// use cmdargs::arguments::Integer;
/// use cmdargs::{Argument, ArgumentExt, CommandContext, CommandInput, TokenCursor};
///
/// let percent = Integer::<u32>::new("percent").map(|value| Ok(value as f64 / 100.0));
/// let mut context = CommandContext::new();
/// let mut cursor = TokenCursor::new(["25"]);
/// percent.parse(&CommandInput::new(()), &mut context, &mut cursor).unwrap();
/// assert_eq!(context.get::<f64>("percent"), Some(&0.25));
/// ```
pub struct Transform<A, F, T> {
    argument: A,
    mapping: F,
    _phantom: PhantomData<fn() -> T>,
}

impl<A, F, T> Transform<A, F, T> {
    pub fn new(argument: A, mapping: F) -> Self {
        Transform {
            argument,
            mapping,
            _phantom: PhantomData,
        }
    }
}

impl<A: fmt::Debug, F, T> fmt::Debug for Transform<A, F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("argument", &self.argument)
            .finish_non_exhaustive()
    }
}

impl<A: ArgumentInfo, F, T> ArgumentInfo for Transform<A, F, T> {
    fn name(&self) -> &str {
        self.argument.name()
    }

    fn display_name(&self) -> &str {
        self.argument.display_name()
    }

    fn is_optional(&self) -> bool {
        self.argument.is_optional()
    }

    fn is_fallback(&self) -> bool {
        self.argument.is_fallback()
    }

    fn reduced_format(&self) -> String {
        self.argument.reduced_format()
    }

    fn format(&self) -> String {
        self.argument.format()
    }
}

impl<A, F, T> ArgumentValue for Transform<A, F, T>
where
    A: ArgumentValue,
    F: Fn(A::Value) -> Result<T, ArgumentError>,
    T: Clone + 'static,
{
    type Value = T;
}

impl<S, A, F, T> Argument<S> for Transform<A, F, T>
where
    A: Argument<S>,
    F: Fn(A::Value) -> Result<T, ArgumentError>,
    T: Clone + 'static,
{
    fn parse_value(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<T> {
        match self.argument.parse_value(input, context, cursor) {
            Ok(Some(value)) => Ok(Some((self.mapping)(value)?)),
            Ok(None) => Ok(None),
            Err(ParseFailure::Error(error)) => Err(ParseFailure::Error(error)),
            Err(ParseFailure::Deferred(signal)) => Err(ParseFailure::Deferred(
                FallbackSignal::wrap(self.argument.name(), signal),
            )),
        }
    }

    fn parse_fallback(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
        signal: FallbackSignal,
        parsing_failed: bool,
    ) -> ResolveResult<T> {
        let signal = signal.into_nested().map_err(FallbackSignal::into_root_cause)?;
        let value = match self
            .argument
            .parse_fallback(input, context, cursor, signal, parsing_failed)?
        {
            Some(value) => (self.mapping)(value)?,
            None => return Ok(None),
        };
        context.put(self.name(), value.clone());
        Ok(Some(value))
    }

    fn complete(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        self.argument.complete(input, context, cursor)
    }
}
