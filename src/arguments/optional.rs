use crate::error::{FallbackSignal, ParseFailure};
use crate::{
    Argument, ArgumentInfo, ArgumentValue, CommandContext, CommandInput, ContextView, ParseResult,
    ResolveResult, TokenCursor,
};
use tracing::trace;

/// Makes the inner argument optional
///
/// If the inner argument fails, the cursor is restored and the argument is absent instead. A
/// deferral of a fallback-capable inner argument is passed on (wrapped), so that its resolution
/// still happens; a failing resolution is turned into absence as well.
///
/// ```
/// use cmdargs::arguments::Integer;
/// use cmdargs::{Argument, ArgumentExt, ArgumentInfo, CommandContext, CommandInput, TokenCursor};
///
/// let page = Integer::<u32>::new("page").optional();
/// let context = CommandContext::new();
/// let mut cursor = TokenCursor::new(["next"]);
///
/// let value = page.parse_value(&CommandInput::new(()), context.view(), &mut cursor).unwrap();
/// assert_eq!(value, None);
/// assert_eq!(cursor.position(), 0);
/// assert_eq!(page.format(), "[page]");
/// ```
#[derive(Debug, Clone)]
pub struct Optional<A> {
    argument: A,
}

impl<A> Optional<A> {
    pub fn new(argument: A) -> Self {
        Optional { argument }
    }

    pub fn inner(&self) -> &A {
        &self.argument
    }

    fn absent_on_error<T>(
        &self,
        cursor: &mut TokenCursor,
        parse: impl FnOnce(&mut TokenCursor) -> ParseResult<T>,
    ) -> ParseResult<T>
    where
        A: ArgumentInfo,
    {
        let snapshot = cursor.snapshot();
        match parse(cursor) {
            Ok(value) => Ok(value),
            Err(ParseFailure::Deferred(signal)) => Err(ParseFailure::Deferred(
                FallbackSignal::wrap(self.argument.name(), signal),
            )),
            Err(ParseFailure::Error(error)) => {
                trace!(argument = %self.argument.name(), %error, "optional argument absent");
                cursor.restore(snapshot);
                Ok(None)
            }
        }
    }
}

impl<A: ArgumentInfo> ArgumentInfo for Optional<A> {
    fn name(&self) -> &str {
        self.argument.name()
    }

    fn display_name(&self) -> &str {
        self.argument.display_name()
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn is_fallback(&self) -> bool {
        self.argument.is_fallback()
    }

    fn reduced_format(&self) -> String {
        self.argument.reduced_format()
    }
}

impl<A: ArgumentValue> ArgumentValue for Optional<A> {
    type Value = A::Value;
}

impl<S, A: Argument<S>> Argument<S> for Optional<A> {
    fn parse(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
    ) -> ParseResult<A::Value> {
        self.absent_on_error(cursor, |cursor| {
            self.argument.parse(input, context, cursor)
        })
    }

    fn parse_value(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<A::Value> {
        self.absent_on_error(cursor, |cursor| {
            self.argument.parse_value(input, context, cursor)
        })
    }

    fn parse_fallback(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
        signal: FallbackSignal,
        parsing_failed: bool,
    ) -> ResolveResult<A::Value> {
        let signal = match signal.into_nested() {
            Ok(nested) => nested,
            Err(signal) => return Err(signal.into_root_cause()),
        };
        let snapshot = cursor.snapshot();
        match self
            .argument
            .parse_fallback(input, context, cursor, signal, parsing_failed)
        {
            Ok(value) => Ok(value),
            Err(_) => {
                cursor.restore(snapshot);
                Ok(None)
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{Integer, Literal};
    use crate::error::{ArgumentError, ErrorKind};
    use crate::testing::{test_complete, test_parse};
    use crate::ArgumentExt;

    test_parse!(present, Integer::<i32>::new("x").optional(), ["5"] => Ok(Some(5), 1));
    test_parse!(invalid_is_absent, Integer::<i32>::new("x").optional(), ["a"] => Ok(None, 0));
    test_parse!(missing_is_absent, Integer::<i32>::new("x").optional(), [] => Ok(None, 0));
    test_parse!(
        deferral_is_passed_on,
        Integer::<i32>::new("x").or_default(1).optional(),
        ["a"] => Deferred(ErrorKind::InvalidInput)
    );

    test_complete!(delegates, Literal::new("tp").optional(), ["t"] => ["tp"]);

    #[test]
    fn format() {
        let argument = Integer::<i32>::new("x").optional();
        assert!(argument.is_optional());
        assert!(!argument.is_fallback());
        assert_eq!(argument.reduced_format(), "x");
        assert_eq!(argument.format(), "[x]");
    }

    #[test]
    fn stores_value() {
        let mut context = CommandContext::new();
        let mut cursor = TokenCursor::new(["5"]);
        Integer::<i32>::new("x")
            .optional()
            .parse(&CommandInput::new(()), &mut context, &mut cursor)
            .unwrap();
        assert_eq!(context.get::<i32>("x"), Some(&5));
    }

    #[test]
    fn failed_resolution_is_absent() {
        let argument = Integer::<i32>::new("x")
            .or_fallback(Integer::<i32>::new("y"))
            .unwrap()
            .optional();
        let input = CommandInput::new(());
        let mut context = CommandContext::new();
        let mut cursor = TokenCursor::new(["a"]);
        let start = cursor.snapshot();

        let signal = match argument.parse(&input, &mut context, &mut cursor) {
            Err(ParseFailure::Deferred(signal)) => signal,
            other => panic!("expected Deferred, but found {:?}", other),
        };
        cursor.restore(start);
        let value = argument
            .parse_fallback(&input, &mut context, &mut cursor, signal, true)
            .unwrap();
        assert_eq!(value, None);
        assert_eq!(cursor.position(), 0);
        assert!(!context.has("x"));
    }

    #[test]
    fn unexpected_signal_surfaces_root_cause() {
        let argument = Integer::<i32>::new("x").optional();
        let mut context = CommandContext::new();
        let mut cursor = TokenCursor::new(["a"]);
        let signal = FallbackSignal::new("x", ArgumentError::missing("x"));
        let error = argument
            .parse_fallback(&CommandInput::new(()), &mut context, &mut cursor, signal, false)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingInput);
    }
}
