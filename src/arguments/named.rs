use super::extend_capped;
use crate::error::{ArgumentError, FallbackSignal, ParseFailure};
use crate::{
    Argument, ArgumentInfo, ArgumentValue, CommandContext, CommandInput, ContextView, ParseResult,
    ResolveResult, TokenCursor,
};

const NAME_DELIMITER: &str = "=";

/// Requires the inner argument's token to be prefixed with `<display name>=`
///
/// The prefix is stripped and the inner argument parses the remainder of the token. This makes it
/// possible to disambiguate arguments that would otherwise accept the same input.
///
/// ```
/// use cmdargs::arguments::Integer;
/// use cmdargs::{Argument, ArgumentExt, CommandContext, CommandInput, TokenCursor};
///
/// let limit = Integer::<u32>::new("limit").named();
/// let mut context = CommandContext::new();
/// let mut cursor = TokenCursor::new(["limit=10", "rest"]);
/// limit.parse(&CommandInput::new(()), &mut context, &mut cursor).unwrap();
///
/// assert_eq!(context.get::<u32>("limit"), Some(&10));
/// assert_eq!(cursor.peek(), Some("rest"));
/// ```
///
/// The prefix is only recognized at the start of the token the cursor points at, so the inner
/// argument should consume exactly one token.
///
/// While the prefix itself is still being typed, completion offers the bare `<display name>=`
/// in addition to the prefixed suggestions of the inner argument.
#[derive(Debug, Clone)]
pub struct Named<A> {
    argument: A,
}

impl<A> Named<A> {
    pub fn new(argument: A) -> Self {
        Named { argument }
    }

    pub fn inner(&self) -> &A {
        &self.argument
    }
}

impl<A: ArgumentInfo> Named<A> {
    fn prefix(&self) -> String {
        format!("{}{}", self.argument.display_name(), NAME_DELIMITER)
    }

    /// Runs `parse` against a copy of the cursor whose next token has `prefix` stripped, and
    /// mirrors the copy's position back on success.
    fn with_prefix_stripped<R, E>(
        &self,
        cursor: &mut TokenCursor,
        prefix: &str,
        parse: impl FnOnce(&mut TokenCursor) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<ArgumentError>,
    {
        let token = cursor
            .peek()
            .ok_or_else(|| ArgumentError::missing(self.display_name()))?;
        let stripped = match token.strip_prefix(prefix) {
            Some(stripped) => stripped.to_string(),
            None => return Err(ArgumentError::invalid(self.display_name(), token, None).into()),
        };
        let mut adjusted = cursor
            .with_token_replaced(stripped)
            .ok_or_else(|| ArgumentError::missing(self.display_name()))?;
        let value = parse(&mut adjusted)?;
        cursor.restore(adjusted.snapshot());
        Ok(value)
    }

    fn wrap_signal<T>(&self, result: ParseResult<T>) -> ParseResult<T> {
        result.map_err(|failure| match failure {
            ParseFailure::Deferred(signal) => {
                ParseFailure::Deferred(FallbackSignal::wrap(self.name(), signal))
            }
            failure => failure,
        })
    }
}

impl<A: ArgumentInfo> ArgumentInfo for Named<A> {
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
        format!("{}...", self.prefix())
    }
}

impl<A: ArgumentValue> ArgumentValue for Named<A> {
    type Value = A::Value;
}

impl<S, A: Argument<S>> Argument<S> for Named<A> {
    fn parse(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
    ) -> ParseResult<A::Value> {
        let prefix = self.prefix();
        let result = self.with_prefix_stripped(cursor, &prefix, |adjusted| {
            self.argument.parse(input, context, adjusted)
        });
        self.wrap_signal(result)
    }

    fn parse_value(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<A::Value> {
        let prefix = self.prefix();
        let result = self.with_prefix_stripped(cursor, &prefix, |adjusted| {
            self.argument.parse_value(input, context, adjusted)
        });
        self.wrap_signal(result)
    }

    fn parse_fallback(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
        signal: FallbackSignal,
        parsing_failed: bool,
    ) -> ResolveResult<A::Value> {
        let signal = signal.into_nested().map_err(FallbackSignal::into_root_cause)?;
        let prefix = self.prefix();
        self.with_prefix_stripped(cursor, &prefix, |adjusted| {
            self.argument
                .parse_fallback(input, context, adjusted, signal, parsing_failed)
        })
    }

    fn complete(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        let token = match cursor.peek() {
            Some(token) => token.to_string(),
            None => return Vec::new(),
        };
        let full_prefix = self.prefix();
        let partial = full_prefix.starts_with(&token) && token.len() < full_prefix.len();
        let prefix = if full_prefix.starts_with(&token) {
            token
        } else {
            full_prefix.clone()
        };

        let mut suggestions = Vec::new();
        if partial && cursor.remaining_count() == 1 {
            suggestions.push(full_prefix.clone());
        }
        let delegated = self.with_prefix_stripped(
            cursor,
            &prefix,
            |adjusted| -> Result<Vec<String>, ArgumentError> {
                Ok(self.argument.complete(input, context, adjusted))
            },
        );
        if let Ok(delegated) = delegated {
            let delegated = delegated
                .into_iter()
                .map(|suggestion| format!("{}{}", full_prefix, suggestion))
                .collect();
            extend_capped(&mut suggestions, delegated, input.max_suggestions());
        }
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{Boolean, Integer};
    use crate::error::ErrorKind;
    use crate::testing::{test_complete, test_parse};
    use crate::ArgumentExt;

    test_parse!(strips_prefix, Integer::<i32>::new("n").named(), ["n=5", "x"] => Ok(Some(5), 1));
    test_parse!(missing, Integer::<i32>::new("n").named(), [] => Error(ErrorKind::MissingInput));
    test_parse!(no_prefix, Integer::<i32>::new("n").named(), ["5"] => Error(ErrorKind::InvalidInput));
    test_parse!(other_prefix, Integer::<i32>::new("n").named(), ["m=5"] => Error(ErrorKind::InvalidInput));
    test_parse!(empty_value, Integer::<i32>::new("n").named(), ["n="] => Error(ErrorKind::InvalidInput));
    test_parse!(
        uses_display_name,
        Integer::<i32>::new("n").with_display_name("count").named(),
        ["count=2"] => Ok(Some(2), 1)
    );
    test_parse!(
        wraps_deferral,
        Integer::<i32>::new("n").or_default(0).named(),
        ["n=x"] => Deferred(ErrorKind::InvalidInput)
    );

    test_complete!(partial_prefix, Boolean::new("flag").named(), ["fl"] => ["flag=", "flag=true", "flag=false"]);
    test_complete!(full_prefix, Boolean::new("flag").named(), ["flag="] => ["flag=true", "flag=false"]);
    test_complete!(value_prefix, Boolean::new("flag").named(), ["flag=t"] => ["flag=true"]);
    test_complete!(empty_token, Boolean::new("flag").named(), [""] => ["flag=", "flag=true", "flag=false"]);
    test_complete!(other_token, Boolean::new("flag").named(), ["x"] => []);
    test_complete!(nothing_to_complete, Boolean::new("flag").named(), [] => []);

    #[test]
    fn format() {
        let argument = Integer::<i32>::new("n").named();
        assert_eq!(argument.reduced_format(), "n=...");
        assert_eq!(argument.format(), "<n=...>");
        assert_eq!(Integer::<i32>::new("n").named().optional().format(), "[n=...]");
    }

    #[test]
    fn stores_under_inner_name() {
        let mut context = CommandContext::new();
        let mut cursor = TokenCursor::new(["n=5"]);
        Integer::<i32>::new("n")
            .named()
            .parse(&CommandInput::new(()), &mut context, &mut cursor)
            .unwrap();
        assert_eq!(context.get::<i32>("n"), Some(&5));
        assert!(!cursor.has_next());
    }

    #[test]
    fn resolution_strips_prefix() {
        let argument = Integer::<i32>::new("n")
            .or_fallback(Integer::<i32>::new("m"))
            .unwrap()
            .named();
        let input = CommandInput::new(());
        let mut context = CommandContext::new();
        let mut cursor = TokenCursor::new(["n=x"]);
        let start = cursor.snapshot();
        let signal = match argument.parse(&input, &mut context, &mut cursor) {
            Err(ParseFailure::Deferred(signal)) => signal,
            other => panic!("expected Deferred, but found {:?}", other),
        };
        cursor.restore(start);
        let error = argument
            .parse_fallback(&input, &mut context, &mut cursor, signal, true)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        assert_eq!(error.input(), Some("x"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prefixed_token_parses_like_plain_token(value in any::<i32>(), trailing in 0usize..3) {
                let input = CommandInput::new(());
                let context = CommandContext::new();
                let named = Integer::<i32>::new("n").named();
                let plain = Integer::<i32>::new("n");

                let mut named_tokens = vec![format!("n={}", value)];
                let mut plain_tokens = vec![value.to_string()];
                for index in 0..trailing {
                    named_tokens.push(index.to_string());
                    plain_tokens.push(index.to_string());
                }
                let mut named_cursor = TokenCursor::new(named_tokens);
                let mut plain_cursor = TokenCursor::new(plain_tokens);

                let named_value = named.parse_value(&input, context.view(), &mut named_cursor).ok();
                let plain_value = plain.parse_value(&input, context.view(), &mut plain_cursor).ok();
                prop_assert_eq!(named_value, plain_value);
                prop_assert_eq!(named_value, Some(Some(value)));
                prop_assert_eq!(named_cursor.position(), 1);
                prop_assert_eq!(plain_cursor.position(), 1);
            }
        }
    }
}
