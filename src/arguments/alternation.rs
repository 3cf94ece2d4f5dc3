use super::{extend_capped, ArgumentName};
use crate::error::{
    ArgumentError, DefinitionError, ErrorKind, FallbackSignal, ParseFailure, SignalCause,
};
use crate::{
    default_format, join_formats, Argument, ArgumentInfo, ArgumentValue, CommandContext,
    CommandInput, ContextView, ParseResult, ResolveResult, TokenCursor,
};
use std::fmt;
use std::iter;
use tracing::trace;

const FORMAT_DELIMITER: &str = "|";

/// Outcomes of the alternatives that did not produce a value
#[derive(Default)]
struct Tally {
    deferred: Vec<(usize, FallbackSignal)>,
    absent: bool,
    rejected: Option<ArgumentError>,
    first_error: Option<ArgumentError>,
}

impl Tally {
    fn record_error(&mut self, error: ArgumentError) {
        let slot = if error.kind() == ErrorKind::FilterRejected {
            &mut self.rejected
        } else {
            &mut self.first_error
        };
        if slot.is_none() {
            *slot = Some(error);
        }
    }

    fn finish<T>(self, name: &str) -> ParseResult<T> {
        let mut deferred = self.deferred.into_iter();
        if let Some(first) = deferred.next() {
            let signal = FallbackSignal::branches(name, first, deferred.collect());
            return Err(ParseFailure::Deferred(signal));
        }
        if self.absent {
            return Ok(None);
        }
        match self.rejected.or(self.first_error) {
            Some(error) => Err(error.into()),
            None => Ok(None),
        }
    }
}

/// Returns the value of the first alternative that parses one
///
/// Alternatives are tried in order, each from the same cursor position. When none of them
/// produces a value, the outcome is decided in this order:
///
/// 1. if any alternative deferred, the alternation defers too and remembers every deferring
///    alternative for the resolution;
/// 2. if any alternative was absent, the alternation is absent;
/// 3. the first filter rejection is returned, being more specific than a plain parse error;
/// 4. the first error is returned.
///
/// A successful value is also stored under the alternation's own name.
///
/// ```
/// use cmdargs::arguments::{FirstOf, Literal, Text};
/// use cmdargs::{Argument, ArgumentExt, ArgumentInfo, CommandContext, CommandInput, TokenCursor};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let target: FirstOf<(), String> = FirstOf::new(
///     "target",
///     vec![Literal::new("all").boxed(), Text::new("player").boxed()],
/// )?;
/// assert_eq!(target.format(), "<all|player>");
///
/// let mut context = CommandContext::new();
/// let mut cursor = TokenCursor::new(["bob"]);
/// target.parse(&CommandInput::new(()), &mut context, &mut cursor).unwrap();
/// assert_eq!(context.get::<String>("target").map(String::as_str), Some("bob"));
/// # Ok(())
/// # }
/// ```
pub struct FirstOf<S, T: Clone + 'static> {
    name: ArgumentName,
    arguments: Vec<Box<dyn Argument<S, Value = T>>>,
    joined_format: bool,
    reversed_format: bool,
}

impl<S, T: Clone + 'static> FirstOf<S, T> {
    pub fn new(
        name: impl Into<String>,
        arguments: Vec<Box<dyn Argument<S, Value = T>>>,
    ) -> Result<Self, DefinitionError> {
        let name = name.into();
        if arguments.is_empty() {
            return Err(DefinitionError::NoArguments(name));
        }
        Ok(FirstOf {
            name: ArgumentName::new(name),
            arguments,
            joined_format: true,
            reversed_format: false,
        })
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.name.set_display_name(display_name);
        self
    }

    /// Lists the alternatives in reverse order in the format.
    pub fn with_reversed_format(mut self) -> Self {
        self.reversed_format = true;
        self
    }

    /// Uses the format derived from the display name instead of listing the alternatives.
    pub fn without_joined_format(mut self) -> Self {
        self.joined_format = false;
        self
    }

    pub fn arguments(&self) -> &[Box<dyn Argument<S, Value = T>>] {
        &self.arguments
    }

    fn parse_first(
        &self,
        cursor: &mut TokenCursor,
        mut attempt: impl FnMut(&dyn Argument<S, Value = T>, &mut TokenCursor) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let snapshot = cursor.snapshot();
        let mut tally = Tally::default();
        for (index, argument) in self.arguments.iter().enumerate() {
            match attempt(argument.as_ref(), cursor) {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => tally.absent = true,
                Err(ParseFailure::Deferred(signal)) => {
                    trace!(argument = %self.name(), index, "alternative deferred");
                    tally.deferred.push((index, signal));
                }
                Err(ParseFailure::Error(error)) => {
                    trace!(argument = %self.name(), index, %error, "alternative failed");
                    tally.record_error(error);
                }
            }
            cursor.restore(snapshot);
        }
        tally.finish(self.name())
    }
}

impl<S, T: Clone + 'static> fmt::Debug for FirstOf<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirstOf")
            .field("name", &self.name.name())
            .field(
                "arguments",
                &self
                    .arguments
                    .iter()
                    .map(|argument| argument.name())
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl<S, T: Clone + 'static> ArgumentInfo for FirstOf<S, T> {
    fn name(&self) -> &str {
        self.name.name()
    }

    fn display_name(&self) -> &str {
        self.name.display_name()
    }

    fn is_optional(&self) -> bool {
        self.arguments.iter().any(|argument| argument.is_optional())
    }

    fn is_fallback(&self) -> bool {
        self.arguments.iter().any(|argument| argument.is_fallback())
    }

    fn reduced_format(&self) -> String {
        if !self.joined_format {
            return self.display_name().to_string();
        }
        let formats = self.arguments.iter().map(|argument| argument.reduced_format());
        if self.reversed_format {
            join_formats(formats.rev(), FORMAT_DELIMITER)
        } else {
            join_formats(formats, FORMAT_DELIMITER)
        }
    }

    fn format(&self) -> String {
        default_format(&self.reduced_format(), self.is_optional())
    }
}

impl<S, T: Clone + 'static> ArgumentValue for FirstOf<S, T> {
    type Value = T;
}

impl<S, T: Clone + 'static> Argument<S> for FirstOf<S, T> {
    fn parse(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
    ) -> ParseResult<T> {
        let value = self.parse_first(cursor, |argument, cursor| {
            argument.parse(input, context, cursor)
        })?;
        if let Some(value) = &value {
            context.put(self.name(), value.clone());
        }
        Ok(value)
    }

    fn parse_value(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<T> {
        self.parse_first(cursor, |argument, cursor| {
            argument.parse_value(input, context, cursor)
        })
    }

    fn parse_fallback(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
        signal: FallbackSignal,
        parsing_failed: bool,
    ) -> ResolveResult<T> {
        let (first, others) = match signal.into_cause() {
            SignalCause::Branches { first, others } => (first, others),
            SignalCause::Error(error) => return Err(error),
            SignalCause::Nested(nested) => return Err(nested.into_root_cause()),
        };

        let snapshot = cursor.snapshot();
        let mut tally = Tally::default();
        for (index, signal) in iter::once(first).chain(others) {
            let argument = match self.arguments.get(index) {
                Some(argument) => argument,
                None => continue,
            };
            match argument.parse_fallback(input, context, cursor, signal, parsing_failed) {
                Ok(Some(value)) => {
                    context.put(self.name(), value.clone());
                    return Ok(Some(value));
                }
                Ok(None) => tally.absent = true,
                Err(error) => {
                    trace!(argument = %self.name(), index, %error, "alternative fallback failed");
                    tally.record_error(error);
                }
            }
            cursor.restore(snapshot);
        }
        tally.finish(self.name()).map_err(ParseFailure::into_root_cause)
    }

    fn complete(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        let snapshot = cursor.snapshot();
        let limit = input.max_suggestions();
        let mut suggestions = Vec::new();
        for argument in &self.arguments {
            cursor.restore(snapshot);
            let argument_suggestions = argument.complete(input, context, cursor);
            if extend_capped(&mut suggestions, argument_suggestions, limit) {
                break;
            }
        }
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{Integer, Literal, Text};
    use crate::testing::{test_complete, test_parse};
    use crate::ArgumentExt;

    fn positive(value: i32) -> Result<i32, ArgumentError> {
        if value > 0 {
            Ok(value)
        } else {
            Err(ArgumentError::rejected(
                "positive",
                value.to_string(),
                "must be positive",
                value,
            ))
        }
    }

    fn numbers() -> FirstOf<(), i32> {
        FirstOf::new(
            "number",
            vec![
                Integer::<u8>::new("small").map(|value| Ok(i32::from(value))).boxed(),
                Integer::<i32>::new("positive").map(positive).boxed(),
            ],
        )
        .unwrap()
    }

    fn target() -> FirstOf<(), String> {
        FirstOf::new(
            "target",
            vec![Literal::new("all").boxed(), Text::new("player").boxed()],
        )
        .unwrap()
    }

    fn with_defaults() -> FirstOf<(), i32> {
        FirstOf::new(
            "choice",
            vec![
                Integer::<i32>::new("a").or_default(1).boxed(),
                Integer::<i32>::new("b").or_default(2).boxed(),
            ],
        )
        .unwrap()
    }

    mod parse {
        use super::*;

        test_parse!(first_alternative, target(), ["all", "x"] => Ok(Some("all".to_string()), 1));
        test_parse!(second_alternative, target(), ["bob"] => Ok(Some("bob".to_string()), 1));
        test_parse!(first_value_wins, numbers(), ["7"] => Ok(Some(7), 1));
        test_parse!(later_alternative, numbers(), ["300"] => Ok(Some(300), 1));
        test_parse!(rejection_preferred, numbers(), ["-1"] => Error(ErrorKind::FilterRejected));
        test_parse!(first_error, numbers(), ["x"] => Error(ErrorKind::InvalidInput));
        test_parse!(
            absent_preferred,
            FirstOf::<(), i32>::new(
                "number",
                vec![
                    Integer::<i32>::new("a").optional().boxed(),
                    Integer::<i32>::new("b").map(positive).boxed(),
                ],
            )
            .unwrap(),
            ["x"] => Ok(None, 0)
        );
        test_parse!(
            deferral_preferred,
            FirstOf::<(), i32>::new(
                "number",
                vec![
                    Integer::<i32>::new("a").boxed(),
                    Integer::<i32>::new("b").or_default(1).boxed(),
                    Integer::<i32>::new("c").optional().boxed(),
                ],
            )
            .unwrap(),
            ["x"] => Deferred(ErrorKind::InvalidInput)
        );

        #[test]
        fn first_error_names_first_alternative() {
            let context = CommandContext::new();
            let mut cursor = TokenCursor::new(["x"]);
            let error = numbers()
                .parse_value(&CommandInput::new(()), context.view(), &mut cursor)
                .unwrap_err()
                .into_root_cause();
            assert_eq!(error.argument(), Some("small"));
        }

        #[test]
        fn stores_own_name() {
            let mut context = CommandContext::new();
            let mut cursor = TokenCursor::new(["300"]);
            numbers()
                .parse(&CommandInput::new(()), &mut context, &mut cursor)
                .unwrap();
            assert_eq!(context.get::<i32>("number"), Some(&300));
            assert_eq!(context.get::<i32>("positive"), Some(&300));
            assert!(!context.has("small"));
        }

        #[test]
        fn rejects_empty_definition() {
            let error = FirstOf::<(), i32>::new("number", Vec::new()).unwrap_err();
            assert_eq!(error, DefinitionError::NoArguments("number".to_string()));
        }
    }

    mod fallback {
        use super::*;

        fn deferred(argument: &FirstOf<(), i32>, cursor: &mut TokenCursor) -> FallbackSignal {
            let mut context = CommandContext::new();
            match argument.parse(&CommandInput::new(()), &mut context, cursor) {
                Err(ParseFailure::Deferred(signal)) => signal,
                other => panic!("expected Deferred, but found {:?}", other),
            }
        }

        #[test]
        fn collects_every_deferring_branch() {
            let mut cursor = TokenCursor::new(Vec::<String>::new());
            let signal = deferred(&with_defaults(), &mut cursor);
            assert_eq!(signal.argument(), "choice");
            match signal.cause() {
                SignalCause::Branches { first, others } => {
                    assert_eq!(first.0, 0);
                    assert_eq!(others.iter().map(|(index, _)| *index).collect::<Vec<_>>(), vec![1]);
                }
                cause => panic!("expected Branches, but found {:?}", cause),
            }
            assert_eq!(signal.root_cause().argument(), Some("a"));
        }

        #[test]
        fn resolves_first_branch() {
            let argument = with_defaults();
            let input = CommandInput::new(());
            let mut context = CommandContext::new();
            let mut cursor = TokenCursor::new(Vec::<String>::new());
            let signal = deferred(&argument, &mut cursor);
            let value = argument
                .parse_fallback(&input, &mut context, &mut cursor, signal, false)
                .unwrap();
            assert_eq!(value, Some(1));
            assert_eq!(context.get::<i32>("choice"), Some(&1));
            assert_eq!(context.get::<i32>("a"), Some(&1));
        }

        #[test]
        fn retries_later_branches() {
            let argument = FirstOf::<(), i32>::new(
                "choice",
                vec![
                    Integer::<i32>::new("a")
                        .or_fallback(Integer::<i32>::new("other"))
                        .unwrap()
                        .boxed(),
                    Integer::<i32>::new("b").or_default(2).boxed(),
                ],
            )
            .unwrap();
            let input = CommandInput::new(());
            let mut context = CommandContext::new();
            let mut cursor = TokenCursor::new(["x"]);
            let start = cursor.snapshot();
            let signal = deferred(&argument, &mut cursor);
            cursor.restore(start);
            let value = argument
                .parse_fallback(&input, &mut context, &mut cursor, signal, false)
                .unwrap();
            assert_eq!(value, Some(2));
            assert_eq!(cursor.position(), 0);
            assert!(!context.has("a"));
        }

        #[test]
        fn plain_signal_surfaces_root_cause() {
            let argument = with_defaults();
            let mut context = CommandContext::new();
            let mut cursor = TokenCursor::new(["x"]);
            let signal = FallbackSignal::new("choice", ArgumentError::missing("choice"));
            let error = argument
                .parse_fallback(&CommandInput::new(()), &mut context, &mut cursor, signal, true)
                .unwrap_err();
            assert_eq!(error.kind(), ErrorKind::MissingInput);
        }
    }

    mod format {
        use super::*;

        #[test]
        fn joined() {
            assert_eq!(target().reduced_format(), "all|player");
            assert_eq!(target().format(), "<all|player>");
            assert!(!target().is_optional());
            assert!(!target().is_fallback());
        }

        #[test]
        fn reversed() {
            assert_eq!(target().with_reversed_format().format(), "<player|all>");
        }

        #[test]
        fn display_name_based() {
            let argument = target().with_display_name("who").without_joined_format();
            assert_eq!(argument.reduced_format(), "who");
            assert_eq!(argument.format(), "<who>");
        }

        #[test]
        fn optional_if_any_alternative_is() {
            assert!(with_defaults().is_optional());
            assert!(with_defaults().is_fallback());
            assert_eq!(with_defaults().format(), "[a|b]");
        }

        #[test]
        fn skips_hidden_alternatives() {
            let argument = FirstOf::<(), String>::new(
                "target",
                vec![Literal::new("").boxed(), Text::new("player").boxed()],
            )
            .unwrap();
            assert_eq!(argument.reduced_format(), "player");
        }
    }

    mod completion {
        use super::*;

        fn keywords() -> FirstOf<(), String> {
            FirstOf::new(
                "keyword",
                vec![
                    Literal::new("all").boxed(),
                    Literal::new("any").boxed(),
                    Literal::new("none").boxed(),
                ],
            )
            .unwrap()
        }

        test_complete!(every_alternative, keywords(), ["a"] => ["all", "any"]);
        test_complete!(empty_token, keywords(), [""] => ["all", "any", "none"]);
        test_complete!(not_last_token, keywords(), ["a", ""] => []);

        #[test]
        fn respects_limit() {
            let input = CommandInput::new(()).with_max_suggestions(2);
            let context = CommandContext::new();
            let mut cursor = TokenCursor::new([""]);
            let suggestions = keywords().complete(&input, context.view(), &mut cursor);
            assert_eq!(suggestions, vec!["all", "any"]);
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn suggestions_never_exceed_limit(count in 1usize..40, limit in 0usize..30) {
                let arguments = (0..count)
                    .map(|index| Literal::new(format!("word{}", index)).boxed())
                    .collect();
                let argument = FirstOf::<(), String>::new("word", arguments).unwrap();
                let input = CommandInput::new(()).with_max_suggestions(limit);
                let context = CommandContext::new();
                let mut cursor = TokenCursor::new(["w"]);
                let suggestions = argument.complete(&input, context.view(), &mut cursor);
                prop_assert_eq!(suggestions.len(), count.min(limit));
            }

            #[test]
            fn failed_parse_restores_cursor(token in "[a-z]{1,6}") {
                let argument = numbers();
                let context = CommandContext::new();
                let mut cursor = TokenCursor::new([token.as_str(), "rest"]);
                let input = CommandInput::new(());
                let result = argument.parse_value(&input, context.view(), &mut cursor);
                prop_assert!(result.is_err());
                prop_assert_eq!(cursor.position(), 0);
            }
        }
    }
}
