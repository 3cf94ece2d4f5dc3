use super::{extend_capped, ArgumentName};
use crate::error::{ArgumentError, DefinitionError};
use crate::{
    default_format, join_formats, Argument, ArgumentInfo, ArgumentValue, CommandContext,
    CommandInput, ContextView, ErasedArgument, ParseResult, TokenCursor, ARGUMENTS_SEPARATOR,
};
use std::fmt;

type ComputeValue<T> = Box<dyn Fn(ContextView<'_>) -> Result<T, ArgumentError>>;

/// Parses a fixed list of arguments one after another
///
/// The children parse into a local copy of the context. Once all of them succeeded, the value of
/// the sequence is computed from that local context. [`Sequence::new`] uses the local context
/// itself as the value; [`Sequence::with_value`] accepts a function computing an arbitrary value.
/// When the sequence is parsed with [`parse`](Argument::parse), the values of the children are
/// copied into the parent context together with the sequence's own value.
///
/// Children must not be fallback-capable: the sequence has no way of resolving their deferrals.
///
/// ```
/// use cmdargs::arguments::{Integer, Literal, Sequence};
/// use cmdargs::{Argument, ArgumentExt, ArgumentInfo, CommandContext, CommandInput, TokenCursor};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let position: Sequence<(), _> = Sequence::new(
///     "position",
///     vec![
///         Literal::new("at").erased(),
///         Integer::<i32>::new("x").erased(),
///         Integer::<i32>::new("y").optional().erased(),
///     ],
/// )?;
/// assert_eq!(position.format(), "at <x> [y]");
///
/// let mut context = CommandContext::new();
/// let mut cursor = TokenCursor::new(["at", "3"]);
/// position.parse(&CommandInput::new(()), &mut context, &mut cursor).unwrap();
/// assert_eq!(context.get::<i32>("x"), Some(&3));
/// assert!(!context.has("y"));
/// # Ok(())
/// # }
/// ```
pub struct Sequence<S, T> {
    name: ArgumentName,
    arguments: Vec<Box<dyn ErasedArgument<S>>>,
    compute: ComputeValue<T>,
    joined_format: Option<String>,
}

impl<S> Sequence<S, CommandContext> {
    /// Creates a sequence whose value is the context its children parsed into.
    pub fn new(
        name: impl Into<String>,
        arguments: Vec<Box<dyn ErasedArgument<S>>>,
    ) -> Result<Self, DefinitionError> {
        Sequence::with_value(name, arguments, |context| Ok(context.fork()))
    }
}

impl<S, T> Sequence<S, T> {
    /// Creates a sequence whose value is computed by `compute` from the context its children
    /// parsed into.
    pub fn with_value<F>(
        name: impl Into<String>,
        arguments: Vec<Box<dyn ErasedArgument<S>>>,
        compute: F,
    ) -> Result<Self, DefinitionError>
    where
        F: Fn(ContextView<'_>) -> Result<T, ArgumentError> + 'static,
    {
        let name = name.into();
        if arguments.is_empty() {
            return Err(DefinitionError::NoArguments(name));
        }
        if let Some(argument) = arguments.iter().find(|argument| argument.is_fallback()) {
            return Err(DefinitionError::FallbackInSequence {
                sequence: name,
                argument: argument.name().to_string(),
            });
        }
        let joined_format = join_formats(
            arguments.iter().map(|argument| argument.format()),
            ARGUMENTS_SEPARATOR,
        );
        Ok(Sequence {
            name: ArgumentName::new(name),
            arguments,
            compute: Box::new(compute),
            joined_format: Some(joined_format),
        })
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.name.set_display_name(display_name);
        self
    }

    /// Uses the format derived from the display name instead of the children's joined formats.
    pub fn with_default_format(mut self) -> Self {
        self.joined_format = None;
        self
    }

    pub fn arguments(&self) -> &[Box<dyn ErasedArgument<S>>] {
        &self.arguments
    }

    fn parse_local(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Result<(CommandContext, T), ArgumentError> {
        let mut local = context.fork();
        for argument in &self.arguments {
            argument
                .parse_into(input, &mut local, cursor)
                .map_err(|failure| failure.into_root_cause())?;
        }
        let value = (self.compute)(local.view())?;
        Ok((local, value))
    }
}

impl<S, T> fmt::Debug for Sequence<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
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

impl<S, T> ArgumentInfo for Sequence<S, T> {
    fn name(&self) -> &str {
        self.name.name()
    }

    fn display_name(&self) -> &str {
        self.name.display_name()
    }

    fn is_optional(&self) -> bool {
        self.arguments.iter().all(|argument| argument.is_optional())
    }

    fn reduced_format(&self) -> String {
        match &self.joined_format {
            Some(format) => format.clone(),
            None => self.display_name().to_string(),
        }
    }

    fn format(&self) -> String {
        match &self.joined_format {
            Some(format) => format.clone(),
            None => default_format(&self.reduced_format(), self.is_optional()),
        }
    }
}

impl<S, T: Clone + 'static> ArgumentValue for Sequence<S, T> {
    type Value = T;
}

impl<S, T: Clone + 'static> Argument<S> for Sequence<S, T> {
    fn parse(
        &self,
        input: &CommandInput<S>,
        context: &mut CommandContext,
        cursor: &mut TokenCursor,
    ) -> ParseResult<T> {
        let (local, value) = self.parse_local(input, context.view(), cursor)?;
        context.merge(&local);
        context.put(self.name(), value.clone());
        Ok(Some(value))
    }

    fn parse_value(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<T> {
        let (_, value) = self.parse_local(input, context, cursor)?;
        Ok(Some(value))
    }

    fn complete(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        let limit = input.max_suggestions();
        let mut suggestions = Vec::new();
        let mut local = context.fork();
        for argument in &self.arguments {
            let remaining = cursor.remaining_count();
            if remaining == 0 {
                break;
            }
            let snapshot = cursor.snapshot();
            let parsed = argument.parse_into(input, &mut local, cursor).is_ok();
            let consumed = cursor.remaining_count() != remaining;
            if parsed && consumed && cursor.has_next() {
                continue;
            }
            if !parsed && !consumed {
                // Hidden arguments that need no input fail here without affecting the others.
                cursor.restore(snapshot);
                continue;
            }

            cursor.restore(snapshot);
            let argument_suggestions = argument.suggest(input, local.view(), cursor);
            cursor.restore(snapshot);
            if extend_capped(&mut suggestions, argument_suggestions, limit) {
                break;
            }
            if parsed && !consumed {
                continue;
            }
            break;
        }
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{Boolean, Integer, Literal};
    use crate::error::ErrorKind;
    use crate::testing::{test_complete, test_parse};
    use crate::ArgumentExt;

    fn teleport() -> Sequence<(), CommandContext> {
        Sequence::new(
            "teleport",
            vec![
                Literal::new("tp").erased(),
                Integer::<i32>::new("x").erased(),
                Integer::<i32>::new("y").erased(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn parses_all_children() {
        let mut cursor = TokenCursor::new(["tp", "3", "4"]);
        let context = CommandContext::new();
        let value = teleport()
            .parse_value(&CommandInput::new(()), context.view(), &mut cursor)
            .unwrap()
            .unwrap();
        assert_eq!(value.names().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(value.get::<i32>("x"), Some(&3));
        assert_eq!(value.get::<i32>("y"), Some(&4));
        assert!(!cursor.has_next());
    }

    test_parse!(missing_last, teleport(), ["tp", "3"] => Error(ErrorKind::MissingInput));
    test_parse!(invalid_first, teleport(), ["go", "3", "4"] => Error(ErrorKind::InvalidInput));

    #[test]
    fn missing_names_argument() {
        let mut cursor = TokenCursor::new(["tp", "3"]);
        let context = CommandContext::new();
        let error = teleport()
            .parse_value(&CommandInput::new(()), context.view(), &mut cursor)
            .unwrap_err()
            .into_root_cause();
        assert_eq!(error.argument(), Some("y"));
    }

    #[test]
    fn computed_value() {
        let sum = Sequence::with_value(
            "sum",
            vec![
                Integer::<i32>::new("a").erased(),
                Integer::<i32>::new("b").erased(),
            ],
            |context| {
                let a = context.get::<i32>("a").copied().unwrap_or_default();
                let b = context.get::<i32>("b").copied().unwrap_or_default();
                Ok(a + b)
            },
        )
        .unwrap();
        let mut context = CommandContext::new();
        let mut cursor = TokenCursor::new(["2", "5"]);
        let value = sum
            .parse(&CommandInput::new(()), &mut context, &mut cursor)
            .unwrap();
        assert_eq!(value, Some(7));
        assert_eq!(context.get::<i32>("sum"), Some(&7));
        assert_eq!(context.get::<i32>("a"), Some(&2));
    }

    #[test]
    fn failure_leaves_parent_untouched() {
        let mut context = CommandContext::new();
        let mut cursor = TokenCursor::new(["tp", "3", "x"]);
        assert!(teleport()
            .parse(&CommandInput::new(()), &mut context, &mut cursor)
            .is_err());
        assert!(context.is_empty());
    }

    #[test]
    fn rejects_invalid_definitions() {
        let error = Sequence::<(), _>::new("empty", Vec::new()).unwrap_err();
        assert_eq!(error, DefinitionError::NoArguments("empty".to_string()));

        let error = Sequence::<(), _>::new(
            "s",
            vec![
                Literal::new("a").erased(),
                Integer::<i32>::new("b").or_default(1).erased(),
            ],
        )
        .unwrap_err();
        assert_eq!(
            error,
            DefinitionError::FallbackInSequence {
                sequence: "s".to_string(),
                argument: "b".to_string(),
            }
        );
    }

    mod format {
        use super::*;

        #[test]
        fn joined() {
            assert_eq!(teleport().format(), "tp <x> <y>");
            assert_eq!(teleport().reduced_format(), "tp <x> <y>");
            assert!(!teleport().is_optional());
        }

        #[test]
        fn skips_hidden_children() {
            let sequence = Sequence::<(), _>::new(
                "s",
                vec![Integer::<i32>::new("a").erased(), Literal::new("").erased()],
            )
            .unwrap();
            assert_eq!(sequence.format(), "<a>");
        }

        #[test]
        fn default_format() {
            let sequence = teleport().with_display_name("destination").with_default_format();
            assert_eq!(sequence.reduced_format(), "destination");
            assert_eq!(sequence.format(), "<destination>");
        }

        #[test]
        fn optional_when_all_children_are() {
            let sequence = Sequence::<(), _>::new(
                "s",
                vec![
                    Integer::<i32>::new("a").optional().erased(),
                    Integer::<i32>::new("b").optional().erased(),
                ],
            )
            .unwrap();
            assert!(sequence.is_optional());
            assert_eq!(sequence.format(), "[a] [b]");
        }
    }

    mod completion {
        use super::*;

        fn toggles() -> Sequence<(), CommandContext> {
            Sequence::new(
                "toggles",
                vec![
                    Literal::new("set").erased(),
                    Literal::new("force").optional().erased(),
                    Boolean::new("value").erased(),
                ],
            )
            .unwrap()
        }

        test_complete!(first_child, teleport(), ["t"] => ["tp"]);
        test_complete!(after_complete_child, teleport(), ["tp", ""] => []);
        test_complete!(invalid_prefix_stops, teleport(), ["x", ""] => []);
        test_complete!(
            vacuous_optional_lets_next_child_complete,
            toggles(),
            ["set", "f"] => ["force", "false"]
        );
        test_complete!(after_optional, toggles(), ["set", "force", "f"] => ["false"]);
        test_complete!(partial_last_token, toggles(), ["se"] => ["set"]);
        test_complete!(empty_input, teleport(), [] => []);

        #[test]
        fn respects_limit() {
            let sequence = toggles();
            let input = CommandInput::new(()).with_max_suggestions(1);
            let context = CommandContext::new();
            let mut cursor = TokenCursor::new(["set", ""]);
            let suggestions = sequence.complete(&input, context.view(), &mut cursor);
            assert_eq!(suggestions, vec!["force"]);
        }
    }
}
