//! The outermost argument holder
//!
//! A [`Command`] owns the top-level arguments of one command and drives the two passes of the
//! fallback protocol: arguments are parsed eagerly in order, deferring arguments are remembered,
//! and once the arguments after them have been tried the deferrals are resolved, most recent
//! first.

use crate::arguments::extend_capped;
use crate::error::{ArgumentError, DefinitionError, FallbackSignal, ParseFailure};
use crate::tokens::{tokenize_line, tokenize_partial_line, CursorSnapshot};
use crate::{
    join_formats, ArgumentInfo, CommandContext, CommandInput, ErasedArgument, TokenCursor,
    ARGUMENTS_SEPARATOR,
};
use std::collections::HashSet;
use std::fmt;
use std::mem;
use tracing::{debug, trace};

/// A deferral waiting for the arguments after it
struct PendingFallback {
    previous: Option<Box<PendingFallback>>,
    index: usize,
    signal: FallbackSignal,
    /// The context as it was before the deferring argument was parsed.
    context: CommandContext,
    snapshot: CursorSnapshot,
}

/// Ordered list of top-level arguments
///
/// ```
/// use cmdargs::arguments::{Integer, Literal};
/// use cmdargs::error::ErrorKind;
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
/// let error = command.parse_line(&input, "x items").unwrap_err();
/// assert_eq!(error.kind(), ErrorKind::InvalidInput);
/// assert_eq!(error.argument(), Some("count"));
/// assert_eq!(command.usage(), "[count] items");
/// # Ok(())
/// # }
/// ```
pub struct Command<S> {
    arguments: Vec<Box<dyn ErasedArgument<S>>>,
}

impl<S> Command<S> {
    /// Creates a command from its arguments.
    ///
    /// Fails if two arguments share a name.
    pub fn new(arguments: Vec<Box<dyn ErasedArgument<S>>>) -> Result<Self, DefinitionError> {
        let mut names = HashSet::new();
        for argument in &arguments {
            if !names.insert(argument.name()) {
                return Err(DefinitionError::DuplicateName(argument.name().to_string()));
            }
        }
        Ok(Command { arguments })
    }

    pub fn arguments(&self) -> &[Box<dyn ErasedArgument<S>>] {
        &self.arguments
    }

    /// Returns the argument named `name`.
    pub fn argument(&self, name: &str) -> Option<&dyn ErasedArgument<S>> {
        self.arguments
            .iter()
            .find(|argument| argument.name() == name)
            .map(|argument| argument.as_ref())
    }

    /// Returns the formats of the arguments joined with spaces.
    pub fn usage(&self) -> String {
        join_formats(
            self.arguments.iter().map(|argument| argument.format()),
            ARGUMENTS_SEPARATOR,
        )
    }

    /// Tokenizes `line` and parses it.
    pub fn parse_line(
        &self,
        input: &CommandInput<S>,
        line: &str,
    ) -> Result<CommandContext, ArgumentError> {
        let mut cursor = TokenCursor::new(tokenize_line(line));
        self.parse(input, &mut cursor)
    }

    /// Tokenizes the partially typed `line` and returns suggestions for its last token.
    pub fn complete_line(&self, input: &CommandInput<S>, line: &str) -> Vec<String> {
        let mut cursor = TokenCursor::new(tokenize_partial_line(line));
        self.complete(input, &mut cursor)
    }

    /// Parses every argument and returns the context holding their values.
    ///
    /// Fails if an argument cannot be parsed, or if tokens remain after the last argument.
    pub fn parse(
        &self,
        input: &CommandInput<S>,
        cursor: &mut TokenCursor,
    ) -> Result<CommandContext, ArgumentError> {
        let mut context = CommandContext::new();
        let mut pending: Option<Box<PendingFallback>> = None;
        let mut index = 0;
        while index < self.arguments.len() {
            let argument = &self.arguments[index];
            let snapshot = cursor.snapshot();
            let mut failure = None;
            match argument.parse_into(input, &mut context, cursor) {
                Ok(()) => {}
                Err(ParseFailure::Deferred(signal)) => {
                    debug!(argument = %argument.name(), index, %signal, "fallback registered");
                    cursor.restore(snapshot);
                    pending = Some(Box::new(PendingFallback {
                        previous: pending.take(),
                        index,
                        signal,
                        context: context.fork(),
                        snapshot,
                    }));
                }
                Err(ParseFailure::Error(error)) => {
                    cursor.restore(snapshot);
                    failure = Some(error);
                }
            }
            index =
                self.resolve_fallbacks(input, cursor, &mut context, &mut pending, index, failure)?;
            index += 1;
        }
        self.check_unparsed(cursor, &context)?;
        Ok(context)
    }

    /// Resolves pending fallbacks once the argument at `index` has been parsed, if needed.
    ///
    /// Returns the index of the last argument that counts as parsed; parsing continues after it.
    fn resolve_fallbacks(
        &self,
        input: &CommandInput<S>,
        cursor: &mut TokenCursor,
        context: &mut CommandContext,
        pending: &mut Option<Box<PendingFallback>>,
        mut index: usize,
        mut failure: Option<ArgumentError>,
    ) -> Result<usize, ArgumentError> {
        loop {
            let fallback = match pending.take() {
                Some(fallback) => fallback,
                None => {
                    return match failure {
                        Some(error) => Err(error),
                        None => Ok(index),
                    }
                }
            };
            let current_failed = failure.is_some();
            if !current_failed && index + 1 < self.arguments.len() {
                *pending = Some(fallback);
                return Ok(index);
            }

            let parsing_failed = current_failed || cursor.has_next();
            let PendingFallback {
                previous,
                index: fallback_index,
                signal,
                context: original,
                snapshot,
            } = *fallback;
            *pending = previous;
            let buffered = mem::replace(context, original);
            let resume = cursor.snapshot();
            if parsing_failed {
                cursor.restore(snapshot);
            }

            let argument = &self.arguments[fallback_index];
            let had_remaining = cursor.has_next();
            let start = cursor.snapshot();
            let root_cause = signal.root_cause().clone();
            let result =
                argument.parse_fallback_into(input, context, cursor, signal, parsing_failed);
            if result.is_err() {
                cursor.restore(start);
            }
            let consumed = cursor.snapshot() != start;
            debug!(
                argument = %argument.name(),
                index = fallback_index,
                parsing_failed,
                consumed,
                success = result.is_ok(),
                "fallback resolved"
            );

            if had_remaining && !consumed {
                debug!(
                    argument = %argument.name(),
                    %root_cause,
                    "input left for the fallback, failing with its root cause"
                );
                index = fallback_index;
                failure = Some(root_cause);
                continue;
            }
            match result {
                Err(error) => {
                    index = fallback_index;
                    failure = Some(error);
                }
                Ok(()) if consumed => return Ok(fallback_index),
                Ok(()) => {
                    context.merge(&buffered);
                    cursor.restore(resume);
                }
            }
        }
    }

    fn check_unparsed(
        &self,
        cursor: &TokenCursor,
        context: &CommandContext,
    ) -> Result<(), ArgumentError> {
        let token = match cursor.peek() {
            Some(token) => token,
            None => return Ok(()),
        };
        let first_unparsed = self
            .arguments
            .iter()
            .rev()
            .take_while(|argument| !context.has(argument.name()))
            .last();
        Err(match first_unparsed {
            Some(argument) => ArgumentError::invalid(argument.display_name(), token, None),
            None => ArgumentError::unexpected(token),
        })
    }

    /// Returns suggestions for the last token of the cursor.
    pub fn complete(&self, input: &CommandInput<S>, cursor: &mut TokenCursor) -> Vec<String> {
        let limit = input.max_suggestions();
        let mut suggestions = Vec::new();
        let mut context = CommandContext::new();
        for argument in &self.arguments {
            let remaining = cursor.remaining_count();
            if remaining == 0 {
                break;
            }
            let snapshot = cursor.snapshot();
            let outcome = argument.parse_into(input, &mut context, cursor);
            let consumed = cursor.remaining_count() != remaining;
            // A required argument that fails ends completion even if it consumed nothing.
            let (offer, stop) = match &outcome {
                Ok(()) if !cursor.has_next() => (true, true),
                Ok(()) if !consumed => (true, false),
                Ok(()) => continue,
                Err(ParseFailure::Deferred(_)) => (true, false),
                Err(ParseFailure::Error(_)) if argument.reduced_format().is_empty() => {
                    (true, false)
                }
                Err(ParseFailure::Error(_)) => (true, true),
            };
            trace!(argument = %argument.name(), offer, stop, "completion step");

            cursor.restore(snapshot);
            if offer {
                let offered = argument.suggest(input, context.view(), cursor);
                cursor.restore(snapshot);
                if extend_capped(&mut suggestions, offered, limit) {
                    break;
                }
            }
            if stop {
                break;
            }
        }
        suggestions
    }
}

impl<S> fmt::Debug for Command<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("usage", &self.usage())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{Boolean, Integer, Literal, Text};
    use crate::error::ErrorKind;
    use crate::ArgumentExt;

    fn teleport() -> Command<()> {
        Command::new(vec![
            Literal::new("tp").erased(),
            Integer::<i32>::new("x").erased(),
            Integer::<i32>::new("y").erased(),
        ])
        .unwrap()
    }

    fn known_player(name: String) -> Result<String, ArgumentError> {
        if ["alice", "bob"].contains(&name.as_str()) {
            Ok(name)
        } else {
            Err(ArgumentError::invalid("player", name, Some("unknown player".into())))
        }
    }

    type Invoker = Option<&'static str>;

    fn list() -> Command<Invoker> {
        Command::new(vec![
            Text::new("player")
                .map(known_player)
                .or_invoker("player", |invoker: &Invoker| invoker.map(str::to_string))
                .erased(),
            Integer::<u32>::new("page").or_default(1).erased(),
        ])
        .unwrap()
    }

    fn player(context: &CommandContext) -> Option<&str> {
        context.get::<String>("player").map(String::as_str)
    }

    mod parse {
        use super::*;

        #[test]
        fn all_arguments() {
            let context = teleport().parse_line(&CommandInput::new(()), "tp 3 4").unwrap();
            assert_eq!(context.names().collect::<Vec<_>>(), vec!["x", "y"]);
            assert_eq!(context.get::<i32>("x"), Some(&3));
            assert_eq!(context.get::<i32>("y"), Some(&4));
        }

        #[test]
        fn missing_argument() {
            let error = teleport().parse_line(&CommandInput::new(()), "tp 3").unwrap_err();
            assert_eq!(error.kind(), ErrorKind::MissingInput);
            assert_eq!(error.argument(), Some("y"));
        }

        #[test]
        fn unexpected_token() {
            let error = teleport()
                .parse_line(&CommandInput::new(()), "tp 3 4 5")
                .unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Unexpected);
            assert_eq!(error.input(), Some("5"));
            assert_eq!(error.to_string(), "unexpected argument: \"5\"");
        }

        #[test]
        fn leftover_blamed_on_absent_argument() {
            let command: Command<()> = Command::new(vec![
                Integer::<i32>::new("x").erased(),
                Integer::<i32>::new("y").optional().erased(),
            ])
            .unwrap();
            let error = command.parse_line(&CommandInput::new(()), "1 a").unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidInput);
            assert_eq!(error.argument(), Some("y"));
            assert_eq!(error.input(), Some("a"));
        }

        #[test]
        fn no_arguments() {
            let command = Command::<()>::new(Vec::new()).unwrap();
            assert!(command.parse_line(&CommandInput::new(()), "").unwrap().is_empty());
            let error = command.parse_line(&CommandInput::new(()), "x").unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Unexpected);
        }

        #[test]
        fn duplicate_names() {
            let error = Command::<()>::new(vec![
                Integer::<i32>::new("x").erased(),
                Text::new("x").erased(),
            ])
            .unwrap_err();
            assert_eq!(error, DefinitionError::DuplicateName("x".to_string()));
        }

        #[test]
        fn argument_lookup() {
            let command = teleport();
            let format = command.argument("y").map(|argument| argument.format());
            assert_eq!(format, Some("<y>".to_string()));
            assert!(command.argument("z").is_none());
        }
    }

    mod fallback {
        use super::*;

        #[test]
        fn explicit_values() {
            let input = CommandInput::new(Some("carol"));
            let context = list().parse_line(&input, "bob 3").unwrap();
            assert_eq!(player(&context), Some("bob"));
            assert_eq!(context.get::<u32>("page"), Some(&3));
        }

        #[test]
        fn following_argument_takes_the_token() {
            let input = CommandInput::new(Some("carol"));
            let context = list().parse_line(&input, "2").unwrap();
            assert_eq!(player(&context), Some("carol"));
            assert_eq!(context.get::<u32>("page"), Some(&2));
        }

        #[test]
        fn every_fallback_applies() {
            let input = CommandInput::new(Some("carol"));
            let context = list().parse_line(&input, "").unwrap();
            assert_eq!(player(&context), Some("carol"));
            assert_eq!(context.get::<u32>("page"), Some(&1));
        }

        #[test]
        fn unresolvable_input_reports_first_argument() {
            let input = CommandInput::new(Some("carol"));
            let error = list().parse_line(&input, "zed 3").unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidInput);
            assert_eq!(error.argument(), Some("player"));
            assert_eq!(error.input(), Some("zed"));
        }

        #[test]
        fn missing_invoker_reparses_original() {
            let input: CommandInput<Invoker> = CommandInput::new(None);
            let error = list().parse_line(&input, "").unwrap_err();
            assert_eq!(error.kind(), ErrorKind::MissingInput);
            assert_eq!(error.argument(), Some("player"));

            let context = list().parse_line(&input, "alice").unwrap();
            assert_eq!(player(&context), Some("alice"));
            assert_eq!(context.get::<u32>("page"), Some(&1));
        }

        #[test]
        fn consuming_fallback_restarts_parsing() {
            let command: Command<()> = Command::new(vec![
                Integer::<i32>::new("id")
                    .or_fallback(Text::new("id").map(|text| Ok(text.len() as i32)))
                    .unwrap()
                    .erased(),
                Integer::<i32>::new("amount").erased(),
            ])
            .unwrap();
            let context = command.parse_line(&CommandInput::new(()), "abc 5").unwrap();
            assert_eq!(context.get::<i32>("id"), Some(&3));
            assert_eq!(context.get::<i32>("amount"), Some(&5));
        }

        #[test]
        fn unused_fallback_reports_original_error() {
            let command: Command<()> = Command::new(vec![
                Integer::<i32>::new("id")
                    .or_fallback(Integer::<i32>::new("other"))
                    .unwrap()
                    .erased(),
                Integer::<i32>::new("amount").erased(),
            ])
            .unwrap();
            let error = command.parse_line(&CommandInput::new(()), "abc 5").unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidInput);
            assert_eq!(error.argument(), Some("id"));
        }

        #[test]
        fn fallback_keeps_argument_order_of_buffered_values() {
            let command: Command<()> = Command::new(vec![
                Literal::new("give").erased(),
                Integer::<u32>::new("count").or_default(1).erased(),
                Text::new("item").erased(),
            ])
            .unwrap();
            let context = command.parse_line(&CommandInput::new(()), "give apple").unwrap();
            assert_eq!(context.names().collect::<Vec<_>>(), vec!["count", "item"]);
            assert_eq!(context.get::<u32>("count"), Some(&1));
        }
    }

    mod completion {
        use super::*;

        fn complete(command: &Command<()>, line: &str) -> Vec<String> {
            command.complete_line(&CommandInput::new(()), line)
        }

        #[test]
        fn first_argument() {
            assert_eq!(complete(&teleport(), "t"), vec!["tp"]);
            assert_eq!(complete(&teleport(), ""), vec!["tp"]);
        }

        #[test]
        fn later_argument() {
            let command: Command<()> = Command::new(vec![
                Literal::new("set").erased(),
                Boolean::new("value").erased(),
            ])
            .unwrap();
            assert_eq!(complete(&command, "set "), vec!["true", "false"]);
            assert_eq!(complete(&command, "set f"), vec!["false"]);
            assert!(complete(&command, "set false ").is_empty());
            assert!(complete(&command, "get f").is_empty());
        }

        #[test]
        fn deferring_argument_continues() {
            let command: Command<()> = Command::new(vec![
                Boolean::new("flag").or_default(false).erased(),
                Literal::new("toggle").erased(),
            ])
            .unwrap();
            assert_eq!(complete(&command, "t"), vec!["true", "toggle"]);
        }

        #[test]
        fn hidden_argument_continues() {
            let command: Command<()> = Command::new(vec![
                Literal::new("").with_name("hidden").erased(),
                Literal::new("go").erased(),
            ])
            .unwrap();
            assert_eq!(complete(&command, "g"), vec!["go"]);
        }

        #[test]
        fn partially_typed_name() {
            let command: Command<()> = Command::new(vec![Boolean::new("flag").named().erased()])
                .unwrap();
            assert_eq!(complete(&command, "fl"), vec!["flag=", "flag=true", "flag=false"]);
            assert_eq!(complete(&command, "flag=t"), vec!["flag=true"]);
            assert_eq!(complete(&command, "flag="), vec!["flag=true", "flag=false"]);
        }

        #[test]
        fn unfilled_required_argument_stops() {
            let command: Command<()> = Command::new(vec![
                Integer::<u32>::new("n").named().erased(),
                Literal::new("go").erased(),
            ])
            .unwrap();
            assert!(complete(&command, "g").is_empty());
            assert_eq!(complete(&command, "n=1 g"), vec!["go"]);
        }

        #[test]
        fn respects_limit() {
            let command: Command<()> = Command::new(vec![
                Boolean::new("flag").or_default(false).erased(),
                Literal::new("toggle").erased(),
            ])
            .unwrap();
            let input = CommandInput::new(()).with_max_suggestions(1);
            assert_eq!(command.complete_line(&input, ""), vec!["true"]);
        }
    }

    #[test]
    fn usage() {
        assert_eq!(teleport().usage(), "tp <x> <y>");
        assert_eq!(list().usage(), "[player] [page]");
        assert_eq!(format!("{:?}", teleport()), "Command { usage: \"tp <x> <y>\" }");
    }
}
