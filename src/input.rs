use crate::MAX_SUGGESTIONS;

/// Per-invocation data passed through every argument untouched
///
/// `CommandInput` carries the opaque invoker (whoever issued the command; its type is chosen by
/// the application) and the settings that apply to one parse or completion request.
///
/// ```
/// use cmdargs::CommandInput;
///
/// let input = CommandInput::new("console").with_max_suggestions(5);
/// assert_eq!(*input.invoker(), "console");
/// assert_eq!(input.max_suggestions(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct CommandInput<S> {
    invoker: S,
    max_suggestions: usize,
}

impl<S> CommandInput<S> {
    /// Creates a new input for the given invoker using the default suggestion cap
    /// ([`MAX_SUGGESTIONS`]).
    pub fn new(invoker: S) -> Self {
        CommandInput {
            invoker,
            max_suggestions: MAX_SUGGESTIONS,
        }
    }

    /// Overrides the maximum number of completion suggestions any aggregating argument returns.
    pub fn with_max_suggestions(mut self, max_suggestions: usize) -> Self {
        self.max_suggestions = max_suggestions;
        self
    }

    /// Returns the invoker of the command.
    pub fn invoker(&self) -> &S {
        &self.invoker
    }

    /// Returns the suggestion cap.
    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }
}
