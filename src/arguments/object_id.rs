//! Resolution of textual identifiers
//!
//! [`ObjectId`] parses an id with a wrapped argument, checks it against an [`ArgumentFilter`] and
//! completes ids offered by an [`IdSource`]. [`ObjectById`] goes one step further and resolves the
//! parsed id to an object with an [`ObjectResolver`]. Sources, resolvers and filters are supplied by
//! the application; this module only implements the parsing and completion rules around them.

use super::ArgumentName;
use crate::error::ArgumentError;
use crate::{
    Argument, ArgumentInfo, ArgumentValue, CommandInput, ContextView, ParseResult, TokenCursor,
    ARGUMENTS_SEPARATOR,
};
use std::marker::PhantomData;

/// Candidate ids for completion
pub trait IdSource<S, I> {
    /// Returns the ids matching `prefix`.
    ///
    /// `prefix` is the partially typed id, possibly empty. Multi-token ids are joined with
    /// [`ARGUMENTS_SEPARATOR`].
    fn suggestions(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        prefix: &str,
    ) -> Vec<I>;

    /// Returns ids that are suggested before the others, even when the prefix is shorter than the
    /// minimum completion input. The currently targeted object is a typical example.
    fn pinned_suggestions(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        prefix: &str,
    ) -> Vec<I> {
        let _ = (input, context, prefix);
        Vec::new()
    }

    /// Renders an id the way the user types it.
    fn id_to_string(&self, id: &I) -> String;
}

/// Acceptance test for parsed values
///
/// Implemented by [`AcceptAny`] and by closures `Fn(&CommandInput<S>, ContextView, &T) -> bool`.
pub trait ArgumentFilter<S, T> {
    fn test(&self, input: &CommandInput<S>, context: ContextView<'_>, value: &T) -> bool;

    /// Message of the [`ArgumentError::FilterRejected`] error returned for a rejected value.
    fn rejection_message(&self, argument: &str, input: &str, value: &T) -> String {
        let _ = value;
        format!("{:?} is not an accepted {}", input, argument)
    }
}

/// Filter that accepts every value
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAny;

impl<S, T> ArgumentFilter<S, T> for AcceptAny {
    fn test(&self, _input: &CommandInput<S>, _context: ContextView<'_>, _value: &T) -> bool {
        true
    }
}

impl<S, T, F> ArgumentFilter<S, T> for F
where
    F: Fn(&CommandInput<S>, ContextView<'_>, &T) -> bool,
{
    fn test(&self, input: &CommandInput<S>, context: ContextView<'_>, value: &T) -> bool {
        self(input, context, value)
    }
}

/// Argument producing ids that can be rendered back to text
pub trait IdArgument<S>: Argument<S> {
    fn id_to_string(&self, id: &Self::Value) -> String;
}

/// Looks up the object an id refers to
///
/// Implemented by closures
/// `Fn(&CommandInput<S>, ContextView, &I) -> Result<Option<O>, ArgumentError>`.
pub trait ObjectResolver<S, I, O> {
    /// Returns `None` if no object has the id. An error can be returned, for example, for ids that
    /// match several objects.
    fn resolve(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        id: &I,
    ) -> Result<Option<O>, ArgumentError>;
}

impl<S, I, O, F> ObjectResolver<S, I, O> for F
where
    F: Fn(&CommandInput<S>, ContextView<'_>, &I) -> Result<Option<O>, ArgumentError>,
{
    fn resolve(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        id: &I,
    ) -> Result<Option<O>, ArgumentError> {
        self(input, context, id)
    }
}

/// Parses an id accepted by a filter and completes ids from an [`IdSource`]
///
/// The id itself is parsed by the wrapped argument, which may consume several tokens (see
/// [`Text::join_remaining`](super::Text::join_remaining)). Completion suggestions come from the
/// source: first its pinned suggestions, then the regular ones once the typed prefix has at least
/// the [minimum completion input](ObjectId::with_minimum_completion_input) length. Ids rejected by
/// the filter, empty ids and duplicates are skipped. When the id spans several tokens only the
/// part of each suggestion that belongs to the last token is offered.
#[derive(Debug, Clone)]
pub struct ObjectId<A, P, F = AcceptAny> {
    name: ArgumentName,
    argument: A,
    source: P,
    filter: F,
    minimum_completion_input: usize,
}

impl<A, P> ObjectId<A, P> {
    pub fn new(name: impl Into<String>, argument: A, source: P) -> Self {
        ObjectId {
            name: ArgumentName::new(name),
            argument,
            source,
            filter: AcceptAny,
            minimum_completion_input: 0,
        }
    }
}

impl<A, P, F> ObjectId<A, P, F> {
    pub fn with_filter<G>(self, filter: G) -> ObjectId<A, P, G> {
        ObjectId {
            name: self.name,
            argument: self.argument,
            source: self.source,
            filter,
            minimum_completion_input: self.minimum_completion_input,
        }
    }

    /// Suppresses regular suggestions until the typed prefix has at least `length` characters.
    pub fn with_minimum_completion_input(mut self, length: usize) -> Self {
        self.minimum_completion_input = length;
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.name.set_display_name(display_name);
        self
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    fn suggest_ids<S, I>(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        prefix: &str,
        token_count: usize,
    ) -> Vec<String>
    where
        P: IdSource<S, I>,
        F: ArgumentFilter<S, I>,
    {
        let mut candidates = self.source.pinned_suggestions(input, context, prefix);
        if prefix.chars().count() >= self.minimum_completion_input {
            candidates.extend(self.source.suggestions(input, context, prefix));
        }

        let limit = input.max_suggestions();
        let mut suggestions: Vec<String> = Vec::new();
        for id in candidates {
            if suggestions.len() >= limit {
                break;
            }
            if !self.filter.test(input, context, &id) {
                continue;
            }
            let id_string = self.source.id_to_string(&id);
            if id_string.is_empty() {
                continue;
            }
            let suggestion = if token_count > 1 {
                last_id_part(&id_string, token_count).unwrap_or(id_string)
            } else {
                id_string
            };
            if !suggestions.contains(&suggestion) {
                suggestions.push(suggestion);
            }
        }
        suggestions
    }
}

/// Returns the part of `id` typed as the last of `token_count` tokens, or `None` if the id does not
/// have that many parts.
fn last_id_part(id: &str, token_count: usize) -> Option<String> {
    let parts: Vec<&str> = id.splitn(token_count, ARGUMENTS_SEPARATOR).collect();
    if parts.len() == token_count {
        parts.last().map(|part| part.to_string())
    } else {
        None
    }
}

impl<A, P, F> ArgumentInfo for ObjectId<A, P, F> {
    fn name(&self) -> &str {
        self.name.name()
    }

    fn display_name(&self) -> &str {
        self.name.display_name()
    }
}

impl<A: ArgumentValue, P, F> ArgumentValue for ObjectId<A, P, F> {
    type Value = A::Value;
}

impl<S, A, P, F> Argument<S> for ObjectId<A, P, F>
where
    A: Argument<S>,
    P: IdSource<S, A::Value>,
    F: ArgumentFilter<S, A::Value>,
{
    fn parse_value(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<A::Value> {
        if !cursor.has_next() {
            return Err(ArgumentError::missing(self.display_name()).into());
        }
        let start = cursor.snapshot();
        let id = match self
            .argument
            .parse_value(input, context, cursor)
            .map_err(|failure| failure.into_root_cause())?
        {
            Some(id) => id,
            None => return Ok(None),
        };
        if !self.filter.test(input, context, &id) {
            let consumed = cursor.consumed_since(start).join(ARGUMENTS_SEPARATOR);
            let message = self
                .filter
                .rejection_message(self.display_name(), &consumed, &id);
            return Err(ArgumentError::rejected(self.display_name(), consumed, message, id).into());
        }
        Ok(Some(id))
    }

    fn complete(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        if !cursor.has_next() {
            return Vec::new();
        }
        let start = cursor.snapshot();
        if self.argument.parse_value(input, context, cursor).is_ok() && cursor.has_next() {
            return Vec::new();
        }
        let typed = &cursor.all_tokens()[start.position()..];
        let prefix = typed.join(ARGUMENTS_SEPARATOR);
        self.suggest_ids(input, context, &prefix, typed.len())
    }
}

impl<S, A, P, F> IdArgument<S> for ObjectId<A, P, F>
where
    A: Argument<S>,
    P: IdSource<S, A::Value>,
    F: ArgumentFilter<S, A::Value>,
{
    fn id_to_string(&self, id: &A::Value) -> String {
        self.source.id_to_string(id)
    }
}

/// Parses an id and resolves it to an object
///
/// The id is parsed by an [`IdArgument`], usually an [`ObjectId`]. An id no object is found for is
/// reported as invalid input; an object rejected by the filter is reported as
/// [`ArgumentError::FilterRejected`] carrying the object. Completion is left to the id argument.
///
/// ```
/// use cmdargs::arguments::{IdSource, Integer, ObjectById, ObjectId};
/// use cmdargs::error::ArgumentError;
/// use cmdargs::{Argument, CommandContext, CommandInput, ContextView, TokenCursor};
///
/// struct Ports;
///
/// impl IdSource<(), u16> for Ports {
///     fn suggestions(&self, _: &CommandInput<()>, _: ContextView<'_>, _: &str) -> Vec<u16> {
///         vec![80, 443]
///     }
///
///     fn id_to_string(&self, id: &u16) -> String {
///         id.to_string()
///     }
/// }
///
/// fn service(
///     _: &CommandInput<()>,
///     _: ContextView<'_>,
///     port: &u16,
/// ) -> Result<Option<&'static str>, ArgumentError> {
///     Ok(match port {
///         80 => Some("http"),
///         443 => Some("https"),
///         _ => None,
///     })
/// }
///
/// let port = ObjectId::new("port", Integer::<u16>::new("port"), Ports);
/// let argument: ObjectById<_, _, &str> = ObjectById::new("service", port, service);
/// let mut context = CommandContext::new();
/// let mut cursor = TokenCursor::new(["443"]);
/// argument.parse(&CommandInput::new(()), &mut context, &mut cursor).unwrap();
/// assert_eq!(context.get::<&str>("service"), Some(&"https"));
///
/// let mut cursor = TokenCursor::new(["22"]);
/// let error = argument.parse(&CommandInput::new(()), &mut context, &mut cursor).unwrap_err();
/// assert_eq!(error.into_root_cause().to_string(), "invalid service: \"22\"");
/// ```
#[derive(Debug, Clone)]
pub struct ObjectById<A, R, O, F = AcceptAny> {
    name: ArgumentName,
    id: A,
    resolver: R,
    filter: F,
    _phantom: PhantomData<fn() -> O>,
}

impl<A, R, O> ObjectById<A, R, O> {
    pub fn new(name: impl Into<String>, id: A, resolver: R) -> Self {
        ObjectById {
            name: ArgumentName::new(name),
            id,
            resolver,
            filter: AcceptAny,
            _phantom: PhantomData,
        }
    }
}

impl<A, R, O, F> ObjectById<A, R, O, F> {
    pub fn with_filter<G>(self, filter: G) -> ObjectById<A, R, O, G> {
        ObjectById {
            name: self.name,
            id: self.id,
            resolver: self.resolver,
            filter,
            _phantom: PhantomData,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.name.set_display_name(display_name);
        self
    }

    pub fn id_argument(&self) -> &A {
        &self.id
    }
}

impl<A, R, O, F> ArgumentInfo for ObjectById<A, R, O, F> {
    fn name(&self) -> &str {
        self.name.name()
    }

    fn display_name(&self) -> &str {
        self.name.display_name()
    }
}

impl<A, R, O: Clone + 'static, F> ArgumentValue for ObjectById<A, R, O, F> {
    type Value = O;
}

impl<S, A, R, O, F> Argument<S> for ObjectById<A, R, O, F>
where
    A: IdArgument<S>,
    R: ObjectResolver<S, A::Value, O>,
    O: Clone + 'static,
    F: ArgumentFilter<S, O>,
{
    fn parse_value(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> ParseResult<O> {
        let id = match self
            .id
            .parse_value(input, context, cursor)
            .map_err(|failure| failure.into_root_cause())?
        {
            Some(id) => id,
            None => return Ok(None),
        };
        let id_string = self.id.id_to_string(&id);
        let object = match self.resolver.resolve(input, context, &id)? {
            Some(object) => object,
            None => return Err(ArgumentError::invalid(self.display_name(), id_string, None).into()),
        };
        if !self.filter.test(input, context, &object) {
            let message = self
                .filter
                .rejection_message(self.display_name(), &id_string, &object);
            return Err(
                ArgumentError::rejected(self.display_name(), id_string, message, object).into(),
            );
        }
        Ok(Some(object))
    }

    fn complete(
        &self,
        input: &CommandInput<S>,
        context: ContextView<'_>,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        self.id.complete(input, context, cursor)
    }
}
