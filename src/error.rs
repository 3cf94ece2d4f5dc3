//! Types related to the failure conditions of the parsing process.
//!
//! Parsing can fail in two different ways, both represented by [`ParseFailure`]:
//!  * the input is invalid for an argument: this is an [`ArgumentError`], the user-facing
//!    diagnosis;
//!  * a fallback-capable argument could not produce a value yet and asks its holder to try the
//!    following arguments first: this is a [`FallbackSignal`]. Signals are internal control flow
//!    and are always resolved into a value or an [`ArgumentError`] before the parse returns.
//!
//! Mistakes in how arguments are composed are reported at construction time as
//! [`DefinitionError`].

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Discriminant of an [`ArgumentError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required token is absent.
    MissingInput,
    /// A token is present but cannot be parsed into the expected shape.
    InvalidInput,
    /// A value was parsed but rejected by an acceptance filter.
    FilterRejected,
    /// The argument is only meaningful for a particular kind of invoker.
    RequiresInvoker,
    /// Tokens remain after every argument has been parsed.
    Unexpected,
}

/// A value rejected by an acceptance filter
///
/// The value is type-erased; callers that know the argument's value type can recover it with
/// [`downcast_ref`](RejectedValue::downcast_ref).
#[derive(Clone)]
pub struct RejectedValue(Rc<dyn Any>);

impl RejectedValue {
    pub fn new<T: 'static>(value: T) -> Self {
        RejectedValue(Rc::new(value))
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for RejectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RejectedValue(..)")
    }
}

fn reason_suffix(reason: &Option<Cow<'static, str>>) -> String {
    match reason {
        Some(reason) => format!(" ({})", reason),
        None => String::new(),
    }
}

/// User-facing parsing error
///
/// Every variant names the argument that failed (by its display name) so that the error can be
/// rendered without access to the argument tree.
#[derive(Debug, Clone, Error)]
pub enum ArgumentError {
    /// A required token is absent.
    #[error("missing argument: {argument}")]
    MissingInput { argument: String },

    /// A token is present but cannot be parsed.
    #[error("invalid {argument}: {input:?}{}", reason_suffix(.reason))]
    InvalidInput {
        argument: String,
        input: String,
        reason: Option<Cow<'static, str>>,
    },

    /// A value was parsed successfully but rejected by a filter.
    ///
    /// `input` holds the consumed tokens joined by the arguments separator.
    #[error("{message}")]
    FilterRejected {
        argument: String,
        input: String,
        message: String,
        value: RejectedValue,
    },

    /// The argument requires an invoker of a specific kind, which is not available.
    #[error("{argument} can only be used by a {invoker}")]
    RequiresInvoker {
        argument: String,
        invoker: Cow<'static, str>,
    },

    /// Input remains after every argument has been parsed.
    #[error("unexpected argument: {input:?}")]
    Unexpected { input: String },
}

impl ArgumentError {
    /// Creates an error for a required token that is absent.
    pub fn missing(argument: impl Into<String>) -> Self {
        ArgumentError::MissingInput {
            argument: argument.into(),
        }
    }

    /// Creates an error for a token that cannot be parsed. The optional `reason` is shown in
    /// parenthesis when the error is formatted.
    pub fn invalid(
        argument: impl Into<String>,
        input: impl Into<String>,
        reason: Option<Cow<'static, str>>,
    ) -> Self {
        ArgumentError::InvalidInput {
            argument: argument.into(),
            input: input.into(),
            reason,
        }
    }

    /// Creates an error for a parsed `value` that an acceptance filter rejected.
    pub fn rejected<T: 'static>(
        argument: impl Into<String>,
        input: impl Into<String>,
        message: impl Into<String>,
        value: T,
    ) -> Self {
        ArgumentError::FilterRejected {
            argument: argument.into(),
            input: input.into(),
            message: message.into(),
            value: RejectedValue::new(value),
        }
    }

    /// Creates an error for an argument that requires a specific kind of invoker.
    pub fn requires_invoker(
        argument: impl Into<String>,
        invoker: impl Into<Cow<'static, str>>,
    ) -> Self {
        ArgumentError::RequiresInvoker {
            argument: argument.into(),
            invoker: invoker.into(),
        }
    }

    /// Creates an error for a leftover token.
    pub fn unexpected(input: impl Into<String>) -> Self {
        ArgumentError::Unexpected {
            input: input.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ArgumentError::MissingInput { .. } => ErrorKind::MissingInput,
            ArgumentError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ArgumentError::FilterRejected { .. } => ErrorKind::FilterRejected,
            ArgumentError::RequiresInvoker { .. } => ErrorKind::RequiresInvoker,
            ArgumentError::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    /// Returns the display name of the argument that failed, if the error is attributed to one.
    pub fn argument(&self) -> Option<&str> {
        match self {
            ArgumentError::MissingInput { argument }
            | ArgumentError::InvalidInput { argument, .. }
            | ArgumentError::FilterRejected { argument, .. }
            | ArgumentError::RequiresInvoker { argument, .. } => Some(argument),
            ArgumentError::Unexpected { .. } => None,
        }
    }

    /// Returns the offending input, if the error carries one.
    pub fn input(&self) -> Option<&str> {
        match self {
            ArgumentError::InvalidInput { input, .. }
            | ArgumentError::FilterRejected { input, .. }
            | ArgumentError::Unexpected { input } => Some(input),
            ArgumentError::MissingInput { .. } | ArgumentError::RequiresInvoker { .. } => None,
        }
    }

    /// Returns the rejected value of a [`FilterRejected`](ArgumentError::FilterRejected) error.
    pub fn rejected_value(&self) -> Option<&RejectedValue> {
        match self {
            ArgumentError::FilterRejected { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns `true` for the two error kinds that depend on the invocation's circumstances rather
    /// than on the token contents: [`MissingInput`](ErrorKind::MissingInput) and
    /// [`RequiresInvoker`](ErrorKind::RequiresInvoker).
    pub fn is_circumstantial(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MissingInput | ErrorKind::RequiresInvoker
        )
    }
}

/// What made an argument defer
#[derive(Debug, Clone)]
pub enum SignalCause {
    /// The argument's primary strategy failed with this error.
    Error(ArgumentError),
    /// A wrapped child argument deferred.
    Nested(FallbackSignal),
    /// Several alternatives deferred. Each branch records the index of the deferring child.
    Branches {
        first: (usize, FallbackSignal),
        others: Vec<(usize, FallbackSignal)>,
    },
}

/// Deferred-evaluation control value
///
/// A `FallbackSignal` is returned (inside [`ParseFailure::Deferred`]) by a fallback-capable
/// argument that cannot produce a value yet. It records which argument deferred and why. Signals
/// form a chain when fallback-capable arguments are wrapped by other arguments; the innermost
/// concrete error is the [`root_cause`](FallbackSignal::root_cause).
#[derive(Debug, Clone)]
pub struct FallbackSignal {
    argument: String,
    cause: Box<SignalCause>,
}

impl FallbackSignal {
    /// Creates a signal for `argument` whose primary strategy failed with `error`.
    pub fn new(argument: impl Into<String>, error: ArgumentError) -> Self {
        FallbackSignal {
            argument: argument.into(),
            cause: Box::new(SignalCause::Error(error)),
        }
    }

    /// Creates a signal for `argument` that wraps a signal raised by one of its children.
    pub fn wrap(argument: impl Into<String>, signal: FallbackSignal) -> Self {
        FallbackSignal {
            argument: argument.into(),
            cause: Box::new(SignalCause::Nested(signal)),
        }
    }

    pub(crate) fn branches(
        argument: impl Into<String>,
        first: (usize, FallbackSignal),
        others: Vec<(usize, FallbackSignal)>,
    ) -> Self {
        FallbackSignal {
            argument: argument.into(),
            cause: Box::new(SignalCause::Branches { first, others }),
        }
    }

    /// Returns the name of the argument that deferred.
    pub fn argument(&self) -> &str {
        &self.argument
    }

    pub fn cause(&self) -> &SignalCause {
        &self.cause
    }

    pub fn into_cause(self) -> SignalCause {
        *self.cause
    }

    /// Returns the innermost concrete error of the chain.
    ///
    /// For signals raised by alternatives, the chain is followed through the first branch.
    pub fn root_cause(&self) -> &ArgumentError {
        let mut signal = self;
        loop {
            match signal.cause.as_ref() {
                SignalCause::Error(error) => return error,
                SignalCause::Nested(nested) => signal = nested,
                SignalCause::Branches { first, .. } => signal = &first.1,
            }
        }
    }

    /// Consumes the signal and returns its innermost concrete error.
    pub fn into_root_cause(self) -> ArgumentError {
        let mut signal = self;
        loop {
            match *signal.cause {
                SignalCause::Error(error) => return error,
                SignalCause::Nested(nested) => signal = nested,
                SignalCause::Branches { first, .. } => signal = first.1,
            }
        }
    }

    /// Unwraps one level of the chain.
    ///
    /// Returns the wrapped signal if this signal was created with [`wrap`](FallbackSignal::wrap),
    /// or gives the signal back otherwise.
    pub fn into_nested(self) -> Result<FallbackSignal, FallbackSignal> {
        match *self.cause {
            SignalCause::Nested(nested) => Ok(nested),
            cause => Err(FallbackSignal {
                argument: self.argument,
                cause: Box::new(cause),
            }),
        }
    }
}

impl fmt::Display for FallbackSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fallback pending for {}: {}",
            self.argument,
            self.root_cause()
        )
    }
}

/// Failed parsing result
///
/// See the [module documentation](self) for the distinction between the two variants.
#[derive(Debug, Clone)]
pub enum ParseFailure {
    /// The input is invalid.
    Error(ArgumentError),

    /// A fallback-capable argument deferred.
    Deferred(FallbackSignal),
}

impl ParseFailure {
    /// Returns a reference to the [`ArgumentError`] if this failure is an error.
    pub fn as_error(&self) -> Option<&ArgumentError> {
        if let ParseFailure::Error(error) = self {
            Some(error)
        } else {
            None
        }
    }

    /// Returns a reference to the [`FallbackSignal`] if this failure is a deferral.
    pub fn as_signal(&self) -> Option<&FallbackSignal> {
        if let ParseFailure::Deferred(signal) = self {
            Some(signal)
        } else {
            None
        }
    }

    /// Converts the failure into a concrete error, unwrapping signals to their root cause.
    pub fn into_root_cause(self) -> ArgumentError {
        match self {
            ParseFailure::Error(error) => error,
            ParseFailure::Deferred(signal) => signal.into_root_cause(),
        }
    }
}

impl From<ArgumentError> for ParseFailure {
    fn from(error: ArgumentError) -> Self {
        ParseFailure::Error(error)
    }
}

impl From<FallbackSignal> for ParseFailure {
    fn from(signal: FallbackSignal) -> Self {
        ParseFailure::Deferred(signal)
    }
}

/// Invalid composition of arguments, detected when the composite argument is constructed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("{0} requires at least one child argument")]
    NoArguments(String),

    #[error("sequence {sequence} cannot contain the fallback argument {argument}")]
    FallbackInSequence { sequence: String, argument: String },

    #[error("fallback of {argument} cannot be a fallback argument itself: {fallback}")]
    FallbackProducerIsFallback { argument: String, fallback: String },

    #[error("duplicate argument name: {0}")]
    DuplicateName(String),
}
