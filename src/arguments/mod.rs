//! Argument parsers: leaves and combinators
//!
//! Leaf arguments ([`Literal`], [`Integer`], [`Text`], [`Boolean`]) consume tokens directly. Every
//! other argument in this module wraps one or more arguments and changes how their parsing,
//! storage or completion behaves. The [`ArgumentExt`](crate::ArgumentExt) trait provides builder
//! methods for the single-child wrappers.

mod alternation;
mod fallback;
mod named;
mod object_id;
mod optional;
mod primitives;
mod sequence;
mod transform;

pub use alternation::FirstOf;
pub use fallback::{
    DefaultValue, FallbackArgument, FixedValue, InvokerSource, InvokerValue, TargetedSource,
    TargetedValue,
};
pub use named::Named;
pub use object_id::{
    AcceptAny, ArgumentFilter, IdArgument, IdSource, ObjectById, ObjectId, ObjectResolver,
};
pub use optional::Optional;
pub use primitives::{Boolean, Integer, Literal, Text};
pub use sequence::Sequence;
pub use transform::Transform;

/// Returns `true` if `text` starts with `prefix`, ignoring ASCII case.
pub fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Appends `suggestions` to `target` until `target` holds `limit` entries.
///
/// Returns `true` if the limit has been reached.
pub(crate) fn extend_capped(
    target: &mut Vec<String>,
    suggestions: Vec<String>,
    limit: usize,
) -> bool {
    let available = limit.saturating_sub(target.len());
    target.extend(suggestions.into_iter().take(available));
    target.len() >= limit
}

/// Name and display name of an argument
#[derive(Debug, Clone)]
pub(crate) struct ArgumentName {
    name: String,
    display_name: Option<String>,
}

impl ArgumentName {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        ArgumentName {
            name: name.into(),
            display_name: None,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub(crate) fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.display_name = Some(display_name.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_case_prefix() {
        assert!(starts_with_ignore_case("Teleport", "tele"));
        assert!(starts_with_ignore_case("tp", ""));
        assert!(!starts_with_ignore_case("tp", "tpx"));
        assert!(!starts_with_ignore_case("über", "u"));
    }

    #[test]
    fn capped_extension() {
        let mut target = vec!["a".to_string()];
        assert!(!extend_capped(&mut target, vec!["b".to_string()], 3));
        assert!(extend_capped(
            &mut target,
            vec!["c".to_string(), "d".to_string()],
            3
        ));
        assert_eq!(target, vec!["a", "b", "c"]);
    }

    #[test]
    fn display_name_defaults_to_name() {
        let mut name = ArgumentName::new("x");
        assert_eq!(name.display_name(), "x");
        name.set_display_name("coordinate");
        assert_eq!(name.name(), "x");
        assert_eq!(name.display_name(), "coordinate");
    }
}
