//! Storage for the values parsed during one invocation

use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Insertion-ordered mapping from argument names to parsed values
///
/// Values are type-erased; they are retrieved with [`get`](CommandContext::get) by naming the
/// expected type. Cloning a context (or calling [`fork`](CommandContext::fork)) is cheap: values
/// are reference counted and never mutated once stored, so a fork can be filled speculatively and
/// dropped without affecting its parent.
///
/// ```
/// use cmdargs::context::CommandContext;
///
/// let mut context = CommandContext::new();
/// context.put("x", 3_i32);
///
/// let mut fork = context.fork();
/// fork.put("y", 4_i32);
///
/// assert_eq!(context.get::<i32>("x"), Some(&3));
/// assert!(!context.has("y"));
/// assert_eq!(fork.get::<i32>("y"), Some(&4));
/// ```
#[derive(Clone, Default)]
pub struct CommandContext {
    entries: IndexMap<String, Rc<dyn Any>>,
}

impl CommandContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under `name`, replacing any previous value with the same name.
    ///
    /// A replaced entry keeps its original position in the iteration order.
    pub fn put<T: 'static>(&mut self, name: impl Into<String>, value: T) {
        self.entries.insert(name.into(), Rc::new(value));
    }

    /// Returns the value stored under `name` if there is one and it has type `T`.
    pub fn get<T: 'static>(&self, name: &str) -> Option<&T> {
        self.entries.get(name)?.downcast_ref()
    }

    /// Returns `true` if a value is stored under `name`, regardless of its type.
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the number of stored values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the names of the stored values in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Creates an independent copy of this context.
    pub fn fork(&self) -> CommandContext {
        self.clone()
    }

    /// Copies every entry of `other` into this context.
    ///
    /// Entries of `other` overwrite entries with the same name; names not yet present are appended
    /// in `other`'s order.
    pub fn merge(&mut self, other: &CommandContext) {
        for (name, value) in &other.entries {
            self.entries.insert(name.clone(), Rc::clone(value));
        }
    }

    /// Returns a read-only view of this context.
    pub fn view(&self) -> ContextView<'_> {
        ContextView { context: self }
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Read-only access to a [`CommandContext`]
///
/// Arguments receive a view wherever they are not allowed to store values, most notably in
/// [`Argument::parse_value`](crate::Argument::parse_value) and during completion.
#[derive(Clone, Copy)]
pub struct ContextView<'c> {
    context: &'c CommandContext,
}

impl<'c> ContextView<'c> {
    /// Returns the value stored under `name` if there is one and it has type `T`.
    pub fn get<T: 'static>(&self, name: &str) -> Option<&'c T> {
        self.context.get(name)
    }

    /// Returns `true` if a value is stored under `name`.
    pub fn has(&self, name: &str) -> bool {
        self.context.has(name)
    }

    /// Returns the number of stored values.
    pub fn len(&self) -> usize {
        self.context.len()
    }

    /// Returns `true` if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.context.is_empty()
    }

    /// Returns the names of the stored values in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &'c str> + 'c {
        self.context.names()
    }

    /// Creates an independent, writable copy of the viewed context.
    pub fn fork(&self) -> CommandContext {
        self.context.fork()
    }
}

impl fmt::Debug for ContextView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.context, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_with_wrong_type() {
        let mut context = CommandContext::new();
        context.put("x", 3_i32);
        assert_eq!(context.get::<i64>("x"), None);
        assert!(context.has("x"));
    }

    #[test]
    fn preserves_insertion_order() {
        let mut context = CommandContext::new();
        context.put("b", 1_u8);
        context.put("a", 2_u8);
        context.put("b", 3_u8);
        assert_eq!(context.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(context.get::<u8>("b"), Some(&3));
    }

    #[test]
    fn fork_is_isolated() {
        let mut context = CommandContext::new();
        context.put("a", 1_u8);
        let mut fork = context.view().fork();
        fork.put("a", 2_u8);
        fork.put("b", 3_u8);
        assert_eq!(context.get::<u8>("a"), Some(&1));
        assert_eq!(context.len(), 1);
        assert_eq!(fork.len(), 2);
    }

    #[test]
    fn merge() {
        let mut parent = CommandContext::new();
        parent.put("a", 1_u8);
        parent.put("b", 2_u8);
        let mut other = CommandContext::new();
        other.put("c", 3_u8);
        other.put("a", 4_u8);
        parent.merge(&other);
        assert_eq!(parent.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(parent.get::<u8>("a"), Some(&4));
    }

    #[test]
    fn debug_lists_names() {
        let mut context = CommandContext::new();
        context.put("x", 3_i32);
        context.put("y", "text".to_string());
        assert_eq!(format!("{:?}", context), "{\"x\", \"y\"}");
        assert_eq!(format!("{:?}", context.view()), "{\"x\", \"y\"}");
    }
}
