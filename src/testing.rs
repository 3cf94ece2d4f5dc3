#[macro_export]
macro_rules! test_parse {
    ($name:ident, $argument:expr, [$($token:expr),* $(,)?] => Ok($value:expr, $position:expr)) => {
        #[test]
        fn $name() {
            let argument = $argument;
            let input = $crate::CommandInput::new(());
            let context = $crate::CommandContext::new();
            let tokens: Vec<String> = vec![$($token.to_string()),*];
            let mut cursor = $crate::TokenCursor::new(tokens);
            let result = $crate::Argument::<()>::parse_value(&argument, &input, context.view(), &mut cursor);
            match result {
                Ok(value) => assert_eq!(value, $value),
                Err(failure) => panic!("expected Ok, but found {:?}", failure),
            }
            assert_eq!(cursor.position(), $position);
        }
    };
    ($name:ident, $argument:expr, [$($token:expr),* $(,)?] => Error($kind:expr)) => {
        #[test]
        fn $name() {
            let argument = $argument;
            let input = $crate::CommandInput::new(());
            let context = $crate::CommandContext::new();
            let tokens: Vec<String> = vec![$($token.to_string()),*];
            let mut cursor = $crate::TokenCursor::new(tokens);
            let result = $crate::Argument::<()>::parse_value(&argument, &input, context.view(), &mut cursor);
            match result {
                Err($crate::error::ParseFailure::Error(error)) => assert_eq!(error.kind(), $kind),
                Err($crate::error::ParseFailure::Deferred(signal)) => {
                    panic!("expected Error, but found {:?}", signal)
                }
                Ok(value) => panic!("expected Error, but found {:?}", value),
            }
        }
    };
    ($name:ident, $argument:expr, [$($token:expr),* $(,)?] => Deferred($kind:expr)) => {
        #[test]
        fn $name() {
            let argument = $argument;
            let input = $crate::CommandInput::new(());
            let context = $crate::CommandContext::new();
            let tokens: Vec<String> = vec![$($token.to_string()),*];
            let mut cursor = $crate::TokenCursor::new(tokens);
            let result = $crate::Argument::<()>::parse_value(&argument, &input, context.view(), &mut cursor);
            match result {
                Err($crate::error::ParseFailure::Deferred(signal)) => {
                    assert_eq!(signal.root_cause().kind(), $kind)
                }
                Err($crate::error::ParseFailure::Error(error)) => {
                    panic!("expected Deferred, but found {:?}", error)
                }
                Ok(value) => panic!("expected Deferred, but found {:?}", value),
            }
        }
    };
}
pub use test_parse;

#[macro_export]
macro_rules! test_complete {
    ($name:ident, $argument:expr, [$($token:expr),* $(,)?] => [$($suggestion:expr),* $(,)?]) => {
        #[test]
        fn $name() {
            let argument = $argument;
            let input = $crate::CommandInput::new(());
            let context = $crate::CommandContext::new();
            let tokens: Vec<String> = vec![$($token.to_string()),*];
            let mut cursor = $crate::TokenCursor::new(tokens);
            let suggestions = $crate::Argument::<()>::complete(&argument, &input, context.view(), &mut cursor);
            let expected: Vec<String> = vec![$($suggestion.to_string()),*];
            assert_eq!(suggestions, expected);
        }
    };
}
pub use test_complete;
