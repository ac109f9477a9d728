//! Weft Lexer - annotation tokenization
//!
//! Declaration boundaries come from a [`SyntaxProvider`]; annotations come
//! from comment lines (`// weaver: api <- APIProtocol`) or from property
//! attributes (`@Weaver(.reference)`). Annotation bodies are lexed with logos.

mod declaration;
mod error;
pub mod grammar;
mod lexer;
mod scanner;
mod token;

pub use declaration::*;
pub use error::*;
pub use lexer::*;
pub use scanner::*;
pub use token::*;

/// Tokenize a source file using the built-in [`BraceScanner`]
pub fn tokenize(source: &str, file_name: &str, config: &LexerConfig) -> Result<Vec<Token>, LexerError> {
    tokenize_with(&BraceScanner, source, file_name, config)
}

/// Tokenize a source file with declarations extracted by `provider`
pub fn tokenize_with(
    provider: &dyn SyntaxProvider,
    source: &str,
    file_name: &str,
    config: &LexerConfig,
) -> Result<Vec<Token>, LexerError> {
    let records = provider.declarations(source);
    Lexer::new(source, file_name, config.clone()).tokenize(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_ast::AccessLevel;

    struct FixedProvider(Vec<DeclarationRecord>);

    impl SyntaxProvider for FixedProvider {
        fn declarations(&self, _source: &str) -> Vec<DeclarationRecord> {
            self.0.clone()
        }
    }

    #[test]
    fn test_tokenize_with_custom_provider() {
        let source = "type App {\n// weaver: api = API\n}\n";
        let mut record = DeclarationRecord::new(DeclarationKind::Class, "App", 0, 33).with_body(10);
        record.access_level = AccessLevel::Public;

        let tokens = tokenize_with(&FixedProvider(vec![record]), source, "app.x", &LexerConfig::default()).unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(matches!(tokens[0].kind, AnnotationToken::InjectableType(ref t) if t.access_level == AccessLevel::Public));
        assert!(matches!(tokens[1].kind, AnnotationToken::Register(_)));
        assert_eq!(tokens[2].kind, AnnotationToken::EndOfInjectableType);
        assert_eq!(tokens[2].line(), 2);
    }

    #[test]
    fn test_imports_are_tokens() {
        let source = "// weaver: import Networking\nclass A {}\n";
        let tokens = tokenize(source, "a.swift", &LexerConfig::default()).unwrap();
        assert_eq!(tokens[0].kind, AnnotationToken::Import("Networking".to_string()));
    }
}
