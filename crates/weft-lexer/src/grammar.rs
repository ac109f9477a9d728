//! Annotation grammars
//!
//! An annotation body is lexed with [`TokenKind`] and matched against each
//! grammar in priority order: configuration, register, reference, scope,
//! parameter, import. The first grammar that matches wins.

use logos::Logos;
use weft_ast::{
    AttributeName, AttributeTarget, ConfigurationAnnotation, ConfigurationAttribute,
    ParameterAnnotation, Platform, ReferenceAnnotation, RegisterAnnotation, Scope, TypeIdentity,
};

use crate::{AnnotationToken, TokenError, TokenKind};

type GrammarResult = Result<Option<AnnotationToken>, TokenError>;

const GRAMMARS: [fn(&str) -> GrammarResult; 6] =
    [configuration, register, reference, scope, parameter, import];

/// Parse one comment line.
///
/// Returns `Ok(None)` when the line does not carry the sentinel.
pub fn annotation(line: &str, sentinel: &str) -> GrammarResult {
    let annotation = line.trim_matches(|c: char| c == '/' || c.is_whitespace());
    let Some(body) = strip_sentinel(annotation, sentinel) else {
        return Ok(None);
    };

    for grammar in GRAMMARS {
        if let Some(token) = grammar(body)? {
            return Ok(Some(token));
        }
    }
    Err(TokenError::InvalidAnnotation(annotation.to_string()))
}

fn strip_sentinel<'a>(annotation: &'a str, sentinel: &str) -> Option<&'a str> {
    let rest = annotation.strip_prefix(sentinel)?;
    let body = rest.trim_start().strip_prefix(':')?;
    Some(body.trim())
}

/// Parse a complete type name such as `Store<Key, [Int]>?`
pub fn parse_type_name(text: &str) -> Option<TypeIdentity> {
    let mut cursor = Cursor::new(text);
    let ty = cursor.parse_type()?;
    cursor.at_end().then_some(ty)
}

// === Grammars ===

/// `target.attribute = value`, any attribute but `scope`
fn configuration(body: &str) -> GrammarResult {
    let mut cursor = Cursor::new(body);
    let Some((target, name)) = cursor.attribute_assignment() else {
        return Ok(None);
    };
    if name == "scope" {
        return Ok(None);
    }

    let attribute = make_attribute(name, cursor.rest())?;
    let target = AttributeTarget::from_name(target);
    if !attribute.allows_target(&target) {
        return Err(TokenError::InvalidConfigurationAttributeTarget {
            name: attribute.name(),
            target,
        });
    }
    Ok(Some(AnnotationToken::Configuration(ConfigurationAnnotation {
        attribute,
        target,
    })))
}

/// `name = Type` or `name = Type <- AbstractType`
fn register(body: &str) -> GrammarResult {
    let mut cursor = Cursor::new(body);
    let matched = (|| {
        let name = cursor.eat(TokenKind::Ident)?;
        cursor.eat(TokenKind::Eq)?;
        let concrete_type = cursor.parse_type()?;
        let abstract_type = match cursor.eat(TokenKind::Arrow) {
            Some(_) => Some(cursor.parse_type()?),
            None => None,
        };
        cursor.at_end().then(|| RegisterAnnotation {
            name: name.to_string(),
            concrete_type,
            abstract_type,
        })
    })();
    Ok(matched.map(AnnotationToken::Register))
}

/// `name <- AbstractType` or `name <- A & B`
fn reference(body: &str) -> GrammarResult {
    let mut cursor = Cursor::new(body);
    let matched = (|| {
        let name = cursor.eat(TokenKind::Ident)?;
        cursor.eat(TokenKind::Arrow)?;
        let mut types = vec![cursor.parse_type()?];
        while cursor.eat(TokenKind::Amp).is_some() {
            types.push(cursor.parse_type()?);
        }
        cursor.at_end().then(|| ReferenceAnnotation {
            name: name.to_string(),
            types,
        })
    })();
    Ok(matched.map(AnnotationToken::Reference))
}

/// `name.scope = .scope`
fn scope(body: &str) -> GrammarResult {
    let mut cursor = Cursor::new(body);
    let Some((target, name)) = cursor.attribute_assignment() else {
        return Ok(None);
    };
    if name != "scope" {
        return Ok(None);
    }

    let target = AttributeTarget::from_name(target);
    if target == AttributeTarget::SelfType {
        return Err(TokenError::InvalidConfigurationAttributeTarget {
            name: AttributeName::Scope,
            target,
        });
    }
    let scope = scope_value(cursor.rest())?;
    Ok(Some(AnnotationToken::Configuration(ConfigurationAnnotation {
        attribute: ConfigurationAttribute::Scope(scope),
        target,
    })))
}

/// `name <= Type`
fn parameter(body: &str) -> GrammarResult {
    let mut cursor = Cursor::new(body);
    let matched = (|| {
        let name = cursor.eat(TokenKind::Ident)?;
        cursor.eat(TokenKind::ParamArrow)?;
        let ty = cursor.parse_type()?;
        cursor.at_end().then(|| ParameterAnnotation {
            name: name.to_string(),
            ty,
        })
    })();
    Ok(matched.map(AnnotationToken::Parameter))
}

/// `import Module`
fn import(body: &str) -> GrammarResult {
    let mut cursor = Cursor::new(body);
    let matched = (|| {
        cursor.eat_keyword("import")?;
        let module = cursor.eat(TokenKind::Ident)?;
        cursor.at_end().then(|| module.to_string())
    })();
    Ok(matched.map(AnnotationToken::Import))
}

// === Attribute values ===

/// Build an attribute from its name and raw value text
pub fn make_attribute(name: &str, value: &str) -> Result<ConfigurationAttribute, TokenError> {
    let Some(attribute) = AttributeName::from_name(name) else {
        return Err(TokenError::UnknownConfigurationAttribute(name.to_string()));
    };
    let value = value.trim();

    Ok(match attribute {
        AttributeName::Scope => ConfigurationAttribute::Scope(scope_value(value)?),
        AttributeName::IsIsolated => ConfigurationAttribute::IsIsolated(bool_value(value)?),
        AttributeName::AllowsCycles => ConfigurationAttribute::AllowsCycles(bool_value(value)?),
        AttributeName::Objc => ConfigurationAttribute::Objc(bool_value(value)?),
        AttributeName::CustomRef => ConfigurationAttribute::CustomRef(bool_value(value)?),
        AttributeName::Setter => ConfigurationAttribute::Setter(bool_value(value)?),
        AttributeName::Builder => {
            if value.is_empty() {
                return Err(invalid_value(value, "<expression>"));
            }
            ConfigurationAttribute::Builder(value.to_string())
        }
        AttributeName::Platforms => ConfigurationAttribute::Platforms(platforms_value(value)?),
        AttributeName::Projects => ConfigurationAttribute::Projects(projects_value(value)?),
    })
}

fn invalid_value(value: &str, expected: &str) -> TokenError {
    TokenError::InvalidConfigurationAttributeValue {
        value: value.to_string(),
        expected: expected.to_string(),
    }
}

fn bool_value(value: &str) -> Result<bool, TokenError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid_value(value, "true|false")),
    }
}

fn scope_value(value: &str) -> Result<Scope, TokenError> {
    value
        .trim()
        .strip_prefix('.')
        .and_then(Scope::from_name)
        .ok_or_else(|| TokenError::InvalidScope(value.trim().to_string()))
}

fn list_items(value: &str) -> Option<Vec<&str>> {
    let inner = value.strip_prefix('[')?.strip_suffix(']')?.trim();
    if inner.is_empty() {
        return Some(Vec::new());
    }
    let items: Vec<&str> = inner.split(',').map(str::trim).collect();
    items.iter().all(|item| !item.is_empty()).then_some(items)
}

fn platforms_value(value: &str) -> Result<Vec<Platform>, TokenError> {
    let expected = || {
        let names: Vec<String> = Platform::ALL.iter().map(|p| format!(".{}", p)).collect();
        invalid_value(value, &format!("[{}]", names.join("|")))
    };
    let items = list_items(value).ok_or_else(expected)?;
    items
        .into_iter()
        .map(|item| {
            item.strip_prefix('.')
                .and_then(Platform::from_name)
                .ok_or_else(expected)
        })
        .collect()
}

fn projects_value(value: &str) -> Result<Vec<String>, TokenError> {
    let expected = || invalid_value(value, "[Project, ...]");
    let items = list_items(value).ok_or_else(expected)?;
    items
        .into_iter()
        .map(|item| {
            if is_identifier(item) {
                Ok(item.to_string())
            } else {
                Err(expected())
            }
        })
        .collect()
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// === Attribute style ===

/// The dependency kind selected by the first attribute argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeKind {
    Registration,
    Reference,
    Parameter,
}

/// Parse a property attribute such as
/// `@Weaver(.registration, type: API.self, scope: .container)`.
///
/// Returns `Ok(None)` when the attribute is not named after the sentinel.
pub fn property_attribute(
    text: &str,
    sentinel: &str,
    property_name: &str,
    property_type: Option<&str>,
) -> Result<Option<Vec<AnnotationToken>>, TokenError> {
    let text = text.trim();
    let invalid = || TokenError::InvalidAnnotation(text.to_string());

    let Some(inner) = text.strip_prefix('@') else {
        return Ok(None);
    };
    let (name, arguments) = match inner.find('(') {
        Some(open) => {
            let arguments = inner[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
            (&inner[..open], arguments)
        }
        None => (inner, ""),
    };
    if !name.trim().eq_ignore_ascii_case(sentinel) {
        return Ok(None);
    }

    let mut arguments = split_top_level(arguments).into_iter();
    let kind = match arguments.next() {
        Some(".registration") => AttributeKind::Registration,
        Some(".reference") => AttributeKind::Reference,
        Some(".parameter") => AttributeKind::Parameter,
        _ => return Err(invalid()),
    };
    let property_type = property_type
        .and_then(parse_type_name)
        .ok_or_else(invalid)?;

    let target = AttributeTarget::Dependency(property_name.to_string());
    let mut concrete_type = None;
    let mut configuration = Vec::new();
    for argument in arguments {
        let (key, value) = argument.split_once(':').ok_or_else(invalid)?;
        let (key, value) = (key.trim(), value.trim());
        if key == "type" {
            let type_name = value.strip_suffix(".self").unwrap_or(value);
            concrete_type = Some(parse_type_name(type_name).ok_or_else(invalid)?);
            continue;
        }

        let attribute = make_attribute(key, value)?;
        if !attribute.allows_target(&target) {
            return Err(TokenError::InvalidConfigurationAttributeTarget {
                name: attribute.name(),
                target,
            });
        }
        configuration.push(AnnotationToken::Configuration(ConfigurationAnnotation {
            attribute,
            target: target.clone(),
        }));
    }

    let name = property_name.to_string();
    let dependency = match kind {
        AttributeKind::Registration => {
            let concrete_type = concrete_type.unwrap_or_else(|| property_type.clone());
            let abstract_type = (concrete_type != property_type).then_some(property_type);
            AnnotationToken::Register(RegisterAnnotation {
                name,
                concrete_type,
                abstract_type,
            })
        }
        AttributeKind::Reference => AnnotationToken::Reference(ReferenceAnnotation {
            name,
            types: vec![property_type],
        }),
        AttributeKind::Parameter => AnnotationToken::Parameter(ParameterAnnotation {
            name,
            ty: property_type,
        }),
    };

    let mut tokens = vec![dependency];
    tokens.extend(configuration);
    Ok(Some(tokens))
}

/// Split on commas that are not nested in brackets
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, c) in text.char_indices() {
        match c {
            '(' | '[' | '<' => depth += 1,
            ')' | ']' | '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(text[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    parts
}

// === Cursor ===

#[derive(Debug, Clone, Copy)]
struct Lexeme {
    kind: TokenKind,
    start: usize,
    end: usize,
}

/// Recursive-descent cursor over the lexemes of one annotation body
struct Cursor<'a> {
    text: &'a str,
    lexemes: Vec<Lexeme>,
    pos: usize,
    prev_end: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        let lexemes = TokenKind::lexer(text)
            .spanned()
            .map(|(result, range)| Lexeme {
                kind: result.unwrap_or(TokenKind::Error),
                start: range.start,
                end: range.end,
            })
            .collect();
        Self {
            text,
            lexemes,
            pos: 0,
            prev_end: 0,
        }
    }

    fn peek(&self) -> Option<TokenKind> {
        self.lexemes.get(self.pos).map(|l| l.kind)
    }

    fn peek_ahead(&self, n: usize) -> Option<TokenKind> {
        self.lexemes.get(self.pos + n).map(|l| l.kind)
    }

    fn offset(&self) -> usize {
        self.lexemes
            .get(self.pos)
            .map(|l| l.start)
            .unwrap_or(self.text.len())
    }

    fn at_end(&self) -> bool {
        self.pos >= self.lexemes.len()
    }

    fn eat(&mut self, kind: TokenKind) -> Option<&'a str> {
        let lexeme = *self.lexemes.get(self.pos)?;
        if lexeme.kind != kind {
            return None;
        }
        self.pos += 1;
        self.prev_end = lexeme.end;
        Some(&self.text[lexeme.start..lexeme.end])
    }

    fn eat_keyword(&mut self, keyword: &str) -> Option<&'a str> {
        let lexeme = *self.lexemes.get(self.pos)?;
        if lexeme.kind != TokenKind::Ident || &self.text[lexeme.start..lexeme.end] != keyword {
            return None;
        }
        self.eat(TokenKind::Ident)
    }

    /// Remaining raw text, trimmed
    fn rest(&self) -> &'a str {
        self.text[self.offset()..].trim()
    }

    /// `ident . ident =`, leaving the cursor on the value
    fn attribute_assignment(&mut self) -> Option<(&'a str, &'a str)> {
        let target = self.eat(TokenKind::Ident)?;
        self.eat(TokenKind::Dot)?;
        let name = self.eat(TokenKind::Ident)?;
        self.eat(TokenKind::Eq)?;
        Some((target, name))
    }

    /// Parse a type, recording nested argument text as written
    fn parse_type(&mut self) -> Option<TypeIdentity> {
        if self.eat(TokenKind::LBracket).is_some() {
            let first = self.parse_type_text()?;
            let (name, generics) = if self.eat(TokenKind::Colon).is_some() {
                let second = self.parse_type_text()?;
                ("Dictionary", vec![first, second])
            } else {
                ("Array", vec![first])
            };
            self.eat(TokenKind::RBracket)?;
            let is_optional = self.eat(TokenKind::Question).is_some();
            return Some(TypeIdentity {
                name: name.to_string(),
                generics,
                is_optional,
            });
        }

        let mut name = self.eat(TokenKind::Ident)?.to_string();
        while self.peek() == Some(TokenKind::Dot) && self.peek_ahead(1) == Some(TokenKind::Ident) {
            self.eat(TokenKind::Dot)?;
            name.push('.');
            name.push_str(self.eat(TokenKind::Ident)?);
        }

        let mut generics = Vec::new();
        if self.eat(TokenKind::Lt).is_some() {
            loop {
                generics.push(self.parse_type_text()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.eat(TokenKind::Gt)?;
        }

        let is_optional = self.eat(TokenKind::Question).is_some();
        Some(TypeIdentity {
            name,
            generics,
            is_optional,
        })
    }

    fn parse_type_text(&mut self) -> Option<String> {
        let start = self.offset();
        self.parse_type()?;
        Some(self.text[start..self.prev_end].trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> GrammarResult {
        annotation(line, "weaver")
    }

    fn parse_ok(line: &str) -> AnnotationToken {
        match parse(line) {
            Ok(Some(token)) => token,
            other => panic!("expected a token for {:?}, got {:?}", line, other),
        }
    }

    #[test]
    fn test_lines_without_sentinel_are_ignored() {
        assert_eq!(parse("// just a comment"), Ok(None));
        assert_eq!(parse("// weaverish: api <- API"), Ok(None));
    }

    #[test]
    fn test_register_with_abstract_type() {
        let token = parse_ok("// weaver: session = Session <- SessionProtocol");
        assert_eq!(
            token,
            AnnotationToken::Register(RegisterAnnotation {
                name: "session".to_string(),
                concrete_type: TypeIdentity::new("Session"),
                abstract_type: Some(TypeIdentity::new("SessionProtocol")),
            })
        );
    }

    #[test]
    fn test_register_generic_optional_type() {
        let token = parse_ok("//weaver:store=Store<Key, [Int]>?");
        let AnnotationToken::Register(register) = token else {
            panic!("expected a registration");
        };
        assert_eq!(register.concrete_type.name, "Store");
        assert_eq!(register.concrete_type.generics, vec!["Key", "[Int]"]);
        assert!(register.concrete_type.is_optional);
        assert_eq!(register.abstract_type, None);
    }

    #[test]
    fn test_reference_with_several_types() {
        let token = parse_ok("// weaver: api <- APIProtocol & Logging");
        assert_eq!(
            token,
            AnnotationToken::Reference(ReferenceAnnotation {
                name: "api".to_string(),
                types: vec![TypeIdentity::new("APIProtocol"), TypeIdentity::new("Logging")],
            })
        );
    }

    #[test]
    fn test_parameter_with_collection_types() {
        let AnnotationToken::Parameter(parameter) = parse_ok("// weaver: ids <= [String: Int]?") else {
            panic!("expected a parameter");
        };
        assert_eq!(parameter.ty.to_string(), "Dictionary<String, Int>?");

        let AnnotationToken::Parameter(parameter) = parse_ok("// weaver: names <= [String]") else {
            panic!("expected a parameter");
        };
        assert_eq!(parameter.ty.to_string(), "Array<String>");
    }

    #[test]
    fn test_scope_accepts_lazy_alias() {
        let token = parse_ok("// weaver: api.scope = .lazy");
        assert_eq!(
            token,
            AnnotationToken::Configuration(ConfigurationAnnotation {
                attribute: ConfigurationAttribute::Scope(Scope::Graph),
                target: AttributeTarget::Dependency("api".to_string()),
            })
        );
    }

    #[test]
    fn test_unknown_scope_is_rejected() {
        assert_eq!(
            parse("// weaver: api.scope = .forever"),
            Err(TokenError::InvalidScope(".forever".to_string()))
        );
    }

    #[test]
    fn test_scope_on_self_is_rejected() {
        assert_eq!(
            parse("// weaver: self.scope = .container"),
            Err(TokenError::InvalidConfigurationAttributeTarget {
                name: AttributeName::Scope,
                target: AttributeTarget::SelfType,
            })
        );
    }

    #[test]
    fn test_configuration_attributes() {
        assert_eq!(
            parse_ok("// weaver: self.isIsolated = true"),
            AnnotationToken::Configuration(ConfigurationAnnotation {
                attribute: ConfigurationAttribute::IsIsolated(true),
                target: AttributeTarget::SelfType,
            })
        );
        assert_eq!(
            parse_ok("// weaver: self.allowsCycles = true"),
            AnnotationToken::Configuration(ConfigurationAnnotation {
                attribute: ConfigurationAttribute::AllowsCycles(true),
                target: AttributeTarget::SelfType,
            })
        );
        assert_eq!(
            parse_ok("// weaver: api.builder = API.make(with: 42)"),
            AnnotationToken::Configuration(ConfigurationAnnotation {
                attribute: ConfigurationAttribute::Builder("API.make(with: 42)".to_string()),
                target: AttributeTarget::Dependency("api".to_string()),
            })
        );
        assert_eq!(
            parse_ok("// weaver: self.platforms = [.iOS, .tvOS]"),
            AnnotationToken::Configuration(ConfigurationAnnotation {
                attribute: ConfigurationAttribute::Platforms(vec![Platform::IOS, Platform::TvOS]),
                target: AttributeTarget::SelfType,
            })
        );
        assert_eq!(
            parse_ok("// weaver: api.projects = [App, Core]"),
            AnnotationToken::Configuration(ConfigurationAnnotation {
                attribute: ConfigurationAttribute::Projects(vec!["App".to_string(), "Core".to_string()]),
                target: AttributeTarget::Dependency("api".to_string()),
            })
        );
    }

    #[test]
    fn test_malformed_values() {
        assert_eq!(
            parse("// weaver: self.isIsolated = yes"),
            Err(TokenError::InvalidConfigurationAttributeValue {
                value: "yes".to_string(),
                expected: "true|false".to_string(),
            })
        );
        assert!(matches!(
            parse("// weaver: self.platforms = [.android]"),
            Err(TokenError::InvalidConfigurationAttributeValue { .. })
        ));
    }

    #[test]
    fn test_unknown_attribute_and_bad_target() {
        assert_eq!(
            parse("// weaver: api.color = red"),
            Err(TokenError::UnknownConfigurationAttribute("color".to_string()))
        );
        assert_eq!(
            parse("// weaver: api.isIsolated = true"),
            Err(TokenError::InvalidConfigurationAttributeTarget {
                name: AttributeName::IsIsolated,
                target: AttributeTarget::Dependency("api".to_string()),
            })
        );
    }

    #[test]
    fn test_import() {
        assert_eq!(
            parse_ok("// weaver: import Networking"),
            AnnotationToken::Import("Networking".to_string())
        );
    }

    #[test]
    fn test_garbage_after_sentinel_is_invalid() {
        assert_eq!(
            parse("// weaver: api <-"),
            Err(TokenError::InvalidAnnotation("weaver: api <-".to_string()))
        );
    }

    #[test]
    fn test_custom_sentinel() {
        assert!(matches!(
            annotation("// inject: api <- API", "inject"),
            Ok(Some(AnnotationToken::Reference(_)))
        ));
        assert_eq!(annotation("// weaver: api <- API", "inject"), Ok(None));
    }

    #[test]
    fn test_parse_type_name_requires_full_match() {
        assert_eq!(parse_type_name("Foo.Bar"), Some(TypeIdentity::new("Foo.Bar")));
        assert_eq!(parse_type_name("Foo Bar"), None);
    }

    #[test]
    fn test_property_attribute_registration() {
        let tokens = property_attribute(
            "@Weaver(.registration, type: API.self, scope: .container)",
            "weaver",
            "api",
            Some("APIProtocol"),
        )
        .unwrap()
        .unwrap();

        assert_eq!(
            tokens,
            vec![
                AnnotationToken::Register(RegisterAnnotation {
                    name: "api".to_string(),
                    concrete_type: TypeIdentity::new("API"),
                    abstract_type: Some(TypeIdentity::new("APIProtocol")),
                }),
                AnnotationToken::Configuration(ConfigurationAnnotation {
                    attribute: ConfigurationAttribute::Scope(Scope::Container),
                    target: AttributeTarget::Dependency("api".to_string()),
                }),
            ]
        );
    }

    #[test]
    fn test_property_attribute_reference_and_foreign_attribute() {
        let tokens = property_attribute("@Weaver(.reference)", "weaver", "logger", Some("Logger"))
            .unwrap()
            .unwrap();
        assert_eq!(
            tokens,
            vec![AnnotationToken::Reference(ReferenceAnnotation {
                name: "logger".to_string(),
                types: vec![TypeIdentity::new("Logger")],
            })]
        );

        assert_eq!(
            property_attribute("@Published", "weaver", "value", Some("Int")),
            Ok(None)
        );
    }

    #[test]
    fn test_property_attribute_requires_kind() {
        assert!(matches!(
            property_attribute("@Weaver(type: API.self)", "weaver", "api", Some("API")),
            Err(TokenError::InvalidAnnotation(_))
        ));
    }
}
