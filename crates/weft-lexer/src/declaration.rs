//! Declaration records handed to the lexer by a syntax provider

use weft_ast::AccessLevel;

/// Inherited type marking an extension as bridgeable to legacy code
pub const OBJC_INJECTABLE_MARKER: &str = "ObjCDependencyInjectable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Class,
    Struct,
    Enum,
    Extension,
    Protocol,
    Property,
    Other,
}

impl DeclarationKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "class" => Some(DeclarationKind::Class),
            "struct" => Some(DeclarationKind::Struct),
            "enum" => Some(DeclarationKind::Enum),
            "extension" => Some(DeclarationKind::Extension),
            "protocol" => Some(DeclarationKind::Protocol),
            "var" | "let" => Some(DeclarationKind::Property),
            _ => None,
        }
    }
}

/// Text and position of a custom attribute attached to a declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpan {
    /// Full attribute text, e.g. `@Weaver(.reference)`
    pub text: String,
    pub offset: usize,
    pub length: usize,
}

/// A type or property declaration boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationRecord {
    pub kind: DeclarationKind,
    pub name: String,
    pub offset: usize,
    /// Length of the whole declaration, body included
    pub length: usize,
    /// Present iff the declaration has a body
    pub body_offset: Option<usize>,
    pub access_level: AccessLevel,
    pub inherited_types: Vec<String>,
    /// Declared type of a property
    pub type_name: Option<String>,
    pub attribute: Option<AttributeSpan>,
}

impl DeclarationRecord {
    pub fn new(kind: DeclarationKind, name: impl Into<String>, offset: usize, length: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            offset,
            length,
            body_offset: None,
            access_level: AccessLevel::default(),
            inherited_types: Vec::new(),
            type_name: None,
            attribute: None,
        }
    }

    pub fn with_body(mut self, body_offset: usize) -> Self {
        self.body_offset = Some(body_offset);
        self
    }

    pub fn has_body(&self) -> bool {
        self.body_offset.is_some()
    }

    /// Classes, structs and marked extensions open an injectable type
    pub fn is_injectable(&self) -> bool {
        match self.kind {
            DeclarationKind::Class | DeclarationKind::Struct => true,
            DeclarationKind::Extension => self.supports_objc(),
            _ => false,
        }
    }

    pub fn supports_objc(&self) -> bool {
        self.kind == DeclarationKind::Extension
            && self.inherited_types.iter().any(|t| t == OBJC_INJECTABLE_MARKER)
    }

    /// Properties only contribute through their attribute
    pub fn is_structural(&self) -> bool {
        self.kind != DeclarationKind::Property
    }
}

/// Extracts declaration records from host-language source text.
///
/// Records must be returned in increasing `offset` order.
pub trait SyntaxProvider {
    fn declarations(&self, source: &str) -> Vec<DeclarationRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injectable_kinds() {
        assert!(DeclarationRecord::new(DeclarationKind::Class, "App", 0, 10).is_injectable());
        assert!(DeclarationRecord::new(DeclarationKind::Struct, "App", 0, 10).is_injectable());
        assert!(!DeclarationRecord::new(DeclarationKind::Enum, "App", 0, 10).is_injectable());
        assert!(!DeclarationRecord::new(DeclarationKind::Extension, "App", 0, 10).is_injectable());
    }

    #[test]
    fn test_marked_extension_is_injectable() {
        let mut record = DeclarationRecord::new(DeclarationKind::Extension, "App", 0, 10);
        record.inherited_types = vec!["Equatable".to_string(), OBJC_INJECTABLE_MARKER.to_string()];
        assert!(record.is_injectable());
        assert!(record.supports_objc());
    }
}
