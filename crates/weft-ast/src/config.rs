//! Scopes, access levels, platforms and configuration attributes

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifetime and child-accessibility policy of a registration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    /// A new instance per resolution
    #[serde(rename = "t")]
    Transient,
    /// Cached per branch; also spelled `lazy`
    #[default]
    #[serde(rename = "l")]
    Graph,
    /// Cached while externally held, shared with children
    #[serde(rename = "w")]
    Weak,
    /// Cached for the whole subtree, shared with children
    #[serde(rename = "c")]
    Container,
}

impl Scope {
    pub const ALL: [Scope; 4] = [Scope::Transient, Scope::Graph, Scope::Weak, Scope::Container];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "transient" => Some(Scope::Transient),
            "graph" | "lazy" => Some(Scope::Graph),
            "weak" => Some(Scope::Weak),
            "container" => Some(Scope::Container),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Transient => "transient",
            Scope::Graph => "graph",
            Scope::Weak => "weak",
            Scope::Container => "container",
        }
    }

    /// Only shared scopes make a registration visible to descendants
    pub fn allows_access_from_children(&self) -> bool {
        matches!(self, Scope::Weak | Scope::Container)
    }

    pub fn is_weak(&self) -> bool {
        matches!(self, Scope::Weak)
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Scope::Transient)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access level of an injectable type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    #[serde(rename = "p")]
    Public,
    #[default]
    #[serde(rename = "i")]
    Internal,
}

impl AccessLevel {
    /// Map a declaration modifier; anything but `public`/`open` is internal
    pub fn from_modifier(modifier: &str) -> Self {
        match modifier {
            "public" | "open" => AccessLevel::Public,
            _ => AccessLevel::Internal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Public => "public",
            AccessLevel::Internal => "internal",
        }
    }
}

/// Target platforms a declaration can be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    OSX,
    #[serde(rename = "macOS")]
    MacOS,
    #[serde(rename = "iOS")]
    IOS,
    #[serde(rename = "watchOS")]
    WatchOS,
    #[serde(rename = "tvOS")]
    TvOS,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::OSX,
        Platform::MacOS,
        Platform::IOS,
        Platform::WatchOS,
        Platform::TvOS,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|platform| platform.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::OSX => "OSX",
            Platform::MacOS => "macOS",
            Platform::IOS => "iOS",
            Platform::WatchOS => "watchOS",
            Platform::TvOS => "tvOS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of a configuration attribute as spelled in annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeName {
    Scope,
    IsIsolated,
    AllowsCycles,
    Builder,
    Objc,
    CustomRef,
    Setter,
    Platforms,
    Projects,
}

impl AttributeName {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scope" => Some(AttributeName::Scope),
            "isIsolated" => Some(AttributeName::IsIsolated),
            "allowsCycles" => Some(AttributeName::AllowsCycles),
            "builder" => Some(AttributeName::Builder),
            "objc" => Some(AttributeName::Objc),
            "customRef" => Some(AttributeName::CustomRef),
            "setter" => Some(AttributeName::Setter),
            "platforms" => Some(AttributeName::Platforms),
            "projects" => Some(AttributeName::Projects),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeName::Scope => "scope",
            AttributeName::IsIsolated => "isIsolated",
            AttributeName::AllowsCycles => "allowsCycles",
            AttributeName::Builder => "builder",
            AttributeName::Objc => "objc",
            AttributeName::CustomRef => "customRef",
            AttributeName::Setter => "setter",
            AttributeName::Platforms => "platforms",
            AttributeName::Projects => "projects",
        }
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a configuration annotation applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeTarget {
    /// The enclosing type itself
    SelfType,
    /// A dependency declared in the enclosing type
    Dependency(String),
}

impl AttributeTarget {
    pub fn from_name(name: &str) -> Self {
        match name {
            "self" => AttributeTarget::SelfType,
            name => AttributeTarget::Dependency(name.to_string()),
        }
    }

    pub fn dependency_name(&self) -> Option<&str> {
        match self {
            AttributeTarget::SelfType => None,
            AttributeTarget::Dependency(name) => Some(name),
        }
    }
}

impl fmt::Display for AttributeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeTarget::SelfType => f.write_str("self"),
            AttributeTarget::Dependency(name) => f.write_str(name),
        }
    }
}

/// A single configuration value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigurationAttribute {
    Scope(Scope),
    IsIsolated(bool),
    /// The type may take part in an eager construction cycle
    AllowsCycles(bool),
    /// Raw builder expression text
    Builder(String),
    Objc(bool),
    CustomRef(bool),
    Setter(bool),
    Platforms(Vec<Platform>),
    Projects(Vec<String>),
}

impl ConfigurationAttribute {
    pub fn name(&self) -> AttributeName {
        match self {
            ConfigurationAttribute::Scope(_) => AttributeName::Scope,
            ConfigurationAttribute::IsIsolated(_) => AttributeName::IsIsolated,
            ConfigurationAttribute::AllowsCycles(_) => AttributeName::AllowsCycles,
            ConfigurationAttribute::Builder(_) => AttributeName::Builder,
            ConfigurationAttribute::Objc(_) => AttributeName::Objc,
            ConfigurationAttribute::CustomRef(_) => AttributeName::CustomRef,
            ConfigurationAttribute::Setter(_) => AttributeName::Setter,
            ConfigurationAttribute::Platforms(_) => AttributeName::Platforms,
            ConfigurationAttribute::Projects(_) => AttributeName::Projects,
        }
    }

    /// Whether this attribute may be assigned on `target` at all
    pub fn allows_target(&self, target: &AttributeTarget) -> bool {
        use AttributeTarget::*;
        use ConfigurationAttribute::*;

        match (self, target) {
            (IsIsolated(_), SelfType) | (AllowsCycles(_), SelfType) => true,
            (Objc(_), _) => true,
            (Platforms(_), _) | (Projects(_), _) => true,
            (Scope(_), Dependency(_))
            | (Builder(_), Dependency(_))
            | (CustomRef(_), Dependency(_))
            | (Setter(_), Dependency(_)) => true,
            (IsIsolated(_), Dependency(_))
            | (AllowsCycles(_), Dependency(_))
            | (Scope(_), SelfType)
            | (Builder(_), SelfType)
            | (CustomRef(_), SelfType)
            | (Setter(_), SelfType) => false,
        }
    }
}

impl fmt::Display for ConfigurationAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            ConfigurationAttribute::Scope(scope) => write!(f, "{} = .{}", name, scope),
            ConfigurationAttribute::Builder(expr) => write!(f, "{} = {}", name, expr),
            ConfigurationAttribute::IsIsolated(value)
            | ConfigurationAttribute::AllowsCycles(value)
            | ConfigurationAttribute::Objc(value)
            | ConfigurationAttribute::CustomRef(value)
            | ConfigurationAttribute::Setter(value) => write!(f, "{} = {}", name, value),
            ConfigurationAttribute::Platforms(platforms) => {
                let names: Vec<String> = platforms.iter().map(|p| format!(".{}", p)).collect();
                write!(f, "{} = [{}]", name, names.join(", "))
            }
            ConfigurationAttribute::Projects(projects) => {
                write!(f, "{} = [{}]", name, projects.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_is_graph() {
        assert_eq!(Scope::from_name("lazy"), Some(Scope::Graph));
        assert_eq!(Scope::from_name("graph"), Some(Scope::Graph));
        assert_eq!(Scope::from_name("singleton"), None);
        assert_eq!(Scope::default(), Scope::Graph);
    }

    #[test]
    fn test_accessibility_from_children() {
        assert!(Scope::Weak.allows_access_from_children());
        assert!(Scope::Container.allows_access_from_children());
        assert!(!Scope::Transient.allows_access_from_children());
        assert!(!Scope::Graph.allows_access_from_children());
    }

    #[test]
    fn test_attribute_targets() {
        let dependency = AttributeTarget::from_name("api");
        assert!(ConfigurationAttribute::IsIsolated(true).allows_target(&AttributeTarget::SelfType));
        assert!(!ConfigurationAttribute::IsIsolated(true).allows_target(&dependency));
        assert!(ConfigurationAttribute::AllowsCycles(true).allows_target(&AttributeTarget::SelfType));
        assert!(!ConfigurationAttribute::AllowsCycles(true).allows_target(&dependency));
        assert!(ConfigurationAttribute::Builder("make".into()).allows_target(&dependency));
        assert!(!ConfigurationAttribute::Scope(Scope::Weak).allows_target(&AttributeTarget::SelfType));
        assert!(ConfigurationAttribute::Platforms(vec![Platform::IOS]).allows_target(&AttributeTarget::SelfType));
    }

    #[test]
    fn test_platform_names() {
        assert_eq!(Platform::from_name("iOS"), Some(Platform::IOS));
        assert_eq!(Platform::from_name("ios"), None);
        assert_eq!(Platform::MacOS.to_string(), "macOS");
    }

    #[test]
    fn test_attribute_display() {
        let attribute = ConfigurationAttribute::Platforms(vec![Platform::IOS, Platform::TvOS]);
        assert_eq!(attribute.to_string(), "platforms = [.iOS, .tvOS]");
        assert_eq!(ConfigurationAttribute::Scope(Scope::Weak).to_string(), "scope = .weak");
    }
}
