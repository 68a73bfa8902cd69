//! Qualified names and target identifier escaping.
//!
//! Avro names are `namespace.name` pairs where the namespace is inherited
//! from the enclosing named schema when not given. A dotted name carries its
//! own namespace and overrides any explicit `namespace` property.

use std::borrow::Cow;
use std::fmt;

use crate::error::NameError;

/// Keywords of the target language. Identifiers colliding with one of these
/// are escaped with a leading `@`.
const RESERVED_WORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Check whether an identifier is a target-language keyword.
pub fn is_reserved_word(identifier: &str) -> bool {
    RESERVED_WORDS.binary_search(&identifier).is_ok()
}

/// Escape an identifier that collides with a target-language keyword.
///
/// # Example
/// ```
/// use avrolink::schema::escape_identifier;
///
/// assert_eq!(escape_identifier("class"), "@class");
/// assert_eq!(escape_identifier("Person"), "Person");
/// ```
pub fn escape_identifier(identifier: &str) -> Cow<'_, str> {
    if is_reserved_word(identifier) {
        Cow::Owned(format!("@{}", identifier))
    } else {
        Cow::Borrowed(identifier)
    }
}

/// Escape every segment of a dotted name and rejoin them.
pub fn escape_dotted(name: &str) -> String {
    name.split('.')
        .map(escape_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

/// Convert an identifier such as `first_name` or `firstName` to `FirstName`.
pub fn pascal_case(input: &str) -> String {
    input
        .split(|c: char| c == '_' || c == '-' || c == ' ')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Check a single name segment against `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(segment: &str) -> Result<(), NameError> {
    let mut chars = segment.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(NameError::InvalidCharacters(segment.to_string()))
    }
}

/// A qualified Avro name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaName {
    name: String,
    namespace: Option<String>,
}

impl SchemaName {
    /// Create a name without validation.
    ///
    /// Used for the fixed synthetic names of primitives and composites.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    /// Split a fully qualified name on its last dot.
    ///
    /// # Example
    /// ```
    /// use avrolink::schema::SchemaName;
    ///
    /// let name = SchemaName::parse("a.b.C").unwrap();
    /// assert_eq!(name.name(), "C");
    /// assert_eq!(name.namespace(), Some("a.b"));
    /// ```
    pub fn parse(full_name: &str) -> Result<Self, NameError> {
        Self::resolve(full_name, None, None)
    }

    /// Resolve a raw `name`/`namespace` pair within a containing namespace.
    ///
    /// A dotted `raw_name` ignores `raw_namespace` entirely. Otherwise the
    /// explicit namespace wins over the containing one. An explicitly empty
    /// namespace is rejected.
    pub fn resolve(
        raw_name: &str,
        raw_namespace: Option<&str>,
        containing_namespace: Option<&str>,
    ) -> Result<Self, NameError> {
        if raw_name.trim().is_empty() {
            return Err(NameError::Empty);
        }

        if let Some((namespace, name)) = raw_name.rsplit_once('.') {
            check_segments(raw_name)?;
            return Ok(Self {
                name: name.to_string(),
                namespace: Some(namespace.to_string()),
            });
        }

        let namespace = match raw_namespace {
            Some(ns) if ns.is_empty() => return Err(NameError::EmptyNamespace),
            Some(ns) => Some(ns),
            None => containing_namespace,
        };
        if let Some(ns) = namespace {
            check_segments(ns)?;
        }

        Ok(Self {
            name: raw_name.to_string(),
            namespace: namespace.map(String::from),
        })
    }

    /// Copy of this name placed in another namespace.
    pub fn with_namespace(mut self, namespace: Option<&str>) -> Self {
        self.namespace = namespace.map(String::from);
        self
    }

    /// The local name (never contains a dot).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// `namespace.name`, or just `name` without a namespace.
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    /// The local name as a target identifier.
    pub fn escaped_name(&self) -> String {
        escape_identifier(&self.name).into_owned()
    }

    /// The qualified name with every segment escaped.
    pub fn escaped_full_name(&self) -> String {
        escape_dotted(&self.full_name())
    }

    /// Check every segment against the Avro identifier grammar.
    pub fn validate(&self) -> Result<(), NameError> {
        validate_identifier(&self.name)?;
        if let Some(ns) = &self.namespace {
            for segment in ns.split('.') {
                validate_identifier(segment)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}.{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

fn check_segments(dotted: &str) -> Result<(), NameError> {
    if dotted.split('.').any(|segment| segment.trim().is_empty()) {
        Err(NameError::EmptySegment(dotted.to_string()))
    } else {
        Ok(())
    }
}
