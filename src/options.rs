//! Resolver options.
//!
//! `ResolverOptions` controls the few policy decisions the resolver cannot
//! read from the document itself: how nullability is encoded for reference
//! types, how strictly names are checked, and whether polymorphic bases are
//! synthesized for unions of records.

/// Options for a single resolution pass.
///
/// # Example
/// ```
/// use avrolink::ResolverOptions;
///
/// let opts = ResolverOptions {
///     strict_names: true,
///     ..Default::default()
/// };
/// assert!(opts.nullable_references);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Whether the target encodes nullable reference types (default: true).
    ///
    /// Governs `is_nullable` for unions that reduce to the null-object type
    /// (`[]`, `["null", "null"]`) and for boxed unions with a null branch.
    pub nullable_references: bool,

    /// Reject names outside `[A-Za-z_][A-Za-z0-9_]*` (default: false).
    ///
    /// In permissive mode violations are logged and accepted.
    pub strict_names: bool,

    /// Synthesize abstract bases for unions of records (default: true).
    pub synthesize_abstract_bases: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            nullable_references: true,
            strict_names: false,
            synthesize_abstract_bases: true,
        }
    }
}

impl ResolverOptions {
    /// Create a new `ResolverOptions` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether nullable reference types are encoded.
    pub fn with_nullable_references(mut self, nullable_references: bool) -> Self {
        self.nullable_references = nullable_references;
        self
    }

    /// Set strict name validation.
    pub fn with_strict_names(mut self, strict_names: bool) -> Self {
        self.strict_names = strict_names;
        self
    }

    /// Set whether abstract bases are synthesized.
    pub fn with_abstract_bases(mut self, synthesize: bool) -> Self {
        self.synthesize_abstract_bases = synthesize;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ResolverOptions::new();
        assert!(opts.nullable_references);
        assert!(!opts.strict_names);
        assert!(opts.synthesize_abstract_bases);
    }

    #[test]
    fn test_builder_methods() {
        let opts = ResolverOptions::new()
            .with_nullable_references(false)
            .with_strict_names(true)
            .with_abstract_bases(false);

        assert_eq!(
            opts,
            ResolverOptions {
                nullable_references: false,
                strict_names: true,
                synthesize_abstract_bases: false,
            }
        );
    }
}
