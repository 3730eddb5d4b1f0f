//! Post-apply syntax validation
//!
//! Proposed file content is parsed with the same tree-sitter grammars the
//! surrounding toolchain uses; a parse tree containing error or missing
//! nodes rejects the proposal before it reaches disk.

use tree_sitter::{Node, Parser};

/// Languages with a registered grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxLanguage {
    Rust,
    TypeScript,
    Python,
    Go,
}

impl SyntaxLanguage {
    /// Resolve a language from a lowercased file extension
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "rs" => Some(Self::Rust),
            "ts" | "tsx" => Some(Self::TypeScript),
            "py" => Some(Self::Python),
            "go" => Some(Self::Go),
            _ => None,
        }
    }

    fn grammar(self) -> tree_sitter::Language {
        match self {
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::Go => tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Human-readable name
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::TypeScript => "typescript",
            Self::Python => "python",
            Self::Go => "go",
        }
    }
}

/// Outcome of validating proposed content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxVerdict {
    /// The content parses cleanly
    Valid,
    /// The content does not parse
    Invalid { message: String },
    /// No grammar is registered for the file's language
    Unsupported,
}

impl SyntaxVerdict {
    /// True unless the verdict is `Invalid`
    ///
    /// Unsupported languages pass through: the executor cannot reject
    /// content it has no grammar for.
    #[inline]
    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        !matches!(self, Self::Invalid { .. })
    }
}

/// Validates proposed content against tree-sitter grammars
#[derive(Debug, Default)]
pub struct SyntaxValidator;

impl SyntaxValidator {
    /// Create a validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate `content` as the language implied by `extension`
    #[must_use]
    pub fn validate(&self, extension: Option<&str>, content: &str) -> SyntaxVerdict {
        let Some(language) = extension.and_then(SyntaxLanguage::from_extension) else {
            return SyntaxVerdict::Unsupported;
        };

        let mut parser = Parser::new();
        if parser.set_language(&language.grammar()).is_err() {
            tracing::warn!(language = language.name(), "grammar failed to load");
            return SyntaxVerdict::Unsupported;
        }

        let Some(tree) = parser.parse(content, None) else {
            return SyntaxVerdict::Invalid {
                message: format!("{} parser produced no tree", language.name()),
            };
        };

        let root = tree.root_node();
        if !root.has_error() {
            return SyntaxVerdict::Valid;
        }

        let message = first_error(root).map_or_else(
            || format!("{} parse error", language.name()),
            |node| {
                let pos = node.start_position();
                format!(
                    "{} parse error at line {}, column {}",
                    language.name(),
                    pos.row + 1,
                    pos.column + 1
                )
            },
        );
        SyntaxVerdict::Invalid { message }
    }
}

/// Depth-first search for the first error or missing node
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_rust_passes() {
        let validator = SyntaxValidator::new();
        let verdict = validator.validate(Some("rs"), "fn main() { println!(\"hi\"); }");
        assert_eq!(verdict, SyntaxVerdict::Valid);
    }

    #[test]
    fn broken_rust_is_rejected_with_location() {
        let validator = SyntaxValidator::new();
        let verdict = validator.validate(Some("rs"), "fn main( {");
        match verdict {
            SyntaxVerdict::Invalid { message } => {
                assert!(message.contains("rust parse error"));
            }
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[test]
    fn valid_python_passes() {
        let validator = SyntaxValidator::new();
        let verdict = validator.validate(Some("py"), "def f(x):\n    return x + 1\n");
        assert_eq!(verdict, SyntaxVerdict::Valid);
    }

    #[test]
    fn broken_go_is_rejected() {
        let validator = SyntaxValidator::new();
        let verdict = validator.validate(Some("go"), "func main() { if {");
        assert!(matches!(verdict, SyntaxVerdict::Invalid { .. }));
    }

    #[test]
    fn unknown_extension_is_unsupported_and_acceptable() {
        let validator = SyntaxValidator::new();
        let verdict = validator.validate(Some("txt"), "anything at all");
        assert_eq!(verdict, SyntaxVerdict::Unsupported);
        assert!(verdict.is_acceptable());
    }

    #[test]
    fn missing_extension_is_unsupported() {
        let validator = SyntaxValidator::new();
        assert_eq!(validator.validate(None, "x"), SyntaxVerdict::Unsupported);
    }
}
