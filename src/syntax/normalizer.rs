use crate::syntax::python::PythonNormalizer;
use crate::syntax::tree::SyntaxNode;
use std::path::Path;

/// Source languages the checker can grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    Python,
}

impl SourceLanguage {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("py") => Some(Self::Python),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Python => "python",
        }
    }
}

/// Lowers one language's concrete syntax into [`SyntaxNode`]s.
pub trait SourceNormalizer: Send + Sync {
    fn language(&self) -> SourceLanguage;

    /// Returns `None` when the source does not parse cleanly.
    fn parse(&self, source: &str) -> Option<SyntaxNode>;
}

pub fn normalizer_for(language: SourceLanguage) -> Box<dyn SourceNormalizer> {
    match language {
        SourceLanguage::Python => Box::new(PythonNormalizer),
    }
}

pub fn is_source_file(path: &Path) -> bool {
    SourceLanguage::from_path(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_detection() {
        assert_eq!(
            SourceLanguage::from_path(Path::new("pkg/mover.py")),
            Some(SourceLanguage::Python)
        );
        assert_eq!(SourceLanguage::from_path(Path::new("CMakeLists.txt")), None);
        assert_eq!(SourceLanguage::from_path(Path::new("Makefile")), None);
        assert!(is_source_file(Path::new("a/b/c.py")));
    }

    #[test]
    fn test_normalizer_registry() {
        let normalizer = normalizer_for(SourceLanguage::Python);
        assert_eq!(normalizer.language(), SourceLanguage::Python);
        assert!(normalizer.parse("x = 1\n").is_some());
    }
}
