use crate::config::types::{Category, Finding};
use crate::syntax::{normalizer_for, walk, SourceLanguage, SyntaxNode, Visitor};
use std::fs;
use std::path::Path;

pub const UNBOUNDED_LOOP_PENALTY: u32 = 15;

/// Whole-file facts gathered by one walk over a syntax tree
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopAnalysis {
    pub has_unbounded_loop: bool,
    pub has_sleep_call: bool,
}

impl LoopAnalysis {
    /// A sleep anywhere in the file clears every loop in it. Placement
    /// relative to the loop body is not considered.
    pub fn is_busy_loop(&self) -> bool {
        self.has_unbounded_loop && !self.has_sleep_call
    }
}

struct LoopSleepVisitor<'a> {
    sleep_calls: &'a [String],
    analysis: LoopAnalysis,
}

impl Visitor for LoopSleepVisitor<'_> {
    fn visit(&mut self, node: &SyntaxNode) {
        if let SyntaxNode::While { .. } = node {
            self.analysis.has_unbounded_loop = true;
        }
        if let Some(member) = node.invoked_member() {
            if self.sleep_calls.iter().any(|s| s == member) {
                self.analysis.has_sleep_call = true;
            }
        }
    }
}

pub fn analyze_tree(tree: &SyntaxNode, sleep_calls: &[String]) -> LoopAnalysis {
    let mut visitor = LoopSleepVisitor {
        sleep_calls,
        analysis: LoopAnalysis::default(),
    };
    walk(tree, &mut visitor);
    visitor.analysis
}

/// Flags source files that spin in a `while` loop with no sleep-like call
pub struct SafetyHeuristicScanner<'a> {
    sleep_calls: &'a [String],
}

impl<'a> SafetyHeuristicScanner<'a> {
    pub fn new(sleep_calls: &'a [String]) -> Self {
        Self { sleep_calls }
    }

    /// One finding at most per file. Unreadable or unparseable files are
    /// skipped; the lint adapter reports syntax errors.
    pub fn scan_file(&self, path: &Path) -> Option<Finding> {
        let language = SourceLanguage::from_path(path)?;
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                log::debug!("Skipping unreadable source {}: {}", path.display(), e);
                return None;
            }
        };

        let Some(tree) = normalizer_for(language).parse(&source) else {
            log::debug!(
                "Skipping unparseable {} source {}",
                language.name(),
                path.display()
            );
            return None;
        };

        if !analyze_tree(&tree, self.sleep_calls).is_busy_loop() {
            return None;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Some(Finding::new(
            Category::Safety,
            format!(
                "Safety Warning: {} has a 'while' loop without a detected sleep(). This can crash the CPU.",
                file_name
            ),
            UNBOUNDED_LOOP_PENALTY,
        ))
    }

    pub fn scan(&self, sources: &[impl AsRef<Path>]) -> Vec<Finding> {
        sources
            .iter()
            .filter_map(|path| self.scan_file(path.as_ref()))
            .collect()
    }
}
