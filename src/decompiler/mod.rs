//! The decompiler boundary: annotated trees, rendered text and the decompilation cache.
//!
//! The decompiler itself is an external collaborator; this module defines what it must
//! produce ([`Decompilation`]) and how the engine consumes it. Every tree node that
//! corresponds to a declared or referenced program entity carries an annotation
//! resolvable back to an [`crate::metadata::handle::EntityHandle`], plus 1-based text
//! coordinates into the rendered text.
//!
//! # Key Types
//! - [`Decompiler`] - the external service contract
//! - [`Decompilation`] - one reconstructed (tree, text) pair
//! - [`ast::SyntaxTree`] / [`ast::AstNode`] - the annotated tree
//! - [`cache::DecompilationCache`] - process-wide memoization

pub mod ast;
pub mod cache;

use crate::{
    decompiler::ast::{SyntaxTree, TextSpan},
    metadata::{module::Module, token::Token},
    Result,
};

/// One reconstructed source unit: the syntax tree and the rendered text it indexes.
///
/// For an unchanged module the rendered text is deterministic for a given
/// `(module, root)` key, which is what makes caching and text spans stable.
#[derive(Debug)]
pub struct Decompilation {
    /// The annotated syntax tree
    pub tree: SyntaxTree,
    /// The rendered source text the tree's spans point into
    pub text: String,
}

impl Decompilation {
    /// Extracts the text behind `span`, with line breaks removed.
    ///
    /// Used for the source excerpt of a usage record; coordinates outside the
    /// text clamp to line/text boundaries rather than failing.
    #[must_use]
    pub fn excerpt(&self, span: &TextSpan) -> String {
        let lines: Vec<&str> = self.text.lines().collect();
        if span.start.line == 0 || span.start.line > lines.len() as u32 {
            return String::new();
        }

        let first = (span.start.line - 1) as usize;
        let last = ((span.end.line.max(span.start.line) - 1) as usize).min(lines.len() - 1);

        let mut out = String::new();
        for (index, line) in lines[first..=last].iter().enumerate() {
            let is_first = index == 0;
            let is_last = first + index == last;

            let from = if is_first {
                char_offset(line, span.start.column)
            } else {
                0
            };
            let to = if is_last {
                char_offset(line, span.end.column)
            } else {
                line.len()
            };
            if from < to {
                out.push_str(&line[from..to]);
            }
        }
        out
    }
}

/// Byte offset of a 1-based character column, clamped to the line length.
fn char_offset(line: &str, column: u32) -> usize {
    if column <= 1 {
        return 0;
    }
    line.char_indices()
        .nth((column - 1) as usize)
        .map_or(line.len(), |(offset, _)| offset)
}

/// External decompiler service.
///
/// Implementations turn the bytecode of a root declaration into an annotated tree and
/// rendered text. The input token must denote a type with no enclosing declaring type;
/// callers resolve nested types to their root declaration before asking.
pub trait Decompiler: Send + Sync {
    /// Decompiles `root` within `module`.
    ///
    /// # Errors
    /// [`crate::Error::Decompilation`] if the underlying bytecode is malformed at the
    /// root-declaration level. Such failures are not cached by
    /// [`cache::DecompilationCache`]; a retry will attempt decompilation again.
    fn decompile(&self, module: &Module, root: Token) -> Result<Decompilation>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompiler::ast::TextSpan;

    fn unit(text: &str) -> Decompilation {
        Decompilation {
            tree: SyntaxTree::new(),
            text: text.to_string(),
        }
    }

    #[test]
    fn excerpt_single_line() {
        let unit = unit("class Widget\n{\n    int size;\n}\n");
        let span = TextSpan::from_positions(3, 5, 3, 14);
        assert_eq!(unit.excerpt(&span), "int size;");
    }

    #[test]
    fn excerpt_strips_line_breaks() {
        let unit = unit("a\nfoo(1,\n    2);\nb\n");
        let span = TextSpan::from_positions(2, 1, 3, 8);
        assert_eq!(unit.excerpt(&span), "foo(1,    2);");
    }

    #[test]
    fn excerpt_clamps_out_of_range() {
        let unit = unit("short\n");
        assert_eq!(unit.excerpt(&TextSpan::from_positions(9, 1, 9, 5)), "");
        assert_eq!(unit.excerpt(&TextSpan::from_positions(1, 1, 1, 99)), "short");
    }
}
