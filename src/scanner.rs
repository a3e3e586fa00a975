//! Scanner
//!
//! Line oriented access to a model text: marker search for the header and
//! parameter sections, and extraction of `Tree=` blocks.
use crate::constants::TREE_MARKER;
use crate::errors::ModelTextError;
use crate::tree::block::{Field, TreeBlock};

/// Cursor over the numbered lines of a model text.
///
/// Lines are split on `\n` with a trailing `\r` removed, and numbered from 1.
pub struct Scanner<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    n_blocks: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Scanner {
            lines: text.lines().collect(),
            pos: 0,
            n_blocks: 0,
        }
    }

    /// Line number of the next line to be read.
    pub fn line_number(&self) -> usize {
        self.pos + 1
    }

    /// Read the next line, with its line number.
    pub fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let line = self.lines.get(self.pos).copied()?;
        self.pos += 1;
        Some((self.pos, line))
    }

    /// Advance past the first line starting with `marker` and return it.
    pub fn seek_marker(&mut self, marker: &str) -> Result<(usize, &'a str), ModelTextError> {
        while let Some((n, line)) = self.next_line() {
            if line.starts_with(marker) {
                return Ok((n, line));
            }
        }
        Err(ModelTextError::MalformedHeader {
            marker: marker.to_string(),
            reason: "marker not found before the end of the text".to_string(),
        })
    }

    /// Find the next `Tree=` section and collect its fields.
    ///
    /// The section ends at a blank line, the next `Tree=` line, or the end of
    /// the text. Returns `None` once no `Tree=` line is left. A line that is
    /// not a single `key=value` pair is kept on the block and reported when
    /// the block is decoded.
    pub fn next_tree_block(&mut self) -> Option<TreeBlock<'a>> {
        let header = loop {
            match self.next_line() {
                Some((n, line)) if line.starts_with(TREE_MARKER) => break n,
                Some(_) => continue,
                None => return None,
            }
        };
        let mut block = TreeBlock::new(self.n_blocks, header);
        self.n_blocks += 1;

        while let Some(line) = self.lines.get(self.pos).copied() {
            if line.starts_with(TREE_MARKER) || line.trim().is_empty() {
                break;
            }
            let n = self.line_number();
            self.pos += 1;
            match line.split_once('=') {
                Some((k, v)) if !v.contains('=') => {
                    block.set(k.trim(), Field { line: n, value: v.trim() });
                }
                _ => {
                    if block.invalid_line.is_none() {
                        block.invalid_line = Some(Field { line: n, value: line.trim() });
                    }
                }
            }
        }
        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_marker() {
        let text = "tree\nversion=v4\nmax_feature_idx=3\n";
        let mut s = Scanner::new(text);
        assert_eq!(s.seek_marker("max_feature_idx").unwrap(), (3, "max_feature_idx=3"));
        assert!(s.next_line().is_none());

        let mut s = Scanner::new(text);
        assert!(matches!(
            s.seek_marker("parameters").unwrap_err(),
            ModelTextError::MalformedHeader { .. }
        ));
    }

    #[test]
    fn test_crlf() {
        let mut s = Scanner::new("a\r\nb=1\r\n\r\nc");
        assert_eq!(s.next_line(), Some((1, "a")));
        assert_eq!(s.next_line(), Some((2, "b=1")));
        assert_eq!(s.next_line(), Some((3, "")));
        assert_eq!(s.next_line(), Some((4, "c")));
        assert_eq!(s.next_line(), None);
    }

    #[test]
    fn test_tree_blocks() {
        let text = "tree\nTree=0\nnum_leaves=1\n num_cat = 0 \nleaf_value=0.5\n\nTree=1\nnum_leaves=2\nTree=2\nnum_leaves=3\nleaf_weight=1 2 3";
        let mut s = Scanner::new(text);

        let b = s.next_tree_block().unwrap();
        assert_eq!(b.index, 0);
        assert_eq!(b.line, 2);
        assert_eq!(b.num_leaves, Some(Field { line: 3, value: "1" }));
        assert_eq!(b.num_cat, Some(Field { line: 4, value: "0" }));
        assert_eq!(b.leaf_value, Some(Field { line: 5, value: "0.5" }));

        // Terminated by the next `Tree=` line.
        let b = s.next_tree_block().unwrap();
        assert_eq!((b.index, b.line), (1, 7));
        assert_eq!(b.num_leaves, Some(Field { line: 8, value: "2" }));

        // Terminated by the end of the text.
        let b = s.next_tree_block().unwrap();
        assert_eq!((b.index, b.line), (2, 9));
        assert_eq!(b.num_leaves, Some(Field { line: 10, value: "3" }));
        assert!(s.next_tree_block().is_none());
    }

    #[test]
    fn test_bad_block_line() {
        let mut s = Scanner::new("Tree=0\nnum_leaves=1\nleaf_value\nnum_cat=0\nthreshold\n\nTree=1\nnum_leaves=1\n");
        let b = s.next_tree_block().unwrap();
        // The first bad line is kept, the rest of the block is still read.
        assert_eq!(b.invalid_line, Some(Field { line: 3, value: "leaf_value" }));
        assert_eq!(b.num_cat, Some(Field { line: 4, value: "0" }));
        match b.decode().unwrap_err() {
            ModelTextError::MalformedTreeBlock { tree, line, field, .. } => {
                assert_eq!(tree, 0);
                assert_eq!(line, 3);
                assert_eq!(field, "leaf_value");
            }
            e => panic!("unexpected error {:?}", e),
        }
        let b = s.next_tree_block().unwrap();
        assert_eq!((b.index, b.invalid_line), (1, None));

        let mut s = Scanner::new("Tree=0\nnum_leaves=1=2\n");
        let b = s.next_tree_block().unwrap();
        assert_eq!(b.invalid_line, Some(Field { line: 2, value: "num_leaves=1=2" }));
        assert_eq!(b.num_leaves, None);
    }
}
