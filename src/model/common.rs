use super::Block;

/// Common fields for all blocks
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockCommon {
    /// Indentation level read from the note's styling; consumed when the
    /// flat block list is nested.
    pub indent_level: usize,
    pub children: Vec<Block>,
}

impl BlockCommon {
    pub fn at_level(indent_level: usize) -> Self {
        Self {
            indent_level,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }
}
