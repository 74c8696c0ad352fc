/// Read-only handle to a user-supplied starting tree. Optional: partitions
/// without one evaluate models on optimizer-generated topologies instead.
/// Same lifetime contract as [`crate::alignment::Alignment`]: held behind
/// an `Arc`, never mutated here.
pub trait Tree: Send + Sync {
    fn n_taxa(&self) -> usize;

    fn tip_labels(&self) -> Vec<String>;
}

/// Minimal [`Tree`] implementation carrying only the tip set.
#[derive(Clone, Debug, Default)]
pub struct PlainTree {
    tips: Vec<String>,
}

impl PlainTree {
    pub fn new(tips: Vec<String>) -> Self {
        Self { tips }
    }
}

impl Tree for PlainTree {
    fn n_taxa(&self) -> usize {
        self.tips.len()
    }

    fn tip_labels(&self) -> Vec<String> {
        self.tips.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_tree() {
        let tree = PlainTree::new(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(tree.n_taxa(), 3);
        assert_eq!(tree.tip_labels(), vec!["a", "b", "c"]);
    }
}
