use std::collections::HashMap;

use super::Label;

/// Generates labels that are unique across a program, by numbering each label stem separately.
#[derive(Debug, Default)]
pub struct LabelGenerator {
    seen_subscripts: HashMap<&'static str, usize>,
}
impl LabelGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a new unique label.
    pub fn next_label(&mut self, stem: &'static str) -> Label {
        let subscript = self.seen_subscripts.entry(stem).or_insert(0);
        *subscript += 1;

        Label::new(stem, *subscript)
    }

    /// Generates a pair of labels sharing one subscript, as used by loops and conditionals to
    /// mark their start and end.
    pub fn next_pair(&mut self, first: &'static str, second: &'static str) -> (Label, Label) {
        let subscript = [first, second]
            .iter()
            .map(|stem| self.seen_subscripts.get(stem).copied().unwrap_or(0))
            .max()
            .unwrap_or(0)
            + 1;
        self.seen_subscripts.insert(first, subscript);
        self.seen_subscripts.insert(second, subscript);

        (Label::new(first, subscript), Label::new(second, subscript))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_are_numbered_independently() {
        let mut lbl_gen = LabelGenerator::new();

        assert_eq!("if_end_1", lbl_gen.next_label("if_end").to_string());
        assert_eq!("while_top_1", lbl_gen.next_label("while_top").to_string());
        assert_eq!("if_end_2", lbl_gen.next_label("if_end").to_string());
    }

    #[test]
    fn pairs_share_a_subscript() {
        let mut lbl_gen = LabelGenerator::new();
        lbl_gen.next_label("while_end");

        let (top, end) = lbl_gen.next_pair("while_top", "while_end");

        assert_eq!("while_top_2", top.to_string());
        assert_eq!("while_end_2", end.to_string());
    }
}
