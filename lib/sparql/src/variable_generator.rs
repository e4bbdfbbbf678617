use rdf_entity_model::{BlankNode, Variable};

/// Hands out the variables `?c1`, `?c2`, ... of a single query.
///
/// Every query or update build owns its own generator, so the generated text only depends on the input.
#[derive(Debug, Default)]
pub struct VariableGenerator {
    counter: usize,
}

impl VariableGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_variable(&mut self) -> Variable {
        self.counter += 1;
        Variable::new_unchecked(format!("c{}", self.counter))
    }
}

/// Hands out the blank nodes `_:b1`, `_:b2`, ... of a single update.
#[derive(Debug, Default)]
pub struct BlankNodeGenerator {
    counter: usize,
}

impl BlankNodeGenerator {
    pub fn next_blank_node(&mut self) -> BlankNode {
        self.counter += 1;
        BlankNode::new_unchecked(format!("b{}", self.counter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_are_independent() {
        let mut first = VariableGenerator::new();
        let mut second = VariableGenerator::new();
        assert_eq!(first.next_variable().as_str(), "c1");
        assert_eq!(first.next_variable().as_str(), "c2");
        assert_eq!(second.next_variable().as_str(), "c1");
    }
}
