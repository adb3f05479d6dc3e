use crate::lineage::record::RecordRules;
use std::cell::RefCell;
use std::collections::HashMap;

/// Computes lines of descent for canonical lineage identifiers
#[derive(Debug)]
pub struct AncestryResolver<'a> {
    rules: &'a RecordRules,
    memo: Option<RefCell<HashMap<String, Vec<String>>>>,
}

impl<'a> AncestryResolver<'a> {
    pub fn new(rules: &'a RecordRules) -> Self {
        Self { rules, memo: None }
    }

    /// Remember every chain computed through this resolver
    pub fn memoized(mut self) -> Self {
        self.memo = Some(RefCell::new(HashMap::new()));
        self
    }

    /// `id` followed by each of its ancestors, nearest first, root last.
    ///
    /// `id` is taken as canonical; recombinant ids such as `XBB.1` are walked
    /// segment by segment like any other name. The anchor strain stops the walk.
    pub fn chain(&self, id: &str) -> Vec<String> {
        if let Some(memo) = &self.memo {
            if let Some(chain) = memo.borrow().get(id) {
                return chain.clone();
            }
        }

        let mut chain = Vec::new();
        let mut current = Some(id.to_string());
        while let Some(name) = current {
            current = self.rules.parent_of(&name);
            chain.push(name);
        }

        if let Some(memo) = &self.memo {
            memo.borrow_mut().insert(id.to_string(), chain.clone());
        }
        chain
    }

    /// Ancestors of a record whose parent is `parent_id`; empty for roots
    pub fn line_of_descent(&self, parent_id: Option<&str>) -> Vec<String> {
        match parent_id {
            Some(parent) => self.chain(parent),
            None => Vec::new(),
        }
    }

    pub fn cached_chains(&self) -> usize {
        self.memo.as_ref().map(|m| m.borrow().len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_stops_at_anchor() {
        let rules = RecordRules::default();
        let resolver = AncestryResolver::new(&rules);

        assert_eq!(
            resolver.chain("B.1.1.529.2.75"),
            vec!["B.1.1.529.2.75", "B.1.1.529.2", "B.1.1.529"]
        );
        assert_eq!(resolver.chain("B.1.1.529"), vec!["B.1.1.529"]);
    }

    #[test]
    fn test_chain_without_anchor_reaches_undotted_root() {
        let rules = RecordRules::default();
        let resolver = AncestryResolver::new(&rules);

        assert_eq!(resolver.chain("B.1.617.2"), vec!["B.1.617.2", "B.1.617", "B.1", "B"]);
    }

    #[test]
    fn test_chain_keeps_compact_ids_verbatim() {
        let rules = RecordRules::default();
        let resolver = AncestryResolver::new(&rules);

        assert_eq!(resolver.chain("BA.1"), vec!["BA.1", "BA"]);
    }

    #[test]
    fn test_chain_of_nested_recombinant_stays_under_its_alias() {
        let rules = RecordRules::default();
        let resolver = AncestryResolver::new(&rules);

        assert_eq!(resolver.chain("XBB.1.5"), vec!["XBB.1.5", "XBB.1", "XBB"]);
        assert_eq!(resolver.line_of_descent(Some("XBB.1")), vec!["XBB.1", "XBB"]);
    }

    #[test]
    fn test_line_of_descent_of_root_is_empty() {
        let rules = RecordRules::default();
        let resolver = AncestryResolver::new(&rules);

        assert!(resolver.line_of_descent(None).is_empty());
        assert_eq!(resolver.line_of_descent(Some("B.1.1.529")), vec!["B.1.1.529"]);
    }

    #[test]
    fn test_memoized_resolver_reuses_chains() {
        let rules = RecordRules::default();
        let resolver = AncestryResolver::new(&rules).memoized();

        let first = resolver.chain("B.1.1.529.5.1");
        let second = resolver.chain("B.1.1.529.5.1");
        assert_eq!(first, second);
        assert_eq!(resolver.cached_chains(), 1);
    }
}
