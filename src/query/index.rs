use crate::index::types::CodeElement;
use crate::query::matcher::{prepare_field, ApproximateMatcher, FieldMatcher, Pattern};
use crate::query::scorer::{combine_fields, FieldWeights, SearchConfig};
use rayon::prelude::*;

/// Lowercased copies of the weighted fields of one element
#[derive(Debug, Clone)]
struct PreparedFields {
    name: Vec<char>,
    searchable_text: Vec<char>,
    description: Vec<char>,
    parent_name: Option<Vec<char>>,
}

impl PreparedFields {
    fn new(element: &CodeElement) -> Self {
        Self {
            name: prepare_field(&element.name),
            searchable_text: prepare_field(&element.searchable_text),
            description: prepare_field(&element.description),
            parent_name: element.parent_name().map(prepare_field),
        }
    }
}

/// Read-only fuzzy index over an element set, built once after indexing
pub struct SearchIndex {
    elements: Vec<CodeElement>,
    fields: Vec<PreparedFields>,
    weights: FieldWeights,
    matcher: Box<dyn FieldMatcher>,
}

impl SearchIndex {
    pub fn new(elements: Vec<CodeElement>, config: &SearchConfig) -> Self {
        let matcher = Box::new(ApproximateMatcher::new(config));
        Self::with_matcher(elements, config.weights, matcher)
    }

    pub fn with_matcher(
        elements: Vec<CodeElement>,
        weights: FieldWeights,
        matcher: Box<dyn FieldMatcher>,
    ) -> Self {
        let fields = elements.par_iter().map(PreparedFields::new).collect();
        Self {
            elements,
            fields,
            weights,
            matcher,
        }
    }

    pub fn elements(&self) -> &[CodeElement] {
        &self.elements
    }

    pub fn get(&self, idx: usize) -> Option<&CodeElement> {
        self.elements.get(idx)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Score one element, `None` when none of its fields is accepted
    pub fn score(&self, idx: usize, pattern: &Pattern) -> Option<f64> {
        let fields = self.fields.get(idx)?;
        let m = &self.matcher;
        let distance = |field: &[char]| m.match_field(pattern, field).map(|f| f.distance);

        let mut scored = Vec::with_capacity(4);
        scored.push((self.weights.name, distance(&fields.name)));
        scored.push((self.weights.searchable_text, distance(&fields.searchable_text)));
        scored.push((self.weights.description, distance(&fields.description)));
        if let Some(parent) = &fields.parent_name {
            scored.push((self.weights.parent_name, distance(parent)));
        }
        combine_fields(&scored)
    }

    /// Score every element in parallel; results are `(index, score)` in
    /// index order, unmatched elements omitted
    pub fn score_all(&self, pattern: &Pattern) -> Vec<(usize, f64)> {
        (0..self.elements.len())
            .into_par_iter()
            .filter_map(|idx| self.score(idx, pattern).map(|score| (idx, score)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::{ElementContext, ElementKind, ParentRef};
    use crate::query::matcher::FieldMatch;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn element(name: &str, parent: Option<&str>) -> CodeElement {
        CodeElement {
            id: format!("function-{}", name),
            kind: ElementKind::Function,
            name: name.to_string(),
            parent: parent.map(|p| ParentRef::new(p, ElementKind::Class)),
            file_path: PathBuf::from("/src/a.ts"),
            line_number: 1,
            description: String::new(),
            searchable_text: String::new(),
            context: ElementContext {
                file_content: Arc::from(""),
            },
        }
    }

    /// Accepts fields equal to the pattern
    struct EqualityMatcher;

    impl FieldMatcher for EqualityMatcher {
        fn match_field(&self, pattern: &Pattern, field: &[char]) -> Option<FieldMatch> {
            (pattern.chars() == field).then_some(FieldMatch {
                distance: 0.0,
                start: 0,
                len: field.len(),
            })
        }
    }

    #[test]
    fn test_absent_parent_is_ignored() {
        let index = SearchIndex::with_matcher(
            vec![element("run", None), element("run", Some("Other"))],
            FieldWeights::default(),
            Box::new(EqualityMatcher),
        );
        let pattern = Pattern::new("run").unwrap();

        // name 0 plus two empty fields at 1.0 over weights 0.9
        let orphan = index.score(0, &pattern).unwrap();
        assert!((orphan - 0.5 / 0.9).abs() < 1e-9);

        // the unmatched parent adds weight 0.1 at distance 1.0
        let member = index.score(1, &pattern).unwrap();
        assert!((member - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_score_all_omits_unmatched() {
        let index = SearchIndex::with_matcher(
            vec![element("run", None), element("stop", None), element("run", None)],
            FieldWeights::default(),
            Box::new(EqualityMatcher),
        );
        let hits = index.score_all(&Pattern::new("run").unwrap());
        let ids: Vec<usize> = hits.iter().map(|(idx, _)| *idx).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn test_case_insensitive() {
        let index = SearchIndex::new(vec![element("UserService", None)], &SearchConfig::default());
        assert!(index.score(0, &Pattern::new("USERSERVICE").unwrap()).is_some());
    }
}
