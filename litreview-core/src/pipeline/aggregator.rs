//! Merging of per-catalog search results.

use crate::types::Paper;

/// Concatenate two catalogs' results, first then second.
///
/// Each side keeps its internal order and nothing is deduplicated: a paper
/// indexed by both catalogs appears twice.
pub fn aggregate(first: Vec<Paper>, second: Vec<Paper>) -> Vec<Paper> {
    let mut merged = first;
    merged.extend(second);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Catalog;

    #[test]
    fn test_aggregate_preserves_order_and_duplicates() {
        let a = vec![
            Paper::new("Attention Is All You Need", Catalog::Arxiv),
            Paper::new("BERT", Catalog::Arxiv),
        ];
        let b = vec![Paper::new("Attention Is All You Need", Catalog::SemanticScholar)];

        let merged = aggregate(a, b);
        let titles: Vec<&str> = merged.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Attention Is All You Need", "BERT", "Attention Is All You Need"]
        );
        assert_eq!(merged[0].source, Catalog::Arxiv);
        assert_eq!(merged[2].source, Catalog::SemanticScholar);
    }

    #[test]
    fn test_aggregate_with_empty_side() {
        let b = vec![Paper::new("Only", Catalog::SemanticScholar)];
        assert_eq!(aggregate(Vec::new(), b).len(), 1);
        assert!(aggregate(Vec::new(), Vec::new()).is_empty());
    }
}
