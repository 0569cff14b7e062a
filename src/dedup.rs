// Near-duplicate title detection for a scan session.
//
// Re-uploaded promo videos usually keep most of the title and pad it with a
// few extra words, so containment and a token overlap measured against the
// larger token set catch them.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::settings::DedupTuning;

/// Lowercase, drop everything but word characters and whitespace, collapse spaces.
pub fn normalize_title(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shared tokens divided by the size of the larger token set (0.0 - 1.0).
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let ta: HashSet<&str> = a.split_whitespace().collect();
    let tb: HashSet<&str> = b.split_whitespace().collect();
    let larger = ta.len().max(tb.len());
    if larger == 0 {
        return 0.0;
    }
    ta.intersection(&tb).count() as f64 / larger as f64
}

/// Whether two normalized titles name the same underlying content.
pub fn titles_match(a: &str, b: &str, tuning: &DedupTuning) -> bool {
    if a == b {
        return true;
    }
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    if shorter.chars().count() > tuning.min_substring_len && longer.contains(shorter) {
        return true;
    }
    token_overlap(a, b) > tuning.threshold
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateOf {
    /// Normalized form of the earlier title.
    pub title: String,
    pub document_id: String,
}

/// Normalized titles accepted so far in a session, with the id of the
/// document that introduced each. Only grows.
#[derive(Debug, Clone, Default)]
pub struct SeenTitles {
    entries: Vec<(String, String)>,
    exact: HashMap<String, usize>,
}

impl SeenTitles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First earlier title that `title` duplicates, if any.
    pub fn find_duplicate(&self, title: &str, tuning: &DedupTuning) -> Option<DuplicateOf> {
        let normalized = normalize_title(title);
        if normalized.is_empty() {
            return None;
        }
        let hit = match self.exact.get(&normalized) {
            Some(&i) => Some(&self.entries[i]),
            None => self
                .entries
                .iter()
                .find(|(seen, _)| titles_match(seen, &normalized, tuning)),
        };
        hit.map(|(seen, id)| DuplicateOf {
            title: seen.clone(),
            document_id: id.clone(),
        })
    }

    /// Records an accepted title. Empty titles and exact repeats are ignored.
    pub fn register(&mut self, title: &str, document_id: &str) {
        let normalized = normalize_title(title);
        if normalized.is_empty() || self.exact.contains_key(&normalized) {
            return;
        }
        self.exact.insert(normalized.clone(), self.entries.len());
        self.entries.push((normalized, document_id.to_string()));
    }
}

pub fn is_duplicate(title: &str, seen: &SeenTitles) -> bool {
    seen.find_duplicate(title, &DedupTuning::default()).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seen_with(titles: &[&str]) -> SeenTitles {
        let mut seen = SeenTitles::new();
        for (i, t) in titles.iter().enumerate() {
            seen.register(t, &format!("v{}", i));
        }
        seen
    }

    #[test]
    fn normalization() {
        assert_eq!(
            normalize_title("  PROVA de Pagamento!!! 💰 (R$ 500) "),
            "prova de pagamento r 500"
        );
        assert_eq!(normalize_title("Ganhe já, ação-rápida"), "ganhe já açãorápida");
        assert_eq!(normalize_title("?!"), "");
    }

    #[test]
    fn substring_of_seen_title() {
        let seen = seen_with(&["Como ganhar dinheiro com Bitcoin hoje"]);
        assert!(is_duplicate("Como ganhar dinheiro com Bitcoin", &seen));
    }

    #[test]
    fn short_substrings_do_not_count() {
        let seen = seen_with(&["bitcoin hoje ganhe muito agora"]);
        // "bitcoin" is a substring but only 7 chars
        assert!(!is_duplicate("Bitcoin", &seen));
    }

    #[test]
    fn token_overlap_rule() {
        let seen = seen_with(&["Prova de pagamento da XPlatform"]);
        assert!(is_duplicate("Prova de pagamento da XPlatform hoje", &seen));

        let seen = seen_with(&["Prova de pagamento"]);
        assert!(!is_duplicate("Como investir em ações", &seen));
    }

    #[test]
    fn overlap_uses_larger_set() {
        // 5 shared of 6 -> 0.83
        assert!((token_overlap("a b c d e", "a b c d e f") - 5.0 / 6.0).abs() < 1e-9);
        // reordered words are not a substring but still overlap fully
        let seen = seen_with(&["lucro garantido na plataforma nova"]);
        assert!(is_duplicate("plataforma nova lucro garantido na", &seen));
        // 4 of 5 is exactly 0.8, not above it
        let seen = seen_with(&["um dois tres quatro cinco"]);
        assert!(!is_duplicate("um dois tres quatro seis", &seen));
    }

    #[test]
    fn threshold_is_tunable() {
        let seen = seen_with(&["um dois tres quatro cinco"]);
        let loose = DedupTuning {
            threshold: 0.75,
            ..DedupTuning::default()
        };
        let hit = seen.find_duplicate("um dois tres quatro seis", &loose).unwrap();
        assert_eq!(hit.document_id, "v0");
    }

    #[test]
    fn empty_titles_never_match() {
        let mut seen = seen_with(&[""]);
        assert!(seen.is_empty());
        seen.register("Qualquer coisa", "v9");
        assert!(!is_duplicate("", &seen));
        assert!(!is_duplicate("!!!", &seen));
    }

    #[test]
    fn reports_the_matching_title() {
        let seen = seen_with(&["Sorteio de iPhone", "Renda extra com a Blaze todo dia"]);
        let hit = seen
            .find_duplicate("RENDA EXTRA com a BLAZE todo dia!!", &DedupTuning::default())
            .unwrap();
        assert_eq!(hit.title, "renda extra com a blaze todo dia");
        assert_eq!(hit.document_id, "v1");
    }

    #[test]
    fn index_only_grows() {
        let mut seen = seen_with(&["primeiro titulo longo", "segundo titulo bem diferente"]);
        seen.register("primeiro titulo longo", "v7");
        assert_eq!(seen.len(), 2);
        let hit = seen
            .find_duplicate("Primeiro titulo longo", &DedupTuning::default())
            .unwrap();
        assert_eq!(hit.document_id, "v0");
    }
}
