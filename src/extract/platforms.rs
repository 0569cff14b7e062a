//! Candidate platform names from free text.
//!
//! Four sources feed one score board keyed by the spelling found in the text:
//!
//! * explicit mentions: "plataforma (de investimento) NAME"
//! * brand or domain shapes from the lexicon name patterns (MegaBet, ganhe.io)
//! * capitalized tokens near a lexicon keyword
//! * known platform names, matched as case-insensitive substrings
//!
//! After scoring, weak and stoplisted candidates are dropped and candidates
//! that contain one another are folded into a single entry. Known platforms
//! always rank above purely inferred ones.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::links::URL_RE;
use crate::lexicon::{is_messaging_host, Lexicon};
use crate::settings::PlatformTuning;

static EXPLICIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?i:plataforma|platform)(?:\s+(?i:de|of)\s+(?i:investimentos?|investments?|apostas|trading))?\s+(\p{Lu}[\p{L}\p{N}]*(?:\.(?i:io|com|net|app))?(?:[ \t]+\p{Lu}[\p{L}\p{N}]*){0,2})",
    )
    .unwrap()
});
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+(?:['’-][\p{L}\p{N}]+)*").unwrap());
static INVITE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:chat\.whatsapp\.com|whatsapp\.com/(?:channel|invite)|wa\.me|t\.me|telegram\.me)/\S*")
        .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCandidate {
    pub name: String,
    pub score: u32,
    /// Matched an entry of the known-platform list.
    pub known: bool,
}

pub fn extract_platforms(text: &str, lexicon: &Lexicon) -> Vec<String> {
    rank_platforms(text, lexicon, &PlatformTuning::default())
        .into_iter()
        .map(|c| c.name)
        .collect()
}

/// Scored candidates, best first. Deterministic for a given text and lexicon.
pub fn rank_platforms(
    text: &str,
    lexicon: &Lexicon,
    tuning: &PlatformTuning,
) -> Vec<PlatformCandidate> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let masked = mask_links(text);
    let mut board = ScoreBoard::default();

    score_explicit(&masked, tuning, &mut board);
    score_shapes(&masked, lexicon, tuning, &mut board);
    score_proximity(&masked, lexicon, tuning, &mut board);
    // known names are searched in the raw text, links included
    score_known(text, lexicon, tuning, &mut board);

    let raw = board.entries.len();
    let ranked = collapse(board.into_ranked(lexicon, tuning));
    debug!(raw, kept = ranked.len(), "ranked platform candidates");
    ranked
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    score: u32,
    known: bool,
}

#[derive(Debug, Default)]
struct ScoreBoard {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl ScoreBoard {
    fn add(&mut self, name: &str, weight: u32, known: bool) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        match self.index.get(name) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.score += weight;
                entry.known |= known;
            }
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push(Entry {
                    name: name.to_string(),
                    score: weight,
                    known,
                });
            }
        }
    }

    /// Filtered entries, known first, then by score. Ties keep first-seen order.
    fn into_ranked(self, lexicon: &Lexicon, tuning: &PlatformTuning) -> Vec<Entry> {
        let mut kept: Vec<Entry> = self
            .entries
            .into_iter()
            .filter(|e| e.name.chars().count() > 2 && e.score >= 1)
            .filter(|e| {
                if e.known {
                    return true;
                }
                let lower = e.name.to_lowercase();
                e.score >= tuning.min_score
                    && !lexicon.is_stoplisted(&lower)
                    && !lexicon.is_stopword(&lower)
            })
            .collect();
        kept.sort_by_key(|e| (Reverse(e.known), Reverse(e.score)));
        kept
    }
}

fn score_explicit(text: &str, tuning: &PlatformTuning, board: &mut ScoreBoard) {
    for caps in EXPLICIT_RE.captures_iter(text) {
        board.add(&caps[1], tuning.explicit_weight, false);
    }
}

fn score_shapes(text: &str, lexicon: &Lexicon, tuning: &PlatformTuning, board: &mut ScoreBoard) {
    for re in lexicon.name_patterns() {
        for m in re.find_iter(text) {
            let name = m.as_str();
            if name.contains('.') {
                let host = name.to_lowercase();
                if lexicon.is_excluded_host(&host) || is_messaging_host(&host) {
                    continue;
                }
            }
            board.add(name, tuning.shape_weight, false);
        }
    }
}

fn score_proximity(
    text: &str,
    lexicon: &Lexicon,
    tuning: &PlatformTuning,
    board: &mut ScoreBoard,
) {
    let tokens: Vec<&str> = TOKEN_RE.find_iter(text).map(|m| m.as_str()).collect();
    let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();

    // (first token, token count) of every keyword occurrence, in text order
    let mut hits: Vec<(usize, usize)> = Vec::new();
    for phrase in lexicon.keyword_phrases() {
        let n = phrase.len();
        if n > lowered.len() {
            continue;
        }
        for i in 0..=lowered.len() - n {
            if lowered[i..i + n] == phrase[..] {
                hits.push((i, n));
            }
        }
    }
    hits.sort_unstable();
    // "multinível" inside "marketing multinível" is one mention, not two
    let hits: Vec<(usize, usize)> = hits
        .iter()
        .copied()
        .filter(|&(i, n)| !hits.iter().any(|&(j, m)| m > n && j <= i && i + n <= j + m))
        .collect();

    let w = tuning.token_window;
    for (i, n) in hits {
        let lo = i.saturating_sub(w);
        let hi = (i + n + w).min(tokens.len());
        let mut seen: HashSet<&str> = HashSet::new();
        for j in (lo..i).chain(i + n..hi) {
            let token = tokens[j];
            if is_proximity_candidate(token, &lowered[j], lexicon, tuning) && seen.insert(token) {
                board.add(token, tuning.proximity_weight, false);
            }
        }
    }
}

fn is_proximity_candidate(
    token: &str,
    lower: &str,
    lexicon: &Lexicon,
    tuning: &PlatformTuning,
) -> bool {
    let len = token.chars().count();
    token.chars().next().is_some_and(char::is_uppercase)
        && (tuning.min_token_chars..=tuning.max_token_chars).contains(&len)
        && !lexicon.is_stopword(lower)
        && !lexicon.is_stoplisted(lower)
        && !lexicon.is_keyword_token(lower)
}

fn score_known(text: &str, lexicon: &Lexicon, tuning: &PlatformTuning, board: &mut ScoreBoard) {
    let mut found: Vec<(usize, &str)> = lexicon
        .known_platforms()
        .iter()
        .filter_map(|k| k.pattern.find(text))
        .map(|m| (m.start(), m.as_str()))
        .collect();
    found.sort_by_key(|f| f.0);
    for (_, name) in found {
        board.add(name, tuning.known_weight, true);
    }
}

/// Folds candidates that are case-insensitive substrings of one another.
/// The longer spelling survives; between equal spellings the earlier one wins.
fn collapse(ranked: Vec<Entry>) -> Vec<PlatformCandidate> {
    let mut accepted: Vec<Entry> = Vec::new();
    for cand in ranked {
        let lower = cand.name.to_lowercase();
        let related: Vec<usize> = accepted
            .iter()
            .enumerate()
            .filter(|(_, a)| {
                let al = a.name.to_lowercase();
                al.contains(&lower) || lower.contains(&al)
            })
            .map(|(i, _)| i)
            .collect();
        match related.split_first() {
            None => accepted.push(cand),
            Some((&target, rest)) => {
                for &i in rest.iter().rev() {
                    let other = accepted.remove(i);
                    absorb(&mut accepted[target], other);
                }
                absorb(&mut accepted[target], cand);
            }
        }
    }
    accepted.sort_by_key(|e| (Reverse(e.known), Reverse(e.score)));
    accepted
        .into_iter()
        .map(|e| PlatformCandidate {
            name: e.name,
            score: e.score,
            known: e.known,
        })
        .collect()
}

fn absorb(into: &mut Entry, other: Entry) {
    if other.name.chars().count() > into.name.chars().count() {
        into.name = other.name;
    }
    into.score += other.score;
    into.known |= other.known;
}

/// Blanks out URLs and invite links so their path segments are not read as names.
fn mask_links(text: &str) -> String {
    let mut bytes = text.as_bytes().to_vec();
    let spans = URL_RE.find_iter(text).chain(INVITE_RE.find_iter(text));
    for m in spans {
        bytes[m.start()..m.end()].fill(b' ');
    }
    String::from_utf8(bytes).unwrap_or_else(|_| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(text: &str) -> Vec<PlatformCandidate> {
        rank_platforms(text, &Lexicon::default(), &PlatformTuning::default())
    }

    fn names(text: &str) -> Vec<String> {
        extract_platforms(text, &Lexicon::default())
    }

    #[test]
    fn empty_text() {
        assert!(names("").is_empty());
        assert!(names("   \n ").is_empty());
    }

    #[test]
    fn known_platform_ranks_first() {
        let got = names("Eu uso a Binance todos os dias");
        assert_eq!(got.first().map(|s| s.to_lowercase()).as_deref(), Some("binance"));
    }

    #[test]
    fn known_platform_beats_heavier_heuristics() {
        let got = ranked("Lucro na plataforma de investimento MegaBet, mas eu prefiro a Blaze");
        assert_eq!(got[0].name, "Blaze");
        assert!(got[0].known);
        assert!(got.iter().any(|c| c.name == "MegaBet" && c.score > got[0].score));
    }

    #[test]
    fn explicit_mention() {
        let got = ranked("Conheça a plataforma de investimento XPlatform");
        assert_eq!(got[0].name, "XPlatform");
        // explicit 5 + near "plataforma" 2 + near "investimento" 2
        assert_eq!(got[0].score, 9);
    }

    #[test]
    fn multi_word_explicit_mention() {
        let got = names("Cuidado com a plataforma Gold Rush Capital, é golpe");
        assert!(got.contains(&"Gold Rush Capital".to_string()));
    }

    #[test]
    fn shape_without_keywords() {
        let got = ranked("Fala pessoal, hoje vou mostrar a CryptoGain pra vocês");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "CryptoGain");
        assert_eq!(got[0].score, 3);
    }

    #[test]
    fn bare_domain_shape() {
        let got = names("cadastre em lucrorapido.io e saque hoje");
        assert_eq!(got, vec!["lucrorapido.io"]);
    }

    #[test]
    fn excluded_domains_are_not_names() {
        assert!(names("me segue no instagram.com e youtube.com").is_empty());
    }

    #[test]
    fn proximity_compounds_across_keywords() {
        let got = ranked("Recebi meu pagamento da Zentrix ontem. Zentrix paga bitcoin toda semana");
        let zentrix = got.iter().find(|c| c.name == "Zentrix").unwrap();
        assert_eq!(zentrix.score, 4);
        assert!(!zentrix.known);
    }

    #[test]
    fn nested_keywords_count_once() {
        let got = ranked("Conheci a Zentrix pelo marketing multinível");
        let zentrix = got.iter().find(|c| c.name == "Zentrix").unwrap();
        assert_eq!(zentrix.score, 2);

        let got = ranked("Fundo high yield na Zentrix");
        let zentrix = got.iter().find(|c| c.name == "Zentrix").unwrap();
        assert_eq!(zentrix.score, 2);
    }

    #[test]
    fn function_words_and_stoplist_are_skipped() {
        let got = names("Para investimento Pix Site Como");
        assert!(got.is_empty(), "{:?}", got);
    }

    #[test]
    fn substring_candidates_merge_into_longer() {
        let got = ranked("A MegaBet paga. Bet pagamento Mega, investimento na MegaBet");
        let megas: Vec<&PlatformCandidate> = got
            .iter()
            .filter(|c| c.name.to_lowercase().contains("mega"))
            .collect();
        assert_eq!(megas.len(), 1);
        assert_eq!(megas[0].name, "MegaBet");
    }

    #[test]
    fn no_candidate_contains_another() {
        let got = names(
            "Blaze e Blaze Apostas: plataforma Blaze Apostas, pagamento via Blazer, bitcoin Bitget Bitgetpro",
        );
        for (i, a) in got.iter().enumerate() {
            for (j, b) in got.iter().enumerate() {
                if i != j {
                    assert!(!a.to_lowercase().contains(&b.to_lowercase()), "{a} / {b}");
                }
            }
        }
    }

    #[test]
    fn links_do_not_leak_tokens() {
        let got = names("investimento https://chat.whatsapp.com/ABCDEF e https://ganhe.io/Promo");
        assert!(got.is_empty(), "{:?}", got);
    }

    #[test]
    fn known_names_inside_links_still_count() {
        let got = names("https://blaze.com/r/abc");
        assert_eq!(got, vec!["blaze"]);
    }

    #[test]
    fn idempotent() {
        let text = "Prova de pagamento da XPlatform! Entrei pela plataforma XPlatform e a Betano pagou. \
                    Trading com TradeMax, saque via lucro.app";
        let a = names(text);
        let b = names(text);
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn raising_the_floor_drops_weak_candidates() {
        let tuning = PlatformTuning {
            min_score: 6,
            ..PlatformTuning::default()
        };
        let got = rank_platforms(
            "pagamento da Zentrix, conheça a CryptoGain",
            &Lexicon::default(),
            &tuning,
        );
        assert!(got.is_empty(), "{:?}", got);
    }
}
