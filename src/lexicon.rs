//! Reference data driving every heuristic: keywords, known platform names,
//! excluded link hosts, function words and brand-shape patterns.
//!
//! A [`Lexicon`] is built once and only read afterwards. Callers pass it by
//! reference into each extraction call.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Hosts that carry group invites. Their domain shapes are never platform names.
pub const MESSAGING_HOSTS: &[&str] = &[
    "chat.whatsapp.com",
    "whatsapp.com",
    "wa.me",
    "t.me",
    "telegram.me",
];

const KEYWORDS: &[&str] = &[
    "investimento",
    "investment",
    "plataforma",
    "platform",
    "ganho",
    "ganhos",
    "earnings",
    "lucro",
    "profit",
    "renda",
    "income",
    "rendimento",
    "yield",
    "retorno",
    "return",
    "pagamento",
    "payment",
    "dinheiro",
    "money",
    "financeiro",
    "financial",
    "forex",
    "trading",
    "trade",
    "trader",
    "bitcoin",
    "btc",
    "crypto",
    "cripto",
    "criptomoeda",
    "stake",
    "apostas",
    "betting",
    "cassino",
    "casino",
    "sorteio",
    "loteria",
    "lottery",
    "multinível",
    "multi-nível",
    "multi level",
    "mlm",
    "marketing multinível",
    "pirâmide",
    "pyramid",
    "ponzi",
    "hyip",
    "high yield",
    "dividendo",
    "rentabilidade",
    "roi",
    "juros",
];

const KNOWN_PLATFORMS: &[&str] = &[
    "blaze",
    "bet365",
    "binance",
    "bitget",
    "bybit",
    "fox bet",
    "betano",
    "sporting bet",
    "sportingbet",
    "kto",
    "esporte da sorte",
    "bet7k",
    "betfair",
    "pixbet",
    "betsson",
    "parimatch",
    "alphatrading",
    "olymp trade",
    "olymptrade",
    "iqoption",
    "iq option",
    "xp investimentos",
    "clear",
    "rico",
    "nubank",
    "atlas quantum",
    "unick forex",
    "trust investing",
    "hehaka finance",
    "g44",
    "g 44",
    "tigerbet",
    "tiger bet",
    "bet national",
    "betnacional",
    "estrelabet",
    "estrela bet",
    "galerabet",
    "galera bet",
];

const EXCLUDED_DOMAINS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "instagram.com",
    "facebook.com",
    "twitter.com",
    "x.com",
    "tiktok.com",
];

const STOPWORDS: &[&str] = &[
    // pt
    "a", "o", "as", "os", "um", "uma", "uns", "umas", "de", "do", "da", "dos", "das", "em",
    "no", "na", "nos", "nas", "por", "pelo", "pela", "pelos", "pelas", "para", "pra", "com",
    "sem", "sob", "sobre", "entre", "até", "ao", "aos", "à", "às", "e", "ou", "mas", "que",
    "se", "como", "mais", "muito", "muita", "já", "eu", "você", "voce", "vocês", "ele", "ela",
    "nós", "eles", "elas", "meu", "minha", "seu", "sua", "seus", "suas", "este", "esta",
    "esse", "essa", "isso", "isto", "aquele", "aquela", "quem", "qual", "quando", "onde",
    "porque", "pois", "hoje", "agora", "todo", "toda", "todos", "todas",
    // en
    "the", "an", "of", "in", "on", "at", "to", "for", "with", "by", "from", "and", "or",
    "but", "is", "are", "was", "were", "this", "that", "these", "those", "my", "your", "our",
    "their", "how", "what", "when", "where", "who", "why", "you", "we", "they", "it", "its",
];

const STOPLIST: &[&str] = &[
    "site", "sites", "app", "apps", "link", "links", "pix", "sim", "não", "nao", "yes", "no",
    "grupo", "canal", "group", "channel", "video", "vídeo", "videos", "vídeos", "aqui",
    "here", "clique", "click", "whatsapp", "telegram", "youtube", "instagram", "http",
    "https", "www", "live", "bio",
];

const BRAND_AFFIXES: &[&str] = &["Bet", "Trade", "Invest", "Forex", "Crypto", "Pay", "FX"];

const DOMAIN_SUFFIXES: &[&str] = &["io", "com", "net", "app"];

fn owned(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

/// Raw lists as they appear in a lexicon override file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconLists {
    pub keywords: Vec<String>,
    pub known_platforms: Vec<String>,
    pub excluded_domains: Vec<String>,
    pub stopwords: Vec<String>,
    pub stoplist: Vec<String>,
    pub brand_affixes: Vec<String>,
    pub domain_suffixes: Vec<String>,
}

impl Default for LexiconLists {
    fn default() -> Self {
        LexiconLists {
            keywords: owned(KEYWORDS),
            known_platforms: owned(KNOWN_PLATFORMS),
            excluded_domains: owned(EXCLUDED_DOMAINS),
            stopwords: owned(STOPWORDS),
            stoplist: owned(STOPLIST),
            brand_affixes: owned(BRAND_AFFIXES),
            domain_suffixes: owned(DOMAIN_SUFFIXES),
        }
    }
}

impl LexiconLists {
    /// Reads a JSON override file. Keys that are present replace the built-in
    /// list, keys that are absent keep it.
    pub fn from_file(path: &Path) -> Result<LexiconLists> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| Error::LexiconFormat {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A known platform name and the case-insensitive pattern that finds it.
#[derive(Debug, Clone)]
pub struct KnownPlatform {
    pub name: String,
    pub pattern: Regex,
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    lists: LexiconLists,
    keyword_phrases: Vec<Vec<String>>,
    keyword_tokens: HashSet<String>,
    known_platforms: Vec<KnownPlatform>,
    excluded_domains: Vec<String>,
    stopwords: HashSet<String>,
    stoplist: HashSet<String>,
    name_patterns: Vec<Regex>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Lexicon::new(LexiconLists::default()).expect("built-in lexicon compiles")
    }
}

impl Lexicon {
    pub fn new(lists: LexiconLists) -> Result<Lexicon> {
        let keyword_phrases: Vec<Vec<String>> = lists
            .keywords
            .iter()
            .map(|k| k.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>())
            .filter(|parts| !parts.is_empty())
            .collect();
        let keyword_tokens = keyword_phrases.iter().flatten().cloned().collect();

        let mut known_platforms = Vec::new();
        for name in &lists.known_platforms {
            let name = name.trim().to_lowercase();
            if name.chars().count() <= 2 {
                warn!(name = %name, "dropping known platform shorter than 3 characters");
                continue;
            }
            known_platforms.push(KnownPlatform {
                pattern: known_name_pattern(&name)?,
                name,
            });
        }

        let excluded_domains = lists
            .excluded_domains
            .iter()
            .map(|d| d.trim().trim_start_matches("www.").to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        let name_patterns = build_name_patterns(&lists.brand_affixes, &lists.domain_suffixes)?;

        Ok(Lexicon {
            keyword_phrases,
            keyword_tokens,
            known_platforms,
            excluded_domains,
            stopwords: lowercase_set(&lists.stopwords),
            stoplist: lowercase_set(&lists.stoplist),
            name_patterns,
            lists,
        })
    }

    pub fn from_file(path: &Path) -> Result<Lexicon> {
        Lexicon::new(LexiconLists::from_file(path)?)
    }

    pub fn lists(&self) -> &LexiconLists {
        &self.lists
    }

    /// Keywords split into lowercase tokens, in lexicon order.
    pub fn keyword_phrases(&self) -> &[Vec<String>] {
        &self.keyword_phrases
    }

    pub fn is_keyword_token(&self, lower: &str) -> bool {
        self.keyword_tokens.contains(lower)
    }

    pub fn known_platforms(&self) -> &[KnownPlatform] {
        &self.known_platforms
    }

    pub fn is_stopword(&self, lower: &str) -> bool {
        self.stopwords.contains(lower)
    }

    pub fn is_stoplisted(&self, lower: &str) -> bool {
        self.stoplist.contains(lower)
    }

    /// Brand-shaped and domain-shaped name patterns, capture group 0 is the name.
    pub fn name_patterns(&self) -> &[Regex] {
        &self.name_patterns
    }

    /// True for an excluded domain or any subdomain of one.
    pub fn is_excluded_host(&self, host: &str) -> bool {
        let host = host.trim_start_matches("www.");
        self.excluded_domains.iter().any(|d| host_within(host, d))
    }
}

pub fn is_messaging_host(host: &str) -> bool {
    let host = host.trim_start_matches("www.");
    MESSAGING_HOSTS.iter().any(|d| host_within(host, d))
}

fn host_within(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|rest| rest.ends_with('.'))
}

fn lowercase_set(xs: &[String]) -> HashSet<String> {
    xs.iter().map(|s| s.trim().to_lowercase()).collect()
}

fn known_name_pattern(name: &str) -> Result<Regex> {
    let body = name
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    Ok(Regex::new(&format!("(?i){}", body))?)
}

fn build_name_patterns(affixes: &[String], suffixes: &[String]) -> Result<Vec<Regex>> {
    let mut patterns = Vec::new();
    let affixes: Vec<String> = affixes
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(regex::escape)
        .collect();
    if !affixes.is_empty() {
        let alt = affixes.join("|");
        // MegaBet, Pixbet, Olymptrade
        patterns.push(Regex::new(&format!(
            r"\b\p{{Lu}}[\p{{L}}\p{{N}}]*?(?i:{alt})\d*\b"
        ))?);
        // BetMaster, Bet365, CryptoGain
        patterns.push(Regex::new(&format!(
            r"\b(?:{alt})[\p{{Lu}}\p{{N}}][\p{{L}}\p{{N}}]*\b"
        ))?);
    }
    let suffixes: Vec<String> = suffixes
        .iter()
        .map(|s| s.trim().trim_start_matches('.'))
        .filter(|s| !s.is_empty())
        .map(regex::escape)
        .collect();
    if !suffixes.is_empty() {
        patterns.push(Regex::new(&format!(
            r"\b[A-Za-z0-9][A-Za-z0-9-]*\.(?i:{})\b",
            suffixes.join("|")
        ))?);
    }
    Ok(patterns)
}
