pub mod groups;
pub mod links;
pub mod platforms;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::lexicon::Lexicon;
use crate::settings::Tuning;
use groups::MessagingGroup;
use links::ExtractedLink;

/// One item handed over by a scraper: a video or page title plus its text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, alias = "description")]
    pub body: String,
}

impl Document {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Document {
            id: None,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Parses one JSON line. `title` is required, `body` may also be given as `description`.
    pub fn from_json_line(line: &str) -> Result<Document> {
        serde_json::from_str(line).map_err(|e| Error::InvalidDocument(e.to_string()))
    }

    /// Title and body separated by a blank line; every extractor sees this text.
    pub fn combined_text(&self) -> String {
        format!("{}\n\n{}", self.title, self.body)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Best candidates first.
    pub platforms: Vec<String>,
    pub links: Vec<ExtractedLink>,
    pub groups: Vec<MessagingGroup>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty() && self.links.is_empty() && self.groups.is_empty()
    }
}

/// Runs every extractor over one document.
pub fn process(doc: &Document, lexicon: &Lexicon, tuning: &Tuning) -> Extraction {
    let text = doc.combined_text();

    let links = links::extract_links(&text, lexicon);
    let groups = groups::extract_messaging_groups_with(&text, &tuning.groups);
    let platforms = platforms::rank_platforms(&text, lexicon, &tuning.platforms)
        .into_iter()
        .map(|c| c.name)
        .collect::<Vec<_>>();

    debug!(
        id = doc.id.as_deref().unwrap_or("-"),
        platforms = platforms.len(),
        links = links.len(),
        groups = groups.len(),
        "extracted document"
    );

    Extraction {
        platforms,
        links,
        groups,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use groups::MessagingPlatform;

    fn fixture(name: &str) -> Document {
        let raw = std::fs::read_to_string(format!("tests/fixtures/{}.txt", name)).unwrap();
        let (title, body) = raw.split_once('\n').unwrap_or((raw.as_str(), ""));
        Document::new(title.trim(), body.trim())
    }

    fn run(doc: &Document) -> Extraction {
        process(doc, &Lexicon::default(), &Tuning::default())
    }

    #[test]
    fn empty_document() {
        let out = run(&Document::new("", ""));
        assert_eq!(out, Extraction::default());
        assert!(out.is_empty());
    }

    #[test]
    fn title_only_platform_is_found() {
        let out = run(&Document::new("Saque de 300 reais na Betano", ""));
        assert_eq!(out.platforms.first().map(String::as_str), Some("Betano"));
    }

    #[test]
    fn combined_text_layout() {
        let doc = Document::new("Titulo", "Corpo");
        assert_eq!(doc.combined_text(), "Titulo\n\nCorpo");
    }

    #[test]
    fn parses_scraper_json() {
        let doc = Document::from_json_line(
            r#"{"id": "abc", "title": "Prova de pagamento", "description": "texto"}"#,
        )
        .unwrap();
        assert_eq!(doc.id.as_deref(), Some("abc"));
        assert_eq!(doc.body, "texto");

        let err = Document::from_json_line(r#"{"body": "sem titulo"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn payment_proof_video() {
        let out = run(&fixture("payment_proof"));

        assert_eq!(out.platforms.first().map(String::as_str), Some("Blaze"));
        assert!(out.platforms.iter().any(|p| p == "GoldenPay"));

        let domains: Vec<&str> = out.links.iter().map(|l| l.domain.as_str()).collect();
        assert_eq!(domains, vec!["goldenpay.io", "goldenpay.io"]);

        assert_eq!(out.groups.len(), 2);
        let zap = &out.groups[0];
        assert_eq!(zap.platform, MessagingPlatform::WhatsApp);
        assert_eq!(zap.name, "Lucro Diário");
        let tg = &out.groups[1];
        assert_eq!(tg.platform, MessagingPlatform::Telegram);
        assert_eq!(tg.link, "https://t.me/goldenpay_oficial");
        assert_eq!(tg.name, "Telegram Group 1");
    }

    #[test]
    fn plain_video_yields_nothing() {
        let out = run(&fixture("cooking"));
        assert!(out.platforms.is_empty(), "{:?}", out.platforms);
        assert!(out.groups.is_empty());
        assert!(out.links.is_empty());
    }

    #[test]
    fn social_links_only() {
        let out = run(&fixture("social_only"));
        assert!(out.links.is_empty());
        assert_eq!(out.groups.len(), 1);
        assert_eq!(out.groups[0].name, "Sinais Forex");
    }
}
