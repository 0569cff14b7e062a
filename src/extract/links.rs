use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use super::groups::is_invite_link;
use crate::lexicon::Lexicon;

pub(crate) static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[-\w.]+(?:[/?#][-\w%!./?=&+#~:@,;]*)?").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedLink {
    pub url: String,
    pub domain: String,
}

/// Web links in first-seen order. Repeats are kept; excluded hosts and
/// messaging invites are not. Other URLs on messaging hosts, such as
/// `api.whatsapp.com/send`, are ordinary links.
pub fn extract_links(text: &str, lexicon: &Lexicon) -> Vec<ExtractedLink> {
    let mut links = Vec::new();
    for m in URL_RE.find_iter(text) {
        let url = trim_trailing_punct(m.as_str());
        if is_invite_link(url) {
            continue;
        }
        let Some(domain) = parse_domain(url) else {
            continue;
        };
        if lexicon.is_excluded_host(&domain) {
            continue;
        }
        links.push(ExtractedLink {
            url: url.to_string(),
            domain,
        });
    }
    links
}

/// Lowercased host without a leading `www.`, or None when the URL has no usable host.
pub fn parse_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.trim_start_matches("www.");
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

pub(crate) fn trim_trailing_punct(s: &str) -> &str {
    s.trim_end_matches(['.', ',', ';', ':', '!', '?'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(text: &str) -> Vec<ExtractedLink> {
        extract_links(text, &Lexicon::default())
    }

    #[test]
    fn empty_text() {
        assert!(links("").is_empty());
    }

    #[test]
    fn excluded_video_host() {
        assert!(links("visit https://youtube.com/watch?v=1").is_empty());
        assert!(links("https://www.youtube.com/@canal e https://youtu.be/abc").is_empty());
        assert!(links("https://m.facebook.com/pagina").is_empty());
    }

    #[test]
    fn keeps_order_and_repeats() {
        let got = links(
            "Cadastro: https://ganhefacil.io/ref?id=9. Depois https://www.lucro-max.com e https://ganhefacil.io/ref?id=9",
        );
        let urls: Vec<&str> = got.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://ganhefacil.io/ref?id=9",
                "https://www.lucro-max.com",
                "https://ganhefacil.io/ref?id=9",
            ]
        );
        assert_eq!(got[1].domain, "lucro-max.com");
    }

    #[test]
    fn messaging_invites_are_not_web_links() {
        let got = links("grupo https://chat.whatsapp.com/ABC123 e https://t.me/sinais site http://invest.net/x");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].domain, "invest.net");
    }

    #[test]
    fn messaging_urls_land_in_exactly_one_output() {
        use crate::extract::groups::extract_messaging_groups;

        let text = "https://whatsapp.com/channel/0029VaABC e https://api.whatsapp.com/send?phone=5511999 \
                    e https://t.me/sinaisvip/";
        let web: Vec<String> = links(text).into_iter().map(|l| l.url).collect();
        let invites: Vec<String> = extract_messaging_groups(text).into_iter().map(|g| g.link).collect();
        assert_eq!(web, vec!["https://api.whatsapp.com/send?phone=5511999"]);
        assert_eq!(
            invites,
            vec!["https://whatsapp.com/channel/0029VaABC", "https://t.me/sinaisvip"]
        );
    }

    #[test]
    fn unparseable_hosts_are_dropped() {
        assert_eq!(parse_domain("https://"), None);
        assert_eq!(parse_domain("http://[::1"), None);
        assert_eq!(parse_domain("HTTPS://WWW.Exemplo.COM/a").as_deref(), Some("exemplo.com"));
    }

    #[test]
    fn custom_exclusions() {
        let lists = crate::lexicon::LexiconLists {
            excluded_domains: vec!["ganhefacil.io".into()],
            ..Default::default()
        };
        let lex = Lexicon::new(lists).unwrap();
        let got = extract_links("https://ganhefacil.io e https://youtube.com/x", &lex);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].domain, "youtube.com");
    }
}
