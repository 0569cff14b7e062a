use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::links::trim_trailing_punct;
use crate::settings::GroupTuning;

// group 1 is the invite code or path after the host
static WHATSAPP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:https?://)?(?:www\.)?\b(?:chat\.whatsapp\.com/(?:invite/)?|whatsapp\.com/(?:channel|invite)/|wa\.me/)([-\w%!./?=&+#]+)",
    )
    .unwrap()
});
static TELEGRAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:www\.)?\b(?:t|telegram)\.me/([-\w%!./?=&+#]+)").unwrap()
});
// "grupo do Ouro", "canal da Maria Invest"; words after the first must be capitalized
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?i:grupo|canal)\s+(?i:d(?:os|as|e|o|a))\s+([\p{L}\p{N}][\p{L}\p{N}&'’-]*(?:[ \t]+[\p{Lu}\p{N}][\p{L}\p{N}&'’-]*){0,3})",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessagingPlatform {
    WhatsApp,
    Telegram,
}

impl MessagingPlatform {
    pub fn label(&self) -> &'static str {
        match self {
            Self::WhatsApp => "WhatsApp",
            Self::Telegram => "Telegram",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Self::WhatsApp => &WHATSAPP_RE,
            Self::Telegram => &TELEGRAM_RE,
        }
    }
}

impl fmt::Display for MessagingPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingGroup {
    pub platform: MessagingPlatform,
    pub link: String,
    pub name: String,
}

pub fn extract_messaging_groups(text: &str) -> Vec<MessagingGroup> {
    extract_messaging_groups_with(text, &GroupTuning::default())
}

/// WhatsApp and Telegram invites in text order, each named from a nearby
/// "grupo do ..." / "canal da ..." phrase or else "<Platform> Group <n>".
pub fn extract_messaging_groups_with(text: &str, tuning: &GroupTuning) -> Vec<MessagingGroup> {
    let mut hits: Vec<(usize, usize, MessagingPlatform, &str)> = Vec::new();
    for platform in [MessagingPlatform::WhatsApp, MessagingPlatform::Telegram] {
        for caps in platform.pattern().captures_iter(text) {
            if let Some((start, link)) = invite_link(text, &caps) {
                hits.push((start, start + link.len(), platform, link));
            }
        }
    }
    hits.sort_by_key(|h| h.0);

    let mut counts = [0usize; 2];
    hits.into_iter()
        .map(|(start, end, platform, link)| {
            let n = &mut counts[platform as usize];
            *n += 1;
            let name = label_near(text, start, end, tuning.context_radius)
                .unwrap_or_else(|| format!("{} Group {}", platform, n));
            MessagingGroup {
                platform,
                link: link.to_string(),
                name,
            }
        })
        .collect()
}

/// Whether `url` starts with a WhatsApp or Telegram invite.
pub(crate) fn is_invite_link(url: &str) -> bool {
    [MessagingPlatform::WhatsApp, MessagingPlatform::Telegram]
        .iter()
        .filter_map(|p| p.pattern().captures(url))
        .any(|caps| caps.get(0).is_some_and(|m| m.start() == 0) && invite_link(url, &caps).is_some())
}

/// Start and cleaned link of an invite match. Trailing punctuation and
/// slashes are dropped; a match with nothing left after the host, or one
/// that begins inside a longer host name, is not an invite.
fn invite_link<'t>(text: &'t str, caps: &Captures<'t>) -> Option<(usize, &'t str)> {
    let m = caps.get(0)?;
    let inside_host = text[..m.start()]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if inside_host {
        return None;
    }
    let link = trim_trailing_punct(m.as_str()).trim_end_matches('/');
    let path_at = caps.get(1)?.start() - m.start();
    (link.len() > path_at).then_some((m.start(), link))
}

/// Closest label before the link, otherwise the first one after it.
fn label_near(text: &str, start: usize, end: usize, radius: usize) -> Option<String> {
    let before = window_before(text, start, radius);
    let after = window_after(text, end, radius);
    let from_before = LABEL_RE
        .captures_iter(before)
        .filter_map(|c| clean_label(&c[1]))
        .last();
    from_before.or_else(|| {
        LABEL_RE
            .captures_iter(after)
            .find_map(|c| clean_label(&c[1]))
    })
}

fn clean_label(raw: &str) -> Option<String> {
    let name = raw.trim_matches(|c: char| !c.is_alphanumeric());
    if name.is_empty() || name.to_lowercase().starts_with("http") {
        None
    } else {
        Some(name.to_string())
    }
}

fn window_before(text: &str, start: usize, radius: usize) -> &str {
    let head = &text[..start];
    let from = head
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    &head[from..]
}

fn window_after(text: &str, end: usize, radius: usize) -> &str {
    let tail = &text[end..];
    let to = tail
        .char_indices()
        .nth(radius)
        .map(|(i, _)| i)
        .unwrap_or(tail.len());
    &tail[..to]
}
