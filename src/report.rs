//! Aggregates over accepted scan records: what platforms, sites and groups
//! keep coming up across documents.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::extract::groups::MessagingPlatform;
use crate::session::ScanRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub documents: usize,
    pub with_platforms: usize,
    pub with_links: usize,
    pub with_groups: usize,
    pub whatsapp_groups: usize,
    pub telegram_groups: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformCount {
    pub platform: String,
    /// Documents mentioning it.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainStats {
    pub domain: String,
    /// Link occurrences, repeats included.
    pub count: usize,
    pub urls: Vec<String>,
    pub documents: Vec<String>,
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSighting {
    pub platform: MessagingPlatform,
    pub link: String,
    pub name: String,
    pub document_id: String,
    pub document_title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub totals: Totals,
    pub platforms: Vec<PlatformCount>,
    pub domains: Vec<DomainStats>,
    pub groups: Vec<GroupSighting>,
}

impl ScanReport {
    pub fn build(records: &[ScanRecord]) -> ScanReport {
        ScanReport {
            totals: totals(records),
            platforms: platform_counts(records),
            domains: domain_stats(records),
            groups: group_sightings(records),
        }
    }

    pub fn top_platforms(&self, limit: usize) -> &[PlatformCount] {
        &self.platforms[..limit.min(self.platforms.len())]
    }

    pub fn top_domains(&self, limit: usize) -> &[DomainStats] {
        &self.domains[..limit.min(self.domains.len())]
    }
}

fn totals(records: &[ScanRecord]) -> Totals {
    let groups = records.iter().flat_map(|r| &r.extraction.groups);
    let (whatsapp_groups, telegram_groups) =
        groups.fold((0, 0), |(w, t), g| match g.platform {
            MessagingPlatform::WhatsApp => (w + 1, t),
            MessagingPlatform::Telegram => (w, t + 1),
        });
    Totals {
        documents: records.len(),
        with_platforms: records
            .iter()
            .filter(|r| !r.extraction.platforms.is_empty())
            .count(),
        with_links: records
            .iter()
            .filter(|r| !r.extraction.links.is_empty())
            .count(),
        with_groups: records
            .iter()
            .filter(|r| !r.extraction.groups.is_empty())
            .count(),
        whatsapp_groups,
        telegram_groups,
    }
}

/// Counted case-insensitively; the first spelling seen is displayed.
fn platform_counts(records: &[ScanRecord]) -> Vec<PlatformCount> {
    let mut display: HashMap<String, String> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        let per_doc: HashSet<String> = record
            .extraction
            .platforms
            .iter()
            .map(|p| p.to_lowercase())
            .collect();
        for p in &record.extraction.platforms {
            let key = p.to_lowercase();
            if !display.contains_key(&key) {
                display.insert(key.clone(), p.clone());
                order.push(key);
            }
        }
        for key in per_doc {
            *counts.entry(key).or_default() += 1;
        }
    }
    order
        .into_iter()
        .enumerate()
        .sorted_by_key(|(i, key)| (Reverse(counts[key]), *i))
        .map(|(_, key)| PlatformCount {
            count: counts[&key],
            platform: display.remove(&key).unwrap_or(key),
        })
        .collect()
}

fn domain_stats(records: &[ScanRecord]) -> Vec<DomainStats> {
    let mut by_domain: Vec<DomainStats> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in records {
        for link in &record.extraction.links {
            let i = *index.entry(link.domain.clone()).or_insert_with(|| {
                by_domain.push(DomainStats {
                    domain: link.domain.clone(),
                    count: 0,
                    urls: Vec::new(),
                    documents: Vec::new(),
                    titles: Vec::new(),
                });
                by_domain.len() - 1
            });
            let stats = &mut by_domain[i];
            stats.count += 1;
            if !stats.urls.contains(&link.url) {
                stats.urls.push(link.url.clone());
            }
            if !stats.documents.contains(&record.id) {
                stats.documents.push(record.id.clone());
                stats.titles.push(record.title.clone());
            }
        }
    }
    // stable: equal counts keep first-seen order
    by_domain.sort_by_key(|d| Reverse(d.count));
    by_domain
}

fn group_sightings(records: &[ScanRecord]) -> Vec<GroupSighting> {
    records
        .iter()
        .flat_map(|r| r.extraction.groups.iter().map(move |g| (r, g)))
        .unique_by(|(_, g)| g.link.clone())
        .map(|(r, g)| GroupSighting {
            platform: g.platform,
            link: g.link.clone(),
            name: g.name.clone(),
            document_id: r.id.clone(),
            document_title: r.title.clone(),
        })
        .collect()
}

/// Records listing `platform` among their candidates, compared case-insensitively.
pub fn records_mentioning<'a>(records: &'a [ScanRecord], platform: &str) -> Vec<&'a ScanRecord> {
    let wanted = platform.to_lowercase();
    records
        .iter()
        .filter(|r| {
            r.extraction
                .platforms
                .iter()
                .any(|p| p.to_lowercase() == wanted)
        })
        .collect()
}
