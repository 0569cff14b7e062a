//! A scan session: the only stateful part of the pipeline.
//!
//! Admission (id check, near-duplicate title check, registration) happens
//! under one lock so two concurrent near-duplicates cannot both get in.
//! Extraction runs outside the lock and is skipped for rejected documents.

use std::collections::HashSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::dedup::{DuplicateOf, SeenTitles};
use crate::extract::{process, Document, Extraction};
use crate::lexicon::Lexicon;
use crate::settings::Tuning;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub extraction: Extraction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    Accepted(ScanRecord),
    AlreadySeen { id: String },
    Duplicate { id: String, title: String, of: DuplicateOf },
}

impl ScanOutcome {
    pub fn accepted(&self) -> Option<&ScanRecord> {
        match self {
            ScanOutcome::Accepted(r) => Some(r),
            _ => None,
        }
    }
}

/// Result of the admission step alone.
#[derive(Debug)]
pub enum Admission {
    Admitted(String, Document),
    Rejected(ScanOutcome),
}

#[derive(Debug, Default)]
struct SessionIndex {
    titles: SeenTitles,
    /// Caller-supplied ids, accepted or known from an earlier run.
    ids: HashSet<String>,
    /// Ids handed out to documents that came without one.
    generated: HashSet<String>,
    next_id: usize,
}

impl SessionIndex {
    /// Next `doc-<n>` not already taken by a caller or an earlier document.
    fn generate_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("doc-{}", self.next_id);
            if !self.ids.contains(&id) && self.generated.insert(id.clone()) {
                return id;
            }
        }
    }
}

pub struct ScanSession<'a> {
    lexicon: &'a Lexicon,
    tuning: &'a Tuning,
    index: Mutex<SessionIndex>,
}

impl<'a> ScanSession<'a> {
    pub fn new(lexicon: &'a Lexicon, tuning: &'a Tuning) -> Self {
        ScanSession {
            lexicon,
            tuning,
            index: Mutex::new(SessionIndex::default()),
        }
    }

    /// Seeds ids accepted by an earlier run so they are not processed again.
    pub fn with_known_ids<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut index = self.lock();
            index.ids.extend(ids.into_iter().map(Into::into));
        }
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionIndex> {
        // the index stays consistent even if a holder panicked
        self.index.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of titles accepted so far.
    pub fn accepted_titles(&self) -> usize {
        self.lock().titles.len()
    }

    /// Check-and-register for one document.
    ///
    /// Only caller-supplied ids are checked against earlier ones; a document
    /// without an id gets a fresh `doc-<n>` that no earlier id uses.
    pub fn admit(&self, doc: Document) -> Admission {
        let mut index = self.lock();
        let id = match &doc.id {
            Some(id) if index.ids.contains(id) => {
                debug!(id = %id, "skipping already seen document");
                return Admission::Rejected(ScanOutcome::AlreadySeen { id: id.clone() });
            }
            Some(id) => id.clone(),
            None => index.generate_id(),
        };
        if let Some(of) = index.titles.find_duplicate(&doc.title, &self.tuning.dedup) {
            info!(
                id = %id,
                title = %doc.title,
                similar_to = %of.title,
                "skipping similar document"
            );
            return Admission::Rejected(ScanOutcome::Duplicate {
                id,
                title: doc.title,
                of,
            });
        }
        index.titles.register(&doc.title, &id);
        if doc.id.is_some() {
            index.ids.insert(id.clone());
        }
        Admission::Admitted(id, doc)
    }

    fn extract(&self, id: String, doc: Document) -> ScanOutcome {
        let extraction = process(&doc, self.lexicon, self.tuning);
        ScanOutcome::Accepted(ScanRecord {
            id,
            title: doc.title,
            extraction,
        })
    }

    /// Admits and, if accepted, extracts one document. Safe to call from many threads.
    pub fn scan(&self, doc: Document) -> ScanOutcome {
        match self.admit(doc) {
            Admission::Admitted(id, doc) => self.extract(id, doc),
            Admission::Rejected(outcome) => outcome,
        }
    }

    /// Admits documents in input order, then extracts the admitted ones.
    /// Outcomes come back in input order.
    pub fn scan_batch(&self, docs: Vec<Document>) -> Vec<ScanOutcome> {
        let admissions: Vec<Admission> = docs.into_iter().map(|d| self.admit(d)).collect();
        self.finish(admissions)
    }

    #[cfg(feature = "rayon")]
    fn finish(&self, admissions: Vec<Admission>) -> Vec<ScanOutcome> {
        admissions
            .into_par_iter()
            .map(|a| match a {
                Admission::Admitted(id, doc) => self.extract(id, doc),
                Admission::Rejected(outcome) => outcome,
            })
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn finish(&self, admissions: Vec<Admission>) -> Vec<ScanOutcome> {
        admissions
            .into_iter()
            .map(|a| match a {
                Admission::Admitted(id, doc) => self.extract(id, doc),
                Admission::Rejected(outcome) => outcome,
            })
            .collect()
    }
}
