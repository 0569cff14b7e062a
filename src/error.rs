use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load settings: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed lexicon file {}: {source}", path.display())]
    LexiconFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("lexicon entry produced an invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

pub type Result<T> = std::result::Result<T, Error>;
