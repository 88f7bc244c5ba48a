// Core functionality
pub mod core {
    pub mod config;
    pub mod error;
}

// Document loading and annotation
pub mod indexing {
    pub mod annotate;
    pub mod discovery;
    pub mod extract;
    pub mod nlp;
    pub mod rules;
}

// Index, queries and concordance
pub mod corpus {
    pub mod concordance;
    pub mod index;
    pub mod manager;
    pub mod occurrence;
    pub mod pos_tags;
    pub mod position;
    pub mod word_info;
}

// Persistence
pub mod storage {
    pub mod cache;
    pub mod xml;
}

// User interfaces
pub mod ui {
    pub mod cli;
}

// Re-export commonly used types
pub use core::config::{self, Config};
pub use core::error::{self, Error, Result};
pub use corpus::concordance::ConcordanceLine;
pub use corpus::index::CorpusIndex;
pub use corpus::manager::{Corpus, IndexSource};
pub use corpus::occurrence::{Occurrence, RawDocument};
pub use corpus::word_info::{self, WordInfo, WordInfoRecord};
pub use indexing::discovery::DocumentLoader;
pub use indexing::extract::{ExtractorRegistry, TextExtractor};
pub use indexing::nlp::{NlpProvider, WordCategory};
pub use indexing::rules::{ProviderConfig, RuleBasedProvider};
pub use storage::cache::{CacheLookup, CacheStore, MissReason};
pub use ui::cli::{self, Cli};
