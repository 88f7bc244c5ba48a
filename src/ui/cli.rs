use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// concordex - corpus statistics and keyword-in-context concordances
#[derive(Parser, Debug)]
#[command(name = "concordex")]
#[command(about = "Analyze a directory of texts: frequencies, word lookups and POS-filtered concordances", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Corpus directory (default: ./corpus_texts)
    #[arg(long, global = true)]
    pub corpus_dir: Option<PathBuf>,

    /// Tab-separated lexicon (word, TAG, optional lemma) for the tagger
    #[arg(long, global = true)]
    pub lexicon: Option<PathBuf>,

    /// Query an index read from this XML export; the directory and its cache are not touched
    #[arg(long, global = true, value_name = "XML")]
    pub from_xml: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the processed files
    Files,
    /// Print the raw text of a file
    Show {
        /// File name inside the corpus directory
        file: String,
    },
    /// Most frequent word forms, lemmas or POS tags
    Freq {
        /// What to count
        #[arg(value_enum, default_value_t = FreqKind::Wordform)]
        kind: FreqKind,
        /// Number of entries to show (default: 20)
        #[arg(short = 'n', long)]
        top: Option<usize>,
    },
    /// Lemma, POS tag and source file of a word
    Info {
        word: String,
        /// Also save the result as JSON
        #[arg(long, value_name = "JSON")]
        export: Option<PathBuf>,
    },
    /// Show a word-info JSON file saved by `info --export`
    ReadInfo {
        path: PathBuf,
    },
    /// Keyword-in-context listing
    Concordance {
        keyword: String,
        /// Context characters on each side (default: 80)
        #[arg(short, long)]
        width: Option<usize>,
        /// Keep only tags starting with this prefix (e.g. NN, VB)
        #[arg(short, long)]
        pos: Option<String>,
    },
    /// Replace the stored text of a file for this run only.
    ///
    /// The file on disk is not changed and the cache is dropped; use
    /// --export-xml to keep the edited corpus.
    Edit {
        /// File name inside the corpus directory
        file: String,
        /// File holding the new text
        #[arg(long, value_name = "PATH")]
        from: PathBuf,
        /// Save the edited corpus as XML
        #[arg(long, value_name = "XML")]
        export_xml: Option<PathBuf>,
    },
    /// Drop the cache and reprocess the corpus directory
    Reload,
    /// Save the index as XML
    ExportXml {
        path: PathBuf,
    },
    /// Load an index from XML and summarize it
    ImportXml {
        path: PathBuf,
    },
    /// List POS tags with their descriptions
    Tags,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FreqKind {
    Wordform,
    Lemma,
    Pos,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_concordance() {
        let cli = Cli::parse_from([
            "concordex",
            "--corpus-dir",
            "texts",
            "concordance",
            "cake",
            "--pos",
            "NN",
            "-w",
            "30",
        ]);
        assert_eq!(cli.corpus_dir, Some(PathBuf::from("texts")));
        match cli.command {
            Commands::Concordance {
                keyword,
                width,
                pos,
            } => {
                assert_eq!(keyword, "cake");
                assert_eq!(width, Some(30));
                assert_eq!(pos.as_deref(), Some("NN"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_freq_defaults() {
        let cli = Cli::parse_from(["concordex", "freq"]);
        match cli.command {
            Commands::Freq { kind, top } => {
                assert_eq!(kind, FreqKind::Wordform);
                assert_eq!(top, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::parse_from(["concordex", "freq", "pos", "-n", "5"]);
        assert!(matches!(
            cli.command,
            Commands::Freq {
                kind: FreqKind::Pos,
                top: Some(5)
            }
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["concordex", "files", "--lexicon", "lex.tsv"]);
        assert_eq!(cli.lexicon, Some(PathBuf::from("lex.tsv")));
        assert!(matches!(cli.command, Commands::Files));
    }

    #[test]
    fn test_parse_edit_with_export() {
        let cli = Cli::parse_from([
            "concordex",
            "edit",
            "recipe.txt",
            "--from",
            "new.txt",
            "--export-xml",
            "edited.xml",
        ]);
        match cli.command {
            Commands::Edit {
                file,
                from,
                export_xml,
            } => {
                assert_eq!(file, "recipe.txt");
                assert_eq!(from, PathBuf::from("new.txt"));
                assert_eq!(export_xml, Some(PathBuf::from("edited.xml")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
