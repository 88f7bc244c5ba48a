use clap::Parser;
use concordex::cli::{Cli, Commands, FreqKind};
use concordex::config::Config;
use concordex::corpus::pos_tags;
use concordex::error::{Error, Result};
use concordex::word_info::WordInfoRecord;
use concordex::Corpus;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("concordex=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't need a processed corpus
    match &cli.command {
        Commands::ReadInfo { path } => return handle_read_info(path),
        Commands::Tags => {
            handle_tags();
            return Ok(());
        }
        _ => {}
    }

    let mut config = Config::new(cli.corpus_dir.clone())?;
    if let Some(lexicon) = &cli.lexicon {
        config = config.with_lexicon(lexicon);
    }
    let mut corpus = match &cli.from_xml {
        Some(path) => Corpus::open_xml(config, path)?,
        None => Corpus::open(config)?,
    };

    match cli.command {
        Commands::Files => handle_files(&corpus),
        Commands::Show { file } => handle_show(&corpus, &file),
        Commands::Freq { kind, top } => {
            let top = top.unwrap_or(corpus.config().top_n);
            handle_freq(&corpus, kind, top)
        }
        Commands::Info { word, export } => handle_info(&corpus, &word, export),
        Commands::Concordance {
            keyword,
            width,
            pos,
        } => {
            let width = width.unwrap_or(corpus.config().concordance_width);
            handle_concordance(&corpus, &keyword, width, pos.as_deref())
        }
        Commands::Edit {
            file,
            from,
            export_xml,
        } => handle_edit(&mut corpus, &file, &from, export_xml.as_deref()),
        Commands::Reload => handle_reload(&mut corpus),
        Commands::ExportXml { path } => handle_export_xml(&corpus, &path),
        Commands::ImportXml { path } => handle_import_xml(&mut corpus, &path),
        Commands::ReadInfo { .. } | Commands::Tags => Ok(()),
    }
}

fn load_xml(corpus: &mut Corpus, path: &Path) -> Result<()> {
    if corpus.import_xml(path) {
        Ok(())
    } else {
        Err(Error::Xml(format!(
            "Could not load corpus from {}",
            path.display()
        )))
    }
}

fn handle_files(corpus: &Corpus) -> Result<()> {
    let files = corpus.processed_filenames();
    if files.is_empty() {
        println!(
            "No processed files in {}",
            corpus.config().corpus_dir.display()
        );
        return Ok(());
    }
    for file in files {
        println!("{}", file);
    }
    Ok(())
}

fn handle_show(corpus: &Corpus, file: &str) -> Result<()> {
    if corpus.index().document(file).is_none() {
        return Err(Error::UnknownFile(file.to_string()));
    }
    println!("{}", corpus.raw_text(file));
    Ok(())
}

fn handle_freq(corpus: &Corpus, kind: FreqKind, top: usize) -> Result<()> {
    let (title, rows) = match kind {
        FreqKind::Wordform => ("Word form", corpus.wordform_frequency(top)),
        FreqKind::Lemma => ("Lemma", corpus.lemma_frequency(top)),
        FreqKind::Pos => ("POS tag", corpus.pos_frequency(top)),
    };

    if rows.is_empty() {
        println!("Corpus is empty");
        return Ok(());
    }

    let width = rows
        .iter()
        .map(|(item, _)| item.chars().count())
        .max()
        .unwrap_or(0)
        .max(title.len());
    println!("{:<width$}  Count", title, width = width);
    for (item, count) in rows {
        if kind == FreqKind::Pos {
            println!(
                "{:<width$}  {:>5}  {}",
                item,
                count,
                pos_tags::describe(&item),
                width = width
            );
        } else {
            println!("{:<width$}  {:>5}", item, count, width = width);
        }
    }
    Ok(())
}

fn handle_info(corpus: &Corpus, word: &str, export: Option<PathBuf>) -> Result<()> {
    if word.trim().is_empty() {
        return Err(Error::Config("Word must not be empty".to_string()));
    }

    let info = corpus.word_info(word);
    println!("Word form: {}", info.wordform);
    println!("Lemma:     {}", info.lemma);
    println!(
        "POS tag:   {} ({})",
        info.display_tag(),
        pos_tags::describe(&info.tag)
    );
    match &info.source_file {
        Some(file) => println!("File:      {}", file),
        None => println!("File:      not in corpus"),
    }

    if let Some(path) = export {
        info.to_record().save(&path)?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn handle_read_info(path: &Path) -> Result<()> {
    let record = WordInfoRecord::load(path)?;
    println!("Word form: {}", record.wordform);
    println!("Lemma:     {}", record.lemma);
    println!("POS tag:   {}", record.pos_tag);
    Ok(())
}

fn handle_concordance(
    corpus: &Corpus,
    keyword: &str,
    width: usize,
    pos: Option<&str>,
) -> Result<()> {
    if keyword.trim().is_empty() {
        return Err(Error::Config("Keyword must not be empty".to_string()));
    }

    let lines = corpus.concordance(keyword, width, pos);
    if lines.is_empty() {
        match pos {
            Some(pos) => println!("No occurrences of '{}' tagged {}*", keyword, pos),
            None => println!("No occurrences of '{}'", keyword),
        }
        return Ok(());
    }

    let left_width = lines
        .iter()
        .map(|l| l.left.chars().count())
        .max()
        .unwrap_or(0);
    for line in &lines {
        println!("{}", line.render(left_width));
    }
    println!("\n{} line(s)", lines.len());
    Ok(())
}

fn handle_edit(
    corpus: &mut Corpus,
    file: &str,
    from: &Path,
    export_xml: Option<&Path>,
) -> Result<()> {
    let text = std::fs::read_to_string(from)?;
    if !corpus.update_raw_text(file, &text) {
        return Err(Error::UnknownFile(file.to_string()));
    }
    println!(
        "Replaced text of '{}' ({} characters) for this run; the file itself is unchanged and the cache was dropped",
        file,
        text.chars().count()
    );

    match export_xml {
        Some(path) => {
            if !corpus.export_xml(path) {
                return Err(Error::Xml(format!("Could not write {}", path.display())));
            }
            println!(
                "Edited corpus saved to {} (query it with --from-xml)",
                path.display()
            );
        }
        None => println!("Pass --export-xml to keep the edited corpus"),
    }
    Ok(())
}

fn handle_reload(corpus: &mut Corpus) -> Result<()> {
    if corpus.reload() {
        println!(
            "Reloaded {} file(s), {} tokens",
            corpus.index().document_count(),
            corpus.index().token_count()
        );
    } else {
        println!(
            "No text could be processed in {}",
            corpus.config().corpus_dir.display()
        );
    }
    Ok(())
}

fn handle_export_xml(corpus: &Corpus, path: &Path) -> Result<()> {
    if corpus.index().document_count() == 0 {
        return Err(Error::Xml("Corpus is empty, nothing to export".to_string()));
    }
    if !corpus.export_xml(path) {
        return Err(Error::Xml(format!("Could not write {}", path.display())));
    }
    println!("Corpus saved to {}", path.display());
    Ok(())
}

fn handle_import_xml(corpus: &mut Corpus, path: &Path) -> Result<()> {
    load_xml(corpus, path)?;
    println!(
        "Loaded {} file(s), {} tokens from {}",
        corpus.index().document_count(),
        corpus.index().token_count(),
        path.display()
    );
    for file in corpus.processed_filenames() {
        println!("  {}", file);
    }
    Ok(())
}

fn handle_tags() {
    for (tag, description) in pos_tags::all() {
        println!("{:<5} {}", tag, description);
    }
}
