use concordex::{Config, Corpus, IndexSource, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn corpus_dir(temp_dir: &TempDir) -> PathBuf {
    let dir = temp_dir.path().join("corpus_texts");
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_recipes(dir: &Path) {
    fs::write(
        dir.join("recipe1.txt"),
        "Preheat the oven. Mix the flour and sugar, then bake the cake for 30 minutes.\n\
         The cake should rest before serving.",
    )
    .unwrap();
    fs::write(
        dir.join("recipe2.txt"),
        "A pancake and a cake walk into a bakery. They cake the pans with butter.",
    )
    .unwrap();
}

fn touch_later(path: &Path) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(120))
        .unwrap();
}

/// One-page PDF showing `text` in Helvetica
fn single_page_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 24 Tf 72 720 Td ({}) Tj ET", text);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .as_bytes(),
    );
    pdf
}

#[test]
fn test_open_builds_and_caches() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let dir = corpus_dir(&temp_dir);
    write_recipes(&dir);

    let config = Config::new(Some(dir))?;
    let corpus = Corpus::open(config.clone())?;

    assert_eq!(corpus.source(), IndexSource::Processed);
    assert_eq!(
        corpus.processed_filenames(),
        vec!["recipe1.txt", "recipe2.txt"]
    );
    assert!(config.cache_path.exists());

    // Second open must come from the cache with identical content
    let cached = Corpus::open(config)?;
    assert_eq!(cached.source(), IndexSource::Cache);
    assert_eq!(cached.index(), corpus.index());
    assert_eq!(cached.wordform_frequency(5), corpus.wordform_frequency(5));

    Ok(())
}

#[test]
fn test_stale_cache_triggers_reprocessing() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let dir = corpus_dir(&temp_dir);
    write_recipes(&dir);
    let config = Config::new(Some(dir.clone()))?;
    Corpus::open(config.clone())?;

    // Modified file
    fs::write(dir.join("recipe2.txt"), "Only scones today.")?;
    touch_later(&dir.join("recipe2.txt"));
    let corpus = Corpus::open(config.clone())?;
    assert_eq!(corpus.source(), IndexSource::Processed);
    assert_eq!(corpus.raw_text("recipe2.txt"), "Only scones today.");

    // Added file
    fs::write(dir.join("recipe3.txt"), "Lemon tart.")?;
    let corpus = Corpus::open(config.clone())?;
    assert_eq!(corpus.source(), IndexSource::Processed);
    assert_eq!(corpus.processed_filenames().len(), 3);

    // Removed file
    fs::remove_file(dir.join("recipe1.txt"))?;
    let corpus = Corpus::open(config.clone())?;
    assert_eq!(corpus.source(), IndexSource::Processed);
    assert_eq!(
        corpus.processed_filenames(),
        vec!["recipe2.txt", "recipe3.txt"]
    );

    // Nothing changed since the last open
    let corpus = Corpus::open(config)?;
    assert_eq!(corpus.source(), IndexSource::Cache);

    Ok(())
}

#[test]
fn test_concordance_respects_word_boundaries() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let dir = corpus_dir(&temp_dir);
    fs::write(dir.join("a.txt"), "pancake and cake")?;

    let corpus = Corpus::open(Config::new(Some(dir))?)?;
    let lines = corpus.concordance("cake", 20, None);

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].keyword, "cake");
    assert_eq!(lines[0].left, "...pancake and");
    assert_eq!(lines[0].right, "...");
    Ok(())
}

#[test]
fn test_concordance_pos_filter_and_determinism() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let dir = corpus_dir(&temp_dir);
    write_recipes(&dir);
    let corpus = Corpus::open(Config::new(Some(dir))?)?;

    let all = corpus.concordance("cake", 15, None);
    assert_eq!(all.len(), 4);
    assert_eq!(all, corpus.concordance("CAKE", 15, None));

    let nouns = corpus.concordance("cake", 15, Some("NN"));
    assert_eq!(nouns.len(), 3);
    assert!(corpus
        .index()
        .occurrences()
        .iter()
        .any(|o| o.surface == "cake" && o.tag == "VBP"));

    let verbs = corpus.concordance("cake", 15, Some("VB"));
    assert_eq!(verbs.len(), 1);
    assert_eq!(verbs[0].left, "...a bakery. They");

    assert!(corpus.concordance("cake", 15, Some("JJ")).is_empty());
    assert!(corpus.concordance("", 15, None).is_empty());

    // Sorted by file, then left context, without duplicates
    let keys: Vec<(String, String)> = all
        .iter()
        .map(|l| (l.filename.clone(), l.left.clone()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(keys, sorted);
    Ok(())
}

#[test]
fn test_word_info_lookup_and_fallback() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let dir = corpus_dir(&temp_dir);
    write_recipes(&dir);
    let corpus = Corpus::open(Config::new(Some(dir))?)?;

    let info = corpus.word_info("Minutes");
    assert_eq!(info.lemma, "minute");
    assert_eq!(info.tag, "NNS");
    assert_eq!(info.source_file.as_deref(), Some("recipe1.txt"));
    assert!(!info.inferred);

    let guessed = corpus.word_info("croissants");
    assert!(guessed.inferred);
    assert!(!guessed.lemma.is_empty());
    assert!(guessed.display_tag().ends_with("(inferred)"));
    Ok(())
}

#[test]
fn test_edit_then_reload() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let dir = corpus_dir(&temp_dir);
    write_recipes(&dir);
    let config = Config::new(Some(dir))?;
    let mut corpus = Corpus::open(config.clone())?;

    assert!(corpus.update_raw_text("recipe2.txt", "Cake first. A pancake and a cake."));
    assert!(!config.cache_path.exists());
    assert!(!corpus.update_raw_text("nope.txt", "text"));

    // Reload goes back to the files on disk
    assert!(corpus.reload());
    assert!(corpus.raw_text("recipe2.txt").starts_with("A pancake"));
    assert!(config.cache_path.exists());
    Ok(())
}

#[test]
fn test_xml_round_trip_through_corpus() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let dir = corpus_dir(&temp_dir);
    write_recipes(&dir);
    let config = Config::new(Some(dir))?;
    let mut corpus = Corpus::open(config.clone())?;
    let original = corpus.index().clone();

    let xml_path = temp_dir.path().join("corpus_export.xml");
    assert!(corpus.export_xml(&xml_path));

    assert!(corpus.import_xml(&xml_path));
    assert_eq!(corpus.source(), IndexSource::Xml);
    assert_eq!(corpus.index(), &original);
    assert!(!config.cache_path.exists());
    Ok(())
}

#[test]
fn test_export_empty_corpus_fails() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let dir = corpus_dir(&temp_dir);
    let corpus = Corpus::open(Config::new(Some(dir))?)?;

    let xml_path = temp_dir.path().join("empty.xml");
    assert!(!corpus.export_xml(&xml_path));
    assert!(!xml_path.exists());
    Ok(())
}

#[test]
fn test_unextractable_files_are_skipped() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let dir = corpus_dir(&temp_dir);
    fs::write(dir.join("good.txt"), "Whisk the eggs.")?;
    fs::write(dir.join("scan.pdf"), "%PDF-1.4 binary")?;
    fs::write(dir.join("broken.docx"), "not a zip")?;
    fs::write(dir.join("notes.md"), "ignored")?;

    let corpus = Corpus::open(Config::new(Some(dir))?)?;
    assert_eq!(corpus.processed_filenames(), vec!["good.txt"]);
    assert_eq!(corpus.index().token_count(), 3);
    Ok(())
}

#[test]
fn test_docx_documents_are_indexed() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let dir = corpus_dir(&temp_dir);

    let file = fs::File::create(dir.join("menu.docx"))?;
    docx_rs::Docx::new()
        .add_paragraph(
            docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Chocolate cake")),
        )
        .add_paragraph(
            docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Lemon cake")),
        )
        .build()
        .pack(file)
        .unwrap();

    let corpus = Corpus::open(Config::new(Some(dir))?)?;
    assert_eq!(corpus.processed_filenames(), vec!["menu.docx"]);
    assert_eq!(corpus.wordform_frequency(1), vec![("cake".to_string(), 2)]);
    assert_eq!(corpus.concordance("cake", 10, None).len(), 2);
    Ok(())
}

#[test]
fn test_pdf_and_rtf_corpus_reuses_cache() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let dir = corpus_dir(&temp_dir);
    fs::write(dir.join("good.txt"), "Whisk the eggs.")?;
    fs::write(dir.join("menu.pdf"), single_page_pdf("Chocolate cake"))?;
    fs::write(
        dir.join("note.rtf"),
        r"{\rtf1\ansi{\fonttbl\f0\fswiss Helvetica;}\f0\pard Lemon cake.\par}",
    )?;

    let config = Config::new(Some(dir))?;
    let first = Corpus::open(config.clone())?;
    assert_eq!(first.source(), IndexSource::Processed);
    assert_eq!(
        first.processed_filenames(),
        vec!["good.txt", "menu.pdf", "note.rtf"]
    );
    assert_eq!(first.wordform_frequency(1), vec![("cake".to_string(), 2)]);

    let second = Corpus::open(config)?;
    assert_eq!(second.source(), IndexSource::Cache);
    assert_eq!(second.index(), first.index());
    Ok(())
}

#[test]
fn test_edit_survives_through_xml_export() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let dir = corpus_dir(&temp_dir);
    write_recipes(&dir);
    let config = Config::new(Some(dir.clone()))?;

    let mut corpus = Corpus::open(config.clone())?;
    assert!(corpus.update_raw_text("recipe2.txt", "A pancake and a cake."));
    let xml_path = temp_dir.path().join("edited.xml");
    assert!(corpus.export_xml(&xml_path));

    // The directory is untouched by the edit
    assert!(fs::read_to_string(dir.join("recipe2.txt"))?.starts_with("A pancake and a cake walk"));

    let restored = Corpus::open_xml(config.clone(), &xml_path)?;
    assert_eq!(restored.source(), IndexSource::Xml);
    assert_eq!(restored.raw_text("recipe2.txt"), "A pancake and a cake.");
    assert!(!config.cache_path.exists());

    // A plain open still works from the directory
    let reopened = Corpus::open(config)?;
    assert_eq!(reopened.source(), IndexSource::Processed);
    assert!(reopened.raw_text("recipe2.txt").starts_with("A pancake and a cake walk"));
    Ok(())
}
