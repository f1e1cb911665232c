//! End-to-end pipelines behind the CLI commands.
//!
//! Each `run_*` function owns one subcommand. Stages are chained with
//! `anyhow::Context` so a failure names the stage that died; batch mode
//! instead reports the failure and moves to the next document.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;
use pactum_core::{
    normalize_supplier_name, validation_summary, Contract, ContractMetadata, OperationKind,
    TranslationStatus, ValidationSummary, NOT_AVAILABLE,
};
use pactum_extract::{
    builtin_labels, reconcile, CentroidClassifier, ClassifyPass, DomainPass, EntityExtractor,
    HistoricalExamples, OnnxEncoder, SentenceEncoder,
};
use pactum_files::{
    organized_filename, sanitize_filename, unique_destination, Organizer, ReprocessingQueue,
    RetryPolicy, PROCESSED_DIR,
};
use pactum_parse::{parse_json_value, parse_markdown};
use pactum_remote::{
    analyze_with_patterns, LlmClient, TextNormalizer, Translate, TranslateClient,
};
use pactum_store::{ContractIndex, IndexRecord, JsonQueueStore};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::display;
use crate::{AnalyzerArgs, BatchArgs, IndexArgs, OrganizeArgs, ParseArgs, RetryArgs, SearchArgs};

/// Extensions the document commands pick up from a directory.
const DOCUMENT_EXTENSIONS: [&str; 4] = ["md", "txt", "json", "pdf"];

/// Text-bearing forms the parser accepts.
enum RawDocument {
    Markdown(String),
    Json(Value),
}

/// One fully processed document.
pub(crate) struct DocumentReport {
    pub contract: Contract,
    pub summary: ValidationSummary,
}

// ── Commands ───────────────────────────────────────────────────────────────

pub async fn run_parse(args: ParseArgs) -> anyhow::Result<()> {
    let mut extractor = build_extractor(&args.analyzers)?;
    let report = process_document(&args.input, &args.analyzers, &mut extractor)
        .await
        .with_context(|| format!("parse {}", args.input.display()))?;

    if args.json {
        let payload = json!({
            "contract": report.contract,
            "validation": report.summary,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        display::print_contract(&report.contract, &report.summary);
    }
    Ok(())
}

pub async fn run_batch(args: BatchArgs) -> anyhow::Result<()> {
    let files = collect_documents(&args.input)?;
    anyhow::ensure!(
        !files.is_empty(),
        "no documents found under {}",
        args.input.display()
    );

    let mut extractor = build_extractor(&args.analyzers)?;
    let mut succeeded = 0usize;
    let mut failed = 0usize;

    eprintln!(
        "Parsing {} documents from {}",
        files.len(),
        args.input.display()
    );
    for path in &files {
        match process_document(path, &args.analyzers, &mut extractor).await {
            Ok(report) => {
                succeeded += 1;
                eprintln!(
                    "  {}: {} ({} sections, {} validation errors)",
                    path.display(),
                    report.contract.contract_name,
                    report.summary.section_count,
                    report.summary.error_count
                );
            }
            Err(error) => {
                failed += 1;
                eprintln!("  {}: FAILED: {error:#}", path.display());
            }
        }
    }

    eprintln!("Parsed {succeeded} of {} documents ({failed} failed)", files.len());
    Ok(())
}

pub async fn run_organize(args: OrganizeArgs) -> anyhow::Result<()> {
    let files = if args.input.is_dir() {
        // Only the contract files themselves move; converted artifacts
        // stay where the conversion left them.
        collect_documents(&args.input)?
            .into_iter()
            .filter(|p| has_extension(p, "pdf"))
            .collect()
    } else {
        vec![args.input.clone()]
    };
    anyhow::ensure!(
        !files.is_empty(),
        "no contract files under {}",
        args.input.display()
    );

    let translator = args
        .analyzers
        .translate_url
        .clone()
        .map(TranslateClient::new);
    let organizer = Organizer::new(&args.output);
    let queue = ReprocessingQueue::new(JsonQueueStore::new(&args.output));

    for path in &files {
        if let Err(error) =
            organize_one(path, &args, &organizer, translator.as_ref(), &queue).await
        {
            eprintln!("  {}: FAILED: {error:#}", path.display());
        }
    }
    if !args.apply {
        eprintln!("dry run; pass --apply to move files");
    }
    Ok(())
}

pub async fn run_index(args: IndexArgs) -> anyhow::Result<()> {
    let mut encoder = OnnxEncoder::load(&args.model_dir).context("load sentence encoder")?;

    let (artifact, raw) = load_document(&args.input)?;
    let text = extraction_text(&raw);
    let parsed = match &raw {
        RawDocument::Markdown(content) => parse_markdown(content, &artifact),
        RawDocument::Json(data) => parse_json_value(data, &artifact),
    };
    let contract = parsed.into_contract(&[]);

    let embedding = encoder.encode(&text).context("embed document")?;
    let index = ContractIndex::open(&args.db, embedding.len())
        .await
        .context("open index")?;

    let id = if contract.contract_number == NOT_AVAILABLE {
        contract.document.id.clone()
    } else {
        contract.contract_number.clone()
    };
    let supplier =
        (contract.vendor_name != NOT_AVAILABLE).then(|| contract.vendor_name.clone());
    index
        .add(IndexRecord {
            id: id.clone(),
            supplier,
            embedding,
            metadata: json!({
                "contract_name": contract.contract_name,
                "contract_type": contract.contract_type.as_str(),
                "client_name": contract.client_name,
                "effective_date": contract.effective_date,
                "expiration_date": contract.expiration_date,
                "total_value": contract.total_value,
                "currency": contract.currency,
            }),
        })
        .await
        .context("add to index")?;

    eprintln!("indexed {id} into {}", args.db.display());
    Ok(())
}

pub async fn run_search(args: SearchArgs) -> anyhow::Result<()> {
    let mut encoder = OnnxEncoder::load(&args.model_dir).context("load sentence encoder")?;
    let embedding = encoder.encode(&args.query).context("embed query")?;

    let index = ContractIndex::open(&args.db, embedding.len())
        .await
        .context("open index")?;
    let hits = index
        .query(&embedding, args.limit)
        .await
        .context("query index")?;

    if args.json {
        let payload: Vec<Value> = hits
            .iter()
            .map(|hit| {
                json!({
                    "id": hit.id,
                    "supplier": hit.supplier,
                    "distance": hit.distance,
                    "metadata": hit.metadata,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        display::print_search_hits(&args.query, &hits);
    }
    Ok(())
}

pub async fn run_retry(args: RetryArgs) -> anyhow::Result<()> {
    let store = JsonQueueStore::new(&args.queue_dir);
    let policy = RetryPolicy {
        max_attempts: args.max_attempts,
        ..RetryPolicy::default()
    };
    let queue = ReprocessingQueue::with_policy(store, policy);

    let status = queue.status()?;
    eprintln!(
        "queue: {} entries, {} ready for retry",
        status.total, status.retry_ready
    );

    let translator = args.translate_url.clone().map(TranslateClient::new);
    let outcome = queue
        .retry_failed(translator.as_ref().map(|t| t as &dyn Translate))
        .await
        .context("retry queue")?;

    eprintln!(
        "{} resolved, {} still failed",
        outcome.successful, outcome.still_failed
    );
    for error in &outcome.errors {
        eprintln!("  {error}");
    }
    Ok(())
}

// ── Document pipeline ──────────────────────────────────────────────────────

/// Parses, extracts, analyzes, assembles, and validates one document.
async fn process_document(
    path: &Path,
    args: &AnalyzerArgs,
    extractor: &mut EntityExtractor,
) -> anyhow::Result<DocumentReport> {
    let (artifact, raw) = load_document(path)?;
    let raw = normalize_input(args, raw).await;
    let text = extraction_text(&raw);

    let mut parsed = match &raw {
        RawDocument::Markdown(content) => parse_markdown(content, &artifact),
        RawDocument::Json(data) => parse_json_value(data, &artifact),
    };

    let outcome = extractor.extract(&text, &parsed.document.id);
    if !outcome.candidates.is_empty() {
        info!(
            candidates = outcome.candidates.len(),
            method = %outcome.extraction_method,
            "model extraction finished"
        );
    }
    let entities = reconcile(outcome.candidates);

    let filename = parsed.document.filename.clone();
    if let Some(metadata) = analyze_metadata(args, &text, &filename).await {
        parsed.metadata.merge_llm(&metadata);
    }

    let contract = parsed.into_contract(&entities);
    let summary = validation_summary(&contract);
    Ok(DocumentReport { contract, summary })
}

/// Resolves the parseable artifact for a path. PDFs are converted out of
/// process, so a `.pdf` input expects its converted `.md` or `.json`
/// sibling next to it.
fn resolve_artifact(path: &Path) -> anyhow::Result<PathBuf> {
    if !has_extension(path, "pdf") {
        return Ok(path.to_path_buf());
    }
    for sibling in [path.with_extension("md"), path.with_extension("json")] {
        if sibling.exists() {
            return Ok(sibling);
        }
    }
    anyhow::bail!(
        "no converted artifact next to {}; expected a .md or .json sibling",
        path.display()
    )
}

fn load_document(path: &Path) -> anyhow::Result<(PathBuf, RawDocument)> {
    let artifact = resolve_artifact(path)?;
    let content =
        fs::read_to_string(&artifact).with_context(|| format!("read {}", artifact.display()))?;
    let raw = if has_extension(&artifact, "json") {
        let data = serde_json::from_str(&content)
            .with_context(|| format!("parse JSON in {}", artifact.display()))?;
        RawDocument::Json(data)
    } else {
        RawDocument::Markdown(content)
    };
    Ok((artifact, raw))
}

/// Plain text for the extraction passes. Block-structured documents are
/// flattened to their block text; markdown is used as-is.
fn extraction_text(raw: &RawDocument) -> String {
    match raw {
        RawDocument::Markdown(content) => content.clone(),
        RawDocument::Json(data) => data
            .get("blocks")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|b| b.get("text").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_else(|| data.to_string()),
    }
}

/// Normalizes markdown to English when a translation endpoint is set;
/// block-structured payloads are left alone.
async fn normalize_input(args: &AnalyzerArgs, raw: RawDocument) -> RawDocument {
    let Some(url) = &args.translate_url else {
        return raw;
    };
    match raw {
        RawDocument::Markdown(content) => {
            let mut normalizer = TextNormalizer::new(TranslateClient::new(url.clone()));
            let normalized = normalizer.normalize(&content).await;
            if normalized.translated {
                info!(language = %normalized.source_language, "translated document text");
            }
            RawDocument::Markdown(normalized.text)
        }
        other => other,
    }
}

/// Builds the extraction pipeline from whatever models are on hand. With
/// no model directory the extractor runs zero passes and reconciliation
/// sees no candidates.
fn build_extractor(args: &AnalyzerArgs) -> anyhow::Result<EntityExtractor> {
    let mut extractor = EntityExtractor::new();
    let Some(model_dir) = &args.model_dir else {
        return Ok(extractor);
    };

    let encoder = Rc::new(RefCell::new(
        OnnxEncoder::load(model_dir).context("load sentence encoder")?,
    ));

    let mut domain = DomainPass::new(Rc::clone(&encoder));
    if let Some(history) = &args.history {
        let examples = HistoricalExamples::from_parquet(history)
            .with_context(|| format!("load history from {}", history.display()))?;
        for (entity_type, phrases) in examples.domain_patterns() {
            domain.extend_patterns(entity_type, phrases.iter().cloned());
        }
        info!(
            patterns = domain.pattern_count(),
            "extended domain patterns from history"
        );
    }

    let classifier = CentroidClassifier::fit(Rc::clone(&encoder), builtin_labels())
        .context("fit segment classifier")?;

    extractor = extractor
        .with_source(Box::new(domain))
        .with_source(Box::new(ClassifyPass::new(classifier)));
    Ok(extractor)
}

/// Runs the configured metadata analyzer: the LLM when an endpoint and
/// key are set, with the pattern analyzer as the fallback when the call
/// fails. No endpoint means no analyzer.
async fn analyze_metadata(
    args: &AnalyzerArgs,
    text: &str,
    filename: &str,
) -> Option<ContractMetadata> {
    let url = args.llm_url.as_deref()?;
    let Some(key) = args.llm_key.as_deref() else {
        warn!("LLM endpoint set without an API key; using the pattern analyzer");
        return Some(analyze_with_patterns(text, filename));
    };

    let client = LlmClient::new(url.to_string(), key.to_string());
    match client.analyze(text, filename).await {
        Ok(metadata) => Some(metadata),
        Err(error) => {
            warn!(filename, %error, "LLM analysis failed; using the pattern analyzer");
            Some(analyze_with_patterns(text, filename))
        }
    }
}

// ── Organization ───────────────────────────────────────────────────────────

async fn organize_one(
    path: &Path,
    args: &OrganizeArgs,
    organizer: &Organizer,
    translator: Option<&TranslateClient>,
    queue: &ReprocessingQueue<JsonQueueStore>,
) -> anyhow::Result<()> {
    let (_, raw) = load_document(path)?;
    let text = extraction_text(&raw);
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut metadata = match analyze_metadata(&args.analyzers, &text, &filename).await {
        Some(metadata) => metadata,
        None => analyze_with_patterns(&text, &filename),
    };

    // The pattern analyzer carries no supplier rules; the parse layer
    // often does better, so fill the gap before naming the file.
    if metadata.supplier == "Unknown" {
        let parsed = match &raw {
            RawDocument::Markdown(content) => parse_markdown(content, path),
            RawDocument::Json(data) => parse_json_value(data, path),
        };
        if let Some(vendor) = parsed.metadata.vendor_name {
            metadata.supplier = vendor;
        }
    }

    if !args.apply {
        let supplier_dir = args
            .output
            .join(PROCESSED_DIR)
            .join(normalize_supplier_name(&metadata.supplier));
        let dest = unique_destination(&supplier_dir, &organized_filename(&metadata));
        println!("{} -> {}", path.display(), dest.display());
        return Ok(());
    }

    let operation = organizer.organize(path, &metadata)?;
    println!("{} -> {}", operation.original_path, operation.new_path);

    // Non-ASCII originals go through the filename-translation workflow; a
    // failed translation lands in the queue for `pactum retry`.
    if operation.operation == OperationKind::Translate {
        let record = sanitize_filename(&filename, translator.map(|t| t as &dyn Translate)).await;
        if record.status == TranslationStatus::Failed {
            queue.enqueue(&record)?;
        }
    }
    Ok(())
}

// ── Directory walking ──────────────────────────────────────────────────────

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

/// Parseable files directly under `dir`, sorted. A converted artifact
/// whose source PDF is also present is reached through the PDF entry, so
/// it is dropped to avoid parsing the same contract twice.
fn collect_documents(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let known = DOCUMENT_EXTENSIONS
            .iter()
            .any(|ext| has_extension(&path, ext));
        if known {
            files.push(path);
        }
    }

    let pdfs: HashSet<PathBuf> = files
        .iter()
        .filter(|p| has_extension(p, "pdf"))
        .cloned()
        .collect();
    files.retain(|p| has_extension(p, "pdf") || !pdfs.contains(&p.with_extension("pdf")));

    files.sort();
    Ok(files)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE_MD: &str = "\
# Master Service Agreement

**Contract Number:** MSA-2024-001
**Client:** Acme Corporation
**Vendor:** TechCorp Solutions
**Effective Date:** 01/02/2024
**Expiration Date:** 01/02/2026

## Payment Terms

The total value is R$ 150.000,00 payable monthly.
";

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn markdown_resolves_to_itself() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "contract.md", "# Title");
        assert_eq!(resolve_artifact(&path).unwrap(), path);
    }

    #[test]
    fn pdf_resolves_to_converted_sibling() {
        let dir = TempDir::new().unwrap();
        let sibling = write_file(&dir, "contract.md", "# Title");
        let pdf = dir.path().join("contract.pdf");
        fs::write(&pdf, b"%PDF-1.4").unwrap();

        assert_eq!(resolve_artifact(&pdf).unwrap(), sibling);
    }

    #[test]
    fn pdf_without_sibling_is_an_error() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("contract.pdf");
        fs::write(&pdf, b"%PDF-1.4").unwrap();

        let error = resolve_artifact(&pdf).unwrap_err();
        assert!(error.to_string().contains("converted artifact"));
    }

    #[test]
    fn json_documents_flatten_block_text() {
        let data = json!({
            "blocks": [
                {"type": "heading", "text": "Service Agreement"},
                {"type": "paragraph", "text": "Contract Number: SOW-1"},
            ]
        });
        let text = extraction_text(&RawDocument::Json(data));
        assert_eq!(text, "Service Agreement\nContract Number: SOW-1");
    }

    #[test]
    fn collecting_skips_converted_siblings_and_sorts() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "b.md", "# B");
        fs::write(dir.path().join("b.pdf"), b"%PDF").unwrap();
        write_file(&dir, "a.md", "# A");
        write_file(&dir, "notes.rst", "ignored");

        let files = collect_documents(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.md", "b.pdf"]);
    }

    #[tokio::test]
    async fn processes_a_document_without_any_models() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "msa.md", SAMPLE_MD);

        let mut extractor = EntityExtractor::new();
        let report = process_document(&path, &AnalyzerArgs::default(), &mut extractor)
            .await
            .unwrap();

        assert_eq!(report.contract.contract_name, "Master Service Agreement");
        assert_eq!(report.contract.contract_number, "MSA-2024-001");
        assert_eq!(report.contract.contract_type.as_str(), "msa");
        assert!(report.contract.effective_date.is_some());
        assert!(report.summary.section_count >= 1);
    }
}
