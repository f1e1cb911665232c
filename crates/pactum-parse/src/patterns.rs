//! Regex library for contract fields.
//!
//! Every extractor here is best-effort: a field that cannot be matched is
//! simply absent, and within one field the first match wins — later matches
//! are ignored. Malformed date or amount substrings are skipped, never
//! raised.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};

use pactum_core::metadata::ContractMetadata;
use pactum_core::normalize::{month_from_name, parse_amount, parse_date_flex};
use pactum_core::ContractType;

// ── Pattern tables ─────────────────────────────────────────────────────────

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,2}\s+(.+)$").unwrap());

static CONTRACT_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:contract\s+number|número\s+do\s+contrato|ref|reference)[\s:]*([A-Z0-9\-_/]+)")
        .unwrap()
});

static BOLD_CONTRACT_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Contract Number:\*\*\s*([A-Z0-9\-_/]+)").unwrap());

static CURRENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(R\$|US\$|USD|BRL|EUR|€|£)").unwrap());

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:valor|value|amount|total)[\s:*]*(?:R\$|US\$|USD|BRL|EUR|€|£)?\s*([0-9][0-9.,]*)")
        .unwrap()
});

static BOLD_AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*Total Value:\*\*\s*(?:R\$|US\$|USD|BRL|EUR|€|£)?\s*([0-9][0-9.,]*)").unwrap()
});

static DATE_SLASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").unwrap());

static DATE_ISO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").unwrap());

static DATE_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d{1,2})\s+(?:de\s+)?(jan|fev|mar|abr|mai|jun|jul|ago|set|out|nov|dez)[a-zç]*\s+(?:de\s+)?(\d{4})",
    )
    .unwrap()
});

static BOLD_EFFECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Effective Date:\*\*\s*\d{1,2}/\d{1,2}/\d{4}").unwrap());

static BOLD_EXPIRATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Expiration Date:\*\*\s*\d{1,2}/\d{1,2}/\d{4}").unwrap());

static CLIENT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)(?:cliente|client|contratante|buyer)[\s:]*([A-Z][A-Za-z\s&.]+?)(?:\s+(?:vendor|fornecedor|contratado|seller|supplier|prestador|provider|contractor)|$)").unwrap(),
        Regex::new(r"(?i)(?:empresa|company|corporation)[\s:]*([A-Z][A-Za-z\s&.]+?)(?:\s+(?:vendor|fornecedor|contratado|seller|supplier|prestador|provider|contractor)|$)").unwrap(),
    ]
});

static VENDOR_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)(?:fornecedor|vendor|contratado|seller|supplier)[\s:]*([A-Z][A-Za-z\s&.]+?)(?:\s+(?:cliente|client|contratante|buyer|empresa|company|corporation)|$)").unwrap(),
        Regex::new(r"(?i)(?:prestador|provider|contractor)[\s:]*([A-Z][A-Za-z\s&.]+?)(?:\s+(?:cliente|client|contratante|buyer|empresa|company|corporation)|$)").unwrap(),
    ]
});

static BOLD_CLIENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Client:\*\*\s*([A-Z][A-Za-z\s&.]+)").unwrap());

static BOLD_VENDOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Vendor:\*\*\s*([A-Z][A-Za-z\s&.]+)").unwrap());

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

static CNPJ_CPF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}|\d{3}\.\d{3}\.\d{3}-\d{2})").unwrap()
});

static TABLE_ROW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\|.*\|$").unwrap());

/// Clause keywords scanned for in contract bodies.
pub const SECTION_HEADERS: [&str; 23] = [
    "vigência",
    "duração",
    "termo",
    "prazo",
    "expiração",
    "rescisão",
    "terminação",
    "cancelamento",
    "confidencialidade",
    "sigilo",
    "não divulgação",
    "pagamentos",
    "pagamento",
    "valor",
    "preço",
    "compensação",
    "obrigações",
    "responsabilidades",
    "deveres",
    "foro",
    "jurisdição",
    "lei aplicável",
    "disputas",
];

const TYPE_KEYWORDS: [(ContractType, [&str; 3]); 6] = [
    (ContractType::Msa, ["master service agreement", "msa", "acordo quadro"]),
    (ContractType::Lsa, ["local service agreement", "lsa", "acordo local"]),
    (ContractType::Sow, ["statement of work", "sow", "escopo de trabalho"]),
    (ContractType::Pwo, ["project work order", "pwo", "ordem de serviço"]),
    (ContractType::Cr, ["change request", "cr", "solicitação de mudança"]),
    (ContractType::Cnf, ["change notification form", "cnf", "formulário de notificação"]),
];

// ── Extracted shapes ───────────────────────────────────────────────────────

/// One date found in source text, with its match span for ordering.
#[derive(Debug, Clone)]
pub struct DatedMatch {
    pub date: NaiveDate,
    pub text: String,
    pub position: usize,
}

/// Best-effort field mapping produced by the pattern layer.
#[derive(Debug, Clone, Default)]
pub struct PatternMetadata {
    pub title: Option<String>,
    pub contract_number: Option<String>,
    pub currency: Option<String>,
    pub total_value: Option<f64>,
    /// All dates found, ordered by position in the source text.
    pub dates: Vec<DatedMatch>,
    pub client_name: Option<String>,
    pub vendor_name: Option<String>,
    pub contract_type: Option<ContractType>,
    /// Explicit dates supplied by an upstream analyzer; these win over the
    /// positional candidates in `dates`.
    pub effective_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
}

impl PatternMetadata {
    /// Folds an LLM analyzer's result into this mapping. Non-placeholder
    /// LLM fields win for identity fields; dates only fill gaps.
    pub fn merge_llm(&mut self, llm: &ContractMetadata) {
        if !is_placeholder(&llm.contract_name, "Unknown Contract") {
            self.title = Some(llm.contract_name.clone());
        }
        if !is_placeholder(&llm.contract_id, "UNKNOWN") {
            self.contract_number = Some(llm.contract_id.clone());
        }
        if !is_placeholder(&llm.supplier, "Unknown") {
            self.vendor_name = Some(llm.supplier.clone());
        }
        if self.client_name.is_none()
            && let Some(client) = llm.parties.iter().find(|p| **p != llm.supplier)
        {
            self.client_name = Some(client.clone());
        }
        if let Some(ty) = ContractType::from_code(&llm.contract_type) {
            self.contract_type = Some(ty);
        }
        if self.effective_date.is_none() {
            self.effective_date = parse_date_flex(&llm.start_date);
        }
        if self.expiration_date.is_none() {
            // The "2999" open-ended sentinel fails date parsing and so
            // leaves the expiration unset, which is the intent.
            self.expiration_date = parse_date_flex(&llm.end_date);
        }
    }
}

fn is_placeholder(value: &str, sentinel: &str) -> bool {
    value.is_empty() || value == sentinel
}

/// Table shape statistics; `has_headers` is filled for markdown tables and
/// `has_content` for block-structured ones.
#[derive(Debug, Clone)]
pub struct TableStats {
    pub count: usize,
    pub has_headers: Option<bool>,
    pub has_content: Option<bool>,
}

/// Entities found by plain text scanning: addresses, tax ids, tables, and
/// known clause keywords.
#[derive(Debug, Clone, Default)]
pub struct EntityScan {
    pub emails: Vec<String>,
    pub cnpj_cpf: Vec<String>,
    pub tables: Option<TableStats>,
    pub key_clauses: Vec<String>,
}

impl EntityScan {
    /// JSON object form, with empty collections omitted and clause keywords
    /// rendered as a presence map.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if !self.emails.is_empty() {
            map.insert(
                "emails".into(),
                Value::Array(self.emails.iter().cloned().map(Value::String).collect()),
            );
        }
        if !self.cnpj_cpf.is_empty() {
            map.insert(
                "cnpj_cpf".into(),
                Value::Array(self.cnpj_cpf.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(tables) = &self.tables {
            let mut t = Map::new();
            t.insert("count".into(), Value::from(tables.count));
            if let Some(headers) = tables.has_headers {
                t.insert("has_headers".into(), Value::Bool(headers));
            }
            if let Some(content) = tables.has_content {
                t.insert("has_content".into(), Value::Bool(content));
            }
            map.insert("tables".into(), Value::Object(t));
        }
        if !self.key_clauses.is_empty() {
            let clauses: Map<String, Value> = self
                .key_clauses
                .iter()
                .map(|h| (h.clone(), Value::Bool(true)))
                .collect();
            map.insert("key_clauses".into(), Value::Object(clauses));
        }
        Value::Object(map)
    }
}

// ── Field extractors ───────────────────────────────────────────────────────

pub fn extract_title(content: &str) -> Option<String> {
    TITLE_RE.captures(content).and_then(|caps| {
        let title = caps[1].trim();
        (!title.is_empty()).then(|| title.to_string())
    })
}

pub fn extract_contract_number(content: &str) -> Option<String> {
    contract_number_plain(content).or_else(|| {
        BOLD_CONTRACT_NUMBER_RE
            .captures(content)
            .map(|caps| caps[1].trim().to_string())
    })
}

/// Plain-label variant without the bold fallback, for block-structured
/// text that carries no markdown markup.
pub(crate) fn contract_number_plain(content: &str) -> Option<String> {
    CONTRACT_NUMBER_RE
        .captures(content)
        .map(|caps| caps[1].trim().to_string())
}

pub fn extract_currency(content: &str) -> Option<String> {
    CURRENCY_RE.captures(content).map(|caps| caps[1].to_string())
}

fn labeled_amount(content: &str) -> Option<f64> {
    AMOUNT_RE
        .captures(content)
        .and_then(|caps| parse_amount(&caps[1]))
}

fn bold_amount(content: &str) -> Option<f64> {
    BOLD_AMOUNT_RE
        .captures(content)
        .and_then(|caps| parse_amount(&caps[1]))
}

/// Finds every date in the content across the three supported formats,
/// ordered by position in the text. Calendar-invalid matches are dropped.
pub fn extract_dates(content: &str) -> Vec<DatedMatch> {
    let mut dates = Vec::new();

    for caps in DATE_SLASH_RE.captures_iter(content) {
        if let (Ok(day), Ok(month), Ok(year)) = (
            caps[1].parse::<u32>(),
            caps[2].parse::<u32>(),
            caps[3].parse::<i32>(),
        ) && let Some(date) = NaiveDate::from_ymd_opt(year, month, day)
            && let Some(m) = caps.get(0)
        {
            dates.push(DatedMatch {
                date,
                text: m.as_str().to_string(),
                position: m.start(),
            });
        }
    }

    for caps in DATE_ISO_RE.captures_iter(content) {
        if let (Ok(year), Ok(month), Ok(day)) = (
            caps[1].parse::<i32>(),
            caps[2].parse::<u32>(),
            caps[3].parse::<u32>(),
        ) && let Some(date) = NaiveDate::from_ymd_opt(year, month, day)
            && let Some(m) = caps.get(0)
        {
            dates.push(DatedMatch {
                date,
                text: m.as_str().to_string(),
                position: m.start(),
            });
        }
    }

    for caps in DATE_MONTH_RE.captures_iter(content) {
        if let (Ok(day), Some(month), Ok(year)) = (
            caps[1].parse::<u32>(),
            month_from_name(&caps[2]),
            caps[3].parse::<i32>(),
        ) && let Some(date) = NaiveDate::from_ymd_opt(year, month, day)
            && let Some(m) = caps.get(0)
        {
            dates.push(DatedMatch {
                date,
                text: m.as_str().to_string(),
                position: m.start(),
            });
        }
    }

    dates.sort_by_key(|d| d.position);
    dates
}

fn bold_dates(content: &str) -> Vec<DatedMatch> {
    let mut dates = Vec::new();
    if let Some(m) = BOLD_EFFECTIVE_RE.find(content) {
        dates.extend(extract_dates(m.as_str()));
    }
    if !dates.is_empty()
        && let Some(m) = BOLD_EXPIRATION_RE.find(content)
    {
        dates.extend(extract_dates(m.as_str()));
    }
    dates
}

/// Extracts `(client_name, vendor_name)` from role-keyword patterns.
pub fn extract_parties(content: &str) -> (Option<String>, Option<String>) {
    let client = CLIENT_RES
        .iter()
        .find_map(|re| re.captures(content))
        .map(|caps| caps[1].trim().to_string());
    let vendor = VENDOR_RES
        .iter()
        .find_map(|re| re.captures(content))
        .map(|caps| caps[1].trim().to_string());
    (client, vendor)
}

fn bold_client(content: &str) -> Option<String> {
    BOLD_CLIENT_RE
        .captures(content)
        .map(|caps| caps[1].trim().to_string())
}

fn bold_vendor(content: &str) -> Option<String> {
    BOLD_VENDOR_RE
        .captures(content)
        .map(|caps| caps[1].trim().to_string())
}

/// Keyword-set contract type detection; families are tried in a fixed
/// order and the first hit wins.
pub fn detect_contract_type(content: &str) -> Option<ContractType> {
    let lower = content.to_lowercase();
    for (contract_type, keywords) in TYPE_KEYWORDS {
        if keywords.iter().any(|k| lower.contains(k)) {
            return Some(contract_type);
        }
    }
    None
}

/// Runs every field extractor over markdown content, honouring the bold
/// `**Label:** value` fallbacks when the plain patterns miss.
pub fn extract_metadata(content: &str) -> PatternMetadata {
    let mut meta = PatternMetadata {
        title: extract_title(content),
        contract_number: extract_contract_number(content),
        currency: extract_currency(content),
        ..PatternMetadata::default()
    };

    if meta.currency.is_some() {
        meta.total_value = labeled_amount(content);
    }
    if meta.total_value.is_none_or(|v| v == 0.0) {
        meta.total_value = bold_amount(content);
    }

    meta.dates = extract_dates(content);
    if meta.dates.is_empty() {
        meta.dates = bold_dates(content);
    }

    let (client, vendor) = extract_parties(content);
    meta.client_name = client.or_else(|| bold_client(content));
    meta.vendor_name = vendor.or_else(|| bold_vendor(content));

    meta.contract_type = detect_contract_type(content);
    meta
}

/// Scans plain text for emails, tax ids, markdown tables, and clause
/// keywords. Collections are deduplicated and sorted.
pub fn scan_text(content: &str) -> EntityScan {
    let mut scan = scan_shared(content);

    let rows: Vec<&str> = TABLE_ROW_RE.find_iter(content).map(|m| m.as_str()).collect();
    if !rows.is_empty() {
        scan.tables = Some(TableStats {
            count: rows.len(),
            has_headers: Some(rows.iter().any(|r| r.contains("---"))),
            has_content: None,
        });
    }
    scan
}

/// The table-independent part of entity scanning, shared with the
/// block-structured path.
pub fn scan_shared(content: &str) -> EntityScan {
    let emails: Vec<String> = EMAIL_RE
        .find_iter(content)
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let cnpj_cpf: Vec<String> = CNPJ_CPF_RE
        .find_iter(content)
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let lower = content.to_lowercase();
    let key_clauses: Vec<String> = SECTION_HEADERS
        .iter()
        .filter(|h| lower.contains(&h.to_lowercase()))
        .map(|h| h.to_string())
        .collect();

    EntityScan {
        emails,
        cnpj_cpf,
        tables: None,
        key_clauses,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Master Service Agreement

**Contract Number:** MSA-2024-001
**Client:** TechCorp Inc.
**Vendor:** DevSolutions Ltd.
**Effective Date:** 01/01/2024
**Expiration Date:** 31/12/2025
**Total Value:** R$ 150.000,00

Contato: legal@techcorp.com
CNPJ: 12.345.678/0001-90
";

    #[test]
    fn bold_contract_number_is_found() {
        assert_eq!(
            extract_contract_number(SAMPLE).as_deref(),
            Some("MSA-2024-001")
        );
    }

    #[test]
    fn plain_contract_number_is_found() {
        let meta = extract_metadata("Contract Number: SOW-2024-017 between the parties");
        assert_eq!(meta.contract_number.as_deref(), Some("SOW-2024-017"));
    }

    #[test]
    fn bold_parties_are_found() {
        let meta = extract_metadata(SAMPLE);
        assert_eq!(meta.client_name.as_deref(), Some("TechCorp Inc."));
        assert_eq!(meta.vendor_name.as_deref(), Some("DevSolutions Ltd."));
    }

    #[test]
    fn plain_parties_are_found() {
        let (client, vendor) =
            extract_parties("Cliente: Acme Corp Fornecedor: Builder Ltda e outros");
        assert_eq!(client.as_deref(), Some("Acme Corp"));
        assert!(vendor.is_some());
    }

    #[test]
    fn amount_with_brazilian_locale_parses() {
        let meta = extract_metadata(SAMPLE);
        assert_eq!(meta.currency.as_deref(), Some("R$"));
        assert_eq!(meta.total_value, Some(150_000.0));
    }

    #[test]
    fn amount_requires_currency_or_bold_label() {
        let meta = extract_metadata("Total: 150.000,00 with no currency symbol anywhere");
        assert_eq!(meta.total_value, None);
    }

    #[test]
    fn dates_sort_by_position() {
        let dates = extract_dates("ends 31/12/2025, signed 2024-01-15, starts 01/02/2024");
        let texts: Vec<&str> = dates.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["31/12/2025", "2024-01-15", "01/02/2024"]);
    }

    #[test]
    fn invalid_dates_are_skipped() {
        let dates = extract_dates("impossible 31/02/2024 but fine 15/03/2024");
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].text, "15/03/2024");
    }

    #[test]
    fn month_name_dates_are_found() {
        let dates = extract_dates("assinado em 15 de janeiro de 2024 em São Paulo");
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn contract_type_first_family_wins() {
        assert_eq!(
            detect_contract_type("This Statement of Work covers..."),
            Some(ContractType::Sow)
        );
        assert_eq!(detect_contract_type(SAMPLE), Some(ContractType::Msa));
        assert_eq!(detect_contract_type("plain text"), None);
    }

    #[test]
    fn scan_finds_emails_and_tax_ids() {
        let scan = scan_text(SAMPLE);
        assert_eq!(scan.emails, vec!["legal@techcorp.com"]);
        assert_eq!(scan.cnpj_cpf, vec!["12.345.678/0001-90"]);
    }

    #[test]
    fn scan_deduplicates_and_sorts() {
        let scan = scan_text("b@x.com a@x.com b@x.com");
        assert_eq!(scan.emails, vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn markdown_tables_are_counted() {
        let content = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        let scan = scan_text(content);
        let tables = scan.tables.unwrap();
        assert_eq!(tables.count, 3);
        assert_eq!(tables.has_headers, Some(true));
    }

    #[test]
    fn clause_keywords_are_collected() {
        let scan = scan_text("Cláusula de vigência e condições de pagamento.");
        assert_eq!(scan.key_clauses, vec!["vigência", "pagamento"]);
    }

    #[test]
    fn scan_value_renders_clause_presence_map() {
        let scan = scan_text("prazo de pagamento");
        let value = scan.to_value();
        assert_eq!(value["key_clauses"]["prazo"], Value::Bool(true));
        assert!(value.get("emails").is_none());
    }

    #[test]
    fn llm_merge_overrides_identity_and_fills_dates() {
        let mut meta = extract_metadata("Contract Number: OLD-1");
        let llm = ContractMetadata::from_payload(&serde_json::json!({
            "contract_id": "MSA-2024-002",
            "contract_name": "Platform Services",
            "contract_type": "SOW",
            "supplier": "DevSolutions",
            "parties": ["TechCorp", "DevSolutions"],
            "start_date": "2024-02-01",
            "end_date": "2999"
        }));
        meta.merge_llm(&llm);
        assert_eq!(meta.contract_number.as_deref(), Some("MSA-2024-002"));
        assert_eq!(meta.title.as_deref(), Some("Platform Services"));
        assert_eq!(meta.vendor_name.as_deref(), Some("DevSolutions"));
        assert_eq!(meta.client_name.as_deref(), Some("TechCorp"));
        assert_eq!(meta.contract_type, Some(ContractType::Sow));
        assert_eq!(
            meta.effective_date,
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert_eq!(meta.expiration_date, None);
    }

    #[test]
    fn llm_placeholders_do_not_override() {
        let mut meta = extract_metadata("Contract Number: KEEP-1");
        let llm = ContractMetadata::from_payload(&serde_json::json!({
            "contract_id": "UNKNOWN",
            "supplier": "Unknown"
        }));
        meta.merge_llm(&llm);
        assert_eq!(meta.contract_number.as_deref(), Some("KEEP-1"));
        assert_eq!(meta.vendor_name, None);
    }
}
