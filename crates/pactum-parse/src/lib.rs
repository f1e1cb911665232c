pub mod assemble;
pub mod error;
pub mod parser;
pub mod patterns;
pub mod sections;

pub use assemble::{assemble, checklist_confidence, PARSER_VERSION};
pub use error::ParseError;
pub use parser::{parse_json_file, parse_json_value, parse_markdown, parse_markdown_file, ParsedDocument};
pub use patterns::{extract_metadata, DatedMatch, EntityScan, PatternMetadata, TableStats};
pub use sections::sections_from_markdown;
