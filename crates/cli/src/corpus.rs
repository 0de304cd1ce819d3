//! JSON Lines corpus reader.
//!
//! One document per line: `{"id": "...", "text": "...", "metadata": {...}}`.
//! Blank lines are skipped; `metadata` is optional.

use cascade_core::{CascadeError, CascadeResult, Document};
use std::io::BufRead;
use std::path::Path;

/// Read every document from a JSONL file, in file order.
pub fn read_corpus(path: &Path) -> CascadeResult<Vec<Document>> {
    let file = std::fs::File::open(path).map_err(|e| {
        CascadeError::invalid_input(format!("cannot open corpus '{}': {}", path.display(), e))
    })?;
    parse_corpus(std::io::BufReader::new(file))
}

/// Parse JSONL documents from any reader.
pub fn parse_corpus<R: BufRead>(reader: R) -> CascadeResult<Vec<Document>> {
    let mut documents = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            CascadeError::invalid_input(format!("line {}: read error: {}", number + 1, e))
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let document: Document = serde_json::from_str(line)
            .map_err(|e| CascadeError::invalid_input(format!("line {}: {}", number + 1, e)))?;
        documents.push(document);
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corpus_skips_blank_lines() {
        let input = concat!(
            r#"{"id": "ork", "text": "Орки любят оружие", "metadata": {"title": "Орки"}}"#,
            "\n\n",
            r#"{"id": "sm", "text": "Космодесант"}"#,
            "\n",
        );
        let docs = parse_corpus(input.as_bytes()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "ork");
        assert_eq!(docs[0].title(), Some("Орки"));
        assert!(docs[1].metadata.is_empty());
    }

    #[test]
    fn test_parse_corpus_reports_line_number() {
        let input = "{\"id\": \"a\", \"text\": \"x\"}\nnot json\n";
        let err = parse_corpus(input.as_bytes()).unwrap_err();
        assert!(matches!(err, CascadeError::InvalidInput(_)));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_read_corpus_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_corpus(&tmp.path().join("absent.jsonl")).unwrap_err();
        assert!(matches!(err, CascadeError::InvalidInput(_)));
    }

    #[test]
    fn test_read_corpus_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("corpus.jsonl");
        std::fs::write(&path, "{\"id\": \"1\", \"text\": \"eldar\"}\n").unwrap();
        assert_eq!(read_corpus(&path).unwrap().len(), 1);
    }
}
