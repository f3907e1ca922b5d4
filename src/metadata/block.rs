//! Embedded metadata block format
//!
//! A block is an HTML comment wrapping a YAML document between `---` fences:
//!
//! ```text
//! <!--
//! ---
//! validations: ...
//! ---
//! -->
//! ```
//!
//! Only the first block in a file is recognized.

use std::ops::Range;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::document::MetadataDocument;
use super::value::MetaValue;
use crate::types::{IqPilotError, Result};

static BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--\s*\r?\n---\s*\r?\n(.*?)\r?\n---\s*\r?\n-->").expect("Invalid regex")
});

/// Location of the first metadata block in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMatch<'a> {
    /// Byte span of the whole block, comment markers included
    pub span: Range<usize>,
    /// YAML body between the fences
    pub body: &'a str,
}

/// Find the first metadata block
pub fn find_block(content: &str) -> Option<BlockMatch<'_>> {
    let caps = BLOCK_RE.captures(content)?;
    let whole = caps.get(0)?;
    let body = caps.get(1)?;
    Some(BlockMatch {
        span: whole.range(),
        body: body.as_str(),
    })
}

/// Parse a block body into a document
///
/// An empty body yields an empty document. Anything that is not a mapping is
/// rejected.
pub fn parse_body(path: &Path, body: &str) -> Result<MetadataDocument> {
    let value: MetaValue = serde_yaml::from_str(body)
        .map_err(|e| IqPilotError::metadata_parse(path, e.to_string()))?;
    match value {
        MetaValue::Null => Ok(MetadataDocument::new()),
        MetaValue::Mapping(map) => Ok(MetadataDocument::from(map)),
        other => Err(IqPilotError::metadata_parse(
            path,
            format!("expected a mapping, found {}", other.type_name()),
        )),
    }
}

/// Parse the first block in `content`, if any
pub fn parse(path: &Path, content: &str) -> Result<Option<MetadataDocument>> {
    find_block(content)
        .map(|block| parse_body(path, block.body))
        .transpose()
}

/// Serialize a document into block text
pub fn render(document: &MetadataDocument) -> Result<String> {
    // An empty document renders as `{}` so the fences stay on separate lines
    let mut yaml = serde_yaml::to_string(document)?;
    if !yaml.ends_with('\n') {
        yaml.push('\n');
    }
    Ok(format!("<!-- \n---\n{}---\n-->", yaml))
}

/// Replace the first block in place, or append one at end of file
///
/// Bytes outside the old block are never touched.
pub fn write_into(content: &str, document: &MetadataDocument) -> Result<String> {
    let block = render(document)?;
    let output = match find_block(content) {
        Some(existing) => {
            let mut out = String::with_capacity(content.len() + block.len());
            out.push_str(&content[..existing.span.start]);
            out.push_str(&block);
            out.push_str(&content[existing.span.end..]);
            out
        }
        None => format!("{}\n\n{}\n", content.trim_end(), block),
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::value::MetaMap;
    use pretty_assertions::assert_eq;

    const ARTICLE: &str = "# Title\n\nBody text.\n\n<!-- \n---\narticle_metadata:\n  filename: a.md\n---\n-->\n\nTrailer\n";

    #[test]
    fn test_find_block() {
        let block = find_block(ARTICLE).unwrap();
        assert_eq!(block.body, "article_metadata:\n  filename: a.md");
        assert!(ARTICLE[block.span.clone()].starts_with("<!--"));
        assert!(ARTICLE[block.span].ends_with("-->"));
    }

    #[test]
    fn test_no_block() {
        assert!(find_block("# Plain\n\n<!-- just a comment -->\n").is_none());
        assert_eq!(parse(Path::new("a.md"), "# Plain\n").unwrap(), None);
    }

    #[test]
    fn test_crlf_block() {
        let content = "# T\r\n\r\n<!--\r\n---\r\narticle_metadata:\r\n  filename: c.md\r\n---\r\n-->\r\n";
        let doc = parse(Path::new("c.md"), content).unwrap().unwrap();
        assert_eq!(doc.filename(), Some("c.md"));
    }

    #[test]
    fn test_first_block_only() {
        let content = format!(
            "{}\n<!-- \n---\narticle_metadata:\n  filename: second.md\n---\n-->\n",
            ARTICLE
        );
        let doc = parse(Path::new("a.md"), &content).unwrap().unwrap();
        assert_eq!(doc.filename(), Some("a.md"));

        let mut updated = doc.clone();
        updated.set("article_metadata", MetaMap::new().with("filename", "b.md"));
        let written = write_into(&content, &updated).unwrap();
        assert!(written.contains("filename: second.md"));
        assert_eq!(written.matches("filename: b.md").count(), 1);
    }

    #[test]
    fn test_non_mapping_is_parse_error() {
        let content = "<!-- \n---\n- just\n- a list\n---\n-->";
        let err = parse(Path::new("bad.md"), content).unwrap_err();
        assert!(matches!(err, IqPilotError::MetadataParse { .. }));

        let content = "<!-- \n---\nkey: [unclosed\n---\n-->";
        assert!(parse(Path::new("bad.md"), content).is_err());
    }

    #[test]
    fn test_empty_body_is_empty_document() {
        let content = "<!-- \n---\n~\n---\n-->";
        let doc = parse(Path::new("e.md"), content).unwrap().unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_empty_document_round_trips() {
        let empty = MetadataDocument::new();
        let block = render(&empty).unwrap();
        assert_eq!(block, "<!-- \n---\n{}\n---\n-->");

        let written = write_into("# E\n", &empty).unwrap();
        assert_eq!(BLOCK_RE.find_iter(&written).count(), 1);
        let rewritten = write_into(&written, &empty).unwrap();
        assert_eq!(rewritten, written);
        assert!(parse(Path::new("e.md"), &rewritten).unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_replace_preserves_surroundings() {
        let doc = MetadataDocument::from(
            MetaMap::new().with("article_metadata", MetaMap::new().with("filename", "z.md")),
        );
        let written = write_into(ARTICLE, &doc).unwrap();
        assert!(written.starts_with("# Title\n\nBody text.\n\n<!-- \n---\n"));
        assert!(written.ends_with("---\n-->\n\nTrailer\n"));
        assert_eq!(
            parse(Path::new("a.md"), &written).unwrap().unwrap().filename(),
            Some("z.md")
        );
    }

    #[test]
    fn test_append_when_missing() {
        let doc = MetadataDocument::initial("n.md", "N", "A");
        let written = write_into("# New\n\nText\n\n\n", &doc).unwrap();
        assert!(written.starts_with("# New\n\nText\n\n<!-- \n---\n"));
        assert!(written.ends_with("---\n-->\n"));
        assert_eq!(BLOCK_RE.find_iter(&written).count(), 1);
        let parsed = parse(Path::new("n.md"), &written).unwrap().unwrap();
        assert_eq!(parsed, doc);
    }
}
