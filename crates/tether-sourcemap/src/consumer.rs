//! Parsed v3 source-map consumer with bidirectional position queries.
//!
//! Positions on the query surface use 1-based lines and 0-based columns
//! (the convention of source-map tooling); the decoded mapping table is
//! kept 0-based internally and converted at the boundary.

use serde::Deserialize;

use crate::error::SourceMapError;
use crate::vlq;

/// The raw JSON shape of a v3 source map. Fields beyond the ones we
/// honor are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
    #[serde(default)]
    version: Option<u64>,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    mappings: String,
    #[serde(default)]
    sources_content: Vec<Option<String>>,
    #[serde(default)]
    source_root: Option<String>,
}

/// One decoded mapping entry. All positions 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mapping {
    gen_line: u32,
    gen_col: u32,
    src: Option<u32>,
    src_line: u32,
    src_col: u32,
    name: Option<u32>,
}

/// An original position resolved from a generated one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPosition {
    /// Declared source path.
    pub source: String,
    /// 1-based line.
    pub line: u32,
    /// 0-based column.
    pub column: u32,
    /// Mapped identifier name, when the segment carries one.
    pub name: Option<String>,
}

/// A generated position resolved from an original one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedPosition {
    /// 1-based line.
    pub line: u32,
    /// 0-based column.
    pub column: u32,
}

/// A fully decoded source map.
#[derive(Debug)]
pub struct SourceMapConsumer {
    sources: Vec<String>,
    names: Vec<String>,
    contents: Vec<Option<String>>,
    mappings: Vec<Mapping>,
}

impl SourceMapConsumer {
    /// Parse a v3 source map from its JSON text.
    pub fn parse(json: &str) -> Result<Self, SourceMapError> {
        let raw: RawSourceMap = serde_json::from_str(json)
            .map_err(|e| SourceMapError::Parse(format!("invalid JSON: {}", e)))?;

        if let Some(version) = raw.version {
            if version != 3 {
                return Err(SourceMapError::UnsupportedVersion(version));
            }
        }

        let sources = match raw.source_root.as_deref() {
            Some(root) if !root.is_empty() => raw
                .sources
                .iter()
                .map(|s| join_source_root(root, s))
                .collect(),
            _ => raw.sources,
        };

        let mappings = decode_mappings(&raw.mappings, sources.len(), raw.names.len())?;

        Ok(Self {
            sources,
            names: raw.names,
            contents: raw.sources_content,
            mappings,
        })
    }

    /// The declared original source paths, in map order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Embedded content for a declared source, if the map carries it.
    pub fn source_content(&self, source: &str) -> Option<&str> {
        let idx = self.sources.iter().position(|s| s == source)?;
        self.contents.get(idx)?.as_deref()
    }

    /// Project a generated position onto the original source.
    ///
    /// Takes a 1-based line and 0-based column; resolves to the greatest
    /// mapping at or before the position on the same generated line.
    pub fn original_position(&self, line: u32, column: u32) -> Option<OriginalPosition> {
        if line == 0 {
            return None;
        }
        let target_line = line - 1;
        let idx = self
            .mappings
            .partition_point(|m| (m.gen_line, m.gen_col) <= (target_line, column));
        if idx == 0 {
            return None;
        }
        let mapping = &self.mappings[idx - 1];
        if mapping.gen_line != target_line {
            return None;
        }
        let src = mapping.src? as usize;
        Some(OriginalPosition {
            source: self.sources.get(src)?.clone(),
            line: mapping.src_line + 1,
            column: mapping.src_col,
            name: mapping
                .name
                .and_then(|n| self.names.get(n as usize).cloned()),
        })
    }

    /// Project an original position back onto generated code.
    ///
    /// Takes a 1-based line and 0-based column in the named source;
    /// prefers the greatest mapping at or before the column on that
    /// original line, falling back to the first mapping on the line.
    pub fn generated_position(
        &self,
        source: &str,
        line: u32,
        column: u32,
    ) -> Option<GeneratedPosition> {
        let src_idx = self.sources.iter().position(|s| s == source)? as u32;
        if line == 0 {
            return None;
        }
        let target_line = line - 1;

        let mut best_at_or_before: Option<&Mapping> = None;
        let mut first_on_line: Option<&Mapping> = None;
        for m in &self.mappings {
            if m.src != Some(src_idx) || m.src_line != target_line {
                continue;
            }
            if m.src_col <= column
                && best_at_or_before.map_or(true, |b| m.src_col >= b.src_col)
            {
                best_at_or_before = Some(m);
            }
            if first_on_line.map_or(true, |b| m.src_col < b.src_col) {
                first_on_line = Some(m);
            }
        }

        let mapping = best_at_or_before.or(first_on_line)?;
        Some(GeneratedPosition {
            line: mapping.gen_line + 1,
            column: mapping.gen_col,
        })
    }

    /// Number of decoded mapping entries.
    pub fn mapping_count(&self) -> usize {
        self.mappings.len()
    }
}

fn join_source_root(root: &str, source: &str) -> String {
    // Absolute sources (scheme or rooted path) are kept untouched.
    if source.starts_with('/') || source.contains("://") {
        return source.to_string();
    }
    format!("{}/{}", root.trim_end_matches('/'), source)
}

fn decode_mappings(
    mappings: &str,
    sources_len: usize,
    names_len: usize,
) -> Result<Vec<Mapping>, SourceMapError> {
    let mut result = Vec::new();
    let mut gen_line: u32 = 0;
    let mut src: i64 = 0;
    let mut src_line: i64 = 0;
    let mut src_col: i64 = 0;
    let mut name: i64 = 0;

    for line in mappings.split(';') {
        // Generated column deltas restart on every generated line.
        let mut gen_col: i64 = 0;
        for segment in line.split(',') {
            if segment.is_empty() {
                continue;
            }
            let fields = vlq::decode_segment(segment)?;
            match fields.len() {
                1 | 4 | 5 => {}
                n => {
                    return Err(SourceMapError::Parse(format!(
                        "segment has {} fields, expected 1, 4 or 5",
                        n
                    )))
                }
            }

            gen_col += fields[0];
            if gen_col < 0 {
                return Err(SourceMapError::Parse("negative generated column".into()));
            }

            let mut mapping = Mapping {
                gen_line,
                gen_col: gen_col as u32,
                src: None,
                src_line: 0,
                src_col: 0,
                name: None,
            };

            if fields.len() >= 4 {
                src += fields[1];
                src_line += fields[2];
                src_col += fields[3];
                if src < 0 || src as usize >= sources_len || src_line < 0 || src_col < 0 {
                    return Err(SourceMapError::Parse(
                        "mapping references source out of range".into(),
                    ));
                }
                mapping.src = Some(src as u32);
                mapping.src_line = src_line as u32;
                mapping.src_col = src_col as u32;

                if fields.len() == 5 {
                    name += fields[4];
                    if name < 0 || name as usize >= names_len {
                        return Err(SourceMapError::Parse(
                            "mapping references name out of range".into(),
                        ));
                    }
                    mapping.name = Some(name as u32);
                }
            }

            result.push(mapping);
        }
        gen_line += 1;
    }

    result.sort_by_key(|m| (m.gen_line, m.gen_col));
    Ok(result)
}
