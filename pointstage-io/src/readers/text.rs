//! Delimited text reader (XYZ/CSV/TXT)
//!
//! This reader supports:
//! - Auto-detection of delimiters (comma, semicolon, tab, whitespace)
//! - Header detection and parsing, with common column name aliases
//! - Default column assignment for header-less files
//! - Streaming, one line per point

use crate::stage::{PointView, PointViewSet, QuickInfo, Stage, StreamableStage, TEXT_READER};
use pointstage_core::{DimensionId, Error, PointLayout, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supported delimiters for text files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Space,
    Tab,
    Semicolon,
}

impl Delimiter {
    /// Get the character representation of the delimiter
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Space => ' ',
            Delimiter::Tab => '\t',
            Delimiter::Semicolon => ';',
        }
    }

    /// Detect delimiter from a line of text. Explicit separators win over
    /// whitespace, so `1, 2, 3` is comma separated.
    pub fn detect_from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        let counts = [
            (line.matches(',').count(), Delimiter::Comma),
            (line.matches(';').count(), Delimiter::Semicolon),
            (line.matches('\t').count(), Delimiter::Tab),
        ];

        let explicit = counts
            .iter()
            .filter(|(count, _)| *count > 0)
            .max_by_key(|(count, _)| *count)
            .map(|(_, delimiter)| *delimiter);

        explicit.or_else(|| line.contains(' ').then_some(Delimiter::Space))
    }

    /// Split a line into trimmed fields
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Space => line.split_whitespace().collect(),
            _ => line.split(self.as_char()).map(|s| s.trim()).collect(),
        }
    }
}

/// Overrides for schema detection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextReaderOptions {
    pub delimiter: Option<Delimiter>,
    pub has_header: Option<bool>,
}

impl TextReaderOptions {
    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }
}

/// Column assignment of a text file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSchema {
    /// Dimension of each column, `None` for skipped columns
    pub columns: Vec<Option<DimensionId>>,
    pub has_header: bool,
    pub delimiter: Delimiter,
}

impl TextSchema {
    /// Detect the schema from the first content line of a file
    pub fn detect(first_line: &str, options: &TextReaderOptions) -> Result<Self> {
        let delimiter = match options.delimiter {
            Some(delimiter) => delimiter,
            None => Delimiter::detect_from_line(first_line)
                .ok_or_else(|| Error::InvalidData("Could not detect delimiter".to_string()))?,
        };

        let has_header = options
            .has_header
            .unwrap_or_else(|| Self::is_header_line(first_line, delimiter));

        let columns = if has_header {
            Self::parse_columns(first_line, delimiter)?
        } else {
            Self::default_columns(delimiter.split(first_line).len())?
        };

        Ok(Self {
            columns,
            has_header,
            delimiter,
        })
    }

    /// Dimensions in column order, skipped columns left out
    pub fn dims(&self) -> Vec<DimensionId> {
        self.columns.iter().flatten().copied().collect()
    }

    /// Parse columns from a header line
    fn parse_columns(line: &str, delimiter: Delimiter) -> Result<Vec<Option<DimensionId>>> {
        let columns: Vec<Option<DimensionId>> = delimiter
            .split(line)
            .into_iter()
            .map(|name| {
                let id = DimensionId::from_name(name);
                if id.is_none() {
                    debug!("Skipping unknown column '{}'", name);
                }
                id
            })
            .collect();

        let has = |id| columns.contains(&Some(id));
        if !has(DimensionId::X) || !has(DimensionId::Y) || !has(DimensionId::Z) {
            return Err(Error::InvalidData(
                "Text file must contain x, y, z columns".to_string(),
            ));
        }

        Ok(columns)
    }

    /// Column assignment for files without a header
    fn default_columns(count: usize) -> Result<Vec<Option<DimensionId>>> {
        use DimensionId::*;

        if count < 3 {
            return Err(Error::InvalidData(
                "Line must have at least 3 columns (x, y, z)".to_string(),
            ));
        }
        let extra: &[DimensionId] = match count {
            4 | 5 => &[Intensity],
            6 => &[Red, Green, Blue],
            n if n >= 7 => &[Intensity, Red, Green, Blue],
            _ => &[],
        };

        let mut columns: Vec<Option<DimensionId>> =
            [X, Y, Z].iter().chain(extra).map(|id| Some(*id)).collect();
        columns.resize(count, None);
        Ok(columns)
    }

    /// A line is a header if any of its fields is not a number
    fn is_header_line(line: &str, delimiter: Delimiter) -> bool {
        delimiter
            .split(line)
            .iter()
            .any(|part| part.parse::<f64>().is_err())
    }
}

fn is_content(line: &str) -> bool {
    let line = line.trim();
    !(line.is_empty() || line.starts_with('#') || line.starts_with("//"))
}

/// Streamable reader stage for delimited text files
pub struct TextReader {
    path: PathBuf,
    options: TextReaderOptions,
    schema: Option<TextSchema>,
    lines: Option<Lines<BufReader<File>>>,
    pending: Option<String>,
    line_number: usize,
}

impl TextReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_options(path, TextReaderOptions::default())
    }

    pub fn with_options<P: AsRef<Path>>(path: P, options: TextReaderOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options,
            schema: None,
            lines: None,
            pending: None,
            line_number: 0,
        }
    }

    /// Schema detected by `prepare`
    pub fn schema(&self) -> Option<&TextSchema> {
        self.schema.as_ref()
    }

    /// Open the file and detect its schema. Returns the line iterator
    /// positioned after the first content line, that line, and the number of
    /// lines consumed.
    fn open(&self) -> Result<(Lines<BufReader<File>>, TextSchema, String, usize)> {
        let file = File::open(&self.path)?;
        let mut lines = BufReader::new(file).lines();
        let mut consumed = 0;
        let first = loop {
            match lines.next() {
                Some(line) => {
                    let line = line?;
                    consumed += 1;
                    if is_content(&line) {
                        break line;
                    }
                }
                None => {
                    return Err(Error::InvalidData(format!(
                        "{} contains no points",
                        self.path.display()
                    )))
                }
            }
        };
        let schema = TextSchema::detect(&first, &self.options)?;
        Ok((lines, schema, first, consumed))
    }

    fn next_content_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            self.line_number += 1;
            return Ok(Some(line));
        }
        let lines = self
            .lines
            .as_mut()
            .ok_or_else(|| Error::Stage(format!("{}: stage was not prepared", TEXT_READER)))?;
        for line in lines {
            let line = line?;
            self.line_number += 1;
            if is_content(&line) {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }
}

impl Stage for TextReader {
    fn name(&self) -> &str {
        TEXT_READER
    }

    fn preview(&mut self) -> Result<QuickInfo> {
        let (lines, schema, _, _) = self.open()?;
        let mut count = if schema.has_header { 0 } else { 1 };
        for line in lines {
            if is_content(&line?) {
                count += 1;
            }
        }
        Ok(QuickInfo::new(count, schema.dims()))
    }

    fn pipeline_streamable(&self) -> bool {
        true
    }

    fn prepare(&mut self, layout: &mut PointLayout) -> Result<()> {
        let (lines, schema, first, consumed) = self.open()?;
        for id in schema.dims() {
            layout.register_dim(id);
        }
        debug!(
            "{}: {} columns, header: {}, delimiter: {:?}",
            self.path.display(),
            schema.columns.len(),
            schema.has_header,
            schema.delimiter
        );

        self.pending = (!schema.has_header).then_some(first);
        self.line_number = if schema.has_header { consumed } else { consumed - 1 };
        self.schema = Some(schema);
        self.lines = Some(lines);
        Ok(())
    }

    fn execute(&mut self, layout: &PointLayout) -> Result<PointViewSet> {
        let mut view = PointView::new(0, layout.clone());
        let mut row = vec![0.0; layout.len()];
        while self.read_next(layout, &mut row)? {
            view.append_row(&row)?;
            row.fill(0.0);
        }
        Ok(vec![view])
    }

    fn as_streamable(&mut self) -> Option<&mut dyn StreamableStage> {
        Some(self)
    }
}

impl StreamableStage for TextReader {
    fn read_next(&mut self, layout: &PointLayout, row: &mut [f64]) -> Result<bool> {
        let line = match self.next_content_line()? {
            Some(line) => line,
            None => return Ok(false),
        };
        let line_number = self.line_number;
        let schema = self
            .schema
            .as_ref()
            .ok_or_else(|| Error::Stage(format!("{}: stage was not prepared", TEXT_READER)))?;

        let parts = schema.delimiter.split(&line);
        if parts.len() < schema.columns.len() {
            return Err(Error::InvalidData(format!(
                "Line {}: expected {} columns, found {}",
                line_number,
                schema.columns.len(),
                parts.len()
            )));
        }

        for (part, column) in parts.iter().zip(&schema.columns) {
            let id = match column {
                Some(id) => *id,
                None => continue,
            };
            let slot = match layout.index_of(id) {
                Some(slot) => slot,
                None => continue,
            };
            row[slot] = part.parse::<f64>().map_err(|_| {
                Error::InvalidData(format!("Line {}: invalid {} value '{}'", line_number, id, part))
            })?;
        }
        Ok(true)
    }
}
