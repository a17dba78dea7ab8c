//! PCD (Point Cloud Data) reader
//!
//! Reads ASCII and binary PCD files. Fields whose name matches a known
//! dimension become that dimension; packed `rgb`/`rgba` fields are unpacked
//! into Red, Green and Blue; other fields are skipped. For fields with a
//! COUNT greater than one, only the first element is kept.

use crate::stage::{PointView, PointViewSet, QuickInfo, Stage, PCD_READER};
use pointstage_core::{DimensionId, Error, PointLayout, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// PCD data format variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcdDataFormat {
    Ascii,
    Binary,
    BinaryCompressed,
}

/// PCD field data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcdFieldType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl PcdFieldType {
    fn from_type_and_size(kind: &str, size: usize) -> Result<Self> {
        match (kind, size) {
            ("I", 1) => Ok(PcdFieldType::I8),
            ("I", 2) => Ok(PcdFieldType::I16),
            ("I", 4) => Ok(PcdFieldType::I32),
            ("U", 1) => Ok(PcdFieldType::U8),
            ("U", 2) => Ok(PcdFieldType::U16),
            ("U", 4) => Ok(PcdFieldType::U32),
            ("F", 4) => Ok(PcdFieldType::F32),
            ("F", 8) => Ok(PcdFieldType::F64),
            _ => Err(Error::InvalidData(format!(
                "Unknown field type/size combination: {}/{}",
                kind, size
            ))),
        }
    }

    /// Size in bytes of one element
    pub fn size(&self) -> usize {
        match self {
            PcdFieldType::I8 | PcdFieldType::U8 => 1,
            PcdFieldType::I16 | PcdFieldType::U16 => 2,
            PcdFieldType::I32 | PcdFieldType::U32 | PcdFieldType::F32 => 4,
            PcdFieldType::F64 => 8,
        }
    }

    /// Decode one little-endian element into its numeric value and its low
    /// 32 bits (used for packed colors)
    fn decode_binary(&self, bytes: &[u8]) -> (f64, u32) {
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(bytes);
        match self {
            PcdFieldType::I8 => {
                let v = bytes[0] as i8;
                (v as f64, v as u32)
            }
            PcdFieldType::U8 => (bytes[0] as f64, bytes[0] as u32),
            PcdFieldType::I16 => {
                let v = i16::from_le_bytes([buf[0], buf[1]]);
                (v as f64, v as u32)
            }
            PcdFieldType::U16 => {
                let v = u16::from_le_bytes([buf[0], buf[1]]);
                (v as f64, v as u32)
            }
            PcdFieldType::I32 => {
                let v = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
                (v as f64, v as u32)
            }
            PcdFieldType::U32 => {
                let v = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
                (v as f64, v)
            }
            PcdFieldType::F32 => {
                let v = f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
                (v as f64, v.to_bits())
            }
            PcdFieldType::F64 => {
                let v = f64::from_le_bytes(buf);
                (v, v as u32)
            }
        }
    }

    /// Parse one ASCII element, see `decode_binary`
    fn parse_ascii(&self, token: &str) -> Result<(f64, u32)> {
        let invalid = || Error::InvalidData(format!("Invalid {:?} value: {}", self, token));
        match self {
            PcdFieldType::F32 => {
                let v = token.parse::<f32>().map_err(|_| invalid())?;
                Ok((v as f64, v.to_bits()))
            }
            PcdFieldType::F64 => {
                let v = token.parse::<f64>().map_err(|_| invalid())?;
                Ok((v, v as u32))
            }
            PcdFieldType::I8 | PcdFieldType::I16 | PcdFieldType::I32 => {
                let v = token.parse::<i64>().map_err(|_| invalid())?;
                Ok((v as f64, v as u32))
            }
            PcdFieldType::U8 | PcdFieldType::U16 | PcdFieldType::U32 => {
                let v = token.parse::<u64>().map_err(|_| invalid())?;
                Ok((v as f64, v as u32))
            }
        }
    }
}

/// Where the first element of a field ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldTarget {
    Dim(DimensionId),
    PackedRgb,
    Skip,
}

impl FieldTarget {
    fn for_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower == "rgb" || lower == "rgba" {
            return FieldTarget::PackedRgb;
        }
        match DimensionId::from_name(name) {
            Some(id) => FieldTarget::Dim(id),
            None => {
                debug!("Skipping unknown PCD field '{}'", name);
                FieldTarget::Skip
            }
        }
    }
}

/// PCD field definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcdField {
    pub name: String,
    pub field_type: PcdFieldType,
    pub count: usize,
}

/// PCD header information
#[derive(Debug, Clone, PartialEq)]
pub struct PcdHeader {
    pub version: String,
    pub fields: Vec<PcdField>,
    pub width: usize,
    pub height: usize,
    pub points: usize,
    pub data_format: PcdDataFormat,
}

impl PcdHeader {
    /// Read a header, leaving `reader` positioned at the first data byte
    pub fn read<R: BufRead>(reader: &mut R) -> Result<Self> {
        let mut version = None;
        let mut names: Vec<String> = Vec::new();
        let mut sizes: Vec<usize> = Vec::new();
        let mut kinds: Vec<String> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        let mut width = None;
        let mut height = None;
        let mut points = None;

        let mut line = String::new();
        let data_format = loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(Error::InvalidData(
                    "Unexpected end of file in PCD header".to_string(),
                ));
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            let (key, values) = match parts.split_first() {
                Some((key, values)) if !key.starts_with('#') => (*key, values),
                _ => continue,
            };

            let parse_usize = |s: &str| {
                s.parse::<usize>()
                    .map_err(|_| Error::InvalidData(format!("Invalid {} value: {}", key, s)))
            };

            match key {
                "VERSION" => version = values.first().map(|v| v.to_string()),
                "FIELDS" => names = values.iter().map(|v| v.to_string()).collect(),
                "SIZE" => sizes = values.iter().map(|v| parse_usize(v)).collect::<Result<_>>()?,
                "TYPE" => kinds = values.iter().map(|v| v.to_string()).collect(),
                "COUNT" => counts = values.iter().map(|v| parse_usize(v)).collect::<Result<_>>()?,
                "WIDTH" => width = values.first().map(|v| parse_usize(v)).transpose()?,
                "HEIGHT" => height = values.first().map(|v| parse_usize(v)).transpose()?,
                "POINTS" => points = values.first().map(|v| parse_usize(v)).transpose()?,
                "DATA" => {
                    break match values.first().copied() {
                        Some("ascii") => PcdDataFormat::Ascii,
                        Some("binary") => PcdDataFormat::Binary,
                        Some("binary_compressed") => PcdDataFormat::BinaryCompressed,
                        other => {
                            return Err(Error::InvalidData(format!(
                                "Unknown PCD DATA format: {}",
                                other.unwrap_or("")
                            )))
                        }
                    }
                }
                _ => {}
            }
        };

        if names.is_empty() {
            return Err(Error::InvalidData("Missing FIELDS in PCD header".to_string()));
        }
        if counts.is_empty() {
            counts = vec![1; names.len()];
        }
        if sizes.len() != names.len() || kinds.len() != names.len() || counts.len() != names.len() {
            return Err(Error::InvalidData(
                "Mismatch between FIELDS, SIZE, TYPE and COUNT declarations".to_string(),
            ));
        }

        if let Some(name) = names.iter().zip(&counts).find(|(_, c)| **c == 0).map(|(n, _)| n) {
            return Err(Error::InvalidData(format!("Field '{}' has COUNT 0", name)));
        }

        let fields = names
            .into_iter()
            .zip(kinds.iter().zip(sizes.iter().zip(&counts)))
            .map(|(name, (kind, (size, count)))| {
                Ok(PcdField {
                    name,
                    field_type: PcdFieldType::from_type_and_size(kind, *size)?,
                    count: *count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let width = width.ok_or_else(|| Error::InvalidData("Missing WIDTH in PCD header".to_string()))?;
        let height = height.unwrap_or(1);
        let total = width.checked_mul(height).ok_or_else(|| {
            Error::InvalidData(format!("WIDTH * HEIGHT overflows ({} * {})", width, height))
        })?;
        let points = points.unwrap_or(total);
        if points != total {
            return Err(Error::InvalidData(format!(
                "POINTS ({}) doesn't match WIDTH * HEIGHT ({})",
                points, total
            )));
        }

        let header = Self {
            version: version.unwrap_or_else(|| "0.7".to_string()),
            fields,
            width,
            height,
            points,
            data_format,
        };
        let dims = header.dims();
        if let Some(missing) = [DimensionId::X, DimensionId::Y, DimensionId::Z]
            .into_iter()
            .find(|id| !dims.contains(id))
        {
            return Err(Error::InvalidData(format!(
                "PCD header has no '{}' field",
                missing.name()
            )));
        }
        header.point_size()?;
        Ok(header)
    }

    /// Size in bytes of one binary point record
    pub fn point_size(&self) -> Result<usize> {
        self.fields.iter().try_fold(0usize, |total, f| {
            f.field_type
                .size()
                .checked_mul(f.count)
                .and_then(|bytes| total.checked_add(bytes))
                .ok_or_else(|| {
                    Error::InvalidData(format!("PCD point record size overflows at field '{}'", f.name))
                })
        })
    }

    /// Dimensions this file provides, in field order
    pub fn dims(&self) -> Vec<DimensionId> {
        let mut layout = PointLayout::new();
        for field in &self.fields {
            match FieldTarget::for_name(&field.name) {
                FieldTarget::Dim(id) => {
                    layout.register_dim(id);
                }
                FieldTarget::PackedRgb => {
                    for id in [DimensionId::Red, DimensionId::Green, DimensionId::Blue] {
                        layout.register_dim(id);
                    }
                }
                FieldTarget::Skip => {}
            }
        }
        layout.dims().to_vec()
    }
}

/// Store one decoded field into `row`
fn store(target: FieldTarget, value: (f64, u32), layout: &PointLayout, row: &mut [f64]) {
    let mut set = |id: DimensionId, v: f64| {
        if let Some(slot) = layout.index_of(id) {
            row[slot] = v;
        }
    };
    match target {
        FieldTarget::Dim(id) => set(id, value.0),
        FieldTarget::PackedRgb => {
            let bits = value.1;
            set(DimensionId::Red, ((bits >> 16) & 0xff) as f64);
            set(DimensionId::Green, ((bits >> 8) & 0xff) as f64);
            set(DimensionId::Blue, (bits & 0xff) as f64);
        }
        FieldTarget::Skip => {}
    }
}

/// Reader stage for PCD files. Reads all points at once.
pub struct PcdReader {
    path: PathBuf,
    header: Option<PcdHeader>,
    reader: Option<BufReader<File>>,
}

impl PcdReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            header: None,
            reader: None,
        }
    }

    /// Header read by `prepare`
    pub fn header(&self) -> Option<&PcdHeader> {
        self.header.as_ref()
    }

    fn open(&self) -> Result<(BufReader<File>, PcdHeader)> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);
        let header = PcdHeader::read(&mut reader)?;
        Ok((reader, header))
    }

    fn read_ascii<R: BufRead>(
        reader: &mut R,
        header: &PcdHeader,
        targets: &[FieldTarget],
        view: &mut PointView,
    ) -> Result<()> {
        let layout = view.layout().clone();
        let mut row = vec![0.0; layout.len()];
        let mut line = String::new();
        let mut read = 0;
        while read < header.points {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(Error::InvalidData(format!(
                    "Expected {} points, found {}",
                    header.points, read
                )));
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }

            row.fill(0.0);
            let mut index = 0;
            for (field, target) in header.fields.iter().zip(targets) {
                let token = tokens.get(index).ok_or_else(|| {
                    Error::InvalidData("Not enough values in ASCII PCD line".to_string())
                })?;
                if *target != FieldTarget::Skip {
                    store(*target, field.field_type.parse_ascii(token)?, &layout, &mut row);
                }
                index += field.count;
            }
            view.append_row(&row)?;
            read += 1;
        }
        Ok(())
    }

    fn read_binary<R: Read>(
        reader: &mut R,
        header: &PcdHeader,
        targets: &[FieldTarget],
        view: &mut PointView,
    ) -> Result<()> {
        let layout = view.layout().clone();
        let mut row = vec![0.0; layout.len()];
        let size = header.point_size()?;
        let mut record = Vec::new();
        record.try_reserve_exact(size)?;
        record.resize(size, 0u8);
        for _ in 0..header.points {
            reader.read_exact(&mut record)?;
            row.fill(0.0);
            let mut offset = 0;
            for (field, target) in header.fields.iter().zip(targets) {
                let size = field.field_type.size();
                if *target != FieldTarget::Skip {
                    let value = field.field_type.decode_binary(&record[offset..offset + size]);
                    store(*target, value, &layout, &mut row);
                }
                offset += size * field.count;
            }
            view.append_row(&row)?;
        }
        Ok(())
    }
}

impl Stage for PcdReader {
    fn name(&self) -> &str {
        PCD_READER
    }

    fn preview(&mut self) -> Result<QuickInfo> {
        let (_, header) = self.open()?;
        Ok(QuickInfo::new(header.points, header.dims()))
    }

    fn prepare(&mut self, layout: &mut PointLayout) -> Result<()> {
        let (reader, header) = self.open()?;
        for id in header.dims() {
            layout.register_dim(id);
        }
        debug!(
            "{}: PCD {} with {} fields, {} points, {:?}",
            self.path.display(),
            header.version,
            header.fields.len(),
            header.points,
            header.data_format
        );
        self.header = Some(header);
        self.reader = Some(reader);
        Ok(())
    }

    fn execute(&mut self, layout: &PointLayout) -> Result<PointViewSet> {
        let header = self
            .header
            .as_ref()
            .ok_or_else(|| Error::Stage(format!("{}: stage was not prepared", PCD_READER)))?;
        let mut reader = self
            .reader
            .take()
            .ok_or_else(|| Error::Stage(format!("{}: stage was already executed", PCD_READER)))?;

        let targets: Vec<FieldTarget> = header
            .fields
            .iter()
            .map(|f| FieldTarget::for_name(&f.name))
            .collect();
        let mut view = PointView::new(0, layout.clone());

        match header.data_format {
            PcdDataFormat::Ascii => Self::read_ascii(&mut reader, header, &targets, &mut view)?,
            PcdDataFormat::Binary => Self::read_binary(&mut reader, header, &targets, &mut view)?,
            PcdDataFormat::BinaryCompressed => {
                return Err(Error::Unsupported(
                    "Binary compressed PCD format not yet supported".to_string(),
                ))
            }
        }
        Ok(vec![view])
    }
}
