// Native model format: header, symbol tables, fixed-size state and arc records.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use g2pfst_core::{Label, Semiring, SymbolTable, Weight};

use crate::fst::{Arc, Fst, State};
use crate::FormatError;

/// Model header magic constants (little-endian).
const COOKIE1: u32 = 0x4732_5046;
const COOKIE2: u32 = 0x0005_7F57;

/// Current model format version.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the model header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Sentinel stored in place of the start id when the graph has no start.
const NO_START: u64 = u64::MAX;

/// Parsed model header.
///
/// - bytes 0..4: cookie1
/// - bytes 4..8: cookie2
/// - byte 8: format version
/// - byte 9: semiring tag
/// - bytes 10..16: reserved (zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelHeader {
    pub version: u8,
    pub semiring: Semiring,
}

/// Fixed-size state record (16 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct StateRecord {
    pub final_weight: f64,
    pub arc_count: u32,
    pub _reserved: u32,
}

/// Fixed-size arc record (24 bytes). Arcs are stored state by state.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ArcRecord {
    pub ilabel: u32,
    pub olabel: u32,
    pub nextstate: u32,
    pub _reserved: u32,
    pub weight: f64,
}

/// Parse and validate the 16-byte model header.
///
/// Byte swapping is not supported; models are always written little-endian.
pub fn parse_header(data: &[u8]) -> Result<ModelHeader, FormatError> {
    if data.len() < HEADER_SIZE {
        return Err(FormatError::TooShort {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }

    let cookie1 = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let cookie2 = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if cookie1 != COOKIE1 || cookie2 != COOKIE2 {
        return Err(FormatError::InvalidMagic);
    }

    let version = data[8];
    if version != FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }
    let semiring = Semiring::from_tag(data[9])?;

    Ok(ModelHeader { version, semiring })
}

/// Bounds-checked little-endian reader over a byte slice.
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        let end = self.pos.checked_add(len).ok_or(FormatError::TooShort {
            expected: usize::MAX,
            actual: self.data.len(),
        })?;
        if end > self.data.len() {
            return Err(FormatError::TooShort {
                expected: end,
                actual: self.data.len(),
            });
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u32(&mut self) -> Result<u32, FormatError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u64(&mut self) -> Result<u64, FormatError> {
        let b = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_le_bytes(buf))
    }

    pub(crate) fn i32(&mut self) -> Result<i32, FormatError> {
        Ok(self.u32()? as i32)
    }

    pub(crate) fn i64(&mut self) -> Result<i64, FormatError> {
        Ok(self.u64()? as i64)
    }

    pub(crate) fn f32(&mut self) -> Result<f32, FormatError> {
        Ok(f32::from_bits(self.u32()?))
    }

    /// A string prefixed with its byte length as an `i32`.
    pub(crate) fn string(&mut self) -> Result<&'a str, FormatError> {
        let len = self.i32()?;
        let len = usize::try_from(len)
            .map_err(|_| FormatError::Corrupt(format!("negative string length {len}")))?;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map_err(|_| FormatError::Corrupt("invalid UTF-8 in string".to_string()))
    }

    fn cstr(&mut self) -> Result<&'a str, FormatError> {
        let rest = &self.data[self.pos..];
        let len = rest.iter().position(|&b| b == 0).ok_or_else(|| {
            FormatError::InvalidSymbolTable("unterminated symbol string".to_string())
        })?;
        let bytes = self.take(len + 1)?;
        std::str::from_utf8(&bytes[..len])
            .map_err(|_| FormatError::InvalidSymbolTable("invalid UTF-8 in symbol".to_string()))
    }

    /// Copy `count` Pod records into an aligned Vec.
    fn records<T: Pod>(&mut self, count: usize) -> Result<Vec<T>, FormatError> {
        let byte_len = count
            .checked_mul(size_of::<T>())
            .ok_or_else(|| FormatError::Corrupt("record count overflow".to_string()))?;
        let src = self.take(byte_len)?;
        let mut out = vec![T::zeroed(); count];
        bytemuck::cast_slice_mut::<T, u8>(&mut out).copy_from_slice(src);
        Ok(out)
    }
}

fn write_symbols(out: &mut Vec<u8>, symbols: Option<&SymbolTable>) -> Result<(), FormatError> {
    let Some(table) = symbols else {
        out.push(0);
        return Ok(());
    };
    out.push(1);
    out.extend_from_slice(&(table.size() as u32).to_le_bytes());
    for (key, symbol) in table.iter() {
        if symbol.as_bytes().contains(&0) {
            return Err(FormatError::InvalidSymbolTable(format!(
                "symbol {key} contains a NUL byte"
            )));
        }
        out.extend_from_slice(&key.to_le_bytes());
        out.extend_from_slice(symbol.as_bytes());
        out.push(0);
    }
    Ok(())
}

fn read_symbols(cursor: &mut Cursor<'_>) -> Result<Option<SymbolTable>, FormatError> {
    match cursor.u8()? {
        0 => return Ok(None),
        1 => {}
        other => {
            return Err(FormatError::InvalidSymbolTable(format!(
                "invalid presence flag {other}"
            )));
        }
    }
    let count = cursor.u32()?;
    let mut table = SymbolTable::new();
    for _ in 0..count {
        let key: Label = cursor.u32()?;
        let symbol = cursor.cstr()?;
        table
            .put(key, symbol)
            .map_err(|e| FormatError::InvalidSymbolTable(e.to_string()))?;
    }
    Ok(Some(table))
}

impl Fst {
    /// Serialize to the native model format.
    ///
    /// Fails only if a symbol cannot be represented (embedded NUL byte).
    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let mut out = Vec::with_capacity(
            HEADER_SIZE
                + 24
                + self.states.len() * size_of::<StateRecord>()
                + self.num_arcs() * size_of::<ArcRecord>(),
        );
        out.extend_from_slice(&COOKIE1.to_le_bytes());
        out.extend_from_slice(&COOKIE2.to_le_bytes());
        out.push(FORMAT_VERSION);
        out.push(self.semiring.tag());
        out.extend_from_slice(&[0u8; 6]);

        let start = self.start.map_or(NO_START, |s| s as u64);
        out.extend_from_slice(&start.to_le_bytes());
        out.extend_from_slice(&(self.states.len() as u64).to_le_bytes());
        out.extend_from_slice(&(self.num_arcs() as u64).to_le_bytes());

        write_symbols(&mut out, self.isyms.as_ref())?;
        write_symbols(&mut out, self.osyms.as_ref())?;

        let state_records: Vec<StateRecord> = self
            .states
            .iter()
            .map(|s| StateRecord {
                final_weight: s.final_weight.value(),
                arc_count: s.arcs.len() as u32,
                _reserved: 0,
            })
            .collect();
        out.extend_from_slice(bytemuck::cast_slice(&state_records));

        let arc_records: Vec<ArcRecord> = self
            .states
            .iter()
            .flat_map(|s| s.arcs.iter())
            .map(|a| ArcRecord {
                ilabel: a.ilabel,
                olabel: a.olabel,
                nextstate: a.nextstate as u32,
                _reserved: 0,
                weight: a.weight.value(),
            })
            .collect();
        out.extend_from_slice(bytemuck::cast_slice(&arc_records));

        Ok(out)
    }

    /// Deserialize from the native model format.
    ///
    /// All counts and state references are validated before the graph is
    /// built; a malformed blob yields an error and never a partial graph.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FormatError> {
        let header = parse_header(data)?;
        let mut cursor = Cursor::new(data, HEADER_SIZE);

        let start = cursor.u64()?;
        let num_states = usize::try_from(cursor.u64()?)
            .map_err(|_| FormatError::Corrupt("state count overflow".to_string()))?;
        let num_arcs = usize::try_from(cursor.u64()?)
            .map_err(|_| FormatError::Corrupt("arc count overflow".to_string()))?;

        let isyms = read_symbols(&mut cursor)?;
        let osyms = read_symbols(&mut cursor)?;

        let state_records: Vec<StateRecord> = cursor.records(num_states)?;
        let arc_records: Vec<ArcRecord> = cursor.records(num_arcs)?;

        let declared: usize = state_records.iter().map(|r| r.arc_count as usize).sum();
        if declared != num_arcs {
            return Err(FormatError::Corrupt(format!(
                "states declare {declared} arcs, header declares {num_arcs}"
            )));
        }
        let start = match start {
            NO_START => None,
            s if (s as usize) < num_states => Some(s as usize),
            s => {
                return Err(FormatError::Corrupt(format!(
                    "start state {s} out of range"
                )));
            }
        };

        let mut states = Vec::with_capacity(num_states);
        let mut arc_iter = arc_records.iter();
        for record in &state_records {
            let mut arcs = Vec::with_capacity(record.arc_count as usize);
            for a in arc_iter.by_ref().take(record.arc_count as usize) {
                if a.nextstate as usize >= num_states {
                    return Err(FormatError::Corrupt(format!(
                        "arc targets state {} of {num_states}",
                        a.nextstate
                    )));
                }
                arcs.push(Arc {
                    ilabel: a.ilabel,
                    olabel: a.olabel,
                    weight: Weight::new(a.weight),
                    nextstate: a.nextstate as usize,
                });
            }
            states.push(State {
                final_weight: Weight::new(record.final_weight),
                arcs,
            });
        }

        Ok(Fst {
            semiring: header.semiring,
            states,
            start,
            isyms,
            osyms,
        })
    }

    /// Write the model to `path`.
    pub fn save_model(&self, path: impl AsRef<Path>) -> Result<(), FormatError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes)?;
        tracing::info!(
            path = %path.display(),
            states = self.num_states(),
            arcs = self.num_arcs(),
            bytes = bytes.len(),
            "saved model"
        );
        Ok(())
    }

    /// Read a model written by [`save_model`](Self::save_model).
    pub fn load_model(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let fst = Self::from_bytes(&data)?;
        tracing::info!(
            path = %path.display(),
            semiring = %fst.semiring(),
            states = fst.num_states(),
            arcs = fst.num_arcs(),
            "loaded model"
        );
        Ok(fst)
    }
}
