// OpenFst binary VectorFst reader.

use std::path::Path;

use g2pfst_core::{Label, PRECISION_DIGITS, Semiring, StateId, SymbolTable, Weight};

use super::FstSource;
use crate::fst::Arc;
use crate::format::Cursor;
use crate::FormatError;

const FST_MAGIC: i32 = 2_125_659_606;
const SYMBOL_TABLE_MAGIC: i32 = 2_125_658_996;
const HAS_ISYMBOLS: i32 = 0x1;
const HAS_OSYMBOLS: i32 = 0x2;
const VECTOR_VERSION: i32 = 2;

/// An OpenFst `vector` FST with `standard`, `tropical` or `log` arcs,
/// decoded from its binary serialization.
#[derive(Debug, Clone)]
pub struct OpenFstModel {
    semiring: Semiring,
    start: Option<StateId>,
    finals: Vec<Weight>,
    arcs: Vec<Vec<Arc>>,
    isyms: Option<SymbolTable>,
    osyms: Option<SymbolTable>,
}

impl OpenFstModel {
    /// Decode a binary VectorFst.
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        let mut cursor = Cursor::new(data, 0);

        if cursor.i32()? != FST_MAGIC {
            return Err(FormatError::InvalidMagic);
        }
        let fst_type = cursor.string()?;
        if fst_type != "vector" {
            return Err(FormatError::UnsupportedFstType(fst_type.to_string()));
        }
        let arc_type = cursor.string()?;
        let semiring = match arc_type {
            "standard" | "tropical" => Semiring::Tropical,
            "log" => Semiring::Log,
            other => return Err(FormatError::UnsupportedArcType(other.to_string())),
        };
        let version = cursor.i32()?;
        if version != VECTOR_VERSION {
            return Err(FormatError::UnsupportedFstType(format!(
                "vector version {version}"
            )));
        }
        let flags = cursor.i32()?;
        let _properties = cursor.u64()?;
        let start = cursor.i64()?;
        let num_states = cursor.i64()?;
        let num_arcs = cursor.i64()?;

        let isyms = if flags & HAS_ISYMBOLS != 0 {
            Some(read_symbol_table(&mut cursor)?)
        } else {
            None
        };
        let osyms = if flags & HAS_OSYMBOLS != 0 {
            Some(read_symbol_table(&mut cursor)?)
        } else {
            None
        };

        let mut finals = Vec::new();
        let mut arcs = Vec::new();
        // A negative state count means "read until end of stream".
        let mut remaining = usize::try_from(num_states).ok();
        loop {
            match remaining {
                Some(0) => break,
                Some(ref mut n) => *n -= 1,
                None if cursor.is_at_end() => break,
                None => {}
            }
            finals.push(weight(cursor.f32()?));
            let narcs = cursor.i64()?;
            let narcs = usize::try_from(narcs)
                .map_err(|_| FormatError::Corrupt(format!("negative arc count {narcs}")))?;
            let mut state_arcs = Vec::with_capacity(narcs.min(1 << 16));
            for _ in 0..narcs {
                let ilabel = label(cursor.i32()?)?;
                let olabel = label(cursor.i32()?)?;
                let w = weight(cursor.f32()?);
                let nextstate = cursor.i32()?;
                let nextstate = usize::try_from(nextstate)
                    .map_err(|_| FormatError::Corrupt(format!("negative state id {nextstate}")))?;
                state_arcs.push(Arc::new(ilabel, olabel, w, nextstate));
            }
            arcs.push(state_arcs);
        }

        let total_arcs: usize = arcs.iter().map(Vec::len).sum();
        if num_arcs >= 0 && total_arcs as i64 != num_arcs {
            tracing::warn!(
                declared = num_arcs,
                read = total_arcs,
                "OpenFst header arc count disagrees with body"
            );
        }

        let start = match start {
            s if s < 0 => None,
            s if (s as usize) < finals.len() => Some(s as usize),
            s => return Err(FormatError::Corrupt(format!("start state {s} out of range"))),
        };

        tracing::debug!(
            arc_type,
            states = finals.len(),
            arcs = total_arcs,
            "parsed OpenFst vector fst"
        );

        Ok(Self {
            semiring,
            start,
            finals,
            arcs,
            isyms,
            osyms,
        })
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }
}

fn weight(value: f32) -> Weight {
    Weight::from(value).rounded(PRECISION_DIGITS)
}

fn label(value: i32) -> Result<Label, FormatError> {
    Label::try_from(value).map_err(|_| FormatError::Corrupt(format!("negative label {value}")))
}

fn read_symbol_table(cursor: &mut Cursor<'_>) -> Result<SymbolTable, FormatError> {
    if cursor.i32()? != SYMBOL_TABLE_MAGIC {
        return Err(FormatError::InvalidSymbolTable(
            "bad symbol table magic".to_string(),
        ));
    }
    let _name = cursor.string()?;
    let _available_key = cursor.i64()?;
    let size = cursor.i64()?;
    let mut table = SymbolTable::new();
    for _ in 0..size.max(0) {
        let symbol = cursor.string()?;
        let key = cursor.i64()?;
        let key = Label::try_from(key)
            .map_err(|_| FormatError::InvalidSymbolTable(format!("symbol key {key} out of range")))?;
        table
            .put(key, symbol)
            .map_err(|e| FormatError::InvalidSymbolTable(e.to_string()))?;
    }
    Ok(table)
}

impl FstSource for OpenFstModel {
    fn semiring(&self) -> Semiring {
        self.semiring
    }

    fn num_states(&self) -> usize {
        self.finals.len()
    }

    fn start(&self) -> Option<StateId> {
        self.start
    }

    fn final_weight(&self, state: StateId) -> Weight {
        self.finals
            .get(state)
            .copied()
            .unwrap_or_else(|| self.semiring.zero())
    }

    fn num_arcs(&self, state: StateId) -> usize {
        self.arcs.get(state).map_or(0, Vec::len)
    }

    fn arc(&self, state: StateId, index: usize) -> Option<Arc> {
        self.arcs.get(state)?.get(index).copied()
    }

    fn input_symbol_ids(&self) -> Option<Vec<Label>> {
        self.isyms.as_ref().map(SymbolTable::key_set)
    }

    fn input_symbol(&self, id: Label) -> Option<&str> {
        self.isyms.as_ref()?.get_value(id)
    }

    fn output_symbol_ids(&self) -> Option<Vec<Label>> {
        self.osyms.as_ref().map(SymbolTable::key_set)
    }

    fn output_symbol(&self, id: Label) -> Option<&str> {
        self.osyms.as_ref()?.get_value(id)
    }
}
