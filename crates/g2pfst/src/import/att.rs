// AT&T text format: `<base>.fst.txt` plus optional `<base>.input.syms` / `<base>.output.syms`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use g2pfst_core::{Label, Semiring, StateId, SymbolTable, Weight};
use hashbrown::HashMap;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag_no_case},
    character::complete::{space0, space1, u32 as label_number},
    combinator::{eof, opt, value},
    number::complete::double,
    sequence::{preceded, terminated, tuple},
};

use super::FstSource;
use crate::FormatError;
use crate::fst::{Arc, Fst};

/// One row of an AT&T transducer listing.
#[derive(Debug, Clone, PartialEq)]
pub enum AttRow<'a> {
    Arc {
        source: &'a str,
        target: &'a str,
        isymbol: &'a str,
        osymbol: &'a str,
        weight: Option<f64>,
    },
    Final {
        state: &'a str,
        weight: Option<f64>,
    },
    Blank,
}

fn field(input: &str) -> IResult<&str, &str> {
    is_not(" \t\r\n")(input)
}

fn weight(input: &str) -> IResult<&str, f64> {
    alt((
        value(f64::INFINITY, tag_no_case("infinity")),
        value(f64::INFINITY, tag_no_case("inf")),
        double,
    ))(input)
}

fn end(input: &str) -> IResult<&str, ()> {
    value((), tuple((space0, eof)))(input)
}

fn arc_row(input: &str) -> IResult<&str, AttRow<'_>> {
    let (input, (source, _, target, _, isymbol, _, osymbol, weight)) = tuple((
        field,
        space1,
        field,
        space1,
        field,
        space1,
        field,
        opt(preceded(space1, weight)),
    ))(input)?;
    Ok((
        input,
        AttRow::Arc {
            source,
            target,
            isymbol,
            osymbol,
            weight,
        },
    ))
}

fn final_row(input: &str) -> IResult<&str, AttRow<'_>> {
    let (input, (state, weight)) = tuple((field, opt(preceded(space1, weight))))(input)?;
    Ok((input, AttRow::Final { state, weight }))
}

/// Parse a single line of an AT&T listing.
pub fn att_row(input: &str) -> IResult<&str, AttRow<'_>> {
    preceded(
        space0,
        alt((
            terminated(arc_row, end),
            terminated(final_row, end),
            value(AttRow::Blank, end),
        )),
    )(input)
}

/// Parse a symbol file (`symbol<TAB>id` per line).
pub fn parse_symbols(text: &str) -> Result<SymbolTable, FormatError> {
    let mut table = SymbolTable::new();
    for (i, line) in text.lines().enumerate() {
        let parsed: IResult<&str, Option<(&str, Label)>> = preceded(
            space0,
            terminated(opt(tuple((field, preceded(space1, label_number)))), end),
        )(line);
        match parsed {
            Ok((_, Some((symbol, key)))) => {
                table
                    .put(key, symbol)
                    .map_err(|e| FormatError::Parse {
                        line: i + 1,
                        message: e.to_string(),
                    })?;
            }
            Ok((_, None)) => {}
            Err(_) => {
                return Err(FormatError::Parse {
                    line: i + 1,
                    message: format!("expected `symbol<TAB>id`, got {line:?}"),
                });
            }
        }
    }
    Ok(table)
}

/// Render a symbol table in symbol file form, in ascending id order.
pub fn format_symbols(table: &SymbolTable) -> String {
    let mut out = String::new();
    for (key, symbol) in table.iter() {
        out.push_str(symbol);
        out.push('\t');
        out.push_str(&key.to_string());
        out.push('\n');
    }
    out
}

/// A graph parsed from AT&T text, ready for [`import`](super::import).
///
/// State names are assigned dense ids in order of first appearance, so the
/// source state of the first row becomes state 0 and the start. Rows with a
/// symbol unknown to a loaded symbol table extend that table. Without a
/// symbol file, labels that are all numeric are used as raw ids; otherwise a
/// fresh table (with `<eps>` at 0) is built from the symbols seen.
#[derive(Debug, Clone)]
pub struct AttModel {
    semiring: Semiring,
    finals: Vec<Weight>,
    arcs: Vec<Vec<Arc>>,
    isyms: Option<SymbolTable>,
    osyms: Option<SymbolTable>,
}

/// Resolves label tokens for one side of the transducer.
enum LabelResolver {
    Numeric,
    Table(SymbolTable),
}

impl LabelResolver {
    fn new(table: Option<SymbolTable>, tokens: &[&str]) -> Self {
        match table {
            Some(table) => LabelResolver::Table(table),
            None if tokens.iter().all(|t| t.parse::<Label>().is_ok()) => LabelResolver::Numeric,
            None => LabelResolver::Table(SymbolTable::with_epsilon()),
        }
    }

    fn resolve(&mut self, token: &str) -> Label {
        match self {
            LabelResolver::Numeric => token.parse().unwrap_or_default(),
            LabelResolver::Table(table) => match table.get_key(token) {
                Some(key) => key,
                None => {
                    tracing::debug!(symbol = token, "adding symbol missing from symbol file");
                    table.add_symbol(token)
                }
            },
        }
    }

    fn into_table(self) -> Option<SymbolTable> {
        match self {
            LabelResolver::Numeric => None,
            LabelResolver::Table(table) => Some(table),
        }
    }
}

impl AttModel {
    /// Parse an AT&T listing with optional preloaded symbol tables.
    pub fn parse(
        text: &str,
        isyms: Option<SymbolTable>,
        osyms: Option<SymbolTable>,
        semiring: Semiring,
    ) -> Result<Self, FormatError> {
        let mut rows = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let (_, row) = att_row(line).map_err(|_| FormatError::Parse {
                line: i + 1,
                message: format!("malformed row {line:?}"),
            })?;
            if row != AttRow::Blank {
                rows.push((i + 1, row));
            }
        }

        let mut itokens = Vec::new();
        let mut otokens = Vec::new();
        for (_, row) in &rows {
            if let AttRow::Arc { isymbol, osymbol, .. } = row {
                itokens.push(*isymbol);
                otokens.push(*osymbol);
            }
        }
        let mut ilabels = LabelResolver::new(isyms, &itokens);
        let mut olabels = LabelResolver::new(osyms, &otokens);

        let mut model = AttModel {
            semiring,
            finals: Vec::new(),
            arcs: Vec::new(),
            isyms: None,
            osyms: None,
        };
        let mut ids: HashMap<&str, StateId> = HashMap::new();
        let mut state_id = |name, model: &mut AttModel| -> StateId {
            *ids.entry(name).or_insert_with(|| {
                model.finals.push(semiring.zero());
                model.arcs.push(Vec::new());
                model.finals.len() - 1
            })
        };

        for (line, row) in rows {
            match row {
                AttRow::Arc {
                    source,
                    target,
                    isymbol,
                    osymbol,
                    weight,
                } => {
                    let s = state_id(source, &mut model);
                    let t = state_id(target, &mut model);
                    let w = weight.map_or_else(|| semiring.one(), Weight::new);
                    let arc = Arc::new(ilabels.resolve(isymbol), olabels.resolve(osymbol), w, t);
                    model.arcs[s].push(arc);
                }
                AttRow::Final { state, weight } => {
                    let s = state_id(state, &mut model);
                    let w = weight.map_or_else(|| semiring.one(), Weight::new);
                    if !semiring.is_member(w) {
                        return Err(FormatError::Parse {
                            line,
                            message: format!("final weight {w} is not a {semiring} weight"),
                        });
                    }
                    model.finals[s] = w;
                }
                AttRow::Blank => {}
            }
        }

        model.isyms = ilabels.into_table();
        model.osyms = olabels.into_table();
        Ok(model)
    }

    /// Read `<base>.fst.txt` and whichever of `<base>.input.syms` and
    /// `<base>.output.syms` exist.
    pub fn read(basename: impl AsRef<Path>, semiring: Semiring) -> Result<Self, FormatError> {
        let basename = basename.as_ref();
        let text = std::fs::read_to_string(with_suffix(basename, ".fst.txt"))?;
        let isyms = read_optional_symbols(&with_suffix(basename, ".input.syms"))?;
        let osyms = read_optional_symbols(&with_suffix(basename, ".output.syms"))?;
        Self::parse(&text, isyms, osyms, semiring)
    }
}

fn read_optional_symbols(path: &Path) -> Result<Option<SymbolTable>, FormatError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)?;
    parse_symbols(&text).map(Some)
}

pub(crate) fn with_suffix(basename: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(basename.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

impl FstSource for AttModel {
    fn semiring(&self) -> Semiring {
        self.semiring
    }

    fn num_states(&self) -> usize {
        self.finals.len()
    }

    fn start(&self) -> Option<StateId> {
        (!self.finals.is_empty()).then_some(0)
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

/// Write `fst` as `<base>.fst.txt` plus a symbol file for each attached table.
pub fn export_att(fst: &Fst, basename: impl AsRef<Path>) -> Result<(), FormatError> {
    let basename = basename.as_ref();
    if let Some(table) = fst.input_symbols() {
        std::fs::write(with_suffix(basename, ".input.syms"), format_symbols(table))?;
    }
    if let Some(table) = fst.output_symbols() {
        std::fs::write(with_suffix(basename, ".output.syms"), format_symbols(table))?;
    }
    std::fs::write(with_suffix(basename, ".fst.txt"), fst.to_string())?;
    tracing::info!(
        base = %basename.display(),
        states = fst.num_states(),
        arcs = fst.num_arcs(),
        "exported AT&T text"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::import;

    #[test]
    fn parse_rows() {
        assert_eq!(
            att_row("0\t1\ta\tb\t0.5").unwrap().1,
            AttRow::Arc {
                source: "0",
                target: "1",
                isymbol: "a",
                osymbol: "b",
                weight: Some(0.5)
            }
        );
        assert_eq!(
            att_row("3 1 a b").unwrap().1,
            AttRow::Arc {
                source: "3",
                target: "1",
                isymbol: "a",
                osymbol: "b",
                weight: None
            }
        );
        assert_eq!(
            att_row("2\t3.5").unwrap().1,
            AttRow::Final {
                state: "2",
                weight: Some(3.5)
            }
        );
        assert_eq!(
            att_row("2\tInfinity").unwrap().1,
            AttRow::Final {
                state: "2",
                weight: Some(f64::INFINITY)
            }
        );
        assert_eq!(
            att_row("7").unwrap().1,
            AttRow::Final {
                state: "7",
                weight: None
            }
        );
        assert_eq!(att_row("   ").unwrap().1, AttRow::Blank);
        assert!(att_row("0 1 a b 0.5 extra").is_err());
    }

    #[test]
    fn parse_symbol_file() {
        let table = parse_symbols("<eps>\t0\na\t1\n\nb\t2\n").unwrap();
        assert_eq!(table.size(), 3);
        assert_eq!(table.get_key("b"), Some(2));
        let err = parse_symbols("a\t1\nb\n").unwrap_err();
        assert!(matches!(err, FormatError::Parse { line: 2, .. }));
    }

    #[test]
    fn states_numbered_by_first_appearance() {
        let text = "s\tt\ta\tx\t1\nt\tu\tb\ty\nu\t2\n";
        let model = AttModel::parse(text, None, None, Semiring::Tropical).unwrap();
        let fst = import(&model).unwrap();
        assert_eq!(fst.num_states(), 3);
        assert_eq!(fst.start(), Some(0));
        assert_eq!(fst.final_weight(2), Some(Weight::new(2.0)));
        assert_eq!(fst.arc(1, 0).map(|a| a.weight), Some(Weight::new(0.0)));
        let isyms = fst.input_symbols().unwrap();
        assert_eq!(isyms.get_value(0), Some("<eps>"));
        assert_eq!(isyms.get_key("a"), Some(1));
    }

    #[test]
    fn numeric_labels_without_symbol_files() {
        let model = AttModel::parse("0 1 5 7 0.25\n1\n", None, None, Semiring::Log).unwrap();
        let fst = import(&model).unwrap();
        assert!(fst.input_symbols().is_none());
        assert_eq!(fst.arc(0, 0), Some(&Arc::new(5, 7, 0.25, 1)));
        assert_eq!(fst.final_weight(1), Some(Semiring::Log.one()));
    }

    #[test]
    fn unknown_symbols_extend_loaded_tables() {
        let isyms = parse_symbols("<eps>\t0\na\t1\n").unwrap();
        let model = AttModel::parse("0\t1\tq\ta\n1\n", Some(isyms), None, Semiring::Tropical)
            .unwrap();
        let fst = import(&model).unwrap();
        assert_eq!(fst.input_symbols().and_then(|t| t.get_key("q")), Some(2));
    }

    #[test]
    fn malformed_row_reports_line() {
        let err = AttModel::parse("0 1 a b 1\n0 1 a b 1 x y\n", None, None, Semiring::Tropical)
            .unwrap_err();
        assert!(matches!(err, FormatError::Parse { line: 2, .. }));
    }

    #[test]
    fn text_round_trip() {
        let mut fst = Fst::new(Semiring::Tropical);
        let s0 = fst.add_nonfinal_state();
        let s1 = fst.add_nonfinal_state();
        let s2 = fst.add_state(3.5);
        fst.set_start(s0).unwrap();
        fst.add_arc(s0, Arc::new(1, 1, 0.5, s1)).unwrap();
        fst.add_arc(s1, Arc::new(2, 2, 1.5, s2)).unwrap();
        fst.set_input_symbols(Some(SymbolTable::from_symbols(["<eps>", "a", "b"]).unwrap()));
        fst.set_output_symbols(Some(SymbolTable::from_symbols(["<eps>", "x", "y"]).unwrap()));

        let text = fst.to_string();
        let isyms = parse_symbols(&format_symbols(fst.input_symbols().unwrap())).unwrap();
        let osyms = parse_symbols(&format_symbols(fst.output_symbols().unwrap())).unwrap();
        let model = AttModel::parse(&text, Some(isyms), Some(osyms), Semiring::Tropical).unwrap();
        assert_eq!(import(&model).unwrap(), fst);
    }
}
