// Symbol table: bijective label <-> string mapping for arc alphabets.

use hashbrown::HashMap;

use crate::weight::Label;

/// Conventional name of the epsilon symbol.
pub const EPSILON_SYMBOL: &str = "<eps>";

/// Error type for symbol table mutations that would break the bijection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("symbol {symbol:?} is already bound to id {existing}, cannot bind it to {requested}")]
    DuplicateSymbol {
        symbol: String,
        existing: Label,
        requested: Label,
    },
}

/// A bijective mapping between labels and symbol strings.
///
/// Both directions are stored and kept in sync on every mutation, so
/// `get_key(get_value(id)) == Some(id)` holds for every present id. A symbol
/// can be bound to at most one id: [`put`](Self::put) rejects a symbol that
/// already belongs to another id. Ids, once assigned, stay stable for the
/// lifetime of the table.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    by_key: HashMap<Label, String>,
    by_symbol: HashMap<String, Label>,
    /// Smallest id strictly greater than every id ever inserted.
    available_key: Label,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding only `<eps>` at id 0.
    pub fn with_epsilon() -> Self {
        let mut table = Self::new();
        table.add_symbol(EPSILON_SYMBOL);
        table
    }

    /// Build a table from symbols in id order (`symbols[i]` gets id `i`).
    ///
    /// Fails on the first duplicate symbol.
    pub fn from_symbols<I, S>(symbols: I) -> Result<Self, SymbolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (i, sym) in symbols.into_iter().enumerate() {
            table.put(i as Label, sym)?;
        }
        Ok(table)
    }

    /// Bind `key` to `symbol`.
    ///
    /// Rebinding an existing key replaces its symbol and returns the old one.
    /// Binding a symbol that is already mapped to a different key is
    /// rejected.
    pub fn put(&mut self, key: Label, symbol: impl Into<String>) -> Result<Option<String>, SymbolError> {
        let symbol = symbol.into();
        if let Some(&existing) = self.by_symbol.get(&symbol) {
            if existing != key {
                return Err(SymbolError::DuplicateSymbol {
                    symbol,
                    existing,
                    requested: key,
                });
            }
            return Ok(Some(symbol));
        }

        let previous = self.by_key.insert(key, symbol.clone());
        if let Some(old) = &previous {
            self.by_symbol.remove(old);
        }
        self.by_symbol.insert(symbol, key);
        if key >= self.available_key {
            self.available_key = key.saturating_add(1);
        }
        Ok(previous)
    }

    /// Return the id of `symbol`, binding it to a fresh id if it is new.
    pub fn add_symbol(&mut self, symbol: &str) -> Label {
        if let Some(&key) = self.by_symbol.get(symbol) {
            return key;
        }
        let mut key = self.available_key;
        if self.by_key.contains_key(&key) {
            // ids are exhausted at the top; reuse the lowest gap
            key = (0..Label::MAX)
                .find(|k| !self.by_key.contains_key(k))
                .unwrap_or(Label::MAX);
        }
        self.by_key.insert(key, symbol.to_string());
        self.by_symbol.insert(symbol.to_string(), key);
        self.available_key = self.available_key.max(key.saturating_add(1));
        key
    }

    /// The symbol bound to `key`.
    #[inline]
    pub fn get_value(&self, key: Label) -> Option<&str> {
        self.by_key.get(&key).map(String::as_str)
    }

    /// The id bound to `symbol`.
    #[inline]
    pub fn get_key(&self, symbol: &str) -> Option<Label> {
        self.by_symbol.get(symbol).copied()
    }

    /// Remove `key` and its symbol. Returns the removed symbol.
    pub fn remove_key(&mut self, key: Label) -> Option<String> {
        let symbol = self.by_key.remove(&key)?;
        self.by_symbol.remove(&symbol);
        Some(symbol)
    }

    /// Remove `symbol` and its key. Returns the removed key.
    pub fn remove_value(&mut self, symbol: &str) -> Option<Label> {
        let key = self.by_symbol.remove(symbol)?;
        self.by_key.remove(&key);
        Some(key)
    }

    /// All ids, ascending.
    pub fn key_set(&self) -> Vec<Label> {
        let mut keys: Vec<Label> = self.by_key.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// All symbols, in ascending id order.
    pub fn value_set(&self) -> Vec<&str> {
        self.iter().map(|(_, sym)| sym).collect()
    }

    /// `(id, symbol)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (Label, &str)> + '_ {
        self.key_set()
            .into_iter()
            .filter_map(move |k| self.get_value(k).map(|s| (k, s)))
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.by_key.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// The id the next [`add_symbol`](Self::add_symbol) of a new symbol would get.
    #[inline]
    pub fn available_key(&self) -> Label {
        self.available_key
    }

    #[inline]
    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.by_symbol.contains_key(symbol)
    }
}

impl PartialEq for SymbolTable {
    fn eq(&self, other: &Self) -> bool {
        self.by_key == other.by_key
    }
}

impl Eq for SymbolTable {}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bijective(table: &SymbolTable) {
        for key in table.key_set() {
            let sym = table.get_value(key).unwrap();
            assert_eq!(table.get_key(sym), Some(key));
        }
        assert_eq!(table.by_key.len(), table.by_symbol.len());
    }

    #[test]
    fn put_and_lookup_both_directions() {
        let mut t = SymbolTable::new();
        t.put(0, "<eps>").unwrap();
        t.put(1, "a").unwrap();
        t.put(2, "b").unwrap();

        assert_eq!(t.size(), 3);
        assert_eq!(t.get_value(1), Some("a"));
        assert_eq!(t.get_key("b"), Some(2));
        assert_eq!(t.get_value(7), None);
        assert_eq!(t.get_key("zz"), None);
        assert_bijective(&t);
    }

    #[test]
    fn duplicate_symbol_is_rejected() {
        let mut t = SymbolTable::new();
        t.put(0, "a").unwrap();
        let err = t.put(1, "a").unwrap_err();
        assert_eq!(
            err,
            SymbolError::DuplicateSymbol {
                symbol: "a".to_string(),
                existing: 0,
                requested: 1
            }
        );
        assert_eq!(t.size(), 1);
        assert_eq!(t.get_value(1), None);
        assert_bijective(&t);
    }

    #[test]
    fn rebinding_a_key_drops_the_old_symbol() {
        let mut t = SymbolTable::new();
        t.put(3, "x").unwrap();
        assert_eq!(t.put(3, "y").unwrap(), Some("x".to_string()));
        assert_eq!(t.get_key("x"), None);
        assert_eq!(t.get_key("y"), Some(3));
        assert_bijective(&t);
    }

    #[test]
    fn same_binding_twice_is_accepted() {
        let mut t = SymbolTable::new();
        t.put(4, "k").unwrap();
        assert!(t.put(4, "k").is_ok());
        assert_eq!(t.size(), 1);
    }

    #[test]
    fn remove_keeps_bijection() {
        let mut t = SymbolTable::from_symbols(["<eps>", "a", "b", "c"]).unwrap();
        assert_eq!(t.remove_key(1), Some("a".to_string()));
        assert_eq!(t.remove_value("c"), Some(3));
        assert_eq!(t.remove_value("c"), None);
        assert_eq!(t.key_set(), vec![0, 2]);
        assert_eq!(t.value_set(), vec!["<eps>", "b"]);
        assert_bijective(&t);
    }

    #[test]
    fn add_symbol_assigns_fresh_ids() {
        let mut t = SymbolTable::with_epsilon();
        assert_eq!(t.add_symbol("a"), 1);
        assert_eq!(t.add_symbol("b"), 2);
        assert_eq!(t.add_symbol("a"), 1);
        t.put(10, "z").unwrap();
        assert_eq!(t.add_symbol("q"), 11);
        // Removed ids are not reused.
        t.remove_key(11);
        assert_eq!(t.add_symbol("r"), 12);
        assert_bijective(&t);
    }

    #[test]
    fn largest_id_does_not_overflow() {
        let mut t = SymbolTable::with_epsilon();
        t.put(Label::MAX, "top").unwrap();
        assert_eq!(t.available_key(), Label::MAX);
        assert_eq!(t.get_key("top"), Some(Label::MAX));
        // the top id is taken, so the lowest gap is used
        assert_eq!(t.add_symbol("a"), 1);
        assert_eq!(t.get_value(Label::MAX), Some("top"));
        assert_bijective(&t);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = SymbolTable::from_symbols(["<eps>", "a", "b"]).unwrap();
        let mut b = SymbolTable::new();
        b.put(2, "b").unwrap();
        b.put(0, "<eps>").unwrap();
        b.put(1, "a").unwrap();
        assert_eq!(a, b);
    }
}
