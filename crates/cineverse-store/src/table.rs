//! In-memory table model: scalar values, records, and the table itself.
//!
//! A `Table` is the full set of records of one entity type. Row order
//! reflects insertion history and carries no other guarantee.

use std::collections::BTreeMap;
use std::fmt;

static NULL: Value = Value::Null;

/// A single cell. Columns are dynamically typed; declared integer columns
/// coerce on decode, with unparsable cells degrading to `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Null,
}

impl Value {
    /// Parse a raw text cell. Empty cells are null; cells in declared
    /// integer columns that fail to parse are null rather than an error.
    pub fn from_cell(cell: &str, integer: bool) -> Value {
        if cell.is_empty() {
            return Value::Null;
        }
        if integer {
            return match cell.trim().parse() {
                Ok(n) => Value::Int(n),
                Err(_) => Value::Null,
            };
        }
        Value::Str(cell.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    /// Canonical cell form: integers base-10, null as the empty field.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<Option<i64>> for Value {
    fn from(n: Option<i64>) -> Self {
        n.map(Value::Int).unwrap_or(Value::Null)
    }
}

impl From<Option<String>> for Value {
    fn from(s: Option<String>) -> Self {
        s.map(Value::Str).unwrap_or(Value::Null)
    }
}

/// Static description of one table: declared columns in on-disk order,
/// which of them coerce to integers, and which participate in text search.
#[derive(Debug, PartialEq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub int_columns: &'static [&'static str],
    pub search_columns: &'static [&'static str],
}

impl TableSpec {
    pub fn is_int(&self, column: &str) -> bool {
        self.int_columns.contains(&column)
    }
}

/// One row: a mapping of column name to scalar value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absent fields read as null.
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&NULL)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).as_str()
    }

    pub fn int_field(&self, field: &str) -> Option<i64> {
        self.get(field).as_int()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// All records of one entity type, backed by one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    spec: &'static TableSpec,
    rows: Vec<Record>,
}

impl Table {
    pub fn empty(spec: &'static TableSpec) -> Self {
        Self { spec, rows: Vec::new() }
    }

    pub fn spec(&self) -> &'static TableSpec {
        self.spec
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, record: Record) {
        self.rows.push(record);
    }

    /// Next id: `max(existing numeric ids, 0) + 1`. Rows with missing or
    /// non-numeric ids are skipped, not treated as errors.
    pub fn next_id(&self) -> i64 {
        self.rows
            .iter()
            .filter_map(|r| r.int_field("id"))
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn find_by_id(&self, id: i64) -> Option<&Record> {
        self.rows.iter().find(|r| r.int_field("id") == Some(id))
    }

    pub fn find_by_id_mut(&mut self, id: i64) -> Option<&mut Record> {
        self.rows.iter_mut().find(|r| r.int_field("id") == Some(id))
    }

    pub fn find_first(&self, pred: impl Fn(&Record) -> bool) -> Option<&Record> {
        self.rows.iter().find(|r| pred(r))
    }

    pub fn find_all(&self, pred: impl Fn(&Record) -> bool) -> Vec<&Record> {
        self.rows.iter().filter(|r| pred(r)).collect()
    }

    /// Remove the row with the given id. Returns whether a row was removed.
    pub fn remove_by_id(&mut self, id: i64) -> bool {
        let before = self.rows.len();
        self.rows.retain(|r| r.int_field("id") != Some(id));
        self.rows.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SPEC: TableSpec = TableSpec {
        name: "things",
        columns: &["id", "label", "count"],
        int_columns: &["id", "count"],
        search_columns: &["label"],
    };

    fn row(id: i64, label: &str) -> Record {
        let mut r = Record::new();
        r.set("id", id);
        r.set("label", label);
        r
    }

    #[test]
    fn from_cell_coercion() {
        assert_eq!(Value::from_cell("", false), Value::Null);
        assert_eq!(Value::from_cell("", true), Value::Null);
        assert_eq!(Value::from_cell("12", true), Value::Int(12));
        assert_eq!(Value::from_cell(" 12 ", true), Value::Int(12));
        assert_eq!(Value::from_cell("twelve", true), Value::Null);
        assert_eq!(Value::from_cell("12", false), Value::Str("12".into()));
    }

    #[test]
    fn display_renders_canonical_cells() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Str("abc".into()).to_string(), "abc");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn absent_field_reads_as_null() {
        let r = Record::new();
        assert!(r.get("anything").is_null());
        assert_eq!(r.str_field("anything"), None);
    }

    #[test]
    fn next_id_on_empty_table_is_one() {
        assert_eq!(Table::empty(&SPEC).next_id(), 1);
    }

    #[test]
    fn next_id_skips_non_numeric_ids() {
        let mut t = Table::empty(&SPEC);
        t.push(row(3, "a"));
        let mut broken = Record::new();
        broken.set("id", Value::Null);
        broken.set("label", "b");
        t.push(broken);
        assert_eq!(t.next_id(), 4);
    }

    #[test]
    fn find_and_remove_by_id() {
        let mut t = Table::empty(&SPEC);
        t.push(row(1, "a"));
        t.push(row(2, "b"));

        assert_eq!(t.find_by_id(2).unwrap().str_field("label"), Some("b"));
        assert!(t.find_by_id(9).is_none());

        assert!(t.remove_by_id(1));
        assert!(!t.remove_by_id(1));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn find_first_and_all() {
        let mut t = Table::empty(&SPEC);
        t.push(row(1, "apple"));
        t.push(row(2, "banana"));
        t.push(row(3, "apple"));

        let first = t.find_first(|r| r.str_field("label") == Some("apple"));
        assert_eq!(first.unwrap().int_field("id"), Some(1));

        let all = t.find_all(|r| r.str_field("label") == Some("apple"));
        assert_eq!(all.len(), 2);
    }
}
