//! Database port - the connection capability the migration engine consumes

use crate::domain::result::Result;

/// A typed SQL argument or result cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One result row, cells in select-list order
pub type Row = Vec<Value>;

/// Database connection abstraction
///
/// The engine never opens or configures a connection; whoever owns the
/// store (pooling, pragmas, retry-on-lock) hands one in through this trait.
/// All calls go to the same underlying session, so `begin`/`commit` bracket
/// every `exec` issued between them.
pub trait Database {
    // === Statements ===

    /// Execute a single statement, discarding any rows it produces
    fn exec(&self, sql: &str, args: &[Value]) -> Result<()>;

    /// Run a query and collect every row
    fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>>;

    // === Transactions ===

    /// Open a transaction on the session
    fn begin(&self) -> Result<()>;

    /// Commit the open transaction
    fn commit(&self) -> Result<()>;

    /// Discard the open transaction
    fn rollback(&self) -> Result<()>;
}
