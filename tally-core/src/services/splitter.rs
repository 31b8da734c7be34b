//! Statement splitter - turns a migration file into executable statements
//!
//! A two-state scanner walks the text one character at a time. A `'`
//! flips between `Normal` and `InString`; a `;` ends a statement only in
//! `Normal`. Known gaps, acceptable because migration authors control the
//! input: no escaped-quote handling (a doubled `''` flips twice and so is
//! harmless), no double-quoted identifiers, no comment stripping (comment
//! text stays inside whichever statement it appears in).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InString,
}

/// Incremental splitter over a stream of characters
#[derive(Debug)]
pub struct StatementSplitter {
    state: ScanState,
    current: String,
    statements: Vec<String>,
}

impl Default for StatementSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSplitter {
    pub fn new() -> Self {
        Self {
            state: ScanState::Normal,
            current: String::new(),
            statements: Vec::new(),
        }
    }

    /// Split a whole SQL text into trimmed, non-empty statements
    pub fn split(sql: &str) -> Vec<String> {
        let mut splitter = Self::new();
        for c in sql.chars() {
            splitter.push(c);
        }
        splitter.finish()
    }

    /// Consume one character
    pub fn push(&mut self, c: char) {
        match (self.state, c) {
            (ScanState::Normal, ';') => self.flush(),
            (ScanState::Normal, '\'') => {
                self.state = ScanState::InString;
                self.current.push(c);
            }
            (ScanState::InString, '\'') => {
                self.state = ScanState::Normal;
                self.current.push(c);
            }
            _ => self.current.push(c),
        }
    }

    /// True while the scanner sits inside a single-quoted literal
    pub fn in_string(&self) -> bool {
        self.state == ScanState::InString
    }

    /// Emit the trailing statement, if any, and return everything collected
    pub fn finish(mut self) -> Vec<String> {
        self.flush();
        self.statements
    }

    fn flush(&mut self) {
        let trimmed = self.current.trim();
        if !trimmed.is_empty() {
            self.statements.push(trimmed.to_string());
        }
        self.current.clear();
    }
}
