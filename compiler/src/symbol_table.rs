//! Two-level symbol table: class scope and subroutine scope.
//!
//! Statics and fields live in the class scope for the whole class;
//! arguments and locals live in the subroutine scope, which is cleared at
//! the start of every subroutine. Indices are dense per kind, assigned in
//! declaration order, and never reused while their scope lives.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::trace;
use thiserror::Error;

use crate::vm::Segment;

/// Storage kind of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Static,
    Field,
    Argument,
    Local,
}

impl Kind {
    /// Memory segment that holds variables of this kind.
    pub fn segment(self) -> Segment {
        match self {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Argument => Segment::Argument,
            Kind::Local => Segment::Local,
        }
    }

    fn is_class_scoped(self) -> bool {
        matches!(self, Kind::Static | Kind::Field)
    }

    fn slot(self) -> usize {
        match self {
            Kind::Static => 0,
            Kind::Field => 1,
            Kind::Argument => 2,
            Kind::Local => 3,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown variable kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for Kind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(Kind::Static),
            "field" => Ok(Kind::Field),
            "argument" | "arg" => Ok(Kind::Argument),
            "local" | "var" => Ok(Kind::Local),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Static => "static",
            Kind::Field => "field",
            Kind::Argument => "argument",
            Kind::Local => "local",
        };
        f.write_str(s)
    }
}

/// A resolved variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub type_name: String,
    pub kind: Kind,
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, Symbol>,
    subroutine_scope: HashMap<String, Symbol>,
    counts: [usize; 4],
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the subroutine scope and restart argument/local numbering.
    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.counts[Kind::Argument.slot()] = 0;
        self.counts[Kind::Local.slot()] = 0;
    }

    /// Define `name` with the next free index of `kind` and return that index.
    ///
    /// Redefining a name in the same scope replaces the earlier entry; the
    /// old index is not handed out again.
    pub fn define(&mut self, name: &str, type_name: &str, kind: Kind) -> usize {
        let index = self.counts[kind.slot()];
        self.counts[kind.slot()] += 1;
        trace!("define {} {} {} -> {} {}", kind, type_name, name, kind.segment(), index);
        let symbol = Symbol {
            type_name: type_name.to_string(),
            kind,
            index,
        };
        let scope = if kind.is_class_scoped() {
            &mut self.class_scope
        } else {
            &mut self.subroutine_scope
        };
        scope.insert(name.to_string(), symbol);
        index
    }

    /// Number of symbols of `kind` defined in the current scope.
    pub fn var_count(&self, kind: Kind) -> usize {
        self.counts[kind.slot()]
    }

    /// Resolve a name, subroutine scope first.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.lookup(name).map(|s| s.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|s| s.type_name.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.lookup(name).map(|s| s.index)
    }
}
