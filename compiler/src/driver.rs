//! File-level driver: source discovery, output naming, per-file compilation.
//!
//! Each `.jack` file is compiled independently with its own engine, so
//! label numbering restarts per output file. A file that fails to compile
//! produces no `.vm` output.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use miette::Diagnostic;
use thiserror::Error;

use crate::errors::CompileError;
use crate::vm;

pub const SOURCE_EXTENSION: &str = "jack";
pub const OUTPUT_EXTENSION: &str = "vm";

#[derive(Error, Debug, Diagnostic)]
pub enum DriverError {
    #[error("cannot read '{path}': {source}")]
    #[diagnostic(code(jack::io))]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write '{path}': {source}")]
    #[diagnostic(code(jack::io))]
    Write { path: PathBuf, source: io::Error },

    #[error("'{0}' is not a .jack source file")]
    #[diagnostic(code(jack::not_jack_source))]
    NotJackSource(PathBuf),

    #[error("no .jack files found in '{0}'")]
    #[diagnostic(code(jack::no_sources))]
    NoSources(PathBuf),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),
}

/// The `.jack` files named by `path`: the file itself (which must carry the
/// `.jack` extension), or every `.jack` file directly inside a directory,
/// sorted by name.
pub fn collect_sources(path: &Path) -> Result<Vec<PathBuf>, DriverError> {
    if !path.is_dir() {
        if !is_source(path) {
            return Err(DriverError::NotJackSource(path.to_path_buf()));
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = fs::read_dir(path).map_err(|source| DriverError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DriverError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file = entry.path();
        if file.is_file() && is_source(&file) {
            files.push(file);
        }
    }
    if files.is_empty() {
        return Err(DriverError::NoSources(path.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

fn is_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Sibling output path: `Foo.jack` becomes `Foo.vm`.
pub fn output_path(source: &Path) -> PathBuf {
    source.with_extension(OUTPUT_EXTENSION)
}

/// Compile one file and write its `.vm` sibling. Returns the output path.
pub fn compile_file(source: &Path) -> Result<PathBuf, DriverError> {
    let text = fs::read_to_string(source).map_err(|e| DriverError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;
    debug!("read {} ({} bytes)", source.display(), text.len());

    let output = crate::compile(&text)?;
    let out_path = output_path(source);
    vm::write_vm(&out_path, &output).map_err(|e| DriverError::Write {
        path: out_path.clone(),
        source: e,
    })?;
    Ok(out_path)
}
