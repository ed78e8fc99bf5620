//! Facade: orchestrates preprocessor -> pass 1 -> pass 2 -> output
//! writers for one source file. Grounded in `assembler.c`, but carries
//! its own-file context instead of the original's process-global state —
//! nothing here is shared between files, so two files could be assembled
//! concurrently with no locking.

use std::fs;
use std::path::PathBuf;

use crate::defaults::{EXT_AM, EXT_AS, EXT_ENT, EXT_EXT, EXT_OB, IC_START};
use crate::error::AssembleError;
use crate::errors::Diagnostics;
use crate::nameset::NameSet;
use crate::output;
use crate::pass1;
use crate::pass2;
use crate::preassembler;
use crate::symbols::Attrs;

/// Everything a successful assembly produces, in memory. The caller
/// decides whether to write it to disk (the CLI does) or inspect it
/// directly (tests do).
#[derive(Debug)]
pub struct AssembledFile {
    pub am_source: String,
    pub object_text: String,
    pub entries_text: Option<String>,
    pub externs_text: Option<String>,
}

/// Assemble one source file's text end to end. Unlike the per-line
/// diagnostics passes, a failure here always means "nothing got
/// written" — either the macro stage couldn't even produce valid text,
/// or the accumulated pass 1/2 diagnostics contain at least one error.
pub fn assemble_source(source: &str) -> Result<AssembledFile, AssembleError> {
    let mut names = NameSet::new();
    let am_source = preassembler::preprocess(source, &mut names)?;

    let pass1_out = pass1::run(&am_source, &mut names);
    let mut diagnostics = pass1_out.diagnostics;
    if diagnostics.has_errors() {
        return Err(AssembleError::Diagnostics(diagnostics));
    }

    let mut code_image = pass1_out.code_image;
    let code_len = code_image.len();
    let data_len = pass1_out.data_image.len();
    let symbols = pass1_out.symbols;

    let pass2_out = pass2::run(&am_source, &symbols, &mut code_image);
    diagnostics.merge(&pass2_out.diagnostics);
    check_entries_are_defined(&symbols, &mut diagnostics);

    if diagnostics.has_errors() {
        return Err(AssembleError::Diagnostics(diagnostics));
    }

    code_image.extend(pass1_out.data_image);
    let object_text = output::render_object(code_len, data_len, &code_image, IC_START);

    let entries_text = symbols
        .entries()
        .next()
        .is_some()
        .then(|| output::render_entries(&symbols));
    let externs_text = (!pass2_out.extern_uses.is_empty())
        .then(|| output::render_externs(&pass2_out.extern_uses));

    Ok(AssembledFile {
        am_source,
        object_text,
        entries_text,
        externs_text,
    })
}

fn check_entries_are_defined(symbols: &crate::symbols::SymbolTable, diagnostics: &mut Diagnostics) {
    for sym in symbols.entries() {
        if !sym.attrs.contains(Attrs::CODE) && !sym.attrs.contains(Attrs::DATA) {
            diagnostics.push(sym.def_line, format!("'.entry {}' refers to an undefined symbol", sym.name));
        }
    }
}

/// One `<base>.as` file's on-disk round trip: read, assemble, write
/// `.am`/`.ob` and (when present) `.ent`/`.ext`.
pub struct AssembleContext {
    base_name: String,
}

impl AssembleContext {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self { base_name: base_name.into() }
    }

    fn path_for(&self, ext: &str) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.base_name, ext))
    }

    fn write(&self, ext: &str, contents: &str) -> Result<(), AssembleError> {
        let path = self.path_for(ext);
        fs::write(&path, contents).map_err(|e| AssembleError::Io { path, source: e })
    }

    pub fn process(&self) -> Result<(), AssembleError> {
        let as_path = self.path_for(EXT_AS);
        let source = fs::read_to_string(&as_path).map_err(|e| AssembleError::Io { path: as_path, source: e })?;

        let assembled = assemble_source(&source)?;

        self.write(EXT_AM, &assembled.am_source)?;
        self.write(EXT_OB, &assembled.object_text)?;
        if let Some(ent) = &assembled.entries_text {
            self.write(EXT_ENT, ent)?;
        }
        if let Some(ext) = &assembled.externs_text {
            self.write(EXT_EXT, ext)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scenario_a_full_pipeline_register_move() {
        let out = assemble_source("mov r1, r2\nstop\n").unwrap();
        assert!(out.object_text.starts_with("d a\n"));
        assert!(out.entries_text.is_none());
        assert!(out.externs_text.is_none());
    }

    #[test]
    fn scenario_e_entry_on_undefined_symbol_fails() {
        let err = assemble_source(".entry FOO\nstop\n").unwrap_err();
        match err {
            AssembleError::Diagnostics(d) => assert!(d.has_errors()),
            _ => panic!("expected a diagnostics error"),
        }
    }

    #[test]
    fn scenario_f_macro_expansion_end_to_end() {
        let src = "mcro double\nadd r1, r1\nmcroend\ndouble\nstop\n";
        let out = assemble_source(src).unwrap();
        assert!(out.am_source.contains("add r1, r1"));
        assert!(!out.am_source.contains("mcro"));
    }

    #[test]
    fn scenario_b_extern_reference_produces_ext_file() {
        let src = ".extern FOO\njmp FOO\nstop\n";
        let out = assemble_source(src).unwrap();
        assert!(out.externs_text.unwrap().contains("FOO"));
    }
}
