//! Pass 1: walk the expanded source once, building the symbol table and
//! reserving code/data image slots. Grounded in `pass1.c`. Uses the same
//! [`crate::encoding::parse_instruction`] that pass 2 uses for real
//! emission — only [`crate::encoding::ParsedInstruction::word_count`] is
//! consulted here, so the two passes can never disagree about how many
//! words an instruction takes.

use crate::codeimg::Image;
use crate::defaults::IC_START;
use crate::encoding::{parse_instruction, strip_comment};
use crate::errors::Diagnostics;
use crate::identifiers::is_valid_label_name;
use crate::nameset::NameSet;
use crate::symbols::{Attrs, SymbolTable};

pub struct Pass1Output {
    pub symbols: SymbolTable,
    pub code_image: Image,
    pub data_image: Image,
    pub diagnostics: Diagnostics,
    pub icf: u32,
}

/// Strip a trailing `:` label off the front of a line, if present.
/// Returns `(label, rest)`; `rest` has leading whitespace trimmed.
fn split_label(line: &str) -> (Option<&str>, &str) {
    if let Some(colon) = line.find(':') {
        let candidate = line[..colon].trim();
        if !candidate.is_empty() && !candidate.contains(char::is_whitespace) {
            return (Some(candidate), line[colon + 1..].trim_start());
        }
    }
    (None, line)
}

fn split_first_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

/// `names` is the shared namespace macro names were recorded into during
/// preprocessing; a `.data`/`.string`/`.mat` label colliding with an
/// existing macro name is rejected here. Code labels are checked only
/// against the symbol table, not against `names`.
pub fn run(source: &str, names: &mut NameSet) -> Pass1Output {
    let mut symbols = SymbolTable::new();
    let mut code_image = Image::new();
    let mut data_image = Image::new();
    let mut diagnostics = Diagnostics::new();
    let mut ic: u32 = 0;
    let mut dc: u32 = 0;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let (label, rest) = split_label(line);
        if let Some(name) = label {
            if !is_valid_label_name(name) {
                diagnostics.push(line_no, format!("'{}' is not a valid label name", name));
            }
        }
        if rest.is_empty() {
            if label.is_some() {
                diagnostics.push(line_no, "label with no statement on its line".to_string());
            }
            continue;
        }

        if let Some(directive_rest) = rest.strip_prefix('.') {
            let (directive, operand_text) = split_first_word(directive_rest);
            handle_directive(
                directive,
                operand_text,
                label,
                line_no,
                &mut symbols,
                &mut data_image,
                &mut dc,
                &mut diagnostics,
                names,
            );
            continue;
        }

        let (mnemonic, operand_text) = split_first_word(rest);
        match parse_instruction(mnemonic, operand_text) {
            Ok(parsed) => {
                if let Some(name) = label {
                    if is_valid_label_name(name) {
                        if let Err(e) = symbols.define(name, IC_START + ic, Attrs::CODE, line_no) {
                            diagnostics.push(line_no, format!("{}", e));
                        }
                    }
                }
                for _ in 0..parsed.word_count() {
                    code_image.push_word(0, line_no);
                }
                ic += parsed.word_count() as u32;
            }
            Err(msg) => diagnostics.push(line_no, msg),
        }
    }

    let icf = IC_START + ic;
    symbols.relocate_data(icf);

    Pass1Output {
        symbols,
        code_image,
        data_image,
        diagnostics,
        icf,
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_directive(
    directive: &str,
    operand_text: &str,
    label: Option<&str>,
    line_no: u32,
    symbols: &mut SymbolTable,
    data_image: &mut Image,
    dc: &mut u32,
    diagnostics: &mut Diagnostics,
    names: &NameSet,
) {
    match directive {
        "data" => match crate::encoding::parse_data_values(operand_text) {
            Ok(values) => {
                define_data_label(label, symbols, diagnostics, line_no, *dc, names);
                for v in values {
                    data_image.push_word(v, line_no);
                    *dc += 1;
                }
            }
            Err(msg) => diagnostics.push(line_no, msg),
        },
        "string" => match crate::encoding::parse_string_value(operand_text) {
            Ok(s) => {
                define_data_label(label, symbols, diagnostics, line_no, *dc, names);
                for byte in s.bytes() {
                    data_image.push_word(byte as i64, line_no);
                    *dc += 1;
                }
                data_image.push_word(0, line_no);
                *dc += 1;
            }
            Err(msg) => diagnostics.push(line_no, msg),
        },
        "mat" => match crate::encoding::parse_mat_decl(operand_text) {
            Ok(decl) => {
                define_data_label(label, symbols, diagnostics, line_no, *dc, names);
                let capacity = (decl.rows as usize) * (decl.cols as usize);
                for i in 0..capacity {
                    let v = decl.values.get(i).copied().unwrap_or(0);
                    data_image.push_word(v, line_no);
                    *dc += 1;
                }
            }
            Err(msg) => diagnostics.push(line_no, msg),
        },
        "extern" => {
            let name = operand_text.trim();
            if !is_valid_label_name(name) {
                diagnostics.push(line_no, format!("'{}' is not a valid label name", name));
            } else if let Err(e) = symbols.declare_extern(name, line_no) {
                diagnostics.push(line_no, format!("{}", e));
            }
            if label.is_some() {
                diagnostics.push(line_no, "label before '.extern' is ignored".to_string());
            }
        }
        "entry" => {
            let name = operand_text.trim();
            if !is_valid_label_name(name) {
                diagnostics.push(line_no, format!("'{}' is not a valid label name", name));
            } else {
                symbols.mark_entry(name, line_no);
            }
            if label.is_some() {
                diagnostics.push(line_no, "label before '.entry' is ignored".to_string());
            }
        }
        other => diagnostics.push(line_no, format!("unknown directive '.{}'", other)),
    }
}

fn define_data_label(
    label: Option<&str>,
    symbols: &mut SymbolTable,
    diagnostics: &mut Diagnostics,
    line_no: u32,
    dc: u32,
    names: &NameSet,
) {
    if let Some(name) = label {
        if is_valid_label_name(name) {
            if names.contains(name) {
                diagnostics.push(line_no, format!("'{}' collides with an existing macro name", name));
                return;
            }
            if let Err(e) = symbols.define(name, dc, Attrs::DATA, line_no) {
                diagnostics.push(line_no, format!("{}", e));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn run_with_fresh_names(source: &str) -> Pass1Output {
        run(source, &mut NameSet::new())
    }

    #[test]
    fn scenario_a_reg_reg_move_reserves_two_words() {
        let out = run_with_fresh_names("mov r1, r2\nstop\n");
        assert!(!out.diagnostics.has_errors());
        assert_eq!(out.code_image.len(), 3);
    }

    #[test]
    fn scenario_c_data_label_gets_relocated() {
        let out = run_with_fresh_names("NUM: .data 5, 6\nstop\n");
        assert!(!out.diagnostics.has_errors());
        let sym = out.symbols.lookup("NUM").unwrap();
        assert_eq!(sym.value, out.icf);
    }

    #[test]
    fn scenario_e_entry_on_undefined_symbol_is_allowed_at_pass1() {
        // pass 1 only records the intent; pass 2/output later reports the
        // undefined-entry error once all labels are known.
        let out = run_with_fresh_names(".entry FOO\nstop\n");
        assert!(!out.diagnostics.has_errors());
        assert!(out.symbols.lookup("FOO").is_some());
    }

    #[test]
    fn unknown_mnemonic_is_a_diagnostic_not_a_panic() {
        let out = run_with_fresh_names("frobnicate r1\n");
        assert!(out.diagnostics.has_errors());
    }

    #[test]
    fn string_directive_null_terminates() {
        let out = run_with_fresh_names("MSG: .string \"hi\"\n");
        assert_eq!(out.data_image.len(), 3);
    }

    #[test]
    fn data_label_colliding_with_macro_name_is_rejected() {
        let mut names = NameSet::new();
        names.add("FOO");
        let out = run("FOO: .data 1\nstop\n", &mut names);
        assert!(out.diagnostics.has_errors());
        assert!(out.symbols.lookup("FOO").is_none());
    }

    #[test]
    fn inline_comment_after_an_instruction_does_not_break_parsing() {
        let out = run_with_fresh_names("mov r1, r2 ; setup\nstop\n");
        assert!(!out.diagnostics.has_errors());
        assert_eq!(out.code_image.len(), 3);
    }
}
