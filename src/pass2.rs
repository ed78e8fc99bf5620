//! Pass 2: re-parse every instruction line (through the same
//! [`crate::encoding::parse_instruction`] pass 1 used for sizing) and
//! fill in the words pass 1 only reserved. Grounded in `pass2.c`.
//!
//! The one invariant worth calling out: an external symbol's use-site
//! address is recorded by [`Emitter::emit_extern_use`], the same function
//! that advances the instruction counter for that word. Recording the
//! address anywhere else risks it drifting from the word actually
//! written if an operand ever grows another word.

use crate::codeimg::Image;
use crate::defaults::IC_START;
use crate::encoding::{parse_instruction, strip_comment, Operand};
use crate::errors::Diagnostics;
use crate::isa;
use crate::symbols::SymbolTable;

#[derive(Clone, Debug)]
pub struct ExternUse {
    pub name: String,
    pub address: u32,
}

pub struct Pass2Output {
    pub diagnostics: Diagnostics,
    pub extern_uses: Vec<ExternUse>,
}

struct Emitter<'a> {
    image: &'a mut Image,
    pos: usize,
    extern_uses: Vec<ExternUse>,
}

impl<'a> Emitter<'a> {
    fn address(&self) -> u32 {
        IC_START + self.pos as u32
    }

    fn emit(&mut self, value: i64, line: u32) {
        self.image.set(self.pos, value);
        let _ = line;
        self.pos += 1;
    }

    /// Emit an external-reference word, recording the use-site address in
    /// the same step that advances `pos`.
    fn emit_extern_use(&mut self, name: &str, line: u32) {
        self.extern_uses.push(ExternUse {
            name: name.to_string(),
            address: self.address(),
        });
        self.emit(isa::word_extern() as i64, line);
    }
}

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

pub fn run(source: &str, symbols: &SymbolTable, code_image: &mut Image) -> Pass2Output {
    let mut diagnostics = Diagnostics::new();
    let mut emitter = Emitter {
        image: code_image,
        pos: 0,
        extern_uses: Vec::new(),
    };

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let (_label, rest) = split_label(line);
        if rest.is_empty() || rest.starts_with('.') {
            continue;
        }

        let (mnemonic, operand_text) = split_first_word(rest);
        let parsed = match parse_instruction(mnemonic, operand_text) {
            Ok(p) => p,
            Err(_) => continue, // already reported in pass 1
        };

        let src_mode = parsed.src.as_ref().map(|o| o.mode());
        let dst_mode = parsed.dst.as_ref().map(|o| o.mode());
        emitter.emit(isa::first_word(parsed.opcode, src_mode, dst_mode) as i64, line_no);

        let src_is_reg = matches!(parsed.src, Some(Operand::Register(_)));
        let dst_is_reg = matches!(parsed.dst, Some(Operand::Register(_)));

        if src_is_reg && dst_is_reg {
            let (Some(Operand::Register(s)), Some(Operand::Register(d))) = (&parsed.src, &parsed.dst) else {
                unreachable!()
            };
            emitter.emit(isa::word_regs_pair(*s, *d) as i64, line_no);
        } else {
            if let Some(op) = &parsed.src {
                emit_operand(op, true, &mut emitter, symbols, &mut diagnostics, line_no);
            }
            if let Some(op) = &parsed.dst {
                emit_operand(op, false, &mut emitter, symbols, &mut diagnostics, line_no);
            }
        }
    }

    Pass2Output {
        diagnostics,
        extern_uses: emitter.extern_uses,
    }
}

fn emit_operand(
    op: &Operand,
    is_src: bool,
    emitter: &mut Emitter,
    symbols: &SymbolTable,
    diagnostics: &mut Diagnostics,
    line: u32,
) {
    match op {
        Operand::Immediate(v) => {
            // check_fit8: the 8-bit field holds both the signed range
            // [-128, 127] and the unsigned range [128, 255] that aliases
            // the same bit pattern, so legal values span [-128, 255].
            if *v > 255 || *v < -128 {
                diagnostics.push_warning(line, format!("immediate value {} out of 8-bit range (masked)", v));
            }
            emitter.emit(isa::word_immediate(*v) as i64, line);
        }
        Operand::Register(r) => {
            if is_src {
                emitter.emit(isa::word_reg_src(*r) as i64, line);
            } else {
                emitter.emit(isa::word_reg_dst(*r) as i64, line);
            }
        }
        Operand::Direct(label) => emit_symbol_word(label, emitter, symbols, diagnostics, line),
        Operand::Matrix { label, row_reg, col_reg } => {
            emit_symbol_word(label, emitter, symbols, diagnostics, line);
            emitter.emit(isa::word_regs_pair(*row_reg, *col_reg) as i64, line);
        }
    }
}

fn emit_symbol_word(
    label: &str,
    emitter: &mut Emitter,
    symbols: &SymbolTable,
    diagnostics: &mut Diagnostics,
    line: u32,
) {
    match symbols.lookup(label) {
        None => {
            diagnostics.push(line, format!("undefined symbol '{}'", label));
            emitter.emit(0, line);
        }
        Some(sym) if symbols.is_external(label) => {
            emitter.emit_extern_use(label, line);
            let _ = sym;
        }
        Some(sym) => emitter.emit(isa::word_relocatable(sym.value) as i64, line),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codeimg::Image;
    use crate::symbols::{Attrs, SymbolTable};

    fn prefill(n: usize) -> Image {
        let mut img = Image::new();
        for _ in 0..n {
            img.push_word(0, 0);
        }
        img
    }

    #[test]
    fn scenario_b_extern_use_site_address_is_exact() {
        let mut symbols = SymbolTable::new();
        symbols.declare_extern("FOO", 1).unwrap();
        // "jmp FOO" -> 2 words, reserved starting at IC_START
        let mut image = prefill(2);
        let out = run("jmp FOO\n", &symbols, &mut image);
        assert!(!out.diagnostics.has_errors());
        assert_eq!(out.extern_uses.len(), 1);
        assert_eq!(out.extern_uses[0].name, "FOO");
        assert_eq!(out.extern_uses[0].address, IC_START + 1);
    }

    #[test]
    fn undefined_symbol_is_reported() {
        let symbols = SymbolTable::new();
        let mut image = prefill(2);
        let out = run("jmp MISSING\n", &symbols, &mut image);
        assert!(out.diagnostics.has_errors());
    }

    #[test]
    fn immediate_out_of_range_is_a_warning_not_an_error() {
        let symbols = SymbolTable::new();
        let mut image = prefill(2);
        let out = run("prn #500\n", &symbols, &mut image);
        assert!(!out.diagnostics.has_errors());
        assert_eq!(out.diagnostics.len(), 1);
    }

    #[test]
    fn local_direct_operand_gets_are_relocatable() {
        let mut symbols = SymbolTable::new();
        symbols.define("X", 105, Attrs::DATA, 1).unwrap();
        let mut image = prefill(2);
        let out = run("jmp X\n", &symbols, &mut image);
        assert!(!out.diagnostics.has_errors());
        let second = image.iter().nth(1).unwrap().value as u16;
        assert_eq!(second & 0b11, 0b10);
    }

    #[test]
    fn inline_comment_after_an_instruction_does_not_break_parsing() {
        let symbols = SymbolTable::new();
        let mut image = prefill(2);
        let out = run("mov r1, r2 ; setup\n", &symbols, &mut image);
        assert!(!out.diagnostics.has_errors());
    }
}
