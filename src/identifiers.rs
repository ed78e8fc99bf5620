//! Identifier classification: reserved words, and the naming rules shared
//! (with one difference) between labels and macro names. Grounded in
//! `identifiers.c`.

use crate::defaults::MAX_LABEL_LEN;

/// The sixteen opcode mnemonics.
pub const MNEMONICS: &[&str] = &[
    "mov", "cmp", "add", "sub", "lea", "clr", "not", "inc", "dec", "jmp", "bne", "red", "prn",
    "jsr", "rts", "stop",
];

/// Directive names, written without their leading dot.
pub const DIRECTIVES: &[&str] = &["data", "string", "mat", "entry", "extern"];

/// Registers `r0`..`r7` are reserved the same way mnemonics are: a label or
/// macro can't shadow them.
fn is_register_name(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 2 && bytes[0] == b'r' && (b'0'..=b'7').contains(&bytes[1])
}

/// True if `name` collides with a mnemonic, directive, or register name and
/// so cannot be used as a label or macro name.
pub fn is_reserved(name: &str) -> bool {
    MNEMONICS.contains(&name) || DIRECTIVES.contains(&name) || is_register_name(name)
    || name == "mcro" || name == "mcroend"
}

fn starts_with_letter(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Labels: must start with a letter, every character alphanumeric, length
/// within [`MAX_LABEL_LEN`], and not a reserved word. No underscores.
pub fn is_valid_label_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_LABEL_LEN
        && starts_with_letter(name)
        && name.chars().all(|c| c.is_ascii_alphanumeric())
        && !is_reserved(name)
}

/// Macro names follow the same rule as labels, except an underscore is
/// allowed after the first letter (e.g. `my_macro`).
pub fn is_valid_macro_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_LABEL_LEN
        && starts_with_letter(name)
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_reserved(name)
}
