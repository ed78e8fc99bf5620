//! Macro preprocessor: expands `mcro NAME ... mcroend` blocks into a
//! fully-expanded source text (the `.am` file). Grounded in
//! `preassembler.c`. Unlike pass 1/pass 2, this stage aborts on the first
//! problem rather than accumulating diagnostics — a source file whose
//! macros can't even be expanded has nothing left worth sizing.

use std::fmt;

use crate::defaults::MAX_LINE_LEN;
use crate::identifiers::is_valid_macro_name;
use crate::nameset::NameSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreError {
    LineTooLong { line: u32 },
    InvalidMacroName { line: u32, name: String },
    DuplicateMacroName { line: u32, name: String },
    NestedMacroDefinition { line: u32 },
    UnterminatedMacro { line: u32 },
    EndMacrWithoutStart { line: u32 },
    UnknownMacroReferenceIsNotAnError,
}

impl fmt::Display for PreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreError::LineTooLong { line } => write!(f, "{}: line exceeds {} characters", line, MAX_LINE_LEN),
            PreError::InvalidMacroName { line, name } => write!(f, "{}: '{}' is not a valid macro name", line, name),
            PreError::DuplicateMacroName { line, name } => write!(f, "{}: macro '{}' already defined", line, name),
            PreError::NestedMacroDefinition { line } => write!(f, "{}: macro definitions cannot be nested", line),
            PreError::UnterminatedMacro { line } => write!(f, "{}: 'mcro' without matching 'mcroend'", line),
            PreError::EndMacrWithoutStart { line } => write!(f, "{}: 'mcroend' without matching 'mcro'", line),
            PreError::UnknownMacroReferenceIsNotAnError => write!(f, "internal: not a real error"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InsideMacro,
}

struct MacroDef {
    name: String,
    body: Vec<String>,
}

/// Expand every `mcro`/`mcroend` block in `source`, recording macro names
/// in `names` so labels can't later collide with them. Returns the fully
/// expanded text (what gets written to the `.am` file).
pub fn preprocess(source: &str, names: &mut NameSet) -> Result<String, PreError> {
    let mut macros: Vec<MacroDef> = Vec::new();
    let mut state = State::Outside;
    let mut current: Option<MacroDef> = None;
    let mut output = String::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        if raw_line.len() > MAX_LINE_LEN {
            return Err(PreError::LineTooLong { line: line_no });
        }
        let trimmed = raw_line.trim();

        match state {
            State::Outside => {
                if let Some(rest) = trimmed.strip_prefix("mcro") {
                    if !trimmed.starts_with("mcro ") && trimmed != "mcro" {
                        // a label or identifier that merely starts with "mcro"
                        output.push_str(raw_line);
                        output.push('\n');
                        continue;
                    }
                    let name = rest.trim().split_whitespace().next().unwrap_or("").to_string();
                    if !is_valid_macro_name(&name) {
                        return Err(PreError::InvalidMacroName { line: line_no, name });
                    }
                    if !names.add(&name) {
                        return Err(PreError::DuplicateMacroName { line: line_no, name });
                    }
                    current = Some(MacroDef { name, body: Vec::new() });
                    state = State::InsideMacro;
                } else if trimmed == "mcroend" || trimmed.starts_with("mcroend ") {
                    return Err(PreError::EndMacrWithoutStart { line: line_no });
                } else if let Some(invocation) = lookup_macro_invocation(trimmed, &macros) {
                    for body_line in &invocation.body {
                        output.push_str(body_line);
                        output.push('\n');
                    }
                } else {
                    output.push_str(raw_line);
                    output.push('\n');
                }
            }
            State::InsideMacro => {
                if trimmed == "mcroend" {
                    macros.push(current.take().expect("state invariant: InsideMacro implies current.is_some()"));
                    state = State::Outside;
                } else if trimmed.starts_with("mcro ") || trimmed == "mcro" {
                    return Err(PreError::NestedMacroDefinition { line: line_no });
                } else {
                    current.as_mut().unwrap().body.push(raw_line.to_string());
                }
            }
        }
    }

    if state == State::InsideMacro {
        return Err(PreError::UnterminatedMacro {
            line: source.lines().count() as u32,
        });
    }

    Ok(output)
}

fn lookup_macro_invocation<'a>(trimmed: &str, macros: &'a [MacroDef]) -> Option<&'a MacroDef> {
    let name = trimmed.split_whitespace().next()?;
    macros.iter().find(|m| m.name == name)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn expands_simple_macro_invocation() {
        let src = "mcro m1\nmov r1, r2\nmcroend\nm1\nstop\n";
        let mut names = NameSet::new();
        let expanded = preprocess(src, &mut names).unwrap();
        assert_eq!(expanded, "mov r1, r2\nstop\n");
    }

    #[test]
    fn rejects_duplicate_macro_names() {
        let src = "mcro m1\nstop\nmcroend\nmcro m1\nstop\nmcroend\n";
        let mut names = NameSet::new();
        let err = preprocess(src, &mut names).unwrap_err();
        assert_eq!(
            err,
            PreError::DuplicateMacroName {
                line: 4,
                name: "m1".to_string()
            }
        );
    }

    #[test]
    fn rejects_invalid_macro_name() {
        let src = "mcro mov\nstop\nmcroend\n";
        let mut names = NameSet::new();
        assert!(matches!(preprocess(src, &mut names), Err(PreError::InvalidMacroName { .. })));
    }

    #[test]
    fn unterminated_macro_is_fatal() {
        let src = "mcro m1\nstop\n";
        let mut names = NameSet::new();
        assert!(matches!(preprocess(src, &mut names), Err(PreError::UnterminatedMacro { .. })));
    }

    #[test]
    fn line_too_long_is_fatal() {
        let long_line = "a".repeat(MAX_LINE_LEN + 1);
        let mut names = NameSet::new();
        assert_eq!(
            preprocess(&long_line, &mut names),
            Err(PreError::LineTooLong { line: 1 })
        );
    }

    #[test]
    fn lines_outside_any_macro_pass_through_unchanged() {
        let src = "LOOP: mov r1, r2\nstop\n";
        let mut names = NameSet::new();
        assert_eq!(preprocess(src, &mut names).unwrap(), src);
    }
}
