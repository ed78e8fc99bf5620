//! CLI entry point: `a10asm <base1> [<base2> ...]`. Each argument names a
//! source file without its `.as` suffix (the suffix is stripped if given
//! anyway). One bad file doesn't stop the others; the process exits
//! non-zero if any file failed.

use std::process::ExitCode;

use a10asm::{AssembleContext, AssembleError};

fn strip_as_suffix(arg: &str) -> &str {
    arg.strip_suffix(".as").unwrap_or(arg)
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: a10asm <base1> [<base2> ...]");
        return ExitCode::FAILURE;
    }

    let mut any_failed = false;
    for arg in &args {
        let base = strip_as_suffix(arg);
        let ctx = AssembleContext::new(base);
        if let Err(err) = ctx.process() {
            any_failed = true;
            match err {
                AssembleError::Diagnostics(diags) => diags.print(&format!("{}.as", base)),
                other => eprintln!("{}.as: {}", base, other),
            }
        }
    }

    if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
