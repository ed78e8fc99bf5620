//! Centralised project-wide constants: machine parameters and file
//! extensions in one place rather than scattered through the pipeline.

/// Maximum characters in a single source line (not counting the newline).
pub const MAX_LINE_LEN: usize = 80;

/// Maximum characters in a label or macro name.
pub const MAX_LABEL_LEN: usize = 31;

/// Our imaginary CPU uses 10-bit words.
pub const WORD_MASK: u16 = 0x3FF;

/// Address space: 0..255 inclusive.
pub const MEMORY_CAPACITY: u32 = 256;

/// Program code starts from address 100.
pub const IC_START: u32 = 100;

/// ISA never has more than two operands.
pub const MAX_OPERANDS: usize = 2;

/// Base-4 digit alphabet, in order 0..3.
pub const BASE4_DIGITS: [char; 4] = ['a', 'b', 'c', 'd'];

/// Every 10-bit word prints as exactly this many base-4 characters.
pub const BASE4_WORD_STRLEN: usize = 5;

pub const EXT_AS: &str = "as";
pub const EXT_AM: &str = "am";
pub const EXT_OB: &str = "ob";
pub const EXT_ENT: &str = "ent";
pub const EXT_EXT: &str = "ext";
