//! Word packer: builds 10-bit machine words from opcode, addressing modes,
//! registers, and ARE tags. Pure functions, no state — grounded in
//! `isa.h`/`isa.c`. Pass 1 sizing and pass 2 emission both rely on the same
//! shift/mask constants here, which is what keeps them from drifting apart.

use crate::defaults::WORD_MASK;
use crate::encoding::AddrMode;

const OP_SHIFT: u16 = 6;
const SRC_SHIFT: u16 = 4;
const DST_SHIFT: u16 = 2;

const ARE_A: u16 = 0b00;
const ARE_E: u16 = 0b01;
const ARE_R: u16 = 0b10;

const FIELD8_SHIFT: u16 = 2;
const REG_SRC_SHIFT: u16 = 6;
const REG_DST_SHIFT: u16 = 2;

/// Mode codes used in the first instruction word's `src_mode`/`dst_mode`
/// fields (opcode[9:6] | src_mode[5:4] | dst_mode[3:2] | ARE[1:0]).
pub fn mode_code(mode: AddrMode) -> u16 {
    match mode {
        AddrMode::Immediate => 0,
        AddrMode::Direct => 1,
        AddrMode::Matrix => 2,
        AddrMode::Register => 3,
    }
}

/// First instruction word. `src_mode`/`dst_mode` are `None` when that side
/// has no operand (e.g. zero- or one-operand instructions).
pub fn first_word(opcode: u8, src_mode: Option<AddrMode>, dst_mode: Option<AddrMode>) -> u16 {
    let src = src_mode.map(mode_code).unwrap_or(0);
    let dst = dst_mode.map(mode_code).unwrap_or(0);
    let w = ((opcode as u16) << OP_SHIFT) | (src << SRC_SHIFT) | (dst << DST_SHIFT) | ARE_A;
    w & WORD_MASK
}

/// Extra word for an immediate operand: 8-bit payload, ARE=A. The payload
/// is masked to 8 bits (matching `check_fit8`'s "masked" behavior); callers
/// are responsible for emitting the out-of-range warning separately.
pub fn word_immediate(v: i64) -> u16 {
    let payload = (v as i32 as u32 & 0xFF) as u16;
    ((payload << FIELD8_SHIFT) | ARE_A) & WORD_MASK
}

/// Extra word for a locally-defined relocatable address: 8-bit payload,
/// ARE=R.
pub fn word_relocatable(addr: u32) -> u16 {
    let payload = (addr & 0xFF) as u16;
    ((payload << FIELD8_SHIFT) | ARE_R) & WORD_MASK
}

/// Extra word for an external reference: payload is conventionally zero
/// (the linker fills it in), ARE=E.
pub fn word_extern() -> u16 {
    ARE_E & WORD_MASK
}

/// Register-pair word: `src` in bits [9:6], `dst` in bits [5:2], ARE=A.
/// Used both for packed register-register operands and for matrix row/col
/// indices.
pub fn word_regs_pair(src_reg: u8, dst_reg: u8) -> u16 {
    let w = ((src_reg as u16) << REG_SRC_SHIFT) | ((dst_reg as u16) << REG_DST_SHIFT) | ARE_A;
    w & WORD_MASK
}

/// Register word when only the source side carries a register operand.
pub fn word_reg_src(reg: u8) -> u16 {
    word_regs_pair(reg, 0)
}

/// Register word when only the destination side carries a register
/// operand.
pub fn word_reg_dst(reg: u8) -> u16 {
    word_regs_pair(0, reg)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scenario_a_mov_reg_reg_first_word() {
        // mov r3, r5 -> opcode=0, src=REGISTER, dst=REGISTER, ARE=A
        let w = first_word(0, Some(AddrMode::Register), Some(AddrMode::Register));
        assert_eq!(w, 0x03C);
    }

    #[test]
    fn scenario_a_mov_reg_reg_pair_word() {
        let w = word_regs_pair(3, 5);
        assert_eq!(w, 0x0D4);
    }

    #[test]
    fn scenario_a_stop_first_word() {
        let w = first_word(15, None, None);
        assert_eq!(w, 0x3C0);
    }

    #[test]
    fn extern_word_is_are_e() {
        assert_eq!(word_extern() & 0b11, 0b01);
    }

    #[test]
    fn relocatable_word_is_are_r() {
        assert_eq!(word_relocatable(103) & 0b11, 0b10);
    }

    #[test]
    fn immediate_word_masks_to_eight_bits() {
        assert_eq!(word_immediate(-1), word_immediate(255));
    }

    #[test]
    fn words_are_always_within_ten_bits() {
        assert!(first_word(255, Some(AddrMode::Matrix), Some(AddrMode::Matrix)) <= WORD_MASK);
        assert!(word_immediate(i64::MAX) <= WORD_MASK);
        assert!(word_regs_pair(255, 255) <= WORD_MASK);
    }
}
