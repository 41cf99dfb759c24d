/*----------------------------------------------------------------------
  Lua 5.3 Instruction Format (32-bit)

  All instructions have an opcode in the first 6 bits.

        3 3 2 2 2 2 2 2 2 2 2 2 1 1 1 1 1 1 1 1 1 1 0 0 0 0 0 0 0 0 0 0
        1 0 9 8 7 6 5 4 3 2 1 0 9 8 7 6 5 4 3 2 1 0 9 8 7 6 5 4 3 2 1 0
  iABC        B(9)      |      C(9)       |     A(8)      |   Op(6)   |
  iABx               Bx(18)               |     A(8)      |   Op(6)   |
  iAsBx          sBx (signed)(18)         |     A(8)      |   Op(6)   |
  iAx                      Ax(26)                         |   Op(6)   |

  sBx is stored in excess K, where K = MAXARG_Bx >> 1.
  In iABC, a B or C value with bit 8 set (BITRK) names constant
  `value & 0xFF` instead of a register.
----------------------------------------------------------------------*/

use super::OpCode;

/// A single encoded Lua 5.3 instruction word
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Instruction(u32);

impl Instruction {
    #[inline(always)]
    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    #[inline(always)]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    // Size of each field
    pub const SIZE_OP: u32 = 6;
    pub const SIZE_A: u32 = 8;
    pub const SIZE_B: u32 = 9;
    pub const SIZE_C: u32 = 9;
    pub const SIZE_BX: u32 = Self::SIZE_C + Self::SIZE_B; // 18
    pub const SIZE_AX: u32 = Self::SIZE_BX + Self::SIZE_A; // 26

    // Position of each field
    pub const POS_OP: u32 = 0;
    pub const POS_A: u32 = Self::POS_OP + Self::SIZE_OP;
    pub const POS_C: u32 = Self::POS_A + Self::SIZE_A;
    pub const POS_B: u32 = Self::POS_C + Self::SIZE_C;
    pub const POS_BX: u32 = Self::POS_C;
    pub const POS_AX: u32 = Self::POS_A;

    // Maximum values
    pub const MAX_A: u32 = (1 << Self::SIZE_A) - 1;
    pub const MAX_B: u32 = (1 << Self::SIZE_B) - 1;
    pub const MAX_C: u32 = (1 << Self::SIZE_C) - 1;
    pub const MAX_BX: u32 = (1 << Self::SIZE_BX) - 1;
    pub const MAX_AX: u32 = (1 << Self::SIZE_AX) - 1;
    pub const OFFSET_SBX: i32 = (Self::MAX_BX >> 1) as i32; // 131071

    /// Bit marking a B/C operand as a constant index
    pub const BITRK: u32 = 1 << (Self::SIZE_B - 1);
    pub const MAXINDEXRK: u32 = Self::BITRK - 1;

    #[inline(always)]
    const fn mask1(n: u32, p: u32) -> u32 {
        (!((!0u32) << n)) << p
    }

    #[inline(always)]
    const fn get_arg(self, pos: u32, size: u32) -> u32 {
        (self.0 >> pos) & Self::mask1(size, 0)
    }

    /// Raw 6-bit opcode number, which may name no opcode at all
    #[inline(always)]
    pub const fn get_opcode_raw(self) -> u8 {
        self.get_arg(Self::POS_OP, Self::SIZE_OP) as u8
    }

    #[inline(always)]
    pub fn get_opcode(self) -> Option<OpCode> {
        OpCode::from_u8(self.get_opcode_raw())
    }

    #[inline(always)]
    pub const fn get_a(self) -> u32 {
        self.get_arg(Self::POS_A, Self::SIZE_A)
    }

    #[inline(always)]
    pub const fn get_b(self) -> u32 {
        self.get_arg(Self::POS_B, Self::SIZE_B)
    }

    #[inline(always)]
    pub const fn get_c(self) -> u32 {
        self.get_arg(Self::POS_C, Self::SIZE_C)
    }

    #[inline(always)]
    pub const fn get_bx(self) -> u32 {
        self.get_arg(Self::POS_BX, Self::SIZE_BX)
    }

    #[inline(always)]
    pub const fn get_sbx(self) -> i32 {
        self.get_bx() as i32 - Self::OFFSET_SBX
    }

    #[inline(always)]
    pub const fn get_ax(self) -> u32 {
        self.get_arg(Self::POS_AX, Self::SIZE_AX)
    }

    // ============ Encoding ============

    pub const fn create_abc(op: OpCode, a: u32, b: u32, c: u32) -> Self {
        Self(
            ((op as u32) << Self::POS_OP)
                | ((a & Self::MAX_A) << Self::POS_A)
                | ((b & Self::MAX_B) << Self::POS_B)
                | ((c & Self::MAX_C) << Self::POS_C),
        )
    }

    pub const fn create_abx(op: OpCode, a: u32, bx: u32) -> Self {
        Self(
            ((op as u32) << Self::POS_OP)
                | ((a & Self::MAX_A) << Self::POS_A)
                | ((bx & Self::MAX_BX) << Self::POS_BX),
        )
    }

    pub const fn create_asbx(op: OpCode, a: u32, sbx: i32) -> Self {
        Self::create_abx(op, a, (sbx + Self::OFFSET_SBX) as u32)
    }

    pub const fn create_ax(op: OpCode, ax: u32) -> Self {
        Self(((op as u32) << Self::POS_OP) | ((ax & Self::MAX_AX) << Self::POS_AX))
    }

    // ============ RK operands ============

    /// Does this B/C operand name a constant?
    #[inline(always)]
    pub const fn is_k(x: u32) -> bool {
        x & Self::BITRK != 0
    }

    /// Constant index carried by a B/C operand
    #[inline(always)]
    pub const fn rk_index(x: u32) -> u32 {
        x & Self::MAXINDEXRK
    }

    /// Encode constant index `k` as a B/C operand
    #[inline(always)]
    pub const fn rk_as_k(k: u32) -> u32 {
        k | Self::BITRK
    }
}

impl From<u32> for Instruction {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abc_layout() {
        let instr = Instruction::create_abc(OpCode::Add, 1, 0x1FF, 0x102);
        assert_eq!(instr.get_opcode(), Some(OpCode::Add));
        assert_eq!(instr.get_a(), 1);
        assert_eq!(instr.get_b(), 0x1FF);
        assert_eq!(instr.get_c(), 0x102);
        // B occupies the top nine bits, C the nine below it
        assert_eq!(instr.as_u32() >> 23, 0x1FF);
        assert_eq!((instr.as_u32() >> 14) & 0x1FF, 0x102);
        assert!(Instruction::is_k(instr.get_c()));
        assert_eq!(Instruction::rk_index(instr.get_c()), 2);
    }

    #[test]
    fn test_decode_known_word() {
        // LOADK 0 0 as emitted by luac
        let instr = Instruction::from_u32(0x0000_0001);
        assert_eq!(instr.get_opcode(), Some(OpCode::LoadK));
        assert_eq!(instr.get_a(), 0);
        assert_eq!(instr.get_bx(), 0);

        // RETURN 0 2
        let instr = Instruction::from_u32(0x0100_0026);
        assert_eq!(instr.get_opcode(), Some(OpCode::Return));
        assert_eq!(instr.get_a(), 0);
        assert_eq!(instr.get_b(), 2);
    }

    #[test]
    fn test_signed_bx() {
        let instr = Instruction::create_asbx(OpCode::Jmp, 0, -1);
        assert_eq!(instr.get_sbx(), -1);
        assert_eq!(instr.get_bx(), 131070);

        let instr = Instruction::create_asbx(OpCode::ForLoop, 3, 131072);
        assert_eq!(instr.get_sbx(), 131072);
        assert_eq!(instr.get_a(), 3);

        let instr = Instruction::create_asbx(OpCode::ForPrep, 0, -131071);
        assert_eq!(instr.get_bx(), 0);
    }

    #[test]
    fn test_ax() {
        let instr = Instruction::create_ax(OpCode::ExtraArg, Instruction::MAX_AX);
        assert_eq!(instr.get_opcode(), Some(OpCode::ExtraArg));
        assert_eq!(instr.get_ax(), (1 << 26) - 1);
    }

    #[test]
    fn test_unknown_opcode() {
        let instr = Instruction::from_u32(0x3F);
        assert_eq!(instr.get_opcode_raw(), 63);
        assert_eq!(instr.get_opcode(), None);
    }
}
