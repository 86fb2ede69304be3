use std::fmt;

use crate::symbol::Register;

/// Primary opcodes, held in the top three bits of every instruction word.
mod opcode {
    pub const REG: u16 = 0b000;
    pub const ADDI: u16 = 0b001;
    pub const J: u16 = 0b010;
    pub const JAL: u16 = 0b011;
    pub const LW: u16 = 0b100;
    pub const SW: u16 = 0b101;
    pub const JEQ: u16 = 0b110;
    pub const SLTI: u16 = 0b111;
}

/// Function codes in the low four bits of opcode 0.
mod func {
    pub const ADD: u16 = 0x0;
    pub const SUB: u16 = 0x1;
    pub const OR: u16 = 0x2;
    pub const AND: u16 = 0x3;
    pub const SLT: u16 = 0x4;
    pub const JR: u16 = 0x8;
}

const IMM7_MASK: u16 = 0x7F;
const IMM13_MASK: u16 = 0x1FFF;

/// One decoded E20 instruction.
///
/// Seven-bit immediates are stored already sign-extended. Thirteen-bit jump targets are
/// unsigned absolute addresses.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Instruction {
    /// `dst = src_a + src_b`
    Add {
        src_a: Register,
        src_b: Register,
        dst: Register,
    },
    /// `dst = src_a - src_b`
    Sub {
        src_a: Register,
        src_b: Register,
        dst: Register,
    },
    /// `dst = src_a | src_b`
    Or {
        src_a: Register,
        src_b: Register,
        dst: Register,
    },
    /// `dst = src_a & src_b`
    And {
        src_a: Register,
        src_b: Register,
        dst: Register,
    },
    /// `dst = src_a < src_b`, unsigned
    Slt {
        src_a: Register,
        src_b: Register,
        dst: Register,
    },
    /// Jump to the address held in `src`
    Jr { src: Register },
    /// `dst = src < imm`, unsigned against the sign-extended immediate
    Slti {
        src: Register,
        dst: Register,
        imm: i16,
    },
    /// Load the word at `base + imm` into `dst`
    Lw {
        base: Register,
        dst: Register,
        imm: i16,
    },
    /// Store `src` to the word at `base + imm`
    Sw {
        base: Register,
        src: Register,
        imm: i16,
    },
    /// Branch `imm` words past the next instruction when `src_a == src_b`
    Jeq {
        src_a: Register,
        src_b: Register,
        imm: i16,
    },
    /// `dst = src + imm`
    Addi {
        src: Register,
        dst: Register,
        imm: i16,
    },
    /// Absolute jump. A jump to its own address is `halt`.
    J { target: u16 },
    /// Absolute jump, linking the return address into `$7`
    Jal { target: u16 },
}

/// A word whose opcode and function code name no instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct InvalidWord(pub u16);

impl std::error::Error for InvalidWord {}

impl fmt::Display for InvalidWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid instruction word {:#018b}", self.0)
    }
}

/// Sign extend the low `bits` of `val` to a full 16-bit two's complement word.
#[inline]
pub(crate) fn s_ext(val: u16, bits: u32) -> u16 {
    debug_assert!(bits > 0 && bits < 16);
    let sign = val & (1u16 << (bits - 1));
    let magnitude = val & ((1u16 << bits) - 1);
    // Negative input sets the sign bit and everything above it
    let sign_extension = (!sign).wrapping_add(1);
    magnitude | sign_extension
}

#[inline]
fn imm7(word: u16) -> i16 {
    s_ext(word & IMM7_MASK, 7) as i16
}

#[inline]
fn field(word: u16, shift: u32) -> Register {
    Register::from_bits(word >> shift)
}

impl TryFrom<u16> for Instruction {
    type Error = InvalidWord;

    fn try_from(word: u16) -> Result<Self, Self::Error> {
        use Instruction::*;

        let src_a = field(word, 10);
        let src_b = field(word, 7);
        let instr = match word >> 13 {
            opcode::REG => {
                let dst = field(word, 4);
                match word & 0xF {
                    func::ADD => Add { src_a, src_b, dst },
                    func::SUB => Sub { src_a, src_b, dst },
                    func::OR => Or { src_a, src_b, dst },
                    func::AND => And { src_a, src_b, dst },
                    func::SLT => Slt { src_a, src_b, dst },
                    func::JR => Jr { src: src_a },
                    _ => return Err(InvalidWord(word)),
                }
            }
            opcode::ADDI => Addi {
                src: src_a,
                dst: src_b,
                imm: imm7(word),
            },
            opcode::J => J {
                target: word & IMM13_MASK,
            },
            opcode::JAL => Jal {
                target: word & IMM13_MASK,
            },
            opcode::LW => Lw {
                base: src_a,
                dst: src_b,
                imm: imm7(word),
            },
            opcode::SW => Sw {
                base: src_a,
                src: src_b,
                imm: imm7(word),
            },
            opcode::JEQ => Jeq {
                src_a,
                src_b,
                imm: imm7(word),
            },
            opcode::SLTI => Slti {
                src: src_a,
                dst: src_b,
                imm: imm7(word),
            },
            // Opcode is three bits wide
            _ => unreachable!(),
        };
        Ok(instr)
    }
}

impl Instruction {
    /// Decode a raw memory word.
    pub fn decode(word: u16) -> Result<Instruction, InvalidWord> {
        Instruction::try_from(word)
    }

    /// Binary form of the instruction. Fields are truncated to their encoded widths.
    pub fn encode(&self) -> u16 {
        use Instruction::*;

        fn reg_type(a: Register, b: Register, dst: Register, func: u16) -> u16 {
            (opcode::REG << 13) | (a.bits() << 10) | (b.bits() << 7) | (dst.bits() << 4) | func
        }
        fn imm_type(op: u16, a: Register, b: Register, imm: i16) -> u16 {
            (op << 13) | (a.bits() << 10) | (b.bits() << 7) | (imm as u16 & IMM7_MASK)
        }

        match *self {
            Add { src_a, src_b, dst } => reg_type(src_a, src_b, dst, func::ADD),
            Sub { src_a, src_b, dst } => reg_type(src_a, src_b, dst, func::SUB),
            Or { src_a, src_b, dst } => reg_type(src_a, src_b, dst, func::OR),
            And { src_a, src_b, dst } => reg_type(src_a, src_b, dst, func::AND),
            Slt { src_a, src_b, dst } => reg_type(src_a, src_b, dst, func::SLT),
            Jr { src } => reg_type(src, Register::R0, Register::R0, func::JR),
            Slti { src, dst, imm } => imm_type(opcode::SLTI, src, dst, imm),
            Lw { base, dst, imm } => imm_type(opcode::LW, base, dst, imm),
            Sw { base, src, imm } => imm_type(opcode::SW, base, src, imm),
            Jeq { src_a, src_b, imm } => imm_type(opcode::JEQ, src_a, src_b, imm),
            Addi { src, dst, imm } => imm_type(opcode::ADDI, src, dst, imm),
            J { target } => (opcode::J << 13) | (target & IMM13_MASK),
            Jal { target } => (opcode::JAL << 13) | (target & IMM13_MASK),
        }
    }

    /// The encoded form of `halt` placed at `addr`: a jump to itself.
    pub fn halt_at(addr: u16) -> Instruction {
        Instruction::J {
            target: addr & IMM13_MASK,
        }
    }

    /// Whether this instruction halts the machine when executed at `pc`.
    pub fn is_halt_at(&self, pc: u16) -> bool {
        matches!(*self, Instruction::J { target } if target == pc)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Add { src_a, src_b, dst } => write!(f, "add {dst},{src_a},{src_b}"),
            Sub { src_a, src_b, dst } => write!(f, "sub {dst},{src_a},{src_b}"),
            Or { src_a, src_b, dst } => write!(f, "or {dst},{src_a},{src_b}"),
            And { src_a, src_b, dst } => write!(f, "and {dst},{src_a},{src_b}"),
            Slt { src_a, src_b, dst } => write!(f, "slt {dst},{src_a},{src_b}"),
            Jr { src } => write!(f, "jr {src}"),
            Slti { src, dst, imm } => write!(f, "slti {dst},{src},{imm}"),
            Lw { base, dst, imm } => write!(f, "lw {dst},{imm}({base})"),
            Sw { base, src, imm } => write!(f, "sw {src},{imm}({base})"),
            Jeq { src_a, src_b, imm } => write!(f, "jeq {src_a},{src_b},{imm}"),
            Addi { src, dst, imm } => write!(f, "addi {dst},{src},{imm}"),
            J { target } => write!(f, "j {target}"),
            Jal { target } => write!(f, "jal {target}"),
        }
    }
}
