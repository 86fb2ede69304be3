use std::fmt;

/// Represents the CPU registers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Register {
    /// Hard-wired to zero. Writes are discarded.
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    /// Link register, written by `jal`.
    R7,
}

impl Register {
    pub const ALL: [Register; 8] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
    ];

    /// Register selected by the low three bits of `bits`.
    pub fn from_bits(bits: u16) -> Register {
        Self::ALL[(bits & 0b111) as usize]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn bits(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bits_masks() {
        assert_eq!(Register::from_bits(0b101), Register::R5);
        assert_eq!(Register::from_bits(0b1111), Register::R7);
        assert_eq!(Register::from_bits(0b1000), Register::R0);
    }

    #[test]
    fn displays_with_dollar() {
        assert_eq!(Register::R2.to_string(), "$2");
        assert_eq!(Register::from_bits(7).to_string(), "$7");
    }
}
