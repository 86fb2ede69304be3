use miette::{bail, Result};

use crate::symbol::Register;

/// The E20 addresses 8K words of memory.
pub const MEM_SIZE: usize = 1 << 13;

/// Mask that wraps any value into the address space.
pub const ADDR_MASK: u16 = (MEM_SIZE - 1) as u16;

pub type Memory = [u16; MEM_SIZE];

/// Architectural state of the machine: program counter, register file and memory.
#[derive(Clone)]
pub struct MachineState {
    /// Program text and data share this space.
    mem: Box<Memory>,
    /// Always below `MEM_SIZE`
    pc: u16,
    /// 8x 16-bit registers. `reg[0]` stays zero.
    reg: [u16; 8],
}

impl MachineState {
    /// Load a memory image starting at address 0. The rest of memory is zeroed.
    pub fn from_raw(raw: &[u16]) -> Result<MachineState> {
        if raw.len() > MEM_SIZE {
            bail!(
                "Program of {} words is too big for memory of {MEM_SIZE} words",
                raw.len()
            );
        }
        let mut mem = Box::new([0; MEM_SIZE]);
        mem[..raw.len()].copy_from_slice(raw);

        Ok(MachineState {
            mem,
            pc: 0,
            reg: [0; 8],
        })
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Move the program counter by `inc` words, wrapping in both directions.
    pub fn increment_pc(&mut self, inc: i32) {
        self.pc = (self.pc as i32 + inc).rem_euclid(MEM_SIZE as i32) as u16;
    }

    /// Set the program counter, wrapping values past the end of memory.
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc & ADDR_MASK;
    }

    pub fn reg(&self, reg: Register) -> u16 {
        self.reg[reg.index()]
    }

    /// Write a register. Writes to `$0` are discarded.
    pub fn set_reg(&mut self, reg: Register, value: u16) {
        if reg != Register::R0 {
            self.reg[reg.index()] = value;
        }
    }

    pub fn registers(&self) -> &[u16; 8] {
        &self.reg
    }

    pub fn mem(&self, addr: u16) -> u16 {
        self.mem[(addr & ADDR_MASK) as usize]
    }

    pub fn set_mem(&mut self, addr: u16, value: u16) {
        self.mem[(addr & ADDR_MASK) as usize] = value;
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Word at the program counter.
    pub fn fetch(&self) -> u16 {
        self.mem[self.pc as usize]
    }
}
