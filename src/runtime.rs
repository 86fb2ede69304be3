use crate::cache::Hierarchy;
use crate::config::Layout;
use crate::ops::{Instruction, InvalidWord};
use crate::output::{Diagnostic, Trace};
use crate::state::{MachineState, ADDR_MASK};
use crate::symbol::Register;

/// Whether the machine can still execute.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Status {
    #[default]
    Running,
    /// Reached a `j` to its own address.
    Halted,
}

/// What a single call to [`Simulator::step`] did.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
    Executed(Instruction),
    /// The machine is halted. Nothing changed.
    Halted,
    /// The word at the program counter is not an instruction. Nothing changed.
    Invalid(InvalidWord),
}

/// Represents a complete simulation: machine state, data caches and the trace sink.
pub struct Simulator<T: Trace> {
    state: MachineState,
    /// `None` when running without any cache
    caches: Option<Hierarchy>,
    trace: T,
    status: Status,
    /// Instructions executed, including the final halt
    steps: u64,
}

impl<T: Trace> Simulator<T> {
    pub fn new(state: MachineState, layout: Option<&Layout>, trace: T) -> Self {
        Simulator {
            state,
            caches: layout.map(Hierarchy::new),
            trace,
            status: Status::Running,
            steps: 0,
        }
    }

    /// Execute until halted. Returns the number of instructions executed.
    ///
    /// There is no step limit: a program that never halts keeps this running forever, and so does
    /// an invalid instruction, which leaves the program counter in place.
    pub fn run(&mut self) -> u64 {
        while self.status == Status::Running {
            let _ = self.step();
        }
        tracing::info!(steps = self.steps, pc = self.state.pc(), "halted");
        self.steps
    }

    /// Fetch, decode and execute one instruction.
    pub fn step(&mut self) -> Step {
        if self.status == Status::Halted {
            return Step::Halted;
        }

        let pc = self.state.pc();
        let word = self.state.fetch();
        let instr = match Instruction::decode(word) {
            Ok(instr) => instr,
            Err(invalid) => {
                tracing::debug!(pc, word, "invalid instruction");
                self.trace
                    .diagnostic(Diagnostic::InvalidInstruction { pc, word });
                return Step::Invalid(invalid);
            }
        };
        tracing::trace!(pc, %instr, "execute");

        self.execute(instr);
        self.steps += 1;
        match self.status {
            Status::Running => Step::Executed(instr),
            Status::Halted => Step::Halted,
        }
    }

    fn execute(&mut self, instr: Instruction) {
        use Instruction::*;

        let pc = self.state.pc();
        match instr {
            Add { src_a, src_b, dst } => self.alu(src_a, src_b, dst, u16::wrapping_add),
            Sub { src_a, src_b, dst } => self.alu(src_a, src_b, dst, u16::wrapping_sub),
            Or { src_a, src_b, dst } => self.alu(src_a, src_b, dst, |a, b| a | b),
            And { src_a, src_b, dst } => self.alu(src_a, src_b, dst, |a, b| a & b),
            Slt { src_a, src_b, dst } => self.alu(src_a, src_b, dst, |a, b| (a < b) as u16),
            Jr { src } => self.state.set_pc(self.state.reg(src)),
            Slti { src, dst, imm } => {
                let val = (self.state.reg(src) < imm as u16) as u16;
                self.state.set_reg(dst, val);
                self.state.increment_pc(1);
            }
            Addi { src, dst, imm } => {
                let val = self.state.reg(src).wrapping_add(imm as u16);
                self.state.set_reg(dst, val);
                self.state.increment_pc(1);
            }
            Lw { base, dst, imm } => {
                let addr = self.effective_addr(base, imm);
                let val = match &mut self.caches {
                    Some(caches) => caches.load(self.state.memory(), pc, addr, &mut self.trace),
                    None => self.state.mem(addr),
                };
                self.state.set_reg(dst, val);
                self.state.increment_pc(1);
            }
            Sw { base, src, imm } => {
                let addr = self.effective_addr(base, imm);
                let val = self.state.reg(src);
                // Memory first, so the cache fill sees the new value
                self.state.set_mem(addr, val);
                if let Some(caches) = &mut self.caches {
                    caches.store(self.state.memory(), pc, addr, &mut self.trace);
                }
                self.state.increment_pc(1);
            }
            Jeq { src_a, src_b, imm } => {
                if self.state.reg(src_a) == self.state.reg(src_b) {
                    self.state.increment_pc(1 + imm as i32);
                } else {
                    self.state.increment_pc(1);
                }
            }
            J { target } => {
                if instr.is_halt_at(pc) {
                    self.status = Status::Halted;
                } else {
                    self.state.set_pc(target);
                }
            }
            Jal { target } => {
                self.state.set_reg(Register::R7, pc + 1);
                self.state.set_pc(target);
            }
        }
    }

    #[inline]
    fn alu(&mut self, src_a: Register, src_b: Register, dst: Register, op: fn(u16, u16) -> u16) {
        let val = op(self.state.reg(src_a), self.state.reg(src_b));
        self.state.set_reg(dst, val);
        self.state.increment_pc(1);
    }

    #[inline]
    fn effective_addr(&self, base: Register, imm: i16) -> u16 {
        self.state.reg(base).wrapping_add(imm as u16) & ADDR_MASK
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn caches(&self) -> Option<&Hierarchy> {
        self.caches.as_ref()
    }

    /// Select a cache level by number and mark one of its ways most recently used.
    pub fn touch_cache(&mut self, selector: u8, row: usize, way: usize) -> bool {
        match &mut self.caches {
            Some(caches) => caches.touch(selector, row, way, &mut self.trace),
            None => {
                self.trace.diagnostic(Diagnostic::InvalidCache { selector });
                false
            }
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_halted(&self) -> bool {
        self.status == Status::Halted
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn trace(&self) -> &T {
        &self.trace
    }

    pub fn into_trace(self) -> T {
        self.trace
    }

    /// Final machine state and the trace sink.
    pub fn into_parts(self) -> (MachineState, T) {
        (self.state, self.trace)
    }
}
