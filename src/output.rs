use std::fmt;
use std::io::{self, Write};

use crate::cache::CacheEvent;
use crate::config::LevelParams;
use crate::state::{MachineState, MEM_SIZE};

/// Non-fatal conditions reported while the simulation keeps going.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Diagnostic {
    /// Fetched word does not decode. The program counter is left where it is.
    InvalidInstruction { pc: u16, word: u16 },
    /// A cache level was selected by a number that is not configured.
    InvalidCache { selector: u8 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInstruction { pc, .. } => write!(f, "invalid instruction at pc: {pc}"),
            Self::InvalidCache { .. } => write!(f, "Not a valid cache"),
        }
    }
}

/// Receives everything the simulator reports while it runs.
pub trait Trace {
    fn cache_event(&mut self, event: CacheEvent);
    fn diagnostic(&mut self, diagnostic: Diagnostic);
}

/// Keeps every report in memory, in order.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<CacheEvent>,
    pub diagnostics: Vec<Diagnostic>,
    /// Every report rendered as its output line
    pub lines: Vec<String>,
}

impl Trace for Recorder {
    fn cache_event(&mut self, event: CacheEvent) {
        self.lines.push(event.to_string());
        self.events.push(event);
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic) {
        self.lines.push(diagnostic.to_string());
        self.diagnostics.push(diagnostic);
    }
}

/// Writes one line per report.
///
/// The first write error stops all further output and is returned from [`Printer::finish`].
#[derive(Debug)]
pub struct Printer<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W) -> Self {
        Printer { out, error: None }
    }

    fn line(&mut self, line: impl fmt::Display) {
        if self.error.is_none() {
            if let Err(e) = writeln!(self.out, "{line}") {
                self.error = Some(e);
            }
        }
    }

    /// Flush and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> Trace for Printer<W> {
    fn cache_event(&mut self, event: CacheEvent) {
        self.line(event);
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic) {
        self.line(diagnostic);
    }
}

/// `Cache L1 has size 8, associativity 2, blocksize 2, rows 2`
pub fn write_config(f: &mut impl Write, name: &str, params: LevelParams) -> io::Result<()> {
    writeln!(
        f,
        "Cache {name} has size {}, associativity {}, blocksize {}, rows {}",
        params.size,
        params.associativity,
        params.block_size,
        params.rows()
    )
}

/// Dump the program counter, every register, and the first `words` words of memory as hex,
/// eight to a line.
pub fn write_final_state(f: &mut impl Write, state: &MachineState, words: usize) -> io::Result<()> {
    writeln!(f, "Final state:")?;
    writeln!(f, "\tpc={:>5}", state.pc())?;
    for (i, value) in state.registers().iter().enumerate() {
        writeln!(f, "\t${i}={value:>5}")?;
    }
    for row in state.memory()[..words.min(MEM_SIZE)].chunks(8) {
        for word in row {
            write!(f, "{word:04x} ")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{LevelName, Status};
    use crate::symbol::Register;

    #[test]
    fn config_line() {
        let mut out = Vec::new();
        write_config(&mut out, "L2", LevelParams::new(32, 4, 2)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Cache L2 has size 32, associativity 4, blocksize 2, rows 4\n"
        );
    }

    #[test]
    fn final_state_dump() {
        let mut state = MachineState::from_raw(&[0x2085, 0x4001, 0xffff]).unwrap();
        state.set_reg(Register::R1, 5);
        state.set_reg(Register::R7, 65535);
        state.set_pc(1);

        let mut out = Vec::new();
        write_final_state(&mut out, &state, 10).unwrap();
        let expected = "Final state:\n\
                        \tpc=    1\n\
                        \t$0=    0\n\
                        \t$1=    5\n\
                        \t$2=    0\n\
                        \t$3=    0\n\
                        \t$4=    0\n\
                        \t$5=    0\n\
                        \t$6=    0\n\
                        \t$7=65535\n\
                        2085 4001 ffff 0000 0000 0000 0000 0000 \n\
                        0000 0000 \n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn final_state_full_rows_have_no_extra_newline() {
        let state = MachineState::from_raw(&[]).unwrap();
        let mut out = Vec::new();
        write_final_state(&mut out, &state, 16).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("0000 \n0000 0000 0000 0000 0000 0000 0000 0000 \n"));
        assert_eq!(text.lines().count(), 1 + 9 + 2);
    }

    #[test]
    fn printer_writes_lines() {
        let mut printer = Printer::new(Vec::new());
        printer.cache_event(CacheEvent {
            level: LevelName::L1,
            status: Status::Hit,
            pc: 1,
            addr: 2,
            row: 0,
        });
        printer.diagnostic(Diagnostic::InvalidInstruction { pc: 4, word: 0x000f });
        printer.diagnostic(Diagnostic::InvalidCache { selector: 3 });
        let out = String::from_utf8(printer.finish().unwrap()).unwrap();
        assert_eq!(
            out,
            "L1 HIT   pc:    1\taddr:    2\trow:   0\n\
             invalid instruction at pc: 4\n\
             Not a valid cache\n"
        );
    }
}
