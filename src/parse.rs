use lazy_static::lazy_static;
use miette::{Result, SourceSpan};
use regex::Regex;

use crate::error;
use crate::state::MEM_SIZE;

lazy_static! {
    /// `ram[<address>] = 16'b<word>;` followed by anything
    static ref MACHINE_CODE: Regex = Regex::new(r"^ram\[(\d+)\] = 16'b([01]{16});.*$")
        .expect("machine code pattern is valid");
}

/// Parse a machine code listing into a memory image starting at address 0.
///
/// Addresses must appear in order with no gaps, and must fit in memory.
pub fn parse_image(src: &str) -> Result<Vec<u16>> {
    let mut image = Vec::new();
    let mut offset = 0;

    for raw_line in src.split_inclusive('\n') {
        let line = raw_line.strip_suffix('\n').unwrap_or(raw_line);
        let span = SourceSpan::from((offset, line.len()));
        offset += raw_line.len();

        let Some(caps) = MACHINE_CODE.captures(line) else {
            return Err(error::load_unparseable(span, src));
        };
        let (addr_text, addr_span) = match caps.get(1) {
            Some(m) => (m.as_str(), SourceSpan::from((span.offset() + m.start(), m.len()))),
            None => return Err(error::load_unparseable(span, src)),
        };

        let expected = image.len();
        match addr_text.parse::<usize>() {
            Ok(addr) if addr == expected => {}
            _ => {
                return Err(error::load_out_of_sequence(
                    addr_span, src, addr_text, expected,
                ))
            }
        }
        if expected >= MEM_SIZE {
            return Err(error::load_too_big(addr_span, src));
        }

        let word = u16::from_str_radix(&caps[2], 2)
            .map_err(|_| error::load_unparseable(span, src))?;
        image.push(word);
    }

    tracing::debug!(words = image.len(), "loaded program image");
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_listing() {
        let src = "ram[0] = 16'b0010000010000101;\t\t// addi $1,$0,5\n\
                   ram[1] = 16'b0100000000000001;\n";
        assert_eq!(parse_image(src).unwrap(), [0x2085, 0x4001]);
    }

    #[test]
    fn accepts_missing_final_newline_and_crlf() {
        let src = "ram[0] = 16'b0000000000000001;\r\nram[1] = 16'b1111111111111111;";
        assert_eq!(parse_image(src).unwrap(), [0x0001, 0xffff]);
        assert_eq!(parse_image("").unwrap(), Vec::<u16>::new());
    }

    #[test]
    fn rejects_malformed_lines() {
        for src in [
            "ram[0] = 16'b001;\n",
            "ram[0] = 16'b0010000010000102;\n",
            "ram[0]=16'b0010000010000101;\n",
            "ram[0] = 16'b0010000010000101\n",
            "ram[0] = 16'b0010000010000101;\n\nram[1] = 16'b0010000010000101;\n",
            "rom[0] = 16'b0010000010000101;\n",
        ] {
            assert!(parse_image(src).is_err(), "{src:?}");
        }
    }

    #[test]
    fn rejects_out_of_sequence() {
        let src = "ram[0] = 16'b0000000000000000;\nram[2] = 16'b0000000000000000;\n";
        let err = parse_image(src).unwrap_err();
        assert!(err.to_string().contains("out of sequence: 2"));

        let src = "ram[1] = 16'b0000000000000000;\n";
        assert!(parse_image(src).is_err());

        let src = "ram[99999999999999999999999] = 16'b0000000000000000;\n";
        assert!(parse_image(src).is_err());
    }

    #[test]
    fn rejects_program_past_end_of_memory() {
        let mut src = String::new();
        for addr in 0..=MEM_SIZE {
            src.push_str(&format!("ram[{addr}] = 16'b0000000000000000;\n"));
        }
        let err = parse_image(&src).unwrap_err();
        assert_eq!(err.to_string(), "Program too big for memory");

        let fits: String = src.lines().take(MEM_SIZE).map(|l| format!("{l}\n")).collect();
        assert_eq!(parse_image(&fits).unwrap().len(), MEM_SIZE);
    }
}
