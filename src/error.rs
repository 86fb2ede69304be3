use std::io;
use std::num::ParseIntError;
use std::path::Path;

use miette::{miette, LabeledSpan, Report, Severity, SourceSpan};

use crate::config::{LevelParams, MAX_LEVEL_WORDS};
use crate::state::MEM_SIZE;

// File errors

pub fn file_unreadable(path: &Path, e: io::Error) -> Report {
    miette!(
        severity = Severity::Error,
        code = "file::unreadable",
        help = "check that the path exists and points to a machine code file",
        "Can't open file {}: {e}",
        path.display(),
    )
}

// Program image errors

pub fn load_unparseable(span: SourceSpan, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::bad_line",
        help = "every line must look like `ram[0] = 16'b0010000010000101;`",
        labels = vec![LabeledSpan::at(span, "unrecognised line")],
        "Can't parse line",
    )
    .with_source_code(src.to_string())
}

pub fn load_out_of_sequence(span: SourceSpan, src: &str, addr: &str, expected: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::sequence",
        help = "addresses must start at 0 and increase by one on every line",
        labels = vec![LabeledSpan::at(span, format!("expected address {expected}"))],
        "Memory addresses encountered out of sequence: {addr}",
    )
    .with_source_code(src.to_string())
}

pub fn load_too_big(span: SourceSpan, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::overflow",
        help = format!("memory holds {MEM_SIZE} words"),
        labels = vec![LabeledSpan::at(span, "address past end of memory")],
        "Program too big for memory",
    )
    .with_source_code(src.to_string())
}

// Cache configuration errors

pub fn config_bad_count(count: usize, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "config::count",
        help = "use size,associativity,blocksize for one cache or two such triples for two caches",
        labels = vec![LabeledSpan::at(0..src.len(), format!("{count} values"))],
        "Invalid cache config",
    )
    .with_source_code(src.to_string())
}

pub fn config_bad_int(span: SourceSpan, src: &str, e: ParseIntError) -> Report {
    miette!(
        severity = Severity::Error,
        code = "config::bad_int",
        help = "cache parameters are non-negative decimal integers",
        labels = vec![LabeledSpan::at(span, "not an integer")],
        "Invalid cache config: {e}",
    )
    .with_source_code(src.to_string())
}

pub fn config_zero(span: SourceSpan, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "config::zero",
        help = "size, associativity and blocksize must all be at least 1",
        labels = vec![LabeledSpan::at(span, "zero")],
        "Invalid cache config",
    )
    .with_source_code(src.to_string())
}

pub fn config_no_rows(span: SourceSpan, src: &str, name: &str, params: LevelParams) -> Report {
    miette!(
        severity = Severity::Error,
        code = "config::rows",
        help = format!(
            "size must be at least associativity * blocksize = {} * {}",
            params.associativity, params.block_size
        ),
        labels = vec![LabeledSpan::at(span, "no rows")],
        "Invalid cache config: cache {name} has no rows",
    )
    .with_source_code(src.to_string())
}

pub fn config_too_large(span: SourceSpan, src: &str, name: &str, params: LevelParams) -> Report {
    miette!(
        severity = Severity::Error,
        code = "config::size",
        help = format!("a cache level holds at most {MAX_LEVEL_WORDS} words"),
        labels = vec![LabeledSpan::at(span, "too large")],
        "Invalid cache config: cache {name} has size {}",
        params.size,
    )
    .with_source_code(src.to_string())
}
