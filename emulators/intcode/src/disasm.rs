//! Linear disassembly for inspecting programs.
//!
//! Code and data share one address space, so this is best effort: every word
//! that does not decode is listed as `data` and the walk resumes at the next
//! word.

use crate::decode::decode;
use crate::memory::Memory;
use crate::program::Program;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub address: usize,
    pub words: Vec<i64>,
    pub text: String,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = self
            .words
            .iter()
            .map(|word| word.to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{:>5}: {:<24} {}", self.address, raw, self.text)
    }
}

pub fn disassemble(program: &Program) -> Vec<Line> {
    let memory = Memory::from_program(program);
    let words = program.words();
    let mut lines = Vec::new();
    let mut ip = 0;
    while ip < words.len() {
        let (len, text) = match decode(&memory, ip) {
            Ok(instr) => (instr.encoded_len(), instr.to_string()),
            Err(_) => (1, format!("data {}", words[ip])),
        };
        lines.push(Line {
            address: ip,
            words: words[ip..ip + len].to_vec(),
            text,
        });
        ip += len;
    }
    lines
}
