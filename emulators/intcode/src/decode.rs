//! Instruction decoding: operation code, per-parameter addressing modes and
//! raw operand words, unpacked from the memory at the instruction pointer.

use crate::machine::{Error, Result};
use crate::memory::Bus;
use std::fmt;

/// The nine supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Multiply,
    Input,
    Output,
    JumpIfTrue,
    JumpIfFalse,
    LessThan,
    Equals,
    Halt,
}

impl Opcode {
    pub const ALL: [Opcode; 9] = [
        Opcode::Add,
        Opcode::Multiply,
        Opcode::Input,
        Opcode::Output,
        Opcode::JumpIfTrue,
        Opcode::JumpIfFalse,
        Opcode::LessThan,
        Opcode::Equals,
        Opcode::Halt,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }

    pub fn code(self) -> i64 {
        match self {
            Opcode::Add => 1,
            Opcode::Multiply => 2,
            Opcode::Input => 3,
            Opcode::Output => 4,
            Opcode::JumpIfTrue => 5,
            Opcode::JumpIfFalse => 6,
            Opcode::LessThan => 7,
            Opcode::Equals => 8,
            Opcode::Halt => 99,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Multiply => "mul",
            Opcode::Input => "in",
            Opcode::Output => "out",
            Opcode::JumpIfTrue => "jnz",
            Opcode::JumpIfFalse => "jz",
            Opcode::LessThan => "lt",
            Opcode::Equals => "eq",
            Opcode::Halt => "halt",
        }
    }

    /// Number of operand words following the opcode word.
    pub fn param_count(self) -> usize {
        match self {
            Opcode::Add | Opcode::Multiply | Opcode::LessThan | Opcode::Equals => 3,
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => 2,
            Opcode::Input | Opcode::Output => 1,
            Opcode::Halt => 0,
        }
    }

    /// Encoded length in words, opcode word included.
    pub fn encoded_len(self) -> usize {
        1 + self.param_count()
    }
}

/// Addressing mode of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamMode {
    /// The operand word is an address; the operand is the cell it names.
    #[default]
    Position,
    /// The operand word is the operand.
    Immediate,
}

impl ParamMode {
    pub fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            0 => Some(ParamMode::Position),
            1 => Some(ParamMode::Immediate),
            _ => None,
        }
    }
}

/// A read operand: the raw word stored after the opcode plus its mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub value: i64,
    pub mode: ParamMode,
}

impl Param {
    pub fn position(value: i64) -> Self {
        Self {
            value,
            mode: ParamMode::Position,
        }
    }

    pub fn immediate(value: i64) -> Self {
        Self {
            value,
            mode: ParamMode::Immediate,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ParamMode::Position => write!(f, "{}", self.value),
            ParamMode::Immediate => write!(f, "#{}", self.value),
        }
    }
}

/// A fully decoded instruction. Destinations are plain addresses: their mode
/// digit is validated during decoding and otherwise ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Add { a: Param, b: Param, dest: i64 },
    Multiply { a: Param, b: Param, dest: i64 },
    Input { dest: i64 },
    Output { value: Param },
    JumpIfTrue { cond: Param, target: Param },
    JumpIfFalse { cond: Param, target: Param },
    LessThan { a: Param, b: Param, dest: i64 },
    Equals { a: Param, b: Param, dest: i64 },
    Halt,
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Add { .. } => Opcode::Add,
            Instruction::Multiply { .. } => Opcode::Multiply,
            Instruction::Input { .. } => Opcode::Input,
            Instruction::Output { .. } => Opcode::Output,
            Instruction::JumpIfTrue { .. } => Opcode::JumpIfTrue,
            Instruction::JumpIfFalse { .. } => Opcode::JumpIfFalse,
            Instruction::LessThan { .. } => Opcode::LessThan,
            Instruction::Equals { .. } => Opcode::Equals,
            Instruction::Halt => Opcode::Halt,
        }
    }

    pub fn encoded_len(&self) -> usize {
        self.opcode().encoded_len()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.opcode().mnemonic();
        match self {
            Instruction::Add { a, b, dest }
            | Instruction::Multiply { a, b, dest }
            | Instruction::LessThan { a, b, dest }
            | Instruction::Equals { a, b, dest } => write!(f, "{name} {a}, {b}, [{dest}]"),
            Instruction::Input { dest } => write!(f, "{name} [{dest}]"),
            Instruction::Output { value } => write!(f, "{name} {value}"),
            Instruction::JumpIfTrue { cond, target } | Instruction::JumpIfFalse { cond, target } => {
                write!(f, "{name} {cond}, {target}")
            }
            Instruction::Halt => f.write_str(name),
        }
    }
}

/// Split an opcode word into its operation and the modes of its parameters.
///
/// Mode digits beyond the operation's parameter count are ignored; missing
/// digits default to [`ParamMode::Position`].
pub fn split_opcode(word: i64, ip: usize) -> Result<(Opcode, Vec<ParamMode>)> {
    let code = word % 100;
    let opcode = Some(code)
        .filter(|_| word >= 0)
        .and_then(Opcode::from_code)
        .ok_or(Error::UnknownOpcode { ip, code, word })?;

    let mut digits = word / 100;
    let mut modes = Vec::with_capacity(opcode.param_count());
    for slot in 0..opcode.param_count() {
        let digit = digits % 10;
        digits /= 10;
        let mode = ParamMode::from_digit(digit).ok_or(Error::InvalidMode {
            ip,
            code,
            param: slot + 1,
            mode: digit,
        })?;
        modes.push(mode);
    }
    Ok((opcode, modes))
}

/// Decode the instruction starting at `ip`.
pub fn decode<B: Bus>(bus: &B, ip: usize) -> Result<Instruction> {
    let fetch = |address: usize| {
        let address = address as i64;
        bus.load(address).ok_or(Error::AddressOutOfRange {
            ip,
            address,
            len: bus.len(),
        })
    };

    let word = fetch(ip)?;
    let (opcode, modes) = split_opcode(word, ip)?;
    let mut raw = Vec::with_capacity(modes.len());
    for slot in 0..modes.len() {
        raw.push(fetch(ip + 1 + slot)?);
    }
    let param = |slot: usize| Param {
        value: raw[slot],
        mode: modes[slot],
    };

    let instr = match opcode {
        Opcode::Add => Instruction::Add {
            a: param(0),
            b: param(1),
            dest: raw[2],
        },
        Opcode::Multiply => Instruction::Multiply {
            a: param(0),
            b: param(1),
            dest: raw[2],
        },
        Opcode::Input => Instruction::Input { dest: raw[0] },
        Opcode::Output => Instruction::Output { value: param(0) },
        Opcode::JumpIfTrue => Instruction::JumpIfTrue {
            cond: param(0),
            target: param(1),
        },
        Opcode::JumpIfFalse => Instruction::JumpIfFalse {
            cond: param(0),
            target: param(1),
        },
        Opcode::LessThan => Instruction::LessThan {
            a: param(0),
            b: param(1),
            dest: raw[2],
        },
        Opcode::Equals => Instruction::Equals {
            a: param(0),
            b: param(1),
            dest: raw[2],
        },
        Opcode::Halt => Instruction::Halt,
    };
    Ok(instr)
}
