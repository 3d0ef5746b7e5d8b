//! The execution engine: run state, the fetch/decode/execute loop and the
//! fault taxonomy.

use crate::decode::{decode, Instruction, Param, ParamMode};
use crate::io::{Input, NoInput, Output};
use crate::memory::{Bus, Memory};
use crate::program::Program;
use thiserror::Error;
use tracing::{debug, trace, warn};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("token {index} is not an integer: {token:?}")]
    Parse { index: usize, token: String },
    #[error("unsupported operation code {code} (opcode word {word}) at ip {ip}")]
    UnknownOpcode { ip: usize, code: i64, word: i64 },
    #[error("invalid mode {mode} for parameter {param} of operation {code} at ip {ip}")]
    InvalidMode {
        ip: usize,
        code: i64,
        param: usize,
        mode: i64,
    },
    #[error("address {address} out of range (memory holds {len} cells) at ip {ip}")]
    AddressOutOfRange { ip: usize, address: i64, len: usize },
    #[error("input channel closed at ip {ip}")]
    InputClosed { ip: usize },
    #[error("output channel closed at ip {ip}")]
    OutputClosed { ip: usize },
    #[error("arithmetic overflow in operation {code} at ip {ip}")]
    Overflow { ip: usize, code: i64 },
    #[error("step limit of {limit} instructions exhausted")]
    StepLimit { limit: u64 },
}

/// Per-run state. Rebuilt from the program template by [`Machine::reset`].
#[derive(Debug, Clone, Default)]
pub struct State {
    pub memory: Memory,
    pub ip: usize,
    pub halted: bool,
    pub last_output: Option<i64>,
    pub outputs: Vec<i64>,
    pub steps: u64,
}

impl State {
    fn fresh(program: &Program) -> Self {
        Self {
            memory: Memory::from_program(program),
            ..Self::default()
        }
    }
}

/// Outcome of a single [`Machine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Executed(Instruction),
    /// The machine had already halted; nothing ran.
    Halted,
}

pub struct Machine<I = NoInput, O = ()> {
    program: Program,
    input: I,
    output: O,
    step_limit: Option<u64>,
    state: State,
}

impl Machine {
    /// Parse `source` and build a machine with no input and a discarding output.
    pub fn new(source: &str) -> Result<Self> {
        Ok(Self::from_program(Program::parse(source)?))
    }

    pub fn from_program(program: Program) -> Self {
        let state = State::fresh(&program);
        Self {
            program,
            input: NoInput,
            output: (),
            step_limit: None,
            state,
        }
    }
}

impl<I: Input, O: Output> Machine<I, O> {
    pub fn with_input<J: Input>(self, input: J) -> Machine<J, O> {
        Machine {
            program: self.program,
            input,
            output: self.output,
            step_limit: self.step_limit,
            state: self.state,
        }
    }

    pub fn with_output<P: Output>(self, output: P) -> Machine<I, P> {
        Machine {
            program: self.program,
            input: self.input,
            output,
            step_limit: self.step_limit,
            state: self.state,
        }
    }

    /// Bound the number of instructions a single run may execute.
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn memory(&self) -> &[i64] {
        self.state.memory.as_slice()
    }

    pub fn ip(&self) -> usize {
        self.state.ip
    }

    pub fn is_halted(&self) -> bool {
        self.state.halted
    }

    pub fn last_output(&self) -> Option<i64> {
        self.state.last_output
    }

    /// Every value emitted during the current run, in order.
    pub fn outputs(&self) -> &[i64] {
        &self.state.outputs
    }

    pub fn steps(&self) -> u64 {
        self.state.steps
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn into_ports(self) -> (I, O) {
        (self.input, self.output)
    }

    /// Discard the current run and start over from the program template.
    pub fn reset(&mut self) {
        self.state = State::fresh(&self.program);
    }

    /// Run from a fresh copy of the program until halt, returning the last
    /// output value, or `None` when the program never emitted one.
    pub fn run(&mut self) -> Result<Option<i64>> {
        self.reset();
        debug!(len = self.program.len(), "run start");
        while !self.state.halted {
            if let Err(err) = self.step() {
                warn!(ip = self.state.ip, steps = self.state.steps, %err, "run faulted");
                return Err(err);
            }
        }
        debug!(
            steps = self.state.steps,
            outputs = self.state.outputs.len(),
            last_output = ?self.state.last_output,
            "run halted"
        );
        Ok(self.state.last_output)
    }

    /// Execute exactly one instruction at the current pointer.
    pub fn step(&mut self) -> Result<Step> {
        if self.state.halted {
            return Ok(Step::Halted);
        }
        if let Some(limit) = self.step_limit {
            if self.state.steps >= limit {
                return Err(Error::StepLimit { limit });
            }
        }

        let ip = self.state.ip;
        let instr = decode(&self.state.memory, ip)?;
        trace!(ip, %instr, "exec");
        self.execute(ip, instr)?;
        self.state.steps += 1;
        Ok(Step::Executed(instr))
    }

    fn execute(&mut self, ip: usize, instr: Instruction) -> Result<()> {
        let code = instr.opcode().code();
        let next = ip + instr.encoded_len();
        match instr {
            Instruction::Add { a, b, dest } => {
                let sum = self
                    .read(ip, a)?
                    .checked_add(self.read(ip, b)?)
                    .ok_or(Error::Overflow { ip, code })?;
                self.write(ip, dest, sum)?;
                self.state.ip = next;
            }
            Instruction::Multiply { a, b, dest } => {
                let product = self
                    .read(ip, a)?
                    .checked_mul(self.read(ip, b)?)
                    .ok_or(Error::Overflow { ip, code })?;
                self.write(ip, dest, product)?;
                self.state.ip = next;
            }
            Instruction::Input { dest } => {
                let value = self
                    .input
                    .pull()
                    .map_err(|_| Error::InputClosed { ip })?;
                self.write(ip, dest, value)?;
                self.state.ip = next;
            }
            Instruction::Output { value } => {
                let value = self.read(ip, value)?;
                self.output
                    .push(value)
                    .map_err(|_| Error::OutputClosed { ip })?;
                debug!(ip, value, "output");
                self.state.last_output = Some(value);
                self.state.outputs.push(value);
                self.state.ip = next;
            }
            Instruction::JumpIfTrue { cond, target } => {
                self.state.ip = if self.read(ip, cond)? != 0 {
                    self.jump_target(ip, target)?
                } else {
                    next
                };
            }
            Instruction::JumpIfFalse { cond, target } => {
                self.state.ip = if self.read(ip, cond)? == 0 {
                    self.jump_target(ip, target)?
                } else {
                    next
                };
            }
            Instruction::LessThan { a, b, dest } => {
                let flag = self.read(ip, a)? < self.read(ip, b)?;
                self.write(ip, dest, flag as i64)?;
                self.state.ip = next;
            }
            Instruction::Equals { a, b, dest } => {
                let flag = self.read(ip, a)? == self.read(ip, b)?;
                self.write(ip, dest, flag as i64)?;
                self.state.ip = next;
            }
            Instruction::Halt => {
                self.state.halted = true;
            }
        }
        Ok(())
    }

    fn read(&self, ip: usize, param: Param) -> Result<i64> {
        match param.mode {
            ParamMode::Immediate => Ok(param.value),
            ParamMode::Position => self
                .state
                .memory
                .load(param.value)
                .ok_or_else(|| self.out_of_range(ip, param.value)),
        }
    }

    fn write(&mut self, ip: usize, address: i64, value: i64) -> Result<()> {
        match self.state.memory.store(address, value) {
            Some(()) => Ok(()),
            None => Err(self.out_of_range(ip, address)),
        }
    }

    /// A negative target can never be fetched; fault here instead of at the
    /// next decode so the error names the jump.
    fn jump_target(&self, ip: usize, target: Param) -> Result<usize> {
        let address = self.read(ip, target)?;
        usize::try_from(address).map_err(|_| self.out_of_range(ip, address))
    }

    fn out_of_range(&self, ip: usize, address: i64) -> Error {
        Error::AddressOutOfRange {
            ip,
            address,
            len: self.state.memory.len(),
        }
    }
}
