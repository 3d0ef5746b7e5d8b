pub mod amplifier;
pub mod decode;
pub mod disasm;
pub mod io;
pub mod machine;
pub mod memory;
pub mod program;

pub use amplifier::{best_phase_sequence, run_chain, Topology};
pub use decode::{decode, Instruction, Opcode, Param, ParamMode};
pub use io::{Disconnected, Input, NoInput, Output};
pub use machine::{Error, Machine, Result, State, Step};
pub use memory::{Bus, Memory};
pub use program::Program;
