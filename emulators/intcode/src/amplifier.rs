//! Chains of machines wired output-to-input over channels.
//!
//! Each machine in a chain runs the same program on its own thread. Machine
//! `i` first reads its phase setting, then whatever machine `i - 1` emits; the
//! first machine also receives the initial signal. In a feedback loop the last
//! machine's output goes back to the first.

use crate::machine::{Error, Machine, Result};
use crate::program::Program;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, debug_span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    #[default]
    Series,
    Feedback,
}

type ChainMachine = Machine<Receiver<i64>, Option<Sender<i64>>>;

/// Run one machine per phase setting and return the final machine's last
/// output. An empty chain produces no output.
pub fn run_chain(
    program: &Program,
    phases: &[i64],
    signal: i64,
    topology: Topology,
) -> Result<Option<i64>> {
    if phases.is_empty() {
        return Ok(None);
    }
    debug!(?phases, signal, ?topology, "chain start");

    let machines = wire(program, phases, signal, topology);
    // Joined results keep each finished machine's receiver alive until the
    // whole chain is done, so late sends into a halted peer still land.
    let joined: Vec<Result<(Option<i64>, Receiver<i64>)>> = thread::scope(|scope| {
        let handles: Vec<_> = machines
            .into_iter()
            .enumerate()
            .map(|(idx, mut machine)| {
                scope.spawn(move || -> Result<(Option<i64>, Receiver<i64>)> {
                    let _span = debug_span!("amplifier", idx).entered();
                    let last = machine.run()?;
                    // Hang up downstream so a peer still waiting on us sees a
                    // disconnect instead of blocking forever.
                    let (input, _output) = machine.into_ports();
                    Ok((last, input))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    });

    let mut last = None;
    let mut faults = Vec::new();
    for result in joined {
        match result {
            Ok((value, _input)) => last = value,
            Err(err) => faults.push(err),
        }
    }
    if let Some(err) = root_fault(faults) {
        return Err(err);
    }
    debug!(?last, "chain finished");
    Ok(last)
}

fn wire(program: &Program, phases: &[i64], signal: i64, topology: Topology) -> Vec<ChainMachine> {
    let count = phases.len();
    let (senders, receivers): (Vec<Sender<i64>>, Vec<Receiver<i64>>) =
        (0..count).map(|_| mpsc::channel()).unzip();

    // Receivers are still held here, so seeding cannot fail.
    for (tx, phase) in senders.iter().zip(phases) {
        let _ = tx.send(*phase);
    }
    let _ = senders[0].send(signal);

    let mut senders: Vec<Option<Sender<i64>>> = senders.into_iter().map(Some).collect();
    receivers
        .into_iter()
        .enumerate()
        .map(|(idx, rx)| {
            let downstream = (idx + 1) % count;
            let output = match topology {
                Topology::Series if downstream == 0 => None,
                _ => senders[downstream].take(),
            };
            Machine::from_program(program.clone())
                .with_input(rx)
                .with_output(output)
        })
        .collect()
}

/// A fault in one machine makes its neighbours fail with channel errors;
/// report the fault that started the cascade when there is one.
fn root_fault(faults: Vec<Error>) -> Option<Error> {
    let cascade = |err: &Error| {
        matches!(
            err,
            Error::InputClosed { .. } | Error::OutputClosed { .. }
        )
    };
    let root = faults.iter().position(|err| !cascade(err)).unwrap_or(0);
    faults.into_iter().nth(root)
}

/// Try every ordering of `settings` and return the highest final signal with
/// the ordering that produced it.
pub fn best_phase_sequence(
    program: &Program,
    settings: &[i64],
    signal: i64,
    topology: Topology,
) -> Result<Option<(i64, Vec<i64>)>> {
    let mut best: Option<(i64, Vec<i64>)> = None;
    for phases in permutations(settings) {
        let Some(value) = run_chain(program, &phases, signal, topology)? else {
            continue;
        };
        if best.as_ref().map_or(true, |(top, _)| value > *top) {
            best = Some((value, phases));
        }
    }
    Ok(best)
}

/// All orderings of `items`, generated with Heap's algorithm.
pub fn permutations(items: &[i64]) -> Vec<Vec<i64>> {
    let mut current = items.to_vec();
    let mut out = vec![current.clone()];
    let mut counters = vec![0usize; current.len()];
    let mut i = 1;
    while i < current.len() {
        if counters[i] < i {
            let swap_with = if i % 2 == 0 { 0 } else { counters[i] };
            current.swap(swap_with, i);
            out.push(current.clone());
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const SERIES: &str = "3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0";
    const FEEDBACK: &str = "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,27,\
                            4,27,1001,28,-1,28,1005,28,6,99,0,0,5";

    #[test]
    fn series_chain_reproduces_reference_signal() {
        let program = Program::parse(SERIES).unwrap();
        let out = run_chain(&program, &[4, 3, 2, 1, 0], 0, Topology::Series).unwrap();
        assert_eq!(out, Some(43210));
    }

    #[test]
    fn feedback_loop_reproduces_reference_signal() {
        let program = Program::parse(FEEDBACK).unwrap();
        let out = run_chain(&program, &[9, 8, 7, 6, 5], 0, Topology::Feedback).unwrap();
        assert_eq!(out, Some(139629729));
    }

    #[test]
    fn search_finds_best_ordering() {
        let program = Program::parse(SERIES).unwrap();
        let best = best_phase_sequence(&program, &[0, 1, 2, 3, 4], 0, Topology::Series).unwrap();
        assert_eq!(best, Some((43210, vec![4, 3, 2, 1, 0])));
    }

    #[test]
    fn empty_chain_has_no_output() {
        let program = Program::parse(SERIES).unwrap();
        assert_eq!(run_chain(&program, &[], 0, Topology::Series), Ok(None));
    }

    #[test]
    fn faulting_machine_does_not_deadlock_its_peers() {
        // Reads the phase, then faults on an unknown opcode before emitting.
        let program = Program::parse("3,0,50,99").unwrap();
        let err = run_chain(&program, &[1, 2, 3], 0, Topology::Feedback).unwrap_err();
        assert!(matches!(err, Error::UnknownOpcode { code: 50, .. }));
    }

    #[test]
    fn starved_series_head_reports_closed_input() {
        // Needs three inputs but only ever receives phase and signal.
        let program = Program::parse("3,0,3,0,3,0,99").unwrap();
        let err = run_chain(&program, &[7], 0, Topology::Series).unwrap_err();
        assert_eq!(err, Error::InputClosed { ip: 4 });
    }

    #[test]
    fn permutations_cover_every_ordering_once() {
        let perms = permutations(&[1, 2, 3, 4]);
        assert_eq!(perms.len(), 24);
        let unique: HashSet<_> = perms.iter().cloned().collect();
        assert_eq!(unique.len(), 24);
        assert_eq!(permutations(&[]), vec![Vec::<i64>::new()]);
    }
}
