use intcode::{Error, Machine, Program, Step};
use std::collections::VecDeque;
use std::sync::mpsc;
use std::thread;

// Outputs 999 below 8, 1000 at 8, 1001 above 8.
const COMPARE_TO_EIGHT: &str = "3,21,1008,21,8,20,1005,20,22,107,8,21,20,1006,20,31,\
1106,0,36,98,0,0,1002,21,125,20,4,20,1105,1,46,104,\
999,1105,1,46,1101,1000,1,20,4,20,1105,1,46,98,99";

fn run_with(source: &str, input: &[i64]) -> Result<Option<i64>, Error> {
    let queue: VecDeque<i64> = input.iter().copied().collect();
    Machine::new(source)?.with_input(queue).run()
}

#[test]
fn branching_program_classifies_input() {
    assert_eq!(run_with(COMPARE_TO_EIGHT, &[7]), Ok(Some(999)));
    assert_eq!(run_with(COMPARE_TO_EIGHT, &[8]), Ok(Some(1000)));
    assert_eq!(run_with(COMPARE_TO_EIGHT, &[9]), Ok(Some(1001)));
}

#[test]
fn jump_tests_report_zero_or_one() {
    let position = "3,12,6,12,15,1,13,14,13,4,13,99,-1,0,1,9";
    let immediate = "3,3,1105,-1,9,1101,0,0,12,4,12,99,1";
    for source in [position, immediate] {
        assert_eq!(run_with(source, &[0]), Ok(Some(0)));
        assert_eq!(run_with(source, &[5]), Ok(Some(1)));
    }
}

#[test]
fn echo_over_channels_from_another_thread() {
    let (in_tx, in_rx) = mpsc::channel();
    let (out_tx, out_rx) = mpsc::channel();
    let mut machine = Machine::new("3,0,4,0,3,0,4,0,99")
        .unwrap()
        .with_input(in_rx)
        .with_output(out_tx);

    let feeder = thread::spawn(move || {
        in_tx.send(11).unwrap();
        in_tx.send(-12).unwrap();
    });
    assert_eq!(machine.run(), Ok(Some(-12)));
    feeder.join().unwrap();

    let (_, out_tx) = machine.into_ports();
    drop(out_tx);
    assert_eq!(out_rx.iter().collect::<Vec<_>>(), vec![11, -12]);
}

#[test]
fn closed_channel_faults_instead_of_hanging() {
    let (in_tx, in_rx) = mpsc::channel::<i64>();
    drop(in_tx);
    let mut machine = Machine::new("3,0,99").unwrap().with_input(in_rx);
    assert_eq!(machine.run(), Err(Error::InputClosed { ip: 0 }));
}

#[test]
fn dropped_output_receiver_faults() {
    let (out_tx, out_rx) = mpsc::channel();
    drop(out_rx);
    let mut machine = Machine::new("104,1,99").unwrap().with_output(out_tx);
    assert_eq!(machine.run(), Err(Error::OutputClosed { ip: 0 }));
}

#[test]
fn independent_machines_share_nothing() {
    let program = Program::parse("3,9,8,9,10,9,4,9,99,-1,8").unwrap();
    let handles: Vec<_> = [8, 7, 8, 1]
        .into_iter()
        .map(|value| {
            let program = program.clone();
            thread::spawn(move || {
                Machine::from_program(program)
                    .with_input(VecDeque::from([value]))
                    .run()
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![Ok(Some(1)), Ok(Some(0)), Ok(Some(1)), Ok(Some(0))]);
}

#[test]
fn manual_stepping_matches_run() {
    let source = "1002,4,3,4,33";
    let mut stepped = Machine::new(source).unwrap();
    stepped.reset();
    let mut executed = Vec::new();
    loop {
        match stepped.step().unwrap() {
            Step::Executed(instr) => executed.push(instr.to_string()),
            Step::Halted => break,
        }
    }
    assert_eq!(executed, vec!["mul 4, #3, [4]", "halt"]);

    let mut ran = Machine::new(source).unwrap();
    ran.run().unwrap();
    assert_eq!(stepped.memory(), ran.memory());
    assert_eq!(stepped.memory(), &[1002, 4, 3, 4, 99]);
}

#[test]
fn faults_carry_pointer_context_in_message() {
    let err = Machine::new("1101,1,1,0,50").unwrap().run().unwrap_err();
    assert_eq!(
        err.to_string(),
        "unsupported operation code 50 (opcode word 50) at ip 4"
    );
}
