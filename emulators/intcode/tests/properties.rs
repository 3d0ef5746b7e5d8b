use intcode::{Machine, Program};
use proptest::prelude::*;
use std::collections::VecDeque;

// Keep operands small enough that products never overflow.
fn operand() -> impl Strategy<Value = i64> {
    -1_000_000i64..1_000_000
}

proptest! {
    #[test]
    fn halt_only_programs_return_nothing(len in 1usize..64) {
        let mut machine = Machine::from_program(Program::from(vec![99; len]));
        prop_assert_eq!(machine.run(), Ok(None));
        prop_assert_eq!(machine.steps(), 1);
    }

    #[test]
    fn immediate_arithmetic_matches_host(a in operand(), b in operand()) {
        let mut add = Machine::from_program(Program::from(vec![1101, a, b, 5, 99, 0]));
        add.run().unwrap();
        prop_assert_eq!(add.memory()[5], a + b);

        let mut mul = Machine::from_program(Program::from(vec![1102, a, b, 5, 99, 0]));
        mul.run().unwrap();
        prop_assert_eq!(mul.memory()[5], a * b);
    }

    #[test]
    fn comparisons_produce_flags(a in operand(), b in operand()) {
        let lt = vec![1107, a, b, 7, 4, 7, 99, 0];
        let eq = vec![1108, a, b, 7, 4, 7, 99, 0];
        prop_assert_eq!(Machine::from_program(lt.into()).run(), Ok(Some((a < b) as i64)));
        prop_assert_eq!(Machine::from_program(eq.into()).run(), Ok(Some((a == b) as i64)));
    }

    #[test]
    fn echo_returns_each_input_on_rerun(first in any::<i64>(), second in any::<i64>()) {
        let mut machine = Machine::new("3,0,4,0,99")
            .unwrap()
            .with_input(VecDeque::from([first, second]));
        prop_assert_eq!(machine.run(), Ok(Some(first)));
        prop_assert_eq!(machine.run(), Ok(Some(second)));
        prop_assert_eq!(machine.outputs(), &[second][..]);
    }

    #[test]
    fn rendered_programs_parse_back(words in proptest::collection::vec(any::<i64>(), 1..32)) {
        let program = Program::from(words.clone());
        let reparsed: Program = program.to_string().parse().unwrap();
        prop_assert_eq!(reparsed.words(), &words[..]);
    }
}
