#![no_main]

use std::sync::Arc;
use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use osce_station::scenario::{PhaseDefinition, ScenarioDefinition};
use osce_station::session::{ManualClock, StationSession, UserId};

// One byte per operation. The session must never panic and the score
// must never exceed the item count.
fuzz_target!(|data: &[u8]| {
    let scenario = Arc::new(ScenarioDefinition::new(
        "fuzz",
        "Fuzz",
        vec![
            PhaseDefinition::new("A", ["a0", "a1", "a2"]).with_duration(Duration::from_secs(30)),
            PhaseDefinition::new("B", Vec::<String>::new()).with_prompts(["q0", "q1"]),
            PhaseDefinition::new("C", ["c0", "c1"]),
        ],
    ));
    let clock = Arc::new(ManualClock::new());
    let mut session = StationSession::new(UserId::new("fuzz"), scenario, clock.clone());

    for &byte in data {
        let phase = usize::from(byte >> 6);
        let label = format!("{}{}", ['a', 'b', 'c', 'd'][phase], byte & 0x03);
        match byte & 0x0f {
            0 => {
                let _ = session.start();
            }
            1..=4 => {
                let _ = session.toggle_item(phase, &label, byte & 0x10 != 0);
            }
            5 => {
                let _ = session.set_notes(phase, label);
            }
            6 | 7 => {
                let _ = session.advance();
            }
            8 => {
                let _ = session.retreat();
            }
            9 => {
                let _ = session.finish();
            }
            10 => {
                let _ = session.set_answer(phase, usize::from((byte >> 4) & 0x03), label);
            }
            _ => {
                clock.advance(Duration::from_secs(u64::from(byte >> 4) * 4));
                let _ = session.poll();
            }
        }
        let card = session.scorecard();
        assert!(card.checked <= card.total);
    }
});
