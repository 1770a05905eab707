//! End-to-end event scenarios run through the processor.
//!
//! Each scenario feeds a realistic event sequence through an
//! [`EventProcessor`] and checks the resulting counts and chart rows.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]

use cagewatch_core::processor::{EventProcessor, ProcessError};
use cagewatch_core::queue::{EventQueue, event_channel};
use cagewatch_core::registry::RegistryError;
use cagewatch_types::{
    Behavior, CageEvent, FightOutcome, MateOutcome, Metric, Mouse, MouseId, Participant,
    PlayerId, Sex, Winners,
};

fn directory() -> Vec<Participant> {
    vec![
        Participant {
            id: PlayerId(1),
            name: String::from("Ada"),
        },
        Participant {
            id: PlayerId(2),
            name: String::from("Bo"),
        },
        Participant {
            id: PlayerId(3),
            name: String::from("Cy"),
        },
    ]
}

fn mouse(id: u64, sex: Sex, owners: [u32; 3]) -> Mouse {
    let [pick_fight, choose_mate, mate_answer] = owners;
    Mouse {
        id: MouseId(id),
        sex,
        size: 25,
        start_aggressiveness: 4,
        start_fertility: 6,
        pick_fight_owner: PlayerId(pick_fight),
        choose_mate_owner: PlayerId(choose_mate),
        mate_answer_owner: PlayerId(mate_answer),
    }
}

fn processor() -> EventProcessor {
    let mut processor = EventProcessor::new(&directory()).unwrap();
    processor.set_count_verification(true);
    processor
}

fn last_values(processor: &EventProcessor, metric: Metric) -> Vec<u32> {
    processor
        .series()
        .table(metric)
        .unwrap()
        .rows()
        .last()
        .unwrap()
        .values
        .clone()
}

#[test]
fn population_growth() {
    let mut processor = processor();
    let mut queue = EventQueue::from_events([
        CageEvent::Add {
            mouse: mouse(1, Sex::Male, [1, 1, 1]),
        },
        CageEvent::Add {
            mouse: mouse(2, Sex::Female, [2, 2, 2]),
        },
        CageEvent::StartGame,
        CageEvent::Mate {
            id: MouseId(1),
            outcome: MateOutcome::Success {
                partner: MouseId(2),
                offspring: mouse(3, Sex::Hermaphrodite, [1, 2, 3]),
            },
        },
        CageEvent::Mate {
            id: MouseId(2),
            outcome: MateOutcome::Success {
                partner: MouseId(1),
                offspring: mouse(4, Sex::Female, [2, 1, 3]),
            },
        },
    ]);
    processor.drain(&mut queue).unwrap();

    assert_eq!(processor.registry().len(), 4);
    assert_eq!(processor.round(), 3);

    let population = processor.series().table(Metric::Population).unwrap();
    let sizes: Vec<u32> = population
        .rows()
        .iter()
        .map(|row| row.values.iter().sum())
        .collect();
    assert_eq!(sizes, vec![2, 2, 3, 4]);
    assert_eq!(last_values(&processor, Metric::Population), vec![1, 1, 2]);
    assert_eq!(last_values(&processor, Metric::PickFight), vec![2, 2, 0]);
    assert_eq!(last_values(&processor, Metric::ChooseMate), vec![2, 2, 0]);
    assert_eq!(last_values(&processor, Metric::MateAnswer), vec![1, 1, 2]);
}

#[test]
fn fight_with_elimination() {
    let mut processor = processor();
    for event in [
        CageEvent::Add {
            mouse: mouse(1, Sex::Male, [1, 1, 1]),
        },
        CageEvent::Add {
            mouse: mouse(2, Sex::Male, [2, 2, 2]),
        },
        CageEvent::Add {
            mouse: mouse(3, Sex::Female, [3, 3, 3]),
        },
        CageEvent::StartGame,
        CageEvent::Fight {
            id: MouseId(1),
            outcome: FightOutcome::Win {
                opponent: MouseId(2),
            },
        },
        CageEvent::Fight {
            id: MouseId(3),
            outcome: FightOutcome::Loss {
                opponent: MouseId(1),
            },
        },
    ] {
        processor.process(event).unwrap();
    }

    assert!(processor.registry().contains(MouseId(1)));
    assert!(!processor.registry().contains(MouseId(2)));
    assert!(!processor.registry().contains(MouseId(3)));
    assert_eq!(last_values(&processor, Metric::Population), vec![0, 1, 0]);
    assert_eq!(last_values(&processor, Metric::PickFight), vec![1, 0, 0]);
    assert_eq!(
        processor
            .registry()
            .owner_count(Behavior::MateAnswer, PlayerId(2)),
        Some(0)
    );
}

#[test]
fn mate_with_offspring_counts_every_owner() {
    let mut processor = processor();
    processor
        .process(CageEvent::Add {
            mouse: mouse(10, Sex::Hermaphrodite, [1, 1, 1]),
        })
        .unwrap();
    processor
        .process(CageEvent::Add {
            mouse: mouse(11, Sex::Hermaphrodite, [3, 3, 3]),
        })
        .unwrap();
    processor.process(CageEvent::StartGame).unwrap();
    processor
        .process(CageEvent::Mate {
            id: MouseId(10),
            outcome: MateOutcome::Success {
                partner: MouseId(11),
                offspring: mouse(12, Sex::Male, [3, 1, 2]),
            },
        })
        .unwrap();

    let registry = processor.registry();
    assert_eq!(registry.get(MouseId(12)).unwrap().sex, Sex::Male);
    assert_eq!(registry.owner_count(Behavior::PickFight, PlayerId(3)), Some(2));
    assert_eq!(registry.owner_count(Behavior::ChooseMate, PlayerId(1)), Some(2));
    assert_eq!(registry.owner_count(Behavior::MateAnswer, PlayerId(2)), Some(1));
    assert_eq!(last_values(&processor, Metric::MateAnswer), vec![1, 1, 1]);
}

#[test]
fn unknown_reference_is_fatal_without_mutation() {
    let mut processor = processor();
    processor
        .process(CageEvent::Add {
            mouse: mouse(1, Sex::Female, [1, 2, 3]),
        })
        .unwrap();
    processor.process(CageEvent::StartGame).unwrap();
    let counts = processor.registry().snapshot();
    let rows = processor.series().row_count();

    // Opponent 99 was never added: the instigator must not be touched.
    let err = processor.process(CageEvent::Fight {
        id: MouseId(1),
        outcome: FightOutcome::Loss {
            opponent: MouseId(99),
        },
    });
    assert!(matches!(
        err,
        Err(ProcessError::Registry {
            source: RegistryError::UnknownEntity { id }
        }) if id == MouseId(99)
    ));
    assert!(processor.registry().contains(MouseId(1)));
    assert_eq!(processor.registry().snapshot(), counts);
    assert_eq!(processor.series().row_count(), rows);
    assert_eq!(processor.round(), 1);
}

#[test]
fn unknown_owner_on_arrival_is_fatal() {
    let mut processor = processor();
    let err = processor.process(CageEvent::Add {
        mouse: mouse(1, Sex::Male, [1, 2, 8]),
    });
    assert!(matches!(
        err,
        Err(ProcessError::Registry {
            source: RegistryError::UnknownParticipant {
                behavior: Behavior::MateAnswer,
                ..
            }
        })
    ));
    assert!(processor.registry().is_empty());
}

#[test]
fn round_counts_non_arrival_events() {
    let (sender, mut queue) = event_channel();
    let mut processor = processor();
    let mut non_arrivals: u64 = 0;

    let events = [
        CageEvent::Add {
            mouse: mouse(1, Sex::Male, [1, 2, 3]),
        },
        CageEvent::Add {
            mouse: mouse(2, Sex::Female, [3, 2, 1]),
        },
        CageEvent::Add {
            mouse: mouse(3, Sex::Female, [2, 2, 2]),
        },
        CageEvent::StartGame,
        CageEvent::Fight {
            id: MouseId(1),
            outcome: FightOutcome::NoFight,
        },
        CageEvent::Mate {
            id: MouseId(2),
            outcome: MateOutcome::Rejection {
                partner: MouseId(1),
            },
        },
        CageEvent::Overpopulation { id: MouseId(3) },
        CageEvent::Explode {
            id: MouseId(2),
            source: String::from("pickFight"),
            cause: String::from("TypeError"),
        },
        CageEvent::Spin {
            id: MouseId(1),
            source: String::from("mateAnswer"),
        },
        CageEvent::EndGame {
            cause: String::from("the cage is empty"),
            winners: Winners::default(),
        },
    ];

    for event in events {
        if !event.is_arrival() {
            non_arrivals += 1;
        }
        sender.send(event).unwrap();
        processor.drain(&mut queue).unwrap();
        assert_eq!(processor.round(), non_arrivals);
    }

    // Initial row at round 0, then one row per non-arrival event.
    for table in processor.series().tables() {
        let rounds: Vec<u64> = table.rows().iter().map(|row| row.round).collect();
        let expected: Vec<u64> = (0..=non_arrivals).collect();
        assert_eq!(rounds, expected, "{:?}", table.metric());
    }
    assert!(processor.registry().is_empty());
    assert_eq!(processor.outcome().unwrap().round, non_arrivals);
}

#[test]
fn exactly_one_row_per_metric_per_event() {
    let mut processor = processor();
    processor
        .process(CageEvent::Add {
            mouse: mouse(1, Sex::Male, [1, 1, 1]),
        })
        .unwrap();
    processor
        .process(CageEvent::Add {
            mouse: mouse(2, Sex::Male, [2, 2, 2]),
        })
        .unwrap();
    processor.process(CageEvent::StartGame).unwrap();

    let before: Vec<usize> = processor.series().tables().map(|table| table.len()).collect();
    processor
        .process(CageEvent::Fight {
            id: MouseId(1),
            outcome: FightOutcome::Tie {
                opponent: MouseId(2),
            },
        })
        .unwrap();
    let after: Vec<usize> = processor.series().tables().map(|table| table.len()).collect();

    for (old, new) in before.iter().zip(&after) {
        assert_eq!(*new, old + 1);
    }
    assert_eq!(after.len(), Metric::ALL.len());
}

#[test]
fn decoded_stream_drives_the_processor() {
    let (sender, mut queue) = event_channel();
    let lines = [
        r#"{"type":"ADD","mouse":{"id":1,"sex":"Male","size":20,"start_aggressiveness":2,"start_fertility":3,"pick_fight_owner":1,"choose_mate_owner":2,"mate_answer_owner":3}}"#,
        r#"{"type":"START_GAME"}"#,
        r#"{"type":"RETIRE","id":1}"#,
        r#"{"type":"END_GAME","cause":"extinction"}"#,
    ];
    for line in lines {
        sender.send_json(line).unwrap();
    }
    let mut processor = processor();
    assert_eq!(processor.drain(&mut queue).unwrap(), 4);
    assert_eq!(processor.round(), 3);
    assert_eq!(processor.outcome().unwrap().cause, "extinction");
    assert_eq!(processor.outcome().unwrap().winners, Winners::default());
}
