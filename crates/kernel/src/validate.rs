//! Turns a syntactically-parsed `Command` into either a ready-to-schedule
//! `Action` or a `ValidationError`. Every rule here rejects without
//! mutating any shared state — the caller logs a warning and moves on.

use std::fmt;

use common::config::Config;
use common::lab::{LabSelector, TestKind};
use common::message::{MedItem, PharmJob, Priority, Sender};
use common::patient::{Patient, Specialty};
use common::surgery::{Surgery, Urgency};
use common::Tick;

use crate::command::Command;

#[derive(Debug, Clone)]
pub enum ValidationError {
    BadIdFormat { id: String, expected_prefix: &'static str },
    OutOfRange { field: &'static str, detail: String },
    UnknownToken { field: &'static str, token: String },
    IncompatibleLabSelection { test: String, lab: String },
    MissingRequiredTest { test: &'static str },
    MissingRequiredMedication,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::BadIdFormat { id, expected_prefix } => {
                write!(f, "id '{id}' must start with '{expected_prefix}', length 5..15, digits after prefix")
            }
            ValidationError::OutOfRange { field, detail } => {
                write!(f, "field '{field}' out of range: {detail}")
            }
            ValidationError::UnknownToken { field, token } => {
                write!(f, "field '{field}' has unknown value '{token}'")
            }
            ValidationError::IncompatibleLabSelection { test, lab } => {
                write!(f, "test '{test}' is not runnable on selected lab '{lab}'")
            }
            ValidationError::MissingRequiredTest { test } => {
                write!(f, "surgery requests must include test '{test}'")
            }
            ValidationError::MissingRequiredMedication => {
                write!(f, "surgery requests must include at least one medication")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn validate_id(id: &str, prefix: &'static str) -> Result<(), ValidationError> {
    let bad = || ValidationError::BadIdFormat { id: id.to_string(), expected_prefix: prefix };
    if id.len() < 5 || id.len() > 15 {
        return Err(bad());
    }
    let rest = id.strip_prefix(prefix).ok_or_else(bad)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    Ok(())
}

fn parse_tests(tokens: &[String]) -> Result<Vec<TestKind>, ValidationError> {
    tokens
        .iter()
        .map(|t| {
            TestKind::parse(t).ok_or_else(|| ValidationError::UnknownToken {
                field: "tests",
                token: t.clone(),
            })
        })
        .collect()
}

fn parse_priority(token: &str) -> Result<Priority, ValidationError> {
    match token.to_ascii_uppercase().as_str() {
        "URGENT" => Ok(Priority::Urgent),
        "HIGH" => Ok(Priority::High),
        "NORMAL" => Ok(Priority::Normal),
        _ => Err(ValidationError::UnknownToken { field: "priority", token: token.to_string() }),
    }
}

/// A validated command, ready for the scheduler. `init` ticks from now;
/// the dispatch loop computes `deliver_tick = current_tick + init`.
#[derive(Debug, Clone)]
pub enum Action {
    Shutdown,
    Status(crate::command::StatusTarget),
    Help,
    NewEmergency { init: Tick, patient: Patient },
    NewAppointment { init: Tick, patient: Patient },
    NewSurgery { init: Tick, surgery: Surgery },
    PharmacyRequest { init: Tick, job: PharmJob },
    LabRequest { init: Tick, job: common::lab::LabJob },
    Restock { medname: String, quantity: u32 },
}

pub fn validate(
    cmd: Command,
    current_tick: Tick,
    _config: &Config,
    next_surgery_id: &mut u64,
    next_manager_operation_id: &mut u64,
) -> Result<Action, ValidationError> {
    match cmd {
        Command::Shutdown => Ok(Action::Shutdown),
        Command::Help => Ok(Action::Help),
        Command::Status(target) => Ok(Action::Status(target)),

        Command::Emergency { id, init, triage, stability, tests, meds } => {
            validate_id(&id, "PAC")?;
            if !(1..=5).contains(&triage) {
                return Err(ValidationError::OutOfRange {
                    field: "triage",
                    detail: format!("{triage} not in 1..5"),
                });
            }
            if stability < 100 {
                return Err(ValidationError::OutOfRange {
                    field: "stability",
                    detail: format!("{stability} < 100"),
                });
            }
            let tests = parse_tests(&tests)?;
            let patient = Patient::new_emergency(id, current_tick + init, triage, stability, tests, meds);
            Ok(Action::NewEmergency { init, patient })
        }

        Command::Appointment { id, init, scheduled, doctor, tests } => {
            validate_id(&id, "PAC")?;
            if scheduled <= init + current_tick {
                return Err(ValidationError::OutOfRange {
                    field: "scheduled",
                    detail: format!("{scheduled} <= init+current ({})", init + current_tick),
                });
            }
            let specialty = Specialty::parse(&doctor).ok_or_else(|| ValidationError::UnknownToken {
                field: "doctor",
                token: doctor.clone(),
            })?;
            let tests = parse_tests(&tests)?;
            let patient =
                Patient::new_appointment(id, current_tick + init, scheduled, specialty, tests);
            Ok(Action::NewAppointment { init, patient })
        }

        Command::Surgery { id, init, surgery_type, scheduled, urgency, tests, meds } => {
            validate_id(&id, "PAC")?;
            if scheduled < init {
                return Err(ValidationError::OutOfRange {
                    field: "scheduled",
                    detail: format!("{scheduled} < init {init}"),
                });
            }
            let surgery_type = Specialty::parse(&surgery_type).ok_or_else(|| ValidationError::UnknownToken {
                field: "type",
                token: surgery_type.clone(),
            })?;
            let urgency = Urgency::parse(&urgency).ok_or_else(|| ValidationError::UnknownToken {
                field: "urgency",
                token: urgency.clone(),
            })?;
            let test_kinds = parse_tests(&tests)?;
            if !test_kinds.iter().any(|t| t.is_preop()) {
                return Err(ValidationError::MissingRequiredTest { test: "PREOP" });
            }
            if meds.is_empty() {
                return Err(ValidationError::MissingRequiredMedication);
            }
            let surgery_id = *next_surgery_id;
            *next_surgery_id += 1;
            let surgery = Surgery::new(
                surgery_id,
                id,
                surgery_type,
                urgency,
                scheduled,
                0,
                test_kinds,
                meds,
            );
            Ok(Action::NewSurgery { init, surgery })
        }

        Command::PharmacyRequest { id, init, priority, items } => {
            validate_id(&id, "REQ")?;
            let priority = parse_priority(&priority)?;
            let operation_id = *next_manager_operation_id;
            *next_manager_operation_id += 1;
            let job = PharmJob {
                operation_id,
                patient_id: id,
                items: items
                    .into_iter()
                    .map(|(name, qty)| MedItem { name, qty })
                    .collect(),
                request_tick: current_tick + init,
                sender: Sender::Manager,
                priority,
            };
            Ok(Action::PharmacyRequest { init, job })
        }

        Command::LabRequest { id, init, priority, lab, tests } => {
            validate_id(&id, "LAB")?;
            let priority = match priority.to_ascii_uppercase().as_str() {
                "URGENT" => Priority::Urgent,
                "NORMAL" => Priority::Normal,
                _ => {
                    return Err(ValidationError::UnknownToken { field: "priority", token: priority });
                }
            };
            let selector = LabSelector::parse(&lab).ok_or_else(|| ValidationError::UnknownToken {
                field: "lab",
                token: lab.clone(),
            })?;
            let test_kinds = parse_tests(&tests)?;
            for (raw, kind) in tests.iter().zip(test_kinds.iter()) {
                if !selector.accepts(*kind) {
                    return Err(ValidationError::IncompatibleLabSelection {
                        test: raw.clone(),
                        lab: lab.clone(),
                    });
                }
            }
            let operation_id = *next_manager_operation_id;
            *next_manager_operation_id += 1;
            let job = common::lab::LabJob {
                operation_id,
                patient_id: id,
                tests: test_kinds,
                request_tick: current_tick + init,
                sender: Sender::Manager,
                priority,
            };
            Ok(Action::LabRequest { init, job })
        }

        Command::Restock { medname, quantity } => Ok(Action::Restock { medname, quantity }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse;

    fn cfg() -> Config {
        toml::from_str(
            r#"
            time_unit_ms = 100
            max_emergency_patients = 50
            max_appointments = 30
            max_surgeries_pending = 20

            [triage]
            triage_emergency_duration = 20
            triage_appointment_duration = 15
            critical_threshold = 200

            [surgery]
            bo1_min_duration = 50
            bo1_max_duration = 100
            bo2_min_duration = 50
            bo2_max_duration = 100
            bo3_min_duration = 50
            bo3_max_duration = 100
            cleanup_min_time = 10
            cleanup_max_time = 20
            max_medical_teams = 2

            [pharmacy]
            pharmacy_prep_time_min = 5
            pharmacy_prep_time_max = 15
            auto_restock_enabled = true
            restock_qty_multiplier = 2

            [lab]
            lab1_min_duration = 10
            lab1_max_duration = 30
            lab2_min_duration = 10
            lab2_max_duration = 30
            max_simultaneous_tests_lab1 = 1
            max_simultaneous_tests_lab2 = 1
            "#,
        )
        .unwrap()
    }

    #[test]
    fn rejects_emergency_with_low_stability() {
        let cmd = parse("EMERGENCY PAC00001 init:0 triage:1 stability:50").unwrap();
        let mut next_surgery_id = 1;
        let mut next_op = 3000;
        let err = validate(cmd, 0, &cfg(), &mut next_surgery_id, &mut next_op).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "stability", .. }));
    }

    #[test]
    fn rejects_bad_id_prefix() {
        let cmd = parse("EMERGENCY XYZ00001 init:0 triage:1 stability:500").unwrap();
        let mut next_surgery_id = 1;
        let mut next_op = 3000;
        let err = validate(cmd, 0, &cfg(), &mut next_surgery_id, &mut next_op).unwrap_err();
        assert!(matches!(err, ValidationError::BadIdFormat { .. }));
    }

    #[test]
    fn surgery_requires_preop_and_medication() {
        let cmd = parse(
            "SURGERY PAC00001 init:0 type:CARDIO scheduled:10 urgency:HIGH tests:[HEMO] meds:[]",
        )
        .unwrap();
        let mut next_surgery_id = 1;
        let mut next_op = 3000;
        let err = validate(cmd, 0, &cfg(), &mut next_surgery_id, &mut next_op).unwrap_err();
        assert!(matches!(err, ValidationError::MissingRequiredTest { .. }));
    }

    #[test]
    fn accepts_well_formed_surgery() {
        let cmd = parse(
            "SURGERY PAC00001 init:0 type:CARDIO scheduled:10 urgency:HIGH tests:[PREOP] meds:[ANALGESICO_A]",
        )
        .unwrap();
        let mut next_surgery_id = 1;
        let mut next_op = 3000;
        let action = validate(cmd, 0, &cfg(), &mut next_surgery_id, &mut next_op).unwrap();
        assert!(matches!(action, Action::NewSurgery { .. }));
    }

    #[test]
    fn lab_request_rejects_incompatible_test_lab_pair() {
        let cmd = parse("LAB_REQUEST LAB00001 init:0 priority:NORMAL lab:LAB1 tests:[RENAL]").unwrap();
        let mut next_surgery_id = 1;
        let mut next_op = 3000;
        let err = validate(cmd, 0, &cfg(), &mut next_surgery_id, &mut next_op).unwrap_err();
        assert!(matches!(err, ValidationError::IncompatibleLabSelection { .. }));
    }

    /// Validating the same command twice from fresh counters yields the same
    /// outcome both times — `validate` touches nothing but the two `&mut`
    /// counters the caller passes in, never any shared state of its own.
    #[test]
    fn validate_is_idempotent_given_fresh_counters() {
        let line = "APPOINTMENT PAC00001 init:0 scheduled:10 doctor:CARDIO tests:[HEMO]";
        let config = cfg();

        let mut ids_a = (1u64, 3000u64);
        let action_a = validate(parse(line).unwrap(), 0, &config, &mut ids_a.0, &mut ids_a.1).unwrap();
        let mut ids_b = (1u64, 3000u64);
        let action_b = validate(parse(line).unwrap(), 0, &config, &mut ids_b.0, &mut ids_b.1).unwrap();

        match (action_a, action_b) {
            (Action::NewAppointment { init: ia, patient: pa }, Action::NewAppointment { init: ib, patient: pb }) => {
                assert_eq!(ia, ib);
                assert_eq!(pa.id, pb.id);
                assert_eq!(pa.scheduled_tick, pb.scheduled_tick);
            }
            _ => panic!("wrong variant"),
        }
        assert_eq!(ids_a, ids_b);
    }
}
