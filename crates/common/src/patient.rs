use crate::lab::TestKind;
use crate::Tick;

/// Patient identifier as carried on the wire, e.g. `"PAC00042"`.
pub type PatientId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatientKind {
    Emergency,
    Appointment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Specialty {
    Cardio,
    Ortho,
    Neuro,
}

impl Specialty {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "CARDIO" => Some(Specialty::Cardio),
            "ORTHO" => Some(Specialty::Ortho),
            "NEURO" => Some(Specialty::Neuro),
            _ => None,
        }
    }
}

/// A patient record as tracked by the Triage Coordinator.
///
/// Owned by whichever queue or worker currently holds it; see the Ownership
/// note in the data model. The stability monitor and the critical-promotion
/// path are the only mutators once a patient is admitted.
#[derive(Debug, Clone)]
pub struct Patient {
    pub id: PatientId,
    pub kind: PatientKind,
    /// 1 (highest) .. 5 (lowest).
    pub priority: u8,
    pub stability: i32,
    pub arrival_tick: Tick,
    pub scheduled_tick: Option<Tick>,
    pub is_critical: bool,
    pub tests: Vec<TestKind>,
    pub meds: Vec<String>,
    pub doctor_specialty: Option<Specialty>,
}

impl Patient {
    pub fn new_emergency(
        id: PatientId,
        arrival_tick: Tick,
        priority: u8,
        stability: i32,
        tests: Vec<TestKind>,
        meds: Vec<String>,
    ) -> Self {
        Patient {
            id,
            kind: PatientKind::Emergency,
            priority,
            stability,
            arrival_tick,
            scheduled_tick: None,
            is_critical: false,
            tests,
            meds,
            doctor_specialty: None,
        }
    }

    pub fn new_appointment(
        id: PatientId,
        arrival_tick: Tick,
        scheduled_tick: Tick,
        doctor_specialty: Specialty,
        tests: Vec<TestKind>,
    ) -> Self {
        Patient {
            id,
            kind: PatientKind::Appointment,
            priority: 5,
            stability: 1000,
            arrival_tick,
            scheduled_tick: Some(scheduled_tick),
            is_critical: false,
            tests,
            meds: Vec::new(),
            doctor_specialty: Some(doctor_specialty),
        }
    }

    pub fn needs_labs(&self) -> bool {
        !self.tests.is_empty()
    }

    pub fn needs_meds(&self) -> bool {
        !self.meds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emergency_starts_non_critical() {
        let p = Patient::new_emergency("PAC00001".into(), 0, 1, 500, vec![], vec![]);
        assert!(!p.is_critical);
        assert_eq!(p.priority, 1);
    }

    #[test]
    fn appointment_defaults() {
        let p = Patient::new_appointment("PAC00002".into(), 0, 50, Specialty::Cardio, vec![]);
        assert_eq!(p.stability, 1000);
        assert_eq!(p.priority, 5);
        assert_eq!(p.scheduled_tick, Some(50));
    }

    #[test]
    fn specialty_parse_rejects_unknown() {
        assert_eq!(Specialty::parse("cardio"), Some(Specialty::Cardio));
        assert_eq!(Specialty::parse("PSYCH"), None);
    }
}
