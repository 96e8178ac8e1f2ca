use crate::lab::TestKind;
use crate::patient::{PatientId, Specialty};
use crate::Tick;

pub type SurgeryId = u64;

/// Alias kept distinct from `Specialty` at the type level even though the
/// value set is identical — a surgery's room/team assignment and an
/// appointment's doctor specialty are different facets that happen to share
/// a vocabulary (see the Glossary note on not confusing related-but-distinct
/// fields).
pub type SurgeryType = Specialty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "LOW" => Some(Urgency::Low),
            "MEDIUM" => Some(Urgency::Medium),
            "HIGH" => Some(Urgency::High),
            _ => None,
        }
    }
}

pub const MAX_SURGERY_TESTS: usize = 5;
pub const MAX_SURGERY_MEDS: usize = 8;

/// A surgery record, from admission through completion or cancellation.
///
/// `needs_tests`/`needs_meds` are fixed at creation (derived from whether the
/// test/med lists are non-empty); `tests_done`/`meds_ok` are set by the
/// dispatcher as `MSG_LAB_RESULTS_READY`/`MSG_PHARM_READY` arrive.
#[derive(Debug, Clone)]
pub struct Surgery {
    pub surgery_id: SurgeryId,
    pub patient_id: PatientId,
    pub surgery_type: SurgeryType,
    pub urgency: Urgency,
    pub scheduled_tick: Tick,
    pub estimated_duration: Tick,
    pub tests: Vec<TestKind>,
    pub meds: Vec<String>,
    pub needs_tests: bool,
    pub tests_done: bool,
    pub needs_meds: bool,
    pub meds_ok: bool,
    pub active: bool,
}

impl Surgery {
    pub fn new(
        surgery_id: SurgeryId,
        patient_id: PatientId,
        surgery_type: SurgeryType,
        urgency: Urgency,
        scheduled_tick: Tick,
        estimated_duration: Tick,
        mut tests: Vec<TestKind>,
        mut meds: Vec<String>,
    ) -> Self {
        if tests.len() > MAX_SURGERY_TESTS {
            tests.truncate(MAX_SURGERY_TESTS);
        }
        if meds.len() > MAX_SURGERY_MEDS {
            meds.truncate(MAX_SURGERY_MEDS);
        }
        let needs_tests = !tests.is_empty();
        let needs_meds = !meds.is_empty();
        Surgery {
            surgery_id,
            patient_id,
            surgery_type,
            urgency,
            scheduled_tick,
            estimated_duration,
            tests,
            meds,
            needs_tests,
            tests_done: !needs_tests,
            needs_meds,
            meds_ok: !needs_meds,
            active: true,
        }
    }

    pub fn dependencies_satisfied(&self) -> bool {
        self.tests_done && self.meds_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_oversized_lists() {
        let tests = vec![TestKind::Preop; 10];
        let meds = vec!["ANALGESICO_A".to_string(); 20];
        let s = Surgery::new(
            1,
            "PAC00001".into(),
            SurgeryType::Cardio,
            Urgency::High,
            100,
            50,
            tests,
            meds,
        );
        assert_eq!(s.tests.len(), MAX_SURGERY_TESTS);
        assert_eq!(s.meds.len(), MAX_SURGERY_MEDS);
    }

    #[test]
    fn no_deps_is_immediately_satisfied() {
        let s = Surgery::new(
            2,
            "PAC00002".into(),
            SurgeryType::Ortho,
            Urgency::Low,
            10,
            5,
            vec![],
            vec![],
        );
        assert!(s.dependencies_satisfied());
    }

    #[test]
    fn with_deps_starts_unsatisfied() {
        let s = Surgery::new(
            3,
            "PAC00003".into(),
            SurgeryType::Neuro,
            Urgency::Medium,
            10,
            5,
            vec![TestKind::Preop],
            vec!["ANALGESICO_A".into()],
        );
        assert!(!s.dependencies_satisfied());
    }
}
