use crate::message::{Priority, Sender};
use crate::patient::PatientId;
use crate::Tick;

/// The physical lab a test runs on. `Preop` is the only two-phase test and
/// runs on both in sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestKind {
    Hemo,
    Glic,
    Colest,
    Renal,
    Hepat,
    Preop,
}

impl TestKind {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "HEMO" => Some(TestKind::Hemo),
            "GLIC" => Some(TestKind::Glic),
            "COLEST" => Some(TestKind::Colest),
            "RENAL" => Some(TestKind::Renal),
            "HEPAT" => Some(TestKind::Hepat),
            "PREOP" => Some(TestKind::Preop),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TestKind::Hemo => "HEMO",
            TestKind::Glic => "GLIC",
            TestKind::Colest => "COLEST",
            TestKind::Renal => "RENAL",
            TestKind::Hepat => "HEPAT",
            TestKind::Preop => "PREOP",
        }
    }

    /// Which lab(s) this test must run on, in order.
    pub fn route(self) -> &'static [Lab] {
        match self {
            TestKind::Hemo | TestKind::Glic => &[Lab::Lab1],
            TestKind::Colest | TestKind::Renal | TestKind::Hepat => &[Lab::Lab2],
            TestKind::Preop => &[Lab::Lab1, Lab::Lab2],
        }
    }

    pub fn is_preop(self) -> bool {
        matches!(self, TestKind::Preop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lab {
    Lab1,
    Lab2,
}

/// The `lab:` selector on a `LAB_REQUEST` command — which lab(s) the caller
/// is willing to have the tests run on. Used only for validating test/lab
/// compatibility; routing itself always follows `TestKind::route`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabSelector {
    Lab1,
    Lab2,
    Both,
}

impl LabSelector {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "LAB1" => Some(LabSelector::Lab1),
            "LAB2" => Some(LabSelector::Lab2),
            "BOTH" => Some(LabSelector::Both),
            _ => None,
        }
    }

    /// Whether a test is runnable given this selector, per the §4.1
    /// compatibility table (LAB1: HEMO, GLIC; LAB2: COLEST, RENAL, HEPAT;
    /// BOTH: any).
    pub fn accepts(self, test: TestKind) -> bool {
        match self {
            LabSelector::Both => true,
            LabSelector::Lab1 => test.route() == [Lab::Lab1],
            LabSelector::Lab2 => test.route() == [Lab::Lab2],
        }
    }
}

/// A lab request in flight, as handed to the Lab Service's dispatcher.
#[derive(Debug, Clone)]
pub struct LabJob {
    pub operation_id: u64,
    pub patient_id: PatientId,
    pub tests: Vec<TestKind>,
    pub request_tick: Tick,
    pub sender: Sender,
    pub priority: Priority,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_table() {
        assert_eq!(TestKind::Hemo.route(), &[Lab::Lab1]);
        assert_eq!(TestKind::Renal.route(), &[Lab::Lab2]);
        assert_eq!(TestKind::Preop.route(), &[Lab::Lab1, Lab::Lab2]);
    }

    #[test]
    fn selector_compatibility() {
        assert!(LabSelector::Lab1.accepts(TestKind::Hemo));
        assert!(!LabSelector::Lab1.accepts(TestKind::Renal));
        assert!(LabSelector::Both.accepts(TestKind::Renal));
        assert!(!LabSelector::Lab1.accepts(TestKind::Preop));
        assert!(!LabSelector::Lab2.accepts(TestKind::Preop));
        assert!(LabSelector::Both.accepts(TestKind::Preop));
    }

    #[test]
    fn parse_rejects_unknown_test() {
        assert!(TestKind::parse("XRAY").is_none());
    }
}
