use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::pharmacy::MedicationSpec;

pub const MAX_WAIT_DEPENDENCIES_TIME: u64 = 8000;
pub const INITIAL_DEPENDENCY_TIMEOUT: u64 = 150;

#[derive(Debug, Clone, Deserialize)]
pub struct TriageConfig {
    pub triage_emergency_duration: u64,
    pub triage_appointment_duration: u64,
    pub critical_threshold: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurgeryConfig {
    pub bo1_min_duration: u64,
    pub bo1_max_duration: u64,
    pub bo2_min_duration: u64,
    pub bo2_max_duration: u64,
    pub bo3_min_duration: u64,
    pub bo3_max_duration: u64,
    pub cleanup_min_time: u64,
    pub cleanup_max_time: u64,
    pub max_medical_teams: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PharmacyConfig {
    pub pharmacy_prep_time_min: u64,
    pub pharmacy_prep_time_max: u64,
    pub auto_restock_enabled: bool,
    pub restock_qty_multiplier: u32,
    pub medications: Vec<MedicationSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabConfig {
    pub lab1_min_duration: u64,
    pub lab1_max_duration: u64,
    pub lab2_min_duration: u64,
    pub lab2_max_duration: u64,
    pub max_simultaneous_tests_lab1: u32,
    pub max_simultaneous_tests_lab2: u32,
}

/// The whole simulator configuration, loaded once at startup from a TOML
/// file (see `bins/hospital-sim`). Every duration here is in ticks unless
/// the field name says otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub time_unit_ms: u64,
    pub max_emergency_patients: u32,
    pub max_appointments: u32,
    pub max_surgeries_pending: u32,
    pub triage: TriageConfig,
    pub surgery: SurgeryConfig,
    pub pharmacy: PharmacyConfig,
    pub lab: LabConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}

/// Medication names for the default 15-row stock table. Matches
/// `pharmacy::MEDICATION_COUNT`.
const DEFAULT_MEDICATION_NAMES: [&str; crate::pharmacy::MEDICATION_COUNT] = [
    "ANALGESICO_A",
    "ANALGESICO_B",
    "ANTIBIOTICO_A",
    "ANTIBIOTICO_B",
    "ANTIINFLAMATORIO_A",
    "ANTIINFLAMATORIO_B",
    "ANESTESICO_A",
    "ANESTESICO_B",
    "ANTICOAGULANTE_A",
    "ANTICOAGULANTE_B",
    "SUERO_A",
    "SUERO_B",
    "VITAMINA_A",
    "VITAMINA_B",
    "ANTIHISTAMINICO_A",
];

impl Default for Config {
    fn default() -> Self {
        Config {
            time_unit_ms: 100,
            max_emergency_patients: 50,
            max_appointments: 30,
            max_surgeries_pending: 20,
            triage: TriageConfig {
                triage_emergency_duration: 20,
                triage_appointment_duration: 15,
                critical_threshold: 200,
            },
            surgery: SurgeryConfig {
                bo1_min_duration: 50,
                bo1_max_duration: 100,
                bo2_min_duration: 50,
                bo2_max_duration: 100,
                bo3_min_duration: 50,
                bo3_max_duration: 100,
                cleanup_min_time: 10,
                cleanup_max_time: 20,
                max_medical_teams: 2,
            },
            pharmacy: PharmacyConfig {
                pharmacy_prep_time_min: 5,
                pharmacy_prep_time_max: 15,
                auto_restock_enabled: true,
                restock_qty_multiplier: 2,
                medications: DEFAULT_MEDICATION_NAMES
                    .iter()
                    .map(|name| MedicationSpec {
                        name: (*name).to_string(),
                        initial_stock: 100,
                        threshold: 20,
                        max_capacity: 200,
                    })
                    .collect(),
            },
            lab: LabConfig {
                lab1_min_duration: 10,
                lab1_max_duration: 30,
                lab2_min_duration: 10,
                lab2_max_duration: 30,
                max_simultaneous_tests_lab1: 1,
                max_simultaneous_tests_lab2: 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toml() -> &'static str {
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

            [[pharmacy.medications]]
            name = "ANALGESICO_A"
            initial_stock = 100
            threshold = 20
            max_capacity = 200

            [lab]
            lab1_min_duration = 10
            lab1_max_duration = 30
            lab2_min_duration = 10
            lab2_max_duration = 30
            max_simultaneous_tests_lab1 = 1
            max_simultaneous_tests_lab2 = 1
        "#
    }

    #[test]
    fn deserializes_full_config() {
        let cfg: Config = toml::from_str(sample_toml()).unwrap();
        assert_eq!(cfg.time_unit_ms, 100);
        assert_eq!(cfg.surgery.max_medical_teams, 2);
        assert_eq!(cfg.pharmacy.medications.len(), 1);
        assert_eq!(cfg.pharmacy.medications[0].name, "ANALGESICO_A");
    }

    #[test]
    fn load_reports_missing_file() {
        let result = Config::load(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn default_carries_a_full_medication_table() {
        let cfg = Config::default();
        assert_eq!(cfg.pharmacy.medications.len(), crate::pharmacy::MEDICATION_COUNT);
        assert_eq!(cfg.surgery.max_medical_teams, 2);
    }
}
