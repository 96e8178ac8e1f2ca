//! The statistics block — one coarse `Mutex`, written on every notable
//! state transition across every subsystem. Writes are infrequent enough
//! relative to the simulation's tick rate that a single lock is measured
//! negligible, matching the Design Notes' stated rationale for not
//! fine-graining it like the stock table.

use std::collections::HashMap;
use std::sync::Mutex;

use common::Tick;

#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    pub tick: Tick,
    pub emergencies_admitted: u64,
    pub appointments_admitted: u64,
    pub rejected_patients: u64,
    pub critical_transfers: u64,
    pub patients_died: u64,
    pub patients_completed: u64,
    pub total_triage_wait_time: u64,
    pub surgeries_completed: u64,
    pub cancelled_surgeries: u64,
    pub total_surgery_wait_time: u64,
    pub lab_tests_completed: u64,
    pub pharmacy_dispensed: u64,
    pub stock_depletions: u64,
    pub auto_restocks: u64,
    pub medication_usage: HashMap<String, u64>,
}

pub struct Stats {
    inner: Mutex<StatsSnapshot>,
}

impl Stats {
    pub fn new() -> Self {
        Stats {
            inner: Mutex::new(StatsSnapshot::default()),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_tick(&self, tick: Tick) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).tick = tick;
    }

    fn bump<F: FnOnce(&mut StatsSnapshot)>(&self, f: F) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
    }

    pub fn emergency_admitted(&self) {
        self.bump(|s| s.emergencies_admitted += 1);
    }
    pub fn appointment_admitted(&self) {
        self.bump(|s| s.appointments_admitted += 1);
    }
    pub fn patient_rejected(&self) {
        self.bump(|s| s.rejected_patients += 1);
    }
    pub fn critical_transfer(&self) {
        self.bump(|s| s.critical_transfers += 1);
    }
    pub fn patient_died(&self) {
        self.bump(|s| s.patients_died += 1);
    }
    pub fn record_triage_wait_time(&self, wait_time: u64) {
        self.bump(|s| s.total_triage_wait_time += wait_time);
    }
    pub fn patient_completed(&self) {
        self.bump(|s| s.patients_completed += 1);
    }
    pub fn record_surgery_wait_time(&self, wait_time: u64) {
        self.bump(|s| s.total_surgery_wait_time += wait_time);
    }
    pub fn surgery_completed(&self) {
        self.bump(|s| s.surgeries_completed += 1);
    }
    pub fn surgery_cancelled(&self) {
        self.bump(|s| s.cancelled_surgeries += 1);
    }
    pub fn lab_test_completed(&self) {
        self.bump(|s| s.lab_tests_completed += 1);
    }
    pub fn pharmacy_dispensed(&self) {
        self.bump(|s| s.pharmacy_dispensed += 1);
    }
    pub fn stock_depletion(&self) {
        self.bump(|s| s.stock_depletions += 1);
    }
    pub fn auto_restock(&self) {
        self.bump(|s| s.auto_restocks += 1);
    }
    pub fn medication_used(&self, med_name: &str, qty: u32) {
        self.bump(|s| *s.medication_usage.entry(med_name.to_string()).or_insert(0) += qty as u64);
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}
