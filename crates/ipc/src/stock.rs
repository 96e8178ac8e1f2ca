//! Pharmacy stock table — one mutex per medication row rather than one
//! global pharmacy lock, per the Design Notes' shared-resource policy.
//! Pharmacy workers never hold more than one row's mutex at a time.

use std::sync::Mutex;

use common::pharmacy::MedicationSpec;

struct Row {
    name: String,
    current_stock: u32,
    reserved: u32,
    threshold: u32,
    max_capacity: u32,
}

pub struct StockTable {
    rows: Vec<Mutex<Row>>,
}

/// Index into the stock table, resolved once at startup from medication
/// name so hot-path code never does a string comparison.
pub type MedId = usize;

impl StockTable {
    pub fn new(specs: &[MedicationSpec]) -> Self {
        let rows = specs
            .iter()
            .map(|spec| {
                Mutex::new(Row {
                    name: spec.name.clone(),
                    current_stock: spec.initial_stock,
                    reserved: 0,
                    threshold: spec.threshold,
                    max_capacity: spec.max_capacity,
                })
            })
            .collect();
        StockTable { rows }
    }

    pub fn find(&self, name: &str) -> Option<MedId> {
        self.rows.iter().position(|row| {
            row.lock().unwrap_or_else(|e| e.into_inner()).name == name
        })
    }

    /// Reserves `qty` units if `current_stock - reserved >= qty`. Reserving
    /// does not move stock, it only guarantees a later `dispense` call won't
    /// oversell while the preparation sleep runs unlocked.
    pub fn reserve(&self, med: MedId, qty: u32) -> bool {
        let mut row = self.rows[med].lock().unwrap_or_else(|e| e.into_inner());
        if row.current_stock.saturating_sub(row.reserved) >= qty {
            row.reserved += qty;
            true
        } else {
            false
        }
    }

    pub fn release_reservation(&self, med: MedId, qty: u32) {
        let mut row = self.rows[med].lock().unwrap_or_else(|e| e.into_inner());
        row.reserved = row.reserved.saturating_sub(qty);
    }

    /// Direct manual restock (the `RESTOCK` command), capped at the row's
    /// configured maximum capacity.
    pub fn add_stock(&self, med: MedId, qty: u32) -> u32 {
        let mut row = self.rows[med].lock().unwrap_or_else(|e| e.into_inner());
        row.current_stock = (row.current_stock + qty).min(row.max_capacity);
        row.current_stock
    }

    /// Commits a previously reserved quantity, applying auto-restock if
    /// configured. Returns `(depleted, restocked)`.
    pub fn dispense(
        &self,
        med: MedId,
        qty: u32,
        auto_restock_enabled: bool,
        restock_qty_multiplier: u32,
    ) -> (bool, bool) {
        let mut row = self.rows[med].lock().unwrap_or_else(|e| e.into_inner());
        row.current_stock = row.current_stock.saturating_sub(qty);
        row.reserved = row.reserved.saturating_sub(qty);
        let depleted = row.current_stock == 0;
        let mut restocked = false;
        if auto_restock_enabled && row.current_stock < row.threshold {
            let add = row.threshold * restock_qty_multiplier;
            row.current_stock = (row.current_stock + add).min(row.max_capacity);
            restocked = true;
        }
        (depleted, restocked)
    }

    pub fn current_stock(&self, med: MedId) -> u32 {
        self.rows[med].lock().unwrap_or_else(|e| e.into_inner()).current_stock
    }
}
