/// A single pharmacy stock row as declared in configuration. The live
/// runtime counterpart (current stock behind its own mutex) lives in the
/// `ipc` crate's stock table — this is only the static, config-level shape.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct MedicationSpec {
    pub name: String,
    pub initial_stock: u32,
    pub threshold: u32,
    pub max_capacity: u32,
}

pub const MEDICATION_COUNT: usize = 15;
