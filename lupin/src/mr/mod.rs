pub mod egger;
pub mod instruments;
pub mod ivw;
pub mod leave_one_out;

pub use egger::*;
pub use instruments::*;
pub use ivw::*;
pub use leave_one_out::*;

use serde::Serialize;

/// MR estimates of one locus; NaN where an estimator is undefined
#[derive(Debug, Clone, Serialize)]
pub struct MrResult {
    pub num_instruments: usize,
    pub ivw: IvwResult,
    pub egger: EggerResult,
    pub strength: InstrumentStrength,
}

/// IVW, MR-Egger and instrument strength on the same instruments
pub fn run_mr(instruments: &Instruments) -> MrResult {
    MrResult {
        num_instruments: instruments.len(),
        ivw: mr_ivw(instruments),
        egger: mr_egger(instruments),
        strength: instrument_strength(instruments),
    }
}
