use serde::{Deserialize, Serialize};

/// Hartree to kcal/mol.
pub const HARTREE_TO_KCAL_MOL: f64 = 627.509;

/// Offset added after unit conversion so energies near the reference
/// conformation land close to zero on the plot.
pub const DISPLAY_ENERGY_OFFSET: f64 = 99403.0;

/// Converts a raw service energy (Hartree) into display units.
#[inline]
pub fn to_display_energy(raw_energy: f64) -> f64 {
    raw_energy * HARTREE_TO_KCAL_MOL + DISPLAY_ENERGY_OFFSET
}

/// One scored snapshot of the molecule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergySample {
    /// Dispatch order of the snapshot, starting at zero.
    pub sequence: u64,
    /// Simulated time at which the snapshot was taken.
    pub time: f64,
    /// C1-C2-C3-C4 dihedral angle of the snapshot, in degrees.
    pub dihedral_degrees: f64,
    /// Energy as returned by the scoring service.
    pub raw_energy: f64,
    /// Energy after conversion to display units.
    pub energy: f64,
}

impl EnergySample {
    pub fn new(sequence: u64, time: f64, dihedral_degrees: f64, raw_energy: f64) -> Self {
        Self {
            sequence,
            time,
            dihedral_degrees,
            raw_energy,
            energy: to_display_energy(raw_energy),
        }
    }
}
