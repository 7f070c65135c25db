use crate::core::models::molecule::Molecule;
use crate::core::models::sample::EnergySample;
use crate::core::utils::geometry::{dihedral_degrees, round_point};
use crate::engine::error::EngineError;
use crate::engine::sampler::client::{ScoringClient, ScoringRequest};
use tracing::{info, instrument};

/// Scores the rest geometry of `molecule` once.
///
/// `dihedral_serials` name the four atoms whose dihedral is reported with the
/// energy.
#[instrument(skip_all, name = "score_workflow")]
pub async fn run<C: ScoringClient>(
    molecule: &Molecule,
    client: &C,
    dihedral_serials: [usize; 4],
    decimals: i32,
) -> Result<EnergySample, EngineError> {
    let mut points = [nalgebra::Point3::origin(); 4];
    for (slot, serial) in points.iter_mut().zip(dihedral_serials) {
        let atom_id = molecule
            .find_atom_by_serial(serial)
            .ok_or(EngineError::AtomNotFound { serial })?;
        let atom = molecule
            .atom(atom_id)
            .ok_or(EngineError::AtomNotFound { serial })?;
        *slot = atom.rest_position;
    }
    let dihedral = dihedral_degrees(&points[0], &points[1], &points[2], &points[3]);

    let coordinates: Vec<_> = molecule
        .rest_positions()
        .iter()
        .map(|p| round_point(p, decimals))
        .collect();
    let request = ScoringRequest::new(&coordinates, &molecule.species());
    let raw_energy = client.score(request).await?;

    let sample = EnergySample::new(0, 0.0, dihedral, raw_energy);
    info!(
        raw_energy = sample.raw_energy,
        energy = sample.energy,
        dihedral = sample.dihedral_degrees,
        "Rest geometry scored."
    );
    Ok(sample)
}
