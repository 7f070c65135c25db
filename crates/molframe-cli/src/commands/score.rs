use crate::cli::ScoreArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use molframe::{
    engine::{config::DEFAULT_SNAPSHOT_DECIMALS, sampler::client::HttpScoringClient},
    workflows,
};
use tracing::info;

pub async fn run(args: ScoreArgs) -> Result<()> {
    let score_config = PartialAppConfig::load(args.config.as_deref())?.merge_for_score(&args)?;
    let molecule = score_config
        .table
        .to_molecule(score_config.deduplicate_relations)?;

    let client = HttpScoringClient::new(
        score_config.scoring.endpoint.clone(),
        score_config.scoring.timeout,
    )?;
    println!(
        "Scoring the rest geometry ({} atoms) at {}...",
        molecule.atom_count(),
        client.endpoint()
    );
    info!("Invoking the core scoring workflow...");

    let sample = workflows::score::run(
        &molecule,
        &client,
        score_config.dihedral_serials,
        DEFAULT_SNAPSHOT_DECIMALS,
    )
    .await?;

    println!(
        "✓ Energy: {:.3} (raw {:.6}), dihedral {:?}: {:.2}°",
        sample.energy, sample.raw_energy, score_config.dihedral_serials, sample.dihedral_degrees
    );
    Ok(())
}
