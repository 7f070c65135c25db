use crate::cli::RunArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use molframe::{
    core::io::samples::write_samples_to_path,
    engine::{
        hands::HandInput, physics::rigid::RigidWorld, progress::ProgressReporter,
        sampler::client::HttpScoringClient, scene::HeadlessScene,
    },
    workflows::{self, simulate::SimulationResult},
};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run(args: RunArgs) -> Result<()> {
    let partial_config = PartialAppConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let app_config = partial_config.merge_with_cli(&args)?;

    let physics = &app_config.core_config.physics;
    let world = RigidWorld::new()
        .with_gravity(physics.gravity)
        .with_solver_iterations(physics.solver_iterations);
    let scene = HeadlessScene::new();

    let client = match &app_config.scoring {
        Some(settings) => {
            let client = HttpScoringClient::new(settings.endpoint.clone(), settings.timeout)?;
            info!("Energy samples will be scored by {}", client.endpoint());
            Some(Arc::new(client))
        }
        None => {
            warn!("Energy sampling is disabled; the scene runs offline.");
            None
        }
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Simulating {} frame(s) of the molecule scene...",
        app_config.run_options.frames
    );
    let result = workflows::simulate::run(
        app_config.core_config,
        world,
        scene,
        client,
        |_| HandInput::untracked(),
        &app_config.run_options,
        &reporter,
    )
    .await?;

    print_summary(&result);

    if let Some(output_path) = &app_config.output_path {
        if result.samples.is_empty() {
            warn!("No energy samples were recorded; writing a header-only file.");
        }
        info!(
            "Writing {} sample(s) to {:?}",
            result.samples.len(),
            output_path
        );
        write_samples_to_path(output_path, &result.samples)?;
        println!("✓ Samples written to: {}", output_path.display());
    }

    Ok(())
}

fn print_summary(result: &SimulationResult) {
    println!(
        "Ran {} frame(s), {:.2}s of simulated time.",
        result.frames, result.simulated_time
    );
    println!(
        "  Snapshots dispatched: {}, recorded: {}, dropped: {}",
        result.dispatched,
        result.samples.len(),
        result.dropped
    );
    if let Some(latest) = result.samples.last() {
        println!(
            "  Latest energy: {:.3} at dihedral {:.2}° (t={:.2}s)",
            latest.energy, latest.dihedral_degrees, latest.time
        );
    }
    if let Some(rmsd) = result.drift_rmsd {
        println!("  Drift from rest geometry (RMSD): {:.4}", rmsd);
    }
    if result.sticks_skipped > 0 {
        warn!(
            "{} stick update(s) were skipped because their atoms coincided.",
            result.sticks_skipped
        );
    }
    info!(
        "Plot frame holds {} marker(s) and {} line point(s).",
        result.plot.markers.len(),
        result.plot.line.len()
    );
}
