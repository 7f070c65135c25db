use crate::core::models::sample::EnergySample;
use crate::engine::config::SimulationConfig;
use crate::engine::context::SimulationContext;
use crate::engine::error::EngineError;
use crate::engine::hands::HandInput;
use crate::engine::physics::PhysicsWorld;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::sampler::client::ScoringClient;
use crate::engine::sampler::plot::PlotFrame;
use crate::engine::sampler::{EnergySampler, MergeOutcome};
use crate::engine::scene::SceneGraph;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{info, instrument, warn};

/// How the frame loop relates to wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Frames run back to back; the sampler's clock is `frame * timestep`.
    #[default]
    Fixed,
    /// One frame per timestep of wall-clock time; the sampler's clock is the
    /// real elapsed time.
    RealTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub frames: u64,
    pub pacing: Pacing,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub frames: u64,
    pub simulated_time: f64,
    /// Buffered samples at the end of the run, oldest first.
    pub samples: Vec<EnergySample>,
    pub dispatched: u64,
    pub dropped: u64,
    pub sticks_skipped: usize,
    pub hand_proxies: usize,
    /// RMSD of the final geometry against the rest geometry, atomic units.
    pub drift_rmsd: Option<f64>,
    pub plot: PlotFrame,
}

/// Runs the frame loop headlessly.
///
/// Each frame merges finished scoring results, steps and synchronizes the
/// scene, then lets the sampler dispatch a snapshot when it is due. Without a
/// `client` the sampler is disabled. `hands` supplies the tracked joints for
/// a given frame index.
#[instrument(skip_all, name = "simulation_workflow", fields(frames = options.frames))]
pub async fn run<W, S, C, H>(
    config: SimulationConfig,
    world: W,
    scene: S,
    client: Option<Arc<C>>,
    mut hands: H,
    options: &RunOptions,
    reporter: &ProgressReporter<'_>,
) -> Result<SimulationResult, EngineError>
where
    W: PhysicsWorld,
    S: SceneGraph,
    C: ScoringClient,
    H: FnMut(u64) -> HandInput,
{
    reporter.report(Progress::PhaseStart { name: "Setup" });
    let sampler_config = config.sampler.clone();
    let timestep = config.physics.timestep;
    let mut context = SimulationContext::setup(config, world, scene)?;
    let mut sampler = match client {
        Some(client) => Some(EnergySampler::new(
            client,
            context.molecule().species(),
            context.dihedral_indices()?,
            &sampler_config,
        )),
        None => {
            info!("No scoring client configured; energy sampling is disabled.");
            None
        }
    };
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Simulation" });
    reporter.report(Progress::TaskStart {
        total_steps: options.frames,
    });

    let started = Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(timestep));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sticks_skipped = 0;

    for frame in 0..options.frames {
        match options.pacing {
            Pacing::Fixed => tokio::task::yield_now().await,
            Pacing::RealTime => {
                ticker.tick().await;
            }
        }

        if let Some(sampler) = sampler.as_mut() {
            report_merge(reporter, sampler.merge_completed());
        }

        let proxies_before = context.hands().proxy_count();
        let report = context.step_frame(&hands(frame))?;
        sticks_skipped += report.sticks_skipped;
        let proxies = context.hands().proxy_count();
        if proxies_before == 0 && proxies > 0 {
            reporter.report(Progress::Message(format!(
                "Hand tracking started at frame {frame}: {proxies} joint proxies."
            )));
        }

        if let Some(sampler) = sampler.as_mut() {
            let elapsed = match options.pacing {
                Pacing::Fixed => context.simulated_time(),
                Pacing::RealTime => started.elapsed().as_secs_f64(),
            };
            if sampler.is_due(elapsed) {
                let positions = context.atom_world_positions()?;
                sampler.maybe_sample(elapsed, &positions, &context.placement());
            }
        }

        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let (samples, dispatched, dropped, plot) = match sampler.as_mut() {
        Some(sampler) => {
            reporter.report(Progress::PhaseStart { name: "Draining" });
            if sampler.in_flight() > 0 {
                info!(in_flight = sampler.in_flight(), "Waiting for outstanding scoring requests.");
            }
            report_merge(reporter, sampler.flush().await);
            reporter.report(Progress::PhaseFinish);
            (
                sampler.buffer().to_vec(),
                sampler.dispatched(),
                sampler.dropped(),
                PlotFrame::from_buffer(sampler.buffer()),
            )
        }
        None => (Vec::new(), 0, 0, PlotFrame::default()),
    };

    if dropped > 0 {
        warn!(dropped, dispatched, "Some scoring requests failed.");
    }

    let result = SimulationResult {
        frames: context.frames(),
        simulated_time: context.simulated_time(),
        samples,
        dispatched,
        dropped,
        sticks_skipped,
        hand_proxies: context.hands().proxy_count(),
        drift_rmsd: context.drift_rmsd()?,
        plot,
    };
    info!(
        frames = result.frames,
        samples = result.samples.len(),
        dropped = result.dropped,
        "Simulation complete."
    );
    Ok(result)
}

fn report_merge(reporter: &ProgressReporter, outcome: MergeOutcome) {
    for sample in outcome.recorded {
        reporter.report(Progress::SampleRecorded(sample));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::GeometryTable;
    use crate::engine::config::SimulationConfigBuilder;
    use crate::engine::physics::rigid::RigidWorld;
    use crate::engine::sampler::client::{ScoringError, ScoringRequest};
    use crate::engine::scene::HeadlessScene;
    use nalgebra::Point3;
    use std::future::Future;
    use std::sync::Mutex;

    struct ConstantClient(f64);

    impl ScoringClient for ConstantClient {
        fn score(
            &self,
            _request: ScoringRequest,
        ) -> impl Future<Output = Result<f64, ScoringError>> + Send {
            let energy = self.0;
            async move { Ok(energy) }
        }
    }

    struct BrokenClient;

    impl ScoringClient for BrokenClient {
        fn score(
            &self,
            _request: ScoringRequest,
        ) -> impl Future<Output = Result<f64, ScoringError>> + Send {
            async { Err(ScoringError::Malformed("missing energy".to_string())) }
        }
    }

    fn config() -> SimulationConfig {
        SimulationConfigBuilder::new()
            .table(GeometryTable::builtin())
            .build()
            .unwrap()
    }

    fn options(frames: u64) -> RunOptions {
        RunOptions {
            frames,
            pacing: Pacing::Fixed,
        }
    }

    #[tokio::test]
    async fn samples_are_collected_on_the_simulated_clock() {
        let result = run(
            config(),
            RigidWorld::new(),
            HeadlessScene::new(),
            Some(Arc::new(ConstantClient(0.0))),
            |_| HandInput::untracked(),
            &options(60),
            &ProgressReporter::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.frames, 60);
        assert!((result.simulated_time - 1.0).abs() < 1e-9);
        assert_eq!(result.dispatched, 5);
        assert_eq!(result.samples.len() as u64, result.dispatched);
        assert!(result.samples.iter().all(|s| s.energy == 99403.0));
        assert_eq!(result.plot.markers.len(), result.samples.len());
        assert_eq!(result.dropped, 0);
        assert!(result.drift_rmsd.unwrap() < 1e-9);
    }

    #[tokio::test]
    async fn failed_scoring_drops_samples_without_aborting() {
        let result = run(
            config(),
            RigidWorld::new(),
            HeadlessScene::new(),
            Some(Arc::new(BrokenClient)),
            |_| HandInput::untracked(),
            &options(30),
            &ProgressReporter::new(),
        )
        .await
        .unwrap();

        assert!(result.samples.is_empty());
        assert!(result.dispatched > 0);
        assert_eq!(result.dropped, result.dispatched);
    }

    #[tokio::test]
    async fn offline_run_skips_sampling() {
        let result = run(
            config(),
            RigidWorld::new(),
            HeadlessScene::new(),
            None::<Arc<ConstantClient>>,
            |_| HandInput::untracked(),
            &options(10),
            &ProgressReporter::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.dispatched, 0);
        assert!(result.samples.is_empty());
        assert!(result.plot.line.is_empty());
    }

    #[tokio::test]
    async fn hands_appearing_mid_run_get_proxies() {
        let joints: Vec<_> = (0..25)
            .map(|i| Point3::new(i as f64 * 0.05, 2.0, 1.0))
            .collect();
        let messages = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Message(msg) = event {
                messages.lock().unwrap().push(msg);
            }
        }));
        let result = run(
            config(),
            RigidWorld::new(),
            HeadlessScene::new(),
            None::<Arc<ConstantClient>>,
            |frame| {
                if frame < 3 {
                    HandInput::untracked()
                } else {
                    HandInput::new(joints.clone(), Vec::new())
                }
            },
            &options(6),
            &reporter,
        )
        .await
        .unwrap();
        drop(reporter);

        assert_eq!(result.hand_proxies, 25);
        let messages = messages.into_inner().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("frame 3"));
        assert!(messages[0].contains("25 joint proxies"));
    }

    #[tokio::test]
    async fn progress_reports_every_frame_and_sample() {
        let increments = Mutex::new(0u64);
        let samples = Mutex::new(0usize);
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::TaskIncrement => *increments.lock().unwrap() += 1,
            Progress::SampleRecorded(_) => *samples.lock().unwrap() += 1,
            _ => {}
        }));

        let result = run(
            config(),
            RigidWorld::new(),
            HeadlessScene::new(),
            Some(Arc::new(ConstantClient(-0.01))),
            |_| HandInput::untracked(),
            &options(25),
            &reporter,
        )
        .await
        .unwrap();
        drop(reporter);

        assert_eq!(increments.into_inner().unwrap(), 25);
        assert_eq!(samples.into_inner().unwrap(), result.samples.len());
    }

    #[tokio::test]
    async fn invalid_dihedral_serials_fail_setup() {
        let mut config = config();
        config.sampler.dihedral_serials = [1, 2, 3, 99];
        let result = run(
            config,
            RigidWorld::new(),
            HeadlessScene::new(),
            Some(Arc::new(ConstantClient(0.0))),
            |_| HandInput::untracked(),
            &options(1),
            &ProgressReporter::new(),
        )
        .await;
        assert!(matches!(result, Err(EngineError::AtomNotFound { serial: 99 })));
    }
}
