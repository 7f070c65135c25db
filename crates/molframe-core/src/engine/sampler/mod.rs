//! # Energy Sampler
//!
//! Periodically snapshots the atom positions, scores each snapshot on a
//! remote service and collects the results into a bounded buffer for the
//! energy/dihedral plot.
//!
//! Scoring runs as tokio tasks so the frame loop never waits on the network.
//! Finished requests report back over a channel and are merged at the start
//! of the next frame, which keeps every buffer mutation on the frame loop.
//! A failed request only costs its own sample; nothing is retried.

pub mod buffer;
pub mod client;
pub mod plot;

use self::buffer::SampleBuffer;
use self::client::{ScoringClient, ScoringError, ScoringRequest};
use super::config::SamplerConfig;
use crate::core::models::sample::EnergySample;
use crate::core::utils::geometry::{Placement, dihedral_degrees, round_point};
use nalgebra::Point3;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Slack on the throttle so a fixed-step clock that lands on the interval
/// (12 frames of 1/60 for 0.2) is not pushed back a frame by rounding.
const DUE_EPSILON: f64 = 1e-9;

/// Atom coordinates captured for one scoring request.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub sequence: u64,
    pub time: f64,
    /// Atomic units, rounded, in table order.
    pub coordinates: Vec<Point3<f64>>,
    pub dihedral_degrees: f64,
}

impl Snapshot {
    /// Undoes the scene placement and rounds every coordinate.
    ///
    /// The dihedral is taken from the unrounded atomic positions.
    /// `dihedral_indices` index into `world_positions`.
    pub fn capture(
        sequence: u64,
        time: f64,
        world_positions: &[Point3<f64>],
        placement: &Placement,
        decimals: i32,
        dihedral_indices: [usize; 4],
    ) -> Option<Self> {
        let atomic: Vec<_> = world_positions
            .iter()
            .map(|p| placement.to_atomic(p))
            .collect();
        let [i, j, k, l] = dihedral_indices;
        let dihedral = dihedral_degrees(
            atomic.get(i)?,
            atomic.get(j)?,
            atomic.get(k)?,
            atomic.get(l)?,
        );
        let coordinates = atomic.iter().map(|p| round_point(p, decimals)).collect();
        Some(Self {
            sequence,
            time,
            coordinates,
            dihedral_degrees: dihedral,
        })
    }
}

#[derive(Debug)]
struct Completion {
    sequence: u64,
    time: f64,
    dihedral_degrees: f64,
    result: Result<f64, ScoringError>,
}

/// Result of merging finished requests into the buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub recorded: Vec<EnergySample>,
    pub dropped: usize,
}

pub struct EnergySampler<C: ScoringClient> {
    client: Arc<C>,
    species: Vec<u8>,
    dihedral_indices: [usize; 4],
    decimals: i32,
    interval: f64,
    buffer: SampleBuffer,
    last_dispatch: f64,
    next_sequence: u64,
    in_flight: usize,
    dropped: u64,
    sender: mpsc::UnboundedSender<Completion>,
    receiver: mpsc::UnboundedReceiver<Completion>,
}

impl<C: ScoringClient> EnergySampler<C> {
    /// `species` gives the atomic numbers in table order, and
    /// `dihedral_indices` are 0-based positions in that order.
    pub fn new(
        client: Arc<C>,
        species: Vec<u8>,
        dihedral_indices: [usize; 4],
        config: &SamplerConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            client,
            species,
            dihedral_indices,
            decimals: config.snapshot_decimals,
            interval: config.interval,
            buffer: SampleBuffer::new(config.capacity),
            last_dispatch: 0.0,
            next_sequence: 0,
            in_flight: 0,
            dropped: 0,
            sender,
            receiver,
        }
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn dispatched(&self) -> u64 {
        self.next_sequence
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Whether enough time passed since the last dispatch.
    pub fn is_due(&self, elapsed: f64) -> bool {
        elapsed - self.last_dispatch >= self.interval - DUE_EPSILON
    }

    /// Captures and dispatches a snapshot if the throttle allows it.
    ///
    /// Must be called from within a tokio runtime. Returns the snapshot that
    /// was sent, if any.
    pub fn maybe_sample(
        &mut self,
        elapsed: f64,
        world_positions: &[Point3<f64>],
        placement: &Placement,
    ) -> Option<Snapshot> {
        if !self.is_due(elapsed) {
            return None;
        }
        self.last_dispatch = elapsed;

        let Some(snapshot) = Snapshot::capture(
            self.next_sequence,
            elapsed,
            world_positions,
            placement,
            self.decimals,
            self.dihedral_indices,
        ) else {
            warn!(
                atoms = world_positions.len(),
                "Snapshot is missing dihedral atoms; sample skipped."
            );
            return None;
        };
        self.dispatch(snapshot.clone());
        Some(snapshot)
    }

    fn dispatch(&mut self, snapshot: Snapshot) {
        self.next_sequence += 1;
        self.in_flight += 1;

        let client = Arc::clone(&self.client);
        let sender = self.sender.clone();
        let request = ScoringRequest::new(&snapshot.coordinates, &self.species);
        debug!(sequence = snapshot.sequence, time = snapshot.time, "Dispatching snapshot.");

        tokio::spawn(async move {
            let result = client.score(request).await;
            // The receiver lives as long as the sampler; a send error only
            // means the sampler was dropped mid-request.
            let _ = sender.send(Completion {
                sequence: snapshot.sequence,
                time: snapshot.time,
                dihedral_degrees: snapshot.dihedral_degrees,
                result,
            });
        });
    }

    /// Merges every request that finished since the last call.
    pub fn merge_completed(&mut self) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        while let Ok(completion) = self.receiver.try_recv() {
            self.absorb(completion, &mut outcome);
        }
        outcome
    }

    /// Waits for every in-flight request and merges the results.
    pub async fn flush(&mut self) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        while self.in_flight > 0 {
            match self.receiver.recv().await {
                Some(completion) => self.absorb(completion, &mut outcome),
                None => break,
            }
        }
        outcome
    }

    fn absorb(&mut self, completion: Completion, outcome: &mut MergeOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion.result {
            Ok(raw_energy) => {
                let sample = EnergySample::new(
                    completion.sequence,
                    completion.time,
                    completion.dihedral_degrees,
                    raw_energy,
                );
                debug!(
                    sequence = sample.sequence,
                    energy = sample.energy,
                    dihedral = sample.dihedral_degrees,
                    "Sample recorded."
                );
                self.buffer.push(sample);
                outcome.recorded.push(sample);
            }
            Err(e) => {
                self.dropped += 1;
                outcome.dropped += 1;
                warn!(sequence = completion.sequence, error = %e, "Scoring failed; sample dropped.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClient {
        energy: f64,
        calls: AtomicUsize,
        requests: Mutex<Vec<ScoringRequest>>,
    }

    impl FixedClient {
        fn new(energy: f64) -> Self {
            Self {
                energy,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl ScoringClient for FixedClient {
        fn score(
            &self,
            request: ScoringRequest,
        ) -> impl Future<Output = Result<f64, ScoringError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            let energy = self.energy;
            async move { Ok(energy) }
        }
    }

    struct FailingClient;

    impl ScoringClient for FailingClient {
        fn score(
            &self,
            _request: ScoringRequest,
        ) -> impl Future<Output = Result<f64, ScoringError>> + Send {
            async { Err(ScoringError::Status(503)) }
        }
    }

    fn placement() -> Placement {
        Placement::new(0.1, nalgebra::Vector3::new(0.0, 1.15, -0.5))
    }

    /// Four carbons with a -90 degree dihedral, already placed in the world.
    fn world_positions() -> Vec<Point3<f64>> {
        let atomic = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        atomic.iter().map(|p| placement().to_world(p)).collect()
    }

    fn sampler<C: ScoringClient>(client: Arc<C>, capacity: usize) -> EnergySampler<C> {
        let config = SamplerConfig {
            capacity,
            ..SamplerConfig::default()
        };
        EnergySampler::new(client, vec![6, 6, 6, 6], [0, 1, 2, 3], &config)
    }

    #[test]
    fn snapshot_undoes_placement_and_rounds() {
        let positions = vec![Point3::new(0.12346, 1.15 + 0.00001, -0.5 + 0.2)];
        let snapshot = Snapshot::capture(0, 0.2, &positions, &placement(), 3, [0, 0, 0, 0]).unwrap();
        let p = snapshot.coordinates[0];
        assert!((p.x - 1.235).abs() < 1e-9);
        assert!((p.y - 0.0).abs() < 1e-9);
        assert!((p.z - 2.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_dihedral_uses_unrounded_positions() {
        let atomic = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0004, 1.0, 1.0),
        ];
        let positions: Vec<_> = atomic.iter().map(|p| placement().to_world(p)).collect();
        let snapshot = Snapshot::capture(0, 0.2, &positions, &placement(), 3, [0, 1, 2, 3]).unwrap();

        let exact = dihedral_degrees(&atomic[0], &atomic[1], &atomic[2], &atomic[3]);
        assert!((snapshot.dihedral_degrees - exact).abs() < 1e-6);
        assert!((snapshot.dihedral_degrees + 90.0).abs() > 1e-3);
        assert!((snapshot.coordinates[3].x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_without_dihedral_atoms_is_none() {
        let positions = world_positions();
        assert!(Snapshot::capture(0, 0.0, &positions[..3], &placement(), 3, [0, 1, 2, 3]).is_none());
    }

    #[tokio::test]
    async fn throttle_dispatches_at_most_once_per_interval() {
        let client = Arc::new(FixedClient::new(0.0));
        let mut sampler = sampler(Arc::clone(&client), 150);
        let positions = world_positions();

        assert!(sampler.maybe_sample(0.1, &positions, &placement()).is_none());
        assert!(sampler.maybe_sample(0.2, &positions, &placement()).is_some());
        assert!(sampler.maybe_sample(0.3, &positions, &placement()).is_none());
        assert!(sampler.maybe_sample(0.45, &positions, &placement()).is_some());
        sampler.flush().await;

        assert_eq!(sampler.dispatched(), 2);
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fixed_step_clock_dispatches_every_twelve_frames() {
        let mut sampler = sampler(Arc::new(FixedClient::new(0.0)), 150);
        let positions = world_positions();
        let timestep = 1.0 / 60.0;

        let mut dispatch_frames = Vec::new();
        for frame in 1..=60u64 {
            let elapsed = frame as f64 * timestep;
            if sampler.maybe_sample(elapsed, &positions, &placement()).is_some() {
                dispatch_frames.push(frame);
            }
        }
        sampler.flush().await;

        assert_eq!(dispatch_frames, vec![12, 24, 36, 48, 60]);
        assert_eq!(sampler.dispatched(), 5);
    }

    #[tokio::test]
    async fn successful_score_is_converted_and_buffered() {
        let client = Arc::new(FixedClient::new(0.0));
        let mut sampler = sampler(Arc::clone(&client), 150);
        let snapshot = sampler
            .maybe_sample(0.2, &world_positions(), &placement())
            .unwrap();
        assert!((snapshot.dihedral_degrees + 90.0).abs() < 1e-9);

        let outcome = sampler.flush().await;
        assert_eq!(outcome.recorded.len(), 1);
        assert_eq!(outcome.dropped, 0);

        let sample = sampler.buffer().latest().unwrap();
        assert_eq!(sample.energy, 99403.0);
        assert_eq!(sample.time, 0.2);
        assert!((sample.dihedral_degrees + 90.0).abs() < 1e-9);
        assert_eq!(sampler.in_flight(), 0);
    }

    #[tokio::test]
    async fn request_carries_rounded_atomic_coordinates_and_species() {
        let client = Arc::new(FixedClient::new(0.0));
        let mut sampler = sampler(Arc::clone(&client), 150);
        sampler.maybe_sample(0.2, &world_positions(), &placement());
        sampler.flush().await;

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].species, vec![vec![6, 6, 6, 6]]);
        let last = requests[0].coordinates[0][3];
        assert!((last[0] - 1.0).abs() < 1e-9);
        assert!((last[1] - 1.0).abs() < 1e-9);
        assert!((last[2] - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn failed_score_leaves_buffer_untouched() {
        let mut sampler = sampler(Arc::new(FailingClient), 150);
        sampler.maybe_sample(0.2, &world_positions(), &placement());
        let outcome = sampler.flush().await;

        assert!(outcome.recorded.is_empty());
        assert_eq!(outcome.dropped, 1);
        assert!(sampler.buffer().is_empty());
        assert_eq!(sampler.dropped(), 1);
        assert_eq!(sampler.in_flight(), 0);
    }

    #[tokio::test]
    async fn buffer_evicts_oldest_beyond_capacity() {
        let client = Arc::new(FixedClient::new(0.0));
        let mut sampler = sampler(client, 150);
        let positions = world_positions();
        for i in 1..=151 {
            sampler.maybe_sample(i as f64, &positions, &placement());
            sampler.flush().await;
        }
        assert_eq!(sampler.buffer().len(), 150);
        assert_eq!(sampler.buffer().iter().next().unwrap().sequence, 1);
        assert_eq!(sampler.buffer().latest().unwrap().sequence, 150);
    }

    #[tokio::test]
    async fn merge_completed_does_not_block() {
        let mut sampler = sampler(Arc::new(FixedClient::new(0.0)), 150);
        let outcome = sampler.merge_completed();
        assert_eq!(outcome, MergeOutcome::default());
    }
}
