use crate::core::models::sample::EnergySample;

#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// A scored sample was merged into the buffer.
    SampleRecorded(EnergySample),

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_ignores_events() {
        ProgressReporter::new().report(Progress::TaskIncrement);
    }

    #[test]
    fn reporter_forwards_events_in_order() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            let label = match event {
                Progress::PhaseStart { name } => name.to_string(),
                Progress::SampleRecorded(sample) => format!("sample {}", sample.sequence),
                other => format!("{other:?}"),
            };
            seen.lock().unwrap().push(label);
        }));

        reporter.report(Progress::PhaseStart { name: "Setup" });
        reporter.report(Progress::SampleRecorded(EnergySample::new(4, 0.8, 0.0, 0.0)));
        reporter.report(Progress::TaskFinish);
        drop(reporter);

        assert_eq!(
            seen.into_inner().unwrap(),
            vec!["Setup", "sample 4", "TaskFinish"]
        );
    }
}
