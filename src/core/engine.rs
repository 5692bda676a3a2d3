use crate::core::Pipeline;
use crate::domain::model::StageSummary;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Which stage(s) to run. Stages gate on their inputs, so running a late mode
/// against an empty database fails with a hint naming the mode to run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Mode {
    Ingest,
    Silver,
    Dims,
    Gold,
    Export,
    All,
}

impl Mode {
    fn runs(self, stage: Mode) -> bool {
        self == Mode::All || self == stage
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::Ingest => "ingest",
            Mode::Silver => "silver",
            Mode::Dims => "dims",
            Mode::Gold => "gold",
            Mode::Export => "export",
            Mode::All => "all",
        };
        f.write_str(name)
    }
}

/// Drives a [`Pipeline`] through the stages selected by a [`Mode`], logging
/// resource stats between stages when monitoring is enabled.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self, mode: Mode) -> Result<Vec<StageSummary>> {
        tracing::info!("Starting medallion pipeline (mode: {})", mode);
        let mut summaries = Vec::new();

        if mode.runs(Mode::Ingest) {
            summaries.push(self.pipeline.ingest().await?);
            self.monitor.log_stats("INGEST");
        }
        if mode.runs(Mode::Silver) {
            summaries.push(self.pipeline.silver().await?);
            self.monitor.log_stats("SILVER");
        }
        if mode.runs(Mode::Dims) {
            summaries.push(self.pipeline.dims().await?);
            self.monitor.log_stats("DIMS");
        }
        if mode.runs(Mode::Gold) {
            summaries.push(self.pipeline.gold().await?);
            self.monitor.log_stats("GOLD");
        }
        if mode.runs(Mode::Export) {
            summaries.push(self.pipeline.export().await?);
            self.monitor.log_stats("EXPORT");
        }

        self.monitor.log_final_stats();
        tracing::info!("DONE");
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EtlError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingPipeline {
        calls: Mutex<Vec<&'static str>>,
        fail_at: Option<&'static str>,
    }

    impl RecordingPipeline {
        fn new(fail_at: Option<&'static str>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_at,
            }
        }

        fn record(&self, stage: &'static str) -> Result<StageSummary> {
            self.calls.lock().unwrap().push(stage);
            if self.fail_at == Some(stage) {
                return Err(EtlError::ProcessingError {
                    message: format!("{} failed", stage),
                });
            }
            Ok(StageSummary::new(stage))
        }
    }

    #[async_trait]
    impl Pipeline for RecordingPipeline {
        async fn ingest(&self) -> Result<StageSummary> {
            self.record("ingest")
        }
        async fn silver(&self) -> Result<StageSummary> {
            self.record("silver")
        }
        async fn dims(&self) -> Result<StageSummary> {
            self.record("dims")
        }
        async fn gold(&self) -> Result<StageSummary> {
            self.record("gold")
        }
        async fn export(&self) -> Result<StageSummary> {
            self.record("export")
        }
    }

    #[tokio::test]
    async fn test_mode_all_runs_every_stage_in_order() {
        let engine = EtlEngine::new(RecordingPipeline::new(None));
        let summaries = engine.run(Mode::All).await.unwrap();
        assert_eq!(summaries.len(), 5);
        assert_eq!(
            *engine.pipeline.calls.lock().unwrap(),
            vec!["ingest", "silver", "dims", "gold", "export"]
        );
    }

    #[tokio::test]
    async fn test_single_mode_runs_one_stage() {
        let engine = EtlEngine::new(RecordingPipeline::new(None));
        let summaries = engine.run(Mode::Dims).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(*engine.pipeline.calls.lock().unwrap(), vec!["dims"]);
    }

    #[tokio::test]
    async fn test_failure_stops_the_run() {
        let engine = EtlEngine::new(RecordingPipeline::new(Some("silver")));
        let err = engine.run(Mode::All).await.unwrap_err();
        assert!(matches!(err, EtlError::ProcessingError { .. }));
        assert_eq!(
            *engine.pipeline.calls.lock().unwrap(),
            vec!["ingest", "silver"]
        );
    }
}
