use std::sync::Arc;

use crate::adapters::{FFmpegAdapter, FFprobeAdapter};
use crate::app::{
    pipeline_interactor::{PipelineInteractor, PipelineOptions},
    variant_interactor::VariantInteractor,
};
use crate::config_initialization::Settings;
use crate::ports::{ExecutePort, ProbePort};

pub trait AppContainer: Send + Sync {
    fn pipeline_interactor(&self) -> Arc<PipelineInteractor>;
    fn variant_interactor(&self) -> Arc<VariantInteractor>;
}

pub struct DefaultAppContainer {
    pipeline_interactor: Arc<PipelineInteractor>,
    variant_interactor: Arc<VariantInteractor>,
}

impl DefaultAppContainer {
    /// Wire the ffmpeg/ffprobe adapters configured in `settings`
    pub fn new(settings: &Settings) -> Self {
        let execute_port = Arc::new(FFmpegAdapter::new(settings.ffmpeg_path.clone()));
        let probe_port = Arc::new(FFprobeAdapter::new(settings.ffprobe_path.clone()));
        Self::with_ports(execute_port, probe_port, settings)
    }

    /// Wire arbitrary port implementations
    pub fn with_ports(
        execute_port: Arc<dyn ExecutePort>,
        probe_port: Arc<dyn ProbePort>,
        settings: &Settings,
    ) -> Self {
        let options = PipelineOptions {
            stage_timeout: settings.stage_timeout,
            temp_root: settings.temp_root.clone(),
            default_output_dir: settings.output_dir.clone(),
        };

        let pipeline_interactor = Arc::new(PipelineInteractor::new(
            Arc::clone(&execute_port),
            Arc::clone(&probe_port),
            options,
        ));

        let variant_interactor = Arc::new(VariantInteractor::new(
            Arc::clone(&pipeline_interactor),
            settings.max_concurrent_variants,
        ));

        Self {
            pipeline_interactor,
            variant_interactor,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn pipeline_interactor(&self) -> Arc<PipelineInteractor> {
        Arc::clone(&self.pipeline_interactor)
    }

    fn variant_interactor(&self) -> Arc<VariantInteractor> {
        Arc::clone(&self.variant_interactor)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_container_carries_settings() {
        let settings = Settings {
            stage_timeout: Duration::from_secs(42),
            temp_root: Some(PathBuf::from("/scratch")),
            max_concurrent_variants: 2,
            ..Default::default()
        };
        let container = DefaultAppContainer::new(&settings);

        let options = container.pipeline_interactor().options().clone();
        assert_eq!(options.stage_timeout, Duration::from_secs(42));
        assert_eq!(options.temp_root, Some(PathBuf::from("/scratch")));
        assert_eq!(container.variant_interactor().max_concurrent(), 2);
    }
}
