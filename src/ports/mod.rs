// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for media file probing and analysis
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe media file and return its metadata
    async fn probe_media(&self, file_path: &Path) -> Result<MediaMetadata, DomainError>;

    /// Probe only the duration in seconds
    async fn probe_duration(&self, file_path: &Path) -> Result<f64, DomainError> {
        Ok(self.probe_media(file_path).await?.duration)
    }
}

/// One call of the external media engine: an argument list producing one file
#[derive(Debug, Clone, PartialEq)]
pub struct EngineInvocation {
    /// Short name used in logs and error messages
    pub label: String,
    /// Arguments between the global flags and the output path
    pub args: Vec<String>,
    pub output_path: PathBuf,
}

impl EngineInvocation {
    pub fn new(label: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            args: Vec::new(),
            output_path: output_path.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `-i <path>`
    pub fn input(self, path: &Path) -> Self {
        self.arg("-i").arg(path.to_string_lossy())
    }

    /// Input paths in the order they were added
    pub fn inputs(&self) -> Vec<PathBuf> {
        self.args
            .windows(2)
            .filter(|pair| pair[0] == "-i")
            .map(|pair| PathBuf::from(&pair[1]))
            .collect()
    }

    /// Value following the first occurrence of `flag`
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .windows(2)
            .find(|pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
    }

    /// Full argument vector handed to the engine binary
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
        ];
        argv.extend(self.args.iter().cloned());
        argv.push(self.output_path.to_string_lossy().into_owned());
        argv
    }
}

/// Port for the external media engine
#[async_trait]
pub trait ExecutePort: Send + Sync {
    /// Run one invocation to completion
    async fn execute(&self, invocation: &EngineInvocation) -> Result<(), DomainError>;
}
