// Application layer - Use case interactors

pub mod container;
pub mod pipeline_interactor;
pub mod variant_interactor;

// Re-export interactors
pub use pipeline_interactor::{PipelineInteractor, PipelineOptions, StagePlan};
pub use variant_interactor::VariantInteractor;
