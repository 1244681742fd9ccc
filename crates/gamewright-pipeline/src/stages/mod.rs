//! The concrete game pipeline stages.

mod assets;
mod codegen;
mod concept;
mod finalize;
mod plan;
mod qa;
mod save;

pub use assets::AssetGenerationStage;
pub use codegen::CodeGenerationStage;
pub use concept::ConceptExpansionStage;
pub use finalize::FinalizeStage;
pub use plan::FilePlanningStage;
pub use qa::{QaReviewStage, QA_REPORT_PATH};
pub use save::SaveTextStage;

pub(crate) use finalize::{render_launcher, render_readme};
pub(crate) use qa::placeholder_report;
