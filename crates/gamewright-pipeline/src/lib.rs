//! Fan-out generation, asset recovery, and the concrete game pipeline.
//!
//! [`GamePipeline`] wires the stages into a [`gamewright_flow::Flow`]:
//! concept expansion feeds planning and asset generation, planning feeds
//! the fan-out code writer, and QA plus finalize close the run out with a
//! report, a README, and a guaranteed launcher page.

mod fanout;
mod parse;
mod pipeline;
mod recovery;
mod roles;
mod stages;

pub use fanout::{FanOutReport, FanOutWriter};
pub use parse::{extract_json, parse_schema, strip_code_fence};
pub use pipeline::GamePipeline;
pub use recovery::{AssetRecoveryPolicy, WithFallback, ASSET_LOG_PATH};
pub use stages::{
    AssetGenerationStage, CodeGenerationStage, ConceptExpansionStage, FilePlanningStage,
    FinalizeStage, QaReviewStage, SaveTextStage, QA_REPORT_PATH,
};
