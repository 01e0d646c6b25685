pub mod bloom;
pub mod calculations;
pub mod fusion;
pub mod geocode;
pub mod orchestrator;
pub mod report_text;
pub mod rules;
pub mod session;
pub mod trend;
pub mod vegetation;

pub use geocode::GeocodeResolver;
pub use orchestrator::{
    OrchestratorSettings, Providers, ReportOutcome, ReportRequest, RequestOrchestrator,
};
pub use report_text::format_report;
pub use session::ReportSession;
