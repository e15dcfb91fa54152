pub mod cache;
pub mod error;
pub mod host;
pub mod operations;
pub mod orchestrator;
pub mod registry;
pub mod session;
pub mod settings;
pub mod workbench;

pub use cache::DocumentStateCache;
pub use error::{HostError, OperationError, OperationResult, SettingsError, Warning};
pub use host::EditHost;
pub use orchestrator::Calculator;
pub use registry::{Operation, Registry, Timing};
pub use session::{DocumentSession, SelfEditGuard};
pub use settings::Settings;
pub use workbench::{Workbench, settle};
