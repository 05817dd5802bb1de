pub mod advisor;
pub mod backend;
pub mod catalog;
pub mod error;
pub mod generator;
pub mod models;
pub mod prompts;
pub mod runner;
pub mod state;
pub mod storage;
pub mod validation;

// Re-export commonly used types
pub use advisor::InteractiveAdvisor;
pub use backend::{GenerationBackend, GenerationRequest};
#[cfg(feature = "openrouter")]
pub use backend::OpenRouterBackend;
pub use catalog::{DoctorTypeCatalog, StaticDoctorTypeCatalog};
pub use error::{
    CatalogLoadError, FieldError, FlowError, GenerationError, IntakeField, Result,
    TransitionError, ValidationError,
};
pub use generator::PrecautionGenerator;
pub use models::{
    ChatEntry, ChatTranscript, DoctorType, InteractiveAnswer, InteractiveQuery, IntakeForm,
    PrecautionRequest, PrecautionResult, ReportReference, Speaker,
};
pub use runner::ConsultationRunner;
pub use state::{ConsultationAction, ConsultationState, PendingOperation};
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use validation::{validate_intake, validate_question};
