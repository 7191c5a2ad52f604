//! Step-gated registration form: field handlers, conditional validation, per-step schemas,
//! the form state machine, and the session service and router that drive it.

pub mod definition;
pub mod domain;
pub mod gateway;
pub mod handlers;
pub mod notice;
pub mod options;
pub mod policy;
pub mod router;
pub mod schema;
pub mod sequencer;
pub mod service;
pub mod validator;

#[cfg(test)]
mod tests;

pub use definition::{
    FieldKind, FieldLayout, FormDefinition, OptionSource, RegistrationStep, StepDefinition,
};
pub use domain::{
    fields, ErrorState, FieldValue, FileRef, FormState, SelectOption, INTENSIVE_CODE_CAMP,
    PROFESSIONAL_TRAINING_PROGRAM,
};
pub use gateway::{GatewayError, GatewayReceipt, HttpSubmissionGateway, SubmissionGateway};
pub use handlers::{apply_input_change, apply_select_change, InputChange, InputValue};
pub use notice::{Notification, Notifier, TracingNotifier};
pub use options::{
    options_from_names, BranchesAndTracks, NamedRecord, OptionCatalog, OptionDataError,
    OptionProvider,
};
pub use policy::{should_validate_field, ConditionalRule, ConditionalValidationPolicy};
pub use router::registration_router;
pub use schema::{AggregateValidationError, StepSchema, ValidationCandidate, Violation};
pub use sequencer::{
    BlurOutcome, RegistrationForm, StepTransition, SubmissionStart, SubmitOutcome,
};
pub use service::{
    RegistrationService, RegistrationServiceError, RegistrationSessionView, SessionId,
    SessionLimits,
};
pub use validator::{SchemaLookupError, StepValidator};
