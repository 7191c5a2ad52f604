use async_trait::async_trait;
use iti_registration::config::RegistrationConfig;
use iti_registration::registration::{
    BranchesAndTracks, ConditionalValidationPolicy, FormDefinition, FormState, GatewayError,
    GatewayReceipt, Notification, Notifier, OptionCatalog, OptionDataError, OptionProvider,
    StepValidator, SubmissionGateway,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn default_validator() -> Arc<StepValidator> {
    Arc::new(StepValidator::new(
        Arc::new(FormDefinition::default()),
        ConditionalValidationPolicy::default(),
    ))
}

/// Option lists from the configured files, falling back to the bundled documents.
pub(crate) fn load_option_provider(
    config: &RegistrationConfig,
) -> Result<OptionProvider, OptionDataError> {
    let catalog = match &config.options_path {
        Some(path) => OptionCatalog::from_path(path)?,
        None => OptionCatalog::bundled()?,
    };
    let directory = match &config.directory_path {
        Some(path) => BranchesAndTracks::from_path(path)?,
        None => BranchesAndTracks::bundled()?,
    };
    Ok(OptionProvider::new(catalog, &directory))
}

/// Gateway that keeps submissions in memory, or fails each one with a fixed message.
#[derive(Default)]
pub(crate) struct InProcessGateway {
    failure: Option<String>,
    accepted: Mutex<Vec<FormState>>,
    attempts: AtomicUsize,
}

impl InProcessGateway {
    pub(crate) fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn accepted(&self) -> Vec<FormState> {
        self.accepted
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SubmissionGateway for InProcessGateway {
    async fn create_registration_request(
        &self,
        form: &FormState,
    ) -> Result<GatewayReceipt, GatewayError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(message) = &self.failure {
            return Err(GatewayError::Transport(message.clone()));
        }

        self.accepted
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(form.clone());
        Ok(GatewayReceipt {
            status: 201,
            body: json!({ "id": attempt }),
        })
    }
}

/// Prints notifications the way a dialog would show them.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let title = match &notification {
            Notification::Submitting { title, .. }
            | Notification::Submitted { title, .. }
            | Notification::Failed { title, .. } => title,
        };
        println!("  [{}] {}", title, notification.text());
    }
}
