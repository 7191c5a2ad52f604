use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::definition::{FormDefinition, RegistrationStep};
use super::domain::{ErrorState, FormState, SelectOption};
use super::gateway::SubmissionGateway;
use super::handlers::InputChange;
use super::notice::{Notification, Notifier};
use super::options::OptionProvider;
use super::sequencer::{
    notify_settled, BlurOutcome, RegistrationForm, StepTransition, SubmissionStart, SubmitOutcome,
};
use super::validator::{SchemaLookupError, StepValidator};

/// Identifier wrapper for an in-progress registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("reg-{id:06}"))
}

/// Snapshot of a session for API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationSessionView {
    pub session_id: SessionId,
    pub current_step: usize,
    pub step_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<RegistrationStep>,
    pub is_last_step: bool,
    pub is_submitting: bool,
    pub form: FormState,
    pub errors: ErrorState,
}

impl RegistrationSessionView {
    fn capture(session_id: &SessionId, form: &RegistrationForm) -> Self {
        Self {
            session_id: session_id.clone(),
            current_step: form.current_step(),
            step_count: form.step_count(),
            step: form
                .validator()
                .definition()
                .get(form.current_step())
                .map(|definition| definition.step),
            is_last_step: form.is_last_step(),
            is_submitting: form.is_submitting(),
            form: form.form().clone(),
            errors: form.errors().clone(),
        }
    }
}

/// Error raised by the registration service.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationServiceError {
    #[error("registration session {0} not found")]
    SessionNotFound(SessionId),
    #[error(transparent)]
    SchemaLookup(#[from] SchemaLookupError),
}

/// Bounds on how many sessions are kept and for how long an idle one survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 10_000,
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

struct SessionEntry {
    form: RegistrationForm,
    last_seen: Instant,
    last_touch: u64,
}

#[derive(Default)]
struct SessionStore {
    entries: HashMap<SessionId, SessionEntry>,
    touches: u64,
}

impl SessionStore {
    fn next_touch(&mut self) -> u64 {
        self.touches += 1;
        self.touches
    }

    /// Drop idle sessions, then the least recently used ones until there is room for one more.
    /// Sessions with a submission in flight are never evicted.
    fn make_room(&mut self, limits: SessionLimits, now: Instant) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            entry.form.is_submitting()
                || now.saturating_duration_since(entry.last_seen) < limits.idle_timeout
        });
        let expired = before - self.entries.len();
        if expired > 0 {
            debug!(expired, "expired idle registration sessions");
        }

        let capacity = limits.max_sessions.max(1);
        while self.entries.len() >= capacity {
            let oldest = self
                .entries
                .iter()
                .filter(|(_, entry)| !entry.form.is_submitting())
                .min_by_key(|(_, entry)| entry.last_touch)
                .map(|(id, _)| id.clone());
            let Some(oldest) = oldest else {
                warn!(
                    sessions = self.entries.len(),
                    "session capacity reached with every session submitting"
                );
                break;
            };
            self.entries.remove(&oldest);
            debug!(session_id = %oldest, "evicted least recently used registration session");
        }
    }
}

/// Keeps one registration form per session and routes operations to it.
pub struct RegistrationService<G, N> {
    validator: Arc<StepValidator>,
    options: Arc<OptionProvider>,
    gateway: Arc<G>,
    notifier: Arc<N>,
    limits: SessionLimits,
    sessions: Mutex<SessionStore>,
}

impl<G, N> RegistrationService<G, N>
where
    G: SubmissionGateway + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        validator: Arc<StepValidator>,
        options: Arc<OptionProvider>,
        gateway: Arc<G>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            validator,
            options,
            gateway,
            notifier,
            limits: SessionLimits::default(),
            sessions: Mutex::new(SessionStore::default()),
        }
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    /// Number of sessions currently held.
    pub fn session_count(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn definition(&self) -> &FormDefinition {
        self.validator.definition()
    }

    /// Option lists for every select field, keyed by field name.
    pub fn options(&self) -> BTreeMap<&'static str, Vec<SelectOption>> {
        self.options.by_field(self.validator.definition())
    }

    pub fn create_session(&self) -> RegistrationSessionView {
        let id = next_session_id();
        let form = RegistrationForm::new(self.validator.clone());
        let view = RegistrationSessionView::capture(&id, &form);
        let now = Instant::now();

        let mut store = self.lock();
        store.make_room(self.limits, now);
        let last_touch = store.next_touch();
        store.entries.insert(
            id.clone(),
            SessionEntry {
                form,
                last_seen: now,
                last_touch,
            },
        );
        drop(store);

        info!(session_id = %id, "registration session created");
        view
    }

    /// Discard a session, e.g. when the registrant abandons the form.
    pub fn close_session(&self, id: &SessionId) -> Result<(), RegistrationServiceError> {
        match self.lock().entries.remove(id) {
            Some(_) => {
                info!(session_id = %id, "registration session closed");
                Ok(())
            }
            None => Err(RegistrationServiceError::SessionNotFound(id.clone())),
        }
    }

    pub fn get(&self, id: &SessionId) -> Result<RegistrationSessionView, RegistrationServiceError> {
        self.with_session(id, |_| ())
            .map(|((), view)| view)
    }

    pub fn apply_input(
        &self,
        id: &SessionId,
        change: &InputChange,
    ) -> Result<RegistrationSessionView, RegistrationServiceError> {
        self.with_session(id, |form| form.apply_input(change))
            .map(|((), view)| view)
    }

    pub fn apply_select(
        &self,
        id: &SessionId,
        field: &str,
        selected: Option<&SelectOption>,
    ) -> Result<RegistrationSessionView, RegistrationServiceError> {
        self.with_session(id, |form| form.apply_select(field, selected))
            .map(|((), view)| view)
    }

    pub fn blur_input(
        &self,
        id: &SessionId,
        change: &InputChange,
    ) -> Result<(BlurOutcome, RegistrationSessionView), RegistrationServiceError> {
        let (outcome, view) = self.with_session(id, |form| form.blur_input(change))?;
        Ok((outcome?, view))
    }

    pub fn blur_select(
        &self,
        id: &SessionId,
        field: &str,
    ) -> Result<(BlurOutcome, RegistrationSessionView), RegistrationServiceError> {
        let (outcome, view) = self.with_session(id, |form| form.blur_select(field))?;
        Ok((outcome?, view))
    }

    pub fn next(
        &self,
        id: &SessionId,
    ) -> Result<(StepTransition, RegistrationSessionView), RegistrationServiceError> {
        let (transition, view) = self.with_session(id, RegistrationForm::next)?;
        Ok((transition?, view))
    }

    pub fn previous(
        &self,
        id: &SessionId,
    ) -> Result<RegistrationSessionView, RegistrationServiceError> {
        self.with_session(id, |form| {
            form.previous();
        })
        .map(|((), view)| view)
    }

    /// Submit the session's form without holding the session lock across the gateway call.
    pub async fn submit(
        &self,
        id: &SessionId,
    ) -> Result<(SubmitOutcome, RegistrationSessionView), RegistrationServiceError> {
        let (start, view) = self.with_session(id, RegistrationForm::begin_submission)?;
        let snapshot = match start? {
            SubmissionStart::Ready(snapshot) => snapshot,
            SubmissionStart::InFlight => return Ok((SubmitOutcome::AlreadySubmitting, view)),
            SubmissionStart::Invalid => return Ok((SubmitOutcome::Invalid, view)),
            SubmissionStart::NotFinalStep => return Ok((SubmitOutcome::NotFinalStep, view)),
        };

        info!(session_id = %id, "submitting registration");
        self.notifier.notify(Notification::submitting());
        let result = self.gateway.create_registration_request(&snapshot).await;
        notify_settled(self.notifier.as_ref(), &result);

        let (outcome, view) = self.with_session(id, |form| form.finish_submission(result))?;
        if matches!(outcome, SubmitOutcome::Submitted(_)) {
            self.lock().entries.remove(id);
            debug!(session_id = %id, "submitted registration session released");
        }
        Ok((outcome, view))
    }

    fn with_session<T>(
        &self,
        id: &SessionId,
        operation: impl FnOnce(&mut RegistrationForm) -> T,
    ) -> Result<(T, RegistrationSessionView), RegistrationServiceError> {
        let mut store = self.lock();
        let last_touch = store.next_touch();
        let entry = store
            .entries
            .get_mut(id)
            .ok_or_else(|| RegistrationServiceError::SessionNotFound(id.clone()))?;
        entry.last_seen = Instant::now();
        entry.last_touch = last_touch;
        let value = operation(&mut entry.form);
        Ok((value, RegistrationSessionView::capture(id, &entry.form)))
    }

    #[cfg(test)]
    pub(crate) fn with_session_for_tests<T>(
        &self,
        id: &SessionId,
        operation: impl FnOnce(&mut RegistrationForm) -> T,
    ) -> Result<T, RegistrationServiceError> {
        self.with_session(id, operation).map(|(value, _)| value)
    }

    fn lock(&self) -> MutexGuard<'_, SessionStore> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
