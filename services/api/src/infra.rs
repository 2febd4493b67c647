use kyc_onboarding::workflows::kyc::{
    DocumentType, DuplicateCheckResult, ImagePayload, KycSession, RepositoryError, Score,
    ScorerError, SessionId, SessionRepository, SignalScorer, UploadOutcome,
};
use metrics_exporter_prometheus::PrometheusHandle;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, KycSession>>>,
}

impl InMemorySessionRepository {
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<SessionId, KycSession>>, RepositoryError> {
        self.sessions
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store lock poisoned".to_string()))
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, session: KycSession) -> Result<KycSession, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(session.id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id().clone(), session.clone());
        Ok(session)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<KycSession>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }

    fn modify<T, F>(&self, id: &SessionId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut KycSession) -> T,
    {
        let mut guard = self.lock()?;
        let session = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        Ok(apply(session))
    }
}

/// Stand-in for the document, biometric and dedupe vendors.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SimulatedScorer {
    pub(crate) quality_range: (u8, u8),
    pub(crate) face_range: (u8, u8),
    pub(crate) duplicate_rate: f64,
    pub(crate) upload_success_rate: f64,
}

impl Default for SimulatedScorer {
    fn default() -> Self {
        Self {
            quality_range: (30, 95),
            face_range: (40, 100),
            duplicate_rate: 0.05,
            upload_success_rate: 0.8,
        }
    }
}

impl SimulatedScorer {
    fn draw(range: (u8, u8)) -> Result<Score, ScorerError> {
        let (low, high) = range;
        if low > high {
            return Err(ScorerError::InvalidResult(format!(
                "empty score range {low}..={high}"
            )));
        }
        let value = rand::thread_rng().gen_range(low..=high);
        Score::new(value).map_err(|err| ScorerError::InvalidResult(err.to_string()))
    }
}

impl SignalScorer for SimulatedScorer {
    fn document_quality(
        &self,
        _document: DocumentType,
        _image: &ImagePayload,
    ) -> Result<Score, ScorerError> {
        Self::draw(self.quality_range)
    }

    fn face_match(
        &self,
        _live_capture: &ImagePayload,
        _reference_photo: &ImagePayload,
    ) -> Result<Score, ScorerError> {
        Self::draw(self.face_range)
    }

    fn duplicate_check(&self) -> Result<DuplicateCheckResult, ScorerError> {
        let mut rng = rand::thread_rng();
        if rng.gen_bool(self.duplicate_rate) {
            let customer = rng.gen_range(1000..10000);
            Ok(DuplicateCheckResult::matched(format!("CUST-{customer}")))
        } else {
            Ok(DuplicateCheckResult::clear())
        }
    }

    fn upload(&self, documents: &[DocumentType]) -> Result<UploadOutcome, ScorerError> {
        if documents.is_empty() {
            return Err(ScorerError::InvalidResult(
                "no documents to upload".to_string(),
            ));
        }
        if rand::thread_rng().gen_bool(self.upload_success_rate) {
            Ok(UploadOutcome::Success)
        } else {
            Ok(UploadOutcome::Failed)
        }
    }
}
