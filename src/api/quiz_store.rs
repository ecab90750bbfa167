use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::core::{CoreResult, QuizQuestion, QuizSession};

pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Per-visitor quiz sessions held by the web host. Ids are handed out in
/// increasing order, so the oldest session is evicted first when full.
#[derive(Clone)]
pub struct QuizStore {
    bank: Arc<[QuizQuestion]>,
    sessions: Arc<Mutex<BTreeMap<u64, QuizSession>>>,
    next_id: Arc<AtomicU64>,
    max_sessions: usize,
}

impl QuizStore {
    pub fn new(bank: Arc<[QuizQuestion]>, max_sessions: usize) -> Self {
        Self {
            bank,
            sessions: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn create(&self) -> CoreResult<(u64, QuizSession)> {
        let session = QuizSession::new(Arc::clone(&self.bank))?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut sessions = self.lock();
        while sessions.len() >= self.max_sessions {
            if let Some((evicted, _)) = sessions.pop_first() {
                debug!(evicted, "quiz session evicted");
            }
        }
        sessions.insert(id, session.clone());
        Ok((id, session))
    }

    pub fn with_session<R>(&self, id: u64, f: impl FnOnce(&mut QuizSession) -> R) -> Option<R> {
        let mut sessions = self.lock();
        sessions.get_mut(&id).map(f)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u64, QuizSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
