//! Import reconciliation handlers
//!
//! The import pipeline suspends whenever it needs a human decision, so a
//! suspended [`ImportSession`] is parked here between HTTP round trips:
//! upload → (duplicate selection) → (conflict decisions) → committed.
//! Sessions expire after 30 minutes of inactivity and a metric can have at
//! most one session in flight.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Multipart, Path, State},
    http::HeaderMap,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::info;

use crate::{acting_role, acting_user, AppError, AppState, SuccessResponse, MAX_UPLOAD_SIZE};
use pulse_core::conflict::ConflictSet;
use pulse_core::dedupe::DuplicateGroup;
use pulse_core::import::{normalize_rows, NormalizedBatch, SkippedRow};
use pulse_core::models::{MeasurementRow, Role};
use pulse_core::reconcile::{ImportOutcome, ImportSession};
use pulse_core::xlsx;

/// Session timeout (30 minutes of inactivity)
const SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct ImportEntry {
    session: ImportSession,
    last_activity: Instant,
}

impl ImportEntry {
    fn is_expired(&self) -> bool {
        self.last_activity.elapsed() > SESSION_TIMEOUT
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

/// In-memory store for imports suspended on user resolution
#[derive(Default)]
pub struct ImportSessionManager {
    sessions: RwLock<HashMap<String, ImportEntry>>,
}

impl ImportSessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// True when the metric already has a live suspended session
    async fn metric_busy(&self, metric_id: i64) -> bool {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .any(|e| !e.is_expired() && e.session.metric_id() == metric_id)
    }

    /// Park a suspended session, enforcing one in-flight import per metric
    async fn park(&self, session: ImportSession) -> Result<String, AppError> {
        let mut sessions = self.sessions.write().await;

        // Clean up expired sessions while we're here
        sessions.retain(|_, e| !e.is_expired());

        if sessions
            .values()
            .any(|e| e.session.metric_id() == session.metric_id())
        {
            return Err(AppError::conflict(
                "An import for this metric is already in progress",
            ));
        }

        let session_id = generate_session_id();
        sessions.insert(
            session_id.clone(),
            ImportEntry {
                session,
                last_activity: Instant::now(),
            },
        );
        Ok(session_id)
    }

    async fn remove(&self, session_id: &str) -> Option<ImportSession> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id).map(|e| e.session)
    }
}

/// Generate a unique session ID from a hashed timestamp
fn generate_session_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut hasher = Sha256::new();
    hasher.update(timestamp.to_le_bytes());
    let hash = hasher.finalize();
    format!("imp_{:x}", hash)[..20].to_string()
}

/// Map pipeline errors onto client-facing status codes
fn import_error(err: pulse_core::Error) -> AppError {
    use pulse_core::Error as E;
    match &err {
        E::Unauthorized => AppError::forbidden(&err.to_string()),
        E::NotFound(_) => AppError::not_found(&err.to_string()),
        E::EmptyBatch
        | E::IncompleteSelection(_)
        | E::Import(_)
        | E::InvalidData(_)
        | E::Spreadsheet(_) => AppError::bad_request(&err.to_string()),
        _ => AppError::from(err),
    }
}

/// Outcome of one import step
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportResponse {
    /// Final row set written; no session remains
    Committed {
        written: usize,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        skipped: Vec<SkippedRow>,
    },
    /// Pick one row per group, then POST /api/import/:id/duplicates
    NeedsDuplicateResolution {
        session_id: String,
        duplicates: Vec<DuplicateGroup>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        skipped: Vec<SkippedRow>,
    },
    /// Decide keep/replace per date, then POST /api/import/:id/conflicts
    NeedsConflictResolution {
        session_id: String,
        conflicts: ConflictSet,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        skipped: Vec<SkippedRow>,
    },
}

/// Request body for duplicate resolution: chosen row index per date
#[derive(Debug, Deserialize)]
pub struct ResolveDuplicatesRequest {
    pub selections: HashMap<NaiveDate, usize>,
}

/// Request body for conflict resolution: dates whose stored rows are
/// replaced by incoming values; omitted dates keep the stored value
#[derive(Debug, Deserialize)]
pub struct ResolveConflictsRequest {
    #[serde(default)]
    pub replace: Vec<NaiveDate>,
}

async fn run_pipeline(
    state: &AppState,
    metric_id: i64,
    role: Role,
    batch: NormalizedBatch,
) -> Result<Json<ImportResponse>, AppError> {
    let skipped = batch.skipped.clone();

    let mut session =
        ImportSession::begin(state.db.clone(), metric_id, role).map_err(import_error)?;

    match session.submit(batch).map_err(import_error)? {
        ImportOutcome::Committed { written } => {
            Ok(Json(ImportResponse::Committed { written, skipped }))
        }
        ImportOutcome::NeedsDuplicateResolution(duplicates) => {
            let session_id = state.import_sessions.park(session).await?;
            Ok(Json(ImportResponse::NeedsDuplicateResolution {
                session_id,
                duplicates,
                skipped,
            }))
        }
        ImportOutcome::NeedsConflictResolution(conflicts) => {
            let session_id = state.import_sessions.park(session).await?;
            Ok(Json(ImportResponse::NeedsConflictResolution {
                session_id,
                conflicts,
                skipped,
            }))
        }
    }
}

/// POST /api/metrics/:id/import - Start an import from an uploaded workbook
///
/// Expects multipart form with:
/// - file: .xlsx or .xls workbook (required, max 10MB)
pub async fn import_workbook(
    State(state): State<Arc<AppState>>,
    Path(metric_id): Path<i64>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    let role = acting_role(&state, &headers)?;

    if state.import_sessions.metric_busy(metric_id).await {
        return Err(AppError::conflict(
            "An import for this metric is already in progress",
        ));
    }

    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::bad_request("Failed to read file data"))?;

            if bytes.len() > MAX_UPLOAD_SIZE {
                return Err(AppError::bad_request(&format!(
                    "File too large. Maximum size is {} MB",
                    MAX_UPLOAD_SIZE / 1024 / 1024
                )));
            }
            file_data = Some(bytes.to_vec());
        }
    }

    let file_data = file_data.ok_or_else(|| AppError::bad_request("Missing file field"))?;

    // Stage the upload so the workbook reader can open it by path
    let mut staged = tempfile::NamedTempFile::new()?;
    staged.write_all(&file_data)?;

    let raw = xlsx::read_workbook(staged.path()).map_err(import_error)?;
    let batch = normalize_rows(&raw);

    info!(
        user = %acting_user(&headers),
        metric_id,
        rows = batch.rows.len(),
        "Workbook upload received"
    );

    run_pipeline(&state, metric_id, role, batch).await
}

/// Request body for manual entry import
#[derive(Debug, Deserialize)]
pub struct ManualImportRequest {
    pub rows: Vec<MeasurementRow>,
}

/// POST /api/metrics/:id/import/manual - Start an import from typed rows
pub async fn import_manual(
    State(state): State<Arc<AppState>>,
    Path(metric_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<ManualImportRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let role = acting_role(&state, &headers)?;

    if state.import_sessions.metric_busy(metric_id).await {
        return Err(AppError::conflict(
            "An import for this metric is already in progress",
        ));
    }

    run_pipeline(&state, metric_id, role, NormalizedBatch::from_rows(req.rows)).await
}

/// POST /api/import/:session_id/duplicates - Apply duplicate selections
pub async fn resolve_duplicates(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<ResolveDuplicatesRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let mut sessions = state.import_sessions.sessions.write().await;
    let entry = sessions
        .get_mut(&session_id)
        .filter(|e| !e.is_expired())
        .ok_or_else(|| AppError::not_found("Import session not found or expired"))?;

    match entry.session.resolve_duplicates(&req.selections) {
        Ok(ImportOutcome::Committed { written }) => {
            sessions.remove(&session_id);
            Ok(Json(ImportResponse::Committed {
                written,
                skipped: vec![],
            }))
        }
        Ok(ImportOutcome::NeedsConflictResolution(conflicts)) => {
            entry.touch();
            Ok(Json(ImportResponse::NeedsConflictResolution {
                session_id,
                conflicts,
                skipped: vec![],
            }))
        }
        Ok(ImportOutcome::NeedsDuplicateResolution(_)) => {
            Err(AppError::internal("Unexpected duplicate resolution state"))
        }
        // An incomplete selection leaves the session suspended for a retry
        Err(e @ pulse_core::Error::IncompleteSelection(_)) => {
            entry.touch();
            Err(import_error(e))
        }
        // Anything else is terminal for this attempt
        Err(e) => {
            sessions.remove(&session_id);
            Err(import_error(e))
        }
    }
}

/// POST /api/import/:session_id/conflicts - Apply keep/replace decisions
pub async fn resolve_conflicts(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<ResolveConflictsRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let mut sessions = state.import_sessions.sessions.write().await;
    let entry = sessions
        .get_mut(&session_id)
        .filter(|e| !e.is_expired())
        .ok_or_else(|| AppError::not_found("Import session not found or expired"))?;

    let replace: HashSet<NaiveDate> = req.replace.iter().copied().collect();

    match entry.session.resolve_conflicts(&replace) {
        Ok(ImportOutcome::Committed { written }) => {
            sessions.remove(&session_id);
            Ok(Json(ImportResponse::Committed {
                written,
                skipped: vec![],
            }))
        }
        Ok(_) => Err(AppError::internal("Unexpected conflict resolution state")),
        // Storage failures are terminal; the import restarts from scratch
        Err(e) => {
            sessions.remove(&session_id);
            Err(import_error(e))
        }
    }
}

/// DELETE /api/import/:session_id - Abandon a suspended import
pub async fn cancel_import(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    match state.import_sessions.remove(&session_id).await {
        Some(mut session) => {
            session.cancel();
            Ok(Json(SuccessResponse { success: true }))
        }
        None => Err(AppError::not_found("Import session not found or expired")),
    }
}
