//! Scanner and history session.
//!
//! [`Session`] is a pure reducer: [`Session::apply`] takes an [`Action`],
//! updates the view state and returns the [`Effect`]s to run. The
//! [`Controller`] runs those effects against a camera and an
//! [`InferenceService`](crate::client::InferenceService) and feeds the
//! outcomes back in.
//!
//! Every asynchronous request carries a [`RequestToken`]. Reset, mode
//! changes, camera starts and new selections advance the generation, so a
//! response that arrives afterwards is discarded instead of overwriting
//! newer state.

mod action;
mod controller;
mod state;

pub use action::{Action, Effect, PredictInput};
pub use controller::{Controller, UploadSummary};
pub use state::{PredictOutcome, RequestToken, ScannerMode, ScannerState, Tab};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::capture::{CAMERA_ACCESS_MESSAGE, CAMERA_FILENAME};
use crate::config::DEFAULT_MODEL;
use crate::error::{FreshxError, NO_INPUT_MESSAGE};
use crate::history::analytics::model_indicator;
use crate::history::{
    export, HistoryAnalytics, HistoryCollection, HistoryFilter, Prediction,
    PredictionRecord, RecordId, ReconcilePolicy, StatusFilter,
};

/// Hands out `temp-<millis>` ids that never repeat within a session.
#[derive(Debug, Default)]
struct TempIds {
    last: Option<i64>,
}

impl TempIds {
    fn next(&mut self, at: DateTime<Utc>) -> RecordId {
        let millis = match self.last {
            Some(last) if at.timestamp_millis() <= last => last + 1,
            _ => at.timestamp_millis(),
        };
        self.last = Some(millis);
        RecordId::temporary(millis)
    }
}

/// View state of the scanner and history surfaces.
#[derive(Debug)]
pub struct Session {
    tab: Tab,
    mode: ScannerMode,
    scanner: ScannerState,
    notice: Option<String>,
    error: Option<FreshxError>,
    history: HistoryCollection,
    history_loading: bool,
    history_notice: Option<String>,
    selection: Option<RecordId>,
    search: String,
    status: StatusFilter,
    policy: ReconcilePolicy,
    default_model: String,
    predict_generation: u64,
    history_generation: u64,
    camera_generation: u64,
    camera_pending: bool,
    temp_ids: TempIds,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL, ReconcilePolicy::default())
    }
}

impl Session {
    pub fn new(default_model: impl Into<String>, policy: ReconcilePolicy) -> Self {
        Self {
            tab: Tab::default(),
            mode: ScannerMode::default(),
            scanner: ScannerState::default(),
            notice: None,
            error: None,
            history: HistoryCollection::default(),
            history_loading: false,
            history_notice: None,
            selection: None,
            search: String::new(),
            status: StatusFilter::default(),
            policy,
            default_model: default_model.into(),
            predict_generation: 0,
            history_generation: 0,
            camera_generation: 0,
            camera_pending: false,
            temp_ids: TempIds::default(),
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn mode(&self) -> ScannerMode {
        self.mode
    }

    pub fn scanner(&self) -> &ScannerState {
        &self.scanner
    }

    /// Dismissible scanner message.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Error behind the current scanner notice.
    pub fn error(&self) -> Option<&FreshxError> {
        self.error.as_ref()
    }

    /// Take the error behind the current scanner notice, leaving the notice
    /// text in place.
    pub fn take_error(&mut self) -> Option<FreshxError> {
        self.error.take()
    }

    pub fn history(&self) -> &HistoryCollection {
        &self.history
    }

    pub fn is_history_loading(&self) -> bool {
        self.history_loading
    }

    /// Last history failure, shown as a banner on the history tab.
    pub fn history_notice(&self) -> Option<&str> {
        self.history_notice.as_deref()
    }

    pub fn filter(&self) -> HistoryFilter {
        HistoryFilter::new(self.search.clone(), self.status)
    }

    /// History as displayed: filtered by the search term and status.
    pub fn visible_history(&self) -> HistoryCollection {
        self.history.filter(&self.filter())
    }

    pub fn selection(&self) -> Option<&PredictionRecord> {
        self.selection.as_ref().and_then(|id| self.history.get(id))
    }

    /// Successful prediction currently displayed, if any.
    pub fn result(&self) -> Option<&Prediction> {
        self.scanner.prediction()
    }

    pub fn analytics(&self) -> Option<HistoryAnalytics> {
        HistoryAnalytics::compute(&self.history)
    }

    pub fn model_indicator(&self) -> &str {
        model_indicator(self.result(), &self.history, &self.default_model)
    }

    /// CSV export of the full (unfiltered) history.
    pub fn export_csv(&self) -> Option<String> {
        export::to_csv(&self.history)
    }

    fn next_predict_token(&mut self) -> RequestToken {
        self.predict_generation += 1;
        RequestToken(self.predict_generation)
    }

    fn next_history_token(&mut self) -> RequestToken {
        self.history_generation += 1;
        RequestToken(self.history_generation)
    }

    fn next_camera_token(&mut self) -> RequestToken {
        self.camera_generation += 1;
        self.camera_pending = true;
        RequestToken(self.camera_generation)
    }

    /// Invalidate any prediction in flight.
    fn discard_pending_prediction(&mut self) {
        self.predict_generation += 1;
    }

    /// Invalidate a camera start that has not reported back yet.
    fn cancel_camera_start(&mut self) {
        if self.camera_pending {
            self.camera_generation += 1;
            self.camera_pending = false;
        }
    }

    fn is_current_camera(&self, token: RequestToken) -> bool {
        self.camera_pending && token.0 == self.camera_generation
    }

    fn clear_notice(&mut self) {
        self.notice = None;
        self.error = None;
    }

    fn show_error(&mut self, notice: impl Into<String>, error: FreshxError) {
        self.notice = Some(notice.into());
        self.error = Some(error);
    }

    fn refresh_history(&mut self) -> Vec<Effect> {
        let token = self.next_history_token();
        self.history_loading = true;
        self.history_notice = None;
        vec![Effect::FetchHistory { token }]
    }

    /// Back to `Idle`, stopping the camera if it is running.
    fn reset_scanner(&mut self) -> Vec<Effect> {
        self.discard_pending_prediction();
        self.cancel_camera_start();
        self.clear_notice();
        let was_active = self.scanner == ScannerState::CameraActive;
        self.scanner = ScannerState::Idle;
        if was_active {
            vec![Effect::StopCamera]
        } else {
            Vec::new()
        }
    }

    /// Apply one action and return the effects it requests.
    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        debug!(
            action = action.name(),
            state = self.scanner.name(),
            "Applying action"
        );

        match action {
            Action::SwitchTab(tab) => {
                let mut effects = Vec::new();
                self.cancel_camera_start();
                if self.scanner == ScannerState::CameraActive {
                    self.scanner = ScannerState::Idle;
                    effects.push(Effect::StopCamera);
                }
                self.tab = tab;
                if tab == Tab::History {
                    self.selection = None;
                    effects.extend(self.refresh_history());
                }
                effects
            }

            Action::SetMode(mode) => {
                let effects = self.reset_scanner();
                self.mode = mode;
                effects
            }

            Action::FileAcquired(source) => {
                let effects = self.reset_scanner();
                self.mode = ScannerMode::Upload;
                debug!(filename = %source.filename, "File selected");
                self.scanner = ScannerState::FileSelected { source };
                effects
            }

            Action::StartCamera => {
                let mut effects = self.reset_scanner();
                self.mode = ScannerMode::Camera;
                let token = self.next_camera_token();
                effects.push(Effect::StartCamera { token });
                effects
            }

            Action::CameraStarted { token } => {
                if !self.is_current_camera(token) {
                    debug!(token = %token, "Dropping stale camera start");
                    // One stream slot: release it unless a newer start owns it.
                    if self.camera_pending || self.scanner == ScannerState::CameraActive {
                        return Vec::new();
                    }
                    return vec![Effect::StopCamera];
                }
                self.camera_pending = false;
                self.scanner = ScannerState::CameraActive;
                self.clear_notice();
                Vec::new()
            }

            Action::CameraFailed { token, error } => {
                if !self.is_current_camera(token) {
                    debug!(token = %token, error = %error, "Dropping stale camera failure");
                    return Vec::new();
                }
                warn!(error = %error, "Camera unavailable");
                self.camera_pending = false;
                self.show_error(CAMERA_ACCESS_MESSAGE, error);
                Vec::new()
            }

            Action::Submit => match std::mem::take(&mut self.scanner) {
                ScannerState::FileSelected { source } => {
                    let token = self.next_predict_token();
                    self.clear_notice();
                    self.scanner = ScannerState::Predicting {
                        token,
                        filename: source.filename.clone(),
                    };
                    vec![Effect::Predict {
                        token,
                        input: PredictInput::File(source),
                    }]
                }
                ScannerState::CameraActive => {
                    let token = self.next_predict_token();
                    self.clear_notice();
                    self.scanner = ScannerState::Predicting {
                        token,
                        filename: CAMERA_FILENAME.to_string(),
                    };
                    vec![Effect::Predict {
                        token,
                        input: PredictInput::CameraShutter,
                    }]
                }
                predicting @ ScannerState::Predicting { .. } => {
                    self.scanner = predicting;
                    Vec::new()
                }
                other => {
                    self.scanner = other;
                    self.show_error(NO_INPUT_MESSAGE, FreshxError::NoInputSelected);
                    Vec::new()
                }
            },

            Action::PredictResolved { token, outcome, at } => {
                let filename = match &self.scanner {
                    ScannerState::Predicting {
                        token: current,
                        filename,
                    } if *current == token && token.0 == self.predict_generation => {
                        filename.clone()
                    }
                    _ => {
                        debug!(token = %token, "Dropping stale prediction");
                        return Vec::new();
                    }
                };

                let outcome = match outcome {
                    Ok(prediction) => {
                        let id = self.temp_ids.next(at);
                        let record = PredictionRecord::optimistic(
                            id,
                            filename,
                            &prediction,
                            at,
                            &self.default_model,
                        );
                        info!(id = %record.id, label = %record.label, "Recorded prediction");
                        self.history.record_optimistic(record);
                        PredictOutcome::Success(prediction)
                    }
                    Err(error) => {
                        let message = error.to_string();
                        self.show_error(message.clone(), error);
                        PredictOutcome::Failure(message)
                    }
                };
                self.scanner = ScannerState::ResultShown { outcome };
                Vec::new()
            }

            Action::Reset => self.reset_scanner(),

            Action::RefreshHistory => self.refresh_history(),

            Action::HistoryResolved { token, outcome } => {
                if token.0 != self.history_generation {
                    debug!(token = %token, "Dropping stale history response");
                    return Vec::new();
                }
                self.history_loading = false;
                match outcome {
                    Ok(records) => {
                        self.history.reconcile(records, self.policy);
                        if let Some(id) = &self.selection {
                            if !self.history.contains(id) {
                                self.selection = None;
                            }
                        }
                    }
                    Err(error) => {
                        warn!(error = %error, "History fetch failed");
                        self.history_notice = Some(error.to_string());
                    }
                }
                Vec::new()
            }

            Action::Select(id) => {
                if self.history.contains(&id) {
                    self.selection = Some(id);
                }
                Vec::new()
            }

            Action::ClearSelection => {
                self.selection = None;
                Vec::new()
            }

            Action::Search(term) => {
                self.search = term;
                Vec::new()
            }

            Action::FilterStatus(status) => {
                self.status = status;
                Vec::new()
            }

            Action::Delete(id) => vec![Effect::Delete { id }],

            Action::DeleteResolved { id, outcome } => {
                match outcome {
                    Ok(()) => {
                        self.history.remove(&id);
                        if self.selection.as_ref() == Some(&id) {
                            self.selection = None;
                        }
                    }
                    Err(error) => {
                        warn!(id = %id, error = %error, "Delete failed");
                        self.history_notice = Some(format!("Failed to delete record: {error}"));
                    }
                }
                Vec::new()
            }

            Action::ClearAll { confirmed } => {
                if confirmed {
                    vec![Effect::Clear]
                } else {
                    Vec::new()
                }
            }

            Action::ClearResolved { outcome } => {
                match outcome {
                    Ok(()) => {
                        self.history.clear();
                        self.selection = None;
                    }
                    Err(error) => {
                        warn!(error = %error, "Clear failed");
                        self.history_notice = Some(format!("Failed to clear history: {error}"));
                    }
                }
                Vec::new()
            }

            Action::DismissNotice => {
                self.clear_notice();
                self.history_notice = None;
                Vec::new()
            }

            Action::Teardown => {
                self.discard_pending_prediction();
                self.cancel_camera_start();
                self.history_generation += 1;
                self.history_loading = false;
                self.scanner = ScannerState::Idle;
                vec![Effect::StopCamera]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureSource;
    use crate::error::FreshxError;
    use crate::history::Provenance;
    use chrono::TimeZone;

    fn banana() -> Prediction {
        Prediction {
            label: "Fresh Banana".into(),
            confidence: 92.3,
            is_fresh: true,
            model_used: Some("fruit".into()),
        }
    }

    fn jpeg(name: &str) -> CaptureSource {
        CaptureSource::from_file_bytes(name, "image/jpeg", vec![0xFF, 0xD8])
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_717_000_000 + secs, 0).unwrap()
    }

    fn server_record(id: &str, filename: &str, is_fresh: bool) -> PredictionRecord {
        PredictionRecord {
            id: RecordId::new(id),
            filename: filename.into(),
            label: if is_fresh { "Fresh Banana" } else { "Rotten Banana" }.into(),
            confidence: 92.3,
            is_fresh,
            timestamp: "2024-05-29T16:26:40.000000".into(),
            model_used: "fruit".into(),
        }
    }

    fn predict_token(effects: &[Effect]) -> RequestToken {
        match effects {
            [Effect::Predict { token, .. }] => *token,
            other => panic!("expected a single predict effect, got {other:?}"),
        }
    }

    fn camera_token(effects: &[Effect]) -> RequestToken {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::StartCamera { token } => Some(*token),
                _ => None,
            })
            .expect("start camera effect")
    }

    fn start_camera(session: &mut Session) {
        let token = camera_token(&session.apply(Action::StartCamera));
        session.apply(Action::CameraStarted { token });
    }

    fn history_token(effects: &[Effect]) -> RequestToken {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::FetchHistory { token } => Some(*token),
                _ => None,
            })
            .expect("fetch effect")
    }

    #[test]
    fn test_submit_without_input() {
        let mut session = Session::default();
        let effects = session.apply(Action::Submit);
        assert!(effects.is_empty());
        assert_eq!(session.notice(), Some(NO_INPUT_MESSAGE));
        assert!(matches!(session.error(), Some(FreshxError::NoInputSelected)));
        assert_eq!(session.scanner(), &ScannerState::Idle);
    }

    #[test]
    fn test_successful_prediction_prepends_optimistic_record() {
        let mut session = Session::default();
        session.apply(Action::FileAcquired(jpeg("banana.jpg")));
        assert_eq!(session.scanner().name(), "file_selected");

        let effects = session.apply(Action::Submit);
        let token = predict_token(&effects);
        assert!(session.scanner().is_predicting());

        session.apply(Action::PredictResolved {
            token,
            outcome: Ok(banana()),
            at: at(0),
        });

        assert_eq!(session.result(), Some(&banana()));
        let first = session.history().first().unwrap();
        assert_eq!(first.provenance(), Provenance::Optimistic);
        assert_eq!(first.filename, "banana.jpg");
        assert_eq!(first.id, RecordId::temporary(at(0).timestamp_millis()));
        assert_eq!(session.model_indicator(), "fruit");
    }

    #[test]
    fn test_failed_prediction_shows_notice_and_keeps_history() {
        let mut session = Session::default();
        session.apply(Action::FileAcquired(jpeg("banana.jpg")));
        let token = predict_token(&session.apply(Action::Submit));

        session.apply(Action::PredictResolved {
            token,
            outcome: Err(FreshxError::transport(
                crate::error::PREDICT_CONNECT_MESSAGE,
            )),
            at: at(0),
        });

        assert_eq!(session.notice(), Some("Could not connect to the AI server."));
        assert!(session.history().is_empty());
        assert!(session.result().is_none());
        assert!(matches!(
            session.scanner(),
            ScannerState::ResultShown {
                outcome: PredictOutcome::Failure(_)
            }
        ));

        session.apply(Action::DismissNotice);
        assert!(session.notice().is_none());
    }

    #[test]
    fn test_stale_prediction_after_reset_is_dropped() {
        let mut session = Session::default();
        session.apply(Action::FileAcquired(jpeg("banana.jpg")));
        let token = predict_token(&session.apply(Action::Submit));

        session.apply(Action::Reset);
        assert_eq!(session.scanner(), &ScannerState::Idle);

        session.apply(Action::PredictResolved {
            token,
            outcome: Ok(banana()),
            at: at(0),
        });
        assert_eq!(session.scanner(), &ScannerState::Idle);
        assert!(session.result().is_none());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_new_selection_supersedes_pending_prediction() {
        let mut session = Session::default();
        session.apply(Action::FileAcquired(jpeg("first.jpg")));
        let stale = predict_token(&session.apply(Action::Submit));

        session.apply(Action::FileAcquired(jpeg("second.jpg")));
        let fresh = predict_token(&session.apply(Action::Submit));
        assert!(fresh > stale);

        session.apply(Action::PredictResolved {
            token: stale,
            outcome: Ok(banana()),
            at: at(0),
        });
        assert!(session.scanner().is_predicting());

        session.apply(Action::PredictResolved {
            token: fresh,
            outcome: Ok(banana()),
            at: at(1),
        });
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history().first().unwrap().filename, "second.jpg");
    }

    #[test]
    fn test_temp_ids_are_unique_within_same_millisecond() {
        let mut session = Session::default();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            session.apply(Action::FileAcquired(jpeg(name)));
            let token = predict_token(&session.apply(Action::Submit));
            session.apply(Action::PredictResolved {
                token,
                outcome: Ok(banana()),
                at: at(0),
            });
        }

        let ids: Vec<_> = session.history().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert!(ids.iter().all(RecordId::is_temporary));
    }

    #[test]
    fn test_camera_lifecycle() {
        let mut session = Session::default();
        let effects = session.apply(Action::StartCamera);
        assert!(matches!(effects.as_slice(), [Effect::StartCamera { .. }]));
        assert_eq!(session.mode(), ScannerMode::Camera);

        let token = camera_token(&effects);
        assert!(session.apply(Action::CameraStarted { token }).is_empty());
        assert_eq!(session.scanner(), &ScannerState::CameraActive);

        let token = predict_token(&session.apply(Action::Submit));
        match session.scanner() {
            ScannerState::Predicting { filename, .. } => assert_eq!(filename, CAMERA_FILENAME),
            other => panic!("unexpected state {other:?}"),
        }

        session.apply(Action::PredictResolved {
            token,
            outcome: Ok(banana()),
            at: at(0),
        });
        assert_eq!(session.history().first().unwrap().filename, CAMERA_FILENAME);
    }

    #[test]
    fn test_camera_failure_sets_notice() {
        let mut session = Session::default();
        let token = camera_token(&session.apply(Action::StartCamera));
        session.apply(Action::CameraFailed {
            token,
            error: FreshxError::PermissionDenied("denied".into()),
        });
        assert_eq!(session.notice(), Some(CAMERA_ACCESS_MESSAGE));
        assert_eq!(session.scanner(), &ScannerState::Idle);
        assert!(matches!(
            session.take_error(),
            Some(FreshxError::PermissionDenied(_))
        ));
        // The notice stays until dismissed.
        assert_eq!(session.notice(), Some(CAMERA_ACCESS_MESSAGE));
    }

    #[test]
    fn test_switching_tabs_stops_camera_and_fetches_history() {
        let mut session = Session::default();
        start_camera(&mut session);

        let effects = session.apply(Action::SwitchTab(Tab::History));
        assert!(matches!(effects[0], Effect::StopCamera));
        assert!(matches!(effects[1], Effect::FetchHistory { .. }));
        assert_eq!(session.scanner(), &ScannerState::Idle);
        assert!(session.is_history_loading());

        let effects = session.apply(Action::SwitchTab(Tab::Scanner));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_mode_switch_discards_selection() {
        let mut session = Session::default();
        session.apply(Action::FileAcquired(jpeg("banana.jpg")));
        session.apply(Action::SetMode(ScannerMode::Camera));
        assert_eq!(session.scanner(), &ScannerState::Idle);
        assert_eq!(session.mode(), ScannerMode::Camera);
    }

    #[test]
    fn test_history_fetch_reconciles_optimistic_record() {
        let mut session = Session::default();
        session.apply(Action::FileAcquired(jpeg("banana.jpg")));
        let token = predict_token(&session.apply(Action::Submit));
        session.apply(Action::PredictResolved {
            token,
            outcome: Ok(banana()),
            at: Utc.with_ymd_and_hms(2024, 5, 29, 16, 26, 41).unwrap(),
        });

        let token = history_token(&session.apply(Action::SwitchTab(Tab::History)));
        session.apply(Action::HistoryResolved {
            token,
            outcome: Ok(vec![server_record("665f1c2e", "banana.jpg", true)]),
        });

        assert!(!session.is_history_loading());
        assert_eq!(session.history().len(), 1);
        assert_eq!(
            session.history().first().unwrap().provenance(),
            Provenance::Confirmed
        );
    }

    #[test]
    fn test_history_failure_keeps_records() {
        let mut session = Session::default();
        let token = history_token(&session.apply(Action::RefreshHistory));
        session.apply(Action::HistoryResolved {
            token,
            outcome: Ok(vec![server_record("a", "a.jpg", true)]),
        });

        let token = history_token(&session.apply(Action::RefreshHistory));
        session.apply(Action::HistoryResolved {
            token,
            outcome: Err(FreshxError::ServiceUnavailable { status: 503 }),
        });

        assert!(!session.is_history_loading());
        assert_eq!(session.history().len(), 1);
        assert_eq!(
            session.history_notice(),
            Some("Database unavailable (Status: 503). Is backend running?")
        );
    }

    #[test]
    fn test_stale_history_response_is_dropped() {
        let mut session = Session::default();
        let stale = history_token(&session.apply(Action::RefreshHistory));
        let current = history_token(&session.apply(Action::RefreshHistory));

        session.apply(Action::HistoryResolved {
            token: stale,
            outcome: Ok(vec![server_record("old", "old.jpg", true)]),
        });
        assert!(session.history().is_empty());
        assert!(session.is_history_loading());

        session.apply(Action::HistoryResolved {
            token: current,
            outcome: Ok(vec![server_record("new", "new.jpg", true)]),
        });
        assert_eq!(session.history().first().unwrap().id.as_str(), "new");
    }

    fn loaded(records: Vec<PredictionRecord>) -> Session {
        let mut session = Session::default();
        let token = history_token(&session.apply(Action::RefreshHistory));
        session.apply(Action::HistoryResolved {
            token,
            outcome: Ok(records),
        });
        session
    }

    #[test]
    fn test_delete_clears_matching_selection() {
        let mut session = loaded(vec![
            server_record("a", "a.jpg", true),
            server_record("b", "b.jpg", false),
        ]);
        let id = RecordId::new("a");
        session.apply(Action::Select(id.clone()));
        assert_eq!(session.selection().unwrap().id, id);

        let effects = session.apply(Action::Delete(id.clone()));
        assert!(matches!(effects.as_slice(), [Effect::Delete { .. }]));
        // Nothing is removed until the service confirms.
        assert_eq!(session.history().len(), 2);

        session.apply(Action::DeleteResolved {
            id: id.clone(),
            outcome: Ok(()),
        });
        assert_eq!(session.history().len(), 1);
        assert!(session.selection().is_none());
    }

    #[test]
    fn test_failed_delete_keeps_record() {
        let mut session = loaded(vec![server_record("a", "a.jpg", true)]);
        session.apply(Action::DeleteResolved {
            id: RecordId::new("a"),
            outcome: Err(FreshxError::Rejected { status: 500 }),
        });
        assert_eq!(session.history().len(), 1);
        assert!(session.history_notice().is_some());
    }

    #[test]
    fn test_clear_all_requires_confirmation() {
        let mut session = loaded(vec![server_record("a", "a.jpg", true)]);
        assert!(session.apply(Action::ClearAll { confirmed: false }).is_empty());
        assert_eq!(session.history().len(), 1);

        let effects = session.apply(Action::ClearAll { confirmed: true });
        assert!(matches!(effects.as_slice(), [Effect::Clear]));
        session.apply(Action::ClearResolved { outcome: Ok(()) });
        assert!(session.history().is_empty());
        assert!(session.export_csv().is_none());
    }

    #[test]
    fn test_visible_history_filters() {
        let mut session = loaded(vec![
            server_record("a", "apple.jpg", true),
            server_record("b", "banana.jpg", false),
        ]);
        session.apply(Action::FilterStatus(StatusFilter::Rotten));
        let visible = session.visible_history();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible.first().unwrap().id.as_str(), "b");

        session.apply(Action::FilterStatus(StatusFilter::All));
        session.apply(Action::Search("APPLE".into()));
        assert_eq!(session.visible_history().len(), 1);
        // Filtering never touches the underlying history.
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_teardown_stops_camera() {
        let mut session = Session::default();
        start_camera(&mut session);
        let effects = session.apply(Action::Teardown);
        assert!(matches!(effects.as_slice(), [Effect::StopCamera]));
    }

    #[test]
    fn test_camera_start_drops_pending_prediction() {
        let mut session = Session::default();
        session.apply(Action::FileAcquired(jpeg("banana.jpg")));
        let token = predict_token(&session.apply(Action::Submit));

        session.apply(Action::StartCamera);
        assert_eq!(session.scanner(), &ScannerState::Idle);

        session.apply(Action::PredictResolved {
            token,
            outcome: Ok(banana()),
            at: at(0),
        });
        assert_eq!(session.mode(), ScannerMode::Camera);
        assert_eq!(session.scanner(), &ScannerState::Idle);
        assert!(session.result().is_none());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_mode_switch_drops_pending_prediction() {
        let mut session = Session::default();
        start_camera(&mut session);
        let token = predict_token(&session.apply(Action::Submit));

        session.apply(Action::SetMode(ScannerMode::Upload));
        session.apply(Action::PredictResolved {
            token,
            outcome: Err(FreshxError::transport(
                crate::error::PREDICT_CONNECT_MESSAGE,
            )),
            at: at(0),
        });
        assert_eq!(session.scanner(), &ScannerState::Idle);
        assert!(session.notice().is_none());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_late_camera_start_is_released() {
        for leave in [Action::SetMode(ScannerMode::Upload), Action::Reset] {
            let mut session = Session::default();
            let token = camera_token(&session.apply(Action::StartCamera));
            session.apply(leave);

            let effects = session.apply(Action::CameraStarted { token });
            assert!(matches!(effects.as_slice(), [Effect::StopCamera]));
            assert_eq!(session.scanner(), &ScannerState::Idle);
        }
    }

    #[test]
    fn test_late_camera_start_after_tab_switch_is_released() {
        let mut session = Session::default();
        let token = camera_token(&session.apply(Action::StartCamera));
        session.apply(Action::SwitchTab(Tab::History));

        let effects = session.apply(Action::CameraStarted { token });
        assert!(matches!(effects.as_slice(), [Effect::StopCamera]));
        assert_eq!(session.scanner(), &ScannerState::Idle);
    }

    #[test]
    fn test_superseded_camera_start_leaves_newer_stream() {
        let mut session = Session::default();
        let first = camera_token(&session.apply(Action::StartCamera));
        let second = camera_token(&session.apply(Action::StartCamera));
        assert!(second > first);

        // The newer start owns the stream slot, so nothing is stopped.
        assert!(session.apply(Action::CameraStarted { token: first }).is_empty());
        assert_eq!(session.scanner(), &ScannerState::Idle);

        session.apply(Action::CameraStarted { token: second });
        assert_eq!(session.scanner(), &ScannerState::CameraActive);

        // A duplicate report must not stop the live stream either.
        assert!(session.apply(Action::CameraStarted { token: second }).is_empty());
        assert_eq!(session.scanner(), &ScannerState::CameraActive);
    }

    #[test]
    fn test_late_camera_failure_keeps_file_selection() {
        let mut session = Session::default();
        let token = camera_token(&session.apply(Action::StartCamera));
        session.apply(Action::FileAcquired(jpeg("banana.jpg")));

        session.apply(Action::CameraFailed {
            token,
            error: FreshxError::DeviceUnavailable("unplugged".into()),
        });
        assert_eq!(session.scanner().name(), "file_selected");
        assert_eq!(session.mode(), ScannerMode::Upload);
        assert!(session.notice().is_none());

        let token = predict_token(&session.apply(Action::Submit));
        session.apply(Action::PredictResolved {
            token,
            outcome: Ok(banana()),
            at: at(0),
        });
        assert_eq!(session.history().first().unwrap().filename, "banana.jpg");
    }
}
