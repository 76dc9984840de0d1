//! Session handler implementation for the daemon.

use crate::daemon::DaemonState;
use crate::error::Result;
use crate::ipc::protocol::{Request, Response};
use crate::ipc::server::SessionHandler;
use crate::segment::{Label, Observation, process_clip};
use crate::session::SessionId;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Instant;

/// Routes requests from each connection to its session.
pub struct DaemonSessionHandler {
    state: Arc<DaemonState>,
}

impl DaemonSessionHandler {
    /// Creates a new session handler.
    pub fn new(state: DaemonState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Turn a frame request into an observation.
    fn observation(&self, request: Request, timestamp: Instant) -> Option<Observation> {
        match request {
            Request::Features { values, .. } => {
                Some(self.state.source.observe(Some(values.as_slice()), timestamp))
            }
            Request::Observation {
                label: Some(label),
                confidence,
                ..
            } => {
                let confidence = if confidence.is_finite() {
                    confidence.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                Some(Observation::new(Label::from_wire(&label), confidence, timestamp))
            }
            Request::Observation { label: None, .. } | Request::NoHand { .. } => {
                Some(Observation::none(timestamp))
            }
            Request::Clip { .. } | Request::Status => None,
        }
    }

    fn status(&self) -> Response {
        Response::Status {
            sessions: self.state.session_count(),
            classifier: self.state.source.classifier_name().to_string(),
            labels: self.state.source.labels().len(),
        }
    }
}

#[async_trait::async_trait]
impl SessionHandler for DaemonSessionHandler {
    async fn open_session(&self) -> Result<SessionId> {
        self.state.store.open_session()
    }

    async fn handle(&self, session: SessionId, request: Request, timestamp: Instant) -> Response {
        match request {
            Request::Status => self.status(),
            Request::Clip { observations } => {
                debug!(
                    "Session {}: aggregating clip of {} frames",
                    session,
                    observations.len()
                );
                Response::Clip(process_clip(&observations, &self.state.batch))
            }
            frame => {
                let Some(observation) = self.observation(frame, timestamp) else {
                    return Response::Error {
                        message: "not a frame request".to_string(),
                    };
                };
                match self.state.store.submit(session, &observation) {
                    Ok(event) => Response::Event(event),
                    Err(e) => Response::Error {
                        message: e.to_string(),
                    },
                }
            }
        }
    }

    async fn close_session(&self, session: SessionId) {
        if let Err(e) = self.state.store.close(session) {
            warn!("Failed to close session {}: {}", session, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{LabelMap, MockClassifier, ObservationSource};
    use crate::config::Config;
    use crate::defaults;
    use crate::segment::{ObservationRecord, Transition};
    use std::time::Duration;

    fn handler() -> DaemonSessionHandler {
        let source = ObservationSource::with_default_layout(
            Arc::new(MockClassifier::new("mock").with_prediction(1, 0.95).with_class_count(2)),
            LabelMap::from_names(["hello", "thanks"]),
        );
        DaemonSessionHandler::new(DaemonState::new(&Config::default(), source))
    }

    fn observation(label: &str, confidence: f32) -> Request {
        Request::Observation {
            label: Some(label.to_string()),
            confidence,
            offset_ms: None,
        }
    }

    fn event(response: Response) -> crate::segment::OutputEvent {
        match response {
            Response::Event(event) => event,
            other => panic!("Expected Event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_observations_commit_after_hold() {
        let handler = handler();
        let session = handler.open_session().await.unwrap();
        let origin = Instant::now();

        let mut last = None;
        for ms in [0, 100, 200, 300] {
            let response = handler
                .handle(
                    session,
                    observation("hello", 0.9),
                    origin + Duration::from_millis(ms),
                )
                .await;
            last = Some(event(response));
        }

        let last = last.unwrap();
        assert_eq!(last.sequence, vec!["hello"]);
        assert_eq!(
            last.transition,
            Some(Transition::Committed {
                word: "hello".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_features_are_classified() {
        let handler = handler();
        let session = handler.open_session().await.unwrap();

        let response = handler
            .handle(
                session,
                Request::Features {
                    values: vec![0.5; defaults::FEATURE_LEN],
                    offset_ms: None,
                },
                Instant::now(),
            )
            .await;

        let event = event(response);
        assert_eq!(event.display_label, "thanks");
        assert_eq!(event.confidence, 0.95);
    }

    #[tokio::test]
    async fn test_short_features_are_no_hand() {
        let handler = handler();
        let session = handler.open_session().await.unwrap();

        let response = handler
            .handle(
                session,
                Request::Features {
                    values: vec![0.5; 3],
                    offset_ms: None,
                },
                Instant::now(),
            )
            .await;

        assert_eq!(event(response).display_label, defaults::WAITING_LABEL);
    }

    #[tokio::test]
    async fn test_unknown_wire_label_is_never_committed() {
        let handler = handler();
        let session = handler.open_session().await.unwrap();
        let origin = Instant::now();

        for ms in [0, 200, 400, 600] {
            let response = handler
                .handle(
                    session,
                    observation(defaults::UNKNOWN_LABEL, 0.99),
                    origin + Duration::from_millis(ms),
                )
                .await;
            assert!(event(response).sequence.is_empty());
        }
    }

    #[tokio::test]
    async fn test_clip_request_aggregates() {
        let handler = handler();
        let session = handler.open_session().await.unwrap();
        let observations = (0..6)
            .map(|i| ObservationRecord {
                label: Some("yes".to_string()),
                confidence: 0.9,
                offset_ms: i * 33,
            })
            .collect();

        let response = handler
            .handle(session, Request::Clip { observations }, Instant::now())
            .await;

        match response {
            Response::Clip(result) => assert_eq!(result.label_sequence, vec!["yes"]),
            other => panic!("Expected Clip, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_reports_sessions() {
        let handler = handler();
        let session = handler.open_session().await.unwrap();
        handler.open_session().await.unwrap();

        let response = handler.handle(session, Request::Status, Instant::now()).await;
        assert_eq!(
            response,
            Response::Status {
                sessions: 2,
                classifier: "mock".to_string(),
                labels: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_frame_after_close_is_error() {
        let handler = handler();
        let session = handler.open_session().await.unwrap();
        handler.close_session(session).await;

        let response = handler
            .handle(session, Request::NoHand { offset_ms: None }, Instant::now())
            .await;
        assert!(matches!(response, Response::Error { .. }));
    }
}
