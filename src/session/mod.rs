//! Chat session: one transcript, one turn at a time.
//!
//! [`ChatSession::send_message`] runs the whole turn: it records the user
//! message, posts the conversation, then pulls the body chunk by chunk
//! while racing each read against the turn's [`CancellationToken`]. Other
//! tasks can watch the transcript and the [`StreamState`] while the turn is
//! running.

mod state;
mod stream;

pub use state::{StreamState, TurnReport};
pub use stream::{Progress, StreamSession};

use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::client::ChatClient;
use crate::config::ChatConfig;
use crate::error::{SessionError, TransportError};
use crate::models::{ChatRequest, Message};
use crate::transcript::Transcript;

/// A conversation with the chat endpoint.
#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    client: ChatClient,
    transcript: Transcript,
    state: Arc<watch::Sender<StreamState>>,
    stream: Mutex<StreamSession>,
    /// Token of the current turn; replaced when a turn starts
    cancel: StdMutex<CancellationToken>,
}

impl ChatSession {
    /// Create a session backed by reqwest.
    pub fn new(config: &ChatConfig) -> Result<Self, TransportError> {
        let client = ChatClient::new(config)?;
        Ok(Self::with_client(config, client))
    }

    /// Create a session over an existing client.
    ///
    /// The transcript opens with the configured greeting, if any.
    pub fn with_client(config: &ChatConfig, client: ChatClient) -> Self {
        let transcript = match &config.greeting {
            Some(greeting) => Transcript::with_greeting(greeting.clone()),
            None => Transcript::new(),
        };
        Self::with_transcript(config, client, transcript)
    }

    /// Create a session that continues an existing transcript.
    pub fn with_transcript(config: &ChatConfig, client: ChatClient, transcript: Transcript) -> Self {
        let id = Uuid::new_v4();
        let (tx, _rx) = watch::channel(StreamState::Idle);
        let state = Arc::new(tx);
        let stream = StreamSession::with_state(id, transcript.clone(), Arc::clone(&state))
            .with_discard_partial_on_abort(config.discard_partial_on_abort);

        tracing::debug!(session_id = %id, "Created chat session for {}", client.endpoint());

        Self {
            id,
            client,
            transcript,
            state,
            stream: Mutex::new(stream),
            cancel: StdMutex::new(CancellationToken::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Read-only view of the conversation.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn messages(&self) -> Vec<Message> {
        self.transcript.snapshot()
    }

    pub fn subscribe_transcript(&self) -> watch::Receiver<Vec<Message>> {
        self.transcript.subscribe()
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    /// Cancel the in-flight turn, if any.
    ///
    /// A request made while no turn is running does not carry over to the
    /// next one.
    pub fn cancel(&self) {
        tracing::debug!(session_id = %self.id, "Cancellation requested");
        self.cancel_slot().cancel();
    }

    fn cancel_slot(&self) -> MutexGuard<'_, CancellationToken> {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a fresh token for the turn that is about to start.
    fn arm_cancellation(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.cancel_slot() = token.clone();
        token
    }

    /// Send one user message and stream the reply into the transcript.
    ///
    /// Returns when the turn completes or is cancelled. A transport
    /// failure is returned as `Err` once, after the transcript has been
    /// cleaned up; the session stays usable.
    pub async fn send_message(&self, content: &str) -> Result<TurnReport, SessionError> {
        if content.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let mut stream = self
            .stream
            .try_lock()
            .map_err(|_| SessionError::TurnInProgress)?;

        if stream.state().is_active() {
            // A previous send_message future was dropped mid-turn.
            tracing::debug!(session_id = %self.id, "Closing abandoned turn");
            stream.abort();
        }

        let token = self.arm_cancellation();
        stream.begin(content)?;

        let request = ChatRequest::new(self.transcript.snapshot());
        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(stream.abort()),
            opened = self.client.open_stream(&request) => opened,
        };
        let mut body = match opened {
            Ok(body) => body,
            Err(err) => {
                stream.fail(&err);
                return Err(err.into());
            }
        };
        stream.mark_streaming();

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(stream.abort()),
                next = body.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    // The held lock keeps the turn active, so the chunk is
                    // never seen as Idle here.
                    if let Progress::Ended(report) =
                        stream.feed_checked(&chunk, || token.is_cancelled())?
                    {
                        return Ok(report);
                    }
                }
                Some(Err(e)) => {
                    let err = TransportError::from(e);
                    stream.fail(&err);
                    return Err(err.into());
                }
                None => return Ok(stream.finish_stream()?),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::HttpError;
    use crate::transcript::TurnOutcome;
    use bytes::Bytes;
    use std::time::Duration;

    fn data(content: &str) -> String {
        format!(
            "data: {}\n",
            serde_json::json!({ "choices": [{ "delta": { "content": content } }] })
        )
    }

    fn session_with(response: MockResponse, config: ChatConfig) -> (ChatSession, MockHttpClient) {
        let mock = MockHttpClient::new();
        mock.set_default_response(response);
        let client = ChatClient::with_http_client(&config, Arc::new(mock.clone()));
        (ChatSession::with_client(&config, client), mock)
    }

    fn no_greeting() -> ChatConfig {
        ChatConfig::new().with_greeting(None)
    }

    #[tokio::test]
    async fn test_send_message_streams_reply() {
        let (session, _) = session_with(
            MockResponse::sse([data("Hel"), data("lo"), data(" world"), "data: [DONE]\n".into()]),
            no_greeting(),
        );

        let report = session.send_message("hello?").await.unwrap();
        assert!(report.is_completed());
        assert_eq!(report.reply, "Hello world");
        assert_eq!(session.state(), StreamState::Completed);
        assert_eq!(
            session.messages(),
            vec![Message::user("hello?"), Message::assistant("Hello world")]
        );
    }

    #[tokio::test]
    async fn test_request_carries_greeting_and_history() {
        let (session, mock) = session_with(
            MockResponse::sse(["data: [DONE]\n"]),
            ChatConfig::new().with_greeting(Some("Hi!".to_string())),
        );

        session.send_message("  first  ").await.unwrap();

        let body: serde_json::Value =
            serde_json::from_str(&mock.get_requests()[0].body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "messages": [
                    { "role": "assistant", "content": "Hi!" },
                    { "role": "user", "content": "first" }
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let (session, mock) = session_with(MockResponse::sse(["data: [DONE]\n"]), no_greeting());

        assert_eq!(session.send_message(" \t ").await, Err(SessionError::EmptyMessage));
        assert!(session.messages().is_empty());
        assert!(mock.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_status_failure_cleans_up() {
        let (session, _) = session_with(
            MockResponse::status(402, r#"{"error":"Payment required"}"#),
            no_greeting(),
        );

        let err = session.send_message("q").await.unwrap_err();
        assert_eq!(err.to_string(), "Payment required");
        assert_eq!(session.state(), StreamState::Failed);
        assert_eq!(session.messages(), vec![Message::user("q")]);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_keeps_partial() {
        let (session, _) = session_with(
            MockResponse::StreamThenError {
                chunks: vec![Bytes::from(data("partial"))],
                error: HttpError::Io("connection reset".to_string()),
            },
            no_greeting(),
        );

        let err = session.send_message("q").await.unwrap_err();
        assert!(matches!(
            err.transport(),
            Some(TransportError::Interrupted(_))
        ));
        assert_eq!(session.messages().last(), Some(&Message::assistant("partial")));
    }

    #[tokio::test]
    async fn test_session_survives_failure() {
        let (session, mock) = session_with(MockResponse::status(500, "boom"), no_greeting());
        assert!(session.send_message("one").await.is_err());

        mock.set_default_response(MockResponse::sse([data("ok"), "data: [DONE]\n".into()]));
        let report = session.send_message("two").await.unwrap();

        assert_eq!(report.reply, "ok");
        assert_eq!(
            session.messages(),
            vec![
                Message::user("one"),
                Message::user("two"),
                Message::assistant("ok")
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_keeps_partial() {
        let (session, _) = session_with(
            MockResponse::Pending {
                chunks: vec![Bytes::from(data("partial"))],
            },
            no_greeting(),
        );
        let session = Arc::new(session);

        let runner = Arc::clone(&session);
        let turn = tokio::spawn(async move { runner.send_message("q").await });

        let mut transcript = session.subscribe_transcript();
        transcript
            .wait_for(|messages| messages.len() == 2)
            .await
            .unwrap();
        session.cancel();

        let report = tokio::time::timeout(Duration::from_secs(1), turn)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(report.outcome, TurnOutcome::Aborted);
        assert_eq!(session.state(), StreamState::Aborted);
        assert_eq!(session.messages().last(), Some(&Message::assistant("partial")));
    }

    #[tokio::test]
    async fn test_cancel_discards_when_configured() {
        let (session, _) = session_with(
            MockResponse::Pending {
                chunks: vec![Bytes::from(data("partial"))],
            },
            no_greeting().with_discard_partial_on_abort(true),
        );
        let session = Arc::new(session);

        let runner = Arc::clone(&session);
        let turn = tokio::spawn(async move { runner.send_message("q").await });

        let mut transcript = session.subscribe_transcript();
        transcript
            .wait_for(|messages| messages.len() == 2)
            .await
            .unwrap();
        session.cancel();

        let report = turn.await.unwrap().unwrap();
        assert!(report.is_aborted());
        assert_eq!(session.messages(), vec![Message::user("q")]);
    }

    #[tokio::test]
    async fn test_cancel_while_idle_does_not_reach_next_turn() {
        let (session, _) = session_with(
            MockResponse::sse([data("ok"), "data: [DONE]\n".into()]),
            no_greeting(),
        );

        session.cancel();
        let report = session.send_message("q").await.unwrap();
        assert!(report.is_completed());
        assert_eq!(report.reply, "ok");
    }

    #[tokio::test]
    async fn test_turn_after_cancelled_turn_gets_fresh_token() {
        let (session, mock) = session_with(
            MockResponse::Pending {
                chunks: vec![Bytes::from(data("partial"))],
            },
            no_greeting(),
        );
        let session = Arc::new(session);

        let runner = Arc::clone(&session);
        let turn = tokio::spawn(async move { runner.send_message("one").await });
        let mut transcript = session.subscribe_transcript();
        transcript
            .wait_for(|messages| messages.len() == 2)
            .await
            .unwrap();
        session.cancel();
        assert!(turn.await.unwrap().unwrap().is_aborted());

        mock.set_default_response(MockResponse::sse([data("two"), "data: [DONE]\n".into()]));
        let report = session.send_message("again").await.unwrap();
        assert!(report.is_completed());
        assert_eq!(session.messages().last(), Some(&Message::assistant("two")));
    }

    #[tokio::test]
    async fn test_second_message_while_streaming_is_rejected() {
        let (session, _) = session_with(
            MockResponse::Pending {
                chunks: vec![Bytes::from(data("partial"))],
            },
            no_greeting(),
        );
        let session = Arc::new(session);

        let runner = Arc::clone(&session);
        let turn = tokio::spawn(async move { runner.send_message("first").await });

        let mut state = session.subscribe_state();
        state.wait_for(|s| *s == StreamState::Streaming).await.unwrap();

        assert_eq!(
            session.send_message("second").await,
            Err(SessionError::TurnInProgress)
        );

        session.cancel();
        turn.await.unwrap().unwrap();
        assert_eq!(session.messages().len(), 2);
    }
}
