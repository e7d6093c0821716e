//! Background worker that runs turns off the UI thread.
//!
//! The UI sends [`WorkerRequest`]s and polls [`WorkerResponse`]s; state
//! itself arrives separately through the engine's snapshot channel.

use alien_core::{CompletionProvider, NarrativeEngine, SessionError};
use tokio::sync::mpsc;

/// Requests from the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerRequest {
    PlayerAction(String),
    Cancel,
}

/// Responses to the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerResponse {
    TurnComplete { turn: u64, degraded: bool },
    TurnRejected(SessionError),
    Cancelled,
}

/// Start the worker loop. It stops when the request sender is dropped.
pub fn spawn_worker<P>(
    engine: NarrativeEngine<P>,
) -> (mpsc::Sender<WorkerRequest>, mpsc::Receiver<WorkerResponse>)
where
    P: CompletionProvider + 'static,
{
    let (request_tx, mut request_rx) = mpsc::channel::<WorkerRequest>(8);
    let (response_tx, response_rx) = mpsc::channel::<WorkerResponse>(8);

    tokio::spawn(async move {
        while let Some(request) = request_rx.recv().await {
            match request {
                WorkerRequest::PlayerAction(input) => {
                    // Each turn runs in its own task so Cancel can arrive mid-turn
                    let engine = engine.clone();
                    let response_tx = response_tx.clone();
                    tokio::spawn(async move {
                        let response = match engine.submit(&input).await {
                            Ok(outcome) => WorkerResponse::TurnComplete {
                                turn: outcome.turn,
                                degraded: outcome.degraded,
                            },
                            Err(SessionError::TurnCancelled) => WorkerResponse::Cancelled,
                            Err(err) => WorkerResponse::TurnRejected(err),
                        };
                        response_tx.send(response).await.ok();
                    });
                }
                WorkerRequest::Cancel => {
                    if !engine.cancel() {
                        tracing::debug!("cancel requested with no turn in flight");
                    }
                }
            }
        }
        tracing::debug!("worker stopped");
    });

    (request_tx, response_rx)
}
