//! IPC listener thread for the running instance
//!
//! Connections are served one at a time on a blocking thread. Each request is
//! handed to the event loop together with a reply slot, so all state changes
//! happen on the event loop.

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::ipc::{SelectRequest, SelectResponse, SelectServer};

/// Request plus the slot its response goes into
pub type PendingRequest = (SelectRequest, oneshot::Sender<SelectResponse>);

/// Spawn IPC listener thread to handle requests from other invocations
pub fn spawn_ipc_listener(
    server: SelectServer,
    requests: mpsc::Sender<PendingRequest>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        if let Err(e) = run_ipc_loop(&server, &requests) {
            error!(error = ?e, "IPC listener thread crashed");
        }
    })
}

fn run_ipc_loop(server: &SelectServer, requests: &mpsc::Sender<PendingRequest>) -> Result<()> {
    info!(socket = ?server.path(), "IPC listener started");

    loop {
        let mut client = server
            .accept()
            .context("Failed to accept IPC connection")?;
        debug!("Client connected");

        loop {
            let request = match client.recv_request() {
                Ok(request) => request,
                Err(e) => {
                    debug!(error = ?e, "IPC connection closed or error");
                    break;
                }
            };
            debug!(request = ?request, "Received request via IPC");

            let Some(response) = forward(requests, request) else {
                warn!("Event loop is gone, stopping IPC listener");
                return Ok(());
            };

            if let Err(e) = client.send_response(&response) {
                warn!(error = ?e, "Failed to send IPC response");
                break;
            }
        }
    }
}

/// Hand a request to the event loop and wait for its answer
fn forward(requests: &mpsc::Sender<PendingRequest>, request: SelectRequest) -> Option<SelectResponse> {
    let (reply_tx, reply_rx) = oneshot::channel();
    requests.blocking_send((request, reply_tx)).ok()?;
    reply_rx.blocking_recv().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::SelectClient;

    #[test]
    fn test_requests_reach_event_loop_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jack-select.sock");
        let server = SelectServer::bind_to(path.clone()).unwrap();

        let (tx, mut rx) = mpsc::channel::<PendingRequest>(4);
        spawn_ipc_listener(server, tx);

        // Stand-in for the event loop
        let event_loop = std::thread::spawn(move || {
            let (request, reply) = rx.blocking_recv().unwrap();
            assert_eq!(request, SelectRequest::GetPid);
            reply.send(SelectResponse::Pid(42)).unwrap();

            let (request, reply) = rx.blocking_recv().unwrap();
            assert_eq!(request, SelectRequest::StopServer);
            reply.send(SelectResponse::Ready).unwrap();
        });

        let mut client = SelectClient::connect_to(&path).unwrap();
        assert_eq!(client.request(&SelectRequest::GetPid).unwrap(), SelectResponse::Pid(42));
        assert_eq!(client.request(&SelectRequest::StopServer).unwrap(), SelectResponse::Ready);
        event_loop.join().unwrap();
    }
}
