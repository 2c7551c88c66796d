//! IPC client implementation

use examclock_api::{ClientCommand, Command, Event, Request, Response, ResponsePayload, ResponseResult};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tracing::debug;

use crate::{IpcError, IpcResult};

/// IPC Client for connecting to examclockd
pub struct IpcClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_request_id: u64,
}

impl IpcClient {
    /// Connect to examclockd
    pub async fn connect(socket_path: impl AsRef<Path>) -> IpcResult<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            next_request_id: 1,
        })
    }

    /// Send a request and wait for its response
    pub async fn send(&mut self, command: ClientCommand) -> IpcResult<Response> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let request = Request::new(request_id, command);
        let mut json = serde_json::to_string(&request)?;
        json.push('\n');

        self.writer.write_all(json.as_bytes()).await?;

        loop {
            let line = read_line(&mut self.reader).await?;
            match serde_json::from_str::<Response>(&line) {
                Ok(response) => return Ok(response),
                // An event that raced ahead of the response
                Err(_) if serde_json::from_str::<Event>(&line).is_ok() => {
                    debug!("Skipping event while waiting for response");
                }
                Err(e) => return Err(IpcError::Json(e)),
            }
        }
    }

    /// Send a request and unwrap the payload, turning protocol errors into
    /// [`IpcError::ServerError`]
    pub async fn request(&mut self, command: ClientCommand) -> IpcResult<ResponsePayload> {
        match self.send(command).await?.result {
            ResponseResult::Ok(payload) => Ok(payload),
            ResponseResult::Err(e) => Err(IpcError::ServerError(format!(
                "{:?}: {}",
                e.code, e.message
            ))),
        }
    }

    /// Apply a state-changing command; returns whether it changed anything
    pub async fn apply(&mut self, command: Command) -> IpcResult<bool> {
        match self.request(ClientCommand::Apply { command }).await? {
            ResponsePayload::Applied { changed } => Ok(changed),
            other => Err(unexpected(&other)),
        }
    }

    /// Subscribe to events and consume this client to return an event stream
    pub async fn subscribe(mut self) -> IpcResult<EventStream> {
        self.request(ClientCommand::SubscribeEvents).await?;

        Ok(EventStream {
            reader: self.reader,
        })
    }
}

/// Stream of events from examclockd
pub struct EventStream {
    reader: BufReader<OwnedReadHalf>,
}

impl EventStream {
    /// Wait for the next event
    pub async fn next(&mut self) -> IpcResult<Event> {
        let line = read_line(&mut self.reader).await?;
        let event: Event = serde_json::from_str(&line)?;
        Ok(event)
    }
}

async fn read_line(reader: &mut BufReader<OwnedReadHalf>) -> IpcResult<String> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Err(IpcError::ConnectionClosed);
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }
}

/// Error for a payload of the wrong kind
pub fn unexpected(payload: &ResponsePayload) -> IpcError {
    IpcError::InvalidMessage(format!("unexpected response payload: {:?}", payload))
}
