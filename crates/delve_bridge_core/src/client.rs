use serde::{de::DeserializeOwned, de::IgnoredAny, Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    time::timeout,
};

use crate::rpclog::{RpcLog, Summary};
use crate::types::{SetApiVersionIn, API_VERSION};
use crate::{DelveConfig, DelveError, Result, SessionHandle};

const METHOD_PREFIX: &str = "RPCServer.";

/// One connection to a headless engine, opened per CLI invocation.
pub struct DelveClient {
    addr: String,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    request_id: u64,
    log: RpcLog,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    method: String,
    params: [&'a Value; 1],
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    id: u64,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Value,
}

impl DelveClient {
    pub async fn connect(addr: &str, connect_timeout: Duration, log: RpcLog) -> Result<Self> {
        tracing::debug!("Connecting to dlv at {addr}");
        log.request("NewClient", json!({ "addr": addr })).await;

        let stream = match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                log.close().await;
                return Err(DelveError::Connection {
                    addr: addr.to_string(),
                    source,
                });
            }
            Err(_) => {
                log.close().await;
                return Err(DelveError::Timeout(connect_timeout));
            }
        };
        let (read_half, writer) = stream.into_split();

        let mut client = Self {
            addr: addr.to_string(),
            reader: BufReader::new(read_half),
            writer,
            request_id: 0,
            log,
        };

        let _: IgnoredAny = client
            .call(
                "SetApiVersion",
                &SetApiVersionIn {
                    api_version: API_VERSION,
                },
            )
            .await?;

        Ok(client)
    }

    /// Connects to the session named by `handle`, logging to its log path.
    pub async fn connect_handle(handle: &SessionHandle, config: &DelveConfig) -> Result<Self> {
        let log = RpcLog::from_path(handle.log_path.as_deref()).await?;
        Self::connect(&handle.addr, config.connect_timeout, log).await
    }

    /// Raw call: `method` without the `RPCServer.` prefix, `params` as the
    /// single positional argument.
    pub async fn send_rpc(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.request_id;
        self.request_id += 1;

        let request = JsonRpcRequest {
            method: format!("{METHOD_PREFIX}{method}"),
            params: [&params],
            id,
        };

        tracing::debug!("Sending JSON-RPC request: method={}, id={}", method, id);

        let mut body = serde_json::to_vec(&request)?;
        body.push(b'\n');
        self.writer.write_all(&body).await?;
        self.writer.flush().await?;

        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            return Err(DelveError::InvalidResponse(format!(
                "connection to {} closed while waiting for {method}",
                self.addr
            )));
        }

        let response: JsonRpcResponse = serde_json::from_str(line.trim_end())?;

        if response.id != id {
            return Err(DelveError::InvalidResponse(format!(
                "Response ID mismatch: expected {}, got {}",
                id, response.id
            )));
        }

        match response.error {
            Value::Null => {
                tracing::debug!("JSON-RPC request successful: method={}, id={}", method, id);
                Ok(response.result)
            }
            Value::String(message) => {
                tracing::debug!("JSON-RPC error: method={}, message={}", method, message);
                Err(DelveError::json_rpc(message))
            }
            other => Err(DelveError::json_rpc(other.to_string())),
        }
    }

    /// Typed call with request/response summaries written to the RPC log.
    pub async fn call<A, R>(&mut self, method: &str, args: &A) -> Result<R>
    where
        A: Serialize + Summary,
        R: DeserializeOwned + Summary,
    {
        self.log.request(method, args.summary()).await;
        let params = serde_json::to_value(args)?;

        let outcome = match self.send_rpc(method, params).await {
            Ok(result) => serde_json::from_value::<R>(result).map_err(DelveError::from),
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(out) => self.log.response(method, out.summary()).await,
            Err(e) => self.log.response(method, json!({ "err": e.to_string() })).await,
        }
        outcome
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn log(&self) -> &RpcLog {
        &self.log
    }

    /// Closes the connection; the engine and tracee keep running.
    pub async fn disconnect(mut self) {
        self.log.request("Disconnect", json!({ "cont": false })).await;
        let _ = self.writer.shutdown().await;
        self.log.close().await;
    }
}
