//! In-process JSON-RPC node for adapter tests.
//!
//! Serves the handful of `eth_*` methods the chain adapters use from
//! canned state, and records how often each method was called.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use alloy::rpc::types::Log;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

/// Canned chain state plus call accounting.
#[derive(Default)]
struct NodeState {
    chain_id: u64,
    head: u64,
    history: Vec<Log>,
    changes: Mutex<VecDeque<Vec<Log>>>,
    calls: Mutex<HashMap<String, usize>>,
    log_queries: Mutex<Vec<u64>>,
}

pub struct FakeNode {
    url: String,
    state: Arc<NodeState>,
}

#[derive(Default)]
pub struct FakeNodeBuilder {
    state: NodeState,
}

impl FakeNode {
    pub fn builder() -> FakeNodeBuilder {
        FakeNodeBuilder::default()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of requests received for `method`.
    pub fn calls(&self, method: &str) -> usize {
        self.state
            .calls
            .lock()
            .unwrap()
            .get(method)
            .copied()
            .unwrap_or(0)
    }

    /// `fromBlock` of every `eth_getLogs` request, in arrival order.
    pub fn log_queries(&self) -> Vec<u64> {
        self.state.log_queries.lock().unwrap().clone()
    }
}

impl FakeNodeBuilder {
    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.state.chain_id = chain_id;
        self
    }

    pub fn head(mut self, head: u64) -> Self {
        self.state.head = head;
        self
    }

    /// Logs served by `eth_getLogs`, filtered by the requested range.
    pub fn history(mut self, logs: Vec<Log>) -> Self {
        self.state.history = logs;
        self
    }

    /// One batch per `eth_getFilterChanges` call; empty once drained.
    pub fn changes(mut self, batches: Vec<Vec<Log>>) -> Self {
        self.state.changes = Mutex::new(batches.into());
        self
    }

    pub async fn start(self) -> FakeNode {
        let state = Arc::new(self.state);
        let app = Router::new()
            .route("/", post(handle))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakeNode {
            url: format!("http://{addr}"),
            state,
        }
    }
}

async fn handle(State(state): State<Arc<NodeState>>, Json(body): Json<Value>) -> Json<Value> {
    match body {
        Value::Array(batch) => Json(Value::Array(
            batch.iter().map(|request| respond(&state, request)).collect(),
        )),
        request => Json(respond(&state, &request)),
    }
}

fn respond(state: &NodeState, request: &Value) -> Value {
    let method = request["method"].as_str().unwrap_or_default();
    *state
        .calls
        .lock()
        .unwrap()
        .entry(method.to_string())
        .or_default() += 1;

    let result = match method {
        "eth_chainId" => json!(format!("{:#x}", state.chain_id)),
        "eth_blockNumber" => json!(format!("{:#x}", state.head)),
        "eth_newFilter" => json!("0x1"),
        "eth_uninstallFilter" => json!(true),
        "eth_getLogs" => {
            let range = &request["params"][0];
            let from = block_param(&range["fromBlock"]).unwrap_or(0);
            let to = block_param(&range["toBlock"]).unwrap_or(state.head);
            state.log_queries.lock().unwrap().push(from);

            let logs: Vec<&Log> = state
                .history
                .iter()
                .filter(|log| log.block_number.is_some_and(|b| b >= from && b <= to))
                .collect();
            serde_json::to_value(logs).unwrap()
        }
        "eth_getFilterChanges" => {
            let batch = state.changes.lock().unwrap().pop_front().unwrap_or_default();
            serde_json::to_value(batch).unwrap()
        }
        other => {
            return json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "error": { "code": -32601, "message": format!("method {other} not found") },
            });
        }
    };

    json!({ "jsonrpc": "2.0", "id": request["id"], "result": result })
}

fn block_param(value: &Value) -> Option<u64> {
    let hex = value.as_str()?.strip_prefix("0x")?;
    u64::from_str_radix(hex, 16).ok()
}
