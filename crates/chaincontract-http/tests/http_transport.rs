use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use chaincontract_core::{BlockTag, ChainTransport, TransportError, TxRequest};
use chaincontract_http::{HttpTransport, HttpTransportConfig, RetryConfig};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// One-connection-per-request HTTP server replaying scripted responses.
struct Node {
    url: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl Node {
    async fn start(responses: Vec<(u16, Value)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_body(&mut socket).await;
                seen.lock().unwrap().push(request);
                let body = body.to_string();
                let reply = format!(
                    "HTTP/1.1 {status} Scripted\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });
        Self { url, requests }
    }

    fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_body(socket: &mut TcpStream) -> Value {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return Value::Null;
        }
        buf.extend_from_slice(&chunk[..n]);
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
        let len = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .map(|v| v.trim().parse::<usize>().unwrap())
            .unwrap_or(0);
        if buf.len() >= end + 4 + len {
            return serde_json::from_slice(&buf[end + 4..end + 4 + len]).unwrap();
        }
    }
}

fn ok(result: Value) -> (u16, Value) {
    (200, json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

fn quick_retries(max_retries: u32) -> HttpTransportConfig {
    HttpTransportConfig {
        retry: RetryConfig {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            multiplier: 2.0,
            jitter_fraction: 0.0,
        },
        request_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn chain_id_request_shape() {
    let node = Node::start(vec![ok(json!("0x7a69"))]).await;
    let transport = HttpTransport::default_for(&node.url).unwrap();
    assert_eq!(transport.chain_id().await.unwrap(), 31337);

    let req = &node.requests()[0];
    assert_eq!(req["jsonrpc"], "2.0");
    assert_eq!(req["method"], "eth_chainId");
    assert_eq!(req["params"], json!([]));
}

#[tokio::test]
async fn fee_and_gas_queries() {
    let node = Node::start(vec![ok(json!("0x5208")), ok(json!("0x3b9aca00"))]).await;
    let transport = HttpTransport::default_for(&node.url).unwrap();
    let tx = TxRequest::new().to(Address::repeat_byte(0xaa)).value(U256::from(1u64));
    assert_eq!(transport.estimate_gas(&tx).await.unwrap(), 21_000);
    assert_eq!(transport.gas_price().await.unwrap(), 1_000_000_000);

    let requests = node.requests();
    assert_eq!(requests[0]["method"], "eth_estimateGas");
    assert_eq!(requests[0]["params"][0]["value"], "0x1");
    assert_eq!(requests[1]["method"], "eth_gasPrice");
}

#[tokio::test]
async fn call_encodes_tx_and_block() {
    let node = Node::start(vec![ok(json!("0x000000000000000000000000000000000000000000000000000000000000002a"))]).await;
    let transport = HttpTransport::default_for(&node.url).unwrap();
    let tx = TxRequest::new().to(Address::repeat_byte(0xaa)).data(vec![0x70, 0xa0, 0x82, 0x31]);
    let out = transport.call(&tx, BlockTag::Number(100)).await.unwrap();
    assert_eq!(out[31], 42);

    let req = &node.requests()[0];
    assert_eq!(req["method"], "eth_call");
    assert_eq!(req["params"][0]["data"], "0x70a08231");
    assert_eq!(req["params"][1], "0x64");
}

#[tokio::test]
async fn server_errors_are_retried() {
    let node = Node::start(vec![(503, json!("busy")), (502, json!("bad gateway")), ok(json!(["0x0101010101010101010101010101010101010101"]))]).await;
    let transport = HttpTransport::new(&node.url, quick_retries(3)).unwrap();
    let accounts = transport.accounts().await.unwrap();
    assert_eq!(accounts, vec![Address::repeat_byte(1)]);
    assert_eq!(node.requests().len(), 3);
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let node = Node::start(vec![(500, json!("down")), (500, json!("down"))]).await;
    let transport = HttpTransport::new(&node.url, quick_retries(1)).unwrap();
    let err = transport.chain_id().await.unwrap_err();
    assert!(matches!(err, TransportError::Http(ref msg) if msg.starts_with("HTTP 500")));
    assert_eq!(node.requests().len(), 2);
}

#[tokio::test]
async fn revert_errors_keep_data_and_are_not_retried() {
    let node = Node::start(vec![(
        200,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": 3, "message": "execution reverted", "data": "0x4e487b710000000000000000000000000000000000000000000000000000000000000011"}
        }),
    )])
    .await;
    let transport = HttpTransport::new(&node.url, quick_retries(3)).unwrap();
    let err = transport.call(&TxRequest::new(), BlockTag::Latest).await.unwrap_err();
    assert!(err.is_revert());
    assert_eq!(err.revert_data().unwrap().len(), 36);
    assert_eq!(node.requests().len(), 1);
}

#[tokio::test]
async fn pending_receipt_is_none() {
    let node = Node::start(vec![ok(Value::Null)]).await;
    let transport = HttpTransport::default_for(&node.url).unwrap();
    assert_eq!(transport.get_transaction_receipt(B256::ZERO).await.unwrap(), None);
}

#[tokio::test]
async fn submissions_are_not_resent_after_reaching_the_node() {
    let hash = format!("0x{}", "ab".repeat(32));
    let node = Node::start(vec![(502, json!("bad gateway")), ok(json!(hash))]).await;
    let transport = HttpTransport::new(&node.url, quick_retries(3)).unwrap();
    let tx = TxRequest::new().from(Address::repeat_byte(0x42)).to(Address::repeat_byte(0xaa));

    let err = transport.send_transaction(&tx).await.unwrap_err();
    assert!(matches!(err, TransportError::Http(ref msg) if msg.starts_with("HTTP 502")));
    let submitted = node.requests();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0]["method"], "eth_sendTransaction");
}

#[tokio::test]
async fn raw_submissions_are_not_resent() {
    let node = Node::start(vec![(503, json!("busy")), ok(json!(format!("0x{}", "cd".repeat(32))))]).await;
    let transport = HttpTransport::new(&node.url, quick_retries(3)).unwrap();
    assert!(transport.send_raw_transaction(&[0x02, 0xf8]).await.is_err());
    assert_eq!(node.requests().len(), 1);
}
