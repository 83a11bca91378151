//! Commands that talk to a node: `deploy` and `balances`.

use alloy_primitives::{Address, B256, U256};
use anyhow::{Context, Result};
use chaincontract_client::tx::balances as batch_balances;
use chaincontract_client::deploy::ensure_deployed;
use chaincontract_client::{DeployScheme, Dispatcher, LocalAccount};
use chaincontract_core::TxRequest;
use chaincontract_http::HttpTransport;
use tracing::debug;

fn connect(rpc_url: &str) -> Result<HttpTransport> {
    debug!(rpc_url, "connecting");
    HttpTransport::default_for(rpc_url).with_context(|| format!("connect to {rpc_url}"))
}

pub async fn deploy(
    rpc_url: &str,
    scheme: DeployScheme,
    salt: B256,
    init_code: &[u8],
    value: Option<U256>,
    from: Option<Address>,
    account: Option<LocalAccount>,
) -> Result<()> {
    let transport = connect(rpc_url)?;
    let mut tx = TxRequest::new();
    tx.from = from;
    tx.value = value;

    let dispatcher = match account {
        Some(account) => Dispatcher::default().with_signer(account),
        None => Dispatcher::default(),
    };
    let address = ensure_deployed(&dispatcher, &transport, &scheme, salt, init_code, &tx).await?;
    println!("{address}");
    Ok(())
}

pub async fn balances(rpc_url: &str, multicall: Address, token: Address, users: &[Address]) -> Result<()> {
    let transport = connect(rpc_url)?;
    let values = batch_balances(&Dispatcher::default(), &transport, multicall, token, users).await?;
    for (user, value) in users.iter().zip(values) {
        match value {
            Some(v) => println!("{user}  {v}"),
            None => println!("{user}  (call failed)"),
        }
    }
    Ok(())
}
