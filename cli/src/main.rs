//! ChainContract CLI: inspect ABIs, compute deterministic addresses, deploy
//! through CREATE2/CREATE3 factories and batch balance reads.
//!
//! # Commands
//! ```text
//! chaincontract signatures      <abi.json|artifact.json>
//! chaincontract create2-address --initcode <hex> | --artifact <path> [ARGS..] --salt <salt>
//! chaincontract create3-address --salt <salt> [--deployer <addr>] [--chain-id <id>]
//! chaincontract deploy          create2|create3 <artifact> [ARGS..] --salt <salt> [--keystore <path>]
//! chaincontract balances        <token> <users..>
//! chaincontract encode-call     <signature> [ARGS..]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use chaincontract_abi::{keccak256, parse, AbiSource, FunctionEntry};
use chaincontract_client::builtins::{CREATE2_FACTORY, CREATEX_FACTORY, MULTICALL3_ADDRESS};
use chaincontract_client::{compute_address, parse_cli_arg, Artifact, DeployScheme, LocalAccount};
use chaincontract_core::{AbiValue, ContractError, TransportError};
use chaincontract_observability::{init_tracing, LogConfig};

mod cmd_deploy;
mod cmd_signatures;

#[derive(Parser)]
#[command(
    name = "chaincontract",
    about = "Deterministic deployment and contract tooling for EVM chains",
    long_about = "
ChainContract CLI: list ABI selectors, compute CREATE2/CREATE3 addresses,
deploy through the canonical factories and batch balance reads.

ENVIRONMENT VARIABLES:
  ETH_RPC_URL   JSON-RPC endpoint (default http://localhost:8545)
  ETH_FROM      Sender for transactions (default: the node's first account)
  ETH_KEYSTORE  Keystore file used to sign transactions locally
  ETH_PASSWORD  Keystore password (prompted for when unset)
  RUST_LOG      Overrides -v log filtering
",
    version
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct RpcArgs {
    /// JSON-RPC endpoint
    #[arg(long, env = "ETH_RPC_URL", default_value = "http://localhost:8545")]
    rpc_url: String,
}

/// Local signing key. Without one, transactions are signed by the node.
#[derive(Args, Clone, Default)]
struct WalletArgs {
    /// Encrypted JSON keystore file
    #[arg(long, env = "ETH_KEYSTORE", conflicts_with = "private_key")]
    keystore: Option<PathBuf>,
    /// Keystore password
    #[arg(long, env = "ETH_PASSWORD", requires = "keystore", hide_env_values = true)]
    password: Option<String>,
    /// Raw hex private key
    #[arg(long, hide_env_values = true)]
    private_key: Option<String>,
}

impl WalletArgs {
    /// Unlock the configured key, prompting for the keystore password when
    /// none was given.
    fn account(&self) -> Result<Option<LocalAccount>> {
        if let Some(key) = &self.private_key {
            return Ok(Some(LocalAccount::from_private_key(key)?));
        }
        let Some(path) = &self.keystore else {
            return Ok(None);
        };
        let password = match &self.password {
            Some(password) => password.clone(),
            None => rpassword::prompt_password(format!("Password for {}: ", path.display()))
                .context("read keystore password")?,
        };
        Ok(Some(LocalAccount::from_keystore(path, &password)?))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List constructor, function, event and error signatures with selectors
    Signatures {
        /// ABI JSON array or compiler artifact with an "abi" field
        path: String,
    },

    /// Address a CREATE2 factory deploys init code to
    #[command(name = "create2-address")]
    Create2Address {
        /// Init code (0x-prefixed hex)
        #[arg(long, conflicts_with = "artifact", required_unless_present = "artifact")]
        initcode: Option<String>,
        /// Compiler artifact; ARGS are its constructor arguments
        #[arg(long)]
        artifact: Option<String>,
        /// Salt: up to 32 bytes of hex, or a decimal number
        #[arg(long)]
        salt: String,
        #[arg(long, default_value_t = CREATE2_FACTORY)]
        factory: Address,
        /// Constructor arguments
        args: Vec<String>,
    },

    /// Address CreateX deploys to with deployCreate3
    #[command(name = "create3-address")]
    Create3Address {
        #[arg(long)]
        salt: String,
        #[arg(long, default_value_t = CREATEX_FACTORY)]
        factory: Address,
        /// Transaction sender, needed for sender-bound salts
        #[arg(long)]
        deployer: Option<Address>,
        /// Chain id, needed for chain-bound salts
        #[arg(long)]
        chain_id: Option<u64>,
    },

    /// Deploy an artifact through a CREATE2 or CREATE3 factory unless it is already deployed
    Deploy {
        scheme: SchemeArg,
        /// Compiler artifact JSON
        artifact: String,
        /// Constructor arguments
        args: Vec<String>,
        #[arg(long)]
        salt: String,
        /// Factory address (default: the canonical one for the scheme)
        #[arg(long)]
        factory: Option<Address>,
        /// Wei forwarded to the factory
        #[arg(long)]
        value: Option<U256>,
        #[arg(long, env = "ETH_FROM")]
        from: Option<Address>,
        #[command(flatten)]
        wallet: WalletArgs,
        #[command(flatten)]
        rpc: RpcArgs,
    },

    /// Balances of many users in one Multicall3 call
    Balances {
        /// Token address, or 0x0000000000000000000000000000000000000000 for ETH
        token: Address,
        users: Vec<Address>,
        #[arg(long, default_value_t = MULTICALL3_ADDRESS)]
        multicall: Address,
        #[command(flatten)]
        rpc: RpcArgs,
    },

    /// Encode calldata for a signature such as "transfer(address,uint256)"
    #[command(name = "encode-call")]
    EncodeCall {
        signature: String,
        args: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemeArg {
    Create2,
    Create3,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&LogConfig { json: cli.log_json, ..LogConfig::from_verbosity(cli.verbose) });

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {e:#}", classify(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Signatures { path } => cmd_signatures::run(&path),

        Commands::Create2Address { initcode, artifact, salt, factory, args } => {
            let init_code = match (initcode, artifact) {
                (Some(hex_code), _) => parse_hex(&hex_code).context("invalid --initcode")?,
                (None, Some(path)) => load_artifact(&path)?.init_code(&cli_args(&args))?,
                (None, None) => bail!("one of --initcode or --artifact is required"),
            };
            let scheme = DeployScheme::Create2 { factory };
            let address = compute_address(&scheme, parse_salt(&salt)?, keccak256(&init_code), None)?;
            println!("{address}");
            Ok(())
        }

        Commands::Create3Address { salt, factory, deployer, chain_id } => {
            let scheme = DeployScheme::Create3 { factory, chain_id };
            let address = compute_address(&scheme, parse_salt(&salt)?, B256::ZERO, deployer)?;
            println!("{address}");
            Ok(())
        }

        Commands::Deploy { scheme, artifact, args, salt, factory, value, from, wallet, rpc } => {
            let scheme = match scheme {
                SchemeArg::Create2 => DeployScheme::create2(),
                SchemeArg::Create3 => DeployScheme::create3(),
            };
            let scheme = factory.map_or(scheme, |f| scheme.with_factory(f));
            let artifact = load_artifact(&artifact)?;
            let init_code = artifact.init_code(&cli_args(&args))?;
            let account = wallet.account()?;
            cmd_deploy::deploy(&rpc.rpc_url, scheme, parse_salt(&salt)?, &init_code, value, from, account).await
        }

        Commands::Balances { token, users, multicall, rpc } => {
            cmd_deploy::balances(&rpc.rpc_url, multicall, token, &users).await
        }

        Commands::EncodeCall { signature, args } => {
            let entry = Arc::new(FunctionEntry::from_compact(&signature)?);
            let call = entry.encode(&cli_args(&args))?;
            println!("{}", call.calldata());
            Ok(())
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// `ContractError` variant name, `Transport` for raw transport failures.
fn classify(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<ContractError>() {
        e.classification()
    } else if err.downcast_ref::<TransportError>().is_some() {
        "Transport"
    } else {
        "Error"
    }
}

fn cli_args(args: &[String]) -> Vec<AbiValue> {
    args.iter().map(|a| parse_cli_arg(a)).collect()
}

fn parse_hex(s: &str) -> Result<Bytes> {
    Ok(hex::decode(s.strip_prefix("0x").unwrap_or(s))?.into())
}

/// `0x` hex of at most 32 bytes, left-padded, or a decimal number.
fn parse_salt(s: &str) -> Result<B256> {
    if let Some(digits) = s.strip_prefix("0x") {
        let raw = hex::decode(digits).with_context(|| format!("invalid salt {s}"))?;
        if raw.len() > 32 {
            bail!("salt {s} is longer than 32 bytes");
        }
        let mut salt = [0u8; 32];
        salt[32 - raw.len()..].copy_from_slice(&raw);
        return Ok(B256::from(salt));
    }
    let n = U256::from_str_radix(s, 10).with_context(|| format!("invalid salt {s}"))?;
    Ok(B256::from(n))
}

fn load_artifact(path: &str) -> Result<Artifact> {
    let json = std::fs::read_to_string(path).with_context(|| format!("read artifact '{path}'"))?;
    Artifact::from_json(&json).with_context(|| format!("load artifact '{path}'"))
}

/// ABI from a JSON array or an artifact object with an `abi` field.
fn load_abi(path: &str) -> Result<Arc<chaincontract_abi::ContractDescriptor>> {
    let json = std::fs::read_to_string(path).with_context(|| format!("read ABI file '{path}'"))?;
    let value: serde_json::Value = serde_json::from_str(&json).context("parse ABI JSON")?;
    let abi = match value.get("abi") {
        Some(abi) => abi.to_string(),
        None => json,
    };
    Ok(parse(AbiSource::Json(&abi))?)
}
