use std::{fs, path::PathBuf};

use alloy_primitives::{Address, Bytes, B256, U256};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use duo_account::{
    sim::SimHost,
    utils::crypto::{address_of, sign_digest},
    AccountConfig, AccountEvent, DuoAccount, Execution,
};
use duo_account_types::{
    batch_digest, batch_fingerprint, call_fingerprint, delegate_fingerprint, domain_separator,
    permit_fingerprint,
};
use k256::ecdsa::SigningKey;
use serde::Serialize;
use serde_json::json;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Operator tooling for duo accounts: derive signer addresses, compute action fingerprints, sign
/// offline batch authorizations and dry-run a propose/confirm cycle.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the address controlled by a secp256k1 key.
    Address(KeyArgs),
    /// Compute the fingerprint of an action.
    Fingerprint(FingerprintArgs),
    /// Sign a `BatchExecute` authorization and print it as JSON.
    SignBatch(SignBatchArgs),
    /// Propose and confirm a batch against an in-memory ledger and print the event log.
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// Path to a file containing the signer private key.
    #[arg(long, env = "SIGNER_KEY_PATH", conflicts_with = "key")]
    key_path: Option<PathBuf>,

    /// Signer private key (hex string, 0x...).
    #[arg(long, env = "SIGNER_KEY", conflicts_with = "key_path", hide_env_values = true)]
    key: Option<String>,
}

/// Call list. `--value` and `--data` default to zero / empty for every `--to` when omitted.
#[derive(Args, Debug)]
struct CallArgs {
    #[arg(long = "to", required = true)]
    tos: Vec<Address>,

    #[arg(long = "value")]
    values: Vec<U256>,

    #[arg(long = "data")]
    datas: Vec<Bytes>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Call,
    Delegate,
    Batch,
    Permit,
}

#[derive(Args, Debug)]
struct FingerprintArgs {
    #[arg(long, value_enum, default_value = "call")]
    kind: Kind,

    #[command(flatten)]
    calls: CallArgs,

    /// Ignored for permits.
    #[arg(long, default_value = "0")]
    nonce: U256,
}

#[derive(Args, Debug)]
struct SignBatchArgs {
    /// Account configuration (JSON).
    #[arg(long, env = "DUO_CONFIG")]
    config: PathBuf,

    #[arg(long, env = "CHAIN_ID")]
    chain_id: u64,

    #[command(flatten)]
    key: KeyArgs,

    #[command(flatten)]
    calls: CallArgs,

    #[arg(long, default_value = "0")]
    nonce: U256,

    /// Absolute deadline (unix seconds, inclusive).
    #[arg(long, conflicts_with = "ttl_secs")]
    deadline: Option<U256>,

    /// Deadline relative to now.
    #[arg(long, default_value_t = 3600)]
    ttl_secs: u64,

    /// Write the signed document here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[arg(long, env = "DUO_CONFIG")]
    config: PathBuf,

    #[arg(long, env = "CHAIN_ID", default_value_t = 1)]
    chain_id: u64,

    #[command(flatten)]
    calls: CallArgs,

    #[arg(long, default_value = "0")]
    nonce: U256,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SignedBatchDocument {
    account: Address,
    chain_id: u64,
    signer: Address,
    tos: Vec<Address>,
    values: Vec<U256>,
    datas: Vec<Bytes>,
    nonce: U256,
    deadline: U256,
    digest: B256,
    fingerprint: B256,
    signature: Bytes,
    issued_at: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SimulationReport {
    fingerprint: B256,
    executed: bool,
    outputs: Vec<Bytes>,
    events: Vec<AccountEvent>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Address(args) => {
            let key = load_key(&args)?;
            println!("{}", address_of(key.verifying_key()));
        }
        Command::Fingerprint(args) => println!("{}", fingerprint(&args)?),
        Command::SignBatch(args) => sign_batch(&args)?,
        Command::Simulate(args) => simulate(&args)?,
    }
    Ok(())
}

fn load_key(args: &KeyArgs) -> Result<SigningKey> {
    let raw = if let Some(ref path) = args.key_path {
        fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?
    } else if let Some(ref key) = args.key {
        key.clone()
    } else {
        return Err(anyhow!(
            "missing signer key: provide --key-path or --key (or set SIGNER_KEY_PATH/SIGNER_KEY)"
        ));
    };
    let trimmed = raw.trim();
    let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .context("signer key is not valid hex")?;
    SigningKey::from_slice(&bytes).map_err(|err| anyhow!("invalid signer key: {err}"))
}

impl CallArgs {
    /// Expand omitted values and payloads, then require matching lengths.
    fn expand(&self) -> Result<(Vec<Address>, Vec<U256>, Vec<Bytes>)> {
        let n = self.tos.len();
        let values = if self.values.is_empty() {
            vec![U256::ZERO; n]
        } else {
            self.values.clone()
        };
        let datas = if self.datas.is_empty() {
            vec![Bytes::new(); n]
        } else {
            self.datas.clone()
        };
        if values.len() != n || datas.len() != n {
            bail!(
                "{} --to, {} --value and {} --data given; lengths must match",
                n,
                values.len(),
                datas.len()
            );
        }
        Ok((self.tos.clone(), values, datas))
    }

    fn single(&self) -> Result<(Address, U256, Bytes)> {
        let (tos, values, datas) = self.expand()?;
        match (tos.as_slice(), values.as_slice(), datas.as_slice()) {
            ([to], [value], [data]) => Ok((*to, *value, data.clone())),
            _ => bail!("this action takes exactly one --to"),
        }
    }
}

fn fingerprint(args: &FingerprintArgs) -> Result<B256> {
    let fingerprint = match args.kind {
        Kind::Call => {
            let (to, value, data) = args.calls.single()?;
            call_fingerprint(to, value, &data, args.nonce)
        }
        Kind::Delegate => {
            let (to, value, data) = args.calls.single()?;
            if !value.is_zero() {
                bail!("delegated calls carry no value");
            }
            delegate_fingerprint(to, &data, args.nonce)
        }
        Kind::Batch => {
            let (tos, values, datas) = args.calls.expand()?;
            batch_fingerprint(&tos, &values, &datas, args.nonce)
        }
        Kind::Permit => {
            let (to, value, data) = args.calls.single()?;
            permit_fingerprint(to, value, &data)
        }
    };
    Ok(fingerprint)
}

fn sign_batch(args: &SignBatchArgs) -> Result<()> {
    let config = AccountConfig::load(&args.config)
        .with_context(|| format!("failed loading {}", args.config.display()))?;
    let key = load_key(&args.key)?;
    let signer = address_of(key.verifying_key());
    if !config.owners.contains(&signer) && config.assistant != Some(signer) {
        bail!("{signer} is not a principal of account {}", config.address);
    }

    let (tos, values, datas) = args.calls.expand()?;
    let now = OffsetDateTime::now_utc();
    let deadline = match args.deadline {
        Some(deadline) => deadline,
        None => {
            let now_secs = u64::try_from(now.unix_timestamp()).context("clock before unix epoch")?;
            U256::from(now_secs.saturating_add(args.ttl_secs))
        }
    };

    let domain = domain_separator(args.chain_id, config.address);
    let digest = batch_digest(domain, &tos, &values, &datas, args.nonce, deadline);
    let signature =
        sign_digest(&key, digest).map_err(|err| anyhow!("failed signing digest: {err}"))?;
    debug!(%digest, %signer, "batch signed");

    let document = SignedBatchDocument {
        account: config.address,
        chain_id: args.chain_id,
        signer,
        fingerprint: batch_fingerprint(&tos, &values, &datas, args.nonce),
        tos,
        values,
        datas,
        nonce: args.nonce,
        deadline,
        digest,
        signature,
        issued_at: now.format(&Rfc3339).unwrap_or_else(|_| "unknown".to_string()),
    };
    let serialised =
        serde_json::to_string_pretty(&document).context("failed serialising signed batch")?;
    match args.out {
        Some(ref path) => {
            fs::write(path, serialised.as_bytes())
                .with_context(|| format!("failed writing {}", path.display()))?;
            info!(path = %path.display(), "signed batch written");
        }
        None => println!("{serialised}"),
    }
    Ok(())
}

fn simulate(args: &SimulateArgs) -> Result<()> {
    let config = AccountConfig::load(&args.config)
        .with_context(|| format!("failed loading {}", args.config.display()))?;
    let (tos, values, datas) = args.calls.expand()?;

    let now = u64::try_from(OffsetDateTime::now_utc().unix_timestamp()).unwrap_or_default();
    let mut host = SimHost::new(args.chain_id, now);
    let budget = values
        .iter()
        .try_fold(U256::ZERO, |acc, v| acc.checked_add(*v))
        .context("total value overflows")?;
    host.fund(config.address, budget);

    let mut account = DuoAccount::deploy(&mut host, &config, &[]).context("deployment failed")?;
    let [first, second] = config.owners;
    let proposal = account
        .batch_execute(&mut host, first, &tos, &values, &datas, args.nonce)
        .context("proposal failed")?;
    let confirmation = account
        .batch_execute(&mut host, second, &tos, &values, &datas, args.nonce)
        .context("confirmation failed")?;

    let (executed, outputs) = match confirmation {
        Execution::Executed { outputs, .. } => (true, outputs),
        Execution::Proposed { .. } => (false, Vec::new()),
    };
    let report = SimulationReport {
        fingerprint: proposal.fingerprint(),
        executed,
        outputs,
        events: account.events().to_vec(),
    };
    let calls: Vec<_> = host
        .calls()
        .iter()
        .map(|c| json!({ "from": c.from, "to": c.to, "value": c.value, "data": c.data }))
        .collect();

    let mut root = serde_json::to_value(&report).context("failed serialising report")?;
    root["calls"] = json!(calls);
    println!(
        "{}",
        serde_json::to_string_pretty(&root).context("failed serialising report")?
    );
    Ok(())
}
