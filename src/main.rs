use clap::{Args, Parser, Subcommand};
use kahawa_tip::application::session::{SessionSettings, TippingSession};
use kahawa_tip::config::{AppConfig, ProviderCredentials};
use kahawa_tip::domain::ports::SharedPaymentGateway;
use kahawa_tip::domain::session::SubmissionState;
use kahawa_tip::domain::tip::{FailureKind, RecipientId};
use kahawa_tip::error::TipError;
use kahawa_tip::infrastructure::http::HttpGateway;
use kahawa_tip::infrastructure::simulated::SimulatedGateway;
use kahawa_tip::interfaces::http::{BackendState, serve};
use kahawa_tip::logging::init_logging;
use miette::{IntoDiagnostic, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file. Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a tip via M-Pesa STK push
    Tip(TipArgs),
    /// Run the payment backend endpoint
    Serve(ServeArgs),
}

#[derive(Args)]
struct TipArgs {
    /// M-Pesa phone number (07..., 01..., 254... or +254...)
    #[arg(long)]
    phone: String,

    /// Tip amount in whole KES. Defaults to the configured default tip.
    #[arg(long, conflicts_with = "preset")]
    amount: Option<String>,

    /// Pick one of the configured preset amounts
    #[arg(long)]
    preset: Option<u64>,

    /// Recipient (creator) identifier
    #[arg(long, default_value = "creator_123")]
    recipient: String,

    /// Confirm without prompting and do not offer a retry
    #[arg(long, short)]
    yes: bool,

    /// Send through a payment backend instead of the in-process simulator
    #[arg(long, env = "KAHAWA_BACKEND_URL")]
    backend_url: Option<String>,
}

#[derive(Args)]
struct ServeArgs {
    /// Listen address. Overrides `backend.listen_addr`.
    #[arg(long)]
    addr: Option<String>,

    #[arg(long, env = "MPESA_CONSUMER_KEY", hide_env_values = true)]
    consumer_key: Option<String>,

    #[arg(long, env = "MPESA_CONSUMER_SECRET", hide_env_values = true)]
    consumer_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).into_diagnostic()?;
    init_logging(&config.log_level);

    match cli.command {
        Command::Tip(args) => run_tip(&config, args).await,
        Command::Serve(args) => run_serve(&config, args).await,
    }
}

async fn run_tip(config: &AppConfig, args: TipArgs) -> Result<()> {
    let gateway: SharedPaymentGateway = match &args.backend_url {
        Some(url) => Arc::new(HttpGateway::new(url, config.request_timeout()).into_diagnostic()?),
        None => Arc::new(SimulatedGateway::from_config(&config.simulator)),
    };
    let session = Arc::new(TippingSession::new(
        gateway,
        RecipientId::new(args.recipient.clone()),
        SessionSettings::from(config),
    ));

    // Ctrl-C tears the session down; an in-flight request settles as cancelled.
    let teardown = tokio::spawn({
        let session = Arc::clone(&session);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                session.shutdown().await;
            }
        }
    });

    let outcome = drive_tip(config, &session, &args).await;
    teardown.abort();
    outcome
}

async fn drive_tip(config: &AppConfig, session: &TippingSession, args: &TipArgs) -> Result<()> {
    if let Some(amount) = &args.amount {
        session.set_amount(amount).await;
    }
    if let Some(preset) = args.preset {
        if !session.select_preset(preset).await {
            let presets: Vec<String> = session.presets().iter().map(u64::to_string).collect();
            let error = TipError::InvalidAmount(format!(
                "{preset} is not a preset amount (choose one of {})",
                presets.join(", ")
            ));
            return Err(error).into_diagnostic();
        }
    }
    session.set_phone(&args.phone).await;

    if session.submit().await != SubmissionState::AwaitingConfirmation {
        let errors = session.snapshot().await.field_errors;
        let error = match (errors.amount, errors.phone) {
            (Some(message), _) => TipError::InvalidAmount(message),
            (None, Some(message)) => TipError::InvalidPhone(message),
            (None, None) => TipError::InternalError("submission was not accepted".to_string()),
        };
        return Err(error).into_diagnostic();
    }

    let snapshot = session.snapshot().await;
    let question = format!(
        "Pay {} {} to {} from {} with M-Pesa?",
        config.currency,
        snapshot.amount_input,
        session.recipient_id(),
        snapshot.phone_input
    );
    if !args.yes && !prompt(&question).await? {
        session.cancel().await;
        println!("Tip cancelled.");
        return Ok(());
    }

    println!("Processing...");
    let mut state = session.confirm().await;
    loop {
        match state {
            SubmissionState::Succeeded(message) => {
                println!("{message}");
                return Ok(());
            }
            SubmissionState::Failed(message) => {
                println!("{message}");
                let kind = session.snapshot().await.last_failure;
                if !args.yes && kind != Some(FailureKind::Cancelled) && prompt("Retry?").await? {
                    println!("Processing...");
                    state = session.retry().await;
                    continue;
                }
                let kind = kind.unwrap_or(FailureKind::Internal);
                return Err(kind.into_error(message)).into_diagnostic();
            }
            other => {
                let error = TipError::InternalError(format!("unexpected state {other:?}"));
                return Err(error).into_diagnostic();
            }
        }
    }
}

/// Asks a yes/no question on stdin. Ctrl-C while waiting counts as "no".
async fn prompt(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush().into_diagnostic()?;

    let mut answer = String::new();
    let mut stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        read = stdin.read_line(&mut answer) => {
            read.into_diagnostic()?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            return Ok(false);
        }
    }
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn run_serve(config: &AppConfig, args: ServeArgs) -> Result<()> {
    let addr = args
        .addr
        .unwrap_or_else(|| config.backend.listen_addr.clone());

    let credentials = match (args.consumer_key, args.consumer_secret) {
        (Some(consumer_key), Some(consumer_secret)) => Some(ProviderCredentials {
            consumer_key,
            consumer_secret,
        }),
        _ => None,
    };

    let provider: SharedPaymentGateway = Arc::new(SimulatedGateway::from_config(&config.simulator));
    let state = Arc::new(BackendState::new(provider, credentials));

    let listener = TcpListener::bind(&addr).await.into_diagnostic()?;
    serve(listener, state).await.into_diagnostic()
}
