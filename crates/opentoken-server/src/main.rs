//! OpenToken operator binary.
//!
//! # Usage
//!
//! ```bash
//! # Create the outer key file referenced by [secret] path
//! opentoken generate-secret --out /etc/opentoken/secret.key
//!
//! # Store and read a record
//! opentoken --config opentoken.toml put --class session --id alice --id s1 --value hello
//! opentoken --config opentoken.toml get --class session --id alice --id s1
//!
//! # Issue an access code, sign a request with it, verify the signature
//! opentoken --config opentoken.toml issue-access-code --account alice
//! opentoken sign --access-code <code> --secret <hex> --method GET --path /account \
//!     --header "host: api.example.com" --header "x-opentoken-date: 2010-01-01T01:23:45Z" \
//!     --header "content-type: text/plain"
//! ```

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use opentoken_auth::{AUTHORIZATION, SignatureVerifier, SignedRequest, authorization_header};
use opentoken_core::{Environment, secret::DEFAULT_SECRET_LEN};
use opentoken_server::{
    AccessCodes, Config, ErrorReport, RecordError, RecordStore, RedbStorage, ServerError, Settings, SystemEnv,
    open_records,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// OpenToken record and access code tool
#[derive(Parser, Debug)]
#[command(name = "opentoken")]
#[command(about = "OpenToken confidential record store and OT1 signatures")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "opentoken.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides [logging]
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a new random service secret file
    GenerateSecret {
        /// Output path; must not exist
        #[arg(long)]
        out: PathBuf,
        /// Secret length in bytes
        #[arg(long, default_value_t = DEFAULT_SECRET_LEN)]
        bytes: usize,
    },

    /// Store a string record
    Put {
        /// Record class
        #[arg(long)]
        class: String,
        /// Identifier segment, repeatable and ordered
        #[arg(long = "id", required = true)]
        ids: Vec<String>,
        /// Value to store
        #[arg(long)]
        value: String,
    },

    /// Read a string record
    Get {
        /// Record class
        #[arg(long)]
        class: String,
        /// Identifier segment, repeatable and ordered
        #[arg(long = "id", required = true)]
        ids: Vec<String>,
    },

    /// Delete a record
    Delete {
        /// Record class
        #[arg(long)]
        class: String,
        /// Identifier segment, repeatable and ordered
        #[arg(long = "id", required = true)]
        ids: Vec<String>,
    },

    /// Issue an access code and signing secret for an account
    IssueAccessCode {
        /// Account ID
        #[arg(long)]
        account: String,
        /// Free-form description stored with the code
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Revoke an access code
    RevokeAccessCode {
        /// Account ID
        #[arg(long)]
        account: String,
        /// Access code to revoke
        #[arg(long)]
        access_code: String,
    },

    /// Print the OT1 Authorization header for a request
    Sign {
        /// Access code
        #[arg(long)]
        access_code: String,
        /// Signing secret, hex
        #[arg(long)]
        secret: String,
        #[command(flatten)]
        request: RequestArgs,
        /// Extra header names to sign beyond the mandatory three
        #[arg(long = "sign-header")]
        sign_headers: Vec<String>,
    },

    /// Verify an OT1-signed request against issued access codes
    Verify {
        /// Account ID the request acts for
        #[arg(long)]
        account: String,
        /// Authorization header value
        #[arg(long)]
        authorization: Option<String>,
        /// Accept requests without an Authorization header
        #[arg(long)]
        allow_unsigned: bool,
        #[command(flatten)]
        request: RequestArgs,
    },
}

#[derive(clap::Args, Debug)]
struct RequestArgs {
    /// HTTP method
    #[arg(long)]
    method: String,
    /// Request path
    #[arg(long)]
    path: String,
    /// Query string without `?`
    #[arg(long, default_value = "")]
    query: String,
    /// Header as `name: value`, repeatable
    #[arg(long = "header")]
    headers: Vec<String>,
    /// Request body
    #[arg(long, default_value = "")]
    body: String,
}

impl RequestArgs {
    fn to_request(&self) -> Result<SignedRequest, ServerError> {
        let mut request = SignedRequest::new(&self.method, &self.path, &self.query)
            .with_body(self.body.as_bytes().to_vec());
        for header in &self.headers {
            let (name, value) = header
                .split_once(':')
                .ok_or_else(|| ServerError::Input(format!("header without ':': {header}")))?;
            request.add_header(name.trim(), value.trim());
        }
        Ok(request)
    }
}

impl Command {
    fn needs_config(&self) -> bool {
        !matches!(self, Self::GenerateSecret { .. } | Self::Sign { .. })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let settings = if args.command.needs_config() {
        Some(Config::load(&args.config)?.resolve()?)
    } else {
        None
    };

    let level = args
        .log_level
        .clone()
        .or_else(|| settings.as_ref().map(|s| s.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    match (args.command, settings) {
        (Command::GenerateSecret { out, bytes }, _) => generate_secret(&out, bytes)?,
        (Command::Sign { access_code, secret, request, sign_headers }, _) => {
            sign(&access_code, &secret, &request, &sign_headers)?;
        },
        (command, Some(settings)) => run(command, &settings).await?,
        (_, None) => return Err(ServerError::Input("configuration required".to_string()).into()),
    }

    Ok(())
}

async fn run(command: Command, settings: &Settings) -> Result<(), ServerError> {
    let records = open_records(settings)?;

    match command {
        Command::Put { class, ids, value } => {
            records.put(&class, &refs(&ids), &value).await.map_err(|e| report(&records, &e))?;
        },
        Command::Get { class, ids } => match records.get::<String>(&class, &refs(&ids)).await {
            Ok(Some(value)) => emit(&value)?,
            Ok(None) => return Err(ServerError::Input("record not found".to_string())),
            Err(e) => return Err(report(&records, &e)),
        },
        Command::Delete { class, ids } => {
            records.delete(&class, &refs(&ids)).await.map_err(|e| report(&records, &e))?;
        },
        Command::IssueAccessCode { account, description } => {
            let issued = AccessCodes::new(records).issue(&account, &description).await?;
            emit(&format!("access-code: {}", issued.access_code))?;
            emit(&format!("secret: {}", hex::encode(issued.secret.expose())))?;
        },
        Command::RevokeAccessCode { account, access_code } => {
            AccessCodes::new(records).revoke(&account, &access_code).await?;
        },
        Command::Verify { account, authorization, allow_unsigned, request } => {
            let mut request = request.to_request()?;
            if let Some(authorization) = authorization {
                request.set_header(AUTHORIZATION, &authorization);
            }
            let verifier = SignatureVerifier::new(
                settings.signature.clone(),
                AccessCodes::new(records),
                SystemEnv::new(),
            );
            match verifier.authenticate(&mut request, &account, allow_unsigned).await {
                Ok(auth) => emit(&format!("{auth:?}"))?,
                Err(e) => {
                    let report = ErrorReport::signature(&SystemEnv::new(), &e);
                    return Err(ServerError::Input(report.to_string()));
                },
            }
        },
        Command::GenerateSecret { .. } | Command::Sign { .. } => {},
    }

    Ok(())
}

fn report(records: &RecordStore<RedbStorage, SystemEnv>, error: &RecordError) -> ServerError {
    ServerError::Input(ErrorReport::record(records.freezer().env(), error).to_string())
}

fn generate_secret(out: &Path, bytes: usize) -> Result<(), ServerError> {
    if bytes == 0 {
        return Err(ServerError::Input("secret length must be positive".to_string()));
    }
    let mut secret = zeroize::Zeroizing::new(vec![0u8; bytes]);
    SystemEnv::new().random_bytes(&mut secret);

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(out)?.write_all(&secret)?;

    tracing::info!(path = %out.display(), bytes, "service secret written");
    Ok(())
}

fn sign(
    access_code: &str,
    secret_hex: &str,
    request: &RequestArgs,
    sign_headers: &[String],
) -> Result<(), ServerError> {
    let secret = zeroize::Zeroizing::new(
        hex::decode(secret_hex).map_err(|e| ServerError::Input(format!("secret is not hex: {e}")))?,
    );
    let request = request.to_request()?;
    let extra = refs(sign_headers);
    emit(&authorization_header(&request, access_code, &secret, &extra)?)
}

/// Command output goes to stdout; logs go to stderr.
fn emit(line: &str) -> Result<(), ServerError> {
    writeln!(std::io::stdout().lock(), "{line}")?;
    Ok(())
}

fn refs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}
