//! Gmail runner: searches a mailbox and organizes the results.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::{debug, info};

use mailpress_core::{
    AdmissionPolicy, Classifier, Ledger, MaterializeConfig, Materializer, NormalizedMessage,
    Outcome, SubjectPattern, Summary, sanitize_joined,
};
use mailpress_gmail::{GmailClient, MessageRef, scoped_query};
use mailpress_oauth::{AuthorizationCodeFlow, ClientSecrets, OAuthClient, Provider, Token, TokenCache};

use crate::report;

/// File under the output root holding processed message ids.
const LEDGER_FILE: &str = "processed_ledger.jsonl";

/// Arguments for the `fetch` subcommand.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Root directory search results are organized under
    #[arg(long, default_value = "gmail_out")]
    pub output_root: PathBuf,

    /// Gmail search query; prompted for interactively when absent
    #[arg(long)]
    pub query: Option<String>,

    /// Maximum number of messages to process
    #[arg(long)]
    pub limit: Option<usize>,

    /// Evaluate every decision without writing files or the ledger
    #[arg(long)]
    pub dry_run: bool,

    /// Active subject extraction pattern
    #[arg(long, default_value = "default")]
    pub pattern: SubjectPattern,

    /// Google client secrets file (defaults to the platform config dir)
    #[arg(long)]
    pub credentials: Option<PathBuf>,
}

/// Runs the hosted-mail pipeline.
pub fn run(args: &FetchArgs) -> Result<()> {
    // Credentials are the fatal precondition: fail before any message
    // is touched.
    let credentials_path = args
        .credentials
        .clone()
        .or_else(default_credentials_path)
        .context("no credentials path available; pass --credentials")?;
    let secrets = match ClientSecrets::load(&credentials_path) {
        Ok(secrets) => secrets,
        Err(mailpress_oauth::Error::MissingCredentials(path)) => {
            bail!(
                "credentials file not found: {}\n\
                 Download an OAuth client secrets file from the Google Cloud console\n\
                 and place it there, or pass --credentials.",
                path.display()
            );
        }
        Err(err) => return Err(err).context("cannot load client secrets"),
    };

    let token = obtain_token(&secrets)?;

    let query = match &args.query {
        Some(q) => q.clone(),
        None => prompt_nonempty("Gmail search query: ")?,
    };
    let scoped = scoped_query(&query);
    info!(%scoped, "searching mailbox");

    report::print_banner(&[
        format!("Active pattern: {}", args.pattern),
        format!("Query:          {scoped}"),
        format!("Output root:    {}", args.output_root.display()),
        format!("Dry run:        {}", args.dry_run),
    ]);

    let client = GmailClient::new(&token.access_token);
    let refs = client
        .search(&scoped, args.limit)
        .context("mailbox search failed")?;
    if refs.is_empty() {
        println!("No messages matched the query.");
        report::print_summary(&Summary::default(), &args.output_root);
        return Ok(());
    }

    let group_dir = args.output_root.join(sanitize_joined(&query));
    let mut ledger = Ledger::load(args.output_root.join(LEDGER_FILE))?;

    let config = MaterializeConfig {
        output_root: group_dir,
        refs_dir: None,
        dry_run: args.dry_run,
    };
    let materializer = Materializer::new(Classifier::new(args.pattern), config);
    let policy = AdmissionPolicy::default();

    let mut summary = Summary::default();
    for (index, message_ref) in refs.iter().enumerate() {
        let ordinal = index + 1;
        let outcome = if ledger.has(&message_ref.id) {
            Outcome::Skipped
        } else {
            match fetch_normalized(&client, message_ref) {
                Ok(message) => {
                    materializer.process_hosted(&message, ordinal, &policy, &mut ledger)?
                }
                Err(err) => Outcome::Failed {
                    reason: format!("{}: {err:#}", message_ref.id),
                },
            }
        };

        report::print_progress(&message_ref.id, &outcome);
        summary.record(&outcome);
    }

    report::print_summary(&summary, materializer.output_root());
    Ok(())
}

/// Downloads one message and normalizes it for the pipeline.
fn fetch_normalized(client: &GmailClient, message_ref: &MessageRef) -> Result<NormalizedMessage> {
    let full = client.fetch_message(&message_ref.id)?;
    let raw = client.fetch_raw(&message_ref.id)?;

    let mut message = NormalizedMessage::new(&message_ref.id).with_raw_bytes(raw);
    message.subject = full.subject().map(ToString::to_string);
    message.from = full.from().map(ToString::to_string);
    message.date = full.date().map(ToString::to_string);

    for part in full.attachment_parts() {
        let bytes = client
            .fetch_attachment(&message_ref.id, part)
            .with_context(|| format!("attachment `{}`", part.filename))?;
        message = message.with_attachment(part.filename.clone(), bytes);
    }

    debug!(
        id = %message_ref.id,
        attachments = message.attachments.len(),
        "message fetched"
    );
    Ok(message)
}

/// Loads a cached token, refreshing or re-authorizing as needed.
fn obtain_token(secrets: &ClientSecrets) -> Result<Token> {
    let provider = Provider::google().context("provider configuration")?;
    let mut oauth = OAuthClient::new(&secrets.client_id, provider)
        .with_redirect_uri("urn:ietf:wg:oauth:2.0:oob");
    if let Some(secret) = &secrets.client_secret {
        oauth = oauth.with_client_secret(secret);
    }

    let cache = TokenCache::new(
        default_config_dir()
            .context("no config directory available")?
            .join("token.json"),
    );

    if let Some(token) = cache.load() {
        if !token.is_expired() {
            return Ok(token);
        }
        if token.refresh_token.is_some() {
            match oauth.refresh_token(&token) {
                Ok(refreshed) => {
                    cache.store(&refreshed)?;
                    return Ok(refreshed);
                }
                Err(err) => {
                    debug!(%err, "token refresh failed, re-authorizing");
                }
            }
        }
    }

    let flow = AuthorizationCodeFlow::new(oauth).with_pkce();
    let url = flow.authorization_url(None, None)?;
    println!("Authorize mailpress by visiting:\n\n  {url}\n");
    let code = prompt_nonempty("Paste the authorization code: ")?;
    let token = flow.exchange_code(&code).context("code exchange failed")?;
    cache.store(&token)?;
    Ok(token)
}

/// Prompts on stdout and reads one non-empty stdin line.
fn prompt_nonempty(message: &str) -> Result<String> {
    loop {
        print!("{message}");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            bail!("stdin closed while waiting for input");
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }
}

fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mailpress"))
}

fn default_credentials_path() -> Option<PathBuf> {
    default_config_dir().map(|d| d.join("credentials.json"))
}
