//! `strongbox-upload`: uploads one local file to a Strongbox server.
//!
//! Server URL and token come from the config file (`--config`, default
//! `strongbox.json`) or the `STRONGBOX_SERVER_URL` / `STRONGBOX_AUTH_TOKEN`
//! environment variables.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use strongbox_upload::{
    Classification, ClientConfig, FileUploadRequest, Node, ResolutionStrategy, UploadClient,
    UploadEvent,
};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Read size when feeding a streaming upload.
const STREAM_READ_SIZE: usize = 64 * 1024;

#[derive(Debug, Parser)]
#[command(name = "strongbox-upload", version, about = "Upload a file to a Strongbox server")]
struct Cli {
    /// File to upload.
    path: PathBuf,

    /// Id of the target room or folder.
    #[arg(long)]
    parent: i64,

    /// Remote file name (defaults to the local file name).
    #[arg(long)]
    name: Option<String>,

    #[arg(long, value_enum, default_value_t = ClassificationArg::Internal)]
    classification: ClassificationArg,

    #[arg(long)]
    notes: Option<String>,

    /// Expiration timestamp (RFC 3339).
    #[arg(long)]
    expire_at: Option<DateTime<Utc>>,

    /// What to do if the name is taken.
    #[arg(long, value_enum)]
    on_conflict: Option<ConflictArg>,

    /// Push the file through the streaming uploader instead.
    #[arg(long)]
    stream: bool,

    #[arg(long, default_value = "strongbox.json")]
    config: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ClassificationArg {
    Public,
    Internal,
    Confidential,
    StrictlyConfidential,
}

impl From<ClassificationArg> for Classification {
    fn from(arg: ClassificationArg) -> Self {
        match arg {
            ClassificationArg::Public => Classification::Public,
            ClassificationArg::Internal => Classification::Internal,
            ClassificationArg::Confidential => Classification::Confidential,
            ClassificationArg::StrictlyConfidential => Classification::StrictlyConfidential,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConflictArg {
    Autorename,
    Overwrite,
    Fail,
}

impl From<ConflictArg> for ResolutionStrategy {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Autorename => ResolutionStrategy::AutoRename,
            ConflictArg::Overwrite => ResolutionStrategy::Overwrite,
            ConflictArg::Fail => ResolutionStrategy::Fail,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strongbox=debug")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.apply_env();
    let client = UploadClient::from_config(&config)?;

    let request = build_request(&cli)?;
    let node = if cli.stream {
        stream_file(&client, &cli, request).await?
    } else {
        match upload_file(&client, &cli, request).await? {
            Some(node) => node,
            None => {
                eprintln!("upload cancelled");
                return Ok(());
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&node)?);
    Ok(())
}

fn build_request(cli: &Cli) -> anyhow::Result<FileUploadRequest> {
    let name = match &cli.name {
        Some(name) => name.clone(),
        None => match cli.path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => bail!("cannot derive a file name from {}", cli.path.display()),
        },
    };

    let mut request =
        FileUploadRequest::new(cli.parent, name).classification(cli.classification.into());
    if let Some(notes) = &cli.notes {
        request = request.notes(notes.clone());
    }
    if let Some(expire_at) = cli.expire_at {
        request = request.expire_at(expire_at);
    }
    if let Some(strategy) = cli.on_conflict {
        request = request.resolution_strategy(strategy.into());
    }
    Ok(request)
}

/// Buffered upload with progress on stderr; Ctrl-C cancels.
async fn upload_file(
    client: &UploadClient,
    cli: &Cli,
    request: FileUploadRequest,
) -> anyhow::Result<Option<Node>> {
    let id = uuid::Uuid::new_v4().to_string();
    let upload = client
        .file_upload_from_path(id, request, &cli.path)
        .await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    upload.add_callback(Arc::new(tx));
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let UploadEvent::Running { sent, total, .. } = event {
                let pct = if total > 0 { sent * 100 / total } else { 100 };
                eprint!("\r{sent}/{total} bytes ({pct}%)");
            }
        }
        eprintln!();
    });

    let cancel = upload.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling upload");
            cancel.cancel();
        }
    });

    let result = upload.run().await;
    // The upload dropped the last sender; the printer drains and exits.
    let _ = printer.await;
    Ok(result?)
}

/// Streams the file through a [`strongbox_upload::StreamUpload`].
async fn stream_file(
    client: &UploadClient,
    cli: &Cli,
    request: FileUploadRequest,
) -> anyhow::Result<Node> {
    let mut file = tokio::fs::File::open(&cli.path)
        .await
        .with_context(|| format!("opening {}", cli.path.display()))?;
    let mut stream = client.open_stream(request).await?;

    let mut buf = vec![0u8; STREAM_READ_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        stream.write(&buf[..n]).await?;
    }
    tracing::info!(bytes = stream.bytes_written(), "file streamed");

    Ok(stream.close().await?)
}
