//! uastack CLI: run endpoint servers from a config file, query servers for
//! their endpoints, and create or inspect application instance certificates.

mod cli;

use anyhow::{bail, Context};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

use crate::cli::{Cli, Commands};
use uastack_app::config::uastack_home;
use uastack_app::{load_config, Application};
use uastack_security::{Certificate, EndpointExt, Identity, PrivateKey};
use uastack_types::config::{ApplicationConfig, IdentityConfig};
use uastack_types::discovery::GetEndpointsRequest;
use uastack_types::endpoint::EndpointDescription;
use uastack_types::security::{SecurityPolicy, TransportKind};
use uastack_wire::{discover_endpoints, EndpointServer};

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let result = match cli.command {
        Commands::Init {
            force,
            application_uri,
        } => cmd_init(cli.config.as_deref(), force, application_uri),
        Commands::Serve { https } => run_async(cmd_serve(cli.config.as_deref(), https)),
        Commands::Discover {
            addr,
            url,
            profiles,
            json,
        } => run_async(cmd_discover(&addr, url, profiles, json)),
        Commands::Thumbprint { path } => cmd_thumbprint(&path),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run_async<F: std::future::Future<Output = anyhow::Result<()>>>(fut: F) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("failed to create Tokio runtime")?;
    rt.block_on(fut)
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn cmd_init(
    config_path: Option<&Path>,
    force: bool,
    application_uri: Option<String>,
) -> anyhow::Result<()> {
    let home = uastack_home();
    std::fs::create_dir_all(&home)
        .with_context(|| format!("cannot create {}", home.display()))?;

    let cert_path = home.join("cert.der");
    let key_path = home.join("key.der");
    if cert_path.exists() && !force {
        bail!(
            "{} already exists (use --force to replace it)",
            cert_path.display()
        );
    }

    let application_uri = application_uri.unwrap_or_else(|| {
        let host = hostname_or_localhost();
        format!("urn:{host}:uastack")
    });
    let identity = generate_identity(&application_uri)?;
    identity
        .save(&cert_path, &key_path)
        .context("cannot write identity")?;
    println!("Identity:   {}", cert_path.display());
    println!("Thumbprint: {}", identity.thumbprint());

    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| home.join("config.toml"));
    if config_path.exists() {
        println!("Config:     {} (kept)", config_path.display());
        return Ok(());
    }
    let config = ApplicationConfig {
        application_uri: Some(application_uri),
        identity: Some(IdentityConfig {
            certificate: cert_path,
            private_key: key_path,
        }),
        ..Default::default()
    };
    std::fs::write(&config_path, toml::to_string_pretty(&config)?)
        .with_context(|| format!("cannot write {}", config_path.display()))?;
    println!("Config:     {}", config_path.display());
    Ok(())
}

/// Self-signed certificate carrying the application URI as a SAN.
fn generate_identity(application_uri: &str) -> anyhow::Result<Identity> {
    let key = rcgen::KeyPair::generate()?;
    let mut params = rcgen::CertificateParams::new(vec![hostname_or_localhost()])?;
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, "uastack");
    params
        .subject_alt_names
        .push(rcgen::SanType::URI(rcgen::Ia5String::try_from(
            application_uri.to_string(),
        )?));
    let cert = params.self_signed(&key)?;
    let identity = Identity::new(
        Certificate::decode(cert.der())?,
        PrivateKey::from_key_pair(&key),
    )?;
    Ok(identity)
}

fn hostname_or_localhost() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

// ---------------------------------------------------------------------------
// serve
// ---------------------------------------------------------------------------

async fn cmd_serve(config_path: Option<&Path>, https: bool) -> anyhow::Result<()> {
    let config = load_config(config_path);
    let app = Application::from_config(&config).context("invalid configuration")?;

    let mut kinds = vec![TransportKind::OpcTcp];
    if https {
        kinds.push(TransportKind::Https);
    }
    for kind in kinds {
        let server = app.server(kind).await?;
        print_server(server.as_ref());
    }

    info!(application_uri = %app.application_uri(), "Serving; press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    app.close();
    Ok(())
}

fn print_server(server: &dyn EndpointServer) {
    println!("{} listening on {}", server.kind(), server.local_addr());
    for endpoint in server.endpoints() {
        print_endpoint(&endpoint);
    }
}

// ---------------------------------------------------------------------------
// discover
// ---------------------------------------------------------------------------

async fn cmd_discover(
    addr: &str,
    url: Option<String>,
    profiles: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let addr: SocketAddr = tokio::net::lookup_host(addr)
        .await
        .with_context(|| format!("cannot resolve {addr}"))?
        .next()
        .with_context(|| format!("no address for {addr}"))?;
    let url = url.unwrap_or_else(|| format!("opc.tcp://{addr}"));

    let mut request = GetEndpointsRequest::new(url);
    request.profile_uris = profiles;
    let response = discover_endpoints(addr, request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    if response.endpoints.is_empty() {
        println!("No endpoints.");
    }
    for endpoint in &response.endpoints {
        print_endpoint(endpoint);
    }
    Ok(())
}

fn print_endpoint(endpoint: &EndpointDescription) {
    let policy = SecurityPolicy::from_optional_uri(endpoint.security_policy_uri.as_deref())
        .map(|p| p.name().to_string())
        .unwrap_or_else(|_| "unsupported".to_string());
    let tokens: Vec<_> = endpoint
        .user_identity_tokens
        .iter()
        .flatten()
        .filter_map(|t| t.policy_id.as_deref())
        .collect();
    println!(
        "  {:<40} {:<16} {:<20} level={:<3} cert={} tokens=[{}]",
        endpoint.endpoint_url,
        format!("{:?}", endpoint.security_mode),
        policy,
        endpoint.security_level,
        if endpoint.needs_certificate() { "required" } else { "no" },
        tokens.join(", "),
    );
}

// ---------------------------------------------------------------------------
// thumbprint
// ---------------------------------------------------------------------------

fn cmd_thumbprint(path: &Path) -> anyhow::Result<()> {
    let cert = Certificate::decode_file(path)
        .with_context(|| format!("cannot read certificate {}", path.display()))?;
    println!("Subject:    {}", cert.subject());
    println!("Thumbprint: {}", cert.thumbprint());
    println!("Not before: {}", cert.not_before());
    println!("Not after:  {}", cert.not_after());
    if !cert.is_valid_at(chrono::Utc::now()) {
        println!("Status:     outside its validity window");
    }
    Ok(())
}
