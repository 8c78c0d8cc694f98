//! Clap CLI definitions for uastack.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const AFTER_HELP: &str = "\
\x1b[1;36mExamples:\x1b[0m
  uastack init                              Create ~/.uastack with an identity and config
  uastack serve                             Start the configured endpoint servers
  uastack discover 127.0.0.1:4840           List the endpoints a server offers
  uastack thumbprint ~/.uastack/cert.der    Print a certificate's thumbprint";

/// uastack: OPC UA identities, transport security and endpoint discovery.
#[derive(Parser)]
#[command(name = "uastack", version, after_help = AFTER_HELP)]
pub struct Cli {
    /// Path to config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create ~/.uastack with a self-signed application identity and a default config.
    Init {
        /// Overwrite an existing identity.
        #[arg(long)]
        force: bool,
        /// Application URI written into the certificate and config.
        #[arg(long)]
        application_uri: Option<String>,
    },
    /// Start the endpoint servers described by the config and run until Ctrl+C.
    Serve {
        /// Also start the HTTPS transport.
        #[arg(long)]
        https: bool,
    },
    /// Ask a server for its endpoints.
    Discover {
        /// Server socket address, e.g. 127.0.0.1:4840.
        addr: String,
        /// Endpoint URL sent in the request.
        #[arg(long)]
        url: Option<String>,
        /// Only return endpoints with these transport profile URIs.
        #[arg(long = "profile")]
        profiles: Vec<String>,
        /// Print the raw response as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the thumbprint and validity of a certificate file.
    Thumbprint {
        /// DER or PEM certificate.
        path: PathBuf,
    },
}
