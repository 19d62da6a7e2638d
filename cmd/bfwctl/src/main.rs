mod client;
mod resource;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use client::ApiClient;
use pkg_constants::network::{DEFAULT_API_ADDR, DEFAULT_TOKEN};
use pkg_constants::policy::DEFAULT_TENANT_ID;
use pkg_types::ResourceKind;
use resource::{ResourceType, load_resource, resource_name, validate_file};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "bfwctl", about = "CLI tool for host firewall policy management")]
struct Cli {
    /// Server API endpoint
    #[arg(long, default_value = DEFAULT_API_ADDR)]
    server: String,

    /// Bearer token for the API
    #[arg(long, default_value = DEFAULT_TOKEN)]
    token: String,

    /// Output format for get, list and fetch: yaml or json
    #[arg(long, short, default_value = "yaml")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update resources from files
    Create {
        /// hep, gnp or gns
        resource_type: ResourceType,
        /// YAML or JSON files to read
        #[arg(long = "file", short = 'f', required = true, num_args = 1..)]
        files: Vec<String>,
    },
    /// Show one resource
    Get {
        resource_type: ResourceType,
        name: Option<String>,
        #[command(flatten)]
        address: AddressArgs,
    },
    /// List all resources of a type
    List { resource_type: ResourceType },
    /// Delete resources by name, by file, or a host endpoint by address
    Delete {
        resource_type: ResourceType,
        name: Option<String>,
        /// Delete the resources described in these files
        #[arg(long = "file", short = 'f', num_args = 1..)]
        files: Vec<String>,
        #[command(flatten)]
        address: AddressArgs,
    },
    /// Check resource files locally without contacting the server
    Validate {
        resource_type: ResourceType,
        #[arg(long = "file", short = 'f', required = true, num_args = 1..)]
        files: Vec<String>,
    },
    /// Show the resolved policies of a host endpoint
    Fetch {
        /// Host endpoint name
        name: Option<String>,
        /// Fetch every host endpoint
        #[arg(long, conflicts_with = "name")]
        all: bool,
    },
}

/// Host endpoint lookup by tenant and primary address.
#[derive(Args)]
struct AddressArgs {
    #[arg(long)]
    tenant_id: Option<u64>,
    #[arg(long)]
    ip: Option<String>,
}

impl AddressArgs {
    fn query(&self) -> Option<String> {
        self.ip.as_ref().map(|ip| {
            format!(
                "hostendpoints/by-address?tenant_id={}&ip={}",
                self.tenant_id.unwrap_or(DEFAULT_TENANT_ID),
                ip
            )
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Yaml,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format '{}', expected yaml or json", s)),
        }
    }
}

fn print_value(format: OutputFormat, value: &Value) -> anyhow::Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.server, &cli.token)?;

    match &cli.command {
        Commands::Create {
            resource_type,
            files,
        } => {
            let mut succeeded = 0;
            for file in files {
                let result = match load_resource(*resource_type, file) {
                    Ok(body) => client.post(resource_type.collection(), &body).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(stored) => {
                        succeeded += 1;
                        println!(
                            "{} {} applied from {} (version {})",
                            resource_type.0,
                            resource_name(&stored).unwrap_or("?"),
                            file,
                            stored["version"]
                        );
                    }
                    Err(e) => eprintln!("Failed to apply {}: {:#}", file, e),
                }
            }
            println!(
                "Total: {} resources. Success: {}. Fail: {}.",
                files.len(),
                succeeded,
                files.len() - succeeded
            );
        }
        Commands::Get {
            resource_type,
            name,
            address,
        } => {
            let path = match (name, address.query()) {
                (_, Some(query)) if resource_type.0 == ResourceKind::HostEndpoint => query,
                (Some(name), _) => format!("{}/{}", resource_type.collection(), name),
                _ => bail!("a resource name (or --ip for host endpoints) is required"),
            };
            match client.get(&path).await? {
                Some(value) => print_value(cli.output, &value)?,
                None => println!("{} not found.", resource_type.0),
            }
        }
        Commands::List { resource_type } => {
            if let Some(value) = client.get(resource_type.collection()).await? {
                print_value(cli.output, &value)?;
            }
        }
        Commands::Delete {
            resource_type,
            name,
            files,
            address,
        } => {
            let mut targets = Vec::new();
            if let Some(name) = name {
                targets.push(format!("{}/{}", resource_type.collection(), name));
            }
            for file in files {
                let body = load_resource(*resource_type, file)?;
                match resource_name(&body) {
                    Some(name) => targets.push(format!("{}/{}", resource_type.collection(), name)),
                    None => bail!("{} has no metadata.name", file),
                }
            }
            if resource_type.0 == ResourceKind::HostEndpoint {
                targets.extend(address.query());
            }
            if targets.is_empty() {
                bail!("nothing to delete: give a name, --file or --ip");
            }
            for target in &targets {
                if client.delete(target).await? {
                    println!("Deleted {}", target);
                } else {
                    println!("{} not found.", target);
                }
            }
        }
        Commands::Validate {
            resource_type,
            files,
        } => {
            let mut failed = 0;
            for file in files {
                match validate_file(*resource_type, file) {
                    Ok(()) => println!("{}: valid", file),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{:#}", e);
                    }
                }
            }
            if failed > 0 {
                bail!("{} of {} files failed validation", failed, files.len());
            }
        }
        Commands::Fetch { name, all } => {
            let path = match (name, all) {
                (_, true) => "hostendpoints/policies".to_string(),
                (Some(name), false) => format!("hostendpoints/{}/policies", name),
                (None, false) => bail!("a host endpoint name or --all is required"),
            };
            match client.get(&path).await? {
                Some(value) => print_value(cli.output, &value)?,
                None => println!("host endpoint not found."),
            }
        }
    }

    Ok(())
}
