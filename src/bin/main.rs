//! Methane CLI - PSBT builder server and one-shot template builds
//!
//!   methane serve [--port N] [--host H] [--network NET]
//!   methane build --address bc1p... [--fee-rate N] [--mint-data T,A,P]
//!
//! Output format:
//!   --json     Output raw JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use anyhow::{anyhow, bail, Context};
use methane::config::{load_dotenv, ServerConfig};
use methane::logging::init_logging;
use methane::{create_router_with_name, install_signal_handlers, MintData, MintPsbtResponse, Network, PsbtBuilder};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use tracing::info;

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);
    init_logging();

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("methane {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("serve") => cmd_serve(&opts),
        Some("build") => cmd_build(&opts),
        Some("help") => {
            print_usage();
            return;
        }
        Some(cmd) => Err(anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || (!opts.json && std::io::stdout().is_terminal());
    match result {
        Ok(Value::Null) => {}
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"success": false, "error": format!("{:#}", e)}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    // Server options
    port: Option<u16>,
    host: Option<String>,
    network: Option<String>,
    // Build options
    fee_rate: Option<u64>,
    mint_data: Option<String>,
    address: Option<String>,
    // Output options
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        load_dotenv(".env");

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let value = args.get(i + 1).cloned();
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--port" | "-p" => {
                    opts.port = value.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "--host" => {
                    opts.host = value;
                    i += 1;
                }
                "--network" | "-n" => {
                    opts.network = value;
                    i += 1;
                }
                "--fee-rate" | "-f" => {
                    opts.fee_rate = value.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "--mint-data" | "-m" => {
                    opts.mint_data = value;
                    i += 1;
                }
                "--address" | "-a" => {
                    opts.address = value;
                    i += 1;
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        opts
    }

    /// Env (and `.env`) first, then flags on top
    fn server_config(&self) -> anyhow::Result<ServerConfig> {
        let mut config = ServerConfig::from_env().context("Invalid environment")?;
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(host) = &self.host {
            config = config.with_host(host.clone());
        }
        if let Some(network) = &self.network {
            config = config.with_network(network.parse::<Network>().map_err(|e| anyhow!(e))?);
        }
        if let Some(mint_data) = &self.mint_data {
            config.mint_data = mint_data.parse::<MintData>()?;
        }
        Ok(config)
    }
}

fn print_usage() {
    println!(
        r#"methane - Alkanes mint PSBT builder

USAGE:
    methane <command> [options]

COMMANDS:
    serve                   Start the PSBT builder HTTP server
    build                   Build one mint template and print it as JSON
    help                    Show this message

SERVER OPTIONS:
    --port, -p <port>       Server port (default: 3001, env: METHANE_PORT or PORT)
    --host <host>           Bind address (default: 0.0.0.0, env: METHANE_HOST)
    --network, -n <net>     bitcoin|testnet|signet|regtest (env: METHANE_NETWORK)

BUILD OPTIONS:
    --address, -a <addr>    Taproot recipient (required)
    --fee-rate, -f <n>      Fee rate in sat/vB (default: 1)
    --mint-data, -m <T,A,P> Protocol integers (default: 2,1,77, env: METHANE_MINT_DATA)

OUTPUT OPTIONS:
    --json                  Raw JSON output
    --pretty                Pretty-print JSON
    --version, -V           Print version

ENDPOINTS:
    GET  /                      → API description
    GET  /health                → Server is running
    POST /api/create-mint-psbt  ← {{feeRate, mintData, userAddress}}
                                → {{success, psbt, format, feeRate}}

EXAMPLES:
    methane serve --port 3001 --network signet
    methane build -a bc1p... -f 5 -m 2,1,77

LOGGING:
    RUST_LOG=debug          Filter (default: info)
    METHANE_LOG_JSON=1      JSON log lines on stderr
"#
    );
}

fn cmd_build(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let config = opts.server_config()?;
    let Some(address) = opts.address.as_deref() else { bail!("--address is required") };
    let fee_rate = opts.fee_rate.unwrap_or(1);

    let template = PsbtBuilder::new(config.network).build_mint_template(fee_rate, &config.mint_data.to_string(), address)?;
    info!(%address, mint_data = %config.mint_data, fee_rate, "template built");
    Ok(serde_json::to_value(MintPsbtResponse::ok(template.hex(), template.fee_rate()))?)
}

fn cmd_serve(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let config = opts.server_config()?;
    let rt = tokio::runtime::Runtime::new().context("Failed to create runtime")?;

    rt.block_on(async {
        let shutdown = install_signal_handlers();
        let router = create_router_with_name(PsbtBuilder::new(config.network), "methane");
        let addr = config.addr();

        let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("Failed to bind {}", addr))?;
        info!("Methane server listening on http://{} ({})", addr, config.network);
        info!("Endpoints:");
        info!("  GET  /                      - API description");
        info!("  GET  /health                - Health check");
        info!("  POST /api/create-mint-psbt  - Build mint PSBT");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await
            .context("Server error")?;

        info!("Server stopped");
        Ok::<_, anyhow::Error>(Value::Null)
    })
}
