use crate::application::ApplicationContext;
use crate::config::ContainerConfig;
use crate::deployment::deploy_applications;
use crate::runtime_config::RuntimeConfig;
use crate::server::{ContainerService, HttpRequestBuilder, HttpServer, RequestBuilder, ServerHandle};
use crate::servlet::ServletRegistry;
use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Command-line interface for the servlet container
#[derive(Parser, Debug)]
#[command(name = "servlet-engine", version)]
#[command(about = "Servlet container with pattern routing and URL security", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy applications and serve HTTP
    Serve(ServeArgs),
    /// Print the route tables of every application
    Routes {
        /// Directory whose subdirectories are deployed as applications
        #[arg(long, default_value = "webapps")]
        app_base: PathBuf,
    },
    /// Show which servlet a request would be resolved to
    Locate {
        #[arg(long, default_value = "webapps")]
        app_base: PathBuf,

        /// Host header to resolve with
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Request path, e.g. /shop/items
        path: String,
    },
}

/// Options of the `serve` command
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// YAML configuration file
    #[arg(short, long, env = "SERVLET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind, e.g. 0.0.0.0:8080
    #[arg(long)]
    pub addr: Option<String>,

    #[arg(long)]
    pub app_base: Option<PathBuf>,

    /// Socket read timeout in seconds (0 disables)
    #[arg(long)]
    pub read_timeout_secs: Option<u64>,

    /// Bytes requested per socket read
    #[arg(long)]
    pub line_length: Option<usize>,
}

impl ServeArgs {
    /// Configuration file (or defaults) with flags applied on top.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be loaded or the result is invalid.
    pub fn resolve_config(&self) -> anyhow::Result<ContainerConfig> {
        let mut config = match &self.config {
            Some(path) => ContainerConfig::load(path)?,
            None => ContainerConfig::default(),
        };
        if let Some(addr) = &self.addr {
            config.addr = addr.clone();
        }
        if let Some(app_base) = &self.app_base {
            config.app_base = app_base.clone();
        }
        if let Some(secs) = self.read_timeout_secs {
            config.read_timeout_secs = secs;
        }
        if let Some(line_length) = self.line_length {
            config.framer.line_length = line_length;
        }
        config.framer.validate()?;
        Ok(config)
    }
}

/// Execute a parsed command line.
///
/// # Errors
///
/// Returns deployment, configuration, bind and lookup failures.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve(args) => serve(&args),
        Commands::Routes { app_base } => print_routes(&app_base),
        Commands::Locate {
            app_base,
            host,
            path,
        } => locate(&app_base, &host, &path),
    }
}

fn deploy(app_base: &Path) -> anyhow::Result<ContainerService> {
    let context = Arc::new(ApplicationContext::new());
    let registry = ServletRegistry::with_builtins();
    let locators = deploy_applications(app_base, &context, &registry)?;
    Ok(ContainerService::new(Default::default(), locators))
}

fn serve(args: &ServeArgs) -> anyhow::Result<()> {
    let config = args.resolve_config()?;
    let runtime = RuntimeConfig::from_env();
    runtime.apply();

    let context = Arc::new(ApplicationContext::new());
    let registry = ServletRegistry::with_builtins();
    let locators = deploy_applications(&config.app_base, &context, &registry)?;
    let service = ContainerService::new(config.framer.clone(), locators);

    let handle = HttpServer::new(service, config.read_timeout(), runtime.stack_size)
        .start(config.addr.as_str())
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    run_until_shutdown(handle)
}

/// Serve until SIGINT or SIGTERM, then stop and undeploy.
#[cfg(unix)]
fn run_until_shutdown(handle: ServerHandle) -> anyhow::Result<()> {
    let mut signals = shutdown_signals()?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    handle.shutdown();
    Ok(())
}

/// Serve until the accept loop ends, then undeploy.
#[cfg(not(unix))]
fn run_until_shutdown(handle: ServerHandle) -> anyhow::Result<()> {
    let service = handle.service().clone();
    let joined = handle.join();
    service.shutdown();
    joined.map_err(|e| anyhow!("Server terminated abnormally: {e:?}"))
}

#[cfg(unix)]
pub(crate) fn shutdown_signals() -> anyhow::Result<signal_hook::iterator::Signals> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    signal_hook::iterator::Signals::new([SIGINT, SIGTERM])
        .context("Failed to install shutdown signal handlers")
}

fn print_routes(app_base: &Path) -> anyhow::Result<()> {
    let service = deploy(app_base)?;
    for locator in service.locators() {
        let app = locator.application();
        println!("{}", app.name());
        if !app.vhosts().is_empty() {
            println!("  vhosts: {}", app.vhosts().join(", "));
        }
        for route in locator.routes().iter() {
            println!(
                "  [{}] {} -> {}  ({})",
                route.index(),
                route.pattern(),
                route.payload(),
                route.rewritten_pattern()
            );
        }
        for route in locator.secured_routes().iter() {
            println!(
                "  [{}] {} secured by {} realm \"{}\"",
                route.index(),
                route.pattern(),
                route.payload().auth_type,
                route.payload().realm
            );
        }
    }
    Ok(())
}

fn locate(app_base: &Path, host: &str, path: &str) -> anyhow::Result<()> {
    let service = deploy(app_base)?;
    let raw = format!("GET {path} HTTP/1.1\r\nHost: {host}");
    let request = HttpRequestBuilder.init_from_raw_header(raw.as_bytes())?;

    let locator = service
        .select_locator(&request)
        .ok_or_else(|| anyhow!("No application serves host '{host}' and path '{path}'"))?;
    let resolution = locator.locate(&request)?;

    println!("application:   {}", locator.application().name());
    println!("servlet:       {}", resolution.servlet_name);
    println!("request path:  {}", resolution.request_path);
    println!("matched path:  {}", resolution.matched_path);
    match &resolution.auth {
        Some(auth) => println!("auth:          {} realm \"{}\"", auth.auth_type, auth.realm),
        None => println!("auth:          none"),
    }
    Ok(())
}
