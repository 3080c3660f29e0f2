//! Failwire CLI - validate pipeline configuration and dry-run failures

use clap::Parser;
use failwire_core::{BufferedSink, ErrorPipeline, PipelineConfig, RequestContext};
use failwire_model::ServiceFailure;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "failwire")]
#[command(about = "Failwire - error-to-response translation pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Check configuration validity
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "config/failwire.toml")]
        config: String,
    },
    /// Run a failure through the pipeline and print the response
    Classify {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<String>,
        /// Failure kind, e.g. ArgumentNull
        #[arg(short, long)]
        kind: String,
        /// Failure message
        #[arg(short, long, default_value = "")]
        message: String,
        /// Offending parameter name
        #[arg(short, long)]
        param: Option<String>,
        /// Request type name
        #[arg(short, long, default_value = "Request")]
        request_type: String,
        /// Accept header sent by the client
        #[arg(short, long)]
        accept: Option<String>,
        /// Force debug mode on
        #[arg(long)]
        debug: bool,
    },
}

fn load_config(path: Option<&str>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => {
            debug!("Loading config from {}", path);
            Ok(PipelineConfig::load(path)?)
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match cli.command {
        Some(Commands::Check { config }) => {
            let parsed = load_config(Some(&config))?;
            ErrorPipeline::from_config(&parsed)?;
            println!(
                "Config OK: {} kinds, {} status overrides",
                parsed.kinds.len(),
                parsed.status_overrides.len()
            );
        }
        Some(Commands::Classify {
            config,
            kind,
            message,
            param,
            request_type,
            accept,
            debug,
        }) => {
            let mut parsed = load_config(config.as_deref())?;
            parsed.debug_mode |= debug;
            let pipeline = ErrorPipeline::from_config(&parsed)?;

            let mut failure = ServiceFailure::new(kind, message);
            if let Some(param) = param {
                failure = failure.with_param(param);
            }

            let mut ctx = RequestContext::new(request_type);
            if let Some(accept) = accept {
                ctx = ctx.with_accept(accept);
            }

            let classification = pipeline.explain(&failure);
            let mut sink = BufferedSink::new();
            pipeline.respond(&ctx, &(), &mut sink, &failure)?;

            println!("Status: {} ({})", classification.status, classification.source);
            for (name, value) in sink.headers() {
                println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
            println!();
            match serde_json::from_slice::<serde_json::Value>(sink.body()) {
                Ok(body) => println!("{}", serde_json::to_string_pretty(&body)?),
                Err(_) => println!("{}", sink.body_str()),
            }
        }
        None => {
            println!("Failwire v0.1.0 - Use --help for commands");
        }
    }

    Ok(())
}
