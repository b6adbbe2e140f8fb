use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thumbnailer::batch::{parse_requests, run_batch};
use thumbnailer::config::{self, ResizerConfig};
use thumbnailer::imaging::{OutputFormat, RelativeRegion, RustBackend};
use thumbnailer::store::{ObjectStore, create_store};
use thumbnailer::{RequestContext, ResizeRequest, Resizer, output};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "thumbnailer.toml";

#[derive(Parser)]
#[command(name = "thumbnailer")]
#[command(about = "Crop and resize images between object store locations")]
#[command(long_about = "\
Crop and resize images between object store locations

A request names a source image by object store URL. The derivative is
written to the request's destination, or next to the source under the
configured naming rule, and reused on later requests.

Address forms:

  s3://container/path/to/key.jpg
  https://s3.eu-west-1.amazonaws.com/container/path/to/key.jpg

Request (JSON, camelCase; everything but sourceAddress is optional):

  {
    \"sourceAddress\": \"s3://bucket/photo.jpg\",
    \"destinationAddress\": \"s3://bucket/thumbnail/photo.jpg\",
    \"width\": 600, \"height\": 600, \"format\": \"jpg\",
    \"region\": {\"top\": 0.25, \"left\": 0.25, \"width\": 0.5, \"height\": 0.5},
    \"checkExisting\": true, \"zoomOutFactor\": 2
  }

Run 'thumbnailer gen-config' to generate a documented thumbnailer.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./thumbnailer.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize one image
    Resize(ResizeArgs),
    /// Resize many images from a JSON array or JSON-lines file
    Batch {
        /// Input file; reads stdin when omitted or "-"
        input: Option<PathBuf>,
    },
    /// Print a stock thumbnailer.toml with all options documented
    GenConfig,
}

#[derive(Args)]
struct ResizeArgs {
    /// Request as JSON; built from the flags below when omitted
    request: Option<String>,

    /// Source image address
    #[arg(long, conflicts_with = "request")]
    source: Option<String>,

    /// Destination address (derived from the source when omitted)
    #[arg(long)]
    destination: Option<String>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Output format: png or jpg
    #[arg(long, value_parser = parse_format)]
    format: Option<OutputFormat>,

    /// Region of interest as top,left,width,height fractions
    #[arg(long, value_parser = parse_region)]
    region: Option<RelativeRegion>,

    /// How far to widen the region around its center
    #[arg(long)]
    zoom_out_factor: Option<f64>,

    /// Recompute even if the destination already exists
    #[arg(long)]
    no_cache: bool,
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    match value {
        "png" => Ok(OutputFormat::Png),
        "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
        other => Err(format!("unsupported format '{}', expected png or jpg", other)),
    }
}

fn parse_region(value: &str) -> Result<RelativeRegion, String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("'{}': {}", p, e)))
        .collect::<Result<Vec<_>, _>>()?;
    match parts[..] {
        [top, left, width, height] => Ok(RelativeRegion {
            top,
            left,
            width,
            height,
        }),
        _ => Err("expected four values: top,left,width,height".to_string()),
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("thumbnailer=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<ResizerConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config(path, true),
        None => config::load_config(Path::new(DEFAULT_CONFIG), false),
    }
}

/// Build the root context: per-call timeout from config, cancelled on Ctrl-C.
fn root_context(config: &ResizerConfig) -> RequestContext {
    let mut ctx = RequestContext::new();
    if let Some(timeout) = config.execution.stage_timeout() {
        ctx = ctx.with_call_timeout(timeout);
    }
    let token = ctx.cancellation().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling in-flight requests");
            token.cancel();
        }
    });
    ctx
}

fn read_input(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn build_request(args: ResizeArgs) -> Result<ResizeRequest, Box<dyn std::error::Error>> {
    let mut request = match (args.request, args.source) {
        (Some(json), _) => ResizeRequest::from_json(&json)?,
        (None, Some(source)) => ResizeRequest::new(source),
        (None, None) => ResizeRequest::from_json(&read_input(None)?)?,
    };
    if args.destination.is_some() {
        request.destination_address = args.destination;
    }
    request.width = args.width.or(request.width);
    request.height = args.height.or(request.height);
    request.format = args.format.or(request.format);
    request.region = args.region.or(request.region);
    request.zoom_out_factor = args.zoom_out_factor.or(request.zoom_out_factor);
    if args.no_cache {
        request.check_existing = Some(false);
    }
    Ok(request)
}

type CliResizer = Resizer<Arc<dyn ObjectStore>, RustBackend>;

async fn build_resizer(
    config_path: Option<&Path>,
) -> Result<(CliResizer, RequestContext), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let store = create_store(&config.store).await?;
    let ctx = root_context(&config);
    Ok((Resizer::new(store, RustBackend::new(), config), ctx))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Resize(args) => {
            let request = build_request(args)?;
            let (resizer, ctx) = build_resizer(cli.config.as_deref()).await?;
            match resizer.resize(&request, &ctx).await {
                Ok(result) if cli.json => println!("{}", serde_json::to_string(&result)?),
                Ok(result) => output::print_result(&result),
                Err(e) => {
                    output::print_error(&request.source_address, &e);
                    return Err(e.into());
                }
            }
        }
        Command::Batch { input } => {
            let requests = parse_requests(&read_input(input.as_deref())?)?;
            let (resizer, ctx) = build_resizer(cli.config.as_deref()).await?;
            let max_concurrency = resizer.config().execution.max_concurrency;
            let outcomes = run_batch(&resizer, &requests, &ctx, max_concurrency).await;
            if cli.json {
                for (request, outcome) in requests.iter().zip(&outcomes) {
                    let line = match outcome {
                        Ok(result) => serde_json::to_value(result)?,
                        Err(e) => serde_json::json!({
                            "sourceAddress": request.source_address,
                            "stage": e.stage(),
                            "error": e.to_string(),
                        }),
                    };
                    println!("{}", line);
                }
            } else {
                output::print_batch(&requests, &outcomes);
            }
            let failed = outcomes.iter().filter(|o| o.is_err()).count();
            if failed > 0 {
                return Err(format!("{} of {} requests failed", failed, outcomes.len()).into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_flag_parses_four_fractions() {
        let r = parse_region("0.25, 0.25,0.5,0.5").unwrap();
        assert_eq!(
            r,
            RelativeRegion {
                top: 0.25,
                left: 0.25,
                width: 0.5,
                height: 0.5
            }
        );
    }

    #[test]
    fn region_flag_rejects_wrong_arity_and_garbage() {
        assert!(parse_region("0.1,0.2,0.3").is_err());
        assert!(parse_region("a,b,c,d").is_err());
    }

    #[test]
    fn format_flag_accepts_jpeg_alias() {
        assert_eq!(parse_format("jpeg").unwrap(), OutputFormat::Jpg);
        assert!(parse_format("gif").is_err());
    }

    #[test]
    fn flags_override_json_request() {
        let cli = Cli::parse_from([
            "thumbnailer",
            "resize",
            r#"{"sourceAddress":"s3://b/a.jpg","width":10,"height":20}"#,
            "--width",
            "99",
            "--no-cache",
        ]);
        let Command::Resize(args) = cli.command else {
            panic!("expected resize");
        };
        let request = build_request(args).unwrap();
        assert_eq!(request.width, Some(99));
        assert_eq!(request.height, Some(20));
        assert_eq!(request.check_existing, Some(false));
    }

    #[test]
    fn source_flag_builds_request() {
        let cli = Cli::parse_from([
            "thumbnailer",
            "resize",
            "--source",
            "s3://b/a.jpg",
            "--region",
            "0,0,1,1",
        ]);
        let Command::Resize(args) = cli.command else {
            panic!("expected resize");
        };
        let request = build_request(args).unwrap();
        assert_eq!(request.source_address, "s3://b/a.jpg");
        assert!(request.region.is_some());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
