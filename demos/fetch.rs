//! Small command-line front end over [`RequestBuilder`].
//!
//! ```text
//! cargo run --example fetch -- get https://httpbin.org/get -q name=ada
//! cargo run --example fetch -- post-json https://httpbin.org/post '{"a":1}'
//! ```

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use fluent_http::{ClientOptions, RequestBuilder};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fetch")]
#[command(about = "Send one HTTP request and print the response", long_about = None)]
struct Cli {
    /// Request timeout in seconds
    #[arg(short, long, default_value_t = 15)]
    timeout: u64,

    /// Extra header, as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
    headers: Vec<String>,

    /// How to print the response body
    #[arg(short, long, value_enum, default_value_t = Output::Text)]
    output: Output,

    /// Log as JSON instead of human-readable lines
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a URL
    Get {
        url: String,

        /// Query parameter, as KEY=VALUE (repeatable)
        #[arg(short, long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,
    },
    /// POST form fields
    PostForm {
        url: String,

        /// Form field, as KEY=VALUE
        #[arg(value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
    /// POST a JSON document
    PostJson { url: String, body: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    Text,
    Map,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let opts = ClientOptions::default().with_timeout(Duration::from_secs(cli.timeout));
    let headers = cli
        .headers
        .iter()
        .map(|h| split_pair(h, ':'))
        .collect::<Result<Vec<_>>>()?;

    let builder = RequestBuilder::with_options(opts).headers(headers);
    let builder = match &cli.command {
        Commands::Get { url, query } => {
            let query = query
                .iter()
                .map(|q| split_pair(q, '='))
                .collect::<Result<Vec<_>>>()?;
            builder.get_with_query(url, query)
        }
        Commands::PostForm { url, fields } => {
            let fields = fields
                .iter()
                .map(|f| split_pair(f, '='))
                .collect::<Result<Vec<_>>>()?;
            builder.post_form(url, fields)
        }
        Commands::PostJson { url, body } => {
            let value: serde_json::Value =
                serde_json::from_str(body).context("request body is not valid JSON")?;
            builder.post_json(url, &value)
        }
    };

    let mut builder = builder.send().await;
    if let Some(head) = builder.response() {
        info!(status = head.status.as_u16(), url = %head.url, "Response");
    }

    match cli.output {
        Output::Text => println!("{}", builder.text().await?),
        Output::Map => {
            let map = builder.json_map().await?;
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
    }

    Ok(())
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = if json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
}

fn split_pair(raw: &str, sep: char) -> Result<(String, String)> {
    let Some((k, v)) = raw.split_once(sep) else {
        bail!("expected KEY{sep}VALUE, got '{raw}'");
    };
    Ok((k.trim().to_string(), v.trim().to_string()))
}
