use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use sentiment_explorer::config::AppConfig;
use sentiment_explorer::llm::LlmClient;
use sentiment_explorer::models::{ChatOutcome, FilterUpdate};
use sentiment_explorer::store::RecordStore;
use sentiment_explorer::translate::Translator;
use sentiment_explorer::ExplorerContext;

/// Interactive sentiment trend explorer
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the record table exported by the ETL step (JSON)
    #[arg(short, long)]
    data: String,

    /// Path to the LLM config file (YAML)
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Override the configured LLM timeout (seconds)
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting sentiment_explorer");

    let args = Args::parse();

    let cfg_path = std::path::Path::new(&args.config);

    // Friendlier error if missing
    if !cfg_path.exists() {
        return Err(anyhow::anyhow!(
            "LLM config not found at {}\n\
             Use --config to specify a config file.\n\
             Example config.yaml:\n\
             api_base: \"http://localhost:5001/v1\"\napi_key: \"YOUR_KEY\"\nmodel: \"qwen3_30b_a3\"\ntimeout_secs: 30\n",
            cfg_path.display()
        ));
    }

    let mut cfg = AppConfig::load(cfg_path)?;
    if let Some(secs) = args.timeout {
        debug!("Overriding LLM timeout from --timeout argument: {}s", secs);
        cfg.timeout_secs = secs;
    }

    let store = RecordStore::load(std::path::Path::new(&args.data))?;
    let translator = Translator::new(LlmClient::new(&cfg)?);
    let mut ctx = ExplorerContext::new(store, translator);

    println!("{}", render_options(&ctx));
    println!("{}", render_view(&ctx));
    print_help();

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if !dispatch(&mut ctx, line.trim()).await {
            break;
        }
    }

    info!("Exiting sentiment_explorer");
    Ok(())
}

/// Run one typed command; returns false on quit.
async fn dispatch(ctx: &mut ExplorerContext, line: &str) -> bool {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((c, r)) => (c, r.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "quit" | "exit" => return false,
        "help" => print_help(),
        "show" => println!("{}", render_view(ctx)),
        "options" => println!("{}", render_options(ctx)),
        "reset" => {
            let bounds = ctx.bounds();
            ctx.handle_filter_change(FilterUpdate {
                source_type: Some("All".to_string()),
                publisher: Some("All".to_string()),
                year_range: Some((bounds.min, bounds.max)),
            });
            println!("{}", render_view(ctx));
        }
        "source" if !rest.is_empty() => {
            ctx.handle_filter_change(FilterUpdate {
                source_type: Some(rest.to_string()),
                ..Default::default()
            });
            println!("{}", render_view(ctx));
        }
        "publisher" if !rest.is_empty() => {
            ctx.handle_filter_change(FilterUpdate {
                publisher: Some(rest.to_string()),
                ..Default::default()
            });
            println!("{}", render_view(ctx));
        }
        "years" => match parse_year_pair(rest) {
            Some((lo, hi)) => {
                ctx.handle_filter_change(FilterUpdate {
                    year_range: Some((lo, hi)),
                    ..Default::default()
                });
                println!("{}", render_view(ctx));
            }
            None => println!("usage: years <min> <max>"),
        },
        "chat" if !rest.is_empty() => match ctx.handle_chat(rest).await {
            ChatOutcome::Applied { raw_reply, .. } => {
                println!("{}", raw_reply);
                println!("{}", render_view(ctx));
            }
            ChatOutcome::Rejected { reason, raw_reply } => {
                println!("Rejected ({}): {}", reason.code(), reason);
                if let Some(raw) = raw_reply {
                    println!("Model replied: {}", raw);
                }
            }
        },
        _ => println!("Unrecognized command; type 'help' for the list."),
    }
    true
}

fn parse_year_pair(rest: &str) -> Option<(i32, i32)> {
    let mut parts = rest.split_whitespace();
    let lo = parts.next()?.parse().ok()?;
    let hi = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((lo, hi))
}

fn render_view(ctx: &ExplorerContext) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", ctx.headline()));

    let series = ctx.series();
    if series.is_empty() {
        out.push_str("No data available for the selected filters.\n");
        return out;
    }

    out.push_str("Year   Positive   Negative\n");
    for point in &series {
        out.push_str(&format!(
            "{:<6} {:>8.3} {:>10.3}\n",
            point.year, point.positive, point.negative
        ));
    }
    out
}

fn render_options(ctx: &ExplorerContext) -> String {
    let store = ctx.store();
    let bounds = ctx.bounds();
    let mut out = String::new();
    out.push_str(&format!(
        "Source types: {}\n",
        store.source_type_options().join(", ")
    ));
    out.push_str(&format!(
        "Publishers: {}\n",
        store.publisher_options().join(", ")
    ));
    out.push_str(&format!("Data years: {}-{}\n", bounds.min, bounds.max));
    out
}

fn print_help() {
    println!(
        "Commands:\n\
         \x20 source <name|All>      set the source type filter\n\
         \x20 publisher <name|All>   set the publisher filter\n\
         \x20 years <min> <max>      set the year range\n\
         \x20 chat <request>         describe filter changes in plain language\n\
         \x20 show                   print the current selection and series\n\
         \x20 options                list available filter values\n\
         \x20 reset                  back to all records\n\
         \x20 quit"
    );
}
