use api::DashboardConfig;
use clap::Parser;
use tools::{Command, ReqwestHttp, run};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dashctl", about = "Weather dashboard from the terminal")]
struct Args {
    /// Dashboard server base URL.
    #[arg(long, env = "DASHBOARD_BASE_URL", default_value = "http://127.0.0.1:8000")]
    server: String,

    /// OpenWeatherMap API key.
    #[arg(long, env = "OPENWEATHER_API_KEY")]
    api_key: Option<String>,

    /// Session cookie header to send with server calls.
    #[arg(long, env = "DASHBOARD_COOKIE")]
    cookie: Option<String>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = DashboardConfig::default()
        .with_api_key(args.api_key)
        .with_server_base_url(args.server);
    let http = ReqwestHttp::new(args.cookie);
    let csrf = http.csrf_token();

    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let report = rt.block_on(run(&http, &config, csrf, &args.command))?;
    println!("{report}");
    Ok(())
}
