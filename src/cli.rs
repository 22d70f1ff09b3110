use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "beluga",
    version,
    about = "A terminal dashboard for cluster pods, services, and events."
)]
pub struct CliArgs {
    /// Backend base URL (falls back to BACKEND_ADDR, then the config file)
    #[arg(short, long)]
    pub backend_url: Option<String>,

    /// Refresh interval in seconds
    #[arg(long)]
    pub refresh_secs: Option<u64>,

    /// File holding the backend authorization token
    #[arg(long)]
    pub token_file: Option<String>,

    /// Destination path for HTML report exports
    #[arg(long, default_value = "beluga-report.html")]
    pub export_path: String,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}
