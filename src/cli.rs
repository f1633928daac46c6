use clap::Parser;

#[derive(Parser)]
#[command(
    name = "ytchat",
    about = "HTTP backend for transcript-grounded Q&A about YouTube videos",
    version,
)]
pub struct Cli {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,
}
