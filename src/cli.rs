use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "honeyswitch")]
#[command(version = "0.3.0")]
#[command(about = "Decoy web interface impersonating a MikroTik CSS326-24G-2S+ switch", long_about = None)]
pub struct Cli {
    #[arg(long, help = "Host IP to bind the listener (default: 0.0.0.0)")]
    pub host: Option<String>,

    #[arg(long, help = "Port to bind the listener (default: 80)")]
    pub port: Option<u16>,

    #[arg(short = 'o', long, help = "Path to the audit log file (default: ./auth_log.txt)")]
    pub logfile: Option<PathBuf>,

    #[arg(long, help = "Explicit config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}
