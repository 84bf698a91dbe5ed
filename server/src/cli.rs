use std::net::SocketAddr;

use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Sets a socket address to listen on
    #[arg(short, long, value_name = "[ADDRESS[:PORT]]", default_value_t = SocketAddr::from(([127, 0, 0, 1], 42000)))]
    pub(crate) listen: SocketAddr,

    /// Address of a node in the ring to join
    #[arg(short, long, value_name = "[ADDRESS[:PORT]]")]
    pub(crate) ring: Option<SocketAddr>,

    /// Key-bit width of the identifier space; every ring member must agree
    #[arg(short, long, value_name = "BITS", default_value_t = 64)]
    pub(crate) bits: u32,

    /// Successor list capacity
    #[arg(short, long, value_name = "N")]
    pub(crate) successors: Option<usize>,

    /// Set the log level
    #[arg(short('L'), long, value_name = "LEVEL", value_enum, default_value_t = LogLevel::Info)]
    pub(crate) log_level: LogLevel,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}
