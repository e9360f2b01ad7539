//! Demo binary exercising the `ninep` façade against a live 9P2000 server.
//!
//! Not part of the library's contract — a manual-verification tool, in the
//! same spirit as an example client shipped alongside a protocol library.

use clap::{Parser, Subcommand};

use ninep::facade::Filesystem;
use ninep::session::SessionConfig;

/// Connects to a 9P2000 server and runs one operation against it.
#[derive(Parser)]
#[command(name = "ninep-cli")]
struct Cli {
    /// DNS name or literal IP of the 9P server.
    host: String,

    /// Port name or number.
    #[arg(long, default_value = "564")]
    service: String,

    /// Username sent in TAuth/TAttach.
    #[arg(long, default_value = "nobody")]
    uname: String,

    /// Attach name (which file tree).
    #[arg(long, default_value = "")]
    aname: String,

    /// Client-preferred maximum message size.
    #[arg(long, default_value_t = 16384)]
    msize: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the entries of a directory.
    Ls { path: String },
    /// Print the metadata of a file or directory.
    Stat { path: String },
    /// Read and print up to `len` bytes of a file starting at `offset`.
    Cat {
        path: String,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(long, default_value_t = 4096)]
        len: usize,
    },
}

fn main() -> ninep::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = SessionConfig {
        host: cli.host,
        service: cli.service,
        uname: cli.uname,
        aname: cli.aname,
        msize: cli.msize,
    };

    let mut fs = Filesystem::connect(&config)?;

    match cli.command {
        Command::Ls { path } => {
            for entry in fs.list_directory(&path)? {
                println!("{}\t{}\t{}", entry.length, entry.mode, entry.name);
            }
        }
        Command::Stat { path } => {
            let stat = fs.stat(&path)?;
            println!("{stat:?}");
        }
        Command::Cat { path, offset, len } => {
            let mut buf = vec![0u8; len];
            let n = fs.read(&path, offset, &mut buf)?;
            use std::io::Write;
            std::io::stdout().write_all(&buf[..n]).ok();
        }
    }

    Ok(())
}
