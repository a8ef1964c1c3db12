//! `qsct` binary: echo server and request client.

use std::{io, process::ExitCode};

use clap::Parser;
use qsct_server::{
    EchoHandler, Server, TcpTransport,
    cli::{Cli, Command},
    client,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Serve { bind, .. } => serve(bind, &cli.command),
        Command::Send { addr, messages, .. } => send(addr, messages, &cli.command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "qsct failed");
            ExitCode::FAILURE
        },
    }
}

fn serve(bind: &str, command: &Command) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let transport = TcpTransport::bind(bind).await?;
        if let Some(Ok(addr)) = transport.local_addr() {
            info!(%addr, "listening");
        }
        Server::new(EchoHandler, command.server_config()).run(transport).await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

fn send(addr: &str, messages: &[String], command: &Command) -> Result<(), Box<dyn std::error::Error>> {
    let replies =
        client::request_all(addr, messages.iter().map(String::as_bytes), command.channel_config())?;
    client::write_replies(&mut io::stdout().lock(), &replies)?;
    Ok(())
}
