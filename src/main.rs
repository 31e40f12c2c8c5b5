//! parley binary entry point.

use clap::Parser;
use parley::cli::{ChatArgs, Cli, Commands, ServeArgs};
use parley::config::ParleyConfig;
use parley::engine::Router;
use parley::error::ParleyError;
use parley::types::Message;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parley=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match ParleyConfig::load(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Serve(args) => handle_serve(config, args).await,
            Commands::Chat(args) => handle_chat(config, args).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_serve(mut config: ParleyConfig, args: ServeArgs) -> Result<(), ParleyError> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    parley::server::serve(config).await
}

async fn handle_chat(config: ParleyConfig, args: ChatArgs) -> Result<(), ParleyError> {
    let router = Router::from_config(&config)?;
    let outcome = router.run_turn(vec![Message::user(args.prompt)]).await?;

    for message in outcome.visible_messages(args.show_intermediate_steps).iter().skip(1) {
        let who = message
            .provenance()
            .and_then(|a| a.name.clone())
            .unwrap_or_else(|| message.role().to_string());
        let remote = if message.provenance().is_some_and(|a| a.remote) {
            " (remote)"
        } else {
            ""
        };
        println!("[{who}{remote}] {}", message.text());
    }
    eprintln!("route: {}, passes: {}", outcome.route, outcome.passes);
    Ok(())
}
