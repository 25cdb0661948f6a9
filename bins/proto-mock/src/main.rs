mod cmd;

use clap::{Parser, Subcommand};
use cmd::config::{CommonArgs, Effective, GenerateArgs, PublishArgs};
use cmd::error::ProtoMockError;

#[derive(Parser)]
#[command(name = "proto-mock", about = "Generate message templates and publish them on a channel")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write an editable placeholder template for the message
    Generate(GenerateArgs),
    /// Publish an edited template periodically or on Enter
    Publish(PublishArgs),
}

async fn dispatch(cli: &Cli) -> Result<(), ProtoMockError> {
    let eff = Effective::new(&cli.common)?;
    match &cli.command {
        Command::Generate(args) => {
            cmd::generate::run(&eff.with_generate(args))?;
        }
        Command::Publish(args) => {
            cmd::publish::run(&eff.with_publish(args)).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Exit explicitly: a pending stdin read would otherwise hold the runtime open.
    let code = match dispatch(&cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}
