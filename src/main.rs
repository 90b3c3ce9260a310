use clap::Parser;

use automail_rs::cli::{self, Cli, Commands};
use automail_rs::config::Environment;
use automail_rs::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Apply the --env override before configuration loading reads it
    if let Some(ref env) = cli.env {
        let env: Environment = env.clone().into();
        unsafe {
            std::env::set_var(Environment::ENV_VAR, env.as_str());
        }
    }

    let settings = cli::load_and_merge_config(&cli)?;
    cli::init_logger_from_settings(&settings)?;

    // One-shot commands (migrate, process, token, dry runs) complete here;
    // the serve path returns Ok and falls through to server startup.
    if let Err(e) = cli::execute_command(&cli, settings.clone()).await {
        tracing::error!(error = %e, "Command failed");
        return Err(anyhow::anyhow!("{}", e));
    }

    let start_server = matches!(
        cli.command,
        None | Some(Commands::Serve { dry_run: false, .. })
    );

    if start_server {
        Server::new(settings).run().await?;
    }

    Ok(())
}
