use anyhow::Context;
use branchpad_cli::{command, Action, App, CliConfig};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = command().get_matches();

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => CliConfig::load(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => CliConfig::default(),
    };
    let path = config.notebook_path(matches.get_one::<PathBuf>("notebook").map(PathBuf::as_path));

    let action = Action::from_matches(&matches)?;
    tracing::debug!("{:?} on {}", action, path.display());

    let output = App::new(config, path).execute(&action).await?;
    print!("{output}");
    Ok(())
}
