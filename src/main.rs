use anyhow::Result;
use clap::Parser;
use gupm::commands::{self, config::Config};
use log::warn;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// gupm - Google package manager for Unity projects
///
/// Lists the packages published in the Google Unity archive and installs them
/// into a project as local tarball references in Packages/manifest.json.
/// Archives are downloaded to the GooglePackages/ folder next to Packages/.
///
/// Examples:
///   gupm list                               # Show catalog and installed versions
///   gupm install com.google.firebase.app    # Install the newest version
///   gupm apply com.a@1.0.0 com.b@none       # Several changes in one batch
#[derive(Parser, Debug)]
#[command(author, version = env!("GUPM_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Unity project root (defaults to the current directory; also via GUPM_PROJECT)
    #[arg(
        long = "project",
        short = 'p',
        env = "GUPM_PROJECT",
        value_name = "PATH",
        global = true
    )]
    pub project: Option<PathBuf>,

    /// Catalog page URL (defaults to https://developers.google.com/unity/archive)
    #[arg(
        long = "catalog-url",
        env = "GUPM_CATALOG_URL",
        value_name = "URL",
        global = true
    )]
    pub catalog_url: Option<String>,

    /// Base URL archives are served from (defaults to https://dl.google.com/games/registry/unity/)
    #[arg(
        long = "registry-url",
        env = "GUPM_REGISTRY_URL",
        value_name = "URL",
        global = true
    )]
    pub registry_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List catalog packages and the installed version of each
    List(ListArgs),

    /// Install a package or change its version
    Install(InstallArgs),

    /// Remove a package from the project
    Remove(RemoveArgs),

    /// Apply several installs/removals as one batch
    Apply(ApplyArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Print the package list as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Package name, optionally with a version: "name" or "name@version"
    #[arg(value_name = "NAME[@VERSION]")]
    pub package: String,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Package name
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct ApplyArgs {
    /// Requests in the form "name@version", or "name@none" to remove
    #[arg(value_name = "NAME@VERSION", required = true)]
    pub requests: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = gupm::runtime::RealRuntime;
    let config = Config::new(runtime, cli.project, cli.catalog_url, cli.registry_url)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current step...");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::List(args) => commands::list(config, args.json, &cancel).await?,
        Commands::Install(args) => commands::install(config, &args.package, &cancel).await?,
        Commands::Remove(args) => commands::remove(config, &args.name, &cancel).await?,
        Commands::Apply(args) => commands::apply(config, &args.requests, &cancel).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_list_parsing() {
        let cli = Cli::try_parse_from(["gupm", "list", "--json"]).unwrap();
        match cli.command {
            Commands::List(args) => assert!(args.json),
            _ => panic!("Expected List command"),
        }
        assert_eq!(cli.project, None);
    }

    #[test]
    fn test_cli_install_parsing() {
        let cli = Cli::try_parse_from(["gupm", "install", "com.google.play.core@1.8.0"]).unwrap();
        match cli.command {
            Commands::Install(args) => assert_eq!(args.package, "com.google.play.core@1.8.0"),
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_global_project_parsing() {
        let cli = Cli::try_parse_from(["gupm", "-p", "/work/game", "remove", "com.a"]).unwrap();
        assert_eq!(cli.project, Some(PathBuf::from("/work/game")));

        let cli = Cli::try_parse_from(["gupm", "remove", "com.a", "--project", "/tmp"]).unwrap();
        assert_eq!(cli.project, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_cli_url_overrides() {
        let cli = Cli::try_parse_from([
            "gupm",
            "--catalog-url",
            "http://127.0.0.1:1/archive",
            "--registry-url",
            "http://127.0.0.1:1/registry/",
            "list",
        ])
        .unwrap();
        assert_eq!(cli.catalog_url.as_deref(), Some("http://127.0.0.1:1/archive"));
        assert_eq!(cli.registry_url.as_deref(), Some("http://127.0.0.1:1/registry/"));
    }

    #[test]
    fn test_cli_apply_requires_requests() {
        assert!(Cli::try_parse_from(["gupm", "apply"]).is_err());

        let cli = Cli::try_parse_from(["gupm", "apply", "com.a@1.0.0", "com.b@none"]).unwrap();
        match cli.command {
            Commands::Apply(args) => assert_eq!(args.requests, vec!["com.a@1.0.0", "com.b@none"]),
            _ => panic!("Expected Apply command"),
        }
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["gupm", "com.a"]).is_err());
    }
}
