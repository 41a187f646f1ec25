use cliborg::config::Config;
use cliborg::{AppResult, GitVersion, Repository};
use tracing_subscriber::EnvFilter;

fn run() -> AppResult<String> {
    let config = Config::load_or_default()?;

    let discovered = Repository::discover()?;
    let executor = config.executor(discovered.path())?;
    let repo = Repository::with_executor(discovered.path(), executor)
        .with_default_remote(config.git.default_remote.clone());

    Ok(repo.current_branch()?)
}

fn branch_line(branch: &str) -> String {
    format!("Current branch: {}", branch)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Validate git version
    if let Err(e) = GitVersion::validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    match run() {
        Ok(branch) => println!("{}", branch_line(&branch)),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
