// Command dispatcher: parses the single subcommand, builds configuration,
// drives authentication and runs the chosen operation. This is the only
// layer that surfaces fatal errors to `main`; per-article failures during
// a dump are logged here and the loop continues.

use crate::api::{Article, PocketClient};
use crate::archive::{self, Outcome};
use crate::config::{var_name, Config};
use crate::token_store::TokenStore;
use anyhow::{bail, Context, Result};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub const USAGE: &str = "Usage: pocketdump <dump|list|next>";

/// The three operations the tool supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Dump,
    List,
    Next,
}

impl Command {
    /// Parse the process arguments (program name included). Exactly one
    /// positional argument is accepted; anything else is a usage error.
    pub fn parse(args: &[String]) -> Option<Command> {
        if args.len() != 2 {
            return None;
        }
        match args[1].as_str() {
            "dump" => Some(Command::Dump),
            "list" => Some(Command::List),
            "next" => Some(Command::Next),
            _ => None,
        }
    }
}

/// Entry point for a parsed command: build configuration, make sure an
/// access token is at hand, then dispatch.
pub fn run(cmd: Command) -> Result<()> {
    let mut cfg = Config::from_env()?;
    let client = PocketClient::new(&cfg.api_url)?;
    let store = TokenStore::new();
    authenticate(&client, &store, &mut cfg)?;

    match cmd {
        Command::Dump => dump(&client, &cfg),
        Command::List => list(&client, &cfg),
        Command::Next => next(&client, &cfg),
    }
}

/// Fill `cfg.access_token`, preferring the persisted token. The
/// authorization flow runs only when no usable token is on disk; a
/// freshly exchanged token is persisted immediately, and a persist
/// failure merely degrades to re-authorizing on the next run.
fn authenticate(client: &PocketClient, store: &TokenStore, cfg: &mut Config) -> Result<()> {
    match store.load() {
        Ok(token) => {
            cfg.access_token = token;
            Ok(())
        }
        Err(e) => {
            log::warn!("Could not load a persisted token ({}), authorizing against the API", e);
            cfg.access_token = authorize(client, cfg)?;
            if let Err(e) = store.save(&cfg.access_token) {
                log::warn!("Failed to persist the access token: {}", e);
            }
            Ok(())
        }
    }
}

/// Interactive authorization handshake: obtain a request token, have the
/// operator authorize it in a browser, then exchange it for an access
/// token. Blocks on a confirmation prompt; there is no polling.
fn authorize(client: &PocketClient, cfg: &Config) -> Result<String> {
    let code = client
        .request_token(&cfg.consumer_key)
        .context("could not start the authorization flow")?;

    println!("Open the following URL in a browser and authorize the application:");
    println!();
    println!("  {}", client.authorize_url(&code));
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Done authorizing?")
        .interact()
        .context("reading the authorization confirmation")?;
    if !confirmed {
        bail!("authorization was not confirmed");
    }

    client
        .exchange_token(&cfg.consumer_key, &code)
        .context("could not complete the authorization flow")
}

fn query_favourites(client: &PocketClient, cfg: &Config) -> Result<Vec<Article>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.set_message("Querying favourites...");
    let result = client.query_favourites(&cfg.access_token, &cfg.consumer_key);
    spinner.finish_and_clear();
    result.context("could not query favourites")
}

/// Archive every favourite into the output directory. The directory must
/// exist before any network traffic happens; individual article failures
/// are logged and skipped.
fn dump(client: &PocketClient, cfg: &Config) -> Result<()> {
    if cfg.output_dir.is_empty() {
        bail!(
            "no output directory provided (expected at the {} environment variable)",
            var_name("OUTPUT_DIR")
        );
    }
    let out = Path::new(&cfg.output_dir);
    ensure_dir(out)?;

    for article in &query_favourites(client, cfg)? {
        match archive::archive(out, &cfg.renderer, article) {
            Ok(Outcome::Skipped) => {
                log::info!("Skipping (already downloaded): {}", article.resolved_title)
            }
            Ok(Outcome::Written(path)) => {
                log::info!("Downloaded `{}` to `{}`", article.resolved_title, path.display())
            }
            Err(e) => log::warn!("Failed to archive `{}`: {}", article.resolved_title, e),
        }
    }
    Ok(())
}

/// Print all favourites as a fixed-width-title / URL table.
fn list(client: &PocketClient, cfg: &Config) -> Result<()> {
    for article in &query_favourites(client, cfg)? {
        println!("| {:<50.50} | {}", article.resolved_title, article.resolved_url);
    }
    Ok(())
}

/// Render the single newest unread article straight to stdout. Nothing is
/// written to disk; a renderer failure here is fatal.
fn next(client: &PocketClient, cfg: &Config) -> Result<()> {
    let newest = client
        .query_newest(&cfg.access_token, &cfg.consumer_key, 1)
        .context("could not query the newest article")?;
    for article in &newest {
        let text = archive::render(&cfg.renderer, &article.resolved_url)
            .with_context(|| format!("could not render `{}`", article.resolved_url))?;
        io::stdout()
            .write_all(&text)
            .context("writing the article to stdout")?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<()> {
    let meta = fs::metadata(path)
        .with_context(|| format!("expecting directory {} to exist", path.display()))?;
    if !meta.is_dir() {
        bail!("expecting path {} to be a directory", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn test_config(output_dir: &str) -> Config {
        Config {
            consumer_key: "key".into(),
            access_token: "tok".into(),
            output_dir: output_dir.into(),
            // Unroutable base: any attempted request errors out, which
            // the tests below rely on to prove no query was made.
            api_url: "http://127.0.0.1:1".into(),
            renderer: "echo".into(),
        }
    }

    #[test]
    fn parse_accepts_each_subcommand() {
        assert_eq!(Command::parse(&args(&["pocketdump", "dump"])), Some(Command::Dump));
        assert_eq!(Command::parse(&args(&["pocketdump", "list"])), Some(Command::List));
        assert_eq!(Command::parse(&args(&["pocketdump", "next"])), Some(Command::Next));
    }

    #[test]
    fn parse_rejects_missing_extra_and_unknown_arguments() {
        assert_eq!(Command::parse(&args(&["pocketdump"])), None);
        assert_eq!(Command::parse(&args(&["pocketdump", "dump", "list"])), None);
        assert_eq!(Command::parse(&args(&["pocketdump", "sync"])), None);
        assert_eq!(Command::parse(&args(&["pocketdump", "DUMP"])), None);
    }

    #[test]
    fn ensure_dir_rejects_a_missing_path() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("not-there");
        let err = ensure_dir(&missing).unwrap_err();
        assert!(err.to_string().contains("to exist"));
    }

    #[test]
    fn ensure_dir_rejects_a_plain_file() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("file");
        std::fs::write(&file, "x").expect("write");
        let err = ensure_dir(&file).unwrap_err();
        assert!(err.to_string().contains("to be a directory"));
    }

    #[test]
    fn ensure_dir_accepts_a_directory() {
        let dir = tempdir().expect("tempdir");
        ensure_dir(dir.path()).expect("dir is fine");
    }

    #[test]
    fn dump_fails_before_querying_when_the_directory_is_missing() {
        let cfg = test_config("/definitely/not/a/real/directory");
        let client = PocketClient::new(&cfg.api_url).expect("client");
        let err = dump(&client, &cfg).unwrap_err();
        // The directory check fires first; a network attempt against the
        // unroutable base would produce a query error instead.
        assert!(err.to_string().contains("to exist"));
    }

    #[test]
    fn dump_fails_when_no_output_directory_is_configured() {
        let cfg = test_config("");
        let client = PocketClient::new(&cfg.api_url).expect("client");
        let err = dump(&client, &cfg).unwrap_err();
        assert!(err.to_string().contains("POCKETDUMP_OUTPUT_DIR"));
    }

    #[test]
    fn a_persisted_token_suppresses_the_authorization_flow() {
        let dir = tempdir().expect("tempdir");
        let store = TokenStore::at(dir.path().join("access_token"));
        store.save("tok-persisted").expect("save");

        let mut cfg = test_config("");
        cfg.access_token = String::new();
        let client = PocketClient::new(&cfg.api_url).expect("client");
        // With no token the flow would hit the unroutable API and fail;
        // success here proves the handshake was never started.
        authenticate(&client, &store, &mut cfg).expect("authenticate");
        assert_eq!(cfg.access_token, "tok-persisted");
    }

    #[test]
    fn a_missing_token_starts_the_flow_and_surfaces_its_failure() {
        let dir = tempdir().expect("tempdir");
        let store = TokenStore::at(dir.path().join("access_token"));

        let mut cfg = test_config("");
        cfg.access_token = String::new();
        let client = PocketClient::new(&cfg.api_url).expect("client");
        let err = authenticate(&client, &store, &mut cfg).unwrap_err();
        assert!(err.to_string().contains("authorization flow"));
    }
}
