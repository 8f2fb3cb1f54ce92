mod error;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use policy::{Decision, Domain, Gate, GateContext, ResourceId, StaticConfig};
use tracing_subscriber::EnvFilter;

use error::{Error, Result};

const CONFIG_FILE: &str = "gatekeep.toml";
const CONFIG_ENV: &str = "GATEKEEP_CONFIG";

/// Exit status for a denied `check`.
const EXIT_DENIED: u8 = 2;

#[derive(Parser)]
#[command(name = "gatekeep")]
#[command(about = "Evaluate resource gating rules", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the gating configuration (defaults to $GATEKEEP_CONFIG, then ./gatekeep.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a single resource is exposed
    Check {
        /// Domain to evaluate in (e.g. rest-routes)
        #[arg(short, long)]
        domain: String,
        /// Resource identifier (route path, or category:item)
        #[arg(short, long)]
        resource: String,
        /// Capability held by the caller (repeatable)
        #[arg(long = "capability")]
        capabilities: Vec<String>,
        /// Print which rule decided
        #[arg(long)]
        explain: bool,
        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the catalog items a domain must suppress
    Diff {
        /// Domain to diff
        #[arg(short, long)]
        domain: String,
        /// Print the diff as JSON
        #[arg(long)]
        json: bool,
    },
    /// List configured domains
    Domains,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Exit status of a `check`: success when allowed.
fn check_status(decision: Decision) -> u8 {
    if decision.is_allowed() { 0 } else { EXIT_DENIED }
}

fn run() -> Result<u8> {
    let cli = Cli::parse();
    let path = config_path(cli.config, std::env::var(CONFIG_ENV).ok());
    let config = load_config(&path)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Check {
            domain,
            resource,
            capabilities,
            explain,
            json,
        } => {
            let context = capabilities
                .into_iter()
                .fold(GateContext::new(), |ctx, cap| ctx.with_capability(cap));
            let args = CheckArgs {
                domain: domain.into(),
                resource: resource.into(),
                explain,
                json,
            };
            let decision = cmd_check(&config, &args, &context, &mut out)?;
            Ok(check_status(decision))
        }
        Commands::Diff { domain, json } => {
            cmd_diff(&config, &domain.into(), json, &mut out)?;
            Ok(0)
        }
        Commands::Domains => {
            cmd_domains(&config, &mut out)?;
            Ok(0)
        }
    }
}

/// Resolve the config path: flag, then environment, then the default file.
fn config_path(flag: Option<PathBuf>, env: Option<String>) -> PathBuf {
    flag.or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

fn load_config(path: &Path) -> Result<StaticConfig> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let config = StaticConfig::load(path)?;
    tracing::debug!(path = %path.display(), domains = config.domains.len(), "loaded config");
    Ok(config)
}

struct CheckArgs {
    domain: Domain,
    resource: ResourceId,
    explain: bool,
    json: bool,
}

fn cmd_check(
    config: &StaticConfig,
    args: &CheckArgs,
    context: &GateContext,
    out: &mut impl Write,
) -> Result<Decision> {
    let gate = Gate::new(config, config);
    let verdict = gate.try_explain(&args.domain, &args.resource, context)?;

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&verdict)?)?;
    } else if args.explain {
        writeln!(out, "{verdict}")?;
    } else {
        writeln!(out, "{}", verdict.decision)?;
    }
    Ok(verdict.decision)
}

fn cmd_diff(
    config: &StaticConfig,
    domain: &Domain,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let gate = Gate::new(config, config);
    let diff = gate.suppressions(domain)?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&diff)?)?;
        return Ok(());
    }

    if diff.is_empty() {
        writeln!(out, "nothing to suppress")?;
        return Ok(());
    }
    for (category, ids) in diff.iter() {
        let ids: Vec<&str> = ids.iter().map(ResourceId::as_str).collect();
        writeln!(out, "{category}: {}", ids.join(", "))?;
    }
    Ok(())
}

fn cmd_domains(config: &StaticConfig, out: &mut impl Write) -> Result<()> {
    if config.domains.is_empty() {
        writeln!(out, "No domains configured.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<20} {:<7} {:<9} {:>6} {:>6} {:>8}",
        "DOMAIN", "MATCH", "ABSENT", "ALLOW", "DENY", "CATALOG"
    )?;
    for (domain, settings) in config.iter() {
        let absent = match settings.absent_category {
            policy::AbsentCategory::Suppress => "suppress",
            policy::AbsentCategory::Ignore => "ignore",
        };
        let allow = settings.allow.len()
            + settings
                .allow_categories
                .values()
                .map(|items| items.len())
                .sum::<usize>();
        writeln!(
            out,
            "{:<20} {:<7} {:<9} {:>6} {:>6} {:>8}",
            domain.as_str(),
            settings.match_mode.to_string(),
            absent,
            allow,
            settings.deny.len(),
            settings.catalog.len()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"
[domains.rest-routes]
match = "prefix"
allow = ["wp/v2"]
deny = ["/wp/v2/users"]
override_capability = "manage_options"

[domains.block-types.allow_categories]
core = ["paragraph"]

[[domains.block-types.catalog]]
id = "paragraph"
category = "core"

[[domains.block-types.catalog]]
id = "html"
category = "core"

[[domains.block-types.catalog]]
id = "hero"
category = "acme"
"#;

    fn config() -> StaticConfig {
        StaticConfig::parse(CONFIG).unwrap()
    }

    fn check(resource: &str, context: &GateContext, explain: bool) -> (Decision, String) {
        let args = CheckArgs {
            domain: Domain::REST_ROUTES.into(),
            resource: resource.into(),
            explain,
            json: false,
        };
        let mut out = Vec::new();
        let decision = cmd_check(&config(), &args, context, &mut out).unwrap();
        (decision, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_config_path_precedence() {
        assert_eq!(
            config_path(Some("a.toml".into()), Some("b.toml".into())),
            PathBuf::from("a.toml")
        );
        assert_eq!(config_path(None, Some("b.toml".into())), PathBuf::from("b.toml"));
        assert_eq!(config_path(None, Some(String::new())), PathBuf::from(CONFIG_FILE));
        assert_eq!(config_path(None, None), PathBuf::from(CONFIG_FILE));
    }

    #[test]
    fn test_load_missing_config() {
        let err = load_config(Path::new("/nonexistent/gatekeep.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_check_output() {
        let anon = GateContext::new();
        assert_eq!(check("/wp/v2/posts", &anon, false), (Decision::Allow, "allow\n".into()));
        assert_eq!(check("/wp/v2/users", &anon, false), (Decision::Deny, "deny\n".into()));

        let admin = GateContext::new().with_capability("manage_options");
        let (decision, out) = check("/wp/v2/users", &admin, true);
        assert_eq!(decision, Decision::Allow);
        assert_eq!(out, "allow (override)\n");
    }

    #[test]
    fn test_check_status() {
        assert_eq!(check_status(Decision::Allow), 0);
        assert_eq!(check_status(Decision::Deny), EXIT_DENIED);
    }

    #[test]
    fn test_check_unknown_domain_is_error() {
        let args = CheckArgs {
            domain: "nope".into(),
            resource: "/wp/v2/posts".into(),
            explain: false,
            json: false,
        };
        let err = cmd_check(&config(), &args, &GateContext::new(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Policy(policy::Error::UnknownDomain(_))));
    }

    #[test]
    fn test_diff_output() {
        let mut out = Vec::new();
        cmd_diff(&config(), &Domain::BLOCK_TYPES.into(), false, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "core: html\nacme: hero\n");

        let mut out = Vec::new();
        cmd_diff(&config(), &Domain::BLOCK_TYPES.into(), true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value, serde_json::json!({"core": ["html"], "acme": ["hero"]}));

        let mut out = Vec::new();
        cmd_diff(&config(), &Domain::REST_ROUTES.into(), false, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "nothing to suppress\n");
    }

    #[test]
    fn test_domains_output() {
        let mut out = Vec::new();
        cmd_domains(&config(), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("rest-routes"));
        assert!(lines[1].contains("prefix"));
        assert!(lines[2].starts_with("block-types"));
        assert!(lines[2].contains("exact"));
    }
}
