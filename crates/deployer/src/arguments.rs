use {
    clap::Parser,
    std::{path::PathBuf, time::Duration},
    url::Url,
};

#[derive(Parser)]
pub struct Arguments {
    /// The Ethereum node URL to connect to.
    #[clap(long, env, default_value = "http://localhost:8545")]
    pub node_url: Url,

    /// Directory containing the compiled contract artifacts.
    #[clap(long, env, default_value_os_t = contracts::paths::contract_artifacts_dir())]
    pub artifacts_path: PathBuf,

    /// Name of the compiled artifact to deploy.
    #[clap(long, env, default_value = "OcosMainToken")]
    pub contract: String,

    /// Human readable name used when reporting the deployed contract.
    #[clap(long, env, default_value = "OCOS Main Token")]
    pub contract_label: String,

    /// How long in seconds to wait for the creation transaction to be
    /// mined before giving up.
    #[clap(long, env, default_value = "300", value_parser = duration_from_seconds)]
    pub deployment_timeout: Duration,

    /// Filter directives for the tracing subscriber.
    #[clap(long, env, default_value = "warn,deployer=debug,contracts=debug")]
    pub log_filter: String,
}

pub fn duration_from_seconds(s: &str) -> anyhow::Result<Duration> {
    // `try_from_secs_f32` rejects negative, NaN and infinite values instead
    // of panicking like `from_secs_f32` does.
    Ok(Duration::try_from_secs_f32(s.parse()?)?)
}

impl std::fmt::Display for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "node_url: {}", self.node_url)?;
        writeln!(f, "artifacts_path: {}", self.artifacts_path.display())?;
        writeln!(f, "contract: {}", self.contract)?;
        writeln!(f, "contract_label: {}", self.contract_label)?;
        writeln!(f, "deployment_timeout: {:?}", self.deployment_timeout)?;
        writeln!(f, "log_filter: {}", self.log_filter)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_ocos_token() {
        let args = Arguments::parse_from(["deployer"]);
        assert_eq!(args.contract, "OcosMainToken");
        assert_eq!(args.contract_label, "OCOS Main Token");
        assert_eq!(args.deployment_timeout, Duration::from_secs(300));
        assert!(args.artifacts_path.ends_with("artifacts"));
    }

    #[test]
    fn parses_fractional_timeouts() {
        assert_eq!(
            duration_from_seconds("0.5").unwrap(),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn rejects_unusable_timeouts() {
        for input in ["-1", "NaN", "inf", "not a number"] {
            assert!(duration_from_seconds(input).is_err(), "{input}");
        }
    }
}
