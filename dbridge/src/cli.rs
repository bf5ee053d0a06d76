use clap::Parser;

/// dbridge - Launch a Node.js target under the inspector and bridge it to
/// DevTools
#[derive(Parser, Debug)]
#[command(name = "dbridge")]
#[command(version)]
#[command(about = "Launch a script under the inspector and print a DevTools URL for it")]
pub struct Cli {
    /// Host the inspector binds to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port the inspector binds to (0 picks an ephemeral port)
    #[arg(short = 'p', long, default_value_t = 9229)]
    pub port: u16,

    /// Executable used to run a resolved script path
    #[arg(long, default_value = "node")]
    pub runtime: String,

    /// Milliseconds to wait for the port to free up and for the inspector to
    /// announce itself
    #[arg(long, default_value_t = 20_000)]
    pub timeout: u64,

    /// Additional discovery attempts after the first failure
    #[arg(long, default_value_t = 1)]
    pub retries: u32,

    /// Open the derived URL in the default browser
    #[arg(long)]
    pub open: bool,

    /// Show verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Script path or command to debug, optionally preceded by host:port
    #[arg(value_name = "TARGET", required = true)]
    pub target: String,

    /// Arguments passed through to the target
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Accept the `host:port script` positional form: when the target looks
    /// like a host:port pair and a script follows, shift it into the flags.
    pub fn normalize(mut self) -> Result<Self, String> {
        if let Some((host, port)) = split_host_port(&self.target) {
            if self.args.is_empty() {
                return Err(format!(
                    "'{}' looks like host:port but no script follows",
                    self.target
                ));
            }
            self.host = host;
            self.port = port;
            self.target = self.args.remove(0);
        }
        Ok(self)
    }

    pub fn run(self) -> i32 {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                crate::output::error_stderr(&format!("Failed to start async runtime: {e}"));
                return 1;
            }
        };
        rt.block_on(crate::run::run(self))
    }
}

fn split_host_port(target: &str) -> Option<(String, u16)> {
    let (host, port) = target.rsplit_once(':')?;
    if host.is_empty() || host.contains(':') {
        return None;
    }
    let port = port.parse().ok()?;
    Some((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_inspector_conventions() {
        let cli = Cli::try_parse_from(["dbridge", "app.js"]).unwrap();
        assert_eq!(cli.host, "127.0.0.1");
        assert_eq!(cli.port, 9229);
        assert_eq!(cli.runtime, "node");
        assert_eq!(cli.retries, 1);
        assert_eq!(cli.target, "app.js");
        assert!(cli.args.is_empty());
        assert!(!cli.open);
    }

    #[test]
    fn trailing_args_pass_through_including_flags() {
        let cli = Cli::try_parse_from(["dbridge", "app.js", "--flag", "-x", "value"]).unwrap();
        assert_eq!(cli.target, "app.js");
        assert_eq!(cli.args, vec!["--flag", "-x", "value"]);
    }

    #[test]
    fn host_and_port_flags_parse() {
        let cli =
            Cli::try_parse_from(["dbridge", "--host", "0.0.0.0", "-p", "9230", "app.js"]).unwrap();
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.port, 9230);
    }

    #[test]
    fn host_port_positional_form_shifts_into_flags() {
        let cli = Cli::try_parse_from(["dbridge", "10.0.0.5:9230", "app.js", "--flag"])
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(cli.host, "10.0.0.5");
        assert_eq!(cli.port, 9230);
        assert_eq!(cli.target, "app.js");
        assert_eq!(cli.args, vec!["--flag"]);
    }

    #[test]
    fn host_port_positional_without_script_is_rejected() {
        let err = Cli::try_parse_from(["dbridge", "10.0.0.5:9230"])
            .unwrap()
            .normalize()
            .unwrap_err();
        assert!(err.contains("no script follows"), "unexpected error: {err}");
    }

    #[test]
    fn plain_target_is_not_mistaken_for_host_port() {
        let cli = Cli::try_parse_from(["dbridge", "app.js"])
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(cli.target, "app.js");
        assert_eq!(cli.port, 9229);
    }

    #[test]
    fn missing_target_is_a_parse_error() {
        assert!(Cli::try_parse_from(["dbridge"]).is_err());
    }

    #[test]
    fn retries_flag_parses() {
        let cli = Cli::try_parse_from(["dbridge", "--retries", "3", "app.js"]).unwrap();
        assert_eq!(cli.retries, 3);
    }
}
