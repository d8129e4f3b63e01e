use crate::demo::{run_demo, run_verdict, DemoArgs, VerdictArgs};
use crate::server;
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use farmcert::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Farm Certification Service",
    about = "Run and demonstrate the farm certification inspection service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk through an inspection, finalize it and issue a certificate
    Demo(DemoArgs),
    /// Compute a verdict from requirement counts
    Verdict(VerdictArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Verdict(args) => {
            if let Err(message) = args.check_counts() {
                Cli::command().error(ErrorKind::ValueValidation, message).exit();
            }
            run_verdict(args);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["farmcert-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn verdict_threshold_is_bounded() {
        let parsed = Cli::try_parse_from([
            "farmcert-api",
            "verdict",
            "--main-total",
            "3",
            "--threshold",
            "101",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
