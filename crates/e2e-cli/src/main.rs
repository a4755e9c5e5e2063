//! crm-e2e: session bootstrap utilities for the CRM end-to-end suite
//!
//! ## Usage
//!
//! ```bash
//! crm-e2e login                         # Log in with CRM_E2E_USERNAME / CRM_E2E_PASSWORD
//! crm-e2e code qa@mailinator.com        # Print the newest verification code
//! crm-e2e unique "Acme Corp"            # Print a run-scoped unique value
//! crm-e2e config --config suite.yaml    # Show effective configuration
//! ```

use clap::Parser;
use crm_e2e::{handlers, Cli, CliConfig, CliResult, Commands, Reporter, Verbosity};
use e2e_core::E2eConfig;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity);
    let reporter = Reporter::new(&config);

    match run(cli, &reporter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            reporter.failure(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.clone().into())
}

fn init_tracing(verbosity: Verbosity) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.log_filter())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli, reporter: &Reporter) -> CliResult<()> {
    let suite = handlers::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Login(args) => run_login(&suite, &args, reporter),
        Commands::Code(args) => run_code(&suite, &args, reporter),
        Commands::Unique(args) => {
            println!("{}", handlers::unique(&args)?);
            Ok(())
        }
        Commands::Config => {
            print!("{}", handlers::render_config(&suite)?);
            Ok(())
        }
    }
}

#[cfg(feature = "browser")]
fn runtime() -> CliResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

#[cfg(feature = "browser")]
fn run_login(suite: &E2eConfig, args: &crm_e2e::LoginArgs, reporter: &Reporter) -> CliResult<()> {
    reporter.info(&format!("Logging in at {}", suite.login.login_url));
    let outcome = runtime()?.block_on(handlers::login(suite, args))?;
    match outcome {
        e2e_core::AuthOutcome::Direct => reporter.success("Logged in (no verification challenge)"),
        e2e_core::AuthOutcome::Verified { codes_submitted } => reporter.success(&format!(
            "Logged in after verification ({codes_submitted} code(s) submitted)"
        )),
    }
    Ok(())
}

#[cfg(feature = "browser")]
fn run_code(suite: &E2eConfig, args: &crm_e2e::CodeArgs, reporter: &Reporter) -> CliResult<()> {
    reporter.info(&format!("Checking inbox {}", suite.inbox.url_for(&args.recipient)));
    let code = runtime()?.block_on(handlers::code(suite, args))?;
    println!("{code}");
    Ok(())
}

#[cfg(not(feature = "browser"))]
fn run_login(_: &E2eConfig, _: &crm_e2e::LoginArgs, _: &Reporter) -> CliResult<()> {
    Err(crm_e2e::CliError::FeatureDisabled {
        command: "login",
        feature: "browser",
    })
}

#[cfg(not(feature = "browser"))]
fn run_code(_: &E2eConfig, _: &crm_e2e::CodeArgs, _: &Reporter) -> CliResult<()> {
    Err(crm_e2e::CliError::FeatureDisabled {
        command: "code",
        feature: "browser",
    })
}
