use anyhow::{Context, Result};
use std::rc::Rc;
use std::time::Duration;
use tasks::cli::commands::{RunCommand, ValidateCommand};
use tasks::cli::output::*;
use tasks::cli::{Cli, Command};
use tasks::{Event, Handler, LocalScheduler, ScriptConfig, Step};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => {
            // Sequencers are single-threaded; their timers run as local tasks
            let scheduler = LocalScheduler::new();
            scheduler.run_until(run_script(cmd, &scheduler)).await?
        }
        Command::Validate(cmd) => validate_script(cmd)?,
    }

    Ok(())
}

async fn run_script(cmd: &RunCommand, scheduler: &LocalScheduler) -> Result<()> {
    let mut config = ScriptConfig::from_file(&cmd.file).context("Failed to load script")?;

    println!("{} Loaded script: {}", INFO, style(&config.name).bold());

    if let Some(timeout_secs) = cmd.timeout {
        config.timeout_secs = Some(timeout_secs);
        config.validate()?;
    }

    // Queue every step, announcing it as it runs
    let total = config.steps.len();
    let sequencer = config.to_sequencer_with(Rc::new(scheduler.clone()), |index, step| {
        let position = index + 1;
        Step::named(step.name.clone(), move |seq, args| {
            println!("{}", format_step_started(&step.name, position, total, args));
            step.run(seq, args)
        })
    });

    // Report terminal and custom events
    let mut reported = vec![Event::Success, Event::Timeout];
    if !cmd.fail_fast {
        reported.push(Event::Error);
    }
    reported.extend(config.custom_events().into_iter().map(Event::from));
    for event in reported {
        let shown = event.clone();
        sequencer.on(
            event,
            Handler::new(move |_, args| {
                println!("{}", format_event(&shown, args));
                Ok(())
            }),
        );
    }

    let args = if cmd.arg.is_empty() {
        config.args.clone()
    } else {
        cmd.arg.clone()
    };

    println!(
        "{} Starting {} ({} step(s), timeout {:?})",
        ROCKET,
        style(&config.name).bold(),
        total,
        sequencer.timeout_duration()
    );
    println!();

    if let Err(err) = sequencer.start(args) {
        report_failure(&config.name, &err.to_string());
        std::process::exit(1);
    }

    // Steps may continue from timers; wait for a terminal status
    while !sequencer.status().is_terminal() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let state = sequencer.state();
    println!("\n{}", format_state(&config.name, &state));

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    }

    if state.status.is_failure() {
        println!(
            "\n{} {} {}",
            CROSS,
            style(&config.name).bold(),
            style("failed").red()
        );
        std::process::exit(1);
    }

    println!(
        "\n{} {} completed {}",
        CHECK,
        style(&config.name).bold(),
        style("successfully").green()
    );

    Ok(())
}

fn report_failure(name: &str, message: &str) {
    println!("\n{} {} {}", CROSS, style(name).bold(), style("failed").red());
    error!("{}", message);
}

fn validate_script(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating script...", INFO);

    let result = ScriptConfig::from_file(&cmd.file);

    match result {
        Ok(config) => {
            println!("{} Script is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Steps: {}", style(config.steps.len()).cyan());
            println!(
                "  Timeout: {}",
                style(format!("{}s", config.sequencer_config().timeout_secs)).cyan()
            );

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}
