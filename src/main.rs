use clap::Parser;
use colored::Colorize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::info;

use seo_pilot::artifacts::IssueSeverity;
use seo_pilot::cli::Args;
use seo_pilot::clipboard::{Clipboard, Disabled, Osc52};
use seo_pilot::config::Config;
use seo_pilot::controller::Controller;
use seo_pilot::errors::ConfigError;
use seo_pilot::pipeline::SeoService;
use seo_pilot::provider::make_gateway;
use seo_pilot::session::View;
use seo_pilot::ux::{self, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.quiet, args.verbose)?;

    let cfg = match Config::load(&args) {
        Ok(cfg) => cfg,
        Err(ConfigError::MissingCredential { var }) => {
            eprintln!(
                "{} no API key found. Set {} (or SEO_PILOT_API_KEY) in the environment or a .env file.",
                "error:".red().bold(),
                var
            );
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            std::process::exit(2);
        }
    };
    info!(?cfg, "configuration loaded");

    let gateway = make_gateway(&cfg)?;
    let mut controller = Controller::new(SeoService::new(gateway));
    let mut clipboard: Box<dyn Clipboard> = if cfg.clipboard { Box::new(Osc52::stdout()) } else { Box::new(Disabled) };

    loop {
        let Some(profile) = tokio::task::spawn_blocking(ux::read_profile).await? else { return Ok(()) };
        match controller.session_mut().complete_onboarding(profile) {
            Ok(()) => break,
            Err(e) => println!("{} {e}", "✗".red()),
        }
    }

    run(&mut controller, clipboard.as_mut()).await;
    Ok(())
}

enum Flow {
    Redraw,
    Quiet,
    Quit,
}

/// Input lines and fetch completions are handled as they arrive, so a slow
/// request never holds up the menu.
async fn run(controller: &mut Controller, clipboard: &mut dyn Clipboard) {
    let mut lines = stdin_lines();
    redraw(controller);
    loop {
        let flow = tokio::select! {
            line = lines.recv() => match line {
                Some(line) => handle(controller, clipboard, &line).await,
                None => Flow::Quit,
            },
            Some(done) = controller.next_completion() => {
                controller.apply(done);
                Flow::Redraw
            }
        };
        match flow {
            Flow::Redraw => redraw(controller),
            Flow::Quiet => ux::prompt(),
            Flow::Quit => return,
        }
    }
}

/// Stdin is read on a plain thread; it is left blocked on exit.
fn stdin_lines() -> UnboundedReceiver<String> {
    let (tx, rx) = unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn redraw(controller: &Controller) {
    let view = controller.session().view();
    println!("{}", ux::render(controller.session()));
    let running = controller.in_flight();
    if running > 0 {
        println!("{}", format!("{running} request(s) running").cyan());
    }
    println!("\n{}\n{}", ux::menu(view), ux::help(view).dimmed());
    ux::prompt();
}

async fn handle(controller: &mut Controller, clipboard: &mut dyn Clipboard, line: &str) -> Flow {
    let view = controller.session().view();
    match ux::parse_command(line) {
        Command::Quit => return Flow::Quit,
        Command::Help => {}
        Command::Go(to) => {
            if let Err(e) = controller.open(to) {
                println!("{} {e}", "✗".red());
            }
        }
        Command::Refresh => {
            if view == View::Content && controller.session().topic().is_empty() {
                println!("{} set a topic first: topic TEXT", "✗".red());
                return Flow::Quiet;
            }
            if !controller.refresh(view) {
                println!("{}", "Nothing to run here.".yellow());
                return Flow::Quiet;
            }
        }
        Command::Fix(n) => {
            let Some(id) = issue_id(controller, n) else {
                println!("{} no issue #{n}", "✗".red());
                return Flow::Quiet;
            };
            if controller.fix_issues(&[id]) == 0 {
                println!("{}", "A fix for that issue is already running.".yellow());
                return Flow::Quiet;
            }
        }
        Command::FixCritical => {
            let ids: Vec<String> = controller
                .session()
                .audit()
                .map(|a| {
                    a.value
                        .issues
                        .iter()
                        .filter(|i| i.severity == IssueSeverity::Critical && i.fixed != Some(true))
                        .map(|i| i.id.clone())
                        .collect()
                })
                .unwrap_or_default();
            if ids.is_empty() {
                println!("{}", "No open critical issues.".green());
                return Flow::Quiet;
            }
            let started = controller.fix_issues(&ids);
            println!("{} generating {started} of {} fixes", "⟳".cyan(), ids.len());
        }
        Command::MarkFixed(n) => match issue_id(controller, n) {
            Some(id) if controller.session_mut().mark_fixed(&id) => println!("{} marked fixed", "✓".green()),
            _ => println!("{} no issue #{n}", "✗".red()),
        },
        Command::Write(n) => {
            let keyword = controller
                .session()
                .keywords()
                .and_then(|k| k.value.get(n - 1))
                .map(|k| k.keyword.clone());
            let Some(keyword) = keyword else {
                println!("{} no keyword #{n}", "✗".red());
                return Flow::Quiet;
            };
            if let Err(e) = controller.write_about(&keyword) {
                println!("{} {e}", "✗".red());
            }
        }
        Command::Topic(t) => controller.session_mut().set_topic(&t),
        Command::Copy => {
            let s = controller.session();
            let text = match view {
                View::Content => s.post().map(|p| p.value.content.clone()),
                View::Backlinks => s.backlinks().map(|b| b.value.email_template.clone()),
                _ => None,
            };
            match text {
                Some(t) if clipboard.copy(&t) => println!("{} Copied!", "✓".green()),
                Some(_) => println!("{}", "Clipboard unavailable.".yellow()),
                None => println!("{}", "Nothing to copy here.".yellow()),
            }
            return Flow::Quiet;
        }
        Command::Wait => {
            let pb = ux::spinner(format!("Waiting for {} request(s)", controller.in_flight()));
            controller.settle().await;
            pb.finish_and_clear();
        }
        Command::Unknown(s) => {
            println!("{} unknown command: {s}", "?".yellow());
            return Flow::Quiet;
        }
    }
    Flow::Redraw
}

/// Issue id for a 1-based position in the current audit.
fn issue_id(controller: &Controller, n: usize) -> Option<String> {
    let audit = controller.session().audit()?;
    audit.value.issues.get(n.checked_sub(1)?).map(|i| i.id.clone())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_env("SEO_PILOT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;
    Ok(())
}
