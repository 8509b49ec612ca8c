//! Terminal presentation: renders session state, reads intents.

use std::io::{self, Write};
use std::time::Duration;

use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};

use crate::artifacts::{IssueSeverity, Potential, ScoreBand, SearchIntent};
use crate::pipeline::{Fetched, Origin};
use crate::profile::Profile;
use crate::session::{Session, View};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Go(View),
    Refresh,
    /// 1-based issue number in the audit list.
    Fix(usize),
    FixCritical,
    MarkFixed(usize),
    /// 1-based keyword number.
    Write(usize),
    Topic(String),
    Copy,
    /// Block until every running request has finished.
    Wait,
    Help,
    Quit,
    Unknown(String),
}

/// `d`ashboard, `a`udit, `k`eywords, `c`ontent, `l`ocal, `b`acklinks, plus
/// per-view actions.
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let (head, rest) = match input.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (input, ""),
    };
    let index = || rest.parse::<usize>().ok().filter(|n| *n > 0);
    match head.to_lowercase().as_str() {
        "d" | "dashboard" => Command::Go(View::Dashboard),
        "a" | "s" | "audit" => Command::Go(View::Audit),
        "k" | "keywords" => Command::Go(View::Keywords),
        "c" | "content" => Command::Go(View::Content),
        "l" | "local" => Command::Go(View::LocalSeo),
        "b" | "backlinks" => Command::Go(View::Backlinks),
        "r" | "run" | "refresh" => Command::Refresh,
        "fix" if rest.eq_ignore_ascii_case("critical") => Command::FixCritical,
        "fix" => index().map_or_else(|| Command::Unknown(input.into()), Command::Fix),
        "done" => index().map_or_else(|| Command::Unknown(input.into()), Command::MarkFixed),
        "write" => index().map_or_else(|| Command::Unknown(input.into()), Command::Write),
        "topic" if !rest.is_empty() => Command::Topic(rest.to_string()),
        "copy" => Command::Copy,
        "w" | "wait" => Command::Wait,
        "?" | "h" | "help" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(input.to_string()),
    }
}

pub fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

pub fn read_line(label: &str) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();
    let mut s = String::new();
    match io::stdin().read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(s.trim_end_matches(['\r', '\n']).to_string()),
    }
}

/// Onboarding form. `None` on end of input.
pub fn read_profile() -> Option<Profile> {
    println!("\n{}", "SEO Pilot".bold());
    println!("Your AI-powered SEO agency. Set up your project to get started.\n");
    Some(Profile {
        website_url: read_line("Website URL (required): ")?,
        business_name: read_line("Business name (required): ")?,
        industry: read_line("Industry: ")?,
        location: read_line("Location: ")?,
        primary_keywords: read_line("Main focus keyword: ")?,
        competitors: read_line("Competitors: ")?,
    })
}

pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn menu(current: View) -> String {
    let items: Vec<String> = View::MENU
        .iter()
        .map(|v| {
            let label = format!("[{}]{}", &v.label()[..1].to_lowercase(), &v.label()[1..]);
            if *v == current {
                label.bold().underline().to_string()
            } else {
                label
            }
        })
        .collect();
    items.join("  ")
}

pub fn help(view: View) -> &'static str {
    match view {
        View::Audit => "r: run audit   fix N: AI fix for issue N   fix critical: fix all critical   done N: mark issue N fixed",
        View::Keywords => "r: find more ideas   write N: draft a post about keyword N",
        View::Content => "topic TEXT: set topic   r: generate   copy: copy post",
        View::LocalSeo => "r: regenerate strategy",
        View::Backlinks => "r: regenerate strategy   copy: copy outreach email",
        View::Dashboard | View::Onboarding => "d a k c l b: switch view   w: wait for running requests   q: quit",
    }
}

pub fn render(session: &Session) -> String {
    match session.view() {
        View::Onboarding => String::new(),
        View::Dashboard => render_dashboard(session),
        View::Audit => render_audit(session),
        View::Keywords => render_keywords(session),
        View::Content => render_content(session),
        View::LocalSeo => render_local(session),
        View::Backlinks => render_backlinks(session),
    }
}

fn heading(title: &str) -> String {
    format!("\n{}\n{}\n", title.bold(), "━".repeat(title.chars().count().max(24)))
}

fn degraded_note<T>(f: &Fetched<T>) -> String {
    match &f.origin {
        Origin::Model => format!("Last updated: {}\n", f.generated_at.format("%H:%M:%S")),
        Origin::Fallback(why) => format!("{} {}\n", "Showing a placeholder:".yellow(), why),
    }
}

fn score_colored(score: u8) -> ColoredString {
    let s = format!("{score}/100");
    match ScoreBand::of(score) {
        ScoreBand::Good => s.green().bold(),
        ScoreBand::Fair => s.yellow().bold(),
        ScoreBand::Poor => s.red().bold(),
    }
}

fn severity_tag(sev: IssueSeverity) -> ColoredString {
    match sev {
        IssueSeverity::Critical => "[CRITICAL]".red().bold(),
        IssueSeverity::Warning => "[WARNING]".yellow().bold(),
        IssueSeverity::Notice => "[NOTICE]".blue().bold(),
    }
}

fn intent_tag(intent: SearchIntent) -> ColoredString {
    let label = intent.label();
    match intent {
        SearchIntent::Transactional => label.green(),
        SearchIntent::Informational => label.blue(),
        SearchIntent::Local => label.magenta(),
        SearchIntent::Navigational => label.cyan(),
    }
}

fn loading_line(loading: bool, what: &str) -> String {
    if loading {
        format!("{} {what}\n", "⟳".cyan())
    } else {
        String::new()
    }
}

pub fn render_dashboard(session: &Session) -> String {
    let mut out = String::new();
    let Some(profile) = session.profile() else { return out };
    out.push_str(&heading(&format!("Hello, {}", profile.business_name)));
    out.push_str(&format!("Site: {}\n", profile.website_url.underline()));
    match session.audit() {
        Some(a) => {
            let health = if a.value.needs_attention() { "Needs attention".yellow() } else { "Good condition".green() };
            out.push_str(&format!("Overall health: {}  ({health})\n", score_colored(a.value.score)));
            let counts = a.value.severity_counts();
            let resolved = a.value.issues.iter().filter(|i| i.fixed == Some(true)).count();
            out.push_str(&format!(
                "Issues: {} critical, {} warnings, {} notices ({} marked fixed)\n",
                counts.critical, counts.warning, counts.notice, resolved
            ));
        }
        None => out.push_str("Overall health: not audited yet. Open the Site Audit to run one.\n"),
    }
    if let Some(k) = session.keywords() {
        out.push_str(&format!("Tracked keyword ideas: {}\n", k.value.len()));
    }
    out
}

pub fn render_audit(session: &Session) -> String {
    let mut out = heading("Technical & On-Page Audit");
    let Some(audit) = session.audit() else {
        if session.audit_loading() {
            let url = session.profile().map(|p| p.website_url.as_str()).unwrap_or_default();
            out.push_str(&format!("Analyzing {url}...\n"));
        } else {
            out.push_str("Ready to audit? Press r to start a full SEO audit.\n");
        }
        return out;
    };
    out.push_str(&loading_line(session.audit_loading(), "re-running audit"));
    out.push_str(&degraded_note(audit));
    let a = &audit.value;
    out.push_str(&format!("Overall score: {}\n", score_colored(a.score)));
    if !a.summary.is_empty() {
        out.push_str(&format!("{}\n", a.summary.italic()));
    }
    let counts = a.severity_counts();
    out.push_str(&format!(
        "{} critical   {} warnings   {} notices\n\n",
        counts.critical.to_string().red().bold(),
        counts.warning.to_string().yellow().bold(),
        counts.notice.to_string().blue().bold()
    ));
    if a.issues.is_empty() {
        out.push_str("No issues to show.\n");
    }
    for (n, issue) in a.issues.iter().enumerate() {
        let done = if issue.fixed == Some(true) { " ✓".green().to_string() } else { String::new() };
        out.push_str(&format!(
            "{}. {} {}{}\n",
            n + 1,
            severity_tag(issue.severity),
            issue.title.bold(),
            done
        ));
        if !issue.description.is_empty() {
            out.push_str(&format!("   {}\n", issue.description));
        }
        if !issue.recommendation.is_empty() {
            out.push_str(&format!("   → {}\n", issue.recommendation));
        }
        if session.fix_loading(&issue.id) {
            out.push_str(&format!("   {}\n", "Generating fix...".cyan()));
        } else if let Some(fix) = session.fix(&issue.id) {
            out.push_str(&format!("   {}\n", "AI suggested fix:".green().bold()));
            out.push_str(&indent(&fix.value, 6));
            out.push('\n');
        }
    }
    out
}

pub fn render_keywords(session: &Session) -> String {
    let mut out = heading("Keyword Strategy");
    if let Some(p) = session.profile() {
        if !p.primary_keywords.is_empty() {
            out.push_str(&format!("Targeting opportunities for {}", p.primary_keywords.bold()));
            if !p.location.is_empty() {
                out.push_str(&format!(" in {}", p.location));
            }
            out.push('\n');
        }
    }
    out.push_str(&loading_line(session.keywords_loading(), "finding keyword ideas"));
    let Some(k) = session.keywords() else { return out };
    out.push_str(&degraded_note(k));
    if k.value.is_empty() {
        out.push_str("No keywords yet. Press r to try again.\n");
        return out;
    }
    out.push_str(&format!("{:>3}  {:<40} {:<14} {:>8} {:>10}\n", "#", "Keyword", "Intent", "Volume", "Difficulty"));
    for (n, kw) in k.value.iter().enumerate() {
        let diff = format!("{:>10}", kw.difficulty);
        let diff = if kw.difficulty > 70 {
            diff.red()
        } else if kw.difficulty > 40 {
            diff.yellow()
        } else {
            diff.green()
        };
        out.push_str(&format!(
            "{:>3}  {:<40} {:<14} {:>8} {}\n",
            n + 1,
            kw.keyword,
            intent_tag(kw.intent),
            kw.volume,
            diff
        ));
    }
    out
}

pub fn render_content(session: &Session) -> String {
    let mut out = heading("Content Writer");
    let topic = if session.topic().is_empty() { "(none, use: topic TEXT)" } else { session.topic() };
    out.push_str(&format!("Topic: {}\n", topic.bold()));
    out.push_str(&loading_line(session.post_loading(), "writing post"));
    if let Some(post) = session.post() {
        out.push_str(&degraded_note(post));
        out.push_str(&format!("\n{}\n", post.value.content));
    }
    out
}

pub fn render_local(session: &Session) -> String {
    let mut out = heading("Local SEO Strategy");
    out.push_str(&loading_line(session.local_loading(), "building local strategy"));
    let Some(s) = session.local() else { return out };
    out.push_str(&degraded_note(s));
    let gbp = &s.value.google_business_profile;
    out.push_str(&format!("{}\n{}\n", "Google Business Profile".bold(), gbp.description));
    for post in &gbp.posts {
        out.push_str(&format!("  • {post}\n"));
    }
    let page = &s.value.landing_page_structure;
    if !page.h1.is_empty() {
        out.push_str(&format!("\n{}\nH1: {}\n", "Landing page".bold(), page.h1));
        for (n, section) in page.sections.iter().enumerate() {
            out.push_str(&format!("  {}. {section}\n", n + 1));
        }
    }
    if !s.value.local_keywords.is_empty() {
        out.push_str(&format!("\n{}\n{}\n", "Local keywords".bold(), s.value.local_keywords.join(", ")));
    }
    out
}

pub fn render_backlinks(session: &Session) -> String {
    let mut out = heading("Backlink Outreach");
    out.push_str(&loading_line(session.backlinks_loading(), "building outreach plan"));
    let Some(s) = session.backlinks() else { return out };
    out.push_str(&degraded_note(s));
    for o in &s.value.opportunities {
        let potential = match o.potential {
            Potential::High => "High".green().bold(),
            Potential::Medium => "Medium".yellow(),
            Potential::Low => "Low".dimmed(),
        };
        out.push_str(&format!("  • {:<16} {:<32} {potential}\n", o.kind, o.target));
    }
    out.push_str(&format!("\n{}\n{}\n", "Outreach email".bold(), s.value.email_template));
    out
}

fn indent(s: &str, n: usize) -> String {
    let pad = " ".repeat(n);
    s.lines()
        .map(|l| format!("{}{}", pad, l))
        .collect::<Vec<_>>()
        .join("\n")
}
