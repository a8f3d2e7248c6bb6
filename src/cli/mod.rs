use std::io::{self, Write};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::{Local, TimeZone};
use colored::*;

use idol_trainee::config::Config;
use idol_trainee::core::{
    default_questions, history_stats, persona_timeline, score_answers, Answer, BondTier,
    DebutCard, IdolError, IdolStats, StatDelta,
};
use idol_trainee::mock::MockResponder;
use idol_trainee::session::{ChatSession, ReplySource};
use idol_trainee::storage::JsonFileStore;
use idol_trainee::storage::KeyValueStore;
use idol_trainee::store::{StatChange, StatStore};
use idol_trainee::transport::{ChatClient, ConnectionMode};

pub use commands::{Args, Commands};

mod commands;

fn open_store(config: &Config) -> Result<StatStore<JsonFileStore>> {
    let backend = JsonFileStore::new(config.state_dir())
        .with_context(|| format!("Failed to open state directory {}", config.state_dir().display()))?;
    Ok(StatStore::load(backend))
}

fn client(config: &Config) -> Result<ChatClient> {
    ChatClient::new(&config.api_url, config.request_timeout()).context("Failed to build HTTP client")
}

fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{} ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn format_delta(delta: &StatDelta) -> Option<ColoredString> {
    if delta.is_empty() {
        return None;
    }
    let text = format!("  └─ ({})", delta);
    let net = delta.bond.unwrap_or(0) + delta.kindness.unwrap_or(0) + delta.confidence.unwrap_or(0);
    Some(if net >= 0 { text.green().dimmed() } else { text.red().dimmed() })
}

fn print_stats(stats: &IdolStats) {
    let info = stats.persona.info();
    println!("{} {}", "Bond:".cyan().bold(), stats.bond_level);
    println!("{} {}", "Kindness:".cyan().bold(), stats.personality.kindness);
    println!("{} {}", "Confidence:".cyan().bold(), stats.personality.confidence);
    println!(
        "{} {} {} ({})",
        "Persona:".cyan().bold(),
        info.emoji,
        info.title.bold(),
        stats.persona
    );
    println!("  {}", info.description.dimmed());
    println!(
        "{} {:?}",
        "Tier:".cyan().bold(),
        BondTier::from_bond_level(stats.bond_level)
    );
}

fn change_line(change: &StatChange) -> ColoredString {
    let text = format!("  {} {:+}", change.kind, change.value);
    if change.value >= 0 {
        text.green()
    } else {
        text.red()
    }
}

/// Changes from the last two seconds. Only commands that mutate stats in
/// this process have any.
fn print_active_changes<S: KeyValueStore>(store: &mut StatStore<S>) {
    let changes = store.active_changes(Instant::now());
    if changes.is_empty() {
        return;
    }
    println!("{}", "Recent changes:".cyan().bold());
    for change in &changes {
        println!("{}", change_line(change));
    }
}

pub async fn handle_onboard(config: &Config, answers: Option<Vec<usize>>) -> Result<()> {
    let mut store = open_store(config)?;
    if store.onboarding_completed() {
        println!(
            "{}",
            "Onboarding is already complete. Run `idol reset` to start over.".yellow()
        );
        return Ok(());
    }

    let bank = default_questions();
    let answers: Vec<Answer> = match answers {
        Some(options) => options
            .into_iter()
            .enumerate()
            .map(|(question, option)| Answer::new(question, option))
            .collect(),
        None => ask_questions(&bank)?,
    };

    let initial = score_answers(&answers, &bank).context("Onboarding answers rejected")?;
    store.complete_onboarding(initial);

    println!();
    println!("{}", "Your trainee has joined the agency!".green().bold());
    print_stats(&store.stats());
    Ok(())
}

fn ask_questions(bank: &[idol_trainee::core::Question]) -> Result<Vec<Answer>> {
    let mut answers = Vec::with_capacity(bank.len());
    for (index, question) in bank.iter().enumerate() {
        println!();
        println!("{} {}", format!("Q{}.", index + 1).cyan().bold(), question.prompt);
        for (n, option) in question.options.iter().enumerate() {
            println!("  {}. {}", n + 1, option.text);
        }

        loop {
            let Some(input) = read_line(&"Choice:".yellow().to_string())? else {
                bail!("Onboarding cancelled");
            };
            match input.parse::<usize>() {
                Ok(choice) if (1..=question.options.len()).contains(&choice) => {
                    answers.push(Answer::new(index, choice - 1));
                    break;
                }
                _ => println!("{}", format!("Pick 1-{}", question.options.len()).red()),
            }
        }
    }
    Ok(answers)
}

pub async fn handle_chat(
    config: &Config,
    message: Option<String>,
    offline: bool,
    no_stream: bool,
) -> Result<()> {
    let store = open_store(config)?;
    if !store.onboarding_completed() {
        bail!("Run `idol onboard` before chatting");
    }

    let responder = MockResponder::new(config.mock_latency());
    let streaming = config.streaming && !no_stream;
    let mut session = ChatSession::new(store, client(config)?, responder, streaming);

    let mode = if offline {
        session.set_mode(ConnectionMode::Offline);
        ConnectionMode::Offline
    } else {
        session.connect().await
    };

    match message {
        Some(message) => exchange(&mut session, &config.idol_name, &message).await,
        None => conversation(&mut session, &config.idol_name, mode).await,
    }
}

async fn exchange(
    session: &mut ChatSession<JsonFileStore>,
    idol_name: &str,
    text: &str,
) -> Result<()> {
    print!("{} ", format!("{}:", idol_name).green().bold());
    io::stdout().flush()?;

    let mut streamed = false;
    let outcome = session
        .send(text, |chunk| {
            streamed = true;
            print!("{}", chunk);
            let _ = io::stdout().flush();
        })
        .await?;

    if outcome.source == ReplySource::Failed {
        if streamed {
            println!();
        }
        println!("{}", outcome.message.content.red());
    } else {
        println!();
    }
    if let Some(line) = format_delta(&outcome.delta) {
        println!("{}", line);
    }
    Ok(())
}

async fn conversation(
    session: &mut ChatSession<JsonFileStore>,
    idol_name: &str,
    mode: ConnectionMode,
) -> Result<()> {
    println!("{}", format!("Chatting with {} ({})", idol_name, mode).cyan());
    println!("{}", "Commands: /status, /reset, /reconnect. Type 'exit' to leave.".yellow());
    println!("{}", "---".dimmed());

    loop {
        let Some(input) = read_line(&"You:".cyan().bold().to_string())? else {
            break;
        };

        match input.as_str() {
            "" => continue,
            "exit" | "quit" | "bye" => break,
            "/status" => {
                print_stats(&session.store().stats());
                print_active_changes(session.store_mut());
                continue;
            }
            "/reset" => {
                session.store_mut().reset();
                println!("{}", "Progress erased. Run `idol onboard` to start again.".yellow());
                break;
            }
            "/reconnect" => {
                let mode = session.reconnect().await;
                println!("{}", format!("Now {}", mode).cyan());
                continue;
            }
            _ => {}
        }

        match exchange(session, idol_name, &input).await {
            Ok(()) => {}
            Err(e) => match e.downcast_ref::<IdolError>() {
                Some(IdolError::EmptyMessage) => {}
                _ => return Err(e),
            },
        }
        println!();
    }

    println!("{}", "See you at practice!".green());
    Ok(())
}

pub async fn handle_status(config: &Config) -> Result<()> {
    let mut store = open_store(config)?;
    if !store.onboarding_completed() {
        println!("{}", "No trainee yet. Run `idol onboard` first.".yellow());
        return Ok(());
    }
    print_stats(&store.stats());
    print_active_changes(&mut store);
    println!(
        "{} {} messages, {} snapshots",
        "Saved:".cyan().bold(),
        store.messages().len(),
        store.history().len()
    );
    Ok(())
}

pub async fn handle_report(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let history = store.history();
    if history.is_empty() {
        println!("{}", "No stat history yet. Chat with your trainee first.".yellow());
        return Ok(());
    }

    let stats = history_stats(history);
    println!("{}", "Growth report".cyan().bold());
    println!("Snapshots: {}", stats.total_snapshots);
    println!("Bond range: {} - {}", stats.min_bond_level, stats.max_bond_level);
    let top = stats.most_frequent_persona.info();
    println!("Most frequent persona: {} {}", top.emoji, top.title);
    for (persona, count) in &stats.persona_counts {
        println!("  {:<18} {}", persona.as_str(), count);
    }

    println!();
    println!("{}", "Persona timeline".cyan().bold());
    for shift in persona_timeline(history) {
        let info = shift.persona.info();
        let when = Local
            .timestamp_millis_opt(shift.timestamp)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| shift.timestamp.to_string());
        println!("  #{:<4} {}  {} {}", shift.index, when.dimmed(), info.emoji, info.title);
    }
    Ok(())
}

pub async fn handle_card(config: &Config, name: Option<String>) -> Result<()> {
    let store = open_store(config)?;
    if !store.onboarding_completed() {
        return Err(IdolError::NotOnboarded.into());
    }
    let name = name.unwrap_or_else(|| config.idol_name.clone());
    println!("{}", DebutCard::new(name, &store.stats()).render());
    Ok(())
}

pub async fn handle_adjust(
    config: &Config,
    bond: Option<i32>,
    kindness: Option<i32>,
    confidence: Option<i32>,
) -> Result<()> {
    let mut store = open_store(config)?;
    let delta = StatDelta { bond, kindness, confidence };
    if delta.is_empty() {
        bail!("Nothing to adjust: pass --bond, --kindness or --confidence");
    }

    store.apply_delta(&delta);

    println!("{} {}", "Adjusted:".cyan().bold(), delta);
    print_stats(&store.stats());
    print_active_changes(&mut store);
    Ok(())
}

pub async fn handle_health(config: &Config) -> Result<()> {
    let client = client(config)?;
    println!("{} {}", "Backend:".cyan().bold(), client.base_url());
    match client.health().await {
        Ok(health) => {
            let status = if health.is_available() {
                health.status.green()
            } else {
                health.status.red()
            };
            println!("{} {}", "Status:".cyan().bold(), status);
            println!("{} {}", "API:".cyan().bold(), health.backend);
            println!("{} {}", "Model:".cyan().bold(), health.ollama);
        }
        Err(e) => {
            println!("{} {}", "Status:".cyan().bold(), "unreachable".red());
            println!("  {}", e.to_string().dimmed());
        }
    }
    Ok(())
}

pub async fn handle_reset(config: &Config, yes: bool) -> Result<()> {
    if !yes {
        let answer = read_line(&"Erase all progress? [y/N]".yellow().to_string())?;
        if !matches!(answer.as_deref(), Some("y") | Some("Y") | Some("yes")) {
            println!("Cancelled.");
            return Ok(());
        }
    }
    let mut store = open_store(config)?;
    store.reset();
    println!("{}", "All progress erased.".green());
    Ok(())
}
