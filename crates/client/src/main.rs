mod api;
mod models;

use std::io::{self, BufRead, Write};

use clap::Parser;
use colored::*;
use knowledge_share::{
    models::Topic,
    views::{self, Progress, TOPIC_GOAL},
};

use api::Api;
use models::{Command, Dashboard};

const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

#[derive(Debug, Parser)]
#[command(about = "Terminal dashboard for the knowledge sharing planner")]
struct Args {
    /// Your name as listed on the team roster.
    name: String,

    #[arg(long, env = "BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    backend: String,
}

// ===== Main =====

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let api = Api::new(&args.backend);

    println!("{}", "=".repeat(60).bright_cyan());
    println!(
        "{}",
        "    📚 KNOWLEDGE SHARING PLANNER 📚".bright_yellow().bold()
    );
    println!("{}", "=".repeat(60).bright_cyan());
    println!();

    let mut dashboard = match load(&api, &args.name).await {
        Ok(Some(dashboard)) => dashboard,
        Ok(None) => {
            eprintln!(
                "{} {}",
                "❌ User not found:".red().bold(),
                args.name.bright_white()
            );
            return Ok(());
        }
        Err(e) => {
            eprintln!("{} {}", "❌ Could not load data:".red().bold(), e);
            return Ok(());
        }
    };

    println!(
        "Logged in as {}",
        dashboard.me.name.bright_white().bold()
    );

    // The server diffs against the previous visit before stamping this one.
    let login = api.login(dashboard.me.id, dashboard.me.last_login).await?;
    dashboard.me.last_login = Some(login.last_login);
    show_new_topics(&login.new_topics);

    command_loop(&api, &mut dashboard).await
}

async fn load(api: &Api, name: &str) -> anyhow::Result<Option<Dashboard>> {
    let people = api.people().await?;
    let Some(me) = views::find_person(&people, name).cloned() else {
        return Ok(None);
    };

    let topics = api.topics(me.id).await?;
    let suggestions = api.suggestions(me.id).await?;
    let my_discussed = api
        .person_topics(me.id)
        .await?
        .into_iter()
        .filter(|t| t.discussed)
        .collect();

    Ok(Some(Dashboard {
        me,
        people,
        topics,
        my_discussed,
        suggestions,
    }))
}

// ===== Command Loop =====

async fn command_loop(api: &Api, dashboard: &mut Dashboard) -> anyhow::Result<()> {
    loop {
        show_dashboard(dashboard);
        show_help(dashboard.me.is_admin);

        // Closed stdin quits instead of re-prompting forever.
        let Some(input) = prompt("> ")? else {
            println!();
            return Ok(());
        };
        let command = match input.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message.red());
                continue;
            }
        };

        if command == Command::Quit {
            println!();
            println!("{}", "See you at the next session! 👋".bright_cyan().bold());
            return Ok(());
        }

        if let Err(e) = run(api, dashboard, command).await {
            println!("{} {}", "✗".red().bold(), e.to_string().red());
        }
    }
}

async fn run(api: &Api, dashboard: &mut Dashboard, command: Command) -> anyhow::Result<()> {
    let me = dashboard.me.clone();

    match command {
        Command::AddTopic => {
            let Some(title) = read_required("Topic title: ")? else {
                return Ok(());
            };
            let description = read_optional("Description (optional): ")?;
            let topic = api
                .create_topic(me.id, &title, description.as_deref())
                .await?;
            println!("{} {}", "✓ Added".green(), topic.title.bright_white());
            dashboard.add_topic(topic);
        }
        Command::EditTopic(id) => {
            if !dashboard.owns(id) {
                println!("{}", "You can only edit your own topics.".yellow());
                return Ok(());
            }
            let Some(title) = read_required("New title: ")? else {
                return Ok(());
            };
            let description = read_optional("New description (optional): ")?;
            if api
                .update_topic(id, me.id, &title, description.as_deref())
                .await?
            {
                println!("{}", "✓ Saved".green());
                dashboard.edit_topic(id, title, description);
            } else {
                println!("{}", "Nothing changed.".yellow());
            }
        }
        Command::DeleteTopic(id) => {
            if api.delete_topic(id, me.id).await? {
                println!("{}", "✓ Deleted".green());
                dashboard.remove_topic(id);
            } else {
                println!("{}", "No topic of yours with that id.".yellow());
            }
        }
        Command::VoteTopic(id) => {
            let voted = api.vote_topic(id, me.id).await?;
            views::apply_topic_vote(&mut dashboard.topics, id, voted);
            print_vote(voted);
        }
        Command::Suggest => {
            let Some(title) = read_required("Suggestion title: ")? else {
                return Ok(());
            };
            let description = read_optional("Description (optional): ")?;
            let suggestion = api
                .create_suggestion(me.id, &title, description.as_deref())
                .await?;
            println!("{} {}", "✓ Suggested".green(), suggestion.title.bright_white());
            dashboard.suggestions.insert(0, suggestion);
        }
        Command::VoteSuggestion(id) => {
            let voted = api.vote_suggestion(id, me.id).await?;
            views::apply_suggestion_vote(&mut dashboard.suggestions, id, voted);
            print_vote(voted);
        }
        Command::Claim(id) => {
            let claimed = api.claim(id, me.id).await?;
            views::apply_claim(&mut dashboard.suggestions, id, &me, claimed);
            if claimed {
                println!("{}", "✓ You will present this one".green());
            } else {
                println!("{}", "→ Released".yellow());
            }
        }
        Command::MarkDiscussed(id) => {
            if !me.is_admin {
                println!("{}", "Only admins can mark topics as discussed.".yellow());
                return Ok(());
            }
            if api.mark_discussed(id, true).await? {
                println!("{}", "✓ Marked as discussed".green());
                dashboard.mark_discussed(id);
            } else {
                println!("{}", "No topic with that id.".yellow());
            }
        }
        Command::People => {
            dashboard.people = api.people().await?;
            show_people(dashboard);
            pause()?;
        }
        Command::Leaderboard => {
            show_leaderboard(api).await?;
            pause()?;
        }
        Command::Refresh => {
            if let Some(fresh) = load(api, &me.name).await? {
                *dashboard = fresh;
            }
        }
        Command::Quit => {}
    }

    Ok(())
}

// ===== Rendering =====

fn show_new_topics(topics: &[Topic]) {
    if topics.is_empty() {
        return;
    }

    println!();
    println!(
        "{}",
        format!("🆕 New topics since your last visit ({})", topics.len())
            .bright_magenta()
            .bold()
    );
    for topic in topics {
        println!(
            "  • {} {}",
            topic.title.bright_white(),
            format!("by {}", topic.person_name).bright_black()
        );
    }
}

fn show_dashboard(dashboard: &Dashboard) {
    let (mine, others) = views::group_by_owner(&dashboard.topics, dashboard.me.id);
    let active = dashboard.me.topic_count;

    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!("{}", "MY TOPICS".bright_yellow().bold());
    println!(
        "{} {}/{} topics {}",
        progress_bar(active),
        active,
        TOPIC_GOAL,
        if active >= TOPIC_GOAL {
            "Minimum reached!".green()
        } else {
            format!("Add {} more!", TOPIC_GOAL - active).yellow()
        }
    );

    if mine.is_empty() && dashboard.my_discussed.is_empty() {
        println!("  {}", "You haven't added any topics yet.".bright_black());
    }
    for topic in &mine {
        print_topic(topic);
    }
    for topic in &dashboard.my_discussed {
        println!(
            "  {} {}",
            "✓".green(),
            topic.title.bright_black().strikethrough()
        );
    }

    println!();
    println!("{}", "EVERYONE ELSE".bright_yellow().bold());
    if others.is_empty() {
        println!("  {}", "No topics yet.".bright_black());
    }
    for (owner, topics) in &others {
        println!("  {}", owner.bright_cyan().bold());
        for topic in topics {
            print_topic(topic);
        }
    }

    println!();
    println!("{}", "SUGGESTION BOX".bright_yellow().bold());
    if dashboard.suggestions.is_empty() {
        println!("  {}", "No suggestions yet.".bright_black());
    }
    for suggestion in &dashboard.suggestions {
        let claim = match &suggestion.claimed_by_name {
            Some(name) => format!("presented by {name}").green(),
            None => "unclaimed".bright_black(),
        };
        println!(
            "  [{}] {} {} {} ({})",
            suggestion.id.to_string().bright_cyan(),
            vote_marker(suggestion.voted_by_current_user),
            suggestion.title.bright_white(),
            format!("{} interested", suggestion.vote_count).yellow(),
            claim
        );
    }
    println!();
}

fn print_topic(topic: &Topic) {
    println!(
        "    [{}] {} {} {}",
        topic.id.to_string().bright_cyan(),
        vote_marker(topic.voted_by_current_user),
        topic.title.bright_white(),
        format!("{} interested", topic.vote_count).yellow()
    );
    if let Some(description) = &topic.description {
        println!("        {}", description.bright_black());
    }
}

fn vote_marker(voted: bool) -> ColoredString {
    if voted { "★".yellow() } else { "☆".bright_black() }
}

fn progress_bar(active: i64) -> String {
    const WIDTH: usize = 20;
    let filled = usize::from(views::progress_percent(active)) * WIDTH / 100;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(WIDTH - filled));
    match Progress::classify(active, 0) {
        Progress::None => bar.red().to_string(),
        Progress::Partial => bar.yellow().to_string(),
        Progress::Complete => bar.green().to_string(),
    }
}

fn show_people(dashboard: &Dashboard) {
    println!();
    println!("{}", "TEAM".bright_yellow().bold());
    for person in &dashboard.people {
        let badge = views::badge_text(person.topic_count, person.discussed_count);
        let badge = match Progress::of(person) {
            Progress::None => badge.red(),
            Progress::Partial => badge.yellow(),
            Progress::Complete => badge.green(),
        };
        println!("  {:<12} {}", person.name, badge);
    }
}

async fn show_leaderboard(api: &Api) -> anyhow::Result<()> {
    let entries = api.leaderboard().await?;

    println!();
    println!("{}", "=".repeat(60).bright_cyan());
    println!("{}", "    🏆 MOST WANTED".bright_yellow().bold());
    println!("{}", "=".repeat(60).bright_cyan());
    println!();

    for (i, entry) in entries.iter().enumerate() {
        println!(
            "{}. {} ({} votes) - {}",
            (i + 1).to_string().bright_cyan(),
            entry.title.bright_white().bold(),
            entry.vote_count.to_string().yellow(),
            entry.presenter
        );
    }
    if entries.is_empty() {
        println!("{}", "No votes yet.".bright_black());
    }

    Ok(())
}

fn show_help(is_admin: bool) {
    println!(
        "{}",
        "[A]dd  [E]dit <id>  [D]elete <id>  [V]ote <id>  [S]uggest  [U]pvote <id>  [C]laim <id>"
            .bright_black()
    );
    let admin = if is_admin { "[M]ark done <id>  " } else { "" };
    println!(
        "{}",
        format!("{admin}[P]eople  [L]eaderboard  [R]efresh  [Q]uit").bright_black()
    );
}

fn print_vote(voted: bool) {
    if voted {
        println!("{}", "✓ Voted".green());
    } else {
        println!("{}", "→ Vote removed".yellow());
    }
}

// ===== Input =====

/// Returns `None` once stdin is closed.
fn prompt(label: &str) -> io::Result<Option<String>> {
    print!("{}", label.bright_green().bold());
    io::stdout().flush()?;

    read_trimmed_line(&mut io::stdin().lock())
}

fn read_trimmed_line(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut input = String::new();
    if reader.read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn read_required(label: &str) -> io::Result<Option<String>> {
    let value = prompt(label)?.unwrap_or_default();
    if value.is_empty() {
        println!("{}", "Cancelled.".bright_black());
        return Ok(None);
    }
    Ok(Some(value))
}

fn read_optional(label: &str) -> io::Result<Option<String>> {
    Ok(prompt(label)?.filter(|value| !value.is_empty()))
}

fn pause() -> io::Result<()> {
    prompt("Press Enter to continue")?;
    Ok(())
}
