//! `helpline chat` — Interactive or single-question mode.

use std::io::Write;

use helpline_config::AppConfig;
use helpline_core::ConversationWindow;
use helpline_engine::Router;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    HELPLINE_API_KEY=sk-...");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = helpline_providers::build_from_config(&config)?;
    let router = Router::load(&config, provider)?;
    let mut window = ConversationWindow::new(config.history.max_messages);

    if let Some(question) = message {
        let question = question.trim();
        if question.is_empty() {
            return Err("Question is empty.".into());
        }
        eprint!("  Thinking...");
        let answer = router.answer(question, &mut window).await;
        eprint!("\r              \r");
        println!("{}", answer?);
        return Ok(());
    }

    println!();
    println!("  Helpline — Interactive Mode");
    println!();
    println!("  Model:       {}", config.model);
    println!("  Endpoint:    {}", config.api_url);
    println!(
        "  Knowledge:   {} entries, {} categories",
        router.knowledge().len(),
        router.knowledge().categories().len()
    );
    println!("  Contexts:    {}", router.catalog().names().join(", "));
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'quit' or 'exit' to leave.");
    println!();

    repl(&router, &mut window).await?;

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

async fn repl(router: &Router, window: &mut ConversationWindow) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.eq_ignore_ascii_case("quit") || query.eq_ignore_ascii_case("exit") {
            break;
        }
        if query.is_empty() {
            prompt()?;
            continue;
        }

        eprint!("  ...");
        match router.answer(query, window).await {
            Ok(answer) => {
                eprint!("\r     \r");
                println!();
                for line in answer.lines() {
                    println!("  Agent > {line}");
                }
                println!();
            }
            Err(e) => {
                // The window is left as it was; the question can be retried.
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }
        prompt()?;
    }

    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}
