use anyhow::Context;
use dns_voice_agent::{
    config::load_config,
    llm::{build_agent, AgentLoop, ConversationTemplates},
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

fn is_exit_command(line: &str) -> bool {
    matches!(line.to_lowercase().as_str(), "exit" | "quit" | "bye")
}

async fn handle_line(agent: &mut AgentLoop, line: &str) {
    match agent.process_turn(line).await {
        Ok(report) => {
            for line in report.lines() {
                println!("{}", line);
            }
        }
        Err(e) => println!("❌ Error: {}", e),
    }
    log::debug!("{}", agent.conversation().summary());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("🚀 Starting DNS agent");

    let config = load_config().context("Failed to load configuration")?;
    let dns_url = config.dns.server_url().to_string();
    let (mut agent, llm) =
        build_agent(config.dns, &config.llm).context("Failed to initialize agent")?;

    match llm.list_models().await {
        Ok(models) => log::info!("🤖 LLM endpoint reachable ({} models)", models.len()),
        Err(e) => log::warn!("⚠️ Could not list models at {}: {}", config.llm.base_url, e),
    }

    println!("🤖 DNS Agent ({}) | DNS server: {}", llm.model(), dns_url);
    println!("{}", ConversationTemplates::tip());
    println!("Type 'exit' to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_exit_command(line) {
            break;
        }

        handle_line(&mut agent, line).await;
    }

    println!("{}", ConversationTemplates::goodbye());
    Ok(())
}
