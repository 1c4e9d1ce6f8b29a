use anyhow::Result;
use console::style;
use pal_core::AgentLoop;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Quit,
    Clear,
    Skip,
    Message(String),
}

fn parse_command(line: &str) -> ReplCommand {
    let input = line.trim();
    if input.is_empty() {
        return ReplCommand::Skip;
    }

    match input.to_lowercase().as_str() {
        "quit" | "exit" => ReplCommand::Quit,
        "clear" => ReplCommand::Clear,
        _ => ReplCommand::Message(input.to_string()),
    }
}

pub fn print_response(response: &str) {
    termimad::print_text(response);
}

fn print_welcome() {
    println!("{}", style("🤖 pal").cyan().bold());
    println!("Available tools: Read, Write, Edit, Bash");
    println!(
        "Type a message to chat, {} to reset the conversation, {} or {} to leave.\n",
        style("clear").yellow(),
        style("quit").yellow(),
        style("exit").yellow()
    );
}

pub async fn run(agent_loop: &mut AgentLoop) -> Result<()> {
    print_welcome();

    let mut editor = DefaultEditor::new()?;
    let history_path = pal_core::config::get_pal_dir().join("history.txt");
    let _ = editor.load_history(&history_path);

    loop {
        let line = match editor.readline("📝 You: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("\n👋 Goodbye!");
                break;
            }
            Err(e) => {
                eprintln!("❌ Input error: {}", e);
                break;
            }
        };

        match parse_command(&line) {
            ReplCommand::Skip => continue,
            ReplCommand::Quit => {
                println!("\n👋 Goodbye!");
                break;
            }
            ReplCommand::Clear => {
                agent_loop.clear_history();
                println!("🗑️  Conversation history cleared.\n");
            }
            ReplCommand::Message(message) => {
                let _ = editor.add_history_entry(message.as_str());
                println!("\n{}", style("🤖 Assistant:").green().bold());

                match agent_loop.send_message(&message).await {
                    Ok(response) => print_response(&response),
                    Err(e) => eprintln!("❌ Error: {}", e),
                }
                println!();
            }
        }
    }

    if pal_core::config::ensure_pal_dir().is_ok() {
        let _ = editor.save_history(&history_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_words_are_case_insensitive() {
        assert_eq!(parse_command("quit"), ReplCommand::Quit);
        assert_eq!(parse_command("  EXIT "), ReplCommand::Quit);
        assert_eq!(parse_command("Clear"), ReplCommand::Clear);
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_command(""), ReplCommand::Skip);
        assert_eq!(parse_command("   \t"), ReplCommand::Skip);
    }

    #[test]
    fn everything_else_is_a_message() {
        assert_eq!(
            parse_command("  clear the tmp dir "),
            ReplCommand::Message("clear the tmp dir".into())
        );
    }
}
