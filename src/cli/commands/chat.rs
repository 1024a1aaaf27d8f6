//! Interactive chat command backed by a conversation session.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// What the REPL should do with one line of input.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Exit,
    Clear,
    Question(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        Input::Empty
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        Input::Exit
    } else if line.eq_ignore_ascii_case("clear") {
        Input::Clear
    } else {
        Input::Question(line)
    }
}

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.model.model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let sessions = orchestrator.sessions().clone();
    let mut session_id = sessions.create_session()?;

    println!("\n{}", style("Coursemate Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about your courses, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Exit => {
                Output::info("Goodbye!");
                break;
            }
            Input::Clear => {
                sessions.clear_session(&session_id)?;
                session_id = sessions.create_session()?;
                Output::info("Conversation history cleared.");
            }
            Input::Question(question) => {
                let spinner = Output::spinner("Thinking...");
                let result = orchestrator.query(question, Some(&session_id)).await;
                spinner.finish_and_clear();

                match result {
                    Ok(result) => {
                        println!("\n{} {}", style("Coursemate:").cyan().bold(), result.answer);
                        Output::sources(&result.sources);
                        println!();
                    }
                    Err(e) => Output::error(&format!("Error: {}", e)),
                }
            }
        }
    }

    Ok(())
}
