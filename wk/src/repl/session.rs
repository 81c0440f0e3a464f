//! REPL session management

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::session::{Reply, Session, Settings};

/// Interactive chat over a [`Session`]
pub struct ReplSession {
    session: Session,
}

impl ReplSession {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Index `request` with the current model before the loop starts
    pub async fn index(&mut self, request: &str) {
        println!("{} {}", "Indexing:".bright_yellow(), request);
        let settings = Settings {
            model: self.session.model().to_string(),
            page_request: request.to_string(),
        };
        let reply = self.session.update_settings(settings).await;
        print_reply(&reply);
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        let reply = self.session.handle_message(input).await;
                        print_reply(&reply);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "WikiChat".bright_cyan().bold());
        println!("Model: {}", self.session.model().bright_white());
        println!(
            "Index pages with {}, then ask questions.",
            "/index please index: <page>, <page>".yellow()
        );
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };
        debug!(%cmd, "handle_slash_command: called");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/index" | "/i" => {
                if rest.is_empty() {
                    println!("{} /index <request>", "Usage:".yellow());
                } else {
                    self.index(rest).await;
                }
                SlashResult::Continue
            }
            "/model" | "/m" => {
                if rest.is_empty() {
                    println!("Current model: {}", self.session.model().bright_white());
                } else {
                    let reply = self.session.select_model(rest).await;
                    print_reply(&reply);
                }
                SlashResult::Continue
            }
            "/models" => {
                self.print_models();
                SlashResult::Continue
            }
            "/status" | "/s" => {
                self.print_status();
                SlashResult::Continue
            }
            "/clear" | "/c" => {
                if self.session.reset_memory() {
                    println!("{}", "Conversation cleared.".dimmed());
                } else {
                    println!("{}", "No agent yet; nothing to clear.".dimmed());
                }
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:18} Index the pages named in a request", "/index <request>".yellow());
        println!("  {:18} Switch the chat model", "/model <name>".yellow());
        println!("  {:18} List selectable models", "/models".yellow());
        println!("  {:18} Show the current model and index", "/status".yellow());
        println!("  {:18} Clear conversation memory", "/clear".yellow());
        println!("  {:18} Show this help", "/help".yellow());
        println!("  {:18} Exit", "/quit".yellow());
        println!();
        println!(
            "Example: {}",
            "/index please index: Paris, Lagos".bright_white()
        );
        println!();
    }

    fn print_models(&self) {
        println!();
        println!("{}", "Models:".bright_cyan());
        for model in self.session.models() {
            if model == self.session.model() {
                println!("  {} {}", "*".bright_green(), model.bright_white());
            } else {
                println!("    {}", model);
            }
        }
        println!();
    }

    fn print_status(&self) {
        println!();
        println!("{}", "Status:".bright_cyan());
        println!("  {:10} {}", "Model:", self.session.model());
        println!(
            "  {:10} {}",
            "Request:",
            self.session.page_request().unwrap_or("(none)")
        );
        match self.session.active() {
            Some(active) => {
                println!("  {:10} {}", "Index:", active.source);
                println!("  {:10} {}", "Pages:", active.index.page_titles().join(", "));
                println!("  {:10} {}", "Documents:", active.index.document_count());
                println!("  {:10} {} messages", "Memory:", active.agent.memory().len());
            }
            None => println!("  {:10} {}", "Index:", "(none)".dimmed()),
        }
        println!();
    }
}

pub(super) fn print_reply(reply: &Reply) {
    let author = format!("{}:", reply.author).bright_blue();
    if reply.is_error {
        println!("{} {}", author, reply.content.red());
    } else {
        println!("{} {}", author, reply.content);
    }
    println!();
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}
