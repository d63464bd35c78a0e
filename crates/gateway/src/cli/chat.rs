//! `whisperer chat` — interactive REPL command.
//!
//! Sends each line to the agent and prints the new part of the history.
//! When a run stops on an approval the prompt switches to
//! `[a]ccept / [d]eny` and the answer is passed to `resume`.

use std::sync::Arc;

use wh_domain::approval::{ApprovalRequest, ACCEPT, DENY};
use wh_domain::config::Config;
use wh_domain::transport::{ChatMessage, ChatRole};

use crate::bootstrap;
use crate::runtime::{Session, SessionReply};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run the interactive chat REPL.
pub async fn chat(config: Arc<Config>, conversation: Option<String>) -> anyhow::Result<()> {
    let mut conversation_id = conversation.unwrap_or_else(|| config.agent.conversation_id.clone());
    let session = Session::new(bootstrap::build_app_state(config)?);

    let history_path = dirs::home_dir()
        .unwrap_or_default()
        .join(".whisperer")
        .join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    // Welcome text goes to stderr to keep stdout for the conversation.
    eprintln!("whisperer interactive chat");
    eprintln!("Conversation: {conversation_id}  |  Type /help for commands, Ctrl+D to exit");
    eprintln!();

    let mut shown = 0usize;
    let mut pending: Option<ApprovalRequest> = None;

    loop {
        let prompt = if pending.is_some() { "[a]ccept / [d]eny> " } else { "you> " };

        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                // ── Slash commands (also while an approval waits) ─────
                if trimmed.starts_with('/') {
                    rl.add_history_entry(&line).ok();
                    match handle_slash_command(trimmed, &session, &mut conversation_id) {
                        SlashOutcome::Exit => break,
                        SlashOutcome::Switched => {
                            shown = 0;
                            pending = session
                                .conversation(&conversation_id)
                                .and_then(|view| {
                                    let reply = SessionReply {
                                        messages: view.messages,
                                        pending_approval: view.pending_approval,
                                    };
                                    render(&reply, &mut shown)
                                });
                        }
                        SlashOutcome::Continue => {}
                    }
                    continue;
                }

                // ── Approval answer ──────────────────────────────
                if pending.is_some() {
                    let Some(decision) = parse_decision(trimmed) else {
                        eprintln!("Please answer 'a' (accept) or 'd' (deny).");
                        continue;
                    };
                    match session.resume(&conversation_id, decision).await {
                        Ok(reply) => {
                            pending = render(&reply, &mut shown);
                        }
                        Err(e) => {
                            eprintln!("\x1B[31merror: {e}\x1B[0m");
                            pending = resync(&session, &conversation_id, &mut shown);
                        }
                    }
                    continue;
                }

                rl.add_history_entry(&line).ok();

                // ── User message → invoke ─────────────────────────
                match session.invoke(&conversation_id, trimmed).await {
                    Ok(reply) => {
                        pending = render(&reply, &mut shown);
                    }
                    Err(e) => {
                        eprintln!("\x1B[31merror: {e}\x1B[0m");
                        pending = resync(&session, &conversation_id, &mut shown);
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                break;
            }
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();

    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Rendering
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Print messages past `shown`, then the approval prompt if any.
/// Returns the pending approval.
fn render(reply: &SessionReply, shown: &mut usize) -> Option<ApprovalRequest> {
    for message in reply.messages.iter().skip(*shown) {
        println!("{}", format_message(message));
    }
    *shown = reply.messages.len();

    if let Some(request) = &reply.pending_approval {
        eprintln!();
        eprintln!("\x1B[33mApproval needed:\x1B[0m {}", request.query);
    }
    reply.pending_approval.clone()
}

fn format_message(message: &ChatMessage) -> String {
    match message.role {
        ChatRole::User => format!("you: {}", message.content),
        ChatRole::Assistant => format!("assistant: {}\n", message.content),
        ChatRole::Tool => format!("\x1B[2m[tool] {}\x1B[0m", message.content),
    }
}

/// Re-read the conversation after a failed call. A resume that failed past
/// the approval has already cleared it and withdrawn the assistant turn.
fn resync(session: &Session, conversation_id: &str, shown: &mut usize) -> Option<ApprovalRequest> {
    let view = session.conversation(conversation_id);
    *shown = (*shown).min(view.as_ref().map_or(0, |v| v.messages.len()));
    view.and_then(|v| v.pending_approval)
}

/// Map an approval answer to its decision value.
fn parse_decision(input: &str) -> Option<&'static str> {
    match input.to_ascii_lowercase().as_str() {
        "a" | "accept" | "y" | "yes" => Some(ACCEPT),
        "d" | "deny" | "n" | "no" => Some(DENY),
        _ => None,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, PartialEq, Eq)]
enum SlashOutcome {
    Continue,
    Switched,
    Exit,
}

fn handle_slash_command(input: &str, session: &Session, conversation_id: &mut String) -> SlashOutcome {
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim());

    match cmd {
        "/exit" | "/quit" => return SlashOutcome::Exit,

        "/conversation" => {
            if let Some(name) = arg.filter(|s| !s.is_empty()) {
                *conversation_id = name.to_string();
                eprintln!("Conversation switched to: {conversation_id}");
                return SlashOutcome::Switched;
            }
            eprintln!("Current conversation: {conversation_id}");
            eprintln!("Usage: /conversation <id>");
        }

        "/history" => match session.conversation(conversation_id) {
            Some(view) => {
                for message in &view.messages {
                    println!("{}", format_message(message));
                }
            }
            None => eprintln!("(no messages yet)"),
        },

        "/tools" => {
            for tool in session.state().tools.list() {
                eprintln!("  {:<16} {}", tool.name, tool.description);
            }
        }

        "/clear" => {
            eprint!("\x1B[2J\x1B[1;1H");
        }

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /conversation <id>  Switch to another conversation");
            eprintln!("  /history            Print the whole conversation");
            eprintln!("  /tools              List available capabilities");
            eprintln!("  /clear              Clear the screen");
            eprintln!("  /exit, /quit        Exit the chat");
            eprintln!("  /help               Show this help");
        }

        other => {
            eprintln!("Unknown command: {other}  (type /help for a list)");
        }
    }

    SlashOutcome::Continue
}
