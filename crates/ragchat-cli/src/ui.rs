//! UI utilities for the CLI

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};

use ragchat_core::{ChatSession, ConversationTurn, IndexState, Result, SearchHit};
use ragchat_rag::{IngestReport, Reply};

/// Longest source excerpt shown under an answer
const EXCERPT_CHARS: usize = 160;

/// Display startup banner
pub fn display_banner() {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(67, terminal_width.saturating_sub(4)).max(40);

    let top_border = format!("┌{}┐", "─".repeat(banner_width - 2));
    let bottom_border = format!("└{}┘", "─".repeat(banner_width - 2));
    let empty_line = format!("│{}│", " ".repeat(banner_width - 2));

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());

    let title = "ragchat - Chat with your documents";
    println!(
        "│  {}{}│",
        title.blue().bold(),
        " ".repeat(padding(banner_width, title))
    );

    println!("{}", empty_line.blue());

    let feature_lines = [
        "Ingest a PDF or text file, then ask questions about it.",
        "",
        "• /ingest <file>     index a document",
        "• /mode plain        answer without the document",
        "• /memory on         keep the conversation in the prompt",
        "• ↑/↓                browse earlier input",
        "",
        "v0.1.0 • Hugging Face Inference API",
    ];

    for line in feature_lines {
        if line.is_empty() {
            println!("{}", empty_line.blue());
        } else if line.starts_with("v0.1.0") {
            println!(
                "{}{}{}",
                "│  ".blue(),
                line.dimmed(),
                format!("{}│", " ".repeat(padding(banner_width, line))).blue()
            );
        } else {
            let content = format!("│  {}{}│", line, " ".repeat(padding(banner_width, line)));
            println!("{}", content.blue());
        }
    }

    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
    println!(
        "{}",
        "💡 Tip: Type a question, or 'help' for commands".dimmed()
    );
    println!();
}

fn padding(banner_width: usize, line: &str) -> usize {
    banner_width.saturating_sub(line.chars().count() + 4)
}

/// Read one line, with ↑/↓ history when attached to a terminal.
///
/// Returns `None` at end of input or on Ctrl-C / Ctrl-D.
pub async fn handle_input_with_history(
    label: &str,
    history: &mut Vec<String>,
) -> Result<Option<String>> {
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(Some(input));
    }

    let prompt = format!("{}>", label).green().bold();

    enable_raw_mode()?;
    let mut input = String::new();
    let mut history_index: Option<usize> = None;

    print!("{} ", prompt);
    io::stdout().flush()?;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };

        match key_event.code {
            KeyCode::Char('c') | KeyCode::Char('d')
                if key_event.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                disable_raw_mode()?;
                println!();
                return Ok(None);
            }
            KeyCode::Enter => {
                disable_raw_mode()?;
                println!();
                if !input.is_empty() {
                    history.push(input.clone());
                }
                return Ok(Some(input));
            }
            KeyCode::Char(c) => {
                input.push(c);
                print!("{}", c);
                io::stdout().flush()?;
            }
            KeyCode::Backspace => {
                if input.pop().is_some() {
                    redraw(&prompt, &input, 1)?;
                }
            }
            KeyCode::Up => {
                if !history.is_empty() {
                    let new_index = match history_index {
                        None => history.len() - 1,
                        Some(idx) if idx > 0 => idx - 1,
                        Some(idx) => idx,
                    };
                    history_index = Some(new_index);
                    let previous = input.chars().count();
                    input = history[new_index].clone();
                    redraw(&prompt, &input, previous)?;
                }
            }
            KeyCode::Down => {
                if let Some(idx) = history_index {
                    let previous = input.chars().count();
                    if idx + 1 < history.len() {
                        history_index = Some(idx + 1);
                        input = history[idx + 1].clone();
                    } else {
                        history_index = None;
                        input.clear();
                    }
                    redraw(&prompt, &input, previous)?;
                }
            }
            KeyCode::Esc => {
                disable_raw_mode()?;
                println!();
                return Ok(Some(String::new()));
            }
            _ => {}
        }
    }
}

/// Rewrite the current line, blanking out up to `stale` old characters.
fn redraw(prompt: &ColoredString, input: &str, stale: usize) -> Result<()> {
    print!(
        "\r{} {}\r{} {}",
        prompt,
        " ".repeat(stale.max(input.chars().count()) + 1),
        prompt,
        input
    );
    io::stdout().flush()?;
    Ok(())
}

/// Display help message
pub fn print_help() {
    println!("{}", "Available commands:".bold());
    println!("  {} - Ask about the indexed document", "<question>".green());
    println!("  {} - Index a PDF or text file, replacing the current one", "/ingest <file>".green());
    println!("  {} - Answer from the document or directly", "/mode context|plain".green());
    println!("  {} - Include earlier turns in the prompt", "/memory on|off".green());
    println!("  {} - Show the conversation so far", "/history".green());
    println!("  {} - Forget the conversation", "/clear".green());
    println!("  {} - Delete the stored index", "/reset".green());
    println!("  {} - Show index and session state", "/status".green());
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the application", "exit/quit".green());
    println!();
    println!("{}", "Examples:".bold());
    println!("  /ingest docs/handbook.pdf");
    println!("  What does the handbook say about leave?");
}

/// Print a reply. When `streamed` is set the text is already on screen.
pub fn print_reply(reply: &Reply, streamed: bool) {
    if reply.is_error {
        println!("{}", reply.text.yellow());
        return;
    }
    if !streamed {
        println!("{}", reply.text);
    }
    print_sources(&reply.sources);
    println!();
}

pub fn print_sources(hits: &[SearchHit]) {
    if hits.is_empty() {
        return;
    }
    println!();
    println!("{}", "Sources:".dimmed());
    for hit in hits {
        println!(
            "  {} {}",
            format!("[{} p.{}]", hit.chunk.source, hit.chunk.page).cyan(),
            excerpt(&hit.chunk.text).dimmed()
        );
    }
}

/// Startup notice for a missing API token
pub fn token_notice(has_token: bool) -> Option<String> {
    if has_token {
        return None;
    }
    Some(
        "⚠️ HUGGINGFACEHUB_API_TOKEN is not set; answers and remote embeddings will fail"
            .to_string(),
    )
}

pub fn print_ingest_report(report: &IngestReport) {
    println!("{}", report.status_message().green());
}

pub fn print_status(session: &ChatSession, index_dir: &str, index_on_disk: bool) {
    let index = match session.index_state() {
        IndexState::Indexed => "indexed".green(),
        IndexState::NoIndex if index_on_disk => "not loaded this session".yellow(),
        IndexState::NoIndex => "none".yellow(),
    };
    println!("{} {} ({})", "Index:".bold(), index, index_dir);
    println!("{} {}", "Mode:".bold(), session.mode());
    println!(
        "{} {}",
        "Memory:".bold(),
        if session.memory_enabled() { "on" } else { "off" }
    );
    println!("{} {}", "Turns:".bold(), session.turns().len());
}

pub fn print_history(turns: &[ConversationTurn]) {
    if turns.is_empty() {
        println!("{}", "No conversation yet.".dimmed());
        return;
    }
    for turn in turns {
        println!("{} {}", "You:".green().bold(), turn.question);
        if turn.is_error {
            println!("{} {}", "Bot:".blue().bold(), turn.answer.yellow());
        } else {
            println!("{} {}", "Bot:".blue().bold(), turn.answer);
        }
    }
}

/// Single-line, length-capped preview of a chunk
pub fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    format!("{}…", cut.trim_end())
}
