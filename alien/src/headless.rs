//! Headless mode for the console.
//!
//! A line-oriented interface for scripted play and automated testing:
//! every input line is a player action unless it starts with `#`, in which
//! case it is a console command.

use alien_core::{CompletionProvider, NarrativeEngine, Sender};
use std::io::{self, BufRead, Write};

/// Run turns read from `input` until end of input or `#quit`.
pub async fn run_session<P, R, W>(
    engine: &NarrativeEngine<P>,
    input: R,
    out: &mut W,
) -> io::Result<()>
where
    P: CompletionProvider,
    R: BufRead,
    W: Write,
{
    let snapshot = engine.snapshot();
    writeln!(out, "=== Alien Planet Console ===")?;
    writeln!(out, "Story: {}", snapshot.title)?;
    writeln!(out, "Player: {} ({})", snapshot.player_name, snapshot.traits)?;
    writeln!(out)?;
    if let Some(welcome) = snapshot
        .messages
        .iter()
        .find(|m| m.sender == Sender::Narrator)
    {
        writeln!(out, "[GAMEMASTER]")?;
        writeln!(out, "{}", welcome.content)?;
        writeln!(out)?;
    }
    writeln!(out, "[STATUS] {}", snapshot.status_line())?;
    writeln!(out, "Enter your actions (one per line), #help for commands:")?;
    writeln!(out)?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('#') {
            match command.split_whitespace().next() {
                Some("quit") | Some("exit") => {
                    writeln!(out, "Goodbye!")?;
                    break;
                }
                Some("status") => {
                    let snapshot = engine.snapshot();
                    writeln!(out, "[STATUS] {}", snapshot.status_line())?;
                    writeln!(out, "  Phase: {}", snapshot.phase)?;
                    writeln!(out, "  Traits: {}", snapshot.traits)?;
                }
                Some("log") => {
                    writeln!(out, "[LOG]")?;
                    writeln!(out, "{}", engine.snapshot().transcript())?;
                }
                Some("help") => {
                    writeln!(out, "[HELP]")?;
                    writeln!(out, "  #quit    - Exit the console")?;
                    writeln!(out, "  #status  - Show turn count and metrics")?;
                    writeln!(out, "  #log     - Print the full message log")?;
                    writeln!(out, "  #help    - Show this help")?;
                    writeln!(out, "  (anything else is sent as a player action)")?;
                }
                _ => {
                    writeln!(out, "[ERROR] Unknown command. Type #help for help.")?;
                }
            }
            out.flush()?;
            continue;
        }

        match engine.submit(line).await {
            Ok(outcome) => {
                writeln!(out, "[GAMEMASTER]")?;
                for para in outcome.narrative.split("\n\n") {
                    writeln!(out, "{para}")?;
                }
                writeln!(out)?;
                if outcome.degraded {
                    writeln!(out, "[WARN] The narrator could not be reached.")?;
                }
                writeln!(out, "[STATUS] {}", outcome.snapshot.status_line())?;
            }
            Err(e) => {
                writeln!(out, "[ERROR] {e}")?;
            }
        }
        out.flush()?;
    }

    Ok(())
}
