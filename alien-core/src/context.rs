//! Turns session state into a completion request.

use crate::message::Sender;
use crate::session::Session;

/// The system instruction for a session: story text plus the emphasis clause.
pub fn system_prompt(session: &Session) -> String {
    let theme = session.theme();
    format!(
        "{}. {}\n\nIncorporate elements of {} into the narrative.",
        theme.title,
        theme.initial_prompt,
        session.traits().emphasis()
    )
}

/// Build the request for `new_input`.
///
/// Order: one system entry, then the log in chronological order, then
/// `new_input` as the final user entry. If the log already ends with the
/// same player line (it does during a turn, since the line is recorded
/// first) that entry is left out of the history so the input is sent once.
pub fn build(session: &Session, new_input: &str) -> groq::Request {
    let history = match session.messages().as_slice().split_last() {
        Some((last, rest)) if last.sender == Sender::Player && last.content == new_input => rest,
        _ => session.messages().as_slice(),
    };

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(groq::Message::system(system_prompt(session)));
    messages.extend(history.iter().map(|m| m.to_provider()));
    messages.push(groq::Message::user(new_input));

    tracing::debug!(
        session = %session.id(),
        messages = messages.len(),
        "assembled completion request"
    );
    groq::Request::new(messages)
}
