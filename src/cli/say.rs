//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use crate::core::chat_stream::{GeminiClient, ReplySource};
use crate::core::conversation::{run_exchange, Conversation, ExchangeOutcome, Role, EXCHANGE_ERROR_TEXT};
use crate::core::persona::PersonaId;

/// Printed when the service finishes without producing any text.
pub const EMPTY_REPLY_TEXT: &str = "Failed to generate a response.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SayResult {
    Completed,
    Failed { detail: String },
}

pub async fn run_say(
    prompt: Vec<String>,
    persona: PersonaId,
    base_url: String,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: polymind say <prompt>");
        std::process::exit(1);
    }

    let client = GeminiClient::from_env(base_url);
    let mut stdout = io::stdout();
    match say_to(&client, &prompt, persona, &mut stdout).await? {
        SayResult::Completed => Ok(()),
        SayResult::Failed { detail } => {
            eprintln!("❌ {EXCHANGE_ERROR_TEXT}");
            if !detail.is_empty() {
                eprintln!("   {detail}");
            }
            std::process::exit(1);
        }
    }
}

/// Run one exchange and stream the reply text into `out` as it arrives.
pub async fn say_to<W: Write>(
    source: &dyn ReplySource,
    prompt: &str,
    persona: PersonaId,
    out: &mut W,
) -> io::Result<SayResult> {
    let mut conversation = Conversation::new();
    let mut printed = 0usize;
    let mut write_error: Option<io::Error> = None;

    let outcome = run_exchange(&mut conversation, source, prompt, persona, |conversation| {
        if write_error.is_some() {
            return;
        }
        let Some(reply) = conversation
            .turns()
            .iter()
            .rev()
            .find(|turn| turn.role == Role::Assistant)
        else {
            return;
        };
        if reply.content.len() > printed {
            let fresh = &reply.content[printed..];
            printed = reply.content.len();
            if let Err(err) = out.write_all(fresh.as_bytes()).and_then(|_| out.flush()) {
                write_error = Some(err);
            }
        }
    })
    .await;

    if let Some(err) = write_error {
        return Err(err);
    }

    match outcome {
        Some(ExchangeOutcome::Failed) => {
            if printed > 0 {
                writeln!(out)?;
            }
            Ok(SayResult::Failed {
                detail: conversation.last_error().unwrap_or_default().to_string(),
            })
        }
        Some(ExchangeOutcome::Completed) | None => {
            if printed == 0 {
                writeln!(out, "{EMPTY_REPLY_TEXT}")?;
            } else {
                writeln!(out)?;
            }
            Ok(SayResult::Completed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat_stream::{FragmentStream, HistoryEntry, TransportError};
    use futures_util::stream;

    struct Scripted {
        fragments: Vec<&'static str>,
        fail: bool,
    }

    impl ReplySource for Scripted {
        fn stream_reply(&self, _: &str, _: PersonaId, _: &[HistoryEntry]) -> FragmentStream {
            let mut items: Vec<Result<String, TransportError>> = self
                .fragments
                .iter()
                .map(|fragment| Ok(fragment.to_string()))
                .collect();
            if self.fail {
                items.push(Err(TransportError::Api {
                    message: "overloaded".to_string(),
                }));
            }
            Box::pin(stream::iter(items))
        }
    }

    async fn say(source: Scripted) -> (SayResult, String) {
        let mut out = Vec::new();
        let result = say_to(&source, "hello", PersonaId::Grok, &mut out)
            .await
            .expect("writing to a Vec cannot fail");
        (result, String::from_utf8(out).expect("utf-8 output"))
    }

    #[tokio::test]
    async fn streams_fragments_then_newline() {
        let (result, out) = say(Scripted {
            fragments: vec!["При", "вет", "!"],
            fail: false,
        })
        .await;
        assert_eq!(result, SayResult::Completed);
        assert_eq!(out, "Привет!\n");
    }

    #[tokio::test]
    async fn empty_reply_prints_fallback() {
        let (result, out) = say(Scripted {
            fragments: vec![],
            fail: false,
        })
        .await;
        assert_eq!(result, SayResult::Completed);
        assert_eq!(out, format!("{EMPTY_REPLY_TEXT}\n"));
    }

    #[tokio::test]
    async fn failure_keeps_partial_text_and_reports_detail() {
        let (result, out) = say(Scripted {
            fragments: vec!["partial"],
            fail: true,
        })
        .await;
        assert_eq!(out, "partial\n");
        assert_eq!(
            result,
            SayResult::Failed {
                detail: "API Error: overloaded".to_string()
            }
        );
    }
}
