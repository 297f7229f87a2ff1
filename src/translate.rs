use tracing::{debug, warn};

use crate::llm::LlmClient;
use crate::models::{ChatOutcome, FilterState, FilterUpdate, RejectReason};
use crate::prompts::{user_filter_request, SYSTEM_INSTRUCTION};
use crate::state::FilterStateMachine;

/// Turns free text into a validated filter update by way of the language
/// model. The reply is untrusted input; nothing it proposes reaches the
/// filter state except through `FilterStateMachine::apply_from_chat`.
pub struct Translator {
    llm: LlmClient,
}

impl Translator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Exactly one outbound call per invocation, no automatic retry: the
    /// reply is conversational, and a blind retry could answer differently.
    pub async fn translate(&self, text: &str, machine: &mut FilterStateMachine) -> ChatOutcome {
        let bounds = machine.bounds();
        let user = user_filter_request(
            text,
            &state_json(machine.state()),
            &join_labels(machine.source_types()),
            &join_labels(machine.publishers()),
            bounds.min,
            bounds.max,
        );

        let raw = match self.llm.complete(SYSTEM_INSTRUCTION, &user).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("LLM service failure - {:#}", e);
                return ChatOutcome::Rejected {
                    reason: RejectReason::ServiceUnavailable,
                    raw_reply: None,
                };
            }
        };

        let update = match interpret_reply(&raw) {
            Ok(update) => update,
            Err(e) => {
                warn!("Unparseable LLM reply - error={}", e);
                return ChatOutcome::Rejected {
                    reason: RejectReason::MalformedReply,
                    raw_reply: Some(raw),
                };
            }
        };

        if update.is_empty() {
            debug!("LLM reply proposed no filter changes");
        }

        match machine.apply_from_chat(update) {
            Ok(state) => ChatOutcome::Applied {
                state,
                raw_reply: raw,
            },
            Err(e) => {
                warn!("Chat update rejected - reason={}", e);
                ChatOutcome::Rejected {
                    reason: RejectReason::InvalidUpdate(e),
                    raw_reply: Some(raw),
                }
            }
        }
    }
}

/// Parse the model's reply into a partial update. Tolerates a ```json fence
/// around the object; anything else must already be the bare object.
pub fn interpret_reply(raw: &str) -> Result<FilterUpdate, serde_json::Error> {
    serde_json::from_str(strip_fence(raw.trim()))
}

fn strip_fence(s: &str) -> &str {
    let Some(inner) = s.strip_prefix("```") else {
        return s;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    match inner.rfind("```") {
        Some(end) => inner[..end].trim(),
        None => s,
    }
}

fn state_json(state: &FilterState) -> String {
    serde_json::to_string(state).unwrap()
}

fn join_labels(labels: &std::collections::BTreeSet<String>) -> String {
    labels.iter().cloned().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object_parses() {
        let update = interpret_reply(r#"{"source_type": "News", "year_range": [2019, 2021]}"#)
            .unwrap();
        assert_eq!(update.source_type.as_deref(), Some("News"));
        assert_eq!(update.year_range, Some((2019, 2021)));
    }

    #[test]
    fn fenced_object_parses() {
        let raw = "```json\n{\"publisher\": \"The Daily\"}\n```";
        let update = interpret_reply(raw).unwrap();
        assert_eq!(update.publisher.as_deref(), Some("The Daily"));
    }

    #[test]
    fn prose_is_malformed() {
        assert!(interpret_reply("Sure! I'll narrow the filters to News for you.").is_err());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let update =
            interpret_reply(r#"{"source_type": "News", "confidence": 0.9}"#).unwrap();
        assert_eq!(update.source_type.as_deref(), Some("News"));
    }

    #[test]
    fn empty_object_means_no_changes() {
        assert!(interpret_reply("{}").unwrap().is_empty());
    }

    #[test]
    fn json_array_is_malformed() {
        assert!(interpret_reply(r#"[2019, 2021]"#).is_err());
    }
}
