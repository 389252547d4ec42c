//! AI and translation orchestration
//!
//! Notes never talk to providers directly. The orchestrator owns the
//! provider chain, the per-call timeout, and the invariant that
//! encrypted content is rejected before any extraction or network call.
//!
//! Provider selection is first-success-wins over a ring: each call
//! starts at a rotation cursor owned by the orchestrator instance and
//! tries every provider once. Timed-out calls are dropped outright, so
//! a late response can never be applied.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config;
use crate::error::{AppError, Result};
use crate::richtext;
use crate::store::Note;

/// The text operation being requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiOperation {
    Summarize,
    Tag,
    Glossary,
    Grammar,
    Translate { target_language: String },
}

impl AiOperation {
    fn is_translation(&self) -> bool {
        matches!(self, AiOperation::Translate { .. })
    }
}

/// Operation-specific structured result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiOutcome {
    Summary(String),
    Tags(Vec<String>),
    Glossary(Vec<GlossaryEntry>),
    Grammar(Vec<GrammarFix>),
    /// Translated text reflowed into paragraph markup.
    Translation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarFix {
    pub error: String,
    pub suggestion: String,
}

/// A single text-generation backend.
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, operation: &AiOperation, text: &str) -> Result<AiOutcome>;
}

/// Orchestrates provider fallback, rotation, and timeouts.
pub struct AiOrchestrator {
    providers: Vec<Arc<dyn AiProvider>>,
    timeout: Duration,
    cursor: AtomicUsize,
}

impl AiOrchestrator {
    pub fn new(providers: Vec<Arc<dyn AiProvider>>) -> Self {
        Self::with_timeout(providers, Duration::from_secs(config::AI_TIMEOUT_SECS))
    }

    pub fn with_timeout(providers: Vec<Arc<dyn AiProvider>>, timeout: Duration) -> Self {
        Self {
            providers,
            timeout,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Run an operation against a whole note.
    ///
    /// An encrypted note is rejected here, before plaintext extraction
    /// and before any provider is contacted.
    pub async fn run_on_note(&self, note: &Note, operation: AiOperation) -> Result<AiOutcome> {
        if note.is_encrypted {
            return Err(AppError::NoteLocked(note.id.to_string()));
        }
        self.run_on_text(&richtext::strip_tags(&note.content), operation)
            .await
    }

    /// Run an operation against already-extracted plaintext (e.g. a
    /// user-selected subrange of a note).
    pub async fn run_on_text(&self, text: &str, operation: AiOperation) -> Result<AiOutcome> {
        if self.providers.is_empty() {
            return Err(self.aggregate_error(&operation, vec!["no providers configured".into()]));
        }

        let start = self.cursor.load(Ordering::Relaxed);
        let mut failures = Vec::new();

        for offset in 0..self.providers.len() {
            let index = (start + offset) % self.providers.len();
            let provider = &self.providers[index];

            match tokio::time::timeout(self.timeout, provider.run(&operation, text)).await {
                Ok(Ok(outcome)) => {
                    // Next call starts at the provider that just worked
                    self.cursor.store(index, Ordering::Relaxed);
                    tracing::debug!("Provider {} succeeded", provider.name());
                    return Ok(outcome);
                }
                Ok(Err(e)) => {
                    tracing::warn!("Provider {} failed: {}", provider.name(), e);
                    failures.push(format!("{}: {}", provider.name(), e));
                }
                Err(_) => {
                    // The in-flight future is dropped with the timeout;
                    // a late response is discarded, never applied.
                    tracing::warn!(
                        "Provider {} timed out after {:?}",
                        provider.name(),
                        self.timeout
                    );
                    failures.push(format!("{}: timed out", provider.name()));
                }
            }
        }

        Err(self.aggregate_error(&operation, failures))
    }

    fn aggregate_error(&self, operation: &AiOperation, failures: Vec<String>) -> AppError {
        let detail = failures.join("; ");
        if operation.is_translation() {
            AppError::Translation(detail)
        } else {
            AppError::AiOperation(detail)
        }
    }
}

// ===== HTTP provider =====

/// Deployment configuration for one chat-completions backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

/// OpenAI-style chat-completions provider.
pub struct ChatCompletionProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl ChatCompletionProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("quillvault")
            .build()
            .map_err(|e| AppError::AiOperation(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn instruction(operation: &AiOperation) -> String {
        match operation {
            AiOperation::Summarize => {
                "Summarize the following note in a short paragraph. \
                 Reply with the summary text only."
                    .to_string()
            }
            AiOperation::Tag => {
                "Suggest up to five short topic tags for the following note. \
                 Reply with a JSON array of strings only."
                    .to_string()
            }
            AiOperation::Glossary => {
                "List the specialist terms in the following note with a one-sentence \
                 definition each. Reply with a JSON array of objects with \
                 \"term\" and \"definition\" fields only."
                    .to_string()
            }
            AiOperation::Grammar => {
                "Find grammar and spelling problems in the following note. \
                 Reply with a JSON array of objects with \"error\" and \
                 \"suggestion\" fields only."
                    .to_string()
            }
            AiOperation::Translate { target_language } => format!(
                "Translate the following note into {}. \
                 Reply with the translated text only, keeping paragraph breaks.",
                target_language
            ),
        }
    }
}

#[async_trait::async_trait]
impl AiProvider for ChatCompletionProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn run(&self, operation: &AiOperation, text: &str) -> Result<AiOutcome> {
        let instruction = Self::instruction(operation);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &instruction,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::AiOperation(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::AiOperation(format!(
                "Provider returned status {}",
                status
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiOperation(format!("Malformed response: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::AiOperation("Empty response".to_string()))?;

        parse_outcome(operation, &content)
    }
}

/// Interpret a provider's raw reply as the operation's structured result.
fn parse_outcome(operation: &AiOperation, reply: &str) -> Result<AiOutcome> {
    let reply = strip_code_fences(reply.trim());

    match operation {
        AiOperation::Summarize => Ok(AiOutcome::Summary(reply.to_string())),
        AiOperation::Tag => {
            let tags: Vec<String> = serde_json::from_str(reply)
                .map_err(|e| AppError::AiOperation(format!("Unparseable tag list: {}", e)))?;
            Ok(AiOutcome::Tags(tags))
        }
        AiOperation::Glossary => {
            let entries: Vec<GlossaryEntry> = serde_json::from_str(reply)
                .map_err(|e| AppError::AiOperation(format!("Unparseable glossary: {}", e)))?;
            Ok(AiOutcome::Glossary(entries))
        }
        AiOperation::Grammar => {
            let fixes: Vec<GrammarFix> = serde_json::from_str(reply)
                .map_err(|e| AppError::AiOperation(format!("Unparseable grammar report: {}", e)))?;
            Ok(AiOutcome::Grammar(fixes))
        }
        AiOperation::Translate { .. } => Ok(AiOutcome::Translation(reflow_paragraphs(reply))),
    }
}

/// Providers often wrap JSON replies in Markdown code fences.
fn strip_code_fences(reply: &str) -> &str {
    let reply = reply.trim();
    let Some(rest) = reply.strip_prefix("```") else {
        return reply;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.trim_end_matches('`').trim()
}

/// Reflow translated plaintext into paragraph markup.
fn reflow_paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", richtext::escape_html(&p.replace('\n', " "))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scriptable provider for orchestrator tests.
    struct MockProvider {
        name: String,
        outcome: std::result::Result<AiOutcome, String>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl MockProvider {
        pub fn succeeding(name: &str, outcome: AiOutcome) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                outcome: Ok(outcome),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn failing(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                outcome: Err("boom".to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn slow(name: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                outcome: Ok(AiOutcome::Summary("late".to_string())),
                delay,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl AiProvider for MockProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, _operation: &AiOperation, _text: &str) -> Result<AiOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcome
                .clone()
                .map_err(AppError::AiOperation)
        }
    }

    fn summary(s: &str) -> AiOutcome {
        AiOutcome::Summary(s.to_string())
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let a = MockProvider::failing("a");
        let b = MockProvider::succeeding("b", summary("from b"));
        let c = MockProvider::succeeding("c", summary("from c"));
        let orchestrator =
            AiOrchestrator::new(vec![
                a.clone() as Arc<dyn AiProvider>,
                b.clone(),
                c.clone(),
            ]);

        let outcome = orchestrator
            .run_on_text("text", AiOperation::Summarize)
            .await
            .unwrap();

        assert_eq!(outcome, summary("from b"));
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
        assert_eq!(c.call_count(), 0);
    }

    #[tokio::test]
    async fn test_aggregate_failure() {
        let a = MockProvider::failing("a");
        let b = MockProvider::failing("b");
        let orchestrator = AiOrchestrator::new(vec![a as Arc<dyn AiProvider>, b]);

        let result = orchestrator.run_on_text("text", AiOperation::Summarize).await;
        match result {
            Err(AppError::AiOperation(detail)) => {
                assert!(detail.contains("a:"));
                assert!(detail.contains("b:"));
            }
            other => panic!("expected aggregate AiOperation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_translation_failures_map_to_translation_error() {
        let orchestrator =
            AiOrchestrator::new(vec![MockProvider::failing("a") as Arc<dyn AiProvider>]);

        let result = orchestrator
            .run_on_text(
                "text",
                AiOperation::Translate {
                    target_language: "German".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Translation(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_failure_not_hang() {
        let slow = MockProvider::slow("slow", Duration::from_secs(60));
        let orchestrator =
            AiOrchestrator::with_timeout(
                vec![slow.clone() as Arc<dyn AiProvider>],
                Duration::from_millis(20),
            );

        let result = orchestrator.run_on_text("text", AiOperation::Summarize).await;

        match result {
            Err(AppError::AiOperation(detail)) => assert!(detail.contains("timed out")),
            other => panic!("expected timeout failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_falls_through_to_next_provider() {
        let slow = MockProvider::slow("slow", Duration::from_secs(60));
        let fallback = MockProvider::succeeding("fallback", summary("rescued"));
        let orchestrator = AiOrchestrator::with_timeout(
            vec![slow as Arc<dyn AiProvider>, fallback.clone()],
            Duration::from_millis(20),
        );

        let outcome = orchestrator
            .run_on_text("text", AiOperation::Summarize)
            .await
            .unwrap();

        assert_eq!(outcome, summary("rescued"));
        assert_eq!(fallback.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rotation_cursor_sticks_to_working_provider() {
        let a = MockProvider::failing("a");
        let b = MockProvider::succeeding("b", summary("ok"));
        let orchestrator =
            AiOrchestrator::new(vec![a.clone() as Arc<dyn AiProvider>, b.clone()]);

        orchestrator
            .run_on_text("x", AiOperation::Summarize)
            .await
            .unwrap();
        orchestrator
            .run_on_text("y", AiOperation::Summarize)
            .await
            .unwrap();

        // The second call starts at b directly; a is not retried
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 2);
    }

    #[tokio::test]
    async fn test_encrypted_note_rejected_without_network_call() {
        let provider = MockProvider::succeeding("p", summary("unused"));
        let orchestrator =
            AiOrchestrator::new(vec![provider.clone() as Arc<dyn AiProvider>]);

        let mut note = Note::new();
        note.content = "bm90IHJlYWwgY2lwaGVydGV4dA==".to_string();
        note.is_encrypted = true;

        let result = orchestrator.run_on_note(&note, AiOperation::Summarize).await;

        assert!(matches!(result, Err(AppError::NoteLocked(_))));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_run_on_note_strips_markup() {
        struct Echo;
        #[async_trait::async_trait]
        impl AiProvider for Echo {
            fn name(&self) -> &str {
                "echo"
            }
            async fn run(&self, _op: &AiOperation, text: &str) -> Result<AiOutcome> {
                Ok(AiOutcome::Summary(text.to_string()))
            }
        }

        let orchestrator = AiOrchestrator::new(vec![Arc::new(Echo) as Arc<dyn AiProvider>]);
        let mut note = Note::new();
        note.content = "<p><b>hello</b> world</p>".to_string();

        let outcome = orchestrator
            .run_on_note(&note, AiOperation::Summarize)
            .await
            .unwrap();

        assert_eq!(outcome, summary("hello world"));
    }

    #[test]
    fn test_parse_tags() {
        let outcome =
            parse_outcome(&AiOperation::Tag, r#"["rust", "notes", "crypto"]"#).unwrap();
        assert_eq!(
            outcome,
            AiOutcome::Tags(vec![
                "rust".to_string(),
                "notes".to_string(),
                "crypto".to_string()
            ])
        );
    }

    #[test]
    fn test_parse_tags_in_code_fence() {
        let reply = "```json\n[\"one\", \"two\"]\n```";
        let outcome = parse_outcome(&AiOperation::Tag, reply).unwrap();
        assert_eq!(
            outcome,
            AiOutcome::Tags(vec!["one".to_string(), "two".to_string()])
        );
    }

    #[test]
    fn test_parse_glossary() {
        let reply = r#"[{"term":"nonce","definition":"A number used once."}]"#;
        let outcome = parse_outcome(&AiOperation::Glossary, reply).unwrap();
        assert_eq!(
            outcome,
            AiOutcome::Glossary(vec![GlossaryEntry {
                term: "nonce".to_string(),
                definition: "A number used once.".to_string()
            }])
        );
    }

    #[test]
    fn test_parse_grammar() {
        let reply = r#"[{"error":"their is","suggestion":"there is"}]"#;
        let outcome = parse_outcome(&AiOperation::Grammar, reply).unwrap();
        assert_eq!(
            outcome,
            AiOutcome::Grammar(vec![GrammarFix {
                error: "their is".to_string(),
                suggestion: "there is".to_string()
            }])
        );
    }

    #[test]
    fn test_unparseable_structured_reply() {
        let result = parse_outcome(&AiOperation::Tag, "sorry, I can't do that");
        assert!(matches!(result, Err(AppError::AiOperation(_))));
    }

    #[test]
    fn test_translation_reflowed_into_paragraphs() {
        let reply = "Erster Absatz.\n\nZweiter\nAbsatz.";
        let outcome = parse_outcome(
            &AiOperation::Translate {
                target_language: "German".to_string(),
            },
            reply,
        )
        .unwrap();

        assert_eq!(
            outcome,
            AiOutcome::Translation(
                "<p>Erster Absatz.</p><p>Zweiter Absatz.</p>".to_string()
            )
        );
    }

    #[test]
    fn test_translation_escapes_markup() {
        let outcome = parse_outcome(
            &AiOperation::Translate {
                target_language: "French".to_string(),
            },
            "a < b",
        )
        .unwrap();

        assert_eq!(outcome, AiOutcome::Translation("<p>a &lt; b</p>".to_string()));
    }
}
