use insight_client::InsightTransport;
use serde::Deserialize;
use tracing::warn;

/// Whether a title is known to public reference sites at all. Used to
/// distinguish "no opinion yet" from "does not exist externally"
/// (platform-exclusive titles).
#[derive(Debug, Clone)]
pub struct ExistenceCheck {
    pub exists: bool,
    pub sources_found: Vec<String>,
}

impl ExistenceCheck {
    /// Fail-open default: assume the title exists rather than wrongly
    /// declaring it exclusive.
    fn assume_exists() -> Self {
        Self {
            exists: true,
            sources_found: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
struct ExistenceReply {
    #[serde(default)]
    exists: bool,
    #[serde(default)]
    sources_found: Vec<String>,
}

pub struct ExistenceVerifier<'a> {
    transport: &'a dyn InsightTransport,
}

impl<'a> ExistenceVerifier<'a> {
    pub fn new(transport: &'a dyn InsightTransport) -> Self {
        Self { transport }
    }

    /// Ask the Insight service whether the title is recognized by at
    /// least one major reference site. Any failure fails open.
    pub async fn verify(&self, title: &str) -> ExistenceCheck {
        let safe_title = title.replace('"', "\\\"");
        let prompt = format!(
            "Check if this video game exists on IGN, Metacritic, or Steam: {safe_title}\n\n\
             Respond ONLY with JSON: {{\"exists\": true, \"sources_found\": [\"IGN\", \"Metacritic\"]}}"
        );

        let reply = match self.transport.generate(&prompt, 0.1).await {
            Ok(text) => text,
            Err(e) => {
                warn!(title, error = %e, "Existence check failed, assuming title exists");
                return ExistenceCheck::assume_exists();
            }
        };

        match serde_json::from_str::<ExistenceReply>(&reply) {
            Ok(parsed) => ExistenceCheck {
                exists: parsed.exists,
                sources_found: parsed.sources_found,
            },
            Err(e) => {
                warn!(title, error = %e, "Existence reply was not JSON, assuming title exists");
                ExistenceCheck::assume_exists()
            }
        }
    }
}
