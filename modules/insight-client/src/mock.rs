use async_trait::async_trait;

use crate::{InsightError, InsightTransport};

/// Deterministic offline transport.
///
/// Answers the engine's two prompt shapes with canned JSON so the whole
/// service can run without a credential or network access. Selected by
/// the `INSIGHT_MOCK` env flag; also handy in tests.
pub struct MockInsight;

const MOCK_EXISTENCE_REPLY: &str =
    r#"{"exists": true, "sources_found": ["IGN", "Metacritic"]}"#;

const MOCK_SENTIMENT_REPLY: &str = r#"{
    "overall_sentiment_score": 78,
    "sources": [
        {"source_name": "IGN", "url": "https://www.ign.com/reviews/example", "sentiment": "Positive", "score": 80},
        {"source_name": "GameSpot", "url": "https://www.gamespot.com/reviews/example", "sentiment": "Positive", "score": 76}
    ],
    "summary": "Generally positive reception from critics and players"
}"#;

#[async_trait]
impl InsightTransport for MockInsight {
    async fn generate(&self, prompt: &str, _temperature: f32) -> Result<String, InsightError> {
        if prompt.contains("exists") {
            Ok(MOCK_EXISTENCE_REPLY.to_string())
        } else if prompt.to_lowercase().contains("sentiment") || prompt.contains("reviews") {
            Ok(MOCK_SENTIMENT_REPLY.to_string())
        } else {
            Err(InsightError::EmptyResponse)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_existence_prompts_with_json() {
        let reply = MockInsight
            .generate("Check if this video game exists on IGN: Foo", 0.1)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["exists"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn answers_sentiment_prompts_with_json() {
        let reply = MockInsight
            .generate("Search the web NOW for reviews of: Foo", 0.3)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["overall_sentiment_score"], serde_json::json!(78));
        assert_eq!(value["sources"].as_array().unwrap().len(), 2);
    }
}
