use insight_client::InsightTransport;
use serde::Deserialize;
use tracing::{info, warn};

use storepulse_common::SourceCitation;

use crate::existence::ExistenceVerifier;

/// Outcome of an external sentiment fetch. The three cases are
/// deliberately distinct so callers cannot conflate "no opinion"
/// with "couldn't ask".
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Usable data was retrieved; cache it and stamp the sync time.
    Fetched(ExternalSentiment),
    /// Confirmed absence of external data. Cacheable negative result;
    /// stamp the sync time so the window applies.
    NoData,
    /// Timeout or transport failure. Do not cache, do not stamp the
    /// sync time; the next request retries.
    TransientFailure,
}

#[derive(Debug, Clone)]
pub struct ExternalSentiment {
    /// 0..100, `None` when sources were cited without an overall score.
    pub score: Option<f64>,
    pub sources: Vec<SourceCitation>,
    pub summary: String,
}

// --- Untrusted wire shape ---

#[derive(Deserialize)]
struct SentimentReply {
    overall_sentiment_score: Option<f64>,
    #[serde(default)]
    sources: Vec<SourceReply>,
    #[serde(default)]
    summary: String,
}

#[derive(Deserialize)]
struct SourceReply {
    source_name: Option<String>,
    url: Option<String>,
    sentiment: Option<String>,
    score: Option<f64>,
}

pub struct SentimentFetcher<'a> {
    transport: &'a dyn InsightTransport,
}

impl<'a> SentimentFetcher<'a> {
    pub fn new(transport: &'a dyn InsightTransport) -> Self {
        Self { transport }
    }

    /// Fetch current external sentiment for a title.
    ///
    /// Existence is checked first; a confirmed miss short-circuits to
    /// `NoData` without spending the more expensive search query.
    pub async fn fetch(&self, title: &str) -> FetchOutcome {
        let check = ExistenceVerifier::new(self.transport).verify(title).await;
        if !check.exists {
            info!(title, "Title not found externally");
            return FetchOutcome::NoData;
        }

        let safe_title = title.replace('"', "\\\"");
        let prompt = format!(
            "Search the web NOW for reviews of: {safe_title}\n\n\
             Check these sites for CURRENT reviews (the game may have released recently):\n\
             - IGN.com\n\
             - Metacritic.com\n\
             - store.steampowered.com\n\n\
             Return ONLY this JSON format (no other text):\n\
             {{\"overall_sentiment_score\": 85, \"sources\": [{{\"source_name\": \"IGN\", \
             \"url\": \"https://ign.com/reviews/...\", \"sentiment\": \"Positive\", \"score\": 90}}], \
             \"summary\": \"Brief summary\"}}\n\n\
             If absolutely no reviews found:\n\
             {{\"overall_sentiment_score\": null, \"sources\": [], \"summary\": \"No reviews\"}}"
        );

        let reply = match self.transport.generate(&prompt, 0.3).await {
            Ok(text) => text,
            Err(e) if e.is_transient() => {
                warn!(title, error = %e, "Sentiment fetch failed, will retry on next request");
                return FetchOutcome::TransientFailure;
            }
            Err(e) => {
                warn!(title, error = %e, "Insight service rejected sentiment query");
                return FetchOutcome::TransientFailure;
            }
        };

        parse_sentiment_reply(title, &reply)
    }
}

/// Parse the untrusted reply. Prose instead of JSON degrades to the
/// cacheable "no data" shape rather than propagating a parse error.
fn parse_sentiment_reply(title: &str, reply: &str) -> FetchOutcome {
    let parsed: SentimentReply = match serde_json::from_str(reply) {
        Ok(p) => p,
        Err(e) => {
            warn!(title, error = %e, "Sentiment reply was not JSON, treating as no data");
            return FetchOutcome::NoData;
        }
    };

    let sources: Vec<SourceCitation> = parsed
        .sources
        .into_iter()
        .filter_map(|s| {
            let url = s.url.filter(|u| !u.is_empty() && u.starts_with("http"))?;
            Some(SourceCitation {
                name: s.source_name.unwrap_or_else(|| "Unknown".to_string()),
                url,
                sentiment_label: s.sentiment.unwrap_or_else(|| "Mixed".to_string()),
                score: s.score.unwrap_or(50.0).clamp(0.0, 100.0),
            })
        })
        .collect();

    let score = parsed.overall_sentiment_score.map(|s| s.clamp(0.0, 100.0));

    // Existence for caching purposes: did we actually get usable data?
    if score.is_none() && sources.is_empty() {
        return FetchOutcome::NoData;
    }

    FetchOutcome::Fetched(ExternalSentiment {
        score,
        sources,
        summary: parsed.summary,
    })
}
