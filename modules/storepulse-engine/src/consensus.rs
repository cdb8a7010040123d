use storepulse_common::{CatalogItem, ConsensusResult};

/// Agreement band between local and external sentiment. Boundaries are
/// left-closed: a divergence of exactly 10.0 falls in the second band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergenceBand {
    StrongConsensus,
    GeneralAgreement,
    ModerateDivergence,
    SignificantDivergence,
}

impl DivergenceBand {
    pub fn classify(divergence: f64) -> Self {
        if divergence < 10.0 {
            DivergenceBand::StrongConsensus
        } else if divergence < 20.0 {
            DivergenceBand::GeneralAgreement
        } else if divergence < 30.0 {
            DivergenceBand::ModerateDivergence
        } else {
            DivergenceBand::SignificantDivergence
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DivergenceBand::StrongConsensus => "strong consensus",
            DivergenceBand::GeneralAgreement => "general agreement",
            DivergenceBand::ModerateDivergence => "moderate divergence",
            DivergenceBand::SignificantDivergence => "significant divergence",
        }
    }

    fn explanation(&self) -> &'static str {
        match self {
            DivergenceBand::StrongConsensus => "Local and global opinions align closely.",
            DivergenceBand::GeneralAgreement => {
                "Minor variance between local buyers and web critics."
            }
            DivergenceBand::ModerateDivergence => {
                "Notable difference in opinions between local buyers and web critics."
            }
            DivergenceBand::SignificantDivergence => {
                "Local buyers have a markedly different opinion than web critics."
            }
        }
    }
}

/// Combine the item's current (possibly just-refreshed) sentiment state
/// into the externally visible consensus payload. Always runs,
/// regardless of which sources were refreshed.
pub fn synthesize(item: &CatalogItem, review_count: usize, average_rating: f64) -> ConsensusResult {
    let divergence = match (item.local_score, item.global_score) {
        (Some(local), Some(global)) => Some((local - global).abs()),
        _ => None,
    };

    let verdict = render_verdict(item, review_count);

    ConsensusResult {
        local_score: item.local_score,
        global_score: item.global_score,
        divergence,
        verdict,
        sources: item.external_sources.clone(),
        local_review_count: review_count,
        local_average_rating: average_rating,
        exists_externally: item.exists_externally,
    }
}

fn render_verdict(item: &CatalogItem, review_count: usize) -> String {
    let title = &item.title;
    let source_count = item.external_sources.len();

    if !item.exists_externally {
        let local_part = match item.local_score {
            Some(local) => format!(
                "Local buyers have rated it {local:.1}/100 based on {review_count} reviews."
            ),
            None => "No reviews yet.".to_string(),
        };
        return format!(
            "{title} is not found in major external gaming databases. \
             This appears to be an exclusive or indie title available only on this store. \
             {local_part}"
        );
    }

    match (item.local_score, item.global_score) {
        (None, None) => format!("Insufficient data to generate a consensus for {title}."),
        (None, Some(global)) => format!(
            "Based on {source_count} external sources, {title} has a web sentiment score of \
             {global:.1}/100. No local reviews yet - be the first to share your experience!"
        ),
        (Some(local), None) => format!(
            "Local buyers rate {title} at {local:.1}/100 ({review_count} reviews). \
             External data unavailable for comparison."
        ),
        (Some(local), Some(global)) => {
            let band = DivergenceBand::classify((local - global).abs());

            let direction = if local > global {
                "Local buyers rate this title MORE FAVORABLY than web critics"
            } else if local < global {
                "Web critics rate this title MORE FAVORABLY than local buyers"
            } else {
                "Local and web sentiments are perfectly aligned"
            };

            format!(
                "**{}**: {title} scores {local:.1}/100 locally ({review_count} reviews) vs. \
                 {global:.1}/100 globally ({source_count} sources). {direction}. {}",
                band.label().to_uppercase(),
                band.explanation(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storepulse_common::SourceCitation;
    use uuid::Uuid;

    fn item(local: Option<f64>, global: Option<f64>, exists: bool) -> CatalogItem {
        let mut item = CatalogItem::new(Uuid::new_v4(), "Starfall");
        item.local_score = local;
        item.global_score = global;
        item.exists_externally = exists;
        item
    }

    fn citation(url: &str) -> SourceCitation {
        SourceCitation {
            name: "IGN".to_string(),
            url: url.to_string(),
            sentiment_label: "Positive".to_string(),
            score: 70.0,
        }
    }

    #[test]
    fn band_boundaries_are_left_closed() {
        assert_eq!(
            DivergenceBand::classify(9.99),
            DivergenceBand::StrongConsensus
        );
        assert_eq!(
            DivergenceBand::classify(10.0),
            DivergenceBand::GeneralAgreement
        );
        assert_eq!(
            DivergenceBand::classify(19.99),
            DivergenceBand::GeneralAgreement
        );
        assert_eq!(
            DivergenceBand::classify(20.0),
            DivergenceBand::ModerateDivergence
        );
        assert_eq!(
            DivergenceBand::classify(29.99),
            DivergenceBand::ModerateDivergence
        );
        assert_eq!(
            DivergenceBand::classify(30.0),
            DivergenceBand::SignificantDivergence
        );
        assert_eq!(
            DivergenceBand::classify(0.0),
            DivergenceBand::StrongConsensus
        );
    }

    #[test]
    fn divergence_is_exact_absolute_difference() {
        let result = synthesize(&item(Some(90.0), Some(70.0), true), 4, 4.5);
        assert_eq!(result.divergence, Some(20.0));
    }

    #[test]
    fn worked_example_moderate_divergence_favoring_buyers() {
        let mut it = item(Some(90.0), Some(70.0), true);
        it.external_sources = vec![citation("https://a"), citation("https://b")];
        let result = synthesize(&it, 4, 4.5);

        assert_eq!(result.divergence, Some(20.0));
        assert_eq!(result.local_average_rating, 4.5);
        assert!(result.verdict.contains("MODERATE DIVERGENCE"));
        assert!(result.verdict.contains("90.0/100"));
        assert!(result.verdict.contains("70.0/100"));
        assert!(result.verdict.contains("4 reviews"));
        assert!(result.verdict.contains("2 sources"));
        assert!(result
            .verdict
            .contains("Local buyers rate this title MORE FAVORABLY than web critics"));
    }

    #[test]
    fn equal_scores_read_as_perfectly_aligned() {
        let result = synthesize(&item(Some(80.0), Some(80.0), true), 3, 4.0);
        assert_eq!(result.divergence, Some(0.0));
        assert!(result.verdict.contains("STRONG CONSENSUS"));
        assert!(result.verdict.contains("perfectly aligned"));
    }

    #[test]
    fn exclusive_title_without_reviews_mentions_no_reviews_yet() {
        let result = synthesize(&item(None, None, false), 0, 0.0);
        assert!(result.verdict.contains("No reviews yet."));
        assert!(result.verdict.contains("exclusive"));
        assert!(!result.verdict.contains("/100"));
        assert_eq!(result.divergence, None);
    }

    #[test]
    fn exclusive_title_with_reviews_reports_local_rating() {
        let result = synthesize(&item(Some(84.0), None, false), 7, 4.2);
        assert!(result.verdict.contains("84.0/100"));
        assert!(result.verdict.contains("7 reviews"));
    }

    #[test]
    fn both_missing_is_insufficient_data() {
        let result = synthesize(&item(None, None, true), 0, 0.0);
        assert!(result.verdict.contains("Insufficient data"));
    }

    #[test]
    fn global_only_invites_first_review() {
        let mut it = item(None, Some(72.5), true);
        it.external_sources = vec![citation("https://a")];
        let result = synthesize(&it, 0, 0.0);
        assert!(result.verdict.contains("72.5/100"));
        assert!(result.verdict.contains("be the first"));
    }

    #[test]
    fn local_only_notes_external_unavailable() {
        let result = synthesize(&item(Some(55.0), None, true), 2, 2.75);
        assert!(result.verdict.contains("55.0/100"));
        assert!(result.verdict.contains("External data unavailable"));
    }
}
