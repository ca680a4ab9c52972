/// Result presentation
///
/// Pure shaping of recommendations into render-ready card view models. No I/O
/// happens here; image fallback is decided by the state carried on the card.
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::services::session::{ImageState, ResultCard};

/// Placeholder shown when the model's image URL turned out to be dead.
pub const FALLBACK_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1592945403244-b3fbafd7f539?q=80&w=1000&auto=format&fit=crop";

/// Label rendered on a fallen-back card.
pub const NO_IMAGE_LABEL: &str = "تصویر یافت نشد";

/// One run of story text: either literal or strongly emphasized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorySegment {
    pub text: String,
    pub emphasized: bool,
}

impl StorySegment {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasized: false,
        }
    }

    pub fn emphasized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasized: true,
        }
    }
}

fn emphasis_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("emphasis pattern is valid"))
}

/// Splits a story on `**...**` markers into ordered literal/emphasized runs,
/// stripping the markers. Text without markers comes back as one literal
/// segment equal to the input. Adjacent markers produce no empty literals.
pub fn split_story(story: &str) -> Vec<StorySegment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for capture in emphasis_regex().captures_iter(story) {
        // Capture 0 always exists for a match.
        let whole = match capture.get(0) {
            Some(m) => m,
            None => continue,
        };

        if whole.start() > cursor {
            segments.push(StorySegment::literal(&story[cursor..whole.start()]));
        }
        if let Some(inner) = capture.get(1) {
            segments.push(StorySegment::emphasized(inner.as_str()));
        }
        cursor = whole.end();
    }

    if cursor < story.len() || segments.is_empty() {
        segments.push(StorySegment::literal(&story[cursor..]));
    }

    segments
}

/// Image portion of a card: the effective URL plus whether the card has
/// fallen back to the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardImageView {
    pub url: String,
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Render-ready view of one recommendation card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub index: usize,
    pub name: String,
    pub brand: String,
    pub scent_profile: Vec<String>,
    pub story: Vec<StorySegment>,
    pub image: CardImageView,
}

/// Pure function of one card to its view model. Cards are independent; one
/// card's fallback never leaks into another.
pub fn card_view(index: usize, card: &ResultCard) -> CardView {
    let rec = &card.recommendation;

    let image = match card.image {
        ImageState::Primary => CardImageView {
            url: rec.image_url.clone(),
            is_fallback: false,
            label: None,
        },
        ImageState::Fallback => CardImageView {
            url: FALLBACK_IMAGE_URL.to_string(),
            is_fallback: true,
            label: Some(NO_IMAGE_LABEL.to_string()),
        },
    };

    CardView {
        index,
        name: rec.name.clone(),
        brand: rec.brand.clone(),
        scent_profile: rec.scent_profile.clone(),
        story: split_story(&rec.story),
        image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PerfumeRecommendation;

    fn card_with(story: &str, image: ImageState) -> ResultCard {
        let mut card = ResultCard {
            recommendation: PerfumeRecommendation {
                name: "L'Eau d'Issey".to_string(),
                brand: "Issey Miyake".to_string(),
                scent_profile: vec!["نیلوفر".to_string(), "خیار".to_string(), "مشک".to_string()],
                story: story.to_string(),
                image_url: "https://fimgs.net/mdimg/perfume/375x500.62.jpg".to_string(),
            },
            image: ImageState::Primary,
        };
        if image == ImageState::Fallback {
            card.mark_image_failed();
        }
        card
    }

    #[test]
    fn test_split_story_alternating_segments() {
        let segments = split_story("intro **bold1** middle **bold2** end");
        assert_eq!(
            segments,
            vec![
                StorySegment::literal("intro "),
                StorySegment::emphasized("bold1"),
                StorySegment::literal(" middle "),
                StorySegment::emphasized("bold2"),
                StorySegment::literal(" end"),
            ]
        );
    }

    #[test]
    fn test_split_story_without_markers() {
        let segments = split_story("رایحه‌ای آرام و گرم");
        assert_eq!(segments, vec![StorySegment::literal("رایحه‌ای آرام و گرم")]);
    }

    #[test]
    fn test_split_story_empty_input() {
        assert_eq!(split_story(""), vec![StorySegment::literal("")]);
    }

    #[test]
    fn test_split_story_marker_at_edges() {
        let segments = split_story("**آغاز** میانه **پایان**");
        assert_eq!(
            segments,
            vec![
                StorySegment::emphasized("آغاز"),
                StorySegment::literal(" میانه "),
                StorySegment::emphasized("پایان"),
            ]
        );
    }

    #[test]
    fn test_split_story_adjacent_markers_no_empty_literals() {
        let segments = split_story("**یاس****وانیل**");
        assert_eq!(
            segments,
            vec![
                StorySegment::emphasized("یاس"),
                StorySegment::emphasized("وانیل"),
            ]
        );
    }

    #[test]
    fn test_unclosed_marker_stays_literal() {
        let segments = split_story("a **b");
        assert_eq!(segments, vec![StorySegment::literal("a **b")]);
    }

    #[test]
    fn test_card_view_primary_image() {
        let card = card_with("با **نیلوفر** و مشک", ImageState::Primary);
        let view = card_view(0, &card);

        assert_eq!(view.brand, "Issey Miyake");
        assert_eq!(view.scent_profile.len(), 3);
        assert_eq!(view.image.url, card.recommendation.image_url);
        assert!(!view.image.is_fallback);
        assert!(view.image.label.is_none());
        assert_eq!(view.story[1], StorySegment::emphasized("نیلوفر"));
    }

    #[test]
    fn test_card_view_fallback_image() {
        let card = card_with("داستان", ImageState::Fallback);
        let view = card_view(2, &card);

        assert_eq!(view.index, 2);
        assert_eq!(view.image.url, FALLBACK_IMAGE_URL);
        assert!(view.image.is_fallback);
        assert_eq!(view.image.label.as_deref(), Some(NO_IMAGE_LABEL));
    }
}
