use crate::config::STORY_PREVIEW_CHARS;
use crate::errors::ShareError;
use serde::{Deserialize, Serialize};
use tracing::trace;

const DATE_LABEL: &str = "首播日期：";
const TIME_LABEL: &str = "首播時間：";

/// Positions of the date and time text nodes inside a card's info block.
/// The node between them is the line break.
const DATE_FRAGMENT: usize = 0;
const TIME_FRAGMENT: usize = 2;

/// One anime record captured into the share list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEntry {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub premiere_date: String,
    #[serde(default)]
    pub premiere_time: String,
    #[serde(default)]
    pub story: String,
}

/// Raw fields as read off a displayed card.
#[derive(Debug, Clone, Default)]
pub struct CardData {
    pub title_text: String,
    /// Explicit name override carried on the title element.
    pub title_attr: Option<String>,
    pub image_src: Option<String>,
    /// Text nodes of the info block, in document order.
    pub info_fragments: Vec<String>,
    pub story: String,
}

impl ShareEntry {
    pub fn new(
        name: impl Into<String>,
        image_url: Option<String>,
        premiere_date: impl Into<String>,
        premiere_time: impl Into<String>,
        story: impl Into<String>,
    ) -> Result<Self, ShareError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ShareError::InvalidEntry("name must not be empty".to_string()));
        }
        Ok(ShareEntry {
            name,
            image_url,
            premiere_date: premiere_date.into(),
            premiere_time: premiere_time.into(),
            story: story.into(),
        })
    }

    /// Builds an entry from card data. Missing fragments become empty strings.
    pub fn from_card(card: &CardData) -> Result<Self, ShareError> {
        let name = card
            .title_attr
            .as_deref()
            .filter(|attr| !attr.trim().is_empty())
            .unwrap_or(card.title_text.as_str())
            .trim()
            .to_string();

        let premiere_date = fragment(&card.info_fragments, DATE_FRAGMENT, DATE_LABEL);
        let premiere_time = fragment(&card.info_fragments, TIME_FRAGMENT, TIME_LABEL);
        trace!(
            "Card {} parsed with date '{}' and time '{}'",
            name,
            premiere_date,
            premiere_time
        );

        let image_url = card
            .image_src
            .as_ref()
            .map(|src| src.trim().to_string())
            .filter(|src| !src.is_empty());

        ShareEntry::new(name, image_url, premiere_date, premiere_time, card.story.trim())
    }

    pub fn story_preview(&self) -> String {
        story_preview(&self.story)
    }

    /// Plain-text rendering used for the text clipboard fallback.
    pub fn to_text(&self) -> String {
        format!(
            "{}\n{}{} {}{}\n{}",
            self.name, DATE_LABEL, self.premiere_date, TIME_LABEL, self.premiere_time, self.story
        )
    }
}

fn fragment(fragments: &[String], index: usize, label: &str) -> String {
    fragments
        .get(index)
        .map(|text| text.replace(label, "").trim().to_string())
        .unwrap_or_default()
}

/// Truncates to the first 100 characters, marking the cut with an ellipsis.
pub fn story_preview(story: &str) -> String {
    if story.chars().count() <= STORY_PREVIEW_CHARS {
        return story.to_string();
    }
    let mut preview: String = story.chars().take(STORY_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

/// Every entry's text rendering, separated by blank lines.
pub fn flatten_entries(entries: &[ShareEntry]) -> String {
    entries
        .iter()
        .map(ShareEntry::to_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}
