use crate::entry::ShareEntry;
use std::fmt::Write;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

pub const IDLE_LABEL: &str = "複製分享清單";
pub const BUSY_LABEL: &str = "處理中...";
pub const EMPTY_PLACEHOLDER: &str = "分享清單是空的，請先加入動畫。";

/// Visibility and busy state of the export button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportTrigger {
    pub visible: bool,
    pub busy: bool,
}

impl ExportTrigger {
    pub fn enabled(&self) -> bool {
        self.visible && !self.busy
    }

    pub fn label(&self) -> &'static str {
        if self.busy {
            BUSY_LABEL
        } else {
            IDLE_LABEL
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCard {
    pub name: String,
    pub image_url: Option<String>,
    pub premiere_date: String,
    pub premiere_time: String,
    pub story_preview: String,
}

impl From<&ShareEntry> for RenderedCard {
    fn from(entry: &ShareEntry) -> Self {
        RenderedCard {
            name: entry.name.clone(),
            image_url: entry.image_url.clone(),
            premiere_date: entry.premiere_date.clone(),
            premiere_time: entry.premiere_time.clone(),
            story_preview: entry.story_preview(),
        }
    }
}

/// Snapshot of the share list region as last rendered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedList {
    pub cards: Vec<RenderedCard>,
    pub trigger: ExportTrigger,
}

impl RenderedList {
    pub fn project(entries: &[ShareEntry], trigger: ExportTrigger) -> Self {
        RenderedList {
            cards: entries.iter().map(RenderedCard::from).collect(),
            trigger: ExportTrigger {
                visible: !entries.is_empty(),
                ..trigger
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Receives every full re-render of the share list.
pub trait ListView: Send {
    fn render(&mut self, rendered: &RenderedList);

    /// Called when only the export trigger changed.
    fn update_trigger(&mut self, _trigger: &ExportTrigger) {}
}

/// Lets a caller keep a handle on a view that the list manager drives.
impl<V: ListView> ListView for Arc<Mutex<V>> {
    fn render(&mut self, rendered: &RenderedList) {
        self.lock().unwrap_or_else(PoisonError::into_inner).render(rendered);
    }

    fn update_trigger(&mut self, trigger: &ExportTrigger) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update_trigger(trigger);
    }
}

/// Renders the share list as HTML markup.
#[derive(Debug, Default)]
pub struct HtmlListView {
    list_html: String,
    trigger_html: String,
}

impl HtmlListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_html(&self) -> &str {
        &self.list_html
    }

    pub fn trigger_html(&self) -> &str {
        &self.trigger_html
    }

    pub fn document(&self) -> String {
        format!(
            "<div id=\"shareList\">\n{}</div>\n{}\n",
            self.list_html, self.trigger_html
        )
    }
}

impl ListView for HtmlListView {
    fn render(&mut self, rendered: &RenderedList) {
        trace!("Rendering {} cards as HTML", rendered.cards.len());
        self.list_html = render_cards(rendered);
        self.update_trigger(&rendered.trigger);
    }

    fn update_trigger(&mut self, trigger: &ExportTrigger) {
        self.trigger_html = format!(
            "<button id=\"copyButton\"{}{}>{}</button>",
            if trigger.visible { "" } else { " style=\"display:none\"" },
            if trigger.enabled() { "" } else { " disabled" },
            trigger.label()
        );
    }
}

fn render_cards(rendered: &RenderedList) -> String {
    if rendered.is_empty() {
        return format!("<p class=\"share-empty\">{}</p>\n", EMPTY_PLACEHOLDER);
    }

    let mut html = String::new();
    for (index, card) in rendered.cards.iter().enumerate() {
        let name = escape_html(&card.name);
        let image = match &card.image_url {
            Some(url) => format!(
                "<img src=\"{}\" alt=\"{}\" crossorigin=\"anonymous\" width=\"300\" height=\"300\">",
                escape_html(url),
                name
            ),
            None => "<div class=\"share-card-noimage\"></div>".to_string(),
        };
        // write! into a String cannot fail
        let _ = write!(
            html,
            concat!(
                "<div class=\"share-card\" data-index=\"{index}\">\n",
                "  <div class=\"share-card-image\">{image}</div>\n",
                "  <div class=\"share-card-body\">\n",
                "    <h5 class=\"card-title\" data-anime-name=\"{name}\">{name}</h5>\n",
                "    <p class=\"card-text\">首播日期：{date}<br>首播時間：{time}</p>\n",
                "    <p class=\"card-story\">{story}</p>\n",
                "    <button class=\"remove-from-sharelist\" data-index=\"{index}\">移除</button>\n",
                "  </div>\n",
                "</div>\n"
            ),
            index = index,
            image = image,
            name = name,
            date = escape_html(&card.premiere_date),
            time = escape_html(&card.premiere_time),
            story = escape_html(&card.story_preview),
        );
    }
    html
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
