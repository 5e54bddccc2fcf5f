//! Text rendering of gallery cards and the progress bar.

use chrono::{DateTime, Local};
use sora_core::{GradientDescriptor, VideoRecord};

/// Everything a gallery card shows for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCard {
    pub id: String,
    pub prompt: String,
    pub overlay_text: String,
    pub colors: [String; 2],
    pub background: String,
    pub date: String,
    pub time: String,
}

impl VideoCard {
    pub fn from_record(record: &VideoRecord) -> Self {
        let descriptor = GradientDescriptor::for_record(record);
        let local: DateTime<Local> = record.created_at.with_timezone(&Local);
        Self {
            id: record.id.clone(),
            prompt: record.prompt.clone(),
            background: descriptor.css_background(),
            overlay_text: descriptor.text,
            colors: descriptor.colors,
            date: local.format("%Y-%m-%d").to_string(),
            time: local.format("%H:%M:%S").to_string(),
        }
    }

    /// One-line listing: `<id>  <date> <time>  [c0 → c1]  <prompt>`.
    pub fn summary(&self) -> String {
        format!(
            "{}  {} {}  [{} → {}]  {}",
            self.id,
            self.date,
            self.time,
            self.colors[0],
            self.colors[1],
            single_line(&self.prompt, 60)
        )
    }

    /// Multi-line detail view.
    pub fn detail(&self) -> String {
        format!(
            "id:         {}\ncreated:    {} {}\nprompt:     {}\noverlay:    {}\nbackground: {}",
            self.id, self.date, self.time, self.prompt, self.overlay_text, self.background
        )
    }
}

/// Gallery headline, e.g. `3 videos generated`.
pub fn gallery_headline(count: usize) -> String {
    match count {
        1 => "1 video generated".to_string(),
        n => format!("{} videos generated", n),
    }
}

/// `[██████░░░░]  60%` style bar, percent rounded to the nearest integer.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    format!(
        "[{}{}] {:>3}%",
        "█".repeat(filled),
        "░".repeat(width.saturating_sub(filled)),
        clamped.round() as u32
    )
}

fn single_line(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
