use crate::core::catalog::{self, DEFAULT_PAGE_COUNT};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChapterSpec {
    pub id: String,
    /// Stored as a string (`"10"`) in saved works, numbers accepted on read.
    #[serde(
        rename = "pages",
        serialize_with = "pages_to_string",
        deserialize_with = "pages_from_any"
    )]
    pub requested_page_count: u32,
}

fn pages_to_string<S: Serializer>(pages: &u32, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&pages.to_string())
}

fn pages_from_any<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Pages {
        Number(u32),
        Text(String),
    }
    match Pages::deserialize(d)? {
        Pages::Number(n) => Ok(n),
        Pages::Text(t) => t.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Everything the user declared about the story before generation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoryParameters {
    pub title: String,
    pub chapter_settings: Vec<ChapterSpec>,
    pub genre: String,
    pub sub_genre: String,
    pub tone: String,
    pub target_audience: String,
    /// Free-text premise.
    pub base_idea: String,
    pub plot_keywords: Vec<String>,
    pub main_themes: Vec<String>,
    pub characters: Vec<Character>,
    pub art_style: String,
    pub visual_mood: String,
}

impl StoryParameters {
    /// Form defaults: one 10-page chapter, one blank character, first entry of each list.
    pub fn new_draft() -> Self {
        let (genre, subs) = catalog::GENRES[0];
        Self {
            title: String::new(),
            chapter_settings: vec![ChapterSpec::new(DEFAULT_PAGE_COUNT)],
            genre: genre.to_string(),
            sub_genre: subs[0].to_string(),
            tone: catalog::TONES[0].to_string(),
            target_audience: catalog::TARGET_AUDIENCES[0].to_string(),
            base_idea: String::new(),
            plot_keywords: Vec::new(),
            main_themes: Vec::new(),
            characters: vec![Character::new("", "")],
            art_style: catalog::ART_STYLES[0].to_string(),
            visual_mood: catalog::VISUAL_MOODS[0].to_string(),
        }
    }

    /// Switching genre resets the sub-genre to the genre's first one.
    pub fn set_genre(&mut self, genre: &str) {
        self.genre = genre.to_string();
        if let Some(subs) = catalog::sub_genres(genre) {
            self.sub_genre = subs[0].to_string();
        }
    }

    /// Returns false when the keyword was empty or already present.
    pub fn add_keyword(&mut self, raw: &str) -> bool {
        let keyword = raw.trim();
        let keyword = keyword.strip_suffix(',').unwrap_or(keyword).trim();
        if keyword.is_empty() || self.plot_keywords.iter().any(|k| k == keyword) {
            return false;
        }
        self.plot_keywords.push(keyword.to_string());
        true
    }

    pub fn remove_keyword(&mut self, keyword: &str) {
        self.plot_keywords.retain(|k| k != keyword);
    }

    /// Ignores themes outside the fixed vocabulary.
    pub fn toggle_theme(&mut self, theme: &str) {
        if !catalog::is_theme(theme) {
            return;
        }
        if let Some(pos) = self.main_themes.iter().position(|t| t == theme) {
            self.main_themes.remove(pos);
        } else {
            self.main_themes.push(theme.to_string());
        }
    }

    pub fn add_chapter(&mut self, pages: u32) -> &ChapterSpec {
        self.chapter_settings.push(ChapterSpec::new(pages));
        &self.chapter_settings[self.chapter_settings.len() - 1]
    }

    /// The last chapter cannot be removed.
    pub fn remove_chapter(&mut self, id: &str) -> bool {
        if self.chapter_settings.len() <= 1 {
            return false;
        }
        let before = self.chapter_settings.len();
        self.chapter_settings.retain(|c| c.id != id);
        before != self.chapter_settings.len()
    }

    pub fn add_character(&mut self, name: &str, description: &str) -> &Character {
        self.characters.push(Character::new(name, description));
        &self.characters[self.characters.len() - 1]
    }

    /// The last character cannot be removed.
    pub fn remove_character(&mut self, id: &str) -> bool {
        if self.characters.len() <= 1 {
            return false;
        }
        let before = self.characters.len();
        self.characters.retain(|c| c.id != id);
        before != self.characters.len()
    }

    /// Problems a form should fix before submitting. Empty when acceptable.
    pub fn check(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.chapter_settings.is_empty() {
            problems.push("Au moins un chapitre est requis.".to_string());
        }
        if self.characters.is_empty() {
            problems.push("Au moins un personnage est requis.".to_string());
        }
        match catalog::sub_genres(&self.genre) {
            Some(subs) if !subs.contains(&self.sub_genre.as_str()) => problems.push(format!(
                "Le sous-genre « {} » n'appartient pas au genre « {} ».",
                self.sub_genre, self.genre
            )),
            Some(_) => {}
            None => problems.push(format!("Genre inconnu : « {} ».", self.genre)),
        }
        problems
    }
}

impl ChapterSpec {
    pub fn new(pages: u32) -> Self {
        Self {
            id: new_id(),
            requested_page_count: pages,
        }
    }
}

impl Character {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

// --- Script ---

// Generated payloads are loosely typed: null or missing text reads as "",
// numbers may arrive as floats or strings, null lists read as empty.

fn text_or_null<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn list_or_null<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

fn number_from_any<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Integer(u64),
        Float(f64),
        Text(String),
    }
    let value = match Option::<Number>::deserialize(d)? {
        None => 0.0,
        Some(Number::Integer(n)) => n as f64,
        Some(Number::Float(f)) => f,
        Some(Number::Text(t)) => t.trim().parse().unwrap_or(0.0),
    };
    // Saturating cast: negatives become 0.
    Ok(value.round() as u32)
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Dialogue {
    #[serde(default, deserialize_with = "text_or_null")]
    pub character: String,
    #[serde(default, rename = "dialogue", deserialize_with = "text_or_null")]
    pub line: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    #[serde(default, deserialize_with = "number_from_any")]
    pub panel_number: u32,
    #[serde(default, deserialize_with = "text_or_null")]
    pub description: String,
    #[serde(default, deserialize_with = "list_or_null")]
    pub dialogues: Vec<Dialogue>,
    /// Empty string when absent.
    #[serde(default, deserialize_with = "text_or_null")]
    pub narration: String,
    /// Empty string when absent.
    #[serde(default, deserialize_with = "text_or_null")]
    pub onomatopoeia: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default, deserialize_with = "number_from_any")]
    pub page_number: u32,
    #[serde(default, deserialize_with = "list_or_null")]
    pub panels: Vec<Panel>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    #[serde(default, deserialize_with = "text_or_null")]
    pub chapter_title: String,
    #[serde(default, deserialize_with = "list_or_null")]
    pub pages: Vec<Page>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Script {
    pub title: String,
    pub chapters: Vec<Chapter>,
}

impl Script {
    /// Copy keeping chapters `0..=index` (all of them when out of range).
    pub fn truncated_through(&self, index: usize) -> Script {
        let keep = index.saturating_add(1).min(self.chapters.len());
        Script {
            title: self.title.clone(),
            chapters: self.chapters[..keep].to_vec(),
        }
    }
}

// --- Saved works ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedWork {
    pub id: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub form_data: StoryParameters,
    pub summary: String,
    pub script: Script,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_accepts_string_and_number() {
        let from_text: ChapterSpec = serde_json::from_str(r#"{"id":"a","pages":"15"}"#).unwrap();
        let from_number: ChapterSpec = serde_json::from_str(r#"{"id":"b","pages":5}"#).unwrap();
        assert_eq!(from_text.requested_page_count, 15);
        assert_eq!(from_number.requested_page_count, 5);

        let json = serde_json::to_value(&from_number).unwrap();
        assert_eq!(json["pages"], "5");
    }

    #[test]
    fn test_keywords_are_unique_and_ordered() {
        let mut params = StoryParameters::new_draft();
        assert!(params.add_keyword(" trésor, "));
        assert!(params.add_keyword("trahison"));
        assert!(!params.add_keyword("trésor"));
        assert!(!params.add_keyword("   "));
        assert_eq!(params.plot_keywords, vec!["trésor", "trahison"]);

        params.remove_keyword("trésor");
        assert_eq!(params.plot_keywords, vec!["trahison"]);
    }

    #[test]
    fn test_toggle_theme_only_from_vocabulary() {
        let mut params = StoryParameters::new_draft();
        params.toggle_theme("Justice");
        params.toggle_theme("Cuisine");
        assert_eq!(params.main_themes, vec!["Justice"]);
        params.toggle_theme("Justice");
        assert!(params.main_themes.is_empty());
    }

    #[test]
    fn test_last_chapter_and_character_are_kept() {
        let mut params = StoryParameters::new_draft();
        let only_chapter = params.chapter_settings[0].id.clone();
        let only_character = params.characters[0].id.clone();
        assert!(!params.remove_chapter(&only_chapter));
        assert!(!params.remove_character(&only_character));

        let second = params.add_chapter(5).id.clone();
        assert!(params.remove_chapter(&only_chapter));
        assert_eq!(params.chapter_settings[0].id, second);
    }

    #[test]
    fn test_check_reports_problems() {
        let mut params = StoryParameters::new_draft();
        assert!(params.check().is_empty());

        params.set_genre("Western");
        assert_eq!(params.sub_genre, "Classique");
        params.sub_genre = "Cyberpunk".to_string();
        params.chapter_settings.clear();
        params.characters.clear();
        assert_eq!(params.check().len(), 3);
    }

    #[test]
    fn test_panel_missing_optional_fields_default_to_empty() {
        let panel: Panel =
            serde_json::from_str(r#"{"panelNumber":2,"description":"Une rue","dialogues":[]}"#)
                .unwrap();
        assert_eq!(panel.narration, "");
        assert_eq!(panel.onomatopoeia, "");

        let json = serde_json::to_value(&panel).unwrap();
        assert_eq!(json["narration"], "");
        assert_eq!(json["panelNumber"], 2);
    }

    #[test]
    fn test_truncated_through_keeps_chosen_chapter() {
        let script = Script {
            title: "T".to_string(),
            chapters: vec![Chapter::default(), Chapter::default(), Chapter::default()],
        };
        assert_eq!(script.truncated_through(0).chapters.len(), 1);
        assert_eq!(script.truncated_through(1).chapters.len(), 2);
        assert_eq!(script.truncated_through(9).chapters.len(), 3);
        assert_eq!(script.truncated_through(usize::MAX).chapters.len(), 3);
    }

    #[test]
    fn test_loose_panel_values_are_accepted() {
        let page: Page = serde_json::from_str(
            r#"{
                "pageNumber": 1.0,
                "panels": [
                    {"panelNumber": "2", "description": null, "dialogues": null,
                     "narration": null, "onomatopoeia": "BAM"},
                    {"panelNumber": null, "dialogues": [{"character": "Léa", "dialogue": null}]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(page.page_number, 1);
        assert_eq!(page.panels[0].panel_number, 2);
        assert_eq!(page.panels[0].description, "");
        assert!(page.panels[0].dialogues.is_empty());
        assert_eq!(page.panels[0].narration, "");
        assert_eq!(page.panels[0].onomatopoeia, "BAM");
        assert_eq!(page.panels[1].panel_number, 0);
        assert_eq!(page.panels[1].dialogues[0].line, "");
    }
}
