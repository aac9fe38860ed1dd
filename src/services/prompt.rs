use crate::core::state::{ChapterSpec, Script, StoryParameters};
use crate::services::llm::ChatMessage;

const SUMMARY_SYSTEM_PROMPT: &str = "Tu es un assistant écrivain expert en scénario de BD.";
const SCRIPT_SYSTEM_PROMPT: &str = "Tu es un scénariste de BD qui répond exclusivement en JSON.";

const SCRIPT_SCHEMA_EXAMPLE: &str = r#"{
  "title": "Titre du script",
  "chapters": [
    {
      "chapterTitle": "Titre du chapitre",
      "pages": [
        {
          "pageNumber": 1,
          "panels": [
            {
              "panelNumber": 1,
              "description": "Description visuelle détaillée",
              "dialogues": [{ "character": "Nom", "dialogue": "Texte" }],
              "narration": "Texte narratif ou vide",
              "onomatopoeia": "BOOM! ou vide"
            }
          ]
        }
      ]
    }
  ]
}"#;

/// Script-stage request: messages to send plus which chapters they ask for.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRequest {
    pub messages: Vec<ChatMessage>,
    /// Chapters already written before this request (0 for a full script).
    pub chapter_offset: usize,
    pub chapters_requested: usize,
}

pub fn build_summary_request(params: &StoryParameters) -> Vec<ChatMessage> {
    let mut prompt = String::from(
        "Tu es un scénariste professionnel de bandes dessinées. Ta tâche est de créer un résumé captivant pour une nouvelle histoire en français, entre 100 et 200 mots. Ce résumé servira de base pour écrire le script complet plus tard. Il doit être créatif et donner envie de lire la suite.\n\n",
    );
    prompt.push_str("--- PARAMÈTRES DE L'HISTOIRE ---\n");
    prompt.push_str(&format!("Titre: {}\n", params.title));
    prompt.push_str(&format!("Genre: {} ({})\n", params.genre, params.sub_genre));
    prompt.push_str(&format!("Ton: {}\n", params.tone));
    prompt.push_str(&format!("Public Cible: {}\n", params.target_audience));
    prompt.push_str(&format!("Idée de base: {}\n", params.base_idea));
    prompt.push_str(&format!(
        "Éléments clés de l'intrigue: {}\n",
        params.plot_keywords.join(", ")
    ));
    prompt.push_str(&format!("Thèmes principaux: {}\n", params.main_themes.join(", ")));
    prompt.push_str(&format!("Personnages: {}\n", format_characters(params)));
    prompt.push_str(&format!(
        "Structure: {} chapitre(s) ({})\n",
        params.chapter_settings.len(),
        params
            .chapter_settings
            .iter()
            .map(|c| format!("{} pages", c.requested_page_count))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    prompt.push_str(&format!("Style artistique: {}\n", params.art_style));
    prompt.push_str(&format!("Ambiance visuelle: {}\n\n", params.visual_mood));
    prompt.push_str("Génère maintenant le résumé.");

    vec![
        ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
        ChatMessage::user(prompt),
    ]
}

/// Chapter specs not yet covered by `prior`.
pub fn remaining_chapters<'a>(params: &'a StoryParameters, prior: Option<&Script>) -> &'a [ChapterSpec] {
    let done = prior.map(|s| s.chapters.len()).unwrap_or(0);
    params.chapter_settings.get(done..).unwrap_or(&[])
}

/// `None` when there is nothing left to generate; such a request must never be sent.
pub fn build_script_request(
    params: &StoryParameters,
    summary: &str,
    prior: Option<&Script>,
) -> Option<StructuredRequest> {
    let to_generate = remaining_chapters(params, prior);
    if to_generate.is_empty() {
        return None;
    }
    let offset = prior.map(|s| s.chapters.len()).unwrap_or(0);

    let mut prompt = String::from(
        "Tu es un scénariste professionnel de bandes dessinées. Ta tâche est de générer un script complet et structuré en français en te basant sur le résumé approuvé ci-dessous.\n\n",
    );
    prompt.push_str("--- RÉSUMÉ APPROUVÉ DE L'HISTOIRE ---\n");
    prompt.push_str(summary);
    prompt.push_str("\n\n");

    if let Some(prior) = prior {
        // Serializing plain owned strings and numbers cannot fail.
        let context = serde_json::to_string_pretty(prior).unwrap_or_default();
        prompt.push_str(&format!(
            "Continue le script suivant à partir du chapitre {}. Voici le début de l'histoire pour te donner le contexte:\n\n{}\n\nAssure-toi que la suite est cohérente avec les événements précédents. Ne renvoie QUE les nouveaux chapitres dans \"chapters\".\n\n",
            offset + 1,
            context
        ));
    }

    prompt.push_str("--- PARAMÈTRES DE L'HISTOIRE ---\n");
    prompt.push_str(&format!("Titre: {}\n", params.title));
    prompt.push_str(&format!("Nombre de chapitres à générer: {}\n", to_generate.len()));
    prompt.push_str("Structure des chapitres:\n");
    for (i, chapter) in to_generate.iter().enumerate() {
        prompt.push_str(&format!(
            " - Chapitre {}: {} pages.\n",
            offset + i + 1,
            chapter.requested_page_count
        ));
    }
    prompt.push_str(&format!("Genre: {}\n", params.genre));
    prompt.push_str(&format!("Ton: {}\n", params.tone));
    prompt.push_str(&format!("Style artistique: {}\n", params.art_style));
    prompt.push_str(&format!("Ambiance visuelle: {}\n", params.visual_mood));
    prompt.push_str(&format!("Personnages: {}\n", format_characters(params)));

    prompt.push_str("\n--- FORMAT DE SORTIE JSON ATTENDU ---\n");
    prompt.push_str("Tu DOIS répondre UNIQUEMENT avec un objet JSON valide suivant cette structure :\n");
    prompt.push_str(SCRIPT_SCHEMA_EXAMPLE);
    prompt.push_str("\n\n--- INSTRUCTIONS IMPORTANTES ---\n");
    prompt.push_str("1. Respecte le nombre de pages par chapitre.\n");
    prompt.push_str("2. Varie le nombre de cases par page (1 à 6).\n");
    prompt.push_str("3. Ne réponds rien d'autre que l'objet JSON.\n");

    Some(StructuredRequest {
        messages: vec![
            ChatMessage::system(SCRIPT_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ],
        chapter_offset: offset,
        chapters_requested: to_generate.len(),
    })
}

fn format_characters(params: &StoryParameters) -> String {
    params
        .characters
        .iter()
        .map(|c| format!("{} ({})", c.name, c.description))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{Chapter, ChapterSpec, Character};

    fn params() -> StoryParameters {
        StoryParameters {
            title: "Les Ombres de Lyon".to_string(),
            chapter_settings: vec![
                ChapterSpec { id: "c1".to_string(), requested_page_count: 5 },
                ChapterSpec { id: "c2".to_string(), requested_page_count: 10 },
                ChapterSpec { id: "c3".to_string(), requested_page_count: 15 },
            ],
            genre: "Polar/Thriller".to_string(),
            sub_genre: "Film noir".to_string(),
            tone: "Sombre".to_string(),
            target_audience: "Adultes".to_string(),
            base_idea: "Un détective traque un voleur d'ombres.".to_string(),
            plot_keywords: vec!["ombre".to_string(), "pluie".to_string()],
            main_themes: vec!["Justice".to_string()],
            characters: vec![Character {
                id: "p1".to_string(),
                name: "Marc".to_string(),
                description: "détective fatigué".to_string(),
            }],
            art_style: "Noir et Blanc".to_string(),
            visual_mood: "Sombre et contrastée".to_string(),
        }
    }

    #[test]
    fn test_summary_request_is_deterministic_and_complete() {
        let p = params();
        let first = build_summary_request(&p);
        assert_eq!(first, build_summary_request(&p));
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].role, "system");

        let user = &first[1].content;
        for needle in [
            "Les Ombres de Lyon",
            "Polar/Thriller (Film noir)",
            "Ton: Sombre",
            "Public Cible: Adultes",
            "voleur d'ombres",
            "ombre, pluie",
            "Justice",
            "Marc (détective fatigué)",
            "3 chapitre(s) (5 pages, 10 pages, 15 pages)",
            "Noir et Blanc",
            "Sombre et contrastée",
            "entre 100 et 200 mots",
        ] {
            assert!(user.contains(needle), "missing {:?}", needle);
        }
    }

    #[test]
    fn test_full_script_request_lists_every_chapter() {
        let req = build_script_request(&params(), "Résumé.", None).unwrap();
        assert_eq!(req.chapter_offset, 0);
        assert_eq!(req.chapters_requested, 3);
        let user = &req.messages[1].content;
        assert!(user.contains(" - Chapitre 1: 5 pages."));
        assert!(user.contains(" - Chapitre 3: 15 pages."));
        assert!(!user.contains("Continue le script"));
        assert!(user.contains("\"onomatopoeia\""));
    }

    #[test]
    fn test_continuation_offsets_numbering_and_embeds_prior() {
        let prior = Script {
            title: "Les Ombres".to_string(),
            chapters: vec![Chapter {
                chapter_title: "La pluie".to_string(),
                pages: vec![],
            }],
        };
        let req = build_script_request(&params(), "Résumé.", Some(&prior)).unwrap();
        assert_eq!(req.chapter_offset, 1);
        assert_eq!(req.chapters_requested, 2);

        let user = &req.messages[1].content;
        assert!(user.contains("à partir du chapitre 2"));
        assert!(user.contains("\"chapterTitle\": \"La pluie\""));
        assert!(user.contains("Nombre de chapitres à générer: 2"));
        assert!(user.contains(" - Chapitre 2: 10 pages."));
        assert!(user.contains(" - Chapitre 3: 15 pages."));
        assert!(!user.contains(" - Chapitre 1:"));
    }

    #[test]
    fn test_no_request_when_prior_covers_all_chapters() {
        let prior = Script {
            title: "T".to_string(),
            chapters: vec![Chapter::default(); 4],
        };
        assert!(remaining_chapters(&params(), Some(&prior)).is_empty());
        assert!(build_script_request(&params(), "Résumé.", Some(&prior)).is_none());

        let mut empty = params();
        empty.chapter_settings.clear();
        assert!(build_script_request(&empty, "Résumé.", None).is_none());
    }
}
