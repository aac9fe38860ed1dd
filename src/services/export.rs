use crate::core::state::Script;
use std::fmt::Write;

const BANNER: &str = "--------------------------------------";

/// Line-oriented rendering of a script for the TXT export.
pub fn format_script(script: &Script) -> String {
    let mut text = String::new();
    // Writing into a String cannot fail.
    let _ = write_script(&mut text, script);
    text
}

fn write_script(out: &mut String, script: &Script) -> std::fmt::Result {
    write!(out, "Titre de la BD: {}\n\n", script.title)?;
    for (index, chapter) in script.chapters.iter().enumerate() {
        writeln!(out, "{}", BANNER)?;
        writeln!(out, "Chapitre {}: {}", index + 1, chapter.chapter_title)?;
        write!(out, "{}\n\n", BANNER)?;
        for page in &chapter.pages {
            write!(out, "Page {}\n\n", page.page_number)?;
            for panel in &page.panels {
                writeln!(out, "Case {}", panel.panel_number)?;
                writeln!(out, "Description: {}", panel.description)?;
                if !panel.narration.is_empty() {
                    writeln!(out, "Narrateur (cartouche): \"{}\"", panel.narration)?;
                }
                for dialogue in &panel.dialogues {
                    writeln!(out, "{}: \"{}\"", dialogue.character, dialogue.line)?;
                }
                if !panel.onomatopoeia.is_empty() {
                    writeln!(out, "Onomatopée: {}", panel.onomatopoeia)?;
                }
                out.push('\n');
            }
        }
    }
    Ok(())
}

/// `Mon titre` -> `Mon_titre_script.txt`.
pub fn export_file_name(script: &Script) -> String {
    let stem = script.title.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{}_script.txt", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::script::assemble_full;
    use serde_json::json;

    #[test]
    fn test_export_layout() {
        let script = assemble_full(&json!({
            "title": "La Nuit",
            "chapters": [{
                "chapterTitle": "Réveil",
                "pages": [{
                    "pageNumber": 1,
                    "panels": [
                        {
                            "panelNumber": 1,
                            "description": "Une chambre sombre.",
                            "dialogues": [{ "character": "Léa", "dialogue": "Qui est là ?" }],
                            "narration": "Minuit.",
                            "onomatopoeia": "TOC"
                        },
                        {
                            "panelNumber": 2,
                            "description": "La porte s'ouvre.",
                            "dialogues": [],
                            "narration": "",
                            "onomatopoeia": ""
                        }
                    ]
                }]
            }]
        }))
        .unwrap();

        let expected = "Titre de la BD: La Nuit\n\n\
            --------------------------------------\n\
            Chapitre 1: Réveil\n\
            --------------------------------------\n\n\
            Page 1\n\n\
            Case 1\n\
            Description: Une chambre sombre.\n\
            Narrateur (cartouche): \"Minuit.\"\n\
            Léa: \"Qui est là ?\"\n\
            Onomatopée: TOC\n\
            \n\
            Case 2\n\
            Description: La porte s'ouvre.\n\
            \n";
        assert_eq!(format_script(&script), expected);
    }

    #[test]
    fn test_export_contains_every_text_verbatim() {
        let chapters: Vec<_> = (1..=3)
            .map(|c| {
                json!({
                    "chapterTitle": format!("Chapitre numéro {}", c),
                    "pages": (1..=2).map(|p| json!({
                        "pageNumber": p,
                        "panels": [{
                            "panelNumber": 1,
                            "description": format!("Décor {}-{}", c, p),
                            "dialogues": [
                                { "character": "A", "dialogue": format!("Réplique {}-{} a", c, p) },
                                { "character": "B", "dialogue": format!("Réplique {}-{} b", c, p) }
                            ],
                            "narration": "",
                            "onomatopoeia": ""
                        }]
                    })).collect::<Vec<_>>()
                })
            })
            .collect();
        let script = assemble_full(&json!({ "title": "Saga", "chapters": chapters })).unwrap();
        let text = format_script(&script);

        for chapter in &script.chapters {
            assert!(text.contains(&chapter.chapter_title));
            for page in &chapter.pages {
                for panel in &page.panels {
                    assert!(text.contains(&panel.description));
                    for d in &panel.dialogues {
                        assert!(text.contains(&d.line));
                    }
                }
            }
        }
    }

    #[test]
    fn test_export_file_name() {
        let script = Script {
            title: "Les  Ombres de\tLyon".to_string(),
            chapters: vec![],
        };
        assert_eq!(export_file_name(&script), "Les_Ombres_de_Lyon_script.txt");
    }
}
