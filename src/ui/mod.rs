//! Terminal front end. Every decision goes through the workflow; this only prompts and prints.

use crate::core::catalog;
use crate::core::config::Config;
use crate::core::state::{SavedWork, Script, StoryParameters};
use crate::services::export::{export_file_name, format_script};
use crate::services::workflow::{Event, Notifier, SaveStamp, Stage, WorkflowManager};
use anyhow::{Context, Result};
use inquire::{Confirm, CustomType, MultiSelect, Select, Text};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        println!("\n>>> {}\n", message);
    }
}

pub async fn run(manager: &mut WorkflowManager, config: &Config) -> Result<()> {
    loop {
        if let Some(error) = &manager.state().error {
            println!("\nErreur : {}\n", error);
        }

        let stage = manager.state().stage.clone();
        match stage {
            Stage::Home => {
                let choice = Select::new(
                    "Générateur de scénario de BD",
                    vec!["Créer une nouvelle histoire", "Mes histoires", "Quitter"],
                )
                .prompt()?;
                match choice {
                    "Créer une nouvelle histoire" => send(manager, Event::StartNew).await?,
                    "Mes histoires" => send(manager, Event::OpenSaved).await?,
                    _ => return Ok(()),
                }
            }
            Stage::FormEntry => {
                let draft = manager
                    .state()
                    .params
                    .clone()
                    .unwrap_or_else(StoryParameters::new_draft);
                match edit_form(draft)? {
                    Some(params) => send(manager, Event::SubmitForm(params)).await?,
                    None => send(manager, Event::BackHome).await?,
                }
            }
            Stage::SummaryReview => {
                if let Some(summary) = &manager.state().summary {
                    println!("\n=== Résumé ===\n\n{}\n", summary);
                }
                let choice = Select::new(
                    "Que faire de ce résumé ?",
                    vec![
                        "Valider et générer le script",
                        "Régénérer le résumé",
                        "Modifier les paramètres",
                        "Accueil",
                    ],
                )
                .prompt()?;
                let event = match choice {
                    "Valider et générer le script" => Event::ApproveSummary,
                    "Régénérer le résumé" => Event::RegenerateSummary,
                    "Modifier les paramètres" => Event::BackToForm,
                    _ => Event::BackHome,
                };
                send(manager, event).await?;
            }
            Stage::ResultsReview => results_review(manager, config).await?,
            Stage::SavedList => saved_list(manager).await?,
            Stage::Loading { message } => {
                // Only reachable if a completion was lost; nothing can be sent while loading.
                log::warn!("Stuck in loading stage: {}", message);
                return Ok(());
            }
        }
    }
}

/// Starts the event, shows a spinner while its effect runs, then settles it.
async fn send(manager: &mut WorkflowManager, event: Event) -> Result<()> {
    let effect = match manager.begin(event) {
        Ok(effect) => effect,
        Err(e) => {
            println!("Action impossible : {}", e);
            return Ok(());
        }
    };
    let Some(effect) = effect else {
        return Ok(());
    };

    let spinner = match &manager.state().stage {
        Stage::Loading { message } => Some(spinner(message)?),
        _ => None,
    };
    let completion = manager.run(effect).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    manager.complete(completion)?;
    Ok(())
}

fn spinner(message: &str) -> Result<indicatif::ProgressBar> {
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_style(indicatif::ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn position(options: &[&str], current: &str) -> usize {
    options.iter().position(|o| *o == current).unwrap_or(0)
}

fn pick(message: &str, options: &[&'static str], current: &str) -> Result<String> {
    let choice = Select::new(message, options.to_vec())
        .with_starting_cursor(position(options, current))
        .prompt()?;
    Ok(choice.to_string())
}

/// Walks the creation form. `None` when the user gives up.
fn edit_form(mut params: StoryParameters) -> Result<Option<StoryParameters>> {
    loop {
        params.title = Text::new("Titre de la BD :")
            .with_initial_value(&params.title)
            .prompt()?;

        let genres = catalog::genre_names();
        let genre = pick("Genre :", &genres, &params.genre)?;
        if genre != params.genre {
            params.set_genre(&genre);
        }
        if let Some(subs) = catalog::sub_genres(&params.genre) {
            params.sub_genre = pick("Sous-genre :", subs, &params.sub_genre)?;
        }
        params.tone = pick("Ton :", catalog::TONES, &params.tone)?;
        params.target_audience = pick("Public cible :", catalog::TARGET_AUDIENCES, &params.target_audience)?;

        params.base_idea = Text::new("Idée de base :")
            .with_initial_value(&params.base_idea)
            .prompt()?;

        let keywords = Text::new("Mots-clés de l'intrigue (séparés par des virgules) :")
            .with_initial_value(&params.plot_keywords.join(", "))
            .prompt()?;
        apply_keywords(&mut params, &keywords);

        let selected: Vec<usize> = catalog::THEMES
            .iter()
            .enumerate()
            .filter(|(_, t)| params.main_themes.iter().any(|m| m == *t))
            .map(|(i, _)| i)
            .collect();
        let themes = MultiSelect::new("Thèmes principaux :", catalog::THEMES.to_vec())
            .with_default(&selected)
            .prompt()?;
        params.main_themes.clear();
        for theme in themes {
            params.toggle_theme(theme);
        }

        edit_chapters(&mut params)?;
        edit_characters(&mut params)?;

        params.art_style = pick("Style graphique :", catalog::ART_STYLES, &params.art_style)?;
        params.visual_mood = pick("Ambiance visuelle :", catalog::VISUAL_MOODS, &params.visual_mood)?;

        let problems = params.check();
        if problems.is_empty() {
            let go = Confirm::new("Générer le résumé ?").with_default(true).prompt()?;
            return Ok(go.then_some(params));
        }
        for problem in &problems {
            println!("- {}", problem);
        }
        if !Confirm::new("Corriger le formulaire ?").with_default(true).prompt()? {
            return Ok(None);
        }
    }
}

/// Syncs the keyword list with a comma-separated entry: kept keywords stay in place, new ones are appended.
fn apply_keywords(params: &mut StoryParameters, input: &str) {
    let entered: Vec<&str> = input.split(',').map(str::trim).filter(|k| !k.is_empty()).collect();
    let dropped: Vec<String> = params
        .plot_keywords
        .iter()
        .filter(|k| !entered.contains(&k.as_str()))
        .cloned()
        .collect();
    for keyword in &dropped {
        params.remove_keyword(keyword);
    }
    for keyword in entered {
        params.add_keyword(keyword);
    }
}

fn edit_chapters(params: &mut StoryParameters) -> Result<()> {
    let count = CustomType::<usize>::new("Nombre de chapitres :")
        .with_default(params.chapter_settings.len().max(1))
        .with_error_message("Entrez un nombre entier")
        .prompt()?
        .max(1);

    while params.chapter_settings.len() < count {
        params.add_chapter(catalog::DEFAULT_PAGE_COUNT);
    }
    while params.chapter_settings.len() > count {
        let last = params.chapter_settings[params.chapter_settings.len() - 1].id.clone();
        params.remove_chapter(&last);
    }

    for (index, chapter) in params.chapter_settings.iter_mut().enumerate() {
        let current = catalog::PAGE_OPTIONS
            .iter()
            .position(|p| *p == chapter.requested_page_count)
            .unwrap_or(1);
        chapter.requested_page_count = Select::new(
            &format!("Chapitre {} : nombre de pages", index + 1),
            catalog::PAGE_OPTIONS.to_vec(),
        )
        .with_starting_cursor(current)
        .prompt()?;
    }
    Ok(())
}

fn edit_characters(params: &mut StoryParameters) -> Result<()> {
    let mut removed = Vec::new();
    for (index, character) in params.characters.iter_mut().enumerate() {
        character.name = Text::new(&format!("Personnage {} : nom", index + 1))
            .with_initial_value(&character.name)
            .prompt()?;
        character.description = Text::new(&format!("Personnage {} : description", index + 1))
            .with_initial_value(&character.description)
            .prompt()?;
        if character.name.trim().is_empty() && character.description.trim().is_empty() {
            removed.push(character.id.clone());
        }
    }
    // Blank entries are dropped, the last one is always kept.
    for id in removed {
        params.remove_character(&id);
    }

    while Confirm::new("Ajouter un personnage ?").with_default(false).prompt()? {
        let name = Text::new("Nom :").prompt()?;
        let description = Text::new("Description :").prompt()?;
        params.add_character(&name, &description);
    }
    Ok(())
}

fn print_overview(script: &Script) {
    println!("\n=== {} ===", script.title);
    for (index, chapter) in script.chapters.iter().enumerate() {
        println!(
            "  Chapitre {}: {} ({} pages)",
            index + 1,
            chapter.chapter_title,
            chapter.pages.len()
        );
    }
    println!();
}

async fn results_review(manager: &mut WorkflowManager, config: &Config) -> Result<()> {
    let Some(script) = manager.state().script.clone() else {
        return send(manager, Event::BackHome).await;
    };
    print_overview(&script);

    let choice = Select::new(
        "Script :",
        vec![
            "Afficher le script",
            "Régénérer à partir d'un chapitre",
            "Tout régénérer",
            "Sauvegarder",
            "Exporter en TXT",
            "Nouvelle histoire",
            "Accueil",
        ],
    )
    .prompt()?;

    match choice {
        "Afficher le script" => println!("{}", format_script(&script)),
        "Régénérer à partir d'un chapitre" if !script.chapters.is_empty() => {
            let options: Vec<String> = script
                .chapters
                .iter()
                .enumerate()
                .map(|(i, c)| format!("Chapitre {}: {}", i + 1, c.chapter_title))
                .collect();
            let kept = Select::new("Garder jusqu'au chapitre (inclus) :", options).raw_prompt()?;
            send(manager, Event::RegenerateFrom(kept.index)).await?;
        }
        "Régénérer à partir d'un chapitre" => println!("Aucun chapitre à conserver."),
        "Tout régénérer" => send(manager, Event::RegenerateAll).await?,
        "Sauvegarder" => send(manager, Event::Save(SaveStamp::now())).await?,
        "Exporter en TXT" => match export_script(&script, Path::new(&config.export_folder)) {
            Ok(path) => println!("Script exporté dans {}", path.display()),
            Err(e) => {
                log::error!("Export failed: {:#}", e);
                println!("Échec de l'export : {}", e);
            }
        },
        "Nouvelle histoire" => send(manager, Event::StartNew).await?,
        _ => send(manager, Event::BackHome).await?,
    }
    Ok(())
}

fn describe(work: &SavedWork) -> String {
    let date = chrono::DateTime::from_timestamp_millis(work.created_at)
        .map(|d| d.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_default();
    let title = if work.script.title.is_empty() {
        &work.form_data.title
    } else {
        &work.script.title
    };
    format!("{} ({}) - {}", title, work.form_data.genre, date)
}

async fn saved_list(manager: &mut WorkflowManager) -> Result<()> {
    let works = manager.saved_works().await;
    if works.is_empty() {
        println!("Aucune histoire sauvegardée.");
        return send(manager, Event::BackHome).await;
    }

    let mut options: Vec<String> = works.iter().map(describe).collect();
    options.push("Retour".to_string());
    let picked = Select::new("Mes histoires :", options).raw_prompt()?;
    let Some(work) = works.get(picked.index) else {
        return send(manager, Event::BackHome).await;
    };

    let action = Select::new(&describe(work), vec!["Ouvrir", "Supprimer", "Retour"]).prompt()?;
    match action {
        "Ouvrir" => send(manager, Event::LoadSaved(work.clone())).await?,
        "Supprimer" => {
            let sure = Confirm::new("Êtes-vous sûr de vouloir supprimer cette histoire ?")
                .with_default(false)
                .prompt()?;
            if sure {
                if let Err(e) = manager.delete_saved(&work.id).await {
                    println!("Suppression impossible : {}", e);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Writes the plain-text export into `folder`, returning the file path.
pub fn export_script(script: &Script, folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(folder)
        .with_context(|| format!("Failed to create export folder {:?}", folder))?;
    let path = folder.join(export_file_name(script));
    std::fs::write(&path, format_script(script))
        .with_context(|| format!("Failed to write export {:?}", path))?;
    log::info!("Exported script to {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Chapter;

    #[test]
    fn test_export_script_writes_named_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let script = Script {
            title: "Le Grand Départ".to_string(),
            chapters: vec![Chapter {
                chapter_title: "Prologue".to_string(),
                pages: vec![],
            }],
        };

        let path = export_script(&script, &dir.path().join("output"))?;
        assert_eq!(path.file_name().unwrap(), "Le_Grand_Départ_script.txt");
        let text = std::fs::read_to_string(&path)?;
        assert!(text.starts_with("Titre de la BD: Le Grand Départ"));
        assert!(text.contains("Chapitre 1: Prologue"));
        Ok(())
    }

    #[test]
    fn test_apply_keywords_removes_and_appends() {
        let mut params = StoryParameters::new_draft();
        params.add_keyword("carte");
        params.add_keyword("tempête");

        apply_keywords(&mut params, "tempête, naufrage,, carte ,naufrage");
        assert_eq!(params.plot_keywords, vec!["carte", "tempête", "naufrage"]);

        apply_keywords(&mut params, "naufrage");
        assert_eq!(params.plot_keywords, vec!["naufrage"]);
    }

    #[test]
    fn test_position_falls_back_to_first() {
        assert_eq!(position(catalog::TONES, "Sombre"), 1);
        assert_eq!(position(catalog::TONES, "inconnu"), 0);
    }
}
