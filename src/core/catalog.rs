//! Fixed vocabularies offered by the creation form.

pub const GENRES: &[(&str, &[&str])] = &[
    (
        "Science-fiction",
        &["Cyberpunk", "Space Opera", "Post-apocalyptique", "Voyage dans le temps"],
    ),
    ("Fantastique", &["Héroïque", "Urbaine", "Sombre"]),
    ("Aventure", &["Exploration", "Chasse au trésor", "Survie"]),
    ("Horreur", &["Psychologique", "Slasher", "Surnaturel"]),
    ("Comédie", &["Satire", "Parodie", "Absurde"]),
    ("Western", &["Classique", "Crépusculaire", "Révisionniste"]),
    ("Historique", &["Antiquité", "Moyen-Âge", "Époque moderne"]),
    ("Romance", &["Contemporaine", "Historique", "Paranormale"]),
    ("Polar/Thriller", &["Film noir", "Espionnage", "Policier"]),
    ("Super-héros", &["Origines", "Équipe", "Cosmique"]),
];

pub const TONES: &[&str] = &["Humoristique", "Sombre", "Épique", "Léger", "Sérieux", "Satirique"];

pub const TARGET_AUDIENCES: &[&str] = &["Enfants", "Adolescents", "Adultes"];

pub const THEMES: &[&str] = &[
    "Identité",
    "Justice",
    "Vengeance",
    "Rédemption",
    "Survie",
    "Pouvoir",
    "Amour",
    "Trahison",
    "Sacrifice",
];

pub const ART_STYLES: &[&str] = &[
    "Réaliste",
    "Cartoon",
    "Manga/Anime",
    "Comics américain",
    "Franco-Belge",
    "Noir et Blanc",
    "Aquarelle",
];

pub const VISUAL_MOODS: &[&str] = &[
    "Lumineuse",
    "Sombre et contrastée",
    "Colorée et vibrante",
    "Sépia/Vintage",
];

pub const PAGE_OPTIONS: &[u32] = &[5, 10, 15, 20];

pub const DEFAULT_PAGE_COUNT: u32 = 10;

pub fn genre_names() -> Vec<&'static str> {
    GENRES.iter().map(|(name, _)| *name).collect()
}

/// Allowed sub-genres, or `None` for an unknown genre.
pub fn sub_genres(genre: &str) -> Option<&'static [&'static str]> {
    GENRES
        .iter()
        .find(|(name, _)| *name == genre)
        .map(|(_, subs)| *subs)
}

pub fn is_theme(theme: &str) -> bool {
    THEMES.contains(&theme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_genres_lookup() {
        assert_eq!(sub_genres("Western").map(|s| s.len()), Some(3));
        assert!(sub_genres("Opéra").is_none());
        // "Historique" is both a genre and a Romance sub-genre.
        assert!(sub_genres("Romance").unwrap().contains(&"Historique"));
    }

    #[test]
    fn test_every_genre_has_sub_genres() {
        for (genre, subs) in GENRES {
            assert!(!subs.is_empty(), "{} has no sub-genre", genre);
        }
    }
}
