use thiserror::Error;

/// Failures of a single generation call, from credentials to payload shape.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No API key available; raised before any network traffic.
    #[error("{0}")]
    Configuration(String),

    /// Non-success HTTP status from the provider.
    #[error("Erreur API ({status}) : {message}")]
    Provider { status: u16, message: String },

    /// The request never produced an HTTP status (DNS, TLS, connection reset...).
    #[error("Erreur réseau : {0}")]
    Transport(String),

    /// Body could not be read as the expected text or JSON.
    #[error("Réponse invalide du fournisseur : {0}")]
    MalformedResponse(String),

    /// JSON was valid but did not have the shape of a script.
    #[error("Script invalide : {0}")]
    Validation(String),
}

impl GenerationError {
    pub fn missing_credentials() -> Self {
        GenerationError::Configuration(
            "PERPLEXITY_API_KEY non configurée. Veuillez l'ajouter dans vos variables d'environnement ou dans config.yml."
                .to_string(),
        )
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Transport(err.to_string())
    }
}

/// Events the workflow refuses without touching its state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("une génération est déjà en cours")]
    Busy,

    #[error("donnée manquante : {0}")]
    MissingData(&'static str),

    #[error("aucune génération en attente")]
    NoPendingJob,
}
