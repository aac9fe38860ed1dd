use anyhow::Result;
use std::sync::Arc;
use story2comic::core::config::Config;
use story2comic::core::io::NativeStorage;
use story2comic::services::llm::create_llm;
use story2comic::services::workflow::WorkflowManager;
use story2comic::ui::{self, ConsoleNotifier};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            eprintln!("Please check 'config.yml'.");
            return Err(e);
        }
    };
    config.ensure_directories()?;

    // Missing credentials are reported at the first generation, not here.
    let llm = create_llm(&config)?;
    let storage = Arc::new(NativeStorage::new(&config.storage.data_folder));

    let mut manager = WorkflowManager::new(&config, llm, storage, Box::new(ConsoleNotifier));
    ui::run(&mut manager, &config).await
}
