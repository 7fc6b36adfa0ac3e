use intent_chatbot::config::Config;
use intent_chatbot::models::intent::IntentCatalog;
use intent_chatbot::nlp::classifier::TrainingParams;
use intent_chatbot::nlp::trainer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧠 Intent classifier - Train");
    println!("==========================================");

    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let catalog = IntentCatalog::load(&config.intents_path)?;
    println!("Loaded {} intents from {}", catalog.len(), config.intents_path.display());

    let model = match trainer::train(&catalog, &TrainingParams::default()) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("❌ Training failed: {}", e);
            std::process::exit(1);
        }
    };

    model.save(&config.model_path, &config.vectorizer_path)?;

    println!("Samples:           {}", model.report.samples);
    println!("Vocabulary size:   {}", model.report.vocabulary_size);
    println!("Intents:           {}", model.report.classes);
    println!("Training accuracy: {:.1}%", model.report.training_accuracy * 100.0);
    println!("✅ Model trained successfully!");
    println!("   Classifier: {}", config.model_path.display());
    println!("   Vectorizer: {}", config.vectorizer_path.display());

    Ok(())
}
