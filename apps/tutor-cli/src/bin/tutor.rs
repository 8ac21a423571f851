use serde::de::DeserializeOwned;
use std::env;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tutor_core::config::{resolve_with_base, Config, Settings};
use tutor_core::topics::TopicCatalog;
use tutor_retrieval::KnowledgeBase;
use tutor_service::{recommend, topics_listing, AskRequest, ChatClient, QuizRequest, RecommendRequest, Tutor};

const USAGE: &str = "Usage:
  tutor topics
  tutor ask '<question>'
  tutor quiz ['<request json>' | -]
  tutor recommend ['<request json>' | -]

quiz and recommend read the JSON request body from stdin when it is omitted or '-'.
Example: tutor quiz '{\"units\": [\"unit1\"], \"num_questions\": 3, \"difficulty\": \"easy\"}'";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tutor_cli::init_tracing();
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };
    let settings = Config::load()?.settings()?;
    let base_dir = env::current_dir()?;

    let reply = match command.as_str() {
        "topics" => {
            let catalog = TopicCatalog::load(&resolve_with_base(&base_dir, &settings.data.topics_path))?;
            serde_json::to_value(topics_listing(&catalog))?
        }
        "ask" => {
            let question = args[1..].join(" ");
            if question.trim().is_empty() {
                anyhow::bail!("ask needs a question\n\n{USAGE}");
            }
            let tutor = build_tutor(&settings, &base_dir).await?;
            serde_json::to_value(tutor.ask(&AskRequest { question, history: Vec::new() }).await)?
        }
        "quiz" => {
            let request: QuizRequest = read_request(args.get(1))?;
            let tutor = build_tutor(&settings, &base_dir).await?;
            serde_json::to_value(tutor.generate_quiz(&request).await)?
        }
        "recommend" => {
            let request: RecommendRequest = read_request(args.get(1))?;
            let generator = ChatClient::from_settings(&settings.generation)?;
            serde_json::to_value(recommend(&generator, &request).await)?
        }
        other => anyhow::bail!("unknown command {other}\n\n{USAGE}"),
    };
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

async fn build_tutor(settings: &Settings, base_dir: &Path) -> anyhow::Result<Tutor<ChatClient>> {
    let generator = ChatClient::from_settings(&settings.generation)?;
    let knowledge = KnowledgeBase::load(settings, base_dir).await?;
    Ok(Tutor::new(Arc::new(knowledge), generator, &settings.generation))
}

fn read_request<T: DeserializeOwned>(arg: Option<&String>) -> anyhow::Result<T> {
    let body = match arg.map(String::as_str) {
        Some(json) if json != "-" => json.to_string(),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&body)?)
}
