#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use devclassify::llm::ClassificationRequest;
use devclassify::models::{Classification, Dataset};
use devclassify::{Error, LLMProvider, PipelineConfig, Result};

/// Replies from a fixed table; names not in the table fail like a provider error.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    replies: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(replies: &[(&str, &str)]) -> Self {
        Self {
            replies: replies
                .iter()
                .map(|(name, reply)| (name.to_string(), reply.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn classify_developer(&self, request: &ClassificationRequest) -> Result<Classification> {
        self.calls.lock().unwrap().push(request.developer.clone());

        if let Some(delay) = self.delays.get(&request.developer) {
            tokio::time::sleep(*delay).await;
        }

        match self.replies.get(&request.developer) {
            Some(reply) => Ok(Classification::from_reply(reply.clone())),
            None => Err(Error::LLMApi(format!(
                "The server had an error while processing '{}'",
                request.developer
            ))),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn write_games(dir: &Path, developers: &[&str]) -> PipelineConfig {
    let input = dir.join("data").join("cleaned_game.csv");
    std::fs::create_dir_all(input.parent().unwrap()).unwrap();

    let mut csv = String::from("name,developer,year\n");
    for (i, developer) in developers.iter().enumerate() {
        csv.push_str(&format!("Game {},{},{}\n", i + 1, developer, 2000 + i));
    }
    std::fs::write(&input, csv).unwrap();

    PipelineConfig {
        input_path: input,
        output_path: dir.join("data").join("developer_category.csv"),
        ..PipelineConfig::default()
    }
}

pub fn output_column(config: &PipelineConfig) -> Vec<String> {
    Dataset::from_path(&config.output_path)
        .unwrap()
        .raw_column(&config.output_column)
        .unwrap()
}

pub const THREE: [&str; 3] = ["Nintendo", "Indie Studio X", "Ubisoft Poland"];

pub fn three_labels() -> ScriptedProvider {
    ScriptedProvider::new(&[
        ("Nintendo", "Large Game Company"),
        ("Indie Studio X", "Indie Developer"),
        ("Ubisoft Poland", "Regional Developer"),
    ])
}
