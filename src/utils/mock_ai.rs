//! Keyword-matching stand-in for an AI service.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MOCK_SOURCE: &str = "mock_ai";

// Checked in order, first keyword contained in the question wins
const MOCK_RESPONSES: &[(&str, &[&str])] = &[
    (
        "hello",
        &[
            "Hello! How can I help you today?",
            "Hello there! What's on your mind?",
            "Hello and greetings! How may I assist you?",
        ],
    ),
    (
        "help",
        &[
            "I'm here to help. What do you need assistance with?",
            "I'd be happy to help you. What's the issue?",
            "How can I be of assistance today?",
        ],
    ),
    (
        "weather",
        &[
            "I don't have real-time weather data, but I can tell you it's always sunny in the digital world!",
            "The weather forecast shows digital clouds with a chance of binary rain.",
            "Today's temperature is 101 in binary, quite pleasant!",
        ],
    ),
    (
        "thanks",
        &[
            "You're welcome!",
            "Happy to help!",
            "Anytime! Let me know if you need anything else.",
        ],
    ),
    (
        "bye",
        &[
            "Goodbye! Have a great day!",
            "See you next time!",
            "Farewell! Come back soon.",
        ],
    ),
];

const DEFAULT_RESPONSES: &[&str] = &[
    "That's an interesting question. Let me think about that...",
    "I don't have a specific answer for that, but I'm learning every day!",
    "I'm not sure I understand. Could you rephrase your question?",
    "That's beyond my current capabilities, but I'd be happy to help with something else.",
    "I'm processing your request... Here's what I can tell you: this is a simulated response.",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResponse {
    pub response: String,
    pub confidence: f64,
    pub source: String,
    pub processing_time_ms: u64,
}

impl AiResponse {
    /// Metadata stored alongside the QA pair
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "confidence": self.confidence,
            "source": self.source,
            "processing_time_ms": self.processing_time_ms,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MockResponder {
    latency: Duration,
}

impl MockResponder {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Simulate a network round trip, then answer from the keyword table
    pub async fn generate(&self, question: &str) -> AiResponse {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        respond_to(question, &mut rand::thread_rng())
    }
}

/// Pick a reply for `question` using the given random source
pub fn respond_to<R: Rng>(question: &str, rng: &mut R) -> AiResponse {
    let question = question.to_lowercase();

    let matched = MOCK_RESPONSES
        .iter()
        .find(|(keyword, _)| question.contains(keyword));

    match matched {
        Some((_, responses)) => AiResponse {
            response: pick(responses, rng),
            confidence: rng.gen_range(0.75..0.98),
            source: MOCK_SOURCE.to_string(),
            processing_time_ms: rng.gen_range(50..=300),
        },
        None => AiResponse {
            response: pick(DEFAULT_RESPONSES, rng),
            confidence: rng.gen_range(0.5..0.7),
            source: MOCK_SOURCE.to_string(),
            processing_time_ms: rng.gen_range(100..=500),
        },
    }
}

fn pick<R: Rng>(choices: &[&str], rng: &mut R) -> String {
    choices.choose(rng).copied().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_keyword_always_greets() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let reply = respond_to("hello", &mut rng);
            assert!(reply.response.contains("Hello"));
            assert!((0.75..0.98).contains(&reply.confidence));
            assert!((50..=300).contains(&reply.processing_time_ms));
            assert_eq!(reply.source, MOCK_SOURCE);
        }
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let reply = respond_to("What's the WEATHER like?", &mut rand::thread_rng());
        let weather = MOCK_RESPONSES[2].1;
        assert!(weather.contains(&reply.response.as_str()));
    }

    #[test]
    fn test_unknown_question_uses_default_reply() {
        let mut rng = rand::thread_rng();
        let reply = respond_to("quantum chromodynamics", &mut rng);

        assert!(DEFAULT_RESPONSES.contains(&reply.response.as_str()));
        assert!((0.5..0.7).contains(&reply.confidence));
        assert!((100..=500).contains(&reply.processing_time_ms));
    }

    #[test]
    fn test_metadata_shape() {
        let reply = respond_to("thanks", &mut rand::thread_rng());
        let metadata = reply.metadata();

        assert_eq!(metadata["source"], "mock_ai");
        assert!(metadata["confidence"].is_f64());
        assert!(metadata["processing_time_ms"].is_u64());
    }

    #[tokio::test]
    async fn test_responder_without_latency() {
        let responder = MockResponder::new(Duration::ZERO);
        let reply = responder.generate("bye now").await;
        assert!(MOCK_RESPONSES[4].1.contains(&reply.response.as_str()));
    }
}
