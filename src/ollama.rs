//! Calls against a local [Ollama](https://github.com/ollama/ollama/blob/main/docs/api.md) server.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    backend::{Backend, Completion, Embedding, Source},
    config::Config,
    errors::GptError,
    http::HttpClient,
};

/// A `generate` request body
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Debug, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    model: String,
    created_at: String,
    response: String,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

/// An `embed` request body
#[derive(Debug, Serialize)]
pub struct EmbedRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedBody {
    model: String,
    embeddings: Vec<Vec<f32>>,
}

/// Client for the Ollama API
#[derive(Debug, Clone)]
pub struct Ollama {
    http: HttpClient,
}

impl Ollama {
    pub fn new(config: &Config) -> Result<Self, GptError> {
        let http = HttpClient::new(config.ollama.base_url(), None, config.http.timeout())?;
        Ok(Self { http })
    }

    pub fn with_client(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn generate(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<Completion, GptError> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature },
        };
        let response = self.http.post_json("generate", &request)?;
        let rtt = response.rtt;
        let body = unpack_generate(response.json()?)?;

        let created = DateTime::parse_from_rfc3339(&body.created_at)
            .map_err(|e| GptError::Unpack(format!("bad 'created_at' timestamp: {}", e)))?
            .timestamp();

        Ok(Completion {
            id: None,
            input: prompt.to_string(),
            output: body.response,
            model: body.model,
            created,
            input_tokens: body.prompt_eval_count,
            output_tokens: body.eval_count,
            rtt,
            source: Source::Ollama,
            raw_response: response.body,
        })
    }

    pub fn embed(&self, input: &str, model: &str) -> Result<Embedding, GptError> {
        let request = EmbedRequest { model, input };
        let body: EmbedBody = self.http.post_json("embed", &request)?.parse()?;
        let embedding = body
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| GptError::Unpack("no vector in 'embeddings'".to_string()))?;

        Ok(Embedding {
            embedding,
            input: input.to_string(),
            model: body.model,
            source: Source::Ollama,
        })
    }
}

impl Backend for Ollama {
    fn source(&self) -> Source {
        Source::Ollama
    }

    fn respond(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
        _store: bool,
    ) -> Result<Completion, GptError> {
        self.generate(prompt, model, temperature)
    }

    fn embed(&self, input: &str, model: &str) -> Result<Embedding, GptError> {
        Ollama::embed(self, input, model)
    }
}

fn unpack_generate(json: Value) -> Result<GenerateBody, GptError> {
    match json.get("done").map(Value::as_bool) {
        None => Err(GptError::Malformed(
            "The response from Ollama does not contain the 'done' key".to_string(),
        )),
        Some(Some(true)) => {
            serde_json::from_value(json).map_err(|e| GptError::Unpack(e.to_string()))
        }
        Some(_) => Err(GptError::Malformed(
            "The response from Ollama indicates the job is not done".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn client(server: &ServerGuard) -> Ollama {
        Ollama::with_client(HttpClient::new(format!("{}/api", server.url()), None, None).unwrap())
    }

    #[test]
    fn base_url_from_config() {
        let mut config = Config::default();
        config.ollama.port = 11500;
        assert_eq!(config.ollama.base_url(), "http://localhost:11500/api");
        assert!(Ollama::new(&config).is_ok());
    }

    #[test]
    fn generate_unpacks_completion() {
        let mut server = Server::new();
        let body = json!({
            "model": "llama3.2",
            "created_at": "2023-08-04T19:22:45.499127Z",
            "response": "The sky is blue because of Rayleigh scattering.",
            "done": true,
            "context": [1, 2, 3],
            "total_duration": 5043500667u64,
            "prompt_eval_count": 26,
            "eval_count": 290
        })
        .to_string();
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::Json(json!({
                "model": "llama3.2",
                "prompt": "Why is the sky blue?",
                "stream": false,
                "options": {"temperature": 0.5}
            })))
            .with_status(200)
            .with_body(&body)
            .create();

        let completion = client(&server)
            .generate("Why is the sky blue?", "llama3.2", 0.5)
            .unwrap();

        mock.assert();
        assert_eq!(
            completion.output,
            "The sky is blue because of Rayleigh scattering."
        );
        assert_eq!(completion.created, 1691176965);
        assert_eq!(completion.input_tokens, 26);
        assert_eq!(completion.output_tokens, 290);
        assert_eq!(completion.source, Source::Ollama);
        assert_eq!(completion.raw_response, body);
    }

    #[test]
    fn generate_requires_done() {
        let err = unpack_generate(json!({"model": "llama3.2"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The response from Ollama does not contain the 'done' key"
        );

        let err = unpack_generate(json!({"model": "llama3.2", "done": false})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The response from Ollama indicates the job is not done"
        );
    }

    #[test]
    fn model_not_found_is_passed_through() {
        let mut server = Server::new();
        server
            .mock("POST", "/api/generate")
            .with_status(404)
            .with_body(r#"{"error":"model \"foobar\" not found, try pulling it first"}"#)
            .create();

        let err = client(&server).generate("hi", "foobar", 1.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "model \"foobar\" not found, try pulling it first"
        );
    }

    #[test]
    fn embed_takes_first_vector() {
        let mut server = Server::new();
        server
            .mock("POST", "/api/embed")
            .match_body(Matcher::Json(json!({"model": "nomic-embed-text", "input": "hello"})))
            .with_status(200)
            .with_body(r#"{"model":"nomic-embed-text","embeddings":[[0.1,0.2,0.3]]}"#)
            .create();

        let embedding = client(&server)
            .embed("hello", "nomic-embed-text")
            .unwrap();
        assert_eq!(embedding.embedding, vec![0.1, 0.2, 0.3]);
        assert_eq!(embedding.source, Source::Ollama);
    }
}
