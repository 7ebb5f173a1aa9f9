//! Calls against the OpenAI user API.
//!
//! For request/response schemas, see the [OpenAI API reference](https://platform.openai.com/docs/api-reference).

use std::path::Path;

use reqwest::blocking::multipart::Form;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    backend::{Backend, Completion, Embedding, Source},
    config::Config,
    errors::GptError,
    http::{HttpClient, Parsed},
};

/// A `responses` request body
#[derive(Debug, Serialize)]
pub struct ResponseRequest<'a> {
    pub input: &'a str,
    pub model: &'a str,
    pub store: bool,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata<'a>>,
}

/// Attached to stored responses so `chats` can show what was asked
#[derive(Debug, Serialize)]
pub struct ResponseMetadata<'a> {
    pub prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    id: Option<String>,
    created_at: i64,
    model: String,
    output: Vec<OutputItem>,
    usage: ResponseUsage,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    status: Option<String>,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    OutputText { text: String },
    Refusal { refusal: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    input_tokens: u64,
    output_tokens: u64,
}

/// An `embeddings` request body
#[derive(Debug, Serialize)]
pub struct EmbeddingRequest<'a> {
    pub input: &'a str,
    pub model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingBody {
    data: Vec<EmbeddingItem>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

/// The `data` wrapper of list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct List<T> {
    pub data: Vec<T>,
}

/// An uploaded file
#[derive(Debug, Clone, Deserialize)]
pub struct File {
    pub id: String,
    pub filename: String,
    pub created_at: i64,
    pub purpose: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FineTuningJob {
    pub id: String,
    pub created_at: i64,
    pub estimated_finish: Option<i64>,
    pub finished_at: Option<i64>,
}

#[derive(Debug, Serialize)]
struct FineTuningJobRequest<'a> {
    model: &'a str,
    training_file: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Model {
    pub id: String,
    pub created: i64,
    pub owned_by: String,
}

impl Model {
    /// Models published by OpenAI rather than fine-tuned by the user
    pub fn owned_by_openai(&self) -> bool {
        self.owned_by.starts_with("openai") || self.owned_by.starts_with("system")
    }
}

/// A stored chat completion
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub created: i64,
    #[serde(default)]
    metadata: Option<ChatMetadata>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMetadata {
    prompt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl ChatCompletion {
    /// The prompt, if it was stored in the completion's metadata
    pub fn prompt(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.prompt.as_deref())
            .unwrap_or("")
    }

    pub fn completion(&self) -> &str {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or("")
    }
}

/// An `images/generations` request body
#[derive(Debug, Serialize)]
pub struct ImageRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub quality: &'a str,
    pub response_format: &'a str,
    pub size: &'a str,
    pub style: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageBody {
    created: i64,
    data: Vec<ImageItem>,
}

#[derive(Debug, Deserialize)]
struct ImageItem {
    b64_json: String,
    revised_prompt: Option<String>,
}

/// A generated image, still base64 encoded
#[derive(Debug, Clone)]
pub struct Image {
    pub created: i64,
    pub b64_json: String,
    pub revised_prompt: Option<String>,
}

/// Client for the OpenAI user API
#[derive(Debug, Clone)]
pub struct OpenAi {
    http: HttpClient,
}

impl OpenAi {
    pub fn new(config: &Config) -> Result<Self, GptError> {
        let key = config.credentials.api_key()?;
        let http = HttpClient::new(
            config.openai.base_url.as_str(),
            Some(key.to_string()),
            config.http.timeout(),
        )?;
        Ok(Self { http })
    }

    pub fn with_client(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn create_response(
        &self,
        input: &str,
        model: &str,
        temperature: f32,
        store: bool,
    ) -> Result<Completion, GptError> {
        let request = ResponseRequest {
            input,
            model,
            store,
            temperature,
            metadata: store.then_some(ResponseMetadata { prompt: input }),
        };
        let response = self.http.post_json("responses", &request)?;
        let rtt = response.rtt;
        let body = unpack_response(response.json()?)?;
        let output = completed_output(&body.output)?;

        Ok(Completion {
            id: body.id,
            input: input.to_string(),
            output,
            model: body.model,
            created: body.created_at,
            input_tokens: body.usage.input_tokens,
            output_tokens: body.usage.output_tokens,
            rtt,
            source: Source::OpenAi,
            raw_response: response.body,
        })
    }

    pub fn create_embedding(&self, input: &str, model: &str) -> Result<Embedding, GptError> {
        let request = EmbeddingRequest { input, model };
        let body: EmbeddingBody = self.http.post_json("embeddings", &request)?.parse()?;
        let item = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| GptError::Unpack("no embedding in 'data'".to_string()))?;

        Ok(Embedding {
            embedding: item.embedding,
            input: input.to_string(),
            model: body.model,
            source: Source::OpenAi,
        })
    }

    pub fn list_files(&self) -> Result<Parsed<List<File>>, GptError> {
        self.http
            .get("files", &[("order", "asc".to_string())])?
            .parsed()
    }

    /// Upload `path`, returning the new file's ID
    pub fn upload_file(&self, path: &Path, purpose: &str) -> Result<String, GptError> {
        let form = Form::new()
            .text("purpose", purpose.to_string())
            .file("file", path)
            .map_err(|_| GptError::ReadFile {
                path: path.display().to_string(),
            })?;
        let json = self.http.post_form("files", form)?.json()?;
        required_str(&json, "id")
    }

    /// Returns whether the server reports the file as deleted
    pub fn delete_file(&self, file_id: &str) -> Result<bool, GptError> {
        let json = self.http.delete(&format!("files/{}", file_id))?.json()?;
        required_bool(&json, "deleted")
    }

    /// Start a fine-tuning job, returning its ID
    pub fn create_fine_tuning_job(
        &self,
        model: &str,
        training_file: &str,
    ) -> Result<String, GptError> {
        let request = FineTuningJobRequest {
            model,
            training_file,
        };
        let json = self.http.post_json("fine_tuning/jobs", &request)?.json()?;
        required_str(&json, "id")
    }

    pub fn list_fine_tuning_jobs(
        &self,
        limit: i64,
    ) -> Result<Parsed<List<FineTuningJob>>, GptError> {
        self.http
            .get("fine_tuning/jobs", &[("limit", limit.to_string())])?
            .parsed()
    }

    pub fn list_models(&self) -> Result<Parsed<List<Model>>, GptError> {
        self.http.get("models", &[])?.parsed()
    }

    pub fn delete_model(&self, model_id: &str) -> Result<bool, GptError> {
        let json = self.http.delete(&format!("models/{}", model_id))?.json()?;
        required_bool(&json, "deleted")
    }

    pub fn list_chat_completions(
        &self,
        limit: i64,
    ) -> Result<Parsed<List<ChatCompletion>>, GptError> {
        self.http
            .get("chat/completions", &[("limit", limit.to_string())])?
            .parsed()
    }

    pub fn delete_chat_completion(&self, chat_id: &str) -> Result<bool, GptError> {
        let json = self
            .http
            .delete(&format!("chat/completions/{}", chat_id))?
            .json()?;
        required_bool(&json, "deleted")
    }

    pub fn create_image(
        &self,
        model: &str,
        prompt: &str,
        quality: &str,
        style: &str,
    ) -> Result<Image, GptError> {
        let request = ImageRequest {
            model,
            prompt,
            quality,
            response_format: "b64_json",
            size: "1024x1024",
            style,
        };
        let body: ImageBody = self
            .http
            .post_json("images/generations", &request)?
            .parse()?;
        let item = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| GptError::Unpack("no image in 'data'".to_string()))?;

        Ok(Image {
            created: body.created,
            b64_json: item.b64_json,
            revised_prompt: item.revised_prompt,
        })
    }
}

impl Backend for OpenAi {
    fn source(&self) -> Source {
        Source::OpenAi
    }

    fn respond(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
        store: bool,
    ) -> Result<Completion, GptError> {
        self.create_response(prompt, model, temperature, store)
    }

    fn embed(&self, input: &str, model: &str) -> Result<Embedding, GptError> {
        self.create_embedding(input, model)
    }
}

fn unpack_response(json: Value) -> Result<ResponseBody, GptError> {
    match json.get("object") {
        None => {
            return Err(GptError::Malformed(
                "The response from OpenAI does not contain an 'object' key".to_string(),
            ))
        }
        Some(object) if object.as_str() != Some("response") => {
            return Err(GptError::Malformed(
                "The response from OpenAI is not an OpenAI Response".to_string(),
            ))
        }
        _ => {}
    }
    serde_json::from_value(json).map_err(|e| GptError::Unpack(e.to_string()))
}

/// Text of the first completed message in a response's `output`
fn completed_output(output: &[OutputItem]) -> Result<String, GptError> {
    let message = output
        .iter()
        .filter(|item| item.kind == "message")
        .find(|item| item.status.as_deref() == Some("completed"))
        .ok_or_else(|| {
            GptError::Malformed("OpenAI did not complete the transaction".to_string())
        })?;

    match message.content.first() {
        Some(ContentPart::OutputText { text }) => Ok(text.clone()),
        Some(ContentPart::Refusal { refusal }) => Ok(refusal.clone()),
        _ => Err(GptError::Malformed(
            "Some unknown object type was returned from OpenAI".to_string(),
        )),
    }
}

fn required_str(json: &Value, key: &str) -> Result<String, GptError> {
    json.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GptError::Malformed(format!("Malformed response. Missing '{}' key", key)))
}

fn required_bool(json: &Value, key: &str) -> Result<bool, GptError> {
    json.get(key)
        .and_then(Value::as_bool)
        .ok_or_else(|| GptError::Malformed(format!("Malformed response. Missing '{}' key", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn client(server: &ServerGuard) -> OpenAi {
        OpenAi::with_client(HttpClient::new(server.url(), Some("sk-test".into()), None).unwrap())
    }

    fn response_body(content: Value) -> String {
        json!({
            "id": "resp_123",
            "object": "response",
            "created_at": 1741476542,
            "status": "completed",
            "error": null,
            "model": "gpt-4o-2024-08-06",
            "output": [
                {"type": "reasoning", "id": "rs_1", "summary": []},
                {
                    "type": "message",
                    "id": "msg_1",
                    "status": "completed",
                    "role": "assistant",
                    "content": [content]
                }
            ],
            "usage": {"input_tokens": 36, "output_tokens": 87, "total_tokens": 123}
        })
        .to_string()
    }

    #[test]
    fn create_response_returns_output_text() {
        let mut server = Server::new();
        let body = response_body(json!({"type": "output_text", "text": "8", "annotations": []}));
        let mock = server
            .mock("POST", "/responses")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::Json(json!({
                "input": "What is 3 + 5?",
                "model": "gpt-4o",
                "store": false,
                "temperature": 1.0
            })))
            .with_status(200)
            .with_body(&body)
            .create();

        let completion = client(&server)
            .create_response("What is 3 + 5?", "gpt-4o", 1.0, false)
            .unwrap();

        mock.assert();
        assert_eq!(completion.output, "8");
        assert_eq!(completion.input, "What is 3 + 5?");
        assert_eq!(completion.model, "gpt-4o-2024-08-06");
        assert_eq!(completion.created, 1741476542);
        assert_eq!(completion.input_tokens, 36);
        assert_eq!(completion.output_tokens, 87);
        assert_eq!(completion.id.as_deref(), Some("resp_123"));
        assert_eq!(completion.source, Source::OpenAi);
        assert_eq!(completion.raw_response, body);
    }

    #[test]
    fn stored_response_carries_prompt() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/responses")
            .match_body(Matcher::Json(json!({
                "input": "What is 3 + 5?",
                "model": "gpt-4o",
                "store": true,
                "temperature": 0.5,
                "metadata": {"prompt": "What is 3 + 5?"}
            })))
            .with_status(200)
            .with_body(response_body(
                json!({"type": "output_text", "text": "8", "annotations": []}),
            ))
            .create();

        let completion = client(&server)
            .respond("What is 3 + 5?", "gpt-4o", 0.5, true)
            .unwrap();

        mock.assert();
        assert_eq!(completion.output, "8");
    }

    #[test]
    fn create_response_returns_refusal() {
        let mut server = Server::new();
        server
            .mock("POST", "/responses")
            .with_status(200)
            .with_body(response_body(
                json!({"type": "refusal", "refusal": "I can't help with that."}),
            ))
            .create();

        let completion = client(&server).create_response("x", "gpt-4o", 1.0, false).unwrap();
        assert_eq!(completion.output, "I can't help with that.");
    }

    #[test]
    fn create_response_rejects_unknown_content() {
        let mut server = Server::new();
        server
            .mock("POST", "/responses")
            .with_status(200)
            .with_body(response_body(json!({"type": "audio", "data": ""})))
            .create();

        let err = client(&server)
            .create_response("x", "gpt-4o", 1.0, false)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Some unknown object type was returned from OpenAI"
        );
    }

    #[test]
    fn create_response_checks_object() {
        let mut server = Server::new();
        server
            .mock("POST", "/responses")
            .with_status(200)
            .with_body(r#"{"object": "chat.completion"}"#)
            .create();

        let err = client(&server).create_response("x", "m", 1.0, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The response from OpenAI is not an OpenAI Response"
        );

        let err = unpack_response(json!({"id": "x"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The response from OpenAI does not contain an 'object' key"
        );
    }

    #[test]
    fn create_response_requires_completed_message() {
        let items: Vec<OutputItem> = serde_json::from_value(json!([
            {"type": "message", "status": "in_progress", "content": []}
        ]))
        .unwrap();

        let err = completed_output(&items).unwrap_err();
        assert_eq!(err.to_string(), "OpenAI did not complete the transaction");
    }

    #[test]
    fn create_embedding_takes_first_vector() {
        let mut server = Server::new();
        server
            .mock("POST", "/embeddings")
            .match_body(Matcher::Json(json!({"input": "hello", "model": "text-embedding-3-small"})))
            .with_status(200)
            .with_body(
                r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.5,-0.25]}],"model":"text-embedding-3-small","usage":{"prompt_tokens":1,"total_tokens":1}}"#,
            )
            .create();

        let embedding = client(&server)
            .create_embedding("hello", "text-embedding-3-small")
            .unwrap();
        assert_eq!(embedding.embedding, vec![0.5, -0.25]);
        assert_eq!(embedding.model, "text-embedding-3-small");
        assert_eq!(embedding.input, "hello");
    }

    #[test]
    fn list_files_keeps_raw_body() {
        let mut server = Server::new();
        let body = r#"{"object":"list","data":[{"id":"file-abc","object":"file","bytes":120,"created_at":1700000000,"filename":"train.jsonl","purpose":"fine-tune"}]}"#;
        server
            .mock("GET", "/files")
            .match_query(Matcher::UrlEncoded("order".into(), "asc".into()))
            .with_status(200)
            .with_body(body)
            .create();

        let files = client(&server).list_files().unwrap();
        assert_eq!(files.raw, body);
        assert_eq!(files.value.data.len(), 1);
        assert_eq!(files.value.data[0].filename, "train.jsonl");
    }

    #[test]
    fn delete_file_reports_deleted_flag() {
        let mut server = Server::new();
        server
            .mock("DELETE", "/files/file-abc")
            .with_status(200)
            .with_body(r#"{"id":"file-abc","object":"file","deleted":true}"#)
            .create();
        server
            .mock("DELETE", "/files/file-odd")
            .with_status(200)
            .with_body(r#"{"id":"file-odd","object":"file"}"#)
            .create();

        let api = client(&server);
        assert!(api.delete_file("file-abc").unwrap());
        assert_eq!(
            api.delete_file("file-odd").unwrap_err().to_string(),
            "Malformed response. Missing 'deleted' key"
        );
    }

    #[test]
    fn delete_missing_file_surfaces_provider_message() {
        let mut server = Server::new();
        server
            .mock("DELETE", "/files/foobar")
            .with_status(404)
            .with_body(r#"{"error":{"message":"No such File object: foobar","type":"invalid_request_error","param":"id","code":null}}"#)
            .create();

        let err = client(&server).delete_file("foobar").unwrap_err();
        assert_eq!(err.to_string(), "No such File object: foobar");
    }

    #[test]
    fn upload_file_returns_id() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("train.jsonl");
        std::fs::write(&path, "{}\n").unwrap();

        let mut server = Server::new();
        let mock = server
            .mock("POST", "/files")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data".to_string()),
            )
            .match_body(Matcher::Regex("fine-tune".to_string()))
            .with_status(200)
            .with_body(r#"{"id":"file-new","object":"file","purpose":"fine-tune"}"#)
            .create();

        let id = client(&server).upload_file(&path, "fine-tune").unwrap();
        mock.assert();
        assert_eq!(id, "file-new");
    }

    #[test]
    fn upload_missing_file() {
        let server = Server::new();
        let err = client(&server)
            .upload_file(Path::new("/definitely/not/here.jsonl"), "fine-tune")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not open file '/definitely/not/here.jsonl'"
        );
    }

    #[test]
    fn fine_tuning_jobs() {
        let mut server = Server::new();
        server
            .mock("POST", "/fine_tuning/jobs")
            .match_body(Matcher::Json(json!({"model": "gpt-4o-mini", "training_file": "file-abc"})))
            .with_status(200)
            .with_body(r#"{"object":"fine_tuning.job","id":"ftjob-1"}"#)
            .create();
        server
            .mock("GET", "/fine_tuning/jobs")
            .match_query(Matcher::UrlEncoded("limit".into(), "5".into()))
            .with_status(200)
            .with_body(r#"{"data":[{"id":"ftjob-1","created_at":1700000000,"estimated_finish":null,"finished_at":1700000600}]}"#)
            .create();

        let api = client(&server);
        assert_eq!(
            api.create_fine_tuning_job("gpt-4o-mini", "file-abc").unwrap(),
            "ftjob-1"
        );

        let jobs = api.list_fine_tuning_jobs(5).unwrap().value.data;
        assert_eq!(jobs[0].estimated_finish, None);
        assert_eq!(jobs[0].finished_at, Some(1700000600));
    }

    #[test]
    fn model_ownership() {
        let model = |owner: &str| Model {
            id: "m".into(),
            created: 0,
            owned_by: owner.into(),
        };
        assert!(model("openai").owned_by_openai());
        assert!(model("openai-internal").owned_by_openai());
        assert!(model("system").owned_by_openai());
        assert!(!model("user-abc123").owned_by_openai());
    }

    #[test]
    fn chat_completion_accessors() {
        let chats: List<ChatCompletion> = serde_json::from_value(json!({
            "data": [
                {
                    "id": "chatcmpl-1",
                    "created": 1700000000,
                    "metadata": {"prompt": "What is 2 + 2?"},
                    "choices": [{"message": {"role": "assistant", "content": "4"}}]
                },
                {"id": "chatcmpl-2", "created": 1700000001, "metadata": null, "choices": []}
            ]
        }))
        .unwrap();

        assert_eq!(chats.data[0].prompt(), "What is 2 + 2?");
        assert_eq!(chats.data[0].completion(), "4");
        assert_eq!(chats.data[1].prompt(), "");
        assert_eq!(chats.data[1].completion(), "");
    }

    #[test]
    fn create_image_request_shape() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/images/generations")
            .match_body(Matcher::Json(json!({
                "model": "dall-e-3",
                "prompt": "A cat",
                "quality": "hd",
                "response_format": "b64_json",
                "size": "1024x1024",
                "style": "natural"
            })))
            .with_status(200)
            .with_body(r#"{"created":1700000000,"data":[{"b64_json":"aGVsbG8=","revised_prompt":"A fluffy cat"}]}"#)
            .create();

        let image = client(&server)
            .create_image("dall-e-3", "A cat", "hd", "natural")
            .unwrap();
        mock.assert();
        assert_eq!(image.created, 1700000000);
        assert_eq!(image.b64_json, "aGVsbG8=");
        assert_eq!(image.revised_prompt.as_deref(), Some("A fluffy cat"));
    }
}
