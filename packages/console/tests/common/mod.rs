#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use lingua_console::{Config, ConsoleClient};

pub const KNOWLEDGE: &str = "/api/base_de_conhecimento";
pub const PHRASES: &str = "/api/frases_do_dialogo";
pub const PROMPTS: &str = "/api/prompts";
pub const HISTORY: &str = "/api/historico_de_pratica";

/// In-memory stand-in for the language-study backend.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    documents: Mutex<HashMap<String, Value>>,
    failures: Mutex<VecDeque<(StatusCode, Value)>>,
    requests: Mutex<Vec<(Method, String)>>,
    delay: Mutex<Option<Duration>>,
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub backend: FakeBackend,
}

impl TestServer {
    pub fn client(&self) -> ConsoleClient {
        ConsoleClient::with_base_url(format!("http://{}", self.addr))
    }

    pub fn client_with_timeout(&self, request_timeout: Duration) -> ConsoleClient {
        ConsoleClient::new(&Config {
            backend_url: format!("http://{}", self.addr),
            request_timeout,
            ..Config::default()
        })
    }
}

impl FakeBackend {
    pub fn seeded() -> Self {
        let backend = Self::default();
        backend.put_document(KNOWLEDGE, sample_knowledge());
        backend.put_document(PHRASES, sample_phrases());
        backend.put_document(PROMPTS, sample_prompts());
        backend.put_document(HISTORY, sample_history());
        backend
    }

    pub fn put_document(&self, path: &str, value: Value) {
        self.inner
            .documents
            .lock()
            .unwrap()
            .insert(path.to_string(), value);
    }

    pub fn document(&self, path: &str) -> Option<Value> {
        self.inner.documents.lock().unwrap().get(path).cloned()
    }

    /// The next request, whatever its path, answers with `status` and `body`.
    pub fn fail_next(&self, status: StatusCode, body: Value) {
        self.inner
            .failures
            .lock()
            .unwrap()
            .push_back((status, body));
    }

    /// Every GET waits this long before answering.
    pub fn delay_reads(&self, delay: Duration) {
        *self.inner.delay.lock().unwrap() = Some(delay);
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.inner
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, p)| *m == method && p == path)
            .count()
    }

    pub async fn spawn(self) -> TestServer {
        let app = Router::new()
            .route(KNOWLEDGE, get(read).put(write))
            .route(PHRASES, get(read).put(write))
            .route(PROMPTS, get(read).put(write))
            .route(HISTORY, get(read))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            addr,
            backend: self,
        }
    }

    fn record(&self, method: Method, path: &str) -> Option<Response> {
        self.inner
            .requests
            .lock()
            .unwrap()
            .push((method, path.to_string()));
        self.inner
            .failures
            .lock()
            .unwrap()
            .pop_front()
            .map(|(status, body)| (status, Json(body)).into_response())
    }
}

async fn read(State(backend): State<FakeBackend>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    if let Some(failure) = backend.record(Method::GET, &path) {
        return failure;
    }
    let delay = *backend.inner.delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    match backend.document(&path) {
        Some(value) => Json(value).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "not found"}))).into_response(),
    }
}

async fn write(State(backend): State<FakeBackend>, uri: Uri, body: Bytes) -> Response {
    let path = uri.path().to_string();
    if let Some(failure) = backend.record(Method::PUT, &path) {
        return failure;
    }
    match serde_json::from_slice::<Value>(&body) {
        Ok(value) => {
            backend.put_document(&path, value.clone());
            Json(value).into_response()
        }
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": [{"msg": err.to_string()}]})),
        )
            .into_response(),
    }
}

pub fn sample_knowledge() -> Value {
    json!([
        {
            "conhecimento_id": "a",
            "data_hora": "2025-10-05T14:35:06.829Z",
            "idioma": "alemao",
            "tipo_conhecimento": "palavra",
            "texto_original": "Hallo",
            "transcricao_ipa": "haˈloː",
            "traducao": "Olá",
            "divisao_silabica": "Hal-lo"
        },
        {
            "conhecimento_id": "b",
            "data_hora": "2025-10-06T09:00:00Z",
            "idioma": "ingles",
            "tipo_conhecimento": "frase",
            "texto_original": "How are you?",
            "traducao": "Como vai?"
        }
    ])
}

pub fn sample_phrases() -> Value {
    json!({
        "saudacao": "Hallo!",
        "despedida": "Tschüss!",
        "intermediarias": ["Wie geht's?", "Was machst du gern?"]
    })
}

pub fn sample_prompts() -> Value {
    json!({
        "descricao": "Prompts do sistema",
        "data_atualizacao": "2025-10-01T10:00:00.000Z",
        "marcador_de_paramentros": "{{}}",
        "prompts": [
            {
                "prompt_id": "gerar_frase",
                "descricao": "Gera uma frase de exemplo",
                "template": "Crie uma frase com {{palavra}}",
                "parametros": ["palavra"],
                "resposta_estruturada": false,
                "ultima_edicao": "2025-10-01T10:00:00.000Z"
            }
        ]
    })
}

pub fn sample_history() -> Value {
    json!({
        "exercicios": [
            {
                "data_hora": "2025-10-01T08:00:00Z",
                "exercicio_id": "e1",
                "conhecimento_id": "a",
                "idioma": "alemao",
                "tipo_pratica": "traducao",
                "resultado_exercicio": {
                    "campo_fornecido": "texto_original",
                    "campos_preenchidos": ["traducao", "transcricao_ipa"],
                    "valores_preenchidos": ["Olá", "haˈloː"],
                    "campos_resultados": [true, true]
                }
            },
            {
                "data_hora": "2025-10-03T08:00:00Z",
                "exercicio_id": "e3",
                "conhecimento_id": "n7",
                "idioma": "alemao",
                "tipo_pratica": "pronuncia_de_numeros",
                "resultado_exercicio": {
                    "numero_referencia": "42",
                    "audio_usuario_url": "/audio/42.webm",
                    "transcricao_correta": "zweiundvierzig",
                    "acertou": false
                }
            },
            {
                "data_hora": "2025-10-02T08:00:00Z",
                "exercicio_id": "e2",
                "conhecimento_id": "b",
                "idioma": "ingles",
                "tipo_pratica": "audicao",
                "resultado_exercicio": {
                    "texto_original": "How are you?",
                    "transcricao_usuario": "How are you",
                    "correto": true,
                    "velocidade_utilizada": "0.75"
                }
            }
        ]
    })
}
