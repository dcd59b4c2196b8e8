//! Fortune readings from a chat-completion model.
//!
//! This module builds the request for the model and parses its answer. The
//! network call belongs to the host, which plugs it in as a [`ChatBackend`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{debug, error};

use crate::chinese::cycle::Pillar;
use crate::chinese::sexagenary_for_year;
use crate::pillars::FourPillars;

/// Year the reading is written for unless another is requested.
pub const DEFAULT_TARGET_YEAR: i32 = 2026;
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 2000;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Korean label used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "남성",
            Gender::Female => "여성",
        }
    }
}

/// What to interpret: a chart, the subject's gender and the target year.
///
/// ```
/// use saju::interpret::{FortuneRequest, Gender};
/// use saju::PillarCalculator;
/// use saju::converter::EphemerisConverter;
///
/// let chart = PillarCalculator::new(EphemerisConverter::new())
///     .compute_pillars(1990, 12, 25, 12, 0)
///     .unwrap();
/// let request = FortuneRequest::new(chart, Gender::Female);
///
/// assert_eq!("丙午", request.target_pillar().to_string());
/// assert!(request.user_prompt().contains("일주(日柱): 甲子"));
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FortuneRequest {
    pub pillars: FourPillars,
    pub gender: Gender,
    pub target_year: i32,
}

impl FortuneRequest {
    pub fn new(pillars: FourPillars, gender: Gender) -> Self {
        Self {
            pillars,
            gender,
            target_year: DEFAULT_TARGET_YEAR,
        }
    }

    pub fn with_target_year(mut self, target_year: i32) -> Self {
        self.target_year = target_year;
        self
    }

    /// The year pillar of the target year.
    pub fn target_pillar(&self) -> Pillar {
        Pillar::from_sexagenary(sexagenary_for_year(self.target_year))
    }

    /// e.g. `2026년 병오년(丙午年, 火의 해)`
    fn target_year_text(&self) -> String {
        let pillar = self.target_pillar();
        format!(
            "{}년 {}{}년({}年, {}의 해)",
            self.target_year,
            pillar.stem().hangul(),
            pillar.branch().hangul(),
            pillar,
            pillar.stem().element().as_char(),
        )
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "당신은 한국 전통 사주명리학을 오래 연구해 온 전문가입니다. \
             정통 명리 이론에 근거하여 {} 운세를 풀이합니다.",
            self.target_year_text()
        )
    }

    pub fn user_prompt(&self) -> String {
        let p = &self.pillars;
        let year = self.target_year;
        format!(
            "아래 사주팔자를 {target} 기준으로 풀이해 주세요.\n\
             \n\
             **사주팔자:**\n\
             - 년주(年柱): {}\n\
             - 월주(月柱): {}\n\
             - 일주(日柱): {}\n\
             - 시주(時柱): {}\n\
             - 일간(日干): {}\n\
             - 성별: {}\n\
             \n\
             **출력 형식 (JSON):**\n\
             {{\n\
             \x20 \"overall\": \"{year}년 총운 (250-300자, 오행의 상호작용 포함)\",\n\
             \x20 \"wealth\": \"재물운 (200-250자, 시기별 흐름과 구체적 조언)\",\n\
             \x20 \"career\": \"직업운과 사업운 (200-250자, 변화의 시기와 실천 방안)\",\n\
             \x20 \"health\": \"건강운 (150-200자, 조심할 시기와 관리법)\",\n\
             \x20 \"advice\": \"{year}년 핵심 조언 (200-250자, 분기별 실천 사항)\"\n\
             }}\n\
             \n\
             **요구사항:**\n\
             1. {year}년의 기운이 사주의 오행과 어떻게 작용하는지 분석\n\
             2. 월별 또는 분기별 흐름을 구체적으로 제시\n\
             3. 실생활에 쓸 수 있는 조언 포함\n\
             4. 긍정적으로 쓰되 주의할 점도 분명히 언급\n\
             5. 각 항목은 150자 이상으로 작성",
            p.year(),
            p.month(),
            p.day(),
            p.hour(),
            p.day_master(),
            self.gender.label(),
            target = self.target_year_text(),
        )
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: Role::System,
                content: self.system_prompt(),
            },
            ChatMessage {
                role: Role::User,
                content: self.user_prompt(),
            },
        ]
    }

    /// Request body for a chat-completion endpoint.
    pub fn chat_completion(&self, model: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: model.to_owned(),
            messages: self.messages(),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat::json_object(),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_format: ResponseFormat,
}

/// A fortune reading, one passage per topic.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FortuneReading {
    pub overall: String,
    pub wealth: String,
    pub career: String,
    pub health: String,
    pub advice: String,
}

impl FortuneReading {
    /// Parses the message content returned by the model.
    ///
    /// ```
    /// use saju::interpret::{FortuneReading, InterpretError};
    ///
    /// assert!(matches!(FortuneReading::from_content(Some("  ")), Err(InterpretError::EmptyResponse)));
    /// assert!(matches!(FortuneReading::from_content(Some("{\"overall\":")), Err(InterpretError::Parse(_))));
    /// ```
    pub fn from_content(content: Option<&str>) -> Result<Self, InterpretError> {
        let content = content
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(InterpretError::EmptyResponse)?;
        Ok(serde_json::from_str(content)?)
    }
}

#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("the model returned an empty response")]
    EmptyResponse,
    #[error("the model response is not a valid reading")]
    Parse(#[from] serde_json::Error),
    #[error("chat backend failed: {0}")]
    Backend(String),
}

/// Produces a [`FortuneReading`] for a request.
pub trait FortuneInterpreter {
    fn interpret(&self, request: &FortuneRequest) -> Result<FortuneReading, InterpretError>;
}

/// Sends a chat-completion request and returns the content of the first
/// choice, if any.
pub trait ChatBackend {
    fn complete(&self, request: &ChatCompletionRequest) -> Result<Option<String>, InterpretError>;
}

impl<B: ChatBackend + ?Sized> ChatBackend for &B {
    fn complete(&self, request: &ChatCompletionRequest) -> Result<Option<String>, InterpretError> {
        (**self).complete(request)
    }
}

/// [`FortuneInterpreter`] over a [`ChatBackend`].
#[derive(Debug, Clone)]
pub struct ChatInterpreter<B> {
    backend: B,
    model: String,
}

impl<B: ChatBackend> ChatInterpreter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            model: DEFAULT_MODEL.to_owned(),
        }
    }
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl<B: ChatBackend> FortuneInterpreter for ChatInterpreter<B> {
    fn interpret(&self, request: &FortuneRequest) -> Result<FortuneReading, InterpretError> {
        let body = request.chat_completion(&self.model);
        let content = self.backend.complete(&body).inspect_err(|err| {
            error!(error = %err, model = %self.model, "chat completion failed");
        })?;
        debug!(raw = content.as_deref().unwrap_or_default(), "chat completion response");
        FortuneReading::from_content(content.as_deref()).inspect_err(|err| {
            error!(error = %err, pillars = %request.pillars, "interpreting saju failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::cell::RefCell;

    fn chart() -> FourPillars {
        FourPillars::new(
            "庚午".parse().unwrap(),
            "戊子".parse().unwrap(),
            "甲子".parse().unwrap(),
            "庚午".parse().unwrap(),
        )
    }

    const READING: &str = r#"{
        "overall": "총운",
        "wealth": "재물운",
        "career": "직업운",
        "health": "건강운",
        "advice": "조언"
    }"#;

    struct Recording {
        reply: Option<&'static str>,
        seen: RefCell<Vec<ChatCompletionRequest>>,
    }

    impl ChatBackend for Recording {
        fn complete(
            &self,
            request: &ChatCompletionRequest,
        ) -> Result<Option<String>, InterpretError> {
            self.seen.borrow_mut().push(request.clone());
            Ok(self.reply.map(str::to_owned))
        }
    }

    #[test]
    fn prompts() {
        let request = FortuneRequest::new(chart(), Gender::Male);
        let system = request.system_prompt();
        assert!(system.contains("2026년 병오년(丙午年, 火의 해)"), "{system}");

        let user = request.user_prompt();
        for line in [
            "년주(年柱): 庚午",
            "월주(月柱): 戊子",
            "일주(日柱): 甲子",
            "시주(時柱): 庚午",
            "일간(日干): 甲",
            "성별: 남성",
            "\"advice\"",
        ] {
            assert!(user.contains(line), "{line}");
        }
    }

    #[test]
    fn other_target_year() {
        let request = FortuneRequest::new(chart(), Gender::Female).with_target_year(2027);
        assert_eq!("丁未", request.target_pillar().to_string());
        assert!(request.system_prompt().contains("2027년 정미년(丁未年, 火의 해)"));
        assert!(request.user_prompt().contains("성별: 여성"));
    }

    #[test]
    fn request_body() {
        let body = FortuneRequest::new(chart(), Gender::Male).chat_completion(DEFAULT_MODEL);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!("gpt-4o-mini", json["model"]);
        assert_eq!("json_object", json["response_format"]["type"]);
        assert_eq!(2000, json["max_tokens"]);
        assert_eq!("system", json["messages"][0]["role"]);
        assert_eq!("user", json["messages"][1]["role"]);
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn parse_reading() {
        let reading = FortuneReading::from_content(Some(READING)).unwrap();
        assert_eq!("총운", reading.overall);
        assert_eq!("조언", reading.advice);
        assert_matches!(FortuneReading::from_content(None), Err(InterpretError::EmptyResponse));
        assert_matches!(FortuneReading::from_content(Some("")), Err(InterpretError::EmptyResponse));
        assert_matches!(
            FortuneReading::from_content(Some(r#"{"overall": "총운"}"#)),
            Err(InterpretError::Parse(_))
        );
    }

    #[test]
    fn chat_interpreter() {
        let backend = Recording {
            reply: Some(READING),
            seen: RefCell::new(Vec::new()),
        };
        let interpreter = ChatInterpreter::new(&backend).with_model("test-model");
        let request = FortuneRequest::new(chart(), Gender::Female);
        let reading = interpreter.interpret(&request).unwrap();
        assert_eq!("건강운", reading.health);

        let seen = backend.seen.borrow();
        assert_eq!(1, seen.len());
        assert_eq!("test-model", seen[0].model);
        assert_eq!(request.messages(), seen[0].messages);
    }

    #[test]
    fn chat_interpreter_errors() {
        let backend = Recording {
            reply: None,
            seen: RefCell::new(Vec::new()),
        };
        let request = FortuneRequest::new(chart(), Gender::Male);
        assert_matches!(
            ChatInterpreter::new(&backend).interpret(&request),
            Err(InterpretError::EmptyResponse)
        );

        struct Down;
        impl ChatBackend for Down {
            fn complete(&self, _: &ChatCompletionRequest) -> Result<Option<String>, InterpretError> {
                Err(InterpretError::Backend("connection refused".to_owned()))
            }
        }
        let err = ChatInterpreter::new(Down).interpret(&request).unwrap_err();
        assert_eq!("chat backend failed: connection refused", err.to_string());
    }
}
