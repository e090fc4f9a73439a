//! 测试用的生成器 / 校验器

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use biblio_fixer::models::Provider;
use biblio_fixer::{
    AppError, AppResult, EntryFlow, EntryStore, Example, GenerateRequest, Generator, Settings,
    ValidateRequest, ValidationMode, ValidationResult, Validator,
};

/// 按顺序返回预设结果的生成器
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerateRequest>>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<&'static str, &'static str>>,
    {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerateRequest) -> AppResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(AppError::Other(message)),
            None => Err(AppError::Other("no scripted response left".to_string())),
        }
    }
}

/// 每种校验维度按顺序返回预设结果的校验器
#[derive(Default)]
pub struct ScriptedValidator {
    responses: Mutex<HashMap<ValidationMode, VecDeque<Result<ValidationResult, String>>>>,
    requests: Mutex<Vec<ValidateRequest>>,
}

impl ScriptedValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(self, mode: ValidationMode, result: Result<ValidationResult, &str>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(mode)
            .or_default()
            .push_back(result.map_err(str::to_string));
        self
    }

    pub fn style(self, is_valid: bool, score: u8, comment: &str) -> Self {
        self.push(ValidationMode::Style, Ok(ValidationResult::new(is_valid, score, comment)))
    }

    pub fn integrity(self, is_valid: bool, score: u8, comment: &str) -> Self {
        self.push(ValidationMode::Integrity, Ok(ValidationResult::new(is_valid, score, comment)))
    }

    pub fn requests(&self) -> Vec<ValidateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Validator for ScriptedValidator {
    async fn validate(&self, request: &ValidateRequest) -> AppResult<ValidationResult> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&request.mode)
            .and_then(|queue| queue.pop_front());
        match next {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(AppError::Other(message)),
            None => Ok(ValidationResult::new(true, 10, "ok")),
        }
    }
}

/// 记录开始/结束顺序和最大并发数的生成器
///
/// 原文包含 "FAIL" 时返回错误
#[derive(Default)]
pub struct TracingGenerator {
    pub events: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    delay: Duration,
}

impl TracingGenerator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn position(&self, event: &str) -> usize {
        self.events()
            .iter()
            .position(|e| e == event)
            .unwrap_or_else(|| panic!("event {} not recorded", event))
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for TracingGenerator {
    async fn generate(&self, request: &GenerateRequest) -> AppResult<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("start:{}", request.text));

        tokio::time::sleep(self.delay).await;

        self.events.lock().unwrap().push(format!("end:{}", request.text));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if request.text.contains("FAIL") {
            Err(AppError::Other(format!("provider failed for {}", request.text)))
        } else {
            Ok(format!("{} [formatted]", request.text))
        }
    }
}

/// 原文包含 "PANIC" 时直接 panic 的生成器
pub struct PanickingGenerator;

#[async_trait]
impl Generator for PanickingGenerator {
    async fn generate(&self, request: &GenerateRequest) -> AppResult<String> {
        if request.text.contains("PANIC") {
            panic!("generator crashed on {}", request.text);
        }
        Ok(format!("{} [formatted]", request.text))
    }
}

/// 记录同时进行中的校验调用数量的校验器，总是通过
#[derive(Default)]
pub struct TracingValidator {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
    delay: Duration,
}

impl TracingValidator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Validator for TracingValidator {
    async fn validate(&self, _request: &ValidateRequest) -> AppResult<ValidationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ValidationResult::new(true, 10, "ok"))
    }
}

/// 设置：生成器 openai，校验器 anthropic，按参数决定是否配置密钥
pub fn settings(generator_key: bool, validator_key: bool, concurrency_limit: usize) -> Settings {
    let mut settings = Settings {
        concurrency_limit,
        ..Default::default()
    };
    if generator_key {
        settings.api_keys.set(Provider::OpenAi, "sk-generator").unwrap();
    }
    if validator_key {
        settings.api_keys.set(Provider::Anthropic, "sk-validator").unwrap();
    }
    settings
}

pub fn flow(
    store: &Arc<EntryStore>,
    generator: Arc<dyn Generator>,
    validator: Arc<dyn Validator>,
    settings: Settings,
    examples: Vec<Example>,
) -> Arc<EntryFlow> {
    Arc::new(EntryFlow::new(
        Arc::clone(store),
        generator,
        validator,
        settings,
        examples,
    ))
}
